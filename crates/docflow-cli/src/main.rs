//! Docflow CLI - document conversion

mod config;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use config::Config;
use docflow::{
    ChainSpec, ConversionResult, ListenerError, LogListener, Orchestrator, ProgressListener,
    StepSpec,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Collect files from paths, directories, and globs.
///
/// When `recursive` is true, directories are walked recursively.
fn collect_files(patterns: Vec<String>, recursive: bool, v: Verbosity) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for pattern in patterns {
        let path = PathBuf::from(&pattern);

        if path.is_dir() {
            let depth = if recursive { usize::MAX } else { 1 };
            files.extend(
                walkdir::WalkDir::new(&path)
                    .max_depth(depth)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .map(|e| e.into_path()),
            );
        } else if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            files.extend(expand_glob_pattern(&pattern, v));
        } else {
            // Missing files are reported per item by the orchestrator
            files.push(path);
        }
    }

    files.sort();
    files.dedup();
    files
}

/// Expand a single glob pattern.
fn expand_glob_pattern(pattern: &str, v: Verbosity) -> Vec<PathBuf> {
    match glob::glob(pattern) {
        Ok(paths) => {
            let files: Vec<_> = paths.flatten().filter(|p| p.is_file()).collect();
            if files.is_empty() {
                v.info(&format!("Warning: pattern '{}' matched no files", pattern));
            }
            files
        }
        Err(e) => {
            v.info(&format!(
                "Warning: invalid glob pattern '{}': {}",
                pattern, e
            ));
            Vec::new()
        }
    }
}

/// Output verbosity level.
#[derive(Clone, Copy)]
enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    fn is_quiet(self) -> bool {
        matches!(self, Verbosity::Quiet)
    }

    fn is_verbose(self) -> bool {
        matches!(self, Verbosity::Verbose)
    }

    fn info(self, msg: &str) {
        if !self.is_quiet() {
            println!("{msg}");
        }
    }
}

/// Renders orchestrator progress as a terminal progress bar.
struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")?
                .progress_chars("=> "),
        );
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressListener for ConsoleProgress {
    fn update(&self, message: &str, percent: u8) -> Result<(), ListenerError> {
        self.bar.set_position(u64::from(percent));
        self.bar.set_message(message.to_string());
        Ok(())
    }
}

/// Per-input outcome, as printed with `--json`.
#[derive(Debug, Serialize)]
struct Report {
    input: String,
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<usize>,
    elapsed_ms: u64,
}

impl Report {
    fn new(input: &Path, result: &ConversionResult) -> Self {
        let document = result.document();
        Self {
            input: input.display().to_string(),
            success: result.is_success(),
            message: result.message().to_string(),
            output: None,
            format: document.map(|d| d.format().to_string()),
            size: document.map(|d| d.size()),
            elapsed_ms: result.elapsed().as_millis() as u64,
        }
    }
}

#[derive(Parser)]
#[command(name = "docflow")]
#[command(about = "Document conversion with processing chains", long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to config file (default: ~/.config/docflow/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert file(s)
    Convert {
        /// Input files, directories or glob patterns
        #[arg(required = true)]
        input: Vec<String>,
        /// Target format (e.g. PDF, DOCX, TXT)
        #[arg(long)]
        to: Option<String>,
        /// Output file (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output directory (default: next to each input)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Recursively process directories
        #[arg(short = 'r', long)]
        recursive: bool,
        /// Apply a processing preset (confidential, draft, compact, secure)
        #[arg(long)]
        preset: Option<String>,
        /// Processing chain file (YAML, TOML, or JSON)
        #[arg(long)]
        chain: Option<PathBuf>,
        /// Append a watermark with this text
        #[arg(long)]
        watermark: Option<String>,
        /// Compress with this level (1-9)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=9))]
        compress: Option<u8>,
        /// Encrypt with this key
        #[arg(long)]
        encrypt: Option<String>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Print the timestamped progress log afterwards
        #[arg(long)]
        log: bool,
    },

    /// List routines in selection order
    List,

    /// List available presets
    Presets,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate man page
    Manpage,
}

/// Everything `convert` needs after flags and config are merged.
struct ConvertArgs {
    files: Vec<PathBuf>,
    target: String,
    output: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    chain: Option<ChainSpec>,
    json: bool,
    log: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from_path(Some(path.as_path())),
        None => Config::load(),
    };

    // Config defaults, CLI flags override
    let verbose = cli.verbose || config.defaults.verbose;
    let quiet = cli.quiet || config.defaults.quiet;
    let verbosity = Verbosity::from_flags(verbose, quiet);
    init_tracing(verbosity.is_verbose());

    match cli.command {
        Commands::Convert {
            input,
            to,
            output,
            output_dir,
            recursive,
            preset,
            chain,
            watermark,
            compress,
            encrypt,
            json,
            log,
        } => {
            let target = to
                .or_else(|| config.defaults.format.clone())
                .context(
                    "Target format required. Use --to or set defaults.format in the config file.",
                )?;

            let files = collect_files(input, recursive, verbosity);
            if files.is_empty() {
                bail!("No input files found");
            }
            if output.is_some() && files.len() > 1 {
                bail!("--output takes a single input; use --output-dir for several");
            }

            let chain = build_chain(
                &config,
                preset.as_deref(),
                chain.as_deref(),
                watermark,
                compress,
                encrypt,
            )?;

            let args = ConvertArgs {
                files,
                target,
                output,
                output_dir: output_dir.or_else(|| config.defaults.output_dir.clone()),
                chain,
                json,
                log,
            };
            cmd_convert(args, verbosity)
        }
        Commands::List => cmd_list(&Orchestrator::new(), verbosity),
        Commands::Presets => cmd_presets(&config, verbosity),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "docflow", &mut std::io::stdout());
            Ok(())
        }
        Commands::Manpage => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            man.render(&mut std::io::stdout())?;
            Ok(())
        }
    }
}

/// Merge preset, chain file and step flags, in that order.
///
/// Returns `None` when no processing was asked for.
fn build_chain(
    config: &Config,
    preset: Option<&str>,
    chain_file: Option<&Path>,
    watermark: Option<String>,
    compress: Option<u8>,
    encrypt: Option<String>,
) -> Result<Option<ChainSpec>> {
    let mut spec = ChainSpec::new();
    let mut requested = false;

    if let Some(name) = preset {
        let preset = config.get_preset(name).with_context(|| {
            format!("Unknown preset '{}'. Run `docflow presets` to list them.", name)
        })?;
        spec = spec.extend(preset);
        requested = true;
    }

    if let Some(path) = chain_file {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read chain file {}", path.display()))?;
        let file_spec = ChainSpec::from_bytes(&data, path.to_str())
            .with_context(|| format!("Invalid chain file {}", path.display()))?;
        spec = spec.extend(file_spec);
        requested = true;
    }

    if let Some(text) = watermark {
        spec = spec.watermark(text);
        requested = true;
    }
    if let Some(level) = compress {
        spec = spec.compression(level);
        requested = true;
    }
    if let Some(key) = encrypt {
        spec = spec.encryption(key);
        requested = true;
    }

    Ok(requested.then_some(spec))
}

#[cfg(feature = "parallel")]
fn run_batch(
    orchestrator: &mut Orchestrator,
    files: &[PathBuf],
    target: &str,
) -> Vec<ConversionResult> {
    orchestrator.batch_convert_parallel(files, target)
}

#[cfg(not(feature = "parallel"))]
fn run_batch(
    orchestrator: &mut Orchestrator,
    files: &[PathBuf],
    target: &str,
) -> Vec<ConversionResult> {
    orchestrator.batch_convert(files, target)
}

/// Where the converted document for `input` is written.
fn output_path(
    input: &Path,
    name: &str,
    output: Option<&Path>,
    output_dir: Option<&Path>,
) -> PathBuf {
    if let Some(output) = output {
        return output.to_path_buf();
    }

    let dir = output_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new("."));
    dir.join(name)
}

/// Comparable form of a path: canonical parent directory plus file name.
///
/// Falls back to the path as given when the parent cannot be resolved.
fn path_key(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

fn cmd_convert(args: ConvertArgs, v: Verbosity) -> Result<()> {
    let mut orchestrator = Orchestrator::new();

    let log = Arc::new(LogListener::new());
    if args.log {
        orchestrator.attach(log.clone());
    }

    let console = if v.is_quiet() || args.json {
        None
    } else {
        let console = Arc::new(ConsoleProgress::new()?);
        orchestrator.attach(console.clone());
        Some(console)
    };

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir).context("Failed to create output directory")?;
    }

    let results: Vec<ConversionResult> = match &args.chain {
        Some(spec) => {
            let chain = spec.build();
            tracing::debug!(steps = ?chain.step_names(), "processing chain");
            args.files
                .iter()
                .map(|file| orchestrator.convert_and_process(file, &args.target, &chain))
                .collect()
        }
        None => run_batch(&mut orchestrator, &args.files, &args.target),
    };

    // No output may land on any input, or on an output written earlier in this run
    let inputs: HashSet<PathBuf> = args.files.iter().map(|f| path_key(f)).collect();
    let mut written: HashMap<PathBuf, &Path> = HashMap::new();

    let mut reports = Vec::with_capacity(results.len());
    for (input, result) in args.files.iter().zip(&results) {
        let mut report = Report::new(input, result);

        if let Some(document) = result.document() {
            let dest = output_path(
                input,
                document.name(),
                args.output.as_deref(),
                args.output_dir.as_deref(),
            );

            let key = path_key(&dest);
            if inputs.contains(&key) {
                report.success = false;
                report.message = format!("Refusing to overwrite input {}", dest.display());
            } else if let Some(first) = written.get(&key) {
                report.success = false;
                report.message = format!(
                    "Output {} already written by {}",
                    dest.display(),
                    first.display()
                );
            } else {
                match orchestrator.save(document, &dest) {
                    Ok(()) => {
                        written.insert(key, input.as_path());
                        report.output = Some(dest.display().to_string());
                    }
                    Err(e) => {
                        report.success = false;
                        report.message = format!("Save failed: {}", e);
                    }
                }
            }
        }

        reports.push(report);
    }

    if let Some(console) = console {
        console.finish();
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            match (&report.output, report.success) {
                (Some(output), true) => v.info(&format!("{} -> {}", report.input, output)),
                _ => eprintln!("error: {}: {}", report.input, report.message),
            }
        }
    }

    if args.log {
        for entry in log.entries() {
            println!("{}", entry);
        }
    }

    let failed = reports.iter().filter(|r| !r.success).count();
    if failed > 0 {
        bail!("{} of {} conversions failed", failed, reports.len());
    }

    if !args.json {
        v.info(&format!(
            "Converted {} file(s) to {}",
            reports.len(),
            args.target
        ));
    }
    Ok(())
}

fn cmd_list(orchestrator: &Orchestrator, v: Verbosity) -> Result<()> {
    v.info("Selectors (tried in order):\n");
    for selector in orchestrator.selectors() {
        v.info(&format!("  {}", selector.name()));
        for decl in selector.declarations() {
            v.info(&format!(
                "    {:<36} {} -> {}",
                decl.name, decl.input, decl.output
            ));
        }
    }

    v.info("\nFallbacks (tried in order):\n");
    for routine in orchestrator.fallbacks() {
        let decl = routine.decl();
        v.info(&format!(
            "  {:<38} {} -> {}",
            decl.name, decl.input, decl.output
        ));
    }

    Ok(())
}

fn describe_step(step: &StepSpec) -> String {
    match step {
        StepSpec::Watermark { text } => format!("watermark({})", text),
        StepSpec::Compression { level } => format!("compression({})", level),
        StepSpec::Encryption { .. } => "encryption".to_string(),
    }
}

/// List available presets.
fn cmd_presets(config: &Config, v: Verbosity) -> Result<()> {
    v.info("Built-in presets:\n");

    for (name, desc) in config::list_presets() {
        v.info(&format!("  {:<14} {}", name, desc));
    }

    if !config.presets.is_empty() {
        v.info("\nUser-defined presets:\n");
        for (name, preset) in &config.presets {
            let desc = if preset.is_empty() {
                "(no steps)".into()
            } else {
                preset
                    .steps
                    .iter()
                    .map(describe_step)
                    .collect::<Vec<_>>()
                    .join(" -> ")
            };
            v.info(&format!("  {:<14} {}", name, desc));
        }
    }

    if let Some(path) = Config::default_path() {
        v.info(&format!("\nConfig file: {}", path.display()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_key_matches_equivalent_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let direct = path_key(&dir.path().join("a.pdf"));
        let dotted = path_key(&dir.path().join("sub").join("..").join("a.pdf"));
        assert_eq!(direct, dotted);
        assert_ne!(direct, path_key(&dir.path().join("a.png")));
    }

    #[test]
    fn test_build_chain_order() {
        let config = Config::default();
        let spec = build_chain(
            &config,
            Some("draft"),
            None,
            None,
            Some(3),
            Some("k".into()),
        )
        .unwrap()
        .unwrap();

        assert_eq!(
            spec.build().step_names(),
            ["base", "watermark", "compression", "encryption"]
        );
    }

    #[test]
    fn test_build_chain_none_requested() {
        let config = Config::default();
        assert!(
            build_chain(&config, None, None, None, None, None)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_unknown_preset() {
        let config = Config::default();
        let err = build_chain(&config, Some("shiny"), None, None, None, None).unwrap_err();
        assert!(err.to_string().contains("Unknown preset 'shiny'"));
    }

    #[test]
    fn test_output_path() {
        let input = Path::new("docs/report.pdf");
        assert_eq!(
            output_path(input, "report.docx", None, None),
            PathBuf::from("docs/report.docx")
        );
        assert_eq!(
            output_path(input, "report.docx", None, Some(Path::new("out"))),
            PathBuf::from("out/report.docx")
        );
        assert_eq!(
            output_path(input, "report.docx", Some(Path::new("x.docx")), None),
            PathBuf::from("x.docx")
        );
    }

    #[test]
    fn test_collect_files_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), "a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/b.png"), "b").unwrap();

        let root = dir.path().to_string_lossy().to_string();
        let flat = collect_files(vec![root.clone()], false, Verbosity::Quiet);
        assert_eq!(flat, vec![dir.path().join("a.pdf")]);

        let deep = collect_files(vec![root], true, Verbosity::Quiet);
        assert_eq!(deep.len(), 2);
    }
}
