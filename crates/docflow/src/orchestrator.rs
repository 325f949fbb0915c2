//! The conversion facade.
//!
//! The orchestrator is the single recovery boundary: every conversion entry
//! point returns a [`ConversionResult`], and internal errors become failed
//! results carrying a readable message.

use crate::result::ConversionResult;
use docflow_core::{
    ConvertError, Document, DocumentLoader, DocumentWriter, FsStore, ProcessingChain,
    ProgressChannel, ProgressListener, ProgressSink, Routine, Selector,
};
use docflow_routines::{default_fallbacks, default_selectors};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Percent reported before batch item `index` (zero-based), rounded half up.
fn batch_percent(index: usize, total: usize) -> u8 {
    let percent = ((index + 1) * 200 + total) / (2 * total);
    percent.min(100) as u8
}

/// Borrowed view of everything a conversion needs except the channel.
///
/// Splitting it off lets stages report into the orchestrator's own channel,
/// or into a per-item buffer when items run concurrently.
struct Pipeline<'a> {
    selectors: &'a [Box<dyn Selector>],
    fallbacks: &'a [Arc<dyn Routine>],
    loader: &'a dyn DocumentLoader,
}

impl Pipeline<'_> {
    /// Selectors in order, then fallbacks in registration order.
    fn select(&self, input: &str, output: &str) -> Result<Arc<dyn Routine>, ConvertError> {
        if let Some(selector) = self
            .selectors
            .iter()
            .find(|s| s.supports_conversion(input, output))
        {
            debug!(selector = selector.name(), "{} -> {}", input, output);
            return selector.create_converter(input, output);
        }

        self.fallbacks
            .iter()
            .find(|r| r.supports(input, output))
            .inspect(|r| debug!(fallback = r.name(), "{} -> {}", input, output))
            .cloned()
            .ok_or_else(|| ConvertError::NoConverter {
                input: input.to_string(),
                output: output.to_string(),
            })
    }

    fn convert_loaded(
        &self,
        document: Document,
        output: &str,
        sink: &mut dyn ProgressSink,
    ) -> Result<Document, ConvertError> {
        sink.emit(
            &format!("Starting conversion: {} -> {}", document.format(), output),
            30,
        );
        let routine = self.select(document.format(), output)?;
        sink.emit(&format!("Selected strategy: {}", routine.name()), 50);

        let converted = routine.convert(document)?;
        sink.emit("Conversion completed successfully", 100);
        Ok(converted)
    }

    fn convert_path(
        &self,
        path: &Path,
        output: &str,
        sink: &mut dyn ProgressSink,
    ) -> Result<Document, ConvertError> {
        sink.emit(&format!("Loading document: {}", path.display()), 0);
        let document = self.loader.load(path)?;
        sink.emit("Document loaded successfully", 20);

        self.convert_loaded(document, output, sink)
    }

    fn process_path(
        &self,
        path: &Path,
        output: &str,
        chain: &ProcessingChain,
        sink: &mut dyn ProgressSink,
    ) -> Result<Document, ConvertError> {
        sink.emit("Loading and converting document", 0);
        let document = self.loader.load(path)?;
        sink.emit("Document loaded", 20);

        let routine = self.select(document.format(), output)?;
        debug!(routine = routine.name(), "converting {}", document.name());
        let converted = routine.convert(document)?;
        sink.emit("Document converted", 60);

        let processed = chain.process(converted)?;
        sink.emit("Processing completed", 100);
        Ok(processed)
    }

    /// Convert one path, never failing.
    fn convert_one(
        &self,
        path: &Path,
        output: &str,
        sink: &mut dyn ProgressSink,
    ) -> ConversionResult {
        let started = Instant::now();
        match self.convert_path(path, output, sink) {
            Ok(document) => {
                info!("converted {} to {}", path.display(), document.name());
                ConversionResult::succeeded(document, "Conversion successful", started.elapsed())
            }
            Err(e) => fail(sink, "Conversion failed", &e, started),
        }
    }
}

/// Report `e` on the sink at 0% and turn it into a failed result.
fn fail(
    sink: &mut dyn ProgressSink,
    context: &str,
    e: &ConvertError,
    started: Instant,
) -> ConversionResult {
    let message = format!("{}: {}", context, e);
    warn!("{}", message);
    sink.emit(&message, 0);
    ConversionResult::failed(message, started.elapsed())
}

/// Coordinates loading, routine selection, conversion, processing and
/// progress reporting.
pub struct Orchestrator {
    selectors: Vec<Box<dyn Selector>>,
    fallbacks: Vec<Arc<dyn Routine>>,
    loader: Arc<dyn DocumentLoader>,
    writer: Arc<dyn DocumentWriter>,
    progress: ProgressChannel,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Standard wiring: document selector, image selector, PDF adapter,
    /// DOCX adapter, filesystem store.
    pub fn new() -> Self {
        Self::builder().standard_routines().build()
    }

    /// An empty builder. Nothing is registered until asked for.
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    pub fn attach(&mut self, listener: Arc<dyn ProgressListener>) {
        self.progress.attach(listener);
    }

    pub fn detach(&mut self, listener: &Arc<dyn ProgressListener>) {
        self.progress.detach(listener);
    }

    /// The progress channel, for reading the last reported state.
    pub fn progress(&self) -> &ProgressChannel {
        &self.progress
    }

    pub fn selectors(&self) -> &[Box<dyn Selector>] {
        &self.selectors
    }

    pub fn fallbacks(&self) -> &[Arc<dyn Routine>] {
        &self.fallbacks
    }

    /// Pick the routine for `input -> output` without running it.
    ///
    /// Domain selectors are tried in order before the fallback routines; the
    /// first claimant wins.
    pub fn select_routine(
        &self,
        input: &str,
        output: &str,
    ) -> Result<Arc<dyn Routine>, ConvertError> {
        let pipeline = Pipeline {
            selectors: &self.selectors,
            fallbacks: &self.fallbacks,
            loader: self.loader.as_ref(),
        };
        pipeline.select(input, output)
    }

    /// Load the document at `path` and convert it to `output`.
    pub fn convert(&mut self, path: impl AsRef<Path>, output: &str) -> ConversionResult {
        let (pipeline, channel) = self.split();
        pipeline.convert_one(path.as_ref(), output, channel)
    }

    /// Convert an already loaded document.
    pub fn convert_document(&mut self, document: Document, output: &str) -> ConversionResult {
        let started = Instant::now();
        let (pipeline, channel) = self.split();
        match pipeline.convert_loaded(document, output, channel) {
            Ok(document) => {
                ConversionResult::succeeded(document, "Conversion successful", started.elapsed())
            }
            Err(e) => fail(channel, "Conversion failed", &e, started),
        }
    }

    /// Load, convert, then run the result through `chain`.
    pub fn convert_and_process(
        &mut self,
        path: impl AsRef<Path>,
        output: &str,
        chain: &ProcessingChain,
    ) -> ConversionResult {
        let started = Instant::now();
        let path = path.as_ref();
        let (pipeline, channel) = self.split();
        match pipeline.process_path(path, output, chain, channel) {
            Ok(document) => {
                info!(
                    steps = ?chain.step_names(),
                    "converted and processed {}",
                    path.display()
                );
                ConversionResult::succeeded(
                    document,
                    "Conversion and processing successful",
                    started.elapsed(),
                )
            }
            Err(e) => fail(channel, "Operation failed", &e, started),
        }
    }

    /// Convert every path, one after another.
    ///
    /// Returns one result per path in input order. A failing item does not
    /// stop the ones after it.
    pub fn batch_convert<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        output: &str,
    ) -> Vec<ConversionResult> {
        let total = paths.len();
        let (pipeline, channel) = self.split();
        channel.emit(&format!("Starting batch conversion of {} files", total), 0);

        let mut results = Vec::with_capacity(total);
        for (i, path) in paths.iter().enumerate() {
            channel.emit(
                &format!("Converting file {} of {}", i + 1, total),
                batch_percent(i, total),
            );
            results.push(pipeline.convert_one(path.as_ref(), output, channel));
        }

        channel.emit("Batch conversion completed", 100);
        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(total, failed, "batch finished");
        results
    }

    /// Convert every path concurrently.
    ///
    /// Results keep input order. Each item's progress events are buffered
    /// and replayed item by item, so listeners see every item's events
    /// contiguously and in order.
    #[cfg(feature = "parallel")]
    pub fn batch_convert_parallel<P: AsRef<Path> + Sync>(
        &mut self,
        paths: &[P],
        output: &str,
    ) -> Vec<ConversionResult> {
        use docflow_core::ProgressEvent;
        use rayon::prelude::*;

        let total = paths.len();
        let (pipeline, channel) = self.split();
        channel.emit(&format!("Starting batch conversion of {} files", total), 0);

        let outcomes: Vec<(Vec<ProgressEvent>, ConversionResult)> = paths
            .par_iter()
            .enumerate()
            .map(|(i, path)| {
                let mut events: Vec<ProgressEvent> = Vec::new();
                events.emit(
                    &format!("Converting file {} of {}", i + 1, total),
                    batch_percent(i, total),
                );
                let result = pipeline.convert_one(path.as_ref(), output, &mut events);
                (events, result)
            })
            .collect();

        let results = outcomes
            .into_iter()
            .map(|(events, result)| {
                for event in events {
                    channel.emit(&event.message, event.percent);
                }
                result
            })
            .collect();

        channel.emit("Batch conversion completed", 100);
        results
    }

    /// Write the document's content to `path`.
    pub fn save(
        &mut self,
        document: &Document,
        path: impl AsRef<Path>,
    ) -> Result<(), ConvertError> {
        let path = path.as_ref();
        self.progress
            .emit(&format!("Saving document to: {}", path.display()), 90);
        self.writer.write(path, document.content())?;
        self.progress.emit("Document saved successfully", 100);
        info!("saved {}", path.display());
        Ok(())
    }

    fn split(&mut self) -> (Pipeline<'_>, &mut ProgressChannel) {
        let pipeline = Pipeline {
            selectors: &self.selectors,
            fallbacks: &self.fallbacks,
            loader: self.loader.as_ref(),
        };
        (pipeline, &mut self.progress)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let selectors: Vec<_> = self.selectors.iter().map(|s| s.name()).collect();
        let fallbacks: Vec<_> = self.fallbacks.iter().map(|r| r.name()).collect();
        f.debug_struct("Orchestrator")
            .field("selectors", &selectors)
            .field("fallbacks", &fallbacks)
            .field("progress", &self.progress)
            .finish()
    }
}

/// Builder for [`Orchestrator`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    selectors: Vec<Box<dyn Selector>>,
    fallbacks: Vec<Arc<dyn Routine>>,
    loader: Option<Arc<dyn DocumentLoader>>,
    writer: Option<Arc<dyn DocumentWriter>>,
    listeners: Vec<Arc<dyn ProgressListener>>,
}

impl OrchestratorBuilder {
    /// Add the document and image selectors and the PDF and DOCX adapters.
    pub fn standard_routines(mut self) -> Self {
        self.selectors.extend(default_selectors());
        self.fallbacks.extend(default_fallbacks());
        self
    }

    /// Add a selector after the ones already registered.
    pub fn selector(mut self, selector: impl Selector + 'static) -> Self {
        self.selectors.push(Box::new(selector));
        self
    }

    /// Add a fallback routine after the ones already registered.
    pub fn fallback(mut self, routine: impl Routine + 'static) -> Self {
        self.fallbacks.push(Arc::new(routine));
        self
    }

    /// Shared variant of [`OrchestratorBuilder::fallback`].
    pub fn fallback_arc(mut self, routine: Arc<dyn Routine>) -> Self {
        self.fallbacks.push(routine);
        self
    }

    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn writer(mut self, writer: Arc<dyn DocumentWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Use one store as both loader and writer.
    pub fn store<S>(mut self, store: Arc<S>) -> Self
    where
        S: DocumentLoader + DocumentWriter + 'static,
    {
        self.loader = Some(store.clone());
        self.writer = Some(store);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Finish. Loader and writer default to the filesystem.
    pub fn build(self) -> Orchestrator {
        let mut progress = ProgressChannel::new();
        for listener in self.listeners {
            progress.attach(listener);
        }

        Orchestrator {
            selectors: self.selectors,
            fallbacks: self.fallbacks,
            loader: self.loader.unwrap_or_else(|| Arc::new(FsStore)),
            writer: self.writer.unwrap_or_else(|| Arc::new(FsStore)),
            progress,
        }
    }
}
