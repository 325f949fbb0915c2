//! Reference progress listeners.

use chrono::Local;
use docflow_core::{ListenerError, ProgressListener};
use std::sync::{Mutex, MutexGuard};

/// Accumulates timestamped progress lines.
///
/// Entries look like `[2026-01-31 09:15:02] [Progress: 50%] Selected strategy: ...`.
#[derive(Debug, Default)]
pub struct LogListener {
    entries: Mutex<Vec<String>>,
}

impl LogListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of all entries so far, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ProgressListener for LogListener {
    fn update(&self, message: &str, percent: u8) -> Result<(), ListenerError> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let entry = format!("[{}] [Progress: {}%] {}", timestamp, percent, message);
        self.lock().push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_format() {
        let log = LogListener::new();
        log.update("Document loaded successfully", 20).unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 1);

        // "[YYYY-mm-dd HH:MM:SS] " is 22 characters
        let entry = &entries[0];
        assert!(entry.starts_with('['));
        assert_eq!(&entry[20..22], "] ");
        assert_eq!(
            &entry[22..],
            "[Progress: 20%] Document loaded successfully"
        );
    }

    #[test]
    fn test_clear() {
        let log = LogListener::new();
        log.update("a", 0).unwrap();
        log.update("b", 100).unwrap();
        assert_eq!(log.len(), 2);

        log.clear();
        assert!(log.is_empty());
    }
}
