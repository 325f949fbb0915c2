//! Progress broadcasting.
//!
//! A [`ProgressChannel`] owns the listeners and the last reported
//! `(message, percent)`. Delivery is synchronous and in attachment order.
//! A failing listener does not stop delivery to the others: every listener
//! sees every event, and the first failure is handed back to the caller.

use crate::error::ListenerError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Receives progress updates.
///
/// Listeners are shared (`Arc`) and called through `&self`; keep mutable
/// state behind a `Mutex` or atomics.
pub trait ProgressListener: Send + Sync {
    /// Handle one progress update. `percent` is within `0..=100`.
    fn update(&self, message: &str, percent: u8) -> Result<(), ListenerError>;
}

/// One reported milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub message: String,
    pub percent: u8,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>, percent: u8) -> Self {
        Self {
            message: message.into(),
            percent: percent.min(100),
        }
    }
}

/// Where pipeline stages report milestones.
///
/// The live [`ProgressChannel`] broadcasts immediately; a `Vec<ProgressEvent>`
/// buffers events so they can be replayed later in a fixed order.
pub trait ProgressSink {
    fn emit(&mut self, message: &str, percent: u8);
}

impl ProgressSink for Vec<ProgressEvent> {
    fn emit(&mut self, message: &str, percent: u8) {
        self.push(ProgressEvent::new(message, percent));
    }
}

/// Broadcasts progress to attached listeners.
#[derive(Default)]
pub struct ProgressChannel {
    listeners: Vec<Arc<dyn ProgressListener>>,
    last_message: String,
    last_percent: u8,
}

impl ProgressChannel {
    /// Create a channel with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener. Attaching the same listener twice is a no-op.
    pub fn attach(&mut self, listener: Arc<dyn ProgressListener>) {
        if self.position(&listener).is_none() {
            self.listeners.push(listener);
            debug!(listeners = self.listeners.len(), "listener attached");
        }
    }

    /// Detach a listener. Detaching an unknown listener is a no-op.
    pub fn detach(&mut self, listener: &Arc<dyn ProgressListener>) {
        if let Some(idx) = self.position(listener) {
            self.listeners.remove(idx);
            debug!(listeners = self.listeners.len(), "listener detached");
        }
    }

    /// Record `(message, percent)` as current and deliver it to every
    /// listener in attachment order.
    ///
    /// Returns the first listener failure, after all listeners were called.
    pub fn notify(&mut self, message: &str, percent: u8) -> Result<(), ListenerError> {
        self.last_message = message.to_string();
        self.last_percent = percent.min(100);

        let mut first_error = None;
        for listener in &self.listeners {
            if let Err(e) = listener.update(&self.last_message, self.last_percent) {
                warn!("{}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Notify with a new message, keeping the last percent.
    pub fn notify_message(&mut self, message: &str) -> Result<(), ListenerError> {
        self.notify(message, self.last_percent)
    }

    /// Re-send the last message with a new percent.
    pub fn update_progress(&mut self, percent: u8) -> Result<(), ListenerError> {
        let message = std::mem::take(&mut self.last_message);
        self.notify(&message, percent)
    }

    /// The last reported `(message, percent)`.
    pub fn current(&self) -> (&str, u8) {
        (&self.last_message, self.last_percent)
    }

    /// Number of attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn position(&self, listener: &Arc<dyn ProgressListener>) -> Option<usize> {
        let target = Arc::as_ptr(listener) as *const ();
        self.listeners
            .iter()
            .position(|l| Arc::as_ptr(l) as *const () == target)
    }
}

impl ProgressSink for ProgressChannel {
    fn emit(&mut self, message: &str, percent: u8) {
        // Failures were already logged per listener
        let _ = self.notify(message, percent);
    }
}

impl std::fmt::Debug for ProgressChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressChannel")
            .field("listeners", &self.listeners.len())
            .field("last_message", &self.last_message)
            .field("last_percent", &self.last_percent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(String, u8)>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<(String, u8)> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressListener for Recorder {
        fn update(&self, message: &str, percent: u8) -> Result<(), ListenerError> {
            self.events
                .lock()
                .unwrap()
                .push((message.to_string(), percent));
            Ok(())
        }
    }

    struct Failing {
        calls: AtomicUsize,
    }

    impl ProgressListener for Failing {
        fn update(&self, _message: &str, _percent: u8) -> Result<(), ListenerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ListenerError::new("failing", "always fails"))
        }
    }

    #[test]
    fn test_notify_delivers_in_order() {
        let mut channel = ProgressChannel::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        channel.attach(first.clone());
        channel.attach(second.clone());

        channel.notify("loading", 0).unwrap();
        channel.notify("done", 100).unwrap();

        let expected = vec![("loading".to_string(), 0), ("done".to_string(), 100)];
        assert_eq!(first.events(), expected);
        assert_eq!(second.events(), expected);
        assert_eq!(channel.current(), ("done", 100));
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut channel = ProgressChannel::new();
        let recorder = Arc::new(Recorder::default());
        let as_dyn: Arc<dyn ProgressListener> = recorder.clone();

        channel.attach(as_dyn.clone());
        channel.attach(as_dyn.clone());
        assert_eq!(channel.listener_count(), 1);

        channel.notify("once", 10).unwrap();
        assert_eq!(recorder.events().len(), 1);
    }

    #[test]
    fn test_detach() {
        let mut channel = ProgressChannel::new();
        let recorder: Arc<dyn ProgressListener> = Arc::new(Recorder::default());
        let stranger: Arc<dyn ProgressListener> = Arc::new(Recorder::default());

        channel.attach(recorder.clone());
        channel.detach(&stranger);
        assert_eq!(channel.listener_count(), 1);

        channel.detach(&recorder);
        assert_eq!(channel.listener_count(), 0);

        // Detaching twice is fine
        channel.detach(&recorder);
        assert!(channel.notify("nobody listens", 50).is_ok());
    }

    #[test]
    fn test_notify_message_keeps_percent() {
        let mut channel = ProgressChannel::new();
        let recorder = Arc::new(Recorder::default());
        channel.attach(recorder.clone());

        channel.notify("half", 50).unwrap();
        channel.notify_message("still half").unwrap();
        channel.update_progress(75).unwrap();

        assert_eq!(
            recorder.events(),
            vec![
                ("half".to_string(), 50),
                ("still half".to_string(), 50),
                ("still half".to_string(), 75),
            ]
        );
    }

    #[test]
    fn test_percent_is_clamped() {
        let mut channel = ProgressChannel::new();
        channel.notify("over", 250).unwrap();
        assert_eq!(channel.current().1, 100);
    }

    #[test]
    fn test_failing_listener_is_isolated() {
        let mut channel = ProgressChannel::new();
        let failing = Arc::new(Failing {
            calls: AtomicUsize::new(0),
        });
        let recorder = Arc::new(Recorder::default());
        channel.attach(failing.clone());
        channel.attach(recorder.clone());

        let err = channel.notify("event", 30).unwrap_err();
        assert_eq!(err.listener, "failing");
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.events(), vec![("event".to_string(), 30)]);
    }

    #[test]
    fn test_buffer_sink() {
        let mut buffer: Vec<ProgressEvent> = Vec::new();
        buffer.emit("a", 10);
        buffer.emit("b", 101);
        assert_eq!(
            buffer,
            vec![ProgressEvent::new("a", 10), ProgressEvent::new("b", 100)]
        );
    }
}
