use parking_lot::Mutex;
use synapse_protocol::{Notifier, NotifierEvent};

/// Notifier that records every delivered event.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, NotifierEvent)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded (user_id, event) pairs in delivery order.
    pub fn events(&self) -> Vec<(String, NotifierEvent)> {
        self.events.lock().clone()
    }

    /// Number of delivered events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, user_id: &str, event: NotifierEvent) {
        self.events.lock().push((user_id.to_string(), event));
    }
}
