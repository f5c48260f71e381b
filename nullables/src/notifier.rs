//! Nullable notification sink — record notices instead of showing them.

use std::sync::Mutex;
use vft_client::NotificationSink;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Error(String),
}

/// A sink that keeps every notice, in order.
#[derive(Default)]
pub struct NullNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl NullNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices so far (for assertions).
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter_map(|notice| match notice {
                Notice::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.notices.lock().unwrap().clear();
    }
}

impl NotificationSink for NullNotifier {
    fn info(&self, message: &str) {
        self.notices.lock().unwrap().push(Notice::Info(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.notices.lock().unwrap().push(Notice::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notices.lock().unwrap().push(Notice::Error(message.to_string()));
    }
}
