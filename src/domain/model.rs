use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "count", rename_all = "snake_case")]
pub enum EventKind {
    Sheep(u32),
    PreSleep,
    PostSleep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoEvent {
    pub elapsed_ms: u64,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoReport {
    pub started_at: DateTime<Utc>,
    pub strategy: String,
    pub events: Vec<DemoEvent>,
    /// Status code returned by the native sleep.
    pub sleep_status: i32,
    pub total_ms: u64,
}

impl DemoReport {
    pub fn position(&self, kind: EventKind) -> Option<usize> {
        self.events.iter().position(|e| e.kind == kind)
    }

    /// Sheep counted while the native call was still sleeping.
    pub fn sheep_during_sleep(&self) -> Vec<u32> {
        let (Some(pre), Some(post)) = (
            self.position(EventKind::PreSleep),
            self.position(EventKind::PostSleep),
        ) else {
            return Vec::new();
        };
        // Reports loaded from elsewhere may have the markers out of order.
        let Some(window) = self.events.get(pre..post) else {
            return Vec::new();
        };
        window
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::Sheep(n) => Some(n),
                _ => None,
            })
            .collect()
    }
}
