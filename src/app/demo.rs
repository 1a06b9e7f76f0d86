use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::config::toml_config::DemoConfig;
use crate::domain::model::{DemoEvent, DemoReport, EventKind};
use crate::domain::ports::SleepBackend;
use crate::utils::error::{FfiError, Result};

/// Counts sheep on the async runtime while a native call sleeps elsewhere.
pub struct SheepDemo {
    backend: Arc<dyn SleepBackend>,
    sheep: u32,
    tick: Duration,
    sleep_ms: i32,
    echo: bool,
}

struct EventLog {
    start: Instant,
    events: Mutex<Vec<DemoEvent>>,
    echo: bool,
}

impl EventLog {
    fn new(echo: bool) -> Self {
        Self {
            start: Instant::now(),
            events: Mutex::new(Vec::new()),
            echo,
        }
    }

    fn push(&self, kind: EventKind) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        if self.echo {
            match kind {
                EventKind::Sheep(n) => println!("{} sheep", n),
                EventKind::PreSleep => println!("Pre-sleep"),
                EventKind::PostSleep => println!("Post-sleep"),
            }
        }
        tracing::debug!(elapsed_ms, ?kind, "demo event");
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(DemoEvent { elapsed_ms, kind });
    }

    fn into_events(self) -> Vec<DemoEvent> {
        self.events
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SheepDemo {
    pub fn new(backend: Arc<dyn SleepBackend>, config: &DemoConfig) -> Result<Self> {
        Ok(Self {
            backend,
            sheep: config.demo.sheep,
            tick: config.tick(),
            sleep_ms: config.sleep_delay_ms()?,
            echo: true,
        })
    }

    /// Suppress the live `"N sheep"` lines on stdout.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.echo = !quiet;
        self
    }

    /// Override the native delay, bypassing config validation.
    pub fn with_sleep_ms(mut self, sleep_ms: i32) -> Self {
        self.sleep_ms = sleep_ms;
        self
    }

    pub async fn run(&self) -> Result<DemoReport> {
        let started_at = Utc::now();
        let log = EventLog::new(self.echo);
        tracing::info!(
            "Counting {} sheep every {:?} while the native call sleeps {} ms ({})",
            self.sheep,
            self.tick,
            self.sleep_ms,
            self.backend.describe()
        );

        let ((), sleep_result) = tokio::join!(self.count_sheep(&log), self.ffi_sleep(&log));

        let sleep_status = match sleep_result {
            Ok(()) => 0,
            Err(FfiError::NativeStatusError { function, code }) => {
                tracing::warn!("{} returned status {}", function, code);
                code
            }
            Err(err) => return Err(err),
        };

        let total_ms = log.start.elapsed().as_millis() as u64;
        Ok(DemoReport {
            started_at,
            strategy: self.backend.describe().to_string(),
            events: log.into_events(),
            sleep_status,
            total_ms,
        })
    }

    async fn count_sheep(&self, log: &EventLog) {
        for i in 1..=self.sheep {
            tokio::time::sleep(self.tick).await;
            log.push(EventKind::Sheep(i));
        }
    }

    async fn ffi_sleep(&self, log: &EventLog) -> Result<()> {
        log.push(EventKind::PreSleep);
        let result = self.backend.sleep_ms(self.sleep_ms).await;
        log.push(EventKind::PostSleep);
        result
    }
}
