use log::warn;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{self, Instant};

pub const DEFAULT_MAX_REQUESTS: u32 = 60;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct RateWindow {
    window_start: Instant,
    count: u32,
}

/// Client-side ceiling on outbound API calls per rolling window.
///
/// Admission is serialized: the lock is held across the imposed wait, so
/// concurrent callers queue up instead of racing past the ceiling.
#[derive(Debug)]
pub struct RateGate {
    max_requests: u32,
    window: Duration,
    state: Mutex<RateWindow>,
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateGate {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            state: Mutex::new(RateWindow {
                window_start: Instant::now(),
                count: 0,
            }),
        }
    }

    /// Waits until a request may be sent, then counts it.
    pub async fn admit(&self) {
        let mut w = self.state.lock().await;
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(w.window_start);
        if elapsed >= self.window {
            w.window_start = now;
            w.count = 0;
        } else if w.count >= self.max_requests {
            let wait = self.window - elapsed;
            warn!(
                "Rate limit of {} requests per {:?} reached; waiting {}ms",
                self.max_requests,
                self.window,
                wait.as_millis()
            );
            time::sleep(wait).await;
            w.window_start = Instant::now();
            w.count = 0;
        }
        w.count += 1;
    }

    /// Requests counted in the current window.
    pub async fn in_window(&self) -> u32 {
        self.state.lock().await.count
    }
}
