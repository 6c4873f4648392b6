//! Execution window: an absolute deadline after which a component stops.
//!
//! Loops check `is_open` before each iteration. Work is wrapped in `run`,
//! which drops the in-flight future once the deadline passes, and `sleep`
//! never sleeps past the deadline.
use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep_until, timeout_at};

#[derive(Debug, Clone, Copy)]
pub struct Window {
    deadline: Instant,
}

impl Window {
    pub fn new(length: Duration) -> Self {
        Window {
            deadline: Instant::now() + length,
        }
    }

    pub fn is_open(&self) -> bool {
        Instant::now() < self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Runs `fut` to completion or until the deadline; `None` means it was abandoned.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        timeout_at(self.deadline, fut).await.ok()
    }

    /// Sleeps for `dur`, cut short at the deadline. Returns whether the window is still open.
    pub async fn sleep(&self, dur: Duration) -> bool {
        let wake = (Instant::now() + dur).min(self.deadline);
        sleep_until(wake).await;
        self.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_stops_at_deadline() {
        let window = Window::new(Duration::from_secs(10));
        assert!(window.sleep(Duration::from_secs(4)).await);
        assert!(!window.sleep(Duration::from_secs(60)).await);
        assert_eq!(window.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn run_abandons_work_past_deadline() {
        let window = Window::new(Duration::from_secs(3));
        let done = window
            .run(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                1
            })
            .await;
        assert_eq!(done, Some(1));

        let abandoned = window
            .run(tokio::time::sleep(Duration::from_secs(30)))
            .await;
        assert!(abandoned.is_none());
        assert!(!window.is_open());
    }
}
