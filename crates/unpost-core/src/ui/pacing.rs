use rand::Rng;
use std::time::Duration;

/// Human-paced waits: each pause is drawn uniformly from `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Pacer {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        let (lo, hi) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Self {
            min: Duration::from_millis(lo),
            max: Duration::from_millis(hi),
        }
    }

    /// No waiting at all.
    pub fn immediate() -> Self {
        Self::new(0, 0)
    }

    pub fn draw(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }

    pub async fn pause(&self) {
        let wait = self.draw();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}
