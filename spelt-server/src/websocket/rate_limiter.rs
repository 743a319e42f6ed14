use std::time::{Duration, Instant};

/// Token bucket applied to inbound client messages
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_rate: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new_with_limits(max_tokens: u32, refill_rate: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_rate: refill_rate.max(Duration::from_millis(1)),
            last_refill: Instant::now(),
        }
    }

    pub fn check_rate_limit(&mut self) -> bool {
        self.refill_tokens(Instant::now());

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill_tokens(&mut self, now: Instant) {
        let time_passed = now.duration_since(self.last_refill);
        let refills = time_passed.as_millis() / self.refill_rate.as_millis();
        if refills == 0 {
            return;
        }

        let missing = self.max_tokens - self.tokens;
        match u32::try_from(refills) {
            Ok(refills) if refills < missing => {
                self.tokens += refills;
                // Keep the fractional remainder for the next refill
                self.last_refill += self.refill_rate * refills;
            }
            _ => {
                self.tokens = self.max_tokens;
                self.last_refill = now;
            }
        }
    }
}
