/// Exponentially decaying free-transaction byte counter (spec §4.4 step 9):
/// a burst of free/low-fee transactions is allowed up to a per-minute byte
/// budget, decaying with a ~10-minute half-life so the budget refills
/// between bursts rather than resetting on a fixed clock tick.
pub struct FreeRateLimiter {
	limit_bytes_per_minute: f64,
	decayed_bytes: f64,
	last_update: u32,
}

const HALF_LIFE_SECONDS: f64 = 600.0;

impl FreeRateLimiter {
	pub fn new(limit_bytes_per_minute: f64) -> Self {
		FreeRateLimiter { limit_bytes_per_minute, decayed_bytes: 0.0, last_update: 0 }
	}

	/// Decays the counter for the elapsed time, adds `size`, and reports
	/// whether the result stays within budget. The caller is expected to
	/// only call this for transactions that qualify as free/low-fee;
	/// everything else bypasses the limiter entirely.
	pub fn record(&mut self, now: u32, size: usize) -> bool {
		let elapsed = now.saturating_sub(self.last_update) as f64;
		let decay = 0.5f64.powf(elapsed / HALF_LIFE_SECONDS);
		self.decayed_bytes *= decay;
		self.last_update = now;

		self.decayed_bytes += size as f64;
		self.decayed_bytes <= self.limit_bytes_per_minute
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn admits_a_single_transaction_under_budget() {
		let mut limiter = FreeRateLimiter::new(15_000.0);
		assert!(limiter.record(0, 500));
	}

	#[test]
	fn rejects_once_the_burst_exceeds_budget() {
		let mut limiter = FreeRateLimiter::new(1_000.0);
		assert!(limiter.record(0, 600));
		assert!(!limiter.record(0, 600));
	}

	#[test]
	fn decays_toward_zero_after_the_half_life() {
		let mut limiter = FreeRateLimiter::new(1_000.0);
		assert!(limiter.record(0, 900));
		assert!(limiter.record(600, 900));
	}
}
