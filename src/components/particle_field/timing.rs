//! Frame scheduling, throttling and resize debouncing.
//!
//! Timestamps are milliseconds on the host's monotonic clock
//! (`performance.now()` in the browser).

/// Opaque id of a requested frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

/// The host's frame scheduler.
pub trait FrameScheduler {
	/// Request one future call of the frame callback.
	fn request_frame(&mut self) -> FrameHandle;
	/// Withdraw a request; unknown or already fired handles are ignored.
	fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Skips frames that arrive sooner than a minimum interval after the last
/// processed one.
///
/// Progress advances per processed frame, not per elapsed millisecond, so
/// this caps work on fast displays without true delta-time integration.
#[derive(Clone, Debug)]
pub struct FrameThrottle {
	min_interval: f64,
	last: Option<f64>,
}

impl FrameThrottle {
	/// Throttle allowing at most one frame per `min_interval_ms`.
	pub fn new(min_interval_ms: f64) -> Self {
		Self {
			min_interval: min_interval_ms,
			last: None,
		}
	}

	/// True when a frame at `now` should be processed; records it if so.
	/// The first frame is always processed.
	pub fn ready(&mut self, now: f64) -> bool {
		match self.last {
			Some(last) if now - last < self.min_interval => false,
			_ => {
				self.last = Some(now);
				true
			}
		}
	}

	/// Forget the last frame so the next one is processed.
	pub fn reset(&mut self) {
		self.last = None;
	}
}

/// Holds the latest value until no new one has arrived for a quiet period.
#[derive(Clone, Debug)]
pub struct Debounce<T> {
	quiet: f64,
	pending: Option<(f64, T)>,
}

impl<T> Debounce<T> {
	/// Debounce with a quiet period of `quiet_ms`.
	pub fn new(quiet_ms: f64) -> Self {
		Self {
			quiet: quiet_ms,
			pending: None,
		}
	}

	/// Replace any pending value and restart the quiet period.
	pub fn notify(&mut self, now: f64, value: T) {
		self.pending = Some((now + self.quiet, value));
	}

	/// Take the value once the quiet period has elapsed.
	pub fn poll(&mut self, now: f64) -> Option<T> {
		match self.pending {
			Some((deadline, _)) if now >= deadline => self.pending.take().map(|(_, v)| v),
			_ => None,
		}
	}
}
