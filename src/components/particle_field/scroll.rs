//! Scroll offset to normalized progress, with optional per-frame smoothing.

/// One reading of the page's scroll geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollSample {
	/// Vertical scroll offset.
	pub offset_y: f64,
	/// Full scrollable height of the document.
	pub document_height: f64,
	/// Height of the visible viewport.
	pub viewport_height: f64,
}

impl ScrollSample {
	/// Progress in `[0, 1]`. Pages shorter than the viewport yield 0 rather
	/// than dividing by a non-positive range.
	pub fn progress(&self) -> f64 {
		let range = (self.document_height - self.viewport_height).max(1.0);
		let p = self.offset_y / range;
		if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
	}
}

/// Below this gap the smoothed value snaps onto its target.
const SNAP_EPSILON: f64 = 1e-4;

/// Eases the displayed progress toward the latest scroll reading.
///
/// Scroll events only move the target; the current value advances once per
/// processed frame, however many events arrived in between.
#[derive(Clone, Debug)]
pub struct ScrollProgress {
	target: f64,
	current: f64,
	smoothing: f64,
}

impl ScrollProgress {
	/// Start at progress 0. `smoothing` is clamped into `(0, 1]`; 1 disables easing.
	pub fn new(smoothing: f64) -> Self {
		Self {
			target: 0.0,
			current: 0.0,
			smoothing: smoothing.clamp(f64::EPSILON, 1.0),
		}
	}

	/// Record a new scroll reading.
	pub fn set_target(&mut self, sample: ScrollSample) {
		self.target = sample.progress();
	}

	/// Value as of the last `advance`.
	pub fn current(&self) -> f64 {
		self.current
	}

	/// Step once toward the target and return the new value.
	pub fn advance(&mut self) -> f64 {
		self.current += (self.target - self.current) * self.smoothing;
		if (self.target - self.current).abs() < SNAP_EPSILON {
			self.current = self.target;
		}
		self.current
	}
}
