//! Tunable options for the particle field.
//!
//! Options are read once at setup. They deserialize from camelCase JSON with
//! every field optional, so a page only needs to list the values it changes.

use serde::Deserialize;

use super::error::{ParticleError, Result};
use super::theme::{Color, ColorScheme};

/// Named options with their defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticleOptions {
	/// Number of particles in a procedural field.
	pub particle_count: usize,
	/// Pixel stride of the sampling grid over the rendered image.
	pub grid_stride: u32,
	/// Sampled pixels with alpha strictly above this value become targets.
	pub alpha_threshold: u8,
	/// Particle radius range in pixels.
	pub size_min: f64,
	/// Upper bound of the particle radius.
	pub size_max: f64,
	/// Particle opacity in `[0, 1]`.
	pub opacity: f64,
	/// Shadow blur applied around each particle (0 disables).
	pub glow: f64,
	/// How particle colors are chosen.
	pub color: ColorScheme,
	/// Distance at which the cursor force falls to zero.
	pub cursor_radius: f64,
	/// Scales the cursor force. Positive attracts, negative repels.
	pub force_scale: f64,
	/// Range of the per-particle density factor.
	pub density_min: f64,
	/// Upper bound of the density factor.
	pub density_max: f64,
	/// Peak wobble offset in pixels, reached halfway through a transition.
	pub wobble_amplitude: f64,
	/// Range of per-update phase advance in radians.
	pub phase_speed_min: f64,
	/// Upper bound of the phase advance.
	pub phase_speed_max: f64,
	/// Fraction of the remaining distance to the scroll target covered per frame.
	pub smoothing: f64,
	/// Frames arriving sooner than this after the last processed frame are skipped.
	pub frame_interval_ms: f64,
	/// Quiet period before a burst of resizes is applied.
	pub resize_debounce_ms: f64,
	/// When set, frames fade the previous one with this alpha instead of clearing.
	pub trail: Option<f64>,
	/// Fill used by the trail fade.
	pub background: Color,
	/// Maximum number of retired particles kept for reuse.
	pub pool_capacity: usize,
	/// Rebuild the field with fresh baselines when the canvas is clicked.
	pub rebuild_on_click: bool,
}

impl Default for ParticleOptions {
	fn default() -> Self {
		Self {
			particle_count: 500,
			grid_stride: 5,
			alpha_threshold: 128,
			size_min: 0.5,
			size_max: 2.0,
			opacity: 1.0,
			glow: 2.0,
			color: ColorScheme::default(),
			cursor_radius: 100.0,
			force_scale: 0.6,
			density_min: 1.0,
			density_max: 31.0,
			wobble_amplitude: 2.0,
			phase_speed_min: 0.02,
			phase_speed_max: 0.06,
			smoothing: 0.1,
			frame_interval_ms: 1000.0 / 60.0,
			resize_debounce_ms: 250.0,
			trail: None,
			background: Color::rgb(0, 0, 0),
			pool_capacity: 4096,
			rebuild_on_click: true,
		}
	}
}

fn invalid(msg: String) -> ParticleError {
	ParticleError::InvalidConfiguration(msg)
}

fn ordered_range(name: &str, min: f64, max: f64) -> Result<()> {
	if min.is_finite() && max.is_finite() && min >= 0.0 && min <= max {
		Ok(())
	} else {
		Err(invalid(format!(
			"{} range {}..{} must be finite, non-negative and ordered",
			name, min, max
		)))
	}
}

impl ParticleOptions {
	/// Reject options that indicate caller misuse. Nothing is clamped.
	pub fn validate(&self) -> Result<()> {
		if self.particle_count == 0 {
			return Err(invalid("particleCount must be at least 1".into()));
		}
		if self.grid_stride == 0 {
			return Err(invalid("gridStride must be at least 1".into()));
		}
		ordered_range("size", self.size_min, self.size_max)?;
		if self.size_min <= 0.0 {
			return Err(invalid(format!("sizeMin {} must be positive", self.size_min)));
		}
		if !(0.0..=1.0).contains(&self.opacity) {
			return Err(invalid(format!("opacity {} must be within 0..1", self.opacity)));
		}
		if !(self.glow.is_finite() && self.glow >= 0.0) {
			return Err(invalid(format!("glow {} must be non-negative", self.glow)));
		}
		self.color.validate()?;
		if !(self.cursor_radius.is_finite() && self.cursor_radius > 0.0) {
			return Err(invalid(format!(
				"cursorRadius {} must be positive",
				self.cursor_radius
			)));
		}
		if !(self.force_scale.is_finite() && self.force_scale.abs() <= 2.0) {
			return Err(invalid(format!(
				"forceScale {} must be within -2..2",
				self.force_scale
			)));
		}
		ordered_range("density", self.density_min, self.density_max)?;
		ordered_range("phaseSpeed", self.phase_speed_min, self.phase_speed_max)?;
		if !(self.wobble_amplitude.is_finite() && self.wobble_amplitude >= 0.0) {
			return Err(invalid(format!(
				"wobbleAmplitude {} must be non-negative",
				self.wobble_amplitude
			)));
		}
		if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
			return Err(invalid(format!(
				"smoothing {} must be within (0, 1]",
				self.smoothing
			)));
		}
		if !(self.frame_interval_ms.is_finite() && self.frame_interval_ms >= 0.0) {
			return Err(invalid(format!(
				"frameIntervalMs {} must be non-negative",
				self.frame_interval_ms
			)));
		}
		if !(self.resize_debounce_ms.is_finite() && self.resize_debounce_ms >= 0.0) {
			return Err(invalid(format!(
				"resizeDebounceMs {} must be non-negative",
				self.resize_debounce_ms
			)));
		}
		if let Some(alpha) = self.trail {
			if !(alpha > 0.0 && alpha <= 1.0) {
				return Err(invalid(format!("trail {} must be within (0, 1]", alpha)));
			}
		}
		Ok(())
	}
}
