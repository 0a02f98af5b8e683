//! Radial cursor force.

use glam::DVec2;

/// Falloff shape and strength of the cursor force.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorField {
	/// Distance at which the force reaches zero.
	pub radius: f64,
	/// Multiplier on the force. Positive pulls toward the cursor, negative pushes away.
	pub scale: f64,
}

impl CursorField {
	/// Force on a particle at `particle` from a cursor at `cursor`.
	///
	/// Magnitude is `clamp((radius - d) / radius, 0, 1) * density * scale`,
	/// directed along the unit vector toward the cursor. A particle sitting
	/// exactly on the cursor has no direction and receives no force.
	pub fn force(&self, particle: DVec2, cursor: DVec2, density: f64) -> DVec2 {
		let delta = cursor - particle;
		let distance = delta.length();
		if distance == 0.0 || !distance.is_finite() || self.radius <= 0.0 {
			return DVec2::ZERO;
		}

		let falloff = ((self.radius - distance) / self.radius).clamp(0.0, 1.0);
		if falloff == 0.0 {
			return DVec2::ZERO;
		}

		delta / distance * (falloff * density * self.scale)
	}
}
