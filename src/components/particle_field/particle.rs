//! A single particle travelling from its baseline to its target.

use std::f64::consts::TAU;

use glam::DVec2;
use rand::Rng;

use super::cursor::CursorField;
use super::options::ParticleOptions;
use super::surface::Surface;
use super::theme::Color;

/// Per-frame inputs shared by every particle.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput {
	/// Scroll progress, already clamped to `[0, 1]`.
	pub progress: f64,
	/// Latest cursor sample, if the pointer is over the canvas.
	pub cursor: Option<DVec2>,
	/// Cursor falloff and strength.
	pub field: CursorField,
	/// Peak wobble offset in pixels.
	pub wobble_amplitude: f64,
}

/// A point that interpolates between two positions as progress advances.
///
/// Randomized attributes (phase, phase speed, density, size, color) are drawn
/// once in [`Particle::new`] and kept across [`Particle::reset`].
#[derive(Clone, Debug)]
pub struct Particle {
	/// Where the particle was drawn last frame.
	pub position: DVec2,
	/// Scattered start point, reached at progress 0.
	pub baseline: DVec2,
	/// Destination, reached at progress 1.
	pub target: DVec2,
	/// Wobble phase in radians.
	pub phase: f64,
	/// Phase advance per update.
	pub phase_speed: f64,
	/// Sensitivity to the cursor force; fixed for the particle's lifetime.
	density: f64,
	/// Radius in pixels.
	pub size: f64,
	/// Fill color.
	pub color: Color,
	/// Opacity in `[0, 1]`.
	pub opacity: f64,
}

impl Particle {
	/// Particle at `baseline` with randomized attributes drawn from `options`.
	pub fn new<R: Rng + ?Sized>(
		baseline: DVec2,
		target: DVec2,
		options: &ParticleOptions,
		rng: &mut R,
	) -> Self {
		Self {
			position: baseline,
			baseline,
			target,
			phase: rng.gen_range(0.0..TAU),
			phase_speed: rng.gen_range(options.phase_speed_min..=options.phase_speed_max),
			density: rng.gen_range(options.density_min..=options.density_max),
			size: rng.gen_range(options.size_min..=options.size_max),
			color: options.color.sample(rng),
			opacity: options.opacity,
		}
	}

	/// Reassign endpoints for reuse; everything randomized stays as it was.
	pub fn reset(&mut self, baseline: DVec2, target: DVec2) {
		self.position = baseline;
		self.baseline = baseline;
		self.target = target;
	}

	/// Cursor sensitivity.
	pub fn density(&self) -> f64 {
		self.density
	}

	/// Position along the baseline→target line at progress `p`.
	///
	/// Weighted form so both endpoints are reproduced bit-for-bit.
	pub fn interpolated(&self, p: f64) -> DVec2 {
		self.baseline * (1.0 - p) + self.target * p
	}

	/// Advance one frame: interpolate, wobble, then apply the cursor force.
	pub fn update(&mut self, input: &FrameInput) {
		let p = input.progress;
		let anchor = self.interpolated(p);

		// Wobble peaks mid-transition and vanishes at both ends so p=0 and
		// p=1 land exactly on baseline and target.
		self.phase += self.phase_speed;
		let envelope = 4.0 * p * (1.0 - p);
		let wobble = DVec2::new(self.phase.sin(), self.phase.cos())
			* (input.wobble_amplitude * envelope);

		let resting = anchor + wobble;
		let force = match input.cursor {
			Some(cursor) => input.field.force(resting, cursor, self.density),
			None => DVec2::ZERO,
		};

		self.position = resting + force;
	}

	/// Draw as a filled circle.
	pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
		surface.draw_circle(self.position, self.size, self.color, self.opacity);
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	use super::*;

	fn input(progress: f64, cursor: Option<DVec2>) -> FrameInput {
		FrameInput {
			progress,
			cursor,
			field: CursorField {
				radius: 100.0,
				scale: 0.6,
			},
			wobble_amplitude: 2.0,
		}
	}

	fn particle(baseline: DVec2, target: DVec2) -> Particle {
		let mut rng = SmallRng::seed_from_u64(11);
		Particle::new(baseline, target, &ParticleOptions::default(), &mut rng)
	}

	#[test]
	fn lands_exactly_on_endpoints() {
		let baseline = DVec2::new(12.5, 700.0);
		let target = DVec2::new(400.0, 30.25);
		let mut p = particle(baseline, target);

		p.update(&input(0.0, None));
		assert_eq!(p.position, baseline);

		p.update(&input(1.0, None));
		assert_eq!(p.position, target);
	}

	#[test]
	fn wobble_stays_within_amplitude() {
		let baseline = DVec2::new(0.0, 0.0);
		let target = DVec2::new(100.0, 0.0);
		let mut p = particle(baseline, target);
		for _ in 0..500 {
			p.update(&input(0.5, None));
			let offset = p.position - p.interpolated(0.5);
			assert!(offset.length() <= 2.0 + 1e-9);
		}
	}

	#[test]
	fn phase_advances_every_update() {
		let mut p = particle(DVec2::ZERO, DVec2::ONE);
		let start = p.phase;
		p.update(&input(0.0, None));
		p.update(&input(0.0, None));
		assert!((p.phase - (start + 2.0 * p.phase_speed)).abs() < 1e-12);
	}

	#[test]
	fn cursor_on_particle_yields_no_nan() {
		let at = DVec2::new(50.0, 50.0);
		let mut p = particle(at, at);
		p.update(&input(1.0, Some(at)));
		assert!(p.position.is_finite());
		assert_eq!(p.position, at);
	}

	#[test]
	fn cursor_pulls_nearby_particles() {
		let at = DVec2::new(50.0, 50.0);
		let mut p = particle(at, at);
		p.update(&input(1.0, Some(DVec2::new(100.0, 50.0))));
		assert!(p.position.x > 50.0);
		assert_eq!(p.position.y, 50.0);
	}

	#[test]
	fn reset_keeps_random_attributes() {
		let mut p = particle(DVec2::ZERO, DVec2::ONE);
		let (size, color, density, speed) = (p.size, p.color, p.density(), p.phase_speed);
		p.reset(DVec2::new(5.0, 6.0), DVec2::new(7.0, 8.0));
		assert_eq!(p.position, DVec2::new(5.0, 6.0));
		assert_eq!(p.target, DVec2::new(7.0, 8.0));
		assert_eq!((p.size, p.color, p.density(), p.phase_speed), (size, color, density, speed));
	}

	#[test]
	fn attributes_respect_option_ranges() {
		let options = ParticleOptions::default();
		let mut rng = SmallRng::seed_from_u64(99);
		for _ in 0..200 {
			let p = Particle::new(DVec2::ZERO, DVec2::ZERO, &options, &mut rng);
			assert!((options.size_min..=options.size_max).contains(&p.size));
			assert!((options.density_min..=options.density_max).contains(&p.density()));
			assert!((options.phase_speed_min..=options.phase_speed_max).contains(&p.phase_speed));
		}
	}
}
