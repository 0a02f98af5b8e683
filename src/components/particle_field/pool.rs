//! Free list of retired particles.

use glam::DVec2;
use rand::Rng;

use super::options::ParticleOptions;
use super::particle::Particle;

/// Bounded stash of particles recycled across rebuilds.
///
/// Reused particles keep their size, color and density; only their endpoints
/// are reassigned. Particles move in and out by value, so one never sits in
/// the pool and a live collection at the same time.
#[derive(Debug, Default)]
pub struct ParticlePool {
	free: Vec<Particle>,
	capacity: usize,
}

impl ParticlePool {
	/// Empty pool holding at most `capacity` particles.
	pub fn new(capacity: usize) -> Self {
		Self {
			free: Vec::new(),
			capacity,
		}
	}

	/// Number of particles waiting for reuse.
	pub fn len(&self) -> usize {
		self.free.len()
	}

	/// True when nothing is pooled.
	pub fn is_empty(&self) -> bool {
		self.free.is_empty()
	}

	/// Recycle a retired particle, or allocate one when the pool is empty.
	pub fn acquire<R: Rng + ?Sized>(
		&mut self,
		baseline: DVec2,
		target: DVec2,
		options: &ParticleOptions,
		rng: &mut R,
	) -> Particle {
		match self.free.pop() {
			Some(mut particle) => {
				particle.reset(baseline, target);
				particle
			}
			None => Particle::new(baseline, target, options, rng),
		}
	}

	/// Retire every particle in `live`; anything beyond capacity is dropped.
	pub fn release_all(&mut self, live: &mut Vec<Particle>) {
		let room = self.capacity.saturating_sub(self.free.len());
		let keep = live.len().min(room);
		self.free.extend(live.drain(..keep));
		live.clear();
	}
}
