//! The particle field's frame loop.
//!
//! A [`Simulation`] owns every particle, the scroll and cursor inputs, and the
//! pending frame. The host calls [`Simulation::on_frame`] from its frame
//! callback and forwards input events to the setters between frames; nothing
//! here blocks or spawns.
//!
//! ```text
//! Uninitialized --setup--> Ready --start--> Running <--pause/start--> Paused
//!                                              |
//!                                              +--stop--> Stopped --start--> Running
//! ```

use glam::DVec2;
use log::{debug, info, warn};
use rand::RngCore;

use super::cursor::CursorField;
use super::error::Result;
use super::options::ParticleOptions;
use super::particle::{FrameInput, Particle};
use super::pool::ParticlePool;
use super::scroll::{ScrollProgress, ScrollSample};
use super::surface::{Rect, Size, Surface};
use super::targets::{self, TargetSource};
use super::timing::{Debounce, FrameHandle, FrameScheduler, FrameThrottle};

/// Lifecycle of the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
	/// No surface size or target source yet.
	Uninitialized,
	/// Particles built, no frame scheduled.
	Ready,
	/// A frame is scheduled and each frame schedules the next.
	Running,
	/// Suspended with all state kept.
	Paused,
	/// Halted; no frame is pending.
	Stopped,
}

/// Particle collection plus everything that drives it frame to frame.
pub struct Simulation<R: RngCore> {
	options: ParticleOptions,
	state: LoopState,
	rng: R,
	source: Option<Box<dyn TargetSource>>,
	size: Size,
	particles: Vec<Particle>,
	pool: ParticlePool,
	scroll: ScrollProgress,
	cursor: Option<DVec2>,
	field: CursorField,
	throttle: FrameThrottle,
	resize: Debounce<Size>,
	pending: Option<FrameHandle>,
}

impl<R: RngCore> Simulation<R> {
	/// Validate `options` and create an empty, uninitialized loop.
	pub fn new(options: ParticleOptions, rng: R) -> Result<Self> {
		options.validate()?;
		Ok(Self {
			state: LoopState::Uninitialized,
			rng,
			source: None,
			size: Size::default(),
			particles: Vec::new(),
			pool: ParticlePool::new(options.pool_capacity),
			scroll: ScrollProgress::new(options.smoothing),
			cursor: None,
			field: CursorField {
				radius: options.cursor_radius,
				scale: options.force_scale,
			},
			throttle: FrameThrottle::new(options.frame_interval_ms),
			resize: Debounce::new(options.resize_debounce_ms),
			pending: None,
			options,
		})
	}

	/// Current lifecycle state.
	pub fn state(&self) -> LoopState {
		self.state
	}

	/// Live particles in draw order.
	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	/// Smoothed progress as of the last processed frame.
	pub fn progress(&self) -> f64 {
		self.scroll.current()
	}

	/// Canvas size the field was built for.
	pub fn size(&self) -> Size {
		self.size
	}

	/// Handle of the scheduled frame, if any.
	pub fn pending_frame(&self) -> Option<FrameHandle> {
		self.pending
	}

	/// Install a target source for `size` and build the particles.
	///
	/// May be called again later to swap sources; the loop state is kept.
	pub fn setup(&mut self, size: Size, source: Box<dyn TargetSource>) {
		self.size = size;
		self.source = Some(source);
		self.rebuild();
		if self.state == LoopState::Uninitialized {
			self.state = LoopState::Ready;
		}
		info!(
			"scroll-particles: setup {}x{} with {} particles",
			size.width,
			size.height,
			self.particles.len()
		);
	}

	/// Rebuild the target field and particles with fresh random baselines.
	/// Retired particles go through the pool.
	pub fn rebuild(&mut self) {
		let Some(source) = self.source.as_mut() else {
			warn!("scroll-particles: rebuild requested before setup");
			return;
		};

		let targets = match source.build(self.size, &mut self.rng) {
			Ok(targets) => targets,
			Err(e) => {
				warn!("scroll-particles: {}, falling back to random targets", e);
				targets::procedural(self.options.particle_count, self.size, &mut self.rng)
			}
		};
		let baselines = targets::procedural(targets.len(), self.size, &mut self.rng);

		self.pool.release_all(&mut self.particles);
		for (baseline, target) in baselines.into_iter().zip(targets) {
			let particle = self
				.pool
				.acquire(baseline, target, &self.options, &mut self.rng);
			self.particles.push(particle);
		}
		debug!(
			"scroll-particles: built {} particles ({} pooled)",
			self.particles.len(),
			self.pool.len()
		);
	}

	/// Schedule frames. Returns false if there is nothing to run yet.
	pub fn start<F: FrameScheduler + ?Sized>(&mut self, scheduler: &mut F) -> bool {
		match self.state {
			LoopState::Uninitialized => {
				warn!("scroll-particles: start ignored, not set up");
				false
			}
			LoopState::Running => true,
			LoopState::Ready | LoopState::Paused | LoopState::Stopped => {
				self.state = LoopState::Running;
				self.throttle.reset();
				self.pending = Some(scheduler.request_frame());
				info!("scroll-particles: running");
				true
			}
		}
	}

	/// Cancel the pending frame but keep all state for a later `start`.
	pub fn pause<F: FrameScheduler + ?Sized>(&mut self, scheduler: &mut F) {
		if self.state != LoopState::Running {
			return;
		}
		if let Some(handle) = self.pending.take() {
			scheduler.cancel_frame(handle);
		}
		self.state = LoopState::Paused;
		info!("scroll-particles: paused");
	}

	/// Cancel the pending frame. Once this returns no frame will touch the
	/// surface until `start` is called again. Stopping twice is a no-op.
	pub fn stop<F: FrameScheduler + ?Sized>(&mut self, scheduler: &mut F) {
		if let Some(handle) = self.pending.take() {
			scheduler.cancel_frame(handle);
		}
		if self.state != LoopState::Stopped {
			self.state = LoopState::Stopped;
			info!("scroll-particles: stopped");
		}
	}

	/// Latest pointer position in canvas coordinates, or `None` when the
	/// pointer has left. Last write wins.
	pub fn set_cursor(&mut self, cursor: Option<DVec2>) {
		self.cursor = cursor;
	}

	/// Latest scroll reading; progress eases toward it on processed frames.
	pub fn set_scroll(&mut self, sample: ScrollSample) {
		self.scroll.set_target(sample);
	}

	/// Queue a resize; applied by the first frame after the quiet period.
	pub fn request_resize(&mut self, now: f64, size: Size) {
		self.resize.notify(now, size);
	}

	/// Frame callback. Returns true if the simulation advanced and redrew.
	pub fn on_frame<S, F>(&mut self, now: f64, surface: &mut S, scheduler: &mut F) -> bool
	where
		S: Surface + ?Sized,
		F: FrameScheduler + ?Sized,
	{
		if self.state != LoopState::Running {
			return false;
		}
		self.pending = None;

		if let Some(size) = self.resize.poll(now) {
			surface.resize(size);
			self.size = size;
			self.rebuild();
		}

		let processed = self.throttle.ready(now);
		if processed {
			self.step();
			self.render(surface);
		}

		self.pending = Some(scheduler.request_frame());
		processed
	}

	fn step(&mut self) {
		let input = FrameInput {
			progress: self.scroll.advance(),
			cursor: self.cursor,
			field: self.field,
			wobble_amplitude: self.options.wobble_amplitude,
		};
		for particle in &mut self.particles {
			particle.update(&input);
		}
	}

	fn render<S: Surface + ?Sized>(&self, surface: &mut S) {
		let region = Rect::from_size(self.size);
		match self.options.trail {
			Some(alpha) => surface.fade(region, self.options.background, alpha),
			None => surface.clear(region),
		}
		for particle in &self.particles {
			particle.draw(surface);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	use super::super::error::ParticleError;
	use super::super::targets::Procedural;
	use super::super::theme::Color;
	use super::*;

	#[derive(Default)]
	struct SpySurface {
		clears: usize,
		fades: usize,
		circles: usize,
		resizes: Vec<Size>,
	}

	impl Surface for SpySurface {
		fn resize(&mut self, size: Size) {
			self.resizes.push(size);
		}

		fn clear(&mut self, _region: Rect) {
			self.clears += 1;
		}

		fn fade(&mut self, _region: Rect, _color: Color, _alpha: f64) {
			self.fades += 1;
		}

		fn draw_circle(&mut self, _center: DVec2, _radius: f64, _color: Color, _opacity: f64) {
			self.circles += 1;
		}
	}

	#[derive(Default)]
	struct FakeScheduler {
		next: i32,
		requested: Vec<FrameHandle>,
		cancelled: Vec<FrameHandle>,
	}

	impl FrameScheduler for FakeScheduler {
		fn request_frame(&mut self) -> FrameHandle {
			self.next += 1;
			let handle = FrameHandle(self.next);
			self.requested.push(handle);
			handle
		}

		fn cancel_frame(&mut self, handle: FrameHandle) {
			self.cancelled.push(handle);
		}
	}

	struct Fixed(Vec<DVec2>);

	impl TargetSource for Fixed {
		fn build(&mut self, _size: Size, _rng: &mut dyn RngCore) -> Result<Vec<DVec2>> {
			Ok(self.0.clone())
		}
	}

	struct Counting {
		builds: Rc<Cell<usize>>,
	}

	impl TargetSource for Counting {
		fn build(&mut self, size: Size, rng: &mut dyn RngCore) -> Result<Vec<DVec2>> {
			self.builds.set(self.builds.get() + 1);
			Procedural { count: 8 }.build(size, rng)
		}
	}

	struct Failing;

	impl TargetSource for Failing {
		fn build(&mut self, _size: Size, _rng: &mut dyn RngCore) -> Result<Vec<DVec2>> {
			Err(ParticleError::ResourceLoad("404".into()))
		}
	}

	const CANVAS: Size = Size::new(800.0, 600.0);

	fn options() -> ParticleOptions {
		ParticleOptions {
			particle_count: 25,
			frame_interval_ms: 0.0,
			..ParticleOptions::default()
		}
	}

	fn simulation(options: ParticleOptions) -> Simulation<SmallRng> {
		Simulation::new(options, SmallRng::seed_from_u64(42)).unwrap()
	}

	fn scroll_to(progress: f64) -> ScrollSample {
		ScrollSample {
			offset_y: progress * 1000.0,
			document_height: 2000.0,
			viewport_height: 1000.0,
		}
	}

	#[test]
	fn rejects_invalid_options() {
		let bad = ParticleOptions {
			particle_count: 0,
			..ParticleOptions::default()
		};
		assert!(matches!(
			Simulation::new(bad, SmallRng::seed_from_u64(0)),
			Err(ParticleError::InvalidConfiguration(_))
		));
	}

	#[test]
	fn start_requires_setup() {
		let mut sim = simulation(options());
		let mut scheduler = FakeScheduler::default();
		assert!(!sim.start(&mut scheduler));
		assert_eq!(sim.state(), LoopState::Uninitialized);
		assert!(scheduler.requested.is_empty());

		sim.setup(CANVAS, Box::new(Procedural { count: 25 }));
		assert_eq!(sim.state(), LoopState::Ready);
		assert!(sim.start(&mut scheduler));
		assert_eq!(sim.state(), LoopState::Running);
		assert_eq!(sim.pending_frame(), Some(FrameHandle(1)));
	}

	#[test]
	fn square_converges_linearly() {
		let square = vec![
			DVec2::new(300.0, 200.0),
			DVec2::new(500.0, 200.0),
			DVec2::new(500.0, 400.0),
			DVec2::new(300.0, 400.0),
		];
		let mut sim = simulation(ParticleOptions {
			smoothing: 1.0,
			wobble_amplitude: 0.0,
			..options()
		});
		let mut surface = SpySurface::default();
		let mut scheduler = FakeScheduler::default();

		sim.setup(CANVAS, Box::new(Fixed(square.clone())));
		assert_eq!(sim.particles().len(), 4);
		sim.start(&mut scheduler);

		for (frame, p) in [0.0, 0.25, 0.5, 0.75, 1.0].into_iter().enumerate() {
			sim.set_scroll(scroll_to(p));
			assert!(sim.on_frame(frame as f64 * 20.0, &mut surface, &mut scheduler));
			assert_eq!(sim.progress(), p);

			for particle in sim.particles() {
				let expected = particle.baseline + (particle.target - particle.baseline) * p;
				assert!((particle.position - expected).length() < 1e-9);
			}
		}

		for (particle, corner) in sim.particles().iter().zip(&square) {
			assert_eq!(particle.target, *corner);
			assert_eq!(particle.position, *corner);
		}
		assert_eq!(surface.clears, 5);
		assert_eq!(surface.circles, 20);
	}

	#[test]
	fn stop_prevents_further_drawing() {
		let mut sim = simulation(options());
		let mut surface = SpySurface::default();
		let mut scheduler = FakeScheduler::default();
		sim.setup(CANVAS, Box::new(Procedural { count: 25 }));
		sim.start(&mut scheduler);

		sim.on_frame(0.0, &mut surface, &mut scheduler);
		sim.on_frame(20.0, &mut surface, &mut scheduler);
		let (clears, circles) = (surface.clears, surface.circles);
		assert_eq!(circles, 50);

		let pending = sim.pending_frame();
		sim.stop(&mut scheduler);
		assert_eq!(sim.state(), LoopState::Stopped);
		assert_eq!(scheduler.cancelled, vec![pending.unwrap()]);
		assert_eq!(sim.pending_frame(), None);

		// A callback that was already queued by the host still fires.
		assert!(!sim.on_frame(40.0, &mut surface, &mut scheduler));
		assert_eq!((surface.clears, surface.circles), (clears, circles));

		let requested = scheduler.requested.len();
		sim.stop(&mut scheduler);
		assert_eq!(scheduler.cancelled.len(), 1);
		assert_eq!(scheduler.requested.len(), requested);
	}

	#[test]
	fn stop_from_any_state_leaves_nothing_scheduled() {
		let mut surface = SpySurface::default();

		// Unmounted before the image finished loading.
		let mut scheduler = FakeScheduler::default();
		let mut sim = simulation(options());
		sim.stop(&mut scheduler);
		assert_eq!(sim.state(), LoopState::Stopped);
		assert!(scheduler.cancelled.is_empty());

		// Unmounted while paused or mid-run.
		for pause_first in [true, false] {
			let mut scheduler = FakeScheduler::default();
			let mut sim = simulation(options());
			sim.setup(CANVAS, Box::new(Procedural { count: 25 }));
			sim.start(&mut scheduler);
			sim.on_frame(0.0, &mut surface, &mut scheduler);
			if pause_first {
				sim.pause(&mut scheduler);
			}

			sim.stop(&mut scheduler);
			assert_eq!(sim.pending_frame(), None);
			let requested = scheduler.requested.len();
			assert!(!sim.on_frame(100.0, &mut surface, &mut scheduler));
			assert_eq!(scheduler.requested.len(), requested);
			// Every handle ever issued was either consumed by a frame or cancelled.
			let outstanding = requested - 1 - scheduler.cancelled.len();
			assert_eq!(outstanding, 0);
		}
	}

	#[test]
	fn pause_and_resume() {
		let mut sim = simulation(options());
		let mut surface = SpySurface::default();
		let mut scheduler = FakeScheduler::default();
		sim.setup(CANVAS, Box::new(Procedural { count: 25 }));
		sim.start(&mut scheduler);

		sim.pause(&mut scheduler);
		assert_eq!(sim.state(), LoopState::Paused);
		assert!(!sim.on_frame(0.0, &mut surface, &mut scheduler));
		assert_eq!(surface.circles, 0);

		assert!(sim.start(&mut scheduler));
		assert!(sim.on_frame(16.0, &mut surface, &mut scheduler));
		assert_eq!(surface.circles, 25);
	}

	#[test]
	fn throttled_frames_skip_work_but_reschedule() {
		let mut sim = simulation(ParticleOptions {
			frame_interval_ms: 1000.0 / 60.0,
			..options()
		});
		let mut surface = SpySurface::default();
		let mut scheduler = FakeScheduler::default();
		sim.setup(CANVAS, Box::new(Procedural { count: 25 }));
		sim.start(&mut scheduler);

		assert!(sim.on_frame(100.0, &mut surface, &mut scheduler));
		assert!(!sim.on_frame(105.0, &mut surface, &mut scheduler));
		assert!(!sim.on_frame(110.0, &mut surface, &mut scheduler));
		assert!(sim.on_frame(117.0, &mut surface, &mut scheduler));

		assert_eq!(surface.clears, 2);
		// start + one request per callback
		assert_eq!(scheduler.requested.len(), 5);
	}

	#[test]
	fn resize_burst_rebuilds_once() {
		let builds = Rc::new(Cell::new(0));
		let mut sim = simulation(options());
		let mut surface = SpySurface::default();
		let mut scheduler = FakeScheduler::default();
		sim.setup(
			CANVAS,
			Box::new(Counting {
				builds: builds.clone(),
			}),
		);
		sim.start(&mut scheduler);
		assert_eq!(builds.get(), 1);

		for i in 0..10 {
			let now = i as f64 * 20.0;
			sim.request_resize(now, Size::new(1000.0 + i as f64, 700.0));
			sim.on_frame(now + 1.0, &mut surface, &mut scheduler);
		}
		for now in [300.0, 431.0, 500.0, 1000.0] {
			sim.on_frame(now, &mut surface, &mut scheduler);
		}

		assert_eq!(builds.get(), 2);
		assert_eq!(surface.resizes, vec![Size::new(1009.0, 700.0)]);
		assert_eq!(sim.size(), Size::new(1009.0, 700.0));
	}

	#[test]
	fn failed_source_falls_back_to_random_field() {
		let mut sim = simulation(options());
		sim.setup(CANVAS, Box::new(Failing));
		assert_eq!(sim.state(), LoopState::Ready);
		assert_eq!(sim.particles().len(), 25);
		for p in sim.particles() {
			assert!((0.0..800.0).contains(&p.target.x));
			assert!((0.0..600.0).contains(&p.target.y));
		}
	}

	#[test]
	fn empty_field_renders_nothing() {
		let mut sim = simulation(options());
		let mut surface = SpySurface::default();
		let mut scheduler = FakeScheduler::default();
		sim.setup(CANVAS, Box::new(Fixed(Vec::new())));
		sim.start(&mut scheduler);
		assert!(sim.on_frame(0.0, &mut surface, &mut scheduler));
		assert_eq!((surface.clears, surface.circles), (1, 0));
	}

	#[test]
	fn degenerate_canvas_builds_no_particles() {
		let mut sim = simulation(options());
		sim.setup(Size::new(0.0, 0.0), Box::new(Procedural { count: 25 }));
		assert!(sim.particles().is_empty());
	}

	#[test]
	fn rebuild_recycles_particles() {
		let mut sim = simulation(options());
		sim.setup(CANVAS, Box::new(Procedural { count: 25 }));
		let mut before: Vec<f64> = sim.particles().iter().map(|p| p.size).collect();

		sim.rebuild();
		let mut after: Vec<f64> = sim.particles().iter().map(|p| p.size).collect();

		before.sort_by(f64::total_cmp);
		after.sort_by(f64::total_cmp);
		assert_eq!(before, after);
	}

	#[test]
	fn trail_fades_instead_of_clearing() {
		let mut sim = simulation(ParticleOptions {
			trail: Some(0.6),
			..options()
		});
		let mut surface = SpySurface::default();
		let mut scheduler = FakeScheduler::default();
		sim.setup(CANVAS, Box::new(Procedural { count: 25 }));
		sim.start(&mut scheduler);
		sim.on_frame(0.0, &mut surface, &mut scheduler);
		assert_eq!((surface.fades, surface.clears), (1, 0));
	}

	#[test]
	fn cursor_only_acts_while_present() {
		let at = DVec2::new(400.0, 300.0);
		let mut sim = simulation(ParticleOptions {
			smoothing: 1.0,
			..options()
		});
		let mut surface = SpySurface::default();
		let mut scheduler = FakeScheduler::default();
		sim.setup(CANVAS, Box::new(Fixed(vec![at])));
		sim.start(&mut scheduler);
		sim.set_scroll(scroll_to(1.0));

		sim.set_cursor(Some(at + DVec2::new(30.0, 0.0)));
		sim.on_frame(0.0, &mut surface, &mut scheduler);
		assert!(sim.particles()[0].position.x > at.x);

		sim.set_cursor(None);
		sim.on_frame(20.0, &mut surface, &mut scheduler);
		assert_eq!(sim.particles()[0].position, at);
	}
}
