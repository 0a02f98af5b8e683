//! Leptos component wrapping the particle canvas.
//!
//! The component sizes a canvas, builds the [`Simulation`], and forwards
//! pointer, scroll and resize events into it. Frames are driven by
//! `requestAnimationFrame` through [`AnimationFrames`]. When an image URL is
//! given, setup waits for the image to load; a failed load falls back to a
//! random target field. Unmounting stops the loop and detaches the window
//! listeners.

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec2;
use leptos::prelude::*;
use log::{error, info, warn};
use rand::rngs::SmallRng;
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, MouseEvent};

use super::canvas::{self, AnimationFrames, CanvasOffscreen, CanvasSurface, FrameCallback};
use super::options::ParticleOptions;
use super::simulation::{LoopState, Simulation};
use super::surface::Size;
use super::targets::{ImageTargets, Procedural, TargetSource};

/// Bundles the simulation with the browser capabilities it draws through.
struct FieldContext {
	sim: Simulation<SmallRng>,
	surface: CanvasSurface,
	frames: AnimationFrames,
}

impl FieldContext {
	fn setup(&mut self, source: Box<dyn TargetSource>, paused: bool) {
		let size = self.surface.size();
		self.sim.setup(size, source);
		if !paused {
			self.sim.start(&mut self.frames);
		}
	}

	fn shutdown(&mut self) {
		self.sim.stop(&mut self.frames);
	}
}

/// Window listeners installed by the component, kept so they can be removed.
type Listeners = Rc<RefCell<Vec<(&'static str, Closure<dyn FnMut()>)>>>;

/// Stop the loop, detach listeners and drop the frame closure.
///
/// The frame closure holds the context, which holds the closure through its
/// scheduler; clearing the slot breaks that cycle.
fn teardown(
	context: &Rc<RefCell<Option<FieldContext>>>,
	animate: &FrameCallback,
	listeners: &Listeners,
) {
	if let Ok(mut slot) = context.try_borrow_mut() {
		if let Some(c) = slot.as_mut() {
			c.shutdown();
		}
		*slot = None;
	}
	if let Some(window) = web_sys::window() {
		for (event, cb) in listeners.borrow().iter() {
			let _ = window.remove_event_listener_with_callback(event, cb.as_ref().unchecked_ref());
		}
	}
	listeners.borrow_mut().clear();
	animate.borrow_mut().take();
	info!("scroll-particles: unmounted");
}

/// Measure the size the canvas should take.
fn measure(
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> Size {
	if fullscreen {
		return canvas::viewport_size().unwrap_or(Size::new(800.0, 600.0));
	}
	let parent = canvas.parent_element();
	Size::new(
		width.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_width() as f64)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_height() as f64)
				.unwrap_or(600.0)
		}),
	)
}

fn pointer_position(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> DVec2 {
	let rect = canvas.get_bounding_client_rect();
	DVec2::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Renders a scroll-driven particle field on a canvas element.
///
/// Particles start scattered and converge on their targets as the page
/// scrolls. Targets trace the opaque pixels of `image_url` when given, or are
/// random points otherwise. Set `fullscreen = true` to fill the viewport;
/// explicit `width`/`height` override sizing to the parent. Toggling `paused`
/// suspends and resumes the frame loop.
#[component]
pub fn ParticleCanvas(
	#[prop(optional)] options: ParticleOptions,
	#[prop(default = None)] image_url: Option<String>,
	#[prop(into, default = Signal::stored(false))] paused: Signal<bool>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<FieldContext>>> = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let listeners: Listeners = Rc::new(RefCell::new(Vec::new()));
	let rebuild_on_click = options.rebuild_on_click;
	let (context_init, animate_init) = (context.clone(), animate.clone());
	let listeners_init = listeners.clone();

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let size = measure(&canvas, fullscreen, width, height);
		canvas.set_width(size.width as u32);
		canvas.set_height(size.height as u32);

		let surface = match CanvasSurface::new(canvas.clone(), options.glow) {
			Ok(surface) => surface,
			Err(e) => {
				error!("scroll-particles: {}", e);
				return;
			}
		};
		let mut sim = match Simulation::new(options.clone(), canvas::seeded_rng()) {
			Ok(sim) => sim,
			Err(e) => {
				error!("scroll-particles: {}", e);
				return;
			}
		};
		if let Some(sample) = canvas::scroll_sample() {
			sim.set_scroll(sample);
		}

		*context_init.borrow_mut() = Some(FieldContext {
			sim,
			surface,
			frames: AnimationFrames::new(animate_init.clone()),
		});

		let context_anim = context_init.clone();
		*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				c.sim.on_frame(now, &mut c.surface, &mut c.frames);
			}
		}));

		let context_scroll = context_init.clone();
		let on_scroll = Closure::<dyn FnMut()>::new(move || {
			if let (Some(c), Some(sample)) =
				(context_scroll.borrow_mut().as_mut(), canvas::scroll_sample())
			{
				c.sim.set_scroll(sample);
			}
		});

		let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
		let on_resize = Closure::<dyn FnMut()>::new(move || {
			let size = measure(&canvas_resize, fullscreen, width, height);
			if let Some(ref mut c) = *context_resize.borrow_mut() {
				c.sim.request_resize(canvas::now(), size);
			}
		});

		for (event, cb) in [("scroll", on_scroll), ("resize", on_resize)] {
			let registered =
				window.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref());
			if let Err(e) = registered {
				warn!("scroll-particles: could not listen for {}: {:?}", event, e);
			}
			listeners_init.borrow_mut().push((event, cb));
		}

		let fallback = Procedural {
			count: options.particle_count,
		};
		match image_url.clone() {
			Some(url) => {
				let context_load = context_init.clone();
				let (stride, threshold) = (options.grid_stride, options.alpha_threshold);
				canvas::load_image(&url, move |loaded| {
					let source: Box<dyn TargetSource> =
						match loaded.and_then(|image| Ok((CanvasOffscreen::new()?, image))) {
							Ok((offscreen, image)) => {
								Box::new(ImageTargets::new(offscreen, image, stride, threshold))
							}
							Err(e) => {
								warn!("scroll-particles: {}, using random targets", e);
								Box::new(fallback)
							}
						};
					if let Some(ref mut c) = *context_load.borrow_mut() {
						c.setup(source, paused.get_untracked());
					}
				});
			}
			None => {
				if let Some(ref mut c) = *context_init.borrow_mut() {
					c.setup(Box::new(fallback), paused.get_untracked());
				}
			}
		}
	});

	let context_pause = context.clone();
	Effect::new(move |_| {
		let paused = paused.get();
		if let Some(ref mut c) = *context_pause.borrow_mut() {
			if c.sim.state() == LoopState::Uninitialized {
				return;
			}
			if paused {
				c.sim.pause(&mut c.frames);
			} else {
				c.sim.start(&mut c.frames);
			}
		}
	});

	// on_cleanup needs Send; the handles never leave the main thread.
	let handles = SendWrapper::new((context.clone(), animate, listeners));
	on_cleanup(move || {
		let (context, animate, listeners) = &*handles;
		teardown(context, animate, listeners);
	});

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let position = pointer_position(&canvas, &ev);
		if let Some(ref mut c) = *context_mm.borrow_mut() {
			c.sim.set_cursor(Some(position));
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.sim.set_cursor(None);
		}
	};

	let context_click = context.clone();
	let on_click = move |_: MouseEvent| {
		if !rebuild_on_click {
			return;
		}
		if let Some(ref mut c) = *context_click.borrow_mut() {
			c.sim.rebuild();
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="particle-canvas"
			on:mousemove=on_mousemove
			on:mouseleave=on_mouseleave
			on:click=on_click
			style="display: block;"
		/>
	}
}
