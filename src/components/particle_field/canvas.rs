//! Browser implementations of the drawing and scheduling capabilities.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use glam::DVec2;
use log::warn;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, Window};

use super::error::{ParticleError, Result};
use super::scroll::ScrollSample;
use super::surface::{ImageSource, Offscreen, Rect, Size, Surface};
use super::theme::Color;
use super::timing::{FrameHandle, FrameScheduler};

fn js_error(context: &str, e: JsValue) -> ParticleError {
	ParticleError::ResourceLoad(format!("{}: {:?}", context, e))
}

fn window() -> Result<Window> {
	web_sys::window().ok_or_else(|| ParticleError::ResourceLoad("no window".into()))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")
		.map_err(|e| js_error("getContext", e))?
		.ok_or_else(|| ParticleError::ResourceLoad("2d context unavailable".into()))?
		.dyn_into()
		.map_err(|e| js_error("2d context", e.into()))
}

/// Milliseconds from `performance.now()`, or 0 outside a browser.
pub fn now() -> f64 {
	web_sys::window()
		.and_then(|w| w.performance())
		.map(|p| p.now())
		.unwrap_or(0.0)
}

/// Random source seeded from `Math.random()`.
pub fn seeded_rng() -> SmallRng {
	SmallRng::seed_from_u64((js_sys::Math::random() * u64::MAX as f64) as u64)
}

/// Current scroll geometry of the page.
pub fn scroll_sample() -> Option<ScrollSample> {
	let window = web_sys::window()?;
	let root = window.document()?.document_element()?;
	Some(ScrollSample {
		offset_y: window.scroll_y().ok()?,
		document_height: root.scroll_height() as f64,
		viewport_height: window.inner_height().ok()?.as_f64()?,
	})
}

/// Size of the browser viewport.
pub fn viewport_size() -> Option<Size> {
	let window = web_sys::window()?;
	Some(Size::new(
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

/// The visible canvas.
pub struct CanvasSurface {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	glow: f64,
}

impl CanvasSurface {
	/// Wrap `canvas`, drawing particles with `glow` shadow blur.
	pub fn new(canvas: HtmlCanvasElement, glow: f64) -> Result<Self> {
		let ctx = context_2d(&canvas)?;
		Ok(Self { canvas, ctx, glow })
	}

	/// Current backing-store size.
	pub fn size(&self) -> Size {
		Size::new(self.canvas.width() as f64, self.canvas.height() as f64)
	}
}

impl Surface for CanvasSurface {
	fn resize(&mut self, size: Size) {
		self.canvas.set_width(size.width.max(0.0) as u32);
		self.canvas.set_height(size.height.max(0.0) as u32);
	}

	fn clear(&mut self, region: Rect) {
		self.ctx.clear_rect(region.x, region.y, region.width, region.height);
	}

	fn fade(&mut self, region: Rect, color: Color, alpha: f64) {
		self.ctx.set_global_alpha(1.0);
		self.ctx.set_shadow_blur(0.0);
		self.ctx.set_fill_style_str(&color.with_alpha(alpha).to_css());
		self.ctx.fill_rect(region.x, region.y, region.width, region.height);
	}

	fn draw_circle(&mut self, center: DVec2, radius: f64, color: Color, opacity: f64) {
		let css = color.to_css();
		self.ctx.set_global_alpha(opacity);
		if self.glow > 0.0 {
			self.ctx.set_shadow_blur(self.glow);
			self.ctx.set_shadow_color(&css);
		}
		self.ctx.set_fill_style_str(&css);
		self.ctx.begin_path();
		let _ = self.ctx.arc(center.x, center.y, radius, 0.0, TAU);
		self.ctx.fill();
	}
}

impl ImageSource for HtmlImageElement {
	fn dimensions(&self) -> (u32, u32) {
		(self.natural_width(), self.natural_height())
	}
}

/// Detached canvas used to rasterize the source image before sampling.
///
/// Pixels are read back once per draw and cached for `alpha_at`.
pub struct CanvasOffscreen {
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	pixels: Vec<u8>,
	width: u32,
	height: u32,
}

impl CanvasOffscreen {
	pub fn new() -> Result<Self> {
		let canvas: HtmlCanvasElement = window()?
			.document()
			.ok_or_else(|| ParticleError::ResourceLoad("no document".into()))?
			.create_element("canvas")
			.map_err(|e| js_error("createElement", e))?
			.dyn_into()
			.map_err(|e| js_error("offscreen canvas", e.into()))?;
		let ctx = context_2d(&canvas)?;
		Ok(Self {
			canvas,
			ctx,
			pixels: Vec::new(),
			width: 0,
			height: 0,
		})
	}
}

impl Offscreen for CanvasOffscreen {
	type Image = HtmlImageElement;

	fn resize(&mut self, width: u32, height: u32) {
		self.canvas.set_width(width);
		self.canvas.set_height(height);
		self.width = width;
		self.height = height;
		self.pixels.clear();
		self.pixels.resize(width as usize * height as usize * 4, 0);
	}

	fn draw_image(&mut self, image: &HtmlImageElement, rect: Rect) -> Result<()> {
		if self.width == 0 || self.height == 0 {
			return Err(ParticleError::DegenerateGeometry {
				width: self.width as f64,
				height: self.height as f64,
			});
		}
		self.ctx.clear_rect(0.0, 0.0, self.width as f64, self.height as f64);
		self.ctx
			.draw_image_with_html_image_element_and_dw_and_dh(
				image,
				rect.x,
				rect.y,
				rect.width,
				rect.height,
			)
			.map_err(|e| js_error("drawImage", e))?;

		// Throws on cross-origin images without CORS headers.
		let data = self
			.ctx
			.get_image_data(0.0, 0.0, self.width as f64, self.height as f64)
			.map_err(|e| js_error("getImageData", e))?;
		self.pixels = data.data().0;
		Ok(())
	}

	fn alpha_at(&self, x: u32, y: u32) -> u8 {
		if x >= self.width || y >= self.height {
			return 0;
		}
		let i = (y as usize * self.width as usize + x as usize) * 4 + 3;
		self.pixels.get(i).copied().unwrap_or(0)
	}
}

/// Shared slot for the frame callback, filled once the loop closure exists.
pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// `requestAnimationFrame`-backed scheduler.
pub struct AnimationFrames {
	callback: FrameCallback,
}

impl AnimationFrames {
	pub fn new(callback: FrameCallback) -> Self {
		Self { callback }
	}
}

impl FrameScheduler for AnimationFrames {
	fn request_frame(&mut self) -> FrameHandle {
		let requested = match (web_sys::window(), self.callback.borrow().as_ref()) {
			(Some(window), Some(cb)) => window
				.request_animation_frame(cb.as_ref().unchecked_ref())
				.map_err(|e| js_error("requestAnimationFrame", e)),
			_ => Err(ParticleError::ResourceLoad("frame callback not installed".into())),
		};
		match requested {
			Ok(id) => FrameHandle(id),
			Err(e) => {
				warn!("scroll-particles: {}", e);
				FrameHandle(0)
			}
		}
	}

	fn cancel_frame(&mut self, handle: FrameHandle) {
		if let Some(window) = web_sys::window() {
			let _ = window.cancel_animation_frame(handle.0);
		}
	}
}

/// Start loading `url`; `done` runs once with the decoded element or the failure.
pub fn load_image(url: &str, done: impl FnOnce(Result<HtmlImageElement>) + 'static) {
	let image = match HtmlImageElement::new() {
		Ok(image) => image,
		Err(e) => return done(Err(js_error("Image", e))),
	};
	image.set_cross_origin(Some("anonymous"));

	type Done = Box<dyn FnOnce(Result<HtmlImageElement>)>;
	let done: Rc<RefCell<Option<Done>>> = Rc::new(RefCell::new(Some(Box::new(done))));

	let (done_load, loaded) = (done.clone(), image.clone());
	let onload = Closure::once_into_js(move || {
		if let Some(done) = done_load.borrow_mut().take() {
			done(Ok(loaded));
		}
	});
	let url_err = url.to_string();
	let onerror = Closure::once_into_js(move || {
		if let Some(done) = done.borrow_mut().take() {
			done(Err(ParticleError::ResourceLoad(format!(
				"could not load {}",
				url_err
			))));
		}
	});

	image.set_onload(Some(onload.unchecked_ref()));
	image.set_onerror(Some(onerror.unchecked_ref()));
	image.set_src(url);
}
