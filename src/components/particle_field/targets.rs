//! Target field construction.
//!
//! A target field is the ordered list of points particles converge to at full
//! progress. It comes either from the opaque pixels of an image fitted to the
//! canvas, or from uniformly random points.

use glam::DVec2;
use rand::{Rng, RngCore};

use super::error::{ParticleError, Result};
use super::surface::{ImageSource, Offscreen, Rect, Size};

/// Produces a target field for a canvas size. Rebuilt on setup and resize.
pub trait TargetSource {
	/// Target points in canvas coordinates; empty is a valid field.
	fn build(&mut self, size: Size, rng: &mut dyn RngCore) -> Result<Vec<DVec2>>;
}

/// `count` uniformly random points in `[0, width) x [0, height)`.
pub fn procedural<R: Rng + ?Sized>(count: usize, size: Size, rng: &mut R) -> Vec<DVec2> {
	if size.is_degenerate() {
		return Vec::new();
	}
	(0..count)
		.map(|_| {
			DVec2::new(
				rng.gen_range(0.0..size.width),
				rng.gen_range(0.0..size.height),
			)
		})
		.collect()
}

/// Largest rect with the image's aspect ratio that fits the canvas, centered.
pub fn fit_rect(image: (u32, u32), canvas: Size) -> Result<Rect> {
	let (iw, ih) = (image.0 as f64, image.1 as f64);
	if iw == 0.0 || ih == 0.0 {
		return Err(ParticleError::DegenerateGeometry {
			width: iw,
			height: ih,
		});
	}
	if canvas.is_degenerate() {
		return Err(ParticleError::DegenerateGeometry {
			width: canvas.width,
			height: canvas.height,
		});
	}

	let scale = (canvas.width / iw).min(canvas.height / ih);
	let (width, height) = (iw * scale, ih * scale);
	Ok(Rect {
		x: canvas.width / 2.0 - width / 2.0,
		y: canvas.height / 2.0 - height / 2.0,
		width,
		height,
	})
}

/// Composite `image` into `offscreen` at canvas size and keep every grid
/// point whose alpha exceeds `threshold`. The count depends on the image.
pub fn from_image<O: Offscreen>(
	offscreen: &mut O,
	image: &O::Image,
	canvas: Size,
	stride: u32,
	threshold: u8,
) -> Result<Vec<DVec2>> {
	let rect = fit_rect(image.dimensions(), canvas)?;
	let (width, height) = (canvas.width as u32, canvas.height as u32);
	offscreen.resize(width, height);
	offscreen.draw_image(image, rect)?;

	let stride = stride.max(1) as usize;
	let mut points = Vec::new();
	for y in (0..height).step_by(stride) {
		for x in (0..width).step_by(stride) {
			if offscreen.alpha_at(x, y) > threshold {
				points.push(DVec2::new(x as f64, y as f64));
			}
		}
	}
	Ok(points)
}

/// Uniformly random field of a fixed size.
#[derive(Clone, Debug)]
pub struct Procedural {
	/// Number of points per build.
	pub count: usize,
}

impl TargetSource for Procedural {
	fn build(&mut self, size: Size, rng: &mut dyn RngCore) -> Result<Vec<DVec2>> {
		Ok(procedural(self.count, size, rng))
	}
}

/// Field traced from an image's opaque pixels.
pub struct ImageTargets<O: Offscreen> {
	offscreen: O,
	image: O::Image,
	stride: u32,
	threshold: u8,
}

impl<O: Offscreen> ImageTargets<O> {
	/// Sample `image` every `stride` pixels, keeping alpha above `threshold`.
	pub fn new(offscreen: O, image: O::Image, stride: u32, threshold: u8) -> Self {
		Self {
			offscreen,
			image,
			stride,
			threshold,
		}
	}
}

impl<O: Offscreen> TargetSource for ImageTargets<O> {
	fn build(&mut self, size: Size, _rng: &mut dyn RngCore) -> Result<Vec<DVec2>> {
		from_image(
			&mut self.offscreen,
			&self.image,
			size,
			self.stride,
			self.threshold,
		)
	}
}
