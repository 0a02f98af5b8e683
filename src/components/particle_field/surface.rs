//! Drawing capabilities the simulation depends on.
//!
//! The visible canvas implements [`Surface`]; the scratch buffer used to turn
//! an image into target points implements [`Offscreen`]. Browser-backed
//! implementations live in `canvas`; [`RasterCanvas`] is a software offscreen
//! over an RGBA buffer.

use glam::DVec2;

use super::error::{ParticleError, Result};
use super::theme::Color;

/// Width and height in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

impl Size {
	/// Size from its two sides.
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// True when either side is zero, negative or not a number.
	pub fn is_degenerate(&self) -> bool {
		!(self.width > 0.0 && self.height > 0.0)
	}
}

/// Axis-aligned rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	/// Left edge.
	pub x: f64,
	/// Top edge.
	pub y: f64,
	/// Horizontal extent.
	pub width: f64,
	/// Vertical extent.
	pub height: f64,
}

impl Rect {
	/// Rectangle at the origin covering `size`.
	pub fn from_size(size: Size) -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			width: size.width,
			height: size.height,
		}
	}
}

/// The visible drawing target.
pub trait Surface {
	/// Resize the backing store. Contents are discarded.
	fn resize(&mut self, size: Size);
	/// Make `region` fully transparent.
	fn clear(&mut self, region: Rect);
	/// Paint `color` at `alpha` over `region`, leaving a fading copy of what was there.
	fn fade(&mut self, region: Rect, color: Color, alpha: f64);
	/// Fill a circle.
	fn draw_circle(&mut self, center: DVec2, radius: f64, color: Color, opacity: f64);
}

/// Anything with pixel dimensions that an [`Offscreen`] can draw.
pub trait ImageSource {
	/// Intrinsic width and height in pixels.
	fn dimensions(&self) -> (u32, u32);
}

/// A readable scratch buffer an image is composited into before sampling.
pub trait Offscreen {
	/// Image type this offscreen can draw.
	type Image: ImageSource;

	/// Resize and clear to fully transparent.
	fn resize(&mut self, width: u32, height: u32);
	/// Scale `image` into `rect`.
	fn draw_image(&mut self, image: &Self::Image, rect: Rect) -> Result<()>;
	/// Alpha at a pixel; out-of-bounds reads are transparent.
	fn alpha_at(&self, x: u32, y: u32) -> u8;
}

/// A decoded image: dimensions plus tightly packed RGBA bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
	width: u32,
	height: u32,
	rgba: Vec<u8>,
}

impl RasterImage {
	/// Wrap packed RGBA bytes; the length must match the dimensions.
	pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
		let expected = width as usize * height as usize * 4;
		if rgba.len() != expected {
			return Err(ParticleError::ResourceLoad(format!(
				"pixel buffer holds {} bytes, {}x{} RGBA needs {}",
				rgba.len(),
				width,
				height,
				expected
			)));
		}
		Ok(Self {
			width,
			height,
			rgba,
		})
	}

	/// Build an image by evaluating `pixel` at every coordinate.
	pub fn from_fn(width: u32, height: u32, mut pixel: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
		let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
		for y in 0..height {
			for x in 0..width {
				rgba.extend_from_slice(&pixel(x, y));
			}
		}
		Self {
			width,
			height,
			rgba,
		}
	}

	fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
		let i = (y as usize * self.width as usize + x as usize) * 4;
		[
			self.rgba[i],
			self.rgba[i + 1],
			self.rgba[i + 2],
			self.rgba[i + 3],
		]
	}
}

impl ImageSource for RasterImage {
	fn dimensions(&self) -> (u32, u32) {
		(self.width, self.height)
	}
}

/// Software offscreen using nearest-neighbour scaling.
#[derive(Clone, Debug, Default)]
pub struct RasterCanvas {
	buffer: Option<RasterImage>,
}

impl RasterCanvas {
	/// Empty offscreen; call `resize` before drawing.
	pub fn new() -> Self {
		Self::default()
	}
}

impl Offscreen for RasterCanvas {
	type Image = RasterImage;

	fn resize(&mut self, width: u32, height: u32) {
		self.buffer = Some(RasterImage::from_fn(width, height, |_, _| [0; 4]));
	}

	fn draw_image(&mut self, image: &RasterImage, rect: Rect) -> Result<()> {
		let Some(buffer) = self.buffer.as_mut() else {
			return Err(ParticleError::DegenerateGeometry {
				width: 0.0,
				height: 0.0,
			});
		};
		if image.width == 0 || image.height == 0 || rect.width <= 0.0 || rect.height <= 0.0 {
			return Err(ParticleError::DegenerateGeometry {
				width: rect.width,
				height: rect.height,
			});
		}

		let x0 = rect.x.max(0.0).floor() as u32;
		let y0 = rect.y.max(0.0).floor() as u32;
		let x1 = ((rect.x + rect.width).ceil().max(0.0) as u32).min(buffer.width);
		let y1 = ((rect.y + rect.height).ceil().max(0.0) as u32).min(buffer.height);

		for y in y0..y1 {
			// Sample at pixel centres.
			let v = (y as f64 + 0.5 - rect.y) / rect.height;
			if !(0.0..1.0).contains(&v) {
				continue;
			}
			let sy = ((v * image.height as f64) as u32).min(image.height - 1);
			for x in x0..x1 {
				let u = (x as f64 + 0.5 - rect.x) / rect.width;
				if !(0.0..1.0).contains(&u) {
					continue;
				}
				let sx = ((u * image.width as f64) as u32).min(image.width - 1);
				let src = image.pixel(sx, sy);
				let i = (y as usize * buffer.width as usize + x as usize) * 4;
				buffer.rgba[i..i + 4].copy_from_slice(&src);
			}
		}
		Ok(())
	}

	fn alpha_at(&self, x: u32, y: u32) -> u8 {
		match &self.buffer {
			Some(b) if x < b.width && y < b.height => b.pixel(x, y)[3],
			_ => 0,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_short_pixel_buffers() {
		assert!(RasterImage::new(2, 2, vec![0; 15]).is_err());
		assert!(RasterImage::new(2, 2, vec![0; 16]).is_ok());
	}

	#[test]
	fn upscales_into_rect() {
		// 2x1 image: left opaque, right transparent.
		let image = RasterImage::from_fn(2, 1, |x, _| if x == 0 { [0, 0, 0, 255] } else { [0; 4] });
		let mut canvas = RasterCanvas::new();
		canvas.resize(10, 10);
		canvas
			.draw_image(
				&image,
				Rect {
					x: 2.0,
					y: 3.0,
					width: 4.0,
					height: 2.0,
				},
			)
			.unwrap();

		assert_eq!(canvas.alpha_at(2, 3), 255);
		assert_eq!(canvas.alpha_at(3, 4), 255);
		assert_eq!(canvas.alpha_at(4, 3), 0);
		assert_eq!(canvas.alpha_at(1, 3), 0);
		assert_eq!(canvas.alpha_at(2, 5), 0);
		assert_eq!(canvas.alpha_at(50, 50), 0);
	}

	#[test]
	fn drawing_before_resize_is_degenerate() {
		let image = RasterImage::from_fn(1, 1, |_, _| [0, 0, 0, 255]);
		let err = RasterCanvas::new().draw_image(&image, Rect::default());
		assert!(matches!(err, Err(ParticleError::DegenerateGeometry { .. })));
	}

	#[test]
	fn degenerate_sizes() {
		assert!(Size::new(0.0, 10.0).is_degenerate());
		assert!(Size::new(f64::NAN, 10.0).is_degenerate());
		assert!(!Size::new(1.0, 1.0).is_degenerate());
	}
}
