//! Particle colors.
//!
//! Colors are stored as RGBA and produced either from a single solid value or
//! by jittering hue, saturation and lightness around a base hue.

use std::str::FromStr;

use rand::Rng;
use serde::Deserialize;

use super::error::ParticleError;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Opacity in `[0, 1]`.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with explicit opacity.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same color with opacity replaced.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Convert from HSL. `h` is in degrees, `s` and `l` in percent.
	pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
		let h = h.rem_euclid(360.0) / 360.0;
		let s = (s / 100.0).clamp(0.0, 1.0);
		let l = (l / 100.0).clamp(0.0, 1.0);

		if s == 0.0 {
			let v = (l * 255.0).round() as u8;
			return Self::rgb(v, v, v);
		}

		let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
		let p = 2.0 * l - q;
		let channel = |t: f64| {
			let t = t.rem_euclid(1.0);
			let v = if t < 1.0 / 6.0 {
				p + (q - p) * 6.0 * t
			} else if t < 0.5 {
				q
			} else if t < 2.0 / 3.0 {
				p + (q - p) * (2.0 / 3.0 - t) * 6.0
			} else {
				p
			};
			(v * 255.0).round() as u8
		};

		Self::rgb(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
	}

	/// CSS color string; hex when opaque, `rgba()` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

impl FromStr for Color {
	type Err = ParticleError;

	/// Parses hex (`#RRGGBB`) and `rgb()`/`rgba()` functional notation.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || ParticleError::InvalidConfiguration(format!("unrecognized color {:?}", s));
		let s = s.trim();

		if let Some(hex) = s.strip_prefix('#') {
			// from_str_radix alone would accept a sign.
			if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
				return Err(invalid());
			}
			let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
			return Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?));
		}

		let (body, arity) = if let Some(body) = s.strip_prefix("rgba(") {
			(body, 4)
		} else if let Some(body) = s.strip_prefix("rgb(") {
			(body, 3)
		} else {
			return Err(invalid());
		};
		let body = body.strip_suffix(')').ok_or_else(invalid)?;
		let nums: Vec<&str> = body.split(',').map(str::trim).collect();
		if nums.len() != arity {
			return Err(invalid());
		}
		let channel = |i: usize| nums[i].parse::<u8>().map_err(|_| invalid());
		let a = match nums.get(3) {
			Some(a) => a.parse::<f64>().map_err(|_| invalid())?,
			None => 1.0,
		};
		if !(0.0..=1.0).contains(&a) {
			return Err(invalid());
		}
		Ok(Color::rgba(channel(0)?, channel(1)?, channel(2)?, a))
	}
}

impl TryFrom<String> for Color {
	type Error = ParticleError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// How each particle's color is chosen at creation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorScheme {
	/// Every particle shares one color.
	Solid(Color),
	/// Hue jittered by up to `hue_spread` degrees either side of `hue`;
	/// saturation and lightness drawn uniformly from their ranges (percent).
	#[serde(rename_all = "camelCase")]
	Jitter {
		/// Base hue in degrees.
		hue: f64,
		/// Maximum hue offset in degrees.
		hue_spread: f64,
		/// Saturation range in percent.
		saturation: (f64, f64),
		/// Lightness range in percent.
		lightness: (f64, f64),
	},
}

impl ColorScheme {
	/// Turquoise variations.
	pub fn turquoise() -> Self {
		ColorScheme::Jitter {
			hue: 170.0,
			hue_spread: 20.0,
			saturation: (70.0, 100.0),
			lightness: (50.0, 70.0),
		}
	}

	/// Draw one particle color.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Color {
		match *self {
			ColorScheme::Solid(color) => color,
			ColorScheme::Jitter {
				hue,
				hue_spread,
				saturation,
				lightness,
			} => Color::from_hsl(
				hue + rng.gen_range(-hue_spread..=hue_spread),
				rng.gen_range(saturation.0..=saturation.1),
				rng.gen_range(lightness.0..=lightness.1),
			),
		}
	}

	pub(crate) fn validate(&self) -> Result<(), ParticleError> {
		let ColorScheme::Jitter {
			hue,
			hue_spread,
			saturation,
			lightness,
		} = *self
		else {
			return Ok(());
		};

		let percent = |name: &str, (lo, hi): (f64, f64)| {
			if (0.0..=100.0).contains(&lo) && (0.0..=100.0).contains(&hi) && lo <= hi {
				Ok(())
			} else {
				Err(ParticleError::InvalidConfiguration(format!(
					"{} range {}..{} must be ordered within 0..100",
					name, lo, hi
				)))
			}
		};

		if !(0.0..360.0).contains(&hue) {
			return Err(ParticleError::InvalidConfiguration(format!(
				"hue {} must be within 0..360",
				hue
			)));
		}
		if !(0.0..=180.0).contains(&hue_spread) {
			return Err(ParticleError::InvalidConfiguration(format!(
				"hueSpread {} must be within 0..180",
				hue_spread
			)));
		}
		percent("saturation", saturation)?;
		percent("lightness", lightness)
	}
}

impl Default for ColorScheme {
	fn default() -> Self {
		Self::turquoise()
	}
}
