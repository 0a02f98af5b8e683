//! Error types for the particle field.
//!
//! Only configuration mistakes surface to the caller. Load failures and
//! degenerate geometry are reported by target sources and absorbed by the
//! simulation, which falls back to a procedural field.

use std::fmt;

/// Errors produced while configuring or building a particle field.
#[derive(Clone, Debug, PartialEq)]
pub enum ParticleError {
	/// The source image could not be loaded or decoded.
	ResourceLoad(String),
	/// A canvas or image with no area was supplied where one was required.
	DegenerateGeometry {
		/// Offending width.
		width: f64,
		/// Offending height.
		height: f64,
	},
	/// An option is outside its accepted range.
	InvalidConfiguration(String),
}

impl fmt::Display for ParticleError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ParticleError::ResourceLoad(msg) => write!(f, "failed to load image: {}", msg),
			ParticleError::DegenerateGeometry { width, height } => {
				write!(f, "degenerate geometry: {}x{} has no area", width, height)
			}
			ParticleError::InvalidConfiguration(msg) => {
				write!(f, "invalid particle configuration: {}", msg)
			}
		}
	}
}

impl std::error::Error for ParticleError {}

/// Result alias used across the particle field.
pub type Result<T> = std::result::Result<T, ParticleError>;
