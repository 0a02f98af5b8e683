//! Scroll-driven particle field.
//!
//! Particles start scattered across the canvas and converge on a target field
//! as the page scrolls, while a cursor force pulls (or pushes) the ones
//! nearby:
//! - Targets traced from an image's opaque pixels, or random points
//! - Linear baseline→target interpolation with an in-transit wobble
//! - Radial cursor force with a hard cutoff radius
//! - Smoothed scroll progress, throttled frames, debounced resize
//! - Particle reuse across rebuilds
//!
//! Everything except `canvas` and `component` is independent of the browser.
//!
//! # Example
//!
//! ```ignore
//! use scroll_particles::{ParticleCanvas, ParticleOptions};
//!
//! view! {
//!     <ParticleCanvas
//!         options=ParticleOptions { particle_count: 800, ..Default::default() }
//!         image_url=Some("logo.png".to_string())
//!         fullscreen=true
//!     />
//! }
//! ```

mod canvas;
mod component;
pub mod cursor;
pub mod error;
pub mod options;
pub mod particle;
pub mod pool;
pub mod scroll;
pub mod simulation;
pub mod surface;
pub mod targets;
pub mod theme;
pub mod timing;

pub use component::ParticleCanvas;
pub use error::ParticleError;
pub use options::ParticleOptions;
pub use simulation::{LoopState, Simulation};
