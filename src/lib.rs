//! scroll-particles: a scroll-driven, cursor-reactive particle field.
//!
//! This crate provides a WASM canvas component whose particles assemble into
//! an image silhouette (or a random field) as the page scrolls, and bend
//! around the pointer.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::particle_field::{ParticleCanvas, ParticleError, ParticleOptions};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("scroll-particles: logging initialized");
}

/// Page-level configuration: particle options plus the optional silhouette image.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
	/// Silhouette image; random targets when absent.
	#[serde(default)]
	pub image_url: Option<String>,
	/// Everything else in the object.
	#[serde(flatten)]
	pub options: ParticleOptions,
}

impl PageConfig {
	/// Parse and validate a JSON configuration.
	pub fn from_json(json: &str) -> Result<Self, ParticleError> {
		let config: PageConfig = serde_json::from_str(json)
			.map_err(|e| ParticleError::InvalidConfiguration(e.to_string()))?;
		config.options.validate()?;
		Ok(config)
	}
}

/// Load configuration from a script element with id="particle-options".
/// Expected format: JSON object, every field optional.
fn load_config() -> Option<PageConfig> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("particle-options")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match PageConfig::from_json(&json_text) {
		Ok(config) => {
			info!(
				"scroll-particles: loaded options ({} particles, image: {})",
				config.options.particle_count,
				config.image_url.as_deref().unwrap_or("none")
			);
			Some(config)
		}
		Err(e) => {
			warn!("scroll-particles: ignoring page options: {}", e);
			None
		}
	}
}

/// Main application component.
/// Loads options from the DOM and renders the particle field behind a tall
/// scroll track.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let PageConfig { image_url, options } = load_config().unwrap_or_default();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Scroll Particles" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="particle-backdrop" style="position: fixed; inset: 0;">
			<ParticleCanvas options=options image_url=image_url fullscreen=true />
		</div>
		<div class="scroll-track" style="position: relative; height: 400vh; pointer-events: none;">
			<h1>"Scroll"</h1>
			<p class="subtitle">"Scroll to assemble the particles. Move the pointer to disturb them. Click to scatter."</p>
		</div>
	}
}
