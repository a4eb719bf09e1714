//! The strip controller.

use std::collections::BTreeMap;

use neopixel_actor_shared::gamma32;
use tracing::{debug, info, warn};

use crate::{
	actor::{ActionResult, Actor, Description},
	command::{self, PixelWidth, SET_COLOR},
	config::{ControllerOptions, StripConfig},
	driver::{DriverFactory, PixelDriver},
	store::SettingsStore,
	Error,
	Result,
};

pub const DEVICE_TYPE: &str = "output";
pub const SET_COLOR_ACTION: &str = "setcolor";

/// Owns a strip configuration, its settings document and the driver built
/// from it.
///
/// The controller is uninitialized until [`initialize`](Self::initialize) or
/// [`set_config`](Self::set_config) succeeds in building a driver. A failed
/// rebuild drops it back to uninitialized.
pub struct NeoPixelsController<F, S> {
	config:      StripConfig,
	config_path: String,
	factory:     F,
	store:       S,
	driver:      Option<Box<dyn PixelDriver>>,
	/// Reused between commands, sized when the driver is built.
	frame:       Vec<u32>,
}

impl<F: DriverFactory, S: SettingsStore> NeoPixelsController<F, S> {
	pub fn new(options: ControllerOptions, factory: F, store: S) -> Self {
		Self {
			config: options.strip_config(),
			config_path: options.settings_path(),
			factory,
			store,
			driver: None,
			frame: Vec::new(),
		}
	}

	/// Loads stored settings, or stores the construction defaults if there
	/// are none yet, and builds the driver.
	pub fn initialize(&mut self) -> Result<()> {
		if !self.store.exists(&self.config_path) {
			info!(path = %self.config_path, "no stored settings, using defaults");
			let defaults = self.get_config();
			self.set_config(&defaults, true)
		} else {
			info!(path = %self.config_path, "loading stored settings");
			let text = self.store.read(&self.config_path).map_err(|source| Error::Persistence {
				path: self.config_path.clone(),
				source,
			})?;
			self.set_config(&text, false)
		}
	}

	/// Runs an action against the strip.
	pub fn apply_command(&mut self, action: i32, payload: &str) -> Result<()> {
		if action != SET_COLOR {
			return Err(Error::UnknownAction(action));
		}
		let Some(driver) = self.driver.as_mut() else {
			return Err(Error::NotInitialized);
		};

		let width = command::decode_frame(payload, self.config.led_count, &mut self.frame)?;
		check_width(width, &self.config)?;

		write_frame(&mut **driver, &self.frame, self.config.gamma_correction)
	}

	/// The current configuration as a settings document.
	pub fn get_config(&self) -> String {
		self.config.encode()
	}

	/// Replaces the whole configuration and rebuilds the driver.
	///
	/// Nothing changes if `text` does not decode, or if `persist` is set and
	/// the document cannot be stored. A driver that fails to come up leaves
	/// the new configuration in place with the controller uninitialized.
	pub fn set_config(&mut self, text: &str, persist: bool) -> Result<()> {
		let config = StripConfig::decode(text).inspect_err(|e| warn!("rejected config: {}", e))?;

		if persist {
			self.store
				.write(&self.config_path, &config.encode())
				.map_err(|source| Error::Persistence {
					path: self.config_path.clone(),
					source,
				})
				.inspect_err(|e| warn!("{}", e))?;
		}

		self.config = config;
		self.configure_output()
	}

	fn configure_output(&mut self) -> Result<()> {
		// the old handle must be gone before the next one claims the output
		self.driver = None;
		self.frame = Vec::with_capacity(self.config.led_count);

		let mut driver = self.factory.build(&self.config).map_err(Error::into_driver_init)?;
		driver.begin().map_err(Error::into_driver_init)?;

		info!(
			pin = self.config.pin,
			leds = self.config.led_count,
			layout = self.config.layout.raw(),
			gamma = self.config.gamma_correction,
			"strip configured"
		);
		self.driver = Some(driver);

		Ok(())
	}

	pub fn is_ready(&self) -> bool {
		self.driver.is_some()
	}

	pub fn config(&self) -> &StripConfig {
		&self.config
	}

	pub fn config_path(&self) -> &str {
		&self.config_path
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	pub fn store_mut(&mut self) -> &mut S {
		&mut self.store
	}
}

/// Row width must match the channel count of the configured layout.
fn check_width(width: PixelWidth, config: &StripConfig) -> Result<()> {
	let expected = config.layout.channel_count();
	if width.channels() != expected {
		return Err(Error::Shape(format!(
			"strip layout takes {} values per pixel, got {}",
			expected,
			width.channels()
		)));
	}
	Ok(())
}

/// Buffers every pixel, then transmits once.
fn write_frame(driver: &mut dyn PixelDriver, frame: &[u32], gamma_correction: bool) -> Result<()> {
	for (index, &color) in frame.iter().enumerate() {
		let color = if gamma_correction { gamma32(color) } else { color };
		driver.set_pixel_color(index, color);
	}
	debug!(pixels = frame.len(), "showing frame");
	driver.show().map_err(|e| Error::Transmit(Box::new(e)))
}

impl<F: DriverFactory, S: SettingsStore> Actor for NeoPixelsController<F, S> {
	fn description(&self) -> Description {
		Description {
			name:            self.config.name.clone(),
			device_type:     DEVICE_TYPE.to_string(),
			action_quantity: 1,
			actions:         BTreeMap::from([(SET_COLOR_ACTION.to_string(), SET_COLOR)]),
		}
	}

	fn begin(&mut self) -> bool {
		self.initialize().inspect_err(|e| warn!("initialization failed: {}", e)).is_ok()
	}

	fn receive_action(&mut self, action: i32, payload: &str) -> ActionResult {
		let result = self.apply_command(action, payload);
		if let Err(e) = &result {
			warn!(action, "action failed: {}", e);
		}
		result.into()
	}

	fn get_config(&self) -> String {
		NeoPixelsController::get_config(self)
	}

	fn set_config(&mut self, config: &str, save: bool) -> bool {
		NeoPixelsController::set_config(self, config, save).is_ok()
	}
}
