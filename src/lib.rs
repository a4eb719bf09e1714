//! Drive an addressable NeoPixel strip as a configurable actor.
//!
//! [`NeoPixelsController`] takes JSON color commands from a hosting actor
//! framework, validates them against the configured strip and pushes whole
//! frames to a [`PixelDriver`]. Its configuration round-trips through a JSON
//! settings document kept in a [`SettingsStore`].

use std::io;

use thiserror::Error;

pub mod actor;
pub mod command;
pub mod config;
pub mod controller;
pub mod driver;
pub mod serial;
pub mod store;

pub use actor::{ActionResult, Actor, Description};
pub use config::{ControllerOptions, StripConfig};
pub use controller::NeoPixelsController;
pub use driver::{DriverFactory, PixelDriver};
pub use neopixel_actor_shared::{layout, ChannelLayout, Timing};
pub use serial::{SerialStrip, SerialStripFactory};
pub use store::{FsStore, MemoryStore, SettingsStore};

#[derive(Error, Debug)]
pub enum Error {
	#[error("could not parse {what}: {reason}")]
	Parse { what: &'static str, reason: String },
	#[error("incorrect number of RGB(W) values: {0}")]
	Shape(String),
	#[error("unknown action {0}")]
	UnknownAction(i32),
	#[error("could not persist settings to {path}: {source}")]
	Persistence {
		path:   String,
		#[source]
		source: io::Error,
	},
	#[error("driver initialization failed: {0}")]
	DriverInit(String),
	#[error("strip is not initialized")]
	NotInitialized,
	#[error("transmit failed: {0}")]
	Transmit(#[source] Box<Error>),

	#[error("serial port error: {0}")]
	Serial(#[from] serialport::Error),
	#[error("io error: {0}")]
	Io(#[from] io::Error),
	#[error("incomplete write")]
	IncompleteWrite,
	#[error("no response")]
	NoResponse,
	#[error("unexpected response: expected {expected:?}, received {received:?}")]
	UnexpectedResponse { expected: String, received: String },
}

impl Error {
	/// Folds any failure raised while bringing up a driver into [`Error::DriverInit`].
	pub(crate) fn into_driver_init(self) -> Self {
		match self {
			Error::DriverInit(_) => self,
			other => Error::DriverInit(other.to_string()),
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
