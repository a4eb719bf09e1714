//! Strip configuration and its JSON settings document.

use neopixel_actor_shared::ChannelLayout;
use serde::Deserialize;
use serde_json::json;

use crate::{Error, Result};

/// Directory settings documents live in.
pub const SETTINGS_DIR: &str = "/settings/act";

/// Everything that describes the attached strip.
///
/// Pin, LED count and layout take effect only when the driver is rebuilt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StripConfig {
	pub name:             String,
	pub pin:              u32,
	pub led_count:        usize,
	pub layout:           ChannelLayout,
	pub gamma_correction: bool,
}

/// Settings document as it is stored.
#[derive(Deserialize)]
struct ConfigDocument {
	#[serde(rename = "Name")]
	name:             String,
	#[serde(rename = "Pin")]
	pin:              u32,
	#[serde(rename = "LEDCount")]
	led_count:        usize,
	#[serde(rename = "RGB_Type")]
	rgb_type:         u16,
	#[serde(rename = "gammaCorrection", default)]
	gamma_correction: bool,
}

impl StripConfig {
	/// Serializes the configuration into its settings document.
	pub fn encode(&self) -> String {
		json!({
			"Name": self.name,
			"Pin": self.pin,
			"LEDCount": self.led_count,
			"RGB_Type": self.layout.raw(),
			"gammaCorrection": self.gamma_correction,
		})
		.to_string()
	}

	/// Parses and validates a settings document.
	///
	/// A missing `gammaCorrection` reads as disabled, every other field is
	/// required.
	pub fn decode(text: &str) -> Result<Self> {
		let doc: ConfigDocument = serde_json::from_str(text).map_err(|e| Error::Parse {
			what:   "config",
			reason: e.to_string(),
		})?;

		if doc.led_count == 0 {
			return Err(Error::Parse {
				what:   "config",
				reason: "LEDCount must be positive".to_string(),
			});
		}

		let layout = ChannelLayout::new(doc.rgb_type).map_err(|e| Error::Parse {
			what:   "config",
			reason: e.to_string(),
		})?;

		Ok(Self {
			name: doc.name,
			pin: doc.pin,
			led_count: doc.led_count,
			layout,
			gamma_correction: doc.gamma_correction,
		})
	}
}

/// Construction-time settings supplied by the hosting code.
#[derive(Clone, Debug)]
pub struct ControllerOptions {
	pub name:        String,
	pub pin:         u32,
	pub led_count:   usize,
	pub layout:      ChannelLayout,
	pub config_file: String,
}

impl Default for ControllerOptions {
	fn default() -> Self {
		Self {
			name:        "NeoPixelsController".to_string(),
			pin:         5,
			led_count:   10,
			layout:      ChannelLayout::DEFAULT,
			config_file: "NeoPixelsController.json".to_string(),
		}
	}
}

impl ControllerOptions {
	pub fn new(name: impl Into<String>, pin: u32, led_count: usize) -> Self {
		Self {
			name: name.into(),
			pin,
			led_count,
			..Self::default()
		}
	}

	pub fn with_layout(mut self, layout: ChannelLayout) -> Self {
		self.layout = layout;
		self
	}

	pub fn with_config_file(mut self, config_file: impl Into<String>) -> Self {
		self.config_file = config_file.into();
		self
	}

	/// Full path of the settings document, e.g. `/settings/act/NeoPixelsController.json`.
	pub fn settings_path(&self) -> String {
		format!("{}/{}", SETTINGS_DIR, self.config_file)
	}

	pub fn strip_config(&self) -> StripConfig {
		StripConfig {
			name:             self.name.clone(),
			pin:              self.pin,
			led_count:        self.led_count,
			layout:           self.layout,
			gamma_correction: false,
		}
	}
}

#[cfg(test)]
mod tests {
	use neopixel_actor_shared::layout::{GRBW, KHZ400, RGB};

	use super::*;

	fn sample() -> StripConfig {
		StripConfig {
			name:             "Strip1".to_string(),
			pin:              5,
			led_count:        10,
			layout:           ChannelLayout::DEFAULT,
			gamma_correction: true,
		}
	}

	#[test]
	fn encode_decode_round_trip() {
		let layouts = [ChannelLayout::DEFAULT, ChannelLayout::new(RGB | KHZ400).unwrap(), ChannelLayout::new(GRBW).unwrap()];
		for layout in layouts {
			for gamma_correction in [false, true] {
				let config = StripConfig {
					layout,
					gamma_correction,
					..sample()
				};
				assert_eq!(StripConfig::decode(&config.encode()).unwrap(), config);
			}
		}
	}

	#[test]
	fn decodes_stored_document() {
		let text = r#"{"Name":"Strip1","Pin":5,"LEDCount":10,"RGB_Type":82,"gammaCorrection":true}"#;
		assert_eq!(StripConfig::decode(text).unwrap(), sample());
	}

	#[test]
	fn encodes_fixed_field_names() {
		let value: serde_json::Value = serde_json::from_str(&sample().encode()).unwrap();
		assert_eq!(value["Name"], "Strip1");
		assert_eq!(value["Pin"], 5);
		assert_eq!(value["LEDCount"], 10);
		assert_eq!(value["RGB_Type"], 82);
		assert_eq!(value["gammaCorrection"], true);
	}

	#[test]
	fn gamma_flag_is_optional() {
		let config = StripConfig::decode(r#"{"Name":"a","Pin":2,"LEDCount":1,"RGB_Type":82}"#).unwrap();
		assert!(!config.gamma_correction);
	}

	#[test]
	fn rejects_bad_documents() {
		for text in [
			r#"{"Name":"a","Pin":2"#,
			r#"{"Name":"a","Pin":2,"RGB_Type":82}"#,
			r#"{"Name":"a","Pin":-1,"LEDCount":1,"RGB_Type":82}"#,
			r#"{"Name":"a","Pin":2,"LEDCount":0,"RGB_Type":82}"#,
			r#"{"Name":"a","Pin":2,"LEDCount":1,"RGB_Type":2}"#,
		] {
			assert!(matches!(StripConfig::decode(text), Err(Error::Parse { .. })), "{text}");
		}
	}

	#[test]
	fn default_options() {
		let options = ControllerOptions::default();
		assert_eq!(options.settings_path(), "/settings/act/NeoPixelsController.json");
		assert_eq!(options.strip_config().layout.raw(), 82);
		assert_eq!(options.strip_config().pin, 5);
		assert_eq!(options.strip_config().led_count, 10);
	}
}
