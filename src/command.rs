//! Decoding of `set color` payloads.
//!
//! A payload looks like `{"RGB_Values": [[r, g, b], ...]}` or the same with
//! four values per row. The first row decides the width, every row up to the
//! strip length must match it. Rows past the strip length are ignored.

use neopixel_actor_shared::{pack_rgb, pack_rgbw};
use serde_json::{Deserializer, Value};

use crate::{Error, Result};

/// Action id of `set color`, the only action a strip declares.
pub const SET_COLOR: i32 = 0;

pub const RGB_VALUES_KEY: &str = "RGB_Values";

/// Channels per row of a color command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelWidth {
	Rgb,
	Rgbw,
}

impl PixelWidth {
	pub const fn channels(self) -> usize {
		match self {
			PixelWidth::Rgb => 3,
			PixelWidth::Rgbw => 4,
		}
	}

	fn from_channels(channels: usize) -> Option<Self> {
		match channels {
			3 => Some(PixelWidth::Rgb),
			4 => Some(PixelWidth::Rgbw),
			_ => None,
		}
	}
}

/// Decodes `payload` into packed colors for `led_count` pixels.
///
/// `frame` is cleared and refilled only once the whole payload has been
/// validated, so it is left untouched on error.
pub fn decode_frame(payload: &str, led_count: usize, frame: &mut Vec<u32>) -> Result<PixelWidth> {
	let doc = parse_payload(payload)?;

	let rows = doc.get(RGB_VALUES_KEY).and_then(Value::as_array);
	let first_width = rows
		.and_then(|rows| rows.first())
		.and_then(Value::as_array)
		.map(Vec::len)
		.unwrap_or(0);
	let (Some(rows), Some(width)) = (rows, PixelWidth::from_channels(first_width)) else {
		return Err(Error::Shape(format!("rows must hold 3 or 4 values, got {}", first_width)));
	};

	if rows.len() < led_count {
		return Err(Error::Shape(format!("expected {} rows, got {}", led_count, rows.len())));
	}

	let rows = &rows[..led_count];
	for (index, row) in rows.iter().enumerate() {
		let len = row.as_array().map(Vec::len);
		if len != Some(width.channels()) {
			return Err(Error::Shape(format!(
				"row {} does not hold {} values",
				index,
				width.channels()
			)));
		}
	}

	frame.clear();
	frame.extend(rows.iter().filter_map(Value::as_array).map(|row| {
		let c = |i: usize| channel(&row[i]);
		match width {
			PixelWidth::Rgb => pack_rgb(c(0), c(1), c(2)),
			PixelWidth::Rgbw => pack_rgbw(c(0), c(1), c(2), c(3)),
		}
	}));

	Ok(width)
}

/// Parses the leading JSON value of `payload`; anything after it is ignored.
fn parse_payload(payload: &str) -> Result<Value> {
	let parsed = Deserializer::from_str(payload).into_iter::<Value>().next();
	match parsed {
		Some(Ok(value)) => Ok(value),
		Some(Err(e)) => Err(Error::Parse {
			what:   "payload",
			reason: e.to_string(),
		}),
		None => Err(Error::Parse {
			what:   "payload",
			reason: "empty input".to_string(),
		}),
	}
}

/// Coerces a JSON value into a channel byte.
///
/// Numbers are truncated toward zero and wrapped to 8 bits, anything else
/// reads as 0.
fn channel(value: &Value) -> u8 {
	if let Some(n) = value.as_i64() {
		n as u8
	} else if let Some(n) = value.as_u64() {
		n as u8
	} else if let Some(n) = value.as_f64() {
		(n as i64) as u8
	} else {
		0
	}
}
