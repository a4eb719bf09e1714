//! Channel order and timing class of a strip.
//!
//! A layout is stored as the 16-bit NeoPixel type word: bits 0-1 hold the
//! byte offset of blue, 2-3 green, 4-5 red and 6-7 white within one pixel on
//! the wire. A word whose white offset equals its red offset describes a
//! three-channel strip. Bit 8 selects the slower 400 kHz timing class.

use core::fmt;

use crate::color::unpack;

/// Signal timing class expected by the strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Timing {
	Khz800,
	Khz400,
}

pub const KHZ800: u16 = 0x0000;
pub const KHZ400: u16 = 0x0100;

pub const RGB: u16 = (0 << 6) | (0 << 4) | (1 << 2) | 2;
pub const RBG: u16 = (0 << 6) | (0 << 4) | (2 << 2) | 1;
pub const GRB: u16 = (1 << 6) | (1 << 4) | (0 << 2) | 2;
pub const GBR: u16 = (2 << 6) | (2 << 4) | (0 << 2) | 1;
pub const BRG: u16 = (1 << 6) | (1 << 4) | (2 << 2) | 0;
pub const BGR: u16 = (2 << 6) | (2 << 4) | (1 << 2) | 0;

pub const WRGB: u16 = (0 << 6) | (1 << 4) | (2 << 2) | 3;
pub const WGRB: u16 = (0 << 6) | (2 << 4) | (1 << 2) | 3;
pub const RGBW: u16 = (3 << 6) | (0 << 4) | (1 << 2) | 2;
pub const RBGW: u16 = (3 << 6) | (0 << 4) | (2 << 2) | 1;
pub const GRBW: u16 = (3 << 6) | (1 << 4) | (0 << 2) | 2;
pub const BGRW: u16 = (3 << 6) | (2 << 4) | (1 << 2) | 0;

const TIMING_MASK: u16 = KHZ400;
const ORDER_MASK: u16 = 0x00FF;

/// A type word that is not a valid channel layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidLayout(pub u16);

impl fmt::Display for InvalidLayout {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "invalid channel layout 0x{:04x}", self.0)
	}
}

/// Validated channel layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelLayout {
	raw: u16,
}

impl ChannelLayout {
	/// GRB at 800 kHz, what most WS2812B strips expect.
	pub const DEFAULT: Self = Self { raw: GRB | KHZ800 };

	pub const fn new(raw: u16) -> Result<Self, InvalidLayout> {
		if raw & !(ORDER_MASK | TIMING_MASK) != 0 {
			return Err(InvalidLayout(raw));
		}

		let [w, r, g, b] = offsets(raw);
		let valid = if w == r {
			r < 3 && g < 3 && b < 3 && r != g && r != b && g != b
		} else {
			// offsets are two bits wide, so four distinct values cover 0..4
			w != g && w != b && r != g && r != b && g != b
		};

		if valid {
			Ok(Self { raw })
		} else {
			Err(InvalidLayout(raw))
		}
	}

	pub const fn raw(self) -> u16 {
		self.raw
	}

	pub const fn channel_count(self) -> usize {
		let [w, r, ..] = offsets(self.raw);
		if w == r {
			3
		} else {
			4
		}
	}

	pub const fn timing(self) -> Timing {
		if self.raw & KHZ400 != 0 {
			Timing::Khz400
		} else {
			Timing::Khz800
		}
	}

	/// Writes the channel bytes of `color` into `out` in wire order.
	///
	/// `out` must hold at least [`channel_count`](Self::channel_count) bytes.
	pub fn to_wire(self, color: u32, out: &mut [u8]) {
		let [w_off, r_off, g_off, b_off] = offsets(self.raw);
		let [r, g, b, w] = unpack(color);

		if self.channel_count() == 4 {
			out[w_off as usize] = w;
		}
		out[r_off as usize] = r;
		out[g_off as usize] = g;
		out[b_off as usize] = b;
	}
}

impl Default for ChannelLayout {
	fn default() -> Self {
		Self::DEFAULT
	}
}

impl TryFrom<u16> for ChannelLayout {
	type Error = InvalidLayout;

	fn try_from(raw: u16) -> Result<Self, Self::Error> {
		Self::new(raw)
	}
}

impl From<ChannelLayout> for u16 {
	fn from(layout: ChannelLayout) -> Self {
		layout.raw
	}
}

/// `[w, r, g, b]` byte offsets of a type word.
const fn offsets(raw: u16) -> [u8; 4] {
	[
		((raw >> 6) & 0b11) as u8,
		((raw >> 4) & 0b11) as u8,
		((raw >> 2) & 0b11) as u8,
		(raw & 0b11) as u8,
	]
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::color::{pack_rgb, pack_rgbw};

	#[test]
	fn default_is_grb_800khz() {
		let layout = ChannelLayout::default();
		assert_eq!(layout.raw(), 82);
		assert_eq!(layout.channel_count(), 3);
		assert_eq!(layout.timing(), Timing::Khz800);
	}

	#[test]
	fn all_named_orders_are_valid() {
		for raw in [RGB, RBG, GRB, GBR, BRG, BGR] {
			assert_eq!(ChannelLayout::new(raw).unwrap().channel_count(), 3);
			assert_eq!(ChannelLayout::new(raw | KHZ400).unwrap().timing(), Timing::Khz400);
		}
		for raw in [WRGB, WGRB, RGBW, RBGW, GRBW, BGRW] {
			assert_eq!(ChannelLayout::new(raw).unwrap().channel_count(), 4);
		}
	}

	#[test]
	fn rejects_duplicate_offsets_and_stray_bits() {
		// red and green share offset 0
		assert_eq!(ChannelLayout::new(0x0002), Err(InvalidLayout(0x0002)));
		// three-channel word with an offset of 3
		assert!(ChannelLayout::new((3 << 6) | (3 << 4) | (1 << 2)).is_err());
		assert!(ChannelLayout::new(GRB | 0x0200).is_err());
		assert!(ChannelLayout::new(u16::MAX).is_err());
	}

	#[test]
	fn wire_order_follows_offsets() {
		let mut out = [0u8; 4];
		ChannelLayout::new(GRB).unwrap().to_wire(pack_rgb(1, 2, 3), &mut out);
		assert_eq!(&out[..3], &[2, 1, 3]);

		ChannelLayout::new(BGR).unwrap().to_wire(pack_rgb(1, 2, 3), &mut out);
		assert_eq!(&out[..3], &[3, 2, 1]);

		ChannelLayout::new(WRGB).unwrap().to_wire(pack_rgbw(1, 2, 3, 4), &mut out);
		assert_eq!(out, [4, 1, 2, 3]);

		ChannelLayout::new(GRBW).unwrap().to_wire(pack_rgbw(1, 2, 3, 4), &mut out);
		assert_eq!(out, [2, 1, 3, 4]);
	}
}
