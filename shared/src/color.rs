//! Packed pixel colors and gamma correction.
//!
//! Colors are packed as `0xWWRRGGBB`, the same word the common NeoPixel host
//! APIs hand around. A three-channel color simply leaves the white byte zero.

/// Packs red, green and blue into a color word.
#[inline]
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
	((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Packs red, green, blue and white into a color word.
#[inline]
pub const fn pack_rgbw(r: u8, g: u8, b: u8, w: u8) -> u32 {
	((w as u32) << 24) | pack_rgb(r, g, b)
}

/// Splits a color word into `[r, g, b, w]`.
#[inline]
pub const fn unpack(color: u32) -> [u8; 4] {
	[(color >> 16) as u8, (color >> 8) as u8, color as u8, (color >> 24) as u8]
}

/// Gamma 2.6 lookup, rounded to nearest.
pub const GAMMA8: [u8; 256] = [
	0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
	0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1,
	1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 3, 3, 3, 3,
	3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 5, 6, 6, 6, 6, 7,
	7, 7, 8, 8, 8, 9, 9, 9, 10, 10, 10, 11, 11, 11, 12, 12,
	13, 13, 13, 14, 14, 15, 15, 16, 16, 17, 17, 18, 18, 19, 19, 20,
	20, 21, 21, 22, 22, 23, 24, 24, 25, 25, 26, 27, 27, 28, 29, 29,
	30, 31, 31, 32, 33, 34, 34, 35, 36, 37, 38, 38, 39, 40, 41, 42,
	42, 43, 44, 45, 46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57,
	58, 59, 60, 61, 62, 63, 64, 65, 66, 68, 69, 70, 71, 72, 73, 75,
	76, 77, 78, 80, 81, 82, 84, 85, 86, 88, 89, 90, 92, 93, 94, 96,
	97, 99, 100, 102, 103, 105, 106, 108, 109, 111, 112, 114, 115, 117, 119, 120,
	122, 124, 125, 127, 129, 130, 132, 134, 136, 137, 139, 141, 143, 145, 146, 148,
	150, 152, 154, 156, 158, 160, 162, 164, 166, 168, 170, 172, 174, 176, 178, 180,
	182, 184, 186, 188, 191, 193, 195, 197, 199, 202, 204, 206, 209, 211, 213, 215,
	218, 220, 223, 225, 227, 230, 232, 235, 237, 240, 242, 245, 247, 250, 252, 255,
];

#[inline]
pub const fn gamma8(value: u8) -> u8 {
	GAMMA8[value as usize]
}

/// Remaps every byte of a color word through [`GAMMA8`] independently.
pub const fn gamma32(color: u32) -> u32 {
	let [r, g, b, w] = unpack(color);
	pack_rgbw(gamma8(r), gamma8(g), gamma8(b), gamma8(w))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn packing_places_white_in_the_top_byte() {
		assert_eq!(pack_rgb(0x12, 0x34, 0x56), 0x0012_3456);
		assert_eq!(pack_rgbw(0x12, 0x34, 0x56, 0x78), 0x7812_3456);
		assert_eq!(unpack(0x7812_3456), [0x12, 0x34, 0x56, 0x78]);
	}

	#[test]
	fn gamma_keeps_extremes() {
		assert_eq!(gamma8(0), 0);
		assert_eq!(gamma8(255), 255);
		assert_eq!(gamma32(0xFFFF_FFFF), 0xFFFF_FFFF);
		assert_eq!(gamma32(0), 0);
	}

	#[test]
	fn gamma_darkens_midtones() {
		assert_eq!(gamma8(128), 42);
		assert_eq!(gamma32(pack_rgb(128, 0, 255)), pack_rgb(42, 0, 255));
	}

	#[test]
	fn gamma_is_monotonic() {
		for pair in GAMMA8.windows(2) {
			assert!(pair[0] <= pair[1]);
		}
	}
}
