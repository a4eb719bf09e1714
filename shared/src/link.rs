//! Wire constants of the USB-serial strip bridge.
//!
//! The host sends an 8-byte command word, waits for [`DEVICE_PARTIAL_MESSAGE`],
//! sends the command data and waits for [`DEVICE_OK_MESSAGE`].

pub const MESSAGE_TYPE_LEN: usize = 8;

pub const UPDATE_MESSAGE: &[u8; MESSAGE_TYPE_LEN] = b"update\0\0";
pub const SET_STRIPS_MESSAGE: &[u8; MESSAGE_TYPE_LEN] = b"strips\0\0";
pub const SET_LEDS_MESSAGE: &[u8; MESSAGE_TYPE_LEN] = b"leds\0\0\0\0";

/// The bridge drives eight output lanes in parallel.
pub const MAX_STRIPS: usize = 8;
pub const MAX_LEDS_PER_STRIP: usize = 512;
/// The bridge only carries three-channel pixels.
pub const BYTES_PER_LED: usize = 3;

/// Per pixel, the bridge emits `data[1], data[0], data[2]` on the wire.
pub const BRIDGE_WIRE_ORDER: [usize; BYTES_PER_LED] = [1, 0, 2];

pub const DEVICE_MESSAGE_TYPE_LEN: usize = 1;

pub const DEVICE_INIT_MESSAGE: &[u8; DEVICE_MESSAGE_TYPE_LEN] = b"i";
pub const DEVICE_ERROR_MESSAGE: &[u8; DEVICE_MESSAGE_TYPE_LEN] = b"e";
pub const DEVICE_PARTIAL_MESSAGE: &[u8; DEVICE_MESSAGE_TYPE_LEN] = b"p";
pub const DEVICE_OK_MESSAGE: &[u8; DEVICE_MESSAGE_TYPE_LEN] = b"k";

pub const DEVICE_PRODUCT_NAME: &str = "Serial WS2812";
