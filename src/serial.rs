//! Strip backend for the USB-serial strip bridge.
//!
//! The bridge drives up to eight output lanes; the strip's `pin` selects the
//! lane. It carries three bytes per pixel and emits them in its own fixed
//! order, so pixels are pre-arranged here to come out in the configured
//! layout order.

use std::{
	io::{self, Read, Write},
	time::Duration,
};
#[cfg(feature = "timings")]
use std::time::Instant;

use neopixel_actor_shared::{
	link::{
		BRIDGE_WIRE_ORDER,
		BYTES_PER_LED,
		DEVICE_ERROR_MESSAGE,
		DEVICE_INIT_MESSAGE,
		DEVICE_MESSAGE_TYPE_LEN,
		DEVICE_OK_MESSAGE,
		DEVICE_PARTIAL_MESSAGE,
		DEVICE_PRODUCT_NAME,
		MAX_LEDS_PER_STRIP,
		MAX_STRIPS,
		SET_LEDS_MESSAGE,
		SET_STRIPS_MESSAGE,
		UPDATE_MESSAGE,
	},
	ChannelLayout,
};
use serialport::{SerialPort, SerialPortType};
use tracing::{debug, info, warn};

use crate::{config::StripConfig, driver::DriverFactory, Error, PixelDriver, Result};

const BAUD_RATE: u32 = 921_600;
const READ_TIMEOUT: Duration = Duration::from_millis(50);
/// Reads tolerated while resynchronizing before the bridge counts as absent.
const MAX_RESET_ATTEMPTS: usize = 64;

pub struct SerialStrip<P = Box<dyn SerialPort>> {
	port:   P,
	lane:   usize,
	leds:   usize,
	layout: ChannelLayout,
	/// Every lane up to and including ours, `BYTES_PER_LED` bytes per pixel.
	buffer: Vec<u8>,

	initialized: bool,
}

impl SerialStrip {
	/// Opens `serial_device` for the strip described by `config`.
	pub fn open(serial_device: &str, config: &StripConfig) -> Result<Self> {
		let port = serialport::new(serial_device, BAUD_RATE).timeout(READ_TIMEOUT).open()?;
		Self::with_port(port, config)
	}

	/// Opens the first serial device whose USB product name is "Serial WS2812".
	///
	/// If more than one bridge is connected the one the OS lists last wins.
	pub fn find(config: &StripConfig) -> Result<Option<Self>> {
		let ports = serialport::available_ports()?;
		let mut serial_device = None;

		for p in ports {
			if let SerialPortType::UsbPort(usb) = p.port_type {
				if usb.product == Some(DEVICE_PRODUCT_NAME.to_string())
					|| usb.product == Some(DEVICE_PRODUCT_NAME.replace(' ', "_"))
				{
					serial_device = Some(p.port_name);
				}
			}
		}

		let Some(serial_device) = serial_device else {
			return Ok(None);
		};

		Ok(Some(Self::open(&serial_device, config)?))
	}
}

impl<P: Read + Write> SerialStrip<P> {
	/// Wraps an already opened port.
	pub fn with_port(port: P, config: &StripConfig) -> Result<Self> {
		let lane = config.pin as usize;
		if lane >= MAX_STRIPS {
			return Err(Error::DriverInit(format!(
				"pin {} is not a bridge lane (0..{})",
				config.pin, MAX_STRIPS
			)));
		}
		if config.led_count > MAX_LEDS_PER_STRIP {
			return Err(Error::DriverInit(format!(
				"{} LEDs exceed the bridge limit of {}",
				config.led_count, MAX_LEDS_PER_STRIP
			)));
		}
		if config.layout.channel_count() != BYTES_PER_LED {
			return Err(Error::DriverInit("the bridge only drives three-channel strips".to_string()));
		}

		Ok(Self {
			port,
			lane,
			leds: config.led_count,
			layout: config.layout,
			buffer: vec![0; (lane + 1) * config.led_count * BYTES_PER_LED],

			initialized: false,
		})
	}

	/// The bytes [`show`](PixelDriver::show) would send next.
	pub fn buffer(&self) -> &[u8] {
		&self.buffer
	}

	pub fn into_port(self) -> P {
		self.port
	}

	fn reset_to_command(&mut self) -> Result<()> {
		let mut buffer = [0u8; DEVICE_MESSAGE_TYPE_LEN * 4];

		let mut attempts = 0;
		let mut counter = 0;

		info!("trying to reset device to start of command");

		loop {
			attempts += 1;
			if attempts > MAX_RESET_ATTEMPTS {
				warn!("bridge did not answer the reset");
				return Err(Error::NoResponse);
			}

			let read_bytes = match self.port.read(&mut buffer) {
				Ok(n) => n,
				Err(e) if e.kind() == io::ErrorKind::TimedOut => {
					if counter == 0 {
						info!("read timeout, writing null bytes to force a response");
					}

					counter += 1;
					if counter < 8 {
						self.port.write_all(&[0u8])?;
					} else {
						self.port.write_all(&[0u8; 32])?;
					}

					continue;
				}
				Err(e) => return Err(e.into()),
			};

			// more than one byte means a 32 byte flush is still being answered
			if read_bytes > 1 {
				counter = 0;
				continue;
			}

			if read_bytes == 1
				&& (&buffer[..1] == DEVICE_INIT_MESSAGE || &buffer[..1] == DEVICE_ERROR_MESSAGE)
			{
				break;
			}
		}

		info!("reset successful");

		Ok(())
	}

	fn configure(&mut self) -> Result<()> {
		if !self.initialized {
			self.reset_to_command()?;
			self.initialized = true;
		}

		let strips = (self.lane + 1) as u32;
		self.send_command(SET_STRIPS_MESSAGE, &u32::to_le_bytes(strips))?;
		self.send_command(SET_LEDS_MESSAGE, &u32::to_le_bytes(self.leds as u32))?;

		Ok(())
	}

	fn send_command(&mut self, command: &[u8], data: &[u8]) -> Result<()> {
		let mut output = [0u8; DEVICE_MESSAGE_TYPE_LEN];

		#[cfg(feature = "timings")]
		let command_start = Instant::now();

		if self.serial_write(command)? != command.len() {
			return Err(Error::IncompleteWrite);
		}
		if self.port.read(&mut output)? != 1 {
			return Err(Error::NoResponse);
		}
		if &output != DEVICE_PARTIAL_MESSAGE {
			return Err(Error::UnexpectedResponse {
				expected: String::from_utf8_lossy(DEVICE_PARTIAL_MESSAGE).to_string(),
				received: format!("{:?}", output),
			});
		}

		#[cfg(feature = "timings")]
		let data_start = Instant::now();

		if self.serial_write(data)? != data.len() {
			return Err(Error::IncompleteWrite);
		}
		if self.port.read(&mut output)? != 1 {
			return Err(Error::NoResponse);
		}
		if &output != DEVICE_OK_MESSAGE {
			return Err(Error::UnexpectedResponse {
				expected: String::from_utf8_lossy(DEVICE_OK_MESSAGE).to_string(),
				received: format!("{:?}", output),
			});
		}

		#[cfg(feature = "timings")]
		debug!(
			command = ?(data_start - command_start),
			data = ?data_start.elapsed(),
			"command timings"
		);

		Ok(())
	}

	fn serial_write(&mut self, buffer: &[u8]) -> Result<usize> {
		match self.port.write_all(buffer) {
			Ok(_) => Ok(buffer.len()),
			Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
				warn!("serial timeout");
				Ok(0)
			}
			Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
				warn!("serial interrupted");
				Ok(0)
			}
			Err(e) => Err(e.into()),
		}
	}
}

impl<P: Read + Write> PixelDriver for SerialStrip<P> {
	fn begin(&mut self) -> Result<()> {
		self.configure()
	}

	fn set_pixel_color(&mut self, index: usize, color: u32) {
		if index >= self.leds {
			return;
		}

		let mut wire = [0u8; 4];
		self.layout.to_wire(color, &mut wire);

		let start = (self.lane * self.leds + index) * BYTES_PER_LED;
		let pixel = &mut self.buffer[start..start + BYTES_PER_LED];
		for (byte, slot) in wire.iter().zip(BRIDGE_WIRE_ORDER) {
			pixel[slot] = *byte;
		}
	}

	fn show(&mut self) -> Result<()> {
		if !self.initialized {
			self.configure()?;
		}

		debug!(bytes = self.buffer.len(), "sending frame");
		let data = std::mem::take(&mut self.buffer);
		let result = self.send_command(UPDATE_MESSAGE, &data);
		self.buffer = data;

		result
	}
}

/// Builds [`SerialStrip`]s on a fixed device, or on the first bridge found.
#[derive(Clone, Debug, Default)]
pub struct SerialStripFactory {
	device: Option<String>,
}

impl SerialStripFactory {
	pub fn new(device: Option<String>) -> Self {
		Self { device }
	}
}

impl DriverFactory for SerialStripFactory {
	fn build(&mut self, config: &StripConfig) -> Result<Box<dyn PixelDriver>> {
		let strip = match &self.device {
			Some(device) => SerialStrip::open(device, config)?,
			None => SerialStrip::find(config)?
				.ok_or_else(|| Error::DriverInit("no serial strip bridge found".to_string()))?,
		};

		Ok(Box::new(strip))
	}
}

#[cfg(test)]
mod tests {
	use std::collections::VecDeque;

	use neopixel_actor_shared::{layout::{GRB, GRBW, RGB}, pack_rgb};

	use super::*;

	/// Answers reads from a script and records writes.
	///
	/// Once the script runs out reads time out, or return `Ok(0)` when
	/// `hung_up` is set.
	#[derive(Default)]
	struct ScriptedPort {
		replies: VecDeque<u8>,
		written: Vec<u8>,
		hung_up: bool,
	}

	impl ScriptedPort {
		fn new(replies: &[u8]) -> Self {
			Self {
				replies: replies.iter().copied().collect(),
				..Self::default()
			}
		}

		fn hung_up() -> Self {
			Self {
				hung_up: true,
				..Self::default()
			}
		}
	}

	impl Read for ScriptedPort {
		fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			match self.replies.pop_front() {
				Some(byte) => {
					buf[0] = byte;
					Ok(1)
				}
				None if self.hung_up => Ok(0),
				None => Err(io::ErrorKind::TimedOut.into()),
			}
		}
	}

	impl Write for ScriptedPort {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.written.extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	fn config(pin: u32, led_count: usize, layout: u16) -> StripConfig {
		StripConfig {
			name: "Strip1".to_string(),
			pin,
			led_count,
			layout: ChannelLayout::new(layout).unwrap(),
			gamma_correction: false,
		}
	}

	#[test]
	fn rejects_unsupported_strips() {
		assert!(matches!(
			SerialStrip::with_port(ScriptedPort::default(), &config(8, 1, GRB)),
			Err(Error::DriverInit(_))
		));
		assert!(matches!(
			SerialStrip::with_port(ScriptedPort::default(), &config(0, 1, GRBW)),
			Err(Error::DriverInit(_))
		));
		assert!(matches!(
			SerialStrip::with_port(ScriptedPort::default(), &config(0, MAX_LEDS_PER_STRIP + 1, GRB)),
			Err(Error::DriverInit(_))
		));
	}

	#[test]
	fn begin_resets_and_configures_lanes() {
		let port = ScriptedPort::new(b"ipkpk");
		let mut strip = SerialStrip::with_port(port, &config(1, 2, GRB)).unwrap();
		strip.begin().unwrap();

		let mut expected = Vec::new();
		expected.extend_from_slice(SET_STRIPS_MESSAGE);
		expected.extend_from_slice(&2u32.to_le_bytes());
		expected.extend_from_slice(SET_LEDS_MESSAGE);
		expected.extend_from_slice(&2u32.to_le_bytes());
		assert_eq!(strip.into_port().written, expected);
	}

	#[test]
	fn pixels_land_in_their_lane_in_bridge_order() {
		let mut strip = SerialStrip::with_port(ScriptedPort::default(), &config(1, 2, GRB)).unwrap();
		strip.set_pixel_color(1, pack_rgb(10, 20, 30));
		// lane 0 stays dark, GRB on the wire means the bridge gets RGB
		assert_eq!(strip.buffer(), &[0, 0, 0, 0, 0, 0, 0, 0, 0, 10, 20, 30]);

		let mut strip = SerialStrip::with_port(ScriptedPort::default(), &config(0, 1, RGB)).unwrap();
		strip.set_pixel_color(0, pack_rgb(10, 20, 30));
		assert_eq!(strip.buffer(), &[20, 10, 30]);

		strip.set_pixel_color(5, pack_rgb(1, 1, 1));
		assert_eq!(strip.buffer().len(), 3);
	}

	#[test]
	fn show_sends_one_update() {
		let port = ScriptedPort::new(b"ipkpkpk");
		let mut strip = SerialStrip::with_port(port, &config(0, 1, GRB)).unwrap();
		strip.begin().unwrap();
		strip.set_pixel_color(0, pack_rgb(1, 2, 3));
		strip.show().unwrap();

		let written = strip.into_port().written;
		let mut tail = UPDATE_MESSAGE.to_vec();
		tail.extend_from_slice(&[1, 2, 3]);
		assert!(written.ends_with(&tail));
	}

	#[test]
	fn unexpected_reply_is_an_error() {
		let port = ScriptedPort::new(b"ik");
		let mut strip = SerialStrip::with_port(port, &config(0, 1, GRB)).unwrap();
		assert!(matches!(strip.begin(), Err(Error::UnexpectedResponse { .. })));
	}

	#[test]
	fn silent_bridge_gives_up() {
		let mut strip = SerialStrip::with_port(ScriptedPort::default(), &config(0, 1, GRB)).unwrap();
		assert!(matches!(strip.begin(), Err(Error::NoResponse)));
	}

	#[test]
	fn hung_up_port_gives_up() {
		let mut strip = SerialStrip::with_port(ScriptedPort::hung_up(), &config(0, 1, GRB)).unwrap();
		assert!(matches!(strip.begin(), Err(Error::NoResponse)));
	}

	#[test]
	fn chattering_bridge_gives_up() {
		let port = ScriptedPort::new(&[b'x'; MAX_RESET_ATTEMPTS + 1]);
		let mut strip = SerialStrip::with_port(port, &config(0, 1, GRB)).unwrap();
		assert!(matches!(strip.begin(), Err(Error::NoResponse)));
	}
}
