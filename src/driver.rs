use crate::{config::StripConfig, Result};

/// Buffers pixel colors and transmits whole frames to a strip.
pub trait PixelDriver {
	/// Brings the output up. Called once after construction.
	fn begin(&mut self) -> Result<()>;

	/// Buffers a packed `0xWWRRGGBB` color for pixel `index`.
	///
	/// Nothing reaches the strip until [`show`](Self::show).
	fn set_pixel_color(&mut self, index: usize, color: u32);

	/// Transmits the buffered frame.
	fn show(&mut self) -> Result<()>;
}

/// Builds a driver for a strip configuration.
///
/// The controller calls this every time pin, LED count or layout may have
/// changed. The previous driver has already been dropped at that point.
pub trait DriverFactory {
	fn build(&mut self, config: &StripConfig) -> Result<Box<dyn PixelDriver>>;
}

impl<F> DriverFactory for F
where
	F: FnMut(&StripConfig) -> Result<Box<dyn PixelDriver>>,
{
	fn build(&mut self, config: &StripConfig) -> Result<Box<dyn PixelDriver>> {
		self(config)
	}
}
