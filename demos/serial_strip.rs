//! Hosts a strip controller on a USB-serial strip bridge and cycles a few
//! frames through it.
//!
//! `cargo run --example serial_strip -- [serial device] [settings root]`

use std::{env, thread, time::Duration};

use eyre::{bail, Result};
use neopixel_actor::{Actor, ControllerOptions, FsStore, NeoPixelsController, SerialStripFactory};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let mut args = env::args().skip(1);
	let device = args.next();
	let root = args.next().unwrap_or_else(|| "./state".to_string());

	let options = ControllerOptions::new("Serial strip", 0, 30).with_config_file("SerialStrip.json");
	let mut controller = NeoPixelsController::new(options, SerialStripFactory::new(device), FsStore::new(root));

	controller.initialize()?;
	info!(config = %controller.get_config(), "controller ready");

	let leds = controller.config().led_count;
	for step in 0..=255u32 {
		let rows: Vec<[u32; 3]> = (0..leds as u32)
			.map(|i| {
				let v = (step + i * 8) % 256;
				[v, 255 - v, (v * 3) % 256]
			})
			.collect();
		let payload = serde_json::json!({ "RGB_Values": rows }).to_string();

		let result = controller.receive_action(0, &payload);
		if !result.success {
			bail!("strip rejected frame: {}", result.response);
		}

		thread::sleep(Duration::from_millis(16));
	}

	Ok(())
}
