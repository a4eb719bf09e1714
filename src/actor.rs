//! The surface a hosting actor framework talks to.

use std::collections::BTreeMap;

use serde_json::json;

use crate::Error;

/// Capabilities a device advertises to the framework.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Description {
	pub name:            String,
	pub device_type:     String,
	pub action_quantity: usize,
	pub actions:         BTreeMap<String, i32>,
}

/// Outcome of an action, as reported back to the framework.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionResult {
	pub success:  bool,
	pub response: String,
}

impl ActionResult {
	pub fn ok() -> Self {
		Self {
			success:  true,
			response: json!({ "success": true }).to_string(),
		}
	}

	pub fn failure(reason: &str) -> Self {
		Self {
			success:  false,
			response: json!({ "success": false, "Response": reason }).to_string(),
		}
	}
}

impl From<&Error> for ActionResult {
	fn from(err: &Error) -> Self {
		match err {
			Error::Parse { .. } => Self::failure("Could not parse payload"),
			other => Self::failure(&format!("Error: {}", other)),
		}
	}
}

impl<T> From<crate::Result<T>> for ActionResult {
	fn from(result: crate::Result<T>) -> Self {
		match result {
			Ok(_) => Self::ok(),
			Err(err) => Self::from(&err),
		}
	}
}

/// A device driven by the actor framework.
///
/// Calls into one actor must be serialized by the framework; none of them
/// may run concurrently or re-enter.
pub trait Actor {
	fn description(&self) -> Description;

	/// Registers capabilities and brings the device up from stored settings.
	fn begin(&mut self) -> bool;

	fn receive_action(&mut self, action: i32, payload: &str) -> ActionResult;

	fn get_config(&self) -> String;

	fn set_config(&mut self, config: &str, save: bool) -> bool;
}
