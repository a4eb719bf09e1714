//! Durable storage for settings documents.
//!
//! Paths are absolute virtual paths such as `/settings/act/Strip.json`.

use std::{
	collections::HashMap,
	fs,
	io,
	path::{Path, PathBuf},
};

use tracing::debug;

pub trait SettingsStore {
	fn exists(&self, path: &str) -> bool;
	fn read(&self, path: &str) -> io::Result<String>;
	fn write(&mut self, path: &str, contents: &str) -> io::Result<()>;
}

/// Keeps settings documents as files beneath a root directory.
#[derive(Clone, Debug)]
pub struct FsStore {
	root: PathBuf,
}

impl FsStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Host path a virtual settings path maps to.
	pub fn resolve(&self, path: &str) -> PathBuf {
		self.root.join(path.trim_start_matches('/'))
	}
}

impl SettingsStore for FsStore {
	fn exists(&self, path: &str) -> bool {
		self.resolve(path).is_file()
	}

	fn read(&self, path: &str) -> io::Result<String> {
		fs::read_to_string(self.resolve(path))
	}

	fn write(&mut self, path: &str, contents: &str) -> io::Result<()> {
		let target = self.resolve(path);
		if let Some(parent) = target.parent() {
			fs::create_dir_all(parent)?;
		}
		debug!(path = %target.display(), "writing settings");
		fs::write(target, contents)
	}
}

/// In-memory store, optionally refusing writes.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	files:       HashMap<String, String>,
	fail_writes: bool,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
		self.files.insert(path.into(), contents.into());
		self
	}

	/// Makes every following write fail.
	pub fn fail_writes(&mut self, fail: bool) {
		self.fail_writes = fail;
	}

	pub fn get(&self, path: &str) -> Option<&str> {
		self.files.get(path).map(String::as_str)
	}
}

impl SettingsStore for MemoryStore {
	fn exists(&self, path: &str) -> bool {
		self.files.contains_key(path)
	}

	fn read(&self, path: &str) -> io::Result<String> {
		self.files
			.get(path)
			.cloned()
			.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
	}

	fn write(&mut self, path: &str, contents: &str) -> io::Result<()> {
		if self.fail_writes {
			return Err(io::Error::new(io::ErrorKind::PermissionDenied, "store is read-only"));
		}
		self.files.insert(path.to_string(), contents.to_string());
		Ok(())
	}
}
