use crate::error::{Error, Result};

/// Where a resolver session takes its configuration from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverConfig {
	/// The system resolver configuration.
	System,
	/// A resolv.conf-style file.
	File(String),
	/// resolv.conf-style text, e.g. `"nameserver 1.1.1.1"`.
	Inline(String),
}

impl ResolverConfig {
	/// Classifies a user-supplied configuration string.
	///
	/// Anything containing a `/` is a path, any other string is inline
	/// configuration, and no string at all means the system configuration.
	pub fn detect(config: Option<&str>) -> Self {
		match config {
			None => ResolverConfig::System,
			Some(text) if text.contains('/') => ResolverConfig::File(text.to_owned()),
			Some(text) => ResolverConfig::Inline(text.to_owned()),
		}
	}

	pub(crate) fn text(&self) -> Option<&str> {
		match self {
			ResolverConfig::System => None,
			ResolverConfig::File(text) | ResolverConfig::Inline(text) => Some(text),
		}
	}
}

/// Files whose location can be overridden per resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PathTag {
	/// hosts(5) equivalent.
	Hosts = 0,
	/// services(5) equivalent.
	Services = 1,
}

impl PathTag {
	#[inline]
	pub fn raw(self) -> i32 {
		self as i32
	}

	pub fn from_raw(raw: i32) -> Result<Self> {
		match raw {
			0 => Ok(PathTag::Hosts),
			1 => Ok(PathTag::Services),
			_ => Err(Error::invalid(format!("unknown path tag {}", raw))),
		}
	}
}
