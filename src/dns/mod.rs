//! DNS resolver sessions.
//!
//! A [`Resolver`] wraps one native resolver session. It can be bound to a
//! [`Stack`], in which case queries leave through that virtual stack and
//! the stack is kept alive for as long as the resolver is.

mod addrinfo;
mod callback;
mod config;
mod query;
mod records;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

pub use self::addrinfo::{AddrInfo, AddrInfoHandle, AddrInfoHints, AddrInfoResult, NameInfo, NameInfoReply};
pub use self::config::{PathTag, ResolverConfig};
pub use self::query::{MAX_LOOKUP_RECORDS, NAMEREQD};
pub use self::records::{
	CompatRecord, DnsPacket, Ipv4Record, Ipv6Record, Lookup, RecordFields, Section,
	QTYPE_A, QTYPE_AAAA, QTYPE_CNAME, QTYPE_MX, QTYPE_NS, QTYPE_PTR, QTYPE_SRV, QTYPE_TXT,
};

use crate::error::{Error, Result};
use crate::native::{ensure_c_str, DnsResolver, ResolverProvider};
use crate::stack::Stack;

/// A resolver session, optionally bound to a virtual stack.
///
/// Cloning is cheap and shares the session; the native resolver is
/// released once, after the last clone and the last
/// [`AddrInfoHandle`] are gone.
#[derive(Clone)]
pub struct Resolver {
	inner: Arc<ResolverInner>,
}

pub(crate) struct ResolverInner {
	// Declared before `stack` so the session is finalized while the
	// stack it egresses through is still alive.
	native: Box<dyn DnsResolver>,
	stack: Option<Stack>,
}

impl Drop for ResolverInner {
	fn drop(&mut self) {
		debug!(bound = self.stack.is_some(), "releasing resolver");
	}
}

impl Resolver {
	/// Creates a resolver using the linked iothdns library.
	///
	/// See [`Resolver::with_provider`] for how `config` is interpreted.
	#[cfg(feature = "ioth")]
	pub fn new(stack: Option<&Stack>, config: Option<&str>) -> Result<Self> {
		Self::with_provider(&crate::native::IothResolverProvider, stack, config)
	}

	/// Creates a resolver from `provider`.
	///
	/// `config` containing a `/` is a configuration file path, any other
	/// string is inline configuration, and None selects the system
	/// configuration.
	pub fn with_provider(
		provider: &dyn ResolverProvider,
		stack: Option<&Stack>,
		config: Option<&str>,
	) -> Result<Self> {
		Self::with_config(provider, stack, ResolverConfig::detect(config))
	}

	/// Creates a resolver from an already classified configuration.
	pub fn with_config(provider: &dyn ResolverProvider, stack: Option<&Stack>, config: ResolverConfig) -> Result<Self> {
		if let Some(text) = config.text() {
			ensure_c_str("configuration", text)?;
		}
		let native = provider
			.new_resolver(stack.map(|s| s.native()), &config)
			.map_err(|e| Error::Config { errno: e.0 })?;
		debug!(bound = stack.is_some(), ?config, "created resolver");
		Ok(Self {
			inner: Arc::new(ResolverInner {
				native,
				stack: stack.cloned(),
			}),
		})
	}

	/// The stack this resolver is bound to, if any.
	pub fn stack(&self) -> Option<&Stack> {
		self.inner.stack.as_ref()
	}

	/// Reloads the configuration from a file.
	pub fn update(&self, path: &str) -> Result<()> {
		ensure_c_str("path", path)?;
		trace!(path, "updating resolver configuration");
		self.inner.native.update(path).map_err(|e| Error::Config { errno: e.0 })
	}

	/// Reloads the configuration from resolv.conf-style text.
	pub fn update_inline(&self, config: &str) -> Result<()> {
		ensure_c_str("configuration", config)?;
		trace!("updating resolver configuration inline");
		self.inner.native.update_inline(config).map_err(|e| Error::Config { errno: e.0 })
	}

	/// Overrides the location of the hosts or services file.
	pub fn set_path(&self, tag: PathTag, value: &str) -> Result<()> {
		ensure_c_str("path", value)?;
		self.inner.native.set_path(tag, value).map_err(|e| e.failed("set_path"))
	}

	pub fn get_path(&self, tag: PathTag) -> Result<String> {
		self.inner.native.get_path(tag).map_err(|e| e.failed("get_path"))
	}

	fn native(&self) -> &dyn DnsResolver {
		self.inner.native.as_ref()
	}
}

impl fmt::Debug for Resolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Resolver").field("stack", &self.inner.stack).finish()
	}
}
