use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::ResolverInner;
use crate::addr::AddrTuple;
use crate::error::Errno;

/// Hints narrowing a `getaddrinfo` query. Zero fields mean "any".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddrInfoHints {
	pub flags: i32,
	pub family: i32,
	pub socktype: i32,
	pub protocol: i32,
}

impl AddrInfoHints {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn flags(mut self, flags: i32) -> Self {
		self.flags = flags;
		self
	}

	pub fn family(mut self, family: i32) -> Self {
		self.family = family;
		self
	}

	pub fn socktype(mut self, socktype: i32) -> Self {
		self.socktype = socktype;
		self
	}

	pub fn protocol(mut self, protocol: i32) -> Self {
		self.protocol = protocol;
		self
	}
}

/// One candidate produced by forward resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddrInfo {
	pub flags: i32,
	pub family: i32,
	pub socktype: i32,
	pub protocol: i32,
	pub addr: Option<AddrTuple>,
	pub canonname: Option<String>,
}

/// Owns the native memory behind a `getaddrinfo` answer.
///
/// The memory is released exactly once: by
/// [`Resolver::free_addrinfo`](super::Resolver::free_addrinfo), which
/// consumes the handle, or when the handle is dropped.
pub struct AddrInfoHandle {
	resolver: Arc<ResolverInner>,
	token: usize,
}

impl AddrInfoHandle {
	pub(super) fn new(resolver: Arc<ResolverInner>, token: usize) -> Self {
		Self { resolver, token }
	}

	/// The native list address; zero means there is nothing to free.
	pub fn raw(&self) -> usize {
		self.token
	}

	pub(super) fn release(&mut self) {
		let token = std::mem::take(&mut self.token);
		if token != 0 {
			trace!(token, "freeing addrinfo list");
			self.resolver.native.free_addrinfo(token);
		}
	}
}

impl Drop for AddrInfoHandle {
	fn drop(&mut self) {
		self.release();
	}
}

impl fmt::Debug for AddrInfoHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "AddrInfoHandle({:#x})", self.token)
	}
}

/// Outcome of `getaddrinfo`.
///
/// A non-zero `status` always comes with no entries and no handle.
#[derive(Debug)]
pub struct AddrInfoResult {
	pub entries: Vec<AddrInfo>,
	pub status: i32,
	pub handle: Option<AddrInfoHandle>,
}

impl AddrInfoResult {
	pub(super) fn failed(status: i32) -> Self {
		Self { entries: Vec::new(), status, handle: None }
	}

	pub fn is_ok(&self) -> bool {
		self.status == 0
	}
}

/// What the native `getnameinfo` reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameInfoReply {
	pub status: i32,
	pub host: Option<String>,
	pub service: Option<String>,
	/// Set when the host name could not be resolved even though the
	/// call itself succeeded (the native layer fell back to a numeric host).
	pub name_error: Option<Errno>,
}

/// Outcome of `getnameinfo`. On a non-zero status both names are None.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameInfo {
	pub status: i32,
	pub host: Option<String>,
	pub service: Option<String>,
}
