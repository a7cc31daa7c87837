//! Conversion between wire socket addresses and `(host, port)` tuples.
//!
//! Two address families are understood:
//! - `Inet` — IPv4, tuples are `(host, port)`
//! - `Inet6` — IPv6, tuples are `(host, port, flowinfo, scope_id)`
//!
//! Encoding only ever needs `(host, port)`: flow and scope fields are
//! produced by decoding, never required on input.

mod ipv4;
mod ipv6;

use std::fmt;

use crate::error::{Error, Result};

/// Host literal that `bind`/`connect` map to the IPv4 broadcast address.
pub const BROADCAST_HOST: &str = "<broadcast>";

/// Address family of a socket or address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
	Inet,
	Inet6,
}

impl Family {
	/// Returns the libc constant for this address family.
	#[inline]
	pub fn raw(self) -> libc::c_int {
		match self {
			Family::Inet => libc::AF_INET,
			Family::Inet6 => libc::AF_INET6,
		}
	}

	pub fn from_raw(raw: libc::c_int) -> Option<Self> {
		match raw {
			libc::AF_INET => Some(Family::Inet),
			libc::AF_INET6 => Some(Family::Inet6),
			_ => None,
		}
	}

	/// Length of a packed address of this family (4 or 16 bytes).
	pub fn packed_len(self) -> usize {
		match self {
			Family::Inet => std::mem::size_of::<libc::in_addr>(),
			Family::Inet6 => std::mem::size_of::<libc::in6_addr>(),
		}
	}
}

/// Structured form of a socket address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AddrTuple {
	V4 {
		host: String,
		port: u16,
	},
	V6 {
		host: String,
		port: u16,
		flowinfo: u32,
		scope_id: u32,
	},
}

impl AddrTuple {
	pub fn host(&self) -> &str {
		match self {
			AddrTuple::V4 { host, .. } | AddrTuple::V6 { host, .. } => host,
		}
	}

	pub fn port(&self) -> u16 {
		match self {
			AddrTuple::V4 { port, .. } | AddrTuple::V6 { port, .. } => *port,
		}
	}

	pub fn family(&self) -> Family {
		match self {
			AddrTuple::V4 { .. } => Family::Inet,
			AddrTuple::V6 { .. } => Family::Inet6,
		}
	}
}

impl fmt::Display for AddrTuple {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AddrTuple::V4 { host, port } => write!(f, "{}:{}", host, port),
			AddrTuple::V6 { host, port, .. } => write!(f, "[{}]:{}", host, port),
		}
	}
}

/// An owned wire-format socket address (`sockaddr_in` or `sockaddr_in6`).
#[derive(Clone, Copy)]
pub struct SockAddr {
	storage: libc::sockaddr_storage,
	len: libc::socklen_t,
}

impl SockAddr {
	pub(crate) fn from_v4(raw: libc::sockaddr_in) -> Self {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		unsafe {
			std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in, raw);
		}
		Self { storage, len: std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t }
	}

	pub(crate) fn from_v6(raw: libc::sockaddr_in6) -> Self {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		unsafe {
			std::ptr::write(&mut storage as *mut _ as *mut libc::sockaddr_in6, raw);
		}
		Self { storage, len: std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t }
	}

	/// Copies a wire address out of `bytes`.
	///
	/// Returns None when the bytes are empty or longer than any sockaddr.
	pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
		if bytes.is_empty() || bytes.len() > std::mem::size_of::<libc::sockaddr_storage>() {
			return None;
		}
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		unsafe {
			std::ptr::copy_nonoverlapping(
				bytes.as_ptr(),
				&mut storage as *mut _ as *mut u8,
				bytes.len(),
			);
		}
		Some(Self { storage, len: bytes.len() as libc::socklen_t })
	}

	/// Returns the family recorded in the address header.
	pub fn family(&self) -> Option<Family> {
		Family::from_raw(self.storage.ss_family as libc::c_int)
	}

	pub fn len(&self) -> usize {
		self.len as usize
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// The address exactly as it goes on the wire.
	pub fn as_bytes(&self) -> &[u8] {
		unsafe {
			std::slice::from_raw_parts(&self.storage as *const _ as *const u8, self.len as usize)
		}
	}

	/// Calls the provided closure with a pointer to the raw sockaddr and its size.
	pub fn with_raw<F, R>(&self, f: F) -> R
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		f(&self.storage as *const _ as *const libc::sockaddr, self.len)
	}

	/// Decodes into a tuple; None for an unrecognised family.
	pub fn to_tuple(&self) -> Option<AddrTuple> {
		decode(self.as_bytes())
	}
}

impl fmt::Debug for SockAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.to_tuple() {
			Some(tuple) => write!(f, "SockAddr({})", tuple),
			None => write!(f, "SockAddr(family={}, len={})", self.storage.ss_family, self.len),
		}
	}
}

impl PartialEq for SockAddr {
	fn eq(&self, other: &Self) -> bool {
		self.as_bytes() == other.as_bytes()
	}
}

impl Eq for SockAddr {}

/// Decodes a wire socket address into a tuple.
///
/// Zero-length input and unrecognised families give None, not an error.
/// The family is read from the address header.
pub fn decode(bytes: &[u8]) -> Option<AddrTuple> {
	let family_len = std::mem::size_of::<libc::sa_family_t>();
	if bytes.len() < family_len {
		return None;
	}
	let family = libc::sa_family_t::from_ne_bytes(bytes[..family_len].try_into().ok()?);
	match Family::from_raw(family as libc::c_int)? {
		Family::Inet => ipv4::decode(bytes),
		Family::Inet6 => ipv6::decode(bytes),
	}
}

/// Encodes `(host, port)` into a wire address of the given family.
///
/// `op` names the calling operation in error messages.
/// Port is checked before the host, so a bad port wins over a bad host.
pub fn encode(op: &'static str, host: &str, port: i64, family: Family) -> Result<SockAddr> {
	let port = u16::try_from(port).map_err(|_| Error::Range { op })?;
	match family {
		Family::Inet => ipv4::encode(host, port).map(SockAddr::from_v4),
		Family::Inet6 => ipv6::encode(host, port).map(SockAddr::from_v6),
	}
}
