//! The narrow interface to the native stack and resolver libraries.
//!
//! Everything above this module (ownership, marshalling, error mapping)
//! talks to a [`NetworkStack`] or a [`DnsResolver`] and never to C directly.
//! Native failures come back as an [`Errno`]; turning them into crate
//! errors is the caller's job.
//!
//! With the `ioth` feature, [`IothStackProvider`] and [`IothResolverProvider`]
//! link against libioth, libiothconf and libiothdns.

use std::any::Any;
use std::os::fd::RawFd;

use crate::addr::{Family, SockAddr};
use crate::dns::{AddrInfo, AddrInfoHints, DnsPacket, NameInfoReply, PathTag, RecordFields, ResolverConfig, Section};
use crate::error::{Errno, Error, Result};

#[cfg(feature = "ioth")]
mod ffi;
#[cfg(feature = "ioth")]
mod ioth;

#[cfg(feature = "ioth")]
pub use self::ioth::{IothResolverProvider, IothStackProvider};

pub type NativeResult<T> = std::result::Result<T, Errno>;

/// One virtual network stack instance.
///
/// Descriptors returned by `socket`/`accept` belong to this stack; every
/// other descriptor operation is only ever called with such descriptors.
/// Implementations are dropped exactly once, when the last handle to the
/// stack goes away, and must release the native stack then.
pub trait NetworkStack: Send + Sync {
	/// Address of the native stack object, for diagnostics.
	fn raw_handle(&self) -> usize;

	fn as_any(&self) -> &dyn Any;

	fn socket(&self, family: libc::c_int, ty: libc::c_int, proto: libc::c_int) -> NativeResult<RawFd>;

	fn bind(&self, fd: RawFd, addr: &SockAddr) -> NativeResult<()>;

	fn listen(&self, fd: RawFd, backlog: libc::c_int) -> NativeResult<()>;

	/// Accepts a connection, returning the new descriptor and the peer
	/// address (None when the native layer reported no address).
	fn accept(&self, fd: RawFd) -> NativeResult<(RawFd, Option<SockAddr>)>;

	fn connect(&self, fd: RawFd, addr: &SockAddr) -> NativeResult<()>;

	fn send(&self, fd: RawFd, buf: &[u8], flags: libc::c_int) -> NativeResult<usize>;

	fn recv(&self, fd: RawFd, buf: &mut [u8], flags: libc::c_int) -> NativeResult<usize>;

	fn close(&self, fd: RawFd) -> NativeResult<()>;

	/// `ENODEV` when no interface has this name.
	fn if_nametoindex(&self, name: &str) -> NativeResult<u32>;

	/// `ENOSYS` when the stack cannot map indexes back to names.
	fn if_indextoname(&self, _index: u32) -> NativeResult<String> {
		Err(Errno(libc::ENOSYS))
	}

	/// `ENOSYS` when the stack cannot enumerate its interfaces.
	fn if_nameindex(&self) -> NativeResult<Vec<(u32, String)>> {
		Err(Errno(libc::ENOSYS))
	}

	/// `addr` has already been checked to be `family.packed_len()` bytes.
	fn ipaddr_add(&self, family: Family, addr: &[u8], prefix_len: libc::c_int, if_index: libc::c_int) -> NativeResult<()>;

	/// Applies an iothconf-style configuration line.
	fn config(&self, line: &str) -> NativeResult<()>;
}

/// Creates native stacks.
pub trait StackProvider {
	/// Returns None when the native constructor fails.
	fn new_stack(&self, kind: &str, options: Option<&str>) -> Option<Box<dyn NetworkStack>>;
}

/// Native memory backing one `getaddrinfo` answer.
#[derive(Debug)]
pub struct NativeAddrInfo {
	pub entries: Vec<AddrInfo>,
	/// Non-zero token identifying the native list; given back to
	/// `free_addrinfo` exactly once.
	pub token: usize,
}

/// Answer of a bounded A/AAAA lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupReply<T> {
	/// Number of records the native resolver found, which may exceed
	/// the number it was allowed to copy out.
	pub count: usize,
	pub records: Vec<T>,
}

/// Per-record callback handed to [`DnsResolver::lookup_cb`].
pub type RecordSink<'a> = dyn FnMut(Section, &RecordFields, &mut dyn DnsPacket) -> i32 + 'a;

/// One resolver session.
pub trait DnsResolver: Send + Sync {
	fn update(&self, path: &str) -> NativeResult<()>;

	fn update_inline(&self, config: &str) -> NativeResult<()>;

	fn set_path(&self, tag: PathTag, value: &str) -> NativeResult<()>;

	fn get_path(&self, tag: PathTag) -> NativeResult<String>;

	/// `Err` carries the non-zero status code.
	fn getaddrinfo(
		&self,
		node: Option<&str>,
		service: Option<&str>,
		hints: Option<&AddrInfoHints>,
	) -> std::result::Result<NativeAddrInfo, i32>;

	fn free_addrinfo(&self, token: usize);

	fn gai_strerror(&self, status: i32) -> String;

	fn getnameinfo(&self, addr: &SockAddr, flags: i32) -> NameInfoReply;

	fn lookup_a(&self, name: &str, max_count: usize) -> NativeResult<LookupReply<[u8; 4]>>;

	fn lookup_aaaa(&self, name: &str, max_count: usize) -> NativeResult<LookupReply<[u8; 16]>>;

	fn lookup_aaaa_compat(&self, name: &str, max_count: usize) -> NativeResult<LookupReply<[u8; 16]>>;

	/// Runs a raw query, calling `sink` once per parsed record.
	///
	/// `sink` is only valid for the duration of this call. Returns the
	/// native status of the query.
	fn lookup_cb(&self, name: &str, qtype: u16, sink: &mut RecordSink<'_>) -> NativeResult<i32>;
}

/// Creates resolver sessions, optionally scoped to a stack.
pub trait ResolverProvider {
	fn new_resolver(&self, stack: Option<&dyn NetworkStack>, config: &ResolverConfig) -> NativeResult<Box<dyn DnsResolver>>;
}

/// Rejects strings that cannot cross into C.
pub(crate) fn ensure_c_str(what: &str, value: &str) -> Result<()> {
	if value.as_bytes().contains(&0) {
		return Err(Error::invalid(format!("{} contains an embedded NUL byte", what)));
	}
	Ok(())
}
