use tracing::trace;

use super::addrinfo::{AddrInfoHandle, AddrInfoHints, AddrInfoResult, NameInfo};
use super::records::{CompatRecord, Ipv4Record, Ipv6Record, Lookup};
use super::Resolver;
use crate::addr::SockAddr;
use crate::error::{Error, Result};
use crate::native::{ensure_c_str, LookupReply, NativeResult};

/// `getnameinfo` flag: fail when the host name cannot be resolved.
pub const NAMEREQD: i32 = libc::NI_NAMEREQD;

/// Upper bound on `max_count` for the bounded lookups. A DNS message is at
/// most 64 KiB and every address record takes at least 16 bytes of it.
pub const MAX_LOOKUP_RECORDS: usize = 4096;

impl Resolver {
	/// Forward resolution of `node` and/or `service`.
	///
	/// A failed resolution is not an `Err`: it comes back as a non-zero
	/// `status` with no entries. Entries keep the order the native
	/// resolver produced them in.
	pub fn getaddrinfo(
		&self,
		node: Option<&str>,
		service: Option<&str>,
		hints: Option<&AddrInfoHints>,
	) -> Result<AddrInfoResult> {
		if node.is_none() && service.is_none() {
			return Err(Error::invalid("getaddrinfo() needs a node or a service"));
		}
		if let Some(node) = node {
			ensure_c_str("node", node)?;
		}
		if let Some(service) = service {
			ensure_c_str("service", service)?;
		}

		trace!(?node, ?service, "getaddrinfo");
		match self.native().getaddrinfo(node, service, hints) {
			Ok(list) => Ok(AddrInfoResult {
				entries: list.entries,
				status: 0,
				// A null list owns nothing, so there is nothing to free.
				handle: (list.token != 0).then(|| AddrInfoHandle::new(self.inner.clone(), list.token)),
			}),
			Err(status) => {
				trace!(status, "getaddrinfo failed");
				Ok(AddrInfoResult::failed(status))
			}
		}
	}

	/// Releases the native memory of a `getaddrinfo` answer.
	pub fn free_addrinfo(&self, mut handle: AddrInfoHandle) -> Result<()> {
		if handle.raw() == 0 {
			return Err(Error::invalid("addrinfo handle is null"));
		}
		handle.release();
		Ok(())
	}

	/// Describes a non-zero `getaddrinfo`/`getnameinfo` status.
	pub fn strerror(&self, status: i32) -> Result<String> {
		if status == 0 {
			return Err(Error::invalid("status 0 is not an error"));
		}
		Ok(self.native().gai_strerror(status))
	}

	/// Reverse resolution of a socket address.
	///
	/// With [`NAMEREQD`] set, an address whose host name could not be
	/// resolved is an `Err` even though the native status is zero.
	pub fn getnameinfo(&self, addr: &SockAddr, flags: i32) -> Result<NameInfo> {
		trace!(?addr, flags, "getnameinfo");
		let reply = self.native().getnameinfo(addr, flags);
		if reply.status != 0 {
			return Ok(NameInfo { status: reply.status, host: None, service: None });
		}
		if flags & NAMEREQD != 0 {
			if let Some(errno) = reply.name_error {
				return Err(errno.os("getnameinfo"));
			}
		}
		Ok(NameInfo { status: 0, host: reply.host, service: reply.service })
	}

	/// Up to `max_count` IPv4 addresses of `name`.
	///
	/// None when the name exists but has no A records. `max_count` is capped
	/// at [`MAX_LOOKUP_RECORDS`].
	pub fn lookup_a(&self, name: &str, max_count: usize) -> Result<Option<Lookup<Ipv4Record>>> {
		ensure_c_str("name", name)?;
		let max_count = max_count.min(MAX_LOOKUP_RECORDS);
		let records = bounded("lookup_a", self.native().lookup_a(name, max_count), max_count)?;
		Ok(Lookup::from_vec(records.into_iter().map(Ipv4Record::from_octets).collect()))
	}

	/// Up to `max_count` IPv6 addresses of `name`.
	pub fn lookup_aaaa(&self, name: &str, max_count: usize) -> Result<Option<Lookup<Ipv6Record>>> {
		ensure_c_str("name", name)?;
		let max_count = max_count.min(MAX_LOOKUP_RECORDS);
		let records = bounded("lookup_aaaa", self.native().lookup_aaaa(name, max_count), max_count)?;
		Ok(Lookup::from_vec(records.into_iter().map(Ipv6Record::from_octets).collect()))
	}

	/// Mixed IPv6/IPv4 lookup; consecutive results are paired up.
	pub fn lookup_aaaa_compat(&self, name: &str, max_count: usize) -> Result<Option<Lookup<CompatRecord>>> {
		ensure_c_str("name", name)?;
		let max_count = max_count.min(MAX_LOOKUP_RECORDS);
		let records = bounded(
			"lookup_aaaa_compat",
			self.native().lookup_aaaa_compat(name, max_count),
			max_count,
		)?;
		Ok(Lookup::from_vec(CompatRecord::pair_up(&records)))
	}
}

/// Keeps at most `min(count, max_count)` records of a lookup reply.
fn bounded<T>(op: &'static str, reply: NativeResult<LookupReply<T>>, max_count: usize) -> Result<Vec<T>> {
	let mut reply = reply.map_err(|e| e.os(op))?;
	trace!(op, count = reply.count, max_count, "lookup answered");
	reply.records.truncate(reply.count.min(max_count));
	Ok(reply.records)
}
