use std::net::Ipv6Addr;

use super::AddrTuple;
use crate::error::{Error, Result};

/// Builds the raw sockaddr_in6 for `(host, port)`.
///
/// An empty host means in6addr_any. There is no IPv6 broadcast.
pub(super) fn encode(host: &str, port: u16) -> Result<libc::sockaddr_in6> {
	let ip = if host.is_empty() {
		Ipv6Addr::UNSPECIFIED
	} else {
		host.parse::<Ipv6Addr>().map_err(|_| Error::invalid("invalid ip address"))?
	};
	let mut raw: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
	raw.sin6_family = libc::AF_INET6 as libc::sa_family_t;
	raw.sin6_port = port.to_be();
	raw.sin6_addr = libc::in6_addr { s6_addr: ip.octets() };
	Ok(raw)
}

pub(super) fn decode(bytes: &[u8]) -> Option<AddrTuple> {
	if bytes.len() < std::mem::size_of::<libc::sockaddr_in6>() {
		return None;
	}
	let mut raw: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
	unsafe {
		std::ptr::copy_nonoverlapping(
			bytes.as_ptr(),
			&mut raw as *mut _ as *mut u8,
			std::mem::size_of::<libc::sockaddr_in6>(),
		);
	}
	Some(AddrTuple::V6 {
		host: Ipv6Addr::from(raw.sin6_addr.s6_addr).to_string(),
		port: u16::from_be(raw.sin6_port),
		flowinfo: u32::from_be(raw.sin6_flowinfo),
		scope_id: raw.sin6_scope_id,
	})
}
