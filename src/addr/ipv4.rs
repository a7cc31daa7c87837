use std::net::Ipv4Addr;

use super::{AddrTuple, BROADCAST_HOST};
use crate::error::{Error, Result};

/// Builds the raw sockaddr_in for `(host, port)`.
///
/// An empty host means INADDR_ANY, `<broadcast>` means INADDR_BROADCAST.
pub(super) fn encode(host: &str, port: u16) -> Result<libc::sockaddr_in> {
	let ip = if host.is_empty() {
		Ipv4Addr::UNSPECIFIED
	} else if host == BROADCAST_HOST {
		Ipv4Addr::BROADCAST
	} else {
		host.parse::<Ipv4Addr>().map_err(|_| Error::invalid("invalid ip address"))?
	};
	Ok(to_raw(ip, port))
}

pub(super) fn decode(bytes: &[u8]) -> Option<AddrTuple> {
	if bytes.len() < std::mem::size_of::<libc::sockaddr_in>() {
		return None;
	}
	let mut raw: libc::sockaddr_in = unsafe { std::mem::zeroed() };
	unsafe {
		std::ptr::copy_nonoverlapping(
			bytes.as_ptr(),
			&mut raw as *mut _ as *mut u8,
			std::mem::size_of::<libc::sockaddr_in>(),
		);
	}
	Some(from_raw(&raw))
}

/// Converts to the raw sockaddr_in for syscalls.
fn to_raw(ip: Ipv4Addr, port: u16) -> libc::sockaddr_in {
	libc::sockaddr_in {
		sin_family: libc::AF_INET as libc::sa_family_t,
		sin_port: port.to_be(),
		sin_addr: libc::in_addr {
			s_addr: u32::from_ne_bytes(ip.octets()),
		},
		sin_zero: [0; 8],
	}
}

fn from_raw(raw: &libc::sockaddr_in) -> AddrTuple {
	AddrTuple::V4 {
		host: Ipv4Addr::from(raw.sin_addr.s_addr.to_ne_bytes()).to_string(),
		port: u16::from_be(raw.sin_port),
	}
}
