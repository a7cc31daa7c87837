//! Raw declarations of the libioth, libiothconf and libiothdns entry points.

#![allow(non_camel_case_types)]

use libc::{addrinfo, c_char, c_int, c_void, in6_addr, in_addr, size_t, sockaddr, socklen_t, ssize_t};

/// Size of the name buffer inside `iothdns_rr`.
pub const IOTHDNS_MAXNAME: usize = 256;

#[repr(C)]
pub struct ioth {
	_private: [u8; 0],
}

#[repr(C)]
pub struct iothdns {
	_private: [u8; 0],
}

#[repr(C)]
pub struct iothdns_pkt {
	_private: [u8; 0],
}

#[repr(C)]
pub struct iothdns_rr {
	pub name: [c_char; IOTHDNS_MAXNAME],
	pub rtype: u16,
	pub rclass: u16,
	pub ttl: u32,
	pub rdlength: u16,
}

pub type lookup_cb_t =
	unsafe extern "C" fn(section: c_int, rr: *mut iothdns_rr, vpkt: *mut iothdns_pkt, arg: *mut c_void) -> c_int;

#[link(name = "ioth")]
unsafe extern "C" {
	pub fn ioth_newstacki(stack: *const c_char, options: *const c_char) -> *mut ioth;
	pub fn ioth_delstack(stack: *mut ioth) -> c_int;

	pub fn ioth_msocket(stack: *mut ioth, domain: c_int, ty: c_int, protocol: c_int) -> c_int;
	pub fn ioth_close(fd: c_int) -> c_int;
	pub fn ioth_bind(fd: c_int, addr: *const sockaddr, addrlen: socklen_t) -> c_int;
	pub fn ioth_connect(fd: c_int, addr: *const sockaddr, addrlen: socklen_t) -> c_int;
	pub fn ioth_listen(fd: c_int, backlog: c_int) -> c_int;
	pub fn ioth_accept(fd: c_int, addr: *mut sockaddr, addrlen: *mut socklen_t) -> c_int;
	pub fn ioth_send(fd: c_int, buf: *const c_void, len: size_t, flags: c_int) -> ssize_t;
	pub fn ioth_recv(fd: c_int, buf: *mut c_void, len: size_t, flags: c_int) -> ssize_t;

	pub fn ioth_if_nametoindex(stack: *mut ioth, ifname: *const c_char) -> c_int;
	pub fn ioth_ipaddr_add(stack: *mut ioth, family: c_int, addr: *mut c_void, prefixlen: c_int, ifindex: c_int) -> c_int;
}

#[link(name = "iothconf")]
unsafe extern "C" {
	pub fn ioth_config(stack: *mut ioth, config: *mut c_char) -> c_int;
}

#[link(name = "iothdns")]
unsafe extern "C" {
	pub fn iothdns_init(stack: *mut ioth, path_config: *const c_char) -> *mut iothdns;
	pub fn iothdns_init_strcfg(stack: *mut ioth, config: *const c_char) -> *mut iothdns;
	pub fn iothdns_update(dns: *mut iothdns, path_config: *const c_char) -> c_int;
	pub fn iothdns_update_strcfg(dns: *mut iothdns, config: *const c_char) -> c_int;
	pub fn iothdns_setpath(dns: *mut iothdns, pathtag: c_int, newvalue: *const c_char);
	pub fn iothdns_getpath(dns: *mut iothdns, pathtag: c_int, buf: *mut c_char, size: size_t) -> c_int;
	pub fn iothdns_fini(dns: *mut iothdns);

	pub fn iothdns_getaddrinfo(
		dns: *mut iothdns,
		node: *const c_char,
		service: *const c_char,
		hints: *const addrinfo,
		res: *mut *mut addrinfo,
	) -> c_int;
	pub fn iothdns_freeaddrinfo(res: *mut addrinfo);
	pub fn iothdns_gai_strerror(errcode: c_int) -> *const c_char;
	pub fn iothdns_getnameinfo(
		dns: *mut iothdns,
		addr: *const sockaddr,
		addrlen: socklen_t,
		host: *mut c_char,
		hostlen: socklen_t,
		serv: *mut c_char,
		servlen: socklen_t,
		flags: c_int,
	) -> c_int;

	pub fn iothdns_lookup_a(dns: *mut iothdns, name: *const c_char, a: *mut in_addr, n: c_int) -> c_int;
	pub fn iothdns_lookup_aaaa(dns: *mut iothdns, name: *const c_char, aaaa: *mut in6_addr, n: c_int) -> c_int;
	pub fn iothdns_lookup_aaaa_compat(dns: *mut iothdns, name: *const c_char, aaaa: *mut in6_addr, n: c_int) -> c_int;
	pub fn iothdns_lookup_cb(
		dns: *mut iothdns,
		name: *const c_char,
		qtype: c_int,
		lookup_cb: Option<lookup_cb_t>,
		arg: *mut c_void,
	) -> c_int;

	pub fn iothdns_get_int8(vpkt: *mut iothdns_pkt) -> u8;
	pub fn iothdns_get_int16(vpkt: *mut iothdns_pkt) -> u16;
	pub fn iothdns_get_int32(vpkt: *mut iothdns_pkt) -> u32;
	pub fn iothdns_get_data(vpkt: *mut iothdns_pkt, data: *mut c_void, len: u16) -> *mut c_void;
	pub fn iothdns_get_name(vpkt: *mut iothdns_pkt, name: *mut c_char) -> *mut c_char;
	pub fn iothdns_get_string(vpkt: *mut iothdns_pkt, name: *mut c_char) -> *mut c_char;
}
