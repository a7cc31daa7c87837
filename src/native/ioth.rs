//! Backends over the linked libioth/libiothdns.

use std::any::Any;
use std::ffi::{CStr, CString};
use std::os::fd::RawFd;
use std::panic::{self, AssertUnwindSafe};

use libc::{c_char, c_int, c_void};
use tracing::warn;

use super::ffi;
use super::{DnsResolver, LookupReply, NativeAddrInfo, NativeResult, NetworkStack, RecordSink, ResolverProvider, StackProvider};
use crate::addr::{self, Family, SockAddr};
use crate::dns::{
	AddrInfo, AddrInfoHints, DnsPacket, NameInfoReply, PathTag, RecordFields, ResolverConfig, Section, MAX_LOOKUP_RECORDS,
};
use crate::error::{clear_errno, errno, Errno};

/// Buffer sizes used for getnameinfo results, as in <netdb.h>.
const NI_MAXHOST: usize = 1025;
const NI_MAXSERV: usize = 32;

fn cstring(value: &str) -> NativeResult<CString> {
	CString::new(value).map_err(|_| Errno(libc::EINVAL))
}

/// Reads a NUL-terminated buffer, None when it is empty.
fn buf_to_string(buf: &[u8]) -> Option<String> {
	let text = CStr::from_bytes_until_nul(buf).ok()?.to_string_lossy();
	if text.is_empty() { None } else { Some(text.into_owned()) }
}

fn check(result: c_int) -> NativeResult<()> {
	if result < 0 { Err(Errno::last()) } else { Ok(()) }
}

fn c_count(max_count: usize) -> c_int {
	max_count.min(c_int::MAX as usize) as c_int
}

// ============================================================================
// Stack
// ============================================================================

/// Creates stacks with `ioth_newstacki`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IothStackProvider;

impl StackProvider for IothStackProvider {
	fn new_stack(&self, kind: &str, options: Option<&str>) -> Option<Box<dyn NetworkStack>> {
		let kind = cstring(kind).ok()?;
		let options = match options {
			Some(options) => Some(cstring(options).ok()?),
			None => None,
		};
		let stack = unsafe {
			ffi::ioth_newstacki(
				kind.as_ptr(),
				options.as_ref().map_or(std::ptr::null(), |o| o.as_ptr()),
			)
		};
		if stack.is_null() {
			return None;
		}
		Some(Box::new(IothStack { stack }))
	}
}

/// A libioth stack; deleted when dropped.
pub struct IothStack {
	stack: *mut ffi::ioth,
}

// SAFETY: libioth stacks are used from any thread; the pointer is only
// freed in Drop, which runs once.
unsafe impl Send for IothStack {}
unsafe impl Sync for IothStack {}

impl Drop for IothStack {
	fn drop(&mut self) {
		let stack = std::mem::replace(&mut self.stack, std::ptr::null_mut());
		if !stack.is_null() && unsafe { ffi::ioth_delstack(stack) } < 0 {
			warn!(errno = errno(), "ioth_delstack failed");
		}
	}
}

impl NetworkStack for IothStack {
	fn raw_handle(&self) -> usize {
		self.stack as usize
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn socket(&self, family: c_int, ty: c_int, proto: c_int) -> NativeResult<RawFd> {
		let fd = unsafe { ffi::ioth_msocket(self.stack, family, ty, proto) };
		if fd == -1 { Err(Errno::last()) } else { Ok(fd) }
	}

	fn bind(&self, fd: RawFd, addr: &SockAddr) -> NativeResult<()> {
		check(addr.with_raw(|ptr, len| unsafe { ffi::ioth_bind(fd, ptr, len) }))
	}

	fn listen(&self, fd: RawFd, backlog: c_int) -> NativeResult<()> {
		check(unsafe { ffi::ioth_listen(fd, backlog) })
	}

	fn accept(&self, fd: RawFd) -> NativeResult<(RawFd, Option<SockAddr>)> {
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

		let conn = unsafe {
			ffi::ioth_accept(fd, &mut storage as *mut _ as *mut libc::sockaddr, &mut len)
		};
		if conn == -1 {
			return Err(Errno::last());
		}

		let len = (len as usize).min(std::mem::size_of::<libc::sockaddr_storage>());
		let bytes = unsafe { std::slice::from_raw_parts(&storage as *const _ as *const u8, len) };
		Ok((conn, SockAddr::from_bytes(bytes)))
	}

	fn connect(&self, fd: RawFd, addr: &SockAddr) -> NativeResult<()> {
		check(addr.with_raw(|ptr, len| unsafe { ffi::ioth_connect(fd, ptr, len) }))
	}

	fn send(&self, fd: RawFd, buf: &[u8], flags: c_int) -> NativeResult<usize> {
		let n = unsafe { ffi::ioth_send(fd, buf.as_ptr() as *const c_void, buf.len(), flags) };
		if n < 0 { Err(Errno::last()) } else { Ok(n as usize) }
	}

	fn recv(&self, fd: RawFd, buf: &mut [u8], flags: c_int) -> NativeResult<usize> {
		let n = unsafe { ffi::ioth_recv(fd, buf.as_mut_ptr() as *mut c_void, buf.len(), flags) };
		if n < 0 { Err(Errno::last()) } else { Ok(n as usize) }
	}

	fn close(&self, fd: RawFd) -> NativeResult<()> {
		check(unsafe { ffi::ioth_close(fd) })
	}

	fn if_nametoindex(&self, name: &str) -> NativeResult<u32> {
		let name = cstring(name)?;
		// Missing interfaces come back as -1 rather than 0.
		match unsafe { ffi::ioth_if_nametoindex(self.stack, name.as_ptr()) } {
			index if index > 0 => Ok(index as u32),
			_ => Err(Errno(libc::ENODEV)),
		}
	}

	fn ipaddr_add(&self, family: Family, addr: &[u8], prefix_len: c_int, if_index: c_int) -> NativeResult<()> {
		let mut packed = [0u8; 16];
		packed[..addr.len()].copy_from_slice(addr);
		check(unsafe {
			ffi::ioth_ipaddr_add(
				self.stack,
				family.raw(),
				packed.as_mut_ptr() as *mut c_void,
				prefix_len,
				if_index,
			)
		})
	}

	fn config(&self, line: &str) -> NativeResult<()> {
		let mut line = cstring(line)?.into_bytes_with_nul();
		check(unsafe { ffi::ioth_config(self.stack, line.as_mut_ptr() as *mut c_char) })
	}
}

// ============================================================================
// Resolver
// ============================================================================

/// Creates resolver sessions with `iothdns_init`/`iothdns_init_strcfg`.
///
/// A bound resolver needs a stack created by [`IothStackProvider`].
#[derive(Debug, Default, Clone, Copy)]
pub struct IothResolverProvider;

impl ResolverProvider for IothResolverProvider {
	fn new_resolver(&self, stack: Option<&dyn NetworkStack>, config: &ResolverConfig) -> NativeResult<Box<dyn DnsResolver>> {
		let stack = match stack {
			None => std::ptr::null_mut(),
			Some(stack) => stack
				.as_any()
				.downcast_ref::<IothStack>()
				.map(|s| s.stack)
				.ok_or(Errno(libc::EINVAL))?,
		};
		let dns = match config {
			ResolverConfig::System => unsafe { ffi::iothdns_init(stack, std::ptr::null()) },
			ResolverConfig::File(path) => {
				let path = cstring(path)?;
				unsafe { ffi::iothdns_init(stack, path.as_ptr()) }
			}
			ResolverConfig::Inline(text) => {
				let text = cstring(text)?;
				unsafe { ffi::iothdns_init_strcfg(stack, text.as_ptr()) }
			}
		};
		if dns.is_null() {
			return Err(Errno::last());
		}
		Ok(Box::new(IothResolver { dns }))
	}
}

/// A libiothdns session; finalized when dropped.
pub struct IothResolver {
	dns: *mut ffi::iothdns,
}

// SAFETY: the session is not tied to a thread and every query carries its
// own state; the pointer is only freed in Drop.
unsafe impl Send for IothResolver {}
unsafe impl Sync for IothResolver {}

impl Drop for IothResolver {
	fn drop(&mut self) {
		let dns = std::mem::replace(&mut self.dns, std::ptr::null_mut());
		if !dns.is_null() {
			unsafe { ffi::iothdns_fini(dns) };
		}
	}
}

impl IothResolver {
	fn lookup<T, R: Copy>(
		&self,
		name: &str,
		max_count: usize,
		empty: R,
		call: unsafe extern "C" fn(*mut ffi::iothdns, *const c_char, *mut R, c_int) -> c_int,
		convert: impl Fn(R) -> T,
	) -> NativeResult<LookupReply<T>> {
		let name = cstring(name)?;
		let max_count = max_count.min(MAX_LOOKUP_RECORDS);
		let mut buf = vec![empty; max_count];
		let n = unsafe { call(self.dns, name.as_ptr(), buf.as_mut_ptr(), c_count(max_count)) };
		if n < 0 {
			return Err(Errno::last());
		}
		let count = n as usize;
		let records = buf.into_iter().take(count.min(max_count)).map(convert).collect();
		Ok(LookupReply { count, records })
	}
}

impl DnsResolver for IothResolver {
	fn update(&self, path: &str) -> NativeResult<()> {
		let path = cstring(path)?;
		check(unsafe { ffi::iothdns_update(self.dns, path.as_ptr()) })
	}

	fn update_inline(&self, config: &str) -> NativeResult<()> {
		let config = cstring(config)?;
		check(unsafe { ffi::iothdns_update_strcfg(self.dns, config.as_ptr()) })
	}

	fn set_path(&self, tag: PathTag, value: &str) -> NativeResult<()> {
		let value = cstring(value)?;
		unsafe { ffi::iothdns_setpath(self.dns, tag.raw(), value.as_ptr()) };
		Ok(())
	}

	fn get_path(&self, tag: PathTag) -> NativeResult<String> {
		let mut buf = vec![0u8; libc::PATH_MAX as usize];
		check(unsafe { ffi::iothdns_getpath(self.dns, tag.raw(), buf.as_mut_ptr() as *mut c_char, buf.len()) })?;
		Ok(buf_to_string(&buf).unwrap_or_default())
	}

	fn getaddrinfo(
		&self,
		node: Option<&str>,
		service: Option<&str>,
		hints: Option<&AddrInfoHints>,
	) -> Result<NativeAddrInfo, i32> {
		let node = node.map(cstring).transpose().map_err(|_| libc::EAI_NONAME)?;
		let service = service.map(cstring).transpose().map_err(|_| libc::EAI_SERVICE)?;
		let hints = hints.map(|h| {
			let mut raw: libc::addrinfo = unsafe { std::mem::zeroed() };
			raw.ai_flags = h.flags;
			raw.ai_family = h.family;
			raw.ai_socktype = h.socktype;
			raw.ai_protocol = h.protocol;
			raw
		});

		let mut res: *mut libc::addrinfo = std::ptr::null_mut();
		let status = unsafe {
			ffi::iothdns_getaddrinfo(
				self.dns,
				node.as_ref().map_or(std::ptr::null(), |n| n.as_ptr()),
				service.as_ref().map_or(std::ptr::null(), |s| s.as_ptr()),
				hints.as_ref().map_or(std::ptr::null(), |h| h as *const _),
				&mut res,
			)
		};
		if status != 0 {
			return Err(status);
		}

		let mut entries = Vec::new();
		let mut cur = res;
		while !cur.is_null() {
			let ai = unsafe { &*cur };
			let addr = if ai.ai_addr.is_null() {
				None
			} else {
				let bytes = unsafe { std::slice::from_raw_parts(ai.ai_addr as *const u8, ai.ai_addrlen as usize) };
				addr::decode(bytes)
			};
			let canonname = if ai.ai_canonname.is_null() {
				None
			} else {
				Some(unsafe { CStr::from_ptr(ai.ai_canonname) }.to_string_lossy().into_owned())
			};
			entries.push(AddrInfo {
				flags: ai.ai_flags,
				family: ai.ai_family,
				socktype: ai.ai_socktype,
				protocol: ai.ai_protocol,
				addr,
				canonname,
			});
			cur = ai.ai_next;
		}
		Ok(NativeAddrInfo { entries, token: res as usize })
	}

	fn free_addrinfo(&self, token: usize) {
		unsafe { ffi::iothdns_freeaddrinfo(token as *mut libc::addrinfo) };
	}

	fn gai_strerror(&self, status: i32) -> String {
		let msg = unsafe { ffi::iothdns_gai_strerror(status) };
		if msg.is_null() {
			return format!("unknown error {}", status);
		}
		unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
	}

	fn getnameinfo(&self, addr: &SockAddr, flags: i32) -> NameInfoReply {
		let mut host = vec![0u8; NI_MAXHOST];
		let mut serv = vec![0u8; NI_MAXSERV];

		// Reset first: a stale errno must not be taken for this call's failure.
		clear_errno();
		let status = addr.with_raw(|ptr, len| unsafe {
			ffi::iothdns_getnameinfo(
				self.dns,
				ptr,
				len,
				host.as_mut_ptr() as *mut c_char,
				host.len() as libc::socklen_t,
				serv.as_mut_ptr() as *mut c_char,
				serv.len() as libc::socklen_t,
				flags,
			)
		});
		let err = errno();

		if status != 0 {
			return NameInfoReply { status, ..NameInfoReply::default() };
		}
		NameInfoReply {
			status,
			host: buf_to_string(&host),
			service: buf_to_string(&serv),
			name_error: if err != 0 { Some(Errno(err)) } else { None },
		}
	}

	fn lookup_a(&self, name: &str, max_count: usize) -> NativeResult<LookupReply<[u8; 4]>> {
		self.lookup(name, max_count, libc::in_addr { s_addr: 0 }, ffi::iothdns_lookup_a, |a| {
			a.s_addr.to_ne_bytes()
		})
	}

	fn lookup_aaaa(&self, name: &str, max_count: usize) -> NativeResult<LookupReply<[u8; 16]>> {
		self.lookup(name, max_count, libc::in6_addr { s6_addr: [0; 16] }, ffi::iothdns_lookup_aaaa, |a| {
			a.s6_addr
		})
	}

	fn lookup_aaaa_compat(&self, name: &str, max_count: usize) -> NativeResult<LookupReply<[u8; 16]>> {
		self.lookup(
			name,
			max_count,
			libc::in6_addr { s6_addr: [0; 16] },
			ffi::iothdns_lookup_aaaa_compat,
			|a| a.s6_addr,
		)
	}

	fn lookup_cb(&self, name: &str, qtype: u16, sink: &mut RecordSink<'_>) -> NativeResult<i32> {
		let name = cstring(name)?;
		let mut call = CallbackCall { sink, panic: None };

		let status = unsafe {
			ffi::iothdns_lookup_cb(
				self.dns,
				name.as_ptr(),
				qtype as c_int,
				Some(record_trampoline),
				&mut call as *mut CallbackCall<'_, '_> as *mut c_void,
			)
		};

		if let Some(payload) = call.panic.take() {
			panic::resume_unwind(payload);
		}
		if status < 0 {
			return Err(Errno::last());
		}
		Ok(status)
	}
}

// ============================================================================
// Raw lookup callback
// ============================================================================

/// State of one `lookup_cb` call, reached through the callback's user
/// data pointer.
struct CallbackCall<'s, 'a> {
	sink: &'s mut RecordSink<'a>,
	panic: Option<Box<dyn Any + Send + 'static>>,
}

unsafe extern "C" fn record_trampoline(
	section: c_int,
	rr: *mut ffi::iothdns_rr,
	vpkt: *mut ffi::iothdns_pkt,
	arg: *mut c_void,
) -> c_int {
	// SAFETY: `arg` is the CallbackCall owned by lookup_cb, alive for the
	// whole native call.
	let call = unsafe { &mut *(arg as *mut CallbackCall<'_, '_>) };
	if call.panic.is_some() {
		return -1;
	}

	let fields = if rr.is_null() {
		RecordFields::default()
	} else {
		record_fields(unsafe { &*rr })
	};
	let mut packet = IothPacket { pkt: vpkt };

	// Unwinding must not cross the C frame.
	let sink = &mut *call.sink;
	match panic::catch_unwind(AssertUnwindSafe(|| sink(Section::from_raw(section), &fields, &mut packet))) {
		Ok(code) => code,
		Err(payload) => {
			call.panic = Some(payload);
			-1
		}
	}
}

fn record_fields(rr: &ffi::iothdns_rr) -> RecordFields {
	let name: Vec<u8> = rr.name.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
	RecordFields {
		name: String::from_utf8_lossy(&name).into_owned(),
		rtype: rr.rtype,
		class: rr.rclass,
		ttl: rr.ttl,
		rdlength: rr.rdlength,
	}
}

/// Reader over the packet libiothdns is parsing.
struct IothPacket {
	pkt: *mut ffi::iothdns_pkt,
}

impl DnsPacket for IothPacket {
	// The per-record callback does not receive the header.
	fn flags(&self) -> Option<u16> {
		None
	}

	fn get_u8(&mut self) -> u8 {
		unsafe { ffi::iothdns_get_int8(self.pkt) }
	}

	fn get_u16(&mut self) -> u16 {
		unsafe { ffi::iothdns_get_int16(self.pkt) }
	}

	fn get_u32(&mut self) -> u32 {
		unsafe { ffi::iothdns_get_int32(self.pkt) }
	}

	fn get_data(&mut self, len: usize) -> Vec<u8> {
		let len = len.min(u16::MAX as usize);
		let mut buf = vec![0u8; len];
		unsafe { ffi::iothdns_get_data(self.pkt, buf.as_mut_ptr() as *mut c_void, len as u16) };
		buf
	}

	fn get_name(&mut self) -> String {
		let mut buf = vec![0u8; ffi::IOTHDNS_MAXNAME];
		unsafe { ffi::iothdns_get_name(self.pkt, buf.as_mut_ptr() as *mut c_char) };
		buf_to_string(&buf).unwrap_or_default()
	}

	fn get_string(&mut self) -> String {
		let mut buf = vec![0u8; ffi::IOTHDNS_MAXNAME];
		unsafe { ffi::iothdns_get_string(self.pkt, buf.as_mut_ptr() as *mut c_char) };
		buf_to_string(&buf).unwrap_or_default()
	}
}
