//! In-memory stacks and resolvers that record what the binding asks of them.

#![allow(dead_code)]

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use iothnet::dns::{AddrInfo, AddrInfoHints, DnsPacket, NameInfoReply, PathTag, RecordFields, ResolverConfig, Section};
use iothnet::native::{
	DnsResolver, LookupReply, NativeAddrInfo, NativeResult, NetworkStack, RecordSink, ResolverProvider, StackProvider,
};
use iothnet::{Errno, Family, SockAddr, Stack};

// ============================================================================
// Stack
// ============================================================================

#[derive(Default)]
pub struct StackState {
	pub calls: Mutex<Vec<String>>,
	pub next_fd: AtomicI32,
	pub native_closes: AtomicUsize,
	pub dropped: AtomicBool,
	pub created_with: Mutex<Option<(String, Option<String>)>>,
	pub socket_errno: Mutex<Option<i32>>,
	pub close_errno: Mutex<Option<i32>>,
	pub accept_errno: Mutex<Option<i32>>,
	pub accept_peer: Mutex<Option<SockAddr>>,
	pub last_addr: Mutex<Option<SockAddr>>,
	pub last_backlog: Mutex<Option<i32>>,
	pub incoming: Mutex<VecDeque<Vec<u8>>>,
	pub sent: Mutex<Vec<u8>>,
	pub config_lines: Mutex<Vec<String>>,
	pub interfaces: Mutex<Vec<(u32, String)>>,
}

impl StackState {
	pub fn new() -> Arc<Self> {
		let state = StackState::default();
		state.next_fd.store(3, Ordering::SeqCst);
		state.interfaces.lock().unwrap().push((1, "vde0".into()));
		Arc::new(state)
	}

	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().unwrap().clone()
	}

	fn record(&self, call: String) {
		self.calls.lock().unwrap().push(call);
	}
}

pub struct StubStack {
	pub state: Arc<StackState>,
}

impl Drop for StubStack {
	fn drop(&mut self) {
		self.state.dropped.store(true, Ordering::SeqCst);
	}
}

impl NetworkStack for StubStack {
	fn raw_handle(&self) -> usize {
		Arc::as_ptr(&self.state) as usize
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn socket(&self, family: libc::c_int, ty: libc::c_int, proto: libc::c_int) -> NativeResult<RawFd> {
		self.state.record(format!("socket {} {} {}", family, ty, proto));
		if let Some(errno) = *self.state.socket_errno.lock().unwrap() {
			return Err(Errno(errno));
		}
		Ok(self.state.next_fd.fetch_add(1, Ordering::SeqCst))
	}

	fn bind(&self, fd: RawFd, addr: &SockAddr) -> NativeResult<()> {
		self.state.record(format!("bind {}", fd));
		*self.state.last_addr.lock().unwrap() = Some(*addr);
		Ok(())
	}

	fn listen(&self, fd: RawFd, backlog: libc::c_int) -> NativeResult<()> {
		self.state.record(format!("listen {}", fd));
		*self.state.last_backlog.lock().unwrap() = Some(backlog);
		Ok(())
	}

	fn accept(&self, fd: RawFd) -> NativeResult<(RawFd, Option<SockAddr>)> {
		self.state.record(format!("accept {}", fd));
		if let Some(errno) = *self.state.accept_errno.lock().unwrap() {
			return Err(Errno(errno));
		}
		let conn = self.state.next_fd.fetch_add(1, Ordering::SeqCst);
		Ok((conn, *self.state.accept_peer.lock().unwrap()))
	}

	fn connect(&self, fd: RawFd, addr: &SockAddr) -> NativeResult<()> {
		self.state.record(format!("connect {}", fd));
		*self.state.last_addr.lock().unwrap() = Some(*addr);
		Ok(())
	}

	fn send(&self, fd: RawFd, buf: &[u8], _flags: libc::c_int) -> NativeResult<usize> {
		self.state.record(format!("send {}", fd));
		self.state.sent.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn recv(&self, fd: RawFd, buf: &mut [u8], _flags: libc::c_int) -> NativeResult<usize> {
		self.state.record(format!("recv {}", fd));
		match self.state.incoming.lock().unwrap().pop_front() {
			Some(data) => {
				let n = data.len().min(buf.len());
				buf[..n].copy_from_slice(&data[..n]);
				Ok(n)
			}
			None => Ok(0),
		}
	}

	fn close(&self, fd: RawFd) -> NativeResult<()> {
		self.state.record(format!("close {}", fd));
		self.state.native_closes.fetch_add(1, Ordering::SeqCst);
		match *self.state.close_errno.lock().unwrap() {
			Some(errno) => Err(Errno(errno)),
			None => Ok(()),
		}
	}

	fn if_nametoindex(&self, name: &str) -> NativeResult<u32> {
		self.state
			.interfaces
			.lock()
			.unwrap()
			.iter()
			.find(|(_, n)| n == name)
			.map(|(index, _)| *index)
			.ok_or(Errno(libc::ENODEV))
	}

	fn ipaddr_add(&self, family: Family, addr: &[u8], prefix_len: libc::c_int, if_index: libc::c_int) -> NativeResult<()> {
		self.state
			.record(format!("ipaddr_add {:?} {:?} {} {}", family, addr, prefix_len, if_index));
		Ok(())
	}

	fn config(&self, line: &str) -> NativeResult<()> {
		self.state.config_lines.lock().unwrap().push(line.to_owned());
		Ok(())
	}
}

pub struct StubStackProvider {
	pub state: Arc<StackState>,
	pub fail: bool,
}

impl StubStackProvider {
	pub fn new() -> Self {
		Self { state: StackState::new(), fail: false }
	}
}

impl StackProvider for StubStackProvider {
	fn new_stack(&self, kind: &str, options: Option<&str>) -> Option<Box<dyn NetworkStack>> {
		*self.state.created_with.lock().unwrap() = Some((kind.to_owned(), options.map(str::to_owned)));
		if self.fail {
			return None;
		}
		Some(Box::new(StubStack { state: self.state.clone() }))
	}
}

/// A stub stack plus the state it records into.
pub fn stub_stack() -> (Stack, Arc<StackState>) {
	let provider = StubStackProvider::new();
	let stack = Stack::with_provider(&provider, "vdestack", Some("vxvde://234.0.0.1")).unwrap();
	(stack, provider.state)
}

// ============================================================================
// Resolver
// ============================================================================

pub struct RawRecord {
	pub section: Section,
	pub fields: RecordFields,
	pub rdata: Vec<u8>,
}

#[derive(Default)]
pub struct DnsState {
	pub a: Mutex<HashMap<String, Vec<[u8; 4]>>>,
	pub aaaa: Mutex<HashMap<String, Vec<[u8; 16]>>>,
	pub gai: Mutex<HashMap<String, Vec<AddrInfo>>>,
	pub gai_calls: AtomicUsize,
	pub last_max_count: Mutex<Option<usize>>,
	pub freed: Mutex<Vec<usize>>,
	pub next_token: AtomicUsize,
	pub name_info: Mutex<NameInfoReply>,
	pub raw: Mutex<HashMap<String, Vec<RawRecord>>>,
	pub paths: Mutex<HashMap<PathTag, String>>,
	pub updates: Mutex<Vec<String>>,
	pub dropped: AtomicBool,
}

impl DnsState {
	pub fn new() -> Arc<Self> {
		let state = DnsState::default();
		state.next_token.store(0x1000, Ordering::SeqCst);
		Arc::new(state)
	}

	pub fn freed(&self) -> Vec<usize> {
		self.freed.lock().unwrap().clone()
	}
}

pub struct StubResolver {
	pub state: Arc<DnsState>,
}

impl Drop for StubResolver {
	fn drop(&mut self) {
		self.state.dropped.store(true, Ordering::SeqCst);
	}
}

fn bounded<T: Clone>(
	state: &DnsState,
	table: &HashMap<String, Vec<T>>,
	name: &str,
	max_count: usize,
) -> NativeResult<LookupReply<T>> {
	*state.last_max_count.lock().unwrap() = Some(max_count);
	let records = table.get(name).ok_or(Errno(libc::ENOENT))?;
	Ok(LookupReply {
		count: records.len(),
		records: records.iter().take(max_count).cloned().collect(),
	})
}

impl DnsResolver for StubResolver {
	fn update(&self, path: &str) -> NativeResult<()> {
		if path.starts_with("/missing") {
			return Err(Errno(libc::ENOENT));
		}
		self.state.updates.lock().unwrap().push(path.to_owned());
		Ok(())
	}

	fn update_inline(&self, config: &str) -> NativeResult<()> {
		self.state.updates.lock().unwrap().push(config.to_owned());
		Ok(())
	}

	fn set_path(&self, tag: PathTag, value: &str) -> NativeResult<()> {
		self.state.paths.lock().unwrap().insert(tag, value.to_owned());
		Ok(())
	}

	fn get_path(&self, tag: PathTag) -> NativeResult<String> {
		Ok(self.state.paths.lock().unwrap().get(&tag).cloned().unwrap_or_default())
	}

	fn getaddrinfo(
		&self,
		node: Option<&str>,
		_service: Option<&str>,
		_hints: Option<&AddrInfoHints>,
	) -> Result<NativeAddrInfo, i32> {
		self.state.gai_calls.fetch_add(1, Ordering::SeqCst);
		let entries = node
			.and_then(|node| self.state.gai.lock().unwrap().get(node).cloned())
			.ok_or(libc::EAI_NONAME)?;
		// An empty answer is a null list.
		let token = if entries.is_empty() { 0 } else { self.state.next_token.fetch_add(0x10, Ordering::SeqCst) };
		Ok(NativeAddrInfo { entries, token })
	}

	fn free_addrinfo(&self, token: usize) {
		self.state.freed.lock().unwrap().push(token);
	}

	fn gai_strerror(&self, status: i32) -> String {
		format!("stub error {}", status)
	}

	fn getnameinfo(&self, _addr: &SockAddr, _flags: i32) -> NameInfoReply {
		self.state.name_info.lock().unwrap().clone()
	}

	fn lookup_a(&self, name: &str, max_count: usize) -> NativeResult<LookupReply<[u8; 4]>> {
		bounded(&self.state, &self.state.a.lock().unwrap(), name, max_count)
	}

	fn lookup_aaaa(&self, name: &str, max_count: usize) -> NativeResult<LookupReply<[u8; 16]>> {
		bounded(&self.state, &self.state.aaaa.lock().unwrap(), name, max_count)
	}

	fn lookup_aaaa_compat(&self, name: &str, max_count: usize) -> NativeResult<LookupReply<[u8; 16]>> {
		bounded(&self.state, &self.state.aaaa.lock().unwrap(), name, max_count)
	}

	fn lookup_cb(&self, name: &str, _qtype: u16, sink: &mut RecordSink<'_>) -> NativeResult<i32> {
		let raw = self.state.raw.lock().unwrap();
		let records = raw.get(name).ok_or(Errno(libc::ENOENT))?;
		let mut delivered = 0;
		for record in records {
			let mut packet = PayloadReader::with_flags(&record.rdata, 0x8180);
			delivered += 1;
			if sink(record.section, &record.fields, &mut packet as &mut dyn DnsPacket) != 0 {
				break;
			}
		}
		Ok(delivered)
	}
}

#[derive(Default)]
pub struct StubResolverProvider {
	pub state: Arc<DnsState>,
	pub seen: Mutex<Vec<(bool, ResolverConfig)>>,
	pub fail_errno: Option<i32>,
}

impl StubResolverProvider {
	pub fn new() -> Self {
		Self { state: DnsState::new(), ..Default::default() }
	}
}

impl ResolverProvider for StubResolverProvider {
	fn new_resolver(&self, stack: Option<&dyn NetworkStack>, config: &ResolverConfig) -> NativeResult<Box<dyn DnsResolver>> {
		self.seen.lock().unwrap().push((stack.is_some(), config.clone()));
		if let Some(errno) = self.fail_errno {
			return Err(Errno(errno));
		}
		Ok(Box::new(StubResolver { state: self.state.clone() }))
	}
}

// ============================================================================
// Record data
// ============================================================================

/// A [`DnsPacket`] over record data held in memory.
///
/// Names must be uncompressed: a compression pointer ends the name.
#[derive(Debug, Clone)]
pub struct PayloadReader<'a> {
	data: &'a [u8],
	pos: usize,
	flags: Option<u16>,
}

impl<'a> PayloadReader<'a> {
	pub fn new(data: &'a [u8]) -> Self {
		Self { data, pos: 0, flags: None }
	}

	pub fn with_flags(data: &'a [u8], flags: u16) -> Self {
		Self { data, pos: 0, flags: Some(flags) }
	}

	pub fn remaining(&self) -> usize {
		self.data.len() - self.pos
	}

	fn take(&mut self, len: usize) -> &'a [u8] {
		let len = len.min(self.remaining());
		let out = &self.data[self.pos..self.pos + len];
		self.pos += len;
		out
	}
}

impl DnsPacket for PayloadReader<'_> {
	fn flags(&self) -> Option<u16> {
		self.flags
	}

	fn get_u8(&mut self) -> u8 {
		self.take(1).first().copied().unwrap_or(0)
	}

	fn get_u16(&mut self) -> u16 {
		match self.take(2) {
			[a, b] => u16::from_be_bytes([*a, *b]),
			_ => 0,
		}
	}

	fn get_u32(&mut self) -> u32 {
		match self.take(4) {
			[a, b, c, d] => u32::from_be_bytes([*a, *b, *c, *d]),
			_ => 0,
		}
	}

	fn get_data(&mut self, len: usize) -> Vec<u8> {
		self.take(len).to_vec()
	}

	fn get_name(&mut self) -> String {
		let mut labels = Vec::new();
		loop {
			let len = self.get_u8() as usize;
			if len == 0 {
				break;
			}
			if len & 0xc0 == 0xc0 {
				self.get_u8();
				break;
			}
			labels.push(String::from_utf8_lossy(self.take(len)).into_owned());
		}
		labels.join(".")
	}

	fn get_string(&mut self) -> String {
		let len = self.get_u8() as usize;
		String::from_utf8_lossy(self.take(len)).into_owned()
	}
}
