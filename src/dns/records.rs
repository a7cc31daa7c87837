use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Query type of an A record.
pub const QTYPE_A: u16 = 1;
/// Query type of an NS record.
pub const QTYPE_NS: u16 = 2;
/// Query type of a CNAME record.
pub const QTYPE_CNAME: u16 = 5;
/// Query type of a PTR record.
pub const QTYPE_PTR: u16 = 12;
/// Query type of an MX record.
pub const QTYPE_MX: u16 = 15;
/// Query type of a TXT record.
pub const QTYPE_TXT: u16 = 16;
/// Query type of an AAAA record.
pub const QTYPE_AAAA: u16 = 28;
/// Query type of an SRV record.
pub const QTYPE_SRV: u16 = 33;

/// An IPv4 address record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ipv4Record {
	/// The address as stored in `in_addr.s_addr` (network byte order in memory).
	pub s_addr: u32,
	/// Dotted-decimal rendering.
	pub addr: String,
}

impl Ipv4Record {
	pub fn from_octets(octets: [u8; 4]) -> Self {
		Self {
			s_addr: u32::from_ne_bytes(octets),
			addr: Ipv4Addr::from(octets).to_string(),
		}
	}

	pub fn ip(&self) -> Ipv4Addr {
		Ipv4Addr::from(self.s_addr.to_ne_bytes())
	}
}

impl fmt::Display for Ipv4Record {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.addr)
	}
}

/// An IPv6 address record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ipv6Record {
	pub octets: [u8; 16],
	/// Canonical text rendering.
	pub addr: String,
}

impl Ipv6Record {
	pub fn from_octets(octets: [u8; 16]) -> Self {
		Self { octets, addr: Ipv6Addr::from(octets).to_string() }
	}

	pub fn ip(&self) -> Ipv6Addr {
		Ipv6Addr::from(self.octets)
	}
}

impl fmt::Display for Ipv6Record {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.addr)
	}
}

/// A record from a mixed AAAA/A lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompatRecord {
	/// An IPv6 record followed by an IPv4-compatible entry, rendered
	/// in dotted-decimal.
	Pair { v6: Ipv6Record, v4: String },
	/// A trailing IPv6 record with no partner.
	Single(Ipv6Record),
}

impl CompatRecord {
	/// Groups native results two by two; an odd last entry stands alone.
	pub(crate) fn pair_up(entries: &[[u8; 16]]) -> Vec<CompatRecord> {
		let mut pairs = entries.chunks_exact(2);
		let mut records: Vec<CompatRecord> = pairs
			.by_ref()
			.map(|pair| CompatRecord::Pair {
				v6: Ipv6Record::from_octets(pair[0]),
				v4: Ipv4Addr::new(pair[1][12], pair[1][13], pair[1][14], pair[1][15]).to_string(),
			})
			.collect();
		records.extend(pairs.remainder().first().map(|single| CompatRecord::Single(Ipv6Record::from_octets(*single))));
		records
	}
}

/// Result of a bounded lookup that found at least one record.
///
/// A single record is returned as itself, not wrapped in a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
	One(T),
	Many(Vec<T>),
}

impl<T> Lookup<T> {
	/// None for an empty list.
	pub(crate) fn from_vec(mut records: Vec<T>) -> Option<Self> {
		match records.len() {
			0 => None,
			1 => records.pop().map(Lookup::One),
			_ => Some(Lookup::Many(records)),
		}
	}

	pub fn len(&self) -> usize {
		match self {
			Lookup::One(_) => 1,
			Lookup::Many(records) => records.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn into_vec(self) -> Vec<T> {
		match self {
			Lookup::One(record) => vec![record],
			Lookup::Many(records) => records,
		}
	}
}

/// Message section a raw record was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
	Header,
	Question,
	Answer,
	Authority,
	Additional,
	Other(i32),
}

impl Section {
	pub fn from_raw(raw: i32) -> Self {
		match raw {
			0 => Section::Header,
			1 => Section::Question,
			2 => Section::Answer,
			3 => Section::Authority,
			4 => Section::Additional,
			other => Section::Other(other),
		}
	}

	pub fn raw(self) -> i32 {
		match self {
			Section::Header => 0,
			Section::Question => 1,
			Section::Answer => 2,
			Section::Authority => 3,
			Section::Additional => 4,
			Section::Other(other) => other,
		}
	}
}

/// Fixed fields of a resource record, as parsed by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFields {
	pub name: String,
	pub rtype: u16,
	pub class: u16,
	pub ttl: u32,
	pub rdlength: u16,
}

/// Read access to the response packet behind the current record.
///
/// Readers advance through the record data; reading past the end yields
/// zeroes or empty values rather than failing.
pub trait DnsPacket {
	/// Header flags of the response, when the backend exposes them.
	fn flags(&self) -> Option<u16>;

	fn get_u8(&mut self) -> u8;

	fn get_u16(&mut self) -> u16;

	fn get_u32(&mut self) -> u32;

	fn get_data(&mut self, len: usize) -> Vec<u8>;

	/// A domain name, dot separated, without the trailing root dot.
	fn get_name(&mut self) -> String;

	/// A length-prefixed character string.
	fn get_string(&mut self) -> String;

	fn get_a(&mut self) -> Ipv4Addr {
		let mut octets = [0u8; 4];
		for (dst, src) in octets.iter_mut().zip(self.get_data(4)) {
			*dst = src;
		}
		Ipv4Addr::from(octets)
	}

	fn get_aaaa(&mut self) -> Ipv6Addr {
		let mut octets = [0u8; 16];
		for (dst, src) in octets.iter_mut().zip(self.get_data(16)) {
			*dst = src;
		}
		Ipv6Addr::from(octets)
	}
}
