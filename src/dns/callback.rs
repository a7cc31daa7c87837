use tracing::trace;

use super::records::{DnsPacket, RecordFields, Section};
use super::Resolver;
use crate::error::Result;
use crate::native::ensure_c_str;

impl Resolver {
	/// Runs a raw query for `name`/`qtype`, calling `handler` once per
	/// resource record as the response is parsed.
	///
	/// The handler receives the record's section, its fixed fields, a
	/// reader over the packet data behind the record, and `context`. Its
	/// return value is the continuation code handed back to the resolver
	/// for that record.
	///
	/// Handler and context belong to this call only: concurrent raw
	/// lookups, on this resolver or others, never see each other's
	/// handlers. Returns the native status of the query.
	pub fn lookup_cb<C, F>(&self, name: &str, qtype: u16, mut handler: F, context: &mut C) -> Result<i32>
	where
		F: FnMut(Section, &RecordFields, &mut dyn DnsPacket, &mut C) -> i32,
	{
		ensure_c_str("name", name)?;
		trace!(name, qtype, "lookup_cb");

		let mut records = 0usize;
		let mut sink = |section: Section, fields: &RecordFields, packet: &mut dyn DnsPacket| -> i32 {
			records += 1;
			handler(section, fields, packet, &mut *context)
		};
		let status = self.native().lookup_cb(name, qtype, &mut sink).map_err(|e| e.os("lookup_cb"))?;

		trace!(name, qtype, records, status, "lookup_cb finished");
		Ok(status)
	}
}
