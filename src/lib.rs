//! Sockets and DNS resolution on virtual, userspace network stacks.
//!
//! A [`Stack`] is one virtual network stack. [`Socket`]s are opened on a
//! stack and keep it alive; a [`Resolver`] optionally bound to a stack
//! sends its queries through it.
//!
//! The native libraries sit behind the traits in [`native`]. Enable the
//! `ioth` feature to link libioth/libiothdns and get `Stack::new` and
//! `Resolver::new`.

pub mod addr;
pub mod dns;
pub mod native;
pub mod socket;
mod error;
mod stack;

pub use self::error::{Errno, Error, Result, errno};
pub use self::addr::{AddrTuple, BROADCAST_HOST, Family, SockAddr};
pub use self::stack::{PICOX, Stack, StackBuilder};
pub use self::socket::{DEFAULT_BACKLOG, Socket};
pub use self::dns::{AddrInfo, AddrInfoHandle, AddrInfoHints, AddrInfoResult, CompatRecord, DnsPacket,
					Ipv4Record, Ipv6Record, Lookup, NameInfo, PathTag, RecordFields, Resolver,
					ResolverConfig, Section, NAMEREQD};
