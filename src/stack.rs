//! Virtual network stacks.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::addr::Family;
use crate::error::{Error, Result};
use crate::native::{ensure_c_str, NetworkStack, StackProvider};
use crate::socket::Socket;

/// Stack kind whose constructor expects interface-attachment syntax
/// (`vde0=<url>`) instead of a bare switch URL.
pub const PICOX: &str = "picox";

/// Interface name used when attaching a picox stack to a switch.
const PICOX_INTERFACE: &str = "vde0";

/// A virtual network stack.
///
/// Cloning is cheap and shares the same native stack. Every [`Socket`]
/// and bound [`Resolver`](crate::Resolver) holds a clone, so the native
/// stack is released only after the last of them is gone, whatever
/// order the caller drops things in.
#[derive(Clone)]
pub struct Stack {
	inner: Arc<StackInner>,
}

struct StackInner {
	native: Box<dyn NetworkStack>,
	kind: String,
}

impl Drop for StackInner {
	fn drop(&mut self) {
		debug!(kind = %self.kind, handle = self.native.raw_handle(), "releasing stack");
	}
}

/// Builder for [`Stack`].
///
/// # Example
/// ```ignore
/// use iothnet::StackBuilder;
///
/// let stack = StackBuilder::new("vdestack")
///     .endpoint("vxvde://234.0.0.1")
///     .config("eth,ip=10.0.0.53/24,gw=10.0.0.1")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct StackBuilder {
	kind: String,
	endpoint: Option<String>,
	config: Vec<String>,
}

impl StackBuilder {
	pub fn new<S: Into<String>>(kind: S) -> Self {
		Self {
			kind: kind.into(),
			endpoint: None,
			config: Vec::new(),
		}
	}

	/// Virtual switch to attach the stack to, e.g. `vde:///tmp/mysw`.
	pub fn endpoint<S: Into<String>>(mut self, url: S) -> Self {
		self.endpoint = Some(url.into());
		self
	}

	/// Appends an iothconf line applied right after construction.
	pub fn config<S: Into<String>>(mut self, line: S) -> Self {
		self.config.push(line.into());
		self
	}

	/// Builds the stack with the linked libioth.
	#[cfg(feature = "ioth")]
	pub fn build(self) -> Result<Stack> {
		self.build_with(&crate::native::IothStackProvider)
	}

	pub fn build_with(self, provider: &dyn StackProvider) -> Result<Stack> {
		for line in &self.config {
			ensure_c_str("configuration", line)?;
		}
		let stack = Stack::with_provider(provider, &self.kind, self.endpoint.as_deref())?;
		for line in &self.config {
			stack.config(line)?;
		}
		Ok(stack)
	}
}

impl Stack {
	/// Creates a stack with the linked libioth.
	#[cfg(feature = "ioth")]
	pub fn new(kind: &str, endpoint: Option<&str>) -> Result<Self> {
		Self::with_provider(&crate::native::IothStackProvider, kind, endpoint)
	}

	/// Creates a stack of `kind` from `provider`, optionally attached to
	/// the virtual switch at `endpoint`.
	pub fn with_provider(provider: &dyn StackProvider, kind: &str, endpoint: Option<&str>) -> Result<Self> {
		ensure_c_str("stack kind", kind)?;
		if let Some(endpoint) = endpoint {
			ensure_c_str("endpoint", endpoint)?;
		}
		let options = endpoint_options(kind, endpoint);
		let native = provider
			.new_stack(kind, options.as_deref())
			.ok_or_else(|| Error::StackCreation { kind: kind.to_owned() })?;
		debug!(kind, ?options, handle = native.raw_handle(), "created stack");
		Ok(Self {
			inner: Arc::new(StackInner { native, kind: kind.to_owned() }),
		})
	}

	/// The kind this stack was created with.
	pub fn kind(&self) -> &str {
		&self.inner.kind
	}

	/// Address of the native stack object.
	///
	/// Only meaningful to code linked against the same native library;
	/// the stack stays valid for as long as this handle lives.
	pub fn raw_handle(&self) -> usize {
		self.inner.native.raw_handle()
	}

	/// Number of live handles (stack clones, sockets, bound resolvers).
	pub fn strong_count(&self) -> usize {
		Arc::strong_count(&self.inner)
	}

	/// Opens a new socket on this stack.
	pub fn socket(&self, family: libc::c_int, ty: libc::c_int, proto: libc::c_int) -> Result<Socket> {
		Socket::open(self, family, ty, proto)
	}

	/// Adds `addr/prefix_len` to interface `if_index`.
	///
	/// `addr` is a packed address: 4 bytes for `AF_INET`, 16 for `AF_INET6`.
	pub fn ipaddr_add(&self, family: libc::c_int, addr: &[u8], prefix_len: libc::c_int, if_index: libc::c_int) -> Result<()> {
		let af = Family::from_raw(family)
			.ok_or_else(|| Error::invalid(format!("unknown address family {}", family)))?;
		if addr.len() != af.packed_len() {
			return Err(Error::invalid("invalid length of packed IP address string"));
		}
		trace!(family, prefix_len, if_index, "ipaddr_add");
		self.native()
			.ipaddr_add(af, addr, prefix_len, if_index)
			.map_err(|e| e.failed("ipaddr_add"))
	}

	pub fn if_nametoindex(&self, name: &str) -> Result<u32> {
		ensure_c_str("interface name", name)?;
		self.native().if_nametoindex(name).map_err(|e| match e.0 {
			libc::ENODEV | libc::ENXIO => Error::NotFound { what: format!("interface {:?}", name) },
			_ => e.failed("if_nametoindex"),
		})
	}

	pub fn if_indextoname(&self, index: u32) -> Result<String> {
		self.native().if_indextoname(index).map_err(|e| match e.0 {
			libc::ENOSYS => Error::NotSupported { op: "if_indextoname" },
			libc::ENODEV | libc::ENXIO => Error::NotFound { what: format!("interface index {}", index) },
			_ => e.failed("if_indextoname"),
		})
	}

	/// Lists `(index, name)` for every interface of the stack.
	pub fn if_nameindex(&self) -> Result<Vec<(u32, String)>> {
		self.native().if_nameindex().map_err(|e| match e.0 {
			libc::ENOSYS => Error::NotSupported { op: "if_nameindex" },
			_ => e.failed("if_nameindex"),
		})
	}

	/// Applies an iothconf line, e.g. `"eth,ip=10.0.0.1/24,gw=10.0.0.254"`.
	pub fn config(&self, line: &str) -> Result<()> {
		ensure_c_str("configuration", line)?;
		trace!(line, "configuring stack");
		self.native().config(line).map_err(|e| e.failed("config"))
	}

	pub(crate) fn native(&self) -> &dyn NetworkStack {
		self.inner.native.as_ref()
	}
}

impl fmt::Debug for Stack {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "<stack object, kind={}, stack={:#x}>", self.inner.kind, self.raw_handle())
	}
}

impl fmt::Display for Stack {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} stack: {:#x}", self.inner.kind, self.raw_handle())
	}
}

/// Options string handed to the native constructor.
fn endpoint_options(kind: &str, endpoint: Option<&str>) -> Option<String> {
	let endpoint = endpoint?;
	if kind == PICOX {
		Some(format!("{}={}", PICOX_INTERFACE, endpoint))
	} else {
		Some(endpoint.to_owned())
	}
}
