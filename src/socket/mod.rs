//! Sockets living on a virtual stack.
//!
//! A [`Socket`] owns one descriptor and a clone of the [`Stack`] it was
//! created on, so the stack outlives every socket made from it.

mod listener;
mod stream;

use std::fmt;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicI32, Ordering};

use tracing::{debug, trace, warn};

use crate::addr::{self, Family, SockAddr};
use crate::error::{Errno, Error, Result};
use crate::stack::Stack;

/// Descriptor value of a closed socket.
const CLOSED: RawFd = -1;

/// Backlog used by `listen(None)`.
pub const DEFAULT_BACKLOG: i32 = if libc::SOMAXCONN < 128 { libc::SOMAXCONN } else { 128 };

/// A socket on a virtual stack.
///
/// All operations are blocking native calls. No lock is held across
/// them, so a socket can be shared between threads; ordering between
/// threads using the same socket is up to the caller.
pub struct Socket {
	stack: Stack,
	fd: AtomicI32,
	family: libc::c_int,
	ty: libc::c_int,
	proto: libc::c_int,
}

impl Socket {
	/// Creates a new native socket on `stack`.
	pub(crate) fn open(stack: &Stack, family: libc::c_int, ty: libc::c_int, proto: libc::c_int) -> Result<Self> {
		let fd = stack
			.native()
			.socket(family, ty, proto)
			.map_err(|e| e.os("socket"))?;
		debug!(fd, family, ty, proto, "opened socket");
		Ok(Self::from_parts(stack, family, ty, proto, fd))
	}

	/// Wraps a descriptor that already belongs to `stack`.
	///
	/// The descriptor is adopted, not duplicated: the socket closes it.
	///
	/// # Safety
	/// `fd` must be an open descriptor of `stack` that nothing else
	/// will close.
	pub unsafe fn adopt(stack: &Stack, family: libc::c_int, ty: libc::c_int, proto: libc::c_int, fd: RawFd) -> Result<Self> {
		if fd < 0 {
			return Err(Error::invalid("invalid file descriptor"));
		}
		Ok(Self::from_parts(stack, family, ty, proto, fd))
	}

	fn from_parts(stack: &Stack, family: libc::c_int, ty: libc::c_int, proto: libc::c_int, fd: RawFd) -> Self {
		Self {
			stack: stack.clone(),
			fd: AtomicI32::new(fd),
			family,
			ty,
			proto,
		}
	}

	/// The descriptor, or None once closed.
	pub fn fd(&self) -> Option<RawFd> {
		match self.fd.load(Ordering::Acquire) {
			CLOSED => None,
			fd => Some(fd),
		}
	}

	pub fn is_closed(&self) -> bool {
		self.fd().is_none()
	}

	pub fn family(&self) -> libc::c_int {
		self.family
	}

	pub fn socket_type(&self) -> libc::c_int {
		self.ty
	}

	pub fn protocol(&self) -> libc::c_int {
		self.proto
	}

	/// The stack this socket belongs to.
	pub fn stack(&self) -> &Stack {
		&self.stack
	}

	/// Closes the socket.
	///
	/// Closing an already closed socket does nothing. A connection reset
	/// reported by the native close still counts as closed.
	pub fn close(&self) -> Result<()> {
		let fd = self.fd.swap(CLOSED, Ordering::AcqRel);
		if fd == CLOSED {
			return Ok(());
		}
		trace!(fd, "close");
		match self.stack.native().close(fd) {
			Ok(()) => Ok(()),
			Err(Errno(libc::ECONNRESET)) => Ok(()),
			Err(e) => Err(e.os("close")),
		}
	}

	/// Returns the open descriptor, or EBADF for a closed socket.
	fn live_fd(&self, op: &'static str) -> Result<RawFd> {
		self.fd().ok_or(Error::Os { op, errno: libc::EBADF })
	}

	/// Encodes `(host, port)` for this socket's family.
	fn sockaddr(&self, op: &'static str, (host, port): (&str, i64)) -> Result<SockAddr> {
		let family = Family::from_raw(self.family)
			.ok_or_else(|| Error::invalid("invalid socket family"))?;
		addr::encode(op, host, port, family)
	}
}

impl Drop for Socket {
	fn drop(&mut self) {
		// Drop cannot report failures, so they are only logged.
		if let Err(err) = self.close() {
			warn!(%err, "failed to close socket on drop");
		}
	}
}

impl std::os::fd::AsRawFd for Socket {
	/// Returns -1 once the socket is closed.
	fn as_raw_fd(&self) -> RawFd {
		self.fd.load(Ordering::Acquire)
	}
}

impl fmt::Debug for Socket {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"<socket object, fd={}, family={}, type={}, proto={}>",
			self.fd.load(Ordering::Acquire),
			self.family,
			self.ty,
			self.proto
		)
	}
}
