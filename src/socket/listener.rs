use tracing::{debug, trace};

use super::{Socket, DEFAULT_BACKLOG};
use crate::addr::AddrTuple;
use crate::error::Result;

impl Socket {
	/// Binds to `(host, port)`.
	///
	/// An empty host is the wildcard address; `"<broadcast>"` is the
	/// IPv4 broadcast address.
	pub fn bind(&self, addr: (&str, i64)) -> Result<()> {
		let sockaddr = self.sockaddr("bind", addr)?;
		let fd = self.live_fd("bind")?;
		trace!(fd, ?sockaddr, "bind");
		self.stack.native().bind(fd, &sockaddr).map_err(|e| e.os("bind"))
	}

	/// Starts listening.
	///
	/// `None` uses [`DEFAULT_BACKLOG`]. A negative backlog is treated as
	/// zero and anything above `SOMAXCONN` as `SOMAXCONN`.
	pub fn listen(&self, backlog: Option<i32>) -> Result<()> {
		let backlog = backlog.unwrap_or(DEFAULT_BACKLOG).clamp(0, libc::SOMAXCONN);
		let fd = self.live_fd("listen")?;
		trace!(fd, backlog, "listen");
		self.stack.native().listen(fd, backlog).map_err(|e| e.os("listen"))
	}

	/// Accepts a connection.
	///
	/// The new socket shares this socket's stack, family, type and
	/// protocol. The peer address is None when the stack reported none
	/// or reported a family other than IPv4/IPv6.
	pub fn accept(&self) -> Result<(Socket, Option<AddrTuple>)> {
		let fd = self.live_fd("accept")?;
		trace!(fd, "accept");
		let (conn, peer) = self.stack.native().accept(fd).map_err(|e| e.os("accept"))?;

		let socket = Socket::from_parts(&self.stack, self.family, self.ty, self.proto, conn);
		let peer = peer.and_then(|addr| addr.to_tuple());
		debug!(listener = fd, fd = conn, ?peer, "accepted connection");
		Ok((socket, peer))
	}
}
