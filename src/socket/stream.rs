use tracing::trace;

use super::Socket;
use crate::error::{Error, Result};

impl Socket {
	/// Connects to `(host, port)`.
	///
	/// A non-blocking socket whose connection is still in progress gets
	/// `Error::Os` with `EINPROGRESS`; it is never reported as connected.
	pub fn connect(&self, addr: (&str, i64)) -> Result<()> {
		let sockaddr = self.sockaddr("connect", addr)?;
		let fd = self.live_fd("connect")?;
		trace!(fd, ?sockaddr, "connect");
		self.stack.native().connect(fd, &sockaddr).map_err(|e| e.os("connect"))
	}

	/// Sends `buf`, returning the number of bytes sent.
	pub fn send(&self, buf: &[u8], flags: i32) -> Result<usize> {
		let fd = self.live_fd("send")?;
		let n = self.stack.native().send(fd, buf, flags).map_err(|e| e.os("send"))?;
		trace!(fd, len = buf.len(), sent = n, "send");
		Ok(n)
	}

	/// Receives up to `max_len` bytes.
	///
	/// A zero-length read is `Error::ConnectionClosed`, so an orderly
	/// shutdown by the peer is told apart from a failed read
	/// (`Error::Os`).
	pub fn recv(&self, max_len: usize, flags: i32) -> Result<Vec<u8>> {
		let fd = self.live_fd("recv")?;
		let mut buf = vec![0u8; max_len];
		let n = self.stack.native().recv(fd, &mut buf, flags).map_err(|e| e.os("recv"))?;
		trace!(fd, max_len, received = n, "recv");
		if n == 0 {
			return Err(Error::ConnectionClosed);
		}
		buf.truncate(n);
		Ok(buf)
	}
}
