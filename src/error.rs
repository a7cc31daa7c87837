/// Errors reported by stacks, sockets and resolvers.
///
/// Argument problems (`InvalidArgument`, `Range`) are always detected before
/// any native call is made. Native failures carry the errno the native layer
/// reported, untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid argument: {reason}")]
	InvalidArgument { reason: String },

	#[error("{op}(): port must be 0-65535")]
	Range { op: &'static str },

	#[error("{op}() failed: {}", errno_to_str(*.errno))]
	Os { op: &'static str, errno: i32 },

	#[error("resolver configuration failed: {}", errno_to_str(*.errno))]
	Config { errno: i32 },

	#[error("unable to create network stack of kind {kind:?}")]
	StackCreation { kind: String },

	#[error("not found: {what}")]
	NotFound { what: String },

	#[error("{op}() is not supported by this stack")]
	NotSupported { op: &'static str },

	#[error("{op}() failed: {}", errno_to_str(*.errno))]
	OperationFailed { op: &'static str, errno: i32 },

	#[error("connection closed by peer")]
	ConnectionClosed,
}

impl Error {
	pub(crate) fn invalid<S: Into<String>>(reason: S) -> Self {
		Error::InvalidArgument { reason: reason.into() }
	}

	/// Returns the native error code carried by this error, if any.
	pub fn errno(&self) -> Option<i32> {
		match self {
			Error::Os { errno, .. }
			| Error::Config { errno }
			| Error::OperationFailed { errno, .. } => Some(*errno),
			_ => None,
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;

/// A native error code as reported by the stack or resolver library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Errno(pub i32);

impl Errno {
	/// Captures the calling thread's current errno.
	pub fn last() -> Self {
		Errno(errno())
	}

	pub(crate) fn os(self, op: &'static str) -> Error {
		Error::Os { op, errno: self.0 }
	}

	pub(crate) fn failed(self, op: &'static str) -> Error {
		Error::OperationFailed { op, errno: self.0 }
	}
}

/// Returns current errno value.
#[inline]
pub fn errno() -> i32 {
	unsafe { *libc::__errno_location() }
}

/// Resets errno, so a later read only sees what the next call sets.
#[cfg(feature = "ioth")]
#[inline]
pub(crate) fn clear_errno() {
	unsafe { *libc::__errno_location() = 0 }
}

/// Converts errno to human-readable string.
fn errno_to_str(errno: i32) -> String {
	match errno {
		libc::EACCES => "permission denied".into(),
		libc::EADDRINUSE => "address already in use".into(),
		libc::EADDRNOTAVAIL => "address not available".into(),
		libc::EAFNOSUPPORT => "address family not supported".into(),
		libc::EAGAIN => "resource temporarily unavailable".into(),
		libc::EBADF => "bad file descriptor".into(),
		libc::ECONNREFUSED => "connection refused".into(),
		libc::ECONNRESET => "connection reset by peer".into(),
		libc::EINPROGRESS => "operation in progress".into(),
		libc::EINTR => "interrupted by signal".into(),
		libc::EINVAL => "invalid argument".into(),
		libc::EMFILE => "too many open files".into(),
		libc::ENETUNREACH => "network unreachable".into(),
		libc::ENOBUFS => "no buffer space available".into(),
		libc::ENODEV => "no such device".into(),
		libc::ENOENT => "no such file or directory".into(),
		libc::ENOTCONN => "not connected".into(),
		libc::EPIPE => "broken pipe".into(),
		libc::ETIMEDOUT => "connection timed out".into(),
		_ => format!("errno {}", errno),
	}
}

/// Maps errno to std::io::ErrorKind.
fn errno_to_kind(errno: i32) -> std::io::ErrorKind {
	match errno {
		libc::EACCES | libc::EPERM => std::io::ErrorKind::PermissionDenied,
		libc::EADDRINUSE => std::io::ErrorKind::AddrInUse,
		libc::EADDRNOTAVAIL => std::io::ErrorKind::AddrNotAvailable,
		libc::EAGAIN => std::io::ErrorKind::WouldBlock,
		libc::ECONNREFUSED => std::io::ErrorKind::ConnectionRefused,
		libc::ECONNRESET => std::io::ErrorKind::ConnectionReset,
		libc::EINTR => std::io::ErrorKind::Interrupted,
		libc::EINVAL => std::io::ErrorKind::InvalidInput,
		libc::ENOENT => std::io::ErrorKind::NotFound,
		libc::ENOTCONN => std::io::ErrorKind::NotConnected,
		libc::EPIPE => std::io::ErrorKind::BrokenPipe,
		libc::ETIMEDOUT => std::io::ErrorKind::TimedOut,
		_ => std::io::ErrorKind::Other,
	}
}

impl From<Error> for std::io::Error {
	fn from(err: Error) -> Self {
		let kind = match &err {
			Error::InvalidArgument { .. } | Error::Range { .. } => std::io::ErrorKind::InvalidInput,
			Error::NotFound { .. } => std::io::ErrorKind::NotFound,
			Error::NotSupported { .. } => std::io::ErrorKind::Unsupported,
			Error::ConnectionClosed => std::io::ErrorKind::UnexpectedEof,
			Error::StackCreation { .. } => std::io::ErrorKind::Other,
			Error::Os { errno, .. }
			| Error::Config { errno }
			| Error::OperationFailed { errno, .. } => errno_to_kind(*errno),
		};
		std::io::Error::new(kind, err)
	}
}
