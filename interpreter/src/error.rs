use alloc::borrow::Cow;

use crate::opcode::Opcode;

/// Exit reason.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitReason {
	/// Machine has succeeded.
	Succeed(ExitSucceed),
	/// Machine returns a normal EVM error.
	Error(ExitError),
	/// Machine encountered an explicit revert.
	Revert(ExitRevert),
	/// Machine encountered an error that is not supposed to be a normal
	/// EVM error, such as requiring too much memory to execute.
	Fatal(ExitFatal),
}

impl ExitReason {
	/// Whether the exit is succeeded.
	#[must_use]
	pub const fn is_succeed(&self) -> bool {
		matches!(self, Self::Succeed(_))
	}

	/// Whether the exit is a revert.
	#[must_use]
	pub const fn is_revert(&self) -> bool {
		matches!(self, Self::Revert(_))
	}

	/// Whether the exit is an error.
	#[must_use]
	pub const fn is_error(&self) -> bool {
		matches!(self, Self::Error(_))
	}

	/// Whether the exit is fatal.
	#[must_use]
	pub const fn is_fatal(&self) -> bool {
		matches!(self, Self::Fatal(_))
	}
}

/// Exit succeed reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitSucceed {
	/// Machine encountered an explicit stop.
	Stopped,
	/// Machine encountered an explicit return.
	Returned,
	/// Machine encountered an explicit suicide.
	Suicided,
}

impl From<ExitSucceed> for ExitReason {
	fn from(s: ExitSucceed) -> Self {
		Self::Succeed(s)
	}
}

/// Exit revert reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitRevert {
	/// Machine encountered an explicit revert.
	Reverted,
}

impl From<ExitRevert> for ExitReason {
	fn from(s: ExitRevert) -> Self {
		Self::Revert(s)
	}
}

/// Exit error reason.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitError {
	/// Trying to pop from an empty stack.
	StackUnderflow,
	/// Trying to push into a stack over stack limit.
	StackOverflow,
	/// Jump destination is invalid.
	InvalidJump,
	/// An opcode accesses memory region, but the region is invalid.
	InvalidRange,
	/// Encountered the designated invalid opcode.
	DesignatedInvalid,
	/// Call stack is too deep (runtime).
	CallTooDeep,
	/// Create opcode encountered collision (runtime).
	CreateCollision,
	/// Create init code exceeds limit (runtime).
	CreateContractLimit,
	/// Invalid opcode during execution, or the opcode is not available
	/// under the active chain rules.
	InvalidCode(Opcode),
	/// An opcode accesses external information, but the request is off
	/// offset limit (runtime).
	OutOfOffset,
	/// Execution runs out of gas (runtime).
	OutOfGas,
	/// Not enough fund to start the execution (runtime).
	OutOfFund,
	/// A write was attempted in a read-only frame.
	WriteProtection,
	/// Gas ran out while depositing created contract code.
	CodeStoreOutOfGas,
	/// Nonce reached maximum value of 2^64-1.
	/// <https://eips.ethereum.org/EIPS/eip-2681>
	MaxNonce,
	/// A journal opcode failed and the configuration treats tracer
	/// failures as frame-fatal.
	Tracer(TracerError),
	/// Other normal errors.
	Other(Cow<'static, str>),
}

impl From<ExitError> for ExitReason {
	fn from(s: ExitError) -> Self {
		Self::Error(s)
	}
}

/// Tracer error reason.
///
/// Kept distinct from [ExitError] so a release configuration can downgrade
/// journal failures to a counter instead of failing the frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TracerError {
	/// A packed-value offset was larger than 31.
	InvalidOffset,
	/// A change was journaled against an account with no storage key root.
	UnknownAccount,
	/// A change was journaled against an unregistered storage key.
	UnknownNode,
	/// A nested key referenced a parent that was never registered.
	UnknownParent,
	/// A string/bytes storage header did not decode consistently.
	StorageEncoding,
	/// A length-prefixed memory operand was out of the addressable range.
	MemOutOfRange,
}

impl From<TracerError> for ExitError {
	fn from(s: TracerError) -> Self {
		Self::Tracer(s)
	}
}

impl From<TracerError> for ExitReason {
	fn from(s: TracerError) -> Self {
		Self::Error(ExitError::Tracer(s))
	}
}

/// Exit fatal reason.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitFatal {
	/// The operation is not supported.
	NotSupported,
	/// The environment explicitly set call errors as fatal error.
	CallErrorAsFatal(ExitError),
	/// Other fatal errors.
	Other(Cow<'static, str>),
}

impl From<ExitFatal> for ExitReason {
	fn from(s: ExitFatal) -> Self {
		Self::Fatal(s)
	}
}

#[cfg(feature = "std")]
impl std::fmt::Display for ExitReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}", self)
	}
}

#[cfg(feature = "std")]
impl std::error::Error for ExitReason {}
