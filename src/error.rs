use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
	/// A `valuechanging` listener prevented the change.
	/// Nothing was mutated and no `valuechanged` event was sent.
	#[error("change was vetoed by a `valuechanging` listener")]
	Uncommitted,

	/// Mapped projections follow their source and cannot be mutated directly.
	#[error("cannot mutate a read-only projection")]
	ReadOnly,

	#[error("index {index} is out of bounds for an array of length {len}")]
	OutOfBounds { index: usize, len: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
