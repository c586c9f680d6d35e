//! Internal compiler errors raised while emitting.

use thiserror::Error;

/// The IR handed to the emitter broke an invariant the builder guarantees.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Ice {
    #[error("`{key}` cannot be lowered as a dictionary key")]
    InvalidDictionaryKey { key: String },

    #[error("`yield` in `{function}`, which is not a generator")]
    YieldOutsideGenerator { function: String },
}
