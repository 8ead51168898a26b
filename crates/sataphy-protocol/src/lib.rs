#![warn(missing_docs)]

//! sataphy-protocol: primitive codec and word packing for the character stream.

/// Primitive classification/encoding and word packing.
pub mod codec;

pub use codec::{classify, encode, CharClass, Primitive, PrimitiveDecoder, PrimitiveEncoder};
