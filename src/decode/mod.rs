//! Record decoder module
//!
//! Supports: JSON, JSONL
//!
//! Decoders turn a response or file body into a list of records, optionally
//! extracting them from a nested path first.

mod decoders;
mod types;

pub use decoders::{decoder_for, value_at, JsonDecoder, JsonlDecoder};
pub use types::{DecoderFormat, RecordDecoder};
