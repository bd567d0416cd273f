//! Foundation layer: envelopes, payloads and error types.

pub mod envelope;
pub mod error;
pub mod response;
