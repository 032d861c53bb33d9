//! Data model of the stream transform.
//!
//! - `envelope` - the request/response record lists exchanged with the delivery stream.
pub mod envelope;
