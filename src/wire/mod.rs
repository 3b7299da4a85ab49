//! The wire codec: request serialization, status-line/header parsing,
//! body-framing selection, chunked decode, and content-coding decode.

pub mod chunked;
pub mod encoding;
pub mod request;
pub mod response;

pub use encoding::ContentCoding;
pub use response::BodyFraming;
