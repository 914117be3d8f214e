//! Protocol module containing message types, the envelope codec, and the
//! request builder.

pub mod codec;
pub mod messages;
pub mod request;

pub use codec::{decode_envelope, decode_server_message, encode_envelope, ProtocolError};
pub use messages::*;
pub use request::{build_request, encode_request, RecordRequest};
