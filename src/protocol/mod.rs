//! Wire protocol for wicket.
//!
//! Clients and server exchange newline-delimited JSON over a plain TCP
//! stream: each request line carries a `kind` tag plus its payload fields,
//! and each handled request is answered with a single reply line carrying a
//! status from the stable vocabulary.

mod codec;
mod reply;
mod request;

pub use codec::{
    decode_reply, decode_request, encode_reply, encode_request, MAX_LINE_BYTES,
};
pub use reply::{Reply, Status};
pub use request::Request;
