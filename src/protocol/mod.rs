//! Protocol Module
//!
//! The message contract between a client stub and the engine. It does not
//! care how messages travel: an in-process call, a channel, or a socket all
//! carry the same structures.
//!
//! ## Requests
//! - `WRITE`:     documents to upsert (optimistically locked)
//! - `GET`:       keys to look up
//! - `GET_RANGE`: `[start_key, end_key)` in key order
//! - `DELETE`:    keys to remove
//!
//! ## Replies
//! - `WriteReply` for writes and deletes
//! - `GetReply` with wire-encoded documents for gets and range gets
//!
//! Both carry exactly one [`ErrorCondition`].

mod codec;
mod reply;
mod request;

pub use codec::{
    decode_reply, decode_request, encode_reply, encode_request, read_reply, read_request,
    write_reply, write_request, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use reply::{ErrorCondition, ErrorType, GetReply, Reply, WriteReply};
pub use request::{
    DeleteRequestBody, GetRangeRequestBody, GetRequestBody, Header, Request, RequestBody,
    RequestType, WriteRequestBody,
};
