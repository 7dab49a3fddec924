//! HTTP/1.1 over raw byte streams.
//!
//! Requests are framed by hand from CRLF-terminated lines (`parse`), routed
//! through a fixed table (`router`) and answered on the same stream, which
//! stays open for further requests until the peer closes it or asks for
//! `Connection: close` (`connection`).

pub mod connection;
pub mod encoding;
pub mod handler;
pub mod headers;
pub mod method;
pub mod middleware;
pub mod parse;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod status;

pub use headers::Headers;
pub use request::{Request, RequestContext, RequestLine};
pub use response::Response;
pub use status::Status;

pub(crate) const BUFFER_SIZE: usize = 1024;

pub fn ok() -> Response {
    Response::new(Status::OK)
}

pub fn created() -> Response {
    Response::new(Status::CREATED)
}

pub fn bad_request() -> Response {
    Response::new(Status::BAD_REQUEST)
}

pub fn not_found() -> Response {
    Response::new(Status::NOT_FOUND)
}

pub fn internal_error() -> Response {
    Response::new(Status::INTERNAL_SERVER_ERROR)
}
