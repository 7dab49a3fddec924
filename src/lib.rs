//! A small HTTP/1.1 server written directly against byte streams: line
//! framing, persistent connections, gzip negotiation and a handful of
//! endpoints, some backed by a serving directory.

pub mod concurrency;
pub mod config;
pub mod endpoints;
pub mod files;
pub mod http;
