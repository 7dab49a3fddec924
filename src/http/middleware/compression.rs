use crate::http::encoding::{self, Encoding};
use crate::http::handler::HandlerResult;
use crate::http::middleware::{Middleware, Next};
use crate::http::request::RequestContext;
use anyhow::Context;
use bytes::Bytes;
use tracing::trace;

/// Gzips the handler's body when the request advertises `gzip`.
pub struct CompressionMw;

impl Middleware for CompressionMw {
    fn handle(&self, ctx: &mut RequestContext, next: Next) -> HandlerResult {
        let wants_gzip = encoding::should_compress(&ctx.request().headers);

        let mut resp = next.run(ctx)?;
        if !wants_gzip {
            return Ok(resp);
        }

        if let Some(content) = resp.content.take() {
            let packed = encoding::compress(&content).context("Failed to compress response body")?;
            trace!(from = content.len(), to = packed.len(), "compressed body");
            resp.content = Some(Bytes::from(packed));
            resp.headers.insert("Content-Encoding", Encoding::Gzip.to_string());
        }

        Ok(resp)
    }
}
