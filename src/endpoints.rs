use crate::files::FileStore;
use crate::http::handler::{HandlerError, HandlerResult};
use crate::http::method::Method;
use crate::http::middleware::compression::CompressionMw;
use crate::http::request::RequestContext;
use crate::http::router::{MethodFilter, Router};
use crate::http::{self, Response, Status};
use anyhow::anyhow;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// The server's route table. `store` is `None` when no serving directory
/// was configured, in which case `/files/*` answers 500.
pub fn routes(store: Option<Arc<dyn FileStore>>) -> anyhow::Result<Router> {
    let mut router = Router::new();

    router.add_handler(MethodFilter::Any, "/", Box::new(index))?;
    router.add_handler(MethodFilter::Any, "/user-agent", Box::new(user_agent))?;
    router
        .add_handler(MethodFilter::Any, "/echo/<s>", Box::new(echo))?
        .with_middleware(Box::new(CompressionMw));

    let store_clone = store.clone();
    router.add_handler(
        MethodFilter::Only(Method::GET),
        "/files/<file>",
        Box::new(move |r: &mut RequestContext<'_>| get_file(r, store_clone.as_deref())),
    )?;
    router.add_handler(
        MethodFilter::Any,
        "/files/<file>",
        Box::new(move |r: &mut RequestContext<'_>| save_file(r, store.as_deref())),
    )?;

    Ok(router)
}

fn text(content: &str) -> Response {
    Response::new(Status::OK)
        .with_header("Content-Type", "text/plain")
        .with_content(Bytes::copy_from_slice(content.as_bytes()))
}

fn index(_r: &mut RequestContext) -> HandlerResult {
    Ok(http::ok())
}

fn echo(r: &mut RequestContext) -> HandlerResult {
    Ok(text(r.get_var("s").unwrap_or_default()))
}

fn user_agent(r: &mut RequestContext) -> HandlerResult {
    let agent = r
        .get_header("User-Agent")
        .ok_or_else(|| HandlerError::bad_request("no 'User-Agent' header present"))?;
    Ok(text(agent))
}

/// Store and file name for a `/files/<file>` request. The directory is
/// checked before the name: a server without one cannot serve any file.
fn file_target<'s, 'r>(
    r: &'r RequestContext,
    store: Option<&'s dyn FileStore>,
) -> Result<(&'s dyn FileStore, &'r str), HandlerError> {
    let store = store.ok_or_else(|| anyhow!("no serving directory configured"))?;
    store.check()?;

    let file_name = r.get_var("file").unwrap_or_default();
    if file_name.is_empty() {
        return Err(HandlerError::bad_request("no file name provided"));
    }
    Ok((store, file_name))
}

fn get_file(r: &mut RequestContext, store: Option<&dyn FileStore>) -> HandlerResult {
    let (store, file_name) = file_target(r, store)?;
    let content = store.read(file_name)?;

    Ok(Response::new(Status::OK)
        .with_header("Content-Type", "application/octet-stream")
        .with_content(content))
}

fn save_file(r: &mut RequestContext, store: Option<&dyn FileStore>) -> HandlerResult {
    let (store, file_name) = file_target(r, store)?;
    let file_name = file_name.to_string();

    let content = r.read_body()?;
    store.write(&file_name, &content)?;
    debug!(file = %file_name, bytes = content.len(), "stored file");

    Ok(http::created())
}
