use crate::http::parse::BodyError;
use crate::http::request::RequestContext;
use crate::http::{self, Response};
use thiserror::Error;
use tracing::{debug, error};

pub type HandlerResult = Result<Response, HandlerError>;

pub type HandlerFunc = Box<dyn Fn(&mut RequestContext<'_>) -> HandlerResult + Sync + Send>;

/// Per-request failures. Each maps to a response; none closes the
/// connection by itself.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn bad_request(reason: impl Into<String>) -> HandlerError {
        HandlerError::BadRequest(reason.into())
    }

    pub fn into_response(self) -> Response {
        match self {
            HandlerError::BadRequest(reason) => {
                debug!(%reason, "rejecting request");
                http::bad_request()
            }
            HandlerError::NotFound => http::not_found(),
            HandlerError::Internal(e) => {
                error!("internal error: {:#}", e);
                http::internal_error()
            }
        }
    }
}

impl From<BodyError> for HandlerError {
    fn from(e: BodyError) -> HandlerError {
        match e {
            BodyError::MissingLength | BodyError::InvalidLength(_) => {
                HandlerError::BadRequest(e.to_string())
            }
            BodyError::Io(_) => HandlerError::Internal(e.into()),
        }
    }
}
