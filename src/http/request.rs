use crate::http::headers::Headers;
use crate::http::method::Method;
use crate::http::parse::{self, BodyError, ParseError};
use bytes::Bytes;
use std::collections::HashMap;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    /// Splits on single spaces and requires exactly three tokens. Method,
    /// target and version are not validated any further.
    pub fn parse(line: &str) -> Result<RequestLine, ParseError> {
        let parts: Vec<&str> = line.split(' ').collect();

        match parts[..] {
            [method, target, version] => Ok(RequestLine {
                method: Method::parse(method),
                target: target.to_string(),
                version: version.to_string(),
            }),
            _ => Err(ParseError::BadRequestLine(line.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct Request {
    pub line: RequestLine,
    pub headers: Headers,
    /// Filled only once a handler asks for it.
    pub body: Option<Bytes>,
    body_read_failed: bool,
}

impl Request {
    pub fn new(line: RequestLine, headers: Headers) -> Request {
        Request {
            line,
            headers,
            body: None,
            body_read_failed: false,
        }
    }

    pub fn method(&self) -> &Method {
        &self.line.method
    }

    pub fn target(&self) -> &str {
        &self.line.target
    }

    pub fn get_header(&self, k: &str) -> Option<&str> {
        self.headers.get(k)
    }

    /// True once a body read stopped part way, leaving the stream at an
    /// unknown position.
    pub fn body_read_failed(&self) -> bool {
        self.body_read_failed
    }

    /// True when the client asked for the connection to be closed after
    /// this exchange.
    pub fn wants_close(&self) -> bool {
        self.get_header("Connection")
            .is_some_and(|v| v.eq_ignore_ascii_case("close"))
    }
}

/// What a handler sees: the request, the values captured from its route
/// pattern, and the stream positioned at the start of the body.
pub struct RequestContext<'a> {
    request: &'a mut Request,
    body_source: &'a mut dyn BufRead,
    url_vars: HashMap<String, String>,
}

impl<'a> RequestContext<'a> {
    pub fn new(
        request: &'a mut Request,
        body_source: &'a mut dyn BufRead,
        url_vars: HashMap<String, String>,
    ) -> RequestContext<'a> {
        RequestContext {
            request,
            body_source,
            url_vars,
        }
    }

    pub fn get_var(&self, k: &str) -> Option<&str> {
        self.url_vars.get(k).map(|v| v.as_str())
    }

    pub fn get_header(&self, k: &str) -> Option<&str> {
        self.request.get_header(k)
    }

    pub fn request(&self) -> &Request {
        &*self.request
    }

    /// Reads the body on first use; later calls return the same bytes.
    pub fn read_body(&mut self) -> Result<Bytes, BodyError> {
        if let Some(body) = &self.request.body {
            return Ok(body.clone());
        }

        match parse::read_body(&mut *self.body_source, &self.request.headers) {
            Ok(body) => {
                self.request.body = Some(body.clone());
                Ok(body)
            }
            Err(e) => {
                if matches!(e, BodyError::Io(_)) {
                    self.request.body_read_failed = true;
                }
                Err(e)
            }
        }
    }
}
