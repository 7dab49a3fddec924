use crate::http;
use crate::http::parse::{self, ParseError};
use crate::http::request::{Request, RequestLine};
use crate::http::response::Response;
use crate::http::router::Router;
use anyhow::Context;
use std::io::{self, BufReader, Read, Write};
use std::sync::Arc;
use tracing::{debug, warn};

/// One accepted stream, serving requests strictly one after another until
/// the peer leaves, asks to close, or breaks framing.
pub struct Connection<S: Read + Write> {
    reader: BufReader<S>,
    router: Arc<Router>,
}

enum State {
    AwaitingRequest,
    ParsingHeaders(RequestLine),
    Dispatching(Request),
    Responding(Response, Persistence),
    Closing,
}

/// What happens to the stream once the response is out.
enum Persistence {
    Close,
    /// Read another request after discarding `unread_body` bytes the
    /// handler left behind.
    KeepAlive { unread_body: u64 },
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S, router: Arc<Router>) -> Connection<S> {
        Connection {
            reader: BufReader::new(stream),
            router,
        }
    }

    /// Serves requests until the connection closes. An error means the
    /// transport failed; orderly closes and malformed requests return `Ok`.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut state = State::AwaitingRequest;

        loop {
            state = match state {
                State::AwaitingRequest => self.await_request()?,
                State::ParsingHeaders(line) => self.parse_headers(line)?,
                State::Dispatching(req) => self.dispatch(req),
                State::Responding(resp, persistence) => {
                    let keep_alive = matches!(persistence, Persistence::KeepAlive { .. });
                    self.write_response(resp, keep_alive)?;
                    match persistence {
                        Persistence::KeepAlive { unread_body } if self.skip_body(unread_body) => {
                            State::AwaitingRequest
                        }
                        _ => State::Closing,
                    }
                }
                State::Closing => return Ok(()),
            };
        }
    }

    fn await_request(&mut self) -> anyhow::Result<State> {
        match parse::read_line(&mut self.reader) {
            Ok(Some(line)) => match RequestLine::parse(&line) {
                Ok(line) => Ok(State::ParsingHeaders(line)),
                Err(e) => Ok(self.reject(e)),
            },
            Ok(None) => {
                debug!("no further request, closing");
                Ok(State::Closing)
            }
            Err(ParseError::Io(e)) => Err(e).context("Can't read request line"),
            Err(e) => Ok(self.reject(e)),
        }
    }

    fn parse_headers(&mut self, line: RequestLine) -> anyhow::Result<State> {
        match parse::read_headers(&mut self.reader) {
            Ok(headers) => Ok(State::Dispatching(Request::new(line, headers))),
            Err(ParseError::Io(e)) => Err(e).context("Can't read headers"),
            Err(e) => Ok(self.reject(e)),
        }
    }

    fn dispatch(&mut self, mut req: Request) -> State {
        debug!(method = %req.method(), path = req.target(), "dispatching");

        let resp = self.router.dispatch(&mut req, &mut self.reader);
        let persistence = if req.wants_close() {
            Persistence::Close
        } else {
            match unread_body_len(&req) {
                Some(unread_body) => Persistence::KeepAlive { unread_body },
                None => Persistence::Close,
            }
        };

        State::Responding(resp, persistence)
    }

    /// Framing error: answer 400 if the stream can still carry it, then close.
    fn reject(&mut self, err: ParseError) -> State {
        warn!(error = %err, "malformed request");

        if err.is_respondable() {
            if let Err(e) = self.write_response(http::bad_request(), false) {
                debug!("could not deliver 400: {:#}", e);
            }
        }
        State::Closing
    }

    /// Drops a body the handler never read so the next request starts at
    /// the right byte. Returns false when that is not possible.
    fn skip_body(&mut self, len: u64) -> bool {
        if len == 0 {
            return true;
        }

        match io::copy(&mut Read::take(&mut self.reader, len), &mut io::sink()) {
            Ok(skipped) if skipped == len => true,
            Ok(skipped) => {
                debug!(skipped, expected = len, "stream ended inside unread body");
                false
            }
            Err(e) => {
                debug!(error = %e, "failed to skip unread body");
                false
            }
        }
    }

    fn write_response(&mut self, mut resp: Response, keep_alive: bool) -> anyhow::Result<()> {
        if !keep_alive {
            resp.headers.insert("Connection", "close");
        }

        let stream = self.reader.get_mut();
        stream
            .write_all(&resp.serialize())
            .context("Can't write response")?;
        stream.flush().context("Can't flush response")?;

        debug!(status = resp.status.code_num, bytes = resp.content_len(), "responded");
        Ok(())
    }
}

/// Bytes of declared body still on the stream, or `None` when the next
/// request's start can't be located.
fn unread_body_len(req: &Request) -> Option<u64> {
    if req.body.is_some() {
        return Some(0);
    }
    if req.body_read_failed() {
        return None;
    }

    match parse::content_length(&req.headers) {
        Ok(len) => Some(len.unwrap_or(0) as u64),
        Err(e) => {
            warn!(error = %e, "can't skip request body");
            None
        }
    }
}
