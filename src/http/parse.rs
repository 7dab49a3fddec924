use crate::http::BUFFER_SIZE;
use crate::http::headers::Headers;
use bytes::{Bytes, BytesMut};
use std::cmp::min;
use std::io::{self, BufRead, ErrorKind, Read};
use thiserror::Error;
use tracing::{debug, trace};

pub const CRLF: &[u8] = b"\r\n";

/// Longest request or header line accepted, CRLF included.
pub const MAX_LINE_LEN: usize = 8 * 1024;

/// Upper bound on the up-front allocation for a body; larger bodies grow as
/// they arrive instead of trusting the declared length.
const MAX_BODY_PREALLOC: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed request line: {0:?}")]
    BadRequestLine(String),
    #[error("malformed header line: {0:?}")]
    BadHeader(String),
    #[error("stream ended in the middle of a request")]
    Truncated,
    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),
    #[error("line is not valid UTF-8")]
    NotUtf8,
    #[error("transport error")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// Whether a 400 can still be written back. Truncated input means the
    /// peer is gone and transport errors mean the stream is unusable.
    pub fn is_respondable(&self) -> bool {
        !matches!(self, ParseError::Truncated | ParseError::Io(_))
    }
}

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("header 'Content-Length' is missing")]
    MissingLength,
    #[error("invalid 'Content-Length' value: {0:?}")]
    InvalidLength(String),
    #[error("transport error while reading body")]
    Io(#[from] io::Error),
}

pub(crate) fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Reads the next CRLF-terminated line with the CRLF stripped.
///
/// `Ok(None)` means no further line is available: either the peer closed the
/// stream cleanly before sending anything, or the read timed out. A stream
/// that ends part way through a line is `ParseError::Truncated`.
pub fn read_line<R: BufRead + ?Sized>(rdr: &mut R) -> Result<Option<String>, ParseError> {
    let mut buf = Vec::new();

    loop {
        if buf.len() >= MAX_LINE_LEN {
            return Err(ParseError::LineTooLong(MAX_LINE_LEN));
        }
        let limit = (MAX_LINE_LEN - buf.len()) as u64;

        match Read::take(&mut *rdr, limit).read_until(b'\n', &mut buf) {
            Ok(0) if buf.is_empty() => return Ok(None),
            Ok(0) => return Err(ParseError::Truncated),
            Ok(_) => {
                // A bare LF does not end the line; keep accumulating.
                if buf.ends_with(CRLF) {
                    buf.truncate(buf.len() - CRLF.len());
                    return String::from_utf8(buf)
                        .map(Some)
                        .map_err(|_| ParseError::NotUtf8);
                }
            }
            Err(e) if is_timeout(&e) => {
                trace!(pending = buf.len(), "read timed out waiting for a line");
                return Ok(None);
            }
            Err(e) => return Err(ParseError::Io(e)),
        }
    }
}

/// Reads header lines up to and including the empty terminator line.
pub fn read_headers<R: BufRead + ?Sized>(rdr: &mut R) -> Result<Headers, ParseError> {
    let mut headers = Headers::new();

    loop {
        let line = read_line(rdr)?.ok_or(ParseError::Truncated)?;
        if line.is_empty() {
            return Ok(headers);
        }

        let (k, v) = parse_header_line(&line)?;
        headers.insert(k, v);
    }
}

/// Splits `name: value` at the first colon and trims both sides. Any later
/// colons belong to the value.
pub fn parse_header_line(line: &str) -> Result<(&str, &str), ParseError> {
    let (k, v) = line
        .split_once(':')
        .ok_or_else(|| ParseError::BadHeader(line.to_string()))?;
    Ok((k.trim(), v.trim()))
}

/// Declared body length, if any.
pub fn content_length(headers: &Headers) -> Result<Option<usize>, BodyError> {
    headers
        .get("Content-Length")
        .map(|raw| {
            raw.parse::<usize>()
                .map_err(|_| BodyError::InvalidLength(raw.to_string()))
        })
        .transpose()
}

/// Reads exactly `Content-Length` bytes. A clean end of stream part way
/// through yields whatever arrived.
pub fn read_body<R: BufRead + ?Sized>(rdr: &mut R, headers: &Headers) -> Result<Bytes, BodyError> {
    let mut remaining = content_length(headers)?.ok_or(BodyError::MissingLength)?;

    let mut content = BytesMut::with_capacity(min(remaining, MAX_BODY_PREALLOC));
    let mut buf = [0u8; BUFFER_SIZE];

    while remaining > 0 {
        let chunk = &mut buf[..min(BUFFER_SIZE, remaining)];

        let bytes_read = match rdr.read(chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(BodyError::Io(e)),
        };
        if bytes_read == 0 {
            debug!(missing = remaining, "stream ended before the declared body length");
            break;
        }

        content.extend_from_slice(&chunk[..bytes_read]);
        remaining -= bytes_read;
    }

    Ok(content.freeze())
}
