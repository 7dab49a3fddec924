#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io::{self, BufRead, Cursor, ErrorKind, Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory duplex stream: reads come from a fixed script, writes are
/// collected. Once the script runs out it reports either a clean end of
/// stream or, with `idle_at_end`, a read timeout.
pub struct MockStream {
    input: Cursor<Vec<u8>>,
    pub output: Vec<u8>,
    pub idle_at_end: bool,
    pub fail_writes: bool,
    /// Bytes written before the first read past the end of the script.
    pub output_at_first_stall: Option<usize>,
}

impl MockStream {
    pub fn new(input: impl Into<Vec<u8>>) -> MockStream {
        MockStream {
            input: Cursor::new(input.into()),
            output: Vec::new(),
            idle_at_end: false,
            fail_writes: false,
            output_at_first_stall: None,
        }
    }

    pub fn idle(input: impl Into<Vec<u8>>) -> MockStream {
        MockStream {
            idle_at_end: true,
            ..MockStream::new(input)
        }
    }

    pub fn responses(&self) -> Vec<ParsedResponse> {
        parse_all(&self.output)
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.input.read(buf)? {
            0 if !buf.is_empty() => {
                self.output_at_first_stall.get_or_insert(self.output.len());
                if self.idle_at_end {
                    Err(io::Error::new(ErrorKind::WouldBlock, "idle"))
                } else {
                    Ok(0)
                }
            }
            n => Ok(n),
        }
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(ErrorKind::BrokenPipe, "peer went away"));
        }
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct ParsedResponse {
    pub code: u16,
    pub reason: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl ParsedResponse {
    pub fn header(&self, k: &str) -> Option<&str> {
        self.headers.get(k).map(|v| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Reads one response framed by `Content-Length`. `None` at end of stream.
pub fn read_response<R: BufRead>(rdr: &mut R) -> Option<ParsedResponse> {
    let mut line = String::new();
    if rdr.read_line(&mut line).ok()? == 0 {
        return None;
    }

    let mut parts = line.trim_end().splitn(3, ' ');
    assert_eq!(parts.next(), Some("HTTP/1.1"), "bad status line {line:?}");
    let code = parts.next()?.parse().ok()?;
    let reason = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    loop {
        line.clear();
        rdr.read_line(&mut line).ok()?;
        let trimmed = line.trim_end_matches("\r\n");
        if trimmed.is_empty() {
            break;
        }
        let (k, v) = trimmed.split_once(": ")?;
        headers.insert(k.to_string(), v.to_string());
    }

    let len: usize = headers.get("Content-Length")?.parse().ok()?;
    let mut body = vec![0u8; len];
    rdr.read_exact(&mut body).ok()?;

    Some(ParsedResponse {
        code,
        reason,
        headers,
        body,
    })
}

pub fn parse_all(bytes: &[u8]) -> Vec<ParsedResponse> {
    let mut rdr = Cursor::new(bytes);
    std::iter::from_fn(|| read_response(&mut rdr)).collect()
}

pub fn scratch_dir(tag: &str) -> PathBuf {
    static SEQ: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "raw-http-{}-{}-{}",
        tag,
        std::process::id(),
        SEQ.fetch_add(1, Ordering::SeqCst)
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}
