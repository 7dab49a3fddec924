use crate::http::headers::Headers;
use crate::http::parse::CRLF;
use crate::http::status::Status;
use bytes::{BufMut, Bytes, BytesMut};

pub const HTTP_VERSION: &str = "HTTP/1.1";

#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub headers: Headers,
    pub content: Option<Bytes>,
}

impl Response {
    pub fn new(status: Status) -> Response {
        Response {
            status,
            headers: Headers::new(),
            content: None,
        }
    }

    pub fn with_header(mut self, k: impl Into<String>, v: impl Into<String>) -> Response {
        self.headers.insert(k, v);
        self
    }

    pub fn with_content(mut self, content: impl Into<Bytes>) -> Response {
        self.content = Some(content.into());
        self
    }

    pub fn content_len(&self) -> usize {
        self.content.as_ref().map(|c| c.len()).unwrap_or(0)
    }

    /// Wire form: status line, headers, `Content-Length` taken from the
    /// body as it is now, blank line, body.
    pub fn serialize(&self) -> Bytes {
        let content_len = self.content_len();
        let mut resp_bytes = BytesMut::with_capacity(content_len + (self.headers.len() + 2) * 32);

        resp_bytes.put_slice(
            format!(
                "{} {} {}\r\n",
                HTTP_VERSION, self.status.code_num, self.status.message
            )
            .as_bytes(),
        );

        for (key, value) in self.headers.iter().filter(|(k, _)| *k != "Content-Length") {
            resp_bytes.put_slice(format!("{}: {}\r\n", key, value).as_bytes());
        }
        resp_bytes.put_slice(format!("Content-Length: {}\r\n", content_len).as_bytes());
        resp_bytes.put_slice(CRLF);

        if let Some(c) = &self.content {
            resp_bytes.put_slice(c);
        }

        resp_bytes.freeze()
    }
}
