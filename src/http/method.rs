use std::fmt;
use std::str::FromStr;
use strum::EnumString;

/// Request method. Anything not listed is kept verbatim in `Other`, so
/// parsing never rejects a method; routes decide what they accept.
#[derive(EnumString, Debug, Clone, PartialEq, Eq)]
pub enum Method {
    #[strum(serialize = "GET")]
    GET,
    #[strum(serialize = "POST")]
    POST,
    #[strum(serialize = "PUT")]
    PUT,
    #[strum(serialize = "DELETE")]
    DELETE,
    #[strum(serialize = "HEAD")]
    HEAD,
    #[strum(serialize = "PATCH")]
    PATCH,
    #[strum(serialize = "OPTIONS")]
    OPTIONS,
    #[strum(default)]
    Other(String),
}

impl Method {
    pub fn parse(s: &str) -> Method {
        // `Other` is the strum default, so `from_str` never fails.
        Method::from_str(s).unwrap_or(Method::Other(String::new()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::PATCH => "PATCH",
            Method::OPTIONS => "OPTIONS",
            Method::Other(s) => s,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
