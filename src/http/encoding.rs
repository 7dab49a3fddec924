use crate::http::headers::Headers;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::HashSet;
use std::io::{self, Write};
use std::str::FromStr;
use strum::{Display, EnumString};

/// Content codings this server can produce.
#[derive(EnumString, Debug, PartialEq, Eq, Hash, Clone, Copy, Display)]
pub enum Encoding {
    #[strum(serialize = "gzip")]
    Gzip,
}

/// Encodings listed in an `Accept-Encoding` value. Tokens are split on
/// commas and trimmed, then matched exactly; anything else (including
/// `gzip;q=0.5`) is ignored.
pub fn parse_accept_encoding(header: &str) -> HashSet<Encoding> {
    header
        .split(',')
        .map(str::trim)
        .filter_map(|token| Encoding::from_str(token).ok())
        .collect()
}

pub fn should_compress(headers: &Headers) -> bool {
    headers
        .get("Accept-Encoding")
        .is_some_and(|v| parse_accept_encoding(v).contains(&Encoding::Gzip))
}

pub fn compress(content: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(content.len() / 2 + 32), Compression::default());
    encoder.write_all(content)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn accept(v: &str) -> Headers {
        [("Accept-Encoding", v)].into_iter().collect()
    }

    #[test]
    fn gzip_token_is_found_among_others() {
        assert!(should_compress(&accept("gzip")));
        assert!(should_compress(&accept("deflate, gzip")));
        assert!(should_compress(&accept("invalid-encoding-1 ,  gzip , br")));
    }

    #[test]
    fn no_gzip_means_no_compression() {
        assert!(!should_compress(&Headers::new()));
        assert!(!should_compress(&accept("")));
        assert!(!should_compress(&accept("invalid-encoding")));
        assert!(!should_compress(&accept("*")));
        assert!(!should_compress(&accept("gzip;q=1.0")));
        assert!(!should_compress(&accept("GZIP")));
    }

    #[test]
    fn header_name_is_exact() {
        let headers: Headers = [("accept-encoding", "gzip")].into_iter().collect();
        assert!(!should_compress(&headers));
    }

    #[test]
    fn compressed_payload_decodes() {
        let packed = compress(b"hello").unwrap();
        assert_eq!(&packed[..2], &[0x1f, 0x8b]);

        let mut out = String::new();
        GzDecoder::new(packed.as_slice()).read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
    }
}
