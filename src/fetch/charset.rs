// src/fetch/charset.rs

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::trace;

/// How far into the body to look for a `<meta>` charset declaration.
const META_PRESCAN_BYTES: usize = 4096;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i-u)<meta\s[^>]*?charset\s*=\s*["']?\s*([A-Za-z0-9_.:\-]+)"#)
        .expect("meta charset regex should compile")
});

/// Pull the `charset=` parameter out of a `Content-Type` header value.
fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(|c| c == '"' || c == '\''))
        } else {
            None
        }
    })
}

fn sniff_meta(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_PRESCAN_BYTES)];
    let caps = META_CHARSET.captures(head)?;
    Encoding::for_label(caps.get(1)?.as_bytes())
}

/// Work out which encoding `body` is written in.
///
/// The bytes are trusted over the server: BOM, then a `<meta>`
/// declaration, then UTF-8 when the bytes validate, then the
/// `Content-Type` charset, then `fallback`.
pub fn detect(
    body: &[u8],
    content_type: Option<&str>,
    fallback: &'static Encoding,
) -> &'static Encoding {
    if let Some((enc, _)) = Encoding::for_bom(body) {
        trace!(encoding = enc.name(), "encoding from BOM");
        return enc;
    }
    if let Some(enc) = sniff_meta(body) {
        trace!(encoding = enc.name(), "encoding from <meta>");
        return enc;
    }
    if std::str::from_utf8(body).is_ok() {
        return UTF_8;
    }
    if let Some(enc) = content_type
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        trace!(encoding = enc.name(), "encoding from Content-Type");
        return enc;
    }
    trace!(encoding = fallback.name(), "falling back");
    fallback
}

/// Decode `body` into text, replacing malformed sequences.
pub fn decode(
    body: &[u8],
    content_type: Option<&str>,
    fallback: &'static Encoding,
) -> (String, &'static Encoding) {
    let enc = detect(body, content_type, fallback);
    let (text, used, _) = enc.decode(body);
    (text.into_owned(), used)
}
