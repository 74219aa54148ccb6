//! Display of explorer bodies and node results.
//!
//! Decoding is best effort and never fails: gzip is tried first, then json, then
//! text, and anything that is not printable text is shown as lowercase hex.

use std::fmt;
use std::io::Read;

use bitcoin::hex::DisplayHex;
use flate2::read::GzDecoder;
use serde_json::Value;

/// A body ready for display
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Json(Value),
    Text(String),
    Hex(String),
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(v) => f.write_str(&render_value(v)),
            Self::Text(s) | Self::Hex(s) => f.write_str(s),
        }
    }
}

/// Decodes a raw response body
pub fn decode_body(body: &[u8]) -> Rendered {
    let body = match gunzip(body) {
        Some(plain) => {
            log::debug!("gunzipped body {} -> {} bytes", body.len(), plain.len());
            plain
        }
        None => body.to_vec(),
    };

    match serde_json::from_slice::<Value>(&body) {
        Ok(v) => return Rendered::Json(v),
        Err(e) => log::debug!("body is not json: {e}"),
    }

    match String::from_utf8(body) {
        Ok(s) if is_printable(&s) => Rendered::Text(s),
        Ok(s) => Rendered::Hex(s.as_bytes().to_lower_hex_string()),
        Err(e) => Rendered::Hex(e.as_bytes().to_lower_hex_string()),
    }
}

/// Gzip decompression, `None` if `body` isn't a valid gzip stream
fn gunzip(body: &[u8]) -> Option<Vec<u8>> {
    let mut plain = vec![];
    match GzDecoder::new(body).read_to_end(&mut plain) {
        Ok(_) => Some(plain),
        Err(_) => None,
    }
}

fn is_printable(s: &str) -> bool {
    s.chars().all(|c| !c.is_control() || c.is_whitespace())
}

/// Strings print bare, everything else as pretty json in insertion order
pub fn render_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        v => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn json_body() {
        let got = decode_body(br#"{"txid":"deadbeef","vout":[]}"#);
        assert_eq!(got, Rendered::Json(json!({"txid": "deadbeef", "vout": []})));
    }

    #[test]
    fn gzipped_json_body() {
        let got = decode_body(&gzip(b"[1,2,3]"));
        assert_eq!(got, Rendered::Json(json!([1, 2, 3])));
    }

    #[test]
    fn plain_text_body() {
        let got = decode_body(b"Transaction not found");
        assert_eq!(got, Rendered::Text("Transaction not found".into()));
        assert_eq!(got.to_string(), "Transaction not found");
    }

    #[test]
    fn binary_body_is_hex() {
        let got = decode_body(&[0x00, 0x00, 0x20, 0x20, 0xff, 0x1f]);
        assert_eq!(got, Rendered::Hex("00002020ff1f".into()));
        // valid utf8 with control characters is still binary
        let got = decode_body(&[0x01, 0x02, 0x41]);
        assert_eq!(got, Rendered::Hex("010241".into()));
    }

    #[test]
    fn empty_body() {
        assert_eq!(decode_body(b""), Rendered::Text(String::new()));
    }

    #[test]
    fn keeps_key_order() {
        let got = decode_body(br#"{"z":1,"a":2,"m":{"y":0,"b":1}}"#);
        let pretty = got.to_string();
        let z = pretty.find("\"z\"").unwrap();
        let a = pretty.find("\"a\"").unwrap();
        let y = pretty.find("\"y\"").unwrap();
        let b = pretty.find("\"b\"").unwrap();
        assert!(z < a && y < b);
    }

    #[test]
    fn numeric_body_is_json() {
        // e.g. /blocks/tip/height
        assert_eq!(decode_body(b"840000"), Rendered::Json(json!(840000)));
    }

    #[test]
    fn bare_strings() {
        assert_eq!(render_value(&json!("0f00")), "0f00");
        assert_eq!(render_value(&json!({"a": 1})), "{\n  \"a\": 1\n}");
    }
}
