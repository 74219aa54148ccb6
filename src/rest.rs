//! Explorer requests: path templates and the http backend.
//!
//! A template is a path with `{name}` placeholders. A section in square brackets is
//! optional and is only kept when every placeholder inside it has a value, so
//! `/blocks[/{height}]` becomes `/blocks` or `/blocks/840000`.
//!
//! Requests are sent once. There is no retry: a failed request is reported and the
//! command fails.

use std::time::Duration;

use lazy_static::lazy_static;
use regex_lite::Regex;
use reqwest::blocking::Client as HttpClient;
use reqwest::header;

use super::*;
use crate::resolve::ResolvedArgs;

/// Default explorer host
pub const DEFAULT_EXPLORER: &str = "blockstream.info";
/// Default timeout for a single explorer request
pub const DEFAULT_REST_TIMEOUT: Duration = Duration::from_secs(30);

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([a-z_]+)\}").unwrap();
    static ref OPTIONAL: Regex = Regex::new(r"\[([^\[\]]*)\]").unwrap();
}

/// Explorer route of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestRoute {
    pub template: &'static str,
    /// For a POST, the parameter naming the file whose contents are sent
    pub post_file: Option<&'static str>,
}

impl RestRoute {
    pub fn get(template: &'static str) -> Self {
        Self {
            template,
            post_file: None,
        }
    }

    pub fn post_file(template: &'static str, param: &'static str) -> Self {
        Self {
            template,
            post_file: Some(param),
        }
    }

    /// Names of every placeholder in the template
    pub fn placeholders(&self) -> Vec<&'static str> {
        let template: &'static str = self.template;
        PLACEHOLDER
            .captures_iter(template)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str())
            .collect()
    }
}

/// Outcome of one explorer request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestResult {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RequestResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded for display
    pub fn rendered(&self) -> Rendered {
        render::decode_body(&self.body)
    }
}

/// Sends explorer requests
pub trait RestBackend {
    fn get(&self, url: &str) -> Result<RequestResult>;
    fn post(&self, url: &str, body: String, content_type: &str) -> Result<RequestResult>;
}

/// [`RestBackend`] over https
pub struct HttpBackend {
    client: HttpClient,
}

impl HttpBackend {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl RestBackend for HttpBackend {
    fn get(&self, url: &str) -> Result<RequestResult> {
        let resp = self
            .client
            .get(url)
            .header(header::ACCEPT_ENCODING, "gzip")
            .send()?;
        let status = resp.status().as_u16();
        let body = resp.bytes()?.to_vec();
        Ok(RequestResult { status, body })
    }

    fn post(&self, url: &str, body: String, content_type: &str) -> Result<RequestResult> {
        let resp = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, content_type)
            .body(body)
            .send()?;
        let status = resp.status().as_u16();
        let body = resp.bytes()?.to_vec();
        Ok(RequestResult { status, body })
    }
}

/// Joins the explorer base, network prefix and resource path.
///
/// `base` is a host name like `blockstream.info`, or a full url with scheme.
pub fn explorer_url(base: &str, network: NetworkPrefix, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let prefix = network.path_prefix();
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{base}/{prefix}{path}")
    } else {
        format!("https://{base}/{prefix}{path}")
    }
}

/// Substitutes `args` into `template`
pub fn expand(template: &str, args: &ResolvedArgs) -> Result<String> {
    let mut path = String::new();
    let mut last = 0;
    for cap in OPTIONAL.captures_iter(template) {
        let (Some(whole), Some(inner)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        path.push_str(&fill(&template[last..whole.start()], args, true)?);
        path.push_str(&fill(inner.as_str(), args, false)?);
        last = whole.end();
    }
    path.push_str(&fill(&template[last..], args, true)?);
    Ok(path)
}

/// Fills placeholders in a template section. A section that isn't `required` comes back
/// empty when any of its placeholders has no value.
fn fill(section: &str, args: &ResolvedArgs, required: bool) -> Result<String> {
    let mut out = String::new();
    let mut last = 0;
    for cap in PLACEHOLDER.captures_iter(section) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let value = match args.get(name.as_str()) {
            Some(v) => v.to_string(),
            None if required => return Err(args.missing(name.as_str())),
            None => return Ok(String::new()),
        };
        out.push_str(&section[last..whole.start()]);
        out.push_str(&encode_segment(&value));
        last = whole.end();
    }
    out.push_str(&section[last..]);
    Ok(out)
}

/// Percent-encodes everything outside the unreserved url characters
pub fn encode_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
