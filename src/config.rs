//! Node connection settings read from a `command.conf` style file.
//!
//! The file is a flat list of `key=value` lines in the format used by `elements.conf`.
//! Section headers and comments are skipped, unknown keys are ignored and the last
//! occurrence of a key wins. A missing or unreadable file is not an error: every
//! field has a default.

use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex_lite::Regex;

use super::*;

/// Default rpc host for both nodes
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default elements rpc port
pub const DEFAULT_ELEMENTS_PORT: u16 = 8443;
/// Default bitcoin rpc port (regtest)
pub const DEFAULT_BITCOIN_PORT: u16 = 18443;
/// Default rpc user and password
pub const DEFAULT_RPC_CREDENTIAL: &str = "bitcoinrpc";

lazy_static! {
    /// A `key = value` line, with optional whitespace around either side
    static ref ENTRY: Regex = Regex::new(r"^\s*([A-Za-z0-9_.\-]+)\s*=\s*(.*?)\s*$").unwrap();
    /// Lines to skip: blank, comment or `[section]`
    static ref SKIP: Regex = Regex::new(r"^\s*(?:[#;].*|\[.*\])?\s*$").unwrap();
}

/// Connection details for one json-rpc node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConnection {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl RpcConnection {
    fn with_port(port: u16) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port,
            user: DEFAULT_RPC_CREDENTIAL.to_string(),
            password: DEFAULT_RPC_CREDENTIAL.to_string(),
        }
    }

    /// Node url, e.g. `http://127.0.0.1:8443`. A port given in `host` wins over `port`.
    pub fn url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        let bare = host
            .strip_prefix("http://")
            .or_else(|| host.strip_prefix("https://"))
            .unwrap_or(host);
        let has_port = match bare.rsplit_once(':') {
            Some((name, port)) => {
                !name.is_empty() && !name.contains(':') && port.parse::<u16>().is_ok()
            }
            None => false,
        };
        let scheme = if bare.len() == host.len() { "http://" } else { "" };
        if has_port {
            format!("{scheme}{host}")
        } else {
            format!("{scheme}{host}:{}", self.port)
        }
    }
}

/// Settings for the elements node and its bitcoin mainchain node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub elements: RpcConnection,
    pub bitcoin: RpcConnection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            elements: RpcConnection::with_port(DEFAULT_ELEMENTS_PORT),
            bitcoin: RpcConnection::with_port(DEFAULT_BITCOIN_PORT),
        }
    }
}

impl Config {
    /// Loads the config at `path`, falling back to defaults if it can't be read.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => Self::parse(&s),
            Err(e) => {
                log::warn!("{}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Parses config text. Never fails, bad values are logged and skipped.
    pub fn parse(s: &str) -> Self {
        let mut conf = Self::default();
        for (lineno, line) in s.lines().enumerate() {
            if SKIP.is_match(line) {
                continue;
            }
            let Some(cap) = ENTRY.captures(line) else {
                log::warn!("line {}: not a key=value pair", lineno + 1);
                continue;
            };
            let value = unquote(&cap[2]);
            if let Err(e) = conf.set(&cap[1], value) {
                log::warn!("line {}: {e}", lineno + 1);
            }
        }
        conf
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "rpcbind" => self.elements.host = value.to_string(),
            "rpcport" => self.elements.port = parse_port(key, value)?,
            "rpcuser" => self.elements.user = value.to_string(),
            "rpcpassword" => self.elements.password = value.to_string(),
            "mainchainrpchost" => self.bitcoin.host = value.to_string(),
            "mainchainrpcport" => self.bitcoin.port = parse_port(key, value)?,
            "mainchainrpcuser" => self.bitcoin.user = value.to_string(),
            "mainchainrpcpassword" => self.bitcoin.password = value.to_string(),
            _ => log::debug!("ignoring config key {key}"),
        }
        Ok(())
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{key}: \"{value}\" is not a port number")))
}

/// Strips one pair of surrounding double quotes
fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let conf = Config::parse("");
        assert_eq!(conf, Config::default());
        assert_eq!(conf.elements.url(), "http://127.0.0.1:8443");
        assert_eq!(conf.bitcoin.url(), "http://127.0.0.1:18443");
        assert_eq!(conf.bitcoin.user, "bitcoinrpc");
        assert_eq!(conf.elements.password, "bitcoinrpc");
    }

    #[test]
    fn parse_both_nodes() {
        let text = "\
# elements regtest
chain=elementsregtest
[elementsregtest]
rpcbind = 10.0.0.2
rpcport=18884
rpcuser=alice
rpcpassword=\"s3cret\"

; mainchain
mainchainrpchost=10.0.0.3
mainchainrpcport=18888
mainchainrpcuser=bob
mainchainrpcpassword=hunter2
";
        let conf = Config::parse(text);
        assert_eq!(
            conf.elements,
            RpcConnection {
                host: "10.0.0.2".into(),
                port: 18884,
                user: "alice".into(),
                password: "s3cret".into(),
            }
        );
        assert_eq!(conf.bitcoin.url(), "http://10.0.0.3:18888");
        assert_eq!(conf.bitcoin.user, "bob");
        assert_eq!(conf.bitcoin.password, "hunter2");
    }

    #[test]
    fn bad_port_keeps_default() {
        let conf = Config::parse("rpcport=eighty\nmainchainrpcport=70000\nrpcuser=x");
        assert_eq!(conf.elements.port, DEFAULT_ELEMENTS_PORT);
        assert_eq!(conf.bitcoin.port, DEFAULT_BITCOIN_PORT);
        assert_eq!(conf.elements.user, "x");
    }

    #[test]
    fn host_with_port() {
        let conf = Config::parse("rpcbind=127.0.0.1:18884\nmainchainrpchost=http://bitcoind/");
        assert_eq!(conf.elements.url(), "http://127.0.0.1:18884");
        assert_eq!(conf.bitcoin.url(), "http://bitcoind:18443");
    }

    #[test]
    fn last_key_wins() {
        let conf = Config::parse("rpcuser=first\nrpcuser=second");
        assert_eq!(conf.elements.user, "second");
    }

    #[test]
    fn missing_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let conf = Config::load(dir.path().join("command.conf"));
        assert_eq!(conf, Config::default());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rpcport=7041").unwrap();
        let conf = Config::load(file.path());
        assert_eq!(conf.elements.port, 7041);
    }
}
