//! Json-rpc access to the elements and bitcoin nodes.

use std::cell::OnceCell;
use std::fmt;
use std::time::Duration;

use bitcoincore_rpc::jsonrpc;
use bitcoincore_rpc::jsonrpc::simple_http::SimpleHttpTransport;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::*;

/// Default timeout for a single node call. Generating blocks can take a while.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(300);

/// Which node a call goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Elements,
    Bitcoin,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elements => f.write_str("elements"),
            Self::Bitcoin => f.write_str("bitcoin"),
        }
    }
}

/// A json-rpc client bound to one node. The http transport is built on the first call.
pub struct RpcNode {
    kind: NodeKind,
    conn: Option<(RpcConnection, Duration)>,
    client: OnceCell<Client>,
}

impl RpcNode {
    /// Client for the node at `conn` with basic auth. Nothing is sent until the first call.
    pub fn connect(kind: NodeKind, conn: &RpcConnection, timeout: Duration) -> Self {
        Self {
            kind,
            conn: Some((conn.clone(), timeout)),
            client: OnceCell::new(),
        }
    }

    /// Client over any json-rpc transport
    pub fn from_transport<T: jsonrpc::Transport>(kind: NodeKind, transport: T) -> Self {
        let client = Client::from_jsonrpc(jsonrpc::Client::with_transport(transport));
        Self {
            kind,
            conn: None,
            client: OnceCell::from(client),
        }
    }

    fn client(&self) -> Result<&Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let Some((conn, timeout)) = &self.conn else {
            return Err(Error::Config(format!("{} rpc: no connection", self.kind)));
        };
        let transport = SimpleHttpTransport::builder()
            .url(&conn.url())
            .map_err(|e| Error::Transport(format!("{} rpc url {}: {e}", self.kind, conn.url())))?
            .auth(&conn.user, Some(&conn.password))
            .timeout(*timeout)
            .build();
        Ok(self
            .client
            .get_or_init(|| Client::from_jsonrpc(jsonrpc::Client::with_transport(transport))))
    }

    /// Calls `method` with positional `params`.
    ///
    /// ## Errors
    ///
    /// [`Error::Rpc`] when the node answers with an error object, [`Error::Transport`]
    /// when the request didn't complete.
    pub fn call<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> Result<T> {
        log::debug!("{} <- {method} {}", self.kind, Value::from(params.to_vec()));
        let res = self
            .client()
            .and_then(|client| client.call(method, params).map_err(Error::from));
        res.map_err(|e| {
            log::error!("{} {method}: {e}", self.kind);
            e
        })
    }
}


#[cfg(test)]
mod test {
    use super::mock::MockNode;
    use super::*;
    use serde_json::json;

    #[test]
    fn call_returns_result() {
        let mock = MockNode::default();
        mock.expect("getblockcount", json!(101));
        let node = mock.node(NodeKind::Bitcoin);
        let count: u64 = node.call("getblockcount", &[]).unwrap();
        assert_eq!(count, 101);
        assert_eq!(mock.calls(), [("getblockcount".to_string(), json!([]))]);
    }

    #[test]
    fn params_are_positional() {
        let mock = MockNode::default();
        mock.expect("generatetoaddress", json!(["00ab"]));
        let node = mock.node(NodeKind::Elements);
        let _: Value = node
            .call("generatetoaddress", &[json!(1), json!("ert1qaddr")])
            .unwrap();
        assert_eq!(mock.calls()[0].1, json!([1, "ert1qaddr"]));
    }

    #[test]
    fn error_envelope_is_rpc_error() {
        let mock = MockNode::default();
        mock.expect_err("validateaddress", -5, "Invalid address");
        let node = mock.node(NodeKind::Elements);
        let err = node.call::<Value>("validateaddress", &[json!("nope")]).unwrap_err();
        match err {
            Error::Rpc { code, message } => {
                assert_eq!(code, -5);
                assert_eq!(message, "Invalid address");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unreachable_node_is_transport_error() {
        // nothing listens on port 9 of localhost
        let conn = RpcConnection {
            host: "127.0.0.1".into(),
            port: 9,
            user: "u".into(),
            password: "p".into(),
        };
        let node = RpcNode::connect(NodeKind::Bitcoin, &conn, Duration::from_secs(2));
        let err = node.call::<Value>("getblockcount", &[]).unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "{err:?}");
    }

    #[test]
    fn unresolvable_host_fails_on_call() {
        let conn = RpcConnection {
            host: "bitcoind.invalid".into(),
            port: 18443,
            user: "u".into(),
            password: "p".into(),
        };
        let node = RpcNode::connect(NodeKind::Bitcoin, &conn, Duration::from_secs(2));
        let err = node.call::<Value>("getblockcount", &[]).unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "{err:?}");
        assert!(err.to_string().contains("bitcoind.invalid"), "{err}");
    }
}
