//! Typed views of the node results that flows depend on.
//!
//! Only the fields a flow reads are declared, everything else in a result is ignored.

use serde::Deserialize;
use serde_json::Value;

/// `getpeginaddress`
#[derive(Debug, Clone, Deserialize)]
pub struct PeginAddress {
    pub mainchain_address: String,
    pub claim_script: String,
}

/// `gettransaction`
#[derive(Debug, Clone, Deserialize)]
pub struct WalletTx {
    /// A number on bitcoin, an object keyed by asset label on elements
    pub amount: Value,
    #[serde(default)]
    pub details: Value,
    pub hex: String,
}

/// Any result of the form `{"hex": ..}`: `createrawpegin`, `signrawtransactionwithwallet`,
/// `unblindrawtransaction`, `rawreissueasset`, `fundrawtransaction`
#[derive(Debug, Clone, Deserialize)]
pub struct HexResult {
    pub hex: String,
    #[serde(default)]
    pub complete: Option<bool>,
}

/// `decoderawtransaction`
#[derive(Debug, Clone, Deserialize)]
pub struct DecodedTx {
    pub txid: String,
    #[serde(default)]
    pub vin: Vec<Value>,
    pub vout: Vec<DecodedTxOut>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecodedTxOut {
    #[serde(default)]
    pub value: Option<f64>,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptPubKey {
    #[serde(default)]
    pub hex: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Older nodes report a list
    #[serde(default)]
    pub addresses: Option<Vec<String>>,
}

impl ScriptPubKey {
    pub fn first_address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .or_else(|| self.addresses.as_ref()?.first().map(String::as_str))
    }
}

impl DecodedTx {
    /// Address of the first output with a non-empty script, skipping the fee output
    pub fn first_address(&self) -> Option<&str> {
        self.vout
            .iter()
            .filter(|o| !o.script_pub_key.hex.is_empty())
            .find_map(|o| o.script_pub_key.first_address())
    }
}

/// `getaddressinfo`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressInfo {
    pub address: String,
    #[serde(default)]
    pub confidential: Option<String>,
    #[serde(default)]
    pub unconfidential: Option<String>,
    #[serde(default)]
    pub pubkey: Option<String>,
}

impl AddressInfo {
    /// The confidential form, if it differs from the unconfidential one
    pub fn distinct_confidential(&self) -> Option<&str> {
        match (&self.confidential, &self.unconfidential) {
            (Some(c), Some(u)) if c != u => Some(c.as_str()),
            _ => None,
        }
    }
}

/// `listunspent` entry
#[derive(Debug, Clone, Deserialize)]
pub struct Unspent {
    pub txid: String,
    pub vout: u32,
    pub amount: f64,
    #[serde(default)]
    pub address: Option<String>,
    /// Elements only
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub assetblinder: Option<String>,
    #[serde(default)]
    pub spendable: Option<bool>,
}

/// `rawissueasset` entry
#[derive(Debug, Clone, Deserialize)]
pub struct IssuanceResult {
    pub hex: String,
    pub vin: u32,
    pub entropy: String,
    pub asset: String,
    pub token: String,
}

/// `listissuances` entry
#[derive(Debug, Clone, Deserialize)]
pub struct Issuance {
    pub txid: String,
    pub entropy: String,
    pub asset: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub isreissuance: bool,
}

/// `getblock` at verbosity 1
#[derive(Debug, Clone, Deserialize)]
pub struct BlockTxids {
    pub hash: String,
    pub tx: Vec<String>,
}

/// Picks the smallest unspent of `asset` worth more than `min_amount`.
///
/// Unspents the wallet marks unspendable are skipped.
pub fn select_utxo<'a>(
    unspents: &'a [Unspent],
    asset: &str,
    min_amount: f64,
) -> Option<&'a Unspent> {
    let mut candidates: Vec<&Unspent> = unspents
        .iter()
        .filter(|u| u.asset.as_deref() == Some(asset))
        .filter(|u| u.spendable != Some(false))
        .collect();
    candidates.sort_by(|a, b| a.amount.total_cmp(&b.amount));
    candidates.into_iter().find(|u| u.amount > min_amount)
}
