//! Key, address and transaction helpers that run locally.

use std::str::FromStr;

use bitcoin::address::NetworkUnchecked;
use bitcoin::consensus::encode::deserialize;
use bitcoin::hex::{DisplayHex, FromHex};
use bitcoin::secp256k1::{rand, Secp256k1};
use bitcoin::{
    Address, Amount, CompressedPublicKey, Network, PrivateKey, PublicKey, ScriptBuf, Transaction,
};
use elements::secp256k1_zkp::PublicKey as BlindingKey;
use elements::AddressParams;
use serde_json::{json, Value};

use super::*;
use crate::dispatch::Context;
use crate::registry::{CommandSpec, ParameterSpec as P};
use crate::resolve::ResolvedArgs;

pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::flow("genkey", genkey)
            .about("random key pair; network is mainnet, testnet or regtest")
            .alias("cgenkey")
            .param(P::text("network").or("regtest"))
            .param(P::flag("wif").or("true"))
            .param(P::flag("compressed").or("true")),
        CommandSpec::flow("newaddr", newaddr)
            .about(
                "bitcoin address of a pubkey, or of a redeem script when script is true; \
                 a new key is made when hex is omitted",
            )
            .alias("cnewaddr")
            .alias("cbnewaddr")
            .param(P::text("hex").optional())
            .param(P::text("network").or("regtest"))
            .param(P::text("type").or("p2wpkh"))
            .param(P::flag("script").or("false")),
        CommandSpec::flow("elements_newaddr", elements_newaddr)
            .about("elements address of a pubkey or redeem script, blinded when a key is given")
            .alias("cenewaddr")
            .param(P::text("hex"))
            .param(P::text("network").or("regtest"))
            .param(P::text("type").or("p2wpkh"))
            .param(P::flag("script").or("false"))
            .param(P::text("blinding_key").optional()),
        CommandSpec::flow("decodetx", decodetx)
            .about("decode an elements or bitcoin transaction locally")
            .alias("dec")
            .param(P::text("hex").prompt("target tx > "))
            .param(P::text("network").or("regtest")),
    ]
}

/// Parses a network name as given on the command line
pub fn parse_network(raw: &str) -> Result<Network> {
    match raw {
        "mainnet" | "bitcoin" | "main" => Ok(Network::Bitcoin),
        "testnet" | "test" => Ok(Network::Testnet),
        "signet" => Ok(Network::Signet),
        "regtest" => Ok(Network::Regtest),
        _ => Err(Error::invalid("network", raw, "expected mainnet, testnet or regtest")),
    }
}

/// Address parameters of an elements network name
pub fn elements_params(raw: &str) -> Result<&'static AddressParams> {
    match raw {
        "regtest" | "elementsregtest" => Ok(&AddressParams::ELEMENTS),
        "liquidv1" | "liquid" | "mainnet" => Ok(&AddressParams::LIQUID),
        "liquidtestnet" | "testnet" => Ok(&AddressParams::LIQUID_TESTNET),
        _ => Err(Error::invalid("network", raw, "expected liquidv1, liquidtestnet or regtest")),
    }
}

/// A new random key pair
fn new_key(network: Network, compressed: bool) -> PrivateKey {
    let secp = Secp256k1::new();
    let (sk, _) = secp.generate_keypair(&mut rand::thread_rng());
    if compressed {
        PrivateKey::new(sk, network)
    } else {
        PrivateKey::new_uncompressed(sk, network)
    }
}

fn key_json(key: &PrivateKey, wif: bool) -> Value {
    let secp = Secp256k1::new();
    let privkey = if wif {
        key.to_wif()
    } else {
        key.inner.display_secret().to_string()
    };
    json!({
        "privkey": privkey,
        "pubkey": key.public_key(&secp).to_string(),
    })
}

fn genkey(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let network = parse_network(args.text("network")?)?;
    let key = new_key(network, args.flag("compressed")?);
    ctx.print(render_value(&key_json(&key, args.flag("wif")?)))
}

/// What an address commits to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyData {
    Pubkey(PublicKey),
    /// A redeem or witness script
    Script(ScriptBuf),
}

impl KeyData {
    pub fn parse(hex: &str, script: bool) -> Result<Self> {
        if script {
            ScriptBuf::from_hex(hex)
                .map(Self::Script)
                .map_err(|e| Error::invalid("hex", hex, e.to_string()))
        } else {
            PublicKey::from_str(hex)
                .map(Self::Pubkey)
                .map_err(|e| Error::invalid("hex", hex, e.to_string()))
        }
    }

    fn compressed(pubkey: &PublicKey) -> Result<CompressedPublicKey> {
        CompressedPublicKey::try_from(*pubkey)
            .map_err(|e| Error::invalid("hex", &pubkey.to_string(), e.to_string()))
    }

    fn unsupported(&self, kind: &str) -> Error {
        let expected = match self {
            Self::Pubkey(_) => "expected p2wpkh, p2pkh or p2sh-p2wpkh",
            Self::Script(_) => "expected p2wsh, p2sh or p2sh-p2wsh",
        };
        Error::invalid("type", kind, expected)
    }
}

/// Bitcoin address of `data` with the given script `kind`
pub fn address_of(data: &KeyData, kind: &str, network: Network) -> Result<Address> {
    match (data, kind) {
        (KeyData::Pubkey(pk), "p2wpkh") => Ok(Address::p2wpkh(&KeyData::compressed(pk)?, network)),
        (KeyData::Pubkey(pk), "p2pkh") => Ok(Address::p2pkh(pk.pubkey_hash(), network)),
        (KeyData::Pubkey(pk), "p2sh-p2wpkh") => {
            Ok(Address::p2shwpkh(&KeyData::compressed(pk)?, network))
        }
        (KeyData::Script(script), "p2wsh") => Ok(Address::p2wsh(script, network)),
        (KeyData::Script(script), "p2sh") => Address::p2sh(script, network)
            .map_err(|e| Error::invalid("hex", &script.to_hex_string(), e.to_string())),
        (KeyData::Script(script), "p2sh-p2wsh") => Ok(Address::p2shwsh(script, network)),
        _ => Err(data.unsupported(kind)),
    }
}

/// Elements address of `data`, confidential when a `blinder` is given
pub fn elements_address_of(
    data: &KeyData,
    kind: &str,
    blinder: Option<BlindingKey>,
    params: &'static AddressParams,
) -> Result<elements::Address> {
    let script = |s: &ScriptBuf| elements::Script::from(s.to_bytes());
    match (data, kind) {
        (KeyData::Pubkey(pk), "p2wpkh") => {
            KeyData::compressed(pk)?;
            Ok(elements::Address::p2wpkh(pk, blinder, params))
        }
        (KeyData::Pubkey(pk), "p2pkh") => Ok(elements::Address::p2pkh(pk, blinder, params)),
        (KeyData::Pubkey(pk), "p2sh-p2wpkh") => {
            KeyData::compressed(pk)?;
            Ok(elements::Address::p2shwpkh(pk, blinder, params))
        }
        (KeyData::Script(s), "p2wsh") => Ok(elements::Address::p2wsh(&script(s), blinder, params)),
        (KeyData::Script(s), "p2sh") => Ok(elements::Address::p2sh(&script(s), blinder, params)),
        (KeyData::Script(s), "p2sh-p2wsh") => {
            Ok(elements::Address::p2shwsh(&script(s), blinder, params))
        }
        _ => Err(data.unsupported(kind)),
    }
}

fn newaddr(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let network = parse_network(args.text("network")?)?;
    let kind = args.text("type")?;
    let script = args.flag("script")?;

    let data = match args.opt_text("hex") {
        Some(hex) => KeyData::parse(hex, script)?,
        None if script => return Err(args.missing("hex")),
        None => {
            let key = new_key(network, true);
            ctx.show("genkey", &key_json(&key, true))?;
            KeyData::Pubkey(key.public_key(&Secp256k1::new()))
        }
    };
    let address = address_of(&data, kind, network)?;
    ctx.print(render_value(&json!({
        "address": address.to_string(),
        "lockingScript": address.script_pubkey().to_hex_string(),
        "type": kind,
    })))
}

fn elements_newaddr(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let params = elements_params(args.text("network")?)?;
    let kind = args.text("type")?;
    let data = KeyData::parse(args.text("hex")?, args.flag("script")?)?;
    let blinder = match args.opt_text("blinding_key") {
        Some(hex) => Some(
            BlindingKey::from_str(hex)
                .map_err(|e| Error::invalid("blinding_key", hex, e.to_string()))?,
        ),
        None => None,
    };

    let address = elements_address_of(&data, kind, blinder, params)?;
    let mut v = json!({
        "address": address.to_string(),
        "lockingScript": address.script_pubkey().as_bytes().to_lower_hex_string(),
        "type": kind,
    });
    if address.is_blinded() {
        v["unconfidentialAddress"] = json!(address.to_unconfidential().to_string());
    }
    ctx.print(render_value(&v))
}

/// Decodes `hex` as a bitcoin transaction
pub fn decode(hex: &str) -> Result<Transaction> {
    let bytes = Vec::<u8>::from_hex(hex).map_err(|e| Error::invalid("hex", hex, e.to_string()))?;
    deserialize(&bytes).map_err(|e| Error::invalid("hex", hex, e.to_string()))
}

/// Json view of `tx` in the shape of `decoderawtransaction`
pub fn tx_json(tx: &Transaction, network: Network) -> Value {
    let vin: Vec<Value> = tx
        .input
        .iter()
        .map(|txin| {
            let witness: Vec<String> =
                txin.witness.iter().map(|w| w.to_lower_hex_string()).collect();
            json!({
                "txid": txin.previous_output.txid.to_string(),
                "vout": txin.previous_output.vout,
                "scriptSig": txin.script_sig.to_hex_string(),
                "txinwitness": witness,
                "sequence": txin.sequence.0,
            })
        })
        .collect();
    let vout: Vec<Value> = tx
        .output
        .iter()
        .enumerate()
        .map(|(n, txo)| {
            let address = Address::from_script(&txo.script_pubkey, network)
                .ok()
                .map(|a| a.to_string());
            json!({
                "value": txo.value.to_btc(),
                "n": n,
                "scriptPubKey": {
                    "hex": txo.script_pubkey.to_hex_string(),
                    "address": address,
                },
            })
        })
        .collect();
    json!({
        "txid": tx.compute_txid().to_string(),
        "hash": tx.compute_wtxid().to_string(),
        "version": tx.version.0,
        "size": tx.total_size(),
        "vsize": tx.vsize(),
        "weight": tx.weight().to_wu(),
        "locktime": tx.lock_time.to_consensus_u32(),
        "vin": vin,
        "vout": vout,
    })
}

/// Decodes `hex` as an elements transaction
pub fn decode_elements(hex: &str) -> Result<elements::Transaction> {
    let bytes = Vec::<u8>::from_hex(hex).map_err(|e| Error::invalid("hex", hex, e.to_string()))?;
    elements::encode::deserialize(&bytes).map_err(|e| Error::invalid("hex", hex, e.to_string()))
}

/// Json view of an elements `tx`, close to the node's `decoderawtransaction`
pub fn elements_tx_json(tx: &elements::Transaction, params: &'static AddressParams) -> Value {
    let vin: Vec<Value> = tx
        .input
        .iter()
        .map(|txin| {
            let hexes = |items: &Vec<Vec<u8>>| -> Vec<String> {
                items.iter().map(|w| w.to_lower_hex_string()).collect()
            };
            let mut v = json!({
                "txid": txin.previous_output.txid.to_string(),
                "vout": txin.previous_output.vout,
                "is_pegin": txin.is_pegin,
                "scriptSig": txin.script_sig.as_bytes().to_lower_hex_string(),
                "txinwitness": hexes(&txin.witness.script_witness),
                "sequence": txin.sequence.to_consensus_u32(),
            });
            if txin.is_pegin {
                v["pegin_witness"] = json!(hexes(&txin.witness.pegin_witness));
            }
            if txin.has_issuance() {
                let issuance = &txin.asset_issuance;
                let btc = |sat: u64| Amount::from_sat(sat).to_btc();
                v["issuance"] = json!({
                    "assetEntropy": issuance.asset_entropy[..].to_lower_hex_string(),
                    "assetamount": issuance.amount.explicit().map(btc),
                    "tokenamount": issuance.inflation_keys.explicit().map(btc),
                });
            }
            v
        })
        .collect();
    let vout: Vec<Value> = tx
        .output
        .iter()
        .enumerate()
        .map(|(n, txo)| {
            let address = elements::Address::from_script(&txo.script_pubkey, None, params)
                .map(|a| a.to_string());
            let mut v = json!({ "n": n });
            match txo.value.explicit() {
                Some(sat) => v["value"] = json!(Amount::from_sat(sat).to_btc()),
                None => {
                    v["valuecommitment"] =
                        json!(elements::encode::serialize(&txo.value).to_lower_hex_string())
                }
            }
            match txo.asset.explicit() {
                Some(asset) => v["asset"] = json!(asset.to_string()),
                None => {
                    v["assetcommitment"] =
                        json!(elements::encode::serialize(&txo.asset).to_lower_hex_string())
                }
            }
            v["scriptPubKey"] = json!({
                "hex": txo.script_pubkey.as_bytes().to_lower_hex_string(),
                "address": address,
            });
            if txo.is_fee() {
                v["scriptPubKey"]["type"] = json!("fee");
            }
            v
        })
        .collect();
    let weight = tx.weight();
    json!({
        "txid": tx.txid().to_string(),
        "hash": tx.wtxid().to_string(),
        "version": tx.version,
        "size": elements::encode::serialize(tx).len(),
        "vsize": (weight + 3) / 4,
        "weight": weight,
        "locktime": tx.lock_time.to_consensus_u32(),
        "vin": vin,
        "vout": vout,
    })
}

/// Tries the elements encoding first, then bitcoin
fn decodetx(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let hex = args.text("hex")?;
    let network = args.text("network")?;
    match decode_elements(hex) {
        Ok(tx) => ctx.print(render_value(&elements_tx_json(&tx, elements_params(network)?))),
        Err(e) => {
            log::debug!("not an elements transaction: {e}");
            let tx = decode(hex)?;
            ctx.print(render_value(&tx_json(&tx, parse_network(network)?)))
        }
    }
}

/// Output script of `address`, on any network
pub fn script_of(address: &str) -> Result<ScriptBuf> {
    let addr = Address::<NetworkUnchecked>::from_str(address)
        .map_err(|e| Error::invalid("address", address, e.to_string()))?;
    Ok(addr.assume_checked().script_pubkey())
}

/// Outputs of the transaction `hex` locked to `script`, as `(vout, value)`
pub fn paid_to(hex: &str, script: &ScriptBuf) -> Result<Vec<(u32, Amount)>> {
    let tx = decode(hex)
        .map_err(|e| Error::Backend(format!("node returned an undecodable transaction: {e}")))?;
    Ok(tx
        .output
        .iter()
        .zip(0u32..)
        .filter(|(txo, _)| &txo.script_pubkey == script)
        .map(|(txo, vout)| (vout, txo.value))
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dispatch::testutil::Harness;
    use bitcoin::absolute::LockTime;
    use bitcoin::consensus::encode::serialize_hex;
    use bitcoin::transaction::Version;
    use bitcoin::{TxIn, TxOut};

    /// The generator point
    const G: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn output_json(h: &Harness) -> Value {
        serde_json::from_str(&h.output()).unwrap()
    }

    #[test]
    fn genkey_wif_defaults_to_regtest() {
        let mut h = Harness::new();
        h.run(&["cgenkey"]).unwrap();
        let v = output_json(&h);
        let key = PrivateKey::from_wif(v["privkey"].as_str().unwrap()).unwrap();
        assert!(key.compressed);
        assert_eq!(key.network, bitcoin::NetworkKind::Test);
        let pubkey = key.public_key(&Secp256k1::new());
        assert_eq!(v["pubkey"], json!(pubkey.to_string()));
    }

    #[test]
    fn genkey_hex_uncompressed() {
        let mut h = Harness::new();
        h.run(&["genkey", "mainnet", "false", "false"]).unwrap();
        let v = output_json(&h);
        assert_eq!(v["privkey"].as_str().unwrap().len(), 64);
        // uncompressed keys are 65 bytes
        assert!(v["pubkey"].as_str().unwrap().starts_with("04"));
        assert_eq!(v["pubkey"].as_str().unwrap().len(), 130);
    }

    #[test]
    fn unknown_network_is_validation_error() {
        let mut h = Harness::new();
        let err = h.run(&["genkey", "moonnet"]).unwrap_err();
        assert!(matches!(err, Error::Validation { ref param, .. } if param == "network"));
    }

    #[test]
    fn addresses_of_known_key() {
        let pk = KeyData::parse(G, false).unwrap();
        let cases = [
            ("p2wpkh", Network::Bitcoin, "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"),
            ("p2wpkh", Network::Regtest, "bcrt1qw508d6qejxtdg4y5r3zarvary0c5xw7kygt080"),
            ("p2pkh", Network::Bitcoin, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"),
        ];
        for (kind, network, want) in cases {
            assert_eq!(address_of(&pk, kind, network).unwrap().to_string(), want);
        }
        let nested = address_of(&pk, "p2sh-p2wpkh", Network::Regtest).unwrap();
        assert!(nested.to_string().starts_with('2'));
        assert!(address_of(&pk, "p2tr", Network::Regtest).is_err());
    }

    #[test]
    fn script_hash_addresses() {
        // 1-of-1 multisig over the generator point
        let script = KeyData::parse(&format!("5121{G}51ae"), true).unwrap();
        let KeyData::Script(ref redeem) = script else {
            panic!("expected a script");
        };
        let wsh = address_of(&script, "p2wsh", Network::Regtest).unwrap();
        assert_eq!(wsh.script_pubkey(), ScriptBuf::new_p2wsh(&redeem.wscript_hash()));
        let sh = address_of(&script, "p2sh", Network::Bitcoin).unwrap();
        assert_eq!(sh.script_pubkey(), ScriptBuf::new_p2sh(&redeem.script_hash()));
        assert!(sh.to_string().starts_with('3'));
        let nested = address_of(&script, "p2sh-p2wsh", Network::Bitcoin).unwrap();
        assert!(nested.to_string().starts_with('3'));
        assert_ne!(nested, sh);

        // pubkey types need a pubkey and script types need a script
        assert!(address_of(&script, "p2wpkh", Network::Regtest).is_err());
        let pk = KeyData::parse(G, false).unwrap();
        assert!(address_of(&pk, "p2wsh", Network::Regtest).is_err());
    }

    #[test]
    fn newaddr_from_redeem_script() {
        let mut h = Harness::new();
        let redeem = format!("5121{G}51ae");
        h.run(&["cbnewaddr", &redeem, "regtest", "p2wsh", "true"]).unwrap();
        let v = output_json(&h);
        assert!(v["address"].as_str().unwrap().starts_with("bcrt1q"));
        assert!(v["lockingScript"].as_str().unwrap().starts_with("0020"));

        let mut h = Harness::new();
        let err = h.run(&["cbnewaddr", "", "regtest", "p2wsh", "true"]).unwrap_err();
        assert!(err.is_usage(), "{err:?}");
    }

    #[test]
    fn elements_addresses() {
        let pk = KeyData::parse(G, false).unwrap();
        let blinder = BlindingKey::from_str(G).unwrap();

        let plain = elements_address_of(&pk, "p2wpkh", None, &AddressParams::ELEMENTS).unwrap();
        assert!(!plain.is_blinded());
        assert!(plain.to_string().starts_with("ert1q"));

        let blinded =
            elements_address_of(&pk, "p2wpkh", Some(blinder), &AddressParams::ELEMENTS).unwrap();
        assert!(blinded.is_blinded());
        assert!(blinded.to_string().starts_with("el1q"));
        assert_eq!(blinded.blinding_pubkey, Some(blinder));
        assert_eq!(blinded.to_unconfidential(), plain);
        assert_eq!(blinded.script_pubkey(), plain.script_pubkey());

        let liquid = elements_address_of(&pk, "p2wpkh", Some(blinder), &AddressParams::LIQUID);
        assert!(liquid.unwrap().to_string().starts_with("lq1q"));
        assert!(elements_address_of(&pk, "p2sh", None, &AddressParams::ELEMENTS).is_err());
    }

    #[test]
    fn elements_newaddr_confidential() {
        let mut h = Harness::new();
        h.run(&["cenewaddr", G, "regtest", "p2wpkh", "false", G]).unwrap();
        let v = output_json(&h);
        assert!(v["address"].as_str().unwrap().starts_with("el1q"));
        assert!(v["unconfidentialAddress"].as_str().unwrap().starts_with("ert1q"));

        let mut h = Harness::new();
        h.run(&["elements_newaddr", &format!("5121{G}51ae"), "liquidv1", "p2sh-p2wsh", "true"])
            .unwrap();
        let v = output_json(&h);
        assert!(v.get("unconfidentialAddress").is_none());
        assert!(v["lockingScript"].as_str().unwrap().starts_with("a914"));

        let mut h = Harness::new();
        let err = h.run(&["cenewaddr", G, "regtest", "p2wpkh", "false", "zz"]).unwrap_err();
        assert!(matches!(err, Error::Validation { ref param, .. } if param == "blinding_key"));
    }

    #[test]
    fn newaddr_from_pubkey() {
        let mut h = Harness::new();
        h.run(&["cnewaddr", G, "mainnet", "p2pkh"]).unwrap();
        let v = output_json(&h);
        assert_eq!(v["address"], json!("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"));
    }

    #[test]
    fn newaddr_generates_key_when_omitted() {
        let mut h = Harness::new();
        h.run(&["newaddr"]).unwrap();
        let out = h.output();
        assert!(out.starts_with("genkey =>\n"));
        assert!(out.contains("\"address\": \"bcrt1q"));
    }

    #[test]
    fn segwit_needs_compressed_key() {
        let secp = Secp256k1::new();
        let key = new_key(Network::Regtest, false);
        let pk = KeyData::Pubkey(key.public_key(&secp));
        let err = address_of(&pk, "p2wpkh", Network::Regtest).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(address_of(&pk, "p2pkh", Network::Regtest).is_ok());
    }

    fn sample_tx() -> Transaction {
        Transaction {
            version: Version::TWO,
            lock_time: LockTime::from_consensus(840_000),
            input: vec![TxIn::default()],
            output: vec![TxOut {
                value: Amount::from_sat(12_345),
                script_pubkey: script_of("bcrt1qw508d6qejxtdg4y5r3zarvary0c5xw7kygt080").unwrap(),
            }],
        }
    }

    #[test]
    fn decodetx_locally() {
        let tx = sample_tx();
        let mut h = Harness::new();
        h.run(&["dec", &serialize_hex(&tx)]).unwrap();
        let v = output_json(&h);
        assert_eq!(v["txid"], json!(tx.compute_txid().to_string()));
        assert_eq!(v["locktime"], json!(840_000));
        assert_eq!(v["vout"][0]["value"], json!(0.00012345));
        assert_eq!(
            v["vout"][0]["scriptPubKey"]["address"],
            json!("bcrt1qw508d6qejxtdg4y5r3zarvary0c5xw7kygt080")
        );
        assert!(h.elements.calls().is_empty());
    }

    fn sample_elements_tx() -> elements::Transaction {
        let pk = KeyData::parse(G, false).unwrap();
        let address = elements_address_of(&pk, "p2wpkh", None, &AddressParams::ELEMENTS).unwrap();
        elements::Transaction {
            version: 2,
            lock_time: elements::LockTime::from_consensus(101),
            input: vec![elements::TxIn::default()],
            output: vec![
                elements::TxOut {
                    asset: elements::confidential::Asset::Explicit(elements::AssetId::LIQUID_BTC),
                    value: elements::confidential::Value::Explicit(12_345),
                    script_pubkey: address.script_pubkey(),
                    ..Default::default()
                },
                elements::TxOut {
                    asset: elements::confidential::Asset::Explicit(elements::AssetId::LIQUID_BTC),
                    value: elements::confidential::Value::Explicit(500),
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn decodetx_elements_locally() {
        let tx = sample_elements_tx();
        let hex = elements::encode::serialize(&tx).to_lower_hex_string();
        let mut h = Harness::new();
        h.run(&["dec", &hex]).unwrap();
        let v = output_json(&h);
        assert_eq!(v["txid"], json!(tx.txid().to_string()));
        assert_eq!(v["locktime"], json!(101));
        assert_eq!(v["vin"][0]["is_pegin"], json!(false));
        assert_eq!(v["vout"][0]["value"], json!(0.00012345));
        assert_eq!(v["vout"][0]["asset"], json!(elements::AssetId::LIQUID_BTC.to_string()));
        assert!(v["vout"][0]["scriptPubKey"]["address"]
            .as_str()
            .unwrap()
            .starts_with("ert1q"));
        assert_eq!(v["vout"][1]["scriptPubKey"]["type"], json!("fee"));
        assert!(h.elements.calls().is_empty());
    }

    #[test]
    fn decodetx_rejects_garbage() {
        let mut h = Harness::new();
        let err = h.run(&["decodetx", "0200000001ffff"]).unwrap_err();
        assert!(matches!(err, Error::Validation { ref param, .. } if param == "hex"));
        assert!(h.elements.calls().is_empty());
    }

    #[test]
    fn paid_to_filters_by_script() {
        let tx = sample_tx();
        let hex = serialize_hex(&tx);
        let mine = script_of("bcrt1qw508d6qejxtdg4y5r3zarvary0c5xw7kygt080").unwrap();
        assert_eq!(paid_to(&hex, &mine).unwrap(), [(0, Amount::from_sat(12_345))]);
        let other = script_of("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH").unwrap();
        assert!(paid_to(&hex, &other).unwrap().is_empty());
        assert!(matches!(paid_to("zz", &mine), Err(Error::Backend(_))));
    }

    #[test]
    fn bad_address_is_validation_error() {
        assert!(matches!(script_of("nope"), Err(Error::Validation { .. })));
    }
}
