//! Commands that talk to the elements and bitcoin nodes.
//!
//! Single calls map straight onto [`Handler::Rpc`](crate::registry::Handler::Rpc). The
//! rest are flows: a fixed sequence of calls where each step feeds the next. A flow stops
//! at the first failing call and nothing already sent is undone.

use bitcoin::Amount;
use serde_json::{json, Value};

use super::*;
use crate::dispatch::Context;
use crate::registry::{CommandSpec, ParameterSpec as P};
use crate::resolve::ResolvedArgs;
use crate::rpc::NodeKind::{self, Bitcoin, Elements};
use crate::types::{
    select_utxo, AddressInfo, BlockTxids, DecodedTx, HexResult, Issuance, IssuanceResult,
    PeginAddress, Unspent, WalletTx,
};

/// Blocks generated to confirm a transaction unless told otherwise
pub const DEFAULT_CONFIRMATIONS: &str = "105";
/// Blocks generated by `pegin`, on both chains
const PEGIN_CONFIRMATIONS: u64 = 105;
/// Fee paid by hand-built transactions
pub const FEE: Amount = Amount::from_sat(100_000);
/// Blocks until a coinbase output can be spent
const COINBASE_MATURITY: u64 = 100;
/// Upper bound on blocks mined by `generatefunds`
const MAX_FUNDING_BLOCKS: u64 = 10_000;
/// `maxtries` passed to `generatetoaddress`
const MAX_TRIES: u64 = 1_000_000;
/// Bounds passed to `listunspent`
const MIN_CONF: u64 = 0;
const MAX_CONF: u64 = 9_999_999;

pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::rpc("getsidechaininfo", Elements, "getsidechaininfo")
            .about("sidechain parameters of the elements node"),
        CommandSpec::flow("rpc", rpc_elements)
            .about("any call to the elements node, params given as json")
            .param(P::text("method"))
            .param(P::rest("params")),
        CommandSpec::flow("btc_rpc", rpc_bitcoin)
            .about("any call to the bitcoin node, params given as json")
            .alias("brpc")
            .param(P::text("method"))
            .param(P::rest("params")),
        CommandSpec::flow("sendtoaddress", |ctx, args| send_to_address(ctx, args, Elements))
            .alias("sndaddr")
            .param(P::text("address"))
            .param(P::amount("amount"))
            .param(P::number("nblocks").or(DEFAULT_CONFIRMATIONS)),
        CommandSpec::flow("btc_sendtoaddress", |ctx, args| send_to_address(ctx, args, Bitcoin))
            .alias("bsndaddr")
            .param(P::text("address"))
            .param(P::amount("amount"))
            .param(P::number("nblocks").or(DEFAULT_CONFIRMATIONS)),
        CommandSpec::flow("pegin", pegin_cmd)
            .about("move bitcoin into the sidechain and claim it")
            .alias("peg")
            .param(P::amount("amount"))
            .param(P::text("btc_address"))
            .param(P::text("elem_address")),
        CommandSpec::flow("pegin_generate", pegin_generate)
            .about("peg in amount + 1, then send amount to elem_address")
            .alias("peg2snd")
            .param(P::text("elem_address"))
            .param(P::amount("amount"))
            .param(P::text("btc_address"))
            .param(P::number("nblocks").or(DEFAULT_CONFIRMATIONS)),
        CommandSpec::flow("pegout", pegout)
            .about("send sidechain funds back to a bitcoin address")
            .param(P::text("btc_address"))
            .param(P::amount("amount")),
        CommandSpec::flow("validaddress", validate_elements_address)
            .alias("vaddr")
            .param(P::text("address").prompt("target address > ")),
        CommandSpec::flow("btc_validaddress", validate_bitcoin_address)
            .alias("bvaddr")
            .param(P::text("address").prompt("target address > ")),
        CommandSpec::flow("dumptransaction", |ctx, args| dump_transaction(ctx, args, Elements))
            .alias("dumptx")
            .param(P::text("txid").prompt("target txid > ")),
        CommandSpec::flow("btc_dumptransaction", |ctx, args| {
            dump_transaction(ctx, args, Bitcoin)
        })
        .alias("bdumptx")
        .param(P::text("txid").prompt("target txid > ")),
        CommandSpec::flow("unblindtransaction", unblind_transaction)
            .alias("unblindtx")
            .param(P::text("txid").prompt("target txid > ")),
        CommandSpec::flow("sendblindtx", send_blind_tx)
            .about("send a blinded transaction built from wallet funds")
            .alias("sndblind")
            .param(P::text("address"))
            .param(P::amount("amount")),
        CommandSpec::flow("sendissue", send_issue)
            .about("issue a new asset and its reissuance token")
            .alias("issue")
            .param(P::amount("asset_amount"))
            .param(P::amount("token_amount"))
            .param(P::flag("blind").or("true")),
        CommandSpec::flow("sendreissue", send_reissue)
            .about("reissue more of an asset using its token")
            .alias("reissue")
            .param(P::text("asset"))
            .param(P::amount("amount")),
        CommandSpec::flow("generatefunds", generate_funds)
            .about("mine blocks on the bitcoin node until address holds amount")
            .alias("bgenfund")
            .param(P::amount("amount"))
            .param(P::text("address"))
            .param(P::flag("sync").or("false")),
    ]
}

/// Amount reported by a node, in btc
fn btc(v: f64) -> Result<Amount> {
    Amount::from_btc(v).map_err(|e| Error::Backend(format!("bad amount {v} from node: {e}")))
}

fn rpc_elements(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    passthrough(ctx, args, Elements)
}

fn rpc_bitcoin(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    passthrough(ctx, args, Bitcoin)
}

/// Calls an arbitrary method, every remaining token parsed as json where it can be
fn passthrough(ctx: &mut Context, args: &ResolvedArgs, kind: NodeKind) -> Result<()> {
    let method = args.text("method")?;
    let params: Vec<Value> = args.list("params").iter().map(|s| resolve::loose_json(s)).collect();
    let v: Value = ctx.node(kind).call(method, &params)?;
    ctx.print(render_value(&v))
}

fn send_to_address(ctx: &mut Context, args: &ResolvedArgs, kind: NodeKind) -> Result<()> {
    let address = args.text("address")?;
    let amount = args.amount("amount")?;
    let nblocks = args.number("nblocks")?;
    send_and_confirm(ctx, kind, address, amount, nblocks)?;
    Ok(())
}

/// Sends `amount` to `address` and mines `nblocks` to that same address. Returns the txid.
fn send_and_confirm(
    ctx: &mut Context,
    kind: NodeKind,
    address: &str,
    amount: Amount,
    nblocks: u64,
) -> Result<String> {
    let node = ctx.node(kind);
    let txid: String = node.call("sendtoaddress", &[json!(address), json!(amount.to_btc())])?;
    let _: Value = node.call("generatetoaddress", &[json!(nblocks), json!(address)])?;
    let received: Value = node.call("getreceivedbyaddress", &[json!(address)])?;
    ctx.show("sendtoaddress", &json!(txid))?;
    ctx.show("getreceivedbyaddress", &received)?;
    Ok(txid)
}

fn pegin_cmd(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let amount = args.amount("amount")?;
    let btc_address = args.text("btc_address")?;
    let elem_address = args.text("elem_address")?;
    pegin(ctx, amount, btc_address, elem_address, PEGIN_CONFIRMATIONS)?;
    Ok(())
}

fn pegin_generate(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let elem_address = args.text("elem_address")?;
    let amount = args.amount("amount")?;
    let btc_address = args.text("btc_address")?;
    let nblocks = args.number("nblocks")?;
    // one extra coin covers the claim and send fees
    let pegged = amount
        .checked_add(Amount::ONE_BTC)
        .ok_or_else(|| Error::invalid("amount", &amount.to_btc().to_string(), "too large"))?;
    pegin(ctx, pegged, btc_address, elem_address, nblocks)?;
    send_and_confirm(ctx, Elements, elem_address, amount, nblocks)?;
    Ok(())
}

/// Sends `amount` to a fresh peg-in address on bitcoin, then claims it on elements.
/// Returns the claim txid.
fn pegin(
    ctx: &mut Context,
    amount: Amount,
    btc_address: &str,
    elem_address: &str,
    nblocks: u64,
) -> Result<String> {
    let pegin_addr: PeginAddress = ctx.elements.call("getpeginaddress", &[])?;
    ctx.show(
        "getpeginaddress",
        &json!({
            "mainchain_address": pegin_addr.mainchain_address,
            "claim_script": pegin_addr.claim_script,
        }),
    )?;

    let send_txid: String = ctx.bitcoin.call(
        "sendtoaddress",
        &[json!(pegin_addr.mainchain_address), json!(amount.to_btc())],
    )?;
    ctx.show("sendtoaddress", &json!(send_txid))?;
    let _: Value = ctx
        .bitcoin
        .call("generatetoaddress", &[json!(nblocks), json!(btc_address)])?;
    let funding: WalletTx = ctx.bitcoin.call("gettransaction", &[json!(send_txid)])?;
    let proof: String = ctx.bitcoin.call("gettxoutproof", &[json!([send_txid])])?;

    let claim: HexResult = ctx.elements.call(
        "createrawpegin",
        &[json!(funding.hex), json!(proof), json!(pegin_addr.claim_script)],
    )?;
    let decoded: DecodedTx = ctx.elements.call("decoderawtransaction", &[json!(claim.hex)])?;
    let recv_addr = decoded
        .first_address()
        .ok_or_else(|| Error::Backend(format!("peg-in claim {} pays no address", decoded.txid)))?
        .to_string();
    ctx.show("recv_addr", &json!(recv_addr))?;
    show_address(ctx, Elements, &recv_addr)?;

    let signed: HexResult = ctx
        .elements
        .call("signrawtransactionwithwallet", &[json!(claim.hex)])?;
    let claim_txid: String = ctx.elements.call("sendrawtransaction", &[json!(signed.hex)])?;
    ctx.show("sendrawtransaction", &json!(claim_txid))?;
    let _: Value = ctx
        .elements
        .call("generatetoaddress", &[json!(nblocks), json!(elem_address)])?;
    let balance: Value = ctx.elements.call("getbalance", &[])?;
    ctx.show("getbalance", &balance)?;
    Ok(claim_txid)
}

fn pegout(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let btc_address = args.text("btc_address")?;
    let amount = args.amount("amount")?;
    let txid: String = ctx
        .elements
        .call("sendtomainchain", &[json!(btc_address), json!(amount.to_btc())])?;
    ctx.show("sendtomainchain", &json!(txid))?;
    let miner: String = ctx.elements.call("getnewaddress", &[])?;
    let _: Value = ctx
        .elements
        .call("generatetoaddress", &[json!(2), json!(miner)])?;
    let balance: Value = ctx.elements.call("getbalance", &[])?;
    ctx.show("getbalance", &balance)
}

/// Shows `validateaddress`, `getaddressinfo` and `dumpprivkey` for `address`
fn show_address(ctx: &mut Context, kind: NodeKind, address: &str) -> Result<AddressInfo> {
    let node = ctx.node(kind);
    let validated: Value = node.call("validateaddress", &[json!(address)])?;
    let info: Value = node.call("getaddressinfo", &[json!(address)])?;
    let privkey: Value = node.call("dumpprivkey", &[json!(address)])?;
    ctx.show("validateaddress", &validated)?;
    ctx.show("addressinfo", &info)?;
    ctx.show("privkey", &privkey)?;
    Ok(serde_json::from_value(info)?)
}

fn validate_bitcoin_address(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    show_address(ctx, Bitcoin, args.text("address")?)?;
    Ok(())
}

fn validate_elements_address(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let address = args.text("address")?;
    let info = show_address(ctx, Elements, address)?;
    let received: Value = ctx.elements.call("getreceivedbyaddress", &[json!(address)])?;
    ctx.show("getreceivedbyaddress", &received)?;

    match ctx.elements.call::<Value>("dumpblindingkey", &[json!(address)]) {
        Ok(key) => ctx.show("blindingkey", &key),
        Err(Error::Rpc { code, message }) => {
            let Some(confidential) = info.distinct_confidential() else {
                log::warn!("no blinding key for {address}: {message} ({code})");
                return Ok(());
            };
            let validated: Value = ctx
                .elements
                .call("validateaddress", &[json!(confidential)])?;
            ctx.show("confidential addressinfo", &validated)?;
            let key: Value = ctx
                .elements
                .call("dumpblindingkey", &[json!(confidential)])?;
            ctx.show("blindingkey", &key)
        }
        Err(e) => Err(e),
    }
}

fn dump_transaction(ctx: &mut Context, args: &ResolvedArgs, kind: NodeKind) -> Result<()> {
    let txid = args.text("txid")?;
    let node = ctx.node(kind);
    let tx: WalletTx = node.call("gettransaction", &[json!(txid)])?;
    let decoded: Value = node.call("decoderawtransaction", &[json!(tx.hex)])?;
    ctx.show("tx.amount", &tx.amount)?;
    ctx.show("tx.details", &tx.details)?;
    ctx.show("decoderawtransaction", &decoded)
}

fn unblind_transaction(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let txid = args.text("txid")?;
    let tx: WalletTx = ctx.elements.call("gettransaction", &[json!(txid)])?;
    ctx.show("tx.amount", &tx.amount)?;
    ctx.show("tx.details", &tx.details)?;
    let unblinded: HexResult = ctx
        .elements
        .call("unblindrawtransaction", &[json!(tx.hex)])?;
    let decoded: Value = ctx
        .elements
        .call("decoderawtransaction", &[json!(unblinded.hex)])?;
    ctx.show("decoderawtransaction", &decoded)
}

/// Signs `hex` with the wallet, broadcasts it and mines one block to `miner`
fn sign_send_confirm(ctx: &mut Context, hex: &str, miner: &str) -> Result<String> {
    let signed: HexResult = ctx
        .elements
        .call("signrawtransactionwithwallet", &[json!(hex)])?;
    if signed.complete == Some(false) {
        return Err(Error::Backend("wallet could not sign every input".into()));
    }
    let txid: String = ctx.elements.call("sendrawtransaction", &[json!(signed.hex)])?;
    let _: Value = ctx
        .elements
        .call("generatetoaddress", &[json!(1), json!(miner)])?;
    ctx.show("sendrawtransaction", &json!(txid))?;
    Ok(txid)
}

fn send_blind_tx(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let address = args.text("address")?;
    let amount = args.amount("amount")?;
    let raw: String = ctx.elements.call(
        "createrawtransaction",
        &[json!([]), json!([{ address: amount.to_btc() }])],
    )?;
    let funded: HexResult = ctx.elements.call("fundrawtransaction", &[json!(raw)])?;
    let blinded: String = ctx
        .elements
        .call("blindrawtransaction", &[json!(funded.hex)])?;
    sign_send_confirm(ctx, &blinded, address)?;
    Ok(())
}

/// Asset id the elements wallet labels `bitcoin`
fn policy_asset(ctx: &Context) -> Result<String> {
    let labels: Value = ctx.elements.call("dumpassetlabels", &[])?;
    labels
        .get("bitcoin")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::Backend("bitcoin asset label not found".into()))
}

fn list_unspent(ctx: &Context) -> Result<Vec<Unspent>> {
    ctx.elements
        .call("listunspent", &[json!(MIN_CONF), json!(MAX_CONF)])
}

fn no_utxo(asset: &str) -> Error {
    Error::Backend(format!("no spendable utxo of {asset}, maybe low fee"))
}

fn outpoint(u: &Unspent) -> Value {
    json!({"txid": u.txid, "vout": u.vout})
}

fn send_issue(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let asset_amount = args.amount("asset_amount")?;
    let token_amount = args.amount("token_amount")?;
    let blind = args.flag("blind")?;

    let lbtc = policy_asset(ctx)?;
    let unspents = list_unspent(ctx)?;
    let utxo = select_utxo(&unspents, &lbtc, FEE.to_btc()).ok_or_else(|| no_utxo(&lbtc))?;
    log::info!("funding issuance from {}:{}", utxo.txid, utxo.vout);
    let change = btc(utxo.amount)? - FEE;

    let asset_address: String = ctx.elements.call("getnewaddress", &[])?;
    let token_address: String = ctx.elements.call("getnewaddress", &[])?;
    let change_address: String = ctx.elements.call("getnewaddress", &[])?;

    let raw: String = ctx.elements.call(
        "createrawtransaction",
        &[
            json!([outpoint(utxo)]),
            json!([{ change_address.as_str(): change.to_btc() }, { "fee": FEE.to_btc() }]),
        ],
    )?;
    let issued: Vec<IssuanceResult> = ctx.elements.call(
        "rawissueasset",
        &[
            json!(raw),
            json!([{
                "asset_amount": asset_amount.to_btc(),
                "asset_address": asset_address,
                "token_amount": token_amount.to_btc(),
                "token_address": token_address,
                "blind": blind,
            }]),
        ],
    )?;
    let issued = issued
        .into_iter()
        .next()
        .ok_or_else(|| Error::Backend("rawissueasset returned no issuance".into()))?;

    let hex = if blind {
        ctx.elements.call("blindrawtransaction", &[json!(issued.hex)])?
    } else {
        issued.hex.clone()
    };
    sign_send_confirm(ctx, &hex, &change_address)?;
    ctx.show(
        "issuance",
        &json!({
            "asset": issued.asset,
            "token": issued.token,
            "entropy": issued.entropy,
            "vin": issued.vin,
        }),
    )
}

fn send_reissue(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let asset = args.text("asset")?;
    let amount = args.amount("amount")?;

    let issuances: Vec<Issuance> = ctx.elements.call("listissuances", &[])?;
    let (issuance, token) = issuances
        .iter()
        .filter(|i| i.asset == asset && !i.isreissuance)
        .find_map(|i| Some((i, i.token.as_deref()?)))
        .ok_or_else(|| Error::Backend(format!("no issuance with a token found for {asset}")))?;
    log::debug!("reissuing from issuance {}", issuance.txid);

    let lbtc = policy_asset(ctx)?;
    let unspents = list_unspent(ctx)?;
    let token_utxo = select_utxo(&unspents, token, 0.0).ok_or_else(|| no_utxo(token))?;
    let fee_utxo = select_utxo(&unspents, &lbtc, FEE.to_btc()).ok_or_else(|| no_utxo(&lbtc))?;
    let change = btc(fee_utxo.amount)? - FEE;

    let asset_address: String = ctx.elements.call("getnewaddress", &[])?;
    let token_address: String = ctx.elements.call("getnewaddress", &[])?;
    let change_address: String = ctx.elements.call("getnewaddress", &[])?;

    let raw: String = ctx.elements.call(
        "createrawtransaction",
        &[
            json!([outpoint(token_utxo), outpoint(fee_utxo)]),
            json!([
                { token_address.as_str(): token_utxo.amount },
                { change_address.as_str(): change.to_btc() },
                { "fee": FEE.to_btc() },
            ]),
            json!(0),
            json!(false),
            json!({ token_address.as_str(): token }),
        ],
    )?;
    let reissued: HexResult = ctx.elements.call(
        "rawreissueasset",
        &[
            json!(raw),
            json!([{
                "asset_amount": amount.to_btc(),
                "asset_address": asset_address,
                "input_index": 0,
                "asset_blinder": token_utxo.assetblinder,
                "entropy": issuance.entropy,
            }]),
        ],
    )?;
    let blinded: String = ctx
        .elements
        .call("blindrawtransaction", &[json!(reissued.hex)])?;
    sign_send_confirm(ctx, &blinded, &change_address)?;
    Ok(())
}

/// Mines single blocks on the bitcoin node until the outputs paying `address` add up
/// to `amount`. Transactions are decoded locally.
fn generate_funds(ctx: &mut Context, args: &ResolvedArgs) -> Result<()> {
    let amount = args.amount("amount")?;
    let address = args.text("address")?;
    let sync = args.flag("sync")?;
    let script = tools::script_of(address)?;

    let mut total = Amount::ZERO;
    let mut mined = 0;
    while total < amount {
        if mined == MAX_FUNDING_BLOCKS {
            return Err(Error::Backend(format!(
                "{address} holds {} after {mined} blocks",
                total.to_btc()
            )));
        }
        let hashes: Vec<String> = ctx.bitcoin.call(
            "generatetoaddress",
            &[json!(1), json!(address), json!(MAX_TRIES)],
        )?;
        mined += 1;
        for hash in hashes {
            let block: BlockTxids = ctx.bitcoin.call("getblock", &[json!(hash)])?;
            for txid in &block.tx {
                let hex: String = ctx.bitcoin.call(
                    "getrawtransaction",
                    &[json!(txid), json!(false), json!(block.hash)],
                )?;
                for (vout, value) in tools::paid_to(&hex, &script)? {
                    ctx.print(format_args!("  utxo[{txid},{vout}] amount = {}", value.to_btc()))?;
                    total += value;
                }
            }
        }
    }
    if sync {
        let _: Value = ctx.bitcoin.call(
            "generatetoaddress",
            &[json!(COINBASE_MATURITY), json!(address), json!(MAX_TRIES)],
        )?;
    }
    ctx.print(format_args!("  totalAmount = {}", total.to_btc()))
}
