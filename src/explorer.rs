//! Esplora explorer commands.
//!
//! Each command is a single request whose path comes from its template. Mainnet names
//! also answer to `t` and `l` prefixed aliases, asset commands exist on liquid only.

use crate::registry::{CommandSpec, Handler, ParameterSpec as P};
use crate::rest::RestRoute;
use crate::NetworkPrefix;

/// `name` on mainnet, testnet and liquid
fn get(name: &'static str, template: &'static str) -> CommandSpec {
    CommandSpec::get(name, template).on_all_networks()
}

/// `name` on liquid only
fn asset(name: &'static str, template: &'static str) -> CommandSpec {
    CommandSpec::get(name, template)
        .only_on(NetworkPrefix::Liquid)
        .param(P::text("asset"))
}

pub fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("sendtx", Handler::Rest(RestRoute::post_file("/tx", "file")))
            .on_all_networks()
            .param(P::text("file").prompt("tx hex file > ")),
        // transactions
        get("gettx", "/tx/{txid}").param(P::text("txid")),
        get("gettxstatus", "/tx/{txid}/status").param(P::text("txid")),
        get("gettxhex", "/tx/{txid}/hex").param(P::text("txid")),
        get("gettxproof", "/tx/{txid}/merkle-proof").param(P::text("txid")),
        get("gettxoutspends", "/tx/{txid}/outspends").param(P::text("txid")),
        get("gettxoutspend", "/tx/{txid}/outspend/{vout}")
            .param(P::text("txid"))
            .param(P::number("vout")),
        // addresses
        get("getaddr", "/address/{address}").param(P::text("address")),
        get("getaddrtxs", "/address/{address}/txs").param(P::text("address")),
        get("getaddrmempool", "/address/{address}/txs/mempool").param(P::text("address")),
        get("getaddrutxo", "/address/{address}/utxo").param(P::text("address")),
        get("getaddrchain", "/address/{address}/txs/chain[/{txid}]")
            .param(P::text("address"))
            .param(P::text("txid").optional()),
        // script hashes
        get("gethaddr", "/scripthash/{scripthash}").param(P::text("scripthash")),
        get("gethaddrtxs", "/scripthash/{scripthash}/txs").param(P::text("scripthash")),
        get("gethaddrmempool", "/scripthash/{scripthash}/txs/mempool")
            .param(P::text("scripthash")),
        get("gethaddrutxo", "/scripthash/{scripthash}/utxo").param(P::text("scripthash")),
        get("gethaddrchain", "/scripthash/{scripthash}/txs/chain[/{txid}]")
            .param(P::text("scripthash"))
            .param(P::text("txid").optional()),
        // blocks
        get("getblock", "/block/{blockhash}").param(P::text("blockhash")),
        get("getblockstatus", "/block/{blockhash}/status").param(P::text("blockhash")),
        get("getblocktxs", "/block/{blockhash}/txs[/{index}]")
            .param(P::text("blockhash"))
            .param(P::number("index").optional()),
        get("getblocktxids", "/block/{blockhash}/txids").param(P::text("blockhash")),
        get("getblocktxid", "/block/{blockhash}/txid/{index}")
            .param(P::text("blockhash"))
            .param(P::number("index")),
        get("getblockraw", "/block/{blockhash}/raw").param(P::text("blockhash")),
        get("getblockheight", "/block-height/{height}").param(P::number("height")),
        get("getblocks", "/blocks[/{height}]").param(P::number("height").optional()),
        get("getblocks_tip_height", "/blocks/tip/height"),
        get("getblocks_tip_hash", "/blocks/tip/hash"),
        // mempool
        get("getmempool", "/mempool"),
        get("getmempooltxids", "/mempool/txids"),
        get("getmempoolrecent", "/mempool/recent"),
        get("getfee-estimates", "/fee-estimates"),
        // issued assets
        asset("getasset", "/asset/{asset}"),
        asset("getassettxs", "/asset/{asset}/txs"),
        asset("getassetmempool", "/asset/{asset}/txs/mempool"),
        asset("getassettxschain", "/asset/{asset}/txs/chain[/{last_seen}]")
            .param(P::text("last_seen").optional()),
    ]
}
