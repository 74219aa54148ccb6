#![warn(clippy::all)]
use std::io::{self, IsTerminal};
use std::time::Duration;

use chaincmd::dispatch::{Context, Dispatcher};
use chaincmd::registry::COMMANDS;
use chaincmd::resolve::{NoPrompt, Prompt, Terminal};
use chaincmd::rest::HttpBackend;
use chaincmd::rpc::{NodeKind, RpcNode};
use chaincmd::Config;
use clap::Parser;

use crate::cli::Args;

mod cli;

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();
    let args = Args::parse();

    let config = Config::load(&args.conf);
    let rpc_timeout = Duration::from_secs(args.rpc_timeout);
    let elements = RpcNode::connect(NodeKind::Elements, &config.elements, rpc_timeout);
    let bitcoin = RpcNode::connect(NodeKind::Bitcoin, &config.bitcoin, rpc_timeout);

    let prompt: Box<dyn Prompt> = if args.no_prompt || !io::stdin().is_terminal() {
        Box::new(NoPrompt)
    } else {
        Box::new(Terminal)
    };

    let mut ctx = Context {
        explorer: args.explorer,
        rest: Box::new(HttpBackend::new(Duration::from_secs(args.rest_timeout))?),
        elements,
        bitcoin,
        prompt,
        out: Box::new(io::stdout()),
    };
    Dispatcher::new(&COMMANDS).run(&mut ctx, &args.command)?;
    Ok(())
}
