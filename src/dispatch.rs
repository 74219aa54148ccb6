//! Runs one command: lookup, argument resolution, execution, rendering.

use std::fmt::Display;
use std::fs;
use std::io::Write;

use serde_json::Value;

use super::*;
use crate::registry::{Handler, Lookup, Registry};
use crate::resolve::{Prompt, ResolvedArgs};
use crate::rest::{RestBackend, RestRoute};
use crate::rpc::NodeKind;

/// Everything a command may use. Built once in `main`.
pub struct Context {
    /// Explorer host, or base url with scheme
    pub explorer: String,
    pub rest: Box<dyn RestBackend>,
    pub elements: RpcNode,
    pub bitcoin: RpcNode,
    pub prompt: Box<dyn Prompt>,
    pub out: Box<dyn Write>,
}

impl Context {
    pub fn node(&self, kind: NodeKind) -> &RpcNode {
        match kind {
            NodeKind::Elements => &self.elements,
            NodeKind::Bitcoin => &self.bitcoin,
        }
    }

    /// Writes one line of output
    pub fn print(&mut self, s: impl Display) -> Result<()> {
        writeln!(self.out, "{s}")?;
        Ok(())
    }

    /// Writes a labelled result, `label =>` then the rendered value
    pub fn show(&mut self, label: &str, v: &Value) -> Result<()> {
        writeln!(self.out, "{label} =>\n{}", render_value(v))?;
        Ok(())
    }
}

/// Progress of a single invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ParsingCommand,
    ResolvingArgs,
    Executing,
    Rendering,
    Done,
}

/// Routes command lines through a [`Registry`]
pub struct Dispatcher<'r> {
    registry: &'r Registry,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Runs the command line `argv` (command name first, without the program name).
    ///
    /// Unknown commands print the usage text. Every failure is returned, so the caller
    /// only has to map `Err` to a failing exit status.
    pub fn run(&self, ctx: &mut Context, argv: &[String]) -> Result<()> {
        let mut stage = Stage::Idle;
        let res = self.step(ctx, argv, &mut stage);
        match &res {
            Ok(()) => log::debug!("{:?}", Stage::Done),
            Err(e) => log::debug!("failed while {stage:?}: {e}"),
        }
        res
    }

    fn step(&self, ctx: &mut Context, argv: &[String], stage: &mut Stage) -> Result<()> {
        *stage = Stage::ParsingCommand;
        let token = argv.first().map(String::as_str).unwrap_or_default();
        let Some(Lookup { spec, network }) = self.registry.lookup(token) else {
            write!(ctx.out, "{}", self.registry.usage())?;
            return Err(Error::UnknownCommand(token.to_string()));
        };
        log::debug!("{token} -> {} ({network})", spec.name);

        *stage = Stage::ResolvingArgs;
        let args = match resolve::resolve(spec, &argv[1..], ctx.prompt.as_mut()) {
            Ok(args) => args,
            Err(e) => {
                ctx.print(format_args!("usage: {}", spec.usage_line()))?;
                return Err(e);
            }
        };

        *stage = Stage::Executing;
        match &spec.handler {
            Handler::Rest(route) => {
                let result = request(ctx, route, network, &args)?;
                *stage = Stage::Rendering;
                let rendered = result.rendered();
                if !result.is_success() {
                    log::error!("{}: status {}", spec.name, result.status);
                    return Err(Error::Rest {
                        status: result.status,
                        body: rendered.to_string(),
                    });
                }
                ctx.print(rendered)
            }
            Handler::Rpc { node, method } => {
                let v: Value = ctx.node(*node).call(method, &args.to_params())?;
                *stage = Stage::Rendering;
                ctx.print(render_value(&v))
            }
            Handler::Flow(flow) => flow(ctx, &args),
        }
    }
}

/// Issues the explorer request for `route`
fn request(
    ctx: &Context,
    route: &RestRoute,
    network: NetworkPrefix,
    args: &ResolvedArgs,
) -> Result<rest::RequestResult> {
    let path = rest::expand(route.template, args)?;
    let url = rest::explorer_url(&ctx.explorer, network, &path);
    log::info!("url = {url}");

    let result = match route.post_file {
        None => ctx.rest.get(&url)?,
        Some(param) => {
            let file = args.text(param)?;
            let hex = fs::read_to_string(file)?.trim().to_string();
            if hex.is_empty() {
                return Err(Error::invalid(param, file, "file holds no transaction hex"));
            }
            ctx.rest.post(&url, hex, "text/plain")?
        }
    };
    log::info!("status = {}", result.status);
    Ok(result)
}
