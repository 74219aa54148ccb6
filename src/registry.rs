//! Command table and lookup.
//!
//! Every command is described once by a [`CommandSpec`]. The registry indexes each
//! command under its canonical name and every alias, and each of those tokens carries
//! the [`NetworkPrefix`] it selects. Lookup is an exact, case-sensitive match.

use std::fmt::Write as _;

use bitcoin::{Amount, Denomination};
use lazy_static::lazy_static;

use super::*;
use crate::dispatch::Context;
use crate::resolve::{ArgValue, ResolvedArgs};
use crate::rest::RestRoute;
use crate::rpc::NodeKind;

lazy_static! {
    /// Every command this tool knows, built once on first use
    pub static ref COMMANDS: Registry = Registry::builtin();
}

/// A multi-step command. Flows write their own output through the [`Context`].
pub type Flow = fn(&mut Context, &ResolvedArgs) -> Result<()>;

/// What running a command does
#[derive(Clone)]
pub enum Handler {
    /// A single explorer request
    Rest(RestRoute),
    /// A single node call, resolved arguments become the positional params
    Rpc {
        node: NodeKind,
        method: &'static str,
    },
    /// A sequence of calls
    Flow(Flow),
}

/// How a raw token is validated and converted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Any non-empty string
    Text,
    /// A non-negative integer, digits only
    Number,
    /// A decimal amount of bitcoin
    Amount,
    /// `true` or `false`
    Flag,
    /// All remaining tokens
    Rest,
}

impl ParamKind {
    /// Parses `raw` for the parameter `name`.
    pub fn parse(self, name: &str, raw: &str) -> Result<ArgValue> {
        match self {
            Self::Text => Ok(ArgValue::Text(raw.to_string())),
            Self::Number => {
                if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(Error::invalid(name, raw, "expected a non-negative integer"));
                }
                raw.parse()
                    .map(ArgValue::Number)
                    .map_err(|e| Error::invalid(name, raw, e.to_string()))
            }
            Self::Amount => Amount::from_str_in(raw, Denomination::Bitcoin)
                .map(ArgValue::Amount)
                .map_err(|e| Error::invalid(name, raw, e.to_string())),
            Self::Flag => match raw {
                "true" => Ok(ArgValue::Flag(true)),
                "false" => Ok(ArgValue::Flag(false)),
                _ => Err(Error::invalid(name, raw, "expected true or false")),
            },
            Self::Rest => Ok(ArgValue::List(vec![raw.to_string()])),
        }
    }
}

/// A single positional parameter
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<&'static str>,
    pub prompt: Option<&'static str>,
}

impl ParameterSpec {
    fn new(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            required: kind != ParamKind::Rest,
            default: None,
            prompt: None,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, ParamKind::Text)
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, ParamKind::Number)
    }

    pub fn amount(name: &'static str) -> Self {
        Self::new(name, ParamKind::Amount)
    }

    pub fn flag(name: &'static str) -> Self {
        Self::new(name, ParamKind::Flag)
    }

    /// Collects every remaining token
    pub fn rest(name: &'static str) -> Self {
        Self::new(name, ParamKind::Rest)
    }

    /// Not prompted for, skipped when absent
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Optional, with a value used when absent
    pub fn or(mut self, default: &'static str) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    /// Custom prompt label
    pub fn prompt(mut self, label: &'static str) -> Self {
        self.prompt = Some(label);
        self
    }

    /// Text shown when asking for this parameter
    pub fn label(&self) -> String {
        match self.prompt {
            Some(s) => s.to_string(),
            None => format!("{} > ", self.name),
        }
    }

    /// Checks `raw` without keeping the result
    pub fn validate(&self, raw: &str) -> bool {
        self.kind.parse(self.name, raw).is_ok()
    }

    fn usage(&self) -> String {
        match (self.kind, self.required) {
            (ParamKind::Rest, _) => format!("[<{}>...]", self.name),
            (_, true) => format!("<{}>", self.name),
            (_, false) => format!("[<{}>]", self.name),
        }
    }
}

/// An additional token for a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub token: String,
    pub network: NetworkPrefix,
}

/// A command and everything needed to run it
#[derive(Clone)]
pub struct CommandSpec {
    pub name: &'static str,
    /// Network selected by the canonical name
    pub network: NetworkPrefix,
    pub aliases: Vec<Alias>,
    pub params: Vec<ParameterSpec>,
    pub handler: Handler,
    pub about: &'static str,
}

impl CommandSpec {
    pub fn new(name: &'static str, handler: Handler) -> Self {
        Self {
            name,
            network: NetworkPrefix::default(),
            aliases: vec![],
            params: vec![],
            handler,
            about: "",
        }
    }

    /// Explorer GET
    pub fn get(name: &'static str, template: &'static str) -> Self {
        Self::new(name, Handler::Rest(RestRoute::get(template)))
    }

    /// Single node call
    pub fn rpc(name: &'static str, node: NodeKind, method: &'static str) -> Self {
        Self::new(name, Handler::Rpc { node, method })
    }

    /// Multi-step command
    pub fn flow(name: &'static str, flow: Flow) -> Self {
        Self::new(name, Handler::Flow(flow))
    }

    pub fn about(mut self, s: &'static str) -> Self {
        self.about = s;
        self
    }

    pub fn param(mut self, p: ParameterSpec) -> Self {
        self.params.push(p);
        self
    }

    pub fn alias(mut self, token: &str) -> Self {
        self.aliases.push(Alias {
            token: token.to_string(),
            network: self.network,
        });
        self
    }

    /// Adds the `t` and `l` prefixed aliases for testnet and liquid
    pub fn on_all_networks(mut self) -> Self {
        for network in [NetworkPrefix::Testnet, NetworkPrefix::Liquid] {
            self.aliases.push(Alias {
                token: network.alias_of(self.name),
                network,
            });
        }
        self
    }

    /// The canonical name selects `network`
    pub fn only_on(mut self, network: NetworkPrefix) -> Self {
        self.network = network;
        self
    }

    /// Every token this command answers to, with its network
    pub fn tokens(&self) -> impl Iterator<Item = (&str, NetworkPrefix)> {
        std::iter::once((self.name, self.network))
            .chain(self.aliases.iter().map(|a| (a.token.as_str(), a.network)))
    }

    /// e.g. `gettxoutspend <txid> <vout>`
    pub fn usage_line(&self) -> String {
        let mut line = self.name.to_string();
        for p in &self.params {
            line.push(' ');
            line.push_str(&p.usage());
        }
        line
    }
}

/// Result of a successful lookup
#[derive(Clone, Copy)]
pub struct Lookup<'a> {
    pub spec: &'a CommandSpec,
    pub network: NetworkPrefix,
}

/// Read-only command index
pub struct Registry {
    commands: Vec<CommandSpec>,
    index: HashMap<String, (usize, NetworkPrefix)>,
}

impl Registry {
    /// Indexes `commands`. When two commands claim the same token the first one keeps it.
    pub fn new(commands: Vec<CommandSpec>) -> Self {
        let mut index = HashMap::new();
        for (i, spec) in commands.iter().enumerate() {
            for (token, network) in spec.tokens() {
                if index.contains_key(token) {
                    log::warn!("command token {token} registered twice, keeping the first");
                    continue;
                }
                index.insert(token.to_string(), (i, network));
            }
        }
        Self { commands, index }
    }

    /// The full command table
    pub fn builtin() -> Self {
        let mut commands = explorer::commands();
        commands.extend(node::commands());
        commands.extend(tools::commands());
        Self::new(commands)
    }

    pub fn lookup(&self, token: &str) -> Option<Lookup<'_>> {
        self.index.get(token).map(|&(i, network)| Lookup {
            spec: &self.commands[i],
            network,
        })
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// Number of tokens (names and aliases) indexed
    pub fn token_count(&self) -> usize {
        self.index.len()
    }

    /// Help text listing every command
    pub fn usage(&self) -> String {
        let mut s = String::from("usage:\n");
        for spec in &self.commands {
            let _ = write!(s, "  {}", spec.usage_line());
            if !spec.about.is_empty() {
                let _ = write!(s, "\n      {}", spec.about);
            }
            s.push('\n');
            if !spec.aliases.is_empty() {
                let aliases: Vec<String> = spec
                    .aliases
                    .iter()
                    .map(|a| {
                        if a.network == NetworkPrefix::Mainnet {
                            a.token.clone()
                        } else {
                            format!("{} ({})", a.token, a.network)
                        }
                    })
                    .collect();
                let _ = writeln!(s, "    - alias: {}", aliases.join(", "));
            }
        }
        s
    }
}
