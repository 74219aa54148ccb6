use std::fmt;

/// Explorer network, selected by the alias a command was invoked with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NetworkPrefix {
    #[default]
    Mainnet,
    Testnet,
    Liquid,
}

impl NetworkPrefix {
    /// All variants, in alias order
    pub const ALL: [NetworkPrefix; 3] = [Self::Mainnet, Self::Testnet, Self::Liquid];

    /// Explorer path prefix
    pub fn path_prefix(self) -> &'static str {
        match self {
            Self::Mainnet => "api",
            Self::Testnet => "testnet/api",
            Self::Liquid => "liquid/api",
        }
    }

    /// The conventional alias of `name` on this network: `gettx`, `tgettx`, `lgettx`
    pub fn alias_of(self, name: &str) -> String {
        match self {
            Self::Mainnet => name.to_string(),
            Self::Testnet => format!("t{name}"),
            Self::Liquid => format!("l{name}"),
        }
    }
}

impl fmt::Display for NetworkPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Liquid => "liquid",
        };
        f.write_str(s)
    }
}
