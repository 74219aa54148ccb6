use std::path::PathBuf;

use chaincmd::rest::{DEFAULT_EXPLORER, DEFAULT_REST_TIMEOUT};
use chaincmd::rpc::DEFAULT_RPC_TIMEOUT;
use clap::Parser;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Node connection file in elements.conf format
    #[clap(long, env = "CHAINCMD_CONF", default_value = "command.conf")]
    pub conf: PathBuf,
    /// Explorer host, or a base url including the scheme
    #[clap(long, env = "EXPLORER_HOST", default_value = DEFAULT_EXPLORER)]
    pub explorer: String,
    /// Explorer request timeout, in seconds
    #[clap(long, default_value_t = DEFAULT_REST_TIMEOUT.as_secs())]
    pub rest_timeout: u64,
    /// Node call timeout, in seconds
    #[clap(long, default_value_t = DEFAULT_RPC_TIMEOUT.as_secs())]
    pub rpc_timeout: u64,
    /// Fail instead of asking for missing parameters
    #[clap(long)]
    pub no_prompt: bool,
    /// Command and its arguments. Run without a command to list them all
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}
