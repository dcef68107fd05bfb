//! # CLI Interface
//!
//! Defines the command-line argument structure for `ctoken-node` using
//! `clap` derive. Supports five subcommands: `run`, `call`, `show`,
//! `status`, and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ctoken_protocol::config::{DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT};

use crate::logging::LogFormat;

/// Confidential token ledger node.
///
/// Hosts a single confidential token ledger, serves it over JSON-RPC and
/// REST, and exposes Prometheus metrics. Proofs are checked by the
/// hash-bound devnet oracle.
#[derive(Parser, Debug)]
#[command(
    name = "ctoken-node",
    about = "Confidential token ledger node",
    version,
    propagate_version = true
)]
pub struct CtokenNodeCli {
    /// Log output format.
    #[arg(long, env = "CTOKEN_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node and serve the API.
    Run(RunArgs),
    /// Execute one ledger request against the local database and exit.
    Call(CallArgs),
    /// Print an account or the ledger summary from the local database.
    Show(ShowArgs),
    /// Query the status of a running node via its API.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Location of the ledger database, shared by every offline subcommand.
#[derive(Args, Debug, Clone)]
pub struct DataDirArg {
    /// Directory holding the ledger database. Created on first use.
    #[arg(long, short = 'd', env = "CTOKEN_DATA_DIR", default_value = "ctoken-data")]
    pub data_dir: PathBuf,
}

impl DataDirArg {
    /// Path of the sled database inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("db")
    }
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub data: DataDirArg,

    /// Port for the JSON-RPC and REST API.
    #[arg(long, env = "CTOKEN_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "CTOKEN_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,
}

/// Arguments for the `call` subcommand.
#[derive(Args, Debug)]
pub struct CallArgs {
    #[command(flatten)]
    pub data: DataDirArg,

    /// Account the request is executed as.
    #[arg(long, short = 's')]
    pub sender: String,

    /// Transaction hash stamped on created tokens. Derived when omitted.
    #[arg(long)]
    pub tx_hash: Option<String>,

    /// Request as inline JSON: `{"method": ..., "params": {...}}`.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub input: Option<String>,

    /// Read the request JSON from a file instead.
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}

/// Arguments for the `show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub data: DataDirArg,

    /// Account to print. Prints the ledger summary when omitted.
    #[arg(long, short = 'a')]
    pub account: Option<String>,
}

/// Arguments for the `status` subcommand.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// `host:port` of the running node's API.
    #[arg(long, default_value_t = format!("127.0.0.1:{DEFAULT_RPC_PORT}"))]
    pub rpc_addr: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        CtokenNodeCli::command().debug_assert();
    }

    #[test]
    fn call_requires_input_or_file() {
        assert!(CtokenNodeCli::try_parse_from(["ctoken-node", "call", "-s", "alice"]).is_err());

        let cli = CtokenNodeCli::try_parse_from([
            "ctoken-node",
            "call",
            "-s",
            "alice",
            "--input",
            r#"{"method":"rangeproofVerify","params":{}}"#,
        ])
        .unwrap();
        match cli.command {
            Commands::Call(args) => {
                assert_eq!(args.sender, "alice");
                assert!(args.input.is_some());
                assert_eq!(args.data.db_path(), PathBuf::from("ctoken-data").join("db"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn log_format_is_global() {
        let cli =
            CtokenNodeCli::try_parse_from(["ctoken-node", "show", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
