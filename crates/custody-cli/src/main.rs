//! # custody CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Network subcommands share one [`custody_client::CustodyClient`] built
//! from `--api` (or `CUSTODY_API_URL`).

use std::future::Future;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use custody_client::CustodyClient;
use tracing_subscriber::EnvFilter;

use custody_cli::evidence::{run_count, run_get, run_submit, run_upload};
use custody_cli::evidence::{CountArgs, GetArgs, SubmitArgs, UploadArgs};
use custody_cli::hash::{run_hash, HashArgs};
use custody_cli::proof::{run_proof, ProofArgs};
use custody_cli::verify::{run_verify, run_watch, VerifyArgs, WatchArgs};

/// Chain-of-custody evidence CLI.
///
/// Hashes and uploads files, appends evidence records to the ledger,
/// verifies files against the reconciled feed, and checks proof bundles.
#[derive(Parser, Debug)]
#[command(name = "custody", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the custody API.
    #[arg(
        long,
        global = true,
        env = "CUSTODY_API_URL",
        default_value = custody_client::config::DEFAULT_API_URL
    )]
    api: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute content hashes locally.
    Hash(HashArgs),

    /// Upload a file to the content store.
    Upload(UploadArgs),

    /// Append an evidence record, optionally gated on a proof.
    Submit(SubmitArgs),

    /// Count a submitter's records.
    Count(CountArgs),

    /// Read a submitter's record by index.
    Get(GetArgs),

    /// Check whether a file, hash or commitment is on the ledger.
    Verify(VerifyArgs),

    /// Follow the reconciled feed.
    Watch(WatchArgs),

    /// Check or generate proof bundles.
    Proof(ProofArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = dispatch(&cli.api, cli.command);

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn dispatch(api: &str, command: Commands) -> anyhow::Result<u8> {
    match command {
        Commands::Hash(args) => run_hash(&args),
        Commands::Proof(args) => run_proof(&args),
        Commands::Upload(args) => with_client(api, |c| async move { run_upload(&c, &args).await }),
        Commands::Submit(args) => with_client(api, |c| async move { run_submit(&c, &args).await }),
        Commands::Count(args) => with_client(api, |c| async move { run_count(&c, &args).await }),
        Commands::Get(args) => with_client(api, |c| async move { run_get(&c, &args).await }),
        Commands::Verify(args) => with_client(api, |c| async move { run_verify(&c, &args).await }),
        Commands::Watch(args) => with_client(api, |c| async move { run_watch(&c, &args).await }),
    }
}

/// Run a networked subcommand on a fresh runtime.
fn with_client<F, Fut>(api: &str, run: F) -> anyhow::Result<u8>
where
    F: FnOnce(CustodyClient) -> Fut,
    Fut: Future<Output = anyhow::Result<u8>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let client = custody_cli::connect(api)?;
        run(client).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const ALICE: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parse_verify_requires_one_query() {
        assert!(Cli::try_parse_from(["custody", "verify"]).is_err());
        assert!(
            Cli::try_parse_from(["custody", "verify", "--hash", "0x1", "--commitment", "1"])
                .is_err()
        );
        let cli = Cli::try_parse_from(["custody", "verify", "--commitment", "42"]).unwrap();
        assert!(matches!(cli.command, Commands::Verify(_)));
    }

    #[test]
    fn cli_parse_global_api_and_verbosity() {
        let cli = Cli::try_parse_from([
            "custody",
            "-vv",
            "--api",
            "http://ledger:9000",
            "count",
            "--submitter",
            ALICE,
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.api, "http://ledger:9000");
    }

    #[test]
    fn cli_parse_submit_needs_hash_or_file() {
        let base = ["custody", "submit", "--submitter", ALICE, "--metadata", "m"];
        assert!(Cli::try_parse_from(base).is_err());
        let mut with_hash = base.to_vec();
        with_hash.extend(["--hash", "0xabc"]);
        assert!(Cli::try_parse_from(with_hash).is_ok());
    }

    #[test]
    fn cli_parse_proof_mock_inputs() {
        let cli = Cli::try_parse_from(["custody", "proof", "mock", "--inputs", "1,2,3"]).unwrap();
        if let Commands::Proof(args) = cli.command {
            match args.command {
                custody_cli::proof::ProofCommand::Mock { inputs, out } => {
                    assert_eq!(inputs, vec!["1", "2", "3"]);
                    assert!(out.is_none());
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }
}
