//! VFT command-line client.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use vft_client::{
    Account, ClientConfig, NotificationSink, PendingTransaction, RpcChannel, StaticAccount,
    TokenClient, WsEventTransport,
};
use vft_crypto::{encode_ss58, is_valid_address, normalize_address, MAX_SS58_PREFIX};
use vft_types::{ProgramId, Receipt, TokenError};
use vft_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "vft", about = "Client for a VFT fungible-token program")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "VFT_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-RPC gateway URL.
    #[arg(long, env = "VFT_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// WebSocket URL for program events.
    #[arg(long, env = "VFT_WS_URL")]
    ws_url: Option<String>,

    /// Token program id (0x-prefixed hex).
    #[arg(long, env = "VFT_PROGRAM_ID")]
    program_id: Option<ProgramId>,

    /// Account to act as (hex or SS58).
    #[arg(long, env = "VFT_ACCOUNT")]
    account: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VFT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VFT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Offline address tools.
    Address {
        #[command(subcommand)]
        action: AddressAction,
    },
    /// Print name, symbol, decimals and total supply.
    Metadata,
    /// Print the balance of an account.
    Balance { address: String },
    /// Mint to the active account.
    Mint {
        #[arg(long)]
        amount: Option<String>,
    },
    /// Burn from the active account.
    Burn {
        #[arg(long)]
        amount: Option<String>,
    },
    /// Transfer from the active account.
    Transfer { to: String, amount: String },
    /// Print every token event until Ctrl-C.
    Watch,
}

#[derive(clap::Subcommand)]
enum AddressAction {
    /// Exit non-zero unless the input is a valid hex or SS58 address.
    Validate { input: String },
    /// Print the canonical 0x-hex form.
    Hex { input: String },
    /// Print the SS58 form under a network prefix.
    Ss58 {
        input: String,
        #[arg(long)]
        prefix: Option<u16>,
    },
}

/// Prints notices for the terminal: progress and successes to stdout,
/// errors to stderr.
struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn success(&self, message: &str) {
        println!("{message}");
    }

    fn error(&self, message: &str) {
        eprintln!("error: {message}");
    }
}

type Client = TokenClient<RpcChannel, StaticAccount, WsEventTransport>;

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.gateway_url {
        config.gateway_url = url.clone();
    }
    if let Some(url) = &cli.ws_url {
        config.ws_url = url.clone();
    }
    if let Some(program_id) = cli.program_id {
        config.program_id = Some(program_id);
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    config.validate()?;
    Ok(config)
}

fn connect(config: &ClientConfig, account: Option<&str>) -> anyhow::Result<Client> {
    let account = account
        .map(Account::from_input)
        .transpose()
        .context("--account")?;
    let mut channel = RpcChannel::from_config(config)?;
    if let Some(account) = &account {
        channel = channel.with_account(account.decoded);
    }
    let program_id = config.require_program_id()?;
    tracing::debug!(%program_id, gateway = %config.gateway_url, "client configured");

    Ok(TokenClient::new(
        program_id,
        Arc::new(channel),
        Arc::new(StaticAccount::new(account)),
        Arc::new(WsEventTransport::from_config(config)),
        Arc::new(ConsoleNotifier),
    )
    .with_default_amounts(config.mint_amount.clone(), config.burn_amount.clone()))
}

fn address_command(action: AddressAction, default_prefix: u16) -> anyhow::Result<()> {
    match action {
        AddressAction::Validate { input } => {
            if !is_valid_address(&input) {
                bail!("not a valid address: {input}");
            }
            println!("valid");
        }
        AddressAction::Hex { input } => {
            println!("{}", normalize_address(&input)?);
        }
        AddressAction::Ss58 { input, prefix } => {
            let prefix = prefix.unwrap_or(default_prefix);
            if prefix > MAX_SS58_PREFIX {
                bail!("ss58 prefix {prefix} exceeds {MAX_SS58_PREFIX}");
            }
            println!("{}", encode_ss58(&normalize_address(&input)?, prefix));
        }
    }
    Ok(())
}

fn print_receipt(receipt: &Receipt) {
    if let Some(block) = &receipt.block_hash {
        println!("included in block {block}");
    }
}

/// Wait for a submission. Failures have already gone to the notifier, so
/// they only decide the exit status here.
async fn finish(submitted: Result<PendingTransaction, TokenError>) -> bool {
    let outcome = match submitted {
        Ok(pending) => pending.await,
        Err(err) => Err(err),
    };
    match outcome {
        Ok(receipt) => {
            print_receipt(&receipt);
            true
        }
        Err(err) => {
            tracing::debug!(%err, "submission failed");
            false
        }
    }
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level);

    let Cli {
        command, account, ..
    } = cli;

    match command {
        Command::Address { action } => address_command(action, config.ss58_prefix)?,
        Command::Metadata => {
            let client = connect(&config, account.as_deref())?;
            let metadata = client.load_metadata().await;
            println!("name:         {}", or_dash(metadata.name));
            println!("symbol:       {}", or_dash(metadata.symbol));
            println!("decimals:     {}", or_dash(metadata.decimals));
            println!("total supply: {}", or_dash(metadata.total_supply));
        }
        Command::Balance { address } => {
            let client = connect(&config, account.as_deref())?;
            let balance = client.balances().check(&address).await?;
            println!("{balance}");
        }
        Command::Mint { amount } => {
            let client = connect(&config, account.as_deref())?;
            if !finish(client.mint(amount.as_deref())).await {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Burn { amount } => {
            let client = connect(&config, account.as_deref())?;
            if !finish(client.burn(amount.as_deref())).await {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Transfer { to, amount } => {
            let client = connect(&config, account.as_deref())?;
            if !finish(client.transfer(&to, &amount)).await {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Watch => {
            let client = connect(&config, account.as_deref())?;
            let reconciler = client.event_reconciler(client.notifying_callbacks());
            reconciler.activate().await?;
            tracing::info!(program_id = %client.program_id(), "watching events, Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            reconciler.deactivate();
        }
    }

    Ok(ExitCode::SUCCESS)
}
