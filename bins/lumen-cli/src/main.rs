//! lumen-cli: Command-line front-end for the Lumen wallet.
//!
//! Generates keys, signs in with a secret key or an external signer, shows
//! the balance and payment history, and sends native payments. Session state
//! lives in a JSON store; secret keys are never written to it.

mod config;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use zeroize::Zeroizing;

use lumen_core::constants::Network;
use lumen_core::crypto::PublicKey;
use lumen_core::traits::KeyValueStore;
use lumen_net::{HorizonClient, HttpIntentTransport};
use lumen_wallet::keys::keypair_from_secret;
use lumen_wallet::{
    AccountReader, FileStore, PaymentResult, PaymentService, PaymentSummary, Session, Wallet, WalletFactory,
    WalletKind, abbreviate_public_key, generate_keys, page_count, paginate,
};

use crate::config::Config;

/// Lumen command-line wallet.
#[derive(Parser)]
#[command(name = "lumen-cli")]
#[command(version, about = "A light wallet for Stellar-style ledgers.")]
struct Cli {
    /// Network to sign for (testnet or public). Overrides LUMEN_NETWORK.
    #[arg(long, global = true)]
    network: Option<Network>,

    /// Horizon endpoint. Overrides LUMEN_HORIZON_URL.
    #[arg(long, global = true)]
    horizon_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new keypair.
    Generate,
    /// List the available wallets.
    Wallets,
    /// Sign in with a wallet.
    Login {
        #[command(subcommand)]
        wallet: LoginAction,
    },
    /// Show the signed-in account.
    Status,
    /// Show the native balance.
    Balance,
    /// Show the payment history.
    History(HistoryArgs),
    /// Send a native payment.
    Send(SendArgs),
    /// Forget the signed-in account.
    Logout,
}

#[derive(Subcommand)]
enum LoginAction {
    /// Sign in with a secret key (prompted if not given).
    Secret {
        /// Secret seed (S...). Prefer the prompt; arguments end up in shell history.
        #[arg(long)]
        secret: Option<String>,
    },
    /// Sign in through the Albedo external signer.
    Albedo,
}

#[derive(Args)]
struct HistoryArgs {
    /// Page to show, starting at 1.
    #[arg(short, long, default_value = "1")]
    page: usize,

    /// Payments per page.
    #[arg(long, default_value = "10")]
    per_page: usize,
}

#[derive(Args)]
struct SendArgs {
    /// Destination account (G...).
    #[arg(short, long)]
    to: String,

    /// Amount in lumens (e.g. 110 or 0.5).
    #[arg(short, long)]
    amount: String,

    /// Text memo, at most 28 bytes.
    #[arg(short, long, default_value = "")]
    memo: String,

    /// Fee in stroops (default: LUMEN_BASE_FEE).
    #[arg(short, long)]
    fee: Option<i64>,

    /// Validity window in seconds, 0 for none (default: LUMEN_TX_TIMEOUT_SECS).
    #[arg(long)]
    timeout: Option<i64>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

/// Shared handles built from the configuration.
struct App {
    config: Config,
    factory: WalletFactory,
    session: Session,
    ledger: Arc<HorizonClient>,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::open(&config.store_path)
                .with_context(|| format!("Failed to open store {}", config.store_path.display()))?,
        );
        let transport = Arc::new(
            HttpIntentTransport::new(&config.intent_url)
                .context("Failed to create intent transport")?,
        );
        let ledger = Arc::new(
            HorizonClient::new(&config.horizon_url).context("Failed to create Horizon client")?,
        );
        Ok(Self {
            factory: WalletFactory::new(store.clone(), transport),
            session: Session::new(store),
            ledger,
            config,
        })
    }

    fn reader(&self) -> AccountReader {
        AccountReader::new(self.ledger.clone())
    }

    fn signed_in_account(&self) -> Result<PublicKey> {
        self.session
            .public_key()
            .context("Failed to read session")?
            .context("Not signed in; run `lumen-cli login` first")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()
        .context("Failed to load configuration")?
        .with_overrides(cli.network, cli.horizon_url);

    if let Commands::Generate = cli.command {
        return generate();
    }

    info!(
        network = %config.network,
        horizon = %config.horizon_url,
        store = %config.store_path.display(),
        "lumen-cli starting"
    );
    let app = App::new(config)?;

    match cli.command {
        Commands::Generate => generate(),
        Commands::Wallets => list_wallets(&app),
        Commands::Login { wallet } => login(&app, wallet).await,
        Commands::Status => status(&app),
        Commands::Balance => balance(&app).await,
        Commands::History(args) => history(&app, args).await,
        Commands::Send(args) => send(&app, args).await,
        Commands::Logout => logout(&app),
    }
}

fn generate() -> Result<()> {
    let keys = generate_keys();
    println!("\n=== KEYPAIR GENERATED ===");
    println!("Public key: {}", keys.public_key());
    println!("Secret key: {}", keys.secret_seed().as_str());
    println!("\nWARNING: The secret key will NOT be shown again.");
    println!("Anyone with the secret key controls the account.");
    Ok(())
}

fn list_wallets(app: &App) -> Result<()> {
    for wallet in app.factory.create_all() {
        match wallet.extension() {
            Some(url) => println!("{:<10} {} ({url})", wallet.name(), wallet.friendly_name()),
            None => println!("{:<10} {}", wallet.name(), wallet.friendly_name()),
        }
    }
    Ok(())
}

async fn login(app: &App, action: LoginAction) -> Result<()> {
    let (mut wallet, secret) = match action {
        LoginAction::Secret { secret } => {
            let secret = match secret {
                Some(s) => Zeroizing::new(s),
                None => prompt_secret("Secret key")?,
            };
            (app.factory.create_kind(WalletKind::SecretKey), Some(secret))
        }
        LoginAction::Albedo => (app.factory.create_kind(WalletKind::Albedo), None),
    };

    let public_key = wallet
        .get_public_key(secret.as_ref().map(|s| s.as_str()))
        .await
        .with_context(|| format!("Failed to sign in with {}", wallet.friendly_name()))?;

    println!("Signed in with {} as {public_key}", wallet.friendly_name());
    Ok(())
}

fn status(app: &App) -> Result<()> {
    let account = app.signed_in_account()?;
    let wallet = app
        .session
        .active_wallet_name()
        .context("Failed to read session")?
        .unwrap_or_else(|| "unknown".to_string());
    println!("Account: {} ({account})", abbreviate_public_key(&account.account_id()));
    println!("Wallet:  {wallet}");
    println!("Network: {}", app.config.network);
    Ok(())
}

async fn balance(app: &App) -> Result<()> {
    let account = app.signed_in_account()?;
    let overview = app
        .reader()
        .account_overview(&account)
        .await
        .context("Failed to load balance")?;
    if overview.funded {
        println!("{} XLM", overview.balance);
    } else {
        println!("Account {account} is not funded yet.");
        println!("Send at least 1 XLM to it to activate it.");
    }
    Ok(())
}

async fn history(app: &App, args: HistoryArgs) -> Result<()> {
    let account = app.signed_in_account()?;
    let records = app
        .reader()
        .payments_history(&account)
        .await
        .context("Failed to load payment history")?;
    if records.is_empty() {
        println!("No payments yet.");
        return Ok(());
    }

    let pages = page_count(records.len(), args.per_page);
    let page = paginate(&records, args.page, args.per_page);
    if page.is_empty() {
        bail!("Page {} out of range (1..={pages})", args.page);
    }
    for r in page {
        let amount = r.amount.map(|a| a.to_compact_string()).unwrap_or_default();
        let from = r.source_account.as_deref().map(abbreviate_public_key).unwrap_or_default();
        let to = r.destination_account.as_deref().map(abbreviate_public_key).unwrap_or_default();
        let mark = if r.successful { "ok" } else { "failed" };
        println!(
            "{} {}  {:<15} {:>20} {:<12} -> {:<12} {mark}",
            r.date, r.time, r.kind, amount, from, to
        );
    }
    println!("Page {} of {pages}", args.page);
    Ok(())
}

async fn send(app: &App, args: SendArgs) -> Result<()> {
    let account = app.signed_in_account()?;
    let mut wallet: Wallet = app
        .factory
        .restore()
        .context("Failed to restore wallet")?
        .context("Not signed in; run `lumen-cli login` first")?;

    let signer_key = if wallet.is_signed_externally() {
        Zeroizing::new(String::new())
    } else {
        let secret = prompt_secret("Secret key")?;
        let signer = keypair_from_secret(&secret).context("Invalid secret key")?;
        if signer.public_key() != account {
            bail!("Secret key does not belong to the signed-in account {account}");
        }
        secret
    };

    let balance = app
        .reader()
        .get_balance(&account)
        .await
        .context("Failed to load source balance")?;

    let mut summary = PaymentSummary {
        signer_key: signer_key.to_string(),
        destination_public_key: args.to,
        amount: args.amount,
        memo: args.memo,
        time_out_in_seconds: args
            .timeout
            .unwrap_or(app.config.tx_timeout_secs as i64),
        fee: args.fee.unwrap_or(i64::from(app.config.base_fee)),
    };

    let service = PaymentService::new(app.ledger.clone(), app.config.network);
    let result = service.send_payment(&summary, &mut wallet, Some(balance)).await;
    summary.reset();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.message());
        match result.error_message() {
            Some(msg) => println!("  {msg}"),
            None => {
                if let PaymentResult::Success {
                    transaction_hash, ..
                } = &result
                {
                    println!("  Transaction: {transaction_hash}");
                }
            }
        }
    }
    if !result.is_success() {
        bail!("payment failed");
    }
    Ok(())
}

fn logout(app: &App) -> Result<()> {
    app.session.sign_out().context("Failed to sign out")?;
    println!("Signed out.");
    Ok(())
}

/// Prompt for a secret without echo.
fn prompt_secret(prompt: &str) -> Result<Zeroizing<String>> {
    rpassword::prompt_password(format!("{prompt}: "))
        .map(Zeroizing::new)
        .context("Failed to read secret")
}
