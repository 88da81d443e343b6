//! bankgate - command line front end for the banking session guard.
//!
//! Each invocation behaves like one page load: it opens the persisted
//! session store, runs the requested guard operation, and prints either the
//! result or the redirect the browser would have followed.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bankgate_core::api::{ApiError, AuthClient};
use bankgate_core::auth::{LoginError, LoginForm, Stored};
use bankgate_core::{Checkpoint, Config, FileStore, GuardOutcome, SessionGuard};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code when the guard redirects instead of letting the view proceed.
const EXIT_REDIRECT: u8 = 2;

#[derive(Parser)]
#[command(name = "bankgate")]
#[command(about = "Session and OTP guard for the online banking front end")]
struct Cli {
    /// Session store file (defaults to the user cache directory)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Application root URL, overriding config and environment
    #[arg(long, global = true)]
    domain_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in with user ID and PIN and record the session
    Login {
        #[arg(long)]
        user_id: Option<String>,
    },
    /// End the session and clear the store
    Logout,
    /// Check the session as a protected view would
    Check,
    /// Show session and OTP state without enforcing anything
    Status,
    /// One-time passcode challenge operations
    Otp {
        #[command(subcommand)]
        action: OtpAction,
    },
}

#[derive(Subcommand)]
enum OtpAction {
    /// Start a new challenge, replacing any existing one
    Issue,
    /// Check the challenge as an OTP-protected view would
    Check,
    /// Remove the challenge after the passcode was verified
    Consume,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            let mut c = Config::default();
            c.apply_env_overrides(|key| std::env::var(key).ok());
            c
        }
    };
    if let Some(url) = cli.domain_url {
        config.domain_url = url;
    }
    if let Some(path) = cli.store {
        config.store_path = Some(path);
    }
    debug!(?config, "Config loaded");

    let store_path = config.store_path()?;
    let store = match FileStore::open(&store_path) {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, path = %store_path.display(), "Failed to open session store");
            // Checks fail closed; everything else reports the error
            let targets = config.targets();
            return match cli.command {
                Command::Check => Ok(report(targets.store_unavailable(Checkpoint::Session, &e))),
                Command::Otp {
                    action: OtpAction::Check,
                } => Ok(report(
                    targets.store_unavailable(Checkpoint::OtpChallenge, &e),
                )),
                _ => Err(e).with_context(|| {
                    format!("Failed to open session store {}", store_path.display())
                }),
            };
        }
    };
    let mut guard = SessionGuard::new(store, config.targets());

    match cli.command {
        Command::Login { user_id } => login(&config, &mut guard, user_id).await,
        Command::Logout => {
            guard.end_session()?;
            println!("Logged out");
            Ok(ExitCode::SUCCESS)
        }
        Command::Check => Ok(report(guard.enforce_session())),
        Command::Status => {
            status(&guard)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Otp { action } => match action {
            OtpAction::Issue => {
                let challenge = guard.issue_otp_challenge()?;
                println!("OTP challenge issued at {}", challenge.issued_at);
                Ok(ExitCode::SUCCESS)
            }
            OtpAction::Check => Ok(report(guard.enforce_otp_challenge())),
            OtpAction::Consume => {
                guard.consume_otp_challenge()?;
                println!("OTP challenge consumed");
                Ok(ExitCode::SUCCESS)
            }
        },
    }
}

async fn login(
    config: &Config,
    guard: &mut SessionGuard<FileStore>,
    user_id: Option<String>,
) -> Result<ExitCode> {
    let user_id = match user_id {
        Some(id) => id,
        None => prompt_user_id()?,
    };
    let pin = rpassword::prompt_password("PIN: ")?;
    let form = LoginForm::new(user_id.trim(), pin);

    // Blank fields never reach the server
    if let Err(e) = form.validate() {
        eprintln!("{}", e);
        return Ok(ExitCode::FAILURE);
    }

    let client = AuthClient::new(&config.api_url)?;
    match client.login(&form).await {
        Ok(()) => {
            guard.establish_session(form.user_id())?;
            info!(user_id = %form.user_id(), "Login successful");
            println!("redirect: {}", guard.targets().homepage);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "Login failed");
            let message = if let Some(api) = e.downcast_ref::<ApiError>() {
                api.user_message()
            } else if let Some(form_err) = e.downcast_ref::<LoginError>() {
                form_err.to_string()
            } else {
                format!("Login failed: {}", e)
            };
            eprintln!("{}", message);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn prompt_user_id() -> Result<String> {
    print!("User ID: ");
    io::stdout().flush()?;

    let mut user_id = String::new();
    io::stdin().read_line(&mut user_id)?;
    Ok(user_id.trim().to_string())
}

fn report(outcome: GuardOutcome) -> ExitCode {
    match outcome {
        GuardOutcome::Proceed => {
            println!("ok");
            ExitCode::SUCCESS
        }
        GuardOutcome::Redirect(redirect) => {
            println!("redirect: {} ({})", redirect.target, redirect.reason);
            ExitCode::from(EXIT_REDIRECT)
        }
    }
}

fn status(guard: &SessionGuard<FileStore>) -> Result<()> {
    let now = guard.now_millis();

    match guard.session()? {
        Stored::Present(session) if session.is_expired(now) => {
            println!("session: {} (expired, not yet cleared)", session.user_id);
        }
        Stored::Present(session) => {
            println!(
                "session: {} ({}s remaining)",
                session.user_id,
                session.seconds_until_expiry(now)
            );
        }
        Stored::Invalid(raw) => println!("session: invalid timestamp {:?}", raw),
        Stored::Absent => println!("session: none"),
    }

    match guard.otp_challenge()? {
        Stored::Present(challenge) if challenge.is_expired(now) => {
            println!("otp: expired, not yet cleared");
        }
        Stored::Present(challenge) => {
            println!("otp: pending ({}s remaining)", challenge.seconds_until_expiry(now));
        }
        Stored::Invalid(raw) => println!("otp: invalid timestamp {:?}", raw),
        Stored::Absent => println!("otp: none"),
    }

    Ok(())
}
