//! `bb`: drive the Blessed Belly session lifecycle from a terminal.
//!
//! Runs the same `AuthContext` state machine and route guard as the web
//! client, with a reqwest gateway and a token file as durable storage.

mod gateway;
mod store;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use client::config::ApiConfig;
use client::net::error::AuthError;
use client::net::types::UserProfile;
use client::pages::signup::validate_signup_input;
use client::state::auth::{AuthContext, AuthState};
use client::util::guard::{GuardDecision, decide, requirement_for};
use client::util::poll::{PollOutcome, PollPolicy, poll_payment};
use tracing_subscriber::EnvFilter;

use crate::gateway::ReqwestGateway;
use crate::store::{FileSessionStore, default_token_path};

type CliAuth = AuthContext<ReqwestGateway, FileSessionStore, Rc<RefCell<AuthState>>>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("not signed in; run `bb login` first")]
    NotSignedIn,
    #[error("could not confirm the session; the stored token was kept")]
    SessionUnconfirmed,
    #[error("{0}")]
    Payment(&'static str),
}

#[derive(Parser, Debug)]
#[command(name = "bb", about = "Blessed Belly account CLI")]
struct Cli {
    /// API origin, e.g. https://api.blessedbelly.app
    #[arg(long, env = "BB_API_URL", default_value = "http://127.0.0.1:8000")]
    api_url: String,

    /// File holding the bearer token between invocations.
    #[arg(long, env = "BB_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "BB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "BB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in with Google. Needs the session id from a browser callback.
    Google {
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Check the stored session and print the current identity.
    Whoami,
    /// Sign out and forget the stored token.
    Logout,
    /// Print what the route guard does with a path for the current session.
    Access { path: String },
    /// Poll a checkout session until it is paid, expires, or times out.
    PaymentStatus {
        session_id: String,
        #[arg(long, default_value_t = 5)]
        attempts: u32,
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let gateway = ReqwestGateway::new(ApiConfig::new(&cli.api_url, ""))?;
    let store = FileSessionStore::new(cli.token_file.unwrap_or_else(default_token_path));
    tracing::debug!(api = %gateway.config().base_url, token_file = %store.path().display(), "starting");
    let auth: CliAuth = AuthContext::new(gateway, store, Rc::new(RefCell::new(AuthState::default())));

    match cli.command {
        Command::Login { email, password } => {
            let email = email.trim();
            if email.is_empty() || password.is_empty() {
                return Err(CliError::InvalidInput("Enter your email and password."));
            }
            let user = auth.login(email, &password).await?;
            print_identity(&user, &auth.state());
            Ok(())
        }
        Command::Register { name, email, password } => {
            let input = validate_signup_input(&name, &email, &password).map_err(CliError::InvalidInput)?;
            let user = auth.register(&input.name, &input.email, &input.password).await?;
            print_identity(&user, &auth.state());
            if !user.has_subscription {
                println!("next: subscribe on the pricing page to unlock the dashboard");
            }
            Ok(())
        }
        Command::Google { session_id } => {
            let Some(session_id) = session_id.filter(|id| !id.trim().is_empty()) else {
                auth.begin_external_login()?;
                return Ok(());
            };
            let user = auth.complete_external_login(session_id.trim()).await?;
            print_identity(&user, &auth.state());
            Ok(())
        }
        Command::Whoami => {
            auth.initialize().await;
            let state = auth.state();
            let Some(user) = state.user.clone() else {
                return Err(if state.credential.is_some() { CliError::SessionUnconfirmed } else { CliError::NotSignedIn });
            };
            print_identity(&user, &state);
            Ok(())
        }
        Command::Logout => {
            auth.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Access { path } => {
            auth.initialize().await;
            let decision = decide(&auth.state(), requirement_for(&path), &path);
            println!("{}", describe_decision(&decision));
            Ok(())
        }
        Command::PaymentStatus { session_id, attempts, interval_secs } => {
            run_payment_status(&auth, &session_id, attempts, interval_secs).await
        }
    }
}

async fn run_payment_status(auth: &CliAuth, session_id: &str, attempts: u32, interval_secs: u64) -> Result<(), CliError> {
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err(CliError::InvalidInput("No payment session found"));
    }
    let policy = PollPolicy { max_attempts: attempts.max(1), interval: Duration::from_secs(interval_secs) };
    let credential = auth.credential();
    let check = || auth.gateway().checkout_status(credential.as_deref(), session_id);
    let outcome = poll_payment(policy, check, tokio::time::sleep).await;

    if outcome != PollOutcome::Paid {
        return Err(CliError::Payment(outcome.message()));
    }
    println!("{}", outcome.message());
    auth.refresh().await;
    if let Some(user) = auth.state().user {
        print_identity(&user, &auth.state());
    }
    Ok(())
}

fn print_identity(user: &UserProfile, state: &AuthState) {
    println!("{} <{}>", user.name, user.email);
    println!("authenticated: {}", state.is_authenticated());
    println!("subscribed:    {}", state.has_subscription());
    println!("admin:         {}", state.is_admin());
}

fn describe_decision(decision: &GuardDecision) -> String {
    match (decision, decision.redirect_target()) {
        (_, Some(target)) => format!("redirect {target}"),
        (GuardDecision::Loading, None) => "loading".to_owned(),
        (_, None) => "render".to_owned(),
    }
}
