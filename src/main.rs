use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use freelancedesk::channels::web::{GatewayState, start_server};
use freelancedesk::config::{Config, DatabaseConfig};
use freelancedesk::context::{AppContext, AuthSession};
use freelancedesk::db::{UpsertUserProfileParams, connect_from_config};

const DEFAULT_LOG_FILTER: &str = "freelancedesk=info,tower_http=warn";

#[derive(Parser, Debug)]
#[command(name = "freelancedesk")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP gateway (default).
    Serve {
        /// Overrides GATEWAY_HOST.
        #[arg(long)]
        host: Option<String>,
        /// Overrides GATEWAY_PORT.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply schema migrations and exit.
    Migrate {
        /// Migrate this local database file instead of the configured one.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = Config::from_env().context("invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Migrate { path } => {
            let database = match path {
                Some(path) => DatabaseConfig::local(path),
                None => config.database,
            };
            connect_from_config(&database)
                .await
                .context("database migration failed")?;
            tracing::info!("migrations applied");
            Ok(())
        }
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            serve(config).await
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let store = connect_from_config(&config.database)
        .await
        .context("failed to open database")?;

    let gateway = &config.gateway;
    let profile = store
        .upsert_user_profile(
            &gateway.user_id,
            &UpsertUserProfileParams {
                email: gateway.user_email.clone(),
                full_name: None,
                role: gateway.user_role,
            },
        )
        .await
        .context("failed to record user profile")?;

    let identity = AuthSession {
        user_id: profile.user_id,
        email: profile.email,
        role: profile.role,
    };
    let context = Arc::new(AppContext::new(&config.ui));
    context.session.sign_in(identity.clone());

    let addr: SocketAddr = format!("{}:{}", gateway.host, gateway.port)
        .parse()
        .with_context(|| format!("invalid gateway address {}:{}", gateway.host, gateway.port))?;
    let state = Arc::new(GatewayState::new(store, context, identity));
    let bound = start_server(
        addr,
        state.clone(),
        gateway.auth_token.expose_secret().to_string(),
    )
    .await?;

    if gateway.auth_token_generated {
        // Printed once so the operator can reach the API; never logged.
        println!(
            "Gateway auth token (set GATEWAY_AUTH_TOKEN to pin it): {}",
            gateway.auth_token.expose_secret()
        );
    }
    tracing::info!(addr = %bound, user_id = %gateway.user_id, "freelancedesk ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    state.shutdown().await;
    Ok(())
}
