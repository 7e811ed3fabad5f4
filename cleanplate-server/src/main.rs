use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod context;
mod error;
mod routes;
mod uploads;

use context::ServerContext;

#[derive(Parser, Debug, Clone)]
#[command(name = "cleanplate")]
#[command(author, version, about = "CleanPlate - clean-plate reward server")]
pub struct Args {
    /// Address to which the server will bind
    #[arg(long, default_value = "0.0.0.0:5000")]
    pub bind_addr: String,

    /// Postgres connection URL. Falls back to $DATABASE_URL.
    #[arg(long)]
    pub database_url: Option<String>,

    /// Directory for uploaded plate images
    #[arg(long, default_value = "uploads")]
    pub uploads_dir: String,

    /// Simulated processing delay of the stub plate verifier, in
    /// milliseconds
    #[arg(long, default_value_t = 1500)]
    pub verifier_delay_ms: u64,
}

impl Args {
    /// CLI flag wins, then the environment (including `.env`), then the
    /// local default.
    pub fn resolved_database_url(&self) -> String {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| "postgres://cleanplate@localhost:5432/cleanplate".to_string())
    }
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("cleanplate=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!(
        "CleanPlate starting. bind={} uploads_dir={}",
        args.bind_addr, args.uploads_dir
    );

    let ctx = match ServerContext::new(&args).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Failed to initialize server context: {:?}", e);
            return Err(e.into());
        }
    };

    let app = routes::router(ctx);

    let listener = TcpListener::bind(&args.bind_addr).await?;
    info!("Server running on {}", args.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
