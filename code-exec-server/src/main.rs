use clap::Parser;
use code_exec::ExecConfig;
use code_exec_server::{create_app, run_server};
use std::{net::SocketAddr, path::PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to listen on
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    addr: SocketAddr,

    /// TOML file with session settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Python interpreter used for the hosted runtime
    #[arg(long)]
    python: Option<String>,

    /// Hold Python runs until the runtime has loaded
    #[arg(long)]
    wait_for_runtime: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExecConfig::from_file(path)?,
        None => ExecConfig::default(),
    };
    if let Some(python) = args.python {
        config = config.with_python_command(python);
    }
    if args.wait_for_runtime {
        config = config.with_wait_for_runtime(true);
    }

    let app = create_app(config).await?;
    run_server(app, args.addr).await?;

    Ok(())
}
