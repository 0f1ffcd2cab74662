use clap::Parser;
use cloudforge::{run_file, run_interactive, Session, DEFAULT_LANGUAGE};
use code_exec::{CodeExecutionService, ExecConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Source file to run once; starts an interactive session when omitted
    file: Option<PathBuf>,

    /// Language of the file or the session (javascript, python)
    #[arg(short, long)]
    language: Option<String>,

    /// TOML file with session settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Python interpreter used for the hosted runtime
    #[arg(long)]
    python: Option<String>,

    /// Hold Python runs until the runtime has loaded
    #[arg(long)]
    wait_for_runtime: bool,

    /// Print the supported languages and exit
    #[arg(long)]
    list_languages: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExecConfig::from_file(path)?,
        None => ExecConfig::default(),
    };
    if let Some(python) = args.python {
        config = config.with_python_command(python);
    }
    // A one-shot run has nothing else to do while the runtime loads.
    if args.wait_for_runtime || args.file.is_some() {
        config = config.with_wait_for_runtime(true);
    }

    let service = CodeExecutionService::new(config).await?;

    if args.list_languages {
        for (language, strategy) in service.languages() {
            println!("{}\t{:?}", language, strategy);
        }
        return Ok(());
    }

    if let Some(file) = &args.file {
        let display = run_file(&service, file, args.language.as_deref()).await?;
        println!("{}", display);
        return Ok(());
    }

    let language = args.language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let mut session = Session::new(service, language, std::io::stdout());
    eprintln!(
        "CloudForge session [{}], :help for commands",
        session.language()
    );
    run_interactive(&mut session, tokio::io::BufReader::new(tokio::io::stdin())).await?;

    Ok(())
}
