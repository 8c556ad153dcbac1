use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_parser::config::Config;
use resume_parser::routes::build_router;
use resume_parser::state::AppState;
use resume_parser::ResumeParser;

#[derive(Parser)]
#[command(name = "resume-parser")]
#[command(about = "Extract name, email and skills from resumes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Parse resume files and print the extracted fields as JSON
    Parse {
        /// Files to parse (.pdf, .docx, .doc, .txt)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting resume-parser v{}", env!("CARGO_PKG_VERSION"));

    let parser = ResumeParser::new(&config.extraction, &config.strategy_factory())
        .context("failed to build the extraction pipeline")?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve(parser, config, port).await,
        Commands::Parse { files } => {
            parse_files(&parser, &files).await;
            Ok(())
        }
    }
}

async fn serve(parser: ResumeParser, config: Config, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.port);
    let state = AppState::new(parser, config);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// One JSON document per file on stdout; a failing file is reported and
/// skipped.
async fn parse_files(parser: &ResumeParser, files: &[PathBuf]) {
    for file in files {
        match parser.parse_resume(file).await {
            Ok(data) => {
                println!("{}", data.to_json());
            }
            Err(e) => {
                error!("Failed to parse {}: {}", file.display(), e);
                eprintln!("{}: {}", file.display(), e);
            }
        }
    }
}
