use anyhow::Context;
use bookswap_kernel::{settings::Settings, InitCtx};
use clap::{Parser, Subcommand};

/// Campus book-exchange service
#[derive(Debug, Parser)]
#[command(name = "bookswap", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API until Ctrl+C
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the resolved configuration as JSON
    Settings,
    /// Print the configured exchange places, default first
    Places,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().context("failed to load bookswap settings")?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            serve(settings)
        }
        Command::Settings => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        Command::Places => {
            for place in &settings.exchange.places {
                println!("{place}");
            }
            Ok(())
        }
    }
}

fn serve(settings: Settings) -> anyhow::Result<()> {
    bookswap_telemetry::init(&settings.telemetry)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async {
        let (registry, _state) = bookswap_app::build_app(&settings)?;
        registry
            .boot(&InitCtx {
                settings: &settings,
            })
            .await?;

        tracing::info!(modules = registry.len(), "bookswap CLI serving");
        let served = bookswap_http::start_server(&registry, &settings).await;
        registry.shutdown().await?;
        served
    })
}
