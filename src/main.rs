use anyhow::{Context, Result};
use chatrelay::{ChatMessage, Config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(about = "LLM chat broker with credential rotation, provider fallback and tools", long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,

    /// Print the tool catalog as JSON
    Tools,

    /// Send a single prompt through the router and print the answer
    Ask {
        #[arg(value_name = "PROMPT")]
        prompt: String,

        /// Let the model call tools
        #[arg(long)]
        tools: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(Config::default_path);

    let config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        Config::from_env().with_context(|| {
            format!(
                "Config file not found at {} and environment is incomplete",
                config_path.display()
            )
        })?
    };

    init_logging(&config.logging.level, &config.logging.format)?;

    tracing::info!("chatrelay starting...");
    if config_path.exists() {
        tracing::info!("Config loaded from: {}", config_path.display());
    } else {
        tracing::info!("Config loaded from environment");
    }

    match cli.command {
        Some(Commands::Serve) | None => {
            chatrelay::run(config).await?;
        }
        Some(Commands::Tools) => {
            let tools = chatrelay::ToolRegistry::builtin().list_tools();
            println!("{}", serde_json::to_string_pretty(&tools)?);
        }
        Some(Commands::Ask { prompt, tools }) => {
            let orchestrator = chatrelay::build_orchestrator(&config)?;
            let mut conversation = vec![ChatMessage::user(prompt)];
            let result = orchestrator.handle(&mut conversation, tools).await?;
            println!("{}", result.content);
            tracing::info!(provider = %result.model_label, finish_reason = %result.finish_reason, "Answered");
        }
    }

    Ok(())
}

fn init_logging(level: &str, format: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
