//! messenger-relay: Facebook Messenger to chat-completion relay
//!
//! Usage:
//!   messenger-relay                  - Start the webhook server
//!   messenger-relay --config <path>  - Start with an explicit config file
//!   messenger-relay --help           - Show help

use std::path::PathBuf;
use std::sync::Arc;

use relay_core::{CompletionClient, Config, ContextDocument};
use relay_facebook::{FacebookApi, MessengerHandler, WebhookState};
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq)]
enum RunMode {
    /// Serve webhooks
    Server { config_path: Option<PathBuf> },
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1)).map_err(|e| anyhow::anyhow!(e))?;

    let config_path = match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("messenger-relay {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server { config_path } => config_path,
    };

    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::load(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting messenger-relay...");
    tracing::info!("Model: {}", config.llm.model);

    let context = ContextDocument::load(&config.context.path)
        .map_err(|e| anyhow::anyhow!("Failed to load context: {}", e))?;
    if context.is_fallback() {
        tracing::warn!(
            "No product information at {}; replies will be generated without it",
            config.context.path
        );
    }

    run_server(config, context).await
}

/// Parse command line arguments
fn parse_args<I>(args: I) -> Result<RunMode, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--config requires a file path".to_string())?;
                config_path = Some(PathBuf::from(path));
            }
            other => return Err(format!("unknown argument: {} (try --help)", other)),
        }
    }

    Ok(RunMode::Server { config_path })
}

/// Print help message
fn print_help() {
    println!("messenger-relay - Facebook Messenger to chat-completion relay");
    println!();
    println!("Usage:");
    println!("  messenger-relay                  Start the webhook server");
    println!("  messenger-relay --config <path>  Read settings from a TOML file");
    println!("  messenger-relay --help           Show this help message");
    println!("  messenger-relay --version        Show version");
    println!();
    println!("Environment Variables:");
    println!("  FACEBOOK_VERIFY_TOKEN       Webhook verify token (required)");
    println!("  FACEBOOK_PAGE_ACCESS_TOKEN  Page access token (required)");
    println!("  OPENAI_API_KEY              Completion API key (required)");
    println!("  OPENAI_MODEL                Model name (default: gpt-3.5-turbo)");
    println!("  OPENAI_BASE_URL             Completion API endpoint");
    println!("  FACEBOOK_GRAPH_API_URL      Graph API endpoint");
    println!("  CONTEXT_PATH                Product information file (default: docs/info.md)");
    println!("  HOST / PORT                 Listen address (default: 0.0.0.0:5000)");
    println!("  HTTP_TIMEOUT_SECS           Outbound request timeout (default: 30)");
}

/// Run the webhook server until Ctrl+C
async fn run_server(config: Config, context: ContextDocument) -> anyhow::Result<()> {
    let timeout = config.http_timeout();

    let completion_client = CompletionClient::new(&config.llm, timeout)
        .map_err(|e| anyhow::anyhow!("Failed to create completion client: {}", e))?;
    let facebook_api = FacebookApi::new(&config.facebook, timeout)
        .map_err(|e| anyhow::anyhow!("Failed to create Facebook client: {}", e))?;

    let handler = MessengerHandler::new(
        Arc::new(completion_client),
        Arc::new(facebook_api),
        context,
    );
    let state = WebhookState::new(config.facebook.verify_token.clone(), Arc::new(handler));

    let addr = config.bind_addr();
    let mut server =
        tokio::spawn(async move { relay_facebook::start_webhook_server(state, &addr).await });

    tracing::info!("messenger-relay initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down...");
            server.abort();
        }
        result = &mut server => {
            match result {
                Ok(Ok(())) => tracing::warn!("Webhook server stopped"),
                Ok(Err(e)) => return Err(anyhow::anyhow!("Webhook server error: {}", e)),
                Err(e) => return Err(anyhow::anyhow!("Webhook server task failed: {}", e)),
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
