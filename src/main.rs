use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pirsch_client::PirschClient;
use pirsch_core::AppConfig;
use pirsch_server::McpHandler;
use pirsch_tools::Dispatcher;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pirsch-mcp",
    about = "Pirsch Analytics tools over the Model Context Protocol",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/pirsch-mcp/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Domain queried when a tool call names none
    #[arg(long, global = true)]
    domain_id: Option<String>,

    /// Default time zone for statistics queries
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Override the Pirsch API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tools over stdin/stdout (default)
    Serve,

    /// Serve tools over HTTP
    ServeHttp {
        /// Bind host
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one tool and print its result
    Call {
        /// Tool name, e.g. pirsch_overview
        tool: String,
        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },

    /// List available tools
    Tools,

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol, so logs go to stderr.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "pirsch_mcp=info,warn".into()))
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    config.apply_env()?;

    if let Some(domain_id) = &cli.domain_id {
        config.pirsch.default_domain_id = Some(domain_id.clone());
    }
    if let Some(timezone) = &cli.timezone {
        config.pirsch.timezone = Some(timezone.clone());
    }
    if let Some(base_url) = &cli.base_url {
        config.pirsch.base_url = base_url.clone();
    }

    match cli.command {
        Some(Commands::Config { action }) => handle_config_command(action, &config, cli.config),
        Some(Commands::Tools) => {
            for tool in pirsch_tools::schema::catalogue() {
                println!("{:<22} {}", tool.name, tool.description);
            }
            Ok(())
        }
        Some(Commands::Call { tool, args }) => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("Tool arguments must be a JSON object")?;
            let dispatcher = build_dispatcher(&config)?;
            let output = dispatcher.execute(&tool, args).await;
            println!("{}", output.content);
            if output.is_error {
                bail!("{} failed", tool);
            }
            Ok(())
        }
        Some(Commands::ServeHttp { host, port }) => {
            if let Some(h) = host {
                config.server.host = h;
            }
            if let Some(p) = port {
                config.server.port = p;
            }
            let dispatcher = build_dispatcher(&config)?;
            pirsch_server::serve_http(config.server.clone(), dispatcher).await
        }
        Some(Commands::Serve) | None => {
            let dispatcher = build_dispatcher(&config)?;
            pirsch_server::serve_stdio(McpHandler::new(dispatcher)).await
        }
    }
}

/// Validate credentials and wire the client into a dispatcher. Fails before
/// anything is served when the configuration is unusable.
fn build_dispatcher(config: &AppConfig) -> Result<Arc<Dispatcher>> {
    config.validate()?;
    let client = PirschClient::new(&config.pirsch)?;
    let dispatcher = Dispatcher::new(Arc::new(client), config.pirsch.default_domain_id.clone());

    tracing::info!(
        "Loaded {} tools, endpoint: {}, default domain: {}",
        dispatcher.len(),
        config.pirsch.base_url,
        config.pirsch.default_domain_id.as_deref().unwrap_or("(first listed)"),
    );
    Ok(Arc::new(dispatcher))
}

fn handle_config_command(
    action: Option<ConfigAction>,
    config: &AppConfig,
    explicit_path: Option<PathBuf>,
) -> Result<()> {
    let path = explicit_path.unwrap_or_else(AppConfig::default_path);
    match action {
        Some(ConfigAction::Show) | None => {
            let toml_str = toml::to_string_pretty(&config.redacted())?;
            println!("{}", toml_str);
        }
        Some(ConfigAction::Init) => {
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                AppConfig::default().save_to(&path)?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", path.display());
        }
    }
    Ok(())
}
