use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use sketchsolve_board::snapshot;
use sketchsolve_core::config::{Config, LoggingConfig, config_path, redacted_json};
use sketchsolve_inference::ImageAnalyzer;
use sketchsolve_server::{AppState, start_server};

#[derive(Parser)]
#[command(
    name = "sketchsolve",
    about = "Sketch-to-solve: draw math on a canvas and let a vision model work it out",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the analysis server
    Serve {
        /// Port to listen on (default: 3000)
        #[arg(long)]
        port: Option<u16>,

        /// Serve the embedded sketchpad UI under /ui
        #[arg(long)]
        ui: bool,
    },

    /// Analyze a sketch image from disk, without starting a server
    Analyze {
        /// Path to the image file
        image: String,

        /// Known variable, repeatable (e.g. --var x=4)
        #[arg(long = "var", value_name = "NAME=VALUE")]
        var: Vec<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version, config location, and provider setup
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (secrets masked)
    Show,
    /// Check the configuration for problems
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_file = cli
        .config
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(config_path);
    let config = Config::load_or_default(cli.config.as_deref().map(Path::new))?;

    init_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Serve { port, ui } => run_serve(config, port, ui).await?,
        Commands::Analyze { image, var } => run_analyze(config, &image, &var).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let json = serde_json::to_string_pretty(&redacted_json(&config))?;
                println!("{json}");
            }
            ConfigAction::Validate => {
                let (warnings, errors) = config.validate();
                for warning in &warnings {
                    println!("warning: {warning}");
                }
                for error in &errors {
                    println!("error: {error}");
                }
                if !errors.is_empty() {
                    anyhow::bail!(
                        "{} config error(s) in {}",
                        errors.len(),
                        config_file.display()
                    );
                }
                println!("Config OK ({} warning(s))", warnings.len());
            }
        },
        Commands::Status => {
            println!("Sketchsolve v{}", env!("CARGO_PKG_VERSION"));
            println!("Config: {}", config_file.display());
            println!(
                "Provider: {} ({})",
                config.inference.provider, config.inference.model
            );
            println!("Server port: {}", config.server.port);
            let key = if config.inference.resolve_api_key().is_some() {
                "configured"
            } else {
                "missing"
            };
            println!("API key: {key}");
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run_serve(config: Config, port: Option<u16>, ui: bool) -> anyhow::Result<()> {
    let (warnings, errors) = config.validate();
    for warning in &warnings {
        tracing::warn!("Config: {warning}");
    }
    if !errors.is_empty() {
        for error in &errors {
            tracing::error!("Config: {error}");
        }
        anyhow::bail!("Refusing to start with {} config error(s)", errors.len());
    }

    // Fails here when no API key is configured anywhere.
    let analyzer = ImageAnalyzer::from_config(&config.inference)?;
    let port = port.unwrap_or(config.server.port);

    tracing::info!(
        provider = analyzer.provider_id(),
        model = analyzer.model(),
        "Starting Sketchsolve server on port {port}"
    );

    let state = Arc::new(AppState::new(Arc::new(config), Arc::new(analyzer)));
    start_server(state, port, ui).await
}

async fn run_analyze(config: Config, path: &str, vars: &[String]) -> anyhow::Result<()> {
    let analyzer = ImageAnalyzer::from_config(&config.inference)?;
    let dict_of_vars = parse_vars(vars)?;

    let img = image::open(path)
        .with_context(|| format!("Cannot open image {path}"))?
        .to_rgba8();
    let scaled = snapshot::downscale_to_fit(&img, config.board.max_image_dim);
    let payload = snapshot::encode_base64_png(&scaled)?;

    let entries = analyzer.analyze(&payload, &dict_of_vars).await?;
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

/// Parse repeated `--var name=value` pairs. Values are taken as JSON when
/// they parse as JSON, otherwise as plain strings, so `--var x=4` yields a
/// number and `--var name=euler` a string.
fn parse_vars(vars: &[String]) -> anyhow::Result<HashMap<String, serde_json::Value>> {
    let mut out = HashMap::new();
    for pair in vars {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("--var expects NAME=VALUE, got \"{pair}\""))?;
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        out.insert(name.to_string(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vars_json_and_string_values() {
        let vars = vec!["x=4".to_string(), "name=euler".to_string()];
        let parsed = parse_vars(&vars).unwrap();
        assert_eq!(parsed["x"], serde_json::json!(4));
        assert_eq!(parsed["name"], serde_json::json!("euler"));
    }

    #[test]
    fn test_parse_vars_rejects_missing_equals() {
        assert!(parse_vars(&["nonsense".to_string()]).is_err());
    }
}
