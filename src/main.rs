use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use vibrance::tool::{self, ConfigProfile, apply::ApplyRequest, direct, displays};

/// Display vibrance and contrast through synthesized color profiles.
#[derive(Debug, Parser)]
#[command(name = "vibrance", version, about)]
struct Cli {
    /// Configuration file (defaults to the per-user Vibrance.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Configuration profile to merge over `default`.
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Synthesize a profile and apply it to a display.
    Apply {
        /// Target display (defaults to config, then the internal panel).
        #[arg(long)]
        display: Option<String>,

        /// Saturation level: 0.0 to 4.0, 1.0 is neutral.
        #[arg(long, default_value_t = 1.0, value_parser = parse_saturation)]
        saturation: f64,

        /// Gamma level: above 0.1 up to 3.0, 1.0 is neutral.
        #[arg(long, default_value_t = 1.0, value_parser = parse_gamma)]
        gamma: f64,
    },

    /// Reset a display to neutral saturation and gamma.
    Reset {
        /// Target display (defaults to config, then the internal panel).
        #[arg(long)]
        display: Option<String>,
    },

    /// Set saturation and gamma through the direct hardware path.
    Direct {
        /// Target display (defaults to config, then the internal panel).
        #[arg(long)]
        display: Option<String>,

        /// Saturation level: 0.0 to 4.0, 1.0 is neutral.
        #[arg(long, default_value_t = 1.0, value_parser = parse_saturation)]
        saturation: f64,

        /// Gamma level: above 0.1 up to 3.0, 1.0 is neutral.
        #[arg(long, default_value_t = 1.0, value_parser = parse_gamma)]
        gamma: f64,
    },

    /// List connected displays.
    Displays,

    /// Create a default configuration file if one doesn't exist.
    Init,
}

/// Validates a saturation value from the command line.
fn parse_saturation(value: &str) -> Result<f64, String> {
    let parsed: f64 = value.parse().map_err(|_| "not a number".to_string())?;
    if !(0.0..=4.0).contains(&parsed) {
        return Err("saturation must be between 0.0 and 4.0".to_string());
    }
    Ok(parsed)
}

/// Validates a gamma value from the command line.
///
/// The lower bound is exclusive: values at or below 0.1 would approach
/// an unbounded curve exponent.
fn parse_gamma(value: &str) -> Result<f64, String> {
    let parsed: f64 = value.parse().map_err(|_| "not a number".to_string())?;
    if parsed <= 0.1 || parsed > 3.0 {
        return Err("gamma must be above 0.1 and at most 3.0".to_string());
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = tool::load_config(cli.config.as_deref(), cli.profile.as_deref()).await?;

    match cli.command {
        Command::Apply {
            display,
            saturation,
            gamma,
        } => {
            let display = resolve_display(&config, display).await?;
            let request = ApplyRequest {
                display,
                saturation,
                gamma,
            };
            tool::apply::run(&config, &request).await?;
        }

        Command::Reset { display } => {
            let display = resolve_display(&config, display).await?;
            let request = ApplyRequest {
                display,
                saturation: 1.0,
                gamma: 1.0,
            };
            tool::apply::run(&config, &request).await?;
        }

        Command::Direct {
            display,
            saturation,
            gamma,
        } => {
            let display = resolve_display(&config, display).await?;
            let target = display.as_str();

            // The two halves are independent; report both.
            let saturation_result =
                direct::set_saturation(config.vibrant(), &display, saturation, config.timeout())
                    .await;
            match &saturation_result {
                Ok(()) => tracing::info!("saturation applied to {target}"),
                Err(e) => tracing::warn!("saturation failed (is vibrant-cli installed?): {e}"),
            }

            let gamma_result =
                direct::set_gamma(config.xrandr(), &display, gamma, config.timeout()).await;
            match &gamma_result {
                Ok(()) => tracing::info!("gamma applied to {target}"),
                Err(e) => tracing::warn!("gamma failed: {e}"),
            }

            saturation_result.or(gamma_result)?;
        }

        Command::Displays => {
            let displays = displays::connected_displays(config.xrandr(), config.timeout()).await?;
            if displays.is_empty() {
                tracing::warn!("no displays found");
            }
            for display in displays {
                println!("{display}");
            }
        }

        Command::Init => tool::init().await?,
    }

    Ok(())
}

/// Resolves the target display: explicit flag, then configuration,
/// then the preferred connected display.
async fn resolve_display(
    config: &ConfigProfile,
    explicit: Option<String>,
) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(display) = explicit {
        if display.is_empty() {
            return Err("display name must not be empty".into());
        }
        return Ok(display);
    }

    if let Some(display) = config.display() {
        return Ok(display.to_string());
    }

    let connected = displays::connected_displays(config.xrandr(), config.timeout()).await?;
    match displays::default_display(&connected) {
        Some(display) => Ok(display.to_string()),
        None => Err("no display selected and none detected".into()),
    }
}
