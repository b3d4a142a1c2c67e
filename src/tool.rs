//! This module contains implementations for the command-line tools.

pub mod apply;
pub mod colord;
pub mod convert;
pub mod direct;
pub mod displays;

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio::fs;
use tokio::process::Command;

use crate::store;

/// Default configuration profile.
const DEFAULT_CONFIG_PROFILE: &str = "default";

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "Vibrance.toml";

/// Default bounded timeout for every external tool invocation.
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 20;

/// Default configuration file contents.
pub const DEFAULT_CONFIG_TOML: &str = r#"# Vibrance profile generation configuration
# See: https://github.com/vibrance-tools/vibrance

[default]
# Display to target when none is given on the command line.
# display = "eDP-1"

[default.tools]
# Override external tool names or paths as needed.
# converter = "iccFromXml"
# colormgr = "colormgr"
# xrandr = "xrandr"
# vibrant = "vibrant-cli"
# Seconds before an external tool invocation is abandoned.
# timeout_secs = 20

[default.cache]
# Directory for generated profiles; defaults to the per-user cache.
# dir = "/home/me/.cache/vibrance"
# Generated profiles kept after a successful apply.
keep = 2

# Further profiles merge over `default`; select one with --profile.
[external.cache]
keep = 4
"#;

/// Raw TOML structure of a `Vibrance.toml` file.
///
/// This is an internal representation used during deserialization.
/// External consumers should use [ConfigProfile] (returned by
/// [load_config]).
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(flatten)]
    profiles: BTreeMap<String, ConfigProfile>,
}

/// Profile-level configuration in a `Vibrance.toml`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConfigProfile {
    /// Display to target when none is given on the command line.
    #[serde(default)]
    display: Option<String>,
    #[serde(default)]
    tools: ToolsConfig,
    #[serde(default)]
    cache: CacheConfig,
}

/// External tool configuration in a [ConfigProfile].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ToolsConfig {
    converter: Option<String>,
    colormgr: Option<String>,
    xrandr: Option<String>,
    vibrant: Option<String>,
    timeout_secs: Option<u64>,
}

/// Generated-profile cache configuration in a [ConfigProfile].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CacheConfig {
    dir: Option<String>,
    keep: Option<usize>,
}

impl ConfigProfile {
    /// Merges this profile with another, with `other`
    /// taking precedence, and returning the merged profile.
    fn merge(&self, other: &ConfigProfile) -> ConfigProfile {
        let mut merged = self.clone();

        if other.display.is_some() {
            merged.display = other.display.clone();
        }

        // Merge tools
        if other.tools.converter.is_some() {
            merged.tools.converter = other.tools.converter.clone();
        }
        if other.tools.colormgr.is_some() {
            merged.tools.colormgr = other.tools.colormgr.clone();
        }
        if other.tools.xrandr.is_some() {
            merged.tools.xrandr = other.tools.xrandr.clone();
        }
        if other.tools.vibrant.is_some() {
            merged.tools.vibrant = other.tools.vibrant.clone();
        }
        if other.tools.timeout_secs.is_some() {
            merged.tools.timeout_secs = other.tools.timeout_secs;
        }

        // Merge cache
        if other.cache.dir.is_some() {
            merged.cache.dir = other.cache.dir.clone();
        }
        if other.cache.keep.is_some() {
            merged.cache.keep = other.cache.keep;
        }

        merged
    }

    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    pub fn converter(&self) -> &str {
        self.tools.converter.as_deref().unwrap_or("iccFromXml")
    }

    pub fn colormgr(&self) -> &str {
        self.tools.colormgr.as_deref().unwrap_or("colormgr")
    }

    pub fn xrandr(&self) -> &str {
        self.tools.xrandr.as_deref().unwrap_or("xrandr")
    }

    pub fn vibrant(&self) -> &str {
        self.tools.vibrant.as_deref().unwrap_or("vibrant-cli")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.tools
                .timeout_secs
                .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS),
        )
    }

    pub fn cache_dir(&self) -> PathBuf {
        match &self.cache.dir {
            Some(dir) => PathBuf::from(dir),
            None => store::default_cache_dir(),
        }
    }

    pub fn keep(&self) -> usize {
        self.cache.keep.unwrap_or(store::DEFAULT_KEEP)
    }
}

/// Default per-user location of the configuration file.
pub fn default_config_path() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(std::env::temp_dir)
        .join("vibrance")
        .join(DEFAULT_CONFIG_FILE)
}

/// Loads, validates, and merges a `Vibrance.toml` configuration file.
///
/// With no explicit `config_path`, the per-user file is used if it
/// exists; otherwise built-in defaults apply (selecting a profile
/// without a file is an error).
pub async fn load_config(
    config_path: Option<&Path>,
    profile: Option<&str>,
) -> io::Result<ConfigProfile> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path();
            if !fs::try_exists(&path).await.unwrap_or(false) {
                if let Some(name) = profile {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("profile {name} selected but {} does not exist", path.display()),
                    ));
                }
                return Ok(ConfigProfile::default());
            }
            path
        }
    };

    let toml_str = fs::read_to_string(&path).await?;
    load_config_from_str(&toml_str, profile)
}

/// Parses, validates, and merges a `Vibrance.toml` configuration
/// string, merging the selected profile over the default.
fn load_config_from_str(toml_str: &str, profile: Option<&str>) -> io::Result<ConfigProfile> {
    let profile_name = profile.unwrap_or(DEFAULT_CONFIG_PROFILE);

    let raw: RawConfig = toml::from_str(toml_str)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("invalid TOML: {}", e)))?;

    let default_profile = raw.profiles.get(DEFAULT_CONFIG_PROFILE).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("missing default profile: {}", DEFAULT_CONFIG_PROFILE),
        )
    })?;

    if profile_name == DEFAULT_CONFIG_PROFILE {
        Ok(default_profile.clone())
    } else {
        let selected = raw.profiles.get(profile_name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("missing selected profile: {}", profile_name),
            )
        })?;
        Ok(default_profile.merge(selected))
    }
}

/// Creates a default configuration file in the per-user location if
/// one doesn't exist.
pub async fn init() -> io::Result<()> {
    let config_path = default_config_path();

    if fs::try_exists(&config_path).await? {
        tracing::warn!("{} already exists", config_path.display());
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&config_path, DEFAULT_CONFIG_TOML).await?;
    tracing::info!("Created {}", config_path.display());

    Ok(())
}

/// An error from invoking an external command-line tool.
#[derive(Debug)]
pub enum ToolError {
    /// The tool's binary was not found on the system.
    Unavailable { tool: String },
    /// The tool ran and reported failure.
    Failed { tool: String, message: String },
    /// The tool did not finish within the configured timeout.
    TimedOut { tool: String },
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Unavailable { tool } => write!(f, "{tool} is not installed"),
            ToolError::Failed { tool, message } => write!(f, "{tool} failed: {message}"),
            ToolError::TimedOut { tool } => write!(f, "{tool} timed out"),
        }
    }
}

impl std::error::Error for ToolError {}

/// Runs an external tool, capturing its output, with a bounded
/// timeout.
///
/// A missing binary becomes [ToolError::Unavailable]; a non-zero exit
/// becomes [ToolError::Failed] carrying trimmed stderr.
pub(crate) async fn run_tool(
    tool: &str,
    command: &mut Command,
    timeout: Duration,
) -> Result<std::process::Output, ToolError> {
    let output = match tokio::time::timeout(timeout, command.output()).await {
        Err(_) => {
            return Err(ToolError::TimedOut {
                tool: tool.to_string(),
            });
        }
        Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ToolError::Unavailable {
                tool: tool.to_string(),
            });
        }
        Ok(Err(e)) => {
            return Err(ToolError::Failed {
                tool: tool.to_string(),
                message: e.to_string(),
            });
        }
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            message: stderr.trim().to_string(),
        });
    }

    Ok(output)
}
