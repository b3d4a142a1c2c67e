//! Connected display discovery via `xrandr`.

use std::time::Duration;

use tokio::process::Command;

use crate::tool::{ToolError, run_tool};

/// Returns the names of all connected displays.
pub async fn connected_displays(xrandr: &str, timeout: Duration) -> Result<Vec<String>, ToolError> {
    let mut command = Command::new(xrandr);
    let output = run_tool(xrandr, &mut command, timeout).await?;
    Ok(parse_connected(&String::from_utf8_lossy(&output.stdout)))
}

/// Picks a default target from `displays`, preferring the internal
/// panel.
pub fn default_display(displays: &[String]) -> Option<&str> {
    displays
        .iter()
        .find(|display| display.contains("eDP-1"))
        .or_else(|| displays.first())
        .map(String::as_str)
}

/// Extracts display names from ` connected` lines of xrandr output.
fn parse_connected(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| line.contains(" connected"))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
