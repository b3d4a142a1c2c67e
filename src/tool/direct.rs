//! Direct hardware saturation and gamma, for drivers that expose them.
//!
//! Bypasses profile synthesis entirely: saturation goes through
//! `vibrant-cli` and gamma through `xrandr --gamma`. The two halves
//! succeed or fail independently and are reported as such.

use std::time::Duration;

use tokio::process::Command;

use crate::tool::{ToolError, run_tool};

/// Sets hardware saturation on `display` via `vibrant-cli`.
pub async fn set_saturation(
    vibrant: &str,
    display: &str,
    value: f64,
    timeout: Duration,
) -> Result<(), ToolError> {
    let mut command = Command::new(vibrant);
    command.arg(display).arg(value.to_string());
    run_tool(vibrant, &mut command, timeout).await?;
    Ok(())
}

/// Sets hardware gamma on `display` via `xrandr --gamma`.
pub async fn set_gamma(
    xrandr: &str,
    display: &str,
    value: f64,
    timeout: Duration,
) -> Result<(), ToolError> {
    let mut command = Command::new(xrandr);
    command
        .args(["--output", display, "--gamma"])
        .arg(gamma_triplet(value));
    run_tool(xrandr, &mut command, timeout).await?;
    Ok(())
}

/// Formats a single gamma value as the `R:G:B` triplet xrandr expects.
fn gamma_triplet(value: f64) -> String {
    format!("{value}:{value}:{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_the_value_for_all_channels() {
        assert_eq!(gamma_triplet(1.0), "1:1:1");
        assert_eq!(gamma_triplet(0.85), "0.85:0.85:0.85");
    }
}
