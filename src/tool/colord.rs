//! Device registration and profile association via `colormgr`.
//!
//! The color-management daemon only honors profiles attached to a
//! device it tracks, so registration is checked before every apply.
//! Both halves shell out to the `colormgr` front-end; in tests they
//! are replaced by recording doubles.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;

use crate::tool::{ToolError, run_tool};

/// Knows which displays the color-management registry tracks.
pub trait RegistersDevices {
    /// The identifiers of every registered device.
    fn devices(&self) -> impl Future<Output = Result<Vec<String>, ToolError>> + Send;

    /// Registers `id` as a persistent display device.
    fn create_device(&self, id: &str) -> impl Future<Output = Result<(), ToolError>> + Send;
}

/// Associates profile files with displays in the running session.
pub trait AppliesProfiles {
    /// Makes `profile` the default profile of `display`.
    fn apply(&self, display: &str, profile: &Path)
    -> impl Future<Output = Result<(), ToolError>> + Send;
}

/// `colormgr`-backed registry and applier.
#[derive(Debug, Clone)]
pub struct Colormgr {
    binary: String,
    timeout: Duration,
}

impl Colormgr {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Colormgr {
        Colormgr {
            binary: binary.into(),
            timeout,
        }
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output, ToolError> {
        let mut command = Command::new(&self.binary);
        command.args(args);
        run_tool(&self.binary, &mut command, self.timeout).await
    }
}

impl RegistersDevices for Colormgr {
    async fn devices(&self) -> Result<Vec<String>, ToolError> {
        let output = self.run(&["get-devices"]).await?;
        Ok(parse_device_ids(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn create_device(&self, id: &str) -> Result<(), ToolError> {
        self.run(&["create-device", id, "persistent", "display"])
            .await?;
        Ok(())
    }
}

impl AppliesProfiles for Colormgr {
    async fn apply(&self, display: &str, profile: &Path) -> Result<(), ToolError> {
        let profile = profile.to_string_lossy().into_owned();

        self.run(&["import-profile", profile.as_str()]).await?;

        // Resolve the imported profile's object path; adding by object
        // path keeps each step a plain command with a checkable exit.
        let found = self
            .run(&["find-profile-by-filename", profile.as_str()])
            .await?;
        let object = parse_object_path(&String::from_utf8_lossy(&found.stdout)).ok_or_else(|| {
            ToolError::Failed {
                tool: self.binary.clone(),
                message: format!("no object path for imported profile {profile}"),
            }
        })?;

        self.run(&["device-add-profile", display, object.as_str()])
            .await?;
        self.run(&["device-make-profile-default", display, object.as_str()])
            .await?;

        Ok(())
    }
}

/// Ensures `display` is known to the registry.
///
/// Best-effort and idempotent: an already-registered display is a
/// no-op, and failure to query or create is reported without aborting
/// the apply, since registration is a precondition only the consuming
/// subsystem enforces.
pub async fn ensure_registered<R: RegistersDevices>(registry: &R, display: &str) {
    let display_id = display;
    match registry.devices().await {
        Ok(devices) if devices.iter().any(|device| device == display) => {
            tracing::debug!("display {display_id} already registered");
        }
        Ok(_) => match registry.create_device(display).await {
            Ok(()) => tracing::info!("registered display {display_id}"),
            Err(e) => tracing::warn!("could not register display {display_id}: {e}"),
        },
        Err(e) => tracing::warn!("could not query registered displays: {e}"),
    }
}

/// Extracts `Device ID:` values from `colormgr get-devices` output.
fn parse_device_ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("Device ID:"))
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Extracts the first `Object Path:` value from `colormgr` output.
fn parse_object_path(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("Object Path:"))
        .map(|path| path.trim().to_string())
        .find(|path| !path.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Registry double whose device list reflects created devices.
    #[derive(Default)]
    struct FakeRegistry {
        devices: Mutex<Vec<String>>,
        creates: Mutex<usize>,
    }

    impl RegistersDevices for FakeRegistry {
        async fn devices(&self) -> Result<Vec<String>, ToolError> {
            Ok(self.devices.lock().unwrap().clone())
        }

        async fn create_device(&self, id: &str) -> Result<(), ToolError> {
            self.devices.lock().unwrap().push(id.to_string());
            *self.creates.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn registers_an_unknown_display_once() {
        let registry = FakeRegistry::default();

        ensure_registered(&registry, "eDP-1").await;
        ensure_registered(&registry, "eDP-1").await;

        // The second call observed the id and was a no-op.
        assert_eq!(*registry.creates.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn skips_creation_for_a_known_display() {
        let registry = FakeRegistry::default();
        registry.devices.lock().unwrap().push("eDP-1".into());

        ensure_registered(&registry, "eDP-1").await;
        assert_eq!(*registry.creates.lock().unwrap(), 0);
    }

    #[test]
    fn parses_device_ids_from_get_devices_output() {
        let stdout = "\
Object Path:   /org/freedesktop/ColorManager/devices/xrandr_eDP_1
Owner:         root
Kind:          display
  Device ID:     xrandr-eDP-1

Object Path:   /org/freedesktop/ColorManager/devices/sane_escl
  Device ID:     sane-escl
";
        assert_eq!(
            parse_device_ids(stdout),
            vec!["xrandr-eDP-1".to_string(), "sane-escl".to_string()]
        );
    }

    #[test]
    fn parses_the_imported_profile_object_path() {
        let stdout = "\
Object Path:   /org/freedesktop/ColorManager/profiles/icc_4a5
Filename:      /home/me/.cache/vibrance/vibrance_1.icc
";
        assert_eq!(
            parse_object_path(stdout).as_deref(),
            Some("/org/freedesktop/ColorManager/profiles/icc_4a5")
        );
        assert_eq!(parse_object_path("nothing here"), None);
    }
}
