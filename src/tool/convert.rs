//! Document-to-binary conversion through an external compiler.
//!
//! The binary profile layout is out of scope: the finalized document is
//! serialized as IccXML and compiled by `iccFromXml`, which writes the
//! profile bytes at the requested output path.

use std::path::Path;
use std::time::Duration;

use tokio::fs;
use tokio::process::Command;

use crate::icc::{ProfileDocument, xml};
use crate::tool::{ToolError, run_tool};

/// Converts a finalized document into binary profile bytes on disk.
pub trait ConvertsProfiles {
    /// Writes the binary rendition of `doc` at `output`.
    fn convert(
        &self,
        doc: &ProfileDocument,
        output: &Path,
    ) -> impl Future<Output = Result<(), ToolError>> + Send;
}

/// Shells out to `iccFromXml`, feeding it the serialized document.
#[derive(Debug, Clone)]
pub struct IccFromXml {
    binary: String,
    timeout: Duration,
}

impl IccFromXml {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> IccFromXml {
        IccFromXml {
            binary: binary.into(),
            timeout,
        }
    }
}

impl ConvertsProfiles for IccFromXml {
    async fn convert(&self, doc: &ProfileDocument, output: &Path) -> Result<(), ToolError> {
        let mut serialized = Vec::new();
        xml::write_icc_xml(&mut serialized, doc).map_err(|e| ToolError::Failed {
            tool: self.binary.clone(),
            message: e.to_string(),
        })?;

        let xml_path = output.with_extension("xml");
        fs::write(&xml_path, &serialized)
            .await
            .map_err(|e| ToolError::Failed {
                tool: self.binary.clone(),
                message: format!("could not stage {}: {}", xml_path.display(), e),
            })?;

        let mut command = Command::new(&self.binary);
        command.arg(&xml_path).arg(output);
        let result = run_tool(&self.binary, &mut command, self.timeout).await;

        // The staged XML is scratch either way.
        if let Err(e) = fs::remove_file(&xml_path).await {
            tracing::debug!("could not remove {}: {}", xml_path.display(), e);
        }
        result?;

        // Some converter builds exit zero without producing output.
        if !fs::try_exists(output).await.unwrap_or(false) {
            return Err(ToolError::Failed {
                tool: self.binary.clone(),
                message: format!("no profile produced at {}", output.display()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_converter_reports_unavailable() {
        let dir = std::env::temp_dir().join("vibrance_convert_unavailable");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let converter = IccFromXml::new(
            "vibrance-no-such-converter-binary",
            Duration::from_secs(5),
        );
        let err = converter
            .convert(&ProfileDocument::new(), &dir.join("out.icc"))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::Unavailable { .. }), "got {err:?}");
        // The staged XML was cleaned up.
        assert!(!dir.join("out.xml").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
