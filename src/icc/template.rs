//! Base template discovery and decoding.
//!
//! Synthesis starts from a standards-compliant profile shipped with the
//! system's color stack rather than from scratch; the first candidate
//! path that exists wins. Binary decoding is `moxcms`'s job.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use moxcms::{ColorProfile, ProfileClass, ToneReprCurve, Xyzd};
use tokio::fs;

use crate::color::Tristimulus;
use crate::curve::ToneCurve;
use crate::icc::{DeviceClass, ProfileDocument, TagPayload, TagSignature};

/// Well-known base template locations, probed in order.
pub const TEMPLATE_CANDIDATES: &[&str] = &[
    "/usr/share/color/icc/colord/sRGB.icc",
    "/usr/share/color/icc/sRGB.icc",
    "/usr/local/share/color/icc/sRGB.icc",
];

/// A source of base template documents.
pub trait LoadsTemplates {
    /// Loads the template as a structured document.
    fn load(&self) -> impl Future<Output = Result<ProfileDocument, TemplateError>> + Send;
}

/// An error locating the base template.
#[derive(Debug)]
pub enum TemplateError {
    /// No candidate path existed.
    NotFound { searched: Vec<PathBuf> },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::NotFound { searched } => {
                write!(f, "no base profile template found (searched ")?;
                for (i, path) in searched.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", path.display())?;
                }
                write!(f, ")")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Loads templates from a fixed list of filesystem candidates.
#[derive(Debug, Clone)]
pub struct FileTemplateSource {
    candidates: Vec<PathBuf>,
}

impl FileTemplateSource {
    /// A source over explicit candidate paths.
    pub fn new(candidates: Vec<PathBuf>) -> FileTemplateSource {
        FileTemplateSource { candidates }
    }

    /// A source over the well-known system locations.
    pub fn well_known() -> FileTemplateSource {
        FileTemplateSource::new(TEMPLATE_CANDIDATES.iter().map(PathBuf::from).collect())
    }
}

impl LoadsTemplates for FileTemplateSource {
    async fn load(&self) -> Result<ProfileDocument, TemplateError> {
        for path in &self.candidates {
            if !fs::try_exists(path).await.unwrap_or(false) {
                continue;
            }

            let bytes = match fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("could not read template {}: {}", path.display(), e);
                    continue;
                }
            };

            tracing::debug!("using base template {}", path.display());
            return Ok(decode_template(&bytes));
        }

        Err(TemplateError::NotFound {
            searched: self.candidates.clone(),
        })
    }
}

/// Decodes template bytes into a structured document.
///
/// An undecodable or tag-poor template yields a document whose missing
/// entries the editor reports against the first edit, so decode
/// problems surface as missing-tag errors rather than a separate
/// failure class.
fn decode_template(bytes: &[u8]) -> ProfileDocument {
    let profile = match ColorProfile::new_from_slice(bytes) {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!("template did not decode: {e:?}");
            return ProfileDocument::new();
        }
    };

    document_from_profile(&profile)
}

/// Builds the typed document from a decoded profile.
///
/// `moxcms` models absent colorant and white point tags as zeroed
/// values rather than options; all-zero entries are left out of the
/// document so required-tag checks can see them as missing.
pub(crate) fn document_from_profile(profile: &ColorProfile) -> ProfileDocument {
    let mut doc = ProfileDocument::new();

    set_colorant(&mut doc, TagSignature::RedColorant, profile.red_colorant);
    set_colorant(&mut doc, TagSignature::GreenColorant, profile.green_colorant);
    set_colorant(&mut doc, TagSignature::BlueColorant, profile.blue_colorant);
    set_colorant(&mut doc, TagSignature::WhitePoint, profile.white_point);

    set_curve(&mut doc, TagSignature::RedToneCurve, &profile.red_trc);
    set_curve(&mut doc, TagSignature::GreenToneCurve, &profile.green_trc);
    set_curve(&mut doc, TagSignature::BlueToneCurve, &profile.blue_trc);

    let class = match profile.profile_class {
        ProfileClass::DisplayDevice => DeviceClass::Display,
        ProfileClass::InputDevice => DeviceClass::Input,
        ProfileClass::OutputDevice => DeviceClass::Output,
        _ => DeviceClass::ColorSpace,
    };
    doc.set(TagSignature::DeviceClass, TagPayload::Class(class));

    doc
}

fn set_colorant(doc: &mut ProfileDocument, signature: TagSignature, value: Xyzd) {
    if value.x == 0.0 && value.y == 0.0 && value.z == 0.0 {
        return;
    }
    doc.set(
        signature,
        TagPayload::Colorant(Tristimulus {
            x: value.x,
            y: value.y,
            z: value.z,
        }),
    );
}

fn set_curve(doc: &mut ProfileDocument, signature: TagSignature, curve: &Option<ToneReprCurve>) {
    // Only sampled curves carry over; parametric template curves are
    // dropped here and replaced during editing anyway.
    if let Some(ToneReprCurve::Lut(samples)) = curve {
        doc.set(
            signature,
            TagPayload::Curve(Arc::new(ToneCurve::from_samples(samples.clone()))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_candidates_report_every_searched_path() {
        let source = FileTemplateSource::new(vec![
            PathBuf::from("/nonexistent/one.icc"),
            PathBuf::from("/nonexistent/two.icc"),
        ]);

        let err = source.load().await.expect_err("template should be absent");
        let TemplateError::NotFound { searched } = err;
        assert_eq!(searched.len(), 2);
    }

    #[tokio::test]
    async fn undecodable_template_yields_an_empty_tag_map() {
        let dir = std::env::temp_dir().join("vibrance_template_undecodable");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("garbage.icc");
        std::fs::write(&path, b"definitely not a profile").unwrap();

        let source = FileTemplateSource::new(vec![path]);
        let doc = source.load().await.unwrap();
        assert!(doc.colorant(&TagSignature::RedColorant).is_none());
        assert!(doc.white_point().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn srgb_built_in_decodes_to_a_complete_document() {
        // moxcms's built-in sRGB profile stands in for the on-disk
        // template; it carries colorants, a white point, and curves.
        let doc = document_from_profile(&ColorProfile::new_srgb());

        for signature in TagSignature::COLORANTS {
            assert!(doc.colorant(&signature).is_some(), "missing {signature}");
        }
        assert!(doc.white_point().is_some());
    }
}
