//! Structured mutation of one profile document.
//!
//! Editing is a fixed four-step pipeline over a loaded document:
//! primaries, tone curve, device class, description. Steps run once
//! each, in order, and the finished document is handed back for
//! conversion; the editor never touches storage.

use std::fmt;
use std::sync::Arc;

use crate::color::{self, PCS_WHITE, Tristimulus};
use crate::curve::ToneCurve;
use crate::icc::{DeviceClass, ProfileDocument, TagPayload, TagSignature};

/// An error while editing a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The document lacks a tag the edit must rewrite; the template
    /// was malformed.
    MissingTag(TagSignature),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::MissingTag(signature) => {
                write!(f, "base template is missing the {signature} tag")
            }
        }
    }
}

impl std::error::Error for EditError {}

/// Pipeline position. Transitions are one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Loaded,
    PrimariesUpdated,
    CurveReplaced,
    MetadataUpdated,
    Finalized,
}

/// Edits one profile document through the fixed pipeline.
pub struct ProfileEditor {
    doc: ProfileDocument,
    stage: Stage,
}

impl ProfileEditor {
    /// Starts editing a freshly loaded document.
    pub fn new(doc: ProfileDocument) -> ProfileEditor {
        ProfileEditor {
            doc,
            stage: Stage::Loaded,
        }
    }

    /// Rescales the three colorants around the connection-space white
    /// point.
    ///
    /// All required tags are validated before any is touched, so a
    /// malformed document is left exactly as it was loaded.
    pub fn update_primaries(&mut self, saturation: f64) -> Result<(), EditError> {
        debug_assert_eq!(self.stage, Stage::Loaded);

        self.doc
            .white_point()
            .ok_or(EditError::MissingTag(TagSignature::WhitePoint))?;

        let mut scaled: Vec<(TagSignature, Tristimulus)> = Vec::with_capacity(3);
        for signature in TagSignature::COLORANTS {
            let primary = self
                .doc
                .colorant(&signature)
                .ok_or_else(|| EditError::MissingTag(signature.clone()))?;
            scaled.push((
                signature,
                color::scale_saturation(primary, PCS_WHITE, saturation),
            ));
        }

        for (signature, value) in scaled {
            self.doc.set(signature, TagPayload::Colorant(value));
        }

        self.stage = Stage::PrimariesUpdated;
        Ok(())
    }

    /// Replaces every channel curve with one shared synthesized curve.
    ///
    /// Old curve tags are removed first; afterwards exactly one curve
    /// object exists, referenced under all three channel signatures.
    pub fn replace_tone_curve(&mut self, gamma: f64) {
        debug_assert_eq!(self.stage, Stage::PrimariesUpdated);

        for signature in TagSignature::TONE_CURVES {
            self.doc.remove(&signature);
        }

        let curve = ToneCurve::gamma(gamma);
        for signature in TagSignature::TONE_CURVES {
            self.doc
                .set(signature, TagPayload::Curve(Arc::clone(&curve)));
        }

        self.stage = Stage::CurveReplaced;
    }

    /// Marks the document as a display profile.
    ///
    /// The base template is a generic colorspace profile, and the
    /// display pipeline ignores anything that isn't class `mntr`.
    pub fn set_device_class(&mut self) {
        debug_assert_eq!(self.stage, Stage::CurveReplaced);

        self.doc
            .set(TagSignature::DeviceClass, TagPayload::Class(DeviceClass::Display));
        self.stage = Stage::MetadataUpdated;
    }

    /// Overwrites the description with the applied values and the
    /// file's uniqueness token, for traceability.
    pub fn set_description(&mut self, saturation: f64, gamma: f64, token: i64) {
        debug_assert_eq!(self.stage, Stage::MetadataUpdated);

        let text = format!("vibrance s{saturation:.2} g{gamma:.2} {token}");
        self.doc.set(TagSignature::Description, TagPayload::Text(text));
        self.stage = Stage::Finalized;
    }

    /// Hands back the finalized document, ready for conversion.
    pub fn finish(self) -> ProfileDocument {
        debug_assert_eq!(self.stage, Stage::Finalized);
        self.doc
    }
}
