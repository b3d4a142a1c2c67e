//! A structured, typed view of an ICC-style profile document.
//!
//! The profile format itself is a black box: decoding an existing
//! profile is delegated to `moxcms` (see [FileTemplateSource]) and
//! encoding is delegated to an external converter fed by [xml]. In
//! between, the document is a plain ordered tag map with typed
//! payloads, so edits are direct field work rather than string-keyed
//! tree surgery.

mod editor;
mod template;
pub mod xml;

pub use editor::{EditError, ProfileEditor};
pub use template::{FileTemplateSource, LoadsTemplates, TemplateError};

use std::fmt;
use std::sync::Arc;

use crate::color::Tristimulus;
use crate::curve::ToneCurve;

/// The tag kinds this tool reads or rewrites.
///
/// A closed set: anything else a template carries travels through
/// [TagSignature::Other] untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSignature {
    RedColorant,
    GreenColorant,
    BlueColorant,
    RedToneCurve,
    GreenToneCurve,
    BlueToneCurve,
    WhitePoint,
    Description,
    DeviceClass,
    Other(String),
}

impl TagSignature {
    /// The three colorant signatures, in channel order.
    pub const COLORANTS: [TagSignature; 3] = [
        TagSignature::RedColorant,
        TagSignature::GreenColorant,
        TagSignature::BlueColorant,
    ];

    /// The three per-channel curve signatures, in channel order.
    pub const TONE_CURVES: [TagSignature; 3] = [
        TagSignature::RedToneCurve,
        TagSignature::GreenToneCurve,
        TagSignature::BlueToneCurve,
    ];

    /// The four-character code used on the wire and in diagnostics.
    pub fn code(&self) -> &str {
        match self {
            TagSignature::RedColorant => "rXYZ",
            TagSignature::GreenColorant => "gXYZ",
            TagSignature::BlueColorant => "bXYZ",
            TagSignature::RedToneCurve => "rTRC",
            TagSignature::GreenToneCurve => "gTRC",
            TagSignature::BlueToneCurve => "bTRC",
            TagSignature::WhitePoint => "wtpt",
            TagSignature::Description => "desc",
            TagSignature::DeviceClass => "deviceClass",
            TagSignature::Other(code) => code,
        }
    }
}

impl fmt::Display for TagSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The intended use of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Color space conversion (the class of a generic template).
    ColorSpace,
    /// Display device (monitor); the only class the display
    /// pipeline associates with an output.
    Display,
    /// Input device (scanner, camera).
    Input,
    /// Output device (printer).
    Output,
}

impl DeviceClass {
    /// The four-character header code.
    pub fn code(&self) -> &'static str {
        match self {
            DeviceClass::ColorSpace => "spac",
            DeviceClass::Display => "mntr",
            DeviceClass::Input => "scnr",
            DeviceClass::Output => "prtr",
        }
    }
}

/// A tag's typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TagPayload {
    /// An XYZ colorant or white point.
    Colorant(Tristimulus),
    /// A sampled tone curve, shared across the channels that
    /// reference it.
    Curve(Arc<ToneCurve>),
    /// Human-readable text.
    Text(String),
    /// The profile's device class.
    Class(DeviceClass),
    /// An uninterpreted payload carried through from the template.
    Raw(Vec<u8>),
}

/// An ordered collection of tags, at most one per signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDocument {
    tags: Vec<(TagSignature, TagPayload)>,
}

impl ProfileDocument {
    /// An empty document.
    pub fn new() -> ProfileDocument {
        ProfileDocument::default()
    }

    /// All tags, in insertion order.
    pub fn tags(&self) -> &[(TagSignature, TagPayload)] {
        &self.tags
    }

    /// The payload stored under `signature`, if any.
    pub fn get(&self, signature: &TagSignature) -> Option<&TagPayload> {
        self.tags
            .iter()
            .find(|(sig, _)| sig == signature)
            .map(|(_, payload)| payload)
    }

    /// Stores `payload` under `signature`, replacing any existing tag
    /// in place. Keeps the one-tag-per-signature invariant.
    pub fn set(&mut self, signature: TagSignature, payload: TagPayload) {
        match self.tags.iter_mut().find(|(sig, _)| *sig == signature) {
            Some(entry) => entry.1 = payload,
            None => self.tags.push((signature, payload)),
        }
    }

    /// Removes and returns the tag stored under `signature`.
    pub fn remove(&mut self, signature: &TagSignature) -> Option<TagPayload> {
        let index = self.tags.iter().position(|(sig, _)| sig == signature)?;
        Some(self.tags.remove(index).1)
    }

    /// The colorant value stored under `signature`, if present and
    /// actually a colorant.
    pub fn colorant(&self, signature: &TagSignature) -> Option<Tristimulus> {
        match self.get(signature) {
            Some(TagPayload::Colorant(value)) => Some(*value),
            _ => None,
        }
    }

    /// The document's white point, if present.
    pub fn white_point(&self) -> Option<Tristimulus> {
        self.colorant(&TagSignature::WhitePoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut doc = ProfileDocument::new();
        doc.set(TagSignature::Description, TagPayload::Text("one".into()));
        doc.set(TagSignature::DeviceClass, TagPayload::Class(DeviceClass::ColorSpace));
        doc.set(TagSignature::Description, TagPayload::Text("two".into()));

        assert_eq!(doc.tags().len(), 2);
        assert_eq!(
            doc.get(&TagSignature::Description),
            Some(&TagPayload::Text("two".into()))
        );
        // Replacement keeps the original position.
        assert_eq!(doc.tags()[0].0, TagSignature::Description);
    }

    #[test]
    fn remove_returns_the_payload() {
        let mut doc = ProfileDocument::new();
        doc.set(
            TagSignature::WhitePoint,
            TagPayload::Colorant(crate::color::PCS_WHITE),
        );

        assert!(doc.remove(&TagSignature::WhitePoint).is_some());
        assert!(doc.white_point().is_none());
        assert!(doc.remove(&TagSignature::WhitePoint).is_none());
    }

    #[test]
    fn colorant_ignores_mismatched_payloads() {
        let mut doc = ProfileDocument::new();
        doc.set(TagSignature::RedColorant, TagPayload::Text("not a colorant".into()));
        assert!(doc.colorant(&TagSignature::RedColorant).is_none());
    }
}
