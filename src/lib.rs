//! Display vibrance and contrast through synthesized color profiles.
//!
//! On hardware without direct vibrance controls, perceived saturation
//! and contrast can still be adjusted by handing the display pipeline a
//! color profile whose primaries and tone curves encode the change.
//! This crate synthesizes such profiles: [color] rescales colorants
//! around the connection-space white point, [curve] builds the gamma
//! lookup table, [icc] edits a typed profile document, [store] manages
//! the generated files, and [tool] drives the external conversion and
//! application steps.

pub mod color;
pub mod curve;
pub mod icc;
pub mod store;
pub mod tool;
