//! macOS code signing.

pub mod binary;
pub mod sign;

pub use sign::{Codesign, SignTool, SigningTarget, TargetKind, sign_bundle};
