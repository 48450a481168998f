//! Pipeline orchestration.
//!
//! - [`orchestrator`] - the [`Bundler`] that runs every stage per platform
//! - [`signing`] - activation of the optional code-signing stage
//! - [`tool_detection`] - external tool lookup

mod orchestrator;
mod signing;
mod tool_detection;

pub use orchestrator::{Bundler, PlatformReport};
pub use signing::{SigningOutcome, sign_platform, sign_platform_with};
