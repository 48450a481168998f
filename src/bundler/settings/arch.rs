//! Operating system and CPU architecture types.

use std::fmt;

/// CPU architecture of a bundle target.
///
/// Only the architectures that have a published relocatable runtime build
/// are listed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Arch {
    /// x86_64 / AMD64 (64-bit)
    X86_64,
    /// AArch64 / ARM64 (64-bit) - Apple Silicon
    AArch64,
}

impl Arch {
    /// Architecture component used in target triples.
    pub fn triple_component(self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::AArch64 => "aarch64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.triple_component())
    }
}

/// Operating system family of a bundle target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum OsFamily {
    /// macOS (Darwin)
    MacOs,
    /// Linux with glibc
    Linux,
    /// Windows (MSVC)
    Windows,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OsFamily::MacOs => "macos",
            OsFamily::Linux => "linux",
            OsFamily::Windows => "windows",
        })
    }
}
