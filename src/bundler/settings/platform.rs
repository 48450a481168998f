//! Platform tokens and the per-platform layout conventions of the runtime.
//!
//! Each supported (OS, architecture) pair has exactly one [`PlatformDescriptor`].
//! Anything else has no descriptor and the pipeline refuses to run.

use super::{Arch, OsFamily};
use crate::bundler::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Filename template shared by every runtime archive.
const ARCHIVE_TEMPLATE: &str = "cpython-{version}+{release}-{triple}-install_only.tar.gz";

/// Token accepted on the command line to select every platform.
pub const ALL_TOKEN: &str = "all";

/// A supported bundle target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Platform {
    /// Apple Silicon macOS
    MacOsArm64,
    /// Intel macOS
    MacOsX64,
    /// x86_64 Linux (glibc)
    LinuxX64,
    /// x86_64 Windows
    WindowsX64,
}

/// Static description of one platform's naming conventions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlatformDescriptor {
    /// Canonical token, e.g. `macos-arm64`
    pub token: &'static str,
    /// Operating system family
    pub os: OsFamily,
    /// CPU architecture
    pub arch: Arch,
    /// Target triple used in archive names
    pub triple: &'static str,
    /// Archive filename template with `{version}`, `{release}` and `{triple}` placeholders
    pub archive_template: &'static str,
    /// Interpreter inside the extracted runtime, relative to its root
    pub runtime_interpreter: &'static str,
    /// Interpreter inside the provisioned environment, relative to its root
    pub env_interpreter: &'static str,
    /// Directory holding executables inside the environment
    pub executable_dir: &'static str,
    /// Runtime directory holding the core shared library
    pub shared_library_dir: &'static str,
}

const DESCRIPTORS: [PlatformDescriptor; 4] = [
    PlatformDescriptor {
        token: "macos-arm64",
        os: OsFamily::MacOs,
        arch: Arch::AArch64,
        triple: "aarch64-apple-darwin",
        archive_template: ARCHIVE_TEMPLATE,
        runtime_interpreter: "bin/python3",
        env_interpreter: "bin/python",
        executable_dir: "bin",
        shared_library_dir: "lib",
    },
    PlatformDescriptor {
        token: "macos-x64",
        os: OsFamily::MacOs,
        arch: Arch::X86_64,
        triple: "x86_64-apple-darwin",
        archive_template: ARCHIVE_TEMPLATE,
        runtime_interpreter: "bin/python3",
        env_interpreter: "bin/python",
        executable_dir: "bin",
        shared_library_dir: "lib",
    },
    PlatformDescriptor {
        token: "linux-x64",
        os: OsFamily::Linux,
        arch: Arch::X86_64,
        triple: "x86_64-unknown-linux-gnu",
        archive_template: ARCHIVE_TEMPLATE,
        runtime_interpreter: "bin/python3",
        env_interpreter: "bin/python",
        executable_dir: "bin",
        shared_library_dir: "lib",
    },
    PlatformDescriptor {
        token: "windows-x64",
        os: OsFamily::Windows,
        arch: Arch::X86_64,
        triple: "x86_64-pc-windows-msvc",
        archive_template: ARCHIVE_TEMPLATE,
        runtime_interpreter: "python.exe",
        env_interpreter: "Scripts/python.exe",
        executable_dir: "Scripts",
        shared_library_dir: "DLLs",
    },
];

impl Platform {
    /// Every supported platform, in canonical order.
    pub const ALL: [Platform; 4] = [
        Platform::MacOsArm64,
        Platform::MacOsX64,
        Platform::LinuxX64,
        Platform::WindowsX64,
    ];

    /// Naming conventions for this platform.
    pub fn descriptor(self) -> &'static PlatformDescriptor {
        match self {
            Platform::MacOsArm64 => &DESCRIPTORS[0],
            Platform::MacOsX64 => &DESCRIPTORS[1],
            Platform::LinuxX64 => &DESCRIPTORS[2],
            Platform::WindowsX64 => &DESCRIPTORS[3],
        }
    }

    /// Canonical token.
    pub fn token(self) -> &'static str {
        self.descriptor().token
    }

    /// Maps host `std::env::consts::OS` / `ARCH` style strings to a platform.
    ///
    /// Darwin on arm64 is Apple Silicon; any other Darwin architecture is
    /// treated as Intel. Linux and Windows map to their x64 builds.
    pub fn detect(os: &str, arch: &str) -> Option<Platform> {
        match os {
            "macos" | "darwin" => match arch {
                "aarch64" | "arm64" => Some(Platform::MacOsArm64),
                _ => Some(Platform::MacOsX64),
            },
            "linux" => Some(Platform::LinuxX64),
            "windows" => Some(Platform::WindowsX64),
            _ => None,
        }
    }

    /// Detects the platform of the running host.
    pub fn host() -> Result<Platform> {
        let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
        Self::detect(os, arch).ok_or_else(|| Error::UnknownPlatform {
            token: format!("{os}/{arch} (host)"),
            valid: valid_tokens(),
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Platform::ALL
            .into_iter()
            .find(|p| p.token() == s)
            .ok_or_else(|| Error::UnknownPlatform {
                token: s.to_string(),
                valid: valid_tokens(),
            })
    }
}

/// Comma-separated list of accepted platform tokens.
pub fn valid_tokens() -> String {
    Platform::ALL
        .iter()
        .map(|p| p.token())
        .collect::<Vec<_>>()
        .join(", ")
}

impl PlatformDescriptor {
    /// Archive filename for a runtime version and release tag.
    pub fn archive_filename(&self, version: &str, release: &str) -> String {
        self.archive_template
            .replace("{version}", version)
            .replace("{release}", release)
            .replace("{triple}", self.triple)
    }

    /// Runtime interpreter path under an extraction directory.
    pub fn runtime_interpreter_in(&self, runtime_dir: &Path) -> PathBuf {
        runtime_dir.join(self.runtime_interpreter)
    }

    /// Environment interpreter path under an environment directory.
    pub fn env_interpreter_in(&self, env_dir: &Path) -> PathBuf {
        env_dir.join(self.env_interpreter)
    }
}

/// Which platforms a run targets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PlatformSelection {
    /// A single platform
    One(Platform),
    /// Every supported platform
    All,
}

impl PlatformSelection {
    /// Resolves an optional command-line token; `None` detects the host.
    pub fn resolve(token: Option<&str>) -> Result<Self> {
        match token {
            Some(ALL_TOKEN) => Ok(PlatformSelection::All),
            Some(token) => Ok(PlatformSelection::One(token.parse()?)),
            None => Ok(PlatformSelection::One(Platform::host()?)),
        }
    }

    /// Platforms in run order.
    pub fn platforms(&self) -> Vec<Platform> {
        match self {
            PlatformSelection::One(p) => vec![*p],
            PlatformSelection::All => Platform::ALL.to_vec(),
        }
    }

    /// Whether more than one bundle is produced.
    pub fn is_multi(&self) -> bool {
        matches!(self, PlatformSelection::All)
    }
}
