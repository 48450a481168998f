//! Native binary detection.
//!
//! The executable directory of an environment mixes real Mach-O executables
//! with text launchers written by the installers. Only the former can carry
//! a code signature.

use crate::bundler::error::{ErrorExt, Result};
use goblin::Hint;
use std::io::Read;
use std::path::Path;

/// Size of the header goblin needs to classify a file.
const HINT_LEN: usize = 16;

/// Returns `true` when the file at `path` is a Mach-O image (thin or fat).
///
/// Files shorter than the probe header are never native.
pub fn is_native_binary(path: &Path) -> Result<bool> {
    let mut file = std::fs::File::open(path).fs_context("failed to open binary", path)?;
    let mut header = [0u8; HINT_LEN];
    match file.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(false),
        Err(e) => return Err(e).fs_context("failed to read binary header", path),
    }

    Ok(match goblin::peek_bytes(&header) {
        Ok(hint) => is_mach_hint(&hint),
        Err(e) => {
            log::debug!("goblin could not classify {}: {}", path.display(), e);
            false
        }
    })
}

fn is_mach_hint(hint: &Hint) -> bool {
    matches!(hint, Hint::Mach(_) | Hint::MachFat(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(bytes: &[u8]) -> bool {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("candidate");
        std::fs::write(&path, bytes).unwrap();
        is_native_binary(&path).unwrap()
    }

    fn padded(prefix: &[u8]) -> Vec<u8> {
        let mut bytes = prefix.to_vec();
        bytes.resize(64, 0);
        bytes
    }

    #[test]
    fn thin_mach_o_is_native() {
        // MH_MAGIC_64, little endian, followed by CPU_TYPE_ARM64.
        assert!(probe(&padded(&[0xcf, 0xfa, 0xed, 0xfe, 0x0c, 0x00, 0x00, 0x01])));
    }

    #[test]
    fn script_launcher_is_not_native() {
        assert!(!probe(
            b"#!/opt/bundle/bin/python\n# -*- coding: utf-8 -*-\nimport sys\n"
        ));
    }

    #[test]
    fn elf_is_not_native() {
        assert!(!probe(&padded(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0])));
    }

    #[test]
    fn short_file_is_not_native() {
        assert!(!probe(&[0xcf, 0xfa, 0xed, 0xfe]));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(is_native_binary(&tmp.path().join("absent")).is_err());
    }
}
