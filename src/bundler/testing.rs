//! Test fixtures shared by stage tests.
//!
//! The fake runtime is a shell script standing in for a real interpreter. It
//! understands `-m venv --copies <dir>` and writes an environment interpreter
//! that records every invocation in `<env>/calls.log`.

use std::path::{Path, PathBuf};

/// Script body for the fake runtime interpreter.
///
/// Any environment-interpreter call whose arguments contain `fail_pattern`
/// exits 1.
pub(crate) fn fake_runtime_script(fail_pattern: Option<&str>) -> String {
    let fail = match fail_pattern {
        Some(pattern) => format!("case \"$*\" in *\"{pattern}\"*) exit 1;; esac\n"),
        None => String::new(),
    };
    format!(
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "Python 3.12.8"
  exit 0
fi
if [ "$1" = "-m" ] && [ "$2" = "venv" ]; then
  dir="$4"
  mkdir -p "$dir/bin"
  cat > "$dir/bin/python" <<'ENVPY'
#!/bin/sh
echo "$*" >> "$(dirname "$0")/../calls.log"
{fail}if [ "$3" = "version" ]; then echo "Version: 2024.12.0"; fi
exit 0
ENVPY
  chmod +x "$dir/bin/python"
  exit 0
fi
exit 1
"#
    )
}

/// Writes a fake runtime tree into `dir` and returns its interpreter path.
#[cfg(unix)]
pub(crate) fn install_fake_runtime(dir: &Path, fail_pattern: Option<&str>) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(dir.join("bin")).unwrap();
    std::fs::create_dir_all(dir.join("lib")).unwrap();
    std::fs::write(dir.join("lib/libpython3.12.so"), b"core library").unwrap();

    let interpreter = dir.join("bin/python3");
    std::fs::write(&interpreter, fake_runtime_script(fail_pattern)).unwrap();
    std::fs::set_permissions(&interpreter, std::fs::Permissions::from_mode(0o755)).unwrap();
    interpreter
}
