use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use which::which;

const APP_DIR: &str = "callscribe";

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .context("Unable to determine config directory")
}

pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Resolve an external command to an executable: explicit paths are checked
/// on disk, bare program names are looked up on PATH.
pub fn resolve_command(command: &str) -> Result<PathBuf> {
    let path = Path::new(command);
    if path.components().count() > 1 {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Command '{command}' does not exist"))?;
        if !metadata.is_file() {
            bail!("Command '{command}' is not a file");
        }
        Ok(path.to_path_buf())
    } else {
        which(command).with_context(|| format!("Command '{command}' was not found on PATH"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_command_accepts_existing_programs() {
        assert!(resolve_command("sh").is_ok());
        assert!(resolve_command("/bin/sh").is_ok());
    }

    #[test]
    fn test_resolve_command_rejects_missing_programs() {
        let err = resolve_command("no-such-program-anywhere").unwrap_err();
        assert!(err.to_string().contains("not found on PATH"));

        let err = resolve_command("/nonexistent/bin/whisper").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_command_rejects_directories() {
        let err = resolve_command("/usr/bin/").unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }
}
