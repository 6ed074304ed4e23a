//! Dotenv-style key/value store
//!
//! Holds the environment values the gateway settings are seeded from. CRUD
//! operations rewrite only the targeted line and keep comments, blank lines
//! and unknown content in place; writes go through the same atomic writer as
//! the configuration artifacts.

use crate::error::{Result, SyncError};
use crate::writer;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all variables in file order. A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<(String, String)>> {
        let content = self.read_content()?;
        Ok(content
            .lines()
            .filter_map(parse_line)
            .collect())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v))
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Set or update a variable, keeping every other line as-is
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;

        let content = self.read_content()?;
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
        let entry = format_entry(key, value);

        let mut found = false;
        for line in lines.iter_mut() {
            if line_key(line) == Some(key) {
                *line = entry.clone();
                found = true;
                break;
            }
        }
        if !found {
            lines.push(entry);
        }

        self.write_lines(&lines)?;
        debug!(path = %self.path.display(), key, "Environment variable set");
        Ok(())
    }

    /// Remove a variable if present. Returns whether anything was removed.
    pub fn unset(&self, key: &str) -> Result<bool> {
        validate_key(key)?;

        let content = self.read_content()?;
        let before: Vec<String> = content.lines().map(str::to_string).collect();
        let after: Vec<String> = before
            .iter()
            .filter(|line| line_key(line) != Some(key))
            .cloned()
            .collect();

        if after.len() == before.len() {
            return Ok(false);
        }

        self.write_lines(&after)?;
        debug!(path = %self.path.display(), key, "Environment variable removed");
        Ok(true)
    }

    fn read_content(&self) -> Result<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(SyncError::io("read", &self.path, e)),
        }
    }

    fn write_lines(&self, lines: &[String]) -> Result<()> {
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        writer::write_atomic(&self.path, &text)
    }
}

/// Keys must be shell-compatible identifiers
fn validate_key(key: &str) -> Result<()> {
    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid {
        return Err(SyncError::Validation {
            field: "key",
            reason: format!("{:?} is not a valid identifier", key),
        });
    }
    Ok(())
}

fn format_entry(key: &str, value: &str) -> String {
    format!(
        "{}=\"{}\"",
        key,
        value.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Key of a KEY=VALUE line, or None for comments/blank/unparseable lines
fn line_key(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    trimmed.split_once('=').map(|(k, _)| k.trim_end())
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    let value = if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        let quoted = &value[1..value.len() - 1];
        if value.starts_with('"') {
            quoted.replace("\\\"", "\"").replace("\\\\", "\\")
        } else {
            quoted.to_string()
        }
    } else {
        value.to_string()
    };

    Some((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(tmp: &TempDir) -> EnvFile {
        EnvFile::new(tmp.path().join(".env"))
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(env(&tmp).read_all().unwrap().is_empty());
    }

    #[test]
    fn test_set_get_round_trip() {
        let tmp = TempDir::new().unwrap();
        let env = env(&tmp);

        env.set("SERVER_NAME", "example.com").unwrap();
        env.set("PORT", "8000").unwrap();

        assert_eq!(env.get("SERVER_NAME").unwrap().as_deref(), Some("example.com"));
        assert_eq!(env.get("PORT").unwrap().as_deref(), Some("8000"));
        assert_eq!(env.get("MISSING").unwrap(), None);
    }

    #[test]
    fn test_set_updates_in_place_and_preserves_comments() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "# gateway settings\nPORT=8000\n\nHOST=localhost\n").unwrap();

        let env = EnvFile::new(&path);
        env.set("PORT", "9000").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# gateway settings\n"));
        assert!(content.contains("PORT=\"9000\""));
        assert!(content.contains("HOST=localhost"));
        // PORT line replaced, not appended
        assert_eq!(content.matches("PORT").count(), 1);
    }

    #[test]
    fn test_unset_removes_only_target_line() {
        let tmp = TempDir::new().unwrap();
        let env = env(&tmp);
        env.set("A", "1").unwrap();
        env.set("B", "2").unwrap();

        assert!(env.unset("A").unwrap());
        assert!(!env.unset("A").unwrap());
        assert_eq!(env.get("A").unwrap(), None);
        assert_eq!(env.get("B").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_quoted_values_parse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "A=\"with space\"\nB='single'\nC=raw\n").unwrap();

        let all = EnvFile::new(&path).read_all().unwrap();
        assert_eq!(
            all,
            vec![
                ("A".to_string(), "with space".to_string()),
                ("B".to_string(), "single".to_string()),
                ("C".to_string(), "raw".to_string()),
            ]
        );
    }

    #[test]
    fn test_value_with_quotes_round_trips() {
        let tmp = TempDir::new().unwrap();
        let env = env(&tmp);
        env.set("MOTD", "say \"hi\"").unwrap();
        assert_eq!(env.get("MOTD").unwrap().as_deref(), Some("say \"hi\""));
    }

    #[test]
    fn test_invalid_key_rejected_without_side_effect() {
        let tmp = TempDir::new().unwrap();
        let env = env(&tmp);

        for bad in ["1PORT", "MY-KEY", "", "HAS SPACE"] {
            let err = env.set(bad, "x").unwrap_err();
            assert!(
                matches!(err, SyncError::Validation { field: "key", .. }),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(!env.path().exists());
    }
}
