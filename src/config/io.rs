use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Maximum size for a config file (10 MB).
pub const MAX_CONFIG_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum recursion depth for config includes.
pub const MAX_INCLUDE_DEPTH: usize = 16;

/// On-disk formats the loader understands, chosen by file extension.
/// Anything unrecognized is treated as JSON5 (a superset of JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json5,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            Some("toml") => Self::Toml,
            _ => Self::Json5,
        }
    }

    pub fn parse(self, content: &str) -> Result<serde_json::Value> {
        let value = match self {
            Self::Yaml => serde_yaml::from_str(content)?,
            Self::Toml => toml::from_str(content)?,
            Self::Json5 => json5::from_str(content)?,
        };
        Ok(value)
    }
}

/// Read a configuration file into a raw JSON value.
///
/// Hardened against a few filesystem tricks: oversized files, symlinks at
/// the final path component, and hardlinked files are all rejected.
pub fn read_config_snapshot(path: &Path) -> Result<serde_json::Value> {
    let metadata = std::fs::symlink_metadata(path)
        .with_context(|| format!("Cannot stat config file '{}'", path.display()))?;

    #[cfg(unix)]
    if metadata.file_type().is_symlink() {
        bail!(
            "Config file '{}' is a symlink — refusing to follow",
            path.display()
        );
    }

    let canonical = path
        .canonicalize()
        .with_context(|| format!("Cannot canonicalize config path '{}'", path.display()))?;
    let real_metadata = std::fs::metadata(&canonical)
        .with_context(|| format!("Cannot stat canonical config path '{}'", canonical.display()))?;

    if real_metadata.len() > MAX_CONFIG_FILE_BYTES {
        bail!(
            "Config file '{}' is {} bytes, exceeds limit of {} bytes",
            path.display(),
            real_metadata.len(),
            MAX_CONFIG_FILE_BYTES,
        );
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if real_metadata.is_file() && real_metadata.nlink() > 1 {
            bail!(
                "Config file '{}' has {} hard links — refusing to read",
                path.display(),
                real_metadata.nlink(),
            );
        }
    }

    let content = std::fs::read_to_string(&canonical)
        .with_context(|| format!("Failed to read config file '{}'", canonical.display()))?;

    ConfigFormat::from_path(&canonical).parse(&content)
}

/// Read a config file, resolving `$include` directives relative to it.
///
/// Included values merge *under* the including file: an explicitly set key
/// always wins over an included one. Depth is capped to break cycles.
pub fn read_config_with_includes(path: &Path, depth: usize) -> Result<serde_json::Value> {
    if depth > MAX_INCLUDE_DEPTH {
        bail!(
            "Config include depth exceeded {} at '{}'",
            MAX_INCLUDE_DEPTH,
            path.display(),
        );
    }

    let mut config = read_config_snapshot(path)?;

    let Some(includes) = config
        .as_object()
        .and_then(|obj| obj.get("$include"))
        .cloned()
    else {
        return Ok(config);
    };

    let include_paths = match includes {
        serde_json::Value::String(s) => vec![s],
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => {
            warn!("Invalid $include value in '{}', skipping", path.display());
            vec![]
        }
    };

    for include_path_str in &include_paths {
        let include_path = if Path::new(include_path_str).is_absolute() {
            PathBuf::from(include_path_str)
        } else {
            path.parent()
                .unwrap_or_else(|| Path::new("."))
                .join(include_path_str)
        };

        match read_config_with_includes(&include_path, depth + 1) {
            Ok(included) => merge_config_values(&mut config, &included),
            Err(e) => {
                let msg = e.to_string();
                // Cycle and tamper rejections are fatal; a merely missing
                // include is not.
                if msg.contains("depth exceeded")
                    || msg.contains("symlink")
                    || msg.contains("hard links")
                {
                    return Err(e);
                }
                warn!(
                    "Failed to include config '{}': {}",
                    include_path.display(),
                    e
                );
            }
        }
    }

    if let Some(obj) = config.as_object_mut() {
        obj.remove("$include");
    }

    Ok(config)
}

/// Deep merge, with existing keys in `target` taking precedence at the
/// leaves.
fn merge_config_values(target: &mut serde_json::Value, source: &serde_json::Value) {
    match (target, source) {
        (serde_json::Value::Object(target_map), serde_json::Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(key) {
                    Some(existing) => merge_config_values(existing, value),
                    None => {
                        target_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => {
            if target.is_null() {
                *target = source.clone();
            }
        }
    }
}

/// Content hash of a configuration snapshot, for change detection.
pub fn config_snapshot_hash(value: &serde_json::Value) -> String {
    use sha2::{Digest, Sha256};
    let canonical = serde_json::to_string(value).unwrap_or_default();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// Write a configuration value to a JSON file.
pub fn write_config_file(path: &Path, config: &serde_json::Value) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn format_chosen_by_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("maestro.yaml")),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("maestro.toml")),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("maestro.json")),
            ConfigFormat::Json5
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("maestro")),
            ConfigFormat::Json5
        );
    }

    #[test]
    fn read_json_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.json");
        fs::write(&file, r#"{"agent": {"assistant": {}}}"#).unwrap();

        let config = read_config_snapshot(&file).unwrap();
        assert!(config["agent"]["assistant"].is_object());
    }

    #[test]
    fn read_yaml_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.yaml");
        fs::write(&file, "agent:\n  assistant: {}\n").unwrap();

        let config = read_config_snapshot(&file).unwrap();
        assert!(config["agent"]["assistant"].is_object());
    }

    #[test]
    fn json5_comments_accepted() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.json5");
        fs::write(&file, "{\n  // the default agent\n  agent: {assistant: {}},\n}").unwrap();

        let config = read_config_snapshot(&file).unwrap();
        assert!(config["agent"]["assistant"].is_object());
    }

    #[test]
    fn reject_oversized_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("huge.json");
        let content = "x".repeat((MAX_CONFIG_FILE_BYTES + 1) as usize);
        fs::write(&file, content).unwrap();

        let result = read_config_snapshot(&file);
        assert!(result.unwrap_err().to_string().contains("exceeds limit"));
    }

    #[cfg(unix)]
    #[test]
    fn reject_hardlinked_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.json");
        let link = dir.path().join("alias.json");
        fs::write(&file, "{}").unwrap();
        fs::hard_link(&file, &link).unwrap();

        let result = read_config_snapshot(&file);
        assert!(result.unwrap_err().to_string().contains("hard links"));
    }

    #[cfg(unix)]
    #[test]
    fn reject_symlinked_config() {
        let dir = TempDir::new().unwrap();
        let real_file = dir.path().join("real.json");
        let symlink = dir.path().join("link.json");
        fs::write(&real_file, "{}").unwrap();
        std::os::unix::fs::symlink(&real_file, &symlink).unwrap();

        let result = read_config_snapshot(&symlink);
        assert!(result.unwrap_err().to_string().contains("symlink"));
    }

    #[test]
    fn include_depth_limit() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.json");
        // Self-referencing include
        fs::write(&file, format!(r#"{{"$include": "{}"}}"#, file.display())).unwrap();

        let result = read_config_with_includes(&file, 0);
        assert!(result.unwrap_err().to_string().contains("depth exceeded"));
    }

    #[test]
    fn includes_merge_with_local_keys_winning() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("base.json");
        let extra = dir.path().join("extra.json");

        fs::write(
            &base,
            r#"{"$include": "extra.json", "agent": {"a": {"platform": "local"}}}"#,
        )
        .unwrap();
        fs::write(
            &extra,
            r#"{"agent": {"a": {"platform": "shared"}, "b": {}}}"#,
        )
        .unwrap();

        let config = read_config_with_includes(&base, 0).unwrap();
        assert_eq!(config["agent"]["a"]["platform"], "local");
        assert!(config["agent"]["b"].is_object());
        assert!(config.get("$include").is_none());
    }

    #[test]
    fn hash_deterministic() {
        let val = serde_json::json!({"agent": {"a": {}}});
        assert_eq!(config_snapshot_hash(&val), config_snapshot_hash(&val));
    }
}
