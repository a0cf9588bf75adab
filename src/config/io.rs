use anyhow::{bail, Context, Result};
use std::path::Path;

use super::Config;

/// Maximum size for a config file (1 MB).
pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;

/// Read and deserialize a configuration file, picking the format from the
/// extension (YAML, TOML, otherwise JSON5/JSON).
pub fn load_config_file(path: &Path) -> Result<Config> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot stat config file '{}'", path.display()))?;

    if metadata.len() > MAX_CONFIG_FILE_BYTES {
        bail!(
            "Config file '{}' is {} bytes, exceeds limit of {} bytes",
            path.display(),
            metadata.len(),
            MAX_CONFIG_FILE_BYTES,
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => json5::from_str(&content)
            .with_context(|| format!("Invalid JSON config '{}'", path.display()))?,
    };

    Ok(config)
}

/// Write configuration to a JSON file.
pub fn write_config_file(path: &Path, config: &Config) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn read_json5_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("acrobot.json");
        fs::write(
            &file,
            "{ // comments are fine\n search: { limit: 25 }, telegram: { command: 'gloss' } }",
        )
        .unwrap();

        let config = load_config_file(&file).unwrap();
        assert_eq!(config.search.limit, 25);
        assert_eq!(config.telegram.command, "gloss");
        assert_eq!(config.list.default_limit, 10);
    }

    #[test]
    fn read_yaml_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("acrobot.yaml");
        fs::write(&file, "database:\n  poolSize: 2\n").unwrap();

        let config = load_config_file(&file).unwrap();
        assert_eq!(config.database.pool_size, 2);
    }

    #[test]
    fn read_toml_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("acrobot.toml");
        fs::write(&file, "[retry]\nmaxAttempts = 7\n").unwrap();

        let config = load_config_file(&file).unwrap();
        assert_eq!(config.retry.max_attempts, 7);
    }

    #[test]
    fn reject_oversized_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("huge.json");
        let content = "x".repeat((MAX_CONFIG_FILE_BYTES + 1) as usize);
        fs::write(&file, content).unwrap();

        let result = load_config_file(&file);
        assert!(result.unwrap_err().to_string().contains("exceeds limit"));
    }

    #[test]
    fn written_config_reads_back() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("acrobot.json");
        write_config_file(&file, &Config::default()).unwrap();

        let config = load_config_file(&file).unwrap();
        assert_eq!(config.search.limit, Config::default().search.limit);
    }
}
