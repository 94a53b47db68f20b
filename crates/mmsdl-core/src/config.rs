use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Global configuration loaded from `~/.config/mmsdl/config.toml`.
/// Missing keys take their default value; command-line flags override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MmsdlConfig {
    /// Parallel connections when `-n` is not given.
    pub default_segments: usize,
    /// Bitrate hint sent to the server, bytes per second.
    pub bandwidth: u32,
    /// Size of the chunks workers hand to the writer.
    pub chunk_size: usize,
    /// Chunks buffered between workers and the writer before workers block.
    pub queue_capacity: usize,
    /// Minimum time between two progress reports, in milliseconds.
    pub progress_interval_ms: u64,
    /// Reserve the full file size before writing (positional mode only).
    pub preallocate: bool,
    /// Refuse to degrade to one connection on non-seekable streams.
    pub strict_segments: bool,
    /// Read size for local capture files (None = backend default).
    pub read_block_size: Option<usize>,
}

impl Default for MmsdlConfig {
    fn default() -> Self {
        Self {
            default_segments: 10,
            bandwidth: 1_000_000,
            chunk_size: 16 * 1024,
            queue_capacity: 256,
            progress_interval_ms: 1000,
            preallocate: false,
            strict_segments: false,
            read_block_size: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mmsdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MmsdlConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<MmsdlConfig> {
    if !path.exists() {
        let default_cfg = MmsdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: MmsdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = MmsdlConfig::default();
        assert_eq!(cfg.default_segments, 10);
        assert_eq!(cfg.bandwidth, 1_000_000);
        assert_eq!(cfg.chunk_size, 16384);
        assert_eq!(cfg.queue_capacity, 256);
        assert!(!cfg.preallocate);
        assert!(cfg.read_block_size.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = MmsdlConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: MmsdlConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_partial_values() {
        let toml = r#"
            default_segments = 4
            strict_segments = true
            read_block_size = 8192
        "#;
        let cfg: MmsdlConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.default_segments, 4);
        assert!(cfg.strict_segments);
        assert_eq!(cfg.read_block_size, Some(8192));
        assert_eq!(cfg.chunk_size, 16384);
    }

    #[test]
    fn load_or_init_writes_defaults_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert_eq!(cfg, MmsdlConfig::default());
        assert!(path.exists());

        fs::write(&path, "bandwidth = 56000\n").unwrap();
        let cfg = load_or_init_at(&path).unwrap();
        assert_eq!(cfg.bandwidth, 56000);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_segments = \"many\"\n").unwrap();
        assert!(load_or_init_at(&path).is_err());
    }
}
