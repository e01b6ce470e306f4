use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub debug: bool,
    /// File-rotation toggles, accepted and ignored per §6.
    #[serde(default)]
    pub logger: toml::value::Table,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub compression: CompressionSection,
    #[serde(default)]
    pub world: WorldSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompressionSection {
    #[serde(default = "default_compression_threshold")]
    pub threshold: i32,
    #[serde(default = "default_compression_level")]
    pub level: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorldSection {
    #[serde(default = "default_render_distance")]
    pub render_distance: i32,
    #[serde(default)]
    pub schematic: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    25565
}

fn default_compression_threshold() -> i32 {
    256
}

fn default_compression_level() -> u32 {
    6
}

fn default_render_distance() -> i32 {
    8
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            compression: CompressionSection::default(),
            world: WorldSection::default(),
        }
    }
}

impl Default for CompressionSection {
    fn default() -> Self {
        Self {
            threshold: default_compression_threshold(),
            level: default_compression_level(),
        }
    }
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            render_distance: default_render_distance(),
            schematic: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            debug: false,
            logger: toml::value::Table::new(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ServerConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ServerConfig::load(Path::new("/nonexistent/server.toml")).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 25565);
        assert_eq!(config.server.compression.threshold, 256);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "[server]\nport = 25566\n").unwrap();
        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.server.port, 25566);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.world.render_distance, 8);
    }

    #[test]
    fn negative_compression_threshold_disables_compression() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "[server.compression]\nthreshold = -1\n").unwrap();
        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.server.compression.threshold, -1);
    }
}
