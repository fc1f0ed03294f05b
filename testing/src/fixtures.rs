use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use storage::StoreFormat;
use tempfile::TempDir;

/// A configuration file inside its own temporary directory.
///
/// The directory is removed when the fixture is dropped.
pub struct ConfigFileFixture {
    dir: TempDir,
    path: PathBuf,
    format: StoreFormat,
}

impl ConfigFileFixture {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> StoreFormat {
        self.format
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn contents(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))
    }

    /// Replace the file contents, as an external editor would.
    pub fn overwrite(&self, contents: &str) -> Result<()> {
        std::fs::write(&self.path, contents)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

fn file_name(format: StoreFormat) -> String {
    match format {
        StoreFormat::Env => ".env".to_string(),
        other => format!("{}.{}", crate::unique_id("config"), other.as_str()),
    }
}

/// Path for a config file in `format` that does not exist yet.
pub fn empty_config(format: StoreFormat) -> Result<ConfigFileFixture> {
    let dir = TempDir::new().context("creating temp dir")?;
    let path = dir.path().join(file_name(format));
    Ok(ConfigFileFixture { dir, path, format })
}

/// Config file in `format` with the given contents.
pub fn config_file(format: StoreFormat, contents: &str) -> Result<ConfigFileFixture> {
    let fixture = empty_config(format)?;
    fixture.overwrite(contents)?;
    Ok(fixture)
}

/// Config file in `format` holding [`sample_document`].
pub fn sample_config(format: StoreFormat) -> Result<ConfigFileFixture> {
    config_file(format, sample_document(format))
}

/// The same settings in each format:
/// `Server.host = localhost`, `Server.port = 8080`,
/// `Server.tls.enabled = true`.
///
/// The env document is flat: `APP_HOST`, `APP_PORT` and `APP_TLS_ENABLED`.
pub fn sample_document(format: StoreFormat) -> &'static str {
    match format {
        StoreFormat::Ini => "[Server]\nhost = localhost\nport = 8080\n\n[Server.tls]\nenabled = true\n",
        StoreFormat::Json => {
            r#"{"Server": {"host": "localhost", "port": 8080, "tls": {"enabled": true}}}"#
        }
        StoreFormat::Yaml => "Server:\n  host: localhost\n  port: 8080\n  tls:\n    enabled: true\n",
        StoreFormat::Toml => {
            "[Server]\nhost = \"localhost\"\nport = 8080\n\n[Server.tls]\nenabled = true\n"
        }
        StoreFormat::Env => "APP_HOST=localhost\nAPP_PORT=8080\nAPP_TLS_ENABLED=true\n",
    }
}
