use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use crate::{
    exec::Elevation,
    logging::LogLevel,
    platform,
    strategy::{AnchorCandidate, TrustAnchorStrategy},
};

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    log_level: Option<String>,
    elevation: Option<String>,
    #[serde(default)]
    anchor: Vec<RawAnchor>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAnchor {
    dir: String,
    pattern: String,
    refresh: Vec<String>,
}

#[derive(Debug)]
pub struct AppConfig {
    pub log_level: LogLevel,
    pub elevation: Elevation,
    pub anchors: Vec<AnchorCandidate>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            elevation: Elevation::Auto,
            anchors: platform::default_anchors(),
        }
    }
}

impl AppConfig {
    /// An explicit path must exist; otherwise fall back to the per-user file,
    /// and to built-in defaults when that is absent too.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&raw, &path.display().to_string())
    }

    fn from_toml_str(raw: &str, source: &str) -> Result<Self> {
        let parsed: RawConfig =
            toml::from_str(raw).with_context(|| format!("failed to parse TOML: {}", source))?;

        let log_level = match parsed.log_level.as_deref() {
            None => LogLevel::Info,
            Some(v) => LogLevel::parse(v)?,
        };

        let elevation = match parsed.elevation.as_deref() {
            None => Elevation::Auto,
            Some(v) => Elevation::parse(v)
                .ok_or_else(|| anyhow!("invalid elevation: {} (expected auto or never)", v))?,
        };

        // An explicit anchor list replaces the built-in table wholesale, in file order.
        let anchors = if parsed.anchor.is_empty() {
            platform::default_anchors()
        } else {
            let mut anchors = Vec::with_capacity(parsed.anchor.len());
            let mut dir_seen = HashSet::<PathBuf>::new();
            for row in parsed.anchor {
                let dir = row.dir.trim();
                if dir.is_empty() {
                    bail!("anchor.dir contains empty value");
                }
                if !dir_seen.insert(PathBuf::from(dir)) {
                    bail!("duplicate anchor.dir: {}", dir);
                }
                let strategy = TrustAnchorStrategy::new(row.pattern, row.refresh)
                    .map_err(|e| anyhow!("invalid anchor for {}: {}", dir, e))?;
                anchors.push(AnchorCandidate::new(dir, strategy));
            }
            anchors
        };

        Ok(Self {
            log_level,
            elevation,
            anchors,
        })
    }
}

/// Home of the user who invoked us. Under sudo that is SUDO_USER rather than
/// root, so `sudo trustanchor install` reads the caller's config file.
fn resolve_home() -> Option<PathBuf> {
    let sudo_home = std::env::var("SUDO_USER")
        .ok()
        .filter(|user| !user.trim().is_empty() && user != "root")
        .and_then(|user| homedir::home(&user).ok().flatten());
    if sudo_home.is_some() {
        return sudo_home;
    }

    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

pub fn default_config_path() -> Option<PathBuf> {
    resolve_home().map(|h| {
        h.join(".config")
            .join(env!("CARGO_PKG_NAME"))
            .join(CONFIG_FILE_NAME)
    })
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use super::{AppConfig, default_config_path};
    use crate::{exec::Elevation, logging::LogLevel, platform};

    const TWO_ANCHORS: &str = r#"
log_level = "debug"
elevation = "never"

[[anchor]]
dir = "/opt/trust/b"
pattern = "/opt/trust/b/%s.crt"
refresh = ["rebuild-b"]

[[anchor]]
dir = "/opt/trust/a"
pattern = "/opt/trust/a/%s.pem"
refresh = ["rebuild-a", "--all"]
"#;

    #[test]
    fn accept_valid_config_in_file_order() {
        let config = AppConfig::from_toml_str(TWO_ANCHORS, "test").expect("valid config");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.elevation, Elevation::Never);
        assert_eq!(config.anchors.len(), 2);
        assert_eq!(config.anchors[0].probe_dir, PathBuf::from("/opt/trust/b"));
        assert_eq!(
            config.anchors[1].strategy.refresh_command(),
            ["rebuild-a", "--all"]
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("", "test").expect("empty config");
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.elevation, Elevation::Auto);
        assert_eq!(config.anchors, platform::default_anchors());
    }

    #[test]
    fn reject_pattern_without_placeholder() {
        let toml = TWO_ANCHORS.replace("/opt/trust/b/%s.crt", "/opt/trust/b/root.crt");
        let err = AppConfig::from_toml_str(&toml, "test").expect_err("no placeholder");
        assert!(err.to_string().contains("exactly one %s"));
    }

    #[test]
    fn reject_empty_refresh_command() {
        let toml = TWO_ANCHORS.replace(r#"refresh = ["rebuild-b"]"#, "refresh = []");
        let err = AppConfig::from_toml_str(&toml, "test").expect_err("empty refresh");
        assert!(err.to_string().contains("refresh command"));
    }

    #[test]
    fn reject_duplicate_anchor_dir() {
        let toml = TWO_ANCHORS.replace(r#"dir = "/opt/trust/a""#, r#"dir = "/opt/trust/b""#);
        let err = AppConfig::from_toml_str(&toml, "test").expect_err("duplicate dir");
        assert!(err.to_string().contains("duplicate anchor.dir"));
    }

    #[test]
    fn reject_invalid_elevation() {
        let toml = TWO_ANCHORS.replace(r#"elevation = "never""#, r#"elevation = "always""#);
        let err = AppConfig::from_toml_str(&toml, "test").expect_err("bad elevation");
        assert!(err.to_string().contains("invalid elevation"));
    }

    #[test]
    fn reject_invalid_log_level() {
        let toml = TWO_ANCHORS.replace(r#"log_level = "debug""#, r#"log_level = "loud""#);
        let err = AppConfig::from_toml_str(&toml, "test").expect_err("bad log level");
        assert!(err.to_string().contains("invalid log_level"));
    }

    #[test]
    fn reject_unknown_keys() {
        let toml = format!("{}\nretries = 3\n", r#"log_level = "info""#);
        let err = AppConfig::from_toml_str(&toml, "test").expect_err("unknown key");
        assert!(err.to_string().contains("failed to parse TOML"));
    }

    #[test]
    fn load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = AppConfig::load(Some(&path)).expect_err("missing file");
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, TWO_ANCHORS).unwrap();
        let config = AppConfig::load(Some(&path)).expect("config from file");
        assert_eq!(config.anchors.len(), 2);
    }

    #[test]
    fn default_config_path_lives_under_dot_config() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with(".config/trustanchor/config.toml"), "{}", path.display());
        }
    }
}
