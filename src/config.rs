use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

const DEFAULT_MAX_BODY_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub auth: Auth,
    pub vault: Vault,
    pub logging: Logging,
    pub limits: Limits,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Server {
    pub bind_addr: String,
    pub port: u16,
    /// Human size such as `"100MB"`; see [`parse_size`].
    pub max_body_size: String,
}

impl Default for Server {
    fn default() -> Self {
        Self { bind_addr: "0.0.0.0".to_string(), port: 18080, max_body_size: "100MB".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Auth {
    pub token: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Vault {
    pub path: PathBuf,
    pub subdir: String,
    pub serialize_saves: bool,
}

impl Default for Vault {
    fn default() -> Self {
        Self { path: PathBuf::new(), subdir: "Inbox/WebClips".to_string(), serialize_saves: false }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
}

impl Default for Logging {
    fn default() -> Self {
        Self { level: "info".to_string(), json: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Limits {
    pub per_token_rps: u32,
    pub per_token_burst: u32,
    pub global_rps: u32,
    pub global_burst: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self { per_token_rps: 10, per_token_burst: 20, global_rps: 50, global_burst: 100 }
    }
}

impl Config {
    /// Reads `path` (toml, or json/yaml by extension), falling back to
    /// defaults when the file does not exist, then applies `CLIPVAULT_*`
    /// environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut cfg = match fs::read_to_string(path) {
            Ok(raw) => Self::parse(path, &raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub(crate) fn parse(path: &Path, raw: &str) -> anyhow::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_str(raw)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(raw)?),
            _ => Ok(toml::from_str(raw)?),
        }
    }

    /// Empty values and unparseable numbers are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = var("CLIPVAULT_BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(port) = var("CLIPVAULT_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(v) = var("CLIPVAULT_MAX_BODY_SIZE") {
            self.server.max_body_size = v;
        }
        if let Some(v) = var("CLIPVAULT_AUTH_TOKEN") {
            self.auth.token = v;
        }
        if let Some(v) = var("CLIPVAULT_VAULT_PATH") {
            self.vault.path = PathBuf::from(v);
        }
        if let Some(v) = var("CLIPVAULT_VAULT_SUBDIR") {
            self.vault.subdir = v;
        }
        if let Some(v) = var("CLIPVAULT_LOG_LEVEL") {
            self.logging.level = v;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth.token.trim().is_empty() { anyhow::bail!("auth.token is required"); }
        if self.vault.path.as_os_str().is_empty() { anyhow::bail!("vault.path is required"); }
        if self.server.port == 0 { anyhow::bail!("server.port must be between 1 and 65535"); }
        let subdir = Path::new(&self.vault.subdir);
        if subdir.is_absolute()
            || self.vault.subdir.contains('~')
            || subdir.components().any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            anyhow::bail!("vault.subdir must be a relative path inside the vault: {}", self.vault.subdir);
        }
        if self.limits.per_token_rps == 0 || self.limits.global_rps == 0 {
            anyhow::bail!("rate limits must be > 0");
        }
        if self.limits.per_token_burst == 0 || self.limits.global_burst == 0 {
            anyhow::bail!("rate limit bursts must be > 0");
        }
        Ok(())
    }

    pub fn max_body_bytes(&self) -> usize {
        let bytes = parse_size(&self.server.max_body_size).unwrap_or(DEFAULT_MAX_BODY_BYTES);
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }
}

/// `"100MB"`, `"512kb"`, `"2GB"`, `"10B"` or a bare byte count.
pub fn parse_size(raw: &str) -> Option<u64> {
    let upper = raw.trim().to_ascii_uppercase();
    let (digits, multiplier) = [("GB", 1u64 << 30), ("MB", 1 << 20), ("KB", 1 << 10), ("B", 1)]
        .iter()
        .find_map(|(suffix, m)| upper.strip_suffix(*suffix).map(|d| (d, *m)))
        .unwrap_or((upper.as_str(), 1));
    digits.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}

pub fn canonical_root(root: &Path) -> anyhow::Result<PathBuf> {
    let c = dunce::canonicalize(root)?;
    Ok(c)
}
