use crate::backend::BackendKind;
use directories::BaseDirs;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3002/api/chat";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub provider: BackendKind,
    pub endpoint: Url,
    pub export_dir: Option<PathBuf>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            provider: BackendKind::Http,
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid url"),
            export_dir: None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {detail}")]
    Unreadable { path: PathBuf, detail: String },
    #[error("configuration invalid: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Unreadable { path, .. } => {
                format!("Could not read {}. Check its permissions.", path.display())
            }
            Self::Invalid(detail) => format!("DW-GPT not configured—{detail}. Update dwgpt.yaml."),
        }
    }
}

/// Values taken from `DWGPT_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub provider: Option<String>,
    pub endpoint: Option<String>,
    pub export_dir: Option<String>,
}

impl EnvOverrides {
    pub fn from_environment() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            provider: read("DWGPT_PROVIDER"),
            endpoint: read("DWGPT_ENDPOINT"),
            export_dir: read("DWGPT_EXPORT_DIR"),
        }
    }
}

impl ClientSettings {
    /// Load `dwgpt.yaml` if one exists, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let section = match locate_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading client settings");
                let contents = fs::read_to_string(&path).map_err(|err| ConfigError::Unreadable {
                    path: path.clone(),
                    detail: err.to_string(),
                })?;
                parse_config(&contents)?
            }
            None => ClientSection::default(),
        };
        resolve_settings(section, EnvOverrides::from_environment())
    }

    /// Directory exports are written to.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(crate::export::default_export_dir)
    }
}

pub fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| ConfigError::Invalid(format!("invalid endpoint `{raw}`: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid(format!(
            "endpoint scheme must be http or https, got `{other}`"
        ))),
    }
}

fn parse_config(contents: &str) -> Result<ClientSection, ConfigError> {
    let config: DwgptConfig = serde_yaml::from_str(contents)
        .map_err(|err| ConfigError::Invalid(format!("invalid dwgpt.yaml: {err}")))?;
    Ok(config.client.unwrap_or_default())
}

fn resolve_settings(
    section: ClientSection,
    env: EnvOverrides,
) -> Result<ClientSettings, ConfigError> {
    let provider = match env.provider {
        Some(raw) => BackendKind::parse(&raw)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown provider `{raw}`")))?,
        None => section.provider.unwrap_or(BackendKind::Http),
    };
    let endpoint = match env.endpoint.or(section.endpoint) {
        Some(raw) => parse_endpoint(&raw)?,
        None => ClientSettings::default().endpoint,
    };
    let export_dir = env
        .export_dir
        .map(PathBuf::from)
        .or(section.export_dir);
    Ok(ClientSettings {
        provider,
        endpoint,
        export_dir,
    })
}

fn locate_config_file() -> Option<PathBuf> {
    config_candidates().into_iter().find(|path| path.exists())
}

fn config_candidates() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(base) = BaseDirs::new() {
        let config_dir = base.config_dir().join("dwgpt");
        paths.push(config_dir.join("dwgpt.yaml"));
        paths.push(config_dir.join("dwgpt.yml"));
        let home_dir = base.home_dir();
        paths.push(home_dir.join(".dwgpt").join("dwgpt.yaml"));
        paths.push(home_dir.join(".dwgpt").join("dwgpt.yml"));
    } else {
        paths.push(PathBuf::from("dwgpt.yaml"));
        paths.push(PathBuf::from("dwgpt.yml"));
    }
    paths
}

#[derive(Debug, Deserialize)]
struct DwgptConfig {
    client: Option<ClientSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ClientSection {
    provider: Option<BackendKind>,
    endpoint: Option<String>,
    export_dir: Option<PathBuf>,
}
