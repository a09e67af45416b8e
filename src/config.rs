use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::controller::{
    LoopSettings, DEFAULT_COOLDOWN, DEFAULT_MIN_CONFIDENCE, DEFAULT_TICK_INTERVAL,
};
use crate::detect::{EndpointSettings, ObjectCatalog};
use crate::sampler::{SamplerSettings, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIMENSION};

const DEFAULT_DB_PATH: &str = "ar_assist.db";
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/detect";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_SOURCE: &str = "stub://camera";

#[derive(Debug, Deserialize, Default)]
struct AssistConfigFile {
    db_path: Option<String>,
    source: Option<String>,
    endpoint: Option<EndpointConfigFile>,
    detection: Option<DetectionConfigFile>,
    sampling: Option<SamplingConfigFile>,
    objects: Option<ObjectsConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct EndpointConfigFile {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    interval_ms: Option<u64>,
    cooldown_ms: Option<u64>,
    min_confidence: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct SamplingConfigFile {
    max_dimension: Option<u32>,
    jpeg_quality: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct ObjectsConfigFile {
    extra: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct AssistConfig {
    pub db_path: String,
    pub source: String,
    pub endpoint: EndpointSettings,
    pub detection: LoopSettings,
    pub sampling: SamplerSettings,
    /// Additional object ids, `id` or `id:Display Name`.
    pub extra_objects: Vec<String>,
}

impl Default for AssistConfig {
    fn default() -> Self {
        // Infallible: every field falls back to a default.
        Self::from_file(AssistConfigFile::default())
    }
}

impl AssistConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("AR_ASSIST_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Catalog of default objects plus `extra_objects`.
    pub fn catalog(&self) -> Result<ObjectCatalog> {
        let mut catalog = ObjectCatalog::default();
        for entry in &self.extra_objects {
            let (id, name) = match entry.split_once(':') {
                Some((id, name)) => (id.trim(), name.trim()),
                None => (entry.trim(), entry.trim()),
            };
            catalog.register(id, name)?;
        }
        Ok(catalog)
    }

    fn from_file(file: AssistConfigFile) -> Self {
        let db_path = file.db_path.unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let source = file.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        let endpoint = EndpointSettings {
            url: file
                .endpoint
                .as_ref()
                .and_then(|endpoint| endpoint.url.clone())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout: Duration::from_secs(
                file.endpoint
                    .as_ref()
                    .and_then(|endpoint| endpoint.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        };
        let detection = LoopSettings {
            tick_interval: file
                .detection
                .as_ref()
                .and_then(|d| d.interval_ms)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TICK_INTERVAL),
            cooldown: file
                .detection
                .as_ref()
                .and_then(|d| d.cooldown_ms)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_COOLDOWN),
            min_confidence: file
                .detection
                .as_ref()
                .and_then(|d| d.min_confidence)
                .unwrap_or(DEFAULT_MIN_CONFIDENCE),
        };
        let sampling = SamplerSettings {
            max_dimension: file
                .sampling
                .as_ref()
                .and_then(|s| s.max_dimension)
                .unwrap_or(DEFAULT_MAX_DIMENSION),
            jpeg_quality: file
                .sampling
                .as_ref()
                .and_then(|s| s.jpeg_quality)
                .unwrap_or(DEFAULT_JPEG_QUALITY),
        };
        let extra_objects = file.objects.and_then(|o| o.extra).unwrap_or_default();
        Self {
            db_path,
            source,
            endpoint,
            detection,
            sampling,
            extra_objects,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("AR_ASSIST_ENDPOINT") {
            if !url.trim().is_empty() {
                self.endpoint.url = url.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("AR_ASSIST_DB_PATH") {
            if !path.trim().is_empty() {
                self.db_path = path;
            }
        }
        if let Ok(source) = std::env::var("AR_ASSIST_SOURCE") {
            if !source.trim().is_empty() {
                self.source = source;
            }
        }
        if let Ok(value) = std::env::var("AR_ASSIST_MIN_CONFIDENCE") {
            self.detection.min_confidence = value.trim().parse().map_err(|_| {
                anyhow!("AR_ASSIST_MIN_CONFIDENCE must be an integer between 0 and 100")
            })?;
        }
        if let Ok(value) = std::env::var("AR_ASSIST_INTERVAL_MS") {
            self.detection.tick_interval = parse_millis("AR_ASSIST_INTERVAL_MS", &value)?;
        }
        if let Ok(value) = std::env::var("AR_ASSIST_COOLDOWN_MS") {
            self.detection.cooldown = parse_millis("AR_ASSIST_COOLDOWN_MS", &value)?;
        }
        if let Ok(objects) = std::env::var("AR_ASSIST_EXTRA_OBJECTS") {
            let parsed = split_csv(&objects);
            if !parsed.is_empty() {
                self.extra_objects = parsed;
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.detection.min_confidence > 100 {
            return Err(anyhow!("min_confidence must be between 0 and 100"));
        }
        if self.detection.tick_interval.is_zero() {
            return Err(anyhow!("detection interval must be greater than zero"));
        }
        if self.detection.cooldown.is_zero() {
            return Err(anyhow!("cooldown must be greater than zero"));
        }
        if self.endpoint.timeout.is_zero() {
            return Err(anyhow!("endpoint timeout must be greater than zero"));
        }
        if self.sampling.max_dimension == 0 {
            return Err(anyhow!("max_dimension must be greater than zero"));
        }
        if !(1..=100).contains(&self.sampling.jpeg_quality) {
            return Err(anyhow!("jpeg_quality must be between 1 and 100"));
        }
        if !self.endpoint.url.starts_with("stub://") {
            let url = Url::parse(&self.endpoint.url)
                .map_err(|e| anyhow!("invalid endpoint url {}: {}", self.endpoint.url, e))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(anyhow!(
                    "endpoint url must be http(s) or stub://, got {}",
                    url.scheme()
                ));
            }
        }
        self.catalog()?;
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<AssistConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    let millis: u64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow!("{} must be an integer number of milliseconds", key))?;
    Ok(Duration::from_millis(millis))
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
