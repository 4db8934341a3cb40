use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::Timings;
use serde::Deserialize;
use url::Url;

pub const SETTINGS_FILE: &str = "screening.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub upload_timeout_seconds: u64,
    pub run_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".into(),
            upload_timeout_seconds: 30,
            run_timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    upload_timeout_seconds: Option<u64>,
    run_timeout_seconds: Option<u64>,
}

impl Settings {
    pub fn timings(&self) -> Timings {
        Timings {
            upload_timeout: Duration::from_secs(self.upload_timeout_seconds),
            run_timeout: Duration::from_secs(self.run_timeout_seconds),
            ..Timings::default()
        }
    }

    pub fn validated_server_url(&self) -> anyhow::Result<Url> {
        Url::parse(self.server_url.trim())
            .with_context(|| format!("invalid server url '{}'", self.server_url))
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

fn load_settings_from(file: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.server_url {
                    settings.server_url = v;
                }
                if let Some(v) = file_cfg.upload_timeout_seconds {
                    settings.upload_timeout_seconds = v;
                }
                if let Some(v) = file_cfg.run_timeout_seconds {
                    settings.run_timeout_seconds = v;
                }
            }
            Err(err) => {
                tracing::warn!(file = %file.display(), error = %err, "ignoring unreadable settings file");
            }
        }
    }

    if let Some(v) = env("SCREENING_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__UPLOAD_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.upload_timeout_seconds = parsed;
        }
    }
    if let Some(v) = env("APP__RUN_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.run_timeout_seconds = parsed;
        }
    }

    settings
}
