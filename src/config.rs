use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::DispatchOptions;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub dispatch: DispatchConfig,
    pub target: TargetConfig,
    pub message: MessageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Пауза перед печатью текста, мс
    pub pre_type_delay_ms: u64,
    /// Пауза после нажатия клавиши подтверждения, мс
    pub post_send_delay_ms: u64,
    pub focus_first: bool,
    /// Имя клавиши для `wtype -k`
    pub confirm_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Класс окна, сравнивается без учёта регистра
    pub class: String,
    /// Подстроки заголовка на случай, если класс не совпал
    pub title_hints: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessageConfig {
    pub store_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            dispatch: DispatchConfig {
                pre_type_delay_ms: 200,
                post_send_delay_ms: 200,
                focus_first: true,
                confirm_key: "Return".to_string(),
            },
            target: TargetConfig {
                class: "wasistlos".to_string(),
                title_hints: vec!["whatsapp".to_string(), "wasistlos".to_string()],
            },
            message: MessageConfig {
                store_path: default_store_path(),
            },
        }
    }
}

/// `~/.config/auto-report/report.toml`, либо файл в текущем каталоге
fn default_store_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("auto-report"))
        .unwrap_or_default()
        .join("report.toml")
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("AUTO_REPORT_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        if self.dispatch.confirm_key.trim().is_empty() {
            anyhow::bail!("confirm_key не может быть пустым");
        }

        if self.target.class.trim().is_empty()
            && self.target.title_hints.iter().all(|h| h.trim().is_empty())
        {
            anyhow::bail!("Нужно указать target.class или хотя бы одну подсказку title_hints");
        }

        Ok(())
    }

    /// Начальные опции отправки; дальше ими владеет сессия
    pub fn initial_options(&self) -> DispatchOptions {
        DispatchOptions {
            pre_type_delay_ms: self.dispatch.pre_type_delay_ms,
            post_send_delay_ms: self.dispatch.post_send_delay_ms,
            focus_first: self.dispatch.focus_first,
        }
    }
}
