use std::fmt;
use std::time::Duration;

use crate::error::ReportError;

/// Кто инициировал отправку
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchSource {
    /// "Отправить сейчас"
    Manual,
    /// Автоматическое срабатывание таймера
    Timer,
    /// "Тест вставки": печать без клавиши подтверждения
    Test,
}

impl DispatchSource {
    pub fn sends_key(self) -> bool {
        !matches!(self, DispatchSource::Test)
    }

    pub fn log_prefix(self) -> &'static str {
        match self {
            DispatchSource::Manual => "",
            DispatchSource::Timer => "[Таймер] ",
            DispatchSource::Test => "[Тест] ",
        }
    }
}

/// Опции отправки, которые пользователь может менять во время работы
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    pub pre_type_delay_ms: u64,
    pub post_send_delay_ms: u64,
    pub focus_first: bool,
}

/// Снимок текста и опций на момент отправки. Передаётся по значению, поэтому
/// правки в сессии не влияют на уже запущенную отправку.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub text: String,
    pub pre_type_delay: Duration,
    pub post_send_delay: Duration,
    pub send_key: bool,
    pub focus_first: bool,
    pub via_timer: bool,
}

impl DispatchRequest {
    pub fn snapshot(text: &str, options: &DispatchOptions, source: DispatchSource) -> Self {
        Self {
            text: text.to_string(),
            pre_type_delay: Duration::from_millis(options.pre_type_delay_ms),
            post_send_delay: Duration::from_millis(options.post_send_delay_ms),
            send_key: source.sends_key(),
            focus_first: options.focus_first,
            via_timer: source == DispatchSource::Timer,
        }
    }

    pub fn source(&self) -> DispatchSource {
        match (self.via_timer, self.send_key) {
            (true, _) => DispatchSource::Timer,
            (false, true) => DispatchSource::Manual,
            (false, false) => DispatchSource::Test,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyText,
    Antiflood { remaining_secs: u64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyText => write!(f, "текст пустой"),
            SkipReason::Antiflood { remaining_secs } => {
                write!(f, "антифлуд, осталось ~{}с", remaining_secs)
            }
        }
    }
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Success,
    Skipped(SkipReason),
    Failed(ReportError),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success)
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Success => write!(f, "готово"),
            DispatchOutcome::Skipped(reason) => write!(f, "пропущено ({})", reason),
            DispatchOutcome::Failed(e) => write!(f, "ошибка: {}", e),
        }
    }
}
