use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Утилита недоступна: {0}")]
    CapabilityUnavailable(String),

    #[error("Окно не найдено: {0}")]
    WindowNotFound(String),

    #[error("Не удалось сфокусировать окно: {0}")]
    FocusFailed(String),

    #[error("Ошибка эмуляции ввода: {0}")]
    InjectionFailure(String),

    #[error("Некорректный ответ утилиты: {0}")]
    MalformedResponse(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl ReportError {
    /// Повтор имеет смысл только для сбоев ввода: окно и утилиты от повтора не появятся
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReportError::InjectionFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! report_error {
    (unavailable, $($arg:tt)*) => {
        $crate::error::ReportError::CapabilityUnavailable(format!($($arg)*))
    };
    (window_not_found, $($arg:tt)*) => {
        $crate::error::ReportError::WindowNotFound(format!($($arg)*))
    };
    (focus, $($arg:tt)*) => {
        $crate::error::ReportError::FocusFailed(format!($($arg)*))
    };
    (injection, $($arg:tt)*) => {
        $crate::error::ReportError::InjectionFailure(format!($($arg)*))
    };
    (malformed, $($arg:tt)*) => {
        $crate::error::ReportError::MalformedResponse(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::ReportError::Internal(format!($($arg)*))
    };
}
