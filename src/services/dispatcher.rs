use crate::config::Config;
use crate::error::{ReportError, Result};
use crate::report_error;
use crate::model::{
    DispatchOutcome, DispatchRequest, SkipReason, TargetMatcher, WindowRecord,
};
use crate::services::antiflood::{Admission, AntifloodGuard};
use crate::services::capabilities::{Capabilities, FocusTarget};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Сколько раз пробуем печать/отправку
pub const VERIFY_RETRIES: u32 = 2;
/// Шаг линейной паузы между попытками
const RETRY_BACKOFF: Duration = Duration::from_millis(150);
/// Пауза после переключения workspace
const WORKSPACE_SETTLE: Duration = Duration::from_millis(80);
/// Пауза после фокуса окна
const FOCUS_SETTLE: Duration = Duration::from_millis(120);
const MIN_POST_SEND_DELAY: Duration = Duration::from_millis(50);

/// Конвейер отправки: (фокус) → пауза → печать → (клавиша) → пауза, с повторами.
///
/// Фокус делается один раз на отправку; повторяется только печать с клавишей.
pub struct Dispatcher {
    capabilities: Capabilities,
    antiflood: Arc<AntifloodGuard>,
    matcher: TargetMatcher,
    confirm_key: String,
}

impl Dispatcher {
    pub fn new(capabilities: Capabilities, antiflood: Arc<AntifloodGuard>, config: &Config) -> Self {
        info!(
            "Инициализация Dispatcher (класс окна: '{}', подсказки: {:?})",
            config.target.class, config.target.title_hints
        );

        Self {
            capabilities,
            antiflood,
            matcher: TargetMatcher::new(&config.target.class, &config.target.title_hints),
            confirm_key: config.dispatch.confirm_key.clone(),
        }
    }

    /// Полная отправка: антифлуд → (фокус) → печать → клавиша подтверждения
    pub async fn send(&self, request: DispatchRequest) -> DispatchOutcome {
        let prefix = request.source().log_prefix();

        let text = request.text.trim();
        if text.is_empty() {
            warn!("{}⚠️ Текст пустой.", prefix);
            return DispatchOutcome::Skipped(SkipReason::EmptyText);
        }

        if let Admission::Rejected { remaining_secs } = self.antiflood.try_admit(Instant::now()) {
            warn!(
                "{}⛔ Отменён дубль: антифлуд {} мин. Осталось ~{}с.",
                prefix,
                self.antiflood.cooldown().as_secs() / 60,
                remaining_secs
            );
            return DispatchOutcome::Skipped(SkipReason::Antiflood { remaining_secs });
        }

        info!("{}📤 Отправляю…", prefix);

        let result = self.deliver(&request, text, prefix).await;

        match result {
            Ok(()) => {
                info!("{}🎉 Готово.", prefix);
                DispatchOutcome::Success
            }
            Err(e) => {
                Self::log_failure(prefix, &e);
                error!("{}❌ Не удалось отправить.", prefix);
                DispatchOutcome::Failed(e)
            }
        }
    }

    /// Тест вставки: без антифлуда, без повторов и без клавиши подтверждения
    pub async fn test_insert(&self, request: DispatchRequest) -> DispatchOutcome {
        let prefix = request.source().log_prefix();

        let text = request.text.trim();
        if text.is_empty() {
            warn!("{}⚠️ Текст для теста пустой.", prefix);
            return DispatchOutcome::Skipped(SkipReason::EmptyText);
        }

        info!("{}🧪 Печать (без Enter)…", prefix);

        let result = self.deliver_once(&request, text, prefix).await;

        match result {
            Ok(()) => {
                info!("{}🎉 Печать прошла (без отправки).", prefix);
                DispatchOutcome::Success
            }
            Err(e) => {
                Self::log_failure(prefix, &e);
                error!("{}❌ Не удалось напечатать.", prefix);
                DispatchOutcome::Failed(e)
            }
        }
    }

    /// Найти целевое окно без каких-либо действий с ним
    pub async fn find_target(&self) -> Option<WindowRecord> {
        let windows = self.capabilities.windows.list_windows().await;
        self.matcher.select(&windows).cloned()
    }

    /// Фокус один раз, затем печать с повторами
    async fn deliver(&self, request: &DispatchRequest, text: &str, prefix: &str) -> Result<()> {
        if request.focus_first {
            self.ensure_focused(prefix).await?;
        }
        self.type_with_retries(request, text, prefix).await
    }

    async fn deliver_once(&self, request: &DispatchRequest, text: &str, prefix: &str) -> Result<()> {
        if request.focus_first {
            self.ensure_focused(prefix).await?;
        }
        self.type_sequence(request, text).await
    }

    async fn ensure_focused(&self, prefix: &str) -> Result<WindowRecord> {
        let window = self
            .find_target()
            .await
            .ok_or_else(|| report_error!(window_not_found, "окно WasIstLos/WhatsApp не найдено"))?;

        if let Some(workspace_id) = window.workspace_id {
            self.capabilities.focus.switch_workspace(workspace_id).await?;
            sleep(WORKSPACE_SETTLE).await;
        }

        let target = match (&window.address, window.class.is_empty()) {
            (Some(address), _) => FocusTarget::Address(address.clone()),
            (None, false) => FocusTarget::Class(window.class.clone()),
            (None, true) => {
                return Err(report_error!(
                    focus,
                    "у окна '{}' нет ни адреса, ни класса",
                    window.title
                ))
            }
        };

        self.capabilities.focus.focus_window(&target).await?;
        sleep(FOCUS_SETTLE).await;

        info!("{}✅ Активировано: {}", prefix, window);
        Ok(window)
    }

    async fn type_with_retries(&self, request: &DispatchRequest, text: &str, prefix: &str) -> Result<()> {
        let mut attempt = 1;
        loop {
            info!("{}→ Напечатать/отправить (попытка {})…", prefix, attempt);

            match self.type_sequence(request, text).await {
                Ok(()) => {
                    info!("{}✅ Отправлено успешно.", prefix);
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < VERIFY_RETRIES => {
                    warn!("{}Попытка {} не удалась: {}", prefix, attempt, e);
                    sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Одна попытка: пауза → печать → (клавиша) → пауза
    async fn type_sequence(&self, request: &DispatchRequest, text: &str) -> Result<()> {
        sleep(request.pre_type_delay).await;

        self.capabilities.input.type_text(text).await?;

        if request.send_key {
            self.capabilities.input.press_key(&self.confirm_key).await?;
        }

        sleep(request.post_send_delay.max(MIN_POST_SEND_DELAY)).await;
        Ok(())
    }

    fn log_failure(prefix: &str, e: &ReportError) {
        match e {
            ReportError::CapabilityUnavailable(_) => warn!("{}❌ {}", prefix, e),
            _ => error!("{}❌ {}", prefix, e),
        }
    }
}
