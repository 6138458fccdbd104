use crate::model::{DispatchOutcome, DispatchSource};
use crate::services::capabilities::{Tool, ToolAvailability};
use crate::services::dispatcher::Dispatcher;
use crate::services::session::SessionHandle;
use crate::services::timer_loop::FireHandler;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Запуск отправок отдельными задачами: снимок у сессии, затем конвейер.
pub struct DispatchLauncher {
    session: SessionHandle,
    dispatcher: Arc<Dispatcher>,
}

impl DispatchLauncher {
    pub fn new(session: SessionHandle, dispatcher: Arc<Dispatcher>) -> Self {
        Self { session, dispatcher }
    }

    pub fn spawn(&self, source: DispatchSource) -> JoinHandle<DispatchOutcome> {
        let session = self.session.clone();
        let dispatcher = Arc::clone(&self.dispatcher);

        tokio::spawn(async move {
            let request = match session.snapshot(source).await {
                Ok(request) => request,
                Err(e) => {
                    error!("{}Не удалось получить текст: {}", source.log_prefix(), e);
                    return DispatchOutcome::Failed(e);
                }
            };

            match source {
                DispatchSource::Test => dispatcher.test_insert(request).await,
                DispatchSource::Manual | DispatchSource::Timer => dispatcher.send(request).await,
            }
        })
    }

    /// Диагностика окружения: утилиты и найденное окно
    pub async fn diagnose(&self, availability: &ToolAvailability) {
        info!("🔬 Диагностика окружения:");
        info!("  hyprctl: {}", availability.is_available(Tool::Hyprctl));
        info!("  wtype:   {}", availability.is_available(Tool::Wtype));

        match self.dispatcher.find_target().await {
            Some(window) => info!("  Найден клиент: {}", window),
            None => info!("  Клиент WasIstLos/WhatsApp не найден. Откройте клиент."),
        }
    }
}

impl FireHandler for DispatchLauncher {
    fn fire(&self, _target: DateTime<Local>) {
        // задача отвязана: таймер не ждёт окончания отправки
        drop(self.spawn(DispatchSource::Timer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{DispatchOptions, SkipReason};
    use crate::report_error;
    use crate::services::antiflood::AntifloodGuard;
    use crate::services::capabilities::{create_capabilities, Capabilities, TextInjector};
    use crate::services::dispatcher::VERIFY_RETRIES;
    use crate::services::message_store::MessageStore;
    use crate::services::session::Session;
    use crate::services::timer_loop::TimerLoop;
    use chrono::TimeDelta;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Печать всегда падает
    #[derive(Default)]
    struct BrokenInjector {
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl TextInjector for BrokenInjector {
        async fn type_text(&self, _text: &str) -> crate::error::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(report_error!(injection, "wtype exit 1"))
        }

        async fn press_key(&self, _key: &str) -> crate::error::Result<()> {
            Ok(())
        }
    }

    fn dry_capabilities() -> Capabilities {
        create_capabilities(Arc::new(ToolAvailability::with_flags(false, false)), true)
    }

    fn launcher_with(capabilities: Capabilities) -> (DispatchLauncher, SessionHandle, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let (session, handle) = Session::new(
            MessageStore::new(dir.path().join("report.toml")),
            DispatchOptions {
                pre_type_delay_ms: 0,
                post_send_delay_ms: 0,
                focus_first: true,
            },
        );
        tokio::spawn(session.run());

        let dispatcher = Arc::new(Dispatcher::new(
            capabilities,
            Arc::new(AntifloodGuard::new()),
            &Config::default(),
        ));
        (DispatchLauncher::new(handle.clone(), dispatcher), handle, dir)
    }

    #[tokio::test]
    async fn manual_then_timer_hits_antiflood() {
        let (launcher, session, _dir) = launcher_with(dry_capabilities());
        session.set_text("Доповідь").await.unwrap();

        let first = launcher.spawn(DispatchSource::Manual).await.unwrap();
        assert!(first.is_success());

        let second = launcher.spawn(DispatchSource::Timer).await.unwrap();
        assert!(matches!(
            second,
            DispatchOutcome::Skipped(SkipReason::Antiflood { .. })
        ));

        // тест вставки антифлуд не проверяет
        let test = launcher.spawn(DispatchSource::Test).await.unwrap();
        assert!(test.is_success());
    }

    #[tokio::test]
    async fn empty_text_is_skipped() {
        let (launcher, _session, _dir) = launcher_with(dry_capabilities());
        let outcome = launcher.spawn(DispatchSource::Manual).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Skipped(SkipReason::EmptyText)));
    }

    #[tokio::test]
    async fn timer_keeps_running_after_failed_dispatch() {
        let injector = Arc::new(BrokenInjector::default());
        let mut capabilities = dry_capabilities();
        capabilities.input = injector.clone();

        let (launcher, session, _dir) = launcher_with(capabilities);
        session.set_text("Доповідь").await.unwrap();

        let timer = Arc::new(TimerLoop::new(Arc::new(launcher)));
        let first = Local::now() - TimeDelta::seconds(1);
        timer.force_target(first);
        assert!(timer.start());

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(injector.calls.load(Ordering::SeqCst), VERIFY_RETRIES);
        assert!(timer.is_active());
        assert!(timer.next_target().is_some_and(|next| next > first));

        // следующий слот всё равно срабатывает
        let second = Local::now() - TimeDelta::seconds(1);
        timer.force_target(second);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(timer.is_active());
        assert!(timer.next_target().is_some_and(|next| next > second));

        timer.stop();
    }
}
