use crate::error::Result;
use crate::report_error;
use crate::model::{DispatchOptions, DispatchRequest, DispatchSource};
use crate::services::message_store::MessageStore;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

const COMMAND_QUEUE: usize = 32;

/// Запросы к владельцу текста и опций
#[derive(Debug)]
pub enum SessionCommand {
    Snapshot {
        source: DispatchSource,
        reply: oneshot::Sender<DispatchRequest>,
    },
    SetText(String),
    SetFocusFirst(bool),
    SetDelays {
        pre_type_delay_ms: u64,
        post_send_delay_ms: u64,
    },
    GetText(oneshot::Sender<String>),
    GetOptions(oneshot::Sender<DispatchOptions>),
}

/// Ручка к сессии. Фоновые задачи не читают текст напрямую: запрос ставится
/// в очередь владельцу, ответ становится снимком для отправки.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    async fn send(&self, command: SessionCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| report_error!(internal, "сессия завершена"))
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.send(make(reply)).await?;
        response
            .await
            .map_err(|_| report_error!(internal, "сессия не ответила"))
    }

    pub async fn snapshot(&self, source: DispatchSource) -> Result<DispatchRequest> {
        self.request(|reply| SessionCommand::Snapshot { source, reply }).await
    }

    pub async fn text(&self) -> Result<String> {
        self.request(SessionCommand::GetText).await
    }

    pub async fn options(&self) -> Result<DispatchOptions> {
        self.request(SessionCommand::GetOptions).await
    }

    pub async fn set_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::SetText(text.into())).await
    }

    pub async fn set_focus_first(&self, focus_first: bool) -> Result<()> {
        self.send(SessionCommand::SetFocusFirst(focus_first)).await
    }

    pub async fn set_delays(&self, pre_type_delay_ms: u64, post_send_delay_ms: u64) -> Result<()> {
        self.send(SessionCommand::SetDelays {
            pre_type_delay_ms,
            post_send_delay_ms,
        })
        .await
    }
}

/// Владелец текущего текста доклада и опций отправки
pub struct Session {
    text: String,
    options: DispatchOptions,
    store: MessageStore,
    rx: mpsc::Receiver<SessionCommand>,
}

impl Session {
    pub fn new(store: MessageStore, options: DispatchOptions) -> (Self, SessionHandle) {
        let text = store.load().unwrap_or_else(|e| {
            warn!("Не удалось загрузить сохранённый текст: {}", e);
            String::new()
        });
        info!(
            "Сессия: текст из {:?} ({} символов)",
            store.path(),
            text.chars().count()
        );

        let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
        (
            Self {
                text,
                options,
                store,
                rx,
            },
            SessionHandle { tx },
        )
    }

    pub async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            self.handle(command).await;
        }
        debug!("Сессия завершена");
    }

    async fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Snapshot { source, reply } => {
                let request = DispatchRequest::snapshot(&self.text, &self.options, source);
                let _ = reply.send(request);
            }
            SessionCommand::SetText(text) => {
                self.text = text;
                self.persist().await;
            }
            SessionCommand::SetFocusFirst(focus_first) => {
                self.options.focus_first = focus_first;
                info!("Фокус перед отправкой: {}", if focus_first { "вкл" } else { "выкл" });
            }
            SessionCommand::SetDelays {
                pre_type_delay_ms,
                post_send_delay_ms,
            } => {
                self.options.pre_type_delay_ms = pre_type_delay_ms;
                self.options.post_send_delay_ms = post_send_delay_ms;
                info!(
                    "Задержки: перед печатью {} мс, после отправки {} мс",
                    pre_type_delay_ms, post_send_delay_ms
                );
            }
            SessionCommand::GetText(reply) => {
                let _ = reply.send(self.text.clone());
            }
            SessionCommand::GetOptions(reply) => {
                let _ = reply.send(self.options);
            }
        }
    }

    /// Запись файла уходит в blocking-пул; следующая команда ждёт её окончания,
    /// поэтому на диске всегда последний принятый текст
    async fn persist(&self) {
        let store = self.store.clone();
        let text = self.text.clone();

        match tokio::task::spawn_blocking(move || store.save(&text)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Не удалось сохранить текст: {}", e),
            Err(e) => error!("Задача сохранения текста прервана: {}", e),
        }
    }
}
