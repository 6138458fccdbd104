use anyhow::Result;
use clap::{Parser, Subcommand};
use chrono::Local;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod console;
mod error;
mod model;
mod services;
mod utils;

use config::Config;
use console::{ConsoleCommand, HELP};
use model::DispatchSource;
use services::{
    capabilities::{create_capabilities, ToolAvailability},
    AntifloodGuard, DispatchLauncher, Dispatcher, MessageStore, Session, SessionHandle, TimerLoop,
};

#[derive(Parser, Debug)]
#[command(name = "auto-report")]
#[command(about = "Автоматическая отправка доклада в WhatsApp (Hyprland + wtype): раз в час в :45 ±2 мин")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "auto-report.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Таймер + интерактивная консоль (по умолчанию)
    Run,
    /// Отправить доклад сейчас и выйти
    Send,
    /// Напечатать текст без Enter и выйти
    Test,
    /// Проверить утилиты и найти окно
    Diagnose,
}

/// Всё, что нужно консоли для выполнения команд
struct App {
    timer: Arc<TimerLoop>,
    launcher: Arc<DispatchLauncher>,
    session: SessionHandle,
    availability: Arc<ToolAvailability>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Config::load(&args.config)?;

    // Инициализация системы логирования
    init_tracing(args.log_level.as_deref().unwrap_or(&config.logging.level))?;

    info!("Запуск Auto Report v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    // Инициализация компонентов
    let availability = Arc::new(ToolAvailability::probe());
    let capabilities = create_capabilities(availability.clone(), args.dry_run);
    let antiflood = Arc::new(AntifloodGuard::new());
    let dispatcher = Arc::new(Dispatcher::new(capabilities, antiflood, &config));

    let (session, session_handle) = Session::new(
        MessageStore::new(&config.message.store_path),
        config.initial_options(),
    );
    let session_task = tokio::spawn(session.run());

    let launcher = Arc::new(DispatchLauncher::new(session_handle.clone(), dispatcher));
    let timer = Arc::new(TimerLoop::new(launcher.clone()));

    info!("Все компоненты инициализированы");

    let app = App {
        timer,
        launcher,
        session: session_handle,
        availability,
    };

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run_interactive(&app).await?,
        Command::Send => {
            let outcome = app.launcher.spawn(DispatchSource::Manual).await?;
            info!("Результат: {}", outcome);
        }
        Command::Test => {
            let outcome = app.launcher.spawn(DispatchSource::Test).await?;
            info!("Результат: {}", outcome);
        }
        Command::Diagnose => app.launcher.diagnose(&app.availability).await,
    }

    drop(app);
    session_task.abort();

    info!("Auto Report завершил работу");
    Ok(())
}

async fn run_interactive(app: &App) -> Result<()> {
    info!("🚀 Запуск (Wayland/Hyprland). Нужны: hyprctl, wtype.");
    app.timer.start();
    info!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                    Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
                }
                break;
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => match line.parse::<ConsoleCommand>() {
                        Ok(ConsoleCommand::Quit) => break,
                        Ok(command) => {
                            if let Err(e) = execute(app, command).await {
                                error!("Ошибка выполнения команды: {}", e);
                            }
                        }
                        Err(message) => warn!("{}", message),
                    },
                    Ok(None) => {
                        info!("stdin закрыт, консоль отключена; выход по Ctrl+C");
                        stdin_open = false;
                    }
                    Err(e) => {
                        error!("Ошибка чтения stdin: {}", e);
                        stdin_open = false;
                    }
                }
            }
        }
    }

    info!("Завершение работы...");
    if app.timer.is_active() {
        app.timer.stop();
    }
    Ok(())
}

async fn execute(app: &App, command: ConsoleCommand) -> crate::error::Result<()> {
    match command {
        ConsoleCommand::Start => {
            app.timer.start();
        }
        ConsoleCommand::Stop => app.timer.stop(),
        ConsoleCommand::Send => {
            app.launcher.spawn(DispatchSource::Manual);
        }
        ConsoleCommand::Test => {
            app.launcher.spawn(DispatchSource::Test);
        }
        ConsoleCommand::Diagnose => app.launcher.diagnose(&app.availability).await,
        ConsoleCommand::Status => {
            let options = app.session.options().await?;
            info!("{}", app.timer.status(Local::now()));
            info!(
                "Опции: фокус={}, перед печатью {} мс, после отправки {} мс",
                options.focus_first, options.pre_type_delay_ms, options.post_send_delay_ms
            );
        }
        ConsoleCommand::ShowText => info!("Текст: {:?}", app.session.text().await?),
        ConsoleCommand::SetText(text) => {
            app.session.set_text(text).await?;
            info!("Текст обновлён и сохранён");
        }
        ConsoleCommand::Focus(focus_first) => app.session.set_focus_first(focus_first).await?,
        ConsoleCommand::Delay {
            pre_type_ms,
            post_send_ms,
        } => app.session.set_delays(pre_type_ms, post_send_ms).await?,
        ConsoleCommand::Help => info!("{}", HELP),
        ConsoleCommand::Quit | ConsoleCommand::Empty => {}
    }
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}
