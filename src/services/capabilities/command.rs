use crate::debug_if_enabled;
use crate::error::{ReportError, Result};
use crate::report_error;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::process::Command;

use super::availability::{Tool, ToolAvailability};

/// Таймаут по умолчанию для внешних утилит
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Запускает утилиту с захватом вывода. Таймаут считается неуспешным
/// завершением, отсутствие бинарника — `CapabilityUnavailable`.
pub async fn run_tool(
    availability: &ToolAvailability,
    tool: Tool,
    args: &[&str],
    timeout: Duration,
) -> Result<CommandOutput> {
    availability.ensure(tool)?;

    debug_if_enabled!("Запуск {} {:?}", tool.binary(), args);

    let mut command = Command::new(tool.binary());
    command.args(args).kill_on_drop(true);

    match tokio::time::timeout(timeout, command.output()).await {
        Err(_) => Ok(CommandOutput {
            success: false,
            stdout: String::new(),
            stderr: format!("{} не ответил за {:?}", tool.binary(), timeout),
        }),
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
            availability.mark_missing(tool);
            Err(report_error!(unavailable, "{} не найден: {}", tool.binary(), e))
        }
        Ok(Err(e)) => Err(ReportError::Io(e)),
        Ok(Ok(output)) => Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
    }
}
