use crate::error::Result;
use crate::model::WindowRecord;
use crate::report_error;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::availability::{Tool, ToolAvailability};
use super::command::{run_tool, COMMAND_TIMEOUT};
use super::r#trait::{FocusTarget, WindowFocus, WindowQuery};

const LIST_TIMEOUT: Duration = Duration::from_secs(3);

/// Клиент из `hyprctl -j clients`; берём только нужные поля
#[derive(Debug, Deserialize)]
struct HyprClient {
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    workspace: Option<HyprWorkspace>,
}

#[derive(Debug, Deserialize)]
struct HyprWorkspace {
    id: Option<i64>,
}

impl From<HyprClient> for WindowRecord {
    fn from(client: HyprClient) -> Self {
        WindowRecord {
            class: client.class.unwrap_or_default(),
            title: client.title.unwrap_or_default(),
            workspace_id: client.workspace.and_then(|ws| ws.id),
            address: client.address.filter(|addr| !addr.is_empty()),
        }
    }
}

pub fn parse_clients(json: &str) -> Result<Vec<WindowRecord>> {
    let clients: Vec<HyprClient> = serde_json::from_str(json)
        .map_err(|e| report_error!(malformed, "hyprctl -j clients: {}", e))?;
    Ok(clients.into_iter().map(WindowRecord::from).collect())
}

/// Поиск и фокус окон через hyprctl (Hyprland)
pub struct HyprctlWindows {
    availability: Arc<ToolAvailability>,
}

impl HyprctlWindows {
    pub fn new(availability: Arc<ToolAvailability>) -> Self {
        Self { availability }
    }

    async fn dispatch(&self, args: &[&str]) -> Result<()> {
        let output = run_tool(&self.availability, Tool::Hyprctl, args, COMMAND_TIMEOUT).await?;
        if !output.success {
            warn!("hyprctl {:?} вернул ошибку: {}", args, output.stderr);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl WindowQuery for HyprctlWindows {
    async fn list_windows(&self) -> Vec<WindowRecord> {
        let output = match run_tool(&self.availability, Tool::Hyprctl, &["-j", "clients"], LIST_TIMEOUT).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Список окон недоступен: {}", e);
                return Vec::new();
            }
        };

        if !output.success || output.stdout.is_empty() {
            debug!("hyprctl -j clients ничего не вернул: {}", output.stderr);
            return Vec::new();
        }

        match parse_clients(&output.stdout) {
            Ok(windows) => windows,
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl WindowFocus for HyprctlWindows {
    async fn switch_workspace(&self, workspace_id: i64) -> Result<()> {
        self.dispatch(&["dispatch", "workspace", &workspace_id.to_string()]).await
    }

    async fn focus_window(&self, target: &FocusTarget) -> Result<()> {
        let selector = match target {
            FocusTarget::Address(address) => format!("address:{}", address),
            FocusTarget::Class(class) => class.clone(),
        };
        self.dispatch(&["dispatch", "focuswindow", &selector]).await
    }
}
