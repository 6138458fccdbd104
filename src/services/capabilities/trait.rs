use crate::error::Result;
use crate::model::WindowRecord;
use std::sync::Arc;

use super::availability::ToolAvailability;
use super::dry_run::DryRunCapabilities;
use super::hyprctl::HyprctlWindows;
use super::wtype::WtypeInjector;

/// Enumerate candidate windows. Never fails: any problem yields an empty list.
#[async_trait::async_trait]
pub trait WindowQuery: Send + Sync {
    async fn list_windows(&self) -> Vec<WindowRecord>;
}

/// How to address a window when raising it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusTarget {
    Address(String),
    Class(String),
}

/// Switch workspace and raise a window. Best effort: `Ok` means the action was issued.
#[async_trait::async_trait]
pub trait WindowFocus: Send + Sync {
    async fn switch_workspace(&self, workspace_id: i64) -> Result<()>;
    async fn focus_window(&self, target: &FocusTarget) -> Result<()>;
}

/// Type literal text and press single named keys into the focused window
#[async_trait::async_trait]
pub trait TextInjector: Send + Sync {
    async fn type_text(&self, text: &str) -> Result<()>;
    async fn press_key(&self, key: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct Capabilities {
    pub windows: Arc<dyn WindowQuery>,
    pub focus: Arc<dyn WindowFocus>,
    pub input: Arc<dyn TextInjector>,
}

/// Factory function to create real or dry-run adapters based on the dry_run flag
pub fn create_capabilities(availability: Arc<ToolAvailability>, dry_run: bool) -> Capabilities {
    if dry_run {
        let dry = Arc::new(DryRunCapabilities::new());
        Capabilities {
            windows: dry.clone(),
            focus: dry.clone(),
            input: dry,
        }
    } else {
        let hyprctl = Arc::new(HyprctlWindows::new(availability.clone()));
        Capabilities {
            windows: hyprctl.clone(),
            focus: hyprctl,
            input: Arc::new(WtypeInjector::new(availability)),
        }
    }
}
