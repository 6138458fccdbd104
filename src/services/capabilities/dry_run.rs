use crate::error::Result;
use crate::model::WindowRecord;
use tracing::info;

use super::r#trait::{FocusTarget, TextInjector, WindowFocus, WindowQuery};

/// Эмуляция всех утилит: одно фейковое окно, действия только логируются
pub struct DryRunCapabilities {
    window: WindowRecord,
}

impl DryRunCapabilities {
    pub fn new() -> Self {
        info!("Dry-run режим - внешние утилиты не вызываются");
        Self {
            window: WindowRecord::new("wasistlos", "WhatsApp - dry_run")
                .with_workspace(1)
                .with_address("0xdry"),
        }
    }
}

#[async_trait::async_trait]
impl WindowQuery for DryRunCapabilities {
    async fn list_windows(&self) -> Vec<WindowRecord> {
        vec![self.window.clone()]
    }
}

#[async_trait::async_trait]
impl WindowFocus for DryRunCapabilities {
    async fn switch_workspace(&self, workspace_id: i64) -> Result<()> {
        info!("[DRY RUN] workspace {}", workspace_id);
        Ok(())
    }

    async fn focus_window(&self, target: &FocusTarget) -> Result<()> {
        info!("[DRY RUN] focuswindow {:?}", target);
        Ok(())
    }
}

#[async_trait::async_trait]
impl TextInjector for DryRunCapabilities {
    async fn type_text(&self, text: &str) -> Result<()> {
        info!("[DRY RUN] печать: {:?}", text);
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        info!("[DRY RUN] клавиша: {}", key);
        Ok(())
    }
}
