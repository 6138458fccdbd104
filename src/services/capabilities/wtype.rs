use crate::error::Result;
use crate::report_error;
use std::sync::Arc;

use super::availability::{Tool, ToolAvailability};
use super::command::{run_tool, COMMAND_TIMEOUT};
use super::r#trait::TextInjector;

/// Аргументы для печати: после `--` текст не разбирается как опция,
/// даже если начинается с `-`
fn type_args(text: &str) -> [&str; 2] {
    ["--", text]
}

/// Эмуляция ввода через wtype (Wayland virtual-keyboard)
pub struct WtypeInjector {
    availability: Arc<ToolAvailability>,
}

impl WtypeInjector {
    pub fn new(availability: Arc<ToolAvailability>) -> Self {
        Self { availability }
    }

    async fn run(&self, args: &[&str], what: &str) -> Result<()> {
        let output = run_tool(&self.availability, Tool::Wtype, args, COMMAND_TIMEOUT).await?;
        if output.success {
            Ok(())
        } else {
            Err(report_error!(injection, "wtype ({}) вернул ошибку: {}", what, output.stderr))
        }
    }
}

#[async_trait::async_trait]
impl TextInjector for WtypeInjector {
    async fn type_text(&self, text: &str) -> Result<()> {
        self.run(&type_args(text), "текст").await
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        self.run(&["-k", key], key).await
    }
}
