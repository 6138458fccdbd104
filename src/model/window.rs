use std::fmt;

/// Окно-кандидат, как его видит WindowQuery. Не хранится между отправками.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowRecord {
    pub class: String,
    pub title: String,
    pub workspace_id: Option<i64>,
    pub address: Option<String>,
}

impl WindowRecord {
    pub fn new(class: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            title: title.into(),
            workspace_id: None,
            address: None,
        }
    }

    pub fn with_workspace(mut self, workspace_id: i64) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

impl fmt::Display for WindowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} — '{}'", self.class, self.title)?;
        if let Some(address) = &self.address {
            write!(f, ", addr={}", address)?;
        }
        if let Some(ws) = self.workspace_id {
            write!(f, ", ws={}", ws)?;
        }
        Ok(())
    }
}

/// Выбор целевого окна: сначала точный класс, потом подсказки в заголовке.
#[derive(Debug, Clone)]
pub struct TargetMatcher {
    class_lower: String,
    hints_lower: Vec<String>,
}

impl TargetMatcher {
    pub fn new(class: &str, title_hints: &[String]) -> Self {
        Self {
            class_lower: class.trim().to_lowercase(),
            hints_lower: title_hints
                .iter()
                .map(|hint| hint.trim().to_lowercase())
                .filter(|hint| !hint.is_empty())
                .collect(),
        }
    }

    pub fn select<'a>(&self, windows: &'a [WindowRecord]) -> Option<&'a WindowRecord> {
        if !self.class_lower.is_empty() {
            if let Some(window) = windows
                .iter()
                .find(|w| w.class.to_lowercase() == self.class_lower)
            {
                return Some(window);
            }
        }

        windows.iter().find(|w| {
            let title_lower = w.title.to_lowercase();
            self.hints_lower.iter().any(|hint| title_lower.contains(hint))
        })
    }
}
