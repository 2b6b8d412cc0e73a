use std::path::Path;
use thiserror::Error;

const EMBEDDED_TABLE: &str = include_str!("../../resources/uncensor.json");

#[derive(Debug, Error)]
pub enum UncensorError {
    #[error("Failed to read uncensor table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid uncensor table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ordered table of `(censored, plain)` substitutions applied to transcript lines.
#[derive(Debug, Clone, Default)]
pub struct UncensorFilter {
    substitutions: Vec<(String, String)>,
}

impl UncensorFilter {
    /// The table shipped with the crate.
    pub fn embedded() -> Result<Self, UncensorError> {
        Self::from_json(EMBEDDED_TABLE)
    }

    pub fn from_file(path: &Path) -> Result<Self, UncensorError> {
        let content = std::fs::read_to_string(path).map_err(|source| UncensorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, UncensorError> {
        let substitutions: Vec<(String, String)> = serde_json::from_str(json)?;
        Ok(Self {
            substitutions: substitutions
                .into_iter()
                .filter(|(censored, _)| !censored.is_empty())
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.substitutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }

    /// Applies every substitution in table order.
    pub fn apply(&self, line: &str) -> String {
        let mut line = line.to_string();
        for (censored, plain) in self.substitutions.iter() {
            if line.contains(censored.as_str()) {
                line = line.replace(censored.as_str(), plain);
            }
        }
        line
    }

    pub fn apply_text(&self, text: &str) -> String {
        text.split('\n')
            .map(|line| self.apply(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
