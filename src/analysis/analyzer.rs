use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Analyzer failed: {0}")]
    Failed(String),

    #[error("Input rejected by analyzer: {0}")]
    Rejected(String),
}

/// One word of the analyzed text, as the analyzer saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedToken {
    /// Surface form.
    pub text: String,
    pub lemma: String,
    /// Universal part-of-speech tag (`NOUN`, `VERB`, `PROPN`, ...).
    pub pos: String,
}

impl AnalyzedToken {
    pub fn new<T: Into<String>, L: Into<String>, P: Into<String>>(text: T, lemma: L, pos: P) -> Self {
        Self {
            text: text.into(),
            lemma: lemma.into(),
            pos: pos.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedText {
    pub tokens: Vec<AnalyzedToken>,
    pub polarity: f64,
    pub subjectivity: f64,
}

/// Tokenizes, lemmatizes, tags and scores a transcript.
///
/// Implementations are shared by every worker of the analysis pool.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(&self, text: &str) -> Result<AnalyzedText, AnalyzerError>;
}
