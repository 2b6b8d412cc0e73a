mod analyzer;
mod engine;
mod lexicon;
mod pool;
mod stopwords;

pub use analyzer::{AnalyzedText, AnalyzedToken, Analyzer, AnalyzerError};
pub use engine::{
    extract_tokens, AnalysisEngine, EpisodeAnalysis, EpisodeError, EpisodeFailure, EpisodeOutcome,
};
pub use lexicon::LexiconAnalyzer;
pub use pool::{build_worker_pool, default_workers};
pub use stopwords::StopwordFilter;
