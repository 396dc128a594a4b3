pub mod error;
pub mod lint;

use crate::site::config::SiteConfig;

use error::Diagnostic;
use lint::run_lints;

pub struct AnalysisResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }
}

pub fn analyze_site(config: &SiteConfig) -> AnalysisResult {
    let mut diagnostics = Vec::new();

    diagnostics.extend(run_lints(config));

    AnalysisResult { diagnostics }
}
