//! Turns a [`CombinedSnapshot`] into an ordered list of findings.
//!
//! The analyzer settles on a mode once, at construction. In AI mode every call
//! goes to the backend first and falls back to the rule set for that call only
//! when the backend times out, fails, or answers with nothing usable.

pub mod backend;
pub mod prompt;
pub mod rules;

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{Instrument, info};

use crate::config::AiConfig;
use crate::system::snapshot::CombinedSnapshot;
use backend::{AiBackend, GeminiBackend};
use prompt::ParsedResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Warning,
    Recommendation,
}

impl FindingKind {
    pub fn glyph(self) -> &'static str {
        match self {
            FindingKind::Warning => "⚠",
            FindingKind::Recommendation => "→",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: FindingKind,
    pub message: String,
}

impl Finding {
    pub fn warning(message: impl Into<String>) -> Self {
        Finding {
            kind: FindingKind::Warning,
            message: message.into(),
        }
    }

    pub fn recommendation(message: impl Into<String>) -> Self {
        Finding {
            kind: FindingKind::Recommendation,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.glyph(), self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerMode {
    Ai,
    RuleOnly,
}

pub struct AiStrategy<B> {
    backend: B,
    timeout: Duration,
}

pub enum Analyzer<B = GeminiBackend> {
    Ai(AiStrategy<B>),
    RuleOnly,
}

impl Analyzer<GeminiBackend> {
    /// Build the analyzer described by `config`, degrading to rules when the
    /// backend is disabled, unconfigured, or unreachable.
    pub async fn connect(config: &AiConfig) -> Self {
        if !config.enabled {
            info!("AI analysis disabled, using rule-based analysis");
            return Analyzer::RuleOnly;
        }
        let backend = match GeminiBackend::from_config(config) {
            Ok(backend) => backend,
            Err(err) => {
                info!(%err, "AI analysis unavailable, using rule-based analysis");
                return Analyzer::RuleOnly;
            }
        };
        let probe_timeout = config
            .verify_connectivity
            .then(|| Duration::from_secs(config.probe_timeout_secs));
        Self::with_backend(backend, Duration::from_secs(config.timeout_secs), probe_timeout).await
    }
}

impl<B: AiBackend> Analyzer<B> {
    pub fn rule_only() -> Self {
        Analyzer::RuleOnly
    }

    /// Use `backend` for every call, bounded by `timeout`. When `probe_timeout`
    /// is set the backend must answer a connectivity probe first.
    pub async fn with_backend(backend: B, timeout: Duration, probe_timeout: Option<Duration>) -> Self {
        if let Some(limit) = probe_timeout {
            match tokio::time::timeout(limit, backend.probe()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    info!(%err, "AI backend probe failed, using rule-based analysis");
                    return Analyzer::RuleOnly;
                }
                Err(_) => {
                    info!(?limit, "AI backend probe timed out, using rule-based analysis");
                    return Analyzer::RuleOnly;
                }
            }
        }
        Analyzer::Ai(AiStrategy { backend, timeout })
    }

    pub fn mode(&self) -> AnalyzerMode {
        match self {
            Analyzer::Ai(_) => AnalyzerMode::Ai,
            Analyzer::RuleOnly => AnalyzerMode::RuleOnly,
        }
    }

    /// Never fails: every backend problem ends in the rule set.
    pub async fn analyze(&self, snapshot: &CombinedSnapshot) -> Vec<Finding> {
        match self {
            Analyzer::Ai(strategy) => strategy.analyze(snapshot).await,
            Analyzer::RuleOnly => rules::evaluate(snapshot),
        }
    }
}

impl<B: AiBackend> AiStrategy<B> {
    async fn analyze(&self, snapshot: &CombinedSnapshot) -> Vec<Finding> {
        let request = prompt::build_prompt(snapshot);
        let call = self
            .backend
            .generate(&request)
            .instrument(tracing::debug_span!("analyzer.ai_request"));
        let reply = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                info!(%err, "AI analysis failed, falling back to rule-based analysis");
                return rules::evaluate(snapshot);
            }
            Err(_) => {
                info!(timeout = ?self.timeout, "AI analysis timed out, falling back to rule-based analysis");
                return rules::evaluate(snapshot);
            }
        };

        match prompt::parse_response(&reply) {
            ParsedResponse::Healthy => Vec::new(),
            ParsedResponse::Findings(findings) => findings,
            ParsedResponse::Unrecognized => {
                info!("AI response contained no usable lines, falling back to rule-based analysis");
                rules::evaluate(snapshot)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn findings_display_with_kind_glyph() {
        assert_eq!(Finding::warning("disk full").to_string(), "⚠ disk full");
        assert_eq!(
            Finding::recommendation("add swap").to_string(),
            "→ add swap"
        );
    }

    #[test]
    fn rule_only_reports_its_mode() {
        let analyzer: Analyzer = Analyzer::rule_only();
        assert_eq!(analyzer.mode(), AnalyzerMode::RuleOnly);
    }
}
