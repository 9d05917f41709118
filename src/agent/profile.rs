// Role agent configuration — model, languages, expertise, base guidance

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which part of the round trip an agent plays.
///
/// Behaviour is identical for every role; the tag only labels logs and
/// decides which language pair the agent is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Source → target translation
    Forward,
    /// Target → source back-translation
    Backward,
    /// Similarity scoring and critique
    Judge,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Judge => "judge",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a role agent is bound to for the lifetime of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub role: Role,
    /// Backend model id (e.g. "gemma3:4b")
    pub model_id: String,
    /// Free-text domain description
    pub expertise: String,
    /// Base instructions; the loop threads its own, growing copy into
    /// forward translations
    pub guidance: String,
    pub source_lang: String,
    pub dest_lang: String,
}

impl AgentProfile {
    pub fn new(
        role: Role,
        model_id: impl Into<String>,
        source_lang: impl Into<String>,
        dest_lang: impl Into<String>,
    ) -> Self {
        Self {
            role,
            model_id: model_id.into(),
            expertise: String::new(),
            guidance: String::new(),
            source_lang: source_lang.into(),
            dest_lang: dest_lang.into(),
        }
    }

    pub fn with_expertise(mut self, expertise: impl Into<String>) -> Self {
        self.expertise = expertise.into();
        self
    }

    pub fn with_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = guidance.into();
        self
    }
}

/// Loose language-name comparison: "English" and " english" name the same language.
pub fn same_language(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
