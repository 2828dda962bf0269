//! Keyword classifiers for task type, privacy level, and token pressure.
//!
//! These are approximate by design. They are pluggable strategies so a
//! stronger classifier can replace the keyword defaults without
//! touching the arbitration algorithm.

use crate::context::estimate_tokens;
use crate::types::ChatTurn;

/// The kind of work a message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    /// Restructure existing code.
    Refactor,
    /// Find and fix a defect.
    Debug,
    /// Explain or review code.
    Analyze,
    /// Write documentation.
    Document,
    /// Write new code.
    Code,
    /// Anything else.
    General,
}

impl TaskType {
    /// Tasks that benefit from the stronger cloud models.
    pub fn is_complex(self) -> bool {
        matches!(self, TaskType::Refactor | TaskType::Debug | TaskType::Analyze)
    }
}

/// How sensitive the message content appears to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrivacyLevel {
    /// Nothing sensitive detected.
    Low,
    /// Mentions user or personal data.
    Medium,
    /// Mentions private or sensitive material.
    High,
    /// Mentions credentials.
    Critical,
}

/// Estimated prompt size relative to the pressure thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPressure {
    /// Under 4,000 tokens.
    Low,
    /// 4,000 to 8,000 tokens.
    Medium,
    /// Over 8,000 tokens.
    High,
}

/// Classifies the task a message asks for.
pub trait TaskClassifier: Send + Sync {
    /// Classify one message.
    fn classify(&self, message: &str) -> TaskType;
}

/// Assesses the privacy level of a message.
pub trait PrivacyClassifier: Send + Sync {
    /// Assess one message.
    fn assess(&self, message: &str) -> PrivacyLevel;
}

/// Default keyword-based task classifier.
#[derive(Debug, Default)]
pub struct KeywordTaskClassifier;

impl TaskClassifier for KeywordTaskClassifier {
    fn classify(&self, message: &str) -> TaskType {
        let lowered = message.to_lowercase();
        if lowered.contains("refactor") || lowered.contains("restructure") {
            TaskType::Refactor
        } else if lowered.contains("debug") || lowered.contains("fix") || lowered.contains("bug") {
            TaskType::Debug
        } else if lowered.contains("analyze") || lowered.contains("review")
            || lowered.contains("explain")
        {
            TaskType::Analyze
        } else if lowered.contains("document") || lowered.contains("docs")
            || lowered.contains("comment")
        {
            TaskType::Document
        } else if lowered.contains("implement") || lowered.contains("write")
            || lowered.contains("code") || lowered.contains("create")
        {
            TaskType::Code
        } else {
            TaskType::General
        }
    }
}

/// Default keyword-based privacy classifier.
#[derive(Debug, Default)]
pub struct KeywordPrivacyClassifier;

impl PrivacyClassifier for KeywordPrivacyClassifier {
    fn assess(&self, message: &str) -> PrivacyLevel {
        let lowered = message.to_lowercase();
        if lowered.contains("password") || lowered.contains("secret") || lowered.contains("key") {
            PrivacyLevel::Critical
        } else if lowered.contains("private") || lowered.contains("sensitive") {
            PrivacyLevel::High
        } else if lowered.contains("user data") || lowered.contains("personal") {
            PrivacyLevel::Medium
        } else {
            PrivacyLevel::Low
        }
    }
}

/// Token pressure of a message plus its history, against the 4k/8k
/// thresholds.
pub fn assess_token_pressure(message: &str, history: &[ChatTurn]) -> TokenPressure {
    let total: u32 = estimate_tokens(message)
        + history
            .iter()
            .map(|t| estimate_tokens(&t.text_content()))
            .sum::<u32>();

    if total < 4_000 {
        TokenPressure::Low
    } else if total < 8_000 {
        TokenPressure::Medium
    } else {
        TokenPressure::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TurnRole;

    #[test]
    fn test_task_classification() {
        let classifier = KeywordTaskClassifier;
        assert_eq!(classifier.classify("please refactor this module"), TaskType::Refactor);
        assert_eq!(classifier.classify("fix the login bug"), TaskType::Debug);
        assert_eq!(classifier.classify("review this diff"), TaskType::Analyze);
        assert_eq!(classifier.classify("document the public API"), TaskType::Document);
        assert_eq!(classifier.classify("write a parser for ini files"), TaskType::Code);
        assert_eq!(classifier.classify("good morning"), TaskType::General);
    }

    #[test]
    fn test_privacy_assessment() {
        let classifier = KeywordPrivacyClassifier;
        assert_eq!(classifier.assess("rotate the api key"), PrivacyLevel::Critical);
        assert_eq!(classifier.assess("this is private material"), PrivacyLevel::High);
        assert_eq!(classifier.assess("anonymize the personal fields"), PrivacyLevel::Medium);
        assert_eq!(classifier.assess("hello world"), PrivacyLevel::Low);
    }

    #[test]
    fn test_privacy_levels_are_ordered() {
        assert!(PrivacyLevel::Critical > PrivacyLevel::High);
        assert!(PrivacyLevel::High > PrivacyLevel::Medium);
        assert!(PrivacyLevel::Medium > PrivacyLevel::Low);
    }

    #[test]
    fn test_token_pressure_thresholds() {
        assert_eq!(assess_token_pressure("short", &[]), TokenPressure::Low);

        let medium_history = vec![ChatTurn::text(1, TurnRole::User, "x".repeat(18_000), 0)];
        assert_eq!(
            assess_token_pressure("short", &medium_history),
            TokenPressure::Medium
        );

        let heavy_history = vec![ChatTurn::text(1, TurnRole::User, "x".repeat(40_000), 0)];
        assert_eq!(
            assess_token_pressure("short", &heavy_history),
            TokenPressure::High
        );
    }
}
