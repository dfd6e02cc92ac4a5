//! # Domain Value Objects
//!
//! Strongly-typed identifiers and small value types shared across the core.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// TYPED IDENTIFIERS
// =============================================================================

/// Strongly-typed Quiz ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizId(pub Uuid);

impl QuizId {
    /// Creates a new random QuizId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuizId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QuizId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for QuizId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Strongly-typed Submission ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    /// Creates a new random SubmissionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SubmissionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Strongly-typed User ID. Users are owned by an external service; the core
/// only ever references them by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// =============================================================================
// QUESTION TYPES
// =============================================================================

/// The three answerable question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    TrueFalse,
    ShortAnswer,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mcq => write!(f, "mcq"),
            Self::TrueFalse => write!(f, "true_false"),
            Self::ShortAnswer => write!(f, "short_answer"),
        }
    }
}

impl QuestionType {
    /// Maps a raw provider-supplied type string onto the canonical three-value
    /// set. Matching is case-insensitive and tolerant of the common separator
    /// variants providers emit. Unknown strings default to `Mcq` with a
    /// warning.
    pub fn canonicalize(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace(['-', ' ', '/'], "_");
        match normalized.as_str() {
            "mcq" | "mc" | "choice" | "multiple_choice" | "multiplechoice" | "single_choice"
            | "singlechoice" => Self::Mcq,
            "true_false" | "truefalse" | "tf" | "boolean" | "bool" | "yes_no" => Self::TrueFalse,
            "short_answer" | "shortanswer" | "text" | "open" | "fill_in_the_blank"
            | "fill_blank" => Self::ShortAnswer,
            _ => {
                tracing::warn!(raw_type = %raw, "unknown question type, defaulting to mcq");
                Self::Mcq
            }
        }
    }
}

// =============================================================================
// DIFFICULTY
// =============================================================================

/// Per-question difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

impl Difficulty {
    /// Lenient parse for provider output; defaults to `Medium`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Medium,
        }
    }
}

/// Quiz-level difficulty, including the composite modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuizDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Mixed,
    Adaptive,
}

impl std::fmt::Display for QuizDifficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
            Self::Mixed => write!(f, "mixed"),
            Self::Adaptive => write!(f, "adaptive"),
        }
    }
}

impl From<Difficulty> for QuizDifficulty {
    fn from(d: Difficulty) -> Self {
        match d {
            Difficulty::Easy => Self::Easy,
            Difficulty::Medium => Self::Medium,
            Difficulty::Hard => Self::Hard,
        }
    }
}

/// Difficulty a caller may request for generation. `Mixed` (or omitting the
/// request entirely) lets the adaptive engine shape the distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedDifficulty {
    Easy,
    Medium,
    Hard,
    Mixed,
}

impl RequestedDifficulty {
    /// Returns the fixed level when the request names one.
    pub fn fixed_level(self) -> Option<Difficulty> {
        match self {
            Self::Easy => Some(Difficulty::Easy),
            Self::Medium => Some(Difficulty::Medium),
            Self::Hard => Some(Difficulty::Hard),
            Self::Mixed => None,
        }
    }
}

// =============================================================================
// DIFFICULTY DISTRIBUTION
// =============================================================================

/// Triple of integer percentages (easy, medium, hard) summing to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyDistribution {
    pub easy: i32,
    pub medium: i32,
    pub hard: i32,
}

impl DifficultyDistribution {
    pub fn new(easy: i32, medium: i32, hard: i32) -> Self {
        Self { easy, medium, hard }
    }

    pub fn total(&self) -> i32 {
        self.easy + self.medium + self.hard
    }

    /// Invariant: components sum to 100 and each lies in [0, 100].
    pub fn is_valid(&self) -> bool {
        self.total() == 100
            && (0..=100).contains(&self.easy)
            && (0..=100).contains(&self.medium)
            && (0..=100).contains(&self.hard)
    }
}

impl std::fmt::Display for DifficultyDistribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}% easy / {}% medium / {}% hard",
            self.easy, self.medium, self.hard
        )
    }
}

// =============================================================================
// GRADING
// =============================================================================

/// Letter grade for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GradeLetter {
    A,
    B,
    C,
    D,
    F,
}

impl GradeLetter {
    /// Calculates the letter grade from a 0-100 percentage.
    pub fn from_percentage(percentage: f64) -> Self {
        match percentage {
            p if p >= 90.0 => Self::A,
            p if p >= 80.0 => Self::B,
            p if p >= 70.0 => Self::C,
            p if p >= 60.0 => Self::D,
            _ => Self::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl std::fmt::Display for GradeLetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// SUBMISSION METADATA
// =============================================================================

/// Coarse device classification derived from the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Mobile,
    Tablet,
    #[default]
    Desktop,
}

impl DeviceType {
    /// Classifies a user agent: mobile on any of the mobile markers, tablet
    /// on the `Tablet` substring, otherwise desktop.
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return Self::Desktop;
        };
        const MOBILE_MARKERS: [&str; 4] = ["Mobile", "Android", "iPhone", "iPad"];
        if MOBILE_MARKERS.iter().any(|m| ua.contains(m)) {
            Self::Mobile
        } else if ua.contains("Tablet") {
            Self::Tablet
        } else {
            Self::Desktop
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mobile => write!(f, "mobile"),
            Self::Tablet => write!(f, "tablet"),
            Self::Desktop => write!(f, "desktop"),
        }
    }
}

// =============================================================================
// TRENDS & CONFIDENCE
// =============================================================================

/// Direction of a user's recent score trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Stable,
}

/// How much history backs an adaptive recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    #[default]
    Low,
    Medium,
    High,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_maps_common_aliases() {
        assert_eq!(QuestionType::canonicalize("mcq"), QuestionType::Mcq);
        assert_eq!(
            QuestionType::canonicalize("Multiple_Choice"),
            QuestionType::Mcq
        );
        assert_eq!(
            QuestionType::canonicalize("multiple-choice"),
            QuestionType::Mcq
        );
        assert_eq!(QuestionType::canonicalize("tf"), QuestionType::TrueFalse);
        assert_eq!(
            QuestionType::canonicalize("true/false"),
            QuestionType::TrueFalse
        );
        assert_eq!(
            QuestionType::canonicalize("BOOLEAN"),
            QuestionType::TrueFalse
        );
        assert_eq!(
            QuestionType::canonicalize("short-answer"),
            QuestionType::ShortAnswer
        );
        assert_eq!(
            QuestionType::canonicalize("Short Answer"),
            QuestionType::ShortAnswer
        );
    }

    #[test]
    fn canonicalize_defaults_unknown_to_mcq() {
        assert_eq!(QuestionType::canonicalize("essay"), QuestionType::Mcq);
        assert_eq!(QuestionType::canonicalize(""), QuestionType::Mcq);
    }

    #[test]
    fn grade_letter_boundaries() {
        assert_eq!(GradeLetter::from_percentage(90.0), GradeLetter::A);
        assert_eq!(GradeLetter::from_percentage(89.9), GradeLetter::B);
        assert_eq!(GradeLetter::from_percentage(80.0), GradeLetter::B);
        assert_eq!(GradeLetter::from_percentage(70.0), GradeLetter::C);
        assert_eq!(GradeLetter::from_percentage(60.0), GradeLetter::D);
        assert_eq!(GradeLetter::from_percentage(59.9), GradeLetter::F);
        assert_eq!(GradeLetter::from_percentage(0.0), GradeLetter::F);
    }

    #[test]
    fn device_type_classification() {
        assert_eq!(
            DeviceType::from_user_agent(Some("Mozilla/5.0 (iPhone; CPU iPhone OS 16_0)")),
            DeviceType::Mobile
        );
        assert_eq!(
            DeviceType::from_user_agent(Some("Mozilla/5.0 (Linux; Android 13)")),
            DeviceType::Mobile
        );
        assert_eq!(
            DeviceType::from_user_agent(Some("SomeBrowser (Tablet; rv:1.0)")),
            DeviceType::Tablet
        );
        assert_eq!(
            DeviceType::from_user_agent(Some("Mozilla/5.0 (Windows NT 10.0; Win64)")),
            DeviceType::Desktop
        );
        assert_eq!(DeviceType::from_user_agent(None), DeviceType::Desktop);
    }

    #[test]
    fn ipad_counts_as_mobile() {
        // iPad is listed among the mobile markers and wins over Tablet.
        assert_eq!(
            DeviceType::from_user_agent(Some("Mozilla/5.0 (iPad; Tablet)")),
            DeviceType::Mobile
        );
    }

    #[test]
    fn distribution_validity() {
        assert!(DifficultyDistribution::new(70, 25, 5).is_valid());
        assert!(!DifficultyDistribution::new(70, 25, 10).is_valid());
        assert!(!DifficultyDistribution::new(105, 30, -35).is_valid());
    }

    #[test]
    fn requested_difficulty_fixed_level() {
        assert_eq!(
            RequestedDifficulty::Hard.fixed_level(),
            Some(Difficulty::Hard)
        );
        assert_eq!(RequestedDifficulty::Mixed.fixed_level(), None);
    }
}
