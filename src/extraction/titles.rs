//! Keep/exclude classification of contact titles.
//!
//! Only administrative and leadership roles are kept. Two classifiers share
//! the same gate: a contact without a title or without both names is
//! excluded, and any assistant principal is excluded, before either one
//! looks at the title.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use rig::completion::CompletionModel;
use tracing::{debug, warn};

use crate::extraction::config::ExtractionConfig;
use crate::extraction::error::ExtractionError;
use crate::extraction::prompts::{TITLE_PROMPT_V1, title_request};
use crate::model::complete_text;
use crate::types::Contact;

/// Leadership keywords that make a role segment administrative on their own
pub const PRIMARY_LEADERSHIP: [&str; 15] = [
    "superintendent",
    "head of school",
    "school head",
    "principal",
    "division head",
    "upper school head",
    "middle school head",
    "lower school head",
    "chancellor",
    "provost",
    "school president",
    "president of",
    "assistant head of school",
    "associate head of school",
    "head of the school",
];

/// Managerial keywords, administrative unless the segment names an excluded function
pub const MANAGERIAL: [&str; 6] = ["director", "chief", "dean", "administrator", "manager", "coordinator"];

/// Functions that are never administrative for outreach purposes
pub const EXCLUDED_FUNCTIONS: [&str; 62] = [
    "teacher",
    "faculty",
    "instructor",
    "professor",
    "tutor",
    "aide",
    "counselor",
    "counselling",
    "psychologist",
    "therapist",
    "chaplain",
    "ministry",
    "pastor",
    "admission",
    "enrollment",
    "registrar",
    "recruiting",
    "outreach",
    "marketing",
    "communications",
    "media",
    "public relations",
    "advancement",
    "development",
    "fundraising",
    "alumni",
    "donor",
    "athletic",
    "coach",
    "sports",
    "physical education",
    "fine arts",
    "music",
    "band",
    "choir",
    "theatre",
    "performing arts",
    "secretary",
    "administrative assistant",
    "office manager",
    "receptionist",
    "executive assistant",
    "nurse",
    "health",
    "nutrition",
    "cafeteria",
    "dining",
    "food service",
    "residential",
    "dorm",
    "housing",
    "boarding",
    "early childhood",
    "preschool",
    "daycare",
    "aftercare",
    "student life",
    "student services",
    "student support",
    "trip",
    "board",
    "trustee",
];

/// Titles excluded whatever else they contain
pub const HARD_EXCLUSIONS: [&str; 8] = [
    "assistant principal",
    "principal of accreditation",
    "accreditation principal",
    "casp director",
    "curriculum coordinator",
    "assistant director",
    "asst director",
    "asst. director",
];

static SEGMENT_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:&|/|,|;|\band\b)\s*").expect("valid segment regex"));

static RETRY_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)please try again in (\d+(?:\.\d+)?)\s*(ms|s)\b").expect("valid retry hint regex")
});

/// Decision shared by both classifiers, or `None` when the title must be judged
pub fn gate(contact: &Contact) -> Option<bool> {
    let title = contact.title.trim().to_lowercase();
    if title.is_empty() || contact.first_name.trim().is_empty() || contact.last_name.trim().is_empty() {
        return Some(false);
    }
    if title.contains("assistant principal") {
        return Some(false);
    }
    None
}

fn is_administrative_segment(segment: &str) -> bool {
    if PRIMARY_LEADERSHIP.iter().any(|k| segment.contains(k)) {
        return true;
    }
    MANAGERIAL.iter().any(|k| segment.contains(k))
        && !EXCLUDED_FUNCTIONS.iter().any(|k| segment.contains(k))
}

/// Rule-table decision for a title: keep iff it is not hard-excluded and at
/// least one role segment is administrative.
pub fn classify_title(title: &str) -> bool {
    let title = title.trim().to_lowercase();
    if title.is_empty() || HARD_EXCLUSIONS.iter().any(|k| title.contains(k)) {
        return false;
    }
    SEGMENT_SPLIT
        .split(&title)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .any(is_administrative_segment)
}

/// Wait requested by a rate-limit message, plus half a second.
///
/// A hint too large to represent as a [`Duration`] is ignored.
pub fn retry_hint(message: &str) -> Option<Duration> {
    let captures = RETRY_HINT.captures(message)?;
    let value: f64 = captures[1].parse().ok()?;
    let seconds = if captures[2].eq_ignore_ascii_case("ms") {
        value / 1000.0
    } else {
        value
    };
    Duration::try_from_secs_f64(seconds + 0.5).ok()
}

/// Decides whether a contact's role is worth keeping
pub trait TitleClassifier: Send + Sync {
    fn keep(&self, contact: &Contact) -> impl Future<Output = bool> + Send;
}

/// Deterministic keyword-table classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTitleClassifier;

impl TitleClassifier for RuleTitleClassifier {
    async fn keep(&self, contact: &Contact) -> bool {
        gate(contact).unwrap_or_else(|| classify_title(&contact.title))
    }
}

/// Classifier that asks the LLM for a `KEEP`/`EXCLUDE` token
#[derive(Debug, Clone)]
pub struct LlmTitleClassifier<M: CompletionModel> {
    model: M,
    max_attempts: u32,
    backoff_base: Duration,
}

impl<M: CompletionModel> LlmTitleClassifier<M> {
    pub fn new(model: M, config: &ExtractionConfig) -> Self {
        Self {
            model,
            max_attempts: config.max_attempts.max(1),
            backoff_base: config.backoff_delay(0),
        }
    }

    /// Wait before retrying after `err`; a rate-limit hint overrides the
    /// exponential backoff
    fn retry_delay(&self, err: &ExtractionError, attempt: u32) -> Duration {
        let backoff = self.backoff_base.saturating_mul(1 << attempt.min(16));
        match err {
            ExtractionError::RateLimited(message) => retry_hint(message).unwrap_or(backoff),
            _ => backoff,
        }
    }

    async fn ask(&self, contact: &Contact) -> Result<bool, ExtractionError> {
        let prompt = title_request(&contact.first_name, &contact.last_name, &contact.title);

        let mut attempt = 0;
        loop {
            let err = match complete_text(&self.model, TITLE_PROMPT_V1, &prompt, 0.0, 10).await {
                Ok(text) => {
                    let answer = text.trim().to_uppercase();
                    if !answer.contains("KEEP") && !answer.contains("EXCLUDE") {
                        warn!(title = %contact.title, %answer, "unexpected classifier answer");
                    }
                    return Ok(answer.contains("KEEP") && !answer.contains("EXCLUDE"));
                }
                Err(e) => ExtractionError::from(e),
            };

            if attempt + 1 >= self.max_attempts {
                return Err(err);
            }
            let delay = self.retry_delay(&err, attempt);
            debug!(attempt = attempt + 1, error = %err, "title classification retry in {:?}", delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl<M: CompletionModel> TitleClassifier for LlmTitleClassifier<M> {
    async fn keep(&self, contact: &Contact) -> bool {
        if let Some(decision) = gate(contact) {
            return decision;
        }
        match self.ask(contact).await {
            Ok(keep) => keep,
            Err(e) => {
                warn!(title = %contact.title, error = %e, "title classification failed, excluding");
                false
            }
        }
    }
}

/// Classifier chosen at run time
#[derive(Debug, Clone)]
pub enum TitleFilter<M: CompletionModel> {
    Rules(RuleTitleClassifier),
    Llm(LlmTitleClassifier<M>),
}

impl<M: CompletionModel> TitleFilter<M> {
    pub fn rules() -> Self {
        Self::Rules(RuleTitleClassifier)
    }

    pub fn llm(model: M, config: &ExtractionConfig) -> Self {
        Self::Llm(LlmTitleClassifier::new(model, config))
    }
}

impl<M: CompletionModel> TitleClassifier for TitleFilter<M> {
    async fn keep(&self, contact: &Contact) -> bool {
        match self {
            Self::Rules(rules) => rules.keep(contact).await,
            Self::Llm(llm) => llm.keep(contact).await,
        }
    }
}
