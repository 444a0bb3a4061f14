//! Survey data model and localized view models.
//!
//! These are the wire shapes the backend survey-fetch endpoint returns,
//! plus the view models this service renders for a visitor once every
//! translatable field has been resolved to a single locale. Surveys are
//! read-only here; authoring happens in the backend's administrative API.

use crate::i18n::{strings, Locale, LocalizedText};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A localized title/body pair for a gate or completion notice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoticeBundle {
    #[serde(default)]
    pub title: LocalizedText,
    #[serde(default)]
    pub body: LocalizedText,
}

/// The kind of input a question collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Numeric rating on a fixed scale
    Scale,
    /// Free-form text
    Text,
}

/// One survey question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    /// Display position, ascending. Has no bearing on validation.
    pub order: i32,

    pub kind: QuestionKind,

    /// Whether a non-empty answer is needed for submission to succeed
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub prompt: LocalizedText,

    /// Placeholder hint shown in the empty input
    #[serde(default)]
    pub hint: LocalizedText,
}

/// A survey as served by the backend for a public token.
///
/// Temporal fields are evaluated against wall-clock time on every request;
/// nothing here is cached beyond a single page lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
    pub id: String,

    pub public_token: String,

    pub is_active: bool,

    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub title: LocalizedText,

    #[serde(default)]
    pub questions: Vec<Question>,

    /// Shown when the survey has not started yet
    #[serde(default)]
    pub start_notice: NoticeBundle,

    /// Shown when the survey is expired or deactivated
    #[serde(default)]
    pub expiry_notice: NoticeBundle,

    /// Shown after a successful submission
    #[serde(default)]
    pub completion_notice: NoticeBundle,
}

impl Survey {
    /// Questions in display order (ascending `order`, stable for ties).
    pub fn ordered_questions(&self) -> Vec<&Question> {
        let mut questions: Vec<&Question> = self.questions.iter().collect();
        questions.sort_by_key(|question| question.order);
        questions
    }

    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }
}

/// One answer submitted by a visitor.
///
/// Carries either a numeric value (scale questions) or a text value;
/// both absent means the question was left unanswered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Answer {
    /// Whether this answer carries a non-empty value: a numeric value is
    /// always non-empty (zero counts as answered), text counts only when
    /// non-blank after trimming.
    pub fn is_answered(&self) -> bool {
        if self.scale.is_some() {
            return true;
        }
        self.text
            .as_deref()
            .map(|text| !text.trim().is_empty())
            .unwrap_or(false)
    }
}

/// A question resolved to one locale for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub kind: QuestionKind,
    pub required: bool,
    pub prompt: String,
    pub hint: String,
}

/// A survey resolved to one locale for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyView {
    pub token: String,
    pub locale: &'static str,
    pub title: String,
    pub questions: Vec<QuestionView>,
}

impl SurveyView {
    /// Resolve every translatable field of `survey` at `locale`.
    pub fn render(survey: &Survey, locale: Locale) -> Self {
        let questions = survey
            .ordered_questions()
            .into_iter()
            .map(|question| QuestionView {
                id: question.id.clone(),
                kind: question.kind,
                required: question.required,
                prompt: question.prompt.resolve(locale, strings::QUESTION_PROMPT),
                hint: question.hint.resolve(locale, ""),
            })
            .collect();

        Self {
            token: survey.public_token.clone(),
            locale: locale.code(),
            title: survey.title.resolve(locale, strings::SURVEY_TITLE),
            questions,
        }
    }
}
