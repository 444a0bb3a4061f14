//! Response assembly and validation.
//!
//! Turns a visitor's raw answers into either a submission the backend will
//! store or a validation failure naming the required questions still
//! unanswered. Validation fails closed: nothing is sent to the backend
//! until every required question carries a non-empty answer.

use crate::backend::BackendClient;
use crate::gate::ClosedNotice;
use crate::i18n::{strings, Locale};
use crate::survey::{Answer, Question, Survey};
use anyhow::Result;
use std::collections::HashSet;

/// The result of a submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Stored by the backend.
    Accepted {
        /// Backend reference for the stored response
        reference: String,
        /// Completion copy resolved at the visitor's locale
        completion_title: String,
        completion_body: String,
    },

    /// Required questions were unanswered; nothing was submitted.
    Rejected {
        /// Ids of the unmet required questions, in display order
        unmet: Vec<String>,
        /// Their prompts resolved at the visitor's locale, same order
        prompts: Vec<String>,
    },

    /// The availability gate was closed at submission time.
    Closed(ClosedNotice),
}

/// Keep only answers that carry a non-empty value.
///
/// A numeric value always counts, including zero. Text counts when it is
/// non-blank after trimming.
pub fn filter_answered(answers: Vec<Answer>) -> Vec<Answer> {
    answers.into_iter().filter(Answer::is_answered).collect()
}

/// Required questions with no non-empty answer, in display order.
pub fn unmet_required<'a>(survey: &'a Survey, answered: &[Answer]) -> Vec<&'a Question> {
    let answered_ids: HashSet<&str> = answered
        .iter()
        .map(|answer| answer.question_id.as_str())
        .collect();

    survey
        .ordered_questions()
        .into_iter()
        .filter(|question| question.required && !answered_ids.contains(question.id.as_str()))
        .collect()
}

/// Validate `answers` against `survey` and submit when they pass.
///
/// Returns `Rejected` without touching the backend when any required
/// question is unmet. The only `Err` is a submission transport failure,
/// the one true failure class; the caller surfaces it as a dismissible
/// notice and the visitor may resubmit.
pub async fn assemble(
    backend: &BackendClient,
    survey: &Survey,
    answers: Vec<Answer>,
    locale: Locale,
) -> Result<SubmissionOutcome> {
    let answered = filter_answered(answers);
    let unmet = unmet_required(survey, &answered);

    if !unmet.is_empty() {
        let prompts = unmet
            .iter()
            .map(|question| question.prompt.resolve(locale, strings::QUESTION_PROMPT))
            .collect();
        let unmet = unmet.into_iter().map(|question| question.id.clone()).collect();
        return Ok(SubmissionOutcome::Rejected { unmet, prompts });
    }

    let receipt = backend.submit_response(&survey.id, locale, &answered).await?;

    Ok(SubmissionOutcome::Accepted {
        reference: receipt.reference,
        completion_title: survey
            .completion_notice
            .title
            .resolve(locale, strings::COMPLETION_TITLE),
        completion_body: survey
            .completion_notice
            .body
            .resolve(locale, strings::COMPLETION_BODY),
    })
}
