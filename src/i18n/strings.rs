//! Literal fallback copy.
//!
//! These are the strings of last resort: they surface only when a bundle has
//! no usable entry at all, or when the landing page is rendered with an
//! empty handoff store. They are deliberately generic; by the time one of
//! these shows, we know nothing about the survey's own copy.

/// Shown in place of a survey title with no translations.
pub const SURVEY_TITLE: &str = "Survey";

/// Gate notice when a survey has not opened and carries no start copy.
pub const NOT_STARTED_TITLE: &str = "This survey has not opened yet";
pub const NOT_STARTED_BODY: &str = "Please check back once the survey opens.";

/// Gate notice when a survey is closed and carries no expiry copy.
pub const EXPIRED_TITLE: &str = "This survey is closed";
pub const EXPIRED_BODY: &str = "This survey is no longer accepting responses.";

/// Completion copy when a survey carries none of its own.
pub const COMPLETION_TITLE: &str = "Thank you!";
pub const COMPLETION_BODY: &str = "Your response has been recorded.";

/// Prompt for a question with no translated prompt at all.
pub const QUESTION_PROMPT: &str = "Untitled question";

/// Landing page copy when the handoff store has nothing for the visitor.
pub const LANDING_TITLE: &str = "All done";
pub const LANDING_BODY: &str = "There is nothing more to do here.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_copy_is_never_blank() {
        for text in [
            SURVEY_TITLE,
            NOT_STARTED_TITLE,
            NOT_STARTED_BODY,
            EXPIRED_TITLE,
            EXPIRED_BODY,
            COMPLETION_TITLE,
            COMPLETION_BODY,
            QUESTION_PROMPT,
            LANDING_TITLE,
            LANDING_BODY,
        ] {
            assert!(!text.trim().is_empty());
        }
    }
}
