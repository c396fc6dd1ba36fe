//! Answer Delegator
//!
//! Forwards a validated question to the answering collaborator and hands the
//! text back untouched. One call in, exactly one upstream call out: no retry,
//! no caching, no fallback text.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::client::AnsweringCollaborator;
use crate::error::{ApiError, Result};

/// Caller-supplied question text; may be empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl From<String> for Question {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Persona identifier sent with the question
///
/// Accepted and logged, never acted upon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersonaHint(Option<i32>);

impl PersonaHint {
    pub fn new(value: Option<i32>) -> Self {
        Self(value)
    }

    pub fn absent() -> Self {
        Self(None)
    }

    pub fn value(&self) -> Option<i32> {
        self.0
    }
}

impl From<i32> for PersonaHint {
    fn from(value: i32) -> Self {
        Self(Some(value))
    }
}

/// Verbatim collaborator output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerText(String);

impl AnswerText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for AnswerText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delegates questions to the answering collaborator
#[derive(Clone)]
pub struct AnswerDelegator {
    collaborator: Arc<dyn AnsweringCollaborator>,
}

impl AnswerDelegator {
    pub fn new(collaborator: Arc<dyn AnsweringCollaborator>) -> Self {
        Self { collaborator }
    }

    /// Ask the assistant a question
    ///
    /// The persona hint has no effect on the outcome.
    pub async fn ask(&self, question: Question, persona: PersonaHint) -> Result<AnswerText> {
        self.ask_timed(question, persona).await.0
    }

    /// Same as [`ask`](Self::ask), also returning how long the collaborator took
    pub async fn ask_timed(
        &self,
        question: Question,
        persona: PersonaHint,
    ) -> (Result<AnswerText>, Duration) {
        let question_len = question.char_len();

        tracing::info!(question_len, "Received question for the Oriento assistant");
        tracing::debug!(question = %question.as_str(), persona = ?persona.value(), "Question detail");
        if let Some(persona) = persona.value() {
            tracing::debug!(persona, "Persona hint received (not used)");
        }

        let start = Instant::now();
        let outcome = self.collaborator.answer(question.as_str()).await;
        let elapsed = start.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;

        let result = match outcome {
            Ok(text) => {
                let answer = AnswerText(text);
                tracing::info!(
                    answer_len = answer.char_len(),
                    elapsed_ms,
                    "Oriento answer generated"
                );
                tracing::debug!(answer = %answer, "Answer detail");
                Ok(answer)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    error_kind = e.kind(),
                    question_len,
                    elapsed_ms,
                    "Answering collaborator failed"
                );
                Err(ApiError::UpstreamFailure(e))
            }
        };

        (result, elapsed)
    }
}

impl fmt::Debug for AnswerDelegator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnswerDelegator").finish_non_exhaustive()
    }
}
