//! Session state machine.
//!
//! Every mutation of a [`SessionState`] goes through one of the transition
//! functions here. A transition first checks the current step, so calling one
//! out of order returns `AppError::InvalidTransition` and leaves the state as it
//! was.
//!
//! Step order:
//!
//! ```text
//! Welcome → GeneratingQuestions → AskingQuestions ⟲ → GeneratingRecommendations → ShowingRecommendations
//! ```
//!
//! `reset` returns to Welcome from anywhere. GeneratingQuestions also falls back
//! to Welcome once the question source has failed `max_attempts` times.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{Persona, SessionState, Step},
    services::{
        enrichment::EnrichmentPipeline, questionnaire::QuestionSource,
        recommendations::RecommendationEngine,
    },
};

/// Shown after question generation gave up
pub const QUESTION_FAILURE_NOTICE: &str = "Failed to generate questions. Please try again.";

/// How often question generation is attempted before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Drives a session through the wizard steps
pub struct SessionStateMachine {
    questions: Arc<dyn QuestionSource>,
    recommender: RecommendationEngine,
    enrichment: Arc<EnrichmentPipeline>,
    retry: RetryPolicy,
}

impl SessionStateMachine {
    pub fn new(
        questions: Arc<dyn QuestionSource>,
        recommender: RecommendationEngine,
        enrichment: Arc<EnrichmentPipeline>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            questions,
            recommender,
            enrichment,
            retry,
        }
    }

    /// Welcome → GeneratingQuestions
    pub fn select_persona(&self, state: &mut SessionState, persona: Persona) -> AppResult<()> {
        expect_step(state, Step::Welcome, "select a persona")?;

        *state = SessionState {
            step: Step::GeneratingQuestions,
            persona: Some(persona),
            ..SessionState::default()
        };

        tracing::info!(persona = %persona, "Persona selected");
        Ok(())
    }

    /// GeneratingQuestions → AskingQuestions, or back to Welcome after repeated failure
    pub async fn generate_questions(&self, state: &mut SessionState) -> AppResult<()> {
        expect_step(state, Step::GeneratingQuestions, "generate questions")?;

        let persona = state
            .persona
            .ok_or_else(|| AppError::Internal("Generating questions without a persona".to_string()))?;

        loop {
            match self.questions.questions_for(persona).await {
                Ok(questions) if !questions.is_empty() => {
                    tracing::info!(
                        persona = %persona,
                        questions = questions.len(),
                        attempts = state.retry_count + 1,
                        "Questions ready"
                    );
                    state.questions = questions;
                    state.answers.clear();
                    state.retry_count = 0;
                    state.step = Step::AskingQuestions;
                    return Ok(());
                }
                Ok(_) => {
                    tracing::warn!(persona = %persona, "Question source returned nothing");
                }
                Err(e) => {
                    tracing::warn!(persona = %persona, error = %e, "Question source failed");
                }
            }

            state.retry_count += 1;

            if state.retry_count >= self.retry.max_attempts {
                tracing::error!(
                    persona = %persona,
                    attempts = state.retry_count,
                    "Giving up on question generation"
                );
                state.step = Step::Welcome;
                state.persona = None;
                state.questions.clear();
                state.notice = Some(QUESTION_FAILURE_NOTICE.to_string());
                return Ok(());
            }

            tokio::time::sleep(self.retry.delay).await;
        }
    }

    /// AskingQuestions self-loop; moves to GeneratingRecommendations after the last answer
    pub fn submit_answer(&self, state: &mut SessionState, answer: &str) -> AppResult<()> {
        expect_step(state, Step::AskingQuestions, "submit an answer")?;

        let index = state.current_index();
        let question = state.questions.get(index).ok_or_else(|| {
            AppError::Internal(format!("No question at index {}", index))
        })?;

        if !question.offers(answer) {
            return Err(AppError::InvalidInput(format!(
                "'{}' is not an option for question {}; expected one of {:?}",
                answer,
                index + 1,
                question.options
            )));
        }

        state.answers.push(answer.to_string());

        tracing::debug!(
            answered = state.answers.len(),
            total = state.questions.len(),
            "Answer recorded"
        );

        if state.all_answered() {
            state.step = Step::GeneratingRecommendations;
            tracing::info!(answers = state.answers.len(), "Questionnaire complete");
        }

        Ok(())
    }

    /// GeneratingRecommendations → ShowingRecommendations
    pub async fn generate_recommendations(&self, state: &mut SessionState) -> AppResult<()> {
        expect_step(state, Step::GeneratingRecommendations, "generate recommendations")?;

        let persona = state.persona.unwrap_or_else(|| {
            tracing::warn!(default = %Persona::DEFAULT, "No persona recorded, using default");
            Persona::DEFAULT
        });

        let candidates = self
            .recommender
            .recommend(persona, &state.questions, &state.answers)
            .await;

        let recommendations = self.enrichment.enrich_all(candidates).await;

        tracing::info!(
            persona = %persona,
            recommendations = recommendations.len(),
            "Recommendations ready"
        );

        state.recommendations = recommendations;
        state.step = Step::ShowingRecommendations;
        Ok(())
    }

    /// Any step → a fresh Welcome state
    pub fn reset(&self, state: &mut SessionState) {
        tracing::info!(from = %state.step, "Session reset");
        *state = SessionState::default();
    }

    /// Runs automatic steps until the session waits on the user
    pub async fn advance(&self, state: &mut SessionState) -> AppResult<()> {
        while state.step.is_automatic() {
            if state.step == Step::GeneratingQuestions {
                self.generate_questions(state).await?;
            } else {
                self.generate_recommendations(state).await?;
            }
        }
        Ok(())
    }
}

fn expect_step(state: &SessionState, expected: Step, action: &'static str) -> AppResult<()> {
    if state.step == expected {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            step: state.step,
            action,
        })
    }
}
