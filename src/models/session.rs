use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{EnrichedRecommendation, Persona, Question};

/// Wizard step, in the only order a session may move through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Welcome,
    GeneratingQuestions,
    AskingQuestions,
    GeneratingRecommendations,
    ShowingRecommendations,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Welcome => "welcome",
            Step::GeneratingQuestions => "generating_questions",
            Step::AskingQuestions => "asking_questions",
            Step::GeneratingRecommendations => "generating_recommendations",
            Step::ShowingRecommendations => "showing_recommendations",
        }
    }

    /// Steps that run without waiting for user input
    pub fn is_automatic(&self) -> bool {
        matches!(self, Step::GeneratingQuestions | Step::GeneratingRecommendations)
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one wizard session knows
///
/// Mutated only by `SessionStateMachine`; `Default` is the fresh state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SessionState {
    pub step: Step,
    pub persona: Option<Persona>,
    pub questions: Vec<Question>,
    pub answers: Vec<String>,
    pub recommendations: Vec<EnrichedRecommendation>,
    pub retry_count: u32,
    /// Message shown after the session was sent back to the start
    pub notice: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the question waiting for an answer
    pub fn current_index(&self) -> usize {
        self.answers.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.step != Step::AskingQuestions {
            return None;
        }
        self.questions.get(self.current_index())
    }

    pub fn all_answered(&self) -> bool {
        !self.questions.is_empty() && self.answers.len() == self.questions.len()
    }

    /// Fraction of questions shown so far, counting the current one
    pub fn progress(&self) -> f32 {
        if self.questions.is_empty() {
            return 0.0;
        }
        let shown = (self.current_index() + 1).min(self.questions.len());
        shown as f32 / self.questions.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asking_state() -> SessionState {
        SessionState {
            step: Step::AskingQuestions,
            persona: Some(Persona::AnimeFan),
            questions: vec![
                Question::new("First?", &["A", "B"]),
                Question::new("Second?", &["C", "D"]),
            ],
            ..SessionState::default()
        }
    }

    #[test]
    fn test_fresh_state() {
        let state = SessionState::new();
        assert_eq!(state.step, Step::Welcome);
        assert!(state.persona.is_none());
        assert!(state.questions.is_empty());
        assert_eq!(state.retry_count, 0);
        assert!(state.current_question().is_none());
        assert!(!state.all_answered());
    }

    #[test]
    fn test_current_question_follows_answers() {
        let mut state = asking_state();
        assert_eq!(state.current_question().unwrap().text, "First?");
        assert_eq!(state.progress(), 0.5);

        state.answers.push("A".to_string());
        assert_eq!(state.current_question().unwrap().text, "Second?");
        assert_eq!(state.progress(), 1.0);

        state.answers.push("C".to_string());
        assert!(state.current_question().is_none());
        assert!(state.all_answered());
    }

    #[test]
    fn test_step_names() {
        assert_eq!(Step::GeneratingQuestions.to_string(), "generating_questions");
        assert_eq!(
            serde_json::to_string(&Step::ShowingRecommendations).unwrap(),
            "\"showing_recommendations\""
        );
        assert!(Step::GeneratingRecommendations.is_automatic());
        assert!(!Step::AskingQuestions.is_automatic());
    }
}
