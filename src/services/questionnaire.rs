use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{GeneratedQuestion, Persona, Question},
    services::{
        providers::TextGenerator,
        structured::{generate_structured, parse_json_array},
    },
};

/// Number of questions requested from the model
pub const TARGET_QUESTIONS: usize = 8;
/// Fewest questions accepted from the model
pub const MIN_QUESTIONS: usize = 3;
const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 4;
/// Position of the thematic-interests question in the static set
const THEMATIC_INDEX: usize = 4;

/// Where the state machine gets its questions from
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait QuestionSource: Send + Sync {
    /// Produce the questionnaire for a persona
    ///
    /// An error, or an empty list, counts as a failed attempt.
    async fn questions_for(&self, persona: Persona) -> AppResult<Vec<Question>>;
}

/// Builds persona-specific questionnaires with the text generation model
pub struct QuestionnaireGenerator {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl QuestionnaireGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Returns generated questions, or the static set when generation fails
    pub async fn generate(&self, persona: Persona) -> Vec<Question> {
        let prompt = build_prompt(persona);

        let questions = generate_structured(
            self.generator.as_ref(),
            &prompt,
            self.timeout,
            "questionnaire",
            parse_questions,
            || fallback_questions(persona),
        )
        .await;

        tracing::info!(
            persona = %persona,
            questions = questions.len(),
            "Questionnaire ready"
        );

        questions
    }
}

#[async_trait::async_trait]
impl QuestionSource for QuestionnaireGenerator {
    async fn questions_for(&self, persona: Persona) -> AppResult<Vec<Question>> {
        Ok(self.generate(persona).await)
    }
}

fn build_prompt(persona: Persona) -> String {
    format!(
        r#"Generate a sequence of {count} personalized questions to recommend movies or shows based on this persona: {persona}.

Each question should have 2-4 options for the user to choose from. Format your response as a JSON array of objects,
where each object has 'question' and 'options' fields. The options should be an array of strings.

Make sure questions cover: mood, watching companions, available time, content preferences (movie/series length),
thematic interests, age of content (new releases vs classics), and preferred languages/regions.

Example format:
[
    {{
        "question": "Are you watching alone or with someone?",
        "options": ["Alone", "With friends", "With family", "With a date"]
    }}
]

IMPORTANT: Return ONLY valid JSON without any explanation or additional text."#,
        count = TARGET_QUESTIONS,
        persona = persona,
    )
}

/// Parses and validates a generated questionnaire
///
/// The whole set is rejected if any single question is malformed.
fn parse_questions(text: &str) -> AppResult<Vec<Question>> {
    let raw: Vec<GeneratedQuestion> = parse_json_array(text)?;

    if raw.len() < MIN_QUESTIONS {
        return Err(AppError::Parse(format!(
            "Expected at least {} questions, got {}",
            MIN_QUESTIONS,
            raw.len()
        )));
    }

    raw.into_iter()
        .take(TARGET_QUESTIONS)
        .enumerate()
        .map(|(index, q)| validate_question(index, q))
        .collect()
}

fn validate_question(index: usize, raw: GeneratedQuestion) -> AppResult<Question> {
    let text = raw
        .question
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Parse(format!("Question {} has no text", index)))?;

    let options: Vec<String> = raw
        .options
        .ok_or_else(|| AppError::Parse(format!("Question {} has no options", index)))?
        .into_iter()
        .map(|o| o.trim().to_string())
        .collect();

    let unique: HashSet<&str> = options.iter().map(String::as_str).collect();
    if options.iter().any(|o| o.is_empty()) || unique.len() != options.len() {
        return Err(AppError::Parse(format!(
            "Question {} has blank or duplicate options",
            index
        )));
    }

    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
        return Err(AppError::Parse(format!(
            "Question {} has {} options, expected {}-{}",
            index,
            options.len(),
            MIN_OPTIONS,
            MAX_OPTIONS
        )));
    }

    Ok(Question { text, options })
}

/// Hand-authored questionnaire used when generation fails
pub fn fallback_questions(persona: Persona) -> Vec<Question> {
    let mut questions = vec![
        Question::new(
            "What kind of mood are you in right now?",
            &["Happy and upbeat", "Thoughtful", "Tense and thrilled", "Need a good cry"],
        ),
        Question::new(
            "Who are you watching with?",
            &["Alone", "With friends", "With family", "With a date"],
        ),
        Question::new(
            "How much time do you have?",
            &["Under 2 hours", "An evening", "A whole weekend"],
        ),
        Question::new(
            "Do you prefer a movie or a series?",
            &["A single movie", "A short series", "A long-running series", "No preference"],
        ),
        Question::new(
            "Which themes interest you most?",
            &["Action and adventure", "Romance", "Mystery and crime", "Science fiction and fantasy"],
        ),
        Question::new(
            "New releases or classics?",
            &["Latest releases", "Last decade", "Timeless classics"],
        ),
        Question::new(
            "Any preferred language or region?",
            &["English", "Asian", "European", "Anything goes"],
        ),
        Question::new(
            "How intense do you like your stories?",
            &["Light and easy", "Balanced", "Dark and intense"],
        ),
    ];

    if persona == Persona::AnimeFan {
        questions[THEMATIC_INDEX] = Question::new(
            "Which anime genres do you enjoy most?",
            &["Shonen action", "Slice of life", "Mecha and sci-fi", "Psychological thriller"],
        );
    }

    questions
}
