use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, GeneratedCandidate, MediaKind, Persona, Question},
    services::{
        providers::TextGenerator,
        structured::{generate_structured, parse_json_array},
    },
};

/// Number of recommendations requested and kept
pub const RECOMMENDATION_COUNT: usize = 3;

/// Turns a persona and its answers into candidate titles
pub struct RecommendationEngine {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl RecommendationEngine {
    pub fn new(generator: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Returns 1 to 3 generated candidates, or the persona's static list
    pub async fn recommend(
        &self,
        persona: Persona,
        questions: &[Question],
        answers: &[String],
    ) -> Vec<Candidate> {
        let prompt = build_prompt(persona, &transcript(questions, answers));

        let candidates = generate_structured(
            self.generator.as_ref(),
            &prompt,
            self.timeout,
            "recommendations",
            parse_candidates,
            || fallback_candidates(persona),
        )
        .await;

        tracing::info!(
            persona = %persona,
            titles = ?candidates.iter().map(|c| c.title.as_str()).collect::<Vec<_>>(),
            "Recommendations ready"
        );

        candidates
    }
}

/// Renders each answered question as a "Q: ...\nA: ..." pair
pub fn transcript(questions: &[Question], answers: &[String]) -> String {
    questions
        .iter()
        .zip(answers)
        .map(|(q, a)| format!("Q: {}\nA: {}", q.text, a))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(persona: Persona, transcript: &str) -> String {
    format!(
        r#"Based on the following user persona and preferences, recommend exactly {count} movies or TV shows.

User Persona: {persona}

User Preferences:
{transcript}

For each recommendation, provide:
1. Title (exactly as it would appear in TheMovieDB)
2. Media type ("movie" or "tv")
3. A brief explanation of why this recommendation matches the user's preferences (2-3 sentences max)

Format your response as a JSON array of objects with 'title', 'type', and 'reason' fields.

Example:
[
    {{
        "title": "Inception",
        "type": "movie",
        "reason": "This mind-bending sci-fi thriller matches your interest in complex plots and psychological themes."
    }}
]

IMPORTANT: Return ONLY valid JSON without any explanation or additional text."#,
        count = RECOMMENDATION_COUNT,
        persona = persona,
        transcript = transcript,
    )
}

fn parse_candidates(text: &str) -> AppResult<Vec<Candidate>> {
    let raw: Vec<GeneratedCandidate> = parse_json_array(text)?;

    if raw.is_empty() {
        return Err(AppError::Parse("No recommendations returned".to_string()));
    }

    raw.into_iter()
        .take(RECOMMENDATION_COUNT)
        .enumerate()
        .map(|(index, c)| validate_candidate(index, c))
        .collect()
}

fn validate_candidate(index: usize, raw: GeneratedCandidate) -> AppResult<Candidate> {
    let non_empty = |value: Option<String>, field: &str| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Parse(format!("Recommendation {} is missing {}", index, field)))
    };

    let title = non_empty(raw.title, "title")?;
    let kind_text = non_empty(raw.kind, "type")?;
    let reason = non_empty(raw.reason, "reason")?;

    let kind = MediaKind::parse(&kind_text).ok_or_else(|| {
        AppError::Parse(format!(
            "Recommendation {} has unknown type '{}'",
            index, kind_text
        ))
    })?;

    Ok(Candidate {
        title,
        kind,
        reason,
    })
}

/// Well-known titles used when generation fails
pub fn fallback_candidates(persona: Persona) -> Vec<Candidate> {
    use MediaKind::{Movie, Series};

    let table: [(&str, MediaKind, &str); RECOMMENDATION_COUNT] = match persona {
        Persona::AnimeFan => [
            ("Your Name", Movie, "A gorgeous body-swap romance that shows anime storytelling at its most emotional."),
            ("Spirited Away", Movie, "Studio Ghibli's masterpiece of wonder and imagination, perfect for any anime fan."),
            ("Attack on Titan", Series, "A gripping, high-stakes saga with twists that reward binge-watching."),
        ],
        Persona::HollywoodEnthusiast => [
            ("Inception", Movie, "A mind-bending blockbuster with layered storytelling and spectacular set pieces."),
            ("The Shawshank Redemption", Movie, "A timeless story of hope and friendship that tops nearly every best-of list."),
            ("The Dark Knight", Movie, "A superhero film elevated into a tense crime epic by an unforgettable villain."),
        ],
        Persona::BollywoodFan => [
            ("3 Idiots", Movie, "A heartfelt comedy about friendship and following your passion."),
            ("Dangal", Movie, "An inspiring true story of a father training his daughters to become wrestling champions."),
            ("Zindagi Na Milegi Dobara", Movie, "A joyful road trip about friendship and living in the moment."),
        ],
        Persona::KDramaLover => [
            ("Crash Landing on You", Series, "A sweeping cross-border romance with humor and heart."),
            ("Goblin", Series, "A fantasy romance blending melancholy and charm, a K-drama essential."),
            ("Reply 1988", Series, "A warm, nostalgic portrait of family and friendship in a Seoul neighborhood."),
        ],
        Persona::SeriesBinger => [
            ("Breaking Bad", Series, "A masterclass in character transformation with relentless tension."),
            ("Stranger Things", Series, "Retro sci-fi adventure with a lovable ensemble, made for marathon viewing."),
            ("The Office", Series, "Endlessly rewatchable workplace comedy with plenty of seasons to enjoy."),
        ],
        Persona::IndieAppreciator => [
            ("Lady Bird", Movie, "A sharp, tender coming-of-age story with a distinctive indie voice."),
            ("Moonlight", Movie, "A quietly powerful, beautifully shot portrait of identity and growing up."),
            ("Everything Everywhere All at Once", Movie, "An inventive multiverse adventure bursting with heart and originality."),
        ],
    };

    table
        .iter()
        .map(|(title, kind, reason)| Candidate::new(title, *kind, reason))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockTextGenerator;

    fn generator_with(reply: AppResult<String>) -> Arc<dyn TextGenerator> {
        let mut generator = MockTextGenerator::new();
        let mut reply = Some(reply);
        generator
            .expect_generate()
            .times(1)
            .returning(move |_| reply.take().unwrap_or_else(|| Err(AppError::Generation("used".into()))));
        generator.expect_name().return_const("mock");
        Arc::new(generator)
    }

    fn sample_answers() -> (Vec<Question>, Vec<String>) {
        (
            vec![
                Question::new("Mood?", &["Happy", "Sad"]),
                Question::new("Company?", &["Alone", "Friends"]),
            ],
            vec!["Happy".to_string(), "Friends".to_string()],
        )
    }

    #[test]
    fn test_transcript_format() {
        let (questions, answers) = sample_answers();
        assert_eq!(
            transcript(&questions, &answers),
            "Q: Mood?\nA: Happy\nQ: Company?\nA: Friends"
        );
    }

    #[tokio::test]
    async fn test_recommend_accepts_valid_reply() {
        let reply = r#"[
            {"title": "Parasite", "type": "movie", "reason": "Sharp social thriller."},
            {"title": "Dark", "type": "tv", "reason": "Time-bending mystery."},
            {"title": "Amelie", "type": "movie", "reason": "Whimsical and warm."}
        ]"#;
        let engine = RecommendationEngine::new(generator_with(Ok(reply.to_string())), Duration::from_secs(1));
        let (questions, answers) = sample_answers();

        let candidates = engine.recommend(Persona::IndieAppreciator, &questions, &answers).await;

        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[1], Candidate::new("Dark", MediaKind::Series, "Time-bending mystery."));
    }

    #[tokio::test]
    async fn test_recommend_tolerates_fewer_and_truncates_more() {
        let one = r#"[{"title": "Dark", "type": "tv", "reason": "Twisty."}]"#;
        let engine = RecommendationEngine::new(generator_with(Ok(one.to_string())), Duration::from_secs(1));
        let candidates = engine.recommend(Persona::SeriesBinger, &[], &[]).await;
        assert_eq!(candidates.len(), 1);

        let items: Vec<String> = (0..5)
            .map(|i| format!(r#"{{"title": "T{}", "type": "movie", "reason": "R"}}"#, i))
            .collect();
        let five = format!("[{}]", items.join(","));
        let engine = RecommendationEngine::new(generator_with(Ok(five)), Duration::from_secs(1));
        let candidates = engine.recommend(Persona::SeriesBinger, &[], &[]).await;
        assert_eq!(candidates.len(), RECOMMENDATION_COUNT);
    }

    #[tokio::test]
    async fn test_kdrama_fallback_on_failure() {
        let engine = RecommendationEngine::new(
            generator_with(Err(AppError::Generation("quota exceeded".into()))),
            Duration::from_secs(1),
        );
        let (questions, answers) = sample_answers();

        let candidates = engine.recommend(Persona::KDramaLover, &questions, &answers).await;

        assert_eq!(candidates, fallback_candidates(Persona::KDramaLover));
        assert_eq!(candidates[0].title, "Crash Landing on You");
        assert!(candidates.iter().all(|c| c.kind == MediaKind::Series));
    }

    #[tokio::test]
    async fn test_malformed_replies_fall_back() {
        let replies = [
            "[]",
            "not json at all",
            r#"[{"title": "Dark", "type": "tv"}]"#,
            r#"[{"title": "", "type": "movie", "reason": "x"}]"#,
            r#"[{"title": "Serial", "type": "podcast", "reason": "x"}]"#,
        ];

        for reply in replies {
            let engine =
                RecommendationEngine::new(generator_with(Ok(reply.to_string())), Duration::from_secs(1));
            let candidates = engine.recommend(Persona::BollywoodFan, &[], &[]).await;
            assert_eq!(candidates, fallback_candidates(Persona::BollywoodFan), "reply: {}", reply);
        }
    }

    #[test]
    fn test_every_persona_has_three_fallbacks() {
        for persona in Persona::ALL {
            let candidates = fallback_candidates(persona);
            assert_eq!(candidates.len(), RECOMMENDATION_COUNT);
            assert!(candidates
                .iter()
                .all(|c| !c.title.is_empty() && !c.reason.is_empty()));
        }
    }

    #[test]
    fn test_prompt_embeds_persona_and_transcript() {
        let prompt = build_prompt(Persona::AnimeFan, "Q: Mood?\nA: Happy");
        assert!(prompt.contains("User Persona: Anime Fan"));
        assert!(prompt.contains("Q: Mood?\nA: Happy"));
        assert!(prompt.contains("recommend exactly 3"));
    }
}
