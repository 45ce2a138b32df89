//! Ask a model for structured output, validate it, or fall back.
//!
//! Questions, recommendations and descriptions all follow the same shape: send a
//! prompt, turn the reply into a typed value, and substitute hand-authored
//! content when any of that goes wrong. Nothing in here returns an error to the
//! caller of [`generate_structured`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    services::providers::TextGenerator,
};

/// Runs an external call, turning an expired deadline into `AppError::Timeout`
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| AppError::Timeout(limit))?
}

/// Prompts `generator`, parses the reply with `parse`, and returns `fallback()`
/// on capability failure, timeout or a rejected parse
pub async fn generate_structured<T, P, F>(
    generator: &dyn TextGenerator,
    prompt: &str,
    limit: Duration,
    purpose: &'static str,
    parse: P,
    fallback: F,
) -> T
where
    P: FnOnce(&str) -> AppResult<T>,
    F: FnOnce() -> T,
{
    let outcome = match with_timeout(limit, generator.generate(prompt)).await {
        Ok(text) => parse(&text),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(value) => {
            tracing::debug!(purpose, provider = generator.name(), "Generated content accepted");
            value
        }
        Err(e) => {
            tracing::warn!(
                purpose,
                provider = generator.name(),
                error = %e,
                "Generation unusable, using fallback"
            );
            fallback()
        }
    }
}

/// Parses a JSON array out of model output, tolerating fences and prose
///
/// Tries each `[` in turn and returns the first array that deserializes into
/// `Vec<T>`, so bracketed prose around the payload is skipped.
pub fn parse_json_array<T: DeserializeOwned>(text: &str) -> AppResult<Vec<T>> {
    let mut last_error = None;

    for (start, _) in text.match_indices('[') {
        let mut values = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        let Some(Ok(value @ Value::Array(_))) = values.next() else {
            continue;
        };

        match serde_json::from_value(value) {
            Ok(items) => return Ok(items),
            Err(e) => last_error = Some(e),
        }
    }

    Err(match last_error {
        Some(e) => AppError::Parse(format!("Invalid JSON array: {}", e)),
        None => AppError::Parse("Response did not contain a JSON array".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockTextGenerator;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        name: String,
    }

    fn generator_returning(result: AppResult<String>) -> MockTextGenerator {
        let mut generator = MockTextGenerator::new();
        let mut result = Some(result);
        generator
            .expect_generate()
            .times(1)
            .returning(move |_| result.take().unwrap_or_else(|| Err(AppError::Generation("used".into()))));
        generator.expect_name().return_const("mock");
        generator
    }

    #[test]
    fn test_parse_plain_array() {
        let items: Vec<Item> = parse_json_array(r#"[{"name": "a"}, {"name": "b"}]"#).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_parse_fenced_array() {
        let text = "```json\n[{\"name\": \"a\"}]\n```";
        let items: Vec<Item> = parse_json_array(text).unwrap();
        assert_eq!(items, vec![Item { name: "a".into() }]);
    }

    #[test]
    fn test_parse_array_with_prose() {
        let text = "Sure! Here you go:\n[{\"name\": \"a\"}]\nEnjoy.";
        let items: Vec<Item> = parse_json_array(text).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_parse_skips_bracketed_prose() {
        let text = "Here are [2] picks:\n[{\"name\": \"a\"}, {\"name\": \"b\"}]\nSee [1] for details.";
        let items: Vec<Item> = parse_json_array(text).unwrap();
        assert_eq!(items, vec![Item { name: "a".into() }, Item { name: "b".into() }]);
    }

    #[test]
    fn test_parse_reports_wrong_shape() {
        let err = parse_json_array::<Item>("[1, 2, 3]").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON array"));
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            parse_json_array::<Item>("I cannot help with that."),
            Err(AppError::Parse(_))
        ));
        assert!(matches!(
            parse_json_array::<Item>("[not json]"),
            Err(AppError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_structured_accepts_valid_output() {
        let generator = generator_returning(Ok(r#"[{"name": "x"}]"#.to_string()));

        let items = generate_structured(
            &generator,
            "prompt",
            Duration::from_secs(1),
            "test",
            parse_json_array::<Item>,
            Vec::new,
        )
        .await;

        assert_eq!(items, vec![Item { name: "x".into() }]);
    }

    #[tokio::test]
    async fn test_generate_structured_falls_back_on_error() {
        let generator = generator_returning(Err(AppError::Generation("down".into())));

        let value = generate_structured(
            &generator,
            "prompt",
            Duration::from_secs(1),
            "test",
            |_| Ok("model".to_string()),
            || "fallback".to_string(),
        )
        .await;

        assert_eq!(value, "fallback");
    }

    #[tokio::test]
    async fn test_generate_structured_falls_back_on_rejected_parse() {
        let generator = generator_returning(Ok("garbage".to_string()));

        let value = generate_structured(
            &generator,
            "prompt",
            Duration::from_secs(1),
            "test",
            |_| Err::<String, _>(AppError::Parse("bad".into())),
            || "fallback".to_string(),
        )
        .await;

        assert_eq!(value, "fallback");
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result: AppResult<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(AppError::Timeout(_))));
    }
}
