use serde::{Deserialize, Serialize};

/// A single multiple-choice question asked during the wizard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
}

impl Question {
    pub fn new(text: &str, options: &[&str]) -> Self {
        Self {
            text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    /// Returns true when `answer` is exactly one of the offered options
    pub fn offers(&self, answer: &str) -> bool {
        self.options.iter().any(|option| option == answer)
    }
}
