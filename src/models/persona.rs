use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Entertainment-taste category chosen at the start of a session
///
/// Serialized as its label; deserialized from any casing of the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Persona {
    #[serde(rename = "Anime Fan")]
    AnimeFan,
    #[serde(rename = "Hollywood Movie Enthusiast")]
    HollywoodEnthusiast,
    #[serde(rename = "Bollywood Fan")]
    BollywoodFan,
    #[serde(rename = "K-Drama Lover")]
    KDramaLover,
    #[serde(rename = "TV Series Binger")]
    SeriesBinger,
    #[serde(rename = "Indie Film Appreciator")]
    IndieAppreciator,
}

impl Persona {
    /// Every persona, in the order they are offered on the welcome step
    pub const ALL: [Persona; 6] = [
        Persona::AnimeFan,
        Persona::HollywoodEnthusiast,
        Persona::BollywoodFan,
        Persona::KDramaLover,
        Persona::SeriesBinger,
        Persona::IndieAppreciator,
    ];

    /// Persona whose static lists are used when no better match exists
    pub const DEFAULT: Persona = Persona::HollywoodEnthusiast;

    pub fn label(&self) -> &'static str {
        match self {
            Persona::AnimeFan => "Anime Fan",
            Persona::HollywoodEnthusiast => "Hollywood Movie Enthusiast",
            Persona::BollywoodFan => "Bollywood Fan",
            Persona::KDramaLover => "K-Drama Lover",
            Persona::SeriesBinger => "TV Series Binger",
            Persona::IndieAppreciator => "Indie Film Appreciator",
        }
    }
}

impl Display for Persona {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Persona::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown persona '{}'", wanted))
    }
}

impl TryFrom<String> for Persona {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
