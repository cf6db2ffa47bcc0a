use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    auth::AwsCredentials,
    config::BedrockConfig,
    errors::{MixerError, Result},
    providers::bedrock::{self, AnthropicRequest, BedrockClient},
};

/// Short genre description produced by the model, e.g. "upbeat pop".
///
/// Always trimmed and never empty. The model is asked for 2-4 words but
/// nothing enforces that, so callers must cope with longer phrases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GenrePhrase(String);

impl GenrePhrase {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }
}

impl fmt::Display for GenrePhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GenrePhrase {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub fn genre_prompt(mood: &str) -> String {
    format!("Someone feels: {mood}. Suggest a music genre in 2-4 words only.")
}

/// Turns a mood into a genre phrase with a single Bedrock completion.
///
/// Failures are returned to the caller untouched: without a genre the rest of
/// the pipeline has nothing to search for.
#[derive(Debug, Clone)]
pub struct GenreClassifier {
    client: BedrockClient,
    model_id: String,
    max_tokens: u32,
}

impl GenreClassifier {
    pub fn new(config: &BedrockConfig, credentials: AwsCredentials) -> Result<Self> {
        let client = BedrockClient::new(
            credentials,
            &config.region,
            &config.endpoint,
            config.timeout,
        )?;

        Ok(Self {
            client,
            model_id: config.model_id.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub async fn classify(&self, mood: &str) -> Result<GenrePhrase> {
        if mood.trim().is_empty() {
            return Err(MixerError::invalid_input("mood must not be empty"));
        }

        let prompt = genre_prompt(mood);
        let request = AnthropicRequest::single_turn(&prompt, self.max_tokens);
        let response = self.client.invoke(&self.model_id, &request).await?;

        let text = response
            .first_text()
            .ok_or_else(|| MixerError::malformed(bedrock::SERVICE, "response has no text content"))?;
        let genre = GenrePhrase::parse(text)
            .ok_or_else(|| MixerError::malformed(bedrock::SERVICE, "model returned an empty genre"))?;

        if genre.word_count() > 4 {
            debug!(
                target: "genre_classifier",
                genre = %genre,
                stop_reason = ?response.stop_reason,
                "genre phrase is longer than requested"
            );
        }

        info!(target: "genre_classifier", mood, genre = %genre, "mood classified");
        Ok(genre)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_wording() {
        assert_eq!(
            genre_prompt("happy 😊"),
            "Someone feels: happy 😊. Suggest a music genre in 2-4 words only."
        );
    }

    #[test]
    fn genre_phrase_is_trimmed_and_non_empty() {
        let genre = GenrePhrase::parse("  upbeat pop\n").unwrap();
        assert_eq!(genre.as_str(), "upbeat pop");
        assert_eq!(genre.word_count(), 2);
        assert_eq!(GenrePhrase::parse(" \n\t"), None);
    }

    #[test]
    fn long_phrases_are_kept_verbatim() {
        let genre = GenrePhrase::parse("Melancholic indie folk with soft piano").unwrap();
        assert_eq!(genre.word_count(), 6);
        assert_eq!(genre.to_string(), "Melancholic indie folk with soft piano");
    }

    #[test]
    fn serializes_as_plain_string() {
        let genre = GenrePhrase::parse("lofi hip hop").unwrap();
        assert_eq!(serde_json::to_string(&genre).unwrap(), "\"lofi hip hop\"");
    }
}
