use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    auth::AwsCredentials,
    capabilities::{GenreClassifier, GenrePhrase, SongFinder, SongSearch},
    config::AppConfig,
    errors::{MixerError, Result},
    secrets::{SecretProvider, resolve_optional_secret, resolve_secret},
};

#[derive(Debug, Clone)]
pub struct Recommendation {
    pub request_id: Uuid,
    pub mood: String,
    pub genre: GenrePhrase,
    pub songs: SongSearch,
}

/// Mood in, genre and songs out.
///
/// The two steps run one after the other with no shared state. A classifier
/// failure aborts the call; a song search failure only degrades it.
#[derive(Debug, Clone)]
pub struct MoodMixer {
    classifier: GenreClassifier,
    finder: SongFinder,
}

impl MoodMixer {
    pub fn new(classifier: GenreClassifier, finder: SongFinder) -> Self {
        Self { classifier, finder }
    }

    /// Builds both components with credentials resolved through `secrets`.
    pub async fn from_config(config: &AppConfig, secrets: &dyn SecretProvider) -> Result<Self> {
        let refs = &config.secrets;

        let access_key_id = resolve_secret(secrets, &refs.aws_access_key_id).await?;
        let secret_access_key = resolve_secret(secrets, &refs.aws_secret_access_key).await?;
        let session_token = match &refs.aws_session_token {
            Some(token) => resolve_optional_secret(secrets, token).await?,
            None => None,
        };
        let youtube_api_key = resolve_secret(secrets, &refs.youtube_api_key).await?;

        let credentials = AwsCredentials::new(access_key_id, secret_access_key, session_token);
        let classifier = GenreClassifier::new(&config.bedrock, credentials)?;
        let finder = SongFinder::new(&config.youtube, youtube_api_key)?;

        info!(
            target: "mood_mixer",
            model_id = %config.bedrock.model_id,
            region = %config.bedrock.region,
            "mood mixer ready"
        );

        Ok(Self::new(classifier, finder))
    }

    pub async fn recommend(&self, mood: &str) -> Result<Recommendation> {
        let request_id = Uuid::new_v4();
        let span = info_span!(target: "mood_mixer", "recommend", %request_id);

        self.run(request_id, mood).instrument(span).await
    }

    async fn run(&self, request_id: Uuid, mood: &str) -> Result<Recommendation> {
        let mood = mood.trim();
        if mood.is_empty() {
            return Err(MixerError::invalid_input("mood must not be empty"));
        }

        let genre = self.classifier.classify(mood).await?;
        let songs = self.finder.find_songs(genre.as_str()).await;

        if let SongSearch::Degraded { reason } = &songs {
            warn!(target: "mood_mixer", genre = %genre, reason = %reason, "serving genre without songs");
        }

        Ok(Recommendation {
            request_id,
            mood: mood.to_string(),
            genre,
            songs,
        })
    }
}
