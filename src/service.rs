use crate::cache::{hint_cache_key, quiz_cache_key};
use crate::content::{ContentError, ContentSource};
use crate::errors::OrchestratorError;
use crate::history::{HistoryFilter, HistoryRecord, HistoryRepository};
use crate::orchestrator::{GenerationRequest, Orchestrator};
use crate::prompts::{hint_prompt, quiz_prompt};
use crate::schemas::quiz::{format_questions, score_answers, Question, QuizSubmission};
use crate::schemas::shapes::{HintShape, QuestionsShape, ResponseShape};
use crate::settings::{ChainSettings, Settings};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Used in place of tutorial text when the content API cannot provide it.
pub const FALLBACK_CONTENT: &str =
    "Placeholder content: material about AI, Natural Language Processing, and Self-driving Cars.";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Generation(#[from] OrchestratorError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub quiz: ChainSettings,
    pub hint: ChainSettings,
    pub max_attempts_per_model: u32,
}

impl ServiceConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            quiz: settings.quiz.clone(),
            hint: settings.hint.clone(),
            max_attempts_per_model: settings.max_attempts_per_model,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentMetadata {
    pub tutorial_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub questions: Vec<Question>,
    pub user_preferences: Value,
    pub metadata: AssessmentMetadata,
}

fn default_preferences() -> Value {
    json!({ "theme": "light", "locale": "id" })
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, ServiceError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::InvalidInput(message.to_string()))
}

/// Quiz, hint and history operations on top of the orchestrator.
pub struct LearningService {
    orchestrator: Orchestrator,
    content: Arc<dyn ContentSource>,
    history: Arc<dyn HistoryRepository>,
    config: ServiceConfig,
}

impl LearningService {
    pub fn new(
        orchestrator: Orchestrator,
        content: Arc<dyn ContentSource>,
        history: Arc<dyn HistoryRepository>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            orchestrator,
            content,
            history,
            config,
        }
    }

    fn request_for(
        &self,
        prompt: String,
        cache_key: String,
        chain: &ChainSettings,
        shape: Arc<dyn ResponseShape>,
    ) -> GenerationRequest {
        GenerationRequest::new(prompt, cache_key, chain.models.clone(), shape)
            .with_attempt_timeout(chain.attempt_timeout())
            .with_max_attempts(self.config.max_attempts_per_model)
    }

    pub async fn generate_assessment(
        &self,
        tutorial_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Assessment, ServiceError> {
        const MISSING: &str = "tutorial_id and user_id are required.";
        let tutorial_id = required(tutorial_id, MISSING)?;
        let user_id = required(user_id, MISSING)?;

        let (content, preferences) = tokio::join!(
            self.content.tutorial_content(tutorial_id),
            self.content.user_preferences(user_id)
        );

        let context = content.unwrap_or_else(|e| {
            warn!("Tutorial content unavailable, using fallback: {}", e);
            FALLBACK_CONTENT.to_string()
        });
        let user_preferences = match preferences {
            Ok(Some(preferences)) => preferences,
            Ok(None) => default_preferences(),
            Err(e) => {
                warn!("User preferences unavailable, using defaults: {}", e);
                default_preferences()
            }
        };

        let prompt = quiz_prompt(&context);
        let cache_key = quiz_cache_key(&prompt);
        let request =
            self.request_for(prompt, cache_key, &self.config.quiz, Arc::new(QuestionsShape));

        let result = self.orchestrator.generate(&request).await?;
        let questions = format_questions(&result.value["questions"]);
        info!(
            "Assessment for tutorial {} ready with {} questions (cached: {})",
            tutorial_id,
            questions.len(),
            result.cached
        );

        Ok(Assessment {
            questions,
            user_preferences,
            metadata: AssessmentMetadata {
                tutorial_id: tutorial_id.to_string(),
                user_id: user_id.to_string(),
            },
        })
    }

    pub async fn generate_hint(
        &self,
        tutorial_id: Option<&str>,
        question: Option<&str>,
    ) -> Result<Value, ServiceError> {
        const MISSING: &str = "tutorial_id and question are required.";
        let tutorial_id = required(tutorial_id, MISSING)?;
        let question = required(question, MISSING)?;

        // Hints are keyed by tutorial and question, so a hit skips the content fetch too.
        let cache_key = hint_cache_key(tutorial_id, question);
        if let Some(cached) = self.orchestrator.lookup(&cache_key, &HintShape).await {
            info!("Hint cache hit: {}", cache_key);
            return Ok(cached);
        }

        let context = self.content.tutorial_content(tutorial_id).await?;
        let prompt = hint_prompt(&context, question);
        let request = self.request_for(prompt, cache_key, &self.config.hint, Arc::new(HintShape));

        Ok(self.orchestrator.generate(&request).await?.into_value())
    }

    pub async fn submit(&self, submission: QuizSubmission) -> Result<u32, ServiceError> {
        const INCOMPLETE: &str = "Incomplete submission data.";
        let user_id = required(submission.user_id.as_deref(), INCOMPLETE)?;
        let tutorial_id = required(submission.tutorial_id.as_deref(), INCOMPLETE)?;
        let (Some(answers), Some(questions)) = (&submission.answers, &submission.questions) else {
            return Err(ServiceError::InvalidInput(INCOMPLETE.to_string()));
        };

        let score = score_answers(questions, answers);
        self.history
            .append(HistoryRecord::new(user_id, tutorial_id, score, questions.len()))
            .await;
        info!("User {} scored {} on tutorial {}", user_id, score, tutorial_id);

        Ok(score)
    }

    pub async fn history(&self, user_id: &str) -> Vec<HistoryRecord> {
        self.history.query(&HistoryFilter::for_user(user_id)).await
    }

    pub async fn preferences(&self, user_id: &str) -> Result<Option<Value>, ServiceError> {
        Ok(self.content.user_preferences(user_id).await?)
    }
}
