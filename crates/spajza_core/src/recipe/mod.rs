//! AI recipe suggestions from the current pantry.
//!
//! # Responsibility
//! - Build the natural-language prompt from a query and stocked products.
//! - Return answer text plus web citations from a grounded model call.
//!
//! # Invariants
//! - Never touches product or category state.
//! - Failures are returned as `RecipeError`, never panics.

mod gemini;

pub use gemini::{GeminiConfig, GeminiRecipeClient, DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL};

use crate::model::collection::Collection;
use crate::sync::sequencer::RequestSequencer;
use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// Default bound for one suggestion round trip.
pub const DEFAULT_RECIPE_TIMEOUT: Duration = Duration::from_secs(30);

/// One cited web source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub title: Option<String>,
    pub uri: Option<String>,
}

/// Model answer with its citations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Suggestion {
    /// Plain answer text; empty when the model returned none.
    pub text: String,
    pub sources: Vec<Source>,
}

#[derive(Debug)]
pub enum RecipeError {
    EmptyQuery,
    MissingCredentials,
    Timeout(Duration),
    Transport(reqwest::Error),
    Status { code: u16, message: String },
    InvalidResponse(String),
}

impl Display for RecipeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyQuery => write!(f, "recipe query is empty"),
            Self::MissingCredentials => write!(f, "recipe service API key is not configured"),
            Self::Timeout(after) => {
                write!(f, "recipe service timed out after {}s", after.as_secs())
            }
            Self::Transport(err) => write!(f, "recipe service request failed: {err}"),
            Self::Status { code, message } => {
                write!(f, "recipe service answered with HTTP {code}: {message}")
            }
            Self::InvalidResponse(message) => {
                write!(f, "recipe service response is invalid: {message}")
            }
        }
    }
}

impl Error for RecipeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Generative-text backend with web search grounding.
#[async_trait]
pub trait RecipeClient: Send + Sync {
    async fn suggest(
        &self,
        query: &str,
        stocked_names: &[String],
    ) -> Result<Suggestion, RecipeError>;
}

/// Prompt sent to the model.
pub fn build_prompt(query: &str, stocked_names: &[String]) -> String {
    format!(
        "What can I cook with {query}? Suggest simple recipes based on these ingredients: {}",
        stocked_names.join(", ")
    )
}

/// Runs suggestions for a collection and drops superseded answers.
pub struct RecipeAdvisor {
    client: Arc<dyn RecipeClient>,
    requests: RequestSequencer,
}

impl RecipeAdvisor {
    pub fn new(client: Arc<dyn RecipeClient>) -> Self {
        Self {
            client,
            requests: RequestSequencer::new(),
        }
    }

    /// Asks for recipes using every `stocked` product of `collection`.
    ///
    /// Returns `Ok(None)` when a newer suggestion finished first.
    pub async fn suggest_for(
        &self,
        collection: &Collection,
        query: &str,
    ) -> Result<Option<Suggestion>, RecipeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RecipeError::EmptyQuery);
        }
        let stocked: Vec<String> = collection
            .stocked_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let ticket = self.requests.begin();
        let suggestion = self.client.suggest(query, &stocked).await?;
        if !self.requests.complete(ticket) {
            info!(
                "event=recipe_suggest module=recipe status=stale ticket={}",
                ticket.value()
            );
            return Ok(None);
        }
        Ok(Some(suggestion))
    }
}

#[cfg(test)]
mod tests {
    use super::build_prompt;

    #[test]
    fn prompt_lists_ingredients_in_order() {
        let prompt = build_prompt("cestoviny", &["Vajíčka".to_string(), "Jablká".to_string()]);
        assert_eq!(
            prompt,
            "What can I cook with cestoviny? Suggest simple recipes based on these ingredients: Vajíčka, Jablká"
        );
    }

    #[test]
    fn prompt_without_stock_still_contains_query() {
        let prompt = build_prompt("polievka", &[]);
        assert!(prompt.starts_with("What can I cook with polievka?"));
        assert!(prompt.ends_with("ingredients: "));
    }
}
