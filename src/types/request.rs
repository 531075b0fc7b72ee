//! Domain requests, normalisation, and cache keys.
//!
//! Each request type owns three pieces of domain knowledge:
//!
//! - `normalize()`: trim / case-fold inputs and reject malformed ones with
//!   [`HuginnError::InvalidInput`] before they reach admission control
//! - `cache_key()`: deterministic composite of the normalised inputs
//! - `prompt()`: the text sent to the backend
//!
//! Keys are built from *normalised* values, so `" Chicken "` and `"Chicken"`
//! share a cache entry while `cuisine = "Asian"` and `"asian"` do too.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{HuginnError, Result};

/// Default cuisine when the caller does not specify one.
pub const DEFAULT_CUISINE: &str = "any";

/// Default travel interests when the caller does not specify any.
pub const DEFAULT_INTERESTS: &str = "general sightseeing";

/// Default travel budget when the caller does not specify one.
pub const DEFAULT_BUDGET: &str = "moderate";

/// Operation domain.
///
/// Partitions rate limiting (the domain name is the limiter subject) and
/// selects the circuit breaker and fallback used for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Chat,
    Recipe,
    Travel,
}

impl Domain {
    /// All domains, in a stable order.
    pub const ALL: [Domain; 3] = [Domain::Chat, Domain::Recipe, Domain::Travel];

    /// Subject string used for rate limiting and labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Chat => "chat",
            Domain::Recipe => "recipe",
            Domain::Travel => "travel",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key: `_`-joined normalised request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Join parts with `_`. Empty parts are kept, so a blank trailing field
    /// still yields a trailing separator (`"chicken, rice_asian_"`).
    pub fn from_parts(parts: &[&str]) -> Self {
        Self(parts.join("_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(HuginnError::InvalidInput(format!("{field} must not be blank")));
    }
    Ok(())
}

// ============================================================================
// Chat
// ============================================================================

/// Freeform chat prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    pub fn normalize(self) -> Result<Self> {
        require(&self.prompt, "prompt")?;
        Ok(Self {
            prompt: self.prompt.trim().to_string(),
        })
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from(self.prompt.as_str())
    }

    pub fn prompt(&self) -> String {
        self.prompt.clone()
    }
}

/// Chat prompt sent with explicit completion options.
///
/// `model = None` resolves to the orchestrator's default model before the
/// cache key is computed, so explicit and implicit defaults share entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOptionsRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatOptionsRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Normalise, substituting `default_model` when no usable model is named.
    pub fn normalize(self, default_model: &str) -> Result<Self> {
        require(&self.prompt, "prompt")?;
        let model = self
            .model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_model.to_string());
        Ok(Self {
            prompt: self.prompt.trim().to_string(),
            model: Some(model),
        })
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from_parts(&[&self.prompt, self.model.as_deref().unwrap_or_default()])
    }

    pub fn prompt(&self) -> String {
        self.prompt.clone()
    }
}

// ============================================================================
// Recipe
// ============================================================================

/// Recipe generation from a list of ingredients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRequest {
    pub ingredients: String,
    #[serde(default = "default_cuisine")]
    pub cuisine: String,
    #[serde(default)]
    pub dietary_restrictions: String,
}

fn default_cuisine() -> String {
    DEFAULT_CUISINE.to_string()
}

impl RecipeRequest {
    pub fn new(ingredients: impl Into<String>) -> Self {
        Self {
            ingredients: ingredients.into(),
            cuisine: default_cuisine(),
            dietary_restrictions: String::new(),
        }
    }

    pub fn cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = cuisine.into();
        self
    }

    pub fn dietary_restrictions(mut self, restrictions: impl Into<String>) -> Self {
        self.dietary_restrictions = restrictions.into();
        self
    }

    pub fn normalize(self) -> Result<Self> {
        require(&self.ingredients, "ingredients")?;
        Ok(Self {
            ingredients: self.ingredients.trim().to_string(),
            cuisine: self.cuisine.trim().to_lowercase(),
            dietary_restrictions: self.dietary_restrictions.trim().to_string(),
        })
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from_parts(&[
            &self.ingredients,
            &self.cuisine,
            &self.dietary_restrictions,
        ])
    }

    pub fn prompt(&self) -> String {
        let cuisine = if self.cuisine.is_empty() {
            DEFAULT_CUISINE
        } else {
            &self.cuisine
        };
        let restrictions = if self.dietary_restrictions.is_empty() {
            "none"
        } else {
            &self.dietary_restrictions
        };
        format!(
            "I want to create a recipe using the following ingredients: {ingredients}.\n\
             The cuisine type I prefer is {cuisine}.\n\
             Please consider the following dietary restrictions: {restrictions}.\n\
             Please provide me with a detailed recipe including title, list of ingredients, \
             and cooking instructions.",
            ingredients = self.ingredients,
        )
    }
}

// ============================================================================
// Travel
// ============================================================================

/// Day-by-day travel itinerary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelRequest {
    pub destination: String,
    pub days: u32,
    #[serde(default = "default_interests")]
    pub interests: String,
    #[serde(default = "default_budget")]
    pub budget: String,
}

fn default_interests() -> String {
    DEFAULT_INTERESTS.to_string()
}

fn default_budget() -> String {
    DEFAULT_BUDGET.to_string()
}

impl TravelRequest {
    pub fn new(destination: impl Into<String>, days: u32) -> Self {
        Self {
            destination: destination.into(),
            days,
            interests: default_interests(),
            budget: default_budget(),
        }
    }

    pub fn interests(mut self, interests: impl Into<String>) -> Self {
        self.interests = interests.into();
        self
    }

    pub fn budget(mut self, budget: impl Into<String>) -> Self {
        self.budget = budget.into();
        self
    }

    pub fn normalize(self) -> Result<Self> {
        require(&self.destination, "destination")?;
        if self.days < 1 {
            return Err(HuginnError::InvalidInput(
                "days must be at least 1".to_string(),
            ));
        }
        let interests = match self.interests.trim() {
            "" => default_interests(),
            s => s.to_string(),
        };
        let budget = match self.budget.trim() {
            "" => default_budget(),
            s => s.to_lowercase(),
        };
        Ok(Self {
            destination: self.destination.trim().to_string(),
            days: self.days,
            interests,
            budget,
        })
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::from_parts(&[
            &self.destination,
            &self.days.to_string(),
            &self.interests,
            &self.budget,
        ])
    }

    pub fn prompt(&self) -> String {
        format!(
            "You are an expert travel consultant. Create a detailed, day-by-day travel itinerary.\n\
             \n\
             Destination: {destination}\n\
             Number of days: {days}\n\
             Interests: {interests}\n\
             Budget: {budget}\n\
             \n\
             The itinerary should include:\n\
             - Daily activities (morning, afternoon, evening)\n\
             - Recommended local restaurants or food experiences\n\
             - Cultural tips and hidden gems\n\
             - Practical advice (transport, dress code, etc.)\n\
             \n\
             Write in a friendly, enthusiastic tone.\n",
            destination = self.destination,
            days = self.days,
            interests = self.interests,
            budget = self.budget,
        )
    }
}
