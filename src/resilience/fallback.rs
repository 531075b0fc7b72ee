//! Degraded responses served when the backend is unavailable.
//!
//! A fallback renders static text. It never calls the protected operation
//! and is never seen by retry or circuit accounting.

/// Produces a substitute response.
pub trait Fallback: Send + Sync {
    fn render(&self) -> String;
}

impl<F> Fallback for F
where
    F: Fn() -> String + Send + Sync,
{
    fn render(&self) -> String {
        self()
    }
}

/// Canned response per operation domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainFallback {
    /// Apology for freeform chat.
    Chat,
    /// Generic four-step recipe.
    Recipe,
    /// Five-day itinerary skeleton for `destination`.
    Itinerary { destination: String },
}

impl DomainFallback {
    pub fn itinerary(destination: impl Into<String>) -> Self {
        DomainFallback::Itinerary {
            destination: destination.into(),
        }
    }
}

impl Fallback for DomainFallback {
    fn render(&self) -> String {
        match self {
            DomainFallback::Chat => {
                "I'm currently experiencing high demand. Please try again in a moment.".to_string()
            }
            DomainFallback::Recipe => concat!(
                "Simple Recipe:\n\n",
                "1. Heat oil in a pan\n",
                "2. Add your ingredients and stir-fry\n",
                "3. Season to taste\n",
                "4. Serve hot\n\n",
                "For a detailed AI-generated recipe, please try again later."
            )
            .to_string(),
            DomainFallback::Itinerary { destination } => format!(
                "Quick guide for {destination}:\n\
                 Day 1: Arrival and explore main attractions\n\
                 Day 2: Cultural sites and local experiences\n\
                 Day 3: Nature and outdoor activities\n\
                 Day 4: Shopping and relaxation\n\
                 Day 5: Departure\n\n\
                 Please try again later for a detailed AI-generated itinerary."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn itinerary_names_destination() {
        let text = DomainFallback::itinerary("Lisbon").render();
        assert!(text.starts_with("Quick guide for Lisbon:\nDay 1:"));
        assert!(text.contains("Day 5: Departure"));
    }

    #[test]
    fn recipe_has_four_steps() {
        let text = DomainFallback::Recipe.render();
        assert!(text.starts_with("Simple Recipe:\n\n1. Heat oil"));
        assert!(text.contains("4. Serve hot"));
    }

    #[test]
    fn closures_are_fallbacks() {
        let fallback = || "canned".to_string();
        assert_eq!(Fallback::render(&fallback), "canned");
    }
}
