//! Public types for the Huginn API.

mod options;
mod request;
mod response;

pub use options::CompletionOptions;
pub use request::{
    CacheKey, ChatOptionsRequest, ChatRequest, DEFAULT_BUDGET, DEFAULT_CUISINE,
    DEFAULT_INTERESTS, Domain, RecipeRequest, TravelRequest,
};
pub use response::{
    ApiResponse, Completion, InvocationResult, REQUEST_TIMEOUT, TOO_MANY_REQUESTS,
};
