//! huginn: command-line front end for the orchestrator
//!
//! Runs one request through the full pipeline against an Ollama backend
//! and prints the JSON response envelope.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use huginn::{
    ApiResponse, ChatOptionsRequest, ChatRequest, Config, Domain, Huginn, Orchestrator,
    RecipeRequest, TravelRequest,
};

/// Huginn CLI
#[derive(Parser)]
#[command(name = "huginn")]
#[command(version = huginn::PKG_VERSION)]
#[command(about = "Resilient orchestration for generative-text backends")]
struct Args {
    /// Config file (default: ~/.huginn/config.toml, then /etc/huginn/config.toml)
    #[arg(short, long, env = "HUGINN_CONFIG")]
    config: Option<PathBuf>,

    /// Override the backend base URL
    #[arg(long, env = "HUGINN_BACKEND_URL")]
    backend_url: Option<String>,

    /// Use the async entry point (bounded by the gateway timeout)
    #[arg(long = "async", global = true)]
    run_async: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Freeform chat
    Chat {
        /// Prompt (or omit to read from stdin)
        prompt: Option<String>,
    },

    /// Chat with an explicit model
    Options {
        /// Prompt (or omit to read from stdin)
        prompt: Option<String>,
        /// Model to use (default: configured backend model)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Generate a recipe
    Recipe {
        /// Comma-separated ingredients
        ingredients: String,
        #[arg(short, long, default_value = huginn::types::DEFAULT_CUISINE)]
        cuisine: String,
        #[arg(short, long, default_value = "")]
        dietary: String,
    },

    /// Generate a travel itinerary
    Travel {
        destination: String,
        #[arg(short, long, default_value_t = 3)]
        days: u32,
        #[arg(short, long, default_value = huginn::types::DEFAULT_INTERESTS)]
        interests: String,
        #[arg(short, long, default_value = huginn::types::DEFAULT_BUDGET)]
        budget: String,
    },
}

enum Request {
    Chat(ChatRequest),
    Options(ChatOptionsRequest),
    Recipe(RecipeRequest),
    Travel(TravelRequest),
}

impl Request {
    fn domain(&self) -> Domain {
        match self {
            Request::Chat(_) | Request::Options(_) => Domain::Chat,
            Request::Recipe(_) => Domain::Recipe,
            Request::Travel(_) => Domain::Travel,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(url) = args.backend_url {
        config.backend.base_url = url;
    }
    // one-shot process, nothing to flush
    config.cache.scheduled_eviction = false;

    let orchestrator = Arc::new(Huginn::builder().from_config(&config).build()?);

    let request = match args.command {
        Command::Chat { prompt } => Request::Chat(ChatRequest::new(resolve_text(prompt, "chat")?)),
        Command::Options { prompt, model } => {
            let mut request = ChatOptionsRequest::new(resolve_text(prompt, "options")?);
            if let Some(model) = model {
                request = request.model(model);
            }
            Request::Options(request)
        }
        Command::Recipe {
            ingredients,
            cuisine,
            dietary,
        } => Request::Recipe(
            RecipeRequest::new(ingredients)
                .cuisine(cuisine)
                .dietary_restrictions(dietary),
        ),
        Command::Travel {
            destination,
            days,
            interests,
            budget,
        } => Request::Travel(
            TravelRequest::new(destination, days)
                .interests(interests)
                .budget(budget),
        ),
    };

    let start = Instant::now();
    let response = if args.run_async {
        run_async(&orchestrator, request).await
    } else {
        run_sync(&orchestrator, request).await
    };
    let response = response.with_processing_time(start.elapsed());

    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.status_code() == 200 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn run_sync(orchestrator: &Orchestrator, request: Request) -> ApiResponse {
    let domain = request.domain();
    let result = match request {
        Request::Chat(r) => orchestrator.chat(r).await,
        Request::Options(r) => orchestrator.chat_with_options(r).await,
        Request::Recipe(r) => orchestrator.recipe(r).await,
        Request::Travel(r) => orchestrator.travel(r).await,
    };
    ApiResponse::from_result(domain, &result)
}

async fn run_async(orchestrator: &Arc<Orchestrator>, request: Request) -> ApiResponse {
    let domain = request.domain();
    let handle = match request {
        Request::Chat(r) => orchestrator.chat_async(r),
        Request::Options(r) => orchestrator.chat_with_options_async(r),
        Request::Recipe(r) => orchestrator.recipe_async(r),
        Request::Travel(r) => orchestrator.travel_async(r),
    };
    ApiResponse::from_result(domain, &handle.result().await)
}

/// Resolve text input from an optional CLI argument and/or stdin.
///
/// - arg only → arg
/// - stdin only → stdin
/// - both → `"{arg}\n\n{stdin}"`
/// - neither → error
fn resolve_text(arg: Option<String>, command: &str) -> Result<String, Box<dyn std::error::Error>> {
    let stdin_is_pipe = !io::stdin().is_terminal();
    let stdin_text = if stdin_is_pipe {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    } else {
        None
    };

    match (arg, stdin_text) {
        (Some(a), Some(s)) => Ok(format!("{a}\n\n{s}")),
        (Some(a), None) => Ok(a),
        (None, Some(s)) => Ok(s),
        (None, None) => {
            Err(format!("{command}: no input provided (pass text as argument or via stdin)").into())
        }
    }
}
