//! # webgym-env
//!
//! Reduced-DOM web environment for RL agents. A live page is collapsed into a
//! compact observation in which every interactive element carries a unique,
//! human-legible semantic identifier; agent actions reference those
//! identifiers and are resolved back onto the live DOM.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use webgym_env::{EnvConfig, WebEnv};
//!
//! # #[tokio::main]
//! # async fn main() -> webgym_env::Result<()> {
//! let mut env = WebEnv::launch(EnvConfig::default()).await?;
//!
//! let obs = env.goto("https://example.com").await?;
//! println!("{}", obs.html);
//!
//! // Act by semantic identifier, observe again
//! let obs = env.step(r#"{"action": "click", "target": "more_information"}"#).await?;
//! if let Some(err) = obs.error {
//!     eprintln!("action failed: {err}");
//! }
//!
//! env.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod config;
pub mod env;
pub mod observe;
pub mod parser;

pub use action::Action;
pub use config::{BrowserSettings, EnvConfig, Timeouts};
pub use env::WebEnv;
pub use observe::{Observation, TabRecord};
pub use parser::{
    reduce_document, IdRegistry, InputRecord, OutputNode, PageContent, ReducedPage, SelectRecord,
    SourceNode, Stamp,
};

// Re-export eoka types callers need for custom setups.
pub use eoka::{Browser, Page, StealthConfig};

/// Result type for webgym-env operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while observing or acting on a page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("malformed action: {0}")]
    Action(String),

    #[error("identifier resolution failed: {0}")]
    Resolve(String),

    #[error("snapshot capture failed: {0}")]
    Capture(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
