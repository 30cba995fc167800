//! alfabeto-client: HTTP access to the alfabeto game API.
//!
//! Implements `ExerciseProvider` and `ScoreSink` over HTTP, the login and
//! registration calls used to obtain a bearer token, configuration loading,
//! and an in-memory API for tests and demos.

pub mod config;
pub mod error;
pub mod http;
pub mod mock;

pub use config::{create_client, load_config, AlfabetoConfig, ApiSettings, GameSettings};
pub use error::ApiError;
pub use http::HttpApiClient;
pub use mock::InMemoryApi;
