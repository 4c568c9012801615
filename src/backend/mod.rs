//! The narrow seam between the load engine and the query backend.
//!
//! The engine only ever sees [`QueryBackend`]: pick a template, hand over the
//! row's positional parameters, get back success or a classified failure.
//! Connection establishment, credentials and the wire format all live behind
//! this trait.
mod http;
mod templates;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::BackendError;

pub use http::HttpQueryBackend;
pub use templates::{QueryTemplate, TemplateChooser, UniformChooser, default_templates};

/// Settings needed to construct one backend client handle.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub max_threads: Option<u32>,
    pub request_timeout: Duration,
}

#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Execute one templated query with positional parameters bound in order.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] carrying a stable outcome signature for any
    /// binding, transport, timeout or status failure.
    async fn execute(&self, template: &QueryTemplate, params: &[String])
    -> Result<(), BackendError>;
}
