use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::BackendError;

use super::{BackendConfig, QueryBackend, QueryTemplate};

/// Backend client driving a ClickHouse-style HTTP query interface: the bound
/// statement is POSTed as the request body, session settings travel as query
/// parameters.
pub struct HttpQueryBackend {
    client: Client,
    endpoint: Url,
    config: BackendConfig,
}

impl HttpQueryBackend {
    /// Build one client handle for a connection.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint URL is invalid or the underlying
    /// HTTP client cannot be constructed. Both are fatal setup failures.
    pub fn build(config: &BackendConfig) -> Result<Self, BackendError> {
        let endpoint = Url::parse(&config.url).map_err(|source| BackendError::InvalidEndpoint {
            url: config.url.clone(),
            source,
        })?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| BackendError::BuildClient { source })?;
        Ok(Self {
            client,
            endpoint,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl QueryBackend for HttpQueryBackend {
    async fn execute(
        &self,
        template: &QueryTemplate,
        params: &[String],
    ) -> Result<(), BackendError> {
        let statement = bind_positional(template, params)?;
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .query(&[("database", self.config.database.as_str())]);
        if let Some(threads) = self.config.max_threads {
            request = request.query(&[("max_threads", threads.to_string())]);
        }
        let response = request
            .basic_auth(&self.config.user, Some(&self.config.password))
            .body(statement)
            .send()
            .await
            .map_err(|err| classify_transport(err, &self.config))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
            });
        }
        // Drain the body so the pooled connection is reusable.
        drop(response.bytes().await);
        Ok(())
    }
}

fn classify_transport(err: reqwest::Error, config: &BackendConfig) -> BackendError {
    if err.is_timeout() {
        return BackendError::Timeout {
            timeout_ms: u64::try_from(config.request_timeout.as_millis()).unwrap_or(u64::MAX),
        };
    }
    match err.status() {
        Some(status) => BackendError::Status {
            status: status.as_u16(),
        },
        None => BackendError::Transport { source: err },
    }
}

/// Substitute each `?` with the next parameter as an escaped single-quoted
/// literal.
fn bind_positional(template: &QueryTemplate, params: &[String]) -> Result<String, BackendError> {
    let expected = template.placeholder_count();
    if params.len() < expected {
        return Err(BackendError::ParameterCount {
            template: template.name.clone(),
            expected,
            got: params.len(),
        });
    }
    let mut bound = String::with_capacity(template.query.len().saturating_add(32));
    let mut pieces = template.query.split('?');
    if let Some(first) = pieces.next() {
        bound.push_str(first);
    }
    let mut remaining = params.iter();
    for piece in pieces {
        let param = remaining.next().ok_or_else(|| BackendError::ParameterCount {
            template: template.name.clone(),
            expected,
            got: params.len(),
        })?;
        bound.push('\'');
        bound.push_str(&escape_literal(param));
        bound.push('\'');
        bound.push_str(piece);
    }
    Ok(bound)
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
