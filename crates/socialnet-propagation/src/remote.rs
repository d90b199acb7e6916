//! HTTP existence checks against another service's host.

use async_trait::async_trait;
use socialnet_core::existence::{ExistenceCheckError, ExistenceChecker};

/// Calls `GET {base_url}/{id}/exists`, which answers with a JSON boolean.
#[derive(Debug, Clone)]
pub struct HttpExistenceChecker {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExistenceChecker {
    /// A checker for the collection at `base_url`, such as
    /// `http://users:3000/api/v1/users`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Same as [`HttpExistenceChecker::new`] with a preconfigured client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, id: i64) -> String {
        format!("{}/{id}/exists", self.base_url)
    }
}

#[async_trait]
impl ExistenceChecker for HttpExistenceChecker {
    async fn exists(&self, id: i64) -> Result<bool, ExistenceCheckError> {
        let response = self
            .client
            .get(self.url(id))
            .send()
            .await
            .map_err(|err| ExistenceCheckError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExistenceCheckError::UnexpectedResponse(format!(
                "status {status}"
            )));
        }

        response
            .json::<bool>()
            .await
            .map_err(|err| ExistenceCheckError::UnexpectedResponse(err.to_string()))
    }
}
