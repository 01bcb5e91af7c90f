use crate::types::{AnswerRecord, AnswerRequest, QuestionResponse};
use serde::de::DeserializeOwned;

pub(crate) mod config;
pub(crate) mod consts;
pub(crate) mod error;

use error::ClientError;

// Holds the HTTP connection pool and the resolved configuration.
// Every call is single-shot: no retries happen at this layer.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: config::Config,
}

impl Client {
    fn new(config: config::Config) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &config::Config {
        &self.config
    }

    /// `GET /next-question`.
    pub async fn fetch_next_question(&self) -> Result<String, ClientError> {
        let url = self.config.url(consts::NEXT_QUESTION_PATH);
        tracing::debug!("fetching next question from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let body: QuestionResponse = read_json(&url, response).await?;
        Ok(body.question().to_string())
    }

    /// `POST /answer`. Returns `None` when the server has no further question.
    pub async fn submit_answer(&self, answer: &str) -> Result<Option<String>, ClientError> {
        let url = self.config.url(consts::ANSWER_PATH);
        tracing::debug!("submitting answer ({} chars) to {}", answer.chars().count(), url);

        let response = self
            .http
            .post(&url)
            .json(&AnswerRequest::new(answer))
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let body: QuestionResponse = read_json(&url, response).await?;
        Ok(body.into_next())
    }

    /// `GET /answers`, in server order.
    pub async fn list_answers(&self) -> Result<Vec<AnswerRecord>, ClientError> {
        let url = self.config.url(consts::ANSWERS_PATH);
        tracing::debug!("listing answers from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        read_json(&url, response).await
    }

    /// `DELETE /answers`. A non-success status is reported as `Ok(false)`.
    pub async fn reset(&self) -> Result<bool, ClientError> {
        let url = self.config.url(consts::ANSWERS_PATH);
        tracing::debug!("resetting session at {}", url);

        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|source| transport(&url, source))?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("reset rejected by server: {}", status);
        }
        Ok(status.is_success())
    }
}

fn transport(url: &str, source: reqwest::Error) -> ClientError {
    ClientError::Transport {
        url: url.to_string(),
        source,
    }
}

// Reads the full body first so that a malformed payload is reported as a
// decode failure rather than a transport one.
async fn read_json<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let text = response
        .text()
        .await
        .map_err(|source| transport(url, source))?;
    serde_json::from_str::<T>(&text).map_err(|e| {
        tracing::error!("failed to deserialize response: {}, text=> {:?}", e, text);
        ClientError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        }
    })
}

// Public function to create a client with a specific config.
pub fn client_with_config(config: config::Config) -> Result<Client, ClientError> {
    Client::new(config)
}

// Public function to create a client with default settings.
pub fn client() -> Result<Client, ClientError> {
    client_with_config(config::Config::new())
}
