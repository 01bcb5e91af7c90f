use async_trait::async_trait;
use interview_core::error::ServiceError;
use interview_core::question_service::QuestionService;
use question_client::types::AnswerRecord;
use question_client::{Client, ClientError};

/// An adapter that implements the core `QuestionService` trait for the HTTP
/// `question_client::Client`.
pub struct HttpQuestionService {
    client: Client,
}

impl HttpQuestionService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuestionService for HttpQuestionService {
    async fn fetch_next_question(&self) -> Result<String, ServiceError> {
        self.client.fetch_next_question().await.map_err(service_error)
    }

    async fn submit_answer(&self, answer: &str) -> Result<Option<String>, ServiceError> {
        self.client.submit_answer(answer).await.map_err(service_error)
    }

    async fn list_answers(&self) -> Result<Vec<AnswerRecord>, ServiceError> {
        self.client.list_answers().await.map_err(service_error)
    }

    async fn reset_session(&self) -> Result<bool, ServiceError> {
        self.client.reset().await.map_err(service_error)
    }
}

/// Collapses client failures into the controller's error taxonomy.
pub fn service_error(error: ClientError) -> ServiceError {
    match error {
        ClientError::Transport { .. } | ClientError::Build(_) => {
            ServiceError::Unreachable(error.to_string())
        }
        ClientError::Status { status, .. } => ServiceError::Status(status),
        ClientError::Decode { reason, .. } => ServiceError::Malformed(reason),
    }
}
