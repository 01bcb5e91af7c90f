/// Body of `GET /next-question` and `POST /answer` responses.
///
/// An empty `question` from `POST /answer` means the interview is over.
/// The server may omit the field entirely; that reads as empty too.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuestionResponse {
    #[serde(default)]
    question: String,
}

impl QuestionResponse {
    pub fn new(question: &str) -> Self {
        Self {
            question: question.to_string(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    /// Returns the question, or `None` when the server signalled completion.
    pub fn into_next(self) -> Option<String> {
        if self.question.trim().is_empty() {
            None
        } else {
            Some(self.question)
        }
    }
}

/// Body of `POST /answer`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnswerRequest {
    answer: String,
}

impl AnswerRequest {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
        }
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }
}
