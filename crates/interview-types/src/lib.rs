//! Wire types of the remote question service.
pub mod answers;
pub mod question;

//re-export types for easier access
pub use answers::AnswerRecord;
pub use question::{AnswerRequest, QuestionResponse};
