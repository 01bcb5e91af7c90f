pub const QUESTION_SERVICE_URL: &str = "QUESTION_SERVICE_URL";

pub const BASE_URL: &str = "http://127.0.0.1:4000";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const NEXT_QUESTION_PATH: &str = "/next-question";
pub const ANSWER_PATH: &str = "/answer";
pub const ANSWERS_PATH: &str = "/answers";
