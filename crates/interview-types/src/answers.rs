/// One stored answer, as returned by `GET /answers`.
///
/// Records are owned by the remote service; clients only read the whole list
/// or reset it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnswerRecord {
    id: i64,
    #[serde(rename = "qIndex")]
    q_index: i64,
    question: String,
    answer: String,
}

impl AnswerRecord {
    pub fn new(id: i64, q_index: i64, question: &str, answer: &str) -> Self {
        Self {
            id,
            q_index,
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn q_index(&self) -> i64 {
        self.q_index
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_answer_list_keeps_order() {
        let json = r#"[
            {"id": 7, "qIndex": 0, "question": "Как вас зовут?", "answer": "Иван"},
            {"id": 8, "qIndex": 1, "question": "Сколько вам лет?", "answer": "тридцать"}
        ]"#;

        let records: Vec<AnswerRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], AnswerRecord::new(7, 0, "Как вас зовут?", "Иван"));
        assert_eq!(records[1].q_index(), 1);
        assert_eq!(records[1].answer(), "тридцать");
    }
}
