//! Exercises the question service client against a local wiremock server.

use question_client::types::AnswerRecord;
use question_client::{ClientError, Config, client_with_config};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> question_client::Client {
    let config = Config::builder()
        .with_base_url(&server.uri())
        .with_timeout(Duration::from_secs(2))
        .build();
    client_with_config(config).expect("client should build")
}

#[tokio::test]
async fn test_fetches_next_question() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/next-question"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "question": "Как вас зовут?" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let question = client_for(&server).fetch_next_question().await.unwrap();

    assert_eq!(question, "Как вас зовут?");
}

#[tokio::test]
async fn test_submit_answer_posts_json_and_returns_next_question() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .and(body_json(serde_json::json!({ "answer": "Иван" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "question": "Сколько вам лет?" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let next = client_for(&server).submit_answer("Иван").await.unwrap();

    assert_eq!(next.as_deref(), Some("Сколько вам лет?"));
}

#[tokio::test]
async fn test_empty_question_after_answer_means_finished() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "question": "" })))
        .mount(&server)
        .await;

    let next = client_for(&server).submit_answer("последний ответ").await.unwrap();

    assert_eq!(next, None);
}

#[tokio::test]
async fn test_lists_answers_in_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/answers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": 1, "qIndex": 0, "question": "Как вас зовут?", "answer": "Иван" },
            { "id": 2, "qIndex": 1, "question": "Откуда вы?", "answer": "Минск" }
        ])))
        .mount(&server)
        .await;

    let records = client_for(&server).list_answers().await.unwrap();

    assert_eq!(
        records,
        vec![
            AnswerRecord::new(1, 0, "Как вас зовут?", "Иван"),
            AnswerRecord::new(2, 1, "Откуда вы?", "Минск"),
        ]
    );
}

#[tokio::test]
async fn test_reset_reports_server_status() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/answers"))
        .respond_with(ResponseTemplate::new(204))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/answers"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);

    assert!(client.reset().await.unwrap());
    assert!(!client.reset().await.unwrap());
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/next-question"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).fetch_next_question().await.unwrap_err();

    assert!(matches!(err, ClientError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server).submit_answer("Иван").await.unwrap_err();

    assert!(matches!(err, ClientError::Status { status: 503, .. }), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_server_is_a_transport_error() {
    let uri = closed_port_uri();
    let config = Config::builder()
        .with_base_url(&uri)
        .with_timeout(Duration::from_millis(500))
        .build();

    let err = client_with_config(config)
        .unwrap()
        .fetch_next_question()
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Transport { .. }), "got {err:?}");
}

// A dropped `MockServer` goes back to wiremock's pool and keeps answering, so
// reserve a port with a plain listener and release it instead.
fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
