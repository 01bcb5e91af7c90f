use interview_core::error::ServiceError;
use interview_core::question_service::QuestionService;
use interview_service::question_adapter::HttpQuestionService;
use question_client::Config;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(server: &MockServer) -> HttpQuestionService {
    let config = Config::builder()
        .with_base_url(&server.uri())
        .with_timeout(Duration::from_secs(2))
        .build();
    HttpQuestionService::new(question_client::client_with_config(config).unwrap())
}

#[tokio::test]
async fn test_answer_round_trip_through_adapter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/answer"))
        .and(body_json(json!({ "answer": "Иван" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "question": "" })))
        .mount(&server)
        .await;

    let service = service_for(&server);

    assert_eq!(service.submit_answer("Иван").await, Ok(None));
}

#[tokio::test]
async fn test_server_errors_become_service_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/next-question"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/answers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let service = service_for(&server);

    assert_eq!(
        service.fetch_next_question().await,
        Err(ServiceError::Status(500))
    );
    assert!(matches!(
        service.list_answers().await,
        Err(ServiceError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_unreachable_service() {
    // A dropped `MockServer` returns to wiremock's pool and keeps listening,
    // so point the client at a port released by a plain listener.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config::builder()
        .with_base_url(&format!("http://{addr}"))
        .with_timeout(Duration::from_millis(500))
        .build();
    let service = HttpQuestionService::new(question_client::client_with_config(config).unwrap());

    assert!(matches!(
        service.reset_session().await,
        Err(ServiceError::Unreachable(_))
    ));
    assert!(matches!(
        service.fetch_next_question().await,
        Err(ServiceError::Unreachable(_))
    ));
}
