use httpmock::prelude::*;
use oc_advisor::config::toml_config::RemoteConfig;
use oc_advisor::domain::ports::Advisor;
use oc_advisor::{AdvisorConfig, AdvisorError, AdvisorMode, DiagnosisPipeline, DiagnosisService, RemoteAdvisor};
use serde_json::json;
use std::sync::Arc;

const REPORT: &str = "Serial number: SN-0042-PRIVATE\nCPU: AMD Ryzen 7 5800X\nMotherboard: X570\nMemory: DDR4\nGPU: NVIDIA RTX 3070";

fn remote_config(server: &MockServer) -> RemoteConfig {
    RemoteConfig {
        endpoint: server.url("/v1/chat/completions"),
        api_key: "test-key".to_string(),
        model: "mistral-small".to_string(),
        timeout_seconds: Some(5),
        max_rate_limit_retries: Some(1),
        default_retry_after_seconds: Some(0),
        max_retry_after_seconds: Some(1),
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

fn advisor_for(server: &MockServer) -> (RemoteAdvisor, DiagnosisPipeline) {
    let pipeline = DiagnosisPipeline::new(Arc::new(AdvisorConfig::builtin().unwrap()));
    let advisor = RemoteAdvisor::new(remote_config(server), pipeline.price_table().clone()).unwrap();
    (advisor, pipeline)
}

fn remote_service(server: &MockServer, fallback_to_rules: bool) -> DiagnosisService {
    let mut config = AdvisorConfig::builtin().unwrap();
    config.service.mode = AdvisorMode::Remote;
    config.service.fallback_to_rules = fallback_to_rules;
    config.remote = Some(remote_config(server));
    DiagnosisService::new(Arc::new(config)).unwrap()
}

#[tokio::test]
async fn test_remote_advisor_sends_profile_with_bearer_auth() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer test-key")
            .body_contains("mistral-small")
            .body_contains("Motherboard chipset: X570")
            .body_contains("AMD Ryzen 7 5800X");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(completion("  You can overclock:\n- CPU\n\nMatching service: CPU for 20€\n"));
    });

    let (advisor, pipeline) = advisor_for(&server);
    let profile = pipeline.extract(REPORT);
    let answer = advisor.advise(&profile).await.unwrap();

    api_mock.assert();
    assert_eq!(answer, "You can overclock:\n- CPU\n\nMatching service: CPU for 20€");
    assert_eq!(advisor.name(), "remote");
}

#[tokio::test]
async fn test_raw_report_text_never_sent() {
    let server = MockServer::start();
    let leaked = server.mock(|when, then| {
        when.method(POST).body_contains("SN-0042-PRIVATE");
        then.status(200).json_body(completion("leaked"));
    });
    let clean = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(completion("clean"));
    });

    let (advisor, pipeline) = advisor_for(&server);
    let answer = advisor.advise(&pipeline.extract(REPORT)).await.unwrap();

    assert_eq!(answer, "clean");
    leaked.assert_hits(0);
    clean.assert_hits(1);
}

#[tokio::test]
async fn test_rate_limit_retried_once_then_surfaced() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(429).header("Retry-After", "0").body("slow down");
    });

    let (advisor, pipeline) = advisor_for(&server);
    let err = advisor.advise(&pipeline.extract(REPORT)).await.unwrap_err();

    api_mock.assert_hits(2);
    match err {
        AdvisorError::UpstreamRateLimited { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("expected rate limit error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_not_retried() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(500).body("internal error");
    });

    let (advisor, pipeline) = advisor_for(&server);
    let err = advisor.advise(&pipeline.extract(REPORT)).await.unwrap_err();

    api_mock.assert_hits(1);
    match err {
        AdvisorError::UpstreamStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal error");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_completion_is_response_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(json!({"choices": []}));
    });

    let (advisor, pipeline) = advisor_for(&server);
    let err = advisor.advise(&pipeline.extract(REPORT)).await.unwrap_err();

    assert!(matches!(err, AdvisorError::UpstreamResponseError { .. }));
}

#[tokio::test]
async fn test_malformed_completion_is_serialization_error() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .header("Content-Type", "application/json")
            .body("<html>gateway page</html>");
    });

    let (advisor, pipeline) = advisor_for(&server);
    let err = advisor.advise(&pipeline.extract(REPORT)).await.unwrap_err();

    api_mock.assert_hits(1);
    assert!(matches!(err, AdvisorError::SerializationError(_)));
}

#[tokio::test]
async fn test_service_uses_remote_answer() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(completion("remote says hi"));
    });

    let service = remote_service(&server, false);
    let answer = service.handle_report(REPORT).await.unwrap();

    api_mock.assert();
    assert_eq!(answer, "remote says hi");
}

#[tokio::test]
async fn test_service_answers_laptop_without_calling_remote() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200).json_body(completion("should not be used"));
    });

    let service = remote_service(&server, false);
    let answer = service
        .handle_report(&format!("Notebook\n{}", REPORT))
        .await
        .unwrap();

    api_mock.assert_hits(0);
    assert_eq!(answer, "No overclocking service available for laptops.");
}

#[tokio::test]
async fn test_service_falls_back_to_rules_on_upstream_failure() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(503).body("unavailable");
    });

    let strict = remote_service(&server, false);
    let err = strict.handle_report(REPORT).await.unwrap_err();
    assert!(matches!(err, AdvisorError::UpstreamStatus { status: 503, .. }));

    let lenient = remote_service(&server, true);
    let answer = lenient.handle_report(REPORT).await.unwrap();
    assert_eq!(
        answer,
        "You can overclock:\n- CPU\n- RAM\n- GPU\n\nMatching service: CPU + RAM + GPU for 85€"
    );

    api_mock.assert_hits(2);
}
