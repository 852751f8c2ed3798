//! End-to-end router tests: validation envelopes, prompt grounding, the
//! streaming wire contract, and the relay-to-decoder round trip.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;
use zhiyuan_client::StreamDecoder;
use zhiyuan_context::{ContextAssembler, PromptBudget};
use zhiyuan_core::completion::{CompletionClient, FragmentReceiver};
use zhiyuan_core::error::UpstreamError;
use zhiyuan_core::stream::StreamEvent;
use zhiyuan_gateway::{AppState, app};
use zhiyuan_knowledge::KnowledgeStore;

const MANIFEST: &str = r#"{
    "version": "1.0",
    "name": "测试知识库",
    "description": "fixture corpus",
    "lastUpdated": "2025-01-01",
    "sections": [
        {"id": "policy", "name": "政策", "file": "policy.json", "description": "政策"},
        {"id": "majors", "name": "专业", "file": "majors.json", "description": "专业"}
    ]
}"#;

/// Scripted completion backend: records every prompt it receives and plays
/// back a fixed reply or fragment sequence.
struct MockCompletion {
    reply: String,
    fragments: Vec<Result<String, UpstreamError>>,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletion {
    fn new(reply: &str, fragments: Vec<Result<String, UpstreamError>>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            fragments,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn seen_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    async fn stream(&self, prompt: &str) -> Result<FragmentReceiver, UpstreamError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let (tx, rx) = tokio::sync::mpsc::channel(16);
        let fragments = self.fragments.clone();
        tokio::spawn(async move {
            for item in fragments {
                if tx.send(item).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}

fn fixture_corpus() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("knowledgebase.json"), MANIFEST).unwrap();
    std::fs::write(
        dir.path().join("policy.json"),
        r#"{"provinces": {"北京": {
            "name": "北京",
            "报名时间": "2024年11月1日-10日",
            "考试时间": "2025年6月7日-8日",
            "科目": ["语文", "数学", "外语"],
            "特殊要求": "需要具有北京市户籍或学籍"
        }}}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("majors.json"),
        r#"{"categories": [{"name": "工学", "majors": ["计算机科学与技术"]}]}"#,
    )
    .unwrap();
    dir
}

fn test_app(dir: &tempfile::TempDir, completion: Arc<MockCompletion>) -> Router {
    let store = Arc::new(KnowledgeStore::open(dir.path(), "knowledgebase.json").unwrap());
    let assembler = ContextAssembler::new(store.clone(), PromptBudget::default());
    app(AppState::new(store, assembler, completion))
}

async fn post_json(router: Router, uri: &str, body: serde_json::Value) -> (StatusCode, Vec<u8>) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn get_uri(router: Router, uri: &str) -> serde_json::Value {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn chat_rejects_missing_question_before_upstream() {
    let dir = fixture_corpus();
    let completion = MockCompletion::new("answer", vec![]);
    let router = test_app(&dir, completion.clone());

    let (status, body) = post_json(router, "/api/v1/chat", serde_json::json!({})).await;
    let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope["code"], 400);
    assert!(envelope["message"].as_str().unwrap().contains("question"));
    // no retrieval result reached the upstream
    assert!(completion.seen_prompts().is_empty());
}

#[tokio::test]
async fn chat_returns_reply_envelope_with_grounded_prompt() {
    let dir = fixture_corpus();
    let completion = MockCompletion::new("北京的报名时间是11月1日至10日。", vec![]);
    let router = test_app(&dir, completion.clone());

    let (_, body) = post_json(
        router,
        "/api/v1/chat",
        serde_json::json!({"question": "北京的报名时间是什么", "province": "北京"}),
    )
    .await;
    let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(envelope["code"], 200);
    assert_eq!(envelope["message"], "操作成功");
    assert_eq!(envelope["data"]["reply"], "北京的报名时间是11月1日至10日。");

    // the trigger on "报名" forced the literal policy section into the
    // prompt the completion client received
    let prompts = completion.seen_prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("2024年11月1日-10日"));
    assert!(prompts[0].contains("当前用户问题：北京的报名时间是什么"));
}

#[tokio::test]
async fn stream_body_round_trips_through_decoder_at_any_split() {
    let dir = fixture_corpus();
    let completion = MockCompletion::new(
        "",
        vec![Ok("北京的".into()), Ok("报名时间".into()), Ok("是11月".into())],
    );
    let router = test_app(&dir, completion);

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/chat/stream")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({"question": "北京的报名时间是什么"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let wire = String::from_utf8(bytes.to_vec()).unwrap();

    let expected = vec![
        StreamEvent::Chunk {
            content: "北京的".into(),
        },
        StreamEvent::Chunk {
            content: "报名时间".into(),
        },
        StreamEvent::Chunk {
            content: "是11月".into(),
        },
        StreamEvent::End,
    ];

    // unsplit
    let mut decoder = StreamDecoder::new();
    assert_eq!(decoder.feed(&wire), expected);

    // split at every possible boundary into two deliveries
    for offset in 0..=wire.len() {
        if !wire.is_char_boundary(offset) {
            continue;
        }
        let mut decoder = StreamDecoder::new();
        let mut events = decoder.feed(&wire[..offset]);
        events.extend(decoder.feed(&wire));
        assert_eq!(events, expected, "split at byte {offset}");
    }
}

#[tokio::test]
async fn stream_failure_preserves_sent_fragments_then_signals_error() {
    let dir = fixture_corpus();
    let completion = MockCompletion::new(
        "",
        vec![
            Ok("f1".into()),
            Ok("f2".into()),
            Err(UpstreamError::StreamInterrupted("connection reset".into())),
        ],
    );
    let router = test_app(&dir, completion);

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/chat/stream")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({"question": "报名"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let wire = String::from_utf8(bytes.to_vec()).unwrap();

    let mut decoder = StreamDecoder::new();
    let events = decoder.feed(&wire);
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        StreamEvent::Chunk {
            content: "f1".into()
        }
    );
    assert_eq!(
        events[1],
        StreamEvent::Chunk {
            content: "f2".into()
        }
    );
    assert!(matches!(events[2], StreamEvent::Error { .. }));
    // failure: no end record and no sentinel in the raw wire
    assert!(!wire.contains(r#"{"type":"end"}"#));
    assert!(!wire.contains("[DONE]"));
}

#[tokio::test]
async fn stream_rejects_missing_question_with_envelope() {
    let dir = fixture_corpus();
    let completion = MockCompletion::new("", vec![]);
    let router = test_app(&dir, completion.clone());

    let (_, body) = post_json(router, "/api/v1/chat/stream", serde_json::json!({})).await;
    let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(envelope["code"], 400);
    assert!(completion.seen_prompts().is_empty());
}

#[tokio::test]
async fn knowledge_endpoint_serves_sections() {
    let dir = fixture_corpus();
    let router = test_app(&dir, MockCompletion::new("", vec![]));

    let envelope = get_uri(router.clone(), "/api/v1/knowledge?type=policy").await;
    assert_eq!(envelope["code"], 200);
    assert!(envelope["data"]["provinces"]["北京"].is_object());

    let envelope = get_uri(router.clone(), "/api/v1/knowledge?type=nonsense").await;
    assert_eq!(envelope["code"], 400);

    let envelope = get_uri(router, "/api/v1/knowledge?type=all").await;
    assert_eq!(envelope["code"], 200);
    assert!(envelope["data"]["policy"].is_object());
    assert!(envelope["data"]["majors"].is_object());
}

#[tokio::test]
async fn knowledge_search_endpoint_caps_results() {
    let dir = fixture_corpus();
    let router = test_app(&dir, MockCompletion::new("", vec![]));

    let (_, body) = post_json(
        router,
        "/api/v1/knowledge/search",
        serde_json::json!({"query": "北京", "maxResults": 1}),
    )
    .await;
    let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(envelope["code"], 200);
    assert_eq!(envelope["data"]["count"], 1);
    assert_eq!(envelope["data"]["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn consult_endpoint_returns_plan() {
    let dir = fixture_corpus();
    let router = test_app(&dir, MockCompletion::new("", vec![]));

    let (_, body) = post_json(
        router.clone(),
        "/api/v1/gaokao/consult",
        serde_json::json!({
            "province": "北京",
            "userInfo": {"province": "北京"},
            "interests": ["理工"]
        }),
    )
    .await;
    let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(envelope["code"], 200);
    let plan = envelope["data"]["plan"].as_str().unwrap();
    assert!(plan.contains("《北京高考个性化报名方案表》"));
    assert!(plan.contains("2024年11月1日-10日"));

    let (_, body) = post_json(router, "/api/v1/gaokao/consult", serde_json::json!({})).await;
    let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(envelope["code"], 400);
}
