//! HttpGateway against a local mockito server.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use tensorzero_client::filter::{ComparisonOperator, FilterNode, ListInferencesRequest};
use tensorzero_client::types::{
    ContentBlockChunk, DatapointInsert, FeedbackRequest, InferenceChunk, ListDatapointsRequest,
};
use tensorzero_client::{
    Error, Gateway, HttpGateway, InferenceInput, InferenceRequest, InferenceResponse, Message,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const INFERENCE_ID: &str = "01968d0c-6e22-7d13-b8c2-9d1a0a6f0b11";
const EPISODE_ID: &str = "01968d0c-6e22-7d13-b8c2-9d1a0a6f0b12";

async fn setup() -> (ServerGuard, HttpGateway) {
    let server = Server::new_async().await;
    let gateway = HttpGateway::builder()
        .base_url(server.url())
        .stream_buffer(2)
        .build()
        .expect("gateway");
    (server, gateway)
}

fn request() -> InferenceRequest {
    InferenceRequest::builder(InferenceInput::new(vec![Message::user("Hello")]))
        .function_name("basic_test")
        .build()
}

fn chat_chunk(text: &str) -> String {
    json!({
        "inference_id": INFERENCE_ID,
        "episode_id": EPISODE_ID,
        "variant_name": "gpt",
        "content": [{"type": "text", "id": "0", "text": text}]
    })
    .to_string()
}

fn chunk_text(chunk: &InferenceChunk) -> String {
    match chunk {
        InferenceChunk::Chat(c) => c
            .content
            .iter()
            .filter_map(|b| match b {
                ContentBlockChunk::Text(t) => Some(t.text.clone()),
                _ => None,
            })
            .collect(),
        InferenceChunk::Json(j) => j.raw.clone(),
    }
}

#[tokio::test]
async fn inference_decodes_chat_response_with_unknown_block() {
    let (mut server, gateway) = setup().await;
    let mock = server
        .mock("POST", "/inference")
        .match_body(Matcher::PartialJson(json!({"function_name": "basic_test"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "inference_id": INFERENCE_ID,
                "episode_id": EPISODE_ID,
                "variant_name": "gpt",
                "content": [
                    {"type": "text", "text": "Hi there"},
                    {"type": "provider_extension", "blob": 1}
                ],
                "usage": {"input_tokens": 3, "output_tokens": 4},
                "finish_reason": "stop"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let response = gateway
        .inference(&request(), CancellationToken::new())
        .await
        .expect("inference");
    mock.assert_async().await;

    let chat = match response {
        InferenceResponse::Chat(chat) => chat,
        other => panic!("expected chat response, got {:?}", other),
    };
    assert_eq!(chat.inference_id, Uuid::parse_str(INFERENCE_ID).unwrap());
    assert_eq!(chat.content[0].as_text(), Some("Hi there"));
    assert!(chat.content[1].is_unknown());
    assert_eq!(chat.usage.total(), 7);
}

#[tokio::test]
async fn gateway_status_becomes_gateway_error() {
    let (mut server, gateway) = setup().await;
    let _mock = server
        .mock("POST", "/inference")
        .with_status(404)
        .with_body("Unknown function: basic_test")
        .create_async()
        .await;

    let err = gateway
        .inference(&request(), CancellationToken::new())
        .await
        .unwrap_err();
    match &err {
        Error::Gateway { status, message } => {
            assert_eq!(*status, 404);
            assert_eq!(message, "Unknown function: basic_test");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!err.is_retryable());
    assert_eq!(
        err.to_string(),
        "TensorZeroError (status code 404): Unknown function: basic_test"
    );
}

#[tokio::test]
async fn cancelled_call_returns_cancelled() {
    let (_server, gateway) = setup().await;
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = gateway.inference(&request(), cancel).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn stream_delivers_chunks_in_order_then_completes() {
    let (mut server, gateway) = setup().await;
    let body = format!(
        "data: {}\n\n: keep-alive\n\ndata: {}\n\ndata: {}\n\ndata: [DONE]\n\n",
        chat_chunk("Hel"),
        chat_chunk("lo"),
        chat_chunk("!")
    );
    let mock = server
        .mock("POST", "/inference")
        .match_header("accept", "text/event-stream")
        .match_body(Matcher::PartialJson(json!({"stream": true})))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let mut stream = gateway.inference_stream(&request(), CancellationToken::new());
    let mut text = String::new();
    while let Some(chunk) = stream.next_chunk().await {
        text.push_str(&chunk_text(&chunk));
    }
    assert_eq!(text, "Hello!");
    assert!(stream.error().await.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn slow_stream_outlives_request_timeout() {
    let mut server = Server::new_async().await;
    let gateway = HttpGateway::builder()
        .base_url(server.url())
        .timeout(Duration::from_secs(1))
        .build()
        .expect("gateway");
    let pieces: Vec<String> = ["a", "b", "c"].iter().map(|t| chat_chunk(t)).collect();
    let _mock = server
        .mock("POST", "/inference")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_chunked_body(move |w| {
            for piece in &pieces {
                write!(w, "data: {}\n\n", piece)?;
                w.flush()?;
                std::thread::sleep(Duration::from_millis(600));
            }
            write!(w, "data: [DONE]\n\n")
        })
        .create_async()
        .await;

    let mut stream = gateway.inference_stream(&request(), CancellationToken::new());
    let mut text = String::new();
    while let Some(chunk) = stream.next_chunk().await {
        text.push_str(&chunk_text(&chunk));
    }
    assert_eq!(text, "abc");
    assert!(stream.error().await.is_none());
}

#[tokio::test]
async fn slow_plain_response_hits_request_timeout() {
    let mut server = Server::new_async().await;
    let gateway = HttpGateway::builder()
        .base_url(server.url())
        .timeout(Duration::from_millis(300))
        .build()
        .expect("gateway");
    let _mock = server
        .mock("POST", "/inference")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(1500));
            w.write_all(b"{}")
        })
        .create_async()
        .await;

    let err = gateway
        .inference(&request(), CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test]
async fn stream_status_error_arrives_on_error_channel() {
    let (mut server, gateway) = setup().await;
    let _mock = server
        .mock("POST", "/inference")
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let mut stream = gateway.inference_stream(&request(), CancellationToken::new());
    assert!(stream.next_chunk().await.is_none());
    let err = stream.error().await.expect("error expected");
    assert_eq!(err.status(), Some(503));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn stream_stops_at_first_malformed_chunk() {
    let (mut server, gateway) = setup().await;
    let body = format!(
        "data: {}\n\ndata: {{not json\n\ndata: {}\n\n",
        chat_chunk("a"),
        chat_chunk("b")
    );
    let _mock = server
        .mock("POST", "/inference")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let mut stream = gateway.inference_stream(&request(), CancellationToken::new());
    let first = stream.next_chunk().await.expect("first chunk");
    assert_eq!(chunk_text(&first), "a");
    assert!(stream.next_chunk().await.is_none());
    assert!(matches!(
        stream.error().await,
        Some(Error::Serialization(_))
    ));
}

#[tokio::test]
async fn feedback_posts_metric() {
    let (mut server, gateway) = setup().await;
    let feedback_id = Uuid::new_v4();
    let inference_id = Uuid::parse_str(INFERENCE_ID).unwrap();
    let mock = server
        .mock("POST", "/feedback")
        .match_body(Matcher::PartialJson(json!({
            "metric_name": "thumbs_up",
            "value": true,
            "inference_id": INFERENCE_ID
        })))
        .with_status(200)
        .with_body(json!({"feedback_id": feedback_id}).to_string())
        .create_async()
        .await;

    let req = FeedbackRequest::builder("thumbs_up", true)
        .inference_id(inference_id)
        .build();
    let resp = gateway
        .feedback(&req, CancellationToken::new())
        .await
        .expect("feedback");
    assert_eq!(resp.feedback_id, feedback_id);
    mock.assert_async().await;
}

#[tokio::test]
async fn datapoint_endpoints_escape_dataset_name() {
    let (mut server, gateway) = setup().await;
    let ids = vec![Uuid::new_v4(), Uuid::new_v4()];

    let insert = server
        .mock("POST", "/datasets/my%20set/datapoints/bulk")
        .match_body(Matcher::Regex(r#""datapoints":\["#.to_string()))
        .with_status(200)
        .with_body(serde_json::to_string(&ids).unwrap())
        .create_async()
        .await;
    let inserts = vec![
        DatapointInsert::chat("basic_test", InferenceInput::new(vec![Message::user("a")])),
        DatapointInsert::json("extract", InferenceInput::new(vec![Message::user("b")])),
    ];
    let got = gateway
        .bulk_insert_datapoints("my set", &inserts, CancellationToken::new())
        .await
        .expect("bulk insert");
    assert_eq!(got, ids);
    insert.assert_async().await;

    let path = format!("/datasets/my%20set/datapoints/{}", ids[0]);
    let delete = server
        .mock("DELETE", path.as_str())
        .with_status(204)
        .create_async()
        .await;
    gateway
        .delete_datapoint("my set", ids[0], CancellationToken::new())
        .await
        .expect("delete");
    delete.assert_async().await;
}

#[tokio::test]
async fn list_datapoints_sends_query() {
    let (mut server, gateway) = setup().await;
    let mock = server
        .mock("GET", Matcher::Regex(r"^/datasets/golden/datapoints".to_string()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("function_name".into(), "basic_test".into()),
            Matcher::UrlEncoded("limit".into(), "5".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let req = ListDatapointsRequest::new("golden")
        .function_name("basic_test")
        .limit(5);
    let got = gateway
        .list_datapoints(&req, CancellationToken::new())
        .await
        .expect("list");
    assert!(got.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn list_inferences_posts_filter_tree() {
    let (mut server, gateway) = setup().await;
    let mock = server
        .mock("POST", "/inferences/list")
        .match_body(Matcher::PartialJson(json!({
            "function_name": "basic_test",
            "filter": {
                "type": "float_metric",
                "metric_name": "score",
                "value": 0.5,
                "comparison_operator": ">"
            }
        })))
        .with_status(200)
        .with_body(
            json!([{
                "id": INFERENCE_ID,
                "episode_id": EPISODE_ID,
                "function_name": "basic_test",
                "variant_name": "gpt",
                "input": {"messages": []},
                "output": [{"type": "text", "text": "hi"}],
                "timestamp": "2025-01-01T00:00:00Z"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let req = ListInferencesRequest::new()
        .function_name("basic_test")
        .filter(FilterNode::float_metric(
            "score",
            0.5,
            ComparisonOperator::GreaterThan,
        ));
    let got = gateway
        .list_inferences(&req, CancellationToken::new())
        .await
        .expect("list inferences");
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].variant_name, "gpt");
    mock.assert_async().await;
}
