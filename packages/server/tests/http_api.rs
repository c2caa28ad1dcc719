//! HTTP API integration tests.
//!
//! Tests for the read-only query endpoints (health, polls, chat).

mod fixtures;
use fixtures::TestServer;
use kyoshitsu_server::ServerConfig;
use serde_json::json;

async fn get_json(url: String) -> (u16, serde_json::Value) {
    let response = reqwest::get(url).await.expect("Failed to send request");
    let status = response.status().as_u16();
    let body = response.json().await.expect("Failed to parse JSON");
    (status, body)
}

#[tokio::test]
async fn test_health_endpoint() {
    // テスト項目: /api/health エンドポイントが正常に動作する
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let (status, body) = get_json(format!("{}/api/health", server.base_url())).await;

    // then (期待する結果):
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_active_poll_not_found() {
    // テスト項目: 実施中の投票がないセッションは 404 とエラーメッセージを返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let (status, body) = get_json(format!(
        "{}/api/polls/session/empty/active",
        server.base_url()
    ))
    .await;

    // then (期待する結果):
    assert_eq!(status, 404);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_active_poll_and_results_lifecycle() {
    // テスト項目: WebSocket で作成・終了した投票を HTTP で参照できる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut teacher = server.join("math", "teacher", None).await;
    let mut alice = server.join("math", "student", Some("Alice")).await;
    teacher
        .send(
            "createPoll",
            json!({
                "sessionId": "math",
                "question": "2 + 2?",
                "options": ["3", "4"],
                "duration": 60,
                "correctAnswers": ["4"]
            }),
        )
        .await;
    let started = alice.expect("pollStarted").await;
    let poll_id = started["poll"]["id"].as_str().unwrap().to_string();
    alice
        .send(
            "submitVote",
            json!({"pollId": poll_id, "sessionId": "math", "studentName": "alice", "option": "4"}),
        )
        .await;
    alice.expect("voteUpdate").await;

    // when (操作):
    let (active_status, active) = get_json(format!(
        "{}/api/polls/session/math/active",
        server.base_url()
    ))
    .await;
    teacher
        .send("endPoll", json!({"pollId": poll_id, "sessionId": "math"}))
        .await;
    alice.expect("pollEnded").await;
    let (_, results) =
        get_json(format!("{}/api/polls/{}/results", server.base_url(), poll_id)).await;
    let (_, history) = get_json(format!(
        "{}/api/polls/session/math/history",
        server.base_url()
    ))
    .await;
    let (poll_status, poll) =
        get_json(format!("{}/api/polls/{}", server.base_url(), poll_id)).await;

    // then (期待する結果):
    assert_eq!(active_status, 200);
    assert_eq!(active["poll"]["id"], poll_id.as_str());
    assert!(active["remainingTime"].as_u64().unwrap() <= 60);

    assert_eq!(results["totalVotes"], 1);
    assert_eq!(results["options"][1]["option"], "4");
    assert_eq!(results["options"][1]["percentage"], 100.0);
    assert_eq!(results["correctAnswers"], json!(["4"]));

    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["active"], false);

    assert_eq!(poll_status, 200);
    assert_eq!(poll["votes"][0]["studentName"], "alice");
}

#[tokio::test]
async fn test_unknown_poll_returns_404() {
    // テスト項目: 存在しない投票は詳細・結果とも 404
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let (detail_status, _) =
        get_json(format!("{}/api/polls/nonexistent", server.base_url())).await;
    let (results_status, _) =
        get_json(format!("{}/api/polls/nonexistent/results", server.base_url())).await;

    // then (期待する結果):
    assert_eq!(detail_status, 404);
    assert_eq!(results_status, 404);
}

#[tokio::test]
async fn test_chat_history_endpoints() {
    // テスト項目: ロビーのチャットをスコープ別（古い順）とセッション別（新しい順）で取得できる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.join("art", "student", Some("alice")).await;
    for text in ["first", "second"] {
        alice
            .send(
                "sendMessage",
                json!({"pollId": "lobby", "sessionId": "art", "text": text}),
            )
            .await;
        alice.expect("newMessage").await;
    }

    // when (操作):
    let (scope_status, scope) = get_json(format!(
        "{}/api/chat/poll/lobby?sessionId=art",
        server.base_url()
    ))
    .await;
    let (_, recent) = get_json(format!("{}/api/chat/session/art", server.base_url())).await;

    // then (期待する結果):
    assert_eq!(scope_status, 200);
    assert_eq!(scope[0]["text"], "first");
    assert_eq!(scope[1]["text"], "second");
    assert_eq!(scope[0]["from"], "alice");
    assert_eq!(scope[0]["pollId"], "lobby");
    assert_eq!(recent[0]["text"], "second");
    assert!(recent[0]["sentAt"].is_string());
}

async fn allow_origin(url: String, origin: &str) -> Option<String> {
    let response = reqwest::Client::new()
        .get(url)
        .header("Origin", origin)
        .send()
        .await
        .expect("Failed to send request");
    response
        .headers()
        .get("access-control-allow-origin")
        .map(|value| value.to_str().unwrap().to_string())
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    // テスト項目: 許可オリジンを設定しなければ、どのオリジンからでも API を呼べる
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let header = allow_origin(
        format!("{}/api/health", server.base_url()),
        "http://localhost:5173",
    )
    .await;

    // then (期待する結果):
    assert_eq!(header.as_deref(), Some("*"));
}

#[tokio::test]
async fn test_cors_restricted_to_configured_origins() {
    // テスト項目: 許可オリジンを設定すると、そのオリジンにだけ CORS ヘッダーが返る
    // given (前提条件):
    let server = TestServer::start_with(ServerConfig {
        cors_origins: vec!["https://class.example.com".to_string()],
        ..ServerConfig::default()
    })
    .await;
    let url = format!("{}/api/polls/session/math/history", server.base_url());

    // when (操作):
    let allowed = allow_origin(url.clone(), "https://class.example.com").await;
    let denied = allow_origin(url, "https://evil.example.com").await;

    // then (期待する結果):
    assert_eq!(allowed.as_deref(), Some("https://class.example.com"));
    assert_eq!(denied, None);
}

#[tokio::test]
async fn test_cors_preflight() {
    // テスト項目: プリフライトリクエストに GET が許可メソッドとして返る
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let response = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/api/polls/session/math/active", server.base_url()),
        )
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert!(response.status().is_success());
    let methods = response
        .headers()
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("GET"));
}
