//! End-to-end tests driving the router in-process.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use hifz::api::{build_router, AppState};
use hifz::llm::{ChatMessage, ChatOptions, ChatResponse, LlmClient};
use hifz::quran::QuranCorpus;
use hifz::store::Store;
use hifz::Config;

const CORPUS: &str = include_str!("fixtures/corpus.json");

const QUIZ_REPLY: &str = "\
**Question 1:** What does the reciter seek refuge from in the second ayah?
A) The evil of what He created
B) Hunger
C) Cold
D) Rain
Answer: A
Explanation: Ayah 2 reads min sharri ma khalaq.

Question 2: Which time of day is mentioned?
A) Dawn
B) Night that darkens
Correct Answer: (B)
";

struct ScriptedLlm;

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        _model: &str,
        _messages: &[ChatMessage],
        _options: ChatOptions,
    ) -> anyhow::Result<ChatResponse> {
        Ok(ChatResponse {
            content: Some(QUIZ_REPLY.to_string()),
            finish_reason: Some("stop".to_string()),
            usage: None,
            model: Some("scripted".to_string()),
        })
    }
}

fn app_with(vars: &[(&str, &str)], llm: Option<Arc<dyn LlmClient>>) -> Router {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();
    let store = Arc::new(Store::open_in_memory().unwrap());
    let corpus = Arc::new(QuranCorpus::from_json(CORPUS).unwrap());
    build_router(Arc::new(AppState::new(config, store, corpus, llm)))
}

fn app() -> Router {
    app_with(
        &[("JWT_SECRET", "test-secret"), ("ADMIN_USERNAMES", "warden")],
        Some(Arc::new(ScriptedLlm)),
    )
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "bismillah123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_capabilities() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
    assert_eq!(body["quran_surahs_loaded"], 4);
    assert_eq!(body["ai_quizzes"], true);
}

#[tokio::test]
async fn register_login_and_auth_failures() {
    let app = app();
    let token = register(&app, "sumayya").await;

    let (status, me) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "sumayya");
    assert_eq!(me["role"], "user");
    assert!(me.get("password_hash").is_none());

    // Duplicate username, case-insensitive
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": "Sumayya", "email": "x@example.com", "password": "bismillah123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": "short", "email": "s@example.com", "password": "1234"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"login": "SUMAYYA@example.com", "password": "bismillah123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (wrong_status, wrong_body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "sumayya", "password": "nope-nope"})),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "ghost", "password": "nope-nope"})),
    )
    .await;
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);

    let (status, _) = send(&app, Method::GET, "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/api/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_password_and_delete_account() {
    let app = app();
    let token = register(&app, "anas").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/password",
        Some(&token),
        Some(json!({"old_password": "wrong-password", "new_password": "newpassword1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/password",
        Some(&token),
        Some(json!({"old_password": "bismillah123", "new_password": "newpassword1"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"login": "anas", "password": "newpassword1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::DELETE, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_update_and_public_view() {
    let app = app();
    let token = register(&app, "ruqayya").await;

    let (status, me) = send(
        &app,
        Method::PATCH,
        "/api/me",
        Some(&token),
        Some(json!({"display_name": "Ruqayya", "daily_goal_ayahs": 12})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["daily_goal_ayahs"], 12);

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/me",
        Some(&token),
        Some(json!({"daily_goal_ayahs": 605})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, profile) = send(&app, Method::GET, "/api/users/ruqayya", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["display_name"], "Ruqayya");
    assert_eq!(profile["memorized_ayahs"], 0);
    assert!(profile.get("email").is_none());

    let (status, _) = send(&app, Method::GET, "/api/users/nobody", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn quran_lookup() {
    let app = app();

    let (status, surahs) = send(&app, Method::GET, "/api/quran/surahs", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(surahs.as_array().unwrap().len(), 114);
    assert_eq!(surahs[0]["name_transliterated"], "Al-Fatihah");
    assert_eq!(surahs[0]["text_available"], true);
    assert_eq!(surahs[1]["text_available"], false);

    let (status, surah) = send(&app, Method::GET, "/api/quran/surahs/2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(surah["ayah_count"], 286);
    assert_eq!(surah["revelation"], "medinan");

    let (status, _) = send(&app, Method::GET, "/api/quran/surahs/115", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, ayah) = send(&app, Method::GET, "/api/quran/ayahs/1/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ayah["surah"], 1);
    assert!(ayah["text"].as_str().unwrap().contains("بِسْمِ"));

    let (status, _) = send(&app, Method::GET, "/api/quran/ayahs/1/8", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, Method::GET, "/api/quran/ayahs/2/255", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, range) = send(
        &app,
        Method::GET,
        "/api/quran/surahs/112/ayahs?from=2&to=3",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let range = range.as_array().unwrap();
    assert_eq!(range.len(), 2);
    assert_eq!(range[0]["ayah"], 2);

    let (status, hits) = send(
        &app,
        Method::GET,
        "/api/quran/search?q=%D8%A7%D9%84%D9%86%D8%A7%D8%B3&limit=3",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|h| h["surah"] == 114));

    let (status, similar) = send(
        &app,
        Method::GET,
        "/api/quran/ayahs/113/1/similar?threshold=0.5",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(similar[0]["surah"], 114);
    assert_eq!(similar[0]["ayah"], 1);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/quran/ayahs/113/1/similar?threshold=2",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ai_quiz_generate_submit_and_history() {
    let app = app();
    let token = register(&app, "talha").await;

    let (status, quiz) = send(
        &app,
        Method::POST,
        "/api/quizzes",
        Some(&token),
        Some(json!({"surah": 113, "question_count": 2, "kind": "ai_multiple_choice"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{quiz}");
    assert_eq!(quiz["from_ayah"], 1);
    assert_eq!(quiz["to_ayah"], 5);
    assert_eq!(quiz["difficulty"], "medium");
    let questions = quiz["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[1]["options"].as_array().unwrap().len(), 2);
    // Answer keys never leave the server before grading
    assert!(questions.iter().all(|q| q.get("answer").is_none()));

    let quiz_id = quiz["id"].as_str().unwrap();
    let (status, fetched) = send(
        &app,
        Method::GET,
        &format!("/api/quizzes/{}", quiz_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["questions"], quiz["questions"]);

    let submit = format!("/api/quizzes/{}/submit", quiz_id);
    let (status, _) = send(
        &app,
        Method::POST,
        &submit,
        Some(&token),
        Some(json!({"answers": [{"question_index": 5, "choice": "A"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        Method::POST,
        &submit,
        Some(&token),
        Some(json!({"answers": [
            {"question_index": 0, "choice": "A"},
            {"question_index": 0, "choice": "B"}
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, report) = send(
        &app,
        Method::POST,
        &submit,
        Some(&token),
        Some(json!({"answers": [{"question_index": 0, "choice": "a"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{report}");
    assert_eq!(report["total"], 2);
    assert_eq!(report["correct"], 1);
    assert_eq!(report["percentage"], 50.0);
    assert_eq!(report["results"][1]["is_correct"], false);
    assert_eq!(report["results"][1]["correct_answer"], "B");
    assert!(report["attempt_id"].is_string());

    let (status, attempts) =
        send(&app, Method::GET, "/api/quiz-attempts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(attempts.as_array().unwrap().len(), 1);
    assert_eq!(attempts[0]["kind"], "ai_multiple_choice");

    // Other users cannot see the quiz
    let other = register(&app, "zubayr").await;
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/quizzes/{}", quiz_id),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn quiz_kinds_and_availability() {
    let app = app_with(&[("JWT_SECRET", "test-secret")], None);
    let token = register(&app, "hafsa").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/quizzes",
        Some(&token),
        Some(json!({"surah": 113, "question_count": 2, "kind": "ai_multiple_choice"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, quiz) = send(
        &app,
        Method::POST,
        "/api/quizzes",
        Some(&token),
        Some(json!({"surah": 114, "question_count": 3, "kind": "identify_surah", "difficulty": "easy"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{quiz}");
    assert_eq!(quiz["questions"].as_array().unwrap().len(), 3);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/quizzes",
        Some(&token),
        Some(json!({"surah": 114, "question_count": 50, "kind": "identify_surah"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/quizzes",
        Some(&token),
        Some(json!({"surah": 2, "question_count": 2, "kind": "next_ayah"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recitation_session_lifecycle() {
    let app = app();
    let token = register(&app, "muadh").await;

    let (status, session) = send(
        &app,
        Method::POST,
        "/api/sessions",
        Some(&token),
        Some(json!({"surah": 112, "mode": "memorize"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{session}");
    assert_eq!(session["status"], "in_progress");
    let id = session["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/mistakes", id),
        Some(&token),
        Some(json!({"ayah": 9, "kind": "omission"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, mistake) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/mistakes", id),
        Some(&token),
        Some(json!({"ayah": 3, "kind": "hesitation", "note": "paused"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mistake["kind"], "hesitation");

    let (status, finished) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/finish", id),
        Some(&token),
        Some(json!({"self_rating": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finished["status"], "completed");
    assert_eq!(finished["self_rating"], 5);
    assert_eq!(finished["mistakes"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/abandon", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, progress) = send(&app, Method::GET, "/api/progress", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["memorized_ayahs"], 4);
    assert_eq!(progress["total_ayahs"], 6236);
    assert_eq!(progress["surahs"][111]["memorized"], 4);

    let (status, stats) = send(&app, Method::GET, "/api/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["completed_sessions"], 1);
    assert_eq!(stats["ayahs_recited"], 4);
    assert_eq!(stats["mistakes"]["hesitation"], 1);
    assert_eq!(stats["current_streak_days"], 1);

    // Finish without a body
    let (_, second) = send(
        &app,
        Method::POST,
        "/api/sessions",
        Some(&token),
        Some(json!({"surah": 1, "from_ayah": 1, "to_ayah": 3, "mode": "revise"})),
    )
    .await;
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/sessions/{}/finish", second["id"].as_str().unwrap()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, sessions) =
        send(&app, Method::GET, "/api/sessions?limit=10", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions.as_array().unwrap().len(), 2);
    assert_eq!(sessions[0]["surah"], 1);

    let (status, fetched) = send(
        &app,
        Method::GET,
        &format!("/api/sessions/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["mistakes"][0]["note"], "paused");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/sessions",
        Some(&token),
        Some(json!({"surah": 1, "from_ayah": 5, "to_ayah": 2, "mode": "revise"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn feedback_and_admin_triage() {
    let app = app();
    let user = register(&app, "sahl").await;
    let admin = register(&app, "warden").await;

    let (status, item) = send(
        &app,
        Method::POST,
        "/api/feedback",
        Some(&user),
        Some(json!({"category": "content", "rating": 4, "message": "Typo in 2:255 note"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["status"], "open");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/feedback",
        Some(&user),
        Some(json!({"category": "bug", "rating": 6, "message": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, mine) = send(&app, Method::GET, "/api/feedback/mine", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/api/feedback", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let id = item["id"].as_str().unwrap();
    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/api/feedback/{}", id),
        Some(&admin),
        Some(json!({"status": "resolved"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "resolved");

    let (status, open) = send(
        &app,
        Method::GET,
        "/api/feedback?status=open",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(open.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn dev_mode_acts_as_local_user() {
    let app = app_with(&[("DEV_MODE", "true")], None);
    let (status, me) = send(&app, Method::GET, "/api/me", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "dev");

    let (status, _) = send(&app, Method::GET, "/api/feedback", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
