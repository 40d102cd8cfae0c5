use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;

use lexeme_db::{IndexStore, LanguageRegistry, TranslationEntry};
use lexeme_index::handlers::{AppState, router};

fn entry(word: &str, language: &str, category: &str, glosses: &[(&str, &str)]) -> TranslationEntry {
    TranslationEntry {
        word: word.to_string(),
        language: language.to_string(),
        category: category.to_string(),
        glosses: glosses
            .iter()
            .map(|(iso, gloss)| (iso.to_string(), gloss.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }
}

fn make_state(disable_cache: bool) -> AppState {
    let registry = Arc::new(LanguageRegistry::empty());
    let mut built = IndexStore::new(Arc::clone(&registry));
    built.insert(entry("dog", "en", "Q1084", &[("de", "Hund"), ("sv", "hund")]));
    built.insert(entry("hund", "sv", "Q1084", &[("en", "dog")]));
    built.insert(entry("run", "en", "Q24905", &[("de", "laufen")]));

    let tempdir = tempfile::tempdir().unwrap();
    let path = tempdir.path().join("index.json");
    built.save(&path).unwrap();

    let mut store = IndexStore::new(registry);
    store.load(&path).unwrap();
    AppState {
        store: Arc::new(store),
        disable_cache,
    }
}

async fn get(state: AppState, uri: &str) -> axum::response::Response {
    router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body_bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

#[tokio::test]
async fn healthz_ok() {
    let response = get(make_state(false), "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn word_endpoint_returns_translations() {
    let response = get(make_state(false), "/v1/words/dog").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=300"
    );
    let body = json_body(response).await;
    assert_eq!(body["word"], "dog");
    assert_eq!(body["found"], true);
    assert_eq!(body["languages"]["en"]["Q1084"]["de"], "Hund");
    assert_eq!(body["languages"]["en"]["Q1084"]["sv"], "hund");
}

#[tokio::test]
async fn word_lookup_is_case_insensitive() {
    let body = json_body(get(make_state(false), "/v1/words/HUND").await).await;
    assert_eq!(body["word"], "hund");
    assert_eq!(body["languages"]["sv"]["Q1084"]["en"], "dog");
}

#[tokio::test]
async fn unknown_word_is_not_an_error() {
    let response = get(make_state(false), "/v1/words/qagh").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["found"], false);
    assert_eq!(body["languages"], serde_json::json!({}));
}

#[tokio::test]
async fn blank_word_is_rejected() {
    let response = get(make_state(false), "/v1/words/%20%20").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .contains("word is required")
    );
}

#[tokio::test]
async fn overlong_word_is_rejected() {
    let uri = format!("/v1/words/{}", "a".repeat(lexeme_index::MAX_WORD_LEN + 1));
    let response = get(make_state(false), &uri).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cache_headers_can_be_disabled() {
    let response = get(make_state(true), "/v1/words/run").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::CACHE_CONTROL).is_none());
}

#[tokio::test]
async fn stats_lists_words_and_languages() {
    let body = json_body(get(make_state(false), "/v1/stats").await).await;
    assert_eq!(body["words"], 3);
    assert_eq!(body["languages"], serde_json::json!(["en", "sv"]));
}
