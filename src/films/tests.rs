//! Films API Tests
//!
//! Drives the complete router in-process, including the rate limiter layer.
//!
//! ## Test Scopes
//! - **Decoding**: What request bodies are accepted as film fields.
//! - **Endpoints**: Status codes and bodies for each verb, against a seeded in-memory store.
//! - **Failures**: Store errors surface as `500` with an operation-specific message.
//! - **Rate limiting**: The fifth request in a window is rejected before any handler runs.
//! - **Logging**: Every outcome emits exactly one event, at the level of its class.

#[cfg(test)]
mod tests {
    use crate::app::{AppContext, build_router};
    use crate::films::protocol::*;
    use crate::films::types::{Film, FilmFields, FilmId};
    use crate::limiter::{SlidingWindowLimiter, Strategy, build};
    use crate::store::{FilmStore, MemoryStore, StoreError, StoreResult};

    use async_trait::async_trait;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tower::ServiceExt;
    use tracing::Level;
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    fn seeded_app() -> Router {
        app_with_store(Arc::new(MemoryStore::with_seed()))
    }

    fn app_with_store(store: Arc<dyn FilmStore>) -> Router {
        let limiter = Arc::new(SlidingWindowLimiter::new(1_000, Duration::from_secs(20)));
        build_router(AppContext::new(store), limiter)
    }

    fn request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn shawshank() -> Film {
        Film {
            id: 1,
            title: "The Shawshank Redemption".to_string(),
            year: 1994,
            filmtype: "Drama".to_string(),
        }
    }

    // ============================================================
    // BODY DECODING
    // ============================================================

    #[test]
    fn test_fields_ignore_id_and_unknown_keys() {
        let fields =
            FilmFields::from_json(br#"{"id":99,"title":"Nun","year":2018,"filmtype":"Horror","x":1}"#)
                .unwrap();
        assert_eq!(fields, FilmFields::new("Nun", 2018, "Horror"));
    }

    #[test]
    fn test_missing_fields_take_zero_values() {
        let fields = FilmFields::from_json(br#"{"title":"Untitled"}"#).unwrap();
        assert_eq!(fields, FilmFields::new("Untitled", 0, ""));
    }

    #[test]
    fn test_wrong_primitive_types_are_rejected() {
        assert!(FilmFields::from_json(br#"{"title":"Nun","year":"2018"}"#).is_err());
        assert!(FilmFields::from_json(br#"{"title":7}"#).is_err());
        assert!(FilmFields::from_json(br#"{"year":2018.5}"#).is_err());
    }

    #[test]
    fn test_non_object_bodies_are_rejected() {
        for body in ["", "null", "[]", "\"Nun\"", "{not json"] {
            assert!(
                FilmFields::from_json(body.as_bytes()).is_err(),
                "{:?} should not decode",
                body
            );
        }
    }

    // ============================================================
    // ENDPOINTS
    // ============================================================

    #[tokio::test]
    async fn test_list_returns_seeded_films() {
        let app = seeded_app();

        let (status, body) = send(&app, request("GET", "/films", None)).await;

        assert_eq!(status, StatusCode::OK);
        let films: Vec<Film> = serde_json::from_str(&body).unwrap();
        assert_eq!(films.len(), 5);
        assert_eq!(films[0], shawshank());
    }

    #[tokio::test]
    async fn test_list_of_empty_store_is_empty_array() {
        let app = app_with_store(Arc::new(MemoryStore::new()));
        let (status, body) = send(&app, request("GET", "/films", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let app = seeded_app();

        let (status, body) = send(&app, request("GET", "/films/1", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Film>(&body).unwrap(), shawshank());

        let (status, body) = send(&app, request("GET", "/films/999", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, MSG_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_integer_ids_are_bad_requests() {
        let app = seeded_app();

        for (method, body) in [
            ("GET", None),
            ("PUT", Some(r#"{"title":"Nun","year":2018,"filmtype":"Horror"}"#)),
            ("DELETE", None),
        ] {
            for uri in ["/films/abc", "/films/1.5", "/films/99999999999"] {
                let (status, text) = send(&app, request(method, uri, body)).await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
                assert_eq!(text, MSG_INVALID_ID);
            }
        }
    }

    #[tokio::test]
    async fn test_create_get_delete_scenario() {
        let app = seeded_app();

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/films",
                Some(r#"{"title":"Nun","year":2018,"filmtype":"Horror"}"#),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let created: Film = serde_json::from_str(&body).unwrap();
        assert_eq!(created, Film::from_fields(6, FilmFields::new("Nun", 2018, "Horror")));

        let (status, body) = send(&app, request("GET", "/films/6", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Film>(&body).unwrap(), created);

        let (status, body) = send(&app, request("DELETE", "/films/6", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, MSG_DELETED);

        let (status, _) = send(&app, request("GET", "/films/6", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, request("DELETE", "/films/6", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, MSG_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_without_content_type_is_accepted() {
        let app = seeded_app();
        let req = Request::builder()
            .method("POST")
            .uri("/films")
            .body(Body::from(r#"{"title":"Alien","year":1979,"filmtype":"Horror"}"#))
            .unwrap();

        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Film>(&body).unwrap().title, "Alien");
    }

    #[tokio::test]
    async fn test_undecodable_path_segment_is_invalid_id() {
        let app = seeded_app();

        for method in ["GET", "DELETE"] {
            let (status, text) = send(&app, request(method, "/films/%FF", None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} /films/%FF", method);
            assert_eq!(text, MSG_INVALID_ID);
        }

        let (status, text) = send(
            &app,
            request("PUT", "/films/%FF", Some(r#"{"title":"Nun"}"#)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, MSG_INVALID_ID);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let app = seeded_app();
        let title = "x".repeat(MAX_BODY_BYTES);
        let film = format!(r#"{{"title":"{}","year":2018,"filmtype":"Horror"}}"#, title);

        let (status, text) = send(&app, request("POST", "/films", Some(&film))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(text, MSG_BODY_TOO_LARGE);

        let (status, text) = send(&app, request("PUT", "/films/1", Some(&film))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(text, MSG_BODY_TOO_LARGE);

        // Nothing was stored or changed
        let (_, body) = send(&app, request("GET", "/films", None)).await;
        let films: Vec<Film> = serde_json::from_str(&body).unwrap();
        assert_eq!(films.len(), 5);
        assert_eq!(films[0], shawshank());
    }

    #[tokio::test]
    async fn test_body_at_limit_is_accepted() {
        let app = seeded_app();
        let overhead = r#"{"title":"","year":2018,"filmtype":"Horror"}"#.len();
        let title = "x".repeat(MAX_BODY_BYTES - overhead);
        let film = format!(r#"{{"title":"{}","year":2018,"filmtype":"Horror"}}"#, title);
        assert_eq!(film.len(), MAX_BODY_BYTES);

        let (status, body) = send(&app, request("POST", "/films", Some(&film))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Film>(&body).unwrap().title, title);
    }

    #[tokio::test]
    async fn test_create_with_malformed_body() {
        let app = seeded_app();

        for body in ["", "{", r#"{"year":"nineteen"}"#, "[1,2]"] {
            let (status, text) = send(&app, request("POST", "/films", Some(body))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
            assert_eq!(text, MSG_INVALID_BODY);
        }

        // Nothing was stored
        let (_, body) = send(&app, request("GET", "/films", None)).await;
        assert_eq!(serde_json::from_str::<Vec<Film>>(&body).unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_keeps_path_id() {
        let app = seeded_app();

        let (status, body) = send(
            &app,
            request(
                "PUT",
                "/films/1",
                Some(r#"{"id":42,"title":"Shawshank","year":1995,"filmtype":"Prison drama"}"#),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let expected = Film::from_fields(1, FilmFields::new("Shawshank", 1995, "Prison drama"));
        assert_eq!(serde_json::from_str::<Film>(&body).unwrap(), expected);

        let (_, body) = send(&app, request("GET", "/films/1", None)).await;
        assert_eq!(serde_json::from_str::<Film>(&body).unwrap(), expected);

        let (status, _) = send(&app, request("GET", "/films/42", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_failures() {
        let app = seeded_app();

        let (status, text) = send(
            &app,
            request("PUT", "/films/999", Some(r#"{"title":"Nun"}"#)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(text, MSG_NOT_FOUND);

        let (status, text) = send(&app, request("PUT", "/films/1", Some("not json"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, MSG_INVALID_BODY);

        // The seed film is untouched
        let (_, body) = send(&app, request("GET", "/films/1", None)).await;
        assert_eq!(serde_json::from_str::<Film>(&body).unwrap(), shawshank());
    }

    #[tokio::test]
    async fn test_unsupported_method_is_rejected() {
        let app = seeded_app();
        let (status, _) = send(&app, request("PATCH", "/films/1", Some("{}"))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    // ============================================================
    // STORE FAILURES
    // ============================================================

    /// Fails every call as if the database had gone away.
    struct BrokenStore;

    #[async_trait]
    impl FilmStore for BrokenStore {
        async fn list(&self) -> StoreResult<Vec<Film>> {
            Err(StoreError::Timeout(Duration::from_millis(5)))
        }
        async fn get(&self, _id: FilmId) -> StoreResult<Film> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn create(&self, _fields: FilmFields) -> StoreResult<Film> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }
        async fn update(&self, _id: FilmId, _fields: FilmFields) -> StoreResult<Film> {
            Err(StoreError::Timeout(Duration::from_millis(5)))
        }
        async fn delete(&self, _id: FilmId) -> StoreResult<()> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        fn backend(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_store_failures_map_to_500() {
        let app = app_with_store(Arc::new(BrokenStore));
        let film = Some(r#"{"title":"Nun","year":2018,"filmtype":"Horror"}"#);

        let cases = [
            ("GET", "/films", None, MSG_LIST_FAILED),
            ("GET", "/films/1", None, MSG_GET_FAILED),
            ("POST", "/films", film, MSG_CREATE_FAILED),
            ("PUT", "/films/1", film, MSG_UPDATE_FAILED),
            ("DELETE", "/films/1", None, MSG_DELETE_FAILED),
        ];

        for (method, uri, body, message) in cases {
            let (status, text) = send(&app, request(method, uri, body)).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{} {}", method, uri);
            assert_eq!(text, message);
        }
    }

    #[tokio::test]
    async fn test_input_is_validated_before_store_is_called() {
        let app = app_with_store(Arc::new(BrokenStore));

        let (status, _) = send(&app, request("GET", "/films/abc", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, request("POST", "/films", Some("{"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ============================================================
    // RATE LIMITING
    // ============================================================

    /// Counts how many calls reach the wrapped store.
    struct CountingStore {
        inner: MemoryStore,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FilmStore for CountingStore {
        async fn list(&self) -> StoreResult<Vec<Film>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.list().await
        }
        async fn get(&self, id: FilmId) -> StoreResult<Film> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get(id).await
        }
        async fn create(&self, fields: FilmFields) -> StoreResult<Film> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.create(fields).await
        }
        async fn update(&self, id: FilmId, fields: FilmFields) -> StoreResult<Film> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.update(id, fields).await
        }
        async fn delete(&self, id: FilmId) -> StoreResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(id).await
        }
        fn backend(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_fifth_request_in_window_is_rate_limited() {
        let store = Arc::new(CountingStore {
            inner: MemoryStore::with_seed(),
            calls: AtomicUsize::new(0),
        });
        let limiter = build(Strategy::Sliding, 4, Duration::from_secs(20));
        let app = build_router(AppContext::new(store.clone()), limiter);

        // Mixed endpoints share one budget
        let admitted = [
            request("GET", "/films", None),
            request("GET", "/films/1", None),
            request("POST", "/films", Some(r#"{"title":"Nun","year":2018,"filmtype":"Horror"}"#)),
            request("GET", "/films/999", None),
        ];
        for (i, req) in admitted.into_iter().enumerate() {
            let response = app.clone().oneshot(req).await.unwrap();
            assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS, "request {}", i + 1);
            assert_eq!(response.headers()["x-ratelimit-limit"], "4");
            assert_eq!(
                response.headers()["x-ratelimit-remaining"],
                (3 - i).to_string().as_str()
            );
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 4);

        let response = app
            .clone()
            .oneshot(request("DELETE", "/films/1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "20");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], RATE_LIMITED.as_bytes());

        // The rejected delete never reached the store
        assert_eq!(store.calls.load(Ordering::SeqCst), 4);
        assert!(store.inner.get(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_applies_to_invalid_requests_too() {
        let limiter = build(Strategy::Fixed, 1, Duration::from_secs(20));
        let app = build_router(AppContext::new(Arc::new(MemoryStore::with_seed())), limiter);

        let (status, _) = send(&app, request("GET", "/films/abc", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, request("GET", "/films/1", None)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    const RATE_LIMITED: &str = crate::limiter::middleware::RATE_LIMITED_MESSAGE;

    // ============================================================
    // LOGGING
    // ============================================================

    /// Records the level of every `info`-or-louder event this crate emits.
    #[derive(Clone, Default)]
    struct CapturedLevels(Arc<Mutex<Vec<Level>>>);

    impl<S: tracing::Subscriber> Layer<S> for CapturedLevels {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let meta = event.metadata();
            let loud = [Level::ERROR, Level::WARN, Level::INFO].contains(meta.level());
            if loud && meta.target().starts_with("film_service") {
                self.0.lock().unwrap().push(*meta.level());
            }
        }
    }

    /// Sends one request with a capturing subscriber installed on this thread.
    async fn send_logged(app: &Router, req: Request<Body>) -> (StatusCode, Vec<Level>) {
        let captured = CapturedLevels::default();
        let subscriber = tracing_subscriber::registry().with(captured.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let (status, _) = send(app, req).await;
        let levels = captured.0.lock().unwrap().clone();
        (status, levels)
    }

    #[tokio::test]
    async fn test_each_outcome_logs_one_event_at_its_level() {
        let seeded = seeded_app();
        let broken = app_with_store(Arc::new(BrokenStore));
        let film = Some(r#"{"title":"Nun","year":2018,"filmtype":"Horror"}"#);

        let cases = [
            (&seeded, request("GET", "/films/1", None), StatusCode::OK, Level::INFO),
            (&seeded, request("POST", "/films", film), StatusCode::OK, Level::INFO),
            (&seeded, request("DELETE", "/films/2", None), StatusCode::OK, Level::INFO),
            (&seeded, request("GET", "/films/999", None), StatusCode::NOT_FOUND, Level::WARN),
            (&seeded, request("GET", "/films/abc", None), StatusCode::BAD_REQUEST, Level::ERROR),
            (&seeded, request("GET", "/films/%FF", None), StatusCode::BAD_REQUEST, Level::ERROR),
            (&seeded, request("POST", "/films", Some("{")), StatusCode::BAD_REQUEST, Level::ERROR),
            (&broken, request("GET", "/films", None), StatusCode::INTERNAL_SERVER_ERROR, Level::ERROR),
            (&broken, request("PUT", "/films/1", film), StatusCode::INTERNAL_SERVER_ERROR, Level::ERROR),
        ];

        for (app, req, expected_status, expected_level) in cases {
            let label = format!("{} {}", req.method(), req.uri());
            let (status, levels) = send_logged(app, req).await;
            assert_eq!(status, expected_status, "{}", label);
            assert_eq!(levels, vec![expected_level], "{} should log exactly once", label);
        }
    }

    #[tokio::test]
    async fn test_rate_limited_request_logs_one_warning() {
        let limiter = build(Strategy::Fixed, 1, Duration::from_secs(20));
        let app = build_router(AppContext::new(Arc::new(MemoryStore::with_seed())), limiter);

        let (status, levels) = send_logged(&app, request("GET", "/films", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(levels, vec![Level::INFO]);

        let (status, levels) = send_logged(&app, request("GET", "/films", None)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(levels, vec![Level::WARN], "Only the limiter logs a rejected request");
    }
}
