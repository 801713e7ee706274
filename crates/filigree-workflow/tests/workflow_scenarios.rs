// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end create/read scenarios against an in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use filigree_core::AppConfig;
use filigree_core::error::MethodError;
use filigree_core::outcome::Outcome;
use filigree_methods::pdf::blank_pdf;
use filigree_methods::{
    FailingMethod, MethodRegistry, NotApplicableMethod, SucceedingMethod, WatermarkingMethod,
};
use filigree_store::{DocumentGateway, SqliteStore};
use filigree_workflow::reply::STATUS_CREATED;
use filigree_workflow::{Reply, WatermarkService};
use serde_json::{Value, json};

struct Harness {
    service: WatermarkService,
    store: Arc<SqliteStore>,
    owner_token: String,
    doc: String,
}

impl Harness {
    fn new() -> Self {
        let pdf = blank_pdf(2).expect("blank pdf");
        Self::with_document(&pdf)
    }

    fn with_document(bytes: &[u8]) -> Self {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let owner = store.create_user("owner").unwrap();
        let owner_token = store.issue_session(owner).unwrap();
        let doc = store.upload_document(owner, "test.pdf", bytes).unwrap().id.to_string();

        let registry = Arc::new(MethodRegistry::with_builtin_methods());
        registry.register_method(SucceedingMethod);
        registry.register_method(FailingMethod);
        registry.register_method(NotApplicableMethod);

        let service =
            WatermarkService::new(registry, store.clone(), store.clone(), AppConfig::default());
        Self { service, store, owner_token, doc }
    }

    fn stranger_token(&self) -> String {
        let stranger = self.store.create_user("stranger").unwrap();
        self.store.issue_session(stranger).unwrap()
    }

    async fn create(&self, token: Option<&str>, doc: Option<&str>, body: Value) -> Reply {
        Reply::from_result(
            self.service.create_watermark(token, doc, &body).await,
            STATUS_CREATED,
        )
    }

    async fn read(&self, token: Option<&str>, doc: Option<&str>, body: Value) -> Reply {
        Reply::from_result(
            self.service.read_watermark(token, doc, &body).await,
            STATUS_CREATED,
        )
    }

    async fn create_own(&self, body: Value) -> Reply {
        self.create(Some(&self.owner_token), Some(&self.doc), body).await
    }

    async fn read_own(&self, body: Value) -> Reply {
        self.read(Some(&self.owner_token), Some(&self.doc), body).await
    }
}

fn create_body(method: &str, secret: &str, key: &str) -> Value {
    json!({
        "method": method,
        "intended_for": "alice@test.com",
        "secret": secret,
        "key": key,
    })
}

fn read_body(method: &str, key: &str) -> Value {
    json!({ "method": method, "key": key })
}

// -- Method doubles -----------------------------------------------------------

/// Never applicable; counts how often embed is attempted anyway.
#[derive(Default)]
struct CountingRefusal {
    embeds: AtomicUsize,
}

impl WatermarkingMethod for CountingRefusal {
    fn name(&self) -> &str {
        "counting-refusal"
    }
    fn usage(&self) -> &str {
        "Refuses every document"
    }
    fn is_watermark_applicable(&self, _pdf: &[u8], _position: Option<&str>) -> bool {
        false
    }
    fn add_watermark(
        &self,
        pdf: &[u8],
        _secret: &str,
        _key: &str,
        _position: Option<&str>,
    ) -> Result<Vec<u8>, MethodError> {
        self.embeds.fetch_add(1, Ordering::SeqCst);
        Ok(pdf.to_vec())
    }
    fn read_secret(&self, _pdf: &[u8], _key: &str) -> Result<String, MethodError> {
        Err(MethodError::NotFound("nothing here".into()))
    }
}

struct Panicking;

impl WatermarkingMethod for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }
    fn usage(&self) -> &str {
        "Panics on embed and extract"
    }
    fn is_watermark_applicable(&self, _pdf: &[u8], _position: Option<&str>) -> bool {
        true
    }
    fn add_watermark(
        &self,
        _pdf: &[u8],
        _secret: &str,
        _key: &str,
        _position: Option<&str>,
    ) -> Result<Vec<u8>, MethodError> {
        panic!("embed exploded")
    }
    fn read_secret(&self, _pdf: &[u8], _key: &str) -> Result<String, MethodError> {
        panic!("extract exploded")
    }
}

// -- Create / read scenarios ------------------------------------------------

#[tokio::test]
async fn test_success_round_trip() {
    let h = Harness::new();

    let created = h.create_own(create_body("test-success", "my-secret", "my-key")).await;
    assert_eq!(created.status, 201);
    assert_eq!(created.body["documentid"].to_string(), h.doc);
    assert!(created.body["link"].as_str().unwrap().starts_with("/api/get-version/"));

    let read = h.read_own(read_body("test-success", "my-key")).await;
    assert_eq!(read.status, 201);
    assert_eq!(read.body["secret"], "my-secret");
}

#[tokio::test]
async fn failing_method_is_internal_failure() {
    let h = Harness::new();
    let reply = h.create_own(create_body("test-fail", "s", "k")).await;
    assert_eq!(reply.status, 500);
    assert_eq!(reply.body["error"], "internal server error");
}

#[tokio::test]
async fn not_applicable_method_is_invalid_request() {
    let h = Harness::new();
    let reply = h.create_own(create_body("test-not-applicable", "s", "k")).await;
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body["error"], "method not applicable to this document");
}

#[tokio::test]
async fn read_before_any_watermark_is_invalid_request() {
    let h = Harness::new();
    let reply = h.read_own(read_body("test-success", "k")).await;
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body["error"], "no watermark present");
}

#[tokio::test]
async fn unknown_method_is_invalid_request() {
    let h = Harness::new();
    let reply = h.create_own(create_body("does-not-exist", "s", "k")).await;
    assert_eq!(reply.status, 400);
    assert!(reply.body["error"].as_str().unwrap().contains("does-not-exist"));

    let reply = h.read_own(read_body("does-not-exist", "k")).await;
    assert_eq!(reply.status, 400);
}

// -- Authentication and ownership -------------------------------------------

#[tokio::test]
async fn unauthenticated_requests_are_rejected_first() {
    let h = Harness::new();
    for token in [None, Some(""), Some("not-a-session")] {
        let reply = h
            .create(token, Some("99999"), create_body("test-success", "s", "k"))
            .await;
        assert_eq!(reply.status, 401);

        let reply = h.read(token, None, read_body("test-success", "k")).await;
        assert_eq!(reply.status, 401);
    }
}

#[tokio::test]
async fn foreign_document_looks_missing() {
    let h = Harness::new();
    h.create_own(create_body("test-success", "s", "k")).await;
    let stranger = h.stranger_token();

    let foreign_create = h
        .create(Some(&stranger), Some(&h.doc), create_body("test-success", "s", "k"))
        .await;
    let missing_create = h
        .create(Some(&stranger), Some("99999"), create_body("test-success", "s", "k"))
        .await;
    assert_eq!(foreign_create.status, 404);
    assert_eq!(foreign_create, missing_create);

    let foreign_read = h
        .read(Some(&stranger), Some(&h.doc), read_body("test-success", "k"))
        .await;
    let missing_read = h
        .read(Some(&stranger), Some("99999"), read_body("test-success", "k"))
        .await;
    assert_eq!(foreign_read.status, 404);
    assert_eq!(foreign_read, missing_read);
}

// -- Field validation -------------------------------------------------------

#[tokio::test]
async fn missing_or_malformed_document_id() {
    let h = Harness::new();
    for id in [None, Some("abc"), Some("-3")] {
        let reply = h
            .create(Some(&h.owner_token), id, create_body("test-success", "s", "k"))
            .await;
        assert_eq!(reply.status, 400, "id {id:?}");
        let reply = h
            .read(Some(&h.owner_token), id, read_body("test-success", "k"))
            .await;
        assert_eq!(reply.status, 400, "id {id:?}");
    }
}

#[tokio::test]
async fn missing_create_fields_are_invalid_with_error_body() {
    let h = Harness::new();
    for field in ["method", "secret", "key", "intended_for"] {
        let mut body = create_body("test-success", "s", "k");
        body.as_object_mut().unwrap().remove(field);
        let reply = h.create_own(body).await;
        assert_eq!(reply.status, 400, "without {field}");
        assert!(reply.body.get("error").is_some());
    }
}

#[tokio::test]
async fn missing_read_fields_are_invalid_with_error_body() {
    let h = Harness::new();
    for body in [json!({"key": "k"}), json!({"method": "test-success"})] {
        let reply = h.read_own(body).await;
        assert_eq!(reply.status, 400);
        assert!(reply.body.get("error").is_some());
    }
}

#[tokio::test]
async fn non_string_key_is_invalid() {
    let h = Harness::new();
    let mut body = create_body("test-success", "s", "k");
    body["key"] = json!(12345);
    assert_eq!(h.create_own(body).await.status, 400);

    let reply = h.read_own(json!({"method": "test-success", "key": 12345})).await;
    assert_eq!(reply.status, 400);
}

// -- Key-sensitive methods --------------------------------------------------

#[tokio::test]
async fn trailer_seal_round_trip_and_key_mismatch() {
    let h = Harness::new();
    let reply = h.create_own(create_body("trailer-seal", "sealed secret", "k1")).await;
    assert_eq!(reply.status, 201);

    let good = h.read_own(read_body("trailer-seal", "k1")).await;
    assert_eq!(good.body["secret"], "sealed secret");

    let wrong = h.read_own(read_body("trailer-seal", "k2")).await;
    assert_eq!(wrong.status, 400);
}

#[tokio::test]
async fn object_stream_honours_position() {
    let h = Harness::new();
    let mut body = create_body("object-stream", "page two", "k");
    body["position"] = json!("2");
    assert_eq!(h.create_own(body.clone()).await.status, 201);

    body["position"] = json!("9");
    let reply = h.create_own(body.clone()).await;
    assert_eq!(reply.status, 400);

    // Non-string positions reach the method in their JSON rendering.
    body["position"] = json!(2);
    assert_eq!(h.create_own(body.clone()).await.status, 201);
    body["position"] = json!({"page": 1});
    assert_eq!(h.create_own(body).await.status, 400);

    let read = h.read_own(read_body("object-stream", "k")).await;
    assert_eq!(read.body["secret"], "page two");
}

#[tokio::test]
async fn methods_ignoring_position_accept_any_json_position() {
    let h = Harness::new();
    for position in [json!(2), json!({"page": 1}), json!([1, 2]), json!(true), Value::Null] {
        let mut body = create_body("test-success", "s", "k");
        body["position"] = position.clone();
        assert_eq!(h.create_own(body).await.status, 201, "position {position}");
    }
}

#[tokio::test]
async fn multi_line_and_non_ascii_secrets_survive_every_method() {
    let h = Harness::new();
    for method in ["test-success", "trailer-seal", "object-stream"] {
        for secret in ["line1\nline2", "carriage\r\nreturn\n", "Grüße, 世界 🔏"] {
            let created = h.create_own(create_body(method, secret, "k")).await;
            assert_eq!(created.status, 201, "{method}");
            let read = h.read_own(read_body(method, "k")).await;
            assert_eq!(read.body["secret"], secret, "{method}");
        }
    }
}

#[tokio::test]
async fn reading_with_another_method_is_a_mismatch() {
    let h = Harness::new();
    h.create_own(create_body("test-success", "s", "k")).await;
    let reply = h.read_own(read_body("trailer-seal", "k")).await;
    assert_eq!(reply.status, 400);
}

#[tokio::test]
async fn read_prefers_version_made_by_requested_method() {
    let h = Harness::new();
    h.create_own(create_body("trailer-seal", "sealed", "k")).await;
    h.create_own(create_body("test-success", "plain", "k")).await;

    let sealed = h.read_own(read_body("trailer-seal", "k")).await;
    assert_eq!(sealed.body["secret"], "sealed");
    let plain = h.read_own(read_body("test-success", "k")).await;
    assert_eq!(plain.body["secret"], "plain");
}

#[tokio::test]
async fn original_upload_is_never_modified() {
    let h = Harness::new();
    let before = h.store.load_document(h.doc.parse().unwrap()).unwrap().unwrap();
    h.create_own(create_body("trailer-seal", "s", "k")).await;
    let after = h.store.load_document(h.doc.parse().unwrap()).unwrap().unwrap();
    assert_eq!(before.bytes, after.bytes);
}

// -- Isolation --------------------------------------------------------------

#[tokio::test]
async fn applicability_gate_prevents_embed() {
    let h = Harness::new();
    let refusal = Arc::new(CountingRefusal::default());
    h.service
        .registry()
        .register("counting-refusal", refusal.clone());

    let reply = h.create_own(create_body("counting-refusal", "s", "k")).await;
    assert_eq!(reply.status, 400);
    assert_eq!(refusal.embeds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn panicking_method_is_contained() {
    let h = Harness::new();
    h.service.registry().register_method(Panicking);

    let reply = h.create_own(create_body("panicking", "s", "k")).await;
    assert_eq!(reply.status, 500);

    // The service keeps working afterwards.
    let reply = h.create_own(create_body("test-success", "s", "k")).await;
    assert_eq!(reply.status, 201);
    h.service.registry().unregister("test-success");
    h.service.registry().register("test-success", Arc::new(Panicking));

    let reply = h.read_own(read_body("test-success", "k")).await;
    assert_eq!(reply.status, 500);
}

#[tokio::test]
async fn unregistered_method_becomes_unknown() {
    let h = Harness::new();
    assert_eq!(h.create_own(create_body("test-success", "s", "k")).await.status, 201);
    h.service.registry().unregister("test-success");
    assert_eq!(h.create_own(create_body("test-success", "s", "k")).await.status, 400);
}

#[tokio::test]
async fn failures_do_not_leak_method_internals() {
    let h = Harness::new();
    let reply = h.create_own(create_body("test-fail", "s", "k")).await;
    let rendered = reply.body.to_string();
    assert!(!rendered.contains("test-fail"));
    assert_eq!(Outcome::InternalFailure.body(), reply.body);
}

#[tokio::test]
async fn secrets_longer_than_configured_limit_are_invalid() {
    let h = Harness::new();
    let secret = "x".repeat(AppConfig::default().max_secret_len + 1);
    let reply = h.create_own(create_body("test-success", &secret, "k")).await;
    assert_eq!(reply.status, 400);
}

#[tokio::test]
async fn non_pdf_upload_is_not_applicable_for_pdf_methods() {
    let h = Harness::with_document(b"just some text");
    for method in ["trailer-seal", "object-stream"] {
        let reply = h.create_own(create_body(method, "s", "k")).await;
        assert_eq!(reply.status, 400, "{method}");
    }
    assert_eq!(h.create_own(create_body("test-success", "s", "k")).await.status, 201);
}

#[tokio::test]
async fn pdf_methods_reading_a_non_pdf_version_is_a_mismatch() {
    let h = Harness::with_document(b"just some text");
    assert_eq!(h.create_own(create_body("test-success", "s", "k")).await.status, 201);

    for method in ["object-stream", "trailer-seal"] {
        let reply = h.read_own(read_body(method, "k")).await;
        assert_eq!(reply.status, 400, "{method}");
        assert_eq!(reply.body["error"], "no watermark matches the supplied method and key");
    }
}
