//! End-to-end pipeline behavior: guard ordering, quota windows, tiers.

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::{json, Value};

use warden_access::{PermissionLevel, ResourceAccessConfig, ResourceType};
use warden_core::{
    CallRequest, IdentityAssertion, TestClock, WardenError, WardenResult,
};
use warden_csrf::TokenSealer;
use warden_pipeline::{
    AuthLevel, CallContext, CallHandler, EndpointConfig, Pipeline,
};
use warden_ratelimit::{RateLimitConfig, RATE_LIMITS_COLLECTION};
use warden_store::{DocumentStore, MemoryStore};

const MOBILE_UA: &str = "okhttp/4.12.0";
const BROWSER_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101";

struct EchoHandler;

#[async_trait]
impl CallHandler for EchoHandler {
    async fn handle(&self, ctx: CallContext, _req: CallRequest) -> WardenResult<Value> {
        Ok(json!({
            "caller": ctx.caller.map(|c| c.to_string()),
            "session": ctx.session.map(|s| s.to_string()),
            "resource": ctx.resource,
        }))
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .try_init();
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert(
        "events",
        "ev-1",
        json!({"hostId": "alice", "familyId": "fam-1"}),
    );
    store.insert(
        "profiles",
        "alice",
        json!({"emailVerified": true, "onboardingComplete": true}),
    );
    store.insert("profiles", "bob", json!({}));
    store
}

fn pipeline(store: Arc<MemoryStore>, clock: &TestClock) -> Pipeline {
    let store: Arc<dyn DocumentStore> = store;
    Pipeline::with_defaults(store, TokenSealer::new([3u8; 32]), clock.provider())
}

fn alice_request() -> CallRequest {
    CallRequest::new(json!({"eventId": "ev-1"}))
        .with_identity(IdentityAssertion::new("alice").with_email_verified())
        .with_user_agent(MOBILE_UA)
        .with_peer_address("203.0.113.7")
}

#[tokio::test]
async fn guarded_endpoint_runs_the_example_timeline() {
    init_tracing();
    let clock = TestClock::at(0);
    let store = seeded_store();
    let endpoint = pipeline(store.clone(), &clock).guard(
        EndpointConfig::new(AuthLevel::Authenticated)
            .with_csrf()
            .with_rate_limit(
                RateLimitConfig::default()
                    .with_max_requests(3)
                    .with_window_secs(60),
            )
            .with_resource(ResourceAccessConfig::new(
                ResourceType::Event,
                "eventId",
                vec![PermissionLevel::Host],
            )),
        Arc::new(EchoHandler),
    );

    // Three calls at t=0, 10, 20 all pass; the mobile signature exempts
    // CSRF even though it is enabled.
    for offset in [0, 10, 10] {
        clock.advance(offset);
        let response = endpoint.call(alice_request()).await.unwrap();
        assert_eq!(response["caller"], json!("alice"));
        assert_eq!(response["resource"]["hostId"], json!("alice"));
    }

    // Fourth call at t=30 exhausts the window with a ~30s retry hint.
    clock.advance(10);
    let err = endpoint.call(alice_request()).await.unwrap_err();
    assert_matches!(
        err,
        WardenError::ResourceExhausted { retry_after_secs: 30, .. }
    );

    // The window reopens at t=61.
    clock.set(61);
    endpoint.call(alice_request()).await.unwrap();
}

#[tokio::test]
async fn csrf_rejection_precedes_rate_limiting() {
    init_tracing();
    let clock = TestClock::at(0);
    let store = seeded_store();
    let endpoint = pipeline(store.clone(), &clock).guard(
        EndpointConfig::new(AuthLevel::Authenticated)
            .with_csrf()
            .with_rate_limit(
                RateLimitConfig::default()
                    .with_max_requests(1)
                    .with_window_secs(60),
            ),
        Arc::new(EchoHandler),
    );

    // A browser request without tokens is turned away by the CSRF guard
    // and never consumes quota.
    let browser = CallRequest::new(json!({}))
        .with_identity(IdentityAssertion::new("alice"))
        .with_user_agent(BROWSER_UA)
        .with_peer_address("203.0.113.7");
    let err = endpoint.call(browser.clone()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Permission denied: CSRF token missing in header"
    );

    let counter = store
        .get(RATE_LIMITS_COLLECTION, "user:alice:general")
        .await
        .unwrap();
    assert!(counter.is_none(), "rejected call must not consume quota");
}

#[tokio::test]
async fn anonymous_endpoints_limit_by_client_address() {
    init_tracing();
    let clock = TestClock::at(0);
    let endpoint = pipeline(seeded_store(), &clock).guard(
        EndpointConfig::new(AuthLevel::None).with_rate_limit(
            RateLimitConfig::default()
                .with_max_requests(1)
                .with_window_secs(60),
        ),
        Arc::new(EchoHandler),
    );

    let from = |addr: &str| CallRequest::new(json!({})).with_peer_address(addr);

    endpoint.call(from("203.0.113.7")).await.unwrap();
    let err = endpoint.call(from("203.0.113.7")).await.unwrap_err();
    assert_matches!(err, WardenError::ResourceExhausted { .. });

    // A different address consumes its own counter.
    endpoint.call(from("198.51.100.9")).await.unwrap();

    // No address at all fails open.
    endpoint.call(CallRequest::new(json!({}))).await.unwrap();
}

#[tokio::test]
async fn verification_tier_is_enforced_through_the_pipeline() {
    init_tracing();
    let clock = TestClock::at(0);
    let endpoint = pipeline(seeded_store(), &clock).guard(
        EndpointConfig::new(AuthLevel::Verified),
        Arc::new(EchoHandler),
    );

    let bob = CallRequest::new(json!({})).with_identity(IdentityAssertion::new("bob"));
    let err = endpoint.call(bob).await.unwrap_err();
    assert_matches!(err, WardenError::PermissionDenied { .. });

    let nobody = CallRequest::new(json!({}));
    let err = endpoint.call(nobody).await.unwrap_err();
    assert_matches!(err, WardenError::Unauthenticated { .. });

    let alice = CallRequest::new(json!({}))
        .with_identity(IdentityAssertion::new("alice").with_email_verified());
    endpoint.call(alice).await.unwrap();
}

#[tokio::test]
async fn onboarding_tier_reads_the_profile_record() {
    init_tracing();
    let clock = TestClock::at(0);
    let store = seeded_store();
    store.insert(
        "profiles",
        "carol",
        json!({"phoneVerified": true, "onboardingComplete": false}),
    );
    let endpoint = pipeline(store, &clock).guard(
        EndpointConfig::new(AuthLevel::Onboarded),
        Arc::new(EchoHandler),
    );

    let carol = CallRequest::new(json!({})).with_identity(IdentityAssertion::new("carol"));
    let err = endpoint.call(carol).await.unwrap_err();
    assert_eq!(err.to_string(), "Permission denied: onboarding not complete");

    let alice = CallRequest::new(json!({})).with_identity(IdentityAssertion::new("alice"));
    endpoint.call(alice).await.unwrap();
}
