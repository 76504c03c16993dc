//! Route Table, Group, and Loader Tests
//!
//! # Coverage
//! - [x] First-match-wins dispatch in registration order
//! - [x] Group prefix and middleware composition (outermost first)
//! - [x] Worker-count aggregation over shared routes
//! - [x] Loader merges files alphabetically, skipping broken files whole
//! - [x] The shipped route files build and dispatch end to end

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use mqtt_gateway::bootstrap::context::AppContext;
use mqtt_gateway::bootstrap::queue::driver::QueueDriver;
use mqtt_gateway::bootstrap::queue::JobRegistry;
use mqtt_gateway::error::{DispatchError, RouteResult};
use mqtt_gateway::router::{
    load, Handler, MessageContext, Middleware, Next, Payload, QoS, RouteDef, RouteFile, Router,
};
use mqtt_gateway::session::client::{NullPublisher, Publisher};

use super::support::{test_context, MemoryDriver, RecordingPublisher};

fn publisher() -> Arc<dyn Publisher> {
    Arc::new(NullPublisher)
}

fn context() -> AppContext {
    test_context(MemoryDriver::new(), JobRegistry::new())
}

/// Returns its marker plus the captured params.
struct Echo(&'static str);

#[async_trait]
impl Handler for Echo {
    async fn handle(&self, ctx: &mut MessageContext) -> anyhow::Result<Value> {
        Ok(json!({ "marker": self.0, "params": ctx.params.clone() }))
    }
}

/// Appends its tag to the `tags` extension before advancing.
struct Tag(&'static str);

#[async_trait]
impl Middleware for Tag {
    async fn handle(
        &self,
        ctx: &mut MessageContext,
        next: Next<'_>,
    ) -> Result<Value, DispatchError> {
        let mut tags = ctx
            .extension("tags")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        tags.push(json!(self.0));
        ctx.set_extension("tags", Value::Array(tags));
        next.run(ctx).await
    }
}

/// Returns the accumulated tags.
struct EchoTags;

#[async_trait]
impl Handler for EchoTags {
    async fn handle(&self, ctx: &mut MessageContext) -> anyhow::Result<Value> {
        Ok(ctx.extension("tags").cloned().unwrap_or(json!([])))
    }
}

#[tokio::test]
async fn first_matching_route_wins() {
    let mut router = Router::new();
    router.on("a/{x}", Echo("first")).unwrap();
    router.on("a/{y}/z", Echo("second")).unwrap();

    let result = router
        .dispatch("a/1", Payload::Raw(Vec::new()), publisher())
        .await
        .unwrap();
    assert_eq!(result["marker"], "first");
    assert_eq!(result["params"]["x"], "1");

    let result = router
        .dispatch("a/1/z", Payload::Raw(Vec::new()), publisher())
        .await
        .unwrap();
    assert_eq!(result["marker"], "second");
    assert_eq!(result["params"]["y"], "1");
}

#[tokio::test]
async fn unmatched_topic_is_no_route() {
    let mut router = Router::new();
    router.on("a/{x}", Echo("only")).unwrap();

    let err = router
        .dispatch("b/1", Payload::Raw(Vec::new()), publisher())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::NoRoute(topic) if topic == "b/1"));
}

#[tokio::test]
async fn group_composes_prefix_and_middleware() {
    let mut router = Router::new();
    {
        let mut api = router.group("api/v1").middleware(Tag("auth"));
        api.register(RouteDef::new("users/{id}", EchoTags).middleware(Tag("log")))
            .unwrap();
    }

    let route = &router.routes()[0];
    assert_eq!(route.pattern(), "api/v1/users/{id}");
    assert_eq!(route.filter(), "api/v1/users/+");

    let result = router
        .dispatch("api/v1/users/7", Payload::Raw(Vec::new()), publisher())
        .await
        .unwrap();
    assert_eq!(result, json!(["auth", "log"]));
}

#[tokio::test]
async fn nested_groups_compose_outermost_first() {
    let mut router = Router::new();
    {
        let mut api = router.group("api").middleware(Tag("outer"));
        let mut inner = api.group("v2");
        inner
            .register(RouteDef::new("ping", EchoTags).middleware(Tag("inner")))
            .unwrap();
    }

    assert_eq!(router.routes()[0].pattern(), "api/v2/ping");

    let result = router
        .dispatch("api/v2/ping", Payload::Raw(Vec::new()), publisher())
        .await
        .unwrap();
    assert_eq!(result, json!(["outer", "inner"]));
}

#[tokio::test]
async fn empty_group_prefix_concatenates_to_nothing() {
    let mut router = Router::new();
    router.group("").on("bare/{x}", Echo("bare")).unwrap();

    assert_eq!(router.routes()[0].pattern(), "bare/{x}");
}

#[test]
fn worker_counts_aggregate_over_shared_routes() {
    let mut router = Router::new();
    router
        .register(RouteDef::new("a/{x}", EchoTags).shared(3))
        .unwrap();
    router
        .register(RouteDef::new("b/{x}", EchoTags).shared(2))
        .unwrap();
    router.on("c/{x}", EchoTags).unwrap();

    assert_eq!(router.total_worker_count(), 5);
    assert_eq!(router.shared_routes().count(), 2);
    assert_eq!(router.standard_routes().count(), 1);
}

#[test]
fn shared_worker_count_is_clamped_to_one() {
    let mut router = Router::new();
    router
        .register(RouteDef::new("a/{x}", EchoTags).shared(0))
        .unwrap();
    assert_eq!(router.routes()[0].workers(), 1);
}

fn register_good(_app: &AppContext, router: &mut Router) -> RouteResult<()> {
    router.on("good/{id}", Echo("good"))
}

fn register_broken(_app: &AppContext, router: &mut Router) -> RouteResult<()> {
    router.on("fine/before", Echo("partial"))?;
    router.on("broken/{", Echo("never"))
}

#[tokio::test]
async fn loader_skips_broken_files_whole() {
    let app = context();
    let router = load(
        &app,
        &[
            RouteFile {
                name: "broken",
                register: register_broken,
            },
            RouteFile {
                name: "good",
                register: register_good,
            },
        ],
    );

    // Only the healthy file's routes survive; the broken file's earlier
    // registrations are discarded with it.
    assert_eq!(router.routes().len(), 1);
    assert!(router.match_topic("good/1").is_some());
    assert!(router.match_topic("fine/before").is_none());
}

fn register_a(_app: &AppContext, router: &mut Router) -> RouteResult<()> {
    router.on("same/{v}", Echo("from-a"))
}

fn register_b(_app: &AppContext, router: &mut Router) -> RouteResult<()> {
    router.on("same/{v}", Echo("from-b"))
}

#[tokio::test]
async fn loader_merges_in_alphabetical_order() {
    let app = context();
    // Listed out of order on purpose.
    let router = load(
        &app,
        &[
            RouteFile {
                name: "b_routes",
                register: register_b,
            },
            RouteFile {
                name: "a_routes",
                register: register_a,
            },
        ],
    );

    let result = router
        .dispatch("same/x", Payload::Raw(Vec::new()), publisher())
        .await
        .unwrap();
    assert_eq!(result["marker"], "from-a");
}

#[tokio::test]
async fn shipped_route_files_build_and_dispatch() {
    let driver = MemoryDriver::new();
    let app = test_context(driver.clone(), mqtt_gateway::app::jobs::registry());
    let router = mqtt_gateway::build_router(&app);

    // The telemetry route is shared; devices routes belong to the main session.
    assert_eq!(router.total_worker_count(), 4);
    assert!(router
        .standard_routes()
        .any(|r| r.filter() == "devices/+/status" && r.qos() == QoS::AtLeastOnce));

    let recording = RecordingPublisher::new();
    let publisher: Arc<dyn Publisher> = recording.clone();

    let result = router
        .dispatch(
            "devices/d-9/status",
            Payload::decode(br#"{"online": true, "battery": 0.5}"#),
            publisher,
        )
        .await
        .unwrap();
    assert_eq!(result["device_id"], "d-9");

    // The handler acked over MQTT and deferred the heartbeat to the queue.
    let published = recording.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "devices/d-9/status/ack");
    assert_eq!(driver.size("default").await.unwrap(), 1);
}
