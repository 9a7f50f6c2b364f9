use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use pretty_assertions::assert_eq;
use scrape_core::{
    PageResponse, Pagination, Phase, ProceedPaths, QueryPair, QueryRequest, RenderPass,
    ScrapeError, ScrapeOptions, TransportError, TransportErrorKind, Variables,
};
use scrape_engine::{
    DiscardSink, ExecutorSettings, QueryExecutor, ReqwestExecutor, ScrapeEvent, Scraper,
    ViewSink,
};
use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(scrape_logging::initialize_for_tests);
}

/// In-memory paginated backend honouring `skip`/`first`, optionally failing one page.
struct MemoryExecutor {
    backing: Vec<Value>,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl MemoryExecutor {
    fn new(backing: Vec<Value>) -> Self {
        Self {
            backing,
            calls: AtomicUsize::new(0),
            fail_on_call: None,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn execute(&self, request: &QueryRequest) -> Result<PageResponse, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_call == Some(call) {
            return Err(TransportError::new(TransportErrorKind::Network, "reset"));
        }
        Ok(slice_page(&self.backing, &request.variables))
    }
}

fn slice_page(backing: &[Value], variables: &Variables) -> PageResponse {
    let skip = variables.get("skip").and_then(Value::as_u64).unwrap_or(0) as usize;
    let first = variables.get("first").and_then(Value::as_u64).unwrap_or(100) as usize;
    let items: Vec<Value> = backing.iter().skip(skip).take(first).cloned().collect();
    PageResponse::new(
        json!({"items": items, "count": backing.len()})
            .as_object()
            .cloned()
            .unwrap(),
    )
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<ScrapeEvent>>,
}

impl ViewSink for RecordingSink {
    fn emit(&self, event: ScrapeEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn query(page_size: usize) -> QueryPair {
    QueryPair::same("{ items { id } }", page_size, Pagination::default())
        .unwrap()
        .with_page_size_variable("first")
}

fn scraper(executor: Arc<dyn QueryExecutor>, page_size: usize, options: ScrapeOptions) -> Scraper {
    Scraper::new(
        executor,
        query(page_size),
        ProceedPaths::resolve(["items"]).unwrap(),
        options,
    )
}

fn backing(len: usize) -> Vec<Value> {
    (0..len).map(|i| json!({ "id": format!("0x{i:x}") })).collect()
}

#[tokio::test]
async fn collects_every_page_in_backing_order() {
    init_logging();
    for (len, page_size) in [(0, 4), (3, 2), (8, 4), (25, 10)] {
        let executor = Arc::new(MemoryExecutor::new(backing(len)));
        let scraper = scraper(executor.clone(), page_size, ScrapeOptions::default());

        let data = scraper.collect(Variables::new()).await.expect("collect");

        assert_eq!(data.items("items"), backing(len).as_slice());
        assert_eq!(data.get("count"), Some(&json!(len)));
        let expected = len / page_size + 1;
        assert_eq!(executor.calls(), expected, "len={len} page_size={page_size}");
    }
}

#[tokio::test]
async fn publishes_loading_views_until_complete() {
    init_logging();
    let executor = Arc::new(MemoryExecutor::new(backing(3)));
    let sink = RecordingSink::default();

    let view = scraper(executor, 2, ScrapeOptions::default())
        .run(Variables::new(), RenderPass::Interactive, &sink)
        .await;
    assert_eq!(view.phase, Phase::Complete);

    let events = sink.events.into_inner().unwrap();
    let requested: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            ScrapeEvent::Requested { page, .. } => Some(*page),
            _ => None,
        })
        .collect();
    assert_eq!(requested, vec![0, 1]);

    let loading: Vec<(bool, usize)> = events
        .iter()
        .filter_map(|event| match event {
            ScrapeEvent::ViewChanged(view) => Some((view.loading, view.data.items("items").len())),
            _ => None,
        })
        .collect();
    assert_eq!(loading, vec![(true, 0), (true, 2), (false, 3)]);
}

#[tokio::test]
async fn failure_midway_exposes_partial_data() {
    init_logging();
    let executor = Arc::new(MemoryExecutor {
        fail_on_call: Some(1),
        ..MemoryExecutor::new(backing(5))
    });

    let view = scraper(executor.clone(), 2, ScrapeOptions::default())
        .run(Variables::new(), RenderPass::Interactive, &DiscardSink)
        .await;

    assert_eq!(executor.calls(), 2);
    assert_eq!(view.phase, Phase::Errored);
    assert!(!view.loading);
    assert_eq!(view.data.items("items"), &backing(5)[..2]);
    assert!(matches!(view.error, Some(ScrapeError::Transport(_))));

    let err = scraper(
        Arc::new(MemoryExecutor {
            fail_on_call: Some(0),
            ..MemoryExecutor::new(backing(1))
        }),
        2,
        ScrapeOptions::default(),
    )
    .collect(Variables::new())
    .await
    .unwrap_err();
    assert!(matches!(err, ScrapeError::Transport(_)));
}

#[tokio::test]
async fn ssr_disabled_pre_render_makes_no_calls() {
    init_logging();
    let executor = Arc::new(MemoryExecutor::new(backing(3)));
    let scraper = scraper(executor.clone(), 2, ScrapeOptions { ssr: false });

    let view = scraper
        .run(Variables::new(), RenderPass::NonInteractive, &DiscardSink)
        .await;
    assert_eq!(executor.calls(), 0);
    assert!(view.loading);
    assert!(view.data.is_empty());

    let view = scraper
        .run(Variables::new(), RenderPass::Interactive, &DiscardSink)
        .await;
    assert_eq!(executor.calls(), 2);
    assert_eq!(view.data.items("items").len(), 3);
}

/// Serves pages of a backing list over HTTP according to the posted variables.
struct PagedGraphQl {
    backing: Vec<Value>,
}

impl Respond for PagedGraphQl {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let variables = body["variables"].as_object().cloned().unwrap_or_default();
        let page = slice_page(&self.backing, &variables);
        ResponseTemplate::new(200).set_body_json(json!({ "data": page }))
    }
}

#[tokio::test]
async fn scrapes_http_endpoint_to_completion() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(PagedGraphQl {
            backing: backing(5),
        })
        .mount(&server)
        .await;

    let executor = Arc::new(
        ReqwestExecutor::new(ExecutorSettings::for_endpoint(server.uri())).unwrap(),
    );
    let data = scraper(executor, 2, ScrapeOptions::default())
        .collect(Variables::new())
        .await
        .expect("collect");

    assert_eq!(data.items("items"), backing(5).as_slice());

    let received = server.received_requests().await.unwrap();
    let skips: Vec<Value> = received
        .iter()
        .map(|request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            body["variables"]["skip"].clone()
        })
        .collect();
    assert_eq!(skips, vec![Value::Null, json!(2), json!(4)]);
}
