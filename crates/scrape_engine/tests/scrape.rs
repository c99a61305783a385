use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use scrape_core::Extractor;
use scrape_engine::{
    scrape, CancellationToken, ChannelProgressSink, EngineError, FetchMetadata, FetchOutput,
    Fetcher, Kind, ScrapeError, ScrapeSettings, Scraper, SettingsError, Stage,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Answers every URL with a valid body for its kind after `delay`, tracking
/// total calls and the peak number of concurrent calls.
#[derive(Default)]
struct InstrumentedFetcher {
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl InstrumentedFetcher {
    fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for InstrumentedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let (body, content_type) = if url.ends_with(".json") {
            (format!(r#"{{"title":"{url}"}}"#), "application/json")
        } else {
            (
                format!(r#"<html><body><h1 class="product-title">{url}</h1></body></html>"#),
                "text/html",
            )
        };
        let bytes = body.into_bytes();
        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                content_type: Some(content_type.to_string()),
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

fn settings(rate: f64, burst: u32, workers: usize) -> ScrapeSettings {
    ScrapeSettings {
        rate,
        burst,
        workers,
        ..ScrapeSettings::default()
    }
}

fn urls(count: usize, suffix: &str) -> Vec<String> {
    (0..count)
        .map(|i| format!("http://mock.local/item-{i}{suffix}"))
        .collect()
}

#[tokio::test]
async fn scrapes_json_and_html_over_http() {
    scrape_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/entity-book-1.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"title": "X"}"#, "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/product-book.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head></head><body><h1 class="product-title">Product Title</h1></body></html>"#,
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plain.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html><body><p>none</p></body></html>", "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/untitled.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"name": "X"}"#, "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/garbled.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{oops", "application/json"))
        .mount(&server)
        .await;

    let json = format!("{}/entity-book-1.json", server.uri());
    let html = format!("{}/product-book.html", server.uri());
    let plain = format!("{}/plain.html", server.uri());
    let untitled = format!("{}/untitled.json", server.uri());
    let garbled = format!("{}/garbled.json", server.uri());

    let scraper = Scraper::new(settings(100.0, 10, 3)).unwrap();
    let results = scraper
        .run(vec![&json, &html, &plain, &untitled, &garbled])
        .await;

    assert_eq!(results.len(), 5);
    assert_eq!(results.get(&json), Some(&Ok("X".to_string())));
    assert_eq!(results.get(&html), Some(&Ok("Product Title".to_string())));
    assert_eq!(results.get(&plain), Some(&Ok(String::new())));
    assert_eq!(results.get(&untitled), Some(&Err(ScrapeError::FieldNotFound)));
    assert!(matches!(
        results.get(&garbled),
        Some(Err(ScrapeError::Decode { .. }))
    ));
}

#[tokio::test]
async fn non_success_status_is_recorded_regardless_of_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.json"))
        .respond_with(ResponseTemplate::new(400).set_body_raw(r#"{"title": "Test Title"}"#, "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/error.html"))
        .respond_with(ResponseTemplate::new(500).set_body_raw(
            r#"<h1 class="product-title">Product Title</h1>"#,
            "text/html",
        ))
        .mount(&server)
        .await;

    let gone = format!("{}/gone.json", server.uri());
    let error = format!("{}/error.html", server.uri());
    let results = Scraper::new(settings(100.0, 10, 2))
        .unwrap()
        .run(vec![gone.clone(), error.clone()])
        .await;

    assert_eq!(results.get(&gone), Some(&Err(ScrapeError::NonSuccessStatus(400))));
    assert_eq!(results.get(&error), Some(&Err(ScrapeError::NonSuccessStatus(500))));
}

#[tokio::test]
async fn unsupported_urls_never_reach_the_fetcher() {
    let fetcher = InstrumentedFetcher::with_delay(Duration::ZERO);
    let scraper = Scraper::with_fetcher(settings(100.0, 10, 2), fetcher.clone()).unwrap();

    let results = scraper
        .run(vec![
            "http://mock.local/feed.xml",
            "http://mock.local/page.html",
            "http://mock.local/readme",
        ])
        .await;

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(
        results.get("http://mock.local/feed.xml"),
        Some(&Err(ScrapeError::UnsupportedKind))
    );
    assert_eq!(
        results.get("http://mock.local/readme"),
        Some(&Err(ScrapeError::UnsupportedKind))
    );
    assert_eq!(
        results.title("http://mock.local/page.html"),
        Some("http://mock.local/page.html")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn never_exceeds_worker_count_in_flight() {
    let fetcher = InstrumentedFetcher::with_delay(Duration::from_millis(20));
    let scraper = Scraper::with_fetcher(settings(1000.0, 30, 3), fetcher.clone()).unwrap();

    let input = urls(30, ".json");
    let results = scraper.run(input.clone()).await;

    assert_eq!(results.len(), 30);
    assert_eq!(results.success_count(), 30);
    assert_eq!(fetcher.calls(), 30);
    assert!(fetcher.peak() <= 3, "peak in flight {}", fetcher.peak());
    assert!(fetcher.peak() >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn token_bucket_timing_holds_end_to_end() {
    // K = 7, B = 2, R = 20/s: at least (7 - 2) / 20 = 250ms.
    let fetcher = InstrumentedFetcher::with_delay(Duration::ZERO);
    let scraper = Scraper::with_fetcher(settings(20.0, 2, 4), fetcher.clone()).unwrap();

    let started = Instant::now();
    let results = scraper.run(urls(7, ".html")).await;
    let elapsed = started.elapsed();

    assert_eq!(results.success_count(), 7);
    assert!(elapsed >= Duration::from_millis(240), "too fast: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(600), "too slow: {elapsed:?}");
}

#[tokio::test]
async fn each_run_starts_with_a_full_bucket() {
    let fetcher = InstrumentedFetcher::with_delay(Duration::ZERO);
    let scraper = Scraper::with_fetcher(settings(1.0, 3, 3), fetcher.clone()).unwrap();

    for _ in 0..2 {
        let started = Instant::now();
        let results = scraper.run(urls(3, ".json")).await;
        assert_eq!(results.success_count(), 3);
        assert!(started.elapsed() < Duration::from_millis(500));
    }
    assert_eq!(fetcher.calls(), 6);
}

#[tokio::test]
async fn duplicate_urls_collapse_to_one_entry() {
    let fetcher = InstrumentedFetcher::with_delay(Duration::ZERO);
    let scraper = Scraper::with_fetcher(settings(100.0, 10, 3), fetcher.clone()).unwrap();

    let results = scraper
        .run(vec![
            "http://mock.local/a.json",
            "http://mock.local/a.json",
            "http://mock.local/b.html",
            "http://mock.local/a.json",
        ])
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(fetcher.calls(), 4);
    assert_eq!(
        results.title("http://mock.local/a.json"),
        Some("http://mock.local/a.json")
    );
}

#[tokio::test]
async fn empty_input_returns_empty_results() {
    let fetcher = InstrumentedFetcher::with_delay(Duration::ZERO);
    let scraper = Scraper::with_fetcher(settings(1.0, 1, 4), fetcher.clone()).unwrap();

    let started = Instant::now();
    let results = scraper.run(Vec::<String>::new()).await;

    assert!(results.is_empty());
    assert_eq!(fetcher.calls(), 0);
    assert!(started.elapsed() < Duration::from_millis(200));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancellation_records_cancelled_and_drains_queue() {
    scrape_logging::initialize_for_tests();
    let fetcher = InstrumentedFetcher::with_delay(Duration::ZERO);
    let cancel = CancellationToken::new();
    // One token up front, the next one only after a full second.
    let scraper = Scraper::with_fetcher(settings(1.0, 1, 2), fetcher.clone())
        .unwrap()
        .with_cancellation(cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let mut input = urls(5, ".json");
    input.push("http://mock.local/notes.txt".to_string());

    let started = Instant::now();
    let results = scraper.run(input).await;

    assert!(started.elapsed() < Duration::from_millis(900));
    assert_eq!(results.len(), 6);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(results.success_count(), 1);
    assert_eq!(
        results.get("http://mock.local/notes.txt"),
        Some(&Err(ScrapeError::UnsupportedKind))
    );
    let cancelled = results
        .iter()
        .filter(|(_, result)| **result == Err(ScrapeError::Cancelled))
        .count();
    assert_eq!(cancelled, 4);
}

#[tokio::test]
async fn cancelled_before_start_fetches_nothing() {
    let fetcher = InstrumentedFetcher::with_delay(Duration::ZERO);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let scraper = Scraper::with_fetcher(settings(100.0, 10, 2), fetcher.clone())
        .unwrap()
        .with_cancellation(cancel);

    let results = scraper.run(urls(3, ".html")).await;

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(results.len(), 3);
    assert!(results
        .iter()
        .all(|(_, result)| *result == Err(ScrapeError::Cancelled)));
}

#[tokio::test]
async fn cancellation_outlives_the_run_it_interrupted() {
    let fetcher = InstrumentedFetcher::with_delay(Duration::ZERO);
    let cancel = CancellationToken::new();
    let scraper = Scraper::with_fetcher(settings(100.0, 10, 2), fetcher.clone())
        .unwrap()
        .with_cancellation(cancel.clone());

    let first = scraper.run(urls(2, ".json")).await;
    assert_eq!(first.success_count(), 2);

    cancel.cancel();
    let second = scraper.run(urls(2, ".json")).await;
    assert_eq!(fetcher.calls(), 2);
    assert!(second
        .iter()
        .all(|(_, result)| *result == Err(ScrapeError::Cancelled)));
}

/// Reports the URL kind and body length instead of a title.
struct KindExtractor;

impl Extractor for KindExtractor {
    fn extract(
        &self,
        body: &[u8],
        kind: Kind,
        _content_type: Option<&str>,
    ) -> Result<String, ScrapeError> {
        match kind {
            Kind::Json => Ok(format!("json:{}", body.len())),
            Kind::Html => Err(ScrapeError::FieldNotFound),
            Kind::Unsupported => Err(ScrapeError::UnsupportedKind),
        }
    }
}

#[tokio::test]
async fn custom_extractor_replaces_title_lookup() {
    let fetcher = InstrumentedFetcher::with_delay(Duration::ZERO);
    let scraper = Scraper::with_fetcher(settings(100.0, 10, 3), fetcher.clone())
        .unwrap()
        .with_extractor(Arc::new(KindExtractor));
    assert_eq!(scraper.workers(), 3);

    let json = "http://mock.local/a.json";
    let html = "http://mock.local/b.html";
    let results = scraper.run(vec![json, html]).await;

    // InstrumentedFetcher answers `{"title":"<url>"}` for JSON URLs.
    let expected = format!("json:{}", json.len() + 12);
    assert_eq!(results.title(json), Some(expected.as_str()));
    assert_eq!(results.get(html), Some(&Err(ScrapeError::FieldNotFound)));
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn worker_walks_through_every_stage() {
    let (tx, rx) = mpsc::channel();
    let fetcher = InstrumentedFetcher::with_delay(Duration::ZERO);
    let scraper = Scraper::with_fetcher(settings(10.0, 1, 1), fetcher)
        .unwrap()
        .with_progress(Arc::new(ChannelProgressSink::new(tx)));

    scraper.run(vec!["http://mock.local/one.json"]).await;
    drop(scraper);

    let stages: Vec<Stage> = rx.try_iter().map(|event| event.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::Dequeuing,
            Stage::RateLimitWait,
            Stage::Fetching,
            Stage::Extracting,
            Stage::Recording,
            Stage::Idle,
            Stage::Dequeuing,
            Stage::Exited,
        ]
    );
}

#[test]
fn blocking_scrape_skips_network_for_unsupported_urls() {
    let results = scrape(vec!["ftp://mock.local/readme.txt", "notes"], 1.0, 1, 2).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results.failure_count(), 2);
    assert_eq!(results.get("notes"), Some(&Err(ScrapeError::UnsupportedKind)));
}

#[test]
fn blocking_scrape_fetches_over_http() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/entity-book-1.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"title":"My title"}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;
        server
    });

    let url = format!("{}/entity-book-1.json", server.uri());
    let results = scrape(vec![url.clone()], 1.0, 2, 1).unwrap();
    assert_eq!(results.title(&url), Some("My title"));

    runtime.block_on(server.verify());
}

#[test]
fn blocking_scrape_rejects_invalid_settings() {
    let err = scrape(Vec::<String>::new(), 1.0, 1, 0).unwrap_err();
    assert!(matches!(err, EngineError::Settings(SettingsError::ZeroWorkers)));

    let err = scrape(Vec::<String>::new(), 0.0, 1, 1).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Settings(SettingsError::InvalidRate(_))
    ));
}
