// tests/metrics.rs
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{dispatcher, json_fixture, FakeHttp, RecordingSink};
use jobfeed_relay::ingest::config::SourcesConfig;
use jobfeed_relay::ingest::filter::Keywords;
use jobfeed_relay::ingest::http::HttpResponse;
use jobfeed_relay::ingest::providers::remoteok::RemoteOkConfig;
use jobfeed_relay::ingest::providers::rss::RssConfig;
use jobfeed_relay::{Adapter, MemoryWatermarkStore, Runner};
use metrics_exporter_prometheus::PrometheusBuilder;

// Local recorder + current-thread runtime keeps the series isolated from other tests.
fn render_after_one_run() -> String {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let http = FakeHttp::routes(vec![
                ("https://remoteok.test/", json_fixture("remoteok.json")),
                ("https://feed.test/", HttpResponse::with_status(500, "boom")),
            ]);
            let sources = SourcesConfig {
                rss: Some(RssConfig {
                    feeds: vec!["https://feed.test/rss".into()],
                    ..Default::default()
                }),
                remoteok: Some(RemoteOkConfig {
                    url: "https://remoteok.test/api".into(),
                    keywords: None,
                }),
                ..Default::default()
            };
            let sink = RecordingSink::failing_on(&[1]);
            let (d, _clock) = dispatcher(sink, Duration::from_secs(1));
            let mut runner = Runner::new(
                Adapter::registry(&sources, &Keywords::default(), http),
                Arc::new(MemoryWatermarkStore::new()),
                d,
            );
            runner.run_once().await;
        });
    });

    handle.render()
}

#[test]
fn one_run_populates_every_series() {
    let text = render_after_one_run();

    for needle in [
        "relay_fetched_total",
        "relay_accepted_total",
        "relay_source_errors_total",
        "relay_dispatched_total",
        "relay_dispatch_errors_total",
        "relay_fetch_ms",
        "relay_last_run_ts",
    ] {
        assert!(text.contains(needle), "exposition missing '{needle}'\n{text}");
    }

    assert!(text.contains(r#"relay_fetched_total{source="remoteok"} 2"#), "{text}");
    assert!(text.contains(r#"relay_dispatched_total{source="remoteok"} 1"#), "{text}");
    assert!(text.contains(r#"relay_dispatch_errors_total{source="remoteok"} 1"#), "{text}");
    assert!(text.contains(r#"kind="transport""#), "{text}");
}
