// tests/providers_json.rs
mod common;

use std::collections::BTreeMap;

use chrono::{Duration, TimeZone, Utc};
use common::{json_fixture, FakeHttp};
use jobfeed_relay::ingest::http::{ClientProfile, HttpResponse};
use jobfeed_relay::ingest::providers::rapid_jobs::{RapidJobs, RapidJobsConfig};
use jobfeed_relay::ingest::providers::remoteok::{RemoteOk, RemoteOkConfig};
use jobfeed_relay::ingest::providers::working_nomads::{WorkingNomads, WorkingNomadsConfig};
use jobfeed_relay::Watermark;

const REMOTEOK_URL: &str = "https://remoteok.test/api";
const WN_URL: &str = "https://workingnomads.test/api/exposed_jobs/";
const RAPID_URL: &str = "https://jobs-api.test/list";

#[tokio::test]
async fn remoteok_fixture_normalizes_and_renders() {
    let http = FakeHttp::routes(vec![(REMOTEOK_URL, json_fixture("remoteok.json"))]);
    let cfg = RemoteOkConfig {
        url: REMOTEOK_URL.into(),
        keywords: None,
    };
    let src = RemoteOk::new(&cfg, http);

    let out = src.fetch(&Watermark::default()).await;
    assert!(out.is_clean());
    assert_eq!(out.postings.len(), 2);

    let p = &out.postings[0];
    assert_eq!(p.title, "Senior React Engineer");
    assert_eq!(p.link, "https://remoteok.test/l/1001");
    assert_eq!(p.metadata.salary.as_deref(), Some("90000–120000 USD"));
    assert_eq!(
        p.metadata.hashtags,
        vec!["#fr_react", "#fr_frontend", "#fr_javascript"]
    );

    let msg = src.render(p);
    assert!(msg.starts_with("📡 <b>Senior React Engineer</b>"));
    assert!(msg.contains("📍 Location: 🌍 Worldwide"));
    assert!(msg.contains("🏢 Company: Acme &amp; Sons"));
    assert!(msg.contains("📝 Description: Build React dashboards &amp; tooling."));
    assert!(msg.contains("💵 Estimated salary: 90000–120000 USD"));
    assert!(msg.ends_with("#fr_react #fr_frontend #fr_javascript"));

    // zero salaries count as absent; listing url is the fallback link
    let old = &out.postings[1];
    assert_eq!(old.metadata.salary, None);
    assert_eq!(old.link, "https://remoteok.test/remote-jobs/1000");
    assert!(src.render(old).contains("💵 Estimated salary: Not specified"));
}

#[tokio::test]
async fn remoteok_own_keywords_filter() {
    let http = FakeHttp::routes(vec![(REMOTEOK_URL, json_fixture("remoteok.json"))]);
    let cfg = RemoteOkConfig {
        url: REMOTEOK_URL.into(),
        keywords: Some(vec!["NUXT".into()]),
    };
    let out = RemoteOk::new(&cfg, http).fetch(&Watermark::default()).await;
    assert_eq!(out.postings.len(), 1);
    assert_eq!(out.postings[0].title, "Vue Developer");
}

#[tokio::test]
async fn remoteok_non_array_body_is_decode_error() {
    let http = FakeHttp::routes(vec![(REMOTEOK_URL, HttpResponse::ok(r#"{"error":"blocked"}"#))]);
    let cfg = RemoteOkConfig {
        url: REMOTEOK_URL.into(),
        keywords: None,
    };
    let out = RemoteOk::new(&cfg, http).fetch(&Watermark::default()).await;
    assert!(out.postings.is_empty());
    assert_eq!(out.errors[0].kind(), "decode");
}

#[tokio::test]
async fn working_nomads_uses_browser_profile() {
    let http = FakeHttp::routes(vec![(WN_URL, json_fixture("working_nomads.json"))]);
    let cfg = WorkingNomadsConfig {
        url: WN_URL.into(),
        keywords: None,
    };
    let src = WorkingNomads::new(&cfg, http.clone());

    let out = src.fetch(&Watermark::default()).await;

    assert_eq!(http.requests()[0].profile, ClientProfile::Browser);
    assert_eq!(out.postings.len(), 2);

    let vue = &out.postings[0];
    assert_eq!(vue.published_at, Utc.with_ymd_and_hms(2024, 1, 3, 13, 30, 0).unwrap());
    assert_eq!(vue.metadata.tags, vec!["vue", "javascript", "css"]);
    assert_eq!(vue.metadata.hashtags[0], "#fr_europe");

    let msg = src.render(vue);
    assert!(msg.starts_with("🌍 <b>Frontend Developer (Vue)</b>"));
    assert!(msg.contains("📍 Location: 🇪🇺 Europe"));
    assert!(msg.contains("🏢 Company: Nomad Labs"));

    // blank location still gets a line
    let go = src.render(&out.postings[1]);
    assert!(go.contains("📍 Location: Not specified"));
}

#[tokio::test]
async fn working_nomads_blocked_is_auth_error() {
    let http = FakeHttp::routes(vec![(WN_URL, HttpResponse::with_status(403, "Forbidden"))]);
    let cfg = WorkingNomadsConfig {
        url: WN_URL.into(),
        keywords: None,
    };
    let out = WorkingNomads::new(&cfg, http).fetch(&Watermark::default()).await;
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].kind(), "auth");
}

fn rapid_cfg() -> RapidJobsConfig {
    RapidJobsConfig {
        url: RAPID_URL.into(),
        api_key: Some("secret-key".into()),
        api_host: Some("jobs-api.test".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn rapid_jobs_sends_credentials_and_params() {
    let http = FakeHttp::routes(vec![(RAPID_URL, json_fixture("rapid_jobs.json"))]);
    let mut params = BTreeMap::new();
    params.insert("query".to_string(), "vue".to_string());
    let cfg = RapidJobsConfig {
        params,
        ..rapid_cfg()
    };
    RapidJobs::new(&cfg, http.clone())
        .fetch(&Watermark::default())
        .await;

    let req = &http.requests()[0];
    assert_eq!(req.header_value("X-RapidAPI-Key"), Some("secret-key"));
    assert_eq!(req.header_value("x-rapidapi-host"), Some("jobs-api.test"));
    assert_eq!(req.query_param("query"), Some("vue"));
    assert_eq!(req.query_param("remoteOnly"), Some("true"));
}

#[tokio::test]
async fn rapid_jobs_without_host_sends_no_credentials() {
    let http = FakeHttp::routes(vec![(RAPID_URL, json_fixture("rapid_jobs.json"))]);
    let cfg = RapidJobsConfig {
        api_host: None,
        ..rapid_cfg()
    };
    RapidJobs::new(&cfg, http.clone())
        .fetch(&Watermark::default())
        .await;
    assert_eq!(http.requests()[0].header_value("x-rapidapi-key"), None);
}

#[tokio::test]
async fn rapid_jobs_normalizes_relative_dates() {
    let http = FakeHttp::routes(vec![(RAPID_URL, json_fixture("rapid_jobs.json"))]);
    let src = RapidJobs::new(&rapid_cfg(), http);

    let before = Utc::now();
    let out = src.fetch(&Watermark::default()).await;
    let after = Utc::now();

    // the undated second job is dropped
    assert_eq!(out.postings.len(), 1);
    let p = &out.postings[0];
    // truncated to midnight UTC two days back
    let expected: Vec<_> = [before, after]
        .iter()
        .map(|t| (*t - Duration::days(2)).date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc())
        .collect();
    assert!(expected.contains(&p.published_at));
    assert_eq!(p.link, "https://jobs.test/rapid/1");

    let msg = src.render(p);
    assert!(msg.contains("📍 Location: 🇺🇸 USA"));
    assert!(msg.contains("💵 Salary: $100K - $130K"));
    assert!(msg.contains("📝 Description: Next.js, TypeScript and a lot of CSS."));
}

#[tokio::test]
async fn rapid_jobs_rejected_key_is_auth_error() {
    let http = FakeHttp::routes(vec![(RAPID_URL, HttpResponse::with_status(401, "Invalid API key"))]);
    let out = RapidJobs::new(&rapid_cfg(), http).fetch(&Watermark::default()).await;
    assert!(out.postings.is_empty());
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].kind(), "auth");
}

#[tokio::test]
async fn rapid_jobs_missing_jobs_is_decode_error() {
    let http = FakeHttp::routes(vec![(RAPID_URL, HttpResponse::ok(r#"{"message":"quota exceeded"}"#))]);
    let out = RapidJobs::new(&rapid_cfg(), http).fetch(&Watermark::default()).await;
    assert!(out.postings.is_empty());
    assert_eq!(out.errors[0].kind(), "decode");
}
