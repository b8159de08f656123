// src/ingest/providers/rss.rs
//! RSS 2.0 job feeds. Each feed is fetched and parsed independently; a
//! failing feed is recorded and the next one is tried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::{RelayError, Result};
use crate::ingest::filter::Keywords;
use crate::ingest::http::{fetch_text, ClientProfile, HttpFetch, HttpRequest};
use crate::ingest::paginate::select_fresh;
use crate::ingest::providers::publish_time;
use crate::ingest::render::MessageBuilder;
use crate::ingest::types::{FetchOutcome, Metadata, Posting, SourceKind};
use crate::text;
use crate::watermark::Watermark;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RssConfig {
    pub feeds: Vec<String>,
    pub keywords: Option<Vec<String>>,
    /// Fetch with the browser profile (user agent + redirects).
    pub browser: bool,
}

impl Default for RssConfig {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            keywords: None,
            browser: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

pub struct RssFeeds {
    feeds: Vec<String>,
    keywords: Keywords,
    profile: ClientProfile,
    http: Arc<dyn HttpFetch>,
}

impl RssFeeds {
    pub fn new(cfg: &RssConfig, http: Arc<dyn HttpFetch>) -> Self {
        Self {
            feeds: cfg.feeds.clone(),
            keywords: cfg
                .keywords
                .as_deref()
                .map(Keywords::new)
                .unwrap_or_default(),
            profile: if cfg.browser {
                ClientProfile::Browser
            } else {
                ClientProfile::Standard
            },
            http,
        }
    }

    pub fn with_keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = keywords;
        self
    }

    pub async fn fetch(&self, watermark: &Watermark) -> FetchOutcome {
        let mut out = FetchOutcome::default();
        let now = Utc::now();

        for feed in &self.feeds {
            let req = HttpRequest::get(feed)
                .header("Accept", "application/rss+xml, application/xml;q=0.9, */*;q=0.8")
                .profile(self.profile);
            let parsed = match fetch_text(self.http.as_ref(), &req).await {
                Ok(body) => parse_feed(feed, &body, now),
                Err(e) => Err(e),
            };
            match parsed {
                Ok(postings) => {
                    tracing::debug!(source = "rss", feed = %feed, items = postings.len(), "feed parsed");
                    out.postings.extend(select_fresh(postings, watermark, |p| {
                        self.keywords.matches(p)
                    }));
                }
                Err(e) => {
                    tracing::warn!(source = "rss", feed = %feed, error = %e, "feed failed, continuing with next feed");
                    out.errors.push(e);
                }
            }
        }
        out
    }

    pub fn render(&self, p: &Posting) -> String {
        MessageBuilder::headline("📰", &p.title)
            .line("📅", "Published", &text::display_date(&p.published_at))
            .line(
                "📝",
                "Description",
                &text::description_preview(&p.metadata.description),
            )
            .apply_link(&p.link)
            .finish()
    }
}

fn parse_feed(feed: &str, body: &str, now: DateTime<Utc>) -> Result<Vec<Posting>> {
    let xml_clean = scrub_html_entities_for_xml(body);
    let rss: Rss = from_str(&xml_clean).map_err(|e| RelayError::decode(feed, e))?;

    Ok(rss
        .channel
        .item
        .into_iter()
        .filter_map(|it| {
            let published_at = publish_time(
                SourceKind::Rss,
                it.title.as_deref(),
                it.pub_date.as_deref(),
                now,
            )?;
            let metadata = Metadata {
                description: text::clean_description(it.description.as_deref().unwrap_or_default()),
                ..Default::default()
            };
            Some(Posting::new(SourceKind::Rss, it.title, it.link, published_at, metadata))
        })
        .collect())
}

// XML only knows five named entities; feeds routinely use HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
