// src/ingest/config.rs
use serde::Deserialize;

use crate::ingest::providers::headhunter::HeadHunterConfig;
use crate::ingest::providers::hiring_cafe::HiringCafeConfig;
use crate::ingest::providers::rapid_jobs::RapidJobsConfig;
use crate::ingest::providers::remoteok::RemoteOkConfig;
use crate::ingest::providers::rss::RssConfig;
use crate::ingest::providers::working_nomads::WorkingNomadsConfig;

/// `[sources.*]` tables. A missing table (or an empty endpoint) disables the source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub rss: Option<RssConfig>,
    pub remoteok: Option<RemoteOkConfig>,
    pub working_nomads: Option<WorkingNomadsConfig>,
    pub headhunter: Option<HeadHunterConfig>,
    pub hiring_cafe: Option<HiringCafeConfig>,
    pub rapid_jobs: Option<RapidJobsConfig>,
}

impl SourcesConfig {
    /// Number of sources with a usable endpoint.
    pub fn enabled_count(&self) -> usize {
        [
            self.rss.as_ref().is_some_and(|c| !c.feeds.is_empty()),
            self.remoteok.as_ref().is_some_and(|c| has_url(&c.url)),
            self.working_nomads.as_ref().is_some_and(|c| has_url(&c.url)),
            self.headhunter.as_ref().is_some_and(|c| has_url(&c.url)),
            self.hiring_cafe.as_ref().is_some_and(|c| has_url(&c.url)),
            self.rapid_jobs.as_ref().is_some_and(|c| has_url(&c.url)),
        ]
        .into_iter()
        .filter(|on| *on)
        .count()
    }
}

pub(crate) fn has_url(url: &str) -> bool {
    !url.trim().is_empty()
}

/// Split a comma-separated value, trimming and dropping empty entries.
/// Order is kept and duplicates removed.
pub fn split_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for it in raw.split(',') {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|x| x == t) {
            out.push(t.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_trims_and_dedups() {
        assert_eq!(
            split_list(" https://a.test/rss ,, https://b.test/rss,https://a.test/rss "),
            vec!["https://a.test/rss", "https://b.test/rss"]
        );
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn tables_parse_from_toml() {
        let s = r#"
            [rss]
            feeds = ["https://a.test/rss"]

            [headhunter]
            url = "https://api.hh.test/vacancies"
            text = "react"

            [hiring_cafe]
            url = ""
        "#;
        let cfg: SourcesConfig = toml::from_str(s).unwrap();
        assert!(cfg.rss.as_ref().unwrap().browser);
        let hh = cfg.headhunter.as_ref().unwrap();
        assert_eq!(hh.text, "react");
        assert_eq!(hh.per_page, 100);
        assert_eq!(cfg.enabled_count(), 2);
    }
}
