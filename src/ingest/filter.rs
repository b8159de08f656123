// src/ingest/filter.rs
use crate::ingest::types::Posting;

/// Case-insensitive keyword filter. An empty list matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keywords(Vec<String>);

impl Keywords {
    pub fn new<S: AsRef<str>>(words: &[S]) -> Self {
        Self(
            words
                .iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        )
    }

    /// Comma-separated list, e.g. `"react, vue,,frontend"`.
    pub fn parse(raw: &str) -> Self {
        Self::new(&raw.split(',').collect::<Vec<_>>())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn matches(&self, posting: &Posting) -> bool {
        if self.0.is_empty() {
            return true;
        }
        let haystack = posting.search_text();
        self.0.iter().any(|kw| haystack.contains(kw.as_str()))
    }
}

/// Workplace type mentions "remote". Postings without a workplace field are rejected.
pub fn is_remote(posting: &Posting) -> bool {
    posting
        .metadata
        .workplace
        .as_deref()
        .map(|w| w.to_lowercase().contains("remote"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{Metadata, SourceKind};
    use chrono::{TimeZone, Utc};

    fn posting(title: &str, description: &str, tags: &[&str]) -> Posting {
        Posting::new(
            SourceKind::RemoteOk,
            Some(title.into()),
            Some("https://x.test/1".into()),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            Metadata {
                description: description.into(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn empty_list_matches_all() {
        assert!(Keywords::default().matches(&posting("Accountant", "", &[])));
        assert!(Keywords::parse(" , ,").is_empty());
    }

    #[test]
    fn matching_is_case_insensitive_over_all_fields() {
        let kw = Keywords::parse("REACT, Vue");
        assert!(kw.matches(&posting("Frontend dev", "We use React daily", &[])));
        assert!(kw.matches(&posting("Frontend dev", "", &["vue"])));
        assert!(kw.matches(&posting("Senior VUE engineer", "", &[])));
    }

    #[test]
    fn no_keyword_present_is_excluded() {
        let kw = Keywords::parse("react");
        assert!(!kw.matches(&posting("Backend dev", "Go and Postgres", &["golang"])));
    }

    #[test]
    fn remote_filter_checks_workplace() {
        let mut p = posting("Dev", "", &[]);
        assert!(!is_remote(&p));
        p.metadata.workplace = Some("Remote".into());
        assert!(is_remote(&p));
        p.metadata.workplace = Some("Onsite".into());
        assert!(!is_remote(&p));
    }
}
