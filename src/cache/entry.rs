//! Cache entry and payload types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Kind of upstream request an entry answers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    News,
    Trending,
    Summary,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::News => "news",
            RequestKind::Trending => "trending",
            RequestKind::Summary => "summary",
        }
    }

    /// The empty payload of the shape this kind returns
    pub fn empty_payload(&self) -> CachePayload {
        match self {
            RequestKind::News | RequestKind::Trending => CachePayload::Articles(Vec::new()),
            RequestKind::Summary => CachePayload::Summaries(Vec::new()),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A headline with its link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
}

impl NewsArticle {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// The cached result. Stored and returned as-is, never inspected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CachePayload {
    /// Ordered (title, url) pairs
    Articles(Vec<NewsArticle>),

    /// Ordered preformatted summary strings
    Summaries(Vec<String>),
}

impl CachePayload {
    pub fn len(&self) -> usize {
        match self {
            CachePayload::Articles(a) => a.len(),
            CachePayload::Summaries(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the articles, or an empty list for a summary payload
    pub fn into_articles(self) -> Vec<NewsArticle> {
        match self {
            CachePayload::Articles(a) => a,
            CachePayload::Summaries(_) => Vec::new(),
        }
    }

    /// Returns the summaries, or an empty list for an article payload
    pub fn into_summaries(self) -> Vec<String> {
        match self {
            CachePayload::Summaries(s) => s,
            CachePayload::Articles(_) => Vec::new(),
        }
    }
}

impl From<Vec<NewsArticle>> for CachePayload {
    fn from(articles: Vec<NewsArticle>) -> Self {
        CachePayload::Articles(articles)
    }
}

impl From<Vec<String>> for CachePayload {
    fn from(summaries: Vec<String>) -> Self {
        CachePayload::Summaries(summaries)
    }
}

/// One cached upstream response.
///
/// The key lives in the enclosing [`CacheTable`]; `created_at` is the only
/// recency signal and is never refreshed by reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    /// The cached value
    #[serde(rename = "data")]
    pub payload: CachePayload,

    /// When the entry was written
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// Request kind, kept for reporting
    #[serde(rename = "request_type")]
    pub request_kind: RequestKind,

    /// Echoed request topic
    pub topic: String,

    /// Echoed request language
    pub language: String,
}

impl CacheEntry {
    /// Creates a new cache entry
    pub fn new(
        payload: CachePayload,
        created_at: DateTime<Utc>,
        request_kind: RequestKind,
        topic: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            payload,
            created_at,
            request_kind,
            topic: topic.into(),
            language: language.into(),
        }
    }

    /// Returns the age of this entry at `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }
}

/// Key → entry mapping. Ordered so enumeration is deterministic.
pub type CacheTable = BTreeMap<String, CacheEntry>;
