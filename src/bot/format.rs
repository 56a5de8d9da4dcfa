//! Reply text rendering (Telegram Markdown).

use crate::cache::{CacheStats, NewsArticle, RequestKind};

/// Prefix used for an article line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleStyle {
    /// 📰 topic news
    Headline,
    /// 🔥 trending news
    Trending,
}

impl ArticleStyle {
    fn icon(&self) -> &'static str {
        match self {
            ArticleStyle::Headline => "📰",
            ArticleStyle::Trending => "🔥",
        }
    }
}

/// One block per article, separated by blank lines
pub fn format_articles(articles: &[NewsArticle], style: ArticleStyle) -> String {
    articles
        .iter()
        .map(|a| format!("{} *{}*\n{}", style.icon(), a.title, a.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Summaries are preformatted; only joined here
pub fn format_summaries(summaries: &[String]) -> String {
    summaries.join("\n\n")
}

pub fn no_news_message(topic: &str, language: &str) -> String {
    format!("❌ No news for '{}' in language '{}'.", topic, language)
}

pub fn recommendation_message(topic: &str, articles: &[NewsArticle]) -> String {
    format!(
        "🔍 Based on your recent searches, you might like news on **{}**:\n\n{}",
        topic,
        format_articles(articles, ArticleStyle::Headline)
    )
}

pub fn cache_stats_message(stats: &CacheStats) -> String {
    let kinds = [RequestKind::News, RequestKind::Trending, RequestKind::Summary]
        .iter()
        .map(|kind| format!("  • {}: {}", kind, stats.count_for(*kind)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🗄 *Cache statistics*\n\
         Entries: {}/{}\n\
         TTL: {}s\n\
         {}\n\
         Hit rate: {:.0}% ({} hits, {} misses)",
        stats.total_entries,
        stats.capacity,
        stats.ttl.as_secs(),
        kinds,
        stats.metrics.hit_rate() * 100.0,
        stats.metrics.hits,
        stats.metrics.misses,
    )
}

pub const NEWS_USAGE: &str = "Use /news <topic> (optionally specify language as (en) or .en)";
pub const SUMMARY_USAGE: &str = "Use `/summary <topic>` to get a quick breakdown of news stories.";
pub const SUBSCRIBE_USAGE: &str = "❌ Please provide a topic! Example: `/subscribe AI`";
pub const NO_TRENDING: &str = "No trending news available at the moment.";
pub const NO_SUMMARIES: &str = "No news summaries available for this topic.";
pub const NOT_SUBSCRIBED: &str = "ℹ️ You are not subscribed to any news topics.";
pub const UNSUBSCRIBED: &str = "❌ You have unsubscribed from news updates.";
pub const NO_INTERESTS: &str = "ℹ️ You haven't searched for news yet. Try `/news AI` first!";
pub const NO_RECOMMENDATIONS: &str = "❌ No new articles for your preferred topic.";

pub fn subscribed_message(topic: &str) -> String {
    format!("✅ You have subscribed to daily news on **{}**.", topic)
}

pub fn subscription_message(topic: &str) -> String {
    format!("📌 You are subscribed to news on: **{}**", topic)
}

pub fn cache_cleared_message(removed: usize) -> String {
    format!("🧹 Removed {} expired cache entries.", removed)
}

/// Welcome text for /start
pub fn welcome_message() -> String {
    format!(
        "👋 *Welcome to the News Bot!*\n\n\
         I deliver fresh news on any topic, daily digests and trending headlines.\n\n\
         {}\n\n\
         🚀 Type any command to get started!",
        command_list()
    )
}

/// Command reference for /help
pub fn help_message() -> String {
    format!("ℹ️ *Available commands*\n\n{}", command_list())
}

fn command_list() -> &'static str {
    "👉 `/news <topic>` — Get the latest news on a topic, e.g. `/news AI (de)`.\n\
     👉 `/trending` — See the most popular headlines right now.\n\
     👉 `/summary <topic>` — Get short summaries of recent stories.\n\
     👉 `/subscribe <topic>` — Subscribe to daily news updates on a topic.\n\
     👉 `/unsubscribe` — Stop receiving daily news updates.\n\
     👉 `/subscriptions` — View your current news subscriptions.\n\
     👉 `/recommend` — Get news based on your recent searches.\n\
     👉 `/cachestats` — Show cache statistics.\n\
     👉 `/clearcache` — Drop expired cache entries."
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheMetrics;
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[test]
    fn test_format_articles() {
        let articles = vec![
            NewsArticle::new("One", "https://1"),
            NewsArticle::new("Two", "https://2"),
        ];
        assert_eq!(
            format_articles(&articles, ArticleStyle::Headline),
            "📰 *One*\nhttps://1\n\n📰 *Two*\nhttps://2"
        );
        assert!(format_articles(&articles, ArticleStyle::Trending).starts_with("🔥 *One*"));
        assert_eq!(format_articles(&[], ArticleStyle::Headline), "");
    }

    #[test]
    fn test_recommendation_message() {
        let text = recommendation_message("AI", &[NewsArticle::new("T", "https://t")]);
        assert!(text.contains("**AI**"));
        assert!(text.ends_with("📰 *T*\nhttps://t"));
    }

    #[test]
    fn test_cache_stats_message() {
        let mut counts = BTreeMap::new();
        counts.insert(RequestKind::News, 3);
        let stats = CacheStats {
            total_entries: 3,
            capacity: 100,
            ttl: Duration::from_secs(300),
            counts_by_kind: counts,
            metrics: CacheMetrics {
                hits: 1,
                misses: 3,
                ..Default::default()
            },
        };
        let text = cache_stats_message(&stats);
        assert!(text.contains("Entries: 3/100"));
        assert!(text.contains("TTL: 300s"));
        assert!(text.contains("news: 3"));
        assert!(text.contains("summary: 0"));
        assert!(text.contains("Hit rate: 25%"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = help_message();
        for (name, _) in crate::bot::commands::COMMAND_DESCRIPTIONS {
            if *name != "start" && *name != "help" {
                assert!(help.contains(&format!("/{}", name)), "missing /{}", name);
            }
        }
    }
}
