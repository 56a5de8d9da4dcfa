//! Chat command parsing.

/// Language used when a request names none
pub const DEFAULT_LANGUAGE: &str = "en";

/// A recognised bot command with its argument text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    News(Option<String>),
    Trending,
    Summary(Option<String>),
    Subscribe(Option<String>),
    Unsubscribe,
    Subscriptions,
    Recommend,
    CacheStats,
    ClearCache,
}

impl Command {
    /// Parses a message such as `/news@my_bot AI (de)`.
    ///
    /// Returns None for plain text and unknown commands. Arguments are
    /// whitespace-normalised; an empty argument list becomes None.
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or(head).to_lowercase();

        let args = words.collect::<Vec<_>>().join(" ");
        let arg = if args.is_empty() { None } else { Some(args) };

        let command = match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "news" => Command::News(arg),
            "trending" => Command::Trending,
            "summary" => Command::Summary(arg),
            "subscribe" => Command::Subscribe(arg),
            "unsubscribe" => Command::Unsubscribe,
            "subscriptions" => Command::Subscriptions,
            "recommend" => Command::Recommend,
            "cachestats" => Command::CacheStats,
            "clearcache" => Command::ClearCache,
            _ => return None,
        };
        Some(command)
    }
}

/// Commands advertised in the client's command menu
pub const COMMAND_DESCRIPTIONS: &[(&str, &str)] = &[
    ("start", "Start the bot"),
    ("help", "Show available commands"),
    ("news", "Get news on a topic"),
    ("trending", "Get trending news"),
    ("summary", "Get summarized news"),
    ("subscribe", "Subscribe to daily news"),
    ("unsubscribe", "Unsubscribe from news"),
    ("subscriptions", "View your subscriptions"),
    ("recommend", "Get recommended news"),
    ("cachestats", "Show cache statistics"),
    ("clearcache", "Drop expired cache entries"),
];

fn is_language_code(code: &str) -> bool {
    code.chars().count() == 2 && code.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Splits `"topic (xx)"` or `"topic.xx"` into topic and language code.
///
/// Anything else is the whole (trimmed) argument in the default language.
pub fn parse_topic_language(arg: &str) -> (String, String) {
    if let Some(rest) = arg.strip_suffix(')') {
        if let Some(idx) = rest.rfind('(') {
            let code = &rest[idx + 1..];
            if is_language_code(code) {
                return (rest[..idx].trim().to_string(), code.to_lowercase());
            }
        }
    }

    if let Some(idx) = arg.rfind('.') {
        let code = &arg[idx + 1..];
        if is_language_code(code) {
            return (arg[..idx].trim().to_string(), code.to_lowercase());
        }
    }

    (arg.trim().to_string(), DEFAULT_LANGUAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/trending"), Some(Command::Trending));
        assert_eq!(
            Command::parse("/news   artificial   intelligence "),
            Some(Command::News(Some("artificial intelligence".to_string())))
        );
        assert_eq!(Command::parse("/news"), Some(Command::News(None)));
        assert_eq!(Command::parse("/CacheStats"), Some(Command::CacheStats));
    }

    #[test]
    fn test_parse_strips_bot_mention() {
        assert_eq!(
            Command::parse("/subscribe@news_bot AI"),
            Some(Command::Subscribe(Some("AI".to_string())))
        );
    }

    #[test]
    fn test_parse_ignores_text_and_unknown() {
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("/weather Paris"), None);
    }

    #[test]
    fn test_topic_with_parenthesised_language() {
        assert_eq!(
            parse_topic_language("climate change (DE)"),
            ("climate change".to_string(), "de".to_string())
        );
        assert_eq!(
            parse_topic_language("технологии(ru)"),
            ("технологии".to_string(), "ru".to_string())
        );
    }

    #[test]
    fn test_topic_with_dot_language() {
        assert_eq!(
            parse_topic_language("AI.fr"),
            ("AI".to_string(), "fr".to_string())
        );
        assert_eq!(
            parse_topic_language("node.js.es"),
            ("node.js".to_string(), "es".to_string())
        );
    }

    #[test]
    fn test_topic_without_language() {
        assert_eq!(parse_topic_language(" AI "), ("AI".to_string(), "en".to_string()));
        assert_eq!(parse_topic_language("rust 1.8"), ("rust 1.8".to_string(), "en".to_string()));
        assert_eq!(parse_topic_language("AI (eng)"), ("AI (eng)".to_string(), "en".to_string()));
        assert_eq!(parse_topic_language("AI (en) "), ("AI (en)".to_string(), "en".to_string()));
    }
}
