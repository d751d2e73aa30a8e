//! robots.txt parsing and handling

use robotstxt::DefaultMatcher;
use tracing::debug;

/// Parsed robots.txt rules
#[derive(Debug, Clone)]
pub struct RobotsRules {
    content: String,
}

impl RobotsRules {
    /// Parse robots.txt content
    pub fn parse(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Create rules that allow everything
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Check if a path is allowed for a user agent
    pub fn is_allowed(&self, path: &str, user_agent: &str) -> bool {
        if self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        let allowed = matcher.one_agent_allowed_by_robots(&self.content, user_agent, path);

        if !allowed {
            debug!("robots.txt disallows {} for {}", path, user_agent);
        }

        allowed
    }

    /// Get the crawl delay in seconds for a user agent.
    ///
    /// A block naming the agent takes precedence over a `*` block,
    /// regardless of the order they appear in.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let ua_lower = user_agent.to_lowercase();
        let mut agent_delay = None;
        let mut wildcard_delay = None;
        // Some(true) = block names this agent, Some(false) = wildcard block
        let mut block: Option<bool> = None;

        for line in self.content.lines() {
            let line = line.trim();

            if line.starts_with("User-agent:") {
                let agent = line.trim_start_matches("User-agent:").trim().to_lowercase();
                block = if agent == "*" {
                    Some(false)
                } else if ua_lower.contains(&agent) {
                    Some(true)
                } else {
                    None
                };
            } else if let Some(delay_str) = line.strip_prefix("Crawl-delay:") {
                if let Ok(delay) = delay_str.trim().parse::<f64>() {
                    match block {
                        Some(true) => agent_delay = agent_delay.or(Some(delay)),
                        Some(false) => wildcard_delay = wildcard_delay.or(Some(delay)),
                        None => {}
                    }
                }
            }
        }

        agent_delay.or(wildcard_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robots_allow_all() {
        let rules = RobotsRules::allow_all();
        assert!(rules.is_allowed("/any/path", "MyBot"));
    }

    #[test]
    fn test_robots_basic() {
        let content = r#"
User-agent: *
Disallow: /admin/
Disallow: /private/

User-agent: BadBot
Disallow: /
"#;
        let rules = RobotsRules::parse(content);

        assert!(rules.is_allowed("/public/page", "GoodBot"));
        assert!(!rules.is_allowed("/admin/secret", "GoodBot"));
        assert!(!rules.is_allowed("/anything", "BadBot"));
    }

    #[test]
    fn test_crawl_delay() {
        let content = r#"
User-agent: *
Crawl-delay: 2.5

User-agent: SpecialBot
Crawl-delay: 1.0
"#;
        let rules = RobotsRules::parse(content);

        // The bot's own block wins even when the wildcard comes first
        assert_eq!(rules.crawl_delay("SpecialBot"), Some(1.0));
        assert_eq!(rules.crawl_delay("RandomBot"), Some(2.5));
    }

    #[test]
    fn test_crawl_delay_wildcard_only() {
        let rules = RobotsRules::parse("User-agent: *\nCrawl-delay: 3\n");
        assert_eq!(rules.crawl_delay("AnyBot"), Some(3.0));

        let no_delay = RobotsRules::parse("User-agent: *\nDisallow: /admin/\n");
        assert_eq!(no_delay.crawl_delay("AnyBot"), None);
    }
}
