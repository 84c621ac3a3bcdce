//! Free-text rule table parsing.
//!
//! Rule maps are configured as newline-delimited `pattern:tag` text.
//! Parsing is deliberately best-effort: malformed lines are skipped,
//! never reported as errors, so a half-edited config cannot break a run.

/// A single substring-match rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Substring to look for.
    pub pattern: String,
    /// Tag applied when the pattern matches.
    pub tag: String,
}

/// An ordered list of rules. First match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Parse a rule table from free text, one `pattern:tag` per line.
    ///
    /// Lines are split on the first `:` and both sides trimmed; a line
    /// is kept only if both sides are non-blank afterwards. Text equal
    /// to `placeholder` (the untouched prompt text shown in config
    /// examples) yields an empty table.
    pub fn parse(text: &str, placeholder: &str) -> Self {
        if text.trim().is_empty() || text.trim() == placeholder {
            return Self::default();
        }

        let rules = text
            .lines()
            .filter_map(|line| {
                let (pattern, tag) = line.split_once(':')?;
                let pattern = pattern.trim();
                let tag = tag.trim();
                if pattern.is_empty() || tag.is_empty() {
                    return None;
                }
                Some(Rule {
                    pattern: pattern.to_string(),
                    tag: tag.to_string(),
                })
            })
            .collect();

        Self { rules }
    }

    /// Find the tag of the first rule whose pattern occurs in `haystack`.
    pub fn first_match(&self, haystack: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| haystack.contains(&rule.pattern))
            .map(|rule| rule.tag.as_str())
    }

    /// Number of parsed rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no rules are configured.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let table = RuleTable::parse("tracker.foo.org:FooSite\n/mnt/keep:keep", "");
        assert_eq!(table.len(), 2);
        assert_eq!(table.first_match("http://tracker.foo.org/announce"), Some("FooSite"));
        assert_eq!(table.first_match("/mnt/keep/movies"), Some("keep"));
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let table = RuleTable::parse("justtext\n:value\nkey:\nvalid:tag", "");
        assert_eq!(table.len(), 1);
        assert_eq!(table.first_match("valid stuff"), Some("tag"));
    }

    #[test]
    fn test_parse_placeholder_is_empty() {
        let table = RuleTable::parse("tracker url:site tag", "tracker url:site tag");
        assert!(table.is_empty());
    }

    #[test]
    fn test_parse_blank_text_is_empty() {
        assert!(RuleTable::parse("", "x").is_empty());
        assert!(RuleTable::parse("   \n  ", "x").is_empty());
    }

    #[test]
    fn test_parse_trims_both_sides() {
        let table = RuleTable::parse("  tracker.a.net  :  SiteA  ", "");
        assert_eq!(table.first_match("udp://tracker.a.net:6969"), Some("SiteA"));
    }

    #[test]
    fn test_split_on_first_colon_only() {
        // Value side may itself contain colons (e.g. a tag with a colon).
        let table = RuleTable::parse("http://tracker.b.io:SiteB:extra", "");
        assert_eq!(table.len(), 1);
        let rule = table.iter().next().unwrap();
        assert_eq!(rule.pattern, "http");
        assert_eq!(rule.tag, "//tracker.b.io:SiteB:extra");
    }

    #[test]
    fn test_first_match_wins() {
        let table = RuleTable::parse("A:t1\nAB:t2", "");
        assert_eq!(table.first_match("xxABxx"), Some("t1"));
    }

    #[test]
    fn test_no_match() {
        let table = RuleTable::parse("a:b", "");
        assert_eq!(table.first_match("zzz"), None);
    }

    #[test]
    fn test_duplicate_patterns_keep_first_priority() {
        let table = RuleTable::parse("dup:first\ndup:second", "");
        assert_eq!(table.len(), 2);
        assert_eq!(table.first_match("dup"), Some("first"));
    }
}
