//! Addressing detection: command prefixes and bot mentions.

/// How a message turned out to be addressed to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressedVia {
    Prefix,
    Mention,
}

/// A successful addressing match. `command_start` is the byte offset where
/// the command text begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixMatch {
    pub command_start: usize,
    pub via: AddressedVia,
}

/// Pure matcher over an immutable configuration snapshot.
///
/// Primary prefixes are matched case-insensitively; the longest configured
/// prefix wins, declaration order breaking ties. The mention token is checked
/// only when no string prefix matched. Sub-command prefixes are a separate,
/// case-sensitive namespace used by the router's typo check.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefixes: Vec<String>,
    sub_prefixes: Vec<String>,
    mention: Option<String>,
}

impl PrefixMatcher {
    pub fn new(
        prefixes: impl IntoIterator<Item = String>,
        sub_prefixes: impl IntoIterator<Item = String>,
        mention: Option<String>,
    ) -> Self {
        Self {
            prefixes: prefixes.into_iter().filter(|p| !p.is_empty()).collect(),
            sub_prefixes: sub_prefixes.into_iter().filter(|p| !p.is_empty()).collect(),
            mention: mention.filter(|m| !m.is_empty()),
        }
    }

    #[must_use]
    pub fn match_text(&self, text: &str) -> Option<PrefixMatch> {
        if let Some(end) = self.longest_prefix(text) {
            return Some(PrefixMatch {
                command_start: end,
                via: AddressedVia::Prefix,
            });
        }
        if let Some(end) = self.mention_end(text) {
            return Some(PrefixMatch {
                command_start: end,
                via: AddressedVia::Mention,
            });
        }
        None
    }

    /// Whether `token` carries any configured sub-command marker.
    /// Case-sensitive, any-of semantics.
    #[must_use]
    pub fn is_sub_prefixed(&self, token: &str) -> bool {
        self.sub_prefixes.iter().any(|p| token.starts_with(p.as_str()))
    }

    /// Strip the first matching sub-command marker, for building suggestions.
    #[must_use]
    pub fn strip_sub_prefix<'t>(&self, token: &'t str) -> &'t str {
        self.sub_prefixes
            .iter()
            .find_map(|p| token.strip_prefix(p.as_str()))
            .unwrap_or(token)
    }

    fn longest_prefix(&self, text: &str) -> Option<usize> {
        let mut best: Option<usize> = None;
        for prefix in &self.prefixes {
            let len = prefix.len();
            if text.len() >= len
                && text.is_char_boundary(len)
                && text[..len].eq_ignore_ascii_case(prefix)
                && best.is_none_or(|b| len > b)
            {
                best = Some(len);
            }
        }
        best
    }

    fn mention_end(&self, text: &str) -> Option<usize> {
        let mention = self.mention.as_deref()?;
        let len = mention.len();
        if text.len() < len || !text.is_char_boundary(len) || !text[..len].eq_ignore_ascii_case(mention)
        {
            return None;
        }
        // The mention "prefix" swallows trailing punctuation and spacing so
        // "@bot: help" and "@bot, help" both leave "help" as command text.
        let mut end = len;
        for c in text[len..].chars() {
            if c == ':' || c == ',' || c == ' ' {
                end += c.len_utf8();
            } else {
                break;
            }
        }
        Some(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> PrefixMatcher {
        PrefixMatcher::new(
            vec!["!".to_owned(), "!!".to_owned(), "bot ".to_owned()],
            vec!["#".to_owned()],
            Some("@switchboard".to_owned()),
        )
    }

    #[test]
    fn longest_prefix_wins() {
        let m = matcher().match_text("!!help").unwrap();
        assert_eq!(m.command_start, 2);
        assert_eq!(m.via, AddressedVia::Prefix);
    }

    #[test]
    fn prefix_is_case_insensitive() {
        let m = matcher().match_text("BOT help").unwrap();
        assert_eq!(m.command_start, 4);
        assert_eq!(&"BOT help"[m.command_start..], "help");
    }

    #[test]
    fn command_start_follows_the_match() {
        let text = "!roll 2d6";
        let m = matcher().match_text(text).unwrap();
        assert_eq!(&text[m.command_start..], "roll 2d6");
    }

    #[test]
    fn mention_swallows_trailing_punctuation() {
        let text = "@Switchboard: help me";
        let m = matcher().match_text(text).unwrap();
        assert_eq!(m.via, AddressedVia::Mention);
        assert_eq!(&text[m.command_start..], "help me");
    }

    #[test]
    fn string_prefix_is_checked_before_mention() {
        let m = PrefixMatcher::new(
            vec!["@".to_owned()],
            vec![],
            Some("@switchboard".to_owned()),
        );
        let found = m.match_text("@switchboard ping").unwrap();
        assert_eq!(found.via, AddressedVia::Prefix);
        assert_eq!(found.command_start, 1);
    }

    #[test]
    fn unaddressed_text_does_not_match() {
        assert!(matcher().match_text("just chatting").is_none());
        assert!(matcher().match_text("").is_none());
    }

    #[test]
    fn sub_prefix_check_is_case_sensitive_any_of() {
        let m = PrefixMatcher::new(
            vec!["!".to_owned()],
            vec!["#".to_owned(), "cmd:".to_owned()],
            None,
        );
        assert!(m.is_sub_prefixed("#roll"));
        assert!(m.is_sub_prefixed("cmd:roll"));
        assert!(!m.is_sub_prefixed("CMD:roll"));
        assert!(!m.is_sub_prefixed("roll"));
        assert_eq!(m.strip_sub_prefix("#roll"), "roll");
        assert_eq!(m.strip_sub_prefix("roll"), "roll");
    }

    #[test]
    fn multibyte_text_does_not_panic() {
        let m = PrefixMatcher::new(vec!["!".to_owned()], vec![], None);
        assert!(m.match_text("héllo").is_none());
        assert!(m.match_text("é").is_none());
    }
}
