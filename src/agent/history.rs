//! Bounded conversation history supplied by the caller on every request.
//!
//! The service keeps no session state: callers send the lines they were
//! given last time and get the updated list back. Lines are stored in their
//! wire form (`"Human: ..."` / `"AI: ..."`).

/// Lines kept when no limit is configured (5 human/assistant turns).
pub const DEFAULT_MAX_HISTORY_LENGTH: usize = 10;

/// Rendered in prompts in place of an empty history.
pub const EMPTY_HISTORY_PLACEHOLDER: &str = "No previous conversation";

const HUMAN_PREFIX: &str = "Human: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    lines: Vec<String>,
    max_len: usize,
}

impl History {
    pub fn new(max_len: usize) -> Self {
        Self {
            lines: Vec::new(),
            max_len,
        }
    }

    /// Adopts a caller-supplied history, dropping the oldest lines if it is
    /// already over the limit.
    pub fn from_lines(lines: Vec<String>, max_len: usize) -> Self {
        let mut history = Self { lines, max_len };
        history.truncate();
        history
    }

    /// Returns a new history with the turn appended as a unit.
    pub fn append(&self, human: &str, ai: &str) -> Self {
        let mut next = self.clone();
        next.lines.push(format!("{}{}", HUMAN_PREFIX, human));
        next.lines.push(format!("AI: {}", ai));
        next.truncate();
        next
    }

    /// Prompt rendering: one line per entry, oldest first.
    pub fn format(&self) -> String {
        if self.lines.is_empty() {
            EMPTY_HISTORY_PLACEHOLDER.to_string()
        } else {
            self.lines.join("\n")
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    // Evicts from the front in whole turns. Leading replies without their
    // `Human:` line go first, then the overflow rounded up to an even line
    // count, then any reply that lost its question. The result is at most
    // `max_len` and starts on a `Human:` line.
    fn truncate(&mut self) {
        if self.lines.len() <= self.max_len {
            return;
        }
        let mut drop = self.leading_replies(0);
        let remaining = self.lines.len() - drop;
        if remaining > self.max_len {
            let overflow = remaining - self.max_len;
            drop = (drop + overflow + overflow % 2).min(self.lines.len());
            drop = self.leading_replies(drop);
        }
        self.lines.drain(..drop);
    }

    // First index at or after `from` holding a `Human:` line.
    fn leading_replies(&self, from: usize) -> usize {
        self.lines[from..]
            .iter()
            .position(|line| line.starts_with(HUMAN_PREFIX))
            .map_or(self.lines.len(), |offset| from + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_formats_as_placeholder() {
        let history = History::new(DEFAULT_MAX_HISTORY_LENGTH);
        assert_eq!(history.format(), "No previous conversation");
        assert!(history.is_empty());
    }

    #[test]
    fn appends_keep_original_order_under_the_cap() {
        let mut history = History::new(10);
        for i in 0..5 {
            history = history.append(&format!("q{i}"), &format!("a{i}"));
        }
        assert_eq!(history.len(), 10);
        assert_eq!(history.lines()[0], "Human: q0");
        assert_eq!(history.lines()[1], "AI: a0");
        assert_eq!(history.lines()[9], "AI: a4");
        assert_eq!(
            history.format().lines().next(),
            Some("Human: q0")
        );
    }

    #[test]
    fn oldest_turn_is_evicted_first() {
        let mut history = History::new(10);
        for i in 0..6 {
            history = history.append(&format!("q{i}"), &format!("a{i}"));
            assert!(history.len() <= 10);
        }
        assert_eq!(history.len(), 10);
        assert_eq!(history.lines()[0], "Human: q1");
        assert_eq!(history.lines()[9], "AI: a5");
    }

    #[test]
    fn append_does_not_modify_the_original() {
        let history = History::new(10).append("hi", "hello");
        let next = history.append("again", "sure");
        assert_eq!(history.len(), 2);
        assert_eq!(next.len(), 4);
    }

    #[test]
    fn odd_cap_never_splits_a_turn() {
        let mut history = History::new(5);
        for i in 0..4 {
            history = history.append(&format!("q{i}"), &format!("a{i}"));
        }
        assert_eq!(history.len(), 4);
        assert!(history.lines()[0].starts_with("Human: "));
        assert_eq!(history.lines()[0], "Human: q2");
    }

    #[test]
    fn oversized_caller_history_is_trimmed_on_load() {
        let lines: Vec<String> = (0..14)
            .map(|i| if i % 2 == 0 { format!("Human: {i}") } else { format!("AI: {i}") })
            .collect();
        let history = History::from_lines(lines, 10);
        assert_eq!(history.len(), 10);
        assert_eq!(history.lines()[0], "Human: 4");
    }

    #[test]
    fn misaligned_caller_history_drops_orphaned_replies() {
        let lines = vec!["AI: orphan".to_string(), "Human: a".to_string(), "AI: b".to_string()];
        let history = History::from_lines(lines, 2);
        assert_eq!(history.lines(), ["Human: a", "AI: b"]);

        let lines: Vec<String> = ["AI: x", "Human: a", "AI: b", "Human: c", "AI: d"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let history = History::from_lines(lines, 4);
        assert_eq!(history.lines(), ["Human: a", "AI: b", "Human: c", "AI: d"]);

        let lines: Vec<String> = ["Human: a", "AI: b", "AI: stray", "Human: c", "AI: d"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let history = History::from_lines(lines, 3);
        assert_eq!(history.lines(), ["Human: c", "AI: d"]);
    }

    #[test]
    fn append_after_dangling_question_keeps_whole_turns() {
        let lines: Vec<String> = ["Human: a", "AI: b", "Human: c"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let history = History::from_lines(lines, 4).append("d", "e");
        assert!(history.len() <= 4);
        assert!(history.lines()[0].starts_with("Human: "));
        assert!(history
            .lines()
            .windows(2)
            .all(|w| !(w[0].starts_with("AI: ") && w[1].starts_with("AI: "))));
        assert_eq!(history.lines().last().map(String::as_str), Some("AI: e"));
    }

    #[test]
    fn zero_cap_keeps_nothing() {
        let history = History::new(0).append("q", "a");
        assert!(history.is_empty());
        assert_eq!(history.format(), EMPTY_HISTORY_PLACEHOLDER);
    }
}
