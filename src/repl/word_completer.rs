use rustc_hash::FxHashSet;
use rustyline::completion::Completer;
use rustyline::completion::Pair;
use rustyline::Context;

/// Completes the word under the cursor from a fixed set of words.
pub struct WordCompleter {
    words: FxHashSet<String>,
}

impl WordCompleter {
    pub fn from<I: Into<String>>(input: Vec<I>) -> Self {
        Self {
            words: input.into_iter().map(Into::into).collect(),
        }
    }

    // the word ends at `pos` and starts after the last character that can't be part of a name
    fn word_start(line: &str, pos: usize) -> usize {
        line[..pos]
            .char_indices()
            .rev()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0)
    }

    pub(crate) fn complete_word(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let start = Self::word_start(line, pos);
        let prefix = &line[start..pos];

        if prefix.is_empty() {
            return (pos, vec![]);
        }

        let mut matches: Vec<Pair> = self
            .words
            .iter()
            .filter(|known| known.starts_with(prefix))
            .map(|known| Pair {
                display: known.clone(),
                replacement: known.clone(),
            })
            .collect();

        matches.sort_by(|a, b| a.display.cmp(&b.display));
        (start, matches)
    }
}

impl Completer for WordCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.complete_word(line, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_word_under_cursor() {
        let completer = WordCompleter::from(vec!["clock", "clamp", "foo"]);

        let (start, matches) = completer.complete_word("1 + cl", 6);
        assert_eq!(start, 4);
        assert_eq!(
            matches
                .iter()
                .map(|e| e.replacement.clone())
                .collect::<Vec<_>>(),
            vec![String::from("clamp"), String::from("clock")]
        );

        let (_, matches) = completer.complete_word("nope", 4);
        assert!(matches.is_empty(), "Expected no matches");
    }

    #[test]
    fn empty_word_has_no_matches() {
        let completer = WordCompleter::from(vec!["clock"]);
        let (start, matches) = completer.complete_word("1 + ", 4);

        assert_eq!(start, 4);
        assert!(matches.is_empty());
    }
}
