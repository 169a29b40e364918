//! Word scanner: splits source text into whitespace-delimited words.
//!
//! The scanner itself has no knowledge of quoting — that is the parser's
//! job (`parser::Parser::next_token` joins consecutive words back together
//! when a word opens a quoted string). This mirrors the reference
//! implementation's use of Go's `bufio.Scanner` with `bufio.ScanWords`: a
//! flat word stream, nothing more.

/// A single scanned word together with the 1-indexed source line it started
/// on, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word<'a> {
    pub text: &'a str,
    pub line: usize,
}

/// Lazily yields non-empty, whitespace-delimited words from source text.
///
/// Whitespace is any ASCII space, tab, newline or carriage return.
pub struct Scanner<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner { rest: source, line: 1 }
    }
}

fn is_word_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Word<'a>;

    fn next(&mut self) -> Option<Word<'a>> {
        // Skip leading whitespace, tracking newlines for line numbers.
        let mut chars = self.rest.char_indices();
        let start = loop {
            match chars.next() {
                Some((_, c)) if c == '\n' => self.line += 1,
                Some((i, c)) if is_word_whitespace(c) => {
                    let _ = i;
                }
                Some((i, _)) => break i,
                None => {
                    self.rest = "";
                    return None;
                }
            }
        };

        let word_line = self.line;
        let tail = &self.rest[start..];
        let end = tail
            .char_indices()
            .find(|&(_, c)| is_word_whitespace(c))
            .map(|(i, _)| i)
            .unwrap_or(tail.len());

        let word = &tail[..end];
        self.rest = &tail[end..];
        Some(Word { text: word, line: word_line })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(source: &str) -> Vec<&str> {
        Scanner::new(source).map(|w| w.text).collect()
    }

    #[test]
    fn splits_on_ascii_whitespace() {
        assert_eq!(words("1 2 +  print\n"), vec!["1", "2", "+", "print"]);
    }

    #[test]
    fn empty_source_yields_nothing() {
        assert_eq!(words("   \n\t  "), Vec::<&str>::new());
    }

    #[test]
    fn tracks_line_numbers() {
        let scanned: Vec<_> = Scanner::new("a\nb\n\nc").collect();
        assert_eq!(scanned[0], Word { text: "a", line: 1 });
        assert_eq!(scanned[1], Word { text: "b", line: 2 });
        assert_eq!(scanned[2], Word { text: "c", line: 4 });
    }

    #[test]
    fn does_not_join_quotes() {
        // Quote joining is the parser's job; the raw scanner just splits words.
        assert_eq!(words("\"hello world\""), vec!["\"hello", "world\""]);
    }
}
