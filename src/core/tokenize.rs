//! core::tokenize
//!
//! Tokenizer boundary.
//!
//! Tokenization and normalization policy belong to the caller. The engine
//! only needs each token to carry a stable comparison key and a display
//! form; [`Tokenizer`] is the seam, [`SimpleTokenizer`] a reasonable default
//! for plain-text witnesses.

use super::types::{Sigil, Token};

/// Splits raw witness text into tokens.
pub trait Tokenizer {
    /// Tokenize `text` for the witness `sigil`.
    ///
    /// Implementations must assign consecutive positions starting at zero.
    fn tokenize(&self, sigil: &Sigil, text: &str) -> Vec<Token>;
}

/// Whitespace tokenizer that splits punctuation into separate tokens and
/// normalizes keys to lowercase.
///
/// # Example
///
/// ```
/// use collatio::core::tokenize::{SimpleTokenizer, Tokenizer};
/// use collatio::core::types::Sigil;
///
/// let tokens = SimpleTokenizer.tokenize(&Sigil::new("A").unwrap(), "He was agast, so");
/// let keys: Vec<&str> = tokens.iter().map(|t| t.key()).collect();
/// assert_eq!(keys, vec!["he", "was", "agast", ",", "so"]);
/// assert_eq!(tokens[0].display(), "He");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTokenizer;

impl SimpleTokenizer {
    fn is_word_char(c: char) -> bool {
        c.is_alphanumeric() || c == '\'' || c == '’'
    }

    fn split_chunk(chunk: &str) -> Vec<&str> {
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut current: Option<bool> = None;

        for (idx, c) in chunk.char_indices() {
            let word = Self::is_word_char(c);
            match current {
                Some(kind) if kind == word => {}
                Some(_) => {
                    pieces.push(&chunk[start..idx]);
                    start = idx;
                    current = Some(word);
                }
                None => current = Some(word),
            }
        }
        if start < chunk.len() {
            pieces.push(&chunk[start..]);
        }
        pieces
    }
}

impl Tokenizer for SimpleTokenizer {
    fn tokenize(&self, sigil: &Sigil, text: &str) -> Vec<Token> {
        text.split_whitespace()
            .flat_map(Self::split_chunk)
            .enumerate()
            .map(|(position, piece)| {
                Token::new(sigil.clone(), position as u32, piece.to_lowercase(), piece)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(text: &str) -> Vec<String> {
        SimpleTokenizer
            .tokenize(&Sigil::new("A").unwrap(), text)
            .into_iter()
            .map(|t| t.key().to_string())
            .collect()
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(keys("a  b\tc\n d"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn punctuation_is_separate() {
        assert_eq!(keys("cat."), vec!["cat", "."]);
        assert_eq!(keys("(so)"), vec!["(", "so", ")"]);
    }

    #[test]
    fn punctuation_runs_stay_together() {
        assert_eq!(keys("wait..."), vec!["wait", "..."]);
    }

    #[test]
    fn apostrophes_stay_in_words() {
        assert_eq!(keys("don't"), vec!["don't"]);
    }

    #[test]
    fn keys_are_lowercase_display_is_not() {
        let tokens = SimpleTokenizer.tokenize(&Sigil::new("A").unwrap(), "The Cat");
        assert_eq!(tokens[0].key(), "the");
        assert_eq!(tokens[0].display(), "The");
        assert_eq!(tokens[1].position(), 1);
    }

    #[test]
    fn non_latin_text() {
        assert_eq!(keys("фрк0 фрц0"), vec!["фрк0", "фрц0"]);
    }

    #[test]
    fn empty_input() {
        assert!(keys("").is_empty());
    }
}
