//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Sigil`] - Validated witness label
//! - [`Token`] - One normalized token of a witness
//! - [`TokenRef`] - Witness-independent identity of a token (sigil + position)
//! - [`Witness`] - Immutable ordered token sequence
//! - [`Fingerprint`] - Content hash for comparing collation results
//!
//! # Validation
//!
//! Sigils enforce validity at construction time. Tokens and witnesses are
//! plain immutable values; their shape is checked once, before a witness is
//! merged into a graph (see [`crate::align`]).
//!
//! # Examples
//!
//! ```
//! use collatio::core::types::{Sigil, Witness};
//!
//! let sigil = Sigil::new("A").unwrap();
//! let witness = Witness::from_text(sigil, "The black cat.");
//! let keys: Vec<&str> = witness.tokens().iter().map(|t| t.key()).collect();
//! assert_eq!(keys, vec!["the", "black", "cat", "."]);
//!
//! assert!(Sigil::new("").is_err());
//! assert!(Sigil::new("has space").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::tokenize::{SimpleTokenizer, Tokenizer};

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid sigil: {0}")]
    InvalidSigil(String),
}

/// A validated witness sigil.
///
/// Sigils are short labels such as `A`, `B` or `MS-Paris-12`:
/// - Cannot be empty
/// - Cannot contain whitespace or control characters
/// - At most [`Sigil::MAX_LEN`] characters
///
/// # Example
///
/// ```
/// use collatio::core::types::Sigil;
///
/// let sigil = Sigil::new("MS-Paris-12").unwrap();
/// assert_eq!(sigil.as_str(), "MS-Paris-12");
///
/// assert!(Sigil::new("").is_err());
/// assert!(Sigil::new("a\tb").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sigil(String);

impl Sigil {
    /// Maximum sigil length in characters.
    pub const MAX_LEN: usize = 64;

    /// Create a new validated sigil.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSigil` if the label is empty, too long, or
    /// contains whitespace or control characters.
    pub fn new(label: impl Into<String>) -> Result<Self, TypeError> {
        let label = label.into();
        Self::validate(&label)?;
        Ok(Self(label))
    }

    fn validate(label: &str) -> Result<(), TypeError> {
        if label.is_empty() {
            return Err(TypeError::InvalidSigil("sigil cannot be empty".into()));
        }
        if label.chars().count() > Self::MAX_LEN {
            return Err(TypeError::InvalidSigil(format!(
                "sigil cannot be longer than {} characters",
                Self::MAX_LEN
            )));
        }
        if label.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidSigil(
                "sigil cannot contain whitespace".into(),
            ));
        }
        if label.chars().any(char::is_control) {
            return Err(TypeError::InvalidSigil(
                "sigil cannot contain control characters".into(),
            ));
        }
        Ok(())
    }

    /// Get the sigil as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sigil {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sigil> for String {
    fn from(value: Sigil) -> Self {
        value.0
    }
}

impl std::fmt::Display for Sigil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sigil {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One token of a witness.
///
/// `key` is the normalized comparison key produced by the tokenizer;
/// `display` is the form shown to readers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    witness: Sigil,
    position: u32,
    key: String,
    display: String,
}

impl Token {
    /// Create a token.
    pub fn new(
        witness: Sigil,
        position: u32,
        key: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            witness,
            position,
            key: key.into(),
            display: display.into(),
        }
    }

    /// The witness this token belongs to.
    pub fn witness(&self) -> &Sigil {
        &self.witness
    }

    /// Zero-based position within the witness.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Normalized comparison key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display form.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Witness-independent identity of this token.
    pub fn reference(&self) -> TokenRef {
        TokenRef {
            witness: self.witness.clone(),
            position: self.position,
        }
    }
}

/// Identity of a token: the witness it came from and its position there.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenRef {
    pub witness: Sigil,
    pub position: u32,
}

impl std::fmt::Display for TokenRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.witness, self.position)
    }
}

/// An immutable, ordered sequence of tokens identified by a sigil.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    sigil: Sigil,
    tokens: Vec<Token>,
}

impl Witness {
    /// Create a witness from already tokenized input.
    ///
    /// Shape checks (non-empty, consecutive positions, matching sigils) run
    /// when the witness is merged, so that a malformed witness is rejected
    /// before it touches a graph.
    pub fn new(sigil: Sigil, tokens: Vec<Token>) -> Self {
        Self { sigil, tokens }
    }

    /// Tokenize `text` with the [`SimpleTokenizer`].
    pub fn from_text(sigil: Sigil, text: &str) -> Self {
        Self::with_tokenizer(sigil, text, &SimpleTokenizer)
    }

    /// Tokenize `text` with a caller-supplied tokenizer.
    pub fn with_tokenizer(sigil: Sigil, text: &str, tokenizer: &dyn Tokenizer) -> Self {
        let tokens = tokenizer.tokenize(&sigil, text);
        Self { sigil, tokens }
    }

    /// The witness sigil.
    pub fn sigil(&self) -> &Sigil {
        &self.sigil
    }

    /// Tokens in witness order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the witness has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Total character count of the display forms.
    pub fn char_count(&self) -> usize {
        self.tokens.iter().map(|t| t.display.chars().count()).sum()
    }
}

/// Content hash of a collation result.
///
/// Two graphs with the same vertices, edges and transpositions, built in the
/// same order, have the same fingerprint.
///
/// # Example
///
/// ```
/// use collatio::core::types::Fingerprint;
///
/// let fp = Fingerprint::compute(["start", "a", "end"]);
/// let fp2 = Fingerprint::compute(["start", "a", "end"]);
/// assert_eq!(fp, fp2);
/// assert_ne!(fp, Fingerprint::compute(["start", "b", "end"]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from an ordered sequence of records.
    ///
    /// Records are hashed in the given order; callers supply a canonical
    /// order.
    pub fn compute<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = Sha256::new();
        for record in records {
            hasher.update(record.as_ref().as_bytes());
            hasher.update(b"\n");
        }

        let result = hasher.finalize();
        Self(hex::encode(result))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
