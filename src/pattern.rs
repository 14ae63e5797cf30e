mod url_pattern;

use std::{collections::BTreeMap, fmt::Debug};

use getset::Getters;

pub use url_pattern::{UrlPattern, UrlPatternCompiler};

/// Raw named captures as reported by a pattern engine.
/// `None` marks a group the engine knows about but that took no part in the match.
pub type Captures = BTreeMap<String, Option<String>>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,

    #[error("pattern '{0}' must start with '/' or '*'")]
    NotAbsolute(String),

    #[error("missing parameter name after ':' at position {position}")]
    MissingParameterName { position: usize },

    #[error("duplicate group name '{0}'")]
    DuplicateName(String),

    #[error("unsupported syntax '{character}' at position {position}")]
    UnsupportedSyntax { character: char, position: usize },

    #[error("trailing escape character at position {position}")]
    TrailingEscape { position: usize },
}

/// The raw result of a successful pattern evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct PatternMatch {
    input: String,
    pathname: String,
    query: Option<String>,
    groups: Captures,
}

impl PatternMatch {
    pub fn new(uri: &http::Uri, groups: Captures) -> Self {
        Self {
            input: uri.to_string(),
            pathname: uri.path().to_owned(),
            query: uri.query().map(str::to_owned),
            groups,
        }
    }
}

/// A compiled path template.
pub trait PathMatcher: Send + Sync + Debug {
    /// The template this matcher was compiled from.
    fn template(&self) -> &str;

    /// Evaluates the matcher against the path of `uri`.
    /// Returns `None` when the path does not structurally match.
    fn exec(&self, uri: &http::Uri) -> Option<PatternMatch>;
}

/// Turns path templates into matchers. Any engine implementing this can back a `Router`.
pub trait PatternCompiler: Send + Sync {
    fn compile(&self, template: &str) -> Result<Box<dyn PathMatcher>, PatternError>;
}
