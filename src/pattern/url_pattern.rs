use std::collections::HashSet;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use super::{Captures, PathMatcher, PatternCompiler, PatternError, PatternMatch};

// Characters in literal segments that a URL parser would have percent-encoded in the path.
const PATH_LITERAL_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`');

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Parameter {
        name: String,
        optional: bool,
        slash_prefix: bool,
    },
    Wildcard {
        name: String,
    },
}

/// Compiles URLPattern-style pathname templates:
/// literals, `:name`, `:name?` and `*`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlPatternCompiler;

impl PatternCompiler for UrlPatternCompiler {
    fn compile(&self, template: &str) -> Result<Box<dyn PathMatcher>, PatternError> {
        Ok(Box::new(UrlPattern::parse(template)?))
    }
}

// Failed (token index, path offset) pairs are remembered so that each
// pair is explored at most once.
struct MatchState {
    path_len: usize,
    captures: Captures,
    failed: HashSet<(usize, usize)>,
}

impl MatchState {
    fn new(path: &str) -> Self {
        Self {
            path_len: path.len(),
            captures: Captures::new(),
            failed: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UrlPattern {
    template: String,
    tokens: Vec<Token>,
}

fn push_literal_char(literal: &mut String, c: char) {
    let mut buf = [0u8; 4];
    literal.extend(utf8_percent_encode(
        c.encode_utf8(&mut buf),
        PATH_LITERAL_ENCODE_SET,
    ));
}

fn flush_literal(tokens: &mut Vec<Token>, literal: &mut String) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}

fn is_name_char(c: char, first: bool) -> bool {
    if first {
        c.is_ascii_alphabetic() || c == '_'
    } else {
        c.is_ascii_alphanumeric() || c == '_'
    }
}

impl UrlPattern {
    pub fn parse(template: &str) -> Result<Self, PatternError> {
        if template.is_empty() {
            return Err(PatternError::Empty);
        }
        if !(template.starts_with('/') || template.starts_with('*')) {
            return Err(PatternError::NotAbsolute(template.to_owned()));
        }

        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut names = HashSet::new();
        let mut next_wildcard_index = 0usize;

        let mut chars = template.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => push_literal_char(&mut literal, escaped),
                    None => return Err(PatternError::TrailingEscape { position }),
                },
                ':' => {
                    let mut name = String::new();
                    while let Some((_, next)) =
                        chars.next_if(|&(_, next)| is_name_char(next, name.is_empty()))
                    {
                        name.push(next);
                    }
                    if name.is_empty() {
                        return Err(PatternError::MissingParameterName { position });
                    }

                    let optional = chars.next_if(|&(_, next)| next == '?').is_some();

                    if let Some(&(modifier_position, modifier)) = chars.peek() {
                        if modifier == '*' {
                            return Err(PatternError::UnsupportedSyntax {
                                character: modifier,
                                position: modifier_position,
                            });
                        }
                    }

                    let slash_prefix = optional && literal.ends_with('/');
                    if slash_prefix {
                        literal.pop();
                    }
                    flush_literal(&mut tokens, &mut literal);

                    if !names.insert(name.clone()) {
                        return Err(PatternError::DuplicateName(name));
                    }

                    tokens.push(Token::Parameter {
                        name,
                        optional,
                        slash_prefix,
                    });
                }
                '*' => {
                    flush_literal(&mut tokens, &mut literal);

                    let name = next_wildcard_index.to_string();
                    next_wildcard_index += 1;
                    names.insert(name.clone());

                    tokens.push(Token::Wildcard { name });
                }
                '(' | ')' | '{' | '}' | '+' | '?' => {
                    return Err(PatternError::UnsupportedSyntax {
                        character: c,
                        position,
                    });
                }
                _ => push_literal_char(&mut literal, c),
            }
        }

        flush_literal(&mut tokens, &mut literal);

        Ok(Self {
            template: template.to_owned(),
            tokens,
        })
    }

    fn match_from(&self, index: usize, rest: &str, state: &mut MatchState) -> bool {
        let key = (index, state.path_len - rest.len());
        if state.failed.contains(&key) {
            return false;
        }

        let matched = self.match_token(index, rest, state);
        if !matched {
            state.failed.insert(key);
        }
        matched
    }

    fn match_token(&self, index: usize, rest: &str, state: &mut MatchState) -> bool {
        let token = match self.tokens.get(index) {
            None => return rest.is_empty(),
            Some(token) => token,
        };

        match token {
            Token::Literal(literal) => match rest.strip_prefix(literal.as_str()) {
                Some(remaining) => self.match_from(index + 1, remaining, state),
                None => false,
            },
            Token::Parameter {
                name,
                optional,
                slash_prefix,
            } => {
                let candidate = if *slash_prefix {
                    rest.strip_prefix('/')
                } else {
                    Some(rest)
                };

                if let Some(candidate) = candidate {
                    let segment_len = candidate.find('/').unwrap_or(candidate.len());

                    // shortest capture first
                    for end in candidate
                        .char_indices()
                        .map(|(i, c)| i + c.len_utf8())
                        .take_while(|&end| end <= segment_len)
                    {
                        if self.match_from(index + 1, &candidate[end..], state) {
                            state
                                .captures
                                .insert(name.clone(), Some(candidate[..end].to_owned()));
                            return true;
                        }
                    }
                }

                if *optional && self.match_from(index + 1, rest, state) {
                    state.captures.insert(name.clone(), None);
                    return true;
                }

                false
            }
            Token::Wildcard { name } => {
                // longest capture first
                let ends = std::iter::once(rest.len())
                    .chain(rest.char_indices().rev().map(|(i, _)| i));

                for end in ends {
                    if self.match_from(index + 1, &rest[end..], state) {
                        state
                            .captures
                            .insert(name.clone(), Some(rest[..end].to_owned()));
                        return true;
                    }
                }

                false
            }
        }
    }
}

impl PathMatcher for UrlPattern {
    fn template(&self) -> &str {
        &self.template
    }

    fn exec(&self, uri: &http::Uri) -> Option<PatternMatch> {
        let path = uri.path();
        let mut state = MatchState::new(path);

        if self.match_from(0, path, &mut state) {
            Some(PatternMatch::new(uri, state.captures))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(template: &str, uri: &'static str) -> Option<Captures> {
        let pattern = UrlPattern::parse(template).unwrap();
        pattern
            .exec(&http::Uri::from_static(uri))
            .map(|m| m.groups().clone())
    }

    #[test]
    fn test_root_path() {
        assert!(exec("/", "https://example.com/").is_some());
        assert!(exec("/", "/").is_some());
        assert!(exec("/", "/users").is_none());
    }

    #[test]
    fn test_literal_is_anchored() {
        assert!(exec("/foo", "/foo").is_some());
        assert!(exec("/foo", "/foo22222").is_none());
        assert!(exec("/foo", "/foo/").is_none());
        assert!(exec("/foo", "/bar/foo").is_none());
    }

    #[test]
    fn test_literal_is_case_sensitive() {
        assert!(exec("/Foo", "/foo").is_none());
    }

    #[test]
    fn test_single_param() {
        let captures = exec("/foo/:id", "https://example.com/foo/bar").unwrap();
        assert_eq!(captures.get("id"), Some(&Some("bar".to_string())));

        assert!(exec("/foo/:id", "/foo/").is_none());
        assert!(exec("/foo/:id", "/foo/bar/baz").is_none());
    }

    #[test]
    fn test_multiple_params() {
        let captures =
            exec("/resources/:id/comments/:comment_id", "/resources/12/comments/34").unwrap();
        assert_eq!(captures.get("id"), Some(&Some("12".to_string())));
        assert_eq!(captures.get("comment_id"), Some(&Some("34".to_string())));
        assert_eq!(captures.len(), 2);
    }

    #[test]
    fn test_params_within_segment() {
        let captures = exec("/files/:name.:ext", "/files/report.tar.gz").unwrap();
        assert_eq!(captures.get("name"), Some(&Some("report".to_string())));
        assert_eq!(captures.get("ext"), Some(&Some("tar.gz".to_string())));
    }

    #[test]
    fn test_param_is_not_decoded() {
        let captures = exec("/foo/:id", "/foo/a%20b").unwrap();
        assert_eq!(captures.get("id"), Some(&Some("a%20b".to_string())));
    }

    #[test]
    fn test_optional_param() {
        let captures = exec("/foo/:id?", "/foo").unwrap();
        assert_eq!(captures.get("id"), Some(&None));

        let captures = exec("/foo/:id?", "/foo/bar").unwrap();
        assert_eq!(captures.get("id"), Some(&Some("bar".to_string())));

        assert!(exec("/foo/:id?", "/foo/").is_none());
    }

    #[test]
    fn test_wildcard() {
        let captures = exec("/static/*", "/static/css/site.css").unwrap();
        assert_eq!(captures.get("0"), Some(&Some("css/site.css".to_string())));

        let captures = exec("/static/*", "/static/").unwrap();
        assert_eq!(captures.get("0"), Some(&Some(String::new())));

        assert!(exec("/static/*", "/static").is_none());
        assert!(exec("*", "/anything/at/all").is_some());
    }

    #[test]
    fn test_multiple_wildcards_are_numbered() {
        let captures = exec("/*/middle/*", "/a/b/middle/c").unwrap();
        assert_eq!(captures.get("0"), Some(&Some("a/b".to_string())));
        assert_eq!(captures.get("1"), Some(&Some("c".to_string())));
    }

    #[test]
    fn test_many_wildcards_fail_in_bounded_time() {
        let pattern = UrlPattern::parse("/*a*a*a*b").unwrap();
        let path = format!("/{}", "a".repeat(400));
        let uri: http::Uri = path.parse().unwrap();

        let started = std::time::Instant::now();
        assert!(pattern.exec(&uri).is_none());
        assert!(
            started.elapsed() < std::time::Duration::from_secs(5),
            "took {:?}",
            started.elapsed()
        );

        let uri: http::Uri = format!("{}b", path).parse().unwrap();
        let captures = pattern.exec(&uri).map(|m| m.groups().clone()).unwrap();
        assert_eq!(captures.len(), 4);
    }

    #[test]
    fn test_adjacent_params_fail_in_bounded_time() {
        let pattern = UrlPattern::parse("/:a.:b.:c.:d/end").unwrap();
        let path = format!("/{}/nope", ".x".repeat(300));
        let uri: http::Uri = path.parse().unwrap();

        let started = std::time::Instant::now();
        assert!(pattern.exec(&uri).is_none());
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_query_is_ignored() {
        let pattern = UrlPattern::parse("/search").unwrap();
        let result = pattern
            .exec(&http::Uri::from_static("https://example.com/search?q=rust"))
            .unwrap();
        assert_eq!(result.pathname(), "/search");
        assert_eq!(result.query().as_deref(), Some("q=rust"));
        assert_eq!(result.input(), "https://example.com/search?q=rust");
    }

    #[test]
    fn test_literal_space_is_encoded() {
        assert!(exec("/a b", "/a%20b").is_some());
    }

    #[test]
    fn test_escaped_characters_are_literal() {
        assert!(exec("/a\\:b", "/a:b").is_some());
        assert!(exec("/a\\*", "/a*").is_some());
        assert!(exec("/a\\*", "/abc").is_none());
    }

    #[test]
    fn test_malformed_patterns() {
        assert_eq!(UrlPattern::parse("").unwrap_err(), PatternError::Empty);
        assert_eq!(
            UrlPattern::parse("foo").unwrap_err(),
            PatternError::NotAbsolute("foo".to_string())
        );
        assert_eq!(
            UrlPattern::parse("/foo/:").unwrap_err(),
            PatternError::MissingParameterName { position: 5 }
        );
        assert_eq!(
            UrlPattern::parse("/:1st").unwrap_err(),
            PatternError::MissingParameterName { position: 1 }
        );
        assert_eq!(
            UrlPattern::parse("/:id/:id").unwrap_err(),
            PatternError::DuplicateName("id".to_string())
        );
        assert_eq!(
            UrlPattern::parse("/(\\d+)").unwrap_err(),
            PatternError::UnsupportedSyntax {
                character: '(',
                position: 1
            }
        );
        assert_eq!(
            UrlPattern::parse("/:id*").unwrap_err(),
            PatternError::UnsupportedSyntax {
                character: '*',
                position: 4
            }
        );
        assert_eq!(
            UrlPattern::parse("/foo\\").unwrap_err(),
            PatternError::TrailingEscape { position: 4 }
        );
    }

    #[test]
    fn test_compiler_keeps_template() {
        let matcher = UrlPatternCompiler.compile("/foo/:id").unwrap();
        assert_eq!(matcher.template(), "/foo/:id");
    }
}
