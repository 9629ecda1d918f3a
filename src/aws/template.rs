use super::arn::ARN;
use super::glob::Glob;
use super::placeholders::Placeholders;

use tracing::warn;

pub const WILDCARD: &str = "*";

/// Number of `:` separators an ARN carries before its resource part.
const HEADER_SEPARATORS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("pattern must start with 'arn:'")]
    MissingPrefix,
    #[error("pattern has {0} ':' separators, at least 5 are required")]
    TooFewSegments(usize),
    #[error("unterminated placeholder starting at byte {0}")]
    Unterminated(usize),
    #[error("invalid placeholder name '{0}'")]
    InvalidName(String),
    #[error("unexpected '{0}' at byte {1}")]
    StrayBrace(char, usize),
    #[error("pattern cannot be matched: {0}")]
    Glob(#[from] regex::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Placeholder(String),
}

/// A parsed ARN pattern such as
/// `arn:${partition}:amplify:${region}:${account}:apps/${appId}`.
#[derive(Debug, Clone)]
pub struct ArnTemplate {
    pattern: String,
    tokens: Vec<Token>,
    placeholder_names: Vec<String>,
    separators: usize,
    glob: Glob,
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// Values that could break the segment structure fall back to the wildcard.
fn is_usable(value: &str) -> bool {
    !value.contains([':', '{', '}'])
}

impl ArnTemplate {
    pub fn parse(pattern: &str) -> Result<Self, TemplateError> {
        if !pattern.starts_with("arn:") {
            return Err(TemplateError::MissingPrefix);
        }
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern.char_indices().peekable();
        while let Some((i, c)) = rest.next() {
            match c {
                '$' if matches!(rest.peek(), Some((_, '{'))) => {
                    let start = i + 2;
                    let end = pattern[start..].find('}')
                        .map(|offset| start + offset)
                        .ok_or(TemplateError::Unterminated(i))?;
                    let name = &pattern[start..end];
                    if !is_valid_name(name) {
                        return Err(TemplateError::InvalidName(name.to_string()));
                    }
                    if !literal.is_empty() {
                        tokens.push(Token::Literal(std::mem::take(&mut literal)));
                    }
                    tokens.push(Token::Placeholder(name.to_string()));
                    while matches!(rest.peek(), Some((j, _)) if *j <= end) {
                        rest.next();
                    }
                }
                '{' | '}' => return Err(TemplateError::StrayBrace(c, i)),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        let separators = tokens.iter().map(|token| match token {
            Token::Literal(text) => text.matches(':').count(),
            Token::Placeholder(_) => 0,
        }).sum();
        if separators < HEADER_SEPARATORS {
            return Err(TemplateError::TooFewSegments(separators));
        }

        let mut placeholder_names: Vec<String> = Vec::new();
        for token in &tokens {
            if let Token::Placeholder(name) = token {
                if !placeholder_names.contains(name) {
                    placeholder_names.push(name.clone());
                }
            }
        }

        let glob = Glob::new(&Self::join(&tokens, |_| WILDCARD))?;
        Ok(ArnTemplate { pattern: pattern.to_string(), tokens, placeholder_names, separators, glob })
    }

    fn join<'t, 'v>(tokens: &'t [Token], mut resolve: impl FnMut(&'t str) -> &'v str) -> String {
        tokens.iter().fold(String::new(), |mut acc, token| {
            match token {
                Token::Literal(text) => acc.push_str(text),
                Token::Placeholder(name) => acc.push_str(resolve(name)),
            }
            acc
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholder_names(&self) -> &[String] {
        &self.placeholder_names
    }

    /// Number of `:`-delimited segments every rendering of this template has.
    pub fn segment_count(&self) -> usize {
        self.separators + 1
    }

    /// Substitutes each placeholder with its value from `values`, or `*`
    /// when the value is missing, empty, or would break the ARN structure.
    /// Names in `values` that the template does not use are ignored.
    pub fn render(&self, values: &Placeholders) -> String {
        Self::join(&self.tokens, |name| match values.get(name) {
            Some(value) if is_usable(value) => value,
            Some(value) => {
                warn!(placeholder = name, value, pattern = %self.pattern, "discarding placeholder value");
                WILDCARD
            }
            None => WILDCARD,
        })
    }

    /// The template with every placeholder replaced by `*`.
    pub fn wildcard(&self) -> &str {
        self.glob.as_str()
    }

    /// Whether `arn` is an instance of this template.
    pub fn matches(&self, arn: &ARN) -> bool {
        self.glob.is_match(arn.raw())
    }

    /// Count of fixed characters, so more specific templates rank first.
    pub fn specificity(&self) -> usize {
        self.glob.literal_len()
    }
}

impl PartialEq for ArnTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for ArnTemplate {}

impl std::fmt::Display for ArnTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl std::str::FromStr for ArnTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
