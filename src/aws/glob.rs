use regex::{escape, Regex, RegexBuilder};

/// A policy-language wildcard pattern: `*` matches any run of characters,
/// `?` matches exactly one.
#[derive(Debug, Clone)]
pub struct Glob {
    source: String,
    regex: Regex,
}

fn pattern_from_glob(glob: &str) -> String {
    let mut literal = String::new();
    let mut pattern = glob.chars().fold(String::from('^'), |mut acc, c| {
        match c {
            '?' | '*' => {
                if !literal.is_empty() {
                    acc.push_str(&escape(&literal));
                    literal.clear();
                }
                acc.push_str(if c == '?' { "." } else { ".*" });
            }
            _ => literal.push(c),
        };
        acc
    });
    pattern.push_str(&escape(&literal));
    pattern.push('$');
    pattern
}

impl Glob {
    pub fn new(glob: &str) -> Result<Self, regex::Error> {
        Self::build(glob, false)
    }

    /// Action names are matched without regard to case.
    pub fn case_insensitive(glob: &str) -> Result<Self, regex::Error> {
        Self::build(glob, true)
    }

    fn build(glob: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&pattern_from_glob(glob))
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Glob { source: glob.to_string(), regex })
    }

    pub fn is_match(&self, target: &str) -> bool {
        self.regex.is_match(target)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Number of non-wildcard characters, used to rank overlapping matches.
    pub fn literal_len(&self) -> usize {
        self.source.chars().filter(|c| !matches!(c, '*' | '?')).count()
    }
}

pub fn glob_matches(glob: &str, target: &str) -> bool {
    if !glob.contains(['?', '*']) {
        return target == glob;
    }
    Glob::new(glob).map_or(false, |glob| glob.is_match(target))
}
