use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ARNParseError {
    InvalidFormat,
    MissingPrefix,
}

impl std::fmt::Display for ARNParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat => f.write_str("expected five ':' separators before the resource"),
            Self::MissingPrefix => f.write_str("expected the ARN to start with 'arn:'"),
        }
    }
}

impl std::error::Error for ARNParseError {}

/// An ARN split into its header segments and resource part.
///
/// Only the first five separators are significant; anything after the
/// account segment belongs to the resource, colons included.
#[derive(Clone)]
pub struct ARN {
    value: String,
    separators: [usize; 5],
}

impl ARN {
    pub fn new(partition: &str, service: &str, region: &str, account: &str, resource: &str) -> Self {
        let sep0 = 3;
        let sep1 = sep0 + 1 + partition.len();
        let sep2 = sep1 + 1 + service.len();
        let sep3 = sep2 + 1 + region.len();
        let sep4 = sep3 + 1 + account.len();
        let mut value = String::with_capacity(sep4 + 1 + resource.len());
        for part in ["arn", partition, service, region, account] {
            value.push_str(part);
            value.push(':');
        }
        value.push_str(resource);
        ARN { value, separators: [sep0, sep1, sep2, sep3, sep4] }
    }

    pub fn partition(&self) -> &str {
        &self.value[self.separators[0] + 1 .. self.separators[1]]
    }

    pub fn service(&self) -> &str {
        &self.value[self.separators[1] + 1 .. self.separators[2]]
    }

    pub fn region(&self) -> &str {
        &self.value[self.separators[2] + 1 .. self.separators[3]]
    }

    pub fn account(&self) -> &str {
        &self.value[self.separators[3] + 1 .. self.separators[4]]
    }

    pub fn resource(&self) -> &str {
        &self.value[self.separators[4] + 1 ..]
    }

    pub fn raw(&self) -> &str {
        &self.value
    }
}

impl PartialEq for ARN {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for ARN {}

impl std::hash::Hash for ARN {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl std::fmt::Debug for ARN {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl std::fmt::Display for ARN {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for ARN {
    type Err = ARNParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if !value.starts_with("arn:") {
            return Err(ARNParseError::MissingPrefix);
        }
        let mut separators = [0; 5];
        let mut found = 0;
        for (i, c) in value.char_indices() {
            if c == ':' {
                separators[found] = i;
                found += 1;
                if found == separators.len() {
                    return Ok(ARN { value: value.into(), separators });
                }
            }
        }
        Err(ARNParseError::InvalidFormat)
    }
}

impl TryFrom<&str> for ARN {
    type Error = ARNParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}
