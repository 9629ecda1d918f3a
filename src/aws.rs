mod arn;
mod glob;
mod placeholders;
mod template;

pub use arn::{ARNParseError, ARN};
pub use glob::{glob_matches, Glob};
pub use placeholders::{Placeholders, ACCOUNT, PARTITION, REGION};
pub use template::{ArnTemplate, TemplateError, WILDCARD};
