use crate::aws::{ArnTemplate, Placeholders};
use super::condition_key::ConditionKey;

/// A resource type as it appears in the provider's reference, before
/// its ARN pattern is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDefinition {
    pub name: String,
    pub arn_format: String,
    pub condition_keys: Vec<String>,
}

impl ResourceDefinition {
    pub fn new(name: &str, arn_format: &str) -> Self {
        ResourceDefinition { name: name.to_string(), arn_format: arn_format.to_string(), condition_keys: vec![] }
    }

    pub fn condition_key(mut self, name: &str) -> Self {
        self.condition_keys.push(name.to_string());
        self
    }
}

impl TryFrom<&json::JsonValue> for ResourceDefinition {
    type Error = json::Error;

    fn try_from(value: &json::JsonValue) -> json::Result<Self> {
        let name = value["Name"].as_str()
            .ok_or_else(|| json::Error::wrong_type("expected resource Name to be a string"))?
            .to_string();
        // The provider lists formats as an array; only one per type is supported.
        let formats = &value["ARNFormats"];
        let arn_format = if formats.is_array() {
            if formats.len() != 1 {
                return Err(json::Error::wrong_type("expected resource ARNFormats to hold exactly one pattern"));
            }
            formats[0].as_str()
        } else {
            value["ARNFormat"].as_str()
        }.ok_or_else(|| json::Error::wrong_type("expected resource ARNFormat to be a string"))?
            .to_string();
        let keys = &value["ConditionKeys"];
        let condition_keys = if keys.is_null() {
            vec![]
        } else if keys.is_array() {
            keys.members().map(|key| key.as_str().map(String::from)
                .ok_or_else(|| json::Error::wrong_type("expected resource ConditionKeys to be strings")))
                .collect::<json::Result<Vec<_>>>()?
        } else {
            return Err(json::Error::wrong_type("expected resource ConditionKeys to be an array"));
        };
        Ok(ResourceDefinition { name, arn_format, condition_keys })
    }
}

/// A resource type of a built service entry, with its parsed ARN template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceType {
    name: String,
    template: ArnTemplate,
    condition_keys: Vec<ConditionKey>,
}

impl ResourceType {
    pub(crate) fn new(name: String, template: ArnTemplate, condition_keys: Vec<ConditionKey>) -> Self {
        ResourceType { name, template, condition_keys }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &ArnTemplate {
        &self.template
    }

    pub fn placeholder_names(&self) -> &[String] {
        self.template.placeholder_names()
    }

    pub fn condition_keys(&self) -> &[ConditionKey] {
        &self.condition_keys
    }

    pub fn render(&self, values: &Placeholders) -> String {
        self.template.render(values)
    }
}

#[cfg(test)]
mod test {
    use super::ResourceDefinition;

    #[test]
    fn parse_single_format() {
        let value = json::parse(r#"{
            "Name": "apps",
            "ARNFormat": "arn:${partition}:amplify:${region}:${account}:apps/${appId}",
            "ConditionKeys": ["aws:ResourceTag/${TagKey}"]
        }"#).unwrap();
        let definition = ResourceDefinition::try_from(&value).unwrap();
        assert_eq!(definition, ResourceDefinition::new("apps", "arn:${partition}:amplify:${region}:${account}:apps/${appId}")
            .condition_key("aws:ResourceTag/${TagKey}"));
    }

    #[test]
    fn parse_format_array() {
        let value = json::parse(r#"{"Name": "bucket", "ARNFormats": ["arn:${partition}:s3:::${bucketName}"]}"#).unwrap();
        let definition = ResourceDefinition::try_from(&value).unwrap();
        assert_eq!(definition.arn_format, "arn:${partition}:s3:::${bucketName}");
        assert!(definition.condition_keys.is_empty());
    }

    #[test]
    fn parse_errors() {
        for input in [
            r#"{"ARNFormat": "arn:aws:s3:::x"}"#,
            r#"{"Name": "bucket"}"#,
            r#"{"Name": "bucket", "ARNFormats": []}"#,
            r#"{"Name": "bucket", "ARNFormats": ["arn:aws:s3:::a", "arn:aws:s3:::b"]}"#,
            r#"{"Name": "bucket", "ARNFormat": "arn:aws:s3:::x", "ConditionKeys": "s3:prefix"}"#,
        ] {
            let value = json::parse(input).unwrap();
            assert!(ResourceDefinition::try_from(&value).is_err(), "{} should not parse", input);
        }
    }
}
