use std::str::FromStr;

use anyhow::anyhow;

/// Value type a condition key is compared against in a policy.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum ConditionKeyType {
	String,
	ArrayOfString,
	Arn,
	ArrayOfArn,
	Numeric,
	ArrayOfNumeric,
	Date,
	Bool,
	ArrayOfBool,
	IpAddress,
	Binary,
}

impl ConditionKeyType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::String => "String",
			Self::ArrayOfString => "ArrayOfString",
			Self::Arn => "ARN",
			Self::ArrayOfArn => "ArrayOfARN",
			Self::Numeric => "Numeric",
			Self::ArrayOfNumeric => "ArrayOfNumeric",
			Self::Date => "Date",
			Self::Bool => "Bool",
			Self::ArrayOfBool => "ArrayOfBool",
			Self::IpAddress => "IPAddress",
			Self::Binary => "Binary",
		}
	}

	pub fn is_multivalued(&self) -> bool {
		matches!(self, Self::ArrayOfString | Self::ArrayOfArn | Self::ArrayOfNumeric | Self::ArrayOfBool)
	}
}

impl std::fmt::Display for ConditionKeyType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ConditionKeyType {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> anyhow::Result<Self> {
		let value_type = match s {
			"String" => Self::String,
			"ArrayOfString" => Self::ArrayOfString,
			"ARN" | "Arn" => Self::Arn,
			"ArrayOfARN" | "ArrayOfArn" => Self::ArrayOfArn,
			"Numeric" => Self::Numeric,
			"ArrayOfNumeric" => Self::ArrayOfNumeric,
			"Date" => Self::Date,
			"Bool" | "Boolean" => Self::Bool,
			"ArrayOfBool" => Self::ArrayOfBool,
			"IPAddress" | "IpAddress" => Self::IpAddress,
			"Binary" => Self::Binary,
			_ => return Err(anyhow!("unrecognized condition key type '{}'", s)),
		};
		Ok(value_type)
	}
}

/// A condition key as documented by the provider. Descriptive only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionKey {
	pub name: String,
	pub value_type: ConditionKeyType,
	pub description: String,
}

impl ConditionKey {
	pub fn new(name: &str, value_type: ConditionKeyType, description: &str) -> Self {
		ConditionKey { name: name.to_string(), value_type, description: description.to_string() }
	}

	/// The `svc` in `svc:Key`, if present.
	pub fn service(&self) -> Option<&str> {
		self.name.split_once(':').map(|(service, _)| service)
	}
}

impl TryFrom<&json::JsonValue> for ConditionKey {
	type Error = json::Error;

	fn try_from(value: &json::JsonValue) -> json::Result<Self> {
		let name = value["Name"].as_str()
			.ok_or_else(|| json::Error::wrong_type("expected condition key Name to be a string"))?;
		let types = &value["Types"];
		let value_type = if types.is_array() {
			types.members().next().and_then(|t| t.as_str())
		} else {
			types.as_str()
		}.ok_or_else(|| json::Error::wrong_type("expected condition key Types to name a type"))?;
		let value_type = value_type.parse()
			.map_err(|_| json::Error::wrong_type("expected condition key Types to name a known type"))?;
		let description = value["Description"].as_str().unwrap_or_default();
		Ok(ConditionKey::new(name, value_type, description))
	}
}

mod table {
	use super::ConditionKeyType::{self, *};

	// Keys every service accepts, all under the "aws:" prefix.
	// See: https://docs.aws.amazon.com/IAM/latest/UserGuide/reference_policies_condition-keys.html
	pub(super) const GLOBAL: &[(&str, ConditionKeyType, &str)] = &[
		("CalledVia", ArrayOfString, "Services that made requests on behalf of the principal"),
		("CalledViaFirst", String, "First service that made a request on behalf of the principal"),
		("CalledViaLast", String, "Last service that made a request on behalf of the principal"),
		("CurrentTime", Date, "Date and time of the request"),
		("EpochTime", Date, "Date and time of the request in epoch format"),
		("FederatedProvider", String, "Identity provider that issued the principal's credentials"),
		("MultiFactorAuthAge", Numeric, "Seconds since the principal authenticated with MFA"),
		("MultiFactorAuthPresent", Bool, "Whether MFA was used to authenticate the request"),
		("PrincipalAccount", String, "Account the requesting principal belongs to"),
		("PrincipalArn", Arn, "ARN of the requesting principal"),
		("PrincipalIsAWSService", Bool, "Whether the request is made by a service principal"),
		("PrincipalOrgID", String, "Organization of the requesting principal"),
		("PrincipalOrgPaths", ArrayOfString, "Organization paths of the requesting principal"),
		("PrincipalServiceName", String, "Name of the requesting service principal"),
		("PrincipalServiceNamesList", ArrayOfString, "Names of the requesting service principal"),
		// Used in the form aws:PrincipalTag/tag-key
		("PrincipalTag", String, "Tag attached to the requesting principal"),
		("PrincipalType", String, "Type of the requesting principal"),
		("Referer", String, "HTTP referer of the request"),
		("RequestedRegion", String, "Region the request was made to"),
		// Used in the form aws:RequestTag/tag-key
		("RequestTag", String, "Tag key-value pair passed in the request"),
		("ResourceAccount", String, "Account that owns the requested resource"),
		("ResourceOrgID", String, "Organization of the account that owns the resource"),
		("ResourceOrgPaths", ArrayOfString, "Organization paths of the account that owns the resource"),
		// Used in the form aws:ResourceTag/tag-key
		("ResourceTag", String, "Tag key-value pair attached to the resource"),
		("SecureTransport", Bool, "Whether the request was sent over TLS"),
		("SourceAccount", String, "Account of the resource making a service-to-service request"),
		("SourceArn", Arn, "ARN of the resource making a service-to-service request"),
		("SourceIdentity", String, "Source identity set by the principal"),
		("SourceIp", IpAddress, "IP address of the requester"),
		("SourceVpc", String, "VPC the request came through"),
		("SourceVpce", String, "VPC endpoint the request came through"),
		("TagKeys", ArrayOfString, "Tag keys passed in the request"),
		("TokenIssueTime", Date, "Date and time temporary credentials were issued"),
		("UserAgent", String, "Client application of the requester"),
		("userid", String, "Identifier of the requesting principal"),
		("username", String, "Friendly name of the requesting user"),
		("ViaAWSService", Bool, "Whether a service made the request on behalf of the principal"),
		("VpcSourceIp", IpAddress, "IP address of a request made through a VPC endpoint"),
	];
}

/// Looks up an `aws:` key, e.g. `aws:TagKeys` or `aws:RequestTag/${TagKey}`.
/// Condition key names are case-insensitive.
pub fn global(name: &str) -> Option<ConditionKey> {
	let (prefix, key) = name.split_once(':')?;
	if !prefix.eq_ignore_ascii_case("aws") {
		return None;
	}
	let base = key.split('/').next().unwrap_or(key);
	table::GLOBAL.iter()
		.find(|(known, _, _)| known.eq_ignore_ascii_case(base))
		.map(|(_, value_type, description)| ConditionKey::new(name, *value_type, description))
}

#[cfg(test)]
mod test {
	use super::{global, ConditionKey, ConditionKeyType};

	#[test]
	fn global_keys_resolve() {
		let key = global("aws:TagKeys").unwrap();
		assert_eq!(key.value_type, ConditionKeyType::ArrayOfString);
		assert!(key.value_type.is_multivalued());
		assert_eq!(key.service(), Some("aws"));
	}

	#[test]
	fn global_keys_with_tag_suffix() {
		let key = global("aws:ResourceTag/${TagKey}").unwrap();
		assert_eq!(key.name, "aws:ResourceTag/${TagKey}");
		assert_eq!(key.value_type, ConditionKeyType::String);
	}

	#[test]
	fn global_keys_ignore_case() {
		assert!(global("aws:UserName").is_some());
		assert!(global("AWS:sourceip").is_some());
	}

	#[test]
	fn unknown_global_keys() {
		assert!(global("aws:NotAKey").is_none());
		assert!(global("s3:prefix").is_none());
		assert!(global("TagKeys").is_none());
	}

	#[test]
	fn parse_from_json() {
		let value = json::parse(r#"{"Name": "ecr:ResourceTag/${TagKey}", "Types": ["String"], "Description": "Tag on the repository"}"#).unwrap();
		let key = ConditionKey::try_from(&value).unwrap();
		assert_eq!(key, ConditionKey::new("ecr:ResourceTag/${TagKey}", ConditionKeyType::String, "Tag on the repository"));

		let value = json::parse(r#"{"Name": "s3:x", "Types": "ArrayOfARN"}"#).unwrap();
		assert_eq!(ConditionKey::try_from(&value).unwrap().value_type, ConditionKeyType::ArrayOfArn);

		let value = json::parse(r#"{"Name": "s3:x", "Types": ["Complex"]}"#).unwrap();
		assert!(ConditionKey::try_from(&value).is_err());
	}
}
