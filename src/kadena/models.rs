// src/kadena/models.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// --- Operations ---

/// A transaction-generation action supported by the Kadena transaction API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "transfer")]
    Transfer,
    #[serde(rename = "swap")]
    Swap,
    #[serde(rename = "quote")]
    Quote,
    #[serde(rename = "nft/launch")]
    LaunchNft,
    #[serde(rename = "nft/collection")]
    CreateCollection,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Quote,
        Operation::Transfer,
        Operation::Swap,
        Operation::LaunchNft,
        Operation::CreateCollection,
    ];

    /// Canonical name, which is also the endpoint path on the transaction API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Transfer => "transfer",
            Operation::Swap => "swap",
            Operation::Quote => "quote",
            Operation::LaunchNft => "nft/launch",
            Operation::CreateCollection => "nft/collection",
        }
    }

    /// Resolves a canonical name or one of the legacy aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().trim_start_matches('/') {
            "transfer" => Some(Operation::Transfer),
            "swap" => Some(Operation::Swap),
            "quote" => Some(Operation::Quote),
            "nft/launch" | "mint_nft" | "launch-nft" => Some(Operation::LaunchNft),
            "nft/collection" | "create_collection" | "create-collection" => {
                Some(Operation::CreateCollection)
            }
            _ => None,
        }
    }

    pub fn allowed_names() -> Vec<String> {
        Self::ALL.iter().map(|op| op.as_str().to_string()).collect()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Parameter sets ---

/// Parameters submitted for one operation invocation, forwarded verbatim
/// to the transaction API once validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(Map<String, Value>);

impl ParameterSet {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String view of a field; numbers are rendered in their JSON form.
    pub fn get_text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ParameterSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ParameterSet {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ValidationError::NotAnObject(type_name(&other))),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// --- Chain identifier policy ---

/// How the `chainId` field is checked. Deployments disagree on this, so it
/// is chosen per deployment through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChainIdPolicy {
    Range { min: i64, max: i64 },
    Exact { value: i64 },
}

impl Default for ChainIdPolicy {
    fn default() -> Self {
        ChainIdPolicy::Range { min: 0, max: 19 }
    }
}

impl ChainIdPolicy {
    pub fn allows(&self, chain_id: i64) -> bool {
        match *self {
            ChainIdPolicy::Range { min, max } => (min..=max).contains(&chain_id),
            ChainIdPolicy::Exact { value } => chain_id == value,
        }
    }

    /// One-line description used in error messages and prompt docs.
    pub fn describe(&self) -> String {
        match *self {
            ChainIdPolicy::Range { min, max } => format!("Must be between {} and {}", min, max),
            ChainIdPolicy::Exact { value } => format!("Currently only chainId {} is supported", value),
        }
    }
}

impl FromStr for ChainIdPolicy {
    type Err = anyhow::Error;

    /// Accepts `range:<min>-<max>` or `exact:<value>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("expected 'range:<min>-<max>' or 'exact:<value>', got '{}'", s))?;
        match kind.to_lowercase().as_str() {
            "range" => {
                // The separator is the first '-' after the minimum's own sign.
                let rest = rest.trim();
                let (min, max) = rest
                    .char_indices()
                    .skip(1)
                    .find(|&(_, c)| c == '-')
                    .map(|(i, _)| (&rest[..i], &rest[i + 1..]))
                    .ok_or_else(|| anyhow::anyhow!("range policy needs '<min>-<max>', got '{}'", rest))?;
                let min: i64 = min.trim().parse()?;
                let max: i64 = max.trim().parse()?;
                if min > max {
                    anyhow::bail!("range policy has min {} greater than max {}", min, max);
                }
                Ok(ChainIdPolicy::Range { min, max })
            }
            "exact" => Ok(ChainIdPolicy::Exact {
                value: rest.trim().parse()?,
            }),
            other => anyhow::bail!("unknown chain id policy '{}'", other),
        }
    }
}

// --- Validation errors ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid endpoint '{operation}'. Must be one of: {}", .allowed.join(", "))]
    UnknownOperation {
        operation: String,
        allowed: Vec<String>,
    },
    #[error("Cannot specify both {first} and {second} for {operation}")]
    ConflictingParameters {
        operation: Operation,
        first: &'static str,
        second: &'static str,
    },
    #[error("Must specify either {first} or {second} for {operation}")]
    MissingAmount {
        operation: Operation,
        first: &'static str,
        second: &'static str,
    },
    #[error("Missing required parameters: {}", format_field_list(.0))]
    MissingParameters(Vec<String>),
    #[error("Invalid {field}. {policy}")]
    InvalidRange {
        field: &'static str,
        value: String,
        policy: String,
    },
    #[error("Parameters must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

fn format_field_list(fields: &[String]) -> String {
    let quoted: Vec<String> = fields.iter().map(|f| format!("'{}'", f)).collect();
    format!("[{}]", quoted.join(", "))
}

impl ValidationError {
    /// The `{"error": ...}` object returned to callers.
    pub fn to_json(&self) -> Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_canonical_operations() {
        assert_eq!(Operation::from_name("mint_nft"), Some(Operation::LaunchNft));
        assert_eq!(Operation::from_name("launch-nft"), Some(Operation::LaunchNft));
        assert_eq!(Operation::from_name("create_collection"), Some(Operation::CreateCollection));
        assert_eq!(Operation::from_name("/swap"), Some(Operation::Swap));
        assert_eq!(Operation::from_name("stake"), None);
    }

    #[test]
    fn parses_chain_id_policies() {
        assert_eq!(
            "range:0-19".parse::<ChainIdPolicy>().unwrap(),
            ChainIdPolicy::Range { min: 0, max: 19 }
        );
        assert_eq!(
            "exact:2".parse::<ChainIdPolicy>().unwrap(),
            ChainIdPolicy::Exact { value: 2 }
        );
        assert_eq!(
            "range:-1-19".parse::<ChainIdPolicy>().unwrap(),
            ChainIdPolicy::Range { min: -1, max: 19 }
        );
        assert_eq!(
            "range:-5--1".parse::<ChainIdPolicy>().unwrap(),
            ChainIdPolicy::Range { min: -5, max: -1 }
        );
        assert!("range:19-0".parse::<ChainIdPolicy>().is_err());
        assert!("range:7".parse::<ChainIdPolicy>().is_err());
        assert!("between:0-19".parse::<ChainIdPolicy>().is_err());
    }

    #[test]
    fn missing_parameters_message_lists_every_field() {
        let err = ValidationError::MissingParameters(vec!["account".into(), "chainId".into()]);
        assert_eq!(
            err.to_string(),
            "Missing required parameters: ['account', 'chainId']"
        );
        assert_eq!(err.to_json()["error"], err.to_string());
    }
}
