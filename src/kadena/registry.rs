//! Static registry of supported operations and known tokens.
//!
//! Built once at startup and shared read-only through `AppState`. The raw
//! token catalog text is kept alongside the parsed form so prompts can embed
//! it unchanged.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::models::{ChainIdPolicy, Operation};

const TOKENS_YAML: &str = include_str!("../../data/tokens.yaml");

/// Field checked against the deployment's chain id policy.
pub const CHAIN_ID_FIELD: &str = "chainId";

/// Exactly-one-of group shared by `swap` and `quote`.
const AMOUNT_GROUP: [&str; 2] = ["amountIn", "amountOut"];

/// Static description of one operation's parameters.
#[derive(Debug, Clone, Serialize)]
pub struct OperationDescriptor {
    pub operation: Operation,
    pub description: &'static str,
    pub required_fields: &'static [&'static str],
    pub optional_fields: &'static [&'static str],
    /// Exactly one of these two fields must be supplied.
    pub conditional_group: Option<[&'static str; 2]>,
    /// Integer field constrained by the chain id policy.
    pub numeric_constraint: Option<&'static str>,
}

static DESCRIPTORS: [OperationDescriptor; 5] = [
    OperationDescriptor {
        operation: Operation::Quote,
        description: "Get price quotes for swapping tokens",
        required_fields: &["tokenInAddress", "tokenOutAddress", "chainId"],
        optional_fields: &[],
        conditional_group: Some(AMOUNT_GROUP),
        numeric_constraint: Some(CHAIN_ID_FIELD),
    },
    OperationDescriptor {
        operation: Operation::Transfer,
        description: "Transfer tokens from one account to another",
        required_fields: &["tokenAddress", "sender", "receiver", "amount", "chainId"],
        optional_fields: &["meta", "gasLimit", "gasPrice", "ttl"],
        conditional_group: None,
        numeric_constraint: Some(CHAIN_ID_FIELD),
    },
    OperationDescriptor {
        operation: Operation::Swap,
        description: "Swap one token for another using Kaddex/EchoDEX",
        required_fields: &["tokenInAddress", "tokenOutAddress", "account", "chainId"],
        optional_fields: &["slippage"],
        conditional_group: Some(AMOUNT_GROUP),
        numeric_constraint: Some(CHAIN_ID_FIELD),
    },
    OperationDescriptor {
        operation: Operation::LaunchNft,
        description: "Create and mint an NFT on Marmalade v2",
        required_fields: &["account", "guard", "mintTo", "uri", "collectionId", "chainId"],
        optional_fields: &[
            "precision",
            "policy",
            "royalties",
            "royaltyRecipient",
            "name",
            "description",
        ],
        conditional_group: None,
        numeric_constraint: Some(CHAIN_ID_FIELD),
    },
    OperationDescriptor {
        operation: Operation::CreateCollection,
        description: "Create a new NFT collection",
        required_fields: &["account", "guard", "name", "chainId"],
        optional_fields: &["description", "totalSupply"],
        conditional_group: None,
        numeric_constraint: Some(CHAIN_ID_FIELD),
    },
];

// --- Token catalog ---

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Social {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub socials: Vec<Social>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenCatalog {
    #[serde(default)]
    pub mainnet: BTreeMap<String, TokenInfo>,
    #[serde(default)]
    pub testnet: BTreeMap<String, TokenInfo>,
    #[serde(default)]
    pub blacklist: Vec<String>,
}

impl TokenCatalog {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Invalid token catalog YAML")
    }

    /// Looks up a mainnet token by contract address (e.g. `kaddex.kdx`).
    pub fn token(&self, address: &str) -> Option<&TokenInfo> {
        self.mainnet.get(address)
    }

    /// Case-insensitive symbol lookup, returning the contract address.
    pub fn address_for_symbol(&self, symbol: &str) -> Option<&str> {
        self.mainnet
            .iter()
            .find(|(_, info)| info.symbol.eq_ignore_ascii_case(symbol))
            .map(|(address, _)| address.as_str())
    }

    pub fn is_blacklisted(&self, address: &str) -> bool {
        self.blacklist.iter().any(|entry| entry == address)
    }
}

// --- Registry ---

/// Operation descriptors plus the token catalog.
#[derive(Debug, Clone)]
pub struct Registry {
    tokens: TokenCatalog,
    tokens_text: String,
}

impl Registry {
    /// Loads the catalog bundled with the binary.
    pub fn load() -> Result<Self> {
        Self::from_tokens_yaml(TOKENS_YAML)
    }

    pub fn from_tokens_yaml(text: &str) -> Result<Self> {
        Ok(Self {
            tokens: TokenCatalog::from_yaml(text)?,
            tokens_text: text.to_string(),
        })
    }

    pub fn descriptor(&self, operation: Operation) -> &'static OperationDescriptor {
        DESCRIPTORS
            .iter()
            .find(|d| d.operation == operation)
            .unwrap_or_else(|| unreachable!("every operation has a descriptor"))
    }

    pub fn descriptors(&self) -> &'static [OperationDescriptor] {
        &DESCRIPTORS
    }

    pub fn tokens(&self) -> &TokenCatalog {
        &self.tokens
    }

    /// The catalog exactly as shipped, for prompt embedding.
    pub fn tokens_text(&self) -> &str {
        &self.tokens_text
    }

    /// Renders the operation table as the API documentation given to the model.
    pub fn api_docs(&self, policy: &ChainIdPolicy) -> Value {
        let mut docs = serde_json::Map::new();
        for d in self.descriptors() {
            let mut entry = json!({
                "description": d.description,
                "required_params": d.required_fields,
                "optional_params": d.optional_fields,
                "endpoint": format!("/{}", d.operation.as_str()),
            });
            if let Some([first, second]) = d.conditional_group {
                entry["conditional_params"] = json!([
                    { "name": first, "condition": format!("Either {} or {} must be provided, not both", first, second) },
                    { "name": second, "condition": format!("Either {} or {} must be provided, not both", first, second) },
                ]);
            }
            if let Some(field) = d.numeric_constraint {
                entry["constraints"] = json!({ field: policy.describe() });
            }
            docs.insert(d.operation.as_str().to_string(), entry);
        }
        Value::Object(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_parses() {
        let registry = Registry::load().unwrap();
        let kda = registry.tokens().token("coin").unwrap();
        assert_eq!(kda.symbol, "KDA");
        assert_eq!(kda.precision, Some(12));
        assert_eq!(registry.tokens().address_for_symbol("kdx"), Some("kaddex.kdx"));
        assert!(registry.tokens().is_blacklisted("free.elon"));
        assert!(!registry.tokens().is_blacklisted("coin"));
        assert!(registry.tokens_text().contains("blacklist:"));
    }

    #[test]
    fn every_operation_has_a_descriptor() {
        let registry = Registry::load().unwrap();
        for op in Operation::ALL {
            let d = registry.descriptor(op);
            assert_eq!(d.operation, op);
            assert!(d.required_fields.contains(&CHAIN_ID_FIELD));
        }
        assert_eq!(
            registry.descriptor(Operation::Swap).conditional_group,
            Some(["amountIn", "amountOut"])
        );
        assert!(registry.descriptor(Operation::Transfer).conditional_group.is_none());
    }

    #[test]
    fn api_docs_reflect_chain_policy() {
        let registry = Registry::load().unwrap();
        let docs = registry.api_docs(&ChainIdPolicy::Exact { value: 2 });
        assert_eq!(docs["swap"]["endpoint"], "/swap");
        assert_eq!(
            docs["transfer"]["constraints"]["chainId"],
            "Currently only chainId 2 is supported"
        );
        assert!(docs["quote"]["conditional_params"].is_array());
        assert!(docs["nft/launch"].get("conditional_params").is_none());
    }
}
