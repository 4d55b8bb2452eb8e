// src/kadena/validator.rs

use serde_json::Value;

use super::models::{ChainIdPolicy, Operation, ParameterSet, ValidationError};
use super::registry::Registry;

/// Checks a parameter set against the registry before it is sent to the
/// transaction API.
///
/// Rules run in a fixed order and the first failure is returned:
/// operation lookup, the amount-in/amount-out group, required fields, then
/// the chain id policy. The parameters are returned unchanged on success.
pub fn validate(
    registry: &Registry,
    policy: &ChainIdPolicy,
    operation: &str,
    params: ParameterSet,
) -> Result<ParameterSet, ValidationError> {
    let op = Operation::from_name(operation).ok_or_else(|| ValidationError::UnknownOperation {
        operation: operation.to_string(),
        allowed: Operation::allowed_names(),
    })?;
    let descriptor = registry.descriptor(op);

    if let Some([first, second]) = descriptor.conditional_group {
        match (params.contains(first), params.contains(second)) {
            (true, true) => {
                return Err(ValidationError::ConflictingParameters {
                    operation: op,
                    first,
                    second,
                })
            }
            (false, false) => {
                return Err(ValidationError::MissingAmount {
                    operation: op,
                    first,
                    second,
                })
            }
            _ => {}
        }
    }

    let missing: Vec<String> = descriptor
        .required_fields
        .iter()
        .filter(|field| !params.contains(field))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingParameters(missing));
    }

    if let Some(field) = descriptor.numeric_constraint {
        if let Some(value) = params.get(field) {
            check_chain_id(field, value, policy)?;
        }
    }

    Ok(params)
}

fn check_chain_id(
    field: &'static str,
    value: &Value,
    policy: &ChainIdPolicy,
) -> Result<(), ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(chain_id) if policy.allows(chain_id) => Ok(()),
        _ => Err(ValidationError::InvalidRange {
            field,
            value: value.to_string(),
            policy: policy.describe(),
        }),
    }
}
