// src/kadena/mod.rs

pub mod client;
pub mod models;
pub mod registry;
pub mod validator;

// Re-export commonly used types
pub use client::{AnalysisClient, ClientError, TransactionClient};
pub use models::{ChainIdPolicy, Operation, ParameterSet, ValidationError};
pub use registry::Registry;
pub use validator::validate;
