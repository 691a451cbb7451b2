//! Harness-specific error types.

use error_stack::{Context, Report};
use std::fmt;
use thiserror::Error;

pub use evm_harness_kit::errors::{ArtifactError, ConfigError, DeploymentsError};

pub type HarnessResult<T> = Result<T, Report<HarnessError>>;

/// Errors raised while resolving library bindings against an artifact's link
/// references.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    /// A binding's address does not parse as an account address
    #[error("invalid address '{address}' for library '{id}'")]
    InvalidAddress { id: String, address: String },

    /// A binding names a library the contract does not link against
    #[error("no linkable library matches '{id}'; libraries needed by the contract: {needed}")]
    UnknownLibrary { id: String, needed: String },

    /// A bare library name matches link slots under several source files
    #[error("library name '{id}' is ambiguous, use a fully qualified name; candidates: {candidates}")]
    AmbiguousLibraryName { id: String, candidates: String },

    /// The same library was bound twice in one call
    #[error("library '{0}' is linked more than once")]
    DuplicateLinkEntry(String),

    /// Link references remain unbound after all bindings were resolved
    #[error("missing addresses for linked libraries: {0}")]
    MissingLibraries(String),

    /// A declared link slot does not fit inside the bytecode
    #[error("link slot for '{fully_qualified_name}' at byte {start} (length {length}) exceeds the {bytecode_bytes}-byte bytecode")]
    SlotOutOfRange {
        fully_qualified_name: String,
        start: u32,
        length: u32,
        bytecode_bytes: usize,
    },
}

/// Errors raised while resolving signers
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SignerError {
    /// The address is not in the managed account list
    #[error("no signer available for address {0}")]
    NoSignerFound(String),

    /// The deployments backend knows no account under this logical name
    #[error("no account named '{0}' is configured on the deployments backend")]
    NoNamedAccount(String),

    /// The network's accounts configuration cannot produce wallets
    #[error("invalid accounts configuration: {0}")]
    InvalidAccountsConfig(String),
}

/// Errors raised while building factories, instances and their requests
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    /// The contract compiled to empty bytecode
    #[error("contract '{0}' is abstract and cannot be deployed")]
    AbstractContract(String),

    /// No deployment record exists for the contract
    #[error("no deployment found for contract '{0}'")]
    NotDeployed(String),

    /// The artifact's bytecode is not valid hex
    #[error("invalid contract bytecode: {0}")]
    InvalidBytecode(String),

    /// ABI parsing or encoding failed
    #[error("{0}")]
    Abi(String),

    /// The abi declares a constructor with arguments but none were provided
    #[error("no constructor arguments provided, but the abi for '{contract_name}' has a constructor expecting {expected} argument(s)")]
    MissingConstructorArgs { contract_name: String, expected: usize },

    /// Constructor arguments were provided but the abi has no constructor
    #[error("constructor arguments provided, but the abi for '{0}' has no constructor")]
    UnexpectedConstructorArgs(String),
}

/// Errors surfaced by the JSON-RPC node
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RpcError {
    #[error("{0}")]
    NodeError(String),
}

/// Top level error context for the harness runtime surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HarnessError {
    Link(LinkError),
    Signer(SignerError),
    Contract(ContractError),
    Artifact(ArtifactError),
    Deployments(DeploymentsError),
    Config(ConfigError),
    Rpc(RpcError),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Link(e) => write!(f, "{}", e),
            HarnessError::Signer(e) => write!(f, "{}", e),
            HarnessError::Contract(e) => write!(f, "{}", e),
            HarnessError::Artifact(e) => write!(f, "{}", e),
            HarnessError::Deployments(e) => write!(f, "{}", e),
            HarnessError::Config(e) => write!(f, "{}", e),
            HarnessError::Rpc(e) => write!(f, "{}", e),
        }
    }
}

impl Context for HarnessError {}

/// Request details attached to RPC failure reports
#[derive(Clone, Debug)]
pub struct RpcContext {
    pub endpoint: String,
    pub method: String,
    pub params: Option<String>,
}

impl fmt::Display for RpcContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.params {
            Some(params) => write!(f, "{} {} to {}", self.method, params, self.endpoint),
            None => write!(f, "{} to {}", self.method, self.endpoint),
        }
    }
}
