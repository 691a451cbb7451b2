//! Error types shared by the harness-side collaborators.

use thiserror::Error;

/// Errors raised while looking up or parsing compiled contract artifacts
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ArtifactError {
    /// No artifact matches the requested contract name
    #[error("no artifact found for contract '{0}'")]
    NotFound(String),

    /// Several artifacts share the requested bare contract name
    #[error("artifact name '{name}' is ambiguous; matching contracts: {candidates}")]
    Ambiguous {
        /// The bare name that was looked up
        name: String,
        /// Comma separated fully qualified candidates
        candidates: String,
    },

    /// Reading an artifact file from disk failed
    #[error("failed to read artifact at {path}: {message}")]
    Io { path: String, message: String },

    /// An artifact file exists but does not parse
    #[error("invalid artifact at {path}: {message}")]
    Malformed { path: String, message: String },
}

/// Errors raised by the deployments backend boundary
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeploymentsError {
    /// No deployments backend was injected into the runtime
    #[error("no deployments backend installed")]
    NoBackend,

    /// The installed backend failed to serve a request
    #[error("deployments backend failure: {0}")]
    Backend(String),

    /// A deployment record exists but does not parse
    #[error("invalid deployment record for contract '{contract_name}': {message}")]
    Malformed { contract_name: String, message: String },
}

/// Errors raised while loading the harness configuration
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested network has no entry in the configuration
    #[error("network '{0}' is not defined in the harness configuration")]
    UnknownNetwork(String),

    /// Reading the configuration file failed
    #[error("failed to read harness configuration at {path}: {message}")]
    Io { path: String, message: String },

    /// The configuration file does not parse
    #[error("failed to parse harness configuration at {path}: {message}")]
    Parse { path: String, message: String },

    /// A configuration field holds a value the harness cannot use
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}
