//! Compiled contract artifacts and the stores that serve them.

use std::future::Future;
use std::pin::Pin;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::errors::ArtifactError;

pub mod foundry;
pub mod hardhat;

pub use foundry::FoundryArtifactStore;
pub use hardhat::HardhatArtifactStore;

pub use foundry_compilers_artifacts_solc::Offsets;

/// Link references as emitted by solc: source file -> library name -> byte
/// ranges of the bytecode where that library's address must be written.
pub type LinkReferences = IndexMap<String, IndexMap<String, Vec<Offsets>>>;

/// One compiled contract, in the hardhat artifact format. Produced by an
/// external compiler; read-only to the harness.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: Vec<JsonValue>,
    pub bytecode: String,
    #[serde(default)]
    pub deployed_bytecode: Option<String>,
    #[serde(default)]
    pub link_references: LinkReferences,
    #[serde(default)]
    pub deployed_link_references: LinkReferences,
}

impl ContractArtifact {
    /// The solc-style `"<sourceName>:<contractName>"` identifier.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Abstract contracts compile to an empty bytecode string.
    pub fn is_abstract(&self) -> bool {
        self.bytecode.trim_start_matches("0x").is_empty()
    }
}

/// Splits a contract identifier into its optional source part and its bare
/// contract name. `"contracts/Vault.sol:Vault"` -> `(Some(..), "Vault")`.
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once(':') {
        Some((source, contract)) => (Some(source), contract),
        None => (None, name),
    }
}

/// Serves compiled artifacts by bare contract name or by fully qualified
/// `"<sourceName>:<contractName>"` name.
pub trait ArtifactStore: std::fmt::Debug + Send + Sync {
    fn read_artifact<'a>(
        &'a self,
        contract_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ContractArtifact, ArtifactError>> + Send + 'a>>;
}

/// Name-keyed artifact map for tests and ephemeral setups.
#[derive(Clone, Debug, Default)]
pub struct InMemoryArtifacts {
    artifacts: IndexMap<String, ContractArtifact>,
}

impl InMemoryArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, artifact: ContractArtifact) {
        self.artifacts.insert(artifact.fully_qualified_name(), artifact);
    }

    pub fn with(mut self, artifact: ContractArtifact) -> Self {
        self.insert(artifact);
        self
    }
}

impl ArtifactStore for InMemoryArtifacts {
    fn read_artifact<'a>(
        &'a self,
        contract_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ContractArtifact, ArtifactError>> + Send + 'a>> {
        Box::pin(async move {
            let (source, bare) = split_qualified_name(contract_name);
            if source.is_some() {
                return self
                    .artifacts
                    .get(contract_name)
                    .cloned()
                    .ok_or_else(|| ArtifactError::NotFound(contract_name.to_string()));
            }

            let matches: Vec<&ContractArtifact> =
                self.artifacts.values().filter(|a| a.contract_name == bare).collect();
            match matches.as_slice() {
                [] => Err(ArtifactError::NotFound(contract_name.to_string())),
                [artifact] => Ok((*artifact).clone()),
                candidates => Err(ArtifactError::Ambiguous {
                    name: contract_name.to_string(),
                    candidates: candidates
                        .iter()
                        .map(|a| a.fully_qualified_name())
                        .collect::<Vec<_>>()
                        .join(", "),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const VAULT_ARTIFACT: &str = indoc! {r#"
        {
          "_format": "hh-sol-artifact-1",
          "contractName": "Vault",
          "sourceName": "contracts/Vault.sol",
          "abi": [
            { "type": "constructor", "inputs": [], "stateMutability": "nonpayable" },
            { "type": "function", "name": "sweep", "inputs": [], "outputs": [], "stateMutability": "nonpayable" }
          ],
          "bytecode": "0x608060405260aa",
          "deployedBytecode": "0x608060405260aa",
          "linkReferences": {
            "contracts/math/SafeMath.sol": {
              "SafeMath": [{ "start": 3, "length": 20 }]
            }
          },
          "deployedLinkReferences": {}
        }
    "#};

    fn vault() -> ContractArtifact {
        serde_json::from_str(VAULT_ARTIFACT).unwrap()
    }

    fn named(source_name: &str, contract_name: &str) -> ContractArtifact {
        ContractArtifact {
            contract_name: contract_name.to_string(),
            source_name: source_name.to_string(),
            ..vault()
        }
    }

    #[test]
    fn test_hardhat_artifact_parsing() {
        let artifact = vault();
        assert_eq!(artifact.fully_qualified_name(), "contracts/Vault.sol:Vault");
        assert_eq!(artifact.abi.len(), 2);
        let slots = &artifact.link_references["contracts/math/SafeMath.sol"]["SafeMath"];
        assert_eq!(slots[0].start, 3);
        assert_eq!(slots[0].length, 20);
        assert!(!artifact.is_abstract());
    }

    #[test]
    fn test_empty_bytecode_is_abstract() {
        let artifact = ContractArtifact { bytecode: "0x".to_string(), ..vault() };
        assert!(artifact.is_abstract());
    }

    #[tokio::test]
    async fn test_lookup_by_bare_and_qualified_name() {
        let store = InMemoryArtifacts::new().with(vault());
        assert_eq!(store.read_artifact("Vault").await.unwrap().contract_name, "Vault");
        let qualified = store.read_artifact("contracts/Vault.sol:Vault").await.unwrap();
        assert_eq!(qualified.source_name, "contracts/Vault.sol");
        assert!(matches!(
            store.read_artifact("Treasury").await.unwrap_err(),
            ArtifactError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_ambiguous_bare_name_rejected() {
        let store = InMemoryArtifacts::new()
            .with(named("contracts/a/Vault.sol", "Vault"))
            .with(named("contracts/b/Vault.sol", "Vault"));

        let err = store.read_artifact("Vault").await.unwrap_err();
        match err {
            ArtifactError::Ambiguous { candidates, .. } => {
                assert!(candidates.contains("contracts/a/Vault.sol:Vault"));
                assert!(candidates.contains("contracts/b/Vault.sol:Vault"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_qualified_name_disambiguation() {
        let store = InMemoryArtifacts::new()
            .with(named("contracts/a/Vault.sol", "Vault"))
            .with(named("contracts/b/Vault.sol", "Vault"));

        let artifact = store.read_artifact("contracts/b/Vault.sol:Vault").await.unwrap();
        assert_eq!(artifact.source_name, "contracts/b/Vault.sol");
    }
}
