//! The deployments backend boundary: deployment records, named accounts and
//! the optional plugin that owns them.

use std::fmt::Debug;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use alloy_primitives::Address;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::artifacts::{ArtifactStore, ContractArtifact};
use crate::errors::{ArtifactError, DeploymentsError};

/// One deployed contract as recorded by the deployments backend, in the
/// `deployments/<network>/<Contract>.json` format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// Not part of the on-disk record; filled from the record's key.
    #[serde(default)]
    pub contract_name: String,
    pub address: Address,
    pub abi: Vec<JsonValue>,
    #[serde(default)]
    pub bytecode: Option<String>,
    #[serde(default)]
    pub deployed_bytecode: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl Deployment {
    pub fn new(contract_name: impl Into<String>, address: Address, abi: Vec<JsonValue>) -> Self {
        Self {
            contract_name: contract_name.into(),
            address,
            abi,
            bytecode: None,
            deployed_bytecode: None,
            transaction_hash: None,
        }
    }
}

/// The external collaborator owning deployment records, named accounts and
/// (optionally) extended artifact knowledge.
pub trait DeploymentsBackend: Debug + Send + Sync {
    fn get_deployment<'a>(
        &'a self,
        contract_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Deployment>, DeploymentsError>> + Send + 'a>>;

    /// Logical account names in declaration order.
    fn named_accounts(
        &self,
    ) -> Pin<
        Box<dyn Future<Output = Result<IndexMap<String, Address>, DeploymentsError>> + Send + '_>,
    >;

    /// Accounts beyond the named ones, in listing order.
    fn unnamed_accounts(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Address>, DeploymentsError>> + Send + '_>>;

    /// Artifact knowledge of the backend, if it has any. `None` means the
    /// backend does not know the contract, not that it failed.
    fn read_artifact<'a>(
        &'a self,
        contract_name: &'a str,
    ) -> Pin<
        Box<dyn Future<Output = Result<Option<ContractArtifact>, DeploymentsError>> + Send + 'a>,
    >;
}

/// Carries the optional deployments backend. The backend is injected once at
/// construction; operations that need it fail with
/// [`DeploymentsError::NoBackend`] when none was installed.
#[derive(Clone, Debug)]
pub struct DeploymentsContext {
    pub backend: Option<Arc<dyn DeploymentsBackend>>,
}

impl DeploymentsContext {
    pub fn new(backend: Option<Arc<dyn DeploymentsBackend>>) -> Self {
        Self { backend }
    }

    pub fn empty() -> Self {
        Self { backend: None }
    }

    pub fn expect_backend(&self) -> Result<&Arc<dyn DeploymentsBackend>, DeploymentsError> {
        self.backend.as_ref().ok_or(DeploymentsError::NoBackend)
    }
}

/// Deployments backend for tests and ephemeral setups.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDeployments {
    deployments: IndexMap<String, Deployment>,
    artifacts: IndexMap<String, ContractArtifact>,
    named_accounts: IndexMap<String, Address>,
    unnamed_accounts: Vec<Address>,
}

impl InMemoryDeployments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deployment(mut self, deployment: Deployment) -> Self {
        self.deployments.insert(deployment.contract_name.clone(), deployment);
        self
    }

    pub fn with_artifact(mut self, artifact: ContractArtifact) -> Self {
        self.artifacts.insert(artifact.contract_name.clone(), artifact);
        self
    }

    pub fn with_named_account(mut self, name: impl Into<String>, address: Address) -> Self {
        self.named_accounts.insert(name.into(), address);
        self
    }

    pub fn with_unnamed_accounts(mut self, accounts: Vec<Address>) -> Self {
        self.unnamed_accounts = accounts;
        self
    }
}

impl DeploymentsBackend for InMemoryDeployments {
    fn get_deployment<'a>(
        &'a self,
        contract_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Deployment>, DeploymentsError>> + Send + 'a>>
    {
        Box::pin(async move { Ok(self.deployments.get(contract_name).cloned()) })
    }

    fn named_accounts(
        &self,
    ) -> Pin<
        Box<dyn Future<Output = Result<IndexMap<String, Address>, DeploymentsError>> + Send + '_>,
    > {
        Box::pin(async move { Ok(self.named_accounts.clone()) })
    }

    fn unnamed_accounts(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Address>, DeploymentsError>> + Send + '_>> {
        Box::pin(async move { Ok(self.unnamed_accounts.clone()) })
    }

    fn read_artifact<'a>(
        &'a self,
        contract_name: &'a str,
    ) -> Pin<
        Box<dyn Future<Output = Result<Option<ContractArtifact>, DeploymentsError>> + Send + 'a>,
    > {
        Box::pin(async move { Ok(self.artifacts.get(contract_name).cloned()) })
    }
}

/// Deployments backend over a hardhat-deploy style
/// `deployments/<network>/` directory. Account lists are supplied at
/// construction; artifact reads can be delegated to an [`ArtifactStore`].
#[derive(Clone, Debug)]
pub struct DirDeploymentsStore {
    deployments_dir: PathBuf,
    named_accounts: IndexMap<String, Address>,
    unnamed_accounts: Vec<Address>,
    artifacts: Option<Arc<dyn ArtifactStore>>,
}

impl DirDeploymentsStore {
    pub fn new(deployments_dir: impl Into<PathBuf>) -> Self {
        Self {
            deployments_dir: deployments_dir.into(),
            named_accounts: IndexMap::new(),
            unnamed_accounts: vec![],
            artifacts: None,
        }
    }

    pub fn with_named_accounts(mut self, accounts: IndexMap<String, Address>) -> Self {
        self.named_accounts = accounts;
        self
    }

    pub fn with_unnamed_accounts(mut self, accounts: Vec<Address>) -> Self {
        self.unnamed_accounts = accounts;
        self
    }

    pub fn with_artifact_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.artifacts = Some(store);
        self
    }
}

impl DeploymentsBackend for DirDeploymentsStore {
    fn get_deployment<'a>(
        &'a self,
        contract_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Deployment>, DeploymentsError>> + Send + 'a>>
    {
        Box::pin(async move {
            let path = self.deployments_dir.join(format!("{}.json", contract_name));
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => {
                    return Err(DeploymentsError::Backend(format!(
                        "failed to read {}: {}",
                        path.display(),
                        e
                    )))
                }
            };
            let mut deployment: Deployment =
                serde_json::from_slice(&bytes).map_err(|e| DeploymentsError::Malformed {
                    contract_name: contract_name.to_string(),
                    message: e.to_string(),
                })?;
            deployment.contract_name = contract_name.to_string();
            Ok(Some(deployment))
        })
    }

    fn named_accounts(
        &self,
    ) -> Pin<
        Box<dyn Future<Output = Result<IndexMap<String, Address>, DeploymentsError>> + Send + '_>,
    > {
        Box::pin(async move { Ok(self.named_accounts.clone()) })
    }

    fn unnamed_accounts(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Address>, DeploymentsError>> + Send + '_>> {
        Box::pin(async move { Ok(self.unnamed_accounts.clone()) })
    }

    fn read_artifact<'a>(
        &'a self,
        contract_name: &'a str,
    ) -> Pin<
        Box<dyn Future<Output = Result<Option<ContractArtifact>, DeploymentsError>> + Send + 'a>,
    > {
        Box::pin(async move {
            let Some(store) = &self.artifacts else {
                return Ok(None);
            };
            match store.read_artifact(contract_name).await {
                Ok(artifact) => Ok(Some(artifact)),
                Err(ArtifactError::NotFound(_)) => Ok(None),
                Err(e) => Err(DeploymentsError::Backend(e.to_string())),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::InMemoryArtifacts;
    use serde_json::json;
    use tempfile::TempDir;

    fn address(fill: u8) -> Address {
        Address::repeat_byte(fill)
    }

    fn deployment_record() -> String {
        json!({
            "address": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "abi": [
                { "type": "function", "name": "total", "inputs": [], "outputs": [], "stateMutability": "view" }
            ],
            "transactionHash": "0x7b9a...aa",
            "receipt": { "status": 1 },
            "args": []
        })
        .to_string()
    }

    #[test]
    fn test_no_backend_error() {
        let context = DeploymentsContext::empty();
        assert_eq!(context.expect_backend().unwrap_err(), DeploymentsError::NoBackend);

        let backend: Arc<dyn DeploymentsBackend> = Arc::new(InMemoryDeployments::new());
        let context = DeploymentsContext::new(Some(backend));
        assert!(context.expect_backend().is_ok());
    }

    #[tokio::test]
    async fn test_named_account_order() {
        let backend = InMemoryDeployments::new()
            .with_named_account("deployer", address(0x11))
            .with_named_account("treasury", address(0x22))
            .with_named_account("auditor", address(0x33));

        let named = backend.named_accounts().await.unwrap();
        let names: Vec<&str> = named.keys().map(|name| name.as_str()).collect();
        assert_eq!(names, ["deployer", "treasury", "auditor"]);
    }

    #[tokio::test]
    async fn test_read_deployment_from_disk() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Vault.json"), deployment_record()).unwrap();

        let store = DirDeploymentsStore::new(dir.path());
        let deployment = store.get_deployment("Vault").await.unwrap().unwrap();
        assert_eq!(deployment.contract_name, "Vault");
        assert_eq!(
            deployment.address,
            "0x5fbdb2315678afecb367f032d93f642f64180aa3".parse::<Address>().unwrap()
        );
        assert_eq!(deployment.abi.len(), 1);

        assert_eq!(store.get_deployment("Treasury").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_deployment_record() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Vault.json"), "{\"address\": 42}").unwrap();

        let store = DirDeploymentsStore::new(dir.path());
        assert!(matches!(
            store.get_deployment("Vault").await.unwrap_err(),
            DeploymentsError::Malformed { .. }
        ));
    }

    #[tokio::test]
    async fn test_artifact_reads_delegate_to_store() {
        let artifact = ContractArtifact {
            contract_name: "Vault".to_string(),
            source_name: "contracts/Vault.sol".to_string(),
            abi: vec![],
            bytecode: "0x6080".to_string(),
            deployed_bytecode: None,
            link_references: Default::default(),
            deployed_link_references: Default::default(),
        };
        let dir = TempDir::new().unwrap();

        let bare = DirDeploymentsStore::new(dir.path());
        assert_eq!(bare.read_artifact("Vault").await.unwrap(), None);

        let store = DirDeploymentsStore::new(dir.path())
            .with_artifact_store(Arc::new(InMemoryArtifacts::new().with(artifact.clone())));
        assert_eq!(store.read_artifact("Vault").await.unwrap(), Some(artifact));
        assert_eq!(store.read_artifact("Treasury").await.unwrap(), None);
    }
}
