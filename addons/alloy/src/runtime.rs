//! The harness runtime: one network, one artifact store, an optional
//! deployments backend, and the accessor surface scripts drive.

use std::sync::Arc;

use alloy::primitives::Address;
use error_stack::Report;

use evm_harness_kit::artifacts::{ArtifactStore, ContractArtifact};
use evm_harness_kit::deployments::{DeploymentsBackend, DeploymentsContext};
use evm_harness_kit::indexmap::IndexMap;
use evm_harness_kit::network::NetworkConfig;

use crate::codec::abi::annotate_abi_with_gas;
use crate::codec::linking::link_bytecode;
use crate::contracts::{
    AbiSource, ContractFactory, DeployedContract, FactoryOptions, FactorySource, SignerSelector,
};
use crate::errors::{
    ArtifactError, ContractError, DeploymentsError, HarnessError, HarnessResult, SignerError,
};
use crate::rpc::EvmRpc;
use crate::signers::{derive_wallets, HarnessSigner, SecretKeySigner};

/// Name used in error messages for contracts built from raw abi + bytecode.
const INLINE_CONTRACT_NAME: &str = "<inline>";

fn deployments_report(e: DeploymentsError) -> Report<HarnessError> {
    Report::new(HarnessError::Deployments(e))
}

/// One network's worth of harness state. Wallets are derived once from the
/// accounts configuration; everything else is fetched per call.
pub struct AlloyRuntime {
    pub network: NetworkConfig,
    pub rpc: EvmRpc,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub deployments: DeploymentsContext,
    wallets: Vec<SecretKeySigner>,
}

impl AlloyRuntime {
    pub fn new(
        network: NetworkConfig,
        artifacts: Arc<dyn ArtifactStore>,
        deployments: DeploymentsContext,
    ) -> HarnessResult<Self> {
        let rpc = EvmRpc::new(&network.rpc_api_url)?;
        let wallets = derive_wallets(&network.accounts)
            .map_err(|e| Report::new(HarnessError::Signer(e)))?;
        Ok(Self { network, rpc, artifacts, deployments, wallets })
    }

    fn expect_backend(&self) -> HarnessResult<&Arc<dyn DeploymentsBackend>> {
        self.deployments.expect_backend().map_err(deployments_report)
    }

    /// The managed account list: locally derived wallets when the network
    /// configures them, the node's `eth_accounts` otherwise.
    pub async fn get_accounts(&self) -> HarnessResult<Vec<Address>> {
        if self.wallets.is_empty() {
            self.rpc.get_accounts().await
        } else {
            Ok(self.wallets.iter().map(|wallet| wallet.address()).collect())
        }
    }

    fn local_signer_for(&self, address: &Address) -> Option<HarnessSigner> {
        self.wallets
            .iter()
            .find(|wallet| wallet.address() == *address)
            .map(|wallet| HarnessSigner::from_wallet(wallet.clone()))
    }

    pub async fn get_signer_or_null(
        &self,
        address: &Address,
    ) -> HarnessResult<Option<HarnessSigner>> {
        if let Some(signer) = self.local_signer_for(address) {
            return Ok(Some(signer));
        }
        if self.wallets.is_empty() {
            let accounts = self.rpc.get_accounts().await?;
            if accounts.contains(address) {
                return Ok(Some(HarnessSigner::node_managed(*address)));
            }
        }
        Ok(None)
    }

    pub async fn get_signer(&self, address: &Address) -> HarnessResult<HarnessSigner> {
        match self.get_signer_or_null(address).await? {
            Some(signer) => Ok(signer),
            None => Err(Report::new(HarnessError::Signer(SignerError::NoSignerFound(
                address.to_string(),
            )))),
        }
    }

    /// One signer per managed account, in listing order.
    pub async fn get_signers(&self) -> HarnessResult<Vec<HarnessSigner>> {
        if self.wallets.is_empty() {
            let accounts = self.rpc.get_accounts().await?;
            Ok(accounts.into_iter().map(HarnessSigner::node_managed).collect())
        } else {
            Ok(self.wallets.iter().cloned().map(HarnessSigner::from_wallet).collect())
        }
    }

    pub async fn get_named_signer(&self, name: &str) -> HarnessResult<HarnessSigner> {
        let backend = self.expect_backend()?;
        let named = backend.named_accounts().await.map_err(deployments_report)?;
        let Some(address) = named.get(name) else {
            return Err(Report::new(HarnessError::Signer(SignerError::NoNamedAccount(
                name.to_string(),
            ))));
        };
        self.get_signer(address).await
    }

    pub async fn get_named_signer_or_null(
        &self,
        name: &str,
    ) -> HarnessResult<Option<HarnessSigner>> {
        let backend = self.expect_backend()?;
        let named = backend.named_accounts().await.map_err(deployments_report)?;
        match named.get(name) {
            Some(address) => self.get_signer_or_null(address).await,
            None => Ok(None),
        }
    }

    /// Signers for every named account the backend can actually sign for.
    /// Accounts that resolve to no signer are skipped with a warning rather
    /// than failing the whole listing.
    pub async fn get_named_signers(&self) -> HarnessResult<IndexMap<String, HarnessSigner>> {
        let backend = self.expect_backend()?;
        let named = backend.named_accounts().await.map_err(deployments_report)?;

        let mut signers = IndexMap::new();
        for (name, address) in named.iter() {
            match self.get_signer_or_null(address).await {
                Ok(Some(signer)) => {
                    signers.insert(name.clone(), signer);
                }
                Ok(None) => {
                    tracing::warn!(
                        "skipping named account '{}': no signer available for {}",
                        name,
                        address
                    );
                }
                Err(e) => {
                    tracing::warn!("skipping named account '{}': {}", name, e);
                }
            }
        }
        Ok(signers)
    }

    pub async fn get_unnamed_signers(&self) -> HarnessResult<Vec<HarnessSigner>> {
        let backend = self.expect_backend()?;
        let unnamed = backend.unnamed_accounts().await.map_err(deployments_report)?;

        let mut signers = Vec::with_capacity(unnamed.len());
        for address in unnamed.iter() {
            match self.get_signer_or_null(address).await {
                Ok(Some(signer)) => signers.push(signer),
                Ok(None) => {
                    tracing::warn!("skipping unnamed account {}: no signer available", address);
                }
                Err(e) => {
                    tracing::warn!("skipping unnamed account {}: {}", address, e);
                }
            }
        }
        Ok(signers)
    }

    /// Reads an artifact by contract name. An installed deployments backend
    /// is authoritative; otherwise the configured artifact store serves the
    /// read.
    pub async fn get_artifact(&self, contract_name: &str) -> HarnessResult<ContractArtifact> {
        if let Some(backend) = &self.deployments.backend {
            let artifact =
                backend.read_artifact(contract_name).await.map_err(deployments_report)?;
            return artifact.ok_or_else(|| {
                Report::new(HarnessError::Artifact(ArtifactError::NotFound(
                    contract_name.to_string(),
                )))
            });
        }

        self.artifacts
            .read_artifact(contract_name)
            .await
            .map_err(|e| Report::new(HarnessError::Artifact(e)))
    }

    async fn resolve_selector(
        &self,
        selector: Option<SignerSelector>,
    ) -> HarnessResult<Option<HarnessSigner>> {
        match selector {
            None => Ok(None),
            Some(SignerSelector::Handle(signer)) => Ok(Some(signer)),
            Some(SignerSelector::Address(address)) => {
                Ok(Some(self.get_signer(&address).await?))
            }
        }
    }

    /// Builds a deployment-ready factory: artifact fetched, libraries
    /// linked, abi gas annotated, signer resolved.
    pub async fn get_contract_factory(
        &self,
        source: FactorySource,
        options: FactoryOptions,
    ) -> HarnessResult<ContractFactory> {
        let artifact = match source {
            FactorySource::Named(name) => self.get_artifact(&name).await?,
            FactorySource::Artifact(artifact) => artifact,
            FactorySource::Inline { abi, bytecode } => ContractArtifact {
                contract_name: INLINE_CONTRACT_NAME.to_string(),
                source_name: String::new(),
                abi,
                bytecode,
                deployed_bytecode: None,
                link_references: IndexMap::new(),
                deployed_link_references: IndexMap::new(),
            },
        };

        if artifact.is_abstract() {
            return Err(Report::new(HarnessError::Contract(ContractError::AbstractContract(
                artifact.contract_name.clone(),
            ))));
        }

        let linked = link_bytecode(&artifact, &options.libraries)
            .map_err(|e| Report::new(HarnessError::Link(e)))?;
        let abi = annotate_abi_with_gas(&artifact.abi, self.network.gas);
        let signer = self.resolve_selector(options.signer).await?;

        ContractFactory::new(&artifact.contract_name, abi, &linked, signer, self.rpc.clone())
            .map_err(|e| Report::new(HarnessError::Contract(e)))
    }

    /// A handle over a contract already sitting at `address`.
    pub async fn get_contract_at(
        &self,
        source: AbiSource,
        address: Address,
        signer: Option<SignerSelector>,
    ) -> HarnessResult<DeployedContract> {
        let (contract_name, abi) = match source {
            AbiSource::Named(name) => {
                let artifact = self.get_artifact(&name).await?;
                (artifact.contract_name.clone(), artifact.abi)
            }
            AbiSource::Artifact(artifact) => (artifact.contract_name.clone(), artifact.abi),
            AbiSource::Inline(abi) => (INLINE_CONTRACT_NAME.to_string(), abi),
        };

        let abi = annotate_abi_with_gas(&abi, self.network.gas);
        let signer = self.resolve_selector(signer).await?;

        DeployedContract::new(&contract_name, address, abi, signer, self.rpc.clone())
            .map_err(|e| Report::new(HarnessError::Contract(e)))
    }

    /// Resolves a recorded deployment into a contract handle.
    pub async fn get_contract(
        &self,
        contract_name: &str,
        signer: Option<SignerSelector>,
    ) -> HarnessResult<DeployedContract> {
        match self.get_contract_or_null(contract_name, signer).await? {
            Some(contract) => Ok(contract),
            None => Err(Report::new(HarnessError::Contract(ContractError::NotDeployed(
                contract_name.to_string(),
            )))),
        }
    }

    pub async fn get_contract_or_null(
        &self,
        contract_name: &str,
        signer: Option<SignerSelector>,
    ) -> HarnessResult<Option<DeployedContract>> {
        let backend = self.expect_backend()?;
        let Some(deployment) =
            backend.get_deployment(contract_name).await.map_err(deployments_report)?
        else {
            return Ok(None);
        };

        let abi = annotate_abi_with_gas(&deployment.abi, self.network.gas);
        let signer = self.resolve_selector(signer).await?;
        let contract =
            DeployedContract::new(contract_name, deployment.address, abi, signer, self.rpc.clone())
                .map_err(|e| Report::new(HarnessError::Contract(e)))?;
        Ok(Some(contract))
    }
}
