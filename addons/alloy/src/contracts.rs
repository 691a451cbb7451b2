//! Typed contract factories and deployed contract handles.

use alloy::contract::{ContractInstance, Interface};
use alloy::dyn_abi::DynSolValue;
use alloy::hex;
use alloy::json_abi::JsonAbi;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxKind};
use alloy::rpc::types::TransactionRequest;
use serde_json::Value as JsonValue;

use evm_harness_kit::artifacts::ContractArtifact;

use crate::codec::create_init_code;
use crate::codec::linking::LibraryBinding;
use crate::errors::ContractError;
use crate::rpc::{EvmRpc, HttpProvider};
use crate::signers::HarnessSigner;

/// Where a factory's abi and bytecode come from.
#[derive(Clone, Debug)]
pub enum FactorySource {
    /// Look the artifact up by contract name, bare or fully qualified
    Named(String),
    /// Use an artifact the caller already holds
    Artifact(ContractArtifact),
    /// Raw abi descriptors plus creation bytecode hex
    Inline { abi: Vec<JsonValue>, bytecode: String },
}

/// Where a deployed contract's abi comes from.
#[derive(Clone, Debug)]
pub enum AbiSource {
    Named(String),
    Artifact(ContractArtifact),
    Inline(Vec<JsonValue>),
}

/// How a caller picks the signer for a factory or handle.
#[derive(Clone, Debug)]
pub enum SignerSelector {
    Handle(HarnessSigner),
    Address(Address),
}

/// Options applied while building a contract factory.
#[derive(Clone, Debug, Default)]
pub struct FactoryOptions {
    pub signer: Option<SignerSelector>,
    pub libraries: Vec<LibraryBinding>,
}

impl FactoryOptions {
    pub fn with_signer(mut self, selector: SignerSelector) -> Self {
        self.signer = Some(selector);
        self
    }

    pub fn with_libraries(mut self, libraries: Vec<LibraryBinding>) -> Self {
        self.libraries = libraries;
        self
    }
}

fn parse_abi(abi: &[JsonValue]) -> Result<JsonAbi, ContractError> {
    serde_json::from_value(JsonValue::Array(abi.to_vec()))
        .map_err(|e| ContractError::Abi(format!("invalid contract abi: {}", e)))
}

/// Builds deployment requests for one contract. Carries the artifact's
/// bytecode already linked and its abi already gas annotated.
#[derive(Clone, Debug)]
pub struct ContractFactory {
    pub contract_name: String,
    pub abi: Vec<JsonValue>,
    pub json_abi: JsonAbi,
    pub interface: Interface,
    pub bytecode: Bytes,
    pub signer: Option<HarnessSigner>,
    pub rpc: EvmRpc,
}

impl ContractFactory {
    /// `abi` is the gas annotated descriptor list, `bytecode` the linked
    /// creation hex.
    pub fn new(
        contract_name: &str,
        abi: Vec<JsonValue>,
        bytecode: &str,
        signer: Option<HarnessSigner>,
        rpc: EvmRpc,
    ) -> Result<Self, ContractError> {
        let stripped = bytecode.trim_start_matches("0x");
        if stripped.is_empty() {
            return Err(ContractError::AbstractContract(contract_name.to_string()));
        }
        let bytecode: Bytes = hex::decode(stripped)
            .map_err(|e| ContractError::InvalidBytecode(e.to_string()))?
            .into();
        let json_abi = parse_abi(&abi)?;
        let interface = Interface::new(json_abi.clone());

        Ok(Self {
            contract_name: contract_name.to_string(),
            abi,
            json_abi,
            interface,
            bytecode,
            signer,
            rpc,
        })
    }

    /// Builds the deployment transaction: linked bytecode plus abi encoded
    /// constructor arguments, sender taken from the factory's signer.
    pub fn deploy_request(
        &self,
        constructor_args: Option<Vec<DynSolValue>>,
    ) -> Result<TransactionRequest, ContractError> {
        let init_code = create_init_code(
            &self.bytecode,
            constructor_args,
            &self.json_abi,
            &self.contract_name,
        )?;

        let mut tx = TransactionRequest::default()
            .with_deploy_code(init_code)
            .with_kind(TxKind::Create);
        if let Some(signer) = &self.signer {
            tx = signer.fill_from(tx);
        }
        Ok(tx)
    }

    /// Pins the factory's abi to an already deployed address.
    pub fn attach(&self, address: Address) -> DeployedContract {
        DeployedContract {
            contract_name: self.contract_name.clone(),
            address,
            abi: self.abi.clone(),
            interface: self.interface.clone(),
            signer: self.signer.clone(),
            rpc: self.rpc.clone(),
        }
    }

    /// The same factory, bound to another signer.
    pub fn connect(&self, signer: HarnessSigner) -> Self {
        let mut factory = self.clone();
        factory.signer = Some(signer);
        factory
    }
}

/// A contract pinned to an on chain address.
#[derive(Clone, Debug)]
pub struct DeployedContract {
    pub contract_name: String,
    pub address: Address,
    pub abi: Vec<JsonValue>,
    pub interface: Interface,
    pub signer: Option<HarnessSigner>,
    pub rpc: EvmRpc,
}

impl DeployedContract {
    pub fn new(
        contract_name: &str,
        address: Address,
        abi: Vec<JsonValue>,
        signer: Option<HarnessSigner>,
        rpc: EvmRpc,
    ) -> Result<Self, ContractError> {
        let interface = Interface::new(parse_abi(&abi)?);
        Ok(Self { contract_name: contract_name.to_string(), address, abi, interface, signer, rpc })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// An alloy contract instance over the harness HTTP provider.
    pub fn instance(&self) -> ContractInstance<HttpProvider> {
        ContractInstance::new(self.address, self.rpc.provider.clone(), self.interface.clone())
    }

    /// Builds a call to `function`: abi encoded input, `to` and `from`
    /// filled.
    pub fn call_request(
        &self,
        function: &str,
        args: &[DynSolValue],
    ) -> Result<TransactionRequest, ContractError> {
        let data = self
            .interface
            .encode_input(function, args)
            .map_err(|e| ContractError::Abi(format!("failed to encode contract inputs: {}", e)))?;

        let mut tx = TransactionRequest::default().with_to(self.address).with_input(data);
        if let Some(signer) = &self.signer {
            tx = signer.fill_from(tx);
        }
        Ok(tx)
    }

    /// The same handle, bound to another signer.
    pub fn connect(&self, signer: HarnessSigner) -> Self {
        let mut contract = self.clone();
        contract.signer = Some(signer);
        contract
    }
}
