#[macro_use]
extern crate serde_derive;

pub mod codec;
pub mod constants;
pub mod contracts;
pub mod errors;
pub mod rpc;
pub mod runtime;
pub mod signers;

pub use evm_harness_kit as kit;

pub use codec::{annotate_abi_with_gas, link_bytecode, LibraryBinding, LibraryId};
pub use contracts::{
    AbiSource, ContractFactory, DeployedContract, FactoryOptions, FactorySource, SignerSelector,
};
pub use errors::{HarnessError, HarnessResult};
pub use rpc::EvmRpc;
pub use runtime::AlloyRuntime;
pub use signers::{HarnessSigner, SecretKeySigner};
