pub mod abi;
pub mod linking;


pub use abi::annotate_abi_with_gas;
pub use linking::{
    link_bytecode, needed_libraries, resolve_links, LibraryBinding, LibraryId, NeededLibrary,
    ResolvedLink,
};

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::JsonAbi;

use crate::errors::ContractError;

/// Builds deployment init code: linked creation bytecode followed by the abi
/// encoded constructor arguments. The abi decides whether arguments are
/// required or forbidden.
pub fn create_init_code(
    bytecode: &[u8],
    constructor_args: Option<Vec<DynSolValue>>,
    json_abi: &JsonAbi,
    contract_name: &str,
) -> Result<Vec<u8>, ContractError> {
    let mut init_code = bytecode.to_vec();

    match constructor_args {
        Some(constructor_args) => {
            let Some(constructor) = &json_abi.constructor else {
                return Err(ContractError::UnexpectedConstructorArgs(contract_name.to_string()));
            };
            let mut abi_encoded_args = constructor.abi_encode_input(&constructor_args).map_err(
                |e| ContractError::Abi(format!("failed to encode constructor args: {}", e)),
            )?;
            init_code.append(&mut abi_encoded_args);
        }
        None => {
            if let Some(constructor) = &json_abi.constructor {
                if !constructor.inputs.is_empty() {
                    return Err(ContractError::MissingConstructorArgs {
                        contract_name: contract_name.to_string(),
                        expected: constructor.inputs.len(),
                    });
                }
            }
        }
    }

    Ok(init_code)
}
