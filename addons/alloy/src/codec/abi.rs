//! Abi shaping applied before interfaces are handed to callers.

use serde_json::Value as JsonValue;

use evm_harness_kit::network::GasSetting;

use crate::constants::{ABI_GAS, ABI_TYPE, ABI_TYPE_FUNCTION, CALL_GAS_SAFETY_MARGIN};

/// Stamps a call gas hint onto every function entry of an abi. Under
/// [`GasSetting::Auto`] the descriptors pass through untouched; under a fixed
/// limit each function entry gains a `"gas"` field carrying the limit minus
/// [`CALL_GAS_SAFETY_MARGIN`], hex encoded. Non-function entries and the
/// input slice are never modified.
pub fn annotate_abi_with_gas(abi: &[JsonValue], gas: GasSetting) -> Vec<JsonValue> {
    let Some(limit) = gas.limit() else {
        return abi.to_vec();
    };
    let call_gas = limit.saturating_sub(CALL_GAS_SAFETY_MARGIN);

    abi.iter()
        .map(|entry| {
            let is_function = entry
                .get(ABI_TYPE)
                .and_then(|kind| kind.as_str())
                .map_or(false, |kind| kind.eq(ABI_TYPE_FUNCTION));
            if !is_function {
                return entry.clone();
            }
            let mut annotated = entry.clone();
            if let Some(fields) = annotated.as_object_mut() {
                fields.insert(ABI_GAS.to_string(), JsonValue::String(format!("{:#x}", call_gas)));
            }
            annotated
        })
        .collect()
}
