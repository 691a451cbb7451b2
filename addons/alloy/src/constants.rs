// Abi descriptor keys rewritten by the gas annotation pass
pub const ABI_TYPE: &str = "type";
pub const ABI_TYPE_FUNCTION: &str = "function";
pub const ABI_GAS: &str = "gas";

/// Units held back from a network's fixed gas limit when stamping call gas
/// onto abi function entries, so annotated calls stay under the block limit.
pub const CALL_GAS_SAFETY_MARGIN: u64 = 1_000_000;
