//! Network definitions consumed by the harness runtime.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const DEFAULT_DEVNET_RPC_API_URL: &str = "http://localhost:8545";
pub const DEFAULT_DEVNET_CHAIN_ID: u64 = 31337;
/// The stock mnemonic funded by anvil and hardhat-style local nodes.
pub const DEFAULT_DEVNET_MNEMONIC: &str =
    "test test test test test test test test test test test junk";
pub const DEFAULT_DERIVATION_PATH_PREFIX: &str = "m/44'/60'/0'/0/";
pub const DEFAULT_DERIVED_ACCOUNTS: u32 = 20;

/// Gas limit applied to contract interactions on a network: either left to
/// the node ("auto") or pinned to a fixed number of units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GasSetting {
    Auto,
    Limit(u64),
}

impl GasSetting {
    pub fn limit(&self) -> Option<u64> {
        match self {
            GasSetting::Auto => None,
            GasSetting::Limit(gas) => Some(*gas),
        }
    }
}

impl Default for GasSetting {
    fn default() -> Self {
        GasSetting::Auto
    }
}

impl Serialize for GasSetting {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            GasSetting::Auto => serializer.serialize_str("auto"),
            GasSetting::Limit(gas) => serializer.serialize_u64(*gas),
        }
    }
}

impl<'de> Deserialize<'de> for GasSetting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum GasRepr {
            Text(String),
            Units(u64),
        }

        match GasRepr::deserialize(deserializer)? {
            GasRepr::Text(keyword) if keyword == "auto" => Ok(GasSetting::Auto),
            GasRepr::Text(other) => Err(DeError::custom(format!(
                "expected \"auto\" or a number of gas units, got \"{}\"",
                other
            ))),
            GasRepr::Units(gas) => Ok(GasSetting::Limit(gas)),
        }
    }
}

/// Where a network's transaction-signing accounts come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountsConfig {
    /// The node manages the keys; the account list is served by
    /// `eth_accounts`.
    NodeManaged,
    /// Accounts derived locally from a BIP-39 phrase, one per index under
    /// `derivation_path_prefix`.
    Mnemonic { phrase: String, derivation_path_prefix: String, count: u32 },
    /// Explicit hex-encoded private keys.
    PrivateKeys(Vec<String>),
}

impl Default for AccountsConfig {
    fn default() -> Self {
        AccountsConfig::NodeManaged
    }
}

fn default_derivation_path_prefix() -> String {
    DEFAULT_DERIVATION_PATH_PREFIX.to_string()
}

fn default_account_count() -> u32 {
    DEFAULT_DERIVED_ACCOUNTS
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AccountsRepr {
    Keyword(String),
    Keys(Vec<String>),
    Mnemonic {
        mnemonic: String,
        #[serde(default = "default_derivation_path_prefix")]
        derivation_path_prefix: String,
        #[serde(default = "default_account_count")]
        count: u32,
    },
}

impl Serialize for AccountsConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let repr = match self {
            AccountsConfig::NodeManaged => AccountsRepr::Keyword("node".to_string()),
            AccountsConfig::Mnemonic { phrase, derivation_path_prefix, count } => {
                AccountsRepr::Mnemonic {
                    mnemonic: phrase.clone(),
                    derivation_path_prefix: derivation_path_prefix.clone(),
                    count: *count,
                }
            }
            AccountsConfig::PrivateKeys(keys) => AccountsRepr::Keys(keys.clone()),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AccountsConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match AccountsRepr::deserialize(deserializer)? {
            AccountsRepr::Keyword(keyword) if keyword == "node" || keyword == "remote" => {
                Ok(AccountsConfig::NodeManaged)
            }
            AccountsRepr::Keyword(other) => Err(DeError::custom(format!(
                "expected \"node\", a list of private keys, or a mnemonic table, got \"{}\"",
                other
            ))),
            AccountsRepr::Keys(keys) => Ok(AccountsConfig::PrivateKeys(keys)),
            AccountsRepr::Mnemonic { mnemonic, derivation_path_prefix, count } => {
                Ok(AccountsConfig::Mnemonic { phrase: mnemonic, derivation_path_prefix, count })
            }
        }
    }
}

/// One network the harness can target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Filled from the table key when loaded from a harness configuration
    /// file.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub rpc_api_url: String,
    pub chain_id: u64,
    #[serde(default)]
    pub gas: GasSetting,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u64>,
    #[serde(default)]
    pub accounts: AccountsConfig,
}

impl NetworkConfig {
    /// Anvil-style local devnet with node-managed accounts.
    pub fn devnet() -> Self {
        Self {
            name: "localhost".to_string(),
            rpc_api_url: DEFAULT_DEVNET_RPC_API_URL.to_string(),
            chain_id: DEFAULT_DEVNET_CHAIN_ID,
            gas: GasSetting::Auto,
            gas_price: None,
            accounts: AccountsConfig::NodeManaged,
        }
    }

    /// Local devnet signing with wallets derived from the stock devnet
    /// mnemonic instead of relying on `eth_accounts`.
    pub fn devnet_wallets() -> Self {
        Self {
            accounts: AccountsConfig::Mnemonic {
                phrase: DEFAULT_DEVNET_MNEMONIC.to_string(),
                derivation_path_prefix: DEFAULT_DERIVATION_PATH_PREFIX.to_string(),
                count: DEFAULT_DERIVED_ACCOUNTS,
            },
            ..Self::devnet()
        }
    }
}

lazy_static! {
    /// The network used when the harness configuration names none.
    pub static ref DEFAULT_DEVNET_NETWORK: NetworkConfig = NetworkConfig::devnet();
}
