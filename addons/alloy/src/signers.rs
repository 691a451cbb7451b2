//! Signer handles resolved from the node's account list or a locally
//! configured wallet set.

use alloy::hex;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::k256::ecdsa::SigningKey;
use alloy_signer_local::{coins_bip39::English, LocalSigner, MnemonicBuilder};

use evm_harness_kit::network::AccountsConfig;

use crate::errors::SignerError;

pub type SecretKeySigner = LocalSigner<SigningKey>;

/// What actually signs for an account: the node itself, or a locally held
/// key derived from the network's accounts configuration.
#[derive(Clone, Debug)]
pub enum SignerBackend {
    Node,
    Wallet(SecretKeySigner),
}

/// A handle bound to one account address. The handle shapes requests, it
/// never broadcasts anything itself.
#[derive(Clone, Debug)]
pub struct HarnessSigner {
    pub address: Address,
    pub backend: SignerBackend,
}

impl HarnessSigner {
    pub fn node_managed(address: Address) -> Self {
        Self { address, backend: SignerBackend::Node }
    }

    pub fn from_wallet(wallet: SecretKeySigner) -> Self {
        Self { address: wallet.address(), backend: SignerBackend::Wallet(wallet) }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_node_managed(&self) -> bool {
        matches!(self.backend, SignerBackend::Node)
    }

    /// An alloy wallet for callers assembling their own signing provider.
    /// Node managed accounts hold no local key, so there is nothing to hand
    /// out.
    pub fn wallet(&self) -> Option<EthereumWallet> {
        match &self.backend {
            SignerBackend::Node => None,
            SignerBackend::Wallet(signer) => Some(EthereumWallet::from(signer.clone())),
        }
    }

    /// Stamps this signer's address as the request sender.
    pub fn fill_from(&self, tx: TransactionRequest) -> TransactionRequest {
        tx.with_from(self.address)
    }
}

/// Derives the local wallet set declared by a network's accounts
/// configuration. Node managed configurations derive nothing; the account
/// list comes from `eth_accounts` instead.
pub fn derive_wallets(accounts: &AccountsConfig) -> Result<Vec<SecretKeySigner>, SignerError> {
    match accounts {
        AccountsConfig::NodeManaged => Ok(vec![]),
        AccountsConfig::Mnemonic { phrase, derivation_path_prefix, count } => {
            let mut wallets = Vec::with_capacity(*count as usize);
            for index in 0..*count {
                let derivation_path = format!("{}{}", derivation_path_prefix, index);
                let wallet = MnemonicBuilder::<English>::default()
                    .phrase(phrase.as_str())
                    .derivation_path(&derivation_path)
                    .map_err(|e| {
                        SignerError::InvalidAccountsConfig(format!(
                            "invalid derivation path '{}': {}",
                            derivation_path, e
                        ))
                    })?
                    .build()
                    .map_err(|e| {
                        SignerError::InvalidAccountsConfig(format!(
                            "failed to derive wallet {} from mnemonic: {}",
                            index, e
                        ))
                    })?;
                wallets.push(wallet);
            }
            Ok(wallets)
        }
        AccountsConfig::PrivateKeys(keys) => {
            let mut wallets = Vec::with_capacity(keys.len());
            for (index, key) in keys.iter().enumerate() {
                let bytes = hex::decode(key.trim_start_matches("0x")).map_err(|e| {
                    SignerError::InvalidAccountsConfig(format!(
                        "private key {} is not valid hex: {}",
                        index, e
                    ))
                })?;
                let signing_key = SigningKey::from_slice(&bytes).map_err(|e| {
                    SignerError::InvalidAccountsConfig(format!(
                        "private key {} is invalid: {}",
                        index, e
                    ))
                })?;
                wallets.push(SecretKeySigner::from_signing_key(signing_key));
            }
            Ok(wallets)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use evm_harness_kit::network::{DEFAULT_DERIVATION_PATH_PREFIX, DEFAULT_DEVNET_MNEMONIC};

    #[test]
    fn test_derives_the_devnet_account_sequence() {
        let accounts = AccountsConfig::Mnemonic {
            phrase: DEFAULT_DEVNET_MNEMONIC.to_string(),
            derivation_path_prefix: DEFAULT_DERIVATION_PATH_PREFIX.to_string(),
            count: 3,
        };

        let wallets = derive_wallets(&accounts).unwrap();
        let addresses: Vec<Address> = wallets.iter().map(|wallet| wallet.address()).collect();
        assert_eq!(
            addresses,
            vec![
                address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
                address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
                address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
            ]
        );
    }

    #[test]
    fn test_derives_wallets_from_private_keys() {
        let accounts = AccountsConfig::PrivateKeys(vec![
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
        ]);

        let wallets = derive_wallets(&accounts).unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].address(), address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
    }

    #[test]
    fn test_node_managed_derives_nothing() {
        let wallets = derive_wallets(&AccountsConfig::NodeManaged).unwrap();
        assert!(wallets.is_empty());
    }

    #[test]
    fn test_rejects_non_hex_private_keys() {
        let accounts = AccountsConfig::PrivateKeys(vec!["0xnot-a-key".to_string()]);
        let err = derive_wallets(&accounts).unwrap_err();
        assert!(matches!(err, SignerError::InvalidAccountsConfig(_)));
    }

    #[test]
    fn test_rejects_unknown_mnemonic_words() {
        let accounts = AccountsConfig::Mnemonic {
            phrase: "definitely not a bip39 phrase".to_string(),
            derivation_path_prefix: DEFAULT_DERIVATION_PATH_PREFIX.to_string(),
            count: 1,
        };
        let err = derive_wallets(&accounts).unwrap_err();
        assert!(matches!(err, SignerError::InvalidAccountsConfig(_)));
    }

    #[test]
    fn test_node_managed_signers_hand_out_no_wallet() {
        let signer =
            HarnessSigner::node_managed(address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert!(signer.is_node_managed());
        assert!(signer.wallet().is_none());
    }

    #[test]
    fn test_fill_from_stamps_the_sender() {
        let address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");
        let signer = HarnessSigner::node_managed(address);

        let tx = signer.fill_from(TransactionRequest::default());
        assert_eq!(tx.from, Some(address));
    }

    #[test]
    fn test_wallet_backed_signers_expose_an_alloy_wallet() {
        let accounts = AccountsConfig::PrivateKeys(vec![
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
        ]);
        let wallets = derive_wallets(&accounts).unwrap();
        let signer = HarnessSigner::from_wallet(wallets[0].clone());

        assert!(!signer.is_node_managed());
        assert!(signer.wallet().is_some());
        assert_eq!(signer.address(), address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
    }
}
