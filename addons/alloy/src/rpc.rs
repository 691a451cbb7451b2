//! Read-only JSON-RPC plumbing for the harness runtime.

use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy_provider::fillers::{
    BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
};
use alloy_provider::Identity;
use url::Url;

use error_stack::{Report, ResultExt};

use crate::errors::{ConfigError, HarnessError, HarnessResult, RpcContext, RpcError};

pub type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
>;

/// Thin wrapper over an alloy HTTP provider. Every call is single shot; retry
/// policy belongs to callers.
#[derive(Clone, Debug)]
pub struct EvmRpc {
    pub url: Url,
    pub provider: HttpProvider,
}

impl EvmRpc {
    pub fn new(url: &str) -> HarnessResult<Self> {
        let url = Url::try_from(url).map_err(|e| {
            Report::new(HarnessError::Config(ConfigError::InvalidValue {
                field: "rpc_api_url".to_string(),
                value: format!("{}: {}", url, e),
            }))
        })?;

        let provider = ProviderBuilder::new().on_http(url.clone());
        Ok(Self { url, provider })
    }

    /// `eth_accounts`: the node's managed accounts, in node order.
    pub async fn get_accounts(&self) -> HarnessResult<Vec<Address>> {
        self.provider
            .get_accounts()
            .await
            .map_err(|e| Report::new(HarnessError::Rpc(RpcError::NodeError(e.to_string()))))
            .attach(RpcContext {
                endpoint: self.url.to_string(),
                method: "eth_accounts".to_string(),
                params: None,
            })
    }

    pub async fn get_chain_id(&self) -> HarnessResult<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| Report::new(HarnessError::Rpc(RpcError::NodeError(e.to_string()))))
            .attach(RpcContext {
                endpoint: self.url.to_string(),
                method: "eth_chainId".to_string(),
                params: None,
            })
    }

    pub async fn get_balance(&self, address: &Address) -> HarnessResult<U256> {
        self.provider
            .get_balance(address.clone())
            .await
            .map_err(|e| Report::new(HarnessError::Rpc(RpcError::NodeError(e.to_string()))))
            .attach(RpcContext {
                endpoint: self.url.to_string(),
                method: "eth_getBalance".to_string(),
                params: Some(format!("[\"{:?}\", \"latest\"]", address)),
            })
            .attach_printable(format!("Getting balance for address {}", address))
    }

    pub async fn get_code(&self, address: &Address) -> HarnessResult<Bytes> {
        self.provider
            .get_code_at(address.clone())
            .await
            .map_err(|e| Report::new(HarnessError::Rpc(RpcError::NodeError(e.to_string()))))
            .attach(RpcContext {
                endpoint: self.url.to_string(),
                method: "eth_getCode".to_string(),
                params: Some(format!("[\"{:?}\", \"latest\"]", address)),
            })
            .attach_printable(format!("Getting code at address {}", address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unparsable_urls() {
        let err = EvmRpc::new("not a url").unwrap_err();
        match err.current_context() {
            HarnessError::Config(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "rpc_api_url");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_keeps_the_parsed_endpoint() {
        let rpc = EvmRpc::new("http://localhost:8545").unwrap();
        assert_eq!(rpc.url.as_str(), "http://localhost:8545/");
    }
}
