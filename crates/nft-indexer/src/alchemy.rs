use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::ens;
use crate::error::ApiError;
use crate::indexer::IndexerApi;
use crate::query::Address;
use crate::types::asset::OwnedAsset;
use crate::types::metadata::TokenMeta;

/// Mainnet API host.
pub const DEFAULT_BASE_URL: &str = "https://eth-mainnet.g.alchemy.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the hosted Alchemy indexing API.
///
/// Ownership comes from the NFT REST surface, token metadata from the
/// `alchemy_getTokenMetadata` RPC method, and ENS names are resolved
/// with two raw `eth_call`s (see [`crate::ens`]).
pub struct AlchemyClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl AlchemyClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            http,
        })
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, ApiError> {
        let url = format!("{}/v2/{}", self.base_url, self.api_key);
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let res = self.http.post(&url).json(&body).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let resp: Value = res.json().await?;
        if let Some(err) = resp.get("error") {
            return Err(ApiError::Rpc(err.to_string()));
        }
        resp.get("result")
            .cloned()
            .ok_or_else(|| ApiError::Rpc("response carries no result".to_string()))
    }

    async fn eth_call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, ApiError> {
        let params = json!([
            { "to": to, "data": format!("0x{}", hex::encode(data)) },
            "latest",
        ]);
        let result = self.rpc("eth_call", params).await?;
        let word = result
            .as_str()
            .ok_or_else(|| ApiError::Decode("eth_call result is not a string".to_string()))?;
        hex::decode(word.trim_start_matches("0x")).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[derive(Deserialize)]
struct OwnedNftsEnvelope {
    #[serde(rename = "ownedNfts")]
    #[serde(default)]
    owned_nfts: Vec<OwnedAsset>,
}

#[async_trait]
impl IndexerApi for AlchemyClient {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>, ApiError> {
        let node = ens::namehash(name);

        let resolver_word = self
            .eth_call(ens::ENS_REGISTRY, &ens::resolver_call(&node))
            .await?;
        let Some(resolver_addr) = ens::decode_address_word(&resolver_word) else {
            return Ok(None);
        };

        let addr_word = self.eth_call(&resolver_addr, &ens::addr_call(&node)).await?;
        Ok(ens::decode_address_word(&addr_word).and_then(|addr| Address::parse(&addr)))
    }

    async fn assets_for_owner(&self, owner: &Address) -> Result<Vec<OwnedAsset>, ApiError> {
        let url = format!("{}/nft/v2/{}/getNFTs", self.base_url, self.api_key);
        let res = self
            .http
            .get(&url)
            .query(&[("owner", owner.as_str()), ("withMetadata", "true")])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let envelope: OwnedNftsEnvelope = res.json().await?;
        log::debug!(
            "indexer returned {} assets for {owner}",
            envelope.owned_nfts.len()
        );
        Ok(envelope.owned_nfts)
    }

    async fn token_metadata(&self, contract: &str, _token_id: &str) -> Result<TokenMeta, ApiError> {
        let result = self
            .rpc("alchemy_getTokenMetadata", json!([contract]))
            .await?;
        serde_json::from_value(result).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let envelope: OwnedNftsEnvelope = serde_json::from_str(
            r#"{
                "ownedNfts": [
                    { "contractAddress": "0xabc", "tokenId": "1", "title": "One" },
                    { "contractAddress": "0xdef", "tokenId": "2" }
                ],
                "totalCount": 2
            }"#,
        )
        .unwrap();
        assert_eq!(envelope.owned_nfts.len(), 2);
        assert_eq!(envelope.owned_nfts[0].title, "One");
        assert_eq!(envelope.owned_nfts[1].display_title(), "No Name");
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = AlchemyClient::with_base_url("https://example.com/", "key").unwrap();
        assert_eq!(client.base_url, "https://example.com");
    }
}
