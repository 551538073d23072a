//! HTTP client for the node's REST API
//!
//! Two faces over the same request path:
//! - poll calls (`peers`, `stats`, ...) return [`Fetched`] and never fail past
//!   this module; the cause is logged and the caller keeps its old snapshot
//! - action calls return `Result<_, FetchError>` so the user sees the cause
//!
//! There are no retries here. The next poll tick is the retry.

use crate::constants::*;
use crate::errors::FetchError;
use crate::types::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Outcome of one background poll request
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    /// Complete, parsed payload
    Fresh(T),
    /// Transport, status, parse or application failure (already logged)
    Failed,
}

impl<T> Fetched<T> {
    pub fn fresh(self) -> Option<T> {
        match self {
            Fetched::Fresh(value) => Some(value),
            Fetched::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Fetched::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl NodeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(FetchError::InvalidUrl(base_url));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let response = self.http.get(self.url(path)).send().await?;
        decode_response(response).await
    }

    async fn get_json_query<Q, T>(&self, path: &str, query: &Q) -> Result<T, FetchError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.http.get(self.url(path)).query(query).send().await?;
        decode_response(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        decode_response(response).await
    }

    async fn poll<T: DeserializeOwned>(&self, path: &str) -> Fetched<T> {
        match self.get_json(path).await {
            Ok(value) => Fetched::Fresh(value),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Poll fetch failed");
                Fetched::Failed
            }
        }
    }

    // =========================================================================
    // Poll sources
    // =========================================================================

    pub async fn peers(&self) -> Fetched<PeersResponse> {
        self.poll(PATH_PEERS).await
    }

    pub async fn stats(&self) -> Fetched<NetworkStats> {
        self.poll(PATH_STATS).await
    }

    pub async fn discovery(&self) -> Fetched<DiscoveryStatus> {
        self.poll(PATH_DISCOVERY).await
    }

    pub async fn wallets(&self) -> Fetched<WalletListResponse> {
        self.poll(PATH_WALLET_LIST).await
    }

    pub async fn miner_status(&self) -> Fetched<MinerStatus> {
        self.poll(PATH_MINER_STATUS).await
    }

    pub async fn beggar_list(&self) -> Fetched<BeggarListResponse> {
        self.poll(PATH_BEGGAR_LIST).await
    }

    // =========================================================================
    // Actions
    // =========================================================================

    pub async fn connect(&self, request: &ConnectRequest) -> Result<ConnectResponse, FetchError> {
        self.post_json(PATH_CONNECT, request).await
    }

    pub async fn delete_peer(&self, key: &PeerKey) -> Result<ControlResponse, FetchError> {
        let body = DeletePeerRequest {
            ip: key.ip.clone(),
            port: key.port,
        };
        self.post_json(PATH_PEERS_DELETE, &body).await
    }

    pub async fn reset(&self) -> Result<ControlResponse, FetchError> {
        self.post_json(PATH_RESET, &serde_json::json!({})).await
    }

    pub async fn peer_logs(&self, key: &PeerKey) -> Result<LogsResponse, FetchError> {
        let port = key.port.to_string();
        self.get_json_query(PATH_LOGS, &[("ip", key.ip.as_str()), ("port", port.as_str())])
            .await
    }

    pub async fn nat_test(&self, request: &NatTestRequest) -> Result<NatTestResponse, FetchError> {
        self.post_json(PATH_NAT_TEST, request).await
    }

    pub async fn create_wallet(&self, name: &str) -> Result<CreateWalletResponse, FetchError> {
        let body = CreateWalletRequest {
            name: name.to_string(),
        };
        self.post_json(PATH_WALLET_CREATE, &body).await
    }

    pub async fn delete_wallet(&self, address: &str) -> Result<ControlResponse, FetchError> {
        let body = WalletAddressRequest {
            address: address.to_string(),
        };
        self.post_json(PATH_WALLET_DELETE, &body).await
    }

    pub async fn rename_wallet(
        &self,
        address: &str,
        name: &str,
    ) -> Result<ControlResponse, FetchError> {
        let body = RenameWalletRequest {
            address: address.to_string(),
            name: name.to_string(),
        };
        self.post_json(PATH_WALLET_RENAME, &body).await
    }

    pub async fn send(&self, request: &SendRequest) -> Result<SendResponse, FetchError> {
        self.post_json(PATH_WALLET_SEND, request).await
    }

    pub async fn import_wallets(&self, entries: &[Value]) -> Result<ImportResponse, FetchError> {
        self.post_json(PATH_WALLET_IMPORT, entries).await
    }

    pub async fn export_wallets(&self) -> Result<Value, FetchError> {
        self.get_json(PATH_WALLET_EXPORT).await
    }

    pub async fn start_miner(&self, target_address: Option<&str>) -> Result<ControlResponse, FetchError> {
        let body = MinerStartRequest {
            target_address: target_address.map(str::to_string),
        };
        self.post_json(PATH_MINER_START, &body).await
    }

    pub async fn stop_miner(&self) -> Result<ControlResponse, FetchError> {
        self.post_json(PATH_MINER_STOP, &serde_json::json!({})).await
    }

    pub async fn start_beg(&self, address: &str) -> Result<ControlResponse, FetchError> {
        let body = BeggarStartRequest {
            address: address.to_string(),
        };
        self.post_json(PATH_BEGGAR_START, &body).await
    }

    pub async fn stop_beg(&self) -> Result<ControlResponse, FetchError> {
        self.post_json(PATH_BEGGAR_STOP, &serde_json::json!({})).await
    }

    pub async fn rpc_config(&self) -> Result<RpcConfig, FetchError> {
        self.get_json(PATH_RPC_CONFIG).await
    }

    pub async fn set_rpc_config(&self, config: &RpcConfig) -> Result<RpcConfig, FetchError> {
        self.post_json(PATH_RPC_CONFIG, config).await
    }

    pub async fn integrity_check(&self) -> Result<IntegrityReport, FetchError> {
        self.post_json(PATH_INTEGRITY_CHECK, &serde_json::json!({})).await
    }
}

/// Fold a response into a typed value or a [`FetchError`]
///
/// A 2xx body carrying a string `error` field counts as a failure too.
async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, FetchError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let error = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|body| error_field(&body));
        return Err(FetchError::Status {
            status: status.as_u16(),
            error,
        });
    }

    let body: Value = serde_json::from_slice(&bytes)?;
    if let Some(message) = error_field(&body) {
        return Err(FetchError::Application(message));
    }

    Ok(serde_json::from_value(body)?)
}

fn error_field(body: &Value) -> Option<String> {
    body.get("error").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::Server) -> NodeClient {
        NodeClient::new(&server.url(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_rejects_url_without_scheme() {
        let result = NodeClient::new("127.0.0.1:9340", Duration::from_secs(1));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = NodeClient::new("http://127.0.0.1:9340/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9340");
    }

    #[tokio::test]
    async fn test_poll_peers_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", PATH_PEERS)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"peers": [{"ip": "10.0.0.2", "port": 9341, "status": "ACTIVE", "can_delete": false}], "height": 42}"#,
            )
            .create_async()
            .await;

        let fetched = client_for(&server).peers().await;

        mock.assert_async().await;
        let peers = fetched.fresh().expect("peers should be fresh");
        assert_eq!(peers.height, 42);
        assert_eq!(peers.peers[0].key(), PeerKey::new("10.0.0.2", 9341));
    }

    #[tokio::test]
    async fn test_poll_server_error_is_folded() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", PATH_WALLET_LIST)
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        assert!(client_for(&server).wallets().await.is_failed());
    }

    #[tokio::test]
    async fn test_poll_malformed_json_is_folded() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", PATH_STATS)
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        assert!(client_for(&server).stats().await.is_failed());
    }

    #[tokio::test]
    async fn test_poll_application_error_is_folded() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", PATH_MINER_STATUS)
            .with_status(200)
            .with_body(r#"{"error": "miner unavailable"}"#)
            .create_async()
            .await;

        assert!(client_for(&server).miner_status().await.is_failed());
    }

    #[tokio::test]
    async fn test_poll_unreachable_node_is_folded() {
        // Nothing listens on port 9 (discard) on test hosts
        let client = NodeClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(client.discovery().await.is_failed());
    }

    #[tokio::test]
    async fn test_action_surfaces_node_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH_WALLET_SEND)
            .with_status(400)
            .with_body(r#"{"error": "Transaction rejected by mempool"}"#)
            .create_async()
            .await;

        let request = SendRequest {
            from: "a".to_string(),
            to: "b".to_string(),
            amount: 1.0,
        };
        let err = client_for(&server).send(&request).await.unwrap_err();
        assert_eq!(err.node_message(), Some("Transaction rejected by mempool"));
    }

    #[tokio::test]
    async fn test_connect_posts_seed_ip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH_CONNECT)
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"seed_ip": "10.0.0.5:9341"}),
            ))
            .with_status(200)
            .with_body(r#"{"connected_count": 1, "results": [{"target": "10.0.0.5:9341", "success": true}]}"#)
            .create_async()
            .await;

        let response = client_for(&server)
            .connect(&ConnectRequest {
                seed_ip: "10.0.0.5:9341".to_string(),
                force: None,
                wait: None,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.connected_count, 1);
        assert!(response.results[0].success);
    }

    #[tokio::test]
    async fn test_peer_logs_query_string() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", PATH_LOGS)
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("ip".into(), "10.0.0.2".into()),
                mockito::Matcher::UrlEncoded("port".into(), "9341".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"logs": ["hello", "block 12 received"]}"#)
            .create_async()
            .await;

        let logs = client_for(&server)
            .peer_logs(&PeerKey::new("10.0.0.2", 9341))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(logs.logs.len(), 2);
    }

    #[tokio::test]
    async fn test_peer_logs_encodes_ipv6_host() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", PATH_LOGS)
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("ip".into(), "fe80::1%eth0".into()),
                mockito::Matcher::UrlEncoded("port".into(), "9341".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"logs": []}"#)
            .create_async()
            .await;

        let logs = client_for(&server)
            .peer_logs(&PeerKey::new("fe80::1%eth0", 9341))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(logs.logs.is_empty());
    }
}
