// e2e-tests/src/lib.rs
//
// Stub node and dashboard factory shared by the end-to-end scenarios.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use icsi_dashboard::config::Config;
use icsi_dashboard::Dashboard;
use icsi_node_api::constants::*;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};

/// A mockito server standing in for the node's web server
///
/// One response per (method, path). Serving a path again replaces the
/// previous response, which is how scenarios change node state between polls.
pub struct StubNode {
    server: ServerGuard,
    mocks: HashMap<(&'static str, &'static str), Mock>,
}

impl StubNode {
    pub async fn start() -> Self {
        Self {
            server: mockito::Server::new_async().await,
            mocks: HashMap::new(),
        }
    }

    /// Stub node with an empty but valid response for every poll source
    pub async fn with_empty_sources() -> Self {
        let mut node = Self::start().await;
        node.peers(json!([]), 0).await;
        node.wallets(json!([])).await;
        node.discovery(json!({ "beacon_active": false, "known_multicast_peers": [] }))
            .await;
        node.serve(
            "GET",
            PATH_STATS,
            200,
            json!({ "difficulty": 1.0, "reward": 50.0, "halving_countdown": 210000 }),
        )
        .await;
        node.serve("GET", PATH_MINER_STATUS, 200, json!({ "is_mining": false, "logs": [] }))
            .await;
        node.beggars(json!({ "beggars": [] })).await;
        node
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    pub async fn serve(
        &mut self,
        method: &'static str,
        path: &'static str,
        status: usize,
        body: Value,
    ) {
        if let Some(previous) = self.mocks.remove(&(method, path)) {
            previous.remove_async().await;
        }

        let mock = self
            .server
            .mock(method, path)
            .match_query(Matcher::Any)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create_async()
            .await;
        self.mocks.insert((method, path), mock);
    }

    /// Like [`StubNode::serve`], but the body is held back for `delay`,
    /// keeping the request in flight on the dashboard side
    pub async fn serve_delayed(
        &mut self,
        method: &'static str,
        path: &'static str,
        delay: Duration,
        body: Value,
    ) {
        if let Some(previous) = self.mocks.remove(&(method, path)) {
            previous.remove_async().await;
        }

        let body = body.to_string();
        let mock = self
            .server
            .mock(method, path)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_chunked_body(move |w| {
                std::thread::sleep(delay);
                w.write_all(body.as_bytes())
            })
            .create_async()
            .await;
        self.mocks.insert((method, path), mock);
    }

    pub async fn peers(&mut self, peers: Value, height: u64) {
        self.serve("GET", PATH_PEERS, 200, json!({ "peers": peers, "height": height }))
            .await;
    }

    pub async fn wallets(&mut self, wallets: Value) {
        self.serve("GET", PATH_WALLET_LIST, 200, json!({ "wallets": wallets }))
            .await;
    }

    pub async fn discovery(&mut self, status: Value) {
        self.serve("GET", PATH_DISCOVERY, 200, status).await;
    }

    pub async fn beggars(&mut self, listing: Value) {
        self.serve("GET", PATH_BEGGAR_LIST, 200, listing).await;
    }

    /// Make a GET source fail with a 500
    pub async fn fail(&mut self, path: &'static str) {
        self.serve("GET", path, 500, json!({ "error": "node busy" }))
            .await;
    }

    /// Dashboard configuration pointed at this stub
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.node.base_url = self.url();
        config.node.request_timeout_ms = 2000;
        config
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.config()).expect("stub url is a valid node url")
    }
}

pub fn peer(ip: &str, port: u16, status: &str) -> Value {
    json!({ "ip": ip, "port": port, "status": status, "can_delete": false })
}

pub fn wallet(address: &str, name: &str, available: f64) -> Value {
    json!({
        "address": address,
        "name": name,
        "available": available,
        "confirmed": available,
        "pending": 0.0
    })
}
