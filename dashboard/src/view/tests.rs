use super::*;
use icsi_node_api::{ActiveBeg, BeggarListing, MinerStatus, Peer, Wallet};

const NOW: i64 = 1_700_000_000;

fn peer(ip: &str, port: u16, status: &str) -> Peer {
    Peer {
        ip: ip.to_string(),
        port,
        status: status.to_string(),
        can_delete: status.starts_with("FAILED"),
    }
}

fn wallet(address: &str, name: &str, available: f64) -> Wallet {
    Wallet {
        address: address.to_string(),
        name: name.to_string(),
        available,
        confirmed: available,
        pending: 0.0,
    }
}

fn render_default(state: &AppState) -> DashboardView {
    render(state, NOW, &RenderOptions::default())
}

#[test]
fn test_render_is_idempotent() {
    let mut state = AppState::default();
    state.peers.reconcile(vec![peer("10.0.0.1", 9341, "ACTIVE")]);
    state.wallets.reconcile(vec![wallet("A", "main", 1.0)]);

    assert_eq!(render_default(&state), render_default(&state));
}

#[test]
fn test_empty_state_renders_offline_defaults() {
    let view = render_default(&AppState::default());

    assert_eq!(view.uplink, Uplink::Offline);
    assert_eq!(view.peer_count, 0);
    assert_eq!(view.wallets.balance, "0.00");
    assert_eq!(view.wallets.address, "---");
    assert_eq!(view.connect.label, "[ ADD NODE ]");
    assert!(view.connect.enabled);
    assert_eq!(view.discovery.label, "No signal");
    assert!(view.registry.is_none());
    assert!(view.stats.is_none());
}

#[test]
fn test_uplink_uses_unfiltered_snapshot() {
    let mut state = AppState::default();
    state.peers.reconcile(vec![
        peer("10.0.0.1", 9341, "DISCOVERED"),
        peer("10.0.0.2", 9341, "ACTIVE (ICE)"),
    ]);
    state.peer_filter = "10.0.0.1".to_string();

    let view = render_default(&state);

    assert_eq!(view.uplink, Uplink::Online);
    assert_eq!(view.peer_count, 2);
    assert_eq!(view.peers.len(), 1);
    assert_eq!(view.peers[0].key, "10.0.0.1:9341");
    assert!(!view.peers[0].active);
}

#[test]
fn test_wallet_labels_and_selected_readout() {
    let mut state = AppState::default();
    state
        .wallets
        .reconcile(vec![wallet("A", "main", 12.346), wallet("B", "savings", 0.5)]);
    state.wallets.select("B");

    let view = render_default(&state);

    assert_eq!(view.wallets.options[0].label, "[12.35] main");
    assert!(!view.wallets.options[0].selected);
    assert!(view.wallets.options[1].selected);
    assert_eq!(view.wallets.balance, "0.50");
    assert_eq!(view.wallets.address, "B");
}

#[test]
fn test_connect_control_tracks_seed_attempt() {
    let mut state = AppState::default();
    state.seed.set_by_user("10.0.0.5");
    let key = PeerKey::new("10.0.0.5", 9341);
    let generation = state.attempts.begin(&key).unwrap();

    let view = render_default(&state);
    assert_eq!(view.connect.label, "CONNECTING...");
    assert!(!view.connect.enabled);
    assert_eq!(view.attempts.len(), 1);

    state.attempts.finish(&key, generation, false);
    let view = render_default(&state);
    assert_eq!(view.connect.label, "FAILED");
    assert!(view.connect.enabled);
}

#[test]
fn test_stats_formatting() {
    let mut state = AppState::default();
    state.stats = Some(NetworkStats {
        difficulty: 4.0,
        difficulty_countdown: Some(12),
        reward: 50.0,
        halving_countdown: 2100,
        network_hashrate: Some(1_500_000.0),
    });

    let stats = render_default(&state).stats.unwrap();

    assert_eq!(stats.difficulty, "4");
    assert_eq!(stats.reward, "50.00000000 ICSI");
    assert_eq!(stats.halving, "2100 Blocks");
    assert_eq!(stats.hashrate.as_deref(), Some("1.50 MH/s"));
}

#[test]
fn test_miner_controls_and_terminal_tail() {
    let mut state = AppState::default();
    state.miner = Some(MinerStatus {
        is_mining: true,
        logs: (0..30).map(|i| format!("line {}", i)).collect(),
    });

    let miner = render_default(&state).miner;

    assert!(!miner.start_enabled);
    assert!(miner.stop_enabled);
    assert_eq!(miner.terminal.len(), 20);
    assert_eq!(miner.terminal[0], "line 10");
}

#[test]
fn test_beg_panel_regions() {
    let mut state = AppState::default();
    state.wallets.reconcile(vec![wallet("ICSI1234567890ABCDEF", "main", 2.0)]);

    match render_default(&state).beg {
        BegPanel::Start { options } => {
            assert_eq!(options[0].label, "ICSI12345678...  (2.0000 iCSI)")
        }
        other => panic!("expected start form, got {:?}", other),
    }

    state.beg = BegSession::Active(ActiveBeg {
        address: "ICSI1".to_string(),
        remaining_seconds: 125,
    });
    assert_eq!(
        render_default(&state).beg,
        BegPanel::Active {
            address: "ICSI1".to_string(),
            countdown: "2:05".to_string()
        }
    );
}

#[test]
fn test_registry_rows_derive_minutes_at_render_time() {
    let mut state = AppState::default();
    state.registry_open = true;
    state.beggars.reconcile(vec![BeggarListing {
        address: "ICSIabcdefghijklmnopqrstuvwxyz".to_string(),
        balance: 1.5,
        last_seen: NOW - 150,
    }]);

    let registry = render_default(&state).registry.unwrap();
    assert_eq!(registry.rows[0].short_address, "ICSIabcdef...qrstuvwxyz");
    assert_eq!(registry.rows[0].balance, "1.5000 iCSI");
    assert_eq!(registry.rows[0].seen, "Seen 2m ago");
    assert!(registry.empty_message.is_none());

    // Same snapshot, later clock
    let later = render(&state, NOW + 600, &RenderOptions::default());
    assert_eq!(later.registry.unwrap().rows[0].seen, "Seen 12m ago");
}

#[test]
fn test_empty_registry_message() {
    let mut state = AppState::default();
    state.registry_open = true;

    let registry = render_default(&state).registry.unwrap();
    assert_eq!(
        registry.empty_message.as_deref(),
        Some("No beggars on the network yet.")
    );
}

#[test]
fn test_short_address_keeps_short_values() {
    assert_eq!(short_address("ICSI123"), "ICSI123");
    assert_eq!(minutes_since(NOW + 30, NOW), 0);
}

#[test]
fn test_peer_logs_view() {
    let mut state = AppState::default();
    state.peer_logs = Some(PeerLogs::new(PeerKey::new("10.0.0.1", 9341), vec![]));

    let logs = render_default(&state).peer_logs.unwrap();
    assert_eq!(logs.title, "LOGS: 10.0.0.1:9341");
    assert_eq!(logs.content, "No logs.");
    assert_eq!(logs.block_count, 0);
}
