use icsi_node_api::Wallet;

use super::{Reconciliation, Snapshot};

/// Wallet snapshot plus the user's selection, tracked by address
///
/// The selection is semantic: after a rebuild the previously selected address
/// is looked up again, falling back to the first wallet, then to nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletBook {
    snapshot: Snapshot<Wallet>,
    selected: Option<String>,
}

impl WalletBook {
    pub fn wallets(&self) -> &[Wallet] {
        self.snapshot.items()
    }

    pub fn snapshot(&self) -> &Snapshot<Wallet> {
        &self.snapshot
    }

    pub fn selected_address(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&Wallet> {
        self.selected
            .as_ref()
            .and_then(|address| self.snapshot.find(address))
    }

    /// Select a wallet by address. Unknown addresses are refused.
    pub fn select(&mut self, address: &str) -> bool {
        let address = address.to_string();
        if self.snapshot.contains(&address) {
            self.selected = Some(address);
            true
        } else {
            false
        }
    }

    pub fn reconcile(&mut self, fresh: Vec<Wallet>) -> Reconciliation {
        let outcome = self.snapshot.reconcile(fresh);
        if outcome.is_rebuild() {
            self.reselect();
        }
        outcome
    }

    fn reselect(&mut self) {
        let still_present = self
            .selected
            .as_ref()
            .map(|address| self.snapshot.contains(address))
            .unwrap_or(false);

        if !still_present {
            self.selected = self.snapshot.first().map(|wallet| wallet.address.clone());
        }
    }
}
