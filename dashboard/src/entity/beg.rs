use icsi_node_api::ActiveBeg;

/// `m:ss` countdown of an active beg session, exactly as last polled
pub fn format_countdown(remaining_seconds: u64) -> String {
    format!("{}:{:02}", remaining_seconds / 60, remaining_seconds % 60)
}

/// Beg panel region: active session or the start form
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BegSession {
    #[default]
    Inactive,
    Active(ActiveBeg),
}

impl BegSession {
    pub fn from_poll(active: Option<ActiveBeg>) -> Self {
        match active {
            Some(beg) => BegSession::Active(beg),
            None => BegSession::Inactive,
        }
    }
}
