/// One remote server's normalized attributes at fetch time.
///
/// Produced by a provider adapter and consumed immediately by the
/// reconciler; never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteServerSnapshot {
    /// Provider-side identifier (server id or number), informational only.
    pub remote_id: Option<String>,
    pub name: String,
    pub ip: Option<String>,
    pub location: String,
    pub description: String,
    /// Monthly cost including surcharges. `None` when the provider
    /// does not report pricing.
    pub monthly_cost: Option<f64>,
    pub native_status: String,
    pub cancelled: bool,
    /// `None` when the provider does not report backup state.
    pub has_backups: Option<bool>,
}

impl RemoteServerSnapshot {
    /// The IP as stored locally (empty string when unknown).
    pub fn ip_or_empty(&self) -> &str {
        self.ip.as_deref().map(str::trim).unwrap_or("")
    }
}
