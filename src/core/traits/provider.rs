use crate::core::errors::Result;
use crate::core::models::account::{Credentials, ProviderKind};
use crate::core::models::snapshot::RemoteServerSnapshot;

/// Port for fetching a provider's current server inventory.
///
/// Implementations live in `adapters::providers` (e.g. HetznerCloudProvider,
/// HetznerRobotProvider). The core only depends on this trait.
pub trait ServerProvider: Send + Sync {
    /// Which provider kind this adapter serves.
    fn kind(&self) -> ProviderKind;

    /// Fetch every server visible to `credentials`, following pagination.
    ///
    /// Fails with `ProviderAuth`, `RateLimited`, `Transport` or `Decode`;
    /// never returns a partial list.
    fn list_servers(&self, credentials: &Credentials) -> Result<Vec<RemoteServerSnapshot>>;
}
