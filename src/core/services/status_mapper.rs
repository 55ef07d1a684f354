use crate::core::models::account::ProviderKind;
use crate::core::models::server_record::ServerStatus;

/// Maps a provider's native status vocabulary onto `ServerStatus`.
pub struct StatusMapper;

impl StatusMapper {
    /// Map a native status string for the given provider kind.
    ///
    /// - `cancelled` always wins and yields `Deleted`
    /// - unrecognized strings yield `Active` (fail open: an unmapped status
    ///   must never retire a server)
    pub fn map(provider: ProviderKind, native_status: &str, cancelled: bool) -> ServerStatus {
        if cancelled {
            return ServerStatus::Deleted;
        }

        let native = native_status.trim().to_ascii_lowercase();
        let mapped = match provider {
            ProviderKind::HetznerCloud => Self::hetzner_cloud(&native),
            ProviderKind::HetznerRobot => Self::hetzner_robot(&native),
            ProviderKind::Aws | ProviderKind::Scaleway | ProviderKind::VsysHost => {
                Self::generic(&native)
            }
        };

        mapped.unwrap_or(ServerStatus::Active)
    }

    fn hetzner_cloud(native: &str) -> Option<ServerStatus> {
        match native {
            "running" => Some(ServerStatus::Active),
            "off" | "stopped" => Some(ServerStatus::Paused),
            "deleting" => Some(ServerStatus::Deleted),
            _ => None,
        }
    }

    fn hetzner_robot(native: &str) -> Option<ServerStatus> {
        match native {
            "ready" => Some(ServerStatus::Active),
            "in process" => Some(ServerStatus::Paused),
            _ => None,
        }
    }

    fn generic(native: &str) -> Option<ServerStatus> {
        match native {
            "running" | "active" | "ready" => Some(ServerStatus::Active),
            "stopped" | "off" | "paused" => Some(ServerStatus::Paused),
            "deleted" | "terminated" => Some(ServerStatus::Deleted),
            _ => None,
        }
    }
}
