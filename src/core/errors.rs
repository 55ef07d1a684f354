/// All domain errors for invsync.
///
/// Each variant provides enough context to diagnose the issue
/// without needing a debugger.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error(
        "{provider} rejected the credentials: {detail}\n\n  \
         Check the API key (and login) stored for this account.\n  \
         Run 'invsync accounts list' to see configured accounts."
    )]
    ProviderAuth { provider: String, detail: String },

    #[error(
        "{provider} is rate limiting requests: {detail}\n\n  \
         The account was skipped for this run. Try again later."
    )]
    RateLimited { provider: String, detail: String },

    #[error("{provider} request failed: {detail}")]
    Transport { provider: String, detail: String },

    #[error("Malformed {provider} response: {detail}")]
    Decode { provider: String, detail: String },

    #[error(
        "Invalid credentials format: {detail}\n\n  \
         Expected an API token, or 'username:password' for Hetzner Robot."
    )]
    InvalidCredentials { detail: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Inventory storage error: {detail}")]
    Storage { detail: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error("Invalid input: {detail}")]
    InvalidInput { detail: String },

    #[error("Unknown {kind} '{value}'. Valid values: {expected}")]
    UnknownVariant {
        kind: &'static str,
        value: String,
        expected: String,
    },

    #[error(
        "This inventory uses format version {project_version}, but this build \
         only supports up to version {supported_version}.\n\n  \
         Solutions:\n    \
         → Upgrade invsync: cargo install invsync --force"
    )]
    FormatVersionTooNew {
        project_version: u32,
        supported_version: u32,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl InventoryError {
    /// True for failures reported by a provider adapter (auth, rate limit,
    /// transport, decode). These abort one account's pass only.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::ProviderAuth { .. }
                | Self::RateLimited { .. }
                | Self::Transport { .. }
                | Self::Decode { .. }
                | Self::InvalidCredentials { .. }
        )
    }

    /// Short machine-friendly label, used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProviderAuth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limit",
            Self::Transport { .. } => "transport",
            Self::Decode { .. } => "decode",
            Self::InvalidCredentials { .. } => "credentials",
            Self::NotFound { .. } => "not_found",
            Self::Storage { .. } => "storage",
            Self::InvalidConfig { .. } => "config",
            Self::InvalidInput { .. } => "input",
            Self::UnknownVariant { .. } => "unknown_variant",
            Self::FormatVersionTooNew { .. } => "format_version",
            Self::Io(_) => "io",
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InventoryError>;
