use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::app_config::ProviderSettings;
use crate::core::errors::{InventoryError, Result};
use crate::core::models::account::{Credentials, ProviderKind};
use crate::core::models::snapshot::RemoteServerSnapshot;
use crate::core::traits::provider::ServerProvider;

use super::{build_client, decode_error, runtime, transport_error};

pub const DEFAULT_BASE_URL: &str = "https://robot-ws.your-server.de";

const PROVIDER: &str = "Hetzner Robot";

#[derive(Debug, Deserialize)]
struct ServerWrapper {
    server: RobotServer,
}

#[derive(Debug, Deserialize)]
struct RobotServer {
    #[serde(default)]
    server_number: u64,
    server_ip: Option<String>,
    server_ipv6_net: Option<String>,
    server_name: Option<String>,
    #[serde(default)]
    product: String,
    #[serde(default)]
    dc: String,
    traffic: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    cancelled: bool,
}

impl RobotServer {
    fn into_snapshot(self) -> RemoteServerSnapshot {
        let ip = [self.server_ip.as_deref(), self.server_ipv6_net.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|ip| !ip.is_empty())
            .map(str::to_string);

        let name = match self.server_name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => format!("Server #{}", self.server_number),
        };

        let mut description = self.product;
        if let Some(traffic) = self.traffic.as_deref()
            && !traffic.is_empty()
        {
            description.push_str(" | Traffic: ");
            description.push_str(traffic);
        }

        RemoteServerSnapshot {
            remote_id: Some(self.server_number.to_string()),
            name,
            ip,
            location: self.dc,
            description,
            // Robot does not report pricing or backups.
            monthly_cost: None,
            native_status: self.status,
            cancelled: self.cancelled,
            has_backups: None,
        }
    }
}

fn parse_servers(body: &str) -> Result<Vec<RobotServer>> {
    let wrappers: Vec<ServerWrapper> =
        serde_json::from_str(body).map_err(|e| decode_error(PROVIDER, e))?;
    Ok(wrappers.into_iter().map(|w| w.server).collect())
}

/// Basic-auth pair: explicit login + key, or a `user:password` key.
fn basic_auth(credentials: &Credentials) -> Result<(String, String)> {
    if let Some(login) = credentials.login.as_deref().filter(|l| !l.trim().is_empty()) {
        return Ok((login.to_string(), credentials.api_key.clone()));
    }

    match credentials.api_key.split_once(':') {
        Some((user, pass)) if !user.is_empty() => Ok((user.to_string(), pass.to_string())),
        _ => Err(InventoryError::InvalidCredentials {
            detail: "Hetzner Robot expects a login, or an API key of the form 'username:password'"
                .into(),
        }),
    }
}

fn error_for_status(status: StatusCode) -> Option<InventoryError> {
    if status.is_success() {
        return None;
    }
    let provider = PROVIDER.to_string();
    Some(match status {
        StatusCode::UNAUTHORIZED => InventoryError::ProviderAuth {
            provider,
            detail: "invalid username or password".into(),
        },
        // Robot answers 403 when the request quota is exhausted or the IP is blocked.
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => InventoryError::RateLimited {
            provider,
            detail: format!("API returned status {status}"),
        },
        _ => InventoryError::Transport {
            provider,
            detail: format!("API returned status {status}"),
        },
    })
}

/// Adapter for the Hetzner Robot webservice (dedicated servers, basic auth).
pub struct HetznerRobotProvider {
    base_url: String,
    timeout: Duration,
}

impl HetznerRobotProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::new(&settings.base_url, settings.timeout())
    }
}

impl ServerProvider for HetznerRobotProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HetznerRobot
    }

    fn list_servers(&self, credentials: &Credentials) -> Result<Vec<RemoteServerSnapshot>> {
        let (user, password) = basic_auth(credentials)?;
        let url = format!("{}/server", self.base_url);

        let rt = runtime(PROVIDER)?;
        let servers = rt.block_on(async {
            let client = build_client(PROVIDER, self.timeout)?;
            let resp = client
                .get(&url)
                .basic_auth(&user, Some(&password))
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|e| transport_error(PROVIDER, e))?;

            if let Some(err) = error_for_status(resp.status()) {
                return Err(err);
            }

            let body = resp.text().await.map_err(|e| transport_error(PROVIDER, e))?;
            parse_servers(&body)
        })?;

        tracing::debug!(count = servers.len(), "fetched Hetzner Robot servers");
        Ok(servers.into_iter().map(RobotServer::into_snapshot).collect())
    }
}
