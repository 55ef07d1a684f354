use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::app_config::ProviderSettings;
use crate::core::errors::{InventoryError, Result};
use crate::core::models::account::{Credentials, ProviderKind};
use crate::core::models::snapshot::RemoteServerSnapshot;
use crate::core::traits::provider::ServerProvider;

use super::{build_client, decode_error, runtime, transport_error};

pub const DEFAULT_BASE_URL: &str = "https://api.hetzner.cloud/v1";

const PROVIDER: &str = "Hetzner Cloud";
const PER_PAGE: u32 = 50;

/// Hetzner bills backups as 20% on top of the server price.
const BACKUP_SURCHARGE: f64 = 1.2;

#[derive(Debug, Deserialize)]
struct ListServersResponse {
    servers: Vec<CloudServer>,
    #[serde(default)]
    meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    next_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CloudServer {
    id: u64,
    name: String,
    status: String,
    #[serde(default)]
    public_net: PublicNet,
    #[serde(default)]
    server_type: ServerType,
    #[serde(default)]
    datacenter: Datacenter,
    #[serde(default)]
    location: Option<Location>,
    image: Option<Image>,
    backup_window: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PublicNet {
    ipv4: Option<Address>,
    ipv6: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    ip: String,
}

#[derive(Debug, Default, Deserialize)]
struct ServerType {
    #[serde(default)]
    description: String,
    #[serde(default)]
    prices: Vec<Price>,
}

#[derive(Debug, Deserialize)]
struct Price {
    location: String,
    price_monthly: Amount,
}

#[derive(Debug, Deserialize)]
struct Amount {
    gross: String,
}

#[derive(Debug, Default, Deserialize)]
struct Datacenter {
    #[serde(default)]
    location: Location,
}

#[derive(Debug, Default, Deserialize)]
struct Location {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct Image {
    description: Option<String>,
}

impl CloudServer {
    fn ip(&self) -> String {
        [&self.public_net.ipv4, &self.public_net.ipv6]
            .into_iter()
            .flatten()
            .map(|a| a.ip.trim())
            .find(|ip| !ip.is_empty())
            .unwrap_or_default()
            .to_string()
    }

    /// Location code such as `nbg1`; the datacenter's wins.
    fn location_name(&self) -> &str {
        let dc = self.datacenter.location.name.as_str();
        if !dc.is_empty() {
            return dc;
        }
        self.location.as_ref().map(|l| l.name.as_str()).unwrap_or_default()
    }

    /// "City, Country", else the location description, else its code.
    fn location_label(&self) -> String {
        let loc = &self.datacenter.location;
        if !loc.city.is_empty() && !loc.country.is_empty() {
            return format!("{}, {}", loc.city, loc.country);
        }
        if !loc.description.is_empty() {
            return loc.description.clone();
        }
        self.location_name().to_string()
    }

    fn description(&self) -> String {
        let mut desc = self.server_type.description.clone();
        if let Some(image) = self.image.as_ref().and_then(|i| i.description.as_deref())
            && !image.is_empty()
        {
            desc.push_str(" | ");
            desc.push_str(image);
        }
        desc
    }

    /// Gross monthly price at the server's location, else the first tier, else 0.
    fn monthly_price(&self) -> f64 {
        let prices = &self.server_type.prices;
        let location = self.location_name();
        prices
            .iter()
            .filter(|p| p.location == location)
            .chain(prices.first())
            .find_map(|p| p.price_monthly.gross.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    fn has_backups(&self) -> bool {
        self.backup_window
            .as_deref()
            .is_some_and(|w| !w.trim().is_empty())
    }

    fn into_snapshot(self) -> RemoteServerSnapshot {
        let has_backups = self.has_backups();
        let mut cost = self.monthly_price();
        if has_backups {
            cost *= BACKUP_SURCHARGE;
        }

        RemoteServerSnapshot {
            remote_id: Some(self.id.to_string()),
            ip: Some(self.ip()).filter(|ip| !ip.is_empty()),
            location: self.location_label(),
            description: self.description(),
            monthly_cost: Some(cost),
            native_status: self.status,
            cancelled: false,
            has_backups: Some(has_backups),
            name: self.name,
        }
    }
}

fn parse_page(body: &str) -> Result<ListServersResponse> {
    serde_json::from_str(body).map_err(|e| decode_error(PROVIDER, e))
}

fn error_for_status(status: StatusCode) -> Option<InventoryError> {
    if status.is_success() {
        return None;
    }
    let detail = format!("API returned status {status}");
    Some(match status {
        StatusCode::UNAUTHORIZED => InventoryError::ProviderAuth {
            provider: PROVIDER.into(),
            detail,
        },
        StatusCode::TOO_MANY_REQUESTS => InventoryError::RateLimited {
            provider: PROVIDER.into(),
            detail,
        },
        _ => InventoryError::Transport {
            provider: PROVIDER.into(),
            detail,
        },
    })
}

/// Adapter for the Hetzner Cloud API (`/servers`, bearer token, paginated).
pub struct HetznerCloudProvider {
    base_url: String,
    timeout: Duration,
}

impl HetznerCloudProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self::new(&settings.base_url, settings.timeout())
    }

    fn fetch_all(&self, token: &str) -> Result<Vec<CloudServer>> {
        let rt = runtime(PROVIDER)?;
        rt.block_on(async {
            let client = build_client(PROVIDER, self.timeout)?;
            let mut servers = Vec::new();
            let mut page = 1;

            loop {
                let url = format!("{}/servers?page={page}&per_page={PER_PAGE}", self.base_url);
                let resp = client
                    .get(&url)
                    .bearer_auth(token)
                    .send()
                    .await
                    .map_err(|e| transport_error(PROVIDER, e))?;

                if let Some(err) = error_for_status(resp.status()) {
                    return Err(err);
                }

                let body = resp.text().await.map_err(|e| transport_error(PROVIDER, e))?;
                let parsed = parse_page(&body)?;
                tracing::debug!(page, count = parsed.servers.len(), "fetched Hetzner Cloud page");
                servers.extend(parsed.servers);

                match parsed.meta.pagination.next_page {
                    None => break,
                    Some(next) if next <= page => {
                        return Err(InventoryError::Decode {
                            provider: PROVIDER.into(),
                            detail: format!("pagination does not advance (page {page} → {next})"),
                        });
                    }
                    Some(next) => page = next,
                }
            }

            Ok(servers)
        })
    }
}

impl ServerProvider for HetznerCloudProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HetznerCloud
    }

    fn list_servers(&self, credentials: &Credentials) -> Result<Vec<RemoteServerSnapshot>> {
        let token = credentials.api_key.trim();
        if token.is_empty() {
            return Err(InventoryError::InvalidCredentials {
                detail: "Hetzner Cloud needs an API token".into(),
            });
        }

        let servers = self.fetch_all(token)?;
        Ok(servers.into_iter().map(CloudServer::into_snapshot).collect())
    }
}
