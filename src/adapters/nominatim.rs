use crate::utils::error::{RaincastError, Result};
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;

pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const DEFAULT_USER_AGENT: &str = "Raincaster/1.0 (raincaster@app.com)";

/// The subset of a Nominatim `address` object used for display.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Address {
    pub house_number: Option<String>,
    pub road: Option<String>,
    pub neighbourhood: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<Address>,
}

#[derive(Debug, Clone)]
pub struct GeocodeClient {
    client: Client,
    url: String,
    user_agent: String,
}

impl GeocodeClient {
    pub fn new(
        url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url: url.into(),
            user_agent: user_agent.into(),
        })
    }

    /// Human-readable street and city for a coordinate.
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .header(header::USER_AGENT, &self.user_agent)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "json".to_string()),
                ("accept-language", "en".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Reverse geocoding returned {}", response.status());
            return Err(RaincastError::GeocodeError {
                message: "Cannot Get Location Info".to_string(),
            });
        }

        let body: ReverseResponse =
            response
                .json()
                .await
                .map_err(|_| RaincastError::GeocodeError {
                    message: "Cannot Parse Location info".to_string(),
                })?;

        body.address
            .map(|address| format_address(&address))
            .ok_or_else(|| RaincastError::GeocodeError {
                message: "Cannot Parse Location info".to_string(),
            })
    }
}

fn first_non_empty<'a>(candidates: &[&'a Option<String>]) -> &'a str {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

/// `"{road} {house_number}, {city}"` with the gaps of missing parts collapsed.
pub fn format_address(address: &Address) -> String {
    let house_number = first_non_empty(&[&address.house_number]);
    let road = first_non_empty(&[&address.road, &address.neighbourhood]);
    let city = first_non_empty(&[&address.city, &address.town, &address.village]);

    format!("{} {}, {}", road, house_number, city)
        .replace("  ", " ")
        .replace(" , ", ", ")
        .trim()
        .to_string()
}
