use reqwest::{header, Client, ClientBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::record::{AddressRecord, RecordType};
use crate::{ApiError, ClientError};

pub(crate) const CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4";

pub(crate) struct CloudflareAPI<'t> {
    pub(crate) base_url: &'t str,
}

impl<'t> CloudflareAPI<'t> {
    pub(crate) fn zones_url(&self, zone: &str) -> String {
        format!("{}/zones?name={}", self.base_url, zone)
    }

    pub(crate) fn records_url(&self, zone_id: &str, fqdn: &str, rrset_type: RecordType) -> String {
        format!(
            "{}/zones/{}/dns_records?name={}&type={}",
            self.base_url, zone_id, fqdn, rrset_type
        )
    }

    pub(crate) fn create_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    pub(crate) fn update_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id)
    }
}

#[derive(Serialize)]
struct RecordPayload<'t> {
    #[serde(rename = "type")]
    rrset_type: RecordType,
    name: &'t str,
    content: String,
    ttl: u64,
}

#[derive(Deserialize)]
struct ResultList<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
}

#[derive(Deserialize)]
struct ResultItem<T> {
    result: T,
}

#[derive(Deserialize)]
struct ApiZone {
    id: String,
}

#[derive(Deserialize)]
struct ApiRecord {
    id: String,
    #[serde(rename = "type")]
    rrset_type: RecordType,
    content: String,
    ttl: u64,
}

fn api_client(api_token: &str, timeout: Duration) -> Result<Client, ClientError> {
    let key = format!("Bearer {}", api_token);
    let mut auth_value = header::HeaderValue::from_str(&key)?;
    auth_value.set_sensitive(true);
    let mut headers = header::HeaderMap::new();
    headers.insert(header::AUTHORIZATION, auth_value);
    let accept_value = header::HeaderValue::from_static("application/json");
    headers.insert(header::ACCEPT, accept_value);
    let client = ClientBuilder::new()
        .default_headers(headers)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

async fn check_response(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_else(|error| error.to_string());
    Err(ClientError::Api(match status {
        StatusCode::FORBIDDEN => ApiError::Forbidden { message },
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(),
        _ => ApiError::Unknown(status, message),
    }))
}

/// Client for the Cloudflare v4 API, holding the authenticated HTTP client.
///
/// `set_records` is the only entry point: an upsert of a full record set into
/// one zone. The token never appears in any error or log output.
pub(crate) struct CloudflareProvider {
    base_url: String,
    client: Client,
}

impl CloudflareProvider {
    pub(crate) fn new(
        base_url: &str,
        api_token: &str,
        timeout: Duration,
    ) -> Result<CloudflareProvider, ClientError> {
        Ok(CloudflareProvider {
            base_url: base_url.to_string(),
            client: api_client(api_token, timeout)?,
        })
    }

    /// Creates or replaces every record in `records` within `zone`, returning
    /// the records as Cloudflare stored them.
    ///
    /// Cloudflare has no single upsert call, so each record takes a lookup
    /// plus a PUT (record exists) or POST (record is new). The update is
    /// always submitted, even when the content is unchanged.
    pub(crate) async fn set_records(
        &self,
        zone: &str,
        records: &[AddressRecord],
    ) -> Result<Vec<AddressRecord>, ClientError> {
        let api = CloudflareAPI {
            base_url: &self.base_url,
        };
        let zone_id = self.zone_id(&api, zone).await?;

        let mut updated = Vec::with_capacity(records.len());
        for record in records {
            // Cloudflare addresses records by their full name, not the name
            // relative to the zone.
            let fqdn = format!("{}.{}", record.name, zone);
            let existing = self
                .find_record(&api, &zone_id, &fqdn, record.rrset_type)
                .await?;
            let payload = RecordPayload {
                rrset_type: record.rrset_type,
                name: &fqdn,
                content: record.value.to_string(),
                ttl: record.ttl.as_secs(),
            };
            let response = match existing {
                Some(record_id) => {
                    self.client
                        .put(api.update_url(&zone_id, &record_id))
                        .json(&payload)
                        .send()
                        .await?
                }
                None => {
                    self.client
                        .post(api.create_url(&zone_id))
                        .json(&payload)
                        .send()
                        .await?
                }
            };
            let body: ResultItem<ApiRecord> = check_response(response).await?.json().await?;
            let value = body.result.content.parse().map_err(|_| {
                ClientError::BadResponse(format!(
                    "record content {:?} is not an IP address",
                    body.result.content
                ))
            })?;
            updated.push(AddressRecord {
                rrset_type: body.result.rrset_type,
                name: record.name.clone(),
                value,
                ttl: Duration::from_secs(body.result.ttl),
            });
        }
        Ok(updated)
    }

    async fn zone_id(&self, api: &CloudflareAPI<'_>, zone: &str) -> Result<String, ClientError> {
        let response = self.client.get(api.zones_url(zone)).send().await?;
        let body: ResultList<ApiZone> = check_response(response).await?.json().await?;
        body.result
            .into_iter()
            .next()
            .map(|zone| zone.id)
            .ok_or_else(|| ClientError::UnknownZone(zone.to_string()))
    }

    async fn find_record(
        &self,
        api: &CloudflareAPI<'_>,
        zone_id: &str,
        fqdn: &str,
        rrset_type: RecordType,
    ) -> Result<Option<String>, ClientError> {
        let response = self
            .client
            .get(api.records_url(zone_id, fqdn, rrset_type))
            .send()
            .await?;
        let body: ResultList<ApiRecord> = check_response(response).await?.json().await?;
        Ok(body.result.into_iter().next().map(|record| record.id))
    }
}
