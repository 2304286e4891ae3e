use async_trait::async_trait;
use reqwest::ClientBuilder;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use super::ip_source::IPSource;
use crate::record::RecordType;
use crate::ClientError;

pub(crate) const CLOUDFLARE_TRACE_URL: &str = "https://cloudflare.com";

/// Discovers the public IP address through Cloudflare's `cdn-cgi/trace`
/// endpoint, which echoes back the address the request came from.
///
/// The interesting part is that the same endpoint serves both families, so
/// each lookup pins the local socket to one family to force the connection
/// over IPv4 or IPv6 regardless of how the host would route by default.
pub(crate) struct IPSourceCloudflareTrace {
    base_url: String,
    timeout: Duration,
}

impl IPSourceCloudflareTrace {
    pub(crate) fn new(base_url: &str, timeout: Duration) -> Self {
        IPSourceCloudflareTrace {
            base_url: base_url.to_string(),
            timeout,
        }
    }

    async fn get_ip(&self, bind: IpAddr) -> Result<IpAddr, ClientError> {
        // Binding the unspecified address of one family makes the connector
        // skip resolved addresses of the other family.
        let client = ClientBuilder::new()
            .local_address(bind)
            .timeout(self.timeout)
            .build()?;
        let response = client
            .get(format!("{}/cdn-cgi/trace", self.base_url))
            .send()
            .await?;
        let body = response.text().await?;
        parse_trace(&body)
    }
}

/// Picks the `ip=` line out of a trace response.
///
/// The body is a series of `key=value` lines, one pair per line. Only the
/// first `ip` key counts. A value that does not parse as an address is an
/// error rather than a silently bad record.
fn parse_trace(body: &str) -> Result<IpAddr, ClientError> {
    for line in body.lines() {
        if let Some(value) = line.strip_prefix("ip=") {
            return value
                .trim()
                .parse()
                .map_err(|err| ClientError::AddressParse(value.trim().to_string(), err));
        }
    }
    Err(ClientError::NoAddressFound)
}

#[async_trait]
impl IPSource for IPSourceCloudflareTrace {
    async fn get_ipv4(&self) -> Result<Ipv4Addr, ClientError> {
        match self.get_ip(IpAddr::V4(Ipv4Addr::UNSPECIFIED)).await? {
            IpAddr::V4(ip) => Ok(ip),
            found => Err(ClientError::WrongAddressFamily {
                expected: RecordType::A,
                found,
            }),
        }
    }

    async fn get_ipv6(&self) -> Result<Ipv6Addr, ClientError> {
        match self.get_ip(IpAddr::V6(Ipv6Addr::UNSPECIFIED)).await? {
            IpAddr::V6(ip) => Ok(ip),
            found => Err(ClientError::WrongAddressFamily {
                expected: RecordType::Aaaa,
                found,
            }),
        }
    }
}
