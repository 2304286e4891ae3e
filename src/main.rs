use crate::cloudflare::{CloudflareProvider, CLOUDFLARE_API_URL};
use crate::config::Config;
use crate::domain::split_domain;
use crate::ip_source::{cloudflare_trace::IPSourceCloudflareTrace, ip_source::IPSource};
use crate::record::{build_records, RecordType};
use clap::Parser;
use config::ConfigError;
use ip_source::cloudflare_trace::CLOUDFLARE_TRACE_URL;
use reqwest::header::InvalidHeaderValue;
use reqwest::StatusCode;
use std::net::{AddrParseError, IpAddr};
mod cloudflare;
mod config;
mod domain;
mod ip_source;
mod opts;
mod record;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Error occured while reading config: {0}")]
    Config(#[from] ConfigError),
    #[error("Error while accessing the Cloudflare API: {0}")]
    Api(#[from] ApiError),
    #[error("Error while converting the API token to a header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
    #[error("Error while sending request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Too few domain labels in {0:?}, expected at least subdomain.zone.tld")]
    TooFewLabels(String),
    #[error("No address found in the trace response")]
    NoAddressFound,
    #[error("Could not parse {0:?} as an IP address: {1}")]
    AddressParse(String, AddrParseError),
    #[error("Expected an {expected} address but the trace endpoint reported {found}")]
    WrongAddressFamily { expected: RecordType, found: IpAddr },
    #[error("No zone named {0:?} is available with this API token")]
    UnknownZone(String),
    #[error("Unexpected response from the Cloudflare API: {0}")]
    BadResponse(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API returned 403 - Forbidden. Message: {message:?}")]
    Forbidden { message: String },
    #[error("API returned 401 - Unauthorized. Provided API token is possibly incorrect")]
    Unauthorized(),
    #[error("API returned {0} - {1}")]
    Unknown(StatusCode, String),
}

async fn run(
    api_base_url: &str,
    ip_source: &Box<dyn IPSource>,
    conf: &Config,
) -> Result<(), ClientError> {
    let split = split_domain(&conf.domain)?;
    println!(
        "Updating {} in zone {}",
        &split.subdomain, &split.zone
    );

    println!("Finding out the IP addresses...");
    let records = build_records(ip_source, &split.subdomain).await?;
    println!("Found these:");
    for record in &records {
        println!("\t{}: {}", record.rrset_type, record.value);
    }

    let provider = CloudflareProvider::new(api_base_url, &conf.api_token, conf.timeout)?;
    println!("Attempting to update DNS entries now");
    let updated = provider.set_records(&split.zone, &records).await?;

    println!("Updates done for {} entries", updated.len());
    for record in &updated {
        println!(
            "\t{} {} -> {} (TTL {}s)",
            record.rrset_type,
            &conf.domain,
            record.value,
            record.ttl.as_secs()
        );
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let opts = opts::Opts::parse();
    let conf = config::load_config(&opts)?;
    let ip_source: Box<dyn IPSource> = Box::new(IPSourceCloudflareTrace::new(
        CLOUDFLARE_TRACE_URL,
        conf.timeout,
    ));
    run(CLOUDFLARE_API_URL, &ip_source, &conf).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};
    use std::time::Duration;

    use crate::{config::Config, ip_source::ip_source::IPSource, run, ClientError};
    use async_trait::async_trait;
    use httpmock::MockServer;

    struct IPSourceMock;

    #[async_trait]
    impl IPSource for IPSourceMock {
        async fn get_ipv4(&self) -> Result<Ipv4Addr, ClientError> {
            Ok("203.0.113.7".parse().unwrap())
        }
        async fn get_ipv6(&self) -> Result<Ipv6Addr, ClientError> {
            Ok("2001:db8::1".parse().unwrap())
        }
    }

    struct IPSourceNoConnectivity;

    #[async_trait]
    impl IPSource for IPSourceNoConnectivity {
        async fn get_ipv4(&self) -> Result<Ipv4Addr, ClientError> {
            Err(ClientError::NoAddressFound)
        }
        async fn get_ipv6(&self) -> Result<Ipv6Addr, ClientError> {
            Ok("2001:db8::1".parse().unwrap())
        }
    }

    fn test_config() -> Config {
        Config {
            domain: "home.example.com".to_string(),
            api_token: "xxx".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn single_shot() {
        let server = MockServer::start();
        let zone_lookup = server.mock(|when, then| {
            when.method("GET")
                .path("/zones")
                .query_param("name", "example.com");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"success":true,"errors":[],"result":[{"id":"023e105f","name":"example.com"}]}"#);
        });
        let a_lookup = server.mock(|when, then| {
            when.method("GET")
                .path("/zones/023e105f/dns_records")
                .query_param("name", "home.example.com")
                .query_param("type", "A");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"success":true,"errors":[],"result":[{"id":"rec-a","type":"A","name":"home.example.com","content":"198.51.100.1","ttl":300}]}"#);
        });
        let aaaa_lookup = server.mock(|when, then| {
            when.method("GET")
                .path("/zones/023e105f/dns_records")
                .query_param("name", "home.example.com")
                .query_param("type", "AAAA");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"success":true,"errors":[],"result":[]}"#);
        });
        let a_update = server.mock(|when, then| {
            when.method("PUT")
                .path("/zones/023e105f/dns_records/rec-a")
                .body_contains("203.0.113.7");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"success":true,"errors":[],"result":{"id":"rec-a","type":"A","name":"home.example.com","content":"203.0.113.7","ttl":300}}"#);
        });
        let aaaa_create = server.mock(|when, then| {
            when.method("POST")
                .path("/zones/023e105f/dns_records")
                .body_contains("2001:db8::1");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"success":true,"errors":[],"result":{"id":"rec-aaaa","type":"AAAA","name":"home.example.com","content":"2001:db8::1","ttl":300}}"#);
        });

        let conf = test_config();
        let ip_source: Box<dyn IPSource> = Box::new(IPSourceMock);
        run(server.base_url().as_str(), &ip_source, &conf)
            .await
            .expect("Failed when running the update");

        zone_lookup.assert();
        a_lookup.assert();
        aaaa_lookup.assert();
        a_update.assert();
        aaaa_create.assert();
    }

    #[tokio::test]
    async fn failed_discovery_submits_nothing() {
        let server = MockServer::start();
        let zone_lookup = server.mock(|when, then| {
            when.method("GET").path("/zones");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"success":true,"errors":[],"result":[{"id":"023e105f","name":"example.com"}]}"#);
        });

        let conf = test_config();
        let ip_source: Box<dyn IPSource> = Box::new(IPSourceNoConnectivity);
        run(server.base_url().as_str(), &ip_source, &conf)
            .await
            .expect_err("Update should fail when discovery fails");

        assert_eq!(zone_lookup.hits(), 0);
    }

    #[tokio::test]
    async fn unknown_zone_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/zones");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"success":true,"errors":[],"result":[]}"#);
        });

        let conf = test_config();
        let ip_source: Box<dyn IPSource> = Box::new(IPSourceMock);
        let err = run(server.base_url().as_str(), &ip_source, &conf)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownZone(_)));
    }

    #[tokio::test]
    async fn bad_token_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("GET").path("/zones");
            then.status(403)
                .body(r#"{"success":false,"errors":[{"code":9109,"message":"Invalid access token"}],"result":[]}"#);
        });

        let conf = test_config();
        let ip_source: Box<dyn IPSource> = Box::new(IPSourceMock);
        let err = run(server.base_url().as_str(), &ip_source, &conf)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api(_)));
    }

    #[tokio::test]
    async fn short_domain_fails_before_any_request() {
        let server = MockServer::start();
        let zone_lookup = server.mock(|when, then| {
            when.method("GET").path("/zones");
            then.status(200);
        });

        let conf = Config {
            domain: "example.com".to_string(),
            ..test_config()
        };
        let ip_source: Box<dyn IPSource> = Box::new(IPSourceMock);
        let err = run(server.base_url().as_str(), &ip_source, &conf)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::TooFewLabels(_)));
        assert_eq!(zone_lookup.hits(), 0);
    }
}
