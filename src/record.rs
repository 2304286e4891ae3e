use crate::ip_source::ip_source::IPSource;
use crate::ClientError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use tokio::join;

/// TTL applied to every record we submit.
pub(crate) const RECORD_TTL: Duration = Duration::from_secs(300);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum RecordType {
    A,
    Aaaa,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::A => write!(f, "A"),
            RecordType::Aaaa => write!(f, "AAAA"),
        }
    }
}

/// One A or AAAA record, ready to hand to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AddressRecord {
    pub(crate) rrset_type: RecordType,
    pub(crate) name: String,
    pub(crate) value: IpAddr,
    pub(crate) ttl: Duration,
}

/// Discovers both public addresses and pairs them up with the subdomain.
///
/// The two lookups run concurrently, but the results are checked in A, AAAA
/// order and the first failure aborts the run. Nothing is submitted unless
/// both families resolved.
pub(crate) async fn build_records(
    ip_source: &Box<dyn IPSource>,
    subdomain: &str,
) -> Result<Vec<AddressRecord>, ClientError> {
    let (ipv4, ipv6) = join!(ip_source.get_ipv4(), ip_source.get_ipv6());
    let ipv4 = ipv4?;
    let ipv6 = ipv6?;
    Ok(vec![
        AddressRecord {
            rrset_type: RecordType::A,
            name: subdomain.to_string(),
            value: IpAddr::V4(ipv4),
            ttl: RECORD_TTL,
        },
        AddressRecord {
            rrset_type: RecordType::Aaaa,
            name: subdomain.to_string(),
            value: IpAddr::V6(ipv6),
            ttl: RECORD_TTL,
        },
    ])
}
