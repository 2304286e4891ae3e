use crate::ClientError;

/// A fully qualified domain name split into the zone Cloudflare manages and
/// the record name beneath it.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SplitDomain {
    pub(crate) zone: String,
    pub(crate) subdomain: String,
}

/// Splits a domain into the registrable zone (the last two labels) and the
/// subdomain (everything before them).
///
/// Requires at least 3 labels so that both parts are non-empty. Label syntax
/// is not validated, Cloudflare rejects bad names on its own.
pub(crate) fn split_domain(domain: &str) -> Result<SplitDomain, ClientError> {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 3 {
        return Err(ClientError::TooFewLabels(domain.to_string()));
    }
    Ok(SplitDomain {
        zone: labels[labels.len() - 2..].join("."),
        subdomain: labels[..labels.len() - 2].join("."),
    })
}
