pub(crate) mod cloudflare_trace;
pub(crate) mod ip_source;
