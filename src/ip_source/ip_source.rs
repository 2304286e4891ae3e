use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::ClientError;

#[async_trait]
pub trait IPSource {
    async fn get_ipv4(&self) -> Result<Ipv4Addr, ClientError>;
    async fn get_ipv6(&self) -> Result<Ipv6Addr, ClientError>;
}
