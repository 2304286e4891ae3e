use clap::Parser;

/// A tool to automatically update DNS entries on Cloudflare, using it as a dynamic DNS system.
#[derive(Parser, Debug, Default)]
#[clap(author, version, about, long_about = None, name = "cloudflare-dyndns")]
pub struct Opts {
    /// The fully qualified domain name to update, e.g. home.example.com.
    ///
    /// The last two labels are the zone delegated to Cloudflare, everything
    /// before them names the record that gets updated.
    #[clap(long)]
    pub dns_domain: String,
    /// Timeout for each network operation, in seconds.
    ///
    /// Applies to the address discovery requests and to every Cloudflare API
    /// call individually.
    #[clap(long, default_value_t = 10)]
    pub timeout: u64,
}
