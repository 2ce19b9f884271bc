// Gateway endpoint handling.
//
// An `Endpoint` is the base REST URL, always ending in `/` so resources
// (`token`, `app`, `job`, ...) can be joined onto it. `validate` refuses
// hosts that point back into the local machine or a private network.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::debug;
use url::{Host, Url};

use crate::error::{CgError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://sandbox.cigi.illinois.edu/home/rest/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Parse a base URL, appending the terminating `/` when it is missing.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        let base = Url::parse(&normalized).map_err(|e| CgError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        match base.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CgError::InvalidUrl {
                    url: raw.to_string(),
                    reason: format!("unsupported scheme \"{other}\""),
                })
            }
        }
        if base.cannot_be_a_base() || base.host().is_none() {
            return Err(CgError::InvalidUrl {
                url: raw.to_string(),
                reason: "no host name".into(),
            });
        }
        Ok(Endpoint { base })
    }

    /// URL of a Gateway resource below this endpoint.
    pub fn resource(&self, name: &str) -> Result<Url> {
        self.base.join(name).map_err(|e| CgError::InvalidUrl {
            url: format!("{}{}", self.base, name),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.as_str())
    }
}

/// Reject URLs whose host is `localhost` or a loopback, private or reserved
/// IP literal. DNS names are accepted without resolving them.
pub fn validate(url: &Url) -> Result<()> {
    debug!("testing URL host name validity");
    let invalid = |reason: &str| CgError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };
    match url.host() {
        None => return Err(invalid("no host name")),
        Some(Host::Domain(name)) => {
            if name.eq_ignore_ascii_case("localhost") {
                return Err(invalid("localhost is not allowed"));
            }
            // A bare numeric host that url did not normalize still gets checked.
            if let Ok(ip) = name.parse::<IpAddr>() {
                if is_disallowed(ip) {
                    return Err(invalid("loopback, private or reserved address"));
                }
            }
        }
        Some(Host::Ipv4(v4)) => {
            if is_disallowed(IpAddr::V4(v4)) {
                return Err(invalid("loopback, private or reserved address"));
            }
        }
        Some(Host::Ipv6(v6)) => {
            if is_disallowed(IpAddr::V6(v6)) {
                return Err(invalid("loopback, private or reserved address"));
            }
        }
    }
    debug!("URL passed host name tests");
    Ok(())
}

/// Loopback, private (RFC 1918 / RFC 5735 special use) or reserved.
pub fn is_disallowed(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_disallowed_v4(v4),
        IpAddr::V6(v6) => is_disallowed_v6(v6),
    }
}

fn is_disallowed_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        // 0.0.0.0/8 "this network"
        || a == 0
        // 192.0.0.0/24 IETF protocol assignments
        || (a == 192 && b == 0 && c == 0)
        // 198.18.0.0/15 benchmarking
        || (a == 198 && (b == 18 || b == 19))
        // 240.0.0.0/4 reserved
        || a >= 240
}

fn is_disallowed_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_disallowed_v4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
        // fec0::/10 deprecated site local
        || (first & 0xffc0) == 0xfec0
        // 2001:db8::/32 documentation
        || (first == 0x2001 && ip.segments()[1] == 0x0db8)
        // ::/8 reserved
        || (first & 0xff00) == 0
}
