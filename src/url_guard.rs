//! SSRF guard: reject outbound fetches aimed at internal networks.
//! Parses with `url::Url`, rejects non-http(s) schemes, then resolves
//! DNS and classifies every returned address before a fetch proceeds.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use url::Url;

use crate::errors::UrlGuardError;

/// Validate a URL is safe to fetch: parses as http(s), isn't `localhost`,
/// passes the allowlist (if configured), and resolves to no private/
/// link-local/loopback addresses.
pub async fn validate(url: &str, allowed_hosts: &[String]) -> Result<(), UrlGuardError> {
    let parsed = Url::parse(url).map_err(|_| UrlGuardError::InvalidUrl)?;

    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlGuardError::SchemeForbidden),
    }

    let host = parsed.host_str().ok_or(UrlGuardError::InvalidUrl)?;
    let host_lower = host.to_ascii_lowercase();

    if host_lower == "localhost" {
        return Err(UrlGuardError::LocalhostRefused);
    }

    if !allowed_hosts.is_empty() && !allowed_hosts.iter().any(|h| h == &host_lower) {
        return Err(UrlGuardError::NotAllowlisted);
    }

    let port = parsed.port_or_known_default().unwrap_or(80);
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| UrlGuardError::DnsFailed)?
        .map(|sock| sock.ip())
        .collect::<Vec<_>>();

    if addrs.is_empty() {
        return Err(UrlGuardError::NoRecords);
    }

    if addrs.iter().any(|ip| is_private_destination(*ip)) {
        return Err(UrlGuardError::PrivateDestination);
    }

    Ok(())
}

/// Host portion of `url`, lowercased, or an empty string if it doesn't
/// parse. Used by the extractor and availability classifier to pick
/// host-specific selectors and currency defaults.
pub fn extract_host(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default()
}

/// True if `ip` is loopback, `0.0.0.0`, link-local, RFC1918, or IPv6 ULA.
pub fn is_private_destination(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    let o = ip.octets();
    // 169.254.0.0/16 (link-local)
    if o[0] == 169 && o[1] == 254 {
        return true;
    }
    // 10.0.0.0/8
    if o[0] == 10 {
        return true;
    }
    // 172.16.0.0/12
    if o[0] == 172 && (16..=31).contains(&o[1]) {
        return true;
    }
    // 192.168.0.0/16
    if o[0] == 192 && o[1] == 168 {
        return true;
    }
    false
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    // IPv4-mapped addresses inherit IPv4 classification.
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_v4(v4);
    }
    let seg = ip.segments();
    // fe80::/10 (link-local)
    if (seg[0] & 0xffc0) == 0xfe80 {
        return true;
    }
    // fc00::/7 (unique local address)
    if (seg[0] & 0xfe00) == 0xfc00 {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_host_lowercases_and_strips_port() {
        assert_eq!(extract_host("https://Example.COM:8443/path"), "example.com");
    }

    #[test]
    fn extract_host_on_unparseable_url_is_empty() {
        assert_eq!(extract_host("not a url"), "");
    }

    #[test]
    fn loopback_and_unspecified_v4_are_private() {
        assert!(is_private_destination("127.0.0.1".parse().unwrap()));
        assert!(is_private_destination("0.0.0.0".parse().unwrap()));
    }

    #[test]
    fn rfc1918_ranges_are_private() {
        assert!(is_private_destination("10.0.0.5".parse().unwrap()));
        assert!(is_private_destination("172.16.0.1".parse().unwrap()));
        assert!(is_private_destination("172.31.255.255".parse().unwrap()));
        assert!(!is_private_destination("172.32.0.1".parse().unwrap()));
        assert!(is_private_destination("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn link_local_v4_is_private() {
        assert!(is_private_destination("169.254.1.1".parse().unwrap()));
    }

    #[test]
    fn public_v4_is_not_private() {
        assert!(!is_private_destination("93.184.216.34".parse().unwrap()));
    }

    #[test]
    fn v6_loopback_and_ula_and_link_local() {
        assert!(is_private_destination("::1".parse().unwrap()));
        assert!(is_private_destination("fe80::1".parse().unwrap()));
        assert!(is_private_destination("fc00::1".parse().unwrap()));
        assert!(is_private_destination("fd12:3456:789a::1".parse().unwrap()));
        assert!(!is_private_destination("2001:4860:4860::8888".parse().unwrap()));
    }

    #[tokio::test]
    async fn invalid_scheme_rejected() {
        let err = validate("ftp://example.com/", &[]).await.unwrap_err();
        assert_eq!(err, UrlGuardError::SchemeForbidden);
    }

    #[tokio::test]
    async fn unparseable_url_rejected() {
        let err = validate("not a url", &[]).await.unwrap_err();
        assert_eq!(err, UrlGuardError::InvalidUrl);
    }

    #[tokio::test]
    async fn localhost_refused() {
        let err = validate("http://localhost/", &[]).await.unwrap_err();
        assert_eq!(err, UrlGuardError::LocalhostRefused);
    }

    #[tokio::test]
    async fn host_outside_allowlist_rejected() {
        let err = validate("http://example.com/", &["example.org".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, UrlGuardError::NotAllowlisted);
    }

    #[tokio::test]
    async fn private_ip_literal_rejected() {
        let err = validate("http://10.0.0.5/", &[]).await.unwrap_err();
        assert_eq!(err, UrlGuardError::PrivateDestination);
    }
}
