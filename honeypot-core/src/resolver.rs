//! Client IP resolution.
//!
//! An [`IpResolver`] walks an ordered chain of [`IpSource`]s and keeps the
//! first non-empty answer. Server-derived answers are normalized (IPv6
//! loopback and IPv4-mapped forms collapse to dotted IPv4); a value the
//! client reported in the request body is kept verbatim.
//!
//! Every proxy hop is trusted. A direct caller can forge `x-forwarded-for`
//! and friends and have them recorded as its address.

use crate::entry::UNKNOWN;
use http::HeaderMap;
use std::net::SocketAddr;

const MAPPED_PREFIX: &str = "::ffff:";

/// Everything a source may look at.
#[derive(Debug, Clone, Copy)]
pub struct RequestFacts<'a> {
    pub body_ip: Option<&'a str>,
    pub headers: &'a HeaderMap,
    pub peer: Option<SocketAddr>,
}

/// One place a client address may come from.
pub trait IpSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` (or an empty string) hands over to the next source.
    fn resolve(&self, facts: &RequestFacts<'_>) -> Option<String>;

    /// Whether the value came from the client itself rather than the transport.
    fn client_reported(&self) -> bool {
        false
    }
}

/// Result of a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIp {
    pub value: String,
    /// Name of the winning source, `"none"` when nothing matched.
    pub source: &'static str,
}

// ── Sources ───────────────────────────────────────────────────

/// `ip` field of the JSON body, as reported by the visitor's own script.
pub struct BodyField;

impl IpSource for BodyField {
    fn name(&self) -> &'static str {
        "body"
    }

    fn resolve(&self, facts: &RequestFacts<'_>) -> Option<String> {
        facts.body_ip.map(str::to_string)
    }

    fn client_reported(&self) -> bool {
        true
    }
}

/// A single-valued header such as `cf-connecting-ip`.
pub struct Header(pub &'static str);

impl IpSource for Header {
    fn name(&self) -> &'static str {
        self.0
    }

    fn resolve(&self, facts: &RequestFacts<'_>) -> Option<String> {
        header_str(facts.headers, self.0).map(str::to_string)
    }
}

/// Leftmost entry of `x-forwarded-for`, trimmed.
pub struct ForwardedFor;

impl IpSource for ForwardedFor {
    fn name(&self) -> &'static str {
        "x-forwarded-for"
    }

    fn resolve(&self, facts: &RequestFacts<'_>) -> Option<String> {
        let chain = header_str(facts.headers, "x-forwarded-for")?;
        chain.split(',').next().map(|first| first.trim().to_string())
    }
}

/// Proxy-aware address: with every hop trusted this is the furthest
/// non-empty hop of the `x-forwarded-for` chain. Yields nothing when proxies
/// are not trusted.
pub struct TrustedProxy {
    pub trust_all: bool,
}

impl IpSource for TrustedProxy {
    fn name(&self) -> &'static str {
        "trusted-proxy"
    }

    fn resolve(&self, facts: &RequestFacts<'_>) -> Option<String> {
        if !self.trust_all {
            return None;
        }
        header_str(facts.headers, "x-forwarded-for")?
            .split(',')
            .map(str::trim)
            .find(|hop| !hop.is_empty())
            .map(str::to_string)
    }
}

/// Remote address of the TCP connection.
pub struct PeerAddr;

impl IpSource for PeerAddr {
    fn name(&self) -> &'static str {
        "peer"
    }

    fn resolve(&self, facts: &RequestFacts<'_>) -> Option<String> {
        facts.peer.map(|addr| addr.ip().to_string())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

// ── Resolver ──────────────────────────────────────────────────

/// Ordered source chain; first non-empty value wins.
pub struct IpResolver {
    sources: Vec<Box<dyn IpSource>>,
}

impl IpResolver {
    pub fn new(sources: Vec<Box<dyn IpSource>>) -> Self {
        Self { sources }
    }

    /// body `ip` → `cf-connecting-ip` → `x-real-ip` → `x-forwarded-for`
    /// (leftmost) → `x-client-ip` → trusted proxy → peer address.
    pub fn standard(trust_proxy: bool) -> Self {
        Self::new(vec![
            Box::new(BodyField),
            Box::new(Header("cf-connecting-ip")),
            Box::new(Header("x-real-ip")),
            Box::new(ForwardedFor),
            Box::new(Header("x-client-ip")),
            Box::new(TrustedProxy { trust_all: trust_proxy }),
            Box::new(PeerAddr),
        ])
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn resolve(&self, facts: &RequestFacts<'_>) -> ResolvedIp {
        for source in &self.sources {
            let Some(raw) = source.resolve(facts).filter(|v| !v.is_empty()) else {
                continue;
            };
            let value = if source.client_reported() {
                raw
            } else {
                normalize(&raw)
            };
            return ResolvedIp {
                value,
                source: source.name(),
            };
        }
        ResolvedIp {
            value: UNKNOWN.to_string(),
            source: "none",
        }
    }
}

/// `::1` and `::ffff:127.0.0.1` become `127.0.0.1`; any other `::ffff:`
/// prefix is stripped. Nothing else is validated.
pub fn normalize(raw: &str) -> String {
    if raw == "::1" || raw == "::ffff:127.0.0.1" {
        return "127.0.0.1".to_string();
    }
    raw.strip_prefix(MAPPED_PREFIX).unwrap_or(raw).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    fn resolve(body_ip: Option<&str>, map: &HeaderMap, peer: Option<&str>) -> ResolvedIp {
        let facts = RequestFacts {
            body_ip,
            headers: map,
            peer: peer.map(|p| p.parse().unwrap()),
        };
        IpResolver::standard(true).resolve(&facts)
    }

    #[test]
    fn standard_chain_order() {
        assert_eq!(
            IpResolver::standard(true).source_names(),
            vec![
                "body",
                "cf-connecting-ip",
                "x-real-ip",
                "x-forwarded-for",
                "x-client-ip",
                "trusted-proxy",
                "peer"
            ]
        );
    }

    #[test]
    fn body_ip_wins_over_everything() {
        let map = headers(&[("cf-connecting-ip", "203.0.113.5"), ("x-real-ip", "10.0.0.2")]);
        let r = resolve(Some("198.51.100.1"), &map, Some("127.0.0.1:9000"));
        assert_eq!(r.value, "198.51.100.1");
        assert_eq!(r.source, "body");
    }

    #[test]
    fn body_ip_is_not_normalized() {
        let map = HeaderMap::new();
        assert_eq!(resolve(Some("::1"), &map, None).value, "::1");
        assert_eq!(resolve(Some("::ffff:1.2.3.4"), &map, None).value, "::ffff:1.2.3.4");
    }

    #[test]
    fn empty_body_ip_falls_through() {
        let map = headers(&[("cf-connecting-ip", "203.0.113.5")]);
        let r = resolve(Some(""), &map, None);
        assert_eq!(r.value, "203.0.113.5");
        assert_eq!(r.source, "cf-connecting-ip");
    }

    #[test]
    fn cloudflare_header_beats_real_ip() {
        let map = headers(&[("cf-connecting-ip", "203.0.113.5"), ("x-real-ip", "10.0.0.2")]);
        assert_eq!(resolve(None, &map, None).value, "203.0.113.5");
    }

    #[test]
    fn real_ip_beats_forwarded_for() {
        let map = headers(&[("x-real-ip", "10.0.0.2"), ("x-forwarded-for", "198.51.100.7")]);
        assert_eq!(resolve(None, &map, None).source, "x-real-ip");
    }

    #[test]
    fn forwarded_for_takes_leftmost_trimmed() {
        let map = headers(&[("x-forwarded-for", "  198.51.100.7 , 10.0.0.1")]);
        let r = resolve(None, &map, None);
        assert_eq!(r.value, "198.51.100.7");
        assert_eq!(r.source, "x-forwarded-for");
    }

    #[test]
    fn forwarded_for_with_empty_first_hop_defers_to_client_ip() {
        let map = headers(&[("x-forwarded-for", " , 10.0.0.1"), ("x-client-ip", "192.0.2.4")]);
        let r = resolve(None, &map, None);
        assert_eq!(r.value, "192.0.2.4");
        assert_eq!(r.source, "x-client-ip");
    }

    #[test]
    fn trusted_proxy_finds_first_non_empty_hop() {
        let map = headers(&[("x-forwarded-for", " , 10.0.0.1")]);
        let r = resolve(None, &map, Some("127.0.0.1:5000"));
        assert_eq!(r.value, "10.0.0.1");
        assert_eq!(r.source, "trusted-proxy");
    }

    #[test]
    fn untrusted_proxy_skips_to_peer() {
        let map = headers(&[("x-forwarded-for", " , 10.0.0.1")]);
        let facts = RequestFacts {
            body_ip: None,
            headers: &map,
            peer: Some("192.0.2.10:4000".parse().unwrap()),
        };
        let r = IpResolver::standard(false).resolve(&facts);
        assert_eq!(r.value, "192.0.2.10");
        assert_eq!(r.source, "peer");
    }

    #[test]
    fn peer_ipv6_loopback_is_normalized() {
        let map = HeaderMap::new();
        assert_eq!(resolve(None, &map, Some("[::1]:4000")).value, "127.0.0.1");
    }

    #[test]
    fn peer_mapped_ipv4_is_unwrapped() {
        let map = HeaderMap::new();
        let r = resolve(None, &map, Some("[::ffff:203.0.113.9]:4000"));
        assert_eq!(r.value, "203.0.113.9");
    }

    #[test]
    fn header_values_are_normalized() {
        let map = headers(&[("x-real-ip", "::ffff:203.0.113.9")]);
        assert_eq!(resolve(None, &map, None).value, "203.0.113.9");
    }

    #[test]
    fn nothing_resolves_to_unknown() {
        let map = HeaderMap::new();
        let r = resolve(None, &map, None);
        assert_eq!(r.value, "Unknown");
        assert_eq!(r.source, "none");
    }

    #[test]
    fn normalize_rules() {
        assert_eq!(normalize("::1"), "127.0.0.1");
        assert_eq!(normalize("::ffff:127.0.0.1"), "127.0.0.1");
        assert_eq!(normalize("::ffff:203.0.113.9"), "203.0.113.9");
        assert_eq!(normalize("2001:db8::1"), "2001:db8::1");
        assert_eq!(normalize("not-an-ip"), "not-an-ip");
    }

    #[test]
    fn custom_chain_is_honoured() {
        let resolver = IpResolver::new(vec![Box::new(Header("x-client-ip")), Box::new(PeerAddr)]);
        let map = headers(&[("cf-connecting-ip", "203.0.113.5"), ("x-client-ip", "192.0.2.4")]);
        let facts = RequestFacts { body_ip: None, headers: &map, peer: None };
        assert_eq!(resolver.resolve(&facts).value, "192.0.2.4");
    }
}
