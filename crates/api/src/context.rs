use std::net::SocketAddr;

use axum::http::{HeaderMap, header};

use academy_core::RequestMeta;

/// Who is calling, derived once per request by the context middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    client_ip: String,
    user_agent: String,
}

impl RequestContext {
    pub fn new(client_ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Build from request parts. `X-Forwarded-For` is only honored behind a trusted proxy.
    pub fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> Self {
        let forwarded = trust_proxy
            .then(|| headers.get("x-forwarded-for"))
            .flatten()
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let client_ip = match (forwarded, peer) {
            (Some(ip), _) => ip.to_string(),
            (None, Some(addr)) => addr.ip().to_string(),
            (None, None) => "unknown".to_string(),
        };

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        Self::new(client_ip, user_agent)
    }

    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn meta(&self) -> RequestMeta {
        RequestMeta {
            ip_address: self.client_ip.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, HeaderValue::from_static(v));
        }
        h
    }

    #[test]
    fn peer_address_is_used_without_proxy_trust() {
        let h = headers(&[("x-forwarded-for", "198.51.100.1")]);
        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        let ctx = RequestContext::from_parts(&h, Some(peer), false);
        assert_eq!(ctx.client_ip(), "192.0.2.10");
    }

    #[test]
    fn first_forwarded_hop_wins_behind_proxy() {
        let h = headers(&[("x-forwarded-for", " 198.51.100.1 , 10.0.0.1"), ("user-agent", "curl/8")]);
        let ctx = RequestContext::from_parts(&h, None, true);
        assert_eq!(ctx.client_ip(), "198.51.100.1");
        assert_eq!(ctx.user_agent(), "curl/8");
    }

    #[test]
    fn unknown_without_any_source() {
        let ctx = RequestContext::from_parts(&HeaderMap::new(), None, true);
        assert_eq!(ctx.client_ip(), "unknown");
        assert_eq!(ctx.meta().user_agent, "");
    }
}
