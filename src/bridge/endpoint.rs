// ABOUTME: Derives the WebSocket endpoint for a session from a page or host URL
// Secure pages map to wss, plain pages to ws, and the query string is forwarded

use thiserror::Error;
use url::Url;

/// Path the PTY host serves sessions on.
pub const SESSION_PATH: &str = "/ws";

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Resolve the session endpoint for `page`.
///
/// `http`/`https` URLs are treated as the page hosting the terminal: the
/// scheme becomes `ws`/`wss`, the path becomes [`SESSION_PATH`] and the query
/// string is kept as is. `ws`/`wss` URLs already name an endpoint and are
/// returned unchanged.
pub fn endpoint_for(page: &str) -> Result<Url, EndpointError> {
    let parsed = Url::parse(page)?;
    let scheme = match parsed.scheme() {
        "ws" | "wss" => return Ok(parsed),
        "https" => "wss",
        "http" => "ws",
        other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
    };

    // Bracketed for IPv6 literals.
    let Some(host) = parsed.host_str() else {
        return Err(EndpointError::MissingHost(page.to_string()));
    };

    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    // A bare `?` carries no query, same as an empty location.search.
    let query = parsed
        .query()
        .filter(|q| !q.is_empty())
        .map(|q| format!("?{q}"))
        .unwrap_or_default();

    Ok(Url::parse(&format!("{scheme}://{authority}{SESSION_PATH}{query}"))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_page_maps_to_ws() {
        let url = endpoint_for("http://localhost:8080/").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8080/ws");
    }

    #[test]
    fn test_secure_page_maps_to_wss() {
        let url = endpoint_for("https://example.com/index.html").unwrap();
        assert_eq!(url.as_str(), "wss://example.com/ws");
    }

    #[test]
    fn test_query_is_forwarded_unchanged() {
        let url = endpoint_for("http://host:9000/play?size=9&theme=dark").unwrap();
        assert_eq!(url.as_str(), "ws://host:9000/ws?size=9&theme=dark");
    }

    #[test]
    fn test_bare_question_mark_is_dropped() {
        let url = endpoint_for("http://host:9000/?").unwrap();
        assert_eq!(url.as_str(), "ws://host:9000/ws");
    }

    #[test]
    fn test_default_port_is_not_added() {
        let url = endpoint_for("https://example.com:443/").unwrap();
        assert_eq!(url.as_str(), "wss://example.com/ws");
    }

    #[test]
    fn test_ipv6_host() {
        let url = endpoint_for("http://[::1]:8080/").unwrap();
        assert_eq!(url.as_str(), "ws://[::1]:8080/ws");
    }

    #[test]
    fn test_websocket_url_is_used_as_is() {
        let url = endpoint_for("wss://example.com/custom/path?x=1").unwrap();
        assert_eq!(url.as_str(), "wss://example.com/custom/path?x=1");
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(
            endpoint_for("ftp://example.com/"),
            Err(EndpointError::UnsupportedScheme(s)) if s == "ftp"
        ));
        assert!(matches!(endpoint_for("not a url"), Err(EndpointError::InvalidUrl(_))));
    }
}
