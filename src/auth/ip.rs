//! Client IP extraction for rate limiting.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

use crate::cli::IpExtractor;

/// Key used when the server was started without connect info.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Extract the client IP address.
///
/// If `ip_extractor` is set, the IP comes from the configured proxy header and
/// a missing or invalid header is an error (no fallback to the socket address).
///
/// Otherwise the socket address from ConnectInfo is used. Client-supplied
/// headers are ignored in that mode.
pub fn extract_client_ip(
    request: &Request,
    ip_extractor: Option<&IpExtractor>,
) -> Result<String, &'static str> {
    match ip_extractor {
        Some(extractor) => {
            let header_value = request
                .headers()
                .get(extractor.header_name)
                .ok_or("IP header not present")?
                .to_str()
                .map_err(|_| "IP header contains invalid characters")?;
            extractor.extract(header_value)
        }
        None => Ok(request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ClientIpHeader;
    use axum::body::Body;

    fn request_from(addr: [u8; 4]) -> Request {
        let mut request = Request::builder()
            .header("x-forwarded-for", "198.51.100.1")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((addr, 4000))));
        request
    }

    #[test]
    fn test_socket_address_ignores_forwarded_for() {
        let request = request_from([192, 168, 1, 100]);

        assert_eq!(extract_client_ip(&request, None).unwrap(), "192.168.1.100");
    }

    #[test]
    fn test_configured_header() {
        let extractor = IpExtractor::from(ClientIpHeader::XForwardFor);
        let request = request_from([192, 168, 1, 100]);

        assert_eq!(
            extract_client_ip(&request, Some(&extractor)).unwrap(),
            "198.51.100.1"
        );
    }

    #[test]
    fn test_configured_header_missing() {
        let extractor = IpExtractor::from(ClientIpHeader::XRealIp);
        let request = request_from([192, 168, 1, 100]);

        assert!(extract_client_ip(&request, Some(&extractor)).is_err());
    }

    #[test]
    fn test_unknown_client() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_client_ip(&request, None).unwrap(), UNKNOWN_CLIENT);
    }
}
