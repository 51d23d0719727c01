//! Sanity checks for configured upstream targets.
//!
//! Failing validation does not reject the monitor; the caller logs a warning
//! and the probes report the problem on every tick.

use thiserror::Error;
use url::Url;

use super::types::Protocol;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid scheme for HTTP monitor: {0}")]
    InvalidScheme(String),
    #[error("URL has no host")]
    MissingHost,
    #[error("TCP target must be in format host:port")]
    InvalidTcpFormat,
    #[error("invalid port number: {0}")]
    InvalidPort(String),
}

/// Validates a monitor target based on its protocol
pub fn validate_upstream(protocol: Protocol, target: &str) -> Result<(), ValidationError> {
    match protocol {
        Protocol::Http => validate_http_target(target),
        Protocol::Tcp => validate_tcp_target(target),
    }
}

fn validate_http_target(target: &str) -> Result<(), ValidationError> {
    let url = Url::parse(target).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ValidationError::InvalidScheme(other.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::MissingHost);
    }

    if url.port() == Some(0) {
        return Err(ValidationError::InvalidPort("0".to_string()));
    }

    Ok(())
}

/// Expected format: host:port (IPv6 hosts in brackets)
fn validate_tcp_target(target: &str) -> Result<(), ValidationError> {
    let (host, port) = target.rsplit_once(':').ok_or(ValidationError::InvalidTcpFormat)?;

    if host.is_empty() || host == "[]" {
        return Err(ValidationError::InvalidTcpFormat);
    }

    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(ValidationError::InvalidPort(port.to_string())),
        Ok(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_http_target() {
        // Valid
        assert!(validate_http_target("https://example.com").is_ok());
        assert!(validate_http_target("http://example.com:8080/health").is_ok());
        assert!(validate_http_target("http://127.0.0.1:3000").is_ok());

        // Invalid - wrong scheme
        assert_eq!(
            validate_http_target("ftp://example.com"),
            Err(ValidationError::InvalidScheme("ftp".to_string()))
        );

        // Invalid - not a URL
        assert!(matches!(
            validate_http_target("example.com"),
            Err(ValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_validate_tcp_target() {
        // Valid
        assert!(validate_tcp_target("example.com:80").is_ok());
        assert!(validate_tcp_target("10.0.0.1:5432").is_ok());
        assert!(validate_tcp_target("[::1]:6379").is_ok());

        // Invalid - format
        assert_eq!(validate_tcp_target("example.com"), Err(ValidationError::InvalidTcpFormat));
        assert_eq!(validate_tcp_target(":80"), Err(ValidationError::InvalidTcpFormat));

        // Invalid - port
        assert!(matches!(validate_tcp_target("example.com:"), Err(ValidationError::InvalidPort(_))));
        assert!(matches!(validate_tcp_target("example.com:0"), Err(ValidationError::InvalidPort(_))));
        assert!(matches!(
            validate_tcp_target("example.com:70000"),
            Err(ValidationError::InvalidPort(_))
        ));
    }

    #[test]
    fn test_validate_upstream_dispatches_on_protocol() {
        assert!(validate_upstream(Protocol::Http, "https://example.com").is_ok());
        assert!(validate_upstream(Protocol::Tcp, "https://example.com").is_err());
    }
}
