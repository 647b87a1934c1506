//! HTTP plumbing shared by the live providers.

use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode, Url};

use crate::errors::MarketDataError;

/// Per-request timeout. The aggregator's own timeout is the outer bound.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub fn build_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("hermes/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Build `base` + `path` with query parameters.
pub fn build_url(
    provider: &str,
    base: &str,
    path: &str,
    params: &[(&str, String)],
) -> Result<Url, MarketDataError> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    Url::parse_with_params(&raw, params.iter().map(|(k, v)| (*k, v.as_str()))).map_err(|e| {
        MarketDataError::ProviderError {
            provider: provider.to_string(),
            message: format!("Failed to build URL: {}", e),
        }
    })
}

/// GET `url` and return the body, mapping transport and status failures.
///
/// `secret` is masked in debug logs.
pub async fn get_text(
    client: &Client,
    provider: &str,
    url: Url,
    secret: Option<&str>,
) -> Result<String, MarketDataError> {
    let shown = match secret {
        Some(s) if !s.is_empty() => url.as_str().replace(s, "***"),
        _ => url.to_string(),
    };
    debug!("{} request: {}", provider, shown);

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            MarketDataError::Timeout {
                provider: provider.to_string(),
            }
        } else {
            MarketDataError::Network(e)
        }
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            MarketDataError::Timeout {
                provider: provider.to_string(),
            }
        } else {
            MarketDataError::Network(e)
        }
    })?;

    classify_status(provider, status, &body)?;
    Ok(body)
}

fn classify_status(provider: &str, status: StatusCode, body: &str) -> Result<(), MarketDataError> {
    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::IM_A_TEAPOT {
        return Err(MarketDataError::RateLimited {
            provider: provider.to_string(),
        });
    }
    if status.is_server_error() {
        return Err(MarketDataError::ServerError {
            provider: provider.to_string(),
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        let snippet: String = body.chars().take(200).collect();
        return Err(MarketDataError::ProviderError {
            provider: provider.to_string(),
            message: format!("HTTP {}: {}", status, snippet),
        });
    }
    Ok(())
}

pub fn parse_error(provider: &str, e: impl std::fmt::Display) -> MarketDataError {
    MarketDataError::Parse {
        provider: provider.to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_joins_and_encodes() {
        let url = build_url(
            "TEST",
            "https://api.example.com/",
            "/v2/everything",
            &[("q", "BRK.B news".to_string()), ("pageSize", "5".to_string())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v2/everything?q=BRK.B+news&pageSize=5"
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(classify_status("T", StatusCode::OK, "").is_ok());
        assert!(matches!(
            classify_status("T", StatusCode::TOO_MANY_REQUESTS, ""),
            Err(MarketDataError::RateLimited { .. })
        ));
        assert!(matches!(
            classify_status("T", StatusCode::BAD_GATEWAY, ""),
            Err(MarketDataError::ServerError { status: 502, .. })
        ));
        match classify_status("T", StatusCode::BAD_REQUEST, "{\"msg\":\"Invalid symbol.\"}") {
            Err(MarketDataError::ProviderError { message, .. }) => {
                assert!(message.contains("Invalid symbol"))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
