//! One-shot OAuth bootstrap flow.
//!
//! Obtaining the long-lived refresh token requires a single interactive
//! authorization: `prism setup` prints the Zoho authorization URL, runs a
//! temporary listener on localhost for the redirect carrying the one-time
//! authorization code, exchanges the code for a refresh token, prints it,
//! and exits. The listener accepts exactly one connection and is torn down
//! afterwards.
//!
//! Only `ZOHO_CLIENT_ID` and `ZOHO_CLIENT_SECRET` are needed here; the
//! refresh token is what this flow produces.

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use crate::error::PrismError;

/// Port the temporary redirect listener binds on localhost.
///
/// The OAuth client registered in the Zoho API console must list
/// `http://localhost:8085/oauth/callback` as an authorized redirect URI.
const REDIRECT_PORT: u16 = 8085;

/// Redirect URI registered with the OAuth client.
const REDIRECT_URI: &str = "http://localhost:8085/oauth/callback";

/// OAuth scope covering the read-only ticket operations Prism exposes.
const OAUTH_SCOPE: &str = "Desk.tickets.READ";

/// Default Zoho accounts base URL (same default as the server config).
const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.com";

/// Runs the interactive bootstrap flow to completion.
///
/// # Errors
///
/// Fails when the OAuth client credentials are missing from the
/// environment, the listener cannot bind, the redirect does not carry an
/// authorization code, or the code exchange is rejected.
pub async fn run() -> Result<()> {
    let client_id = required_env("ZOHO_CLIENT_ID")?;
    let client_secret = required_env("ZOHO_CLIENT_SECRET")?;
    let accounts_url = std::env::var("ZOHO_ACCOUNTS_URL")
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string());

    let authorize_url = build_authorize_url(&accounts_url, &client_id)?;

    println!("Open the following URL in a browser and approve access:");
    println!();
    println!("  {}", authorize_url);
    println!();
    println!("Waiting for the redirect on {} ...", REDIRECT_URI);

    let code = wait_for_code().await?;

    let refresh_token = exchange_code(&accounts_url, &client_id, &client_secret, &code)
        .await
        .context("authorization code exchange failed")?;

    println!();
    println!("Refresh token obtained. Add this to your environment:");
    println!();
    println!("  ZOHO_REFRESH_TOKEN={}", refresh_token);

    Ok(())
}

/// Reads a required environment variable, trimmed.
fn required_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PrismError::missing_env(&[name]).into())
}

/// Builds the Zoho authorization URL for the offline-access consent screen.
fn build_authorize_url(accounts_url: &str, client_id: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/oauth/v2/auth", accounts_url))
        .context("invalid accounts URL")?;
    url.query_pairs_mut()
        .append_pair("scope", OAUTH_SCOPE)
        .append_pair("client_id", client_id)
        .append_pair("response_type", "code")
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .append_pair("redirect_uri", REDIRECT_URI);
    Ok(url)
}

/// Accepts one connection on the redirect port and extracts the code.
async fn wait_for_code() -> Result<String> {
    let listener = TcpListener::bind(("127.0.0.1", REDIRECT_PORT))
        .await
        .with_context(|| format!("failed to bind localhost:{}", REDIRECT_PORT))?;

    let (mut stream, _) = listener
        .accept()
        .await
        .context("failed to accept redirect connection")?;

    // The redirect is one small GET request; the request line is all we need.
    let mut buf = vec![0u8; 4096];
    let n = stream
        .read(&mut buf)
        .await
        .context("failed to read redirect request")?;
    let request = String::from_utf8_lossy(&buf[..n]).into_owned();

    let outcome = parse_redirect_code(&request);

    let page = match &outcome {
        Ok(_) => "Authorization received. You can close this window.",
        Err(_) => "Authorization failed. Check the terminal for details.",
    };
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        page.len(),
        page
    );
    // Best effort; the exchange result is what matters.
    let _ = stream.write_all(response.as_bytes()).await;

    outcome
}

/// Extracts the authorization code from the redirect's request line.
fn parse_redirect_code(request: &str) -> Result<String> {
    let request_line = request.lines().next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (Some("GET"), Some(target)) = (parts.next(), parts.next()) else {
        bail!("unexpected redirect request: {:?}", request_line);
    };

    let url = Url::parse(&format!("http://localhost{}", target))
        .with_context(|| format!("malformed redirect target: {:?}", target))?;

    if let Some((_, error)) = url.query_pairs().find(|(k, _)| k == "error") {
        bail!("authorization was denied: {}", error);
    }

    url.query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .context("redirect did not carry an authorization code")
}

/// Exchanges the one-time authorization code for a refresh token.
async fn exchange_code(
    accounts_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> Result<String> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("redirect_uri", REDIRECT_URI),
    ];

    let response = reqwest::Client::new()
        .post(format!("{}/oauth/v2/token", accounts_url))
        .form(&params)
        .send()
        .await
        .context("token endpoint unreachable")?;

    let body: serde_json::Value = response
        .json()
        .await
        .context("token endpoint returned non-JSON response")?;

    if let Some(error) = body.get("error").and_then(serde_json::Value::as_str) {
        bail!("token endpoint rejected the code: {}", error);
    }

    body.get("refresh_token")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .context("token response did not contain a refresh_token")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_build_authorize_url_contains_required_params() {
        let url = build_authorize_url("https://accounts.zoho.com", "1000.CLIENTID").unwrap();
        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(url.as_str().starts_with("https://accounts.zoho.com/oauth/v2/auth?"));
        assert!(query.contains(&("client_id".to_string(), "1000.CLIENTID".to_string())));
        assert!(query.contains(&("response_type".to_string(), "code".to_string())));
        assert!(query.contains(&("access_type".to_string(), "offline".to_string())));
        assert!(query.contains(&("redirect_uri".to_string(), REDIRECT_URI.to_string())));
    }

    #[test]
    fn test_parse_redirect_code_extracts_code() {
        let request = "GET /oauth/callback?code=1000.abc123&location=eu HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let code = parse_redirect_code(request).unwrap();
        assert_eq!(code, "1000.abc123");
    }

    #[test]
    fn test_parse_redirect_code_reports_denial() {
        let request = "GET /oauth/callback?error=access_denied HTTP/1.1\r\n\r\n";
        let err = parse_redirect_code(request).unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }

    #[test]
    fn test_parse_redirect_code_missing_code() {
        let request = "GET /oauth/callback HTTP/1.1\r\n\r\n";
        assert!(parse_redirect_code(request).is_err());
    }

    #[test]
    fn test_parse_redirect_code_rejects_non_get() {
        let request = "POST /oauth/callback?code=x HTTP/1.1\r\n\r\n";
        assert!(parse_redirect_code(request).is_err());
    }

    #[tokio::test]
    async fn test_exchange_code_returns_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=1000.abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok",
                "refresh_token": "1000.refresh.new",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = exchange_code(&server.uri(), "1000.CLIENTID", "secret", "1000.abc123")
            .await
            .unwrap();
        assert_eq!(token, "1000.refresh.new");
    }

    #[tokio::test]
    async fn test_exchange_code_surfaces_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": "invalid_code"
            })))
            .mount(&server)
            .await;

        let err = exchange_code(&server.uri(), "id", "secret", "bad")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid_code"));
    }
}
