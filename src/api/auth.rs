use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use super::FetchError;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Value of the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Token {}", self.0)
    }
}

/// Logs in with the bot account. Tokens are not cached: every API call asks
/// for a fresh one.
pub struct TokenProvider {
    client: Client,
    login_url: Url,
    username: String,
    password: String,
}

impl TokenProvider {
    pub fn new(client: Client, login_url: Url, username: String, password: String) -> Self {
        Self {
            client,
            login_url,
            username,
            password,
        }
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    pub async fn token(&self) -> Result<AuthToken, FetchError> {
        let request = LoginRequest {
            username: &self.username,
            password: &self.password,
        };

        let response = self
            .client
            .post(self.login_url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Auth(format!(
                "login as {} returned HTTP {}",
                self.username, status
            )));
        }

        let body = response.text().await?;
        parse_login_response(&body)
    }
}

fn parse_login_response(body: &str) -> Result<AuthToken, FetchError> {
    let login: LoginResponse = serde_json::from_str(body)?;
    login
        .token
        .filter(|token| !token.is_empty())
        .map(AuthToken)
        .ok_or_else(|| FetchError::Auth("login response carried no token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value() {
        let token = AuthToken("9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b".to_string());
        assert_eq!(
            token.header_value(),
            "Token 9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b"
        );
    }

    #[test]
    fn test_parse_login_response() {
        let token = parse_login_response(r#"{"token": "abc", "user": "botuser"}"#).unwrap();
        assert_eq!(token, AuthToken("abc".to_string()));
    }

    #[test]
    fn test_login_response_without_token_is_auth_error() {
        let err = parse_login_response(r#"{"error": "Invalid credentials"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Auth(_)));

        let err = parse_login_response("<html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
