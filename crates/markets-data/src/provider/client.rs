//! 제공자 공용 HTTP 클라이언트.
//!
//! 모든 추출기는 이 클라이언트를 통해 GET 요청을 보냅니다.
//! 전송 오류나 비정상 상태 코드는 에러로 전파하지 않고 `None`으로 반환하며,
//! 원인은 로그로 남깁니다. 재시도는 오케스트레이터의 책임입니다.

use crate::error::{DataError, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// 기본 요청 타임아웃.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 오류 응답 본문 로그 최대 길이.
const MAX_LOGGED_BODY: usize = 200;

/// Base URL에 고정된 JSON GET 클라이언트.
#[derive(Clone, Debug)]
pub struct FetchClient {
    client: reqwest::Client,
    base_url: String,
}

impl FetchClient {
    /// 새 클라이언트를 생성합니다.
    ///
    /// `timeout`은 연결부터 본문 수신까지 요청 전체에 적용됩니다.
    /// `base_url`이 절대 URL이 아니면 `ConfigError`를 반환합니다.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        reqwest::Url::parse(&base_url)
            .map_err(|e| DataError::ConfigError(format!("잘못된 base URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("markets-etl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::ConfigError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 엔드포인트가 주어지면 base URL 뒤에 경로 세그먼트로 붙입니다.
    pub fn url_for(&self, endpoint: Option<&str>) -> String {
        match endpoint.map(|e| e.trim_matches('/')) {
            Some(e) if !e.is_empty() => format!("{}/{}", self.base_url, e),
            _ => self.base_url.clone(),
        }
    }

    /// GET 요청을 보내고 JSON 본문을 반환합니다.
    ///
    /// 실패 시 `None`을 반환합니다 (전송 오류, 비 2xx 상태, JSON 파싱 실패).
    pub async fn get(&self, endpoint: Option<&str>, params: &[(&str, String)]) -> Option<Value> {
        let url = self.url_for(endpoint);
        debug!(url = %url, params = params.len(), "GET 요청");

        let mut request = self.client.get(&url);
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(url = %url, error = %e, "요청 실패");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_LOGGED_BODY).collect();
            error!(url = %url, status = %status, body = %body, "HTTP 오류 응답");
            return None;
        }

        match response.json::<Value>().await {
            Ok(body) => Some(body),
            Err(e) => {
                error!(url = %url, error = %e, "JSON 응답 파싱 실패");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_url_for() {
        let client = FetchClient::new("https://api.example.com/v4/latest/", DEFAULT_TIMEOUT).unwrap();

        assert_eq!(client.base_url(), "https://api.example.com/v4/latest");
        assert_eq!(client.url_for(None), "https://api.example.com/v4/latest");
        assert_eq!(client.url_for(Some("")), "https://api.example.com/v4/latest");
        assert_eq!(client.url_for(Some("USD")), "https://api.example.com/v4/latest/USD");
        assert_eq!(
            client.url_for(Some("/coins/markets")),
            "https://api.example.com/v4/latest/coins/markets"
        );
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let err = FetchClient::new("api.example.com/v4", DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, DataError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_get_returns_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/price")
            .match_query(Matcher::UrlEncoded("ids".into(), "bitcoin".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"bitcoin": {"usd": 45000}}"#)
            .create_async()
            .await;

        let client = FetchClient::new(server.url(), DEFAULT_TIMEOUT).unwrap();
        let body = client
            .get(Some("simple/price"), &[("ids", "bitcoin".to_string())])
            .await
            .unwrap();

        assert_eq!(body["bitcoin"]["usd"], 45000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_non_success_status_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/EUR")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let client = FetchClient::new(server.url(), DEFAULT_TIMEOUT).unwrap();
        assert!(client.get(Some("EUR"), &[]).await.is_none());
    }

    #[tokio::test]
    async fn test_get_invalid_json_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let client = FetchClient::new(server.url(), DEFAULT_TIMEOUT).unwrap();
        assert!(client.get(None, &[]).await.is_none());
    }

    #[tokio::test]
    async fn test_get_transport_error_is_none() {
        // 닫힌 포트로 연결 시도
        let client = FetchClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(client.get(Some("USD"), &[]).await.is_none());
    }
}
