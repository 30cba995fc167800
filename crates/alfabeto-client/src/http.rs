//! HTTP client for the game API.
//!
//! Endpoints:
//! - `POST /token` (form) and `POST /register` (JSON) for identity
//! - `GET /exercises?level=n` for the exercise provider
//! - `POST /user/score` and `GET /ranking` for the score sink

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use alfabeto_core::leaderboard::Leaderboard;
use alfabeto_core::model::{Exercise, ExerciseRecord};
use alfabeto_core::traits::{ExerciseProvider, ScoreSink};

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the game API.
pub struct HttpApiClient {
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct ScoreRequest {
    score: u64,
}

/// Exercise lists arrive either bare or wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExerciseListBody {
    Bare(Vec<ExerciseRecord>),
    Wrapped {
        #[serde(alias = "atividades")]
        exercises: Vec<ExerciseRecord>,
    },
}

impl ExerciseListBody {
    fn into_records(self) -> Vec<ExerciseRecord> {
        match self {
            ExerciseListBody::Bare(records) => records,
            ExerciseListBody::Wrapped { exercises } => exercises,
        }
    }
}

impl HttpApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let base = if base_url.trim().is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url.trim()
        };
        Url::parse(base).map_err(|e| anyhow::anyhow!("invalid API base URL '{base}': {e}"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            timeout_secs,
            client,
        })
    }

    /// Replace the bearer token, e.g. after [`login`](Self::login).
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                ApiError::Network(format!("API not reachable at {}", self.base_url))
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let detail = if body.is_empty() {
                    format!("HTTP {} from {url}", status.as_u16())
                } else {
                    body
                };
                ApiError::Unauthorized(detail)
            }
            StatusCode::NOT_FOUND => ApiError::NotFound(url),
            _ => ApiError::Api {
                status: status.as_u16(),
                message: body,
            },
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Exchange credentials for a bearer token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", username)
            .append_pair("password", password)
            .finish();

        let request = self
            .client
            .post(self.endpoint("/token"))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);

        let token: TokenResponse = Self::decode(self.send(request).await?).await?;
        debug!("login succeeded");
        Ok(token.access_token)
    }

    /// Create an account.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.endpoint("/register"))
            .json(&RegisterRequest {
                username,
                email,
                password,
            });
        self.send(request).await?;
        Ok(())
    }

    /// Ordered exercises for `level`. One malformed record rejects the list.
    #[instrument(skip(self))]
    pub async fn fetch_exercises(&self, level: u32) -> Result<Vec<Exercise>, ApiError> {
        let url = Url::parse_with_params(
            &self.endpoint("/exercises"),
            &[("level", level.to_string())],
        )
        .map_err(|e| ApiError::Network(format!("invalid exercises URL: {e}")))?;

        let response = self.send(self.authorized(self.client.get(url))).await?;
        let body: ExerciseListBody = Self::decode(response).await?;

        let exercises = body
            .into_records()
            .into_iter()
            .map(|record| Exercise::try_from(record).map_err(|e| ApiError::Decode(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = exercises.len(), "exercises fetched");
        Ok(exercises)
    }

    /// Store `total` as the signed-in user's cumulative score.
    #[instrument(skip(self))]
    pub async fn submit_score(&self, total: u64) -> Result<(), ApiError> {
        let request = self
            .authorized(self.client.post(self.endpoint("/user/score")))
            .json(&ScoreRequest { score: total });
        self.send(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn fetch_ranking(&self) -> Result<Leaderboard, ApiError> {
        let request = self.authorized(self.client.get(self.endpoint("/ranking")));
        Self::decode(self.send(request).await?).await
    }
}

#[async_trait]
impl ExerciseProvider for HttpApiClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_level(&self, level: u32) -> anyhow::Result<Vec<Exercise>> {
        Ok(self.fetch_exercises(level).await?)
    }
}

#[async_trait]
impl ScoreSink for HttpApiClient {
    async fn submit_score(&self, total: u64) -> anyhow::Result<()> {
        Ok(HttpApiClient::submit_score(self, total).await?)
    }

    async fn fetch_leaderboard(&self) -> anyhow::Result<Leaderboard> {
        Ok(self.fetch_ranking().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alfabeto_core::model::ExerciseKind;
    use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpApiClient {
        HttpApiClient::new(&server.uri(), Some("tok-123".into()), 5).unwrap()
    }

    #[tokio::test]
    async fn fetches_wrapped_exercises_with_bearer_token() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "atividades": [
                {"id": 1, "tipo": "letra", "conteudo": "A", "nivel": 1},
                {"id": 2, "tipo": "silaba", "conteudo": "CA + SA", "dica": "casa"}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/exercises"))
            .and(query_param("level", "1"))
            .and(header("authorization", "Bearer tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let exercises = client(&server).fetch_exercises(1).await.unwrap();
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].id(), "1");
        assert_eq!(exercises[1].kind(), &ExerciseKind::Syllable);
        assert_eq!(exercises[1].hint(), Some("casa"));
    }

    #[tokio::test]
    async fn fetches_bare_exercise_array() {
        let server = MockServer::start().await;

        let body = serde_json::json!([
            {"id": "q1", "kind": "word", "content": "O que é uma bola?"}
        ]);

        Mock::given(method("GET"))
            .and(path("/exercises"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let exercises = client(&server).fetch_level(3).await.unwrap();
        assert_eq!(exercises[0].prompt(), "O que é uma bola?");
    }

    #[tokio::test]
    async fn malformed_record_rejects_whole_list() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "exercises": [
                {"id": 1, "kind": "letter", "content": "A"},
                {"id": 2, "kind": "letter", "content": ""}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/exercises"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let err = client(&server).fetch_exercises(1).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/exercises"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client(&server).fetch_exercises(1).await.unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 503, .. }));
        assert!(!err.is_permanent());
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ranking"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).fetch_ranking().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert!(err.to_string().contains("not authorized"));
    }

    #[tokio::test]
    async fn login_posts_form_and_returns_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("username=ana%40escola.br&password=s%26nha"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "abc",
                "token_type": "bearer"
            })))
            .mount(&server)
            .await;

        let api = HttpApiClient::new(&server.uri(), None, 5).unwrap();
        let token = api.login("ana@escola.br", "s&nha").await.unwrap();
        assert_eq!(token, "abc");
        assert!(api.with_token(token).has_token());
    }

    #[tokio::test]
    async fn register_posts_json() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/register"))
            .and(body_json(serde_json::json!({
                "username": "ana",
                "email": "ana@escola.br",
                "password": "segredo"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let api = HttpApiClient::new(&server.uri(), None, 5).unwrap();
        api.register("ana", "ana@escola.br", "segredo").await.unwrap();
    }

    #[tokio::test]
    async fn submits_score_total() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/user/score"))
            .and(header("authorization", "Bearer tok-123"))
            .and(body_json(serde_json::json!({"score": 40})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        ScoreSink::submit_score(&client(&server), 40).await.unwrap();
    }

    #[tokio::test]
    async fn fetches_ranking() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ranking"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ranking": [
                    {"username": "bia", "totalScore": 90},
                    {"username": "ana", "totalScore": 40}
                ]
            })))
            .mount(&server)
            .await;

        let board = client(&server).fetch_leaderboard().await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board.rank_of("ana"), Some(2));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let api = HttpApiClient::new("http://127.0.0.1:9", None, 2).unwrap();
        let err = api.fetch_exercises(1).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout(_)));
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(HttpApiClient::new("not a url", None, 5).is_err());
        let api = HttpApiClient::new("http://example.test/api/", None, 5).unwrap();
        assert_eq!(api.base_url(), "http://example.test/api");
        assert!(!api.has_token());
    }

    #[test]
    fn debug_masks_token() {
        let api = HttpApiClient::new("http://example.test", Some("secret".into()), 5).unwrap();
        let debug = format!("{api:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("***"));
    }
}
