mod config;
use log::{debug, warn};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;

pub use crate::config::*;

/// Header carrying the admin API key.
pub const API_KEY_HEADER: &str = "Api-Key";
/// Header naming the user the request acts as.
pub const API_USERNAME_HEADER: &str = "Api-Username";

/// Casts one vote on a topic on behalf of a user.
///
/// Implementations never fail: every problem, including transport failures,
/// is folded into the returned `Outcome`.
pub trait VoteCaster {
    fn cast_vote(&self, topic_id: u64, username: &str) -> Outcome;
}

#[derive(Serialize, Debug)]
struct VoteRequest {
    topic_id: u64,
}

/// A `VoteCaster` that talks to the forum over HTTP.
///
/// The same client (and its connection pool) is reused for every vote.
/// Requests are bounded by the client's default timeout.
pub struct HttpVoteCaster {
    client: Client,
    vote_url: String,
    api_key: String,
}

impl HttpVoteCaster {
    pub fn new(settings: &ApiSettings) -> Result<HttpVoteCaster, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("topic_voting/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpVoteCaster {
            client,
            vote_url: settings.vote_url(),
            api_key: settings.api_key.clone(),
        })
    }
}

impl VoteCaster for HttpVoteCaster {
    fn cast_vote(&self, topic_id: u64, username: &str) -> Outcome {
        debug!(
            "cast_vote: POST {} topic_id: {} as {:?}",
            self.vote_url, topic_id, username
        );
        let res = self
            .client
            .post(&self.vote_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_USERNAME_HEADER, username)
            .json(&VoteRequest { topic_id })
            .send();

        let response = match res {
            Ok(r) => r,
            Err(e) => {
                warn!("cast_vote: topic {}: request failed: {}", topic_id, e);
                return Outcome::TransportError(e.to_string());
            }
        };

        let status = response.status();
        debug!("cast_vote: topic {}: status {}", topic_id, status);
        if status == StatusCode::OK {
            return Outcome::Voted;
        }
        // The body is only needed to describe unexpected statuses.
        match response.text() {
            Ok(body) => Outcome::from_status(status.as_u16(), &body),
            Err(e) => {
                warn!(
                    "cast_vote: topic {}: failed to read response body: {}",
                    topic_id, e
                );
                Outcome::TransportError(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn settings(base_url: String) -> ApiSettings {
        ApiSettings {
            base_url,
            api_key: "secret-key".to_string(),
            api_username: "system".to_string(),
        }
    }

    // The blocking client owns its own runtime, so it has to run off the
    // async test executor.
    async fn cast(base_url: String, topic_id: u64, username: &'static str) -> Outcome {
        tokio::task::spawn_blocking(move || {
            let caster = HttpVoteCaster::new(&settings(base_url)).unwrap();
            caster.cast_vote(topic_id, username)
        })
        .await
        .unwrap()
    }

    async fn server_answering(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/voting/vote"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn sends_impersonated_vote() {
        init();
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/community/voting/vote"))
            .and(header("Api-Key", "secret-key"))
            .and(header("Api-Username", "john_doe"))
            .and(body_json(json!({ "topic_id": 12345 })))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"can_vote\":true}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outcome = cast(format!("{}/community", mock_server.uri()), 12345, "john_doe").await;
        assert_eq!(outcome, Outcome::Voted);
    }

    #[tokio::test]
    async fn already_voted() {
        init();
        let mock_server = server_answering(422, "{\"errors\":[\"already voted\"]}").await;
        let outcome = cast(mock_server.uri(), 1, "jane_smith").await;
        assert_eq!(outcome, Outcome::AlreadyVotedOrDisabled);
        assert_eq!(outcome.class(), TallyClass::Skipped);
    }

    #[tokio::test]
    async fn forbidden_and_not_found() {
        init();
        let mock_server = server_answering(403, "").await;
        assert_eq!(
            cast(mock_server.uri(), 1, "a").await,
            Outcome::PermissionDenied
        );

        let mock_server = server_answering(404, "").await;
        assert_eq!(
            cast(mock_server.uri(), 1, "a").await,
            Outcome::NotFoundOrVotingDisabled
        );
    }

    #[tokio::test]
    async fn unexpected_status_keeps_body_snippet() {
        init();
        let body = "x".repeat(500);
        let mock_server = server_answering(500, &body).await;
        match cast(mock_server.uri(), 1, "a").await {
            Outcome::OtherHttpError { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), BODY_SNIPPET_CHARS);
            }
            x => panic!("unexpected outcome {:?}", x),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        init();
        // Nothing listens on the port once the listener is gone.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        match cast(format!("http://{}", addr), 1, "a").await {
            Outcome::TransportError(msg) => assert!(!msg.is_empty()),
            x => panic!("unexpected outcome {:?}", x),
        }
    }
}
