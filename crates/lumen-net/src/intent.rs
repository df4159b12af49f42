//! HTTP transport for intent-based external signers.
//!
//! Each intent is POSTed as JSON to a single endpoint, typically a local
//! bridge to the signer. Replies are either an [`IntentResponse`] or an
//! error object `{"error": {"code": -4, "message": "..."}}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use lumen_core::error::IntentError;
use lumen_core::traits::{INTENT_USER_REJECTED, IntentRequest, IntentResponse, IntentTransport};

use crate::REQUEST_TIMEOUT;

pub struct HttpIntentTransport {
    client: Client,
    endpoint: String,
}

impl HttpIntentTransport {
    pub fn new(endpoint: &str) -> Result<Self, IntentError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| IntentError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Deserialize)]
struct ErrorReply {
    error: IntentFailure,
}

#[derive(Deserialize)]
struct IntentFailure {
    code: i32,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl IntentTransport for HttpIntentTransport {
    async fn request(&self, request: IntentRequest) -> Result<IntentResponse, IntentError> {
        debug!(endpoint = %self.endpoint, "sending intent");
        let body = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| IntentError::Transport(e.to_string()))?
            .text()
            .await
            .map_err(|e| IntentError::Transport(e.to_string()))?;
        parse_reply(&body)
    }
}

fn parse_reply(body: &str) -> Result<IntentResponse, IntentError> {
    if let Ok(reply) = serde_json::from_str::<ErrorReply>(body) {
        return Err(match reply.error.code {
            INTENT_USER_REJECTED => IntentError::Rejected,
            code => IntentError::Failed {
                code,
                message: reply.error.message,
            },
        });
    }
    serde_json::from_str(body).map_err(|e| IntentError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn parse_success_and_errors() {
        let ok = parse_reply(r#"{"pubkey": "GABC"}"#).unwrap();
        assert_eq!(ok.pubkey.as_deref(), Some("GABC"));

        assert_eq!(
            parse_reply(r#"{"error": {"code": -4, "message": "Action request was rejected by the user"}}"#),
            Err(IntentError::Rejected)
        );
        assert_eq!(
            parse_reply(r#"{"error": {"code": -1, "message": "bad xdr"}}"#),
            Err(IntentError::Failed {
                code: -1,
                message: "bad xdr".into()
            })
        );
        assert!(matches!(
            parse_reply("<html>"),
            Err(IntentError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn posts_intent_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({"intent": "tx", "xdr": "AAAA", "network": "testnet"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"signed_envelope_xdr": "BBBB"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpIntentTransport::new(&server.uri()).unwrap();
        let resp = transport
            .request(IntentRequest::Tx {
                xdr: "AAAA".into(),
                network: "testnet".into(),
            })
            .await
            .unwrap();
        assert_eq!(resp.signed_envelope_xdr.as_deref(), Some("BBBB"));
    }

    #[tokio::test]
    async fn unreachable_signer() {
        let transport = HttpIntentTransport::new("http://127.0.0.1:9/intent").unwrap();
        assert!(matches!(
            transport.request(IntentRequest::PublicKey).await,
            Err(IntentError::Transport(_))
        ));
    }
}
