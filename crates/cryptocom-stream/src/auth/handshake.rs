/*
[INPUT]:  API credentials, a private connection, the shared nonce source
[OUTPUT]: The per-connection "authenticated" completion
[POS]:    Auth layer - signed login handshake gating private channels
[UPDATE]: When the login request format changes
*/

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::signer::HmacSigner;
use crate::cache::Update;
use crate::config::Credentials;
use crate::error::{Result, StreamError};
use crate::ws::connection::Connection;
use crate::ws::message::{AUTH_METHOD, AUTHENTICATED_HASH, NonceSource, Params, extend};

/// Builds and sends the signed login, at most once per connection
#[derive(Debug, Clone)]
pub struct Authenticator {
    api_key: String,
    signer: HmacSigner,
    nonces: Arc<NonceSource>,
}

impl Authenticator {
    pub fn new(credentials: &Credentials, nonces: Arc<NonceSource>) -> Self {
        Self {
            api_key: credentials.api_key.clone(),
            signer: HmacSigner::new(&credentials.secret),
            nonces,
        }
    }

    /// `{id, nonce, method: "public/auth", api_key, sig}` with string nonce fields
    pub fn login_request(&self, params: Option<&Params>) -> Result<Value> {
        let nonce = self.nonces.next().to_string();
        let payload = HmacSigner::login_payload(AUTH_METHOD, &nonce, &self.api_key);
        let sig = self.signer.sign(&payload)?;
        let mut request = json!({
            "id": nonce,
            "nonce": nonce,
            "method": AUTH_METHOD,
            "api_key": self.api_key,
            "sig": sig,
        });
        extend(&mut request, params);
        Ok(request)
    }

    /// Wait for the connection's login acknowledgement, sending the login
    /// only when no completion exists yet (pending or resolved).
    pub async fn authenticate(&self, connection: &Connection, params: Option<&Params>) -> Result<Value> {
        let (mut watcher, created) = connection.registry().attach(AUTHENTICATED_HASH).await?;

        if created {
            let sent = match self.login_request(params) {
                Ok(request) => connection.send(&request).await,
                Err(err) => Err(err),
            };
            if let Err(err) = sent {
                warn!(url = %connection.url(), error = %err, "ws auth request failed");
                connection
                    .registry()
                    .reject_and_remove(AUTHENTICATED_HASH, err.clone())
                    .await;
                return Err(err);
            }
            info!(url = %connection.url(), "ws auth request sent");
        } else if let Some(outcome) = watcher.latest() {
            debug!(url = %connection.url(), "ws auth already completed");
            return acknowledgement(outcome);
        }

        acknowledgement(watcher.next().await)
    }
}

fn acknowledgement(outcome: Result<Update>) -> Result<Value> {
    match outcome? {
        Update::Authenticated(ack) => Ok(ack),
        _ => Err(StreamError::UnexpectedPayload {
            expected: "authenticated",
        }),
    }
}
