//! Typed HTTP client for the check-in API.
//!
//! Session state is explicit: every authenticated call takes `&mut Session`.
//! When the server answers 401 and the session holds a refresh token, the
//! client refreshes once, updates the session in place and retries once.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::{ParticipantId, TicketId};
use crate::domains::auth::{AuthPayload, LoginRequest, LogoutRequest, RefreshRequest, SessionGrant};
use crate::domains::checkins::{Checkin, CheckinStatus};
use crate::domains::participants::{
    CreateParticipantRequest, Participant, ParticipantDetail, UpdateParticipantRequest,
};
use crate::domains::tickets::{CreateTicketRequest, Ticket, UpdateTicketRequest};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status}: {message}")]
    Api {
        status: StatusCode,
        error: String,
        message: String,
    },

    #[error("session expired")]
    SessionExpired,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }
}

/// Tokens held by a logged-in client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl From<SessionGrant> for Session {
    fn from(grant: SessionGrant) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct CheckinClient {
    http: Client,
    base_url: Url,
}

impl CheckinClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // =========================================================================
    // Session endpoints
    // =========================================================================

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self
            .http
            .post(self.url(&["auth", "login"])?)
            .json(&body)
            .send()
            .await?;
        let grant: SessionGrant = decode(response).await?;
        Ok(grant.into())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, ClientError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let response = self
            .http
            .post(self.url(&["auth", "refresh"])?)
            .json(&body)
            .send()
            .await?;
        let grant: SessionGrant = decode(response).await?;
        Ok(grant.into())
    }

    pub async fn logout(&self, session: Session) -> Result<(), ClientError> {
        let body = LogoutRequest {
            refresh_token: session.refresh_token,
        };
        let response = self
            .http
            .post(self.url(&["auth", "logout"])?)
            .json(&body)
            .send()
            .await?;
        expect_empty(response).await
    }

    pub async fn profile(&self, session: &mut Session) -> Result<AuthPayload, ClientError> {
        let url = self.url(&["auth", "profile"])?;
        decode(self.execute(session, |http| http.get(url.clone())).await?).await
    }

    // =========================================================================
    // Authenticated transport
    // =========================================================================

    /// Send with the session's bearer token, refreshing once on 401.
    async fn execute<F>(&self, session: &mut Session, build: F) -> Result<Response, ClientError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let response = build(&self.http)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        let Some(refresh_token) = session.refresh_token.clone() else {
            return Ok(response);
        };

        tracing::debug!("Access token rejected, refreshing session");
        *session = match self.refresh(&refresh_token).await {
            Ok(fresh) => fresh,
            Err(ClientError::Api { status, .. }) if status == StatusCode::UNAUTHORIZED => {
                return Err(ClientError::SessionExpired)
            }
            Err(err) => return Err(err),
        };

        Ok(build(&self.http)
            .bearer_auth(&session.access_token)
            .send()
            .await?)
    }

    async fn call<B>(
        &self,
        session: &mut Session,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        self.execute(session, |http| {
            let request = http.request(method.clone(), url.clone());
            match body {
                Some(body) => request.json(body),
                None => request,
            }
        })
        .await
    }

    async fn get<T: DeserializeOwned>(&self, session: &mut Session, segments: &[&str]) -> Result<T, ClientError> {
        decode(self.call::<()>(session, Method::GET, segments, None).await?).await
    }

    // =========================================================================
    // Participants
    // =========================================================================

    pub async fn create_participant(
        &self,
        session: &mut Session,
        request: &CreateParticipantRequest,
    ) -> Result<Participant, ClientError> {
        let response = self
            .call(session, Method::POST, &["participants"], Some(request))
            .await?;
        decode(response).await
    }

    pub async fn list_participants(&self, session: &mut Session) -> Result<Vec<Participant>, ClientError> {
        self.get(session, &["participants"]).await
    }

    /// Unified search.
    pub async fn search_participants(
        &self,
        session: &mut Session,
        query: &str,
    ) -> Result<Vec<Participant>, ClientError> {
        let mut url = self.url(&["participants", "search"])?;
        url.query_pairs_mut().append_pair("query", query);
        decode(self.execute(session, |http| http.get(url.clone())).await?).await
    }

    /// Classified search: the query's shape picks the field.
    pub async fn search_participants_by_shape(
        &self,
        session: &mut Session,
        query: &str,
    ) -> Result<Vec<Participant>, ClientError> {
        self.get(session, &["participants", "search", query]).await
    }

    pub async fn participant_by_cpf(&self, session: &mut Session, cpf: &str) -> Result<Participant, ClientError> {
        self.get(session, &["participants", "cpf", cpf]).await
    }

    pub async fn participant(
        &self,
        session: &mut Session,
        id: ParticipantId,
    ) -> Result<ParticipantDetail, ClientError> {
        self.get(session, &["participants", &id.to_string()]).await
    }

    pub async fn update_participant(
        &self,
        session: &mut Session,
        id: ParticipantId,
        request: &UpdateParticipantRequest,
    ) -> Result<Participant, ClientError> {
        let id = id.to_string();
        let response = self
            .call(session, Method::PATCH, &["participants", &id], Some(request))
            .await?;
        decode(response).await
    }

    pub async fn delete_participant(&self, session: &mut Session, id: ParticipantId) -> Result<(), ClientError> {
        let id = id.to_string();
        let response = self
            .call::<()>(session, Method::DELETE, &["participants", &id], None)
            .await?;
        expect_empty(response).await
    }

    // =========================================================================
    // Tickets
    // =========================================================================

    pub async fn create_ticket(
        &self,
        session: &mut Session,
        request: &CreateTicketRequest,
    ) -> Result<Ticket, ClientError> {
        let response = self
            .call(session, Method::POST, &["tickets"], Some(request))
            .await?;
        decode(response).await
    }

    pub async fn participant_tickets(
        &self,
        session: &mut Session,
        participant_id: ParticipantId,
    ) -> Result<Vec<Ticket>, ClientError> {
        self.get(session, &["tickets", "participant", &participant_id.to_string()])
            .await
    }

    pub async fn update_ticket(
        &self,
        session: &mut Session,
        id: TicketId,
        request: &UpdateTicketRequest,
    ) -> Result<Ticket, ClientError> {
        let id = id.to_string();
        let response = self
            .call(session, Method::PATCH, &["tickets", &id], Some(request))
            .await?;
        decode(response).await
    }

    pub async fn check_in_ticket(&self, session: &mut Session, id: TicketId) -> Result<Ticket, ClientError> {
        let id = id.to_string();
        let response = self
            .call::<()>(session, Method::PATCH, &["tickets", &id, "checkin"], None)
            .await?;
        decode(response).await
    }

    pub async fn delete_ticket(&self, session: &mut Session, id: TicketId) -> Result<(), ClientError> {
        let id = id.to_string();
        let response = self
            .call::<()>(session, Method::DELETE, &["tickets", &id], None)
            .await?;
        expect_empty(response).await
    }

    // =========================================================================
    // Check-ins
    // =========================================================================

    pub async fn record_checkin(
        &self,
        session: &mut Session,
        participant_id: ParticipantId,
    ) -> Result<Checkin, ClientError> {
        let id = participant_id.to_string();
        let response = self
            .call::<()>(session, Method::POST, &["checkins", &id], None)
            .await?;
        decode(response).await
    }

    pub async fn checkin_status(
        &self,
        session: &mut Session,
        participant_id: ParticipantId,
    ) -> Result<CheckinStatus, ClientError> {
        self.get(session, &["checkins", "status", &participant_id.to_string()])
            .await
    }
}

async fn api_error(response: Response) -> ClientError {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => ClientError::Api {
            status,
            error: body.error,
            message: body.message,
        },
        Err(_) => ClientError::Api {
            status,
            error: status.as_str().to_string(),
            message: status.canonical_reason().unwrap_or_default().to_string(),
        },
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    Ok(response.json::<T>().await?)
}

async fn expect_empty(response: Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    Ok(())
}
