use crate::api::view_cache::ViewCache;
use crate::handlers::health::HealthResponse;
use crate::metrics::collector::MetricsSnapshot;
use crate::models::event::Event;
use crate::models::log::LogEntry;
use crate::models::registration::VoteDetail;
use crate::models::requests::{
    BalanceRequest, BalanceResponse, ErrorResponse, EventCreateRequest, EventPatchRequest,
    LoginRequest, PaymentStatusRequest, RegisterRequest, SuccessResponse, UnvoteRequest,
    VoteRequest,
};
use crate::models::user::User;
use anyhow::{bail, Context, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

const USERS: &str = "/api/users";
const EVENTS: &str = "/api/events";
const VOTES: &str = "/api/votes";
const LOGS: &str = "/api/logs";

/// Typed client for the board's JSON API.
///
/// GET requests go through a [`ViewCache`]; each mutation drops the views it
/// can affect. The acting user is passed explicitly on every gated call.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    views: ViewCache,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            views: ViewCache::new(),
        })
    }

    pub fn views(&self) -> &ViewCache {
        &self.views
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    fn with_actor(path: &str, actor_id: u32) -> String {
        format!("{}?userId={}", path, actor_id)
    }

    /// Turn a non-success response into an error carrying the server's message
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };

        bail!("Request failed with status {}: {}", status.as_u16(), message)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(method, path)
            .json(body)
            .send()
            .await
            .context(format!("Failed to send request to {}", path))?;

        Self::check(response)
            .await?
            .json()
            .await
            .context(format!("Failed to parse response from {}", path))
    }

    /// GET through the view cache
    async fn fetch<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Serialize,
    {
        if let Some(view) = self.views.get(path) {
            debug!(path, "View cache hit");
            return Ok(view);
        }

        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .context(format!("Failed to send request to {}", path))?;

        let view: T = Self::check(response)
            .await?
            .json()
            .await
            .context(format!("Failed to parse response from {}", path))?;

        self.views.put(path, &view);
        Ok(view)
    }

    async fn send_empty(&self, method: Method, path: &str) -> Result<()> {
        let response = self
            .request(method, path)
            .send()
            .await
            .context(format!("Failed to send request to {}", path))?;

        let response = Self::check(response).await?;
        if response.status() != StatusCode::NO_CONTENT {
            debug!(path, status = %response.status(), "Unexpected success status");
        }

        Ok(())
    }

    fn invalidate(&self, prefixes: &[&str]) {
        for prefix in prefixes {
            self.views.invalidate(prefix);
        }
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .request(Method::GET, "/health")
            .send()
            .await
            .context("Failed to send health check")?;

        Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse health response")
    }

    pub async fn register(&self, name: &str, password: &str, is_admin: bool) -> Result<User> {
        let body = RegisterRequest {
            name: Some(name.to_string()),
            password: Some(password.to_string()),
            is_admin,
        };

        let user = self.send_json(Method::POST, USERS, &body).await?;
        self.invalidate(&[USERS, LOGS]);
        Ok(user)
    }

    pub async fn login(&self, name: &str, password: &str) -> Result<User> {
        let body = LoginRequest {
            name: Some(name.to_string()),
            password: Some(password.to_string()),
        };

        let user = self.send_json(Method::POST, "/api/login", &body).await?;
        self.invalidate(&[LOGS]);
        Ok(user)
    }

    pub async fn users(&self) -> Result<Vec<User>> {
        self.fetch(USERS).await
    }

    /// Look a user up in the cached user list
    pub async fn user(&self, user_id: u32) -> Result<Option<User>> {
        Ok(self.users().await?.into_iter().find(|user| user.id == user_id))
    }

    pub async fn delete_user(&self, actor_id: u32, user_id: u32) -> Result<()> {
        let path = Self::with_actor(&format!("{}/{}", USERS, user_id), actor_id);

        self.send_empty(Method::DELETE, &path).await?;
        self.invalidate(&[USERS, EVENTS, VOTES, LOGS]);
        Ok(())
    }

    pub async fn events(&self) -> Result<Vec<Event>> {
        self.fetch(EVENTS).await
    }

    pub async fn event(&self, event_id: u32) -> Result<Event> {
        self.fetch(&format!("{}/{}", EVENTS, event_id)).await
    }

    pub async fn create_event(
        &self,
        actor_id: u32,
        title: &str,
        description: &str,
        date: &str,
    ) -> Result<Event> {
        let body = EventCreateRequest {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            date: Some(date.to_string()),
        };

        let event = self
            .send_json(Method::POST, &Self::with_actor(EVENTS, actor_id), &body)
            .await?;
        self.invalidate(&[EVENTS, LOGS]);
        Ok(event)
    }

    pub async fn update_event(
        &self,
        actor_id: u32,
        event_id: u32,
        patch: &EventPatchRequest,
    ) -> Result<Event> {
        let path = Self::with_actor(&format!("{}/{}", EVENTS, event_id), actor_id);

        let event = self.send_json(Method::PATCH, &path, patch).await?;
        self.invalidate(&[EVENTS, VOTES, LOGS]);
        Ok(event)
    }

    pub async fn delete_event(&self, actor_id: u32, event_id: u32) -> Result<()> {
        let path = Self::with_actor(&format!("{}/{}", EVENTS, event_id), actor_id);

        self.send_empty(Method::DELETE, &path).await?;
        self.invalidate(&[EVENTS, USERS, VOTES, LOGS]);
        Ok(())
    }

    pub async fn vote(&self, user_id: u32, event_id: u32, additional_players: u32) -> Result<User> {
        let body = VoteRequest {
            user_id: Some(user_id),
            event_id: Some(event_id),
            additional_players: Some(i64::from(additional_players)),
        };

        let user = self.send_json(Method::POST, "/api/vote", &body).await?;
        self.invalidate(&[USERS, EVENTS, VOTES, LOGS]);
        Ok(user)
    }

    pub async fn unvote(&self, user_id: u32, event_id: u32) -> Result<User> {
        let body = UnvoteRequest {
            user_id: Some(user_id),
            event_id: Some(event_id),
        };

        let user = self.send_json(Method::POST, "/api/unvote", &body).await?;
        self.invalidate(&[USERS, EVENTS, VOTES, LOGS]);
        Ok(user)
    }

    pub async fn all_votes(&self, actor_id: u32) -> Result<Vec<VoteDetail>> {
        self.fetch(&Self::with_actor(VOTES, actor_id)).await
    }

    pub async fn event_votes(&self, actor_id: u32, event_id: u32) -> Result<Vec<VoteDetail>> {
        self.fetch(&Self::with_actor(&format!("{}/event/{}", VOTES, event_id), actor_id))
            .await
    }

    pub async fn user_votes(&self, actor_id: u32, user_id: u32) -> Result<Vec<VoteDetail>> {
        self.fetch(&Self::with_actor(&format!("{}/user/{}", VOTES, user_id), actor_id))
            .await
    }

    pub async fn logs(&self, actor_id: u32) -> Result<Vec<LogEntry>> {
        self.fetch(&Self::with_actor(LOGS, actor_id)).await
    }

    /// Returns the server's confirmation message
    pub async fn set_payment_status(
        &self,
        actor_id: u32,
        user_id: u32,
        event_id: u32,
        paid: bool,
    ) -> Result<String> {
        let body = PaymentStatusRequest {
            user_id: Some(user_id),
            event_id: Some(event_id),
            paid: Some(paid),
        };

        let response: SuccessResponse = self
            .send_json(
                Method::POST,
                &Self::with_actor("/api/payment/status", actor_id),
                &body,
            )
            .await?;
        self.invalidate(&[VOTES, LOGS]);
        Ok(response.message)
    }

    pub async fn set_balance(&self, actor_id: u32, user_id: u32, balance: i64) -> Result<User> {
        let body = BalanceRequest {
            user_id: Some(user_id),
            balance: Some(balance),
        };

        let response: BalanceResponse = self
            .send_json(
                Method::POST,
                &Self::with_actor("/api/user/balance", actor_id),
                &body,
            )
            .await?;
        self.invalidate(&[USERS, LOGS]);
        Ok(response.user)
    }

    /// Server counters; never cached
    pub async fn metrics(&self, actor_id: u32) -> Result<MetricsSnapshot> {
        let response = self
            .request(Method::GET, &Self::with_actor("/metrics", actor_id))
            .send()
            .await
            .context("Failed to send metrics request")?;

        Self::check(response)
            .await?
            .json()
            .await
            .context("Failed to parse metrics response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::routes::build_router;
    use crate::core::state::test_state;
    use tokio::net::TcpListener;

    /// Serve the router on an ephemeral port and point a client at it
    async fn spawn_server() -> (ApiClient, std::sync::Arc<crate::core::state::AppState>, tempfile::TempDir) {
        let (state, dir) = test_state();
        let app = build_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = ApiClient::new(format!("http://{}/", addr)).unwrap();
        (client, state, dir)
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:5000/").unwrap();

        assert_eq!(client.base_url, "http://localhost:5000");
        assert_eq!(ApiClient::with_actor("/api/logs", 4), "/api/logs?userId=4");
    }

    #[tokio::test]
    async fn test_end_to_end_signup_flow() {
        let (client, _state, _dir) = spawn_server().await;

        assert_eq!(client.health().await.unwrap().status, "ok");

        let admin = client.register("Boss", "eventpass", true).await.unwrap();
        let kim = client.register("Kim", "eventpass", false).await.unwrap();
        assert!(admin.is_admin);

        let event = client
            .create_event(admin.id, "Monday Night Badminton", "Bring your racket!", "Monday 6 PM")
            .await
            .unwrap();

        // Prime the caches, then mutate
        assert_eq!(client.events().await.unwrap()[0].votes, 0);
        assert!(client.views().contains(EVENTS));

        let kim = client.vote(kim.id, event.id, 2).await.unwrap();
        assert_eq!(kim.participation_count, 1);
        assert_eq!(kim.badges, vec!["rookie".to_string()]);
        assert!(!client.views().contains(EVENTS));

        assert_eq!(client.events().await.unwrap()[0].votes, 3);

        let voters = client.event_votes(kim.id, event.id).await.unwrap();
        assert_eq!(voters.len(), 1);
        assert_eq!(voters[0].additional_players, 2);

        let message = client
            .set_payment_status(admin.id, kim.id, event.id, true)
            .await
            .unwrap();
        assert_eq!(message, "Payment status updated to paid");
        assert!(client.all_votes(admin.id).await.unwrap()[0].paid);

        let kim = client.unvote(kim.id, event.id).await.unwrap();
        assert!(kim.votes.is_empty());
        assert_eq!(kim.participation_count, 1);
        assert_eq!(client.event(event.id).await.unwrap().votes, 0);

        let logs = client.logs(admin.id).await.unwrap();
        assert_eq!(logs[0].details, "Cancelled signup for Monday Night Badminton");

        let metrics = client.metrics(admin.id).await.unwrap();
        assert_eq!(metrics.votes_cast, 1);
        assert_eq!(metrics.votes_withdrawn, 1);
        assert_eq!(metrics.registrations, 2);
    }

    #[tokio::test]
    async fn test_errors_carry_server_message() {
        let (client, _state, _dir) = spawn_server().await;

        let err = client.register("Kim", "wrong", false).await.unwrap_err();
        assert_eq!(err.to_string(), "Request failed with status 400: Invalid password");

        let kim = client.register("Kim", "eventpass", false).await.unwrap();
        let err = client.logs(kim.id).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Request failed with status 403: Forbidden - Admin access required"
        );
    }

    #[tokio::test]
    async fn test_balance_and_user_removal() {
        let (client, state, _dir) = spawn_server().await;
        let admin = client.register("Boss", "eventpass", true).await.unwrap();
        let kim = client.register("Kim", "eventpass", false).await.unwrap();

        assert_eq!(client.users().await.unwrap().len(), 2);

        let updated = client.set_balance(admin.id, kim.id, 40).await.unwrap();
        assert_eq!(updated.balance, 40);
        assert_eq!(client.user(kim.id).await.unwrap().unwrap().balance, 40);

        client.delete_user(admin.id, kim.id).await.unwrap();
        assert!(client.user(kim.id).await.unwrap().is_none());
        assert!(state.ledger.users.get(kim.id).is_none());
    }
}
