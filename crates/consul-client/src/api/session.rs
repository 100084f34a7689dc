// Session client

use std::sync::Arc;
use std::time::Duration;

use consul_api::constants::api_path;
use consul_api::session::SessionCreated;
use consul_api::{Session, SessionOptions};

use crate::blocking::{BlockingQueryOptions, Indexed};
use crate::client::Requester;
use crate::error::{ConsulError, Result};
use crate::transport::HttpRequest;

const MIN_SESSION_TTL: Duration = Duration::from_secs(10);
const MAX_SESSION_TTL: Duration = Duration::from_secs(86400);

#[derive(Clone)]
pub struct SessionClient {
    requester: Arc<Requester>,
}

impl SessionClient {
    pub(crate) fn new(requester: Arc<Requester>) -> Self {
        Self { requester }
    }

    /// Create a session and return its ID
    pub async fn create_session(&self, options: &SessionOptions) -> Result<String> {
        if let Some(ttl) = options.ttl
            && !(MIN_SESSION_TTL..=MAX_SESSION_TTL).contains(&ttl)
        {
            return Err(ConsulError::InvalidRequest(format!(
                "session TTL must be between {:?} and {:?}, got {:?}",
                MIN_SESSION_TTL, MAX_SESSION_TTL, ttl
            )));
        }
        let request = HttpRequest::put(api_path::SESSION_CREATE).json(options)?;
        let created: SessionCreated = self.requester.write(request).await?;
        Ok(created.id)
    }

    /// Look up a session; `None` once it has been destroyed or invalidated
    pub async fn info_session(
        &self,
        id: &str,
        options: &BlockingQueryOptions,
    ) -> Result<Indexed<Option<Session>>> {
        let request = options.apply(HttpRequest::get(api_path::SESSION_INFO).segment(id));
        let result = self.requester.read_optional::<Vec<Session>>(request).await?;
        Ok(result.map(|list| list.and_then(|sessions| sessions.into_iter().next())))
    }

    /// Reset a TTL session's timer; `None` if the session no longer exists
    pub async fn renew_session(&self, id: &str) -> Result<Option<Session>> {
        let request = HttpRequest::put(api_path::SESSION_RENEW).segment(id);
        let result = self.requester.write_optional::<Vec<Session>>(request).await?;
        Ok(result.and_then(|sessions| sessions.into_iter().next()))
    }

    /// Destroy a session, releasing or deleting the keys it holds
    pub async fn destroy_session(&self, id: &str) -> Result<()> {
        let request = HttpRequest::put(api_path::SESSION_DESTROY).segment(id);
        self.requester.write_empty(request).await
    }

    pub async fn list_sessions(
        &self,
        options: &BlockingQueryOptions,
    ) -> Result<Indexed<Vec<Session>>> {
        let request = options.apply(HttpRequest::get(api_path::SESSION_LIST));
        self.requester.read(request).await
    }

    /// Sessions belonging to `node`
    pub async fn node_sessions(
        &self,
        node: &str,
        options: &BlockingQueryOptions,
    ) -> Result<Indexed<Vec<Session>>> {
        let request = options.apply(HttpRequest::get(api_path::SESSION_NODE).segment(node));
        self.requester.read(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{ScriptedTransport, client_with};
    use crate::transport::HttpResponse;

    #[tokio::test]
    async fn test_ttl_bounds_checked_locally() {
        let transport = ScriptedTransport::new(vec![]);
        let client = client_with(transport.clone());

        let opts = SessionOptions::new().with_ttl(Duration::from_secs(5));
        let result = client.session().create_session(&opts).await;
        assert!(matches!(result, Err(ConsulError::InvalidRequest(_))));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_info_empty_list_is_none() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, "[]"))]);
        let client = client_with(transport);

        let info = client
            .session()
            .info_session("gone", &BlockingQueryOptions::new())
            .await
            .unwrap();
        assert!(info.value.is_none());
    }

    #[tokio::test]
    async fn test_renew_missing_session() {
        let transport = ScriptedTransport::new(vec![Err(ConsulError::api(
            404,
            "Session id 'x' not found",
        ))]);
        let client = client_with(transport);

        assert!(client.session().renew_session("x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_returns_id() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(
            200,
            r#"{"ID":"adf4238a-882b-9ddc-4a9d-5b6758e4159e"}"#,
        ))]);
        let client = client_with(transport.clone());

        let id = client
            .session()
            .create_session(&SessionOptions::new().with_name("leader"))
            .await
            .unwrap();
        assert_eq!(id, "adf4238a-882b-9ddc-4a9d-5b6758e4159e");
        assert_eq!(
            transport.requests.lock()[0].display_path(),
            "/v1/session/create"
        );
    }
}
