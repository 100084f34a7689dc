// ACL client: tokens and policies

use std::sync::Arc;

use consul_api::constants::api_path;
use consul_api::{AclPolicy, AclToken, CloneAclTokenOptions};

use crate::client::Requester;
use crate::error::{ConsulError, Result};
use crate::transport::HttpRequest;

#[derive(Clone)]
pub struct AclClient {
    requester: Arc<Requester>,
}

impl AclClient {
    pub(crate) fn new(requester: Arc<Requester>) -> Self {
        Self { requester }
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    pub async fn create_token(&self, token: &AclToken) -> Result<AclToken> {
        let request = HttpRequest::put(api_path::ACL_TOKEN).json(token)?;
        self.requester.write(request).await
    }

    /// Read a token by accessor ID; `None` if it does not exist
    pub async fn read_token(&self, accessor_id: &str) -> Result<Option<AclToken>> {
        require_id(accessor_id)?;
        let result = self
            .requester
            .read_optional(HttpRequest::get(api_path::ACL_TOKEN).segment(accessor_id))
            .await?;
        Ok(result.value)
    }

    /// The token this client authenticates with
    pub async fn read_self_token(&self) -> Result<AclToken> {
        let result = self
            .requester
            .read(HttpRequest::get(api_path::ACL_TOKEN_SELF))
            .await?;
        Ok(result.value)
    }

    pub async fn update_token(&self, accessor_id: &str, token: &AclToken) -> Result<AclToken> {
        require_id(accessor_id)?;
        let request = HttpRequest::put(api_path::ACL_TOKEN)
            .segment(accessor_id)
            .json(token)?;
        self.requester.write(request).await
    }

    /// Copy a token's policies and identities into a new token
    pub async fn clone_token(
        &self,
        accessor_id: &str,
        options: &CloneAclTokenOptions,
    ) -> Result<AclToken> {
        require_id(accessor_id)?;
        let request = HttpRequest::put(api_path::ACL_TOKEN)
            .segment(accessor_id)
            .segment("clone")
            .json(options)?;
        self.requester.write(request).await
    }

    pub async fn delete_token(&self, accessor_id: &str) -> Result<()> {
        require_id(accessor_id)?;
        let request = HttpRequest::delete(api_path::ACL_TOKEN).segment(accessor_id);
        self.requester.write_empty(request).await
    }

    /// Token stubs; secrets are not included
    pub async fn list_tokens(&self) -> Result<Vec<AclToken>> {
        let result = self
            .requester
            .read(HttpRequest::get(api_path::ACL_TOKENS))
            .await?;
        Ok(result.value)
    }

    // ========================================================================
    // Policies
    // ========================================================================

    pub async fn create_policy(&self, policy: &AclPolicy) -> Result<AclPolicy> {
        let request = HttpRequest::put(api_path::ACL_POLICY).json(policy)?;
        self.requester.write(request).await
    }

    pub async fn read_policy(&self, id: &str) -> Result<Option<AclPolicy>> {
        require_id(id)?;
        let result = self
            .requester
            .read_optional(HttpRequest::get(api_path::ACL_POLICY).segment(id))
            .await?;
        Ok(result.value)
    }

    pub async fn read_policy_by_name(&self, name: &str) -> Result<Option<AclPolicy>> {
        require_id(name)?;
        let result = self
            .requester
            .read_optional(HttpRequest::get(api_path::ACL_POLICY_NAME).segment(name))
            .await?;
        Ok(result.value)
    }

    pub async fn update_policy(&self, id: &str, policy: &AclPolicy) -> Result<AclPolicy> {
        require_id(id)?;
        let request = HttpRequest::put(api_path::ACL_POLICY)
            .segment(id)
            .json(policy)?;
        self.requester.write(request).await
    }

    pub async fn delete_policy(&self, id: &str) -> Result<()> {
        require_id(id)?;
        let request = HttpRequest::delete(api_path::ACL_POLICY).segment(id);
        self.requester.write_empty(request).await
    }

    pub async fn list_policies(&self) -> Result<Vec<AclPolicy>> {
        let result = self
            .requester
            .read(HttpRequest::get(api_path::ACL_POLICIES))
            .await?;
        Ok(result.value)
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(ConsulError::InvalidRequest("identifier must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use consul_api::PolicyLink;

    use super::*;
    use crate::client::tests::{ScriptedTransport, client_with};
    use crate::transport::HttpResponse;

    #[tokio::test]
    async fn test_create_token_body() {
        let body = r#"{
            "AccessorID": "6a1253d2-1785-24fd-91c2-f8e78c745511",
            "SecretID": "45a3bd52-07c7-47a4-52fd-0745e0cfe967",
            "Description": "agent token",
            "Policies": [{"ID": "165d4317", "Name": "node-read"}],
            "Local": false,
            "CreateTime": "2018-10-24T12:25:06.921933-04:00",
            "Hash": "UuiRkOQPRCvoRZHRtUxxbrmwZ5crYrOdZ0Z1FTFbTbA=",
            "CreateIndex": 59,
            "ModifyIndex": 59
        }"#;
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(200, body))]);
        let client = client_with(transport.clone());

        let token = AclToken::new("agent token").with_policy(PolicyLink::by_name("node-read"));
        let created = client.acl().create_token(&token).await.unwrap();
        assert_eq!(created.accessor_id, "6a1253d2-1785-24fd-91c2-f8e78c745511");
        assert_eq!(created.policies[0].name, "node-read");

        let requests = transport.requests.lock();
        let sent: serde_json::Value =
            serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["Description"], "agent token");
        assert_eq!(sent["Policies"][0]["Name"], "node-read");
        assert!(sent.get("AccessorID").is_none());
    }

    #[tokio::test]
    async fn test_clone_path() {
        let transport = ScriptedTransport::new(vec![Ok(HttpResponse::new(
            200,
            r#"{"AccessorID":"b","SecretID":"c","Description":"copy"}"#,
        ))]);
        let client = client_with(transport.clone());

        client
            .acl()
            .clone_token("a", &CloneAclTokenOptions::default())
            .await
            .unwrap();
        assert_eq!(
            transport.requests.lock()[0].display_path(),
            "/v1/acl/token/a/clone"
        );
    }

    #[tokio::test]
    async fn test_missing_policy_is_none() {
        let transport = ScriptedTransport::new(vec![Err(ConsulError::api(404, "ACL not found"))]);
        let client = client_with(transport);

        assert!(client.acl().read_policy_by_name("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_accessor_rejected() {
        let transport = ScriptedTransport::new(vec![]);
        let client = client_with(transport.clone());

        assert!(matches!(
            client.acl().delete_token("").await,
            Err(ConsulError::InvalidRequest(_))
        ));
        assert_eq!(transport.request_count(), 0);
    }
}
