/// Floating IP management for Hetzner Cloud
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::action::{self, Action};
use super::models::{
    ActionWire, DnsPtr, FloatingIpType, FloatingIpWire, Hydrate, IdOrName, ResourceIter,
};
use super::transport::{take_key, Transport};
use crate::error::{Error, Result};

/// Request structure for creating a floating IP
#[derive(Debug, Clone, Serialize)]
pub struct CreateFloatingIpRequest {
    #[serde(rename = "type")]
    pub ip_type: FloatingIpType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_location: Option<IdOrName>,
    #[serde(rename = "server", skip_serializing_if = "Option::is_none")]
    pub server_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateFloatingIpRequest {
    pub fn new(ip_type: FloatingIpType) -> Self {
        Self {
            ip_type,
            home_location: None,
            server_id: None,
            description: None,
        }
    }
}

/// Floating IP manager for handling Hetzner Cloud floating IPs
#[derive(Debug, Clone)]
pub struct FloatingIpManager {
    transport: Transport,
}

impl FloatingIpManager {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Create a floating IP in a home location or assigned straight to a server.
    ///
    /// The action is only present when the IP is assigned on creation.
    pub async fn create(
        &self,
        request: CreateFloatingIpRequest,
    ) -> Result<(FloatingIp, Option<Action>)> {
        if request.home_location.is_none() && request.server_id.is_none() {
            return Err(Error::invalid_argument("home_location and server_id"));
        }
        if matches!(request.ip_type, FloatingIpType::Unknown) {
            return Err(Error::invalid_argument("ip_type"));
        }

        info!("Creating {} floating IP", request.ip_type);

        let body = serde_json::to_value(&request)?;
        let mut response = self
            .transport
            .expect(Method::POST, "floating_ips", Some(&body), StatusCode::CREATED)
            .await?;

        let action = match response.get_mut("action").map(serde_json::Value::take) {
            Some(value) if !value.is_null() => {
                let wire: ActionWire = serde_json::from_value(value)?;
                Some(Action::hydrate(&self.transport, wire))
            }
            _ => None,
        };
        let wire: FloatingIpWire =
            serde_json::from_value(take_key(response, "floating_ip", StatusCode::CREATED)?)?;
        Ok((FloatingIp::hydrate(&self.transport, wire), action))
    }

    /// Get a floating IP by ID
    pub async fn get(&self, id: u64) -> Result<FloatingIp> {
        self.transport
            .fetch_one(&format!("floating_ips/{}", id), "floating_ip", "floating_ip", id)
            .await
    }

    /// List all floating IPs
    pub async fn get_all(&self) -> Result<ResourceIter<FloatingIp>> {
        self.transport.list("floating_ips", "floating_ips", &[]).await
    }
}

/// A floating IP that can be moved between servers
#[derive(Debug, Clone)]
pub struct FloatingIp {
    transport: Transport,
    pub id: u64,
    pub description: Option<String>,
    pub ip: String,
    pub ip_type: FloatingIpType,
    /// Server the IP is currently routed to
    pub server_id: Option<u64>,
    pub dns_ptr: Vec<DnsPtr>,
    pub home_location_id: Option<u64>,
    pub blocked: bool,
}

impl Hydrate for FloatingIp {
    type Wire = FloatingIpWire;

    fn hydrate(transport: &Transport, wire: FloatingIpWire) -> Self {
        Self {
            transport: transport.clone(),
            id: wire.id,
            description: wire.description,
            ip: wire.ip,
            ip_type: wire.ip_type,
            server_id: wire.server,
            dns_ptr: wire.dns_ptr,
            home_location_id: wire.home_location.map(|r| r.id),
            blocked: wire.blocked,
        }
    }
}

impl FloatingIp {
    fn endpoint(&self) -> String {
        format!("floating_ips/{}", self.id)
    }

    async fn perform(&self, command: &str, body: Option<serde_json::Value>) -> Result<Action> {
        let endpoint = format!("floating_ips/{}/actions/{}", self.id, command);
        let (_, action) = action::perform(&self.transport, &endpoint, body.as_ref()).await?;
        Ok(action)
    }

    /// Route the IP to a server
    pub async fn assign_to_server(&mut self, server_id: u64) -> Result<Action> {
        if server_id == 0 {
            return Err(Error::invalid_argument("server_id"));
        }

        let action = self
            .perform("assign", Some(json!({ "server": server_id })))
            .await?;

        info!("Floating IP {} assigned to server {}", self.ip, server_id);
        self.server_id = Some(server_id);
        Ok(action)
    }

    /// Stop routing the IP to its server
    pub async fn unassign_from_server(&mut self) -> Result<Action> {
        let action = self.perform("unassign", None).await?;

        info!("Floating IP {} unassigned", self.ip);
        self.server_id = None;
        Ok(action)
    }

    pub async fn change_description(&mut self, description: &str) -> Result<()> {
        let body = json!({ "description": description });
        self.transport
            .expect(Method::PUT, &self.endpoint(), Some(&body), StatusCode::OK)
            .await?;

        self.description = Some(description.to_string());
        Ok(())
    }

    /// Set (or with `None`, reset) the reverse DNS entry for `ip`
    pub async fn change_reverse_dns_entry(
        &mut self,
        ip: &str,
        dns_ptr: Option<&str>,
    ) -> Result<Action> {
        if ip.is_empty() {
            return Err(Error::invalid_argument("ip"));
        }

        let action = self
            .perform("change_dns_ptr", Some(json!({ "ip": ip, "dns_ptr": dns_ptr })))
            .await?;

        let dns_ptr = dns_ptr.map(str::to_string);
        match self.dns_ptr.iter_mut().find(|entry| entry.ip == ip) {
            Some(entry) => entry.dns_ptr = dns_ptr,
            None => self.dns_ptr.push(DnsPtr {
                ip: ip.to_string(),
                dns_ptr,
            }),
        }
        Ok(action)
    }

    /// Delete the floating IP
    pub async fn delete(&self) -> Result<()> {
        self.transport
            .expect(Method::DELETE, &self.endpoint(), None, StatusCode::NO_CONTENT)
            .await?;

        info!("Floating IP {} deleted", self.ip);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{action_json, floating_ip_json, mock_transport};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetched_ip(server: &MockServer) -> FloatingIp {
        let wire: FloatingIpWire =
            serde_json::from_value(floating_ip_json(4711, "Web frontend", None)).unwrap();
        FloatingIp::hydrate(&mock_transport(server), wire)
    }

    #[tokio::test]
    async fn test_create_in_home_location_has_no_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/floating_ips"))
            .and(body_json(json!({
                "type": "ipv4",
                "home_location": "fsn1",
                "description": "Web frontend"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "floating_ip": floating_ip_json(4711, "Web frontend", None)
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = FloatingIpManager::new(mock_transport(&server));
        let mut request = CreateFloatingIpRequest::new(FloatingIpType::Ipv4);
        request.home_location = Some("fsn1".into());
        request.description = Some("Web frontend".to_string());

        let (ip, action) = manager.create(request).await.unwrap();
        assert_eq!(ip.id, 4711);
        assert_eq!(ip.description.as_deref(), Some("Web frontend"));
        assert_eq!(ip.home_location_id, Some(1));
        assert_eq!(ip.server_id, None);
        assert!(action.is_none());
    }

    #[tokio::test]
    async fn test_create_assigned_returns_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/floating_ips"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "floating_ip": floating_ip_json(4711, "Web frontend", Some(42)),
                "action": action_json(13, "running")
            })))
            .mount(&server)
            .await;

        let manager = FloatingIpManager::new(mock_transport(&server));
        let mut request = CreateFloatingIpRequest::new(FloatingIpType::Ipv4);
        request.server_id = Some(42);

        let (ip, action) = manager.create(request).await.unwrap();
        assert_eq!(ip.server_id, Some(42));
        assert_eq!(action.map(|a| a.id), Some(13));
    }

    #[tokio::test]
    async fn test_create_failures_raise() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/floating_ips"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "error": {"code": "invalid_input", "message": "invalid location"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = FloatingIpManager::new(mock_transport(&server));
        let request = CreateFloatingIpRequest::new(FloatingIpType::Ipv6);
        assert!(matches!(
            manager.create(request).await,
            Err(Error::InvalidArgument(_))
        ));

        let mut request = CreateFloatingIpRequest::new(FloatingIpType::Ipv6);
        request.home_location = Some("mars1".into());
        assert!(matches!(
            manager.create(request).await,
            Err(Error::Action { status: Some(422), .. })
        ));
    }

    #[tokio::test]
    async fn test_assign_and_unassign() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/floating_ips/4711/actions/assign"))
            .and(body_json(json!({"server": 42})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"action": action_json(1, "running")})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/floating_ips/4711/actions/unassign"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"action": action_json(2, "running")})),
            )
            .mount(&server)
            .await;

        let mut ip = fetched_ip(&server);
        ip.assign_to_server(42).await.unwrap();
        assert_eq!(ip.server_id, Some(42));

        ip.unassign_from_server().await.unwrap();
        assert_eq!(ip.server_id, None);
    }

    #[tokio::test]
    async fn test_change_description_and_reverse_dns() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/floating_ips/4711"))
            .and(body_json(json!({"description": "Mail"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "floating_ip": floating_ip_json(4711, "Mail", None)
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/floating_ips/4711/actions/change_dns_ptr"))
            .and(body_json(json!({"ip": "131.232.99.1", "dns_ptr": "mail.example.com"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"action": action_json(3, "running")})),
            )
            .mount(&server)
            .await;

        let mut ip = fetched_ip(&server);
        ip.change_description("Mail").await.unwrap();
        assert_eq!(ip.description.as_deref(), Some("Mail"));

        ip.change_reverse_dns_entry("131.232.99.1", Some("mail.example.com"))
            .await
            .unwrap();
        assert_eq!(ip.dns_ptr.len(), 1);
        assert_eq!(ip.dns_ptr[0].dns_ptr.as_deref(), Some("mail.example.com"));
    }

    #[tokio::test]
    async fn test_embedded_action_error_on_success_status() {
        let server = MockServer::start().await;
        let mut failed = action_json(1, "error");
        failed["error"] = json!({"code": "server_not_found", "message": "server gone"});
        Mock::given(method("POST"))
            .and(path("/v1/floating_ips/4711/actions/assign"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"action": failed})))
            .mount(&server)
            .await;

        let mut ip = fetched_ip(&server);
        assert!(matches!(
            ip.assign_to_server(42).await,
            Err(Error::Action { .. })
        ));
        assert_eq!(ip.server_id, None);
    }

    #[tokio::test]
    async fn test_delete_floating_ip() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/floating_ips/4711"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let ip = fetched_ip(&server);
        ip.delete().await.unwrap();
    }
}
