use crate::domain::model::{ContactId, DeliveryReceipt, NotificationRequest, RawContact};
use crate::domain::ports::{
    ConfigProvider, MessageTransport, Predicate, RecordQuery, RecordStore,
};
use crate::utils::error::{NotifierError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

const PARTY_SENDER: u8 = 1;
const PARTY_TO_RECIPIENT: u8 = 2;

#[derive(Debug, Deserialize)]
struct ODataCollection {
    value: Vec<Value>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// Client for an OData v4 CRM Web API (e.g. `https://org.example.com/api/data/v9.2`).
///
/// Serves both as the contact store and as the email transport.
#[derive(Debug, Clone)]
pub struct WebApiClient {
    base_url: String,
    access_token: Option<String>,
    client: Client,
}

impl WebApiClient {
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
            client: Client::new(),
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self::new(
            config.api_endpoint(),
            config.access_token().map(str::to_string),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("Accept", "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0");

        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// 組出查詢網址，例如 contacts?$select=contactid,fullname,birthdate&$filter=birthdate ne null
    pub fn query_url(&self, query: &RecordQuery) -> String {
        let mut select = vec![id_attribute(&query.entity)];
        select.extend(query.attributes.iter().cloned());

        let filter = match &query.predicate {
            Predicate::NotNull(attribute) => format!("{} ne null", attribute),
        };

        format!(
            "{}?$select={}&$filter={}",
            self.url(&entity_set(&query.entity)),
            select.join(","),
            filter.replace(' ', "%20")
        )
    }

    async fn create_email(&self, message: &NotificationRequest) -> Result<String> {
        let url = self.url("emails");
        tracing::debug!("Creating email for contact {} at {}", message.to, url);

        let response = self
            .authorize(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(&email_payload(message))
            .send()
            .await?;

        let status = response.status();
        let entity_id_header = response
            .headers()
            .get("OData-EntityId")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::SendFailure {
                contact_id: message.to.0.clone(),
                message: format!("creating email returned {}: {}", status, body),
            });
        }

        // 有 return=representation 時從內容取 id，否則從 OData-EntityId 標頭解析
        let body = response.text().await?;
        let from_body = if body.trim().is_empty() {
            None
        } else {
            let created: Value = serde_json::from_str(&body)?;
            created
                .get("activityid")
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        from_body
            .or_else(|| entity_id_header.as_deref().and_then(id_from_entity_uri))
            .ok_or_else(|| NotifierError::SendFailure {
                contact_id: message.to.0.clone(),
                message: "created email carries no activity id".to_string(),
            })
    }

    async fn send_email(&self, message: &NotificationRequest, email_id: &str) -> Result<()> {
        let url = self.url(&format!(
            "emails({})/Microsoft.Dynamics.CRM.SendEmail",
            email_id
        ));
        tracing::debug!("Issuing send for email {}", email_id);

        let response = self
            .authorize(self.client.post(&url))
            .json(&json!({ "IssueSend": true, "TrackingToken": "" }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::SendFailure {
                contact_id: message.to.0.clone(),
                message: format!("sending email {} returned {}: {}", email_id, status, body),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl RecordStore for WebApiClient {
    async fn query_records(&self, query: &RecordQuery) -> Result<Vec<RawContact>> {
        let id_key = id_attribute(&query.entity);
        let mut records = Vec::new();
        let mut next = Some(self.query_url(query));

        // 依 @odata.nextLink 逐頁讀取
        while let Some(url) = next.take() {
            tracing::debug!("Making API request to: {}", url);
            let response = self.authorize(self.client.get(&url)).send().await?;
            let status = response.status();
            tracing::debug!("API response status: {}", status);

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(NotifierError::QueryFailure {
                    message: format!("GET {} returned {}: {}", url, status, body),
                });
            }

            let page: ODataCollection = response.json().await?;
            for item in page.value {
                match raw_contact_from(&item, &id_key) {
                    Some(record) => records.push(record),
                    None => tracing::warn!("⚠️ Ignoring {} without {}", query.entity, id_key),
                }
            }
            next = page.next_link;
        }

        Ok(records)
    }
}

#[async_trait]
impl MessageTransport for WebApiClient {
    async fn create_and_send(&self, message: &NotificationRequest) -> Result<DeliveryReceipt> {
        let email_id = self.create_email(message).await?;
        self.send_email(message, &email_id).await?;

        Ok(DeliveryReceipt {
            message_id: email_id,
        })
    }
}

fn entity_set(entity: &str) -> String {
    format!("{}s", entity)
}

fn id_attribute(entity: &str) -> String {
    format!("{}id", entity)
}

fn raw_contact_from(item: &Value, id_key: &str) -> Option<RawContact> {
    let id = item.get(id_key)?.as_str()?;
    let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);

    Some(RawContact {
        id: ContactId(id.to_string()),
        fullname: text("fullname"),
        birthdate: text("birthdate"),
    })
}

/// `https://host/api/data/v9.2/emails(abc)` -> `abc`
fn id_from_entity_uri(uri: &str) -> Option<String> {
    let start = uri.rfind('(')? + 1;
    let end = uri[start..].find(')')? + start;
    Some(uri[start..end].to_string())
}

pub fn email_payload(message: &NotificationRequest) -> Value {
    json!({
        "subject": message.subject,
        "description": message.body,
        "directioncode": message.direction.as_code(),
        "regardingobjectid_contact@odata.bind": format!("/contacts({})", message.regarding),
        "email_activity_parties": [
            {
                "partyid_systemuser@odata.bind": format!("/systemusers({})", message.from),
                "participationtypemask": PARTY_SENDER
            },
            {
                "partyid_contact@odata.bind": format!("/contacts({})", message.to),
                "participationtypemask": PARTY_TO_RECIPIENT
            }
        ]
    })
}
