use crate::domain::model::{
    DeliveryReceipt, NotificationRequest, QueryFailurePolicy, RawContact, SendFailurePolicy,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    NotNull(String),
}

/// A query against one entity kind of the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub entity: String,
    pub attributes: Vec<String>,
    pub predicate: Predicate,
}

impl RecordQuery {
    /// 所有有生日資料的聯絡人 (日期比對留給用戶端)
    pub fn contacts_with_birthdate() -> Self {
        Self {
            entity: "contact".to_string(),
            attributes: vec!["fullname".to_string(), "birthdate".to_string()],
            predicate: Predicate::NotNull("birthdate".to_string()),
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query_records(&self, query: &RecordQuery) -> Result<Vec<RawContact>>;
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Persists the message and issues an immediate send in one call.
    async fn create_and_send(&self, message: &NotificationRequest) -> Result<DeliveryReceipt>;
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn access_token(&self) -> Option<&str>;
    fn initiating_user(&self) -> &str;
    fn subject(&self) -> &str;
    fn body(&self) -> &str;
    fn timezone(&self) -> Option<&str>;
    fn query_timeout_seconds(&self) -> u64;
    fn send_timeout_seconds(&self) -> u64;
    fn on_query_failure(&self) -> QueryFailurePolicy;
    fn on_send_failure(&self) -> SendFailurePolicy;
}
