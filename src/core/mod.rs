pub mod birthdate;
pub mod filter;
pub mod notifier;

pub use crate::domain::model::{ContactRecord, NotificationRequest, RawContact, RunParameters, RunSummary};
pub use crate::domain::ports::{Clock, ConfigProvider, MessageTransport, RecordStore};
pub use crate::utils::error::Result;
