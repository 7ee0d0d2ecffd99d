use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque, stable identifier of a contact in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub String);

/// Identity of the user who triggered a run; used as the sender.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A contact exactly as the record store returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawContact {
    pub id: ContactId,
    pub fullname: Option<String>,
    pub birthdate: Option<String>,
}

/// A contact whose birthdate passed boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub id: ContactId,
    pub fullname: String,
    pub birthdate: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    /// `directioncode` as stored on an email activity (true = outgoing).
    pub fn as_code(self) -> bool {
        matches!(self, Direction::Outgoing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub from: UserId,
    pub to: ContactId,
    pub subject: String,
    pub body: String,
    pub direction: Direction,
    pub regarding: ContactId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameters {
    pub subject: String,
    pub body: String,
}

impl RunParameters {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Identifier of the message record the transport created and sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent {
        contact: ContactId,
        receipt: DeliveryReceipt,
    },
    Failed {
        contact: ContactId,
        reason: String,
    },
}

impl SendOutcome {
    pub fn contact(&self) -> &ContactId {
        match self {
            SendOutcome::Sent { contact, .. } | SendOutcome::Failed { contact, .. } => contact,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub today: NaiveDate,
    pub candidates: usize,
    pub matched: usize,
    pub skipped: usize,
    pub outcomes: Vec<SendOutcome>,
}

impl RunSummary {
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            today,
            candidates: 0,
            matched: 0,
            skipped: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_sent()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }
}

/// What a run does when the record-store query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryFailurePolicy {
    /// Surface the failure to the host.
    #[default]
    Fail,
    /// Log the failure and finish as if no contact matched.
    Degrade,
}

/// What a run does when sending to one recipient fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendFailurePolicy {
    /// Record the failure and keep sending to the remaining matches.
    #[default]
    Continue,
    /// Stop at the first failure and surface it to the host.
    Abort,
}

impl FromStr for QueryFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(QueryFailurePolicy::Fail),
            "degrade" => Ok(QueryFailurePolicy::Degrade),
            other => Err(format!("expected 'fail' or 'degrade', got '{}'", other)),
        }
    }
}

impl FromStr for SendFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(SendFailurePolicy::Continue),
            "abort" => Ok(SendFailurePolicy::Abort),
            other => Err(format!("expected 'continue' or 'abort', got '{}'", other)),
        }
    }
}
