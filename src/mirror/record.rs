use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::models::{Address, Message, MessageBody, MessageDetail};

/// One row of the `emails` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorRecord {
    pub message_id: String,
    pub account_email: String,
    pub from_address: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub to_addresses: Vec<Address>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub has_attachments: bool,
    #[serde(default)]
    pub size: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MirrorRecord {
    pub fn from_message(account_email: &str, message: &Message, body: Option<&MessageBody>) -> Self {
        let body = body.filter(|body| !body.is_empty());

        Self {
            message_id: message.id.clone(),
            account_email: account_email.to_string(),
            from_address: message.from.address.clone(),
            from_name: message.from.name.clone().filter(|name| !name.is_empty()),
            to_addresses: message.to.clone(),
            subject: message.subject.clone(),
            intro: Some(message.intro.clone()).filter(|intro| !intro.is_empty()),
            text_content: body.map(|body| body.text.clone()),
            html_content: body.map(|body| body.html.clone()),
            seen: message.seen,
            is_deleted: message.is_deleted,
            has_attachments: message.has_attachments,
            size: Some(message.size),
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }

    pub fn from_detail(account_email: &str, detail: &MessageDetail) -> Self {
        Self::from_message(account_email, &detail.message, Some(&detail.body))
    }

    /// Rebuilds the provider-shaped summary from the stored columns.
    pub fn to_message(&self) -> Message {
        Message {
            id: self.message_id.clone(),
            account_id: None,
            msgid: None,
            from: Address {
                address: self.from_address.clone(),
                name: self.from_name.clone(),
            },
            to: self.to_addresses.clone(),
            subject: self.subject.clone(),
            intro: self.intro.clone().unwrap_or_default(),
            seen: self.seen,
            is_deleted: self.is_deleted,
            has_attachments: self.has_attachments,
            size: self.size.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Stored body, if one was ever mirrored.
    pub fn body(&self) -> Option<MessageBody> {
        if self.text_content.is_none() && self.html_content.is_none() {
            return None;
        }

        Some(MessageBody {
            text: self.text_content.clone().unwrap_or_default(),
            html: self.html_content.clone().unwrap_or_default(),
        })
    }

    pub fn to_detail(&self) -> MessageDetail {
        MessageDetail {
            message: self.to_message(),
            body: self.body().unwrap_or_default(),
        }
    }
}

/// Boolean columns that may be updated after insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorFlag {
    Seen,
    Deleted,
}

impl MirrorFlag {
    pub fn column(self) -> &'static str {
        match self {
            Self::Seen => "seen",
            Self::Deleted => "is_deleted",
        }
    }
}
