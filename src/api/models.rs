use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Address {
    /// `Name <address>` when a distinct display name exists, bare address otherwise.
    pub fn display(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() && name != self.address => {
                format!("{name} <{}>", self.address)
            }
            _ => self.address.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    pub domain: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAccount {
    pub id: String,
    pub address: String,
    #[serde(default)]
    pub quota: Option<u64>,
    #[serde(default)]
    pub used: Option<u64>,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Summary fields of a provider message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msgid: Option<String>,
    pub from: Address,
    #[serde(default)]
    pub to: Vec<Address>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub has_attachments: bool,
    #[serde(default)]
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub text: String,
    pub html: String,
}

impl MessageBody {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.html.is_empty()
    }
}

/// A message together with its full body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDetail {
    #[serde(flatten)]
    pub message: Message,
    #[serde(flatten)]
    pub body: MessageBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub total_items: u64,
}

/// Wire shape of `GET /messages/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct MessageResource {
    #[serde(flatten)]
    pub message: Message,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "html_fragments")]
    pub html: String,
}

impl MessageResource {
    pub(crate) fn into_detail(self) -> MessageDetail {
        MessageDetail {
            message: self.message,
            body: MessageBody {
                text: self.text.unwrap_or_default(),
                html: self.html,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HydraCollection<T> {
    #[serde(rename = "hydra:member", default = "Vec::new")]
    pub member: Vec<T>,
    #[serde(rename = "hydra:totalItems", default)]
    pub total_items: Option<u64>,
}

// The provider sends `html` either as one string or as a list of fragments.
fn html_fragments<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Html {
        One(String),
        Many(Vec<String>),
        Missing(()),
    }

    Ok(match Html::deserialize(deserializer)? {
        Html::One(html) => html,
        Html::Many(parts) => parts.concat(),
        Html::Missing(()) => String::new(),
    })
}
