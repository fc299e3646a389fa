use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{AppError, AppResult};

use super::record::{MirrorFlag, MirrorRecord};
use super::store::MirrorStore;

const EMAILS_TABLE_PATH: &str = "/rest/v1/emails";

/// `emails` table behind a PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct RestMirror {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RestMirror {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn table_url(&self) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.set_path(EMAILS_TABLE_PATH.trim_start_matches('/'));
        Ok(url)
    }

    fn with_keys(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn select(&self, filters: &[(&str, String)]) -> AppResult<Vec<MirrorRecord>> {
        let url = self.table_url()?;
        let response = self
            .with_keys(self.http.get(url))
            .query(&[("select", "*".to_string())])
            .query(filters)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_mirror_error(status, &body))
    }
}

#[async_trait]
impl MirrorStore for RestMirror {
    async fn insert_if_absent(&self, record: &MirrorRecord) -> AppResult<bool> {
        if self
            .find(&record.account_email, &record.message_id)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let url = self.table_url()?;
        let response = self
            .with_keys(self.http.post(url))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }

        // Unique violation: another writer inserted the row between check and insert.
        if status == StatusCode::CONFLICT {
            return Ok(false);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_mirror_error(status, &body))
    }

    async fn list_for_account(&self, account_email: &str) -> AppResult<Vec<MirrorRecord>> {
        self.select(&[
            ("account_email", eq(account_email)),
            ("order", "created_at.desc".to_string()),
        ])
        .await
    }

    async fn find(&self, account_email: &str, message_id: &str) -> AppResult<Option<MirrorRecord>> {
        let rows = self
            .select(&[
                ("message_id", eq(message_id)),
                ("account_email", eq(account_email)),
                ("limit", "1".to_string()),
            ])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn set_flag(
        &self,
        account_email: &str,
        message_id: &str,
        flag: MirrorFlag,
        value: bool,
    ) -> AppResult<()> {
        let url = self.table_url()?;
        let mut body = Map::new();
        body.insert(flag.column().to_string(), Value::Bool(value));
        let response = self
            .with_keys(self.http.patch(url))
            .query(&[
                ("message_id", eq(message_id)),
                ("account_email", eq(account_email)),
            ])
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_mirror_error(status, &body))
    }
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    code: Option<String>,
    hint: Option<String>,
}

fn map_mirror_error(status: StatusCode, body: &str) -> AppError {
    let detail = serde_json::from_str::<PostgrestError>(body)
        .ok()
        .and_then(|error| {
            let mut parts = Vec::new();
            parts.extend(error.message);
            parts.extend(error.code.map(|code| format!("code={code}")));
            parts.extend(error.hint.map(|hint| format!("hint={hint}")));
            (!parts.is_empty()).then(|| parts.join(", "))
        })
        .unwrap_or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                "no error details in response body".to_string()
            } else {
                body.to_string()
            }
        });

    AppError::Mirror(format!("mirror request failed ({status}): {detail}"))
}
