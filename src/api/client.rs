use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{AppError, AppResult};

use super::endpoints;
use super::models::{
    Domain, HydraCollection, IssuedToken, Message, MessageDetail, MessagePage, MessageResource,
    ProviderAccount,
};
use super::provider::MailProvider;
use super::retry::RetryPolicy;

const MERGE_PATCH_JSON: &str = "application/merge-patch+json";

#[derive(Debug, Clone)]
pub struct MailTmClient {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl MailTmClient {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            retry,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &[&str],
        token: Option<&str>,
        query: Option<&[(String, String)]>,
    ) -> AppResult<T> {
        let url = self.endpoint_url(path)?;
        let mut request = authorize(self.http.get(url), token);
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await?;
        parse_json_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &[&str],
        body: &B,
    ) -> AppResult<T> {
        let url = self.endpoint_url(path)?;
        let response = self.http.post(url).json(body).send().await?;
        parse_json_response(response).await
    }

    async fn patch_merge<B: Serialize>(&self, path: &[&str], token: &str, body: &B) -> AppResult<()> {
        let url = self.endpoint_url(path)?;
        let payload = serde_json::to_vec(body)?;
        let response = self
            .http
            .patch(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, MERGE_PATCH_JSON)
            .body(payload)
            .send()
            .await?;
        expect_success(response).await
    }

    async fn delete(&self, path: &[&str], token: &str) -> AppResult<()> {
        let url = self.endpoint_url(path)?;
        let response = self.http.delete(url).bearer_auth(token).send().await?;
        expect_success(response).await
    }

    /// Base URL with its path replaced by `path`. Each segment is
    /// percent-encoded on its own, `/`, `?` and `#` included.
    fn endpoint_url(&self, path: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Config(format!("api base url `{}` cannot carry a path", self.base_url))
            })?
            .clear()
            .extend(path);
        Ok(url)
    }
}

#[async_trait]
impl MailProvider for MailTmClient {
    async fn list_domains(&self) -> AppResult<Vec<Domain>> {
        let collection: HydraCollection<Domain> = self
            .retry
            .run("list domains", move || self.get_json(endpoints::domains(), None, None))
            .await?;
        Ok(collection.member)
    }

    async fn create_account(&self, address: &str, password: &str) -> AppResult<ProviderAccount> {
        let body = Credentials { address, password };
        let body = &body;
        self.retry
            .run("create account", move || {
                self.post_json(endpoints::accounts(), body)
            })
            .await
    }

    async fn issue_token(&self, address: &str, password: &str) -> AppResult<IssuedToken> {
        let body = Credentials { address, password };
        let body = &body;
        self.retry
            .run("obtain token", move || self.post_json(endpoints::token(), body))
            .await
    }

    async fn me(&self, token: &str) -> AppResult<ProviderAccount> {
        self.retry
            .run("get identity", move || {
                self.get_json(endpoints::me(), Some(token), None)
            })
            .await
    }

    async fn list_messages(&self, token: &str, page: u32, per_page: u32) -> AppResult<MessagePage> {
        let query = endpoints::page_query(page, per_page);
        let query = query.as_slice();
        let collection: HydraCollection<Message> = self
            .retry
            .run("list messages", move || {
                self.get_json(endpoints::messages(), Some(token), Some(query))
            })
            .await?;

        debug!(
            page,
            fetched = collection.member.len(),
            "fetched provider message page"
        );
        let total_items = collection
            .total_items
            .unwrap_or(collection.member.len() as u64);
        Ok(MessagePage {
            messages: collection.member,
            total_items,
        })
    }

    async fn get_message(&self, token: &str, id: &str) -> AppResult<MessageDetail> {
        let path = endpoints::message(id)?;
        let path = path.as_slice();
        let resource: MessageResource = self
            .retry
            .run("get message", move || self.get_json(path, Some(token), None))
            .await?;
        Ok(resource.into_detail())
    }

    async fn mark_seen(&self, token: &str, id: &str) -> AppResult<()> {
        let path = endpoints::message(id)?;
        let path = path.as_slice();
        let patch = SeenPatch { seen: true };
        let patch = &patch;
        self.retry
            .run("mark seen", move || self.patch_merge(path, token, patch))
            .await
    }

    async fn delete_message(&self, token: &str, id: &str) -> AppResult<()> {
        let path = endpoints::message(id)?;
        let path = path.as_slice();
        self.retry
            .run("delete message", move || self.delete(path, token))
            .await
    }

    async fn delete_account(&self, token: &str, account_id: &str) -> AppResult<()> {
        let path = endpoints::account(account_id)?;
        let path = path.as_slice();
        self.retry
            .run("delete account", move || self.delete(path, token))
            .await
    }
}

impl Default for MailTmClient {
    fn default() -> Self {
        Self::new("https://api.mail.tm", RetryPolicy::default())
    }
}

fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

async fn parse_json_response<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(map_api_error(status, &body))
}

async fn expect_success(response: reqwest::Response) -> AppResult<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(map_api_error(status, &body))
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    address: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SeenPatch {
    seen: bool,
}

#[derive(Debug, Deserialize)]
struct ProblemDocument {
    #[serde(rename = "hydra:description")]
    hydra_description: Option<String>,
    #[serde(rename = "hydra:title")]
    hydra_title: Option<String>,
    detail: Option<String>,
    title: Option<String>,
    message: Option<String>,
}

fn map_api_error(status: StatusCode, body: &str) -> AppError {
    let message = parse_api_error_message(body).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "no error details in response body".to_string()
        } else {
            body.to_string()
        }
    });

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AppError::Auth(format!(
            "mail provider rejected the session ({status}): {message}. run `tempmail account login`"
        ));
    }

    AppError::Api(format!("mail provider request failed ({status}): {message}"))
}

fn parse_api_error_message(body: &str) -> Option<String> {
    let problem = serde_json::from_str::<ProblemDocument>(body).ok()?;

    [
        problem.hydra_description,
        problem.detail,
        problem.message,
        problem.hydra_title,
        problem.title,
    ]
    .into_iter()
    .flatten()
    .map(|value| value.trim().to_string())
    .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_unauthorized_as_auth_error() {
        let error = map_api_error(
            StatusCode::UNAUTHORIZED,
            r#"{"code":401,"message":"JWT Token not found"}"#,
        );

        match error {
            AppError::Auth(message) => {
                assert!(message.contains("JWT Token not found"));
                assert!(message.contains("tempmail account login"));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn prefers_hydra_description() {
        let error = map_api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"hydra:title":"An error occurred","hydra:description":"address: This value is already used.","detail":"address: This value is already used."}"#,
        );

        match error {
            AppError::Api(message) => {
                assert!(message.contains("422"));
                assert!(message.contains("This value is already used"));
                assert!(!message.contains("An error occurred"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_raw_body() {
        let error = map_api_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(error, AppError::Api(message) if message.contains("upstream down")));
    }

    #[test]
    fn joins_endpoint_onto_base_url() {
        let client = MailTmClient::new("http://127.0.0.1:9000", RetryPolicy::default());
        let path = endpoints::message("abc").expect("path");
        let url = client.endpoint_url(&path).expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/messages/abc");
    }

    #[test]
    fn message_id_stays_inside_its_segment() {
        let client = MailTmClient::default();

        let path = endpoints::message("../accounts/victim").expect("path");
        let url = client.endpoint_url(&path).expect("url");
        assert_eq!(url.path(), "/messages/..%2Faccounts%2Fvictim");

        let path = endpoints::message("a?b#c").expect("path");
        let url = client.endpoint_url(&path).expect("url");
        assert_eq!(url.path(), "/messages/a%3Fb%23c");
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }
}
