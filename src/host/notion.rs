//! REST client for the Notion API

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

use super::errors::{HostError, HostResult};
use super::{ChildrenPage, ContentHost, CreatedPage, Parent};
use crate::blocks::{Block, HostBlock, TextRun, blocks_to_wire, rich_text_to_wire};
use crate::config::{ConfigError, HostConfig};
use crate::utils::LIST_CHILDREN_PAGE_SIZE;

/// `ContentHost` over the Notion REST API
#[derive(Debug, Clone)]
pub struct NotionClient {
    // Client already uses Arc internally, so cloning is cheap
    http: Client,
    config: HostConfig,
}

/// Error body returned with non-success statuses
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

impl NotionClient {
    pub fn new(config: HostConfig) -> HostResult<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.token())).map_err(|e| ConfigError::Invalid {
            name: "token",
            reason: format!("not a valid header value: {e}"),
        })?;
        headers.insert(AUTHORIZATION, bearer);
        let version = HeaderValue::from_str(config.notion_version()).map_err(|e| ConfigError::Invalid {
            name: "notion_version",
            reason: format!("not a valid header value: {e}"),
        })?;
        headers.insert("Notion-Version", version);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { http, config })
    }

    /// Client configured from `NOTION_TOKEN` and friends
    pub fn from_env() -> HostResult<Self> {
        Self::new(HostConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base(), path)
    }

    async fn send(&self, request: RequestBuilder) -> HostResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Value>().await?);
        }
        Err(error_from(status, response).await)
    }
}

async fn error_from(status: StatusCode, response: Response) -> HostError {
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64);

    let body: ApiError = response.json().await.unwrap_or_default();

    match status.as_u16() {
        429 => HostError::RateLimited { retry_after },
        404 => HostError::NotFound(body.message),
        code @ 500..=599 => HostError::Server {
            status: code,
            message: body.message,
        },
        code => HostError::Rejected {
            status: code,
            code: body.code,
            message: body.message,
        },
    }
}

#[async_trait]
impl ContentHost for NotionClient {
    async fn create_page(
        &self,
        parent: &Parent,
        properties: &Value,
        children: &[Block],
    ) -> HostResult<CreatedPage> {
        let body = json!({
            "parent": parent.to_wire(),
            "properties": properties,
            "children": blocks_to_wire(children),
        });
        let value = self.send(self.http.post(self.url("/v1/pages")).json(&body)).await?;
        let page: PageResponse = serde_json::from_value(value)?;
        tracing::debug!(page_id = %page.id, blocks = children.len(), "created page");
        Ok(CreatedPage {
            id: page.id,
            url: page.url,
        })
    }

    async fn append_children(&self, block_id: &str, children: &[Block]) -> HostResult<Vec<String>> {
        let body = json!({ "children": blocks_to_wire(children) });
        let path = format!("/v1/blocks/{block_id}/children");
        let value = self.send(self.http.patch(self.url(&path)).json(&body)).await?;
        let list: ListResponse = serde_json::from_value(value)?;

        let ids = list
            .results
            .into_iter()
            .map(|v| serde_json::from_value::<IdOnly>(v).map(|b| b.id))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(block_id, appended = ids.len(), "appended children");
        Ok(ids)
    }

    async fn list_children(&self, block_id: &str, cursor: Option<&str>) -> HostResult<ChildrenPage> {
        let path = format!("/v1/blocks/{block_id}/children");
        let mut query: Vec<(&str, String)> = vec![("page_size", LIST_CHILDREN_PAGE_SIZE.to_string())];
        if let Some(cursor) = cursor {
            query.push(("start_cursor", cursor.to_string()));
        }

        let value = self.send(self.http.get(self.url(&path)).query(&query)).await?;
        let list: ListResponse = serde_json::from_value(value)?;
        let results = list
            .results
            .iter()
            .map(HostBlock::from_wire)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ChildrenPage {
            results,
            next_cursor: list.next_cursor.filter(|_| list.has_more),
        })
    }

    async fn update_rich_text(&self, block_id: &str, kind: &str, rich_text: &[TextRun]) -> HostResult<()> {
        let field = if kind == "image" { "caption" } else { "rich_text" };
        let mut payload = serde_json::Map::new();
        payload.insert(field.to_string(), rich_text_to_wire(rich_text));
        let mut body = serde_json::Map::new();
        body.insert(kind.to_string(), Value::Object(payload));
        let path = format!("/v1/blocks/{block_id}");
        self.send(self.http.patch(self.url(&path)).json(&Value::Object(body)))
            .await?;
        Ok(())
    }
}
