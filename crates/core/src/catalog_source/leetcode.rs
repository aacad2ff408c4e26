//! LeetCode GraphQL catalog client.
//!
//! The problem list is served by the `problemsetQuestionList` query, paged
//! with `limit`/`skip`. Errors come back either as HTTP failures or as an
//! `errors` array inside an otherwise well-formed 200 response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::types::RawCatalogItem;
use super::{CatalogSource, CatalogSourceError};

const PROBLEM_LIST_QUERY: &str = r#"
query problemsetQuestionList($categorySlug: String, $limit: Int, $skip: Int, $filters: QuestionListFilterInput) {
  problemsetQuestionList: questionList(categorySlug: $categorySlug, limit: $limit, skip: $skip, filters: $filters) {
    total: totalNum
    questions: data {
      acRate
      difficulty
      frontendQuestionId: questionFrontendId
      paidOnly: isPaidOnly
      title
      titleSlug
      topicTags { name slug }
    }
  }
}
"#;

/// LeetCode client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeetCodeConfig {
    /// GraphQL endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Category filter ("" for all problems).
    #[serde(default)]
    pub category_slug: String,
    /// User-Agent header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional session cookie value. Rotating it is up to whoever owns the
    /// configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

fn default_endpoint() -> String {
    "https://leetcode.com/graphql".to_string()
}

fn default_user_agent() -> String {
    format!("Drillbook/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LeetCodeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            category_slug: String::new(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            session_token: None,
        }
    }
}

/// LeetCode GraphQL client.
pub struct LeetCodeClient {
    client: Client,
    endpoint: String,
    category_slug: String,
    session_token: Option<String>,
}

impl LeetCodeClient {
    /// Create a new LeetCode client.
    pub fn new(config: LeetCodeConfig) -> Result<Self, CatalogSourceError> {
        if config.endpoint.trim().is_empty() {
            return Err(CatalogSourceError::NotConfigured(
                "catalog endpoint is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogSourceError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            category_slug: config.category_slug,
            session_token: config.session_token.filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl CatalogSource for LeetCodeClient {
    fn name(&self) -> &str {
        "leetcode"
    }

    async fn fetch_page(
        &self,
        page_size: u32,
        offset: u32,
    ) -> Result<Vec<RawCatalogItem>, CatalogSourceError> {
        let limit = page_size.max(1);

        debug!("LeetCode problem list: limit={}, skip={}", limit, offset);

        let body = json!({
            "query": PROBLEM_LIST_QUERY,
            "variables": {
                "categorySlug": self.category_slug,
                "limit": limit,
                "skip": offset,
                "filters": {},
            },
        });

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Referer", "https://leetcode.com/problemset/")
            .json(&body);
        if let Some(token) = &self.session_token {
            request = request.header("Cookie", format!("LEETCODE_SESSION={}", token));
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let bytes = response.bytes().await?;
        parse_problem_list(&bytes)
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
fn classify_status(status: StatusCode, body: String) -> CatalogSourceError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!("LeetCode rate limit exceeded");
        return CatalogSourceError::Network(format!("rate limited ({})", status.as_u16()));
    }
    if status.is_server_error() {
        return CatalogSourceError::Network(format!("server error {}: {}", status.as_u16(), body));
    }
    CatalogSourceError::Protocol(format!("unexpected status {}: {}", status.as_u16(), body))
}

/// Decode a GraphQL response body into raw items.
fn parse_problem_list(bytes: &[u8]) -> Result<Vec<RawCatalogItem>, CatalogSourceError> {
    let envelope: GqlEnvelope = serde_json::from_slice(bytes).map_err(|e| {
        let snippet_len = bytes.len().min(200);
        CatalogSourceError::Protocol(format!(
            "Failed to parse problem list response: {}. Snippet: '{}'",
            e,
            String::from_utf8_lossy(&bytes[..snippet_len])
        ))
    })?;

    if let Some(errors) = envelope.errors.filter(|errs| !errs.is_empty()) {
        let message = errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(CatalogSourceError::Protocol(message));
    }

    let list = envelope
        .data
        .and_then(|d| d.problemset_question_list)
        .ok_or_else(|| {
            CatalogSourceError::Protocol(
                "Missing 'data.problemsetQuestionList' in response".to_string(),
            )
        })?;

    Ok(list.questions.into_iter().map(Into::into).collect())
}

// ============================================================================
// GraphQL response types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct GqlEnvelope {
    #[serde(default)]
    data: Option<GqlData>,
    #[serde(default)]
    errors: Option<Vec<GqlError>>,
}

#[derive(Debug, Deserialize)]
struct GqlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlData {
    #[serde(default)]
    problemset_question_list: Option<GqlQuestionList>,
}

#[derive(Debug, Deserialize)]
struct GqlQuestionList {
    #[serde(default)]
    #[allow(dead_code)]
    total: Option<u64>,
    #[serde(default)]
    questions: Vec<GqlQuestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlQuestion {
    title: String,
    title_slug: String,
    difficulty: String,
    #[serde(default)]
    topic_tags: Vec<GqlTopicTag>,
    #[serde(default)]
    paid_only: bool,
    #[serde(default)]
    ac_rate: Option<f64>,
    #[serde(default)]
    frontend_question_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GqlTopicTag {
    name: String,
}

impl From<GqlQuestion> for RawCatalogItem {
    fn from(q: GqlQuestion) -> Self {
        RawCatalogItem {
            title: q.title,
            slug: q.title_slug,
            difficulty: q.difficulty,
            topic_tags: q.topic_tags.into_iter().map(|t| t.name).collect(),
            paid_only: q.paid_only,
            ac_rate: q.ac_rate,
            frontend_id: q.frontend_question_id,
        }
    }
}
