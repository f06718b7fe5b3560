//! REST client for the taxon HTTP API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use taxon_core::{
    defaults, Category, CategoryGroup, CategoryGroupInput, CategoryInput, ClassificationResult,
    ContentWithResults, DashboardStats, EmailRule, EmailRuleInput, EmailSample, Error,
    PaginatedContent, PeriodStats, ProviderCatalog, ProviderList, Result, RuleEvaluation,
    RuleMatch, StatsPeriod, SubmitContentRequest, TestRuleRequest, ToggleActiveResponse,
};

use crate::context::ClientContext;
use crate::error::error_from_response;

const GROUPS_PATH: &str = "/api/classifier/category-groups/";
const RULES_PATH: &str = "/api/email/email-rules/";

/// Client request timeout; classification of a submission fans out to
/// every active group, so this sits above the server's per-group timeout.
const REQUEST_TIMEOUT_SECS: u64 = defaults::CLASSIFY_TIMEOUT_SECS + 30;

/// Typed client bound to one [`ClientContext`].
#[derive(Debug, Clone)]
pub struct TaxonClient {
    http: Client,
    ctx: ClientContext,
}

impl TaxonClient {
    pub fn new(ctx: ClientContext) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http, ctx })
    }

    /// Reuse an existing `reqwest::Client` (connection pool) with a new context.
    pub fn with_http_client(http: Client, ctx: ClientContext) -> Self {
        Self { http, ctx }
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    // =========================================================================
    // CATEGORY GROUPS
    // =========================================================================

    pub async fn list_groups(&self) -> Result<Vec<CategoryGroup>> {
        self.send(self.request(Method::GET, GROUPS_PATH)).await
    }

    pub async fn get_group(&self, id: Uuid) -> Result<CategoryGroup> {
        self.send(self.request(Method::GET, &group_path(id, ""))).await
    }

    pub async fn create_group(&self, input: &CategoryGroupInput) -> Result<CategoryGroup> {
        self.send(self.request(Method::POST, GROUPS_PATH).json(input))
            .await
    }

    pub async fn update_group(
        &self,
        id: Uuid,
        input: &CategoryGroupInput,
    ) -> Result<CategoryGroup> {
        self.send(self.request(Method::PUT, &group_path(id, "")).json(input))
            .await
    }

    pub async fn delete_group(&self, id: Uuid) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, &group_path(id, "")))
            .await
    }

    pub async fn toggle_active(&self, id: Uuid) -> Result<ToggleActiveResponse> {
        self.send(self.request(Method::POST, &group_path(id, "toggle_active/")))
            .await
    }

    pub async fn list_categories(&self, group_id: Uuid) -> Result<Vec<Category>> {
        self.send(self.request(Method::GET, &group_path(group_id, "categories/")))
            .await
    }

    pub async fn add_category(&self, group_id: Uuid, input: &CategoryInput) -> Result<Category> {
        self.send(
            self.request(Method::POST, &group_path(group_id, "categories/"))
                .json(input),
        )
        .await
    }

    // =========================================================================
    // CONTENT
    // =========================================================================

    pub async fn list_providers(&self) -> Result<Vec<String>> {
        let list: ProviderList = self
            .send(self.request(Method::GET, "/api/files/llm-providers/"))
            .await?;
        Ok(list.providers)
    }

    pub async fn submit_text(&self, req: &SubmitContentRequest) -> Result<ContentWithResults> {
        self.send(self.request(Method::POST, "/api/files/text/").json(req))
            .await
    }

    pub async fn text_history(&self, page: usize, page_size: usize) -> Result<PaginatedContent> {
        self.history("/api/files/text/", page, page_size).await
    }

    pub async fn file_history(&self, page: usize, page_size: usize) -> Result<PaginatedContent> {
        self.history("/api/files/files/", page, page_size).await
    }

    pub async fn email_history(&self, page: usize, page_size: usize) -> Result<PaginatedContent> {
        self.history("/api/email/email-files/", page, page_size)
            .await
    }

    pub async fn get_text(&self, id: Uuid) -> Result<ContentWithResults> {
        self.send(self.request(Method::GET, &format!("/api/files/text/{}/", id)))
            .await
    }

    pub async fn delete_text(&self, id: Uuid) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/api/files/text/{}/", id)))
            .await
    }

    /// Upload a document; the server extracts its text and classifies it.
    pub async fn upload_file(
        &self,
        filename: &str,
        data: Vec<u8>,
        llm_provider: Option<&str>,
    ) -> Result<ContentWithResults> {
        let form = upload_form(filename, data, llm_provider);
        self.send(self.request(Method::POST, "/api/files/upload/").multipart(form))
            .await
    }

    /// Upload an email file (`.eml`, `.msg`, `.oft`, `.html`, `.txt`).
    pub async fn upload_email(
        &self,
        filename: &str,
        data: Vec<u8>,
        llm_provider: Option<&str>,
    ) -> Result<ContentWithResults> {
        let form = upload_form(filename, data, llm_provider);
        self.send(
            self.request(Method::POST, "/api/email/email-files/")
                .multipart(form),
        )
        .await
    }

    // =========================================================================
    // EMAIL RULES
    // =========================================================================

    pub async fn list_email_rules(&self) -> Result<Vec<EmailRule>> {
        self.send(self.request(Method::GET, RULES_PATH)).await
    }

    pub async fn get_email_rule(&self, id: Uuid) -> Result<EmailRule> {
        self.send(self.request(Method::GET, &rule_path(id))).await
    }

    pub async fn create_email_rule(&self, input: &EmailRuleInput) -> Result<EmailRule> {
        self.send(self.request(Method::POST, RULES_PATH).json(input))
            .await
    }

    pub async fn update_email_rule(&self, id: Uuid, input: &EmailRuleInput) -> Result<EmailRule> {
        self.send(self.request(Method::PUT, &rule_path(id)).json(input))
            .await
    }

    pub async fn delete_email_rule(&self, id: Uuid) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, &rule_path(id)))
            .await
    }

    /// Check an unsaved rule against a sample email.
    pub async fn test_email_rule(
        &self,
        rule: &EmailRuleInput,
        email: &EmailSample,
    ) -> Result<RuleEvaluation> {
        let body = TestRuleRequest {
            rule: rule.clone(),
            email: email.clone(),
        };
        self.send(
            self.request(Method::POST, &format!("{}test_rule/", RULES_PATH))
                .json(&body),
        )
        .await
    }

    /// The highest-priority active rule matching `email`, if any.
    pub async fn evaluate_email_rules(&self, email: &EmailSample) -> Result<Option<RuleMatch>> {
        self.send(
            self.request(Method::POST, &format!("{}evaluate/", RULES_PATH))
                .json(email),
        )
        .await
    }

    // =========================================================================
    // RESULTS AND STATS
    // =========================================================================

    pub async fn list_results(&self, limit: i64, offset: i64) -> Result<Vec<ClassificationResult>> {
        self.send(
            self.request(Method::GET, "/api/classifier/results/")
                .query(&[("limit", limit), ("offset", offset)]),
        )
        .await
    }

    pub async fn get_result(&self, id: Uuid) -> Result<ClassificationResult> {
        self.send(self.request(Method::GET, &format!("/api/classifier/results/{}/", id)))
            .await
    }

    pub async fn dashboard(&self) -> Result<DashboardStats> {
        self.send(self.request(Method::GET, "/api/dashboard/"))
            .await
    }

    pub async fn stats(&self, period: StatsPeriod) -> Result<PeriodStats> {
        self.send(
            self.request(Method::GET, "/api/stats/")
                .query(&[("period", period.as_str())]),
        )
        .await
    }

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.ctx.url(path))
            .header("Authorization", self.ctx.authorization())
    }

    async fn history(&self, path: &str, page: usize, page_size: usize) -> Result<PaginatedContent> {
        self.send(
            self.request(Method::GET, path)
                .query(&[("page", page), ("page_size", page_size)]),
        )
        .await
    }

    async fn execute(&self, req: RequestBuilder) -> Result<reqwest::Response> {
        let start = Instant::now();
        let response = req
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request failed: {}", e)))?;

        let status = response.status();
        debug!(
            subsystem = "client",
            component = "rest",
            url = %response.url(),
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Response received"
        );

        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status, &body))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let response = self.execute(req).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Serialization(format!("Failed to parse response: {}", e)))
    }

    async fn send_empty(&self, req: RequestBuilder) -> Result<()> {
        self.execute(req).await.map(|_| ())
    }
}

#[async_trait]
impl ProviderCatalog for TaxonClient {
    async fn list_providers(&self) -> Result<Vec<String>> {
        TaxonClient::list_providers(self).await
    }
}

fn group_path(id: Uuid, suffix: &str) -> String {
    format!("{}{}/{}", GROUPS_PATH, id, suffix)
}

fn rule_path(id: Uuid) -> String {
    format!("{}{}/", RULES_PATH, id)
}

fn upload_form(filename: &str, data: Vec<u8>, llm_provider: Option<&str>) -> Form {
    let mut form = Form::new().part("file", Part::bytes(data).file_name(filename.to_string()));
    if let Some(provider) = llm_provider {
        form = form.text("llm_provider", provider.to_string());
    }
    form
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_paths() {
        let id = Uuid::nil();
        assert_eq!(
            group_path(id, ""),
            "/api/classifier/category-groups/00000000-0000-0000-0000-000000000000/"
        );
        assert!(group_path(id, "toggle_active/").ends_with("/toggle_active/"));
    }
}
