//! Typed wrappers for the Menuhub resource endpoints.
//!
//! Every call goes through [`MenuClient::request`], so all of them share the
//! bearer attachment and refresh handling. Panel calls are scoped with the
//! `x-slug` header.

use bytes::Bytes;
use menuhub_types::{
    ApiResponse, Business, Category, CreateBusinessPayload, CreateCategoryPayload,
    CreateProductPayload, MenuData, Page, UpdateCategoryPayload, UploadResult,
};
use reqwest::Method;
use serde_json::Value;

use crate::client::{envelope_from_value, is_envelope, MenuClient, RawResponse};
use crate::error::ClientError;
use crate::types::{FilePart, RequestBody, RequestOptions};

/// Multipart field the upload endpoint reads.
const UPLOAD_FIELD: &str = "files";

/// Paging and sort for listing endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort: Option<String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, page_size: 10, sort: None }
    }
}

impl PageQuery {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size, sort: None }
    }

    pub fn sorted_by(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Workspace endpoints use `Page`, `PageSize`, `Sort`.
    fn workspace_options(&self) -> RequestOptions {
        let options = RequestOptions::new()
            .query("Page", self.page)
            .query("PageSize", self.page_size);
        match &self.sort {
            Some(sort) => options.query("Sort", sort),
            None => options,
        }
    }

    /// Panel endpoints use lower-case names and sort by `displayOrder` unless
    /// told otherwise.
    fn panel_options(&self) -> RequestOptions {
        RequestOptions::new()
            .query("page", self.page)
            .query("pageSize", self.page_size)
            .query("sort", self.sort.as_deref().unwrap_or("displayOrder"))
    }
}

fn scoped(slug: &str) -> Result<RequestOptions, ClientError> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(ClientError::Config("a business slug is required".to_string()));
    }
    Ok(RequestOptions::new().slug(slug))
}

/// The menu endpoint answers with the envelope on some deployments and the
/// bare menu on others. A body is bare only when it carries neither `data`
/// nor `isSuccess`.
fn menu_from(raw: &RawResponse) -> Result<ApiResponse<MenuData>, ClientError> {
    let value: Value = raw.json()?;
    if is_envelope(&value) {
        return envelope_from_value(raw.status, value);
    }
    serde_json::from_value(value)
        .map(ApiResponse::success)
        .map_err(|e| ClientError::InvalidResponse(format!("unexpected menu body: {e}")))
}

/// DELETE endpoints may answer 204 with no body.
fn envelope_or_empty(raw: &RawResponse) -> Result<ApiResponse<Value>, ClientError> {
    if raw.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ApiResponse::success(Value::Null));
    }
    raw.envelope()
}

impl MenuClient {
    /// Upload one image to temporary storage (`POST /files/temp`).
    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: impl Into<Bytes>,
    ) -> Result<ApiResponse<Vec<UploadResult>>, ClientError> {
        let part = FilePart {
            field: UPLOAD_FIELD.to_string(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.into(),
        };
        self.request(Method::POST, "/files/temp", Some(RequestBody::File(part)), RequestOptions::new())
            .await
    }

    pub async fn create_business(
        &self,
        payload: &CreateBusinessPayload,
    ) -> Result<ApiResponse<Business>, ClientError> {
        self.post("/workspace/businesses", payload, RequestOptions::new()).await
    }

    pub async fn list_businesses(
        &self,
        query: &PageQuery,
    ) -> Result<ApiResponse<Page<Business>>, ClientError> {
        self.get("/workspace/businesses", query.workspace_options()).await
    }

    pub async fn get_business(&self, id: &str) -> Result<ApiResponse<Business>, ClientError> {
        self.get(&format!("/workspace/businesses/{id}"), RequestOptions::new()).await
    }

    pub async fn list_categories(
        &self,
        slug: &str,
        query: &PageQuery,
    ) -> Result<ApiResponse<Page<Category>>, ClientError> {
        let mut options = query.panel_options();
        options.slug = scoped(slug)?.slug;
        self.get("/panel/categories", options).await
    }

    pub async fn create_category(
        &self,
        slug: &str,
        payload: &CreateCategoryPayload,
    ) -> Result<ApiResponse<Category>, ClientError> {
        self.post("/panel/categories", payload, scoped(slug)?).await
    }

    pub async fn update_category(
        &self,
        slug: &str,
        id: &str,
        payload: &UpdateCategoryPayload,
    ) -> Result<ApiResponse<Category>, ClientError> {
        self.put(&format!("/panel/categories/{id}"), payload, scoped(slug)?).await
    }

    pub async fn delete_category(
        &self,
        slug: &str,
        id: &str,
    ) -> Result<ApiResponse<Value>, ClientError> {
        let raw = self
            .request_raw(Method::DELETE, &format!("/panel/categories/{id}"), None, scoped(slug)?)
            .await?;
        envelope_or_empty(&raw)
    }

    pub async fn create_product(
        &self,
        slug: &str,
        payload: &CreateProductPayload,
    ) -> Result<ApiResponse<Value>, ClientError> {
        self.post("/panel/products", payload, scoped(slug)?).await
    }

    pub async fn delete_product(
        &self,
        slug: &str,
        id: &str,
    ) -> Result<ApiResponse<Value>, ClientError> {
        let raw = self
            .request_raw(Method::DELETE, &format!("/panel/products/{id}"), None, scoped(slug)?)
            .await?;
        envelope_or_empty(&raw)
    }

    /// Menu as the panel sees it (authenticated).
    pub async fn panel_menu(&self, slug: &str) -> Result<ApiResponse<MenuData>, ClientError> {
        let options = scoped(slug)?.query("slug", slug.trim());
        let raw = self.request_raw(Method::GET, "/panel/menu", None, options).await?;
        menu_from(&raw)
    }

    /// Storefront menu. Sent without credentials and never refreshed.
    pub async fn public_menu(&self, slug: &str) -> Result<ApiResponse<MenuData>, ClientError> {
        let options = scoped(slug)?.anonymous();
        let raw = self.request_raw(Method::GET, "/business/menu", None, options).await?;
        menu_from(&raw)
    }
}
