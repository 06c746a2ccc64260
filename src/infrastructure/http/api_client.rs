use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use super::transport::{ApiResponse, ApiTransport};
use crate::common::context::RequestContext;
use crate::common::error::ScmClientError;
use crate::common::result::ScmResult;

/// Upper bound on pages fetched for a single listing
pub const MAX_PAGES: usize = 100;

/// Page size requested from page-number paginated APIs
pub const PAGE_SIZE: usize = 100;

/// REST root of one provider plus the transport used to reach it.
///
/// Cloning is cheap; the transport is shared.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
    base: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base", &self.base.as_str()).finish()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn ApiTransport>, base: Url) -> Self {
        Self { transport, base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Append already-split path segments to the API root. Each segment is
    /// percent-encoded, `/` included.
    pub fn endpoint<I, S>(&self, segments: I) -> ScmResult<Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ScmClientError::upstream_error("API base URL cannot be a base", None))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Perform a GET, racing it against the context's cancellation and
    /// deadline. The response is returned whatever its status.
    pub async fn get(&self, ctx: &RequestContext, url: &Url) -> ScmResult<ApiResponse> {
        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            url = %url,
            "GET"
        );
        let response = ctx.guard(self.transport.get(url)).await?;
        tracing::debug!(
            correlation_id = %ctx.correlation_id(),
            status = response.status,
            "response received"
        );
        Ok(response)
    }

    /// GET and require a 2xx status; 404 becomes `NotFound { resource }`.
    pub async fn get_ok(
        &self,
        ctx: &RequestContext,
        url: &Url,
        resource: &str,
    ) -> ScmResult<ApiResponse> {
        let response = self.get(ctx, url).await?;
        check_status(response, resource)
    }

    /// GET, require success and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        url: &Url,
        resource: &str,
    ) -> ScmResult<T> {
        self.get_ok(ctx, url, resource).await?.json()
    }

    /// Drain a page-number paginated listing (`page`, `per_page`), stopping at
    /// the first short page.
    pub async fn get_paged<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        url: &Url,
        resource: &str,
    ) -> ScmResult<Vec<T>> {
        let mut items = Vec::new();
        for page in 1..=MAX_PAGES {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &PAGE_SIZE.to_string());

            let batch: Vec<T> = self.get_json(ctx, &page_url, resource).await?;
            let short = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if short {
                return Ok(items);
            }
        }
        Err(too_many_pages(resource))
    }

    /// Drain a listing that links to its next page with an absolute `next` URL.
    pub async fn get_linked<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        url: &Url,
        resource: &str,
    ) -> ScmResult<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url.clone());
        for _ in 0..MAX_PAGES {
            let page_url = match next.take() {
                Some(page_url) => page_url,
                None => return Ok(items),
            };
            let page: LinkedPage<T> = self.get_json(ctx, &page_url, resource).await?;
            items.extend(page.values);
            next = page.next.as_deref().map(Url::parse).transpose()?;
        }
        match next {
            None => Ok(items),
            Some(_) => Err(too_many_pages(resource)),
        }
    }
}

/// One page of a cursor paginated listing (Bitbucket style)
#[derive(Debug, Deserialize)]
pub struct LinkedPage<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Map non-success statuses onto the error taxonomy.
pub fn check_status(response: ApiResponse, resource: &str) -> ScmResult<ApiResponse> {
    match response.status {
        s if (200..300).contains(&s) => Ok(response),
        404 => Err(ScmClientError::not_found(resource)),
        s => Err(ScmClientError::upstream_error(
            format!("{}: {}", resource, response.excerpt()),
            Some(s),
        )),
    }
}

fn too_many_pages(resource: &str) -> ScmClientError {
    ScmClientError::upstream_error(
        format!("{}: more than {} pages returned", resource, MAX_PAGES),
        None,
    )
}
