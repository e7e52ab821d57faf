// Hand-crafted async HTTP client for shopdesk resource endpoints.
//
// `ApiClient` owns the connection pool and base URL; `ResourceClient<T>`
// binds it to one resource name and one record type.

use std::fmt;
use std::marker::PhantomData;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::multipart::MultipartPayload;
use crate::transport::TransportConfig;
use crate::types::{BulkDeleteBody, BulkUpdateBody, OptionItem, PaginatedResult, QueryParams};

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ── ApiClient ────────────────────────────────────────────────────────

/// Shared HTTP client for every resource under one base URL.
///
/// Cheap to clone: `reqwest::Client` is reference-counted internally.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Bind this client to one resource name.
    pub fn resource<T>(&self, name: impl Into<String>) -> ResourceClient<T> {
        ResourceClient {
            api: self.clone(),
            name: name.into(),
            _record: PhantomData,
        }
    }

    /// Ensure the base path ends with `/` so segments append below it.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(raw.to_owned()));
        }
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{method} {url}");
        self.http.request(method, url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.endpoint(segments)?;
        let resp = self.request(Method::GET, url).send().await?;
        Self::handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(String, String)],
    ) -> Result<T, Error> {
        let url = self.endpoint(segments)?;
        debug!(?params, "query");
        let resp = self.request(Method::GET, url).query(params).send().await?;
        Self::handle_response(resp).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.endpoint(segments)?;
        let resp = self.request(method, url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn send_json_no_response<B: Serialize + ?Sized>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<(), Error> {
        let url = self.endpoint(segments)?;
        let resp = self.request(method, url).json(body).send().await?;
        Self::handle_empty(resp).await
    }

    async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        payload: MultipartPayload,
    ) -> Result<T, Error> {
        let url = self.endpoint(segments)?;
        let form = payload.into_form()?;
        let resp = self.request(method, url).multipart(form).send().await?;
        Self::handle_response(resp).await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), Error> {
        let url = self.endpoint(segments)?;
        let resp = self.request(Method::DELETE, url).send().await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
        let path = resp.url().path().to_owned();
        let raw = resp.text().await.unwrap_or_default();

        let (message, code) = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(err) => (err.message.or(err.error), err.code),
            Err(_) => (None, None),
        };
        let message = message.unwrap_or_else(|| {
            if raw.is_empty() {
                status.to_string()
            } else {
                raw
            }
        });

        match status {
            StatusCode::NOT_FOUND => Error::NotFound { path },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized { message },
            _ => Error::Api {
                status: status.as_u16(),
                message,
                code,
            },
        }
    }
}

// ── ResourceClient ───────────────────────────────────────────────────

/// Typed request functions for one named resource.
pub struct ResourceClient<T> {
    api: ApiClient,
    name: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            name: self.name.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ResourceClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("name", &self.name)
            .field("api", &self.api)
            .finish()
    }
}

impl<T: DeserializeOwned> ResourceClient<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `GET /R?search=&page=&pageSize=&_sort=&_order=&<filter>=`
    pub async fn list(&self, params: &QueryParams) -> Result<PaginatedResult<T>, Error> {
        self.api
            .get_with_params(&[&self.name], &params.to_query_pairs())
            .await
    }

    /// `GET /R/:id`
    pub async fn get(&self, id: &str) -> Result<T, Error> {
        self.api.get(&[&self.name, id]).await
    }

    /// `GET /R/options` or `GET /R/options?parentId=`
    pub async fn options(&self, parent_id: Option<&str>) -> Result<Vec<OptionItem>, Error> {
        match parent_id {
            Some(parent) => {
                self.api
                    .get_with_params(
                        &[&self.name, "options"],
                        &[("parentId".to_owned(), parent.to_owned())],
                    )
                    .await
            }
            None => self.api.get(&[&self.name, "options"]).await,
        }
    }

    /// `POST /R` with a JSON body.
    pub async fn create<B: Serialize + ?Sized>(&self, data: &B) -> Result<T, Error> {
        self.api.send_json(Method::POST, &[&self.name], data).await
    }

    /// `POST /R` with a multipart body.
    pub async fn create_multipart(&self, payload: MultipartPayload) -> Result<T, Error> {
        self.api
            .send_multipart(Method::POST, &[&self.name], payload)
            .await
    }

    /// `PATCH /R/:id` with a JSON body.
    pub async fn update<B: Serialize + ?Sized>(&self, id: &str, data: &B) -> Result<T, Error> {
        self.api
            .send_json(Method::PATCH, &[&self.name, id], data)
            .await
    }

    /// `PATCH /R/:id` with a multipart body.
    pub async fn update_multipart(&self, id: &str, payload: MultipartPayload) -> Result<T, Error> {
        self.api
            .send_multipart(Method::PATCH, &[&self.name, id], payload)
            .await
    }

    /// `DELETE /R/:id`
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.api.delete(&[&self.name, id]).await
    }

    /// `PATCH /R` with `{ids, data}`.
    pub async fn bulk_update<B: Serialize + ?Sized>(
        &self,
        ids: &[String],
        data: &B,
    ) -> Result<(), Error> {
        self.api
            .send_json_no_response(Method::PATCH, &[&self.name], &BulkUpdateBody { ids, data })
            .await
    }

    /// `DELETE /R` with `{ids}`.
    pub async fn bulk_delete(&self, ids: &[String]) -> Result<(), Error> {
        self.api
            .send_json_no_response(Method::DELETE, &[&self.name], &BulkDeleteBody { ids })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::from_reqwest(base, reqwest::Client::new()).unwrap()
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        assert_eq!(client("http://shop.local/api").base_url().as_str(), "http://shop.local/api/");
        assert_eq!(client("http://shop.local/api/").base_url().as_str(), "http://shop.local/api/");
        assert_eq!(client("http://shop.local").base_url().as_str(), "http://shop.local/");
    }

    #[test]
    fn endpoint_appends_encoded_segments() {
        let api = client("http://shop.local/api");
        let url = api.endpoint(&["customers", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://shop.local/api/customers/a%20b%2Fc");
    }

    #[test]
    fn non_base_urls_are_rejected() {
        let err = ApiClient::from_reqwest("mailto:shop@example.com", reqwest::Client::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidBaseUrl(_)));
    }
}
