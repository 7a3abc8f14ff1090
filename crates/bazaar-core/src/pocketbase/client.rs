//! HTTP implementation of [`RecordApi`].

use std::future::Future;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{file_url, ApiError, ApiResult, ListOptions, RecordApi};
use crate::auth::AuthStore;
use crate::util::normalize_base_url;

const FULL_LIST_BATCH: u32 = 500;

#[derive(Debug, Deserialize)]
struct ListPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Request pages from 1 upward until one comes back short.
async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> ApiResult<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ApiResult<Vec<T>>>,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch_page(page).await?;
        let fetched = batch.len();
        items.extend(batch);
        if fetched < FULL_LIST_BATCH as usize {
            return Ok(items);
        }
        page += 1;
    }
}

/// Record API client bound to one backend and one auth store
#[derive(Clone)]
pub struct PocketBaseClient {
    base_url: String,
    http: Client,
    auth: AuthStore,
}

impl PocketBaseClient {
    pub fn new(base_url: &str, auth: AuthStore) -> ApiResult<Self> {
        let base_url = normalize_base_url(base_url)
            .ok_or_else(|| ApiError::InvalidUrl(format!("'{}' must be an http(s) URL", base_url.trim())))?;

        Ok(Self {
            base_url,
            http: Client::builder().build()?,
            auth,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn auth_store(&self) -> &AuthStore {
        &self.auth
    }

    /// Absolute URL for an API path such as `/api/health`
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn records_url(&self, collection: &str) -> String {
        self.url(&format!(
            "/api/collections/{}/records",
            urlencoding::encode(collection)
        ))
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.records_url(collection), urlencoding::encode(id))
    }

    pub(crate) const fn http(&self) -> &Client {
        &self.http
    }

    /// Attach the session token, if any
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth.token() {
            Some(token) => request.header(AUTHORIZATION, token),
            None => request,
        }
    }

    /// Send an authorized request and decode a JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = check_status(self.authorize(request).send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        collection: &str,
        page: u32,
        options: &ListOptions,
    ) -> ApiResult<Vec<T>> {
        let mut query = vec![
            ("page", page.to_string()),
            ("perPage", FULL_LIST_BATCH.to_string()),
            ("skipTotal", "1".to_string()),
        ];
        query.extend(options.query_pairs());

        let request = self.http.get(self.records_url(collection)).query(&query);
        let page: ListPage<T> = self.send_json(request).await?;
        Ok(page.items)
    }
}

impl RecordApi for PocketBaseClient {
    async fn get_full_list<T: DeserializeOwned>(
        &self,
        collection: &str,
        options: &ListOptions,
    ) -> ApiResult<Vec<T>> {
        let items =
            collect_pages(move |page| self.get_list::<T>(collection, page, options)).await?;
        tracing::debug!("Fetched {} record(s) from {}", items.len(), collection);
        Ok(items)
    }

    async fn get_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        options: &ListOptions,
    ) -> ApiResult<T> {
        let request = self
            .http
            .get(self.record_url(collection, id))
            .query(&options.query_pairs());
        self.send_json(request).await
    }

    async fn create<T: DeserializeOwned>(
        &self,
        collection: &str,
        body: &serde_json::Value,
    ) -> ApiResult<T> {
        let request = self.http.post(self.records_url(collection)).json(body);
        self.send_json(request).await
    }

    async fn update<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        body: &serde_json::Value,
    ) -> ApiResult<T> {
        let request = self.http.patch(self.record_url(collection, id)).json(body);
        self.send_json(request).await
    }

    async fn delete(&self, collection: &str, id: &str) -> ApiResult<()> {
        let request = self.authorize(self.http.delete(self.record_url(collection, id)));
        check_status(request.send().await?).await?;
        Ok(())
    }

    fn file_url(&self, collection: &str, record_id: &str, filename: &str) -> String {
        file_url(&self.base_url, collection, record_id, filename)
    }
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_response(status.as_u16(), &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pocketbase::RemoteFavoriteRecord;
    use pretty_assertions::assert_eq;

    fn favorite(n: usize) -> RemoteFavoriteRecord {
        RemoteFavoriteRecord {
            id: format!("fav{n}"),
            user: "usr1".to_string(),
            bazaar: format!("baz{n}"),
            created: String::new(),
        }
    }

    #[test]
    fn list_page_decodes_items() {
        let body = r#"{"page":1,"perPage":500,"items":[
            {"id":"fav1","user":"usr1","bazaar":"baz1","created":"2025-03-01 10:00:00.000Z"}
        ]}"#;
        let page: ListPage<RemoteFavoriteRecord> = serde_json::from_str(body).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].bazaar, "baz1");
    }

    #[test]
    fn list_page_without_items_is_empty() {
        let page: ListPage<RemoteFavoriteRecord> =
            serde_json::from_str(r#"{"page":1,"perPage":500}"#).unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn full_list_stops_after_short_page() {
        let total = FULL_LIST_BATCH as usize * 2 + 3;
        let mut requested = Vec::new();

        let items = collect_pages(|page| {
            requested.push(page);
            let start = (page as usize - 1) * FULL_LIST_BATCH as usize;
            let end = (start + FULL_LIST_BATCH as usize).min(total);
            let batch: Vec<_> = (start..end).map(favorite).collect();
            async move { Ok(batch) }
        })
        .await
        .unwrap();

        assert_eq!(items.len(), total);
        assert_eq!(items[total - 1].id, format!("fav{}", total - 1));
        assert_eq!(requested, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn full_list_of_exact_batch_asks_for_one_more_page() {
        let mut requested = Vec::new();
        let items = collect_pages(|page| {
            requested.push(page);
            let batch: Vec<_> = if page == 1 {
                (0..FULL_LIST_BATCH as usize).map(favorite).collect()
            } else {
                Vec::new()
            };
            async move { Ok(batch) }
        })
        .await
        .unwrap();

        assert_eq!(items.len(), FULL_LIST_BATCH as usize);
        assert_eq!(requested, vec![1, 2]);
    }

    #[tokio::test]
    async fn full_list_propagates_page_errors() {
        let result: ApiResult<Vec<RemoteFavoriteRecord>> = collect_pages(|_| async {
            Err(ApiError::from_response(500, r#"{"message":"boom"}"#))
        })
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn new_rejects_non_http_urls() {
        assert!(matches!(
            PocketBaseClient::new("ftp://pb.test", AuthStore::new()),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(PocketBaseClient::new("   ", AuthStore::new()).is_err());
    }

    #[test]
    fn record_urls_are_built_from_normalized_base() {
        let client = PocketBaseClient::new("http://127.0.0.1:8090/", AuthStore::new()).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8090");
        assert_eq!(
            client.records_url("favorites"),
            "http://127.0.0.1:8090/api/collections/favorites/records"
        );
        assert_eq!(
            client.record_url("bazaars", "abc 1"),
            "http://127.0.0.1:8090/api/collections/bazaars/records/abc%201"
        );
        assert_eq!(
            client.file_url("pbc_1", "abc", "a.jpg"),
            "http://127.0.0.1:8090/api/files/pbc_1/abc/a.jpg"
        );
    }
}
