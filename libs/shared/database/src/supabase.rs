use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::store::{DocumentStore, Filter, StoreError};

/// PostgREST-backed document store. Each collection maps to a table under
/// `/rest/v1/<collection>`.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self, return_representation: bool) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|_| StoreError::Backend("Invalid service key".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|_| StoreError::Backend("Invalid service key".to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if return_representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        collection: &str,
        filter: &Filter,
        body: Option<Value>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/rest/v1/{}", self.base_url, collection);
        debug!("Making {} request to {}", method, url);

        let return_representation = method != Method::GET;
        let mut req = self
            .client
            .request(method, &url)
            .headers(self.get_headers(return_representation)?)
            .query(&filter.to_query());

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Supabase error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                409 => StoreError::Conflict(error_text),
                _ => StoreError::Backend(format!("API error ({}): {}", status, error_text)),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Fails fast when a row already matches one of `unique_on`. The table's
    /// unique index still decides races; its 409 surfaces as `Conflict`.
    async fn ensure_absent(
        &self,
        collection: &str,
        unique_on: &[Filter],
        except: Option<&Filter>,
    ) -> Result<(), StoreError> {
        for unique in unique_on {
            let rows: Vec<Value> = self.request(Method::GET, collection, unique, None).await?;
            if rows.iter().any(|row| except.map_or(true, |target| !target.matches(row))) {
                return Err(StoreError::Conflict(format!("{} already has a matching row", collection)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SupabaseClient {
    async fn insert(&self, collection: &str, document: Value) -> Result<Value, StoreError> {
        let created: Vec<Value> = self
            .request(Method::POST, collection, &Filter::new(), Some(document))
            .await?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("Insert into {} returned no rows", collection)))
    }

    async fn insert_unique(
        &self,
        collection: &str,
        document: Value,
        unique_on: &[Filter],
    ) -> Result<Value, StoreError> {
        self.ensure_absent(collection, unique_on, None).await?;
        self.insert(collection, document).await
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        self.request(Method::GET, collection, filter, None).await
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        if filter.is_empty() {
            return Err(StoreError::InvalidDocument("refusing unfiltered update".to_string()));
        }
        self.request(Method::PATCH, collection, filter, Some(patch)).await
    }

    async fn update_unique(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Value,
        unique_on: &[Filter],
    ) -> Result<Vec<Value>, StoreError> {
        self.ensure_absent(collection, unique_on, Some(filter)).await?;
        self.update(collection, filter, patch).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        if filter.is_empty() {
            return Err(StoreError::InvalidDocument("refusing unfiltered delete".to_string()));
        }
        let removed: Vec<Value> = self.request(Method::DELETE, collection, filter, None).await?;
        Ok(removed.len() as u64)
    }
}
