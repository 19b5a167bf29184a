use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{PhotoSearch, VendorError};
use crate::config::ApiKey;

const PEXELS_SEARCH_URL: &str = "https://api.pexels.com/v1/search";

pub struct PexelsClient {
    client: reqwest::Client,
    api_key: ApiKey,
}

impl PexelsClient {
    pub fn new(api_key: ApiKey, timeout: Duration) -> Result<Self, VendorError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
        })
    }
}

fn search_url(query: &str, per_page: Option<u32>) -> Result<Url, VendorError> {
    let mut params = vec![("query", query.to_string())];
    if let Some(per_page) = per_page {
        params.push(("per_page", per_page.to_string()));
    }
    Url::parse_with_params(PEXELS_SEARCH_URL, &params)
        .map_err(|e| VendorError::InvalidResponse(format!("bad search url: {e}")))
}

#[async_trait]
impl PhotoSearch for PexelsClient {
    async fn search(&self, query: &str, per_page: Option<u32>) -> Result<Value, VendorError> {
        let url = search_url(query, per_page)?;

        debug!(query, ?per_page, "Searching photos");

        let api_key = HeaderValue::from_str(self.api_key.expose())
            .map_err(|e| VendorError::InvalidResponse(format!("invalid API key header: {e}")))?;

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VendorError::from_response(response).await);
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_query_and_page_size() {
        let url = search_url("red cat", Some(5)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.pexels.com/v1/search?query=red+cat&per_page=5"
        );
    }

    #[test]
    fn search_url_omits_missing_page_size() {
        let url = search_url("cat", None).unwrap();
        assert_eq!(url.query(), Some("query=cat"));
    }
}
