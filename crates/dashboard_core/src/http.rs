use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Marketer, MarketerId, Region, Supplier, SupplierId},
    error::ApiError,
    protocol::{
        assign_marketer_route, marketers_route, regions_route, remove_marketer_route,
        suppliers_route, AssignMarketerRequest,
    },
};
use tracing::debug;
use url::Url;

use crate::{error::RemoteError, AssignmentBackend};

#[derive(Debug, Clone)]
pub struct HttpAssignmentBackend {
    http: Client,
    base_url: String,
}

impl HttpAssignmentBackend {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self> {
        let parsed = Url::parse(server_url.trim())
            .with_context(|| format!("invalid server url '{server_url}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("server url '{server_url}' must use http or https");
        }
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{route}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<T, RemoteError> {
        let url = self.endpoint(route);
        debug!(%url, "http: GET");
        let response = self.http.get(&url).send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| RemoteError::Decode(err.to_string()))
    }
}

fn transport_error(err: reqwest::Error) -> RemoteError {
    if err.is_decode() {
        RemoteError::Decode(err.to_string())
    } else {
        RemoteError::Transport(err.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_error) => (Some(api_error.code), api_error.message),
        Err(_) if body.trim().is_empty() => (
            None,
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        ),
        Err(_) => (None, body.trim().to_string()),
    };
    Err(RemoteError::Rejected {
        status: status.as_u16(),
        code,
        message,
    })
}

#[async_trait]
impl AssignmentBackend for HttpAssignmentBackend {
    async fn fetch_suppliers(&self) -> Result<Vec<Supplier>, RemoteError> {
        self.get_json(suppliers_route()).await
    }

    async fn fetch_marketers(&self) -> Result<Vec<Marketer>, RemoteError> {
        self.get_json(marketers_route()).await
    }

    async fn fetch_regions(&self) -> Result<Vec<Region>, RemoteError> {
        self.get_json(regions_route()).await
    }

    async fn assign_marketer(
        &self,
        supplier_id: SupplierId,
        marketer_id: MarketerId,
    ) -> Result<(), RemoteError> {
        let url = self.endpoint(assign_marketer_route());
        debug!(%url, supplier_id = supplier_id.0, marketer_id = marketer_id.0, "http: POST");
        let response = self
            .http
            .post(&url)
            .json(&AssignMarketerRequest {
                supplier_id,
                marketer_id,
            })
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn remove_marketer(&self, supplier_id: SupplierId) -> Result<(), RemoteError> {
        let url = self.endpoint(&remove_marketer_route(supplier_id));
        debug!(%url, supplier_id = supplier_id.0, "http: DELETE");
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
