// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use addressfinder_app::{
    AddressRecord, AddressService, LookupQuery, LookupRow, RetrieveQuery, ServiceError,
    WidgetConfig,
};
use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://ws.postcoder.com/pcw";

/// Blocking HTTP implementation of [`AddressService`].
#[derive(Debug, Clone)]
pub struct Client {
    find_url: Url,
    retrieve_url: Url,
    api_key: String,
    identifier: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(
        base_url: &str,
        api_key: &str,
        identifier: &str,
        find_endpoint: &str,
        retrieve_endpoint: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            bail!("service.base_url must not be empty");
        }
        if api_key.trim().is_empty() {
            bail!("api key must not be empty");
        }

        let find_url = endpoint_url(base_url, find_endpoint)?;
        let retrieve_url = endpoint_url(base_url, retrieve_endpoint)?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            find_url,
            retrieve_url,
            api_key: api_key.to_owned(),
            identifier: identifier.to_owned(),
            timeout,
            http,
        })
    }

    pub fn from_config(base_url: &str, config: &WidgetConfig, timeout: Duration) -> Result<Self> {
        Self::new(
            base_url,
            &config.api_key,
            &config.identifier,
            &config.find_endpoint,
            &config.retrieve_endpoint,
            timeout,
        )
    }

    pub fn find_url(&self) -> &Url {
        &self.find_url
    }

    pub fn retrieve_url(&self) -> &Url {
        &self.retrieve_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lookup_url(&self, query: &LookupQuery) -> Url {
        let mut url = self.find_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("apikey", &self.api_key)
                .append_pair("Country", &query.country)
                .append_pair("identifier", &self.identifier)
                .append_pair("query", &query.query);
            if let Some(path_filter) = query.path_filter.as_deref() {
                pairs.append_pair("PathFilter", path_filter);
            }
        }
        url
    }

    fn address_url(&self, query: &RetrieveQuery) -> Url {
        let mut url = self.retrieve_url.clone();
        url.query_pairs_mut()
            .append_pair("apikey", &self.api_key)
            .append_pair("Country", &query.country)
            .append_pair("query", &query.query)
            .append_pair("id", &query.id)
            .append_pair("lines", &query.lines.to_string())
            .append_pair("exclude", &query.exclude)
            .append_pair("identifier", &self.identifier);
        url
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url, endpoint: &Url) -> Result<T, ServiceError> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(endpoint, error))?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        decode(response)
    }
}

impl AddressService for Client {
    fn find(&self, query: &LookupQuery) -> Result<Vec<LookupRow>, ServiceError> {
        debug!(
            query = query.query.as_str(),
            path_filter = query.path_filter.as_deref().unwrap_or_default(),
            "address lookup"
        );
        let rows: Vec<LookupRow> = self.get_json(self.lookup_url(query), &self.find_url)?;
        debug!(rows = rows.len(), "address lookup complete");
        Ok(rows)
    }

    fn retrieve(&self, query: &RetrieveQuery) -> Result<Vec<AddressRecord>, ServiceError> {
        debug!(id = query.id.as_str(), "address retrieval");
        self.get_json(self.address_url(query), &self.retrieve_url)
    }
}

fn endpoint_url(base_url: &str, endpoint: &str) -> Result<Url> {
    let endpoint = endpoint.trim_matches('/');
    if endpoint.is_empty() {
        bail!("endpoint must not be empty");
    }
    let raw = format!("{base_url}/{endpoint}");
    let url = Url::parse(&raw).with_context(|| format!("parse endpoint URL {raw:?}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("endpoint URL {raw:?} must use http or https");
    }
    Ok(url)
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    response
        .json()
        .map_err(|error| ServiceError::Api(format!("decode response: {}", error.without_url())))
}

// The request URL carries the api key, so it is stripped from transport errors.
fn connection_error(endpoint: &Url, error: reqwest::Error) -> ServiceError {
    ServiceError::Connection {
        endpoint: endpoint.to_string(),
        detail: error.without_url().to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default, alias = "Message", alias = "error")]
    message: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> ServiceError {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return ServiceError::Api(format!("server error ({}): {message}", status.as_u16()));
    }

    let body = body.trim();
    if !body.is_empty() && body.len() < 100 && !body.contains('{') {
        return ServiceError::Api(format!("server error ({}): {body}", status.as_u16()));
    }

    ServiceError::Api(format!("server returned {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::{Client, clean_error_response, endpoint_url};
    use addressfinder_app::{LookupQuery, RetrieveQuery, ServiceError};
    use anyhow::Result;
    use reqwest::StatusCode;
    use std::time::Duration;

    fn client() -> Result<Client> {
        Client::new(
            "https://ws.example.test/pcw/",
            "KEY-1",
            "Autocomplete Address Finder",
            "autocomplete/find",
            "/autocomplete/retrieve/",
            Duration::from_secs(1),
        )
    }

    #[test]
    fn endpoints_join_base_url() -> Result<()> {
        let client = client()?;
        assert_eq!(
            client.find_url().as_str(),
            "https://ws.example.test/pcw/autocomplete/find"
        );
        assert_eq!(
            client.retrieve_url().as_str(),
            "https://ws.example.test/pcw/autocomplete/retrieve"
        );
        Ok(())
    }

    #[test]
    fn lookup_url_encodes_query_and_filter() -> Result<()> {
        let url = client()?.lookup_url(&LookupQuery {
            country: "GB".to_owned(),
            query: "10 high st & co".to_owned(),
            path_filter: Some("L1/2".to_owned()),
        });
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("apikey".to_owned(), "KEY-1".to_owned()),
                ("Country".to_owned(), "GB".to_owned()),
                ("identifier".to_owned(), "Autocomplete Address Finder".to_owned()),
                ("query".to_owned(), "10 high st & co".to_owned()),
                ("PathFilter".to_owned(), "L1/2".to_owned()),
            ]
        );
        Ok(())
    }

    #[test]
    fn address_url_carries_lines_and_exclusions() -> Result<()> {
        let url = client()?.address_url(&RetrieveQuery {
            country: "GB".to_owned(),
            query: "leeds".to_owned(),
            id: "A1".to_owned(),
            lines: 3,
            exclude: "organisation".to_owned(),
        });
        let query = url.query().unwrap_or_default();
        assert!(query.contains("id=A1"));
        assert!(query.contains("lines=3"));
        assert!(query.contains("exclude=organisation"));
        Ok(())
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert!(endpoint_url("ftp://example.test", "find").is_err());
        assert!(endpoint_url("https://example.test", "/").is_err());
    }

    #[test]
    fn error_body_is_summarized() {
        assert_eq!(
            clean_error_response(StatusCode::FORBIDDEN, r#"{"message":"invalid api key"}"#),
            ServiceError::Api("server error (403): invalid api key".to_owned())
        );
        assert_eq!(
            clean_error_response(StatusCode::BAD_GATEWAY, "upstream down"),
            ServiceError::Api("server error (502): upstream down".to_owned())
        );
        assert_eq!(
            clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, "<html>{}</html>"),
            ServiceError::Api("server returned 500".to_owned())
        );
    }
}
