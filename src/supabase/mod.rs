//!
//! tubelink Supabase integration
//! -----------------------------
//! Implementations of the identity and store seams against a Supabase-style
//! deployment: GoTrue (`/auth/v1`) for sessions and PostgREST (`/rest/v1`) for
//! bookmark rows. Requests always carry the public `apikey`; data requests
//! also carry the user's access token so the provider's row-level policies
//! apply on top of the explicit `user_id` filter.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};

use crate::config::Config;

mod auth;
mod rest;
pub mod session_cookie;

pub use auth::{GoTrueAuthProvider, EXPIRY_MARGIN_SECS};
pub use rest::PostgrestBookmarkStore;

/// Base URL + public key + shared HTTP client for one provider project.
#[derive(Clone)]
pub struct ProviderEndpoint {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl ProviderEndpoint {
    pub fn new(client: Client, base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url, anon_key: anon_key.into() }
    }

    /// Endpoint for the configured project with a client bounded by the configured timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("tubelink/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building provider HTTP client")?;
        Ok(Self::new(client, config.supabase_url.clone(), config.supabase_anon_key.clone()))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).header("apikey", &self.anon_key)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).header("apikey", &self.anon_key)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).header("apikey", &self.anon_key)
    }
}
