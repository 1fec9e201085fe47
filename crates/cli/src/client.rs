// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin HTTP client for the Controller's admin-facing endpoints: flags,
//! backend status, and JobRequest status/cancel. Mirrors the Agent's
//! `HttpTaskApiClient`: one `reqwest::Client`, bearer-token auth, one method
//! per endpoint.

use rap_core::{BackendFlag, FlagKey, Job};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SetFlagBody<'a> {
    backend: &'a str,
    key: FlagKey,
    value: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendStatus {
    pub flags: Vec<BackendFlag>,
    pub executing: u32,
    pub executing_db_workers: u32,
}

#[derive(Debug, Serialize)]
struct CancelBody<'a> {
    job_request_id: &'a str,
    action_name: &'a str,
}

pub struct ControllerClient {
    http: Client,
    base_url: String,
    token: String,
}

impl ControllerClient {
    pub fn new(config: &Config) -> Result<Self, CliError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.controller_base_url.clone(),
            token: config.token.clone(),
        })
    }

    pub async fn set_flag(&self, backend: &str, key: FlagKey, value: &str) -> Result<(), CliError> {
        let url = format!("{}/backend/flag/", self.base_url);
        let body = SetFlagBody { backend, key, value };
        self.post(&url, &body).await
    }

    pub async fn backend_status(&self, backend: &str) -> Result<BackendStatus, CliError> {
        let url = format!("{}/backend/status/", self.base_url);
        self.get(&url, &[("backend", backend)]).await
    }

    pub async fn job_request_status(&self, job_request_id: &str) -> Result<Vec<Job>, CliError> {
        let url = format!("{}/rap/status/", self.base_url);
        self.get(&url, &[("job_request_id", job_request_id)]).await
    }

    pub async fn cancel_action(&self, job_request_id: &str, action_name: &str) -> Result<(), CliError> {
        let url = format!("{}/rap/cancel/", self.base_url);
        let body = CancelBody {
            job_request_id,
            action_name,
        };
        self.post(&url, &body).await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CliError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<(), CliError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CliError::UnexpectedStatus { status, body });
        }
        Ok(())
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, CliError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CliError::UnexpectedStatus { status, body });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
