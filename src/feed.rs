// Copyright (c) 2025 Ledgerclip Maintainers.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SimpleFIN-style bank aggregation collaborator. The scheduler only talks to
//! the `FeedClient` trait; the blocking reqwest implementation below is the
//! one real client, tests substitute their own.

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use crate::errors::LedgerError;
use crate::utils::http_client;

#[derive(Debug, Clone, Deserialize)]
pub struct FeedTransaction {
    pub id: String,
    /// Settlement time, epoch seconds. Pending entries may not carry one.
    pub posted: Option<i64>,
    pub transacted_at: Option<i64>,
    /// Signed decimal string as the feed sends it.
    pub amount: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedAccount {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub transactions: Vec<FeedTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedWindow {
    #[serde(default)]
    pub accounts: Vec<FeedAccount>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// One windowed request against the feed. `[start, end)` epoch seconds.
pub trait FeedClient {
    fn fetch_window(&self, access_url: &str, start: i64, end: i64)
    -> Result<FeedWindow, LedgerError>;
}

pub struct SimplefinFeed;

impl SimplefinFeed {
    /// Exchange a one-time setup token for the long-lived access URL. The
    /// token is the base64 of a claim URL; claiming is a bare POST to it.
    pub fn claim(&self, setup_token: &str) -> Result<String, LedgerError> {
        let claim_url = decode_setup_token(setup_token)?;
        let client = http_client().map_err(|e| LedgerError::Upstream(e.to_string()))?;
        let resp = client
            .post(&claim_url)
            .send()
            .map_err(|e| LedgerError::Upstream(format!("claim request failed: {}", e)))?;
        if !resp.status().is_success() {
            return Err(LedgerError::Auth(format!(
                "claim rejected with status {}",
                resp.status()
            )));
        }
        let access_url = resp
            .text()
            .map_err(|e| LedgerError::Upstream(format!("claim response unreadable: {}", e)))?;
        let access_url = access_url.trim().to_string();
        if access_url.is_empty() {
            return Err(LedgerError::Auth("claim returned an empty access URL".into()));
        }
        Ok(access_url)
    }
}

impl FeedClient for SimplefinFeed {
    fn fetch_window(
        &self,
        access_url: &str,
        start: i64,
        end: i64,
    ) -> Result<FeedWindow, LedgerError> {
        let client = http_client().map_err(|e| LedgerError::Upstream(e.to_string()))?;
        let url = format!(
            "{}/accounts?start-date={}&end-date={}&pending=1",
            access_url.trim_end_matches('/'),
            start,
            end
        );
        let resp = client
            .get(&url)
            .send()
            .map_err(|e| LedgerError::Upstream(format!("feed request failed: {}", e)))?;
        if resp.status() == reqwest::StatusCode::FORBIDDEN
            || resp.status() == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(LedgerError::Auth(format!(
                "feed rejected credentials with status {}",
                resp.status()
            )));
        }
        if !resp.status().is_success() {
            return Err(LedgerError::Upstream(format!(
                "feed returned status {}",
                resp.status()
            )));
        }
        resp.json::<FeedWindow>()
            .map_err(|e| LedgerError::Upstream(format!("feed response unparsable: {}", e)))
    }
}

fn decode_setup_token(token: &str) -> Result<String, LedgerError> {
    let bytes = STANDARD
        .decode(token.trim())
        .map_err(|_| LedgerError::Auth("malformed setup token (not base64)".into()))?;
    let url = String::from_utf8(bytes)
        .map_err(|_| LedgerError::Auth("malformed setup token (not UTF-8)".into()))?;
    if !url.starts_with("http") {
        return Err(LedgerError::Auth("malformed setup token (not a URL)".into()));
    }
    Ok(url)
}
