#![allow(dead_code)]
//! Preview exchange doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use qrflow_api::{ExchangeGrant, PreviewExchange};
use qrflow_core::ExchangeError;

/// Grants every token the same session.
#[derive(Debug, Clone)]
pub struct StaticExchange {
    pub session_id: String,
    pub campaign_id: String,
}

impl StaticExchange {
    pub fn granting(campaign_id: &str) -> Self {
        Self {
            session_id: "sess-preview-1".to_string(),
            campaign_id: campaign_id.to_string(),
        }
    }
}

#[async_trait]
impl PreviewExchange for StaticExchange {
    async fn exchange(&self, _token: &str) -> Result<ExchangeGrant, ExchangeError> {
        Ok(ExchangeGrant {
            session_id: self.session_id.clone(),
            campaign_id: self.campaign_id.clone(),
        })
    }
}

/// Rejects every token.
#[derive(Debug, Clone, Copy)]
pub struct RejectingExchange;

#[async_trait]
impl PreviewExchange for RejectingExchange {
    async fn exchange(&self, _token: &str) -> Result<ExchangeGrant, ExchangeError> {
        Err(ExchangeError::Rejected {
            status: 401,
            message: "invalid signature".to_string(),
        })
    }
}

/// Never answers within any reasonable timeout.
#[derive(Debug, Clone, Copy)]
pub struct StalledExchange;

#[async_trait]
impl PreviewExchange for StalledExchange {
    async fn exchange(&self, _token: &str) -> Result<ExchangeGrant, ExchangeError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Err(ExchangeError::TimedOut { secs: 60 })
    }
}

/// Wraps another exchange and counts calls.
#[derive(Clone)]
pub struct CountingExchange {
    inner: Arc<dyn PreviewExchange>,
    calls: Arc<AtomicUsize>,
}

impl CountingExchange {
    pub fn new(inner: impl PreviewExchange + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreviewExchange for CountingExchange {
    async fn exchange(&self, token: &str) -> Result<ExchangeGrant, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.exchange(token).await
    }
}
