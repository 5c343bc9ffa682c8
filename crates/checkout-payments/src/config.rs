//! Processor Configuration

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::account::{AccountService, DEFAULT_TIMEOUT};
use crate::error::{PaymentError, Result};
use crate::processor::{MemoryProcessor, PaymentProcessor, StripeProcessor};

/// Which processor backs the account service
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProcessorKind {
    #[default]
    Stripe,
    /// In-memory processor, nothing leaves the process
    Memory,
}

impl FromStr for ProcessorKind {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "stripe" => Ok(Self::Stripe),
            "memory" => Ok(Self::Memory),
            other => Err(PaymentError::Config(format!("Unknown payment processor: {other}"))),
        }
    }
}

/// Processor configuration
#[derive(Clone, Debug)]
pub struct ProcessorConfig {
    pub kind: ProcessorKind,

    /// Required for `ProcessorKind::Stripe`
    pub stripe_secret_key: Option<String>,

    /// Bound on each processor call
    pub timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            kind: ProcessorKind::default(),
            stripe_secret_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ProcessorConfig {
    /// Read `PAYMENT_PROCESSOR`, `STRIPE_SECRET_KEY` and `UPSTREAM_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let kind: ProcessorKind = std::env::var("PAYMENT_PROCESSOR")
            .unwrap_or_default()
            .parse()?;
        let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let timeout = parse_timeout(std::env::var("UPSTREAM_TIMEOUT_SECS").ok().as_deref());

        Ok(Self {
            kind,
            stripe_secret_key,
            timeout,
        })
    }

    /// Build the processor this configuration names
    pub fn processor(&self) -> Result<Arc<dyn PaymentProcessor>> {
        match self.kind {
            ProcessorKind::Stripe => {
                let key = self
                    .stripe_secret_key
                    .as_deref()
                    .ok_or_else(|| PaymentError::Config("STRIPE_SECRET_KEY not set".into()))?;
                Ok(Arc::new(StripeProcessor::new(key)))
            }
            ProcessorKind::Memory => Ok(Arc::new(MemoryProcessor::new())),
        }
    }

    /// Build the account service on top of the configured processor
    pub fn account_service(&self) -> Result<AccountService> {
        Ok(AccountService::new(self.processor()?).with_timeout(self.timeout))
    }
}

/// Whole seconds; zero, negative or unparsable values fall back to the default
fn parse_timeout(value: Option<&str>) -> Duration {
    value
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or(DEFAULT_TIMEOUT, Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_kind_parsing() {
        assert_eq!("".parse::<ProcessorKind>().unwrap(), ProcessorKind::Stripe);
        assert_eq!(" Memory ".parse::<ProcessorKind>().unwrap(), ProcessorKind::Memory);
        assert!(matches!(
            "paypal".parse::<ProcessorKind>(),
            Err(PaymentError::Config(_))
        ));
    }

    #[test]
    fn test_timeout_parsing() {
        assert_eq!(parse_timeout(Some("30")), Duration::from_secs(30));
        assert_eq!(parse_timeout(Some("0")), DEFAULT_TIMEOUT);
        assert_eq!(parse_timeout(Some("-5")), DEFAULT_TIMEOUT);
        assert_eq!(parse_timeout(Some("soon")), DEFAULT_TIMEOUT);
        assert_eq!(parse_timeout(None), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_stripe_requires_key() {
        let config = ProcessorConfig::default();
        assert!(matches!(config.account_service(), Err(PaymentError::Config(_))));

        let config = ProcessorConfig {
            stripe_secret_key: Some("sk_test_xxx".into()),
            ..Default::default()
        };
        assert_eq!(config.account_service().unwrap().processor_name(), "stripe");
    }

    #[test]
    fn test_memory_needs_no_key() {
        let config = ProcessorConfig {
            kind: ProcessorKind::Memory,
            ..Default::default()
        };
        assert_eq!(config.account_service().unwrap().processor_name(), "memory");
    }
}
