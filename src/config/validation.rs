//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and the public origin
//! - Validate value ranges (timeouts > 0, body limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ShimConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ShimConfig;
use crate::origin::normalize_origin;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("storefront.store_domain must not be empty")]
    MissingStoreDomain,

    #[error("storefront.api_version must not be empty")]
    MissingApiVersion,

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("listener.public_origin is not a valid origin: {0}")]
    InvalidPublicOrigin(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ShimConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.storefront.store_domain.trim().is_empty() {
        errors.push(ValidationError::MissingStoreDomain);
    }
    if config.storefront.api_version.trim().is_empty() {
        errors.push(ValidationError::MissingApiVersion);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if let Some(origin) = &config.listener.public_origin {
        if normalize_origin(origin).is_err() {
            errors.push(ValidationError::InvalidPublicOrigin(origin.clone()));
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.storefront.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("storefront.request_timeout_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ShimConfig {
        let mut config = ShimConfig::default();
        config.storefront.store_domain = "demo.myshopify.com".into();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn test_default_config_needs_store_domain() {
        let errors = validate_config(&ShimConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingStoreDomain]);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.listener.bind_address = "not-an-address".into();
        config.listener.public_origin = Some("https://www.example.com/shop".into());
        config.security.max_body_size = 0;
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::Zero("security.max_body_size")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidPublicOrigin(_))));
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = valid_config();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors[0].to_string(),
            "observability.metrics_address is not a valid socket address: nope"
        );
    }
}
