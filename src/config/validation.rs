//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Returns every problem found,
//! not just the first, so an operator can fix a config file in one pass.

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;
use crate::load_balancer::{BackendTarget, TargetError};

/// A single semantic problem in a [`ProxyConfig`].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("no listener enabled (forward.enabled and reverse.enabled are both false)")]
    NoListenerEnabled,

    #[error("{field}: invalid bind address {value:?}")]
    InvalidBindAddress { field: &'static str, value: String },

    #[error("forward and reverse listeners share bind address {0}")]
    DuplicateBindAddress(String),

    #[error("reverse.targets must contain at least one backend")]
    EmptyTargets,

    #[error("reverse.targets[{index}]: {source}")]
    InvalidTarget {
        index: usize,
        #[source]
        source: TargetError,
    },

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.forward.enabled && !config.reverse.enabled {
        errors.push(ValidationError::NoListenerEnabled);
    }

    let forward_addr = config
        .forward
        .enabled
        .then(|| {
            check_bind_address("forward.bind_address", &config.forward.bind_address, &mut errors)
        })
        .flatten();
    let reverse_addr = config
        .reverse
        .enabled
        .then(|| {
            check_bind_address("reverse.bind_address", &config.reverse.bind_address, &mut errors)
        })
        .flatten();

    if let (Some(forward), Some(reverse)) = (forward_addr, reverse_addr) {
        if forward == reverse && forward.port() != 0 {
            errors.push(ValidationError::DuplicateBindAddress(forward.to_string()));
        }
    }

    if config.reverse.enabled {
        if config.reverse.targets.is_empty() {
            errors.push(ValidationError::EmptyTargets);
        }
        for (index, target) in config.reverse.targets.iter().enumerate() {
            if let Err(source) = BackendTarget::parse(target) {
                errors.push(ValidationError::InvalidTarget { index, source });
            }
        }
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("request_secs", timeouts.request_secs),
        ("idle_secs", timeouts.idle_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_bind_address(
    field: &'static str,
    value: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<SocketAddr> {
    match value.parse() {
        Ok(addr) => Some(addr),
        Err(_) => {
            errors.push(ValidationError::InvalidBindAddress {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}
