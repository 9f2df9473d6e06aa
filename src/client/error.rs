// ABOUTME: Error types for the native terminal client
// Covers setup failures only; session failures are rendered inline instead

use crate::bridge::EndpointError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No endpoint given; pass a URL or set client.url in the config file")]
    NoEndpoint,

    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),

    #[error("Terminal setup failed: {0}")]
    Terminal(std::io::Error),

    #[error("Signal handler setup failed: {0}")]
    Signal(std::io::Error),
}
