//! Error types for the Badevand MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Main error type for the Badevand MCP Server
#[derive(Error, Debug)]
pub enum BadevandError {
    /// Upstream beach API errors
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Upstream beach API errors
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Network failure, timeout or non-success HTTP status
    #[error("Beach data unavailable: {message}")]
    Unavailable { message: String },

    /// The response could not be parsed into beach records
    #[error("Malformed beach data: {message}")]
    Malformed { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Widget assets directory not found: {path}")]
    AssetsDirNotFound { path: String },

    #[error("Widget HTML for \"{component}\" not found in {path}")]
    WidgetAssetMissing { component: String, path: String },

    #[error("Failed to load fixture {path}: {message}")]
    FixtureLoadFailed { path: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid argument '{field}': {constraint}")]
    InvalidArguments { field: String, constraint: String },

    #[error("Unknown resource: {uri}")]
    UnknownResource { uri: String },

    #[error("Protocol error: {message}")]
    ProtocolError { message: String },
}

impl McpError {
    pub fn invalid_argument(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        McpError::InvalidArguments {
            field: field.into(),
            constraint: constraint.into(),
        }
    }
}

/// Result type alias for Badevand MCP operations
pub type Result<T> = std::result::Result<T, BadevandError>;
