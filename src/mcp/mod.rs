//! MCP (Model Context Protocol) module
//!
//! Implements the MCP server protocol for tool invocation and widget
//! resources, over stdio or HTTP with server-sent events.

pub mod http;
pub mod server;
pub mod tools;
pub mod types;
pub mod widgets;
