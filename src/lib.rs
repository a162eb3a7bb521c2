//! Badevand MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing Danish beach water quality
//! data from badevand.dk as tools, with widget resources that render the
//! returned beaches in the host application.

pub mod beaches;
pub mod config;
pub mod error;
pub mod mcp;

pub use config::Config;
pub use error::{BadevandError, Result};
