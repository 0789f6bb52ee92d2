//! MCP server that lets LLMs manage GitHub Projects V2 boards.
//!
//! Provides tools for listing projects, reading fields and items, creating
//! issues and draft issues, updating item field values, and removing items.
//! Every tool is a thin wrapper over one or two GitHub GraphQL calls.

pub mod client;
pub mod error;
pub mod field_value;
pub mod models;
pub mod queries;
pub mod server;
