// mcpd - declared external commands served as tools over MCP and HTTP.

pub mod config;
pub mod executor;
pub mod mcp;
pub mod registry;
pub mod schema;
pub mod server;
pub mod watcher;
