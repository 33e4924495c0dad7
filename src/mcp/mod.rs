// MCP transport adapter
//
// Exposes the current registry snapshot as MCP tools over a stdio session.

mod handler;

pub use handler::{dispatch_call, ToolServer};
