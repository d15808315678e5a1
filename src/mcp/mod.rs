//! Model Context Protocol (MCP) server side.
//!
//! JSON-RPC 2.0 envelopes ([`types`]), declarative parameter schemas
//! ([`schema`]), the tool table ([`registry`]) and the method router
//! ([`dispatcher`]). Transports live in [`crate::server`].
//!
//! # Methods
//!
//! | method                      | result                                   |
//! |-----------------------------|------------------------------------------|
//! | `initialize`                | protocol version, capabilities, server   |
//! | `notifications/initialized` | none (notification)                      |
//! | `ping`                      | `{}`                                     |
//! | `tools/list`                | `{ "tools": [...] }`                     |
//! | `tools/call`                | `{ "content": [...], "isError": bool }`  |

pub mod dispatcher;
pub mod registry;
pub mod schema;
pub mod types;

pub use dispatcher::Dispatcher;
pub use registry::{ToolDefinition, ToolHandler, ToolRegistry};
