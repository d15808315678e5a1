//! Rust SDK for todo-mcp
//!
//! # HTTP Client (default feature)
//!
//! Call the server's tools and follow channel messages pushed over its
//! event stream:
//!
//! ```rust,no_run
//! use todo_mcp_sdk::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("http://localhost:3001")?;
//!
//!     // Replace the whole list on every snapshot
//!     let subscription = client
//!         .subscribe_todos(|todos| {
//!             for todo in todos {
//!                 println!("[{}] {}", if todo.completed { "x" } else { " " }, todo.title);
//!             }
//!         })
//!         .await?;
//!
//!     client.tools().add_todo("Buy milk").await?;
//!     client.tools().update_todo(1, true).await?;
//!
//!     subscription.close();
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod types;

#[cfg(feature = "http-client")]
pub mod client;

// Re-exports
pub use error::Error;
pub use types::*;

#[cfg(feature = "http-client")]
pub use client::{Client, EventStream, Subscription};
