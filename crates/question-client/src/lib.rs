mod client;

pub use interview_types as types;
pub use client::config::{Config, ConfigBuilder};
pub use client::error::ClientError;
pub use client::{Client, client, client_with_config};
