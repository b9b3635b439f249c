pub mod client;
pub mod download;

pub use client::{Remote, UpdaterClient};
pub use download::download_to_path;
