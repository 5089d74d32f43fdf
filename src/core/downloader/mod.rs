pub mod client;

pub use client::{next_chunk, Downloader};
