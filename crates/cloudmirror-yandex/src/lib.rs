//! # cloudmirror-yandex
//!
//! [`RemoteStore`](cloudmirror_core::RemoteStore) implementation for Yandex
//! Disk over its REST API, using a blocking HTTP client.

#![warn(clippy::all)]

mod client;
mod types;

pub use client::{DEFAULT_API_URL, YandexDiskClient, error_for_status};
