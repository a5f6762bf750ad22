//! HTTP client module for gateway checks

mod client;

pub use client::{BasicAuth, HttpClient, HttpError, HttpResponse};
