//! Outbound HTTP layer with retry and exponential backoff.
//!
//! This module provides:
//! - Value types for requests and responses ([`HttpRequest`], [`HttpResponse`])
//! - A client abstraction ([`HttpClient`]) with a reqwest implementation ([`ReqwestClient`])
//! - A classifier-driven backoff loop ([`retry_with_backoff`], [`RetryPolicy`])
//! - The resilient request executor ([`RequestExecutor`], [`ApiRequest`])

mod client;
mod error;
mod executor;
mod http;
mod retry;

#[cfg(test)]
mod executor_tests;

pub use client::ReqwestClient;
pub use error::{AttemptError, FetchError, HttpError};
pub use executor::{ApiRequest, RequestExecutor, classify};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use retry::{RetryError, RetryPolicy, Verdict, retry_with_backoff};
