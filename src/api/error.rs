//! Errors raised at the fetch / export boundary.
//!
//! None of these reach the draw loop: the app turns them into toasts.

use thiserror::Error;

use crate::core::tree::TreeError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("stats payload is not valid JSON: {0}")]
    Stats(#[source] serde_json::Error),

    #[error("export did not return a PNG image")]
    NotPng,

    #[error("could not encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("could not read or write file: {0}")]
    Io(#[from] std::io::Error),
}
