//! Backend access — the REST endpoints serving the referral tree, its summary
//! stats and the PNG export.
//!
//! The backend is an external collaborator: this module only fetches, decodes
//! and saves.  All failures come back as [`ApiError`] for the UI to report.

pub mod client;
pub mod error;
pub mod export;
