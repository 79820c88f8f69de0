//! Application orchestration — state management, event loop, background
//! fetches and input handling.

pub mod event;
pub mod fetch_runtime;
pub mod handler;
pub mod state;
