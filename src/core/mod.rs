//! # Core Application Logic
//!
//! This module contains docchat's business logic.
//! It knows nothing about the terminal or about HTTP.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • format (markdown)    │
//!                    │  • validate (uploads)   │
//!                    │  • State + Action       │
//!                    │  • update() (reducer)   │
//!                    └───────────┬─────────────┘
//!                                │
//!                   ┌────────────┴────────────┐
//!                   ▼                         ▼
//!            ┌────────────┐            ┌────────────┐
//!            │    REPL    │            │    API     │
//!            │  Adapter   │            │  (HTTP)    │
//!            └────────────┘            └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`format`]: markdown subset → HTML fragment, as an ordered pass pipeline
//! - [`validate`]: upload candidate checks against an `UploadPolicy`
//! - [`session`]: chat sessions and the store that owns them
//! - [`state`]: the `App` struct, all application state in one place
//! - [`action`]: the `Action` enum and `update()`
//! - [`config`]: TOML config and override resolution
//! - [`export`]: HTML transcript of a session

pub mod action;
pub mod config;
pub mod export;
pub mod format;
pub mod session;
pub mod state;
pub mod validate;
