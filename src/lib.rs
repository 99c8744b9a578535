//! Todo AI API Library
//!
//! Owner-scoped todo management with language-model assisted prioritization
//! and task suggestions.

pub mod api;
pub mod domain;
pub mod infrastructure;
pub mod service;
