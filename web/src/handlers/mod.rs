//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by concern.

pub mod health;
pub mod todos;
