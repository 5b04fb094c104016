//! Compliance Assist — compliance-check orchestration service.

pub mod analysis;
pub mod auth;
pub mod compliance;
pub mod config;
pub mod directory;
pub mod error;
pub mod llm;
pub mod mail;
pub mod web;
