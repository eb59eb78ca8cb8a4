//! PC configuration assistant.
//!
//! Talks to a set of automation webhooks that suggest and price PC parts,
//! normalizes their loosely shaped answers, and keeps a local record of
//! searches in flight and completed requests.

pub mod catalog;
pub mod config;
pub mod error;
pub mod history;
pub mod normalize;
pub mod services;
pub mod storage;
pub mod tracker;
pub mod webhook;
