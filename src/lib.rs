//! Visionary AI - turn text prompts into images and variations of them
//!
//! Wraps Gemini's image-capable `generateContent` endpoint behind two typed
//! flows, drives them from an explicit session state machine, and ships a
//! small motivational quote picker alongside.

pub mod ai;
pub mod app;
pub mod data_uri;
pub mod error;
pub mod models;
pub mod prompts;
pub mod quotes;
pub mod session;
pub mod view;

pub use error::{Error, Result};
