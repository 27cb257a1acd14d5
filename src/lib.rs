//! Trainer Pro: client roster, workout log, rest timer and AI coaching for personal trainers.

pub mod audio;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod gemini;
pub mod id;
pub mod models;
pub mod state;
pub mod storage;
pub mod timer;
pub mod ui;

pub use error::{Error, Result};
