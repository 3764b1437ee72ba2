//! Utility modules: per-attempt timeout, HTML sanitizing.

pub mod html;
pub mod timeout;
