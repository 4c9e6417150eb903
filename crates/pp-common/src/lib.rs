//! Shared utilities for ProductPulse services.

pub mod logging;
