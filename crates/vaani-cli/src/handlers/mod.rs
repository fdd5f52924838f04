//! Command handlers.
//!
//! Handlers follow one pattern: turn CLI arguments into library types,
//! call into `vaani`, and format the outcome for the terminal. Narration
//! rules (budgets, fallback, degradation) live in the library, not here.

pub mod cache;
pub mod models;
pub mod say;
pub mod voices;
