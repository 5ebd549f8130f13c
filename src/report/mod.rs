//! Report renderers for scored application collections.
//!
//! - [`terminal`] — colored summary box and per-tier tables; respects
//!   `--verbose` / `--quiet`.
//! - [`pdf`] — cover page with risk stat cards, then the ranked application
//!   table with reasons.

pub mod pdf;
pub mod terminal;
