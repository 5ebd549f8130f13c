//! Rule-based, explainable risk scoring.
//!
//! - [`rules`] — the ordered rule chain and the sensitive-permission weight
//!   table; each rule maps an [`AppInfo`](crate::models::AppInfo) to zero or
//!   more weighted contributions.
//! - [`engine`] — folds the chain into a clamped 0–100 score, a
//!   [`RiskLevel`](crate::models::RiskLevel), and the ordered reason list.

pub mod engine;
pub mod rules;
