//! Weixin article publisher.
//!
//! Publishes rendered articles to a Weixin official account, falling back to
//! a manual hand-off (archived HTML plus instructions) when the account cannot
//! publish through the API.

pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod publish;
pub mod store;
pub mod weixin;
