//! Core engine - framework-agnostic matching, deal synthesis and persistence.

pub mod access;
pub mod client;
pub mod deal;
pub mod fallback;
pub mod fixtures;
pub mod normalize;
pub mod product;
pub mod ranking;
pub mod requirement;
pub mod scoring;
pub mod stage;
pub mod supplier;
pub mod synthesis;

mod store;
