//! Shared library modules for the birdymarket watcher.
//!
//! Re-exports the modules the standalone desks (`tracker`, `betdesk`,
//! `resolve`, `withdraw`) need without duplicating code from the watcher
//! binary.

pub mod catalog;
pub mod config;
pub mod contract;
pub mod feed;
pub mod onchain;
pub mod view;
