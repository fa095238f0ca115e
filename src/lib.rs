//! Single test point judging harness.
//!
//! A program is loaded into a [`Runtime`](crate::core::traits::runtime::Runtime),
//! fed one input case and watched until it finishes or breaches its time or
//! memory limit. Every request yields exactly one [`Verdict`](crate::core::domain::Verdict).

pub mod config;
pub mod constants;
pub mod core;
pub mod native;
pub mod report;
pub mod stubs;
