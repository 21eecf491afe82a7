//! Nova Journal - ordered record of navigation and lifecycle events.
//!
//! # Modules
//!
//! - [`journal`]: Navigation journal that records every lifecycle edge,
//!   push, pop, presentation and fade with the frame it happened on.

#![deny(unsafe_code)]

pub mod journal;
