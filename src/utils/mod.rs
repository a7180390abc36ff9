//! Shared numerical utilities.

pub mod finite_difference;
