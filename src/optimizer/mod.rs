//! Inexact Gauss-Newton optimization.
//!
//! The outer step solves the damped normal equations with a truncated
//! conjugate-gradient inner solve and a backtracking line search.

pub mod cg;
pub mod gauss_newton;

pub use cg::CgSolution;
pub use gauss_newton::{GnStep, InexactGaussNewton};
