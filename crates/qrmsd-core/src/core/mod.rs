//! # Core Module
//!
//! Stateless numerical building blocks for the optimal-superposition RMSD
//! calculation.
//!
//! ## Overview
//!
//! Everything in this module is a pure function of its arguments and operates
//! on fixed-size `nalgebra` types; no allocation, no configuration, no state.
//! The [`engine`](crate::engine) layer composes these primitives into the
//! actual restraint evaluation.
//!
//! - **Eigendecomposition** ([`eigen`]) - Jacobi eigensolver for 4x4 real
//!   symmetric matrices, self-contained so that the crate needs no external
//!   numerical library for a fixed-size problem
//! - **Superposition Algebra** ([`superposition`]) - The Coutsias et al.
//!   correlation matrix, the derived 4x4 quaternion matrix, and the standard
//!   quaternion-to-rotation-matrix formula

pub mod eigen;
pub mod superposition;
