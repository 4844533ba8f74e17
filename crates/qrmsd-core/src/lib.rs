//! # qRMSD Core Library
//!
//! A library for restraining a dynamical simulation toward a target conformation:
//! it computes the minimum root-mean-square deviation (RMSD) between the current
//! positions of a selected particle subset and a fixed reference structure,
//! together with the analytic gradient of that RMSD expressed as per-particle
//! forces.
//!
//! The optimal superposition is found in closed form with the quaternion-based
//! algorithm of Coutsias, Seok and Dill, "Using quaternions to calculate RMSD"
//! (doi: 10.1002/jcc.20110): no iterative alignment, one constant-size symmetric
//! eigendecomposition per evaluation.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers with a strict dependency direction:
//!
//! - **[`core`]: The Foundation.** Stateless numerical building blocks — the
//!   self-contained 4x4 symmetric eigensolver and the superposition algebra
//!   (correlation matrix, quaternion matrix, quaternion-to-rotation).
//!
//! - **[`engine`]: The Logic Core.** The stateful layer consumed by a host
//!   simulation engine: the user-level restraint definition ([`engine::force`]),
//!   the validated and centered reference state ([`engine::reference`]), and the
//!   per-step evaluator ([`engine::evaluator`]) that turns a position array into
//!   an energy and a force array.
//!
//! The host engine's plugin lifecycle (registration, serialization, scheduling,
//! multi-context management) and its system representation are deliberately out
//! of scope; the engine layer receives plain coordinate slices and returns plain
//! numbers.

pub mod core;
pub mod engine;
