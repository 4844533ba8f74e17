//! # Engine Module
//!
//! The stateful layer a host simulation engine talks to.
//!
//! ## Overview
//!
//! The engine module turns the stateless algebra of [`core`](crate::core) into
//! a restraint the host can attach to a simulated system. It owns the validated
//! reference state and exposes the three call points of the restraint's
//! lifecycle: configuration, per-step evaluation, and reconfiguration.
//!
//! - **Restraint Definition** ([`force`]) - The user-level parameter object:
//!   uncentered reference positions plus a particle selection, no validation
//! - **Reference State** ([`reference`]) - The validated, centroid-centered
//!   snapshot built from a definition, replaced atomically on reconfiguration
//! - **Evaluation** ([`evaluator`]) - The per-step RMSD energy and analytic
//!   force computation
//! - **Error Handling** ([`error`]) - Configuration-time error types
//!
//! ## Concurrency
//!
//! [`evaluator::RmsdEvaluator::evaluate`] is a pure function of the stored
//! state and the supplied positions and takes `&self`, so concurrent
//! evaluations are safe. Reconfiguration takes `&mut self`; Rust's borrow
//! rules enforce the single-writer contract (no evaluation may be in flight
//! while parameters are being replaced).

pub mod error;
pub mod evaluator;
pub mod force;
pub mod reference;
