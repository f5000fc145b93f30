//! Compiles arithmetic circuits into a PLONK constraint table and prints the solved
//! execution trace.
//!
//! The pipeline is [`circuit::CircuitBuilder`] → [`lowering::ConstraintTable`] →
//! [`solver::SolvedTrace`] → [`trace::TraceFormat`], with
//! [`util::mock_prover::MockProver`] to cross-check a trace against halo2.
pub mod circuit;
pub(crate) mod constants;
pub mod error;
pub mod examples;
pub mod lowering;
pub mod solver;
pub mod standard_gate;
pub mod trace;
pub mod util;

pub use halo2_proofs::{self, halo2curves};
pub use halo2_proofs::halo2curves::ff;
