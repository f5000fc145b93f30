//! Ready-made circuit definitions
pub mod cubic;
