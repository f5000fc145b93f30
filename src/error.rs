//! Errors raised while building, lowering, solving or re-parsing a circuit trace.
//!
//! Field values carried by an error are rendered as canonical decimal strings, so
//! the error type stays independent of the field and comparable in tests.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("malformed circuit: variable {variable} is not declared (circuit has {num_variables} variables)")]
    MalformedCircuit {
        variable: usize,
        num_variables: usize,
    },
    #[error("malformed circuit: input `{name}` is declared twice")]
    DuplicateInput { name: String },
    #[error("`{operation}` needs at least two operands, got {actual}")]
    NotEnoughOperands {
        operation: &'static str,
        actual: usize,
    },
    #[error("gate at row {row} references unknown variable {variable}")]
    UnknownVariable { row: usize, variable: usize },
    #[error("constraint at row {row} is not satisfied: {lhs} != {rhs}")]
    UnsatisfiedConstraint {
        row: usize,
        lhs: String,
        rhs: String,
    },
    #[error("no value assigned to input `{name}`")]
    MissingAssignment { name: String },
    #[error("value assigned to undeclared input `{name}`")]
    UnknownInput { name: String },
    #[error("plonk relation not satisfied on {failed} out of {total} rows, first failure at row {first_row}")]
    RowNotSatisfied {
        failed: usize,
        total: usize,
        first_row: usize,
    },
    #[error("can't parse trace line {line}: {reason}")]
    ParseTrace { line: usize, reason: String },
}
