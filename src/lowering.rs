//! Lowering of gate descriptors into PLONK selector rows.
//!
//! Every gate becomes one row of the relation
//!
//! ```text
//! ql·l + qr·r + qm·l·r + qo·o + qk = 0
//! ```
//!
//! | gate             | ql | qr | qm | qo | qk | l | r | o |
//! |------------------|----|----|----|----|----|---|---|---|
//! | `mul(a, b)`      | 0  | 0  | 1  | -1 | 0  | a | b | c |
//! | `add(a, b)`      | 1  | 1  | 0  | -1 | 0  | a | b | c |
//! | `add_constant(a, k)` | 1 | 0 | 0 | -1 | k | a | - | c |
//! | `assert_equal(a, b)` | 1 | -1 | 0 | 0 | 0 | a | b | - |
//!
//! Wire slots marked `-` are unused by the row and carry the value zero.
use tracing::*;

use crate::{
    circuit::{Circuit, DebugPrint, Gate, Input, Variable},
    error::Error,
    ff::PrimeField,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selectors<F> {
    pub ql: F,
    pub qr: F,
    pub qm: F,
    pub qo: F,
    pub qk: F,
}

impl<F: PrimeField> Selectors<F> {
    pub fn zero() -> Self {
        Self {
            ql: F::ZERO,
            qr: F::ZERO,
            qm: F::ZERO,
            qo: F::ZERO,
            qk: F::ZERO,
        }
    }

    /// `ql·l + qr·r + qm·l·r + qo·o + qk`
    pub fn evaluate(&self, l: F, r: F, o: F) -> F {
        self.ql * l + self.qr * r + self.qm * l * r + self.qo * o + self.qk
    }
}

/// Variables bound to the three wire slots of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wiring {
    pub l: Variable,
    pub r: Option<Variable>,
    pub o: Option<Variable>,
}

impl Wiring {
    pub fn iter(&self) -> impl Iterator<Item = Option<Variable>> {
        [Some(self.l), self.r, self.o].into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintRow<F> {
    pub gate: Gate<F>,
    pub wiring: Wiring,
    pub selectors: Selectors<F>,
}

/// Lower one gate descriptor, `row` is only used for error reporting
pub fn lower_gate<F: PrimeField>(
    row: usize,
    gate: &Gate<F>,
    num_variables: usize,
) -> Result<ConstraintRow<F>, Error> {
    if let Some(unknown) = gate.variables().find(|v| v.index() >= num_variables) {
        error!(
            "gate {} at row {row} references {unknown}, but circuit has {num_variables} variables",
            gate.name()
        );
        return Err(Error::UnknownVariable {
            row,
            variable: unknown.index(),
        });
    }

    let (wiring, selectors) = match *gate {
        Gate::Mul { lhs, rhs, out } => (
            Wiring {
                l: lhs,
                r: Some(rhs),
                o: Some(out),
            },
            Selectors {
                qm: F::ONE,
                qo: -F::ONE,
                ..Selectors::zero()
            },
        ),
        Gate::Add { lhs, rhs, out } => (
            Wiring {
                l: lhs,
                r: Some(rhs),
                o: Some(out),
            },
            Selectors {
                ql: F::ONE,
                qr: F::ONE,
                qo: -F::ONE,
                ..Selectors::zero()
            },
        ),
        Gate::AddConstant { lhs, constant, out } => (
            Wiring {
                l: lhs,
                r: None,
                o: Some(out),
            },
            Selectors {
                ql: F::ONE,
                qo: -F::ONE,
                qk: constant,
                ..Selectors::zero()
            },
        ),
        Gate::AssertEqual { lhs, rhs } => (
            Wiring {
                l: lhs,
                r: Some(rhs),
                o: None,
            },
            Selectors {
                ql: F::ONE,
                qr: -F::ONE,
                ..Selectors::zero()
            },
        ),
    };

    Ok(ConstraintRow {
        gate: *gate,
        wiring,
        selectors,
    })
}

/// Compiled form of a circuit: one [`ConstraintRow`] per gate, in declaration order.
///
/// Built once per circuit shape and reused for every witness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintTable<F> {
    pub(crate) inputs: Vec<Input>,
    pub(crate) rows: Vec<ConstraintRow<F>>,
    pub(crate) num_variables: usize,
    pub(crate) debug_prints: Vec<DebugPrint>,
}

impl<F: PrimeField> ConstraintTable<F> {
    #[instrument(name = "constraint_table_lower", skip_all)]
    pub fn lower(circuit: &Circuit<F>) -> Result<Self, Error> {
        debug!("start lowering {} gates", circuit.gates.len());

        let rows = circuit
            .gates
            .iter()
            .enumerate()
            .map(|(row, gate)| lower_gate(row, gate, circuit.num_variables))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("lowering is ready");

        Ok(Self {
            inputs: circuit.inputs.clone(),
            rows,
            num_variables: circuit.num_variables,
            debug_prints: circuit.debug_prints.clone(),
        })
    }

    pub fn rows(&self) -> &[ConstraintRow<F>] {
        &self.rows
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Size of the evaluation domain the rows are interpolated over
    pub fn domain_size(&self) -> usize {
        self.rows.len().max(1).next_power_of_two()
    }
}
