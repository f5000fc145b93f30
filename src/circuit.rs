//! Gate builder for arithmetic circuits.
//!
//! A circuit is described by a closed set of operations over opaque [`Variable`]
//! handles. Every operation appends exactly one [`Gate`] to the circuit under
//! construction, so the position of a gate in [`Circuit::gates`] is its row in the
//! lowered [`ConstraintTable`].
//!
//! ```
//! use scs_trace::{circuit::CircuitBuilder, halo2curves::bn256::Fr};
//!
//! let mut builder = CircuitBuilder::<Fr>::new();
//! let x = builder.secret_input("x").unwrap();
//! let y = builder.public_input("y").unwrap();
//! let x2 = builder.mul(x, x).unwrap();
//! builder.assert_equal(x2, y).unwrap();
//!
//! let circuit = builder.build();
//! assert_eq!(circuit.num_gates(), 2);
//! ```
use std::fmt;

use tracing::*;

use crate::{error::Error, ff::PrimeField, lowering::ConstraintTable};

/// Handle to a wire of the circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(pub(crate) usize);

impl Variable {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Secret,
    Public,
}

/// Declared circuit input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub name: String,
    pub visibility: Visibility,
    pub variable: Variable,
}

/// Abstract gate descriptor, one per builder operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate<F> {
    Mul {
        lhs: Variable,
        rhs: Variable,
        out: Variable,
    },
    Add {
        lhs: Variable,
        rhs: Variable,
        out: Variable,
    },
    AddConstant {
        lhs: Variable,
        constant: F,
        out: Variable,
    },
    AssertEqual {
        lhs: Variable,
        rhs: Variable,
    },
}

impl<F> Gate<F> {
    pub fn name(&self) -> &'static str {
        match self {
            Gate::Mul { .. } => "mul",
            Gate::Add { .. } => "add",
            Gate::AddConstant { .. } => "add_constant",
            Gate::AssertEqual { .. } => "assert_equal",
        }
    }

    pub fn output(&self) -> Option<Variable> {
        match self {
            Gate::Mul { out, .. } | Gate::Add { out, .. } | Gate::AddConstant { out, .. } => {
                Some(*out)
            }
            Gate::AssertEqual { .. } => None,
        }
    }

    /// Every variable the gate touches: operands first, then the output
    pub fn variables(&self) -> impl Iterator<Item = Variable> {
        let (lhs, rhs) = match self {
            Gate::Mul { lhs, rhs, .. }
            | Gate::Add { lhs, rhs, .. }
            | Gate::AssertEqual { lhs, rhs } => (*lhs, Some(*rhs)),
            Gate::AddConstant { lhs, .. } => (*lhs, None),
        };

        std::iter::once(lhs).chain(rhs).chain(self.output())
    }
}

/// Value of `variable` is reported through `tracing` once the witness is solved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugPrint {
    pub label: String,
    pub variable: Variable,
}

/// Immutable description of an arithmetic circuit produced by [`CircuitBuilder::build`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit<F> {
    pub(crate) inputs: Vec<Input>,
    pub(crate) gates: Vec<Gate<F>>,
    pub(crate) num_variables: usize,
    pub(crate) debug_prints: Vec<DebugPrint>,
}

impl<F: PrimeField> Circuit<F> {
    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn gates(&self) -> &[Gate<F>] {
        &self.gates
    }

    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn public_inputs(&self) -> impl Iterator<Item = &Input> {
        self.inputs
            .iter()
            .filter(|input| input.visibility == Visibility::Public)
    }

    /// Lower the circuit into its constraint table
    pub fn compile(&self) -> Result<ConstraintTable<F>, Error> {
        ConstraintTable::lower(self)
    }
}

/// Circuit types that know how to describe themselves against a [`CircuitBuilder`]
pub trait CircuitDefinition<F: PrimeField> {
    fn define(&self, builder: &mut CircuitBuilder<F>) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct CircuitBuilder<F> {
    inputs: Vec<Input>,
    gates: Vec<Gate<F>>,
    num_variables: usize,
    debug_prints: Vec<DebugPrint>,
}

impl<F: PrimeField> Default for CircuitBuilder<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: PrimeField> CircuitBuilder<F> {
    pub fn new() -> Self {
        Self {
            inputs: Vec::new(),
            gates: Vec::new(),
            num_variables: 0,
            debug_prints: Vec::new(),
        }
    }

    /// Run `definition` against a fresh builder and return the resulting circuit
    #[instrument(name = "circuit_define", skip_all)]
    pub fn from_definition(definition: &impl CircuitDefinition<F>) -> Result<Circuit<F>, Error> {
        let mut builder = Self::new();
        definition.define(&mut builder)?;
        debug!(
            "circuit defined: {} inputs, {} gates",
            builder.inputs.len(),
            builder.gates.len()
        );
        Ok(builder.build())
    }

    pub fn declare_input(
        &mut self,
        name: impl Into<String>,
        visibility: Visibility,
    ) -> Result<Variable, Error> {
        let name = name.into();
        if self.inputs.iter().any(|input| input.name == name) {
            error!("input `{name}` is already declared");
            return Err(Error::DuplicateInput { name });
        }

        let variable = self.fresh_variable();
        self.inputs.push(Input {
            name,
            visibility,
            variable,
        });

        Ok(variable)
    }

    pub fn secret_input(&mut self, name: impl Into<String>) -> Result<Variable, Error> {
        self.declare_input(name, Visibility::Secret)
    }

    pub fn public_input(&mut self, name: impl Into<String>) -> Result<Variable, Error> {
        self.declare_input(name, Visibility::Public)
    }

    /// `lhs * rhs`
    pub fn mul(&mut self, lhs: Variable, rhs: Variable) -> Result<Variable, Error> {
        self.check(lhs)?;
        self.check(rhs)?;

        let out = self.fresh_variable();
        self.gates.push(Gate::Mul { lhs, rhs, out });
        Ok(out)
    }

    /// `lhs + rhs`
    pub fn add(&mut self, lhs: Variable, rhs: Variable) -> Result<Variable, Error> {
        self.check(lhs)?;
        self.check(rhs)?;

        let out = self.fresh_variable();
        self.gates.push(Gate::Add { lhs, rhs, out });
        Ok(out)
    }

    /// `lhs + constant`
    pub fn add_constant(&mut self, lhs: Variable, constant: F) -> Result<Variable, Error> {
        self.check(lhs)?;

        let out = self.fresh_variable();
        self.gates.push(Gate::AddConstant { lhs, constant, out });
        Ok(out)
    }

    /// Constrain `lhs == rhs`, checked when the witness is solved
    pub fn assert_equal(&mut self, lhs: Variable, rhs: Variable) -> Result<(), Error> {
        self.check(lhs)?;
        self.check(rhs)?;

        self.gates.push(Gate::AssertEqual { lhs, rhs });
        Ok(())
    }

    /// Sum of all `terms`, folded left into `terms.len() - 1` pairwise add gates
    pub fn add_many(&mut self, terms: &[Variable]) -> Result<Variable, Error> {
        self.fold_terms("add_many", terms, Self::add)
    }

    /// Product of all `terms`, folded left into `terms.len() - 1` pairwise mul gates
    pub fn mul_many(&mut self, terms: &[Variable]) -> Result<Variable, Error> {
        self.fold_terms("mul_many", terms, Self::mul)
    }

    /// Log the solved value of `variable` under `label`
    pub fn println(&mut self, label: impl Into<String>, variable: Variable) -> Result<(), Error> {
        self.check(variable)?;
        self.debug_prints.push(DebugPrint {
            label: label.into(),
            variable,
        });
        Ok(())
    }

    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    pub fn build(self) -> Circuit<F> {
        Circuit {
            inputs: self.inputs,
            gates: self.gates,
            num_variables: self.num_variables,
            debug_prints: self.debug_prints,
        }
    }

    fn fold_terms(
        &mut self,
        operation: &'static str,
        terms: &[Variable],
        op: impl Fn(&mut Self, Variable, Variable) -> Result<Variable, Error>,
    ) -> Result<Variable, Error> {
        let (first, rest) = match terms {
            [first, rest @ ..] if !rest.is_empty() => (*first, rest),
            _ => {
                return Err(Error::NotEnoughOperands {
                    operation,
                    actual: terms.len(),
                })
            }
        };

        // All terms are checked up front so a failing fold leaves no partial gates behind
        for term in terms {
            self.check(*term)?;
        }

        rest.iter()
            .try_fold(first, |acc, term| op(self, acc, *term))
    }

    fn fresh_variable(&mut self) -> Variable {
        let variable = Variable(self.num_variables);
        self.num_variables += 1;
        variable
    }

    fn check(&self, variable: Variable) -> Result<(), Error> {
        if variable.0 < self.num_variables {
            Ok(())
        } else {
            error!(
                "variable {variable} is not declared, builder has {} variables",
                self.num_variables
            );
            Err(Error::MalformedCircuit {
                variable: variable.0,
                num_variables: self.num_variables,
            })
        }
    }
}
