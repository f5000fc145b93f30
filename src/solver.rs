//! Witness solving over a compiled [`ConstraintTable`].
//!
//! Rows only reference variables produced by earlier rows or declared inputs, so a
//! single forward pass in row order resolves every wire.
use std::collections::HashMap;

use rayon::prelude::*;
use tracing::*;

use crate::{
    circuit::{Gate, Variable, Visibility},
    error::Error,
    ff::PrimeField,
    lowering::{ConstraintTable, Selectors, Wiring},
    util::fe_to_decimal,
};

/// Concrete values for the declared inputs of a circuit, by input name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<F> {
    values: HashMap<String, F>,
}

impl<F: PrimeField> Default for Assignment<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: PrimeField> Assignment<F> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: F) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: F) -> Option<F> {
        self.values.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<F> {
        self.values.get(name).copied()
    }
}

impl<F: PrimeField, S: Into<String>> FromIterator<(S, F)> for Assignment<F> {
    fn from_iter<T: IntoIterator<Item = (S, F)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

impl<F: PrimeField> From<HashMap<String, F>> for Assignment<F> {
    fn from(values: HashMap<String, F>) -> Self {
        Self { values }
    }
}

/// Value of every wire of a circuit for one solve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness<F> {
    values: Vec<F>,
    public: Vec<Variable>,
}

impl<F: PrimeField> Witness<F> {
    pub fn value(&self, variable: Variable) -> Option<F> {
        self.values.get(variable.index()).copied()
    }

    /// Every wire, indexed by [`Variable::index`]
    pub fn full(&self) -> &[F] {
        &self.values
    }

    /// Public inputs in declaration order
    pub fn public(&self) -> Vec<F> {
        self.public
            .iter()
            .map(|variable| self.values[variable.index()])
            .collect()
    }

    pub fn public_variables(&self) -> &[Variable] {
        &self.public
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One row of the execution trace: wire values next to the row selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRow<F> {
    /// `None` for padding rows and for rows parsed back from text
    pub wiring: Option<Wiring>,
    pub l: F,
    pub r: F,
    pub o: F,
    pub selectors: Selectors<F>,
}

impl<F: PrimeField> TraceRow<F> {
    pub fn padding() -> Self {
        Self {
            wiring: None,
            l: F::ZERO,
            r: F::ZERO,
            o: F::ZERO,
            selectors: Selectors::zero(),
        }
    }

    /// `(l, r, o, ql, qr, qm, qo, qk)`
    pub fn values(&self) -> [F; 8] {
        let Selectors { ql, qr, qm, qo, qk } = self.selectors;
        [self.l, self.r, self.o, ql, qr, qm, qo, qk]
    }

    pub fn is_sat(&self) -> bool {
        self.selectors.evaluate(self.l, self.r, self.o) == F::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedTrace<F> {
    pub(crate) rows: Vec<TraceRow<F>>,
    witness: Witness<F>,
}

impl<F: PrimeField> SolvedTrace<F> {
    pub fn rows(&self) -> &[TraceRow<F>] {
        &self.rows
    }

    pub fn witness(&self) -> &Witness<F> {
        &self.witness
    }

    pub fn into_witness(self) -> Witness<F> {
        self.witness
    }

    /// Copy of the trace with zero rows appended up to the next power of two
    pub fn padded(&self) -> Self {
        let domain_size = self.rows.len().max(1).next_power_of_two();
        let mut rows = self.rows.clone();
        rows.resize(domain_size, TraceRow::padding());

        Self {
            rows,
            witness: self.witness.clone(),
        }
    }

    /// Check every row equation and that every wired slot agrees with the witness
    #[instrument(name = "solved_trace_is_sat", skip_all)]
    pub fn is_sat(&self) -> Result<(), Error> {
        let failed = self
            .rows
            .par_iter()
            .enumerate()
            .filter(|(_, row)| !row.is_sat() || !self.is_consistent(row))
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        match failed.iter().min() {
            None => Ok(()),
            Some(first_row) => {
                error!("{} rows are not satisfied", failed.len());
                Err(Error::RowNotSatisfied {
                    failed: failed.len(),
                    total: self.rows.len(),
                    first_row: *first_row,
                })
            }
        }
    }

    fn is_consistent(&self, row: &TraceRow<F>) -> bool {
        let Some(wiring) = row.wiring else {
            return true;
        };

        [row.l, row.r, row.o]
            .into_iter()
            .zip(wiring.iter())
            .all(|(value, variable)| match variable {
                Some(variable) => self.witness.value(variable) == Some(value),
                None => value == F::ZERO,
            })
    }
}

impl<F: PrimeField> ConstraintTable<F> {
    /// Solve the table for `assignment`.
    ///
    /// Fails on the first `assert_equal` row whose operands differ; no partial trace
    /// is returned.
    #[instrument(name = "constraint_table_solve", skip_all)]
    pub fn solve(&self, assignment: &Assignment<F>) -> Result<SolvedTrace<F>, Error> {
        if let Some(name) = assignment
            .values
            .keys()
            .filter(|name| !self.inputs.iter().any(|input| &input.name == *name))
            .min()
        {
            error!("assignment has value for undeclared input `{name}`");
            return Err(Error::UnknownInput { name: name.clone() });
        }

        let mut values: Vec<Option<F>> = vec![None; self.num_variables];
        for input in self.inputs.iter() {
            let value = assignment.get(&input.name).ok_or_else(|| {
                error!("input `{}` has no assigned value", input.name);
                Error::MissingAssignment {
                    name: input.name.clone(),
                }
            })?;
            values[input.variable.index()] = Some(value);
        }

        debug!("start solving {} rows", self.rows.len());
        let mut rows = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            let resolve = |variable: Variable| -> Result<F, Error> {
                values
                    .get(variable.index())
                    .copied()
                    .flatten()
                    .ok_or(Error::UnknownVariable {
                        row: index,
                        variable: variable.index(),
                    })
            };

            let l = resolve(row.wiring.l)?;
            let r = row.wiring.r.map(resolve).transpose()?;

            let r_value = r.unwrap_or(F::ZERO);

            let o = match row.gate {
                Gate::Mul { out, .. } => Some((out, l * r_value)),
                Gate::Add { out, .. } => Some((out, l + r_value)),
                Gate::AddConstant { constant, out, .. } => Some((out, l + constant)),
                Gate::AssertEqual { .. } if l != r_value => {
                    error!("assertion at row {index} failed");
                    return Err(Error::UnsatisfiedConstraint {
                        row: index,
                        lhs: fe_to_decimal(&l),
                        rhs: fe_to_decimal(&r_value),
                    });
                }
                Gate::AssertEqual { .. } => None,
            };
            if let Some((out, value)) = o {
                values[out.index()] = Some(value);
            }

            rows.push(TraceRow {
                wiring: Some(row.wiring),
                l,
                r: r_value,
                o: o.map(|(_, value)| value).unwrap_or(F::ZERO),
                selectors: row.selectors,
            });
        }
        debug!("solving is ready");

        for print in self.debug_prints.iter() {
            if let Some(value) = values[print.variable.index()] {
                info!("{}: {}", print.label, fe_to_decimal(&value));
            }
        }

        // Every variable is either a declared input or the output of some gate
        let values = values
            .into_iter()
            .map(|value| value.unwrap_or(F::ZERO))
            .collect();

        let public = self
            .inputs
            .iter()
            .filter(|input| input.visibility == Visibility::Public)
            .map(|input| input.variable)
            .collect();

        Ok(SolvedTrace {
            rows,
            witness: Witness { values, public },
        })
    }
}

#[cfg(test)]
mod tests {
    use maplit::hashmap;
    use tracing_test::traced_test;

    use super::*;
    use crate::{
        circuit::{CircuitBuilder, Variable},
        examples::cubic::CubicCircuit,
        ff::Field,
        halo2curves::bn256::Fr,
    };

    fn cubic_table() -> ConstraintTable<Fr> {
        CircuitBuilder::from_definition(&CubicCircuit)
            .unwrap()
            .compile()
            .unwrap()
    }

    #[traced_test]
    #[test]
    fn cubic_is_solved() {
        let assignment = Assignment::from(hashmap! {
            "x".to_string() => Fr::from(3),
            "y".to_string() => Fr::from(35),
        });

        let trace = cubic_table().solve(&assignment).unwrap();

        assert_eq!(trace.witness().public(), vec![Fr::from(35)]);
        assert_eq!(
            trace.rows().iter().map(|row| row.o).collect::<Vec<_>>(),
            vec![
                Fr::from(9),
                Fr::from(27),
                Fr::from(30),
                Fr::from(35),
                Fr::ZERO
            ]
        );
        // the asserted row compares y with x^3 + x + 5
        let last = trace.rows().last().unwrap();
        assert_eq!((last.l, last.r), (Fr::from(35), Fr::from(35)));

        assert_eq!(trace.is_sat(), Ok(()));
        assert!(logs_contain("x^3 + x + 5: 35"));
    }

    #[traced_test]
    #[test]
    fn cubic_with_wrong_output() {
        let assignment = Assignment::new()
            .with("x", Fr::from(3))
            .with("y", Fr::from(34));

        assert_eq!(
            cubic_table().solve(&assignment),
            Err(Error::UnsatisfiedConstraint {
                row: 4,
                lhs: "34".to_string(),
                rhs: "35".to_string(),
            })
        );
    }

    #[test]
    fn table_is_reused_across_witnesses() {
        let table = cubic_table();

        for x in 0..8u64 {
            let y = x * x * x + x + 5;
            let trace = table
                .solve(&[("x", Fr::from(x)), ("y", Fr::from(y))].into_iter().collect())
                .unwrap();
            assert_eq!(trace.witness().public(), vec![Fr::from(y)]);
            assert_eq!(trace.is_sat(), Ok(()));
        }
    }

    #[test]
    fn solving_is_deterministic() {
        let table = cubic_table();
        let x = Fr::random(rand::thread_rng());
        let y = x * x * x + x + Fr::from(5);
        let assignment = Assignment::new().with("x", x).with("y", y);

        assert_eq!(table.solve(&assignment), table.solve(&assignment));
    }

    #[test]
    fn full_and_public_views() {
        let trace = cubic_table()
            .solve(&Assignment::new().with("x", Fr::from(2)).with("y", Fr::from(15)))
            .unwrap();
        let witness = trace.into_witness();

        // x, y, x^2, x^3, x^3 + x, x^3 + x + 5
        assert_eq!(
            witness.full(),
            &[2u64, 15, 4, 8, 10, 15].map(Fr::from)
        );
        assert_eq!(witness.public(), vec![Fr::from(15)]);
        assert_eq!(witness.value(Variable(3)), Some(Fr::from(8)));
        assert_eq!(witness.value(Variable(6)), None);
    }

    #[traced_test]
    #[test]
    fn missing_and_unknown_inputs() {
        let table = cubic_table();

        assert_eq!(
            table.solve(&Assignment::new().with("x", Fr::from(3))),
            Err(Error::MissingAssignment {
                name: "y".to_string()
            })
        );
        assert_eq!(
            table.solve(
                &Assignment::new()
                    .with("x", Fr::from(3))
                    .with("y", Fr::from(35))
                    .with("z", Fr::from(1))
            ),
            Err(Error::UnknownInput {
                name: "z".to_string()
            })
        );
    }

    #[test]
    fn tampered_trace_is_not_sat() {
        let trace = cubic_table()
            .solve(&Assignment::new().with("x", Fr::from(3)).with("y", Fr::from(35)))
            .unwrap();

        let mut tampered = trace.clone();
        tampered.rows[1].o += Fr::ONE;
        assert_eq!(
            tampered.is_sat(),
            Err(Error::RowNotSatisfied {
                failed: 1,
                total: 5,
                first_row: 1
            })
        );

        // row still holds, but disagrees with the witness
        let mut rewired = trace;
        rewired.rows[0].l = Fr::from(9);
        rewired.rows[0].o = Fr::from(27);
        assert!(rewired.rows[0].is_sat());
        assert!(rewired.is_sat().is_err());
    }

    #[test]
    fn padding_to_domain() {
        let trace = cubic_table()
            .solve(&Assignment::new().with("x", Fr::from(3)).with("y", Fr::from(35)))
            .unwrap();
        let padded = trace.padded();

        assert_eq!(padded.rows().len(), 8);
        assert_eq!(&padded.rows()[..5], trace.rows());
        assert!(padded.rows()[5..]
            .iter()
            .all(|row| *row == TraceRow::padding()));
        assert_eq!(padded.is_sat(), Ok(()));
    }
}
