use std::collections::HashMap;

use halo2_proofs::{
    arithmetic::Field,
    circuit::{AssignedCell, Layouter, SimpleFloorPlanner},
    dev::{self, MockProver as Halo2MockProver},
    halo2curves::ff::{FromUniformBytes, PrimeField},
    plonk::{Circuit, ConstraintSystem, Error as PlonkError},
};
use tracing::*;

use crate::{
    circuit::Variable,
    constants::{MIN_K_TABLE_SIZE, RESERVED_ROWS},
    solver::SolvedTrace,
    standard_gate::{RegionCtx, StandardGate, StandardGateConfig},
};

#[derive(Debug, thiserror::Error)]
pub enum VerifyFailure {
    #[error("error while synthesize trace circuit: {0:?}")]
    Synthesis(PlonkError),
    #[error("trace circuit is not satisfied: {0:?}")]
    Plonk(Vec<dev::VerifyFailure>),
}

/// Smallest `k` such that `2^k` rows hold the trace next to halo2 blinding rows
pub fn k_table_size(rows: usize) -> u32 {
    (rows + RESERVED_ROWS)
        .next_power_of_two()
        .trailing_zeros()
        .max(MIN_K_TABLE_SIZE)
}

/// Lays a [`SolvedTrace`] out on a [`StandardGate`]: one region row per trace row,
/// copy constraints between every cell bound to the same variable and public inputs
/// bound to the instance column in declaration order.
struct TraceCircuit<'t, F: PrimeField> {
    trace: &'t SolvedTrace<F>,
}

impl<F: PrimeField> Circuit<F> for TraceCircuit<'_, F> {
    type Config = StandardGateConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self { trace: self.trace }
    }

    fn configure(meta: &mut ConstraintSystem<F>) -> Self::Config {
        StandardGate::configure(meta)
    }

    fn synthesize(
        &self,
        config: Self::Config,
        mut layouter: impl Layouter<F>,
    ) -> Result<(), PlonkError> {
        let gate = StandardGate::new(config);

        let first_cells = layouter.assign_region(
            || "trace",
            |region| {
                let ctx = &mut RegionCtx::new(region, 0);
                let mut first_cells = HashMap::<Variable, AssignedCell<F, F>>::new();

                for row in self.trace.rows() {
                    let cells = gate.assign_row(ctx, row)?;

                    let Some(wiring) = row.wiring else {
                        continue;
                    };

                    for (cell, variable) in cells.into_iter().zip(wiring.iter()) {
                        let Some(variable) = variable else {
                            continue;
                        };

                        match first_cells.get(&variable) {
                            Some(first) => ctx.constrain_equal(first.cell(), cell.cell())?,
                            None => {
                                first_cells.insert(variable, cell);
                            }
                        }
                    }
                }

                Ok(first_cells)
            },
        )?;

        for (index, variable) in self
            .trace
            .witness()
            .public_variables()
            .iter()
            .enumerate()
        {
            match first_cells.get(variable) {
                Some(cell) => gate.expose_public(
                    layouter.namespace(|| format!("public input {index}")),
                    cell.cell(),
                    index,
                )?,
                None => debug!("public input {variable} is not wired into any row"),
            }
        }

        Ok(())
    }
}

/// Runs halo2's `MockProver` over a solved trace
///
/// ```
/// use scs_trace::{
///     circuit::CircuitBuilder, examples::cubic::CubicCircuit, halo2curves::bn256::Fr,
///     solver::Assignment, util::mock_prover::MockProver,
/// };
///
/// let trace = CircuitBuilder::<Fr>::from_definition(&CubicCircuit)
///     .unwrap()
///     .compile()
///     .unwrap()
///     .solve(&Assignment::new().with("x", Fr::from(3)).with("y", Fr::from(35)))
///     .unwrap();
///
/// MockProver::run(&trace).unwrap().verify().unwrap();
/// ```
pub struct MockProver<'a, F: Field> {
    mock_prover: Halo2MockProver<'a, F>,
}

impl<F: Field> MockProver<'_, F> {
    /// Run with the public inputs recorded in the trace witness
    pub fn run(trace: &SolvedTrace<F>) -> Result<Self, VerifyFailure>
    where
        F: PrimeField + FromUniformBytes<64> + Ord,
    {
        Self::run_with_instance(trace, trace.witness().public())
    }

    /// Run with explicitly supplied public inputs, in declaration order
    #[instrument(name = "trace_mock_prover", skip_all)]
    pub fn run_with_instance(trace: &SolvedTrace<F>, instance: Vec<F>) -> Result<Self, VerifyFailure>
    where
        F: PrimeField + FromUniformBytes<64> + Ord,
    {
        let k_table_size = k_table_size(trace.rows().len());
        debug!("run mock prover with k = {k_table_size}");

        let circuit = TraceCircuit { trace };
        let mock_prover = Halo2MockProver::run(k_table_size, &circuit, vec![instance])
            .map_err(|err| {
                error!("error while synthesize trace circuit in MockProver: {err:?}");
                VerifyFailure::Synthesis(err)
            })?;

        Ok(Self { mock_prover })
    }

    pub fn verify(&self) -> Result<(), VerifyFailure>
    where
        F: FromUniformBytes<64> + Ord,
    {
        self.mock_prover.verify().map_err(VerifyFailure::Plonk)
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::{
        circuit::CircuitBuilder, examples::cubic::CubicCircuit, ff::Field,
        halo2curves::bn256::Fr, solver::Assignment,
    };

    fn cubic_trace() -> SolvedTrace<Fr> {
        CircuitBuilder::from_definition(&CubicCircuit)
            .unwrap()
            .compile()
            .unwrap()
            .solve(&Assignment::new().with("x", Fr::from(3)).with("y", Fr::from(35)))
            .unwrap()
    }

    #[test]
    fn table_size() {
        assert_eq!(k_table_size(0), MIN_K_TABLE_SIZE);
        assert_eq!(k_table_size(5), 4);
        assert_eq!(k_table_size(7), 5);
        assert_eq!(k_table_size(1000), 10);
    }

    #[traced_test]
    #[test]
    fn cubic_trace_is_accepted() {
        let trace = cubic_trace();

        MockProver::run(&trace).unwrap().verify().unwrap();
        MockProver::run(&trace.padded()).unwrap().verify().unwrap();
    }

    #[traced_test]
    #[test]
    fn wrong_public_input_is_rejected() {
        let prover = MockProver::run_with_instance(&cubic_trace(), vec![Fr::from(34)]).unwrap();

        assert!(matches!(prover.verify(), Err(VerifyFailure::Plonk(_))));
    }

    #[traced_test]
    #[test]
    fn broken_row_is_rejected() {
        let mut trace = cubic_trace();
        trace.rows[1].o += Fr::ONE;

        let prover = MockProver::run(&trace).unwrap();
        assert!(matches!(prover.verify(), Err(VerifyFailure::Plonk(_))));
    }

    #[traced_test]
    #[test]
    fn broken_copy_is_rejected() {
        let mut trace = cubic_trace();
        // `x³ + x` row stays satisfied on its own, but no longer reads the `x³` wire
        trace.rows[2].l = Fr::from(28);
        trace.rows[2].o = Fr::from(31);
        assert!(trace.rows[2].is_sat());

        let prover = MockProver::run(&trace).unwrap();
        assert!(matches!(prover.verify(), Err(VerifyFailure::Plonk(_))));
    }
}
