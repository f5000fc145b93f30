use crate::{
    circuit::{CircuitBuilder, CircuitDefinition},
    error::Error,
    ff::PrimeField,
};

/// `x^3 + x + 5 == y` with secret `x` and public `y`
///
/// Lowers to five rows: `x·x`, `x²·x`, `x³ + x`, `(x³ + x) + 5` and the final
/// `y == x³ + x + 5` assertion.
#[derive(Debug, Clone, Copy, Default)]
pub struct CubicCircuit;

impl<F: PrimeField> CircuitDefinition<F> for CubicCircuit {
    fn define(&self, builder: &mut CircuitBuilder<F>) -> Result<(), Error> {
        let x = builder.secret_input("x")?;
        let y = builder.public_input("y")?;

        let x3 = builder.mul_many(&[x, x, x])?;
        let x3_plus_x = builder.add(x3, x)?;
        let lhs = builder.add_constant(x3_plus_x, F::from(5))?;
        builder.println("x^3 + x + 5", lhs)?;

        builder.assert_equal(y, lhs)
    }
}
