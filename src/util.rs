use num_bigint::BigUint;
use num_traits::Num;

use crate::ff::PrimeField;

pub mod mock_prover;

pub fn modulus<F: PrimeField>() -> BigUint {
    fe_to_big(&(-F::ONE)) + 1usize
}

pub fn fe_from_big<F: PrimeField>(big: BigUint) -> Option<F> {
    let bytes = big.to_bytes_le();
    let mut repr = F::Repr::default();

    if bytes.len() > repr.as_ref().len() {
        return None;
    }

    repr.as_mut()[..bytes.len()].clone_from_slice(bytes.as_slice());

    F::from_repr(repr).into()
}

pub fn fe_to_big<F: PrimeField>(fe: &F) -> BigUint {
    BigUint::from_bytes_le(fe.to_repr().as_ref())
}

/// Canonical representative in `[0, p)` as a decimal string
pub fn fe_to_decimal<F: PrimeField>(fe: &F) -> String {
    fe_to_big(fe).to_str_radix(10)
}

/// Decimal string where values above `(p - 1) / 2` are rendered as `-(p - v)`
pub fn fe_to_signed_decimal<F: PrimeField>(fe: &F) -> String {
    let value = fe_to_big(fe);
    let modulus = modulus::<F>();

    if value > (modulus.clone() - 1usize) / 2usize {
        format!("-{}", (modulus - value).to_str_radix(10))
    } else {
        value.to_str_radix(10)
    }
}

/// Parses either rendering produced by [`fe_to_decimal`] or [`fe_to_signed_decimal`].
///
/// Returns `None` for anything that is not a decimal integer of absolute value
/// below the field modulus.
pub fn fe_from_decimal<F: PrimeField>(input: &str) -> Option<F> {
    let (negative, digits) = match input.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, input),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let big = BigUint::from_str_radix(digits, 10).ok()?;
    if big >= modulus::<F>() {
        return None;
    }

    let fe = fe_from_big::<F>(big)?;
    Some(if negative { -fe } else { fe })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ff::Field, halo2curves::bn256::Fr};

    #[test]
    fn decimal_rendering_of_minus_one() {
        let minus_one = -Fr::ONE;

        assert_eq!(
            fe_to_decimal(&minus_one),
            "21888242871839275222246405745257275088548364400416034343698204186575808495616"
        );
        assert_eq!(fe_to_signed_decimal(&minus_one), "-1");
        assert_eq!(fe_to_signed_decimal(&Fr::from(35)), "35");
    }

    #[test]
    fn decimal_parsing() {
        assert_eq!(fe_from_decimal::<Fr>("35"), Some(Fr::from(35)));
        assert_eq!(fe_from_decimal::<Fr>("-1"), Some(-Fr::ONE));
        assert_eq!(
            fe_from_decimal::<Fr>(
                "21888242871839275222246405745257275088548364400416034343698204186575808495616"
            ),
            Some(-Fr::ONE)
        );
        assert_eq!(fe_from_decimal::<Fr>(&modulus::<Fr>().to_str_radix(10)), None);
        assert_eq!(fe_from_decimal::<Fr>(""), None);
        assert_eq!(fe_from_decimal::<Fr>("-"), None);
        assert_eq!(fe_from_decimal::<Fr>("+5"), None);
        assert_eq!(fe_from_decimal::<Fr>("0x10"), None);
    }

    #[test]
    fn random_values_survive_both_renderings() {
        let mut rng = rand::thread_rng();
        for _ in 0..16 {
            let fe = Fr::random(&mut rng);
            assert_eq!(fe_from_decimal::<Fr>(&fe_to_decimal(&fe)), Some(fe));
            assert_eq!(fe_from_decimal::<Fr>(&fe_to_signed_decimal(&fe)), Some(fe));
        }
    }
}
