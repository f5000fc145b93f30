//! Text rendering of a solved trace, one line per row:
//!
//! ```text
//! <ql>*<l>+<qr>*<r>+<qm>*<l>*<r>+<qo>*<o>+<qk>
//! ```
//!
//! Values are decimal integers. The default rendering prints the canonical
//! representative in `[0, p)`; [`TraceFormat::signed`] prints the upper half of the
//! field as negative numbers instead. [`parse_row`] accepts both.
use std::{fmt, io};

use itertools::Itertools;

use crate::{
    error::Error,
    ff::PrimeField,
    lowering::Selectors,
    solver::{SolvedTrace, TraceRow},
    util::{fe_from_decimal, fe_to_decimal, fe_to_signed_decimal},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceFormat {
    pub signed: bool,
}

impl TraceFormat {
    pub fn signed() -> Self {
        Self { signed: true }
    }

    pub fn render<F: PrimeField>(&self, fe: &F) -> String {
        if self.signed {
            fe_to_signed_decimal(fe)
        } else {
            fe_to_decimal(fe)
        }
    }

    pub fn format_row<F: PrimeField>(&self, row: &TraceRow<F>) -> String {
        let [l, r, o, ql, qr, qm, qo, qk] = row.values().map(|value| self.render(&value));
        format!("{ql}*{l}+{qr}*{r}+{qm}*{l}*{r}+{qo}*{o}+{qk}")
    }

    pub fn lines<'t, F: PrimeField>(
        &self,
        trace: &'t SolvedTrace<F>,
    ) -> impl Iterator<Item = String> + 't {
        let format = *self;
        trace.rows().iter().map(move |row| format.format_row(row))
    }

    pub fn write_trace<F: PrimeField>(
        &self,
        trace: &SolvedTrace<F>,
        out: &mut impl io::Write,
    ) -> io::Result<()> {
        for line in self.lines(trace) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

impl<F: PrimeField> fmt::Display for TraceRow<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&TraceFormat::default().format_row(self))
    }
}

/// Parse one rendered row back; `line` is the 0-based line number used in errors.
///
/// The `l` and `r` values appear twice in a line and both occurrences must agree.
/// The parsed row carries no wiring.
pub fn parse_row<F: PrimeField>(line: usize, text: &str) -> Result<TraceRow<F>, Error> {
    let fail = |reason: String| Error::ParseTrace { line, reason };

    let (linear_l, linear_r, mul, out, constant) = text
        .trim()
        .split('+')
        .collect_tuple()
        .ok_or_else(|| fail("expected 5 terms separated by `+`".to_string()))?;

    let [ql, l] = factors::<F, 2>(line, linear_l)?;
    let [qr, r] = factors::<F, 2>(line, linear_r)?;
    let [qm, ml, mr] = factors::<F, 3>(line, mul)?;
    let [qo, o] = factors::<F, 2>(line, out)?;
    let [qk] = factors::<F, 1>(line, constant)?;

    if (ml, mr) != (l, r) {
        return Err(fail(
            "wire values of the multiplication term differ from the linear terms".to_string(),
        ));
    }

    Ok(TraceRow {
        wiring: None,
        l,
        r,
        o,
        selectors: Selectors { ql, qr, qm, qo, qk },
    })
}

fn factors<F: PrimeField, const N: usize>(line: usize, term: &str) -> Result<[F; N], Error> {
    let factors = term
        .split('*')
        .map(|factor| {
            fe_from_decimal::<F>(factor).ok_or_else(|| Error::ParseTrace {
                line,
                reason: format!("`{factor}` is not a field element"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let actual = factors.len();
    factors.try_into().map_err(|_| Error::ParseTrace {
        line,
        reason: format!("term `{term}` has {actual} factors, expected {N}"),
    })
}

/// Parse a whole rendered trace, skipping blank lines
pub fn parse_trace<F: PrimeField>(text: &str) -> Result<Vec<TraceRow<F>>, Error> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_row(index, line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        circuit::CircuitBuilder, examples::cubic::CubicCircuit, ff::Field,
        halo2curves::bn256::Fr, solver::Assignment, util::modulus,
    };

    fn cubic_trace(x: u64, y: u64) -> SolvedTrace<Fr> {
        CircuitBuilder::from_definition(&CubicCircuit)
            .unwrap()
            .compile()
            .unwrap()
            .solve(&Assignment::new().with("x", Fr::from(x)).with("y", Fr::from(y)))
            .unwrap()
    }

    #[test]
    fn cubic_signed_lines() {
        let lines = TraceFormat::signed()
            .lines(&cubic_trace(3, 35))
            .collect::<Vec<_>>();

        assert_eq!(
            lines,
            vec![
                "0*3+0*3+1*3*3+-1*9+0",
                "0*9+0*3+1*9*3+-1*27+0",
                "1*27+1*3+0*27*3+-1*30+0",
                "1*30+0*0+0*30*0+-1*35+5",
                "1*35+-1*35+0*35*35+0*0+0",
            ]
        );
    }

    #[test]
    fn cubic_canonical_lines() {
        let minus_one = (modulus::<Fr>() - 1u32).to_str_radix(10);
        let trace = cubic_trace(3, 35);

        let mut out = Vec::new();
        TraceFormat::default().write_trace(&trace, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().count(), 5);
        assert_eq!(
            text.lines().next().unwrap(),
            format!("0*3+0*3+1*3*3+{minus_one}*9+0")
        );
        assert_eq!(
            text.lines().last().unwrap(),
            format!("1*35+{minus_one}*35+0*35*35+0*0+0")
        );
        assert_eq!(
            trace.rows()[2].to_string(),
            format!("1*27+1*3+0*27*3+{minus_one}*30+0")
        );
    }

    #[test]
    fn printed_rows_parse_back() {
        let trace = cubic_trace(5, 135).padded();

        for format in [TraceFormat::default(), TraceFormat::signed()] {
            let mut out = Vec::new();
            format.write_trace(&trace, &mut out).unwrap();
            let parsed = parse_trace::<Fr>(&String::from_utf8(out).unwrap()).unwrap();

            assert_eq!(parsed.len(), trace.rows().len());
            for (parsed, original) in parsed.iter().zip(trace.rows()) {
                assert_eq!(parsed.values(), original.values());
            }
        }
    }

    #[test]
    fn random_rows_parse_back() {
        let mut rng = rand::thread_rng();
        for _ in 0..8 {
            let row = TraceRow {
                wiring: None,
                l: Fr::random(&mut rng),
                r: Fr::random(&mut rng),
                o: Fr::random(&mut rng),
                selectors: Selectors {
                    ql: Fr::random(&mut rng),
                    qr: Fr::random(&mut rng),
                    qm: Fr::random(&mut rng),
                    qo: Fr::random(&mut rng),
                    qk: Fr::random(&mut rng),
                },
            };

            assert_eq!(parse_row::<Fr>(0, &row.to_string()), Ok(row));
        }
    }

    #[test]
    fn malformed_lines() {
        let reject = |text: &str| {
            assert!(
                matches!(
                    parse_row::<Fr>(7, text),
                    Err(Error::ParseTrace { line: 7, .. })
                ),
                "`{text}` must be rejected"
            );
        };

        reject("");
        reject("0*3+0*3+1*3*3+-1*9");
        reject("0*3+0*3+1*3*3+-1*9+0+0");
        reject("0*3+0*3+1*3+-1*9+0");
        reject("0*3+0*3+1*3*3+-1*9+0*1");
        reject("0*3+0*3+1*3*x+-1*9+0");
        // multiplication term disagrees with the linear terms
        reject("0*3+0*3+1*4*3+-1*12+0");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let rows = parse_trace::<Fr>("\n0*3+0*3+1*3*3+-1*9+0\n\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_sat());
    }
}
