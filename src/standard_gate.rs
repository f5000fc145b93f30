use std::marker::PhantomData;

use halo2_proofs::{
    circuit::{AssignedCell, Cell, Chip, Layouter, Region, Value},
    plonk::{Advice, Column, ConstraintSystem, Error, Fixed, Instance},
    poly::Rotation,
};

use crate::{ff::PrimeField, solver::TraceRow};

#[derive(Debug)]
pub struct RegionCtx<'a, F: PrimeField> {
    region: Region<'a, F>,
    offset: usize,
}

impl<'a, F: PrimeField> RegionCtx<'a, F> {
    pub fn new(region: Region<'a, F>, offset: usize) -> Self {
        RegionCtx { region, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn into_region(self) -> Region<'a, F> {
        self.region
    }

    pub fn assign_fixed<A, AR>(
        &mut self,
        annotation: A,
        column: Column<Fixed>,
        value: F,
    ) -> Result<AssignedCell<F, F>, Error>
    where
        A: Fn() -> AR,
        AR: Into<String>,
    {
        self.region
            .assign_fixed(annotation, column, self.offset, || Value::known(value))
    }

    pub fn assign_advice<A, AR>(
        &mut self,
        annotation: A,
        column: Column<Advice>,
        value: Value<F>,
    ) -> Result<AssignedCell<F, F>, Error>
    where
        A: Fn() -> AR,
        AR: Into<String>,
    {
        self.region
            .assign_advice(annotation, column, self.offset, || value)
    }

    pub fn constrain_equal(&mut self, cell_0: Cell, cell_1: Cell) -> Result<(), Error> {
        self.region.constrain_equal(cell_0, cell_1)
    }

    pub fn next(&mut self) {
        self.offset += 1
    }
}

#[derive(Debug, Clone)]
pub struct StandardGateConfig {
    pub(crate) l: Column<Advice>,
    pub(crate) r: Column<Advice>,
    pub(crate) o: Column<Advice>,

    pub(crate) ql: Column<Fixed>,
    pub(crate) qr: Column<Fixed>,
    pub(crate) qm: Column<Fixed>,
    pub(crate) qo: Column<Fixed>,
    pub(crate) qk: Column<Fixed>,

    pub(crate) instance: Column<Instance>,
}

/// Single halo2 gate `ql·l + qr·r + qm·l·r + qo·o + qk = 0`, one trace row per table row
#[derive(Debug, Clone)]
pub struct StandardGate<F: PrimeField> {
    config: StandardGateConfig,
    _marker: PhantomData<F>,
}

impl<F: PrimeField> Chip<F> for StandardGate<F> {
    type Config = StandardGateConfig;
    type Loaded = ();

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn loaded(&self) -> &Self::Loaded {
        &()
    }
}

impl<F: PrimeField> StandardGate<F> {
    pub fn new(config: StandardGateConfig) -> Self {
        StandardGate {
            config,
            _marker: PhantomData,
        }
    }

    pub fn configure(meta: &mut ConstraintSystem<F>) -> StandardGateConfig {
        let l = meta.advice_column();
        let r = meta.advice_column();
        let o = meta.advice_column();

        let ql = meta.fixed_column();
        let qr = meta.fixed_column();
        let qm = meta.fixed_column();
        let qo = meta.fixed_column();
        let qk = meta.fixed_column();

        let instance = meta.instance_column();

        meta.enable_equality(l);
        meta.enable_equality(r);
        meta.enable_equality(o);
        meta.enable_equality(instance);

        meta.create_gate("ql·l + qr·r + qm·l·r + qo·o + qk = 0", |meta| {
            let l = meta.query_advice(l, Rotation::cur());
            let r = meta.query_advice(r, Rotation::cur());
            let o = meta.query_advice(o, Rotation::cur());

            let ql = meta.query_fixed(ql, Rotation::cur());
            let qr = meta.query_fixed(qr, Rotation::cur());
            let qm = meta.query_fixed(qm, Rotation::cur());
            let qo = meta.query_fixed(qo, Rotation::cur());
            let qk = meta.query_fixed(qk, Rotation::cur());

            vec![ql * l.clone() + qr * r.clone() + qm * l * r + qo * o + qk]
        });

        StandardGateConfig {
            l,
            r,
            o,
            ql,
            qr,
            qm,
            qo,
            qk,
            instance,
        }
    }

    /// Assign selectors and wire values of `row` at the current offset, then advance.
    ///
    /// Returns the `l`, `r`, `o` cells.
    pub fn assign_row(
        &self,
        ctx: &mut RegionCtx<'_, F>,
        row: &TraceRow<F>,
    ) -> Result<[AssignedCell<F, F>; 3], Error> {
        let config = self.config();
        let selectors = &row.selectors;

        ctx.assign_fixed(|| "ql", config.ql, selectors.ql)?;
        ctx.assign_fixed(|| "qr", config.qr, selectors.qr)?;
        ctx.assign_fixed(|| "qm", config.qm, selectors.qm)?;
        ctx.assign_fixed(|| "qo", config.qo, selectors.qo)?;
        ctx.assign_fixed(|| "qk", config.qk, selectors.qk)?;

        let l = ctx.assign_advice(|| "l", config.l, Value::known(row.l))?;
        let r = ctx.assign_advice(|| "r", config.r, Value::known(row.r))?;
        let o = ctx.assign_advice(|| "o", config.o, Value::known(row.o))?;

        ctx.next();
        Ok([l, r, o])
    }

    pub fn expose_public(
        &self,
        mut layouter: impl Layouter<F>,
        cell: Cell,
        row: usize,
    ) -> Result<(), Error> {
        layouter.constrain_instance(cell, self.config().instance, row)
    }
}
