use std::{io, process};

use clap::Parser;
use prettytable::{row, Cell, Row, Table};
use scs_trace::{
    circuit::CircuitBuilder,
    examples::cubic::CubicCircuit,
    halo2curves::bn256::Fr,
    solver::{Assignment, SolvedTrace},
    trace::TraceFormat,
    util::{fe_from_decimal, mock_prover::MockProver},
};
use tracing::*;
use tracing_subscriber::{filter::LevelFilter, fmt::format::FmtSpan, EnvFilter};

/// Solve `x^3 + x + 5 == y` and print the PLONK trace, one row per line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Secret input, decimal, may be negative
    #[arg(long, default_value = "3", allow_hyphen_values = true)]
    x: String,
    /// Public input, decimal, may be negative
    #[arg(long, default_value = "35", allow_hyphen_values = true)]
    y: String,
    /// Print field elements above `(p - 1) / 2` as negative numbers
    #[arg(long, default_value_t = false)]
    signed: bool,
    /// Pad the trace with zero rows up to the evaluation domain size
    #[arg(long, default_value_t = false)]
    pad: bool,
    /// Print the trace as a table instead of equation lines
    #[arg(long, default_value_t = false)]
    table: bool,
    /// Check the trace with halo2 `MockProver`
    #[arg(long, default_value_t = false)]
    mock_prover: bool,
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn parse_input(name: &str, text: &str) -> Fr {
    fe_from_decimal(text).unwrap_or_else(|| {
        error!("`{text}` is not a valid value for `{name}`");
        process::exit(2)
    })
}

fn print_table(trace: &SolvedTrace<Fr>, format: TraceFormat) {
    let mut table = Table::new();
    table.add_row(row!["row", "ql", "qr", "qm", "qo", "qk", "l", "r", "o"]);

    for (index, trace_row) in trace.rows().iter().enumerate() {
        let [l, r, o, ql, qr, qm, qo, qk] = trace_row.values();
        let mut cells = vec![Cell::new(&index.to_string())];
        cells.extend(
            [ql, qr, qm, qo, qk, l, r, o]
                .iter()
                .map(|value| Cell::new(&format.render(value))),
        );
        table.add_row(Row::new(cells));
    }

    table.printstd();
}

fn main() {
    let args = Args::parse();

    let builder = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    let _span = info_span!("cubic_example").entered();

    let assignment = Assignment::new()
        .with("x", parse_input("x", &args.x))
        .with("y", parse_input("y", &args.y));

    let trace = match CircuitBuilder::<Fr>::from_definition(&CubicCircuit)
        .and_then(|circuit| circuit.compile())
        .and_then(|table| table.solve(&assignment))
    {
        Ok(trace) if args.pad => trace.padded(),
        Ok(trace) => trace,
        Err(err) => {
            error!("{err}");
            process::exit(1)
        }
    };

    let format = TraceFormat { signed: args.signed };
    if args.table {
        print_table(&trace, format);
    } else if let Err(err) = format.write_trace(&trace, &mut io::stdout().lock()) {
        error!("failed to write trace: {err}");
        process::exit(1)
    }

    if args.mock_prover {
        match MockProver::run(&trace).and_then(|prover| prover.verify()) {
            Ok(()) => info!("mock prover accepted the trace"),
            Err(err) => {
                error!("{err}");
                process::exit(1)
            }
        }
    }
}
