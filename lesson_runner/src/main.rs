//! Prints every lesson's records to stdout, in order.

use std::io;

use anyhow::Context;

use lesson_runner::logging::init_logging;
use lesson_runner::LessonRunner;

fn main() -> anyhow::Result<()> {
    init_logging();

    let stdout = io::stdout();
    let mut runner = LessonRunner::new(stdout.lock());
    runner.run_all().context("lesson run failed")?;
    Ok(())
}
