use std::{
    fmt,
    io::Write,
    time::{Duration, Instant},
};

use tracing::{debug, info_span, warn};

use crate::{
    preset::{Preset, Variant},
    provider::{Output, Provider},
    task::{Invocation, Task},
    Result,
};

/// One measured phase. Printed as soon as it is taken, never kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    pub stage: String,
    pub elapsed: Duration,
}

impl Timing {
    pub fn since(stage: impl Into<String>, start: Instant) -> Self {
        Self {
            stage: stage.into(),
            elapsed: start.elapsed(),
        }
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.elapsed.as_secs_f64())
    }
}

/// Runs every routine of a preset in order, writing one line per timing to `out`.
///
/// Errors are not caught: the first failing acquisition or inference ends the
/// run, so later routines print nothing.
pub struct Runner<P, W> {
    provider: P,
    out: W,
}

impl<P: Provider, W: Write> Runner<P, W> {
    pub const fn new(provider: P, out: W) -> Self {
        Self { provider, out }
    }

    pub fn run(&mut self, preset: &Preset, inputs: &[&str]) -> Result<()> {
        for task in preset.tasks() {
            self.routine(preset.variant(), task, inputs)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> (P, W) {
        (self.provider, self.out)
    }

    fn routine(&mut self, variant: Variant, task: &Task, inputs: &[&str]) -> Result<()> {
        let title = format!("{} {variant}", task.kind);
        let _span = info_span!("routine", %title, model = %task.model).entered();

        if let Invocation::Translate(options) = &task.invocation {
            if let Some(src_lang) = &options.src_lang {
                warn!(%src_lang, "source language is fixed for every input");
            }
        }

        let start = Instant::now();
        let mut pipeline = self.provider.acquire(task)?;
        self.report(&Timing::since(format!("{title} model loading time"), start))?;

        let start = Instant::now();
        for input in inputs {
            match pipeline.run(input, &task.invocation)? {
                Output::Labels(labels) => {
                    if let Some(best) = labels.first() {
                        let label = task.label(&best.label);
                        debug!(input, label, score = best.score);
                    }
                }
                Output::Translation(translation) => debug!(input, %translation),
            }
        }
        self.report(&Timing::since(format!("{title} pipeline time"), start))?;

        Ok(())
    }

    fn report(&mut self, timing: &Timing) -> Result<()> {
        writeln!(self.out, "{timing}")?;
        self.out.flush()?;
        Ok(())
    }
}
