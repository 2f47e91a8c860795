//! Wall-clock durations of the stages of a run, measured by the caller and
//! handed to the report and the charts as plain values.
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// A stage of a command-line run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Define,
    Solve,
    Write,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Load, Stage::Define, Stage::Solve, Stage::Write];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Load => "Cargar datos",
            Stage::Define => "Definir modelo",
            Stage::Solve => "Resolver modelo",
            Stage::Write => "Guardar resultados",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StageTimings {
    pub load: Duration,
    pub define: Duration,
    pub solve: Duration,
    pub write: Duration,
}

impl StageTimings {
    pub fn get(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Load => self.load,
            Stage::Define => self.define,
            Stage::Solve => self.solve,
            Stage::Write => self.write,
        }
    }

    pub fn set(&mut self, stage: Stage, duration: Duration) {
        match stage {
            Stage::Load => self.load = duration,
            Stage::Define => self.define = duration,
            Stage::Solve => self.solve = duration,
            Stage::Write => self.write = duration,
        }
    }

    pub fn total(&self) -> Duration {
        Stage::ALL.iter().map(|&s| self.get(s)).sum()
    }

    /// `(label, seconds)` pairs in stage order
    pub fn seconds(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        Stage::ALL
            .iter()
            .map(move |&s| (s.label(), self.get(s).as_secs_f64()))
    }
}

impl Display for StageTimings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (label, seconds) in self.seconds() {
            writeln!(f, "{:<22}{:>12.6} s", label, seconds)?;
        }
        write!(f, "{:<22}{:>12.6} s", "Total", self.total().as_secs_f64())
    }
}

/// Run `f` and measure how long it took
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_the_sum_of_the_stages() {
        let mut timings = StageTimings::default();
        timings.set(Stage::Load, Duration::from_millis(5));
        timings.set(Stage::Solve, Duration::from_millis(20));
        assert_eq!(timings.total(), Duration::from_millis(25));
        assert_eq!(timings.seconds().count(), 4);
        assert!(timings.to_string().contains("Resolver modelo"));
    }

    #[test]
    fn timed_returns_the_value() {
        let (value, elapsed) = timed(|| 21 * 2);
        assert_eq!(value, 42);
        assert!(elapsed < Duration::from_secs(1));
    }
}
