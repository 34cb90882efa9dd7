//! When the runtime should take checkpoints.
//!
//! Two triggers exist: `wallclock_time`, seconds since the manager started,
//! and `simulation_time`, the time reported by the instances. Each trigger
//! has a list of rules; `at_end` additionally requests a checkpoint when the
//! simulation finishes.

use crate::error::{Error, Result};

/// One checkpoint rule.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckpointRule {
    /// Checkpoint at these moments, kept sorted.
    At(Vec<f64>),
    /// Checkpoint every `every` units between `start` and `stop`.
    ///
    /// A missing `start` extends the range back indefinitely, a missing
    /// `stop` forward.
    Range {
        start: Option<f64>,
        stop: Option<f64>,
        every: f64,
    },
}

impl CheckpointRule {
    pub fn at(mut moments: Vec<f64>) -> Result<Self> {
        if moments.iter().any(|m| m.is_nan()) {
            return Err(Error::InvalidCheckpoint("`at` moments must be numbers".into()));
        }
        moments.sort_by(f64::total_cmp);
        Ok(Self::At(moments))
    }

    pub fn range(start: Option<f64>, stop: Option<f64>, every: f64) -> Result<Self> {
        if !(every > 0.0) {
            return Err(Error::InvalidCheckpoint(format!(
                "`every` must be larger than 0, got {every}"
            )));
        }
        if let (Some(start), Some(stop)) = (start, stop) {
            if start > stop {
                return Err(Error::InvalidCheckpoint(format!(
                    "`stop` ({stop}) cannot be smaller than `start` ({start})"
                )));
            }
        }
        Ok(Self::Range { start, stop, every })
    }
}

/// Checkpoint definitions of a configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Checkpoints {
    pub at_end: bool,
    pub wallclock_time: Vec<CheckpointRule>,
    pub simulation_time: Vec<CheckpointRule>,
}

impl Checkpoints {
    /// Whether any checkpoint is requested.
    pub fn is_empty(&self) -> bool {
        !self.at_end && self.wallclock_time.is_empty() && self.simulation_time.is_empty()
    }

    /// Require at least one rule source to be present.
    pub fn check(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::InvalidCheckpoint(
                "a checkpoints section needs `at_end`, `wallclock_time` or `simulation_time`"
                    .into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn at_rules_are_sorted() {
        assert_eq!(
            CheckpointRule::at(vec![10.0, 1.0, 5.5]).unwrap(),
            CheckpointRule::At(vec![1.0, 5.5, 10.0])
        );
    }

    #[test]
    fn range_rules_are_checked() {
        assert!(CheckpointRule::range(None, None, 3600.0).is_ok());
        assert!(CheckpointRule::range(Some(0.0), Some(10.0), 0.0).is_err());
        assert!(CheckpointRule::range(Some(10.0), Some(0.0), 1.0).is_err());
        assert!(CheckpointRule::range(None, None, f64::NAN).is_err());
    }

    #[test]
    fn empty_sections_are_rejected() {
        assert!(Checkpoints::default().check().is_err());
        let at_end = Checkpoints {
            at_end: true,
            ..Default::default()
        };
        assert!(at_end.check().is_ok());
    }
}
