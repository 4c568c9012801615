use std::str::FromStr;

use crate::error::RateError;
use crate::rate::RateController;

/// One textual control command: `<verb>=<integer>` with verb in
/// set / inc / dec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateCommand {
    Set(i64),
    Inc(i64),
    Dec(i64),
}

impl FromStr for RateCommand {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let Some((verb, value)) = trimmed.split_once('=') else {
            return Err(RateError::MalformedCommand {
                reason: format!("missing '=' in {trimmed:?}"),
            });
        };
        let parsed: i64 = value.trim().parse().map_err(|_err| RateError::MalformedCommand {
            reason: format!("value {:?} is not an integer", value.trim()),
        })?;
        match verb.trim() {
            "set" => Ok(RateCommand::Set(parsed)),
            "inc" => Ok(RateCommand::Inc(parsed)),
            "dec" => Ok(RateCommand::Dec(parsed)),
            other => Err(RateError::MalformedCommand {
                reason: format!("unknown verb {other:?}"),
            }),
        }
    }
}

impl RateCommand {
    /// Apply this command to the controller; `Ok` carries the new rate.
    ///
    /// # Errors
    ///
    /// Propagates `InvalidRate` from the controller; state is unchanged on
    /// failure.
    pub fn apply(self, controller: &mut RateController) -> Result<u64, RateError> {
        match self {
            RateCommand::Set(value) => controller.set_qps(value),
            RateCommand::Inc(delta) => controller.inc_qps(delta),
            RateCommand::Dec(delta) => controller.dec_qps(delta),
        }
    }
}
