//! Operator commands accepted by the run loop, one per line.

use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Snapshot the latest frame's measurements.
    Hold,
    /// Rotate toward and drive to every held ball.
    Polar,
    /// Report held X/Y offsets.
    Cartesian,
    /// Fire the striker for the given charge time.
    Strike { charge_duration_ms: u32 },
    Quit,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TriggerParseError {
    #[error("unknown command `{0}` (expected hold, polar, cartesian, strike <ms> or quit)")]
    Unknown(String),

    #[error("strike needs a charge duration in milliseconds, got `{0}`")]
    BadDuration(String),
}

impl FromStr for Trigger {
    type Err = TriggerParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or_default().to_ascii_lowercase();
        let trigger = match head.as_str() {
            "hold" | "h" => Trigger::Hold,
            "polar" | "p" => Trigger::Polar,
            "cartesian" | "c" => Trigger::Cartesian,
            "strike" | "s" => {
                let arg = words.next().unwrap_or_default();
                let charge_duration_ms = arg
                    .parse()
                    .map_err(|_| TriggerParseError::BadDuration(arg.to_string()))?;
                Trigger::Strike { charge_duration_ms }
            }
            "quit" | "q" | "exit" => Trigger::Quit,
            _ => return Err(TriggerParseError::Unknown(line.trim().to_string())),
        };
        Ok(trigger)
    }
}
