use anyhow::{anyhow, bail, ensure};
use logos::{Lexer, Logos};
use std::{fmt, str::FromStr, time::Duration};

/// One-way propagation delay of a segment.
///
/// The delay is precise up to the microsecond; constructing a [`Delay`]
/// from a [`Duration`] with nanosecond precision truncates the nanosecond
/// part.
///
/// # Example
///
/// ```
/// # use hybridsim_core::measure::Delay;
/// # use std::time::Duration;
/// let delay: Delay = "2ms".parse().unwrap();
/// assert_eq!(delay.into_duration(), Duration::from_millis(2));
/// assert_eq!(delay.to_string(), "2ms");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Delay(u64);

impl Delay {
    /// The `0` delay, i.e. instantaneous propagation.
    pub const ZERO: Self = Self::new(Duration::ZERO);

    #[inline(always)]
    pub const fn new(duration: Duration) -> Self {
        Self(duration.as_micros() as u64)
    }

    #[inline(always)]
    pub const fn into_duration(self) -> Duration {
        Duration::from_micros(self.0)
    }
}

impl From<Delay> for Duration {
    fn from(value: Delay) -> Self {
        value.into_duration()
    }
}
impl From<Duration> for Delay {
    fn from(value: Duration) -> Self {
        Self::new(value)
    }
}

impl Default for Delay {
    fn default() -> Self {
        crate::defaults::DEFAULT_DELAY
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let micros = self.0;
        let (secs, millis, micros) = (
            micros / 1_000_000,
            (micros / 1_000) % 1_000,
            micros % 1_000,
        );

        let mut printed = false;
        if secs > 0 {
            write!(f, "{secs}s")?;
            printed = true;
        }
        if millis > 0 {
            write!(f, "{millis}ms")?;
            printed = true;
        }
        if micros > 0 || !printed {
            write!(f, "{micros}us")?;
        }
        Ok(())
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")] // Ignore this regex pattern between tokens
enum DelayToken {
    #[regex("us|µs")]
    MicroSeconds,
    #[token("ms")]
    MilliSeconds,
    #[token("s")]
    Seconds,

    #[regex("[0-9]+")]
    Value,
}

impl FromStr for Delay {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lex = Lexer::<'_, DelayToken>::new(s);

        let mut total = Duration::ZERO;
        let mut components = 0usize;

        while let Some(next) = lex.next() {
            let token = next.map_err(|()| anyhow!("Failed to parse delay: {s}"))?;
            ensure!(
                token == DelayToken::Value,
                "Expecting delay to start with a number. Cannot parse {s}"
            );
            let number: u64 = lex.slice().parse()?;

            let Some(Ok(unit)) = lex.next() else {
                bail!("Expecting a unit (us, ms or s), failed to parse: {s}")
            };
            total += match unit {
                DelayToken::MicroSeconds => Duration::from_micros(number),
                DelayToken::MilliSeconds => Duration::from_millis(number),
                DelayToken::Seconds => Duration::from_secs(number),
                DelayToken::Value => bail!("Failed to parse `{s}', expecting a unit."),
            };
            components += 1;
        }

        ensure!(components > 0, "Empty delay string");
        Ok(Self::new(total))
    }
}
