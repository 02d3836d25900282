use anyhow::{anyhow, bail, ensure};
use logos::{Lexer, Logos};
use std::{fmt, str::FromStr, time::Duration};

/// Transmission rate of a device, in bits per second.
///
/// Units are decimal: `1kbps` is 1 000 bits per second, `1mbps` is
/// 1 000 000 bits per second.
///
/// # Example
///
/// ```
/// # use hybridsim_core::measure::DataRate;
/// # use std::time::Duration;
/// let rate: DataRate = "5mbps".parse().unwrap();
/// assert_eq!(rate.bits_per_sec(), 5_000_000);
///
/// // serializing 1024 bytes at 5mbps takes 1.6384ms
/// assert_eq!(
///     rate.transmission_time(1024),
///     Duration::from_nanos(1_638_400),
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataRate(u64);

const K: u64 = 1_000;
const M: u64 = 1_000_000;
const G: u64 = 1_000_000_000;

impl DataRate {
    /// Create a new [`DataRate`] from a number of bits per second.
    #[inline(always)]
    pub const fn new(bits_per_sec: u64) -> Self {
        Self(bits_per_sec)
    }

    #[inline(always)]
    pub const fn bits_per_sec(self) -> u64 {
        self.0
    }

    /// How long it takes to serialize `bytes` onto the wire at this rate.
    ///
    /// A rate of `0` never completes a transmission; this returns
    /// [`Duration::MAX`] so that callers treat the hop as unreachable
    /// instead of dividing by zero.
    pub fn transmission_time(self, bytes: u64) -> Duration {
        if self.0 == 0 {
            return Duration::MAX;
        }
        let bits = bytes as u128 * 8;
        let nanos = bits * 1_000_000_000 / self.0 as u128;
        Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bps = self.0;
        if bps >= G && bps % G == 0 {
            write!(f, "{}gbps", bps / G)
        } else if bps >= M && bps % M == 0 {
            write!(f, "{}mbps", bps / M)
        } else if bps >= K && bps % K == 0 {
            write!(f, "{}kbps", bps / K)
        } else {
            write!(f, "{bps}bps")
        }
    }
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\f]+")] // Ignore this regex pattern between tokens
enum DataRateToken {
    #[regex("bps|Bps")]
    Bps,
    #[regex("kbps|Kbps")]
    Kbps,
    #[regex("mbps|Mbps")]
    Mbps,
    #[regex("gbps|Gbps")]
    Gbps,

    #[regex("[0-9]+")]
    Value,
}

impl FromStr for DataRate {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lex = Lexer::<'_, DataRateToken>::new(s);

        let number = match lex.next() {
            Some(Ok(DataRateToken::Value)) => lex.slice().parse::<u64>()?,
            _ => bail!("Expecting data rate to start with a number. Cannot parse {s}"),
        };

        let Some(next) = lex.next() else {
            bail!("Expecting a unit (bps, kbps, mbps or gbps), failed to parse: {s}")
        };
        let unit = next.map_err(|()| anyhow!("Failed to parse data rate: {s}"))?;
        let multiplier = match unit {
            DataRateToken::Bps => 1,
            DataRateToken::Kbps => K,
            DataRateToken::Mbps => M,
            DataRateToken::Gbps => G,
            DataRateToken::Value => bail!("Failed to parse `{s}', expecting a unit."),
        };

        ensure!(lex.next().is_none(), "Trailing input in data rate: {s}");

        Ok(Self::new(number * multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!("5mbps".parse::<DataRate>().unwrap(), DataRate::new(M * 5));
        assert_eq!("5Mbps".parse::<DataRate>().unwrap(), DataRate::new(M * 5));
        assert_eq!("54mbps".parse::<DataRate>().unwrap(), DataRate::new(M * 54));
        assert_eq!("10kbps".parse::<DataRate>().unwrap(), DataRate::new(K * 10));
        assert_eq!("1gbps".parse::<DataRate>().unwrap(), DataRate::new(G));
        assert_eq!("800bps".parse::<DataRate>().unwrap(), DataRate::new(800));
    }

    #[test]
    fn parse_invalid() {
        assert!("mbps".parse::<DataRate>().is_err());
        assert!("5".parse::<DataRate>().is_err());
        assert!("5mbps 2".parse::<DataRate>().is_err());
        assert!("".parse::<DataRate>().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(DataRate::new(5 * M).to_string(), "5mbps");
        assert_eq!(DataRate::new(54 * M).to_string(), "54mbps");
        assert_eq!(DataRate::new(2 * G).to_string(), "2gbps");
        assert_eq!(DataRate::new(1_500).to_string(), "1500bps");
    }

    #[test]
    fn transmission_time() {
        // 5mbps, 1024 bytes: 8192 bits / 5_000_000 bps = 1.6384ms
        let rate = DataRate::new(5 * M);
        assert_eq!(
            rate.transmission_time(1024),
            Duration::from_nanos(1_638_400)
        );

        // zero bytes take zero time
        assert_eq!(rate.transmission_time(0), Duration::ZERO);
    }

    #[test]
    fn zero_rate_never_completes() {
        assert_eq!(DataRate::new(0).transmission_time(1), Duration::MAX);
    }

    #[test]
    fn display_round_trip() {
        let original = DataRate::new(5 * M);
        let parsed: DataRate = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }
}
