/// Time primitives
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch (UTC).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EpochMillis(pub i64);

/// One simulated day, the default animation step.
pub const DAY_MS: i64 = 86_400_000;

impl EpochMillis {
    pub fn saturating_add(self, ms: i64) -> Self {
        EpochMillis(self.0.saturating_add(ms))
    }
}

/// Inclusive `[min, max]` interval of timestamps.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub min: EpochMillis,
    pub max: EpochMillis,
}

impl TimeRange {
    pub fn instant(t: EpochMillis) -> Self {
        Self { min: t, max: t }
    }

    /// Smallest range covering every timestamp, `None` for an empty iterator.
    pub fn covering(times: impl IntoIterator<Item = EpochMillis>) -> Option<Self> {
        let mut out: Option<Self> = None;
        for t in times {
            out = Some(match out {
                None => Self::instant(t),
                Some(r) => Self {
                    min: r.min.min(t),
                    max: r.max.max(t),
                },
            });
        }
        out
    }

    pub fn clamp(&self, t: EpochMillis) -> EpochMillis {
        t.max(self.min).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::{DAY_MS, EpochMillis, TimeRange};

    #[test]
    fn covering_tracks_extremes() {
        let r = TimeRange::covering([EpochMillis(5), EpochMillis(-3), EpochMillis(9)]).unwrap();
        assert_eq!(r.min, EpochMillis(-3));
        assert_eq!(r.max, EpochMillis(9));
        assert!(TimeRange::covering([]).is_none());
    }

    #[test]
    fn clamp_stays_inside() {
        let r = TimeRange {
            min: EpochMillis(0),
            max: EpochMillis(2 * DAY_MS),
        };
        assert_eq!(r.clamp(EpochMillis(-1)), EpochMillis(0));
        assert_eq!(r.clamp(EpochMillis(3 * DAY_MS)), EpochMillis(2 * DAY_MS));
        assert_eq!(r.clamp(EpochMillis(DAY_MS)), EpochMillis(DAY_MS));
    }
}
