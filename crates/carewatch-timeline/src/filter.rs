use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;

use crate::error::TimelineError;
use crate::event::{EventKind, HistoryEvent};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Which event kinds pass the filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KindFilter {
    #[default]
    All,
    Only(EventKind),
}

impl KindFilter {
    pub fn matches(&self, kind: EventKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Only(only) => *only == kind,
        }
    }
}

impl FromStr for KindFilter {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(KindFilter::All),
            other => other.parse().map(KindFilter::Only),
        }
    }
}

/// Maximum age of an event, as picked on the history screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AgeBound {
    #[default]
    Unbounded,
    Days(u32),
}

impl AgeBound {
    /// An event is kept when `now - timestamp`, in fractional days, is at
    /// most the bound. Future timestamps always pass.
    pub fn admits(&self, timestamp: Timestamp, now: Timestamp) -> bool {
        match self {
            AgeBound::Unbounded => true,
            AgeBound::Days(days) => {
                let age = now.duration_since(timestamp).as_secs_f64() / SECONDS_PER_DAY;
                age <= f64::from(*days)
            }
        }
    }
}

impl FromStr for AgeBound {
    type Err = TimelineError;

    /// `"all"` and `""` are unbounded. `"0"` is too, as on the screen.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(AgeBound::Unbounded),
            days => match days.parse::<u32>() {
                Ok(0) => Ok(AgeBound::Unbounded),
                Ok(n) => Ok(AgeBound::Days(n)),
                Err(_) => Err(TimelineError::UnknownAgeBound(s.to_string())),
            },
        }
    }
}

impl fmt::Display for AgeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeBound::Unbounded => f.write_str("all"),
            AgeBound::Days(n) => write!(f, "{n}"),
        }
    }
}

/// Search, kind and age criteria. All three must hold for an event to pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineFilter {
    pub search: String,
    pub kind: KindFilter,
    pub max_age: AgeBound,
}

impl TimelineFilter {
    pub fn matches(&self, event: &HistoryEvent, now: Timestamp) -> bool {
        let needle = self.search.to_lowercase();
        self.matches_with(&needle, event, now)
    }

    fn matches_with(&self, needle: &str, event: &HistoryEvent, now: Timestamp) -> bool {
        (needle.is_empty() || event.mentions(needle))
            && self.kind.matches(event.kind)
            && self.max_age.admits(event.timestamp, now)
    }
}

/// Events passing `criteria`, in their input order.
pub fn filter(events: &[HistoryEvent], criteria: &TimelineFilter, now: Timestamp) -> Vec<HistoryEvent> {
    let needle = criteria.search.to_lowercase();
    events
        .iter()
        .filter(|e| criteria.matches_with(&needle, e, now))
        .cloned()
        .collect()
}
