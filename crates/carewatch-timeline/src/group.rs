use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::Serialize;
use ts_rs::TS;

use crate::event::{EventKind, HistoryEvent};

/// Events that fall on one local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup {
    pub date: Date,
    pub events: Vec<HistoryEvent>,
}

impl DayGroup {
    /// Heading such as `Fri Jan 10 2025`.
    pub fn label(&self) -> String {
        self.date.strftime("%a %b %d %Y").to_string()
    }
}

fn local_date(timestamp: Timestamp, tz: &TimeZone) -> Date {
    timestamp.to_zoned(tz.clone()).date()
}

/// Group events by their calendar date in `tz`.
///
/// Groups appear in the order their first event appears, and each group
/// keeps the input order of its events. Calendar days, not rolling 24 hour
/// windows.
pub fn group_by_day(events: &[HistoryEvent], tz: &TimeZone) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    for event in events {
        let date = local_date(event.timestamp, tz);
        match groups.iter_mut().find(|g| g.date == date) {
            Some(group) => group.events.push(event.clone()),
            None => groups.push(DayGroup {
                date,
                events: vec![event.clone()],
            }),
        }
    }
    groups
}

/// Summary counts over an unfiltered timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct TimelineStats {
    pub total: u32,
    pub today: u32,
    pub patients_added: u32,
    pub risk_assessments: u32,
}

impl TimelineStats {
    pub fn compute(events: &[HistoryEvent], now: Timestamp, tz: &TimeZone) -> Self {
        let today = local_date(now, tz);
        let mut stats = Self::default();
        for event in events {
            stats.total += 1;
            if local_date(event.timestamp, tz) == today {
                stats.today += 1;
            }
            match event.kind {
                EventKind::PatientAdded => stats.patients_added += 1,
                EventKind::RiskAssessment => stats.risk_assessments += 1,
            }
        }
        stats
    }
}
