//! carewatch-timeline
//!
//! One activity log over two independently timestamped sources: patient
//! records and stored risk assessments. Events are built, filtered and
//! grouped by local calendar day; nothing here is persisted.

pub mod aggregate;
pub mod error;
pub mod event;
pub mod filter;
pub mod group;
pub mod timestamp;

pub use aggregate::build_timeline;
pub use error::TimelineError;
pub use event::{EventKind, EventMetadata, HistoryEvent};
pub use filter::{AgeBound, KindFilter, TimelineFilter, filter};
pub use group::{DayGroup, TimelineStats, group_by_day};
pub use timestamp::parse_timestamp;
