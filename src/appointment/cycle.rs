//! Fetch/refresh cycle of the appointment list.
//!
//! The cycle is a plain state machine driven by the widget: it hands out a
//! [`FetchTicket`] whenever a fetch must start and is told when that fetch
//! settles. The refresh timer only exists in the `Loaded` phase, so a timer
//! can never fire while a fetch is in flight.

use crate::grid::formatters::timestamp;
use crate::grid::{filter_by_conditions, resolve, ConditionSet, KeyPath};
use serde_json::Value;
use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// Top level render branch of the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingStatus {
    Loading,
    Loaded,
    Failed,
}

/// Identifies one fetch. Results carrying an outdated ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching {
        ticket: FetchTicket,
        /// A refresh was requested while this fetch was running.
        refresh_queued: bool,
    },
    Loaded {
        due: Instant,
    },
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTimer {
    Disabled,
    Armed { interval: Duration, due: Instant },
}

/// Static inputs of the cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSettings {
    pub interval: Duration,
    pub filters: Option<ConditionSet>,
    pub sort_by: KeyPath,
}

#[derive(Debug)]
pub struct RefreshCycle {
    settings: CycleSettings,
    phase: Phase,
    status: LoadingStatus,
    rows: Vec<Value>,
    next_ticket: u64,
}

impl RefreshCycle {
    pub fn new(settings: CycleSettings) -> Self {
        Self {
            settings,
            phase: Phase::Idle,
            status: LoadingStatus::Loading,
            rows: Vec::new(),
            next_ticket: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> LoadingStatus {
        self.status
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn interval(&self) -> Duration {
        self.settings.interval
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.phase, Phase::Fetching { .. })
    }

    pub fn timer(&self) -> RefreshTimer {
        match self.phase {
            Phase::Loaded { due } => RefreshTimer::Armed {
                interval: self.settings.interval,
                due,
            },
            _ => RefreshTimer::Disabled,
        }
    }

    /// Start the initial fetch. Only has an effect once.
    pub fn mount(&mut self) -> Option<FetchTicket> {
        match self.phase {
            Phase::Idle => Some(self.begin_fetch()),
            _ => None,
        }
    }

    /// Start a fetch if the armed timer has expired.
    pub fn poll_timer(&mut self, now: Instant) -> Option<FetchTicket> {
        match self.phase {
            Phase::Loaded { due } if now >= due => {
                tracing::debug!("appointment refresh timer fired");
                Some(self.begin_fetch())
            }
            _ => None,
        }
    }

    /// Explicit refresh (row action or manual). While a fetch is running the
    /// request is queued and started as soon as that fetch settles.
    pub fn request_refresh(&mut self) -> Option<FetchTicket> {
        match &mut self.phase {
            Phase::Fetching { refresh_queued, .. } => {
                *refresh_queued = true;
                None
            }
            _ => Some(self.begin_fetch()),
        }
    }

    /// Apply the outcome of the fetch identified by `ticket`. Returns the
    /// ticket of a follow-up fetch when a refresh was queued meanwhile.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: anyhow::Result<Vec<Value>>,
        now: Instant,
    ) -> Option<FetchTicket> {
        let refresh_queued = match self.phase {
            Phase::Fetching {
                ticket: current,
                refresh_queued,
            } if current == ticket => refresh_queued,
            _ => {
                tracing::debug!(?ticket, "ignoring stale appointment fetch result");
                return None;
            }
        };

        match result {
            Ok(records) => {
                let mut rows = match &self.settings.filters {
                    Some(filters) => filter_by_conditions(records, filters),
                    None => records,
                };
                sort_records(&mut rows, &self.settings.sort_by);
                tracing::debug!(count = rows.len(), "appointments loaded");
                self.rows = rows;
                self.status = LoadingStatus::Loaded;
                self.phase = Phase::Loaded {
                    due: now + self.settings.interval,
                };
            }
            Err(err) => {
                tracing::error!("unable to load appointments: {err:#}");
                self.status = LoadingStatus::Failed;
                self.phase = Phase::Failed;
            }
        }

        refresh_queued.then(|| self.begin_fetch())
    }

    fn begin_fetch(&mut self) -> FetchTicket {
        self.next_ticket += 1;
        let ticket = FetchTicket(self.next_ticket);
        self.phase = Phase::Fetching {
            ticket,
            refresh_queued: false,
        };
        ticket
    }
}

/// Stable ascending sort by the numeric or timestamp value at `key`.
///
/// Records whose value is missing or not comparable keep their relative
/// order and go after all comparable ones.
pub fn sort_records(rows: &mut [Value], key: &KeyPath) {
    rows.sort_by(|a, b| match (sort_value(a, key), sort_value(b, key)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn sort_value(record: &Value, key: &KeyPath) -> Option<f64> {
    let value = resolve(record, key)?;
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .or_else(|| timestamp(Some(value)).map(|t| t.timestamp_millis() as f64)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;

    fn settings() -> CycleSettings {
        CycleSettings {
            interval: Duration::from_secs(30),
            filters: None,
            sort_by: KeyPath::parse("startDateTime").unwrap(),
        }
    }

    fn ids(rows: &[Value]) -> Vec<i64> {
        rows.iter().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    #[test]
    fn mount_starts_single_fetch_with_timer_disabled() {
        let mut cycle = RefreshCycle::new(settings());
        let ticket = cycle.mount();
        assert!(ticket.is_some());
        assert!(cycle.mount().is_none());
        assert_eq!(cycle.status(), LoadingStatus::Loading);
        assert_eq!(cycle.timer(), RefreshTimer::Disabled);
        assert!(cycle.poll_timer(Instant::now() + Duration::from_secs(3600)).is_none());
    }

    #[test]
    fn success_sorts_and_arms_timer() {
        let mut cycle = RefreshCycle::new(settings());
        let ticket = cycle.mount().unwrap();
        let now = Instant::now();
        let rows = vec![
            json!({"id": 3, "startDateTime": 3}),
            json!({"id": 1, "startDateTime": 1}),
            json!({"id": 2, "startDateTime": 2}),
        ];
        assert!(cycle.complete(ticket, Ok(rows), now).is_none());
        assert_eq!(cycle.status(), LoadingStatus::Loaded);
        assert_eq!(ids(cycle.rows()), vec![1, 2, 3]);
        assert_eq!(
            cycle.timer(),
            RefreshTimer::Armed {
                interval: Duration::from_secs(30),
                due: now + Duration::from_secs(30)
            }
        );
    }

    #[test]
    fn iso_timestamps_sort_chronologically() {
        let key = KeyPath::parse("startDateTime").unwrap();
        let mut rows = vec![
            json!({"id": 3, "startDateTime": "2024-03-01T11:00:00Z"}),
            json!({"id": 4}),
            json!({"id": 1, "startDateTime": "2024-03-01T09:00:00Z"}),
            json!({"id": 2, "startDateTime": "2024-03-01T10:00:00Z"}),
        ];
        sort_records(&mut rows, &key);
        assert_eq!(ids(&rows), vec![1, 2, 3, 4]);

        // local timestamps without offset, days apart
        let mut rows = vec![
            json!({"id": 2, "startDateTime": "2024-03-05T08:30:00"}),
            json!({"id": 1, "startDateTime": "2024-03-01T08:30:00"}),
        ];
        sort_records(&mut rows, &key);
        assert_eq!(ids(&rows), vec![1, 2]);
    }

    #[test]
    fn failure_leaves_timer_disabled() {
        let mut cycle = RefreshCycle::new(settings());
        let ticket = cycle.mount().unwrap();
        let now = Instant::now();
        cycle.complete(ticket, Err(anyhow!("connection refused")), now);
        assert_eq!(cycle.status(), LoadingStatus::Failed);
        assert_eq!(cycle.timer(), RefreshTimer::Disabled);
        assert!(cycle.poll_timer(now + Duration::from_secs(3600)).is_none());
    }

    #[test]
    fn timer_fires_only_when_due() {
        let mut cycle = RefreshCycle::new(settings());
        let ticket = cycle.mount().unwrap();
        let now = Instant::now();
        cycle.complete(ticket, Ok(vec![]), now);
        assert!(cycle.poll_timer(now + Duration::from_secs(29)).is_none());
        let next = cycle.poll_timer(now + Duration::from_secs(30)).unwrap();
        assert_ne!(next, ticket);
        assert!(cycle.is_fetching());
        assert_eq!(cycle.timer(), RefreshTimer::Disabled);
        // status stays Loaded while refetching
        assert_eq!(cycle.status(), LoadingStatus::Loaded);
    }

    #[test]
    fn refresh_during_fetch_is_queued() {
        let mut cycle = RefreshCycle::new(settings());
        let first = cycle.mount().unwrap();
        assert!(cycle.request_refresh().is_none());
        let follow_up = cycle.complete(first, Ok(vec![]), Instant::now()).unwrap();
        assert!(cycle.is_fetching());
        assert_ne!(follow_up, first);
        assert!(cycle.complete(follow_up, Ok(vec![]), Instant::now()).is_none());
        assert!(!cycle.is_fetching());
    }

    #[test]
    fn refresh_recovers_from_failure() {
        let mut cycle = RefreshCycle::new(settings());
        let first = cycle.mount().unwrap();
        cycle.complete(first, Err(anyhow!("boom")), Instant::now());
        let retry = cycle.request_refresh().unwrap();
        cycle.complete(retry, Ok(vec![json!({"id": 1})]), Instant::now());
        assert_eq!(cycle.status(), LoadingStatus::Loaded);
        assert_eq!(cycle.rows().len(), 1);
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut cycle = RefreshCycle::new(settings());
        let first = cycle.mount().unwrap();
        cycle.complete(first, Ok(vec![json!({"id": 1})]), Instant::now());
        let second = cycle.request_refresh().unwrap();
        cycle.complete(first, Ok(vec![]), Instant::now());
        assert!(cycle.is_fetching());
        assert_eq!(cycle.rows().len(), 1);
        cycle.complete(second, Ok(vec![json!({"id": 1}), json!({"id": 2})]), Instant::now());
        assert_eq!(cycle.rows().len(), 2);
    }

    #[test]
    fn filters_apply_before_sorting() {
        let mut cycle = RefreshCycle::new(CycleSettings {
            filters: Some(serde_json::from_value(json!({"status": "Scheduled"})).unwrap()),
            ..settings()
        });
        let ticket = cycle.mount().unwrap();
        let rows = vec![
            json!({"id": 1, "status": "Scheduled", "startDateTime": 20}),
            json!({"id": 2, "status": "Cancelled", "startDateTime": 5}),
            json!({"id": 3, "status": "Scheduled", "startDateTime": 10}),
        ];
        cycle.complete(ticket, Ok(rows), Instant::now());
        assert_eq!(ids(cycle.rows()), vec![3, 1]);
    }

    #[test]
    fn sort_is_stable_and_puts_missing_last() {
        let key = KeyPath::parse("startDateTime").unwrap();
        let mut rows = vec![
            json!({"id": 1}),
            json!({"id": 2, "startDateTime": 5}),
            json!({"id": 3, "startDateTime": "2"}),
            json!({"id": 4, "startDateTime": 5}),
            json!({"id": 5, "startDateTime": null}),
        ];
        sort_records(&mut rows, &key);
        assert_eq!(ids(&rows), vec![3, 2, 4, 1, 5]);
    }
}
