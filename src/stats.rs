//! Dashboard and report counts over a bulk snapshot of the workspace.

use chrono::{
    DateTime, Datelike, Days, LocalResult, Months, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};
use rusqlite::Connection;
use serde::Serialize;
use tracing::warn;

use crate::error::StoreResult;
use crate::model::VehicleStatus;
use crate::store::{MonitoringLogs, Routes, Students, Vehicles};

/// Half-open instant range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        self.start <= *t && *t < self.end
    }
}

pub fn count_in_window(stamps: &[DateTime<Utc>], window: &Window) -> usize {
    stamps.iter().filter(|t| window.contains(t)).count()
}

/// Calendar windows around one instant, in that instant's time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub today: Window,
    pub week: Window,
    pub month: Window,
}

/// First instant of `date` in `tz`. Midnight can fall in a DST gap, in which
/// case the day starts at the first valid local time after it.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => (1..=4 * 60).find_map(|m| {
            let probe = midnight + chrono::Duration::minutes(m);
            tz.from_local_datetime(&probe)
                .earliest()
                .map(|t| t.with_timezone(&Utc))
        }),
    }
}

fn day_span<Tz: TimeZone>(tz: &Tz, first: NaiveDate, last_exclusive: NaiveDate) -> Option<Window> {
    Some(Window {
        start: start_of_day(tz, first)?,
        end: start_of_day(tz, last_exclusive)?,
    })
}

impl Windows {
    pub fn around<Tz: TimeZone>(now: &DateTime<Tz>, week_start: Weekday) -> Option<Windows> {
        let tz = now.timezone();
        let today = now.date_naive();

        let tomorrow = today.checked_add_days(Days::new(1))?;

        let back = (7 + today.weekday().num_days_from_sunday()
            - week_start.num_days_from_sunday())
            % 7;
        let week_first = today.checked_sub_days(Days::new(back.into()))?;
        let week_next = week_first.checked_add_days(Days::new(7))?;

        let month_first = today.with_day(1)?;
        let month_next = month_first.checked_add_months(Months::new(1))?;

        Some(Windows {
            today: day_span(&tz, today, tomorrow)?,
            week: day_span(&tz, week_first, week_next)?,
            month: day_span(&tz, month_first, month_next)?,
        })
    }
}

/// Bulk copy of the columns the counts need.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub student_active: Vec<bool>,
    pub vehicle_status: Vec<VehicleStatus>,
    pub route_active: Vec<bool>,
    pub log_created_at: Vec<DateTime<Utc>>,
}

fn or_empty<T>(what: &str, res: StoreResult<Vec<T>>) -> Vec<T> {
    res.unwrap_or_else(|e| {
        warn!(collection = what, error = %e, "snapshot query failed; counting it as empty");
        Vec::new()
    })
}

impl Snapshot {
    /// One query per collection. A failed query contributes an empty
    /// collection instead of failing the whole snapshot.
    pub fn load(conn: &Connection) -> Snapshot {
        let student_active = or_empty("students", Students::new(conn).active_flags());
        let vehicle_status = or_empty("vehicles", Vehicles::new(conn).statuses());
        let route_active = or_empty("routes", Routes::new(conn).active_flags());
        let raw_stamps = or_empty(
            "monitoring_logs",
            MonitoringLogs::new(conn).created_at_stamps(),
        );
        Snapshot {
            student_active,
            vehicle_status,
            route_active,
            log_created_at: parse_stamps(&raw_stamps),
        }
    }
}

/// Parse stored RFC 3339 stamps, skipping any that do not parse.
pub fn parse_stamps(raw: &[String]) -> Vec<DateTime<Utc>> {
    raw.iter()
        .filter_map(|s| match DateTime::parse_from_rfc3339(s) {
            Ok(t) => Some(t.with_timezone(&Utc)),
            Err(e) => {
                warn!(stamp = %s, error = %e, "skipping unparseable monitoring log timestamp");
                None
            }
        })
        .collect()
}

fn count_true(flags: &[bool]) -> usize {
    flags.iter().filter(|f| **f).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub active_students: usize,
    pub operational_vehicles: usize,
    pub active_routes: usize,
    pub events_today: usize,
    pub events_this_week: usize,
    pub events_this_month: usize,
}

impl ReportStats {
    pub fn compute(snap: &Snapshot, windows: &Windows) -> ReportStats {
        ReportStats {
            active_students: count_true(&snap.student_active),
            operational_vehicles: snap
                .vehicle_status
                .iter()
                .filter(|s| s.is_operational())
                .count(),
            active_routes: count_true(&snap.route_active),
            events_today: count_in_window(&snap.log_created_at, &windows.today),
            events_this_week: count_in_window(&snap.log_created_at, &windows.week),
            events_this_month: count_in_window(&snap.log_created_at, &windows.month),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub active_students: usize,
    pub total_vehicles: usize,
    pub active_vehicles: usize,
    pub total_routes: usize,
    pub active_routes: usize,
    pub events_today: usize,
}

impl DashboardStats {
    pub fn compute(snap: &Snapshot, today: &Window) -> DashboardStats {
        DashboardStats {
            total_students: snap.student_active.len(),
            active_students: count_true(&snap.student_active),
            total_vehicles: snap.vehicle_status.len(),
            active_vehicles: snap
                .vehicle_status
                .iter()
                .filter(|s| s.is_operational())
                .count(),
            total_routes: snap.route_active.len(),
            active_routes: count_true(&snap.route_active),
            events_today: count_in_window(&snap.log_created_at, today),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).expect("offset")
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("stamp")
            .with_timezone(&Utc)
    }

    // Wednesday 2025-08-20, 15:00 in São Paulo.
    fn wednesday() -> DateTime<FixedOffset> {
        brt()
            .with_ymd_and_hms(2025, 8, 20, 15, 0, 0)
            .single()
            .expect("now")
    }

    #[test]
    fn today_uses_local_midnight() {
        let w = Windows::around(&wednesday(), Weekday::Sun).expect("windows");
        assert_eq!(w.today.start, at("2025-08-20T03:00:00Z"));
        assert_eq!(w.today.end, at("2025-08-21T03:00:00Z"));

        // Exactly local midnight belongs to today, one instant earlier does not.
        assert!(w.today.contains(&at("2025-08-20T00:00:00-03:00")));
        assert!(!w.today.contains(&at("2025-08-19T23:59:59.999-03:00")));
        assert!(!w.today.contains(&at("2025-08-21T00:00:00-03:00")));
    }

    #[test]
    fn week_start_is_configurable() {
        let sunday = Windows::around(&wednesday(), Weekday::Sun).expect("windows");
        assert_eq!(sunday.week.start, at("2025-08-17T00:00:00-03:00"));
        assert_eq!(sunday.week.end, at("2025-08-24T00:00:00-03:00"));

        let monday = Windows::around(&wednesday(), Weekday::Mon).expect("windows");
        assert_eq!(monday.week.start, at("2025-08-18T00:00:00-03:00"));

        // A week starting today begins today.
        let wed = Windows::around(&wednesday(), Weekday::Wed).expect("windows");
        assert_eq!(wed.week.start, wed.today.start);

        // Starting tomorrow means the week began six days ago.
        let thu = Windows::around(&wednesday(), Weekday::Thu).expect("windows");
        assert_eq!(thu.week.start, at("2025-08-14T00:00:00-03:00"));
    }

    #[test]
    fn month_spans_calendar_month() {
        let w = Windows::around(&wednesday(), Weekday::Sun).expect("windows");
        assert_eq!(w.month.start, at("2025-08-01T00:00:00-03:00"));
        assert_eq!(w.month.end, at("2025-09-01T00:00:00-03:00"));

        let dec = brt()
            .with_ymd_and_hms(2025, 12, 31, 23, 59, 59)
            .single()
            .expect("now");
        let w = Windows::around(&dec, Weekday::Sun).expect("windows");
        assert_eq!(w.month.end, at("2026-01-01T00:00:00-03:00"));
    }

    #[test]
    fn empty_snapshot_counts_zero() {
        let w = Windows::around(&wednesday(), Weekday::Sun).expect("windows");
        let r = ReportStats::compute(&Snapshot::default(), &w);
        assert_eq!(
            r,
            ReportStats {
                active_students: 0,
                operational_vehicles: 0,
                active_routes: 0,
                events_today: 0,
                events_this_week: 0,
                events_this_month: 0,
            }
        );
        let d = DashboardStats::compute(&Snapshot::default(), &w.today);
        assert_eq!(d.total_students, 0);
        assert_eq!(d.events_today, 0);
    }

    #[test]
    fn report_counts_by_flag_status_and_window() {
        let w = Windows::around(&wednesday(), Weekday::Sun).expect("windows");
        let snap = Snapshot {
            student_active: vec![true, false, true],
            vehicle_status: vec![
                VehicleStatus::Active,
                VehicleStatus::Maintenance,
                VehicleStatus::Inactive,
                VehicleStatus::Active,
            ],
            route_active: vec![false, true],
            log_created_at: vec![
                at("2025-08-20T00:00:00-03:00"), // today, week, month
                at("2025-08-20T23:59:00-03:00"), // today, week, month
                at("2025-08-17T08:00:00-03:00"), // week, month
                at("2025-08-02T08:00:00-03:00"), // month
                at("2025-07-31T23:00:00-03:00"), // none
                at("2025-08-21T01:00:00-03:00"), // week, month (future)
            ],
        };
        let r = ReportStats::compute(&snap, &w);
        assert_eq!(r.active_students, 2);
        assert_eq!(r.operational_vehicles, 2);
        assert_eq!(r.active_routes, 1);
        assert_eq!(r.events_today, 2);
        assert_eq!(r.events_this_week, 4);
        assert_eq!(r.events_this_month, 5);

        let d = DashboardStats::compute(&snap, &w.today);
        assert_eq!(d.total_students, 3);
        assert_eq!(d.total_vehicles, 4);
        assert_eq!(d.active_vehicles, 2);
        assert_eq!(d.total_routes, 2);
        assert_eq!(d.events_today, 2);
    }

    #[test]
    fn one_more_active_record_adds_exactly_one() {
        let w = Windows::around(&wednesday(), Weekday::Sun).expect("windows");
        let base = Snapshot {
            student_active: vec![true, false],
            vehicle_status: vec![VehicleStatus::Maintenance],
            route_active: vec![true],
            log_created_at: vec![at("2025-08-20T10:00:00-03:00")],
        };
        let before = ReportStats::compute(&base, &w);

        let mut more = base.clone();
        more.student_active.push(true);
        more.vehicle_status.push(VehicleStatus::Active);
        more.route_active.push(true);
        more.log_created_at.push(at("2025-08-20T11:00:00-03:00"));
        let after = ReportStats::compute(&more, &w);

        assert_eq!(after.active_students, before.active_students + 1);
        assert_eq!(after.operational_vehicles, before.operational_vehicles + 1);
        assert_eq!(after.active_routes, before.active_routes + 1);
        assert_eq!(after.events_today, before.events_today + 1);
        assert_eq!(after.events_this_week, before.events_this_week + 1);
        assert_eq!(after.events_this_month, before.events_this_month + 1);

        let mut inactive = base.clone();
        inactive.student_active.push(false);
        inactive.vehicle_status.push(VehicleStatus::Inactive);
        assert_eq!(ReportStats::compute(&inactive, &w), before);
    }

    #[test]
    fn bad_stamps_are_skipped() {
        let parsed = parse_stamps(&[
            "2025-08-20T10:00:00.000Z".to_string(),
            "not a date".to_string(),
        ]);
        assert_eq!(parsed, vec![at("2025-08-20T10:00:00Z")]);
    }
}
