//! Recurring event expansion.
//!
//! Expands stored events into the occurrences a calendar window needs. The
//! cursor walks the event's local wall-clock time in the calendar's zone, so a
//! 09:00 meeting stays at 09:00 across DST changes, and weekly and monthly
//! series keep their weekday and day of month however far back they began.

use chrono::{DateTime, Days, Months, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::constants::MAX_RECURRENCE_STEPS;
use crate::event::{Event, Recurrence};
use crate::occurrence::Occurrence;
use crate::window::{Window, local_to_utc};

impl Recurrence {
    /// Advance a wall-clock `cursor` by one step. Month steps clamp to the
    /// last day of a shorter month. `None` once the calendar overflows.
    pub fn step(&self, cursor: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Recurrence::Daily => cursor.checked_add_days(Days::new(1)),
            Recurrence::Weekly => cursor.checked_add_days(Days::new(7)),
            Recurrence::Monthly => cursor.checked_add_months(Months::new(1)),
        }
    }

    /// Length of one step in days, for rules with a fixed length.
    fn fixed_days(&self) -> Option<i64> {
        match self {
            Recurrence::Daily => Some(1),
            Recurrence::Weekly => Some(7),
            Recurrence::Monthly => None,
        }
    }
}

/// Expand `events` over `window` in `tz` with the default step limit.
///
/// Every event yields its own occurrence first, unfiltered, followed by the
/// generated occurrences that start inside the window, in ascending order.
pub fn expand_occurrences(events: &[Event], window: &Window, tz: &Tz) -> Vec<Occurrence> {
    expand_occurrences_with_limit(events, window, tz, MAX_RECURRENCE_STEPS)
}

/// Expand `events` over `window` in `tz`, walking at most `max_steps` cursor
/// steps per event. A limit of zero is treated as one.
///
/// Daily and weekly series that began before the window jump ahead by whole
/// steps first, so only steps near or inside the window count toward the
/// limit.
pub fn expand_occurrences_with_limit(
    events: &[Event],
    window: &Window,
    tz: &Tz,
    max_steps: usize,
) -> Vec<Occurrence> {
    let max_steps = max_steps.max(1);
    let mut occurrences = Vec::with_capacity(events.len());

    for event in events {
        occurrences.push(Occurrence::base(event));

        let Some(recurrence) = event.recurrence else {
            continue;
        };

        let (generated, capped) = expand_series(event, recurrence, window, tz, max_steps);
        if capped {
            tracing::debug!(
                event_id = %event.id,
                max_steps,
                "Recurrence expansion reached the step limit"
            );
        }
        occurrences.extend(generated);
    }

    occurrences
}

fn expand_series(
    event: &Event,
    recurrence: Recurrence,
    window: &Window,
    tz: &Tz,
    max_steps: usize,
) -> (Vec<Occurrence>, bool) {
    // Computed once from the stored record; degenerate values propagate as-is.
    let duration = event.duration();
    let series_end = event.recurrence_end_instant(tz).unwrap_or(window.end);

    let mut generated = Vec::new();
    let Some(mut cursor) = fast_forward(event.start, recurrence, window.start, tz) else {
        return (generated, false);
    };

    for _ in 0..max_steps {
        cursor = match recurrence.step(cursor) {
            Some(next) => next,
            None => return (generated, false),
        };

        let start = local_to_utc(cursor, tz);
        if start > series_end || start > window.end {
            return (generated, false);
        }
        if start < window.start {
            continue;
        }

        match Occurrence::generated(event, start, duration) {
            Some(occurrence) => generated.push(occurrence),
            None => return (generated, false),
        }
    }

    (generated, true)
}

/// The wall-clock cursor to start stepping from: the series start, moved
/// forward by whole steps while it stays more than one step before
/// `window_start`. Month rules always start from the series start because
/// clamped days carry forward.
fn fast_forward(
    start: DateTime<Utc>,
    recurrence: Recurrence,
    window_start: DateTime<Utc>,
    tz: &Tz,
) -> Option<NaiveDateTime> {
    let origin = start.with_timezone(tz).naive_local();
    let Some(step_days) = recurrence.fixed_days() else {
        return Some(origin);
    };

    let target = window_start.with_timezone(tz).naive_local();
    let whole_steps = (target - origin).num_days() / step_days;
    if whole_steps <= 1 {
        return Some(origin);
    }

    let skip = u64::try_from((whole_steps - 1) * step_days).ok()?;
    origin.checked_add_days(Days::new(skip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, TimeDelta, TimeZone, Timelike};
    use chrono_tz::UTC;

    use crate::occurrence::{OccurrenceId, real_id};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn make_test_event(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
        Event {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            title: "Test Event".to_string(),
            description: Some("notes".to_string()),
            start,
            end,
            color: "#60a5fa".to_string(),
            all_day: false,
            kind: Some(crate::event::EventKind::Meeting),
            client_id: Some("client-9".to_string()),
            recurrence: None,
            recurrence_end: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>) -> Window {
        Window::new(start, end).unwrap()
    }

    fn generated(occurrences: &[Occurrence]) -> Vec<&Occurrence> {
        occurrences.iter().filter(|o| o.is_generated()).collect()
    }

    #[test]
    fn test_non_recurring_event_appears_exactly_once() {
        let event = make_test_event("e1", utc(2026, 1, 10, 9, 0), utc(2026, 1, 10, 10, 0));
        let w = window(utc(2026, 1, 1, 0, 0), utc(2026, 1, 31, 23, 59));

        let occurrences = expand_occurrences(std::slice::from_ref(&event), &w, &UTC);

        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].id, OccurrenceId::Base("e1".into()));
        assert_eq!(occurrences[0].event, event);
    }

    #[test]
    fn test_base_occurrence_is_never_filtered() {
        let event = make_test_event("early", utc(2025, 6, 1, 9, 0), utc(2025, 6, 1, 10, 0));
        let w = window(utc(2026, 1, 1, 0, 0), utc(2026, 1, 31, 23, 59));

        let occurrences = expand_occurrences(&[event], &w, &UTC);
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].display_id(), "early");
    }

    #[test]
    fn test_monthly_scenario() {
        let mut event = make_test_event("abc123", utc(2026, 1, 15, 9, 0), utc(2026, 1, 15, 10, 0));
        event.recurrence = Some(Recurrence::Monthly);
        event.recurrence_end = NaiveDate::from_ymd_opt(2026, 4, 1);
        let w = window(utc(2026, 1, 1, 0, 0), utc(2026, 3, 31, 0, 0));

        let occurrences = expand_occurrences(&[event], &w, &UTC);

        let starts: Vec<_> = occurrences.iter().map(|o| o.start()).collect();
        assert_eq!(
            starts,
            vec![
                utc(2026, 1, 15, 9, 0),
                utc(2026, 2, 15, 9, 0),
                utc(2026, 3, 15, 9, 0)
            ]
        );
        for occ in &occurrences {
            assert_eq!(occ.end() - occ.start(), TimeDelta::hours(1));
        }
        assert_eq!(
            occurrences[1].display_id(),
            "abc123#2026-02-15T09:00:00.000Z"
        );
    }

    #[test]
    fn test_weekly_occurrences_keep_weekday_time_and_count() {
        // Base event before the window: Tuesday 2025-12-02 14:30.
        let start = utc(2025, 12, 2, 14, 30);
        let mut event = make_test_event("wk", start, start + TimeDelta::minutes(45));
        event.recurrence = Some(Recurrence::Weekly);
        event.recurrence_end = NaiveDate::from_ymd_opt(2026, 3, 1);
        let a = utc(2026, 1, 1, 0, 0);
        let b = utc(2026, 2, 28, 23, 59);
        let w = window(a, b);

        let occurrences = expand_occurrences(std::slice::from_ref(&event), &w, &UTC);
        let repeats = generated(&occurrences);

        let upper = b.min(event.recurrence_end_instant(&UTC).unwrap());
        let lower = a.max(event.start);
        for occ in &repeats {
            assert_eq!(occ.start().weekday(), start.weekday());
            assert_eq!(occ.start().time(), start.time());
            assert!(occ.start() >= lower && occ.start() <= upper);
        }

        // Count of in-window steps: all steps up to `upper` minus those before `a`.
        let total_steps = (upper - event.start).num_weeks();
        let skipped = (a - event.start).num_weeks();
        assert_eq!(repeats.len() as i64, total_steps - skipped);
        assert_eq!(repeats.len(), 8);
    }

    #[test]
    fn test_weekly_count_from_window_start() {
        // Series starting at the window start: floor((min(b, R) - start) / 7 days).
        let start = utc(2026, 1, 1, 8, 0);
        let mut event = make_test_event("wk", start, start + TimeDelta::hours(1));
        event.recurrence = Some(Recurrence::Weekly);
        event.recurrence_end = NaiveDate::from_ymd_opt(2026, 2, 20);
        let w = window(start, utc(2026, 3, 31, 23, 59));

        let occurrences = expand_occurrences(std::slice::from_ref(&event), &w, &UTC);
        let upper = w.end.min(event.recurrence_end_instant(&UTC).unwrap());

        assert_eq!(
            generated(&occurrences).len() as i64,
            (upper - start).num_weeks()
        );
    }

    #[test]
    fn test_duration_preserved_including_degenerate() {
        let start = utc(2026, 1, 5, 12, 0);
        let mut positive = make_test_event("pos", start, start + TimeDelta::minutes(90));
        positive.recurrence = Some(Recurrence::Daily);
        let mut negative = make_test_event("neg", start, start - TimeDelta::minutes(15));
        negative.recurrence = Some(Recurrence::Daily);
        let mut zero = make_test_event("zero", start, start);
        zero.recurrence = Some(Recurrence::Weekly);
        let w = window(utc(2026, 1, 1, 0, 0), utc(2026, 1, 31, 23, 59));

        let events = [positive, negative, zero];
        let occurrences = expand_occurrences(&events, &w, &UTC);

        for occ in &occurrences {
            let base = events.iter().find(|e| e.id == occ.id.base_id()).unwrap();
            assert_eq!(occ.end() - occ.start(), base.end - base.start);
        }
        assert!(generated(&occurrences).len() > 30);
    }

    #[test]
    fn test_recurrence_end_equal_to_window_start_generates_nothing() {
        let start = utc(2026, 2, 1, 0, 0);
        let mut event = make_test_event("stop", start, start + TimeDelta::hours(1));
        event.recurrence = Some(Recurrence::Daily);
        event.recurrence_end = Some(start.date_naive());
        let w = window(start, utc(2026, 2, 28, 23, 59));

        let occurrences = expand_occurrences(&[event], &w, &UTC);
        assert_eq!(occurrences.len(), 1);
        assert!(!occurrences[0].is_generated());
    }

    #[test]
    fn test_daily_series_years_long_in_two_week_window() {
        let start = utc(2026, 1, 1, 7, 0);
        let mut event = make_test_event("gym", start, start + TimeDelta::hours(1));
        event.recurrence = Some(Recurrence::Daily);
        event.recurrence_end = NaiveDate::from_ymd_opt(2036, 1, 1);
        let w = window(utc(2026, 1, 1, 0, 0), utc(2026, 1, 14, 23, 59));

        let occurrences = expand_occurrences(&[event], &w, &UTC);
        let repeats = generated(&occurrences);

        // Jan 2 .. Jan 14.
        assert_eq!(repeats.len(), 13);
        assert_eq!(repeats.first().unwrap().start(), utc(2026, 1, 2, 7, 0));
        assert_eq!(repeats.last().unwrap().start(), utc(2026, 1, 14, 7, 0));
    }

    #[test]
    fn test_step_limit_bounds_runaway_series() {
        let start = utc(2020, 1, 1, 9, 0);
        let mut event = make_test_event("forever", start, start + TimeDelta::hours(1));
        event.recurrence = Some(Recurrence::Daily);
        let w = window(start, utc(2040, 1, 1, 0, 0));

        let occurrences = expand_occurrences(std::slice::from_ref(&event), &w, &UTC);
        assert_eq!(generated(&occurrences).len(), MAX_RECURRENCE_STEPS);

        let raised = expand_occurrences_with_limit(&[event], &w, &UTC, 1000);
        assert_eq!(generated(&raised).len(), 1000);
    }

    #[test]
    fn test_cursor_starts_from_original_start_not_window() {
        // Series began on a Wednesday; window opens on a Sunday.
        let start = utc(2026, 1, 7, 18, 0);
        let mut event = make_test_event("wed", start, start + TimeDelta::hours(2));
        event.recurrence = Some(Recurrence::Weekly);
        let w = window(utc(2026, 3, 1, 0, 0), utc(2026, 3, 31, 23, 59));

        let occurrences = expand_occurrences(&[event], &w, &UTC);
        let days: Vec<u32> = generated(&occurrences)
            .iter()
            .map(|o| o.start().day())
            .collect();
        assert_eq!(days, vec![4, 11, 18, 25]);
    }

    #[test]
    fn test_monthly_clamps_and_keeps_clamped_day() {
        let start = utc(2026, 1, 31, 9, 0);
        let mut event = make_test_event("eom", start, start + TimeDelta::hours(1));
        event.recurrence = Some(Recurrence::Monthly);
        let w = window(utc(2026, 1, 1, 0, 0), utc(2026, 4, 30, 23, 59));

        let occurrences = expand_occurrences(&[event], &w, &UTC);
        let dates: Vec<(u32, u32)> = generated(&occurrences)
            .iter()
            .map(|o| (o.start().month(), o.start().day()))
            .collect();
        assert_eq!(dates, vec![(2, 28), (3, 28), (4, 28)]);
        assert!(generated(&occurrences).iter().all(|o| o.start().hour() == 9));
    }

    #[test]
    fn test_generated_occurrences_copy_base_fields_and_resolve_to_base() {
        let start = utc(2026, 1, 1, 9, 0);
        let mut event = make_test_event("copy", start, start + TimeDelta::hours(1));
        event.recurrence = Some(Recurrence::Daily);
        event.all_day = true;
        let w = window(start, utc(2026, 1, 3, 23, 59));

        let occurrences = expand_occurrences(std::slice::from_ref(&event), &w, &UTC);
        assert_eq!(occurrences.len(), 3);

        for occ in generated(&occurrences) {
            assert_eq!(occ.event.id, event.id);
            assert_eq!(occ.event.title, event.title);
            assert_eq!(occ.event.description, event.description);
            assert_eq!(occ.event.color, event.color);
            assert_eq!(occ.event.all_day, event.all_day);
            assert_eq!(occ.event.kind, event.kind);
            assert_eq!(occ.event.client_id, event.client_id);
            assert_eq!(real_id(&occ.display_id()), "copy");
        }
    }

    #[test]
    fn test_expansion_is_deterministic() {
        let start = utc(2026, 1, 3, 10, 0);
        let mut weekly = make_test_event("a", start, start + TimeDelta::hours(1));
        weekly.recurrence = Some(Recurrence::Weekly);
        let once = make_test_event("b", utc(2026, 1, 4, 10, 0), utc(2026, 1, 4, 11, 0));
        let w = window(utc(2026, 1, 1, 0, 0), utc(2026, 2, 28, 23, 59));
        let events = vec![weekly, once];

        assert_eq!(
            expand_occurrences(&events, &w, &UTC),
            expand_occurrences(&events, &w, &UTC)
        );
    }

    fn local(tz: &Tz, y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        tz.with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_weekly_series_keeps_local_time_across_dst() {
        let tz: Tz = chrono_tz::America::New_York;
        // DST starts on 2026-03-08.
        let start = local(&tz, 2026, 3, 2, 9, 0);
        let mut event = make_test_event("sync", start, start + TimeDelta::hours(1));
        event.recurrence = Some(Recurrence::Weekly);
        let anchor = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let w = crate::window::CalendarView::Month.window(anchor, &tz);

        let occurrences = expand_occurrences(&[event], &w, &tz);
        let local_starts: Vec<(u32, u32)> = generated(&occurrences)
            .iter()
            .map(|o| o.start().with_timezone(&tz))
            .map(|t| (t.day(), t.hour()))
            .collect();

        assert_eq!(local_starts, vec![(9, 9), (16, 9), (23, 9), (30, 9)]);
        for occ in generated(&occurrences) {
            assert_eq!(occ.end() - occ.start(), TimeDelta::hours(1));
        }
    }

    #[test]
    fn test_daily_series_crosses_dst_gap() {
        let tz: Tz = chrono_tz::America::New_York;
        // 02:30 is skipped on 2026-03-08 and reads as 03:30 that day.
        let start = local(&tz, 2026, 3, 6, 2, 30);
        let mut event = make_test_event("night", start, start + TimeDelta::minutes(30));
        event.recurrence = Some(Recurrence::Daily);
        let w = Window::days(
            NaiveDate::from_ymd_opt(2026, 3, 6).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            &tz,
        )
        .unwrap();

        let occurrences = expand_occurrences(&[event], &w, &tz);
        let local_starts: Vec<(u32, u32, u32)> = generated(&occurrences)
            .iter()
            .map(|o| o.start().with_timezone(&tz))
            .map(|t| (t.day(), t.hour(), t.minute()))
            .collect();

        assert_eq!(
            local_starts,
            vec![(7, 2, 30), (8, 3, 30), (9, 2, 30), (10, 2, 30)]
        );
    }

    #[test]
    fn test_recurrence_end_at_window_start_in_zone_east_of_utc() {
        let tz: Tz = chrono_tz::Asia::Tokyo;
        let start = local(&tz, 2026, 1, 20, 8, 0);
        let mut event = make_test_event("d", start, start + TimeDelta::hours(1));
        event.recurrence = Some(Recurrence::Daily);
        event.recurrence_end = NaiveDate::from_ymd_opt(2026, 2, 1);

        let feb_1 = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let w = crate::window::CalendarView::Day.window(feb_1, &tz);
        let occurrences = expand_occurrences(std::slice::from_ref(&event), &w, &tz);
        assert!(generated(&occurrences).is_empty());

        let jan_31 = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let w = crate::window::CalendarView::Day.window(jan_31, &tz);
        let occurrences = expand_occurrences(&[event], &w, &tz);
        let ids: Vec<String> = generated(&occurrences)
            .iter()
            .map(|o| o.display_id())
            .collect();
        assert_eq!(ids, vec!["d#2026-01-30T23:00:00.000Z".to_string()]);
    }

    #[test]
    fn test_old_daily_series_fills_narrow_window() {
        let start = utc(2024, 1, 1, 9, 0);
        let mut event = make_test_event("habit", start, start + TimeDelta::minutes(20));
        event.recurrence = Some(Recurrence::Daily);
        let anchor = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let w = crate::window::CalendarView::Week.window(anchor, &UTC);

        let occurrences = expand_occurrences(&[event], &w, &UTC);
        let repeats = generated(&occurrences);

        assert_eq!(repeats.len(), 7);
        assert_eq!(repeats[0].start(), utc(2026, 3, 15, 9, 0));
        assert_eq!(repeats[6].start(), utc(2026, 3, 21, 9, 0));
    }

    #[test]
    fn test_old_weekly_series_keeps_alignment_after_skipping_ahead() {
        // 2023-01-04 is a Wednesday.
        let start = utc(2023, 1, 4, 17, 0);
        let mut event = make_test_event("review", start, start + TimeDelta::hours(1));
        event.recurrence = Some(Recurrence::Weekly);
        let w = window(utc(2026, 3, 1, 0, 0), utc(2026, 3, 31, 23, 59));

        let occurrences = expand_occurrences(&[event], &w, &UTC);
        let days: Vec<u32> = generated(&occurrences)
            .iter()
            .map(|o| o.start().day())
            .collect();

        assert_eq!(days, vec![4, 11, 18, 25]);
        assert!(generated(&occurrences)
            .iter()
            .all(|o| o.start().weekday() == start.weekday() && o.start().hour() == 17));
    }
}
