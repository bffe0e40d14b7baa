//! emits start-opportunity slots at 15-minute ticks over each day's window,
//! per court.

use crate::model::{Slot, Tournament, SLOT_BLOCK_MINUTES};
use crate::utils::IdVersion;
use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::instrument;
use uuid::Uuid;

/// explicit (day, court) entry for `source = manual`.
#[derive(Debug, Clone)]
pub struct ManualSlotWindow {
    pub day_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub court_number: u32,
    pub court_label: Option<String>,
}

pub enum SlotSource<'a> {
    Auto(&'a Tournament),
    Manual(Vec<ManualSlotWindow>),
}

fn emit_ticks(
    version_id: Uuid,
    day_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    court_number: u32,
    court_label: Option<String>,
) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut tick = start_time;
    let step = Duration::minutes(SLOT_BLOCK_MINUTES as i64);
    while tick < end_time {
        slots.push(Slot::new(
            IdVersion::New,
            version_id,
            day_date,
            tick,
            court_number,
            court_label.clone(),
        ));
        tick += step;
    }
    slots
}

/// `generate_slots(version, source) → { slots_created }`. `source`
/// selects between deriving ticks from the tournament's declared days/courts
/// or an explicit caller-supplied list. `wipe_existing` (deleting the
/// version's current slots first) is the caller's responsibility, mirroring
/// `inventory::generate`.
#[instrument(name = "slots.generate_slots", skip(source))]
pub fn generate_slots(version_id: Uuid, source: SlotSource) -> Vec<Slot> {
    match source {
        SlotSource::Auto(tournament) => tournament
            .get_days()
            .iter()
            .flat_map(|day| {
                (1..=day.courts_available).flat_map(move |court_number| {
                    emit_ticks(
                        version_id,
                        day.date,
                        day.start_time,
                        day.end_time,
                        court_number,
                        day.court_label(court_number).map(str::to_string),
                    )
                })
            })
            .collect(),
        SlotSource::Manual(windows) => windows
            .into_iter()
            .flat_map(|w| {
                emit_ticks(version_id, w.day_date, w.start_time, w.end_time, w.court_number, w.court_label)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TournamentDay;

    fn tournament_with_day(start: &str, end: &str, courts: u32) -> Tournament {
        let mut t = Tournament::new(IdVersion::New, "Test");
        t.add_day(TournamentDay::new(
            NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            courts,
        ));
        t
    }

    #[test]
    fn one_court_three_hour_window_yields_twelve_slots() {
        let tournament = tournament_with_day("09:00", "12:00", 1);
        let slots = generate_slots(Uuid::new_v4(), SlotSource::Auto(&tournament));
        assert_eq!(slots.len(), 12);
        assert_eq!(slots[0].get_start_time(), NaiveTime::parse_from_str("09:00", "%H:%M").unwrap());
    }

    #[test]
    fn multiple_courts_multiply_slot_count() {
        let tournament = tournament_with_day("09:00", "10:00", 3);
        let slots = generate_slots(Uuid::new_v4(), SlotSource::Auto(&tournament));
        assert_eq!(slots.len(), 4 * 3);
    }

    #[test]
    fn sort_key_orders_by_day_then_time_then_court() {
        let tournament = tournament_with_day("09:00", "09:30", 2);
        let mut slots = generate_slots(Uuid::new_v4(), SlotSource::Auto(&tournament));
        slots.sort_by_key(|s| s.sort_key());
        assert_eq!(slots[0].get_court_number(), 1);
        assert_eq!(slots[1].get_court_number(), 2);
    }
}
