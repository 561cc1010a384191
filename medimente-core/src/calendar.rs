use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use url::Url;

use crate::time::{normalize_time, parse_clock};
use crate::types::MedicationEntry;

pub const DEFAULT_CALENDAR_BASE_URL: &str = "https://calendar.google.com/calendar/render";

const EVENT_MINUTES: i64 = 15;
const DAILY_RECURRENCE: &str = "RRULE:FREQ=DAILY";
const STAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

pub fn default_calendar_base() -> Url {
    Url::parse(DEFAULT_CALENDAR_BASE_URL).expect("valid calendar base URL")
}

pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Start/end of the reminder event in floating local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl EventWindow {
    pub fn for_entry(entry: &MedicationEntry, date: NaiveDate) -> Self {
        let clock = normalize_time(&entry.important_time);
        // `normalize_time` always yields H:MM; the fallback only guards the type.
        let (hour, minute) = parse_clock(&clock).unwrap_or((9, 0));

        let start = date.and_time(NaiveTime::MIN)
            + Duration::hours(i64::from(hour))
            + Duration::minutes(i64::from(minute));
        let end = start + Duration::minutes(EVENT_MINUTES);
        Self { start, end }
    }

    /// `dates` parameter value: `YYYYMMDDTHHMMSS/YYYYMMDDTHHMMSS`.
    pub fn to_dates_param(&self) -> String {
        format!(
            "{}/{}",
            self.start.format(STAMP_FORMAT),
            self.end.format(STAMP_FORMAT)
        )
    }
}

pub fn event_title(entry: &MedicationEntry) -> String {
    format!("Promemoria: {}", entry.medication)
}

pub fn event_details(entry: &MedicationEntry) -> String {
    format!(
        "{} per {}.\n\n---\nGenerato da MediMente.",
        entry.dosage, entry.reason
    )
}

/// Deep-link that opens the calendar's "create event" form with a daily
/// 15-minute reminder for `entry`, starting on `date`.
pub fn build_calendar_link(entry: &MedicationEntry, date: NaiveDate) -> Url {
    build_calendar_link_at(&default_calendar_base(), entry, date)
}

pub fn build_calendar_link_at(base: &Url, entry: &MedicationEntry, date: NaiveDate) -> Url {
    let window = EventWindow::for_entry(entry, date);

    let mut url = base.clone();
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("action", "TEMPLATE")
        .append_pair("text", &event_title(entry))
        .append_pair("details", &event_details(entry))
        .append_pair("dates", &window.to_dates_param())
        .append_pair("recur", DAILY_RECURRENCE);
    url
}
