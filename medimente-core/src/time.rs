use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_TIME: &str = "09:00";

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[0-9]{1,2}:[0-9]{2}").expect("valid clock regex"))
}

// Checked in order; the first keyword found wins.
const KEYWORD_TIMES: [(&[&str], &str); 4] = [
    (&["mattina"], "08:00"),
    (&["pranzo"], "12:00"),
    (&["sera", "cena"], "18:00"),
    (&["dormire", "notte"], "22:00"),
];

/// Map a free-text time descriptor ("alle 8:30", "dopo cena") to a clock time.
///
/// An explicit `H:MM`/`HH:MM` anywhere in the text is returned verbatim.
/// Otherwise a handful of Italian keywords are recognised, and anything else
/// falls back to [`DEFAULT_TIME`]. Never fails.
pub fn normalize_time(descriptor: &str) -> String {
    if let Some(m) = clock_re().find(descriptor) {
        return m.as_str().to_string();
    }

    let lower = descriptor.to_lowercase();
    KEYWORD_TIMES
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, time)| *time)
        .unwrap_or(DEFAULT_TIME)
        .to_string()
}

/// Split a normalized `H:MM` string into (hour, minute).
///
/// Values are not range-checked; callers add them as durations.
pub fn parse_clock(hhmm: &str) -> Option<(u32, u32)> {
    let (h, m) = hhmm.split_once(':')?;
    let hour = h.trim().parse().ok()?;
    let minute = m.trim().parse().ok()?;
    Some((hour, minute))
}
