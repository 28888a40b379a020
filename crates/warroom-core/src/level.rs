use serde::Serialize;

/// XP floor and title for each level, in ascending order. Level numbers are
/// 1-based positions in this table.
pub const LEVELS: &[(u64, &str)] = &[
    (0, "Initiate"),
    (500, "Apprentice"),
    (1500, "Operator"),
    (3000, "Strategist"),
    (5000, "Architect"),
    (8000, "Commander"),
    (12000, "Sovereign"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelInfo {
    pub level: u32,
    pub title: &'static str,
    pub xp: u64,
    /// XP at which this level starts.
    pub floor: u64,
    /// XP at which the next level starts; `None` at the top level.
    pub next: Option<u64>,
    pub progress_percent: f64,
    pub xp_to_next: u64,
}

pub fn level_for_xp(xp: u64) -> LevelInfo {
    let idx = LEVELS
        .iter()
        .rposition(|(floor, _)| xp >= *floor)
        .unwrap_or(0);
    let (floor, title) = LEVELS[idx];
    let next = LEVELS.get(idx + 1).map(|(f, _)| *f);

    let (progress_percent, xp_to_next) = match next {
        Some(n) => {
            let span = (n - floor) as f64;
            let pct = ((xp - floor) as f64 / span * 100.0).clamp(0.0, 100.0);
            (pct, n - xp)
        }
        None => (100.0, 0),
    };

    LevelInfo {
        level: idx as u32 + 1,
        title,
        xp,
        floor,
        next,
        progress_percent,
        xp_to_next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_xp_is_first_level() {
        let info = level_for_xp(0);
        assert_eq!(info.level, 1);
        assert_eq!(info.title, "Initiate");
        assert_eq!(info.next, Some(500));
        assert_eq!(info.progress_percent, 0.0);
        assert_eq!(info.xp_to_next, 500);
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(level_for_xp(499).title, "Initiate");
        assert_eq!(level_for_xp(500).title, "Apprentice");
        assert_eq!(level_for_xp(8000).level, 6);
    }

    #[test]
    fn progress_is_relative_to_current_band() {
        // 9250 sits in Commander (8000..12000).
        let info = level_for_xp(9250);
        assert_eq!(info.title, "Commander");
        assert!((info.progress_percent - 31.25).abs() < 1e-9);
        assert_eq!(info.xp_to_next, 2750);
    }

    #[test]
    fn top_threshold_is_last_level_at_full_progress() {
        let info = level_for_xp(12_000);
        assert_eq!(info.level, 7);
        assert_eq!(info.title, "Sovereign");
        assert_eq!(info.progress_percent, 100.0);
        assert_eq!(info.next, None);
    }

    #[test]
    fn top_level_is_capped() {
        let info = level_for_xp(1_000_000);
        assert_eq!(info.title, "Sovereign");
        assert_eq!(info.next, None);
        assert_eq!(info.progress_percent, 100.0);
        assert_eq!(info.xp_to_next, 0);
    }
}
