use crate::model::{clamp_day_to_month, start_of_month, start_of_week, weekday_index, WeekStart};
use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

/// Drag fraction past which a released drag switches mode.
pub const MODE_SWITCH_PROGRESS: f32 = 0.5;
/// Fling speed (units per second) that switches mode regardless of progress.
pub const MODE_SWITCH_VELOCITY: f32 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Month,
    Week,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Month => "month",
            Mode::Week => "week",
        }
    }

    pub fn toggled(self) -> Mode {
        match self {
            Mode::Month => Mode::Week,
            Mode::Week => Mode::Month,
        }
    }

    /// Collapse progress at rest: 0 shows the month grid, 1 the week strip.
    pub fn progress(&self) -> f32 {
        match self {
            Mode::Month => 0.0,
            Mode::Week => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    SyncingMonth,
    SyncingWeek,
}

/// Silent move the composer must apply to one of the views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    JumpMonth(NaiveDate),
    JumpWeek(NaiveDate),
}

/// Owner of the cursor date shared by the month grid and the week strip.
#[derive(Debug, Clone)]
pub struct CursorSynchronizer {
    cursor: NaiveDate,
    preferred_weekday: u32,
    week_start: WeekStart,
    mode: Mode,
    state: SyncState,
    month_shown: NaiveDate,
    week_shown: NaiveDate,
}

impl CursorSynchronizer {
    pub fn new(selected: NaiveDate, week_start: WeekStart) -> Self {
        CursorSynchronizer {
            cursor: selected,
            preferred_weekday: weekday_index(selected),
            week_start,
            mode: Mode::Month,
            state: SyncState::Idle,
            month_shown: start_of_month(selected),
            week_shown: start_of_week(selected, week_start),
        }
    }

    pub fn cursor(&self) -> NaiveDate {
        self.cursor
    }

    pub fn preferred_weekday(&self) -> u32 {
        self.preferred_weekday
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn month_shown(&self) -> NaiveDate {
        self.month_shown
    }

    pub fn week_shown(&self) -> NaiveDate {
        self.week_shown
    }

    pub fn select_date(&mut self, date: NaiveDate) -> Vec<SyncCommand> {
        if self.state != SyncState::Idle {
            return Vec::new();
        }
        self.cursor = date;
        self.preferred_weekday = weekday_index(date);
        self.realign()
    }

    /// The month grid settled on the month starting at `month_start`.
    pub fn month_view_changed(&mut self, month_start: NaiveDate) -> Vec<SyncCommand> {
        let month_start = start_of_month(month_start);
        let echo = month_start == self.month_shown;
        self.month_shown = month_start;
        match self.state {
            SyncState::SyncingMonth => {
                self.state = SyncState::Idle;
                return Vec::new();
            }
            SyncState::SyncingWeek => return Vec::new(),
            SyncState::Idle if echo => return Vec::new(),
            SyncState::Idle => {}
        }

        let next = clamp_day_to_month(self.cursor.day(), month_start);
        self.set_cursor(next);
        let target = start_of_week(next, self.week_start);
        if target == self.week_shown {
            return Vec::new();
        }
        self.enter(SyncState::SyncingWeek);
        self.week_shown = target;
        vec![SyncCommand::JumpWeek(target)]
    }

    /// The week strip settled on the week starting at `week_start`.
    pub fn week_view_changed(&mut self, week_start: NaiveDate) -> Vec<SyncCommand> {
        let week_start = start_of_week(week_start, self.week_start);
        let echo = week_start == self.week_shown;
        self.week_shown = week_start;
        match self.state {
            SyncState::SyncingWeek => {
                self.state = SyncState::Idle;
                return Vec::new();
            }
            SyncState::SyncingMonth => return Vec::new(),
            SyncState::Idle if echo => return Vec::new(),
            SyncState::Idle => {}
        }

        let column = (self.preferred_weekday % 7 + 7 - self.week_start.index()) % 7;
        let next = week_start + Duration::days(column as i64);
        self.set_cursor(next);
        let target = start_of_month(next);
        if target == self.month_shown {
            return Vec::new();
        }
        self.enter(SyncState::SyncingMonth);
        self.month_shown = target;
        vec![SyncCommand::JumpMonth(next)]
    }

    pub fn switch_mode(&mut self, mode: Mode) -> Vec<SyncCommand> {
        if mode == self.mode {
            return Vec::new();
        }
        debug!(from = self.mode.label(), to = mode.label(), "mode switch");
        self.mode = mode;
        self.realign()
    }

    /// Brings the active view onto the cursor when it no longer shows it.
    pub fn realign(&mut self) -> Vec<SyncCommand> {
        if self.state != SyncState::Idle {
            return Vec::new();
        }
        match self.mode {
            Mode::Month => {
                let target = start_of_month(self.cursor);
                if target == self.month_shown {
                    return Vec::new();
                }
                self.enter(SyncState::SyncingMonth);
                self.month_shown = target;
                vec![SyncCommand::JumpMonth(self.cursor)]
            }
            Mode::Week => {
                let target = start_of_week(self.cursor, self.week_start);
                if target == self.week_shown {
                    return Vec::new();
                }
                self.enter(SyncState::SyncingWeek);
                self.week_shown = target;
                vec![SyncCommand::JumpWeek(target)]
            }
        }
    }

    /// Called once the command returned by the last transition was applied.
    pub fn finish_sync(&mut self) {
        self.state = SyncState::Idle;
    }

    fn set_cursor(&mut self, next: NaiveDate) {
        if next != self.cursor {
            debug!(from = %self.cursor, to = %next, "cursor moved");
            self.cursor = next;
        }
    }

    fn enter(&mut self, state: SyncState) {
        debug!(?state, "silent sync");
        self.state = state;
    }
}

/// Vertical drag on the collapsible calendar. Negative translation and
/// velocity point up, towards the week strip.
#[derive(Debug, Clone, Copy)]
pub struct ModeDrag {
    start: f32,
    progress: f32,
}

impl ModeDrag {
    pub fn begin(progress: f32) -> Self {
        let progress = progress.clamp(0.0, 1.0);
        ModeDrag {
            start: progress,
            progress,
        }
    }

    /// `travel` is the height difference between the month grid and the week strip.
    pub fn update(&mut self, translation: f32, travel: f32) -> f32 {
        let travel = travel.max(1.0);
        self.progress = (self.start - translation / travel).clamp(0.0, 1.0);
        self.progress
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn release(&self, velocity: f32) -> Mode {
        if velocity.abs() > MODE_SWITCH_VELOCITY {
            return if velocity < 0.0 { Mode::Week } else { Mode::Month };
        }
        if self.progress > MODE_SWITCH_PROGRESS {
            Mode::Week
        } else {
            Mode::Month
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn apply(sync: &mut CursorSynchronizer, commands: Vec<SyncCommand>) -> Vec<SyncCommand> {
        // stands in for the composer: the echo arrives while the sync is active
        for command in &commands {
            assert_ne!(sync.state(), SyncState::Idle);
            match *command {
                SyncCommand::JumpMonth(d) => assert!(sync.month_view_changed(start_of_month(d)).is_empty()),
                SyncCommand::JumpWeek(d) => assert!(sync.week_view_changed(d).is_empty()),
            }
            sync.finish_sync();
        }
        commands
    }

    #[test]
    fn month_swipe_clamps_day_and_moves_week() {
        let mut sync = CursorSynchronizer::new(date(2024, 1, 31), WeekStart::Sunday);
        let commands = sync.month_view_changed(date(2024, 2, 1));
        assert_eq!(sync.cursor(), date(2024, 2, 29));
        assert_eq!(commands, vec![SyncCommand::JumpWeek(date(2024, 2, 25))]);
        assert_eq!(sync.state(), SyncState::SyncingWeek);
        apply(&mut sync, commands);
        assert_eq!(sync.state(), SyncState::Idle);
        assert_eq!(sync.week_shown(), date(2024, 2, 25));

        let mut sync = CursorSynchronizer::new(date(2023, 1, 31), WeekStart::Sunday);
        sync.month_view_changed(date(2023, 2, 1));
        assert_eq!(sync.cursor(), date(2023, 2, 28));
    }

    #[test]
    fn week_swipe_uses_preferred_weekday() {
        // 2024-03-15 is a Friday
        let mut sync = CursorSynchronizer::new(date(2024, 3, 15), WeekStart::Sunday);
        assert_eq!(sync.preferred_weekday(), 5);
        let commands = sync.switch_mode(Mode::Week);
        assert!(apply(&mut sync, commands).is_empty());

        assert!(sync.week_view_changed(date(2024, 3, 17)).is_empty());
        assert_eq!(sync.cursor(), date(2024, 3, 22));
        assert!(sync.week_view_changed(date(2024, 3, 24)).is_empty());
        assert_eq!(sync.cursor(), date(2024, 3, 29));

        let commands = sync.week_view_changed(date(2024, 3, 31));
        assert_eq!(sync.cursor(), date(2024, 4, 5));
        assert_eq!(commands, vec![SyncCommand::JumpMonth(date(2024, 4, 5))]);
        apply(&mut sync, commands);
        assert_eq!(sync.month_shown(), date(2024, 4, 1));
    }

    #[test]
    fn preferred_weekday_follows_monday_weeks() {
        let mut sync = CursorSynchronizer::new(date(2024, 3, 17), WeekStart::Monday);
        assert_eq!(sync.preferred_weekday(), 0);
        sync.week_view_changed(date(2024, 3, 18));
        assert_eq!(sync.cursor(), date(2024, 3, 24));
    }

    #[test]
    fn tap_records_weekday_and_realigns_only_the_active_view() {
        let mut sync = CursorSynchronizer::new(date(2024, 3, 20), WeekStart::Sunday);
        assert!(sync.select_date(date(2024, 3, 10)).is_empty());
        assert_eq!(sync.cursor(), date(2024, 3, 10));
        assert_eq!(sync.preferred_weekday(), 0);

        let commands = sync.switch_mode(Mode::Week);
        assert_eq!(commands, vec![SyncCommand::JumpWeek(date(2024, 3, 10))]);
        apply(&mut sync, commands);

        // a tap on a trailing cell of the grid pulls the month along
        sync.switch_mode(Mode::Month);
        let commands = sync.select_date(date(2024, 4, 2));
        assert_eq!(commands, vec![SyncCommand::JumpMonth(date(2024, 4, 2))]);
    }

    #[test]
    fn echoes_are_ignored() {
        let mut sync = CursorSynchronizer::new(date(2024, 3, 15), WeekStart::Sunday);
        assert!(sync.month_view_changed(date(2024, 3, 1)).is_empty());
        assert!(sync.week_view_changed(date(2024, 3, 10)).is_empty());
        assert_eq!(sync.cursor(), date(2024, 3, 15));
        assert_eq!(sync.state(), SyncState::Idle);
    }

    #[test]
    fn re_entrant_changes_are_dropped_during_sync() {
        let mut sync = CursorSynchronizer::new(date(2024, 1, 31), WeekStart::Sunday);
        sync.month_view_changed(date(2024, 2, 1));
        assert_eq!(sync.state(), SyncState::SyncingWeek);

        assert!(sync.month_view_changed(date(2024, 5, 1)).is_empty());
        assert!(sync.select_date(date(2024, 6, 1)).is_empty());
        assert!(sync.realign().is_empty());
        assert_eq!(sync.cursor(), date(2024, 2, 29));
        assert_eq!(sync.state(), SyncState::SyncingWeek);
    }

    #[test]
    fn mode_round_trip_keeps_cursor() {
        let mut sync = CursorSynchronizer::new(date(2024, 3, 15), WeekStart::Sunday);
        sync.select_date(date(2024, 3, 31));
        let commands = sync.switch_mode(Mode::Week);
        apply(&mut sync, commands);
        let commands = sync.switch_mode(Mode::Month);
        apply(&mut sync, commands);
        assert_eq!(sync.cursor(), date(2024, 3, 31));
        assert_eq!(sync.mode(), Mode::Month);
    }

    #[test]
    fn drag_release_thresholds() {
        let mut drag = ModeDrag::begin(Mode::Month.progress());
        assert_eq!(drag.update(-150.0, 250.0), 0.6);
        assert_eq!(drag.release(0.0), Mode::Week);
        assert_eq!(drag.release(900.0), Mode::Month);

        let mut drag = ModeDrag::begin(0.0);
        drag.update(-50.0, 250.0);
        assert_eq!(drag.release(-200.0), Mode::Month);
        assert_eq!(drag.release(-801.0), Mode::Week);

        assert_eq!(drag.update(-1000.0, 250.0), 1.0);
        assert_eq!(drag.update(400.0, 0.0), 0.0);
    }
}
