use crate::model::{Granularity, WeekStart};
use crate::storage::CalendarConfig;
use crate::sync::{CursorSynchronizer, Mode, ModeDrag, SyncCommand};
use crate::viewport::{NavOptions, PageHost, ViewportController, ViewportEvent};
use crate::window::WindowSpec;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Month,
    Week,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    DateSelected(NaiveDate),
    ModeChanged(Mode),
}

/// Month grid and week strip kept on one cursor date.
pub struct CalendarPanel<H> {
    month: ViewportController<H>,
    week: ViewportController<H>,
    sync: CursorSynchronizer,
    week_start: WeekStart,
    drag: Option<ModeDrag>,
}

impl<H: PageHost> CalendarPanel<H> {
    pub fn new(config: &CalendarConfig, selected: NaiveDate, month_host: H, week_host: H) -> Result<Self> {
        let cooldown = Duration::from_millis(config.nav_cooldown_ms);
        let month_spec = WindowSpec::new(config.month_window, config.preload_threshold)
            .context("month window")?;
        let week_spec = WindowSpec::new(config.week_window, config.preload_threshold)
            .context("week window")?;
        Ok(CalendarPanel {
            month: ViewportController::new(month_host, Granularity::Month, selected, month_spec, cooldown),
            week: ViewportController::new(
                week_host,
                Granularity::Week(config.week_starts_on),
                selected,
                week_spec,
                cooldown,
            ),
            sync: CursorSynchronizer::new(selected, config.week_starts_on),
            week_start: config.week_starts_on,
            drag: None,
        })
    }

    pub fn cursor(&self) -> NaiveDate {
        self.sync.cursor()
    }

    pub fn mode(&self) -> Mode {
        self.sync.mode()
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    pub fn drag_progress(&self) -> f32 {
        self.drag.map(|d| d.progress()).unwrap_or_else(|| self.mode().progress())
    }

    pub fn month(&self) -> &ViewportController<H> {
        &self.month
    }

    pub fn week(&self) -> &ViewportController<H> {
        &self.week
    }

    pub fn host_mut(&mut self, view: View) -> &mut H {
        self.controller(view).host_mut()
    }

    /// User tapped a day cell in either view.
    pub fn select_date(&mut self, date: NaiveDate, now: Instant) -> Vec<PanelEvent> {
        let mut out = Vec::new();
        self.route(View::Month, vec![ViewportEvent::DateSelected(date)], now, &mut out);
        out
    }

    pub fn on_viewable(&mut self, view: View, index: usize, now: Instant) -> Vec<PanelEvent> {
        let events = self.controller(view).on_viewable(index);
        self.dispatch(view, events, now)
    }

    pub fn on_settled(&mut self, view: View, now: Instant) {
        self.controller(view).on_settled(now);
    }

    pub fn on_frame(&mut self, now: Instant) -> Vec<PanelEvent> {
        let mut out = Vec::new();
        for view in [View::Month, View::Week] {
            let events = self.controller(view).on_frame();
            self.route(view, events, now, &mut out);
        }
        out
    }

    pub fn go_to_previous(&mut self, now: Instant) -> Vec<PanelEvent> {
        let view = self.active_view();
        let events = self.controller(view).go_to_previous(now);
        self.dispatch(view, events, now)
    }

    pub fn go_to_next(&mut self, now: Instant) -> Vec<PanelEvent> {
        let view = self.active_view();
        let events = self.controller(view).go_to_next(now);
        self.dispatch(view, events, now)
    }

    pub fn go_to_today(&mut self, select: bool, now: Instant) -> Vec<PanelEvent> {
        let view = self.active_view();
        let opts = NavOptions {
            select,
            animated: true,
        };
        let events = self.controller(view).go_to_today(opts, now);
        self.dispatch(view, events, now)
    }

    pub fn switch_mode(&mut self, mode: Mode, now: Instant) -> Vec<PanelEvent> {
        if mode == self.mode() {
            return Vec::new();
        }
        let mut out = vec![PanelEvent::ModeChanged(mode)];
        let commands = self.sync.switch_mode(mode);
        self.execute(commands, now, &mut out);
        out
    }

    pub fn begin_drag(&mut self) {
        self.drag = Some(ModeDrag::begin(self.drag_progress()));
    }

    pub fn update_drag(&mut self, translation: f32, travel: f32) -> f32 {
        let resting = self.sync.mode().progress();
        let drag = self.drag.get_or_insert_with(|| ModeDrag::begin(resting));
        drag.update(translation, travel)
    }

    pub fn release_drag(&mut self, velocity: f32, now: Instant) -> Vec<PanelEvent> {
        let Some(drag) = self.drag.take() else {
            return Vec::new();
        };
        self.switch_mode(drag.release(velocity), now)
    }

    fn active_view(&self) -> View {
        match self.sync.mode() {
            Mode::Month => View::Month,
            Mode::Week => View::Week,
        }
    }

    fn controller(&mut self, view: View) -> &mut ViewportController<H> {
        match view {
            View::Month => &mut self.month,
            View::Week => &mut self.week,
        }
    }

    fn dispatch(&mut self, view: View, events: Vec<ViewportEvent>, now: Instant) -> Vec<PanelEvent> {
        let mut out = Vec::new();
        self.route(view, events, now, &mut out);
        out
    }

    fn route(&mut self, view: View, events: Vec<ViewportEvent>, now: Instant, out: &mut Vec<PanelEvent>) {
        for event in events {
            let commands = match event {
                ViewportEvent::UnitChanged(unit) => match view {
                    View::Month => self.sync.month_view_changed(unit),
                    View::Week => self.sync.week_view_changed(unit),
                },
                ViewportEvent::DateSelected(date) => {
                    out.push(PanelEvent::DateSelected(date));
                    self.sync.select_date(date)
                }
            };
            self.execute(commands, now, out);
        }
    }

    /// Applies sync jumps and their echoes before returning, so the
    /// synchronizer is back to idle whenever a caller regains control.
    fn execute(&mut self, commands: Vec<SyncCommand>, now: Instant, out: &mut Vec<PanelEvent>) {
        for command in commands {
            let (view, date) = match command {
                SyncCommand::JumpMonth(date) => (View::Month, date),
                SyncCommand::JumpWeek(date) => (View::Week, date),
            };
            let echoes = self.controller(view).go_to(date, NavOptions::SILENT, now);
            self.route(view, echoes, now, out);
            self.sync.finish_sync();
        }
    }
}
