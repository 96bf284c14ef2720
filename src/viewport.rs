use crate::model::Granularity;
use crate::window::{Rebaser, Relocation, UnitMapper, WindowSpec};
use chrono::{Local, NaiveDate};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// The horizontally paged list a controller drives. It reports back through
/// [`ViewportController::on_viewable`], [`ViewportController::on_settled`]
/// and [`ViewportController::on_frame`].
pub trait PageHost {
    fn scroll_to_index(&mut self, index: usize, animated: bool);
    fn set_scroll_enabled(&mut self, enabled: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavOptions {
    pub select: bool,
    pub animated: bool,
}

impl NavOptions {
    /// Programmatic move that neither animates nor selects.
    pub const SILENT: NavOptions = NavOptions {
        select: false,
        animated: false,
    };

    pub fn is_silent(&self) -> bool {
        !self.select && !self.animated
    }
}

impl Default for NavOptions {
    fn default() -> Self {
        NavOptions {
            select: true,
            animated: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    /// First day of the month or week now shown.
    UnitChanged(NaiveDate),
    DateSelected(NaiveDate),
}

#[derive(Debug, Clone, Copy)]
struct PendingTeleport {
    index: usize,
    select: Option<NaiveDate>,
}

pub struct ViewportController<H> {
    host: H,
    mapper: UnitMapper,
    rebaser: Rebaser,
    index: usize,
    teleporting: bool,
    pending: Option<PendingTeleport>,
    cooldown: Duration,
    last_nav_at: Option<Instant>,
    last_unit: Option<NaiveDate>,
}

impl<H: PageHost> ViewportController<H> {
    pub fn new(
        host: H,
        granularity: Granularity,
        around: NaiveDate,
        spec: WindowSpec,
        cooldown: Duration,
    ) -> Self {
        let mapper = UnitMapper::new(granularity, around, spec);
        let index = spec.center();
        let last_unit = Some(mapper.unit_at(index));
        ViewportController {
            host,
            mapper,
            rebaser: Rebaser::new(spec),
            index,
            teleporting: false,
            pending: None,
            cooldown,
            last_nav_at: None,
            last_unit,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn mapper(&self) -> &UnitMapper {
        &self.mapper
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_teleporting(&self) -> bool {
        self.teleporting
    }

    /// Unit shown at the current index.
    pub fn current_unit(&self) -> NaiveDate {
        self.mapper.unit_at(self.index)
    }

    pub fn on_viewable(&mut self, index: usize) -> Vec<ViewportEvent> {
        if self.teleporting || index >= self.mapper.spec().size() {
            return Vec::new();
        }
        self.index = index;
        self.emit_unit().into_iter().collect()
    }

    /// Scroll momentum ended.
    pub fn on_settled(&mut self, now: Instant) {
        self.last_nav_at = Some(now);
        if self.teleporting {
            return;
        }
        self.host.set_scroll_enabled(true);
        self.maybe_rebase();
    }

    /// Next animation frame: finishes a pending teleport. The index and base
    /// already agree, only the host still has to catch up.
    pub fn on_frame(&mut self) -> Vec<ViewportEvent> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };
        self.host.scroll_to_index(pending.index, false);
        self.teleporting = false;
        self.host.set_scroll_enabled(true);
        debug!(
            view = self.mapper.granularity().label(),
            index = self.index,
            base_offset = self.mapper.base_offset(),
            "teleport complete"
        );
        let mut events: Vec<ViewportEvent> = self.emit_unit().into_iter().collect();
        if let Some(date) = pending.select {
            events.push(ViewportEvent::DateSelected(date));
        }
        events
    }

    pub fn go_to_previous(&mut self, now: Instant) -> Vec<ViewportEvent> {
        self.go_by(-1, now)
    }

    pub fn go_to_next(&mut self, now: Instant) -> Vec<ViewportEvent> {
        self.go_by(1, now)
    }

    pub fn go_to_today(&mut self, opts: NavOptions, now: Instant) -> Vec<ViewportEvent> {
        self.go_to(Local::now().date_naive(), opts, now)
    }

    /// Shows the unit containing `date`. Silent moves are never rate limited
    /// and take over a teleport already in flight.
    pub fn go_to(&mut self, date: NaiveDate, opts: NavOptions, now: Instant) -> Vec<ViewportEvent> {
        if opts.is_silent() {
            return self.jump(date);
        }
        if self.rejects(now) {
            return Vec::new();
        }
        let select = opts.select.then_some(date);
        self.move_to_offset(self.mapper.offset_of(date), opts.animated, select)
    }

    fn jump(&mut self, date: NaiveDate) -> Vec<ViewportEvent> {
        let target = self.mapper.offset_of(date);
        if self.teleporting {
            debug!(
                view = self.mapper.granularity().label(),
                %date,
                "silent jump supersedes teleport"
            );
            self.mapper.set_base_offset(target);
            self.index = self.mapper.spec().center();
            self.pending = Some(PendingTeleport {
                index: self.index,
                select: None,
            });
            return Vec::new();
        }
        self.move_to_offset(target, false, None)
    }

    fn go_by(&mut self, step: i64, now: Instant) -> Vec<ViewportEvent> {
        if self.rejects(now) {
            return Vec::new();
        }
        let target = self.mapper.offset_at(self.index) + step;
        self.move_to_offset(target, true, None)
    }

    fn move_to_offset(
        &mut self,
        target: i64,
        animated: bool,
        select: Option<NaiveDate>,
    ) -> Vec<ViewportEvent> {
        match self.rebaser.relocate(target, self.mapper.base_offset()) {
            Relocation::Scroll(index) => {
                self.host.scroll_to_index(index, animated);
                self.index = index;
                let mut events: Vec<ViewportEvent> = self.emit_unit().into_iter().collect();
                if let Some(date) = select {
                    events.push(ViewportEvent::DateSelected(date));
                }
                // an instant reposition never produces a settle
                if !animated {
                    self.maybe_rebase();
                }
                events
            }
            Relocation::Rebase { base_offset, index } => {
                debug!(
                    view = self.mapper.granularity().label(),
                    from = self.mapper.base_offset(),
                    to = base_offset,
                    "target outside window, re-basing"
                );
                self.mapper.set_base_offset(base_offset);
                self.begin_teleport(index, select);
                Vec::new()
            }
        }
    }

    fn maybe_rebase(&mut self) {
        if self.teleporting {
            return;
        }
        let Some(plan) = self.rebaser.plan(self.index) else {
            return;
        };
        debug!(
            view = self.mapper.granularity().label(),
            index = self.index,
            new_index = plan.new_index,
            base_delta = plan.base_delta,
            "re-centering window"
        );
        self.mapper.shift_base(plan.base_delta);
        self.begin_teleport(plan.new_index, None);
    }

    fn begin_teleport(&mut self, index: usize, select: Option<NaiveDate>) {
        self.index = index;
        self.teleporting = true;
        self.host.set_scroll_enabled(false);
        self.pending = Some(PendingTeleport { index, select });
    }

    fn rejects(&mut self, now: Instant) -> bool {
        if self.teleporting {
            trace!(view = self.mapper.granularity().label(), "navigation dropped: teleport in flight");
            return true;
        }
        if let Some(last) = self.last_nav_at {
            if now.saturating_duration_since(last) < self.cooldown {
                trace!(view = self.mapper.granularity().label(), "navigation dropped: cooldown");
                return true;
            }
        }
        self.last_nav_at = Some(now);
        false
    }

    fn emit_unit(&mut self) -> Option<ViewportEvent> {
        let unit = self.current_unit();
        if self.last_unit == Some(unit) {
            return None;
        }
        self.last_unit = Some(unit);
        Some(ViewportEvent::UnitChanged(unit))
    }
}
