use crate::model::{add_units, units_between, CalendarError, Granularity};
use chrono::NaiveDate;

/// Size of the page list mounted by the host. Pages are addressed by
/// `0..size`; the window's logical zero sits at `center`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    size: usize,
    preload_threshold: usize,
}

impl WindowSpec {
    pub fn new(size: usize, preload_threshold: usize) -> Result<Self, CalendarError> {
        // a re-base must never land inside the opposite trigger zone
        if size < 2 || 2 * preload_threshold + 1 >= size - size / 2 {
            return Err(CalendarError::InvalidWindow {
                size,
                threshold: preload_threshold,
            });
        }
        Ok(WindowSpec {
            size,
            preload_threshold,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn center(&self) -> usize {
        self.size / 2
    }

    pub fn shift(&self) -> usize {
        self.size / 2
    }

    pub fn preload_threshold(&self) -> usize {
        self.preload_threshold
    }

    pub fn contains(&self, index: i64) -> bool {
        index >= 0 && index < self.size as i64
    }
}

/// Maps window indices to calendar units:
/// `unit_at(i) = anchor + (base_offset + i - center) units`.
#[derive(Debug, Clone)]
pub struct UnitMapper {
    granularity: Granularity,
    anchor: NaiveDate,
    base_offset: i64,
    spec: WindowSpec,
}

impl UnitMapper {
    pub fn new(granularity: Granularity, around: NaiveDate, spec: WindowSpec) -> Self {
        UnitMapper {
            granularity,
            anchor: granularity.unit_start(around),
            base_offset: 0,
            spec,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn base_offset(&self) -> i64 {
        self.base_offset
    }

    pub fn spec(&self) -> &WindowSpec {
        &self.spec
    }

    pub fn set_base_offset(&mut self, base_offset: i64) {
        self.base_offset = base_offset;
    }

    pub fn shift_base(&mut self, delta: i64) {
        self.base_offset += delta;
    }

    pub fn offset_at(&self, index: usize) -> i64 {
        self.base_offset + index as i64 - self.spec.center() as i64
    }

    pub fn unit_at(&self, index: usize) -> NaiveDate {
        add_units(self.anchor, self.offset_at(index), self.granularity)
    }

    /// Units from the anchor to the unit containing `date`.
    pub fn offset_of(&self, date: NaiveDate) -> i64 {
        units_between(self.anchor, date, self.granularity)
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let index = self.offset_of(date) - self.base_offset + self.spec.center() as i64;
        self.spec.contains(index).then_some(index as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebasePlan {
    pub base_delta: i64,
    pub new_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// Target is mounted; scroll to it.
    Scroll(usize),
    /// Target is outside the window; move the base so `index` shows it.
    Rebase { base_offset: i64, index: usize },
}

/// Keeps the visible index away from the window edges.
#[derive(Debug, Clone, Copy)]
pub struct Rebaser {
    spec: WindowSpec,
}

impl Rebaser {
    pub fn new(spec: WindowSpec) -> Self {
        Rebaser { spec }
    }

    /// Re-centering needed after a scroll settled at `index`, if any. The
    /// unit shown at `new_index` under the shifted base equals the unit
    /// shown at `index` before.
    pub fn plan(&self, index: usize) -> Option<RebasePlan> {
        let threshold = self.spec.preload_threshold();
        let shift = self.spec.shift();
        let at_head = index <= threshold;
        let at_tail = index >= self.spec.size() - 1 - threshold;
        if at_tail {
            Some(RebasePlan {
                base_delta: shift as i64,
                new_index: index - shift,
            })
        } else if at_head {
            Some(RebasePlan {
                base_delta: -(shift as i64),
                new_index: index + shift,
            })
        } else {
            None
        }
    }

    pub fn relocate(&self, target_offset: i64, base_offset: i64) -> Relocation {
        let center = self.spec.center() as i64;
        let index = target_offset - base_offset + center;
        if self.spec.contains(index) {
            Relocation::Scroll(index as usize)
        } else {
            Relocation::Rebase {
                base_offset: target_offset,
                index: self.spec.center(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeekStart;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_windows_that_rebase_into_a_trigger_zone() {
        assert!(WindowSpec::new(60, 4).is_ok());
        assert!(WindowSpec::new(100, 4).is_ok());
        assert!(WindowSpec::new(120, 4).is_ok());
        assert_eq!(
            WindowSpec::new(16, 4),
            Err(CalendarError::InvalidWindow {
                size: 16,
                threshold: 4
            })
        );
        assert!(WindowSpec::new(1, 0).is_err());
    }

    #[test]
    fn center_maps_to_anchor() {
        let spec = WindowSpec::new(60, 4).unwrap();
        let mapper = UnitMapper::new(Granularity::Month, date(2024, 3, 15), spec);
        assert_eq!(mapper.anchor(), date(2024, 3, 1));
        assert_eq!(mapper.unit_at(30), date(2024, 3, 1));
        assert_eq!(mapper.unit_at(31), date(2024, 4, 1));
        assert_eq!(mapper.unit_at(0), date(2021, 9, 1));
        assert_eq!(mapper.index_of(date(2024, 5, 20)), Some(32));
        assert_eq!(mapper.index_of(date(2030, 1, 1)), None);
    }

    #[test]
    fn rebase_near_head_keeps_content() {
        // window of 60, threshold 4, scrolled from the center down to 3
        let spec = WindowSpec::new(60, 4).unwrap();
        let mut mapper = UnitMapper::new(Granularity::Month, date(2024, 3, 1), spec);
        let rebaser = Rebaser::new(spec);
        let before = mapper.unit_at(3);

        let plan = rebaser.plan(3).unwrap();
        assert_eq!(plan, RebasePlan { base_delta: -30, new_index: 33 });
        mapper.shift_base(plan.base_delta);
        assert_eq!(mapper.base_offset(), -30);
        assert_eq!(mapper.unit_at(33), before);
    }

    #[test]
    fn rebase_keeps_content_for_every_trigger_index() {
        let spec = WindowSpec::new(120, 4).unwrap();
        let rebaser = Rebaser::new(spec);
        for index in 0..spec.size() {
            let mut mapper =
                UnitMapper::new(Granularity::Week(WeekStart::Sunday), date(2024, 3, 15), spec);
            mapper.set_base_offset(17);
            let before = mapper.unit_at(index);
            match rebaser.plan(index) {
                Some(plan) => {
                    mapper.shift_base(plan.base_delta);
                    assert_eq!(mapper.unit_at(plan.new_index), before);
                    assert!(rebaser.plan(plan.new_index).is_none());
                }
                None => assert!(index > 4 && index < 115),
            }
        }
    }

    #[test]
    fn relocate_rebases_far_targets_onto_center() {
        let spec = WindowSpec::new(100, 4).unwrap();
        let rebaser = Rebaser::new(spec);
        assert_eq!(rebaser.relocate(3, 0), Relocation::Scroll(53));
        assert_eq!(rebaser.relocate(-50, 0), Relocation::Scroll(0));
        assert_eq!(
            rebaser.relocate(60, 0),
            Relocation::Rebase {
                base_offset: 60,
                index: 50
            }
        );
    }
}
