use chrono::NaiveDateTime;

use super::types::WorkflowStep;

/// Time-of-day and weekday window a step may run in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Schedule<'a> {
    pub time_after: Option<&'a str>,
    pub time_before: Option<&'a str>,
    pub days: &'a [String],
}

impl<'a> Schedule<'a> {
    pub fn for_step(step: &'a WorkflowStep) -> Self {
        Self {
            time_after: step.time_after.as_deref(),
            time_before: step.time_before.as_deref(),
            days: &step.days,
        }
    }

    /// Returns the reason the step may not run at `now`, or `None` when it
    /// is admitted. `HH:MM` values are zero-padded, so string order is
    /// clock order.
    pub fn check(&self, now: NaiveDateTime) -> Option<String> {
        let current_time = now.format("%H:%M").to_string();
        let current_day = now.format("%a").to_string().to_lowercase();

        if !self.days.is_empty() && !self.days.iter().any(|day| *day == current_day) {
            return Some(format!(
                "not scheduled for {current_day} (only {})",
                self.days.join(", ")
            ));
        }

        if let Some(after) = self.time_after.filter(|value| !value.is_empty()) {
            if current_time.as_str() < after {
                return Some(format!(
                    "too early (runs after {after}, now {current_time})"
                ));
            }
        }

        if let Some(before) = self.time_before.filter(|value| !value.is_empty()) {
            if current_time.as_str() >= before {
                return Some(format!(
                    "too late (runs before {before}, now {current_time})"
                ));
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // 2026-10-20 is a Tuesday.
    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 20)
            .and_then(|date| date.and_hms_opt(hour, minute, 30))
            .expect("valid timestamp")
    }

    fn days(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|code| (*code).to_owned()).collect()
    }

    #[test]
    fn no_constraints_always_admit() {
        assert_eq!(Schedule::default().check(at(0, 0)), None);
        assert_eq!(Schedule::default().check(at(23, 59)), None);
    }

    #[test]
    fn day_outside_allowed_set_names_the_set() {
        let allowed = days(&["mon"]);
        let schedule = Schedule {
            days: &allowed,
            ..Schedule::default()
        };
        assert_eq!(
            schedule.check(at(10, 0)).as_deref(),
            Some("not scheduled for tue (only mon)")
        );

        let allowed = days(&["mon", "tue", "wed"]);
        let schedule = Schedule {
            days: &allowed,
            ..Schedule::default()
        };
        assert_eq!(schedule.check(at(10, 0)), None);
    }

    #[test]
    fn time_after_is_inclusive() {
        let schedule = Schedule {
            time_after: Some("23:00"),
            ..Schedule::default()
        };
        assert_eq!(
            schedule.check(at(10, 0)).as_deref(),
            Some("too early (runs after 23:00, now 10:00)")
        );
        assert_eq!(schedule.check(at(23, 0)), None);
    }

    #[test]
    fn time_before_is_exclusive() {
        let schedule = Schedule {
            time_before: Some("11:00"),
            ..Schedule::default()
        };
        assert_eq!(schedule.check(at(10, 59)), None);
        assert_eq!(
            schedule.check(at(11, 0)).as_deref(),
            Some("too late (runs before 11:00, now 11:00)")
        );
    }

    #[test]
    fn day_is_checked_before_time_and_empty_bounds_are_ignored() {
        let allowed = days(&["sat", "sun"]);
        let schedule = Schedule {
            time_after: Some("23:00"),
            time_before: Some(""),
            days: &allowed,
        };
        assert_eq!(
            schedule.check(at(10, 0)).as_deref(),
            Some("not scheduled for tue (only sat, sun)")
        );

        let schedule = Schedule {
            time_after: Some(""),
            time_before: Some(""),
            days: &[],
        };
        assert_eq!(schedule.check(at(10, 0)), None);
    }

    #[test]
    fn reads_window_from_step() {
        let step = WorkflowStep {
            action: "notify".to_owned(),
            time_after: Some("06:00".to_owned()),
            time_before: Some("11:00".to_owned()),
            days: days(&["tue"]),
            ..WorkflowStep::default()
        };
        assert_eq!(Schedule::for_step(&step).check(at(7, 15)), None);
        assert!(Schedule::for_step(&step).check(at(12, 0)).is_some());
    }
}
