//! Step generation: uniform calendar discretisation of a full extent.
//!
//! Steps start at the extent start and advance one interval at a time using
//! calendar arithmetic. The last step is always the extent end: once a
//! candidate comes within half a step of the end, the end replaces it, so
//! the final two steps are never implausibly close together.

use super::step_interval::TimeStepInterval;
use super::time_extent::{TimeExtent, Timestamp};
use log::{debug, warn};

/// Upper bound on generated steps; larger requests fail instead of allocating.
pub const MAX_STEP_COUNT: usize = 1_000_000;

/// Generate the ordered step instants for `full_extent` at `interval`.
///
/// Returns an empty vector when the extent is empty or reversed, the
/// interval is unusable, calendar arithmetic overflows or stalls, or the
/// sequence would exceed [`MAX_STEP_COUNT`]. A single-instant extent yields
/// exactly one step.
pub fn generate_steps(full_extent: &TimeExtent, interval: &TimeStepInterval) -> Vec<Timestamp> {
    let Some((start, end)) = full_extent.bounds() else {
        return Vec::new();
    };
    if !interval.is_valid() || end < start {
        return Vec::new();
    }
    if start == end {
        return vec![start];
    }

    let half_step = interval.half_step();
    let mut steps = vec![start];
    let mut current = start;

    loop {
        let Some(candidate) = interval.add_to(current) else {
            warn!("Step generation overflowed after {} steps ({})", steps.len(), interval);
            return Vec::new();
        };
        if candidate <= current {
            warn!("Step interval {} does not advance time, no steps generated", interval);
            return Vec::new();
        }

        let reaches_end = candidate
            .checked_add_signed(half_step)
            .is_none_or(|t| t >= end);
        if reaches_end {
            steps.push(end);
            break;
        }

        if steps.len() >= MAX_STEP_COUNT {
            warn!(
                "Step generation exceeded {} steps for {} over {}",
                MAX_STEP_COUNT, interval, full_extent
            );
            return Vec::new();
        }
        steps.push(candidate);
        current = candidate;
    }

    debug!("Generated {} steps for {} over {}", steps.len(), interval, full_extent);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::step_interval::TimeUnit;
    use chrono::{TimeZone, Utc};

    fn utc(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn assert_well_formed(steps: &[Timestamp], extent: &TimeExtent) {
        let (start, end) = extent.bounds().unwrap();
        assert_eq!(steps.first(), Some(&start));
        assert_eq!(steps.last(), Some(&end));
        assert!(steps.windows(2).all(|w| w[0] < w[1]), "steps not strictly increasing");
    }

    #[test]
    fn test_daily_steps_eleven_days() {
        let extent = TimeExtent::new(utc(2020, 1, 1), utc(2020, 1, 11));
        let steps = generate_steps(&extent, &TimeStepInterval::days(1.0));
        assert_eq!(steps.len(), 11);
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(*step, utc(2020, 1, 1 + i as u32));
        }
    }

    #[test]
    fn test_three_day_steps() {
        let extent = TimeExtent::new(utc(2020, 1, 1), utc(2020, 1, 10));
        let steps = generate_steps(&extent, &TimeStepInterval::days(3.0));
        assert_eq!(
            steps,
            vec![utc(2020, 1, 1), utc(2020, 1, 4), utc(2020, 1, 7), utc(2020, 1, 10)]
        );
    }

    #[test]
    fn test_uneven_span_snaps_last_step_to_end() {
        // 10 days at 3-day steps: 01-10 is within half a step of 01-11
        let extent = TimeExtent::new(utc(2020, 1, 1), utc(2020, 1, 11));
        let steps = generate_steps(&extent, &TimeStepInterval::days(3.0));
        assert_eq!(
            steps,
            vec![utc(2020, 1, 1), utc(2020, 1, 4), utc(2020, 1, 7), utc(2020, 1, 11)]
        );

        // 11 days at 3-day steps: 01-10 is 2 days short of 01-12, kept
        let extent = TimeExtent::new(utc(2020, 1, 1), utc(2020, 1, 12));
        let steps = generate_steps(&extent, &TimeStepInterval::days(3.0));
        assert_eq!(
            steps,
            vec![utc(2020, 1, 1), utc(2020, 1, 4), utc(2020, 1, 7), utc(2020, 1, 10), utc(2020, 1, 12)]
        );
    }

    #[test]
    fn test_interval_larger_than_span() {
        let extent = TimeExtent::new(utc(2020, 1, 1), utc(2020, 1, 3));
        let steps = generate_steps(&extent, &TimeStepInterval::years(1.0));
        assert_eq!(steps, vec![utc(2020, 1, 1), utc(2020, 1, 3)]);
    }

    #[test]
    fn test_monthly_steps_follow_calendar() {
        let extent = TimeExtent::new(utc(2020, 1, 31), utc(2020, 6, 30));
        let steps = generate_steps(&extent, &TimeStepInterval::months(1.0));
        assert_well_formed(&steps, &extent);
        assert_eq!(steps[1], utc(2020, 2, 29));
        assert_eq!(steps[2], utc(2020, 3, 29));
        assert_eq!(steps.len(), 6);
    }

    #[test]
    fn test_yearly_steps_over_decade() {
        let extent = TimeExtent::new(utc(2000, 1, 1), utc(2010, 1, 1));
        let steps = generate_steps(&extent, &TimeStepInterval::from_unit(1.0, TimeUnit::Year));
        assert_well_formed(&steps, &extent);
        assert_eq!(steps.len(), 11);
        assert_eq!(steps[4], utc(2004, 1, 1));
    }

    #[test]
    fn test_sub_second_steps() {
        let start = utc(2020, 1, 1);
        let extent = TimeExtent::new(start, start + chrono::TimeDelta::seconds(1));
        let steps = generate_steps(&extent, &TimeStepInterval::from_unit(100.0, TimeUnit::Millisecond));
        assert_well_formed(&steps, &extent);
        assert_eq!(steps.len(), 11);
    }

    #[test]
    fn test_unavailable_inputs_give_no_steps() {
        let extent = TimeExtent::new(utc(2020, 1, 1), utc(2020, 1, 10));
        assert!(generate_steps(&TimeExtent::EMPTY, &TimeStepInterval::days(1.0)).is_empty());
        assert!(generate_steps(&extent, &TimeStepInterval::days(0.0)).is_empty());
        assert!(generate_steps(&extent, &TimeStepInterval::days(-2.0)).is_empty());
        assert!(generate_steps(&extent, &TimeStepInterval::from_unit(0.1, TimeUnit::Nanosecond)).is_empty());
    }

    #[test]
    fn test_single_instant_extent() {
        let extent = TimeExtent::instant(utc(2020, 1, 1));
        assert_eq!(generate_steps(&extent, &TimeStepInterval::days(1.0)), vec![utc(2020, 1, 1)]);
    }

    #[test]
    fn test_well_formed_for_assorted_intervals() {
        let extent = TimeExtent::new(utc(2019, 3, 17), utc(2021, 11, 2));
        for interval in [
            TimeStepInterval::days(1.0),
            TimeStepInterval::days(10.0),
            TimeStepInterval::hours(36.0),
            TimeStepInterval::months(1.0),
            TimeStepInterval::months(5.0),
            TimeStepInterval::years(1.0),
            TimeStepInterval::from_unit(1.0, TimeUnit::Week),
        ] {
            let steps = generate_steps(&extent, &interval);
            assert_well_formed(&steps, &extent);
        }
    }
}
