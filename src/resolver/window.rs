use chrono::NaiveDate;

use crate::registry::lice::mean_defined;

/// Half-open date range `[start, end)` over which a production year is
/// sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl ProductionWindow {
    /// April 30 to June 1 of `year`, which catches the May sample of a
    /// monthly series whatever day of the month it is stamped with.
    pub fn may(year: i32) -> Option<Self> {
        Some(Self {
            start: NaiveDate::from_ymd_opt(year, 4, 30)?,
            end: NaiveDate::from_ymd_opt(year, 6, 1)?,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Positions on `times` falling inside the window.
    pub fn indices(&self, times: &[NaiveDate]) -> Vec<usize> {
        times
            .iter()
            .enumerate()
            .filter(|(_, t)| self.contains(**t))
            .map(|(i, _)| i)
            .collect()
    }

    /// Mean of the defined samples of `values` (aligned with `times`) inside
    /// the window.
    pub fn mean_in(&self, times: &[NaiveDate], values: &[Option<f64>]) -> Option<f64> {
        mean_defined(
            times
                .iter()
                .zip(values)
                .filter(|(t, _)| self.contains(**t))
                .map(|(_, v)| *v),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_may_window_bounds() {
        let window = ProductionWindow::may(2021).unwrap();

        assert!(window.contains(day(2021, 4, 30)));
        assert!(window.contains(day(2021, 5, 1)));
        assert!(window.contains(day(2021, 5, 31)));
        assert!(!window.contains(day(2021, 6, 1)));
        assert!(!window.contains(day(2021, 4, 29)));
    }

    #[test]
    fn test_mean_in_ignores_missing_and_out_of_window() {
        let window = ProductionWindow::may(2020).unwrap();
        let times = [day(2020, 4, 1), day(2020, 5, 1), day(2020, 5, 15), day(2020, 6, 1)];
        let values = [Some(100.0), Some(10.0), None, Some(100.0)];

        assert_eq!(window.mean_in(&times, &values), Some(10.0));
        assert_eq!(window.indices(&times), vec![1, 2]);
        assert_eq!(window.mean_in(&times, &[None; 4]), None);
    }
}
