use std::collections::BTreeMap;
use std::fmt::Write;

use crate::core::DirectoryStatus;

pub const DEFAULT_BAR_WIDTH: usize = 40;
const FILLED: char = '█';
const EMPTY: char = '░';

/// Text progress bars and status distribution charts.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgressVisualizer;

impl ProgressVisualizer {
    pub fn new() -> Self {
        Self
    }

    pub fn create_progress_bar(&self, percentage: f64, width: usize) -> String {
        create_progress_bar(percentage, width)
    }

    pub fn create_category_chart(&self, statuses: &BTreeMap<String, DirectoryStatus>) -> String {
        create_category_chart(statuses)
    }
}

/// Pure: clamp to [0, 100]; NaN counts as 0.
pub fn clamp_percentage(percentage: f64) -> f64 {
    if percentage.is_nan() {
        0.0
    } else {
        percentage.clamp(0.0, 100.0)
    }
}

/// Pure: `[████░░░░] 50.0%`, exactly `width` cells between the brackets.
pub fn create_progress_bar(percentage: f64, width: usize) -> String {
    let clamped = clamp_percentage(percentage);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);

    let mut bar = String::with_capacity(width * 3 + 12);
    bar.push('[');
    bar.extend(std::iter::repeat_n(FILLED, filled));
    bar.extend(std::iter::repeat_n(EMPTY, width - filled));
    bar.push(']');
    write!(bar, " {:.1}%", clamped).unwrap();
    bar
}

/// Pure: one line per status present, with its count and share.
pub fn create_category_chart(statuses: &BTreeMap<String, DirectoryStatus>) -> String {
    if statuses.is_empty() {
        return "No categories to display\n".to_string();
    }

    let total = statuses.len();
    let mut chart = String::from("Category Status Distribution:\n");
    for status in DirectoryStatus::ALL {
        let count = statuses.values().filter(|s| **s == status).count();
        if count == 0 {
            continue;
        }
        let share = count as f64 * 100.0 / total as f64;
        writeln!(
            chart,
            "  {:<12} {} {} dirs",
            status.title(),
            create_progress_bar(share, 20),
            count
        )
        .unwrap();
    }
    chart
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_cells(bar: &str) -> usize {
        let start = bar.find('[').unwrap() + 1;
        let end = bar.find(']').unwrap();
        bar[start..end].chars().count()
    }

    #[test]
    fn test_progress_bar_clamps() {
        assert!(create_progress_bar(-5.0, 10).ends_with(" 0.0%"));
        assert!(create_progress_bar(150.0, 10).ends_with(" 100.0%"));
        assert!(create_progress_bar(f64::NAN, 10).ends_with(" 0.0%"));
        assert_eq!(create_progress_bar(50.0, 10), "[█████░░░░░] 50.0%");
    }

    #[test]
    fn test_progress_bar_width() {
        for width in [0, 1, 10, 37, 100] {
            for pct in [0.0, 33.3, 99.99, 100.0] {
                assert_eq!(bar_cells(&create_progress_bar(pct, width)), width);
            }
        }
    }

    #[test]
    fn test_category_chart() {
        let mut statuses = BTreeMap::new();
        statuses.insert("docs/".to_string(), DirectoryStatus::Implemented);
        statuses.insert("tests/".to_string(), DirectoryStatus::Missing);
        statuses.insert("src/".to_string(), DirectoryStatus::Missing);

        let chart = create_category_chart(&statuses);
        assert!(chart.starts_with("Category Status Distribution:"));
        assert!(chart.contains("Implemented"));
        assert!(chart.contains("Missing"));
        assert!(chart.contains("2 dirs"));
        assert!(!chart.contains("Partial"));
        assert!(!chart.contains("Conflict"));

        assert!(create_category_chart(&BTreeMap::new()).contains("No categories to display"));
    }
}
