use serde_json::json;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Long US date, e.g. `October 17, 2026`. `month_index` is zero-based.
pub fn format_long_date(year: i32, month_index: u32, day: u32) -> Option<String> {
    let month = MONTH_NAMES.get(month_index as usize)?;
    if !(1..=31).contains(&day) {
        return None;
    }
    Some(format!("{month} {day}, {year}"))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublicationStats {
    pub total: usize,
    pub published: usize,
    pub under_review: usize,
}

impl PublicationStats {
    /// `has_status` holds one entry per `.publication-item`: whether it
    /// carries a `.status` marker.
    pub fn from_items(has_status: &[bool], under_review: usize) -> Self {
        Self {
            total: has_status.len(),
            published: has_status.iter().filter(|status| !**status).count(),
            under_review,
        }
    }

    pub fn log_fields(&self) -> serde_json::Value {
        json!({
            "total": self.total,
            "published": self.published,
            "under_review": self.under_review,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_date_uses_month_names() {
        assert_eq!(format_long_date(2026, 9, 17).as_deref(), Some("October 17, 2026"));
        assert_eq!(format_long_date(2025, 0, 1).as_deref(), Some("January 1, 2025"));
        assert_eq!(format_long_date(2025, 12, 1), None);
        assert_eq!(format_long_date(2025, 3, 0), None);
    }

    #[test]
    fn publication_stats_count_items_without_status() {
        let stats = PublicationStats::from_items(&[false, true, false, false], 1);

        assert_eq!(
            stats,
            PublicationStats {
                total: 4,
                published: 3,
                under_review: 1,
            }
        );
        assert_eq!(stats.log_fields()["published"], 3);
    }
}
