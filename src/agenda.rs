use std::fmt::Write;

use chrono::{Local, NaiveDate};

use crate::api::{Pet, ReminderSource, Scope};
use crate::calendar::session::MAX_PAGES;
use crate::calendar::{CalendarIndex, Month, MonthPlan, ReminderAggregator};
use crate::error::FetchError;

/// Parse `YYYY-MM` into a month.
pub fn parse_month(s: &str) -> Result<Month, String> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .map(Month::from_date)
        .map_err(|_| format!("expected YYYY-MM, got {:?}", s))
}

/// Load whatever is needed to list `month` and render it as plain text.
pub async fn month_agenda<S: ReminderSource>(
    source: S,
    scope: Scope,
    page_size: u32,
    month: Month,
) -> Result<String, FetchError> {
    let pets = source.list_pets().await.unwrap_or_default();
    let mut agg = ReminderAggregator::new(source, scope, page_size);
    agg.load_initial().await?;

    for _ in 0..MAX_PAGES {
        if !matches!(agg.ensure_month_loaded(month).await, MonthPlan::Fetch(_)) {
            break;
        }
    }
    Ok(format_agenda(month, agg.session().index(), &pets))
}

pub fn format_agenda(month: Month, index: &CalendarIndex, pets: &[Pet]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", month);

    let days = index.days_in(month);
    if days.is_empty() {
        let _ = writeln!(out, "  no reminders");
        return out;
    }

    for day in days.keys() {
        let date = month.clamp_day(*day);
        let _ = writeln!(out, "\n{}", date.format("%a %d"));
        for r in index.on(date) {
            let _ = writeln!(
                out,
                "  [{}] {} {:<6} {} ({})",
                if r.is_completed { "x" } else { " " },
                r.reminder_date.with_timezone(&Local).format("%H:%M"),
                r.priority.label(),
                r.title,
                r.pet_name(pets),
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{at, reminder, FakeSource};

    #[test]
    fn parses_year_month() {
        assert_eq!(parse_month("2024-05"), Ok(Month::new(2024, 5).unwrap()));
        assert!(parse_month("May 2024").is_err());
        assert!(parse_month("2024-13").is_err());
    }

    #[tokio::test]
    async fn agenda_walks_pages_until_month_appears() {
        let mut items: Vec<_> = (0..40u32)
            .map(|i| reminder(&format!("j{}", i), at(2024, 6, 1 + i % 28, 12)))
            .collect();
        let mut old = reminder("m1", at(2024, 5, 14, 12));
        old.title = "Rabies booster".to_string();
        items.push(old);
        let fake = FakeSource::with(Scope::All, items);
        fake.pets.lock().await.push(Pet { id: "p1".into(), name: "Milo".into(), species: None });

        let text = month_agenda(fake, Scope::All, 20, Month::new(2024, 5).unwrap())
            .await
            .expect("agenda");
        assert!(text.starts_with("May 2024"));
        assert!(text.contains("Tue 14"));
        assert!(text.contains("Rabies booster (Milo)"));
    }

    #[tokio::test]
    async fn empty_month_is_not_an_error() {
        let fake = FakeSource::with(Scope::All, vec![reminder("a", at(2024, 6, 3, 12))]);
        let text = month_agenda(fake, Scope::All, 20, Month::new(2023, 1).unwrap())
            .await
            .expect("agenda");
        assert!(text.contains("no reminders"));
    }
}
