use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::calendar::{DayMarks, Month};
use crate::theme;

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub struct MonthView;

impl MonthView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        selected_date: NaiveDate,
        today: NaiveDate,
        marks: &BTreeMap<u32, DayMarks>,
        loading: bool,
    ) {
        let t = theme::current();
        let month = Month::from_date(selected_date);

        let mut block = Block::default()
            .title(format!(" {} ", month))
            .title_style(t.header)
            .borders(Borders::ALL)
            .border_style(t.border);
        if loading {
            block = block.title_bottom(Line::from(Span::styled(" loading... ", t.dim)));
        }

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let header = Line::from(
            DAY_NAMES
                .iter()
                .map(|d| Span::styled(format!("{:^5}", d), t.header))
                .collect::<Vec<_>>(),
        );

        let weeks = week_rows(month)
            .into_iter()
            .map(|week| {
                Line::from(
                    week.into_iter()
                        .map(|day| match day {
                            Some(d) => day_cell(month, d, selected_date, today, marks.get(&d)),
                            None => Span::raw("     "),
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .collect::<Vec<_>>();

        let mut constraints = vec![Constraint::Length(1)];
        constraints.extend(weeks.iter().map(|_| Constraint::Length(1)));
        constraints.push(Constraint::Min(0));
        let rows = Layout::vertical(constraints).split(inner);

        frame.render_widget(Paragraph::new(header), rows[0]);
        for (i, week) in weeks.into_iter().enumerate() {
            frame.render_widget(Paragraph::new(week), rows[i + 1]);
        }
    }
}

/// Day numbers laid out Sunday-first, padded with `None` outside the month.
fn week_rows(month: Month) -> Vec<[Option<u32>; 7]> {
    let offset = month.first_day().weekday().num_days_from_sunday();
    let total = month.days();
    let mut weeks = Vec::new();
    let mut slot = 0u32;
    while slot < offset + total {
        let mut week = [None; 7];
        for cell in week.iter_mut() {
            if slot >= offset && slot < offset + total {
                *cell = Some(slot - offset + 1);
            }
            slot += 1;
        }
        weeks.push(week);
    }
    weeks
}

fn day_cell(
    month: Month,
    day: u32,
    selected: NaiveDate,
    today: NaiveDate,
    marks: Option<&DayMarks>,
) -> Span<'static> {
    let t = theme::current();
    let date = month.clamp_day(day);

    let (marker, marker_color) = match marks {
        Some(m) if m.pending > 0 => ("*", m.top_pending.map(|p| t.priority(p))),
        Some(_) => ("+", None),
        None => (" ", None),
    };

    let style = if date == selected {
        t.selected.add_modifier(if date == today { Modifier::BOLD } else { Modifier::empty() })
    } else if date == today {
        t.today
    } else if let Some(color) = marker_color {
        Style::default().fg(color)
    } else if marks.is_some() {
        t.dim
    } else {
        Style::default()
    };

    Span::styled(format!(" {:>2}{} ", day, marker), style)
}
