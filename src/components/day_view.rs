use chrono::{Local, NaiveDate};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::api::{Pet, Reminder};
use crate::calendar::ReminderSession;
use crate::theme;

pub struct DayView;

impl DayView {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        date: NaiveDate,
        session: &ReminderSession,
        pets: &[Pet],
        selected: usize,
    ) {
        let t = theme::current();
        let reminders = session.on(date);
        let w = area.width as usize;

        let title = if w >= 30 {
            format!(" {} ", date.format("%A, %B %d, %Y"))
        } else if w >= 18 {
            format!(" {} ", date.format("%b %d, %Y"))
        } else {
            format!(" {} ", date.format("%m/%d"))
        };

        let done = reminders.iter().filter(|r| r.is_completed).count();
        let count_str = match reminders.len() {
            0 => String::new(),
            n => format!(" {} reminder{}, {} done ", n, if n == 1 { "" } else { "s" }, done),
        };

        let block = Block::default()
            .title(title)
            .title_style(t.header)
            .title_bottom(Line::from(Span::styled(count_str, t.dim)))
            .borders(Borders::ALL)
            .border_style(t.border);

        if reminders.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(Paragraph::new("No reminders").style(t.dim), inner);
            return;
        }

        let items: Vec<ListItem> = reminders
            .iter()
            .map(|r| format_reminder(r, pets, session.is_toggling(&r.id)))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(t.selected);
        let mut state = ListState::default().with_selected(Some(selected.min(reminders.len() - 1)));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn format_reminder(rem: &Reminder, pets: &[Pet], saving: bool) -> ListItem<'static> {
    let t = theme::current();
    let priority = Span::styled("  ", Style::default().bg(t.priority(rem.priority)));

    let checkbox = match (rem.is_completed, saving) {
        (_, true) => " [~] ",
        (true, false) => " [x] ",
        (false, false) => " [ ] ",
    };

    let time = rem.reminder_date.with_timezone(&Local).format("%H:%M ").to_string();
    let title_style = if rem.is_completed {
        Style::default().add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
    } else {
        Style::default()
    };

    ListItem::new(Line::from(vec![
        priority,
        Span::raw(checkbox),
        Span::styled(time, t.dim),
        Span::styled(rem.title.clone(), title_style),
        Span::styled(format!(" ({})", rem.pet_name(pets)), t.dim),
    ]))
}

/// Render the selected reminder's details over `area`.
pub fn render_detail_popup(frame: &mut Frame, area: Rect, rem: &Reminder, pets: &[Pet]) {
    let t = theme::current();
    let popup_w = area.width.clamp(30, 60);
    let popup_h = area.height.clamp(8, 16);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h).intersection(area);

    frame.render_widget(Clear, popup_area);

    let color = t.priority(rem.priority);
    let block = Block::default()
        .title(format!(" {} ", rem.title))
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let field = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, t.dim), Span::raw(value)])
    };

    let due = rem.reminder_date.with_timezone(&Local);
    let status = match rem.completed_at {
        Some(at) if rem.is_completed => format!(
            "Completed {}",
            at.with_timezone(&Local).format("%b %d, %H:%M")
        ),
        _ => "Open".to_string(),
    };

    let mut lines = vec![
        field("Pet:      ", rem.pet_name(pets).to_string()),
        field("Type:     ", rem.reminder_type.label().to_string()),
        field("Priority: ", rem.priority.label().to_string()),
        field("Due:      ", due.format("%A, %B %d, %Y %H:%M").to_string()),
        field("Status:   ", status),
    ];

    if let Some(desc) = &rem.description {
        lines.push(Line::from(""));
        lines.extend(desc.lines().map(|l| Line::from(l.to_string())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Space: toggle   Esc: close", t.dim)));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
