use chrono::{Local, NaiveDate, NaiveTime, TimeZone, Utc};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::api::{NewReminder, Pet, Priority, ReminderType, Scope};
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Title,
    Date,
    Time,
    Pet,
    Priority,
    Kind,
    Description,
}

impl FormField {
    const ORDER: [FormField; 7] = [
        FormField::Title,
        FormField::Date,
        FormField::Time,
        FormField::Pet,
        FormField::Priority,
        FormField::Kind,
        FormField::Description,
    ];

    fn position(&self) -> usize {
        Self::ORDER.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    /// Fields whose value is picked with Space rather than typed.
    pub fn is_choice(&self) -> bool {
        matches!(self, FormField::Pet | FormField::Priority | FormField::Kind)
    }
}

#[derive(Debug, Clone)]
pub struct ReminderFormState {
    pub title: String,
    pub date: String,
    pub time: String,
    pub description: String,
    pub pet_index: usize,
    pub priority: Priority,
    pub kind: ReminderType,
    pub active_field: FormField,
    pub submitting: bool,
    pub error: Option<String>,
}

impl ReminderFormState {
    /// Blank form for `date`, preselecting the pet the calendar is scoped to.
    pub fn new(date: NaiveDate, pets: &[Pet], scope: &Scope) -> Self {
        let pet_index = match scope {
            Scope::Pet(id) => pets.iter().position(|p| &p.id == id).unwrap_or(0),
            Scope::All => 0,
        };
        Self {
            title: String::new(),
            date: date.format("%Y-%m-%d").to_string(),
            time: "09:00".to_string(),
            description: String::new(),
            pet_index,
            priority: Priority::Medium,
            kind: ReminderType::Custom,
            active_field: FormField::Title,
            submitting: false,
            error: None,
        }
    }

    pub fn input_char(&mut self, c: char) {
        match self.active_field {
            FormField::Title => self.title.push(c),
            FormField::Date => self.date.push(c),
            FormField::Time => self.time.push(c),
            FormField::Description => self.description.push(c),
            FormField::Pet | FormField::Priority | FormField::Kind => {}
        }
    }

    pub fn backspace(&mut self) {
        let field = match self.active_field {
            FormField::Title => &mut self.title,
            FormField::Date => &mut self.date,
            FormField::Time => &mut self.time,
            FormField::Description => &mut self.description,
            FormField::Pet | FormField::Priority | FormField::Kind => return,
        };
        field.pop();
    }

    /// Advance the value of the active choice field.
    pub fn cycle(&mut self, pet_count: usize) {
        match self.active_field {
            FormField::Pet if pet_count > 0 => {
                self.pet_index = (self.pet_index + 1) % pet_count;
            }
            FormField::Priority => self.priority = next_of(&Priority::ALL, self.priority),
            FormField::Kind => self.kind = next_of(&ReminderType::ALL, self.kind),
            _ => {}
        }
    }

    /// Validate the form into a create request. Date and time are local.
    pub fn to_new_reminder(&self, pets: &[Pet]) -> Result<NewReminder, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let pet = pets.get(self.pet_index).ok_or("Pick a pet first")?;
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| "Date must be YYYY-MM-DD".to_string())?;
        let time = NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .map_err(|_| "Time must be HH:MM".to_string())?;
        let local = Local
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .ok_or("That time does not exist locally")?;
        let description = self.description.trim();

        Ok(NewReminder {
            pet_id: pet.id.clone(),
            title: title.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            reminder_date: local.with_timezone(&Utc),
            priority: self.priority,
            reminder_type: self.kind,
        })
    }
}

fn next_of<T: Copy + PartialEq>(all: &[T], current: T) -> T {
    let pos = all.iter().position(|v| *v == current).unwrap_or(0);
    all[(pos + 1) % all.len()]
}

pub struct ReminderForm;

impl ReminderForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &ReminderFormState, pets: &[Pet]) {
        let form_w = area.width.clamp(30, 56);
        let form_h = area.height.clamp(12, 15);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w, form_h).intersection(area);

        frame.render_widget(Clear, form_area);

        let accent = theme::current().accent;
        let block = Block::default()
            .title(" New Reminder ")
            .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent));

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let rows = Layout::vertical([
            Constraint::Length(1), // title
            Constraint::Length(1), // date
            Constraint::Length(1), // time
            Constraint::Length(1), // pet
            Constraint::Length(1), // priority
            Constraint::Length(1), // type
            Constraint::Length(1), // description
            Constraint::Length(1),
            Constraint::Length(1), // error / saving
            Constraint::Length(1), // help
            Constraint::Min(0),
        ])
        .split(inner);

        let pet_name = pets
            .get(state.pet_index)
            .map(|p| p.name.as_str())
            .unwrap_or("(no pets)");

        let fields: [(FormField, &str, &str); 7] = [
            (FormField::Title, "Title:", state.title.as_str()),
            (FormField::Date, "Date:", state.date.as_str()),
            (FormField::Time, "Time:", state.time.as_str()),
            (FormField::Pet, "Pet:", pet_name),
            (FormField::Priority, "Prio:", state.priority.label()),
            (FormField::Kind, "Type:", state.kind.label()),
            (FormField::Description, "Notes:", state.description.as_str()),
        ];
        for (i, (field, label, value)) in fields.into_iter().enumerate() {
            render_field(frame, rows[i], label, value, field, state.active_field == field);
        }

        let t = theme::current();
        if state.submitting {
            frame.render_widget(Paragraph::new(Span::styled("Saving...", t.dim)), rows[8]);
        } else if let Some(err) = &state.error {
            frame.render_widget(Paragraph::new(Span::styled(err.as_str(), t.error)), rows[8]);
        }

        let key = Style::default().add_modifier(Modifier::BOLD);
        let help = Line::from(vec![
            Span::styled("Tab", key),
            Span::styled(":Next ", t.dim),
            Span::styled("Space", key),
            Span::styled(":Pick ", t.dim),
            Span::styled("Enter", key),
            Span::styled(":Save ", t.dim),
            Span::styled("Esc", key),
            Span::styled(":Cancel", t.dim),
        ]);
        frame.render_widget(Paragraph::new(help), rows[9]);
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, field: FormField, active: bool) {
    let style = if active {
        Style::default().fg(theme::current().accent)
    } else {
        Style::default()
    };
    let suffix = match (active, field.is_choice()) {
        (true, true) => " <",
        (true, false) => "_",
        _ => "",
    };

    let line = Line::from(vec![
        Span::styled(format!("{:<7}", label), theme::current().dim),
        Span::styled(format!("{}{}", value, suffix), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
