use std::future::Future;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, Utc};
use log::{error, info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::api::{Page, Pet, Reminder, ReminderSource, Scope};
use crate::calendar::aggregator::{fetch, send_toggle};
use crate::calendar::{Merge, Month, MonthPlan, PageRequest, ReminderSession, ToggleTicket};
use crate::components::reminder_form::ReminderFormState;
use crate::error::{CreateError, FetchError, PetListError, RequestError, ToggleError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    Month,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Form,
}

/// Results of background work, delivered back to the event loop.
#[derive(Debug)]
pub enum AppMessage {
    Loaded {
        req: PageRequest,
        result: Result<Page, FetchError>,
    },
    Backfilled {
        req: PageRequest,
        result: Result<Page, FetchError>,
    },
    Toggled {
        ticket: ToggleTicket,
        result: Result<(), RequestError>,
    },
    PetsLoaded(Result<Vec<Pet>, PetListError>),
    Created(Result<Reminder, CreateError>),
    RefreshRequested,
}

/// Handle given to anything that mutates reminders elsewhere, so the
/// calendar can be told to reload.
#[derive(Clone)]
pub struct RefreshBus {
    tx: UnboundedSender<AppMessage>,
}

impl RefreshBus {
    pub fn request_refresh(&self) {
        let _ = self.tx.send(AppMessage::RefreshRequested);
    }
}

pub struct App {
    pub running: bool,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub selected_date: NaiveDate,
    pub today: NaiveDate,
    pub selected_index: usize,
    pub pets: Vec<Pet>,
    pub session: ReminderSession,
    pub load_error: Option<String>,
    pub status_message: Option<String>,
    pub show_help: bool,
    pub detail_open: bool,
    pub form_state: Option<ReminderFormState>,
    source: Arc<dyn ReminderSource>,
    tx: UnboundedSender<AppMessage>,
    bus: RefreshBus,
}

impl App {
    pub fn new(
        source: Arc<dyn ReminderSource>,
        scope: Scope,
        page_size: u32,
        tx: UnboundedSender<AppMessage>,
    ) -> Self {
        let today = Local::now().date_naive();
        Self {
            running: true,
            view_mode: ViewMode::Month,
            input_mode: InputMode::Normal,
            selected_date: today,
            today,
            selected_index: 0,
            pets: Vec::new(),
            session: ReminderSession::new(scope, page_size),
            load_error: None,
            status_message: None,
            show_help: false,
            detail_open: false,
            form_state: None,
            source,
            bus: RefreshBus { tx: tx.clone() },
            tx,
        }
    }

    /// Kick off the initial reminder load and the pet list.
    pub fn start(&mut self) {
        self.load_first_page();
        let source = Arc::clone(&self.source);
        self.spawn(async move { AppMessage::PetsLoaded(source.list_pets().await) });
    }

    pub fn is_loading(&self) -> bool {
        self.session.pages_in_flight() > 0
    }

    pub fn day_reminders(&self) -> &[Reminder] {
        self.session.on(self.selected_date)
    }

    pub fn selected_reminder(&self) -> Option<&Reminder> {
        self.day_reminders().get(self.selected_index)
    }

    pub fn scope_label(&self) -> String {
        match self.session.scope() {
            Scope::All => "All pets".to_string(),
            Scope::Pet(id) => self
                .pets
                .iter()
                .find(|p| &p.id == id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| id.clone()),
        }
    }

    pub fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Loaded { req, result } => match self.session.apply_load(&req, result) {
                Ok(Merge::Applied { added }) => {
                    info!("loaded {} reminders for {}", added, req.scope);
                    self.load_error = None;
                    self.clamp_selection();
                    self.ensure_selected_month();
                }
                Ok(Merge::Stale) => {}
                Err(e) if self.session.is_loaded() => {
                    warn!("refresh failed: {}", e);
                    self.status_message = Some(format!("Refresh failed: {}", e.source));
                }
                Err(e) => {
                    error!("initial load failed: {}", e);
                    self.load_error = Some(e.source.to_string());
                }
            },
            AppMessage::Backfilled { req, result } => match self.session.apply_page(&req, result) {
                Ok(Merge::Applied { .. }) => self.ensure_selected_month(),
                Ok(Merge::Stale) => {}
                Err(e) => warn!("backfill failed: {}", e),
            },
            AppMessage::Toggled { ticket, result } => {
                if let Err(e) = self.session.finish_toggle(&ticket, result) {
                    self.status_message = Some(format!("Could not update reminder: {}", e.source));
                }
            }
            AppMessage::PetsLoaded(Ok(pets)) => self.pets = pets,
            AppMessage::PetsLoaded(Err(e)) => warn!("{}", e),
            AppMessage::Created(result) => self.on_created(result),
            AppMessage::RefreshRequested => self.refresh(),
        }
    }

    /// Reload page 1 of the current scope.
    pub fn refresh(&mut self) {
        self.load_first_page();
    }

    /// Step through All and then each pet.
    pub fn cycle_scope(&mut self) {
        let mut scopes = vec![Scope::All];
        scopes.extend(self.pets.iter().map(|p| Scope::Pet(p.id.clone())));
        let pos = scopes
            .iter()
            .position(|s| s == self.session.scope())
            .unwrap_or(0);
        let next = scopes[(pos + 1) % scopes.len()].clone();

        self.session.reset(next);
        self.load_error = None;
        self.selected_index = 0;
        self.detail_open = false;
        self.load_first_page();
        self.status_message = Some(format!("Showing {}", self.scope_label()));
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_reminder().map(|r| r.id.clone()) else {
            return;
        };
        match self.session.begin_toggle(&id, Utc::now()) {
            Ok(ticket) => {
                let source = Arc::clone(&self.source);
                self.spawn(async move {
                    let result = send_toggle(source.as_ref(), &ticket).await;
                    AppMessage::Toggled { ticket, result }
                });
            }
            Err(ToggleError::InProgress(_)) => {
                self.status_message = Some("Still saving that reminder".to_string());
            }
            Err(ToggleError::NotFound(_)) => {}
        }
    }

    pub fn next_day(&mut self) {
        self.selected_date = self.selected_date.succ_opt().unwrap_or(self.selected_date);
        self.on_date_changed();
    }

    pub fn prev_day(&mut self) {
        self.selected_date = self.selected_date.pred_opt().unwrap_or(self.selected_date);
        self.on_date_changed();
    }

    pub fn next_month(&mut self) {
        self.jump_to_month(Month::from_date(self.selected_date).next());
    }

    pub fn prev_month(&mut self) {
        self.jump_to_month(Month::from_date(self.selected_date).prev());
    }

    pub fn go_to_today(&mut self) {
        self.today = Local::now().date_naive();
        self.selected_date = self.today;
        self.on_date_changed();
    }

    pub fn select_next(&mut self) {
        let len = self.day_reminders().len();
        if len > 0 {
            self.selected_index = (self.selected_index + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn show_detail(&mut self) {
        self.detail_open = self.selected_reminder().is_some();
    }

    pub fn open_form(&mut self) {
        self.form_state = Some(ReminderFormState::new(self.selected_date, &self.pets, self.session.scope()));
        self.input_mode = InputMode::Form;
    }

    pub fn close_form(&mut self) {
        self.form_state = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn submit_form(&mut self) {
        let Some(form) = self.form_state.as_mut() else {
            return;
        };
        if form.submitting {
            return;
        }
        let new = match form.to_new_reminder(&self.pets) {
            Ok(new) => new,
            Err(msg) => {
                form.error = Some(msg);
                return;
            }
        };
        form.submitting = true;
        form.error = None;
        let source = Arc::clone(&self.source);
        self.spawn(async move { AppMessage::Created(source.create_reminder(&new).await) });
    }

    fn on_created(&mut self, result: Result<Reminder, CreateError>) {
        match result {
            Ok(reminder) => {
                info!("created reminder {}", reminder.id);
                self.close_form();
                self.status_message = Some(format!("Created \"{}\"", reminder.title));
                self.bus.request_refresh();
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(form) = self.form_state.as_mut() {
                    form.submitting = false;
                    form.error = Some(e.0.to_string());
                }
            }
        }
    }

    fn jump_to_month(&mut self, month: Month) {
        self.selected_date = month.clamp_day(self.selected_date.day());
        self.on_date_changed();
    }

    fn on_date_changed(&mut self) {
        self.selected_index = 0;
        self.detail_open = false;
        self.ensure_selected_month();
    }

    fn clamp_selection(&mut self) {
        let len = self.day_reminders().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    fn ensure_selected_month(&mut self) {
        let month = Month::from_date(self.selected_date);
        if let MonthPlan::Fetch(req) = self.session.plan_month(month) {
            let source = Arc::clone(&self.source);
            self.spawn(async move {
                let result = fetch(source.as_ref(), &req).await;
                AppMessage::Backfilled { req, result }
            });
        }
    }

    fn load_first_page(&mut self) {
        let req = self.session.begin_load();
        let source = Arc::clone(&self.source);
        self.spawn(async move {
            let result = fetch(source.as_ref(), &req).await;
            AppMessage::Loaded { req, result }
        });
    }

    fn spawn<F>(&self, work: F)
    where
        F: Future<Output = AppMessage> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(work.await);
        });
    }
}
