use std::{io, thread, time::Duration, time::Instant};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::{debug, error, info};
use wanich_core::{
    auth::{AuthMode, LocalCredentials},
    catalog::GameDraft,
    gateway::{GatewayError, SharedGateway},
    models::{Game, RecordKind, StudentInfo},
    session::{LendingSession, NoticeLevel, PendingSubmission, Screen, SubmissionOutcome},
};

use crate::input::TextField;

// Provider identity tokens run to a few kilobytes.
const TOKEN_MAX_LEN: usize = 8192;

const TICK_RATE: Duration = Duration::from_millis(250);
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const HISTORY_MIN_ROWS: usize = 10;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
    on_accent: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Indexed(99),
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            on_accent: Color::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Borrow,
    Return,
}

enum AppEvent {
    Input(Event),
    Tick,
    Submitted {
        flow: Flow,
        pending: PendingSubmission,
        result: Result<(), GatewayError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthTab {
    SignIn,
    Register,
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthField {
    FullName,
    StudentId,
    Classroom,
    Email,
    Password,
    Token,
}

impl AuthField {
    fn label(self) -> &'static str {
        match self {
            AuthField::FullName => "Full name",
            AuthField::StudentId => "Student id",
            AuthField::Classroom => "Classroom",
            AuthField::Email => "Email",
            AuthField::Password => "Password",
            AuthField::Token => "Identity token",
        }
    }
}

#[derive(Debug, Clone)]
struct AuthPanel {
    tab: AuthTab,
    focus: usize,
    full_name: TextField,
    student_id: TextField,
    classroom: TextField,
    email: TextField,
    password: TextField,
    token: TextField,
}

impl Default for AuthPanel {
    fn default() -> Self {
        Self {
            tab: AuthTab::SignIn,
            focus: 0,
            full_name: TextField::default(),
            student_id: TextField::default(),
            classroom: TextField::default(),
            email: TextField::default(),
            password: TextField::masked(),
            token: TextField::with_limit(TOKEN_MAX_LEN),
        }
    }
}

impl AuthPanel {
    fn fields(&self) -> &'static [AuthField] {
        match self.tab {
            AuthTab::SignIn => &[AuthField::Email, AuthField::Password],
            AuthTab::Register => &[
                AuthField::FullName,
                AuthField::StudentId,
                AuthField::Classroom,
                AuthField::Email,
                AuthField::Password,
            ],
            AuthTab::Token => &[AuthField::Token],
        }
    }

    fn field(&self, field: AuthField) -> &TextField {
        match field {
            AuthField::FullName => &self.full_name,
            AuthField::StudentId => &self.student_id,
            AuthField::Classroom => &self.classroom,
            AuthField::Email => &self.email,
            AuthField::Password => &self.password,
            AuthField::Token => &self.token,
        }
    }

    fn focused_mut(&mut self) -> &mut TextField {
        let field = self.fields()[self.focus.min(self.fields().len() - 1)];
        match field {
            AuthField::FullName => &mut self.full_name,
            AuthField::StudentId => &mut self.student_id,
            AuthField::Classroom => &mut self.classroom,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
            AuthField::Token => &mut self.token,
        }
    }

    fn move_focus(&mut self, delta: isize) {
        let len = self.fields().len() as isize;
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    fn cycle_tab(&mut self) {
        self.tab = match self.tab {
            AuthTab::SignIn => AuthTab::Register,
            AuthTab::Register => AuthTab::Token,
            AuthTab::Token => AuthTab::SignIn,
        };
        self.focus = 0;
    }

    fn title(&self) -> &'static str {
        match self.tab {
            AuthTab::SignIn => "Sign in",
            AuthTab::Register => "Register",
            AuthTab::Token => "Identity token",
        }
    }

    fn credentials(&self) -> LocalCredentials {
        LocalCredentials {
            mode: if self.tab == AuthTab::Register {
                AuthMode::Register
            } else {
                AuthMode::SignIn
            },
            email: self.email.value().to_string(),
            password: self.password.value().to_string(),
            full_name: self.full_name.value().to_string(),
            student_id: self.student_id.value().to_string(),
            classroom: self.classroom.value().to_string(),
        }
    }
}

const BORROW_LABELS: [&str; 3] = ["Full name", "Student id", "Classroom"];

#[derive(Debug, Clone, Default)]
struct BorrowFields {
    fields: [TextField; 3],
    focus: usize,
}

impl BorrowFields {
    fn load(&mut self, student: &StudentInfo) {
        self.fields[0].set(&student.full_name);
        self.fields[1].set(&student.student_id);
        self.fields[2].set(&student.classroom);
        self.focus = self
            .fields
            .iter()
            .position(|field| field.value().trim().is_empty())
            .unwrap_or(0);
    }

    fn write_to(&self, student: &mut StudentInfo) {
        student.full_name = self.fields[0].value().to_string();
        student.student_id = self.fields[1].value().to_string();
        student.classroom = self.fields[2].value().to_string();
    }

    fn move_focus(&mut self, delta: isize) {
        self.focus = (self.focus as isize + delta).rem_euclid(self.fields.len() as isize) as usize;
    }
}

const GAME_LABELS: [&str; 5] = ["Name", "Category", "Image", "Description", "Available"];

#[derive(Debug, Clone)]
struct GameForm {
    editing: Option<String>,
    fields: [TextField; 4],
    available: bool,
    focus: usize,
}

impl GameForm {
    fn new_game() -> Self {
        Self {
            editing: None,
            fields: Default::default(),
            available: true,
            focus: 0,
        }
    }

    fn edit(game: &Game) -> Self {
        let mut form = Self::new_game();
        form.editing = Some(game.id.clone());
        form.fields[0].set(&game.name);
        form.fields[1].set(&game.category);
        form.fields[2].set(&game.image);
        form.fields[3].set(&game.description);
        form.available = game.available;
        form
    }

    fn move_focus(&mut self, delta: isize) {
        self.focus = (self.focus as isize + delta).rem_euclid(GAME_LABELS.len() as isize) as usize;
    }

    fn draft(&self) -> GameDraft {
        GameDraft {
            name: self.fields[0].value().to_string(),
            category: self.fields[1].value().to_string(),
            image: self.fields[2].value().to_string(),
            description: self.fields[3].value().to_string(),
            available: self.available,
        }
    }
}

/// Terminal front end for the lending club.
pub struct WanichApp {
    session: LendingSession,
    gateway: SharedGateway,
    state: UiState,
    auth: AuthPanel,
    borrow: BorrowFields,
    return_field: TextField,
    game_form: Option<GameForm>,
    pending_delete: Option<String>,
    last_screen: Screen,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
}

impl WanichApp {
    pub fn new(session: LendingSession, gateway: SharedGateway) -> Self {
        let last_screen = session.screen();
        Self {
            session,
            gateway,
            state: UiState::default(),
            auth: AuthPanel::default(),
            borrow: BorrowFields::default(),
            return_field: TextField::default(),
            game_form: None,
            pending_delete: None,
            last_screen,
            event_tx: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.state.set_status(format!(
            "Loaded {} games",
            self.session.catalog().len()
        ));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                self.handle_input(event);
                self.sync_screen();
                true
            }
            Some(AppEvent::Tick) => {
                self.state.tick = self.state.tick.wrapping_add(1);
                self.session.expire_notification(Instant::now());
                true
            }
            Some(AppEvent::Submitted {
                flow,
                pending,
                result,
            }) => {
                let outcome = match flow {
                    Flow::Borrow => self.session.finish_borrow_submission(pending, result),
                    Flow::Return => self.session.finish_return_submission(pending, result),
                };
                match outcome {
                    SubmissionOutcome::Recorded => self.state.set_status("Saved".to_string()),
                    SubmissionOutcome::Failed(message) => self.state.set_status(message),
                    SubmissionOutcome::Stale => {}
                }
                if self.session.return_dialog().is_none() {
                    self.return_field.clear();
                }
                self.sync_screen();
                true
            }
            None => false,
        }
    }

    fn sync_screen(&mut self) {
        let screen = self.session.screen();
        if screen == self.last_screen {
            return;
        }
        debug!(from = ?self.last_screen, to = ?screen, "Screen changed");
        match screen {
            Screen::BorrowForm => self.borrow.load(&self.session.borrow_form().student),
            Screen::Auth => {
                self.auth.focus = 0;
            }
            Screen::History => self.state.history_offset = 0,
            _ => {}
        }
        self.last_screen = screen;
    }

    fn spawn_submission(&mut self, flow: Flow, pending: PendingSubmission) {
        let Some(sender) = self.event_tx.clone() else {
            error!("event_channel_missing");
            let result = Err(GatewayError::Rejected(
                "event channel unavailable".to_string(),
            ));
            match flow {
                Flow::Borrow => self.session.finish_borrow_submission(pending, result),
                Flow::Return => self.session.finish_return_submission(pending, result),
            };
            return;
        };
        let gateway = self.gateway.clone();
        info!(record_id = %pending.record.id, flow = ?flow, "Submitting record");
        self.state.set_status("Submitting…".to_string());
        spawn(async move {
            let result = gateway.submit(&pending.record).await;
            let _ = sender
                .send(AppEvent::Submitted {
                    flow,
                    pending,
                    result,
                })
                .await;
        });
    }

    // ---- input ----------------------------------------------------------

    fn handle_input(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return;
        }

        if self.session.return_dialog().is_some() {
            self.handle_return_key(key);
        } else if self.game_form.is_some() {
            self.handle_game_form_key(key);
        } else if self.session.is_summary_open() {
            self.handle_summary_key(key);
        } else if !self.handle_function_key(&key) {
            match self.session.screen() {
                Screen::Catalog => self.handle_catalog_key(key),
                Screen::Auth => self.handle_auth_key(key),
                Screen::BorrowForm => self.handle_borrow_key(key),
                Screen::Success => self.handle_success_key(key),
                Screen::History => self.handle_history_key(key),
                Screen::ManageGames => self.handle_manage_key(key),
            }
        }
    }

    // Header navigation that also works while a text field has focus.
    fn handle_function_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::F(1) => self.session.show_catalog(),
            KeyCode::F(2) => self.session.show_history(),
            KeyCode::F(3) => match self.session.user() {
                Some(_) => self.session.logout(),
                None => self.session.show_auth(),
            },
            KeyCode::F(4) => {
                self.return_field.clear();
                self.session.open_return_dialog();
            }
            _ => return false,
        }
        true
    }

    // Navigation shared by screens without text input.
    fn handle_nav_key(&mut self, key: &KeyEvent) -> bool {
        if !key.modifiers.is_empty() && key.modifiers != KeyModifiers::SHIFT {
            return false;
        }
        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char('c') => self.session.show_catalog(),
            KeyCode::Char('h') => self.session.show_history(),
            KeyCode::Char('r') => {
                self.return_field.clear();
                self.session.open_return_dialog();
            }
            KeyCode::Char('l') if self.session.user().is_none() => self.session.show_auth(),
            KeyCode::Char('o') if self.session.user().is_some() => self.session.logout(),
            KeyCode::Char('m') => {
                if let Err(err) = self.session.show_manage_games() {
                    self.state.set_status(err.to_string());
                }
            }
            KeyCode::Char('x') => self.session.dismiss_notification(),
            _ => return false,
        }
        true
    }

    fn handle_catalog_key(&mut self, key: KeyEvent) {
        if self.state.mode == Mode::Filter {
            match key.code {
                KeyCode::Esc => {
                    self.state.mode = Mode::Browse;
                    self.state.filter.clear();
                    self.state.cursor = 0;
                    self.state.set_status("Filter cleared".to_string());
                }
                KeyCode::Enter => {
                    self.state.mode = Mode::Browse;
                    self.state
                        .set_status(format!("Filter applied: {}", self.state.filter));
                }
                KeyCode::Backspace => {
                    self.state.filter.pop();
                    self.state.cursor = 0;
                }
                KeyCode::Char(c)
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
                {
                    self.state.filter.push(c);
                    self.state.cursor = 0;
                }
                _ => {}
            }
            return;
        }

        if self.handle_nav_key(&key) {
            return;
        }
        let games = self.visible_games();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1, games.len()),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1, games.len()),
            KeyCode::PageDown => self
                .state
                .move_cursor(self.state.list_height.max(1) as isize, games.len()),
            KeyCode::PageUp => self
                .state
                .move_cursor(-(self.state.list_height.max(1) as isize), games.len()),
            KeyCode::Home | KeyCode::Char('g') => self.state.cursor = 0,
            KeyCode::End | KeyCode::Char('G') => {
                self.state.cursor = games.len().saturating_sub(1)
            }
            KeyCode::Char('/') => {
                self.state.mode = Mode::Filter;
                self.state.set_status("Type to filter, Enter to keep, Esc to clear".to_string());
            }
            KeyCode::Char('a') => {
                self.state.available_only = !self.state.available_only;
                self.state.cursor = 0;
                let message = if self.state.available_only {
                    "Showing available games only"
                } else {
                    "Showing all games"
                };
                self.state.set_status(message.to_string());
            }
            KeyCode::Char(' ') => {
                if let Some(game) = games.get(self.state.cursor) {
                    match self.session.toggle_game(&game.id) {
                        Ok(true) => self.state.set_status(format!("Selected {}", game.name)),
                        Ok(false) => self.state.set_status(format!("Removed {}", game.name)),
                        Err(err) => self.state.set_status(err.to_string()),
                    }
                }
            }
            KeyCode::Enter => {
                if let Err(err) = self.session.open_borrow_summary() {
                    self.state.set_status(err.to_string());
                }
            }
            _ => {}
        }
    }

    fn handle_summary_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.session.close_borrow_summary(),
            KeyCode::Enter | KeyCode::Char('y') => match self.session.confirm_selection() {
                Ok(Screen::Auth) => self
                    .state
                    .set_status("Sign in to continue borrowing".to_string()),
                Ok(_) => self.state.set_status("Fill in borrower details".to_string()),
                Err(err) => self.state.set_status(err.to_string()),
            },
            _ => {}
        }
    }

    fn handle_auth_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.session.show_catalog(),
            KeyCode::Tab | KeyCode::Down => self.auth.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => self.auth.move_focus(-1),
            KeyCode::Char('t') if key.modifiers == KeyModifiers::CONTROL => {
                self.auth.cycle_tab();
                self.state.set_status(format!("{} form", self.auth.title()));
            }
            KeyCode::Enter => {
                let result = if self.auth.tab == AuthTab::Token {
                    let token = self.auth.token.value().to_string();
                    self.session.login_with_token(&token)
                } else {
                    self.session.login_local(self.auth.credentials())
                };
                match result {
                    Ok(()) => {
                        self.auth.password.clear();
                        self.auth.token.clear();
                        self.state.set_status("Signed in".to_string());
                    }
                    Err(err) => self.state.set_status(err.to_string()),
                }
            }
            _ => {
                self.auth.focused_mut().handle_key(&key);
            }
        }
    }

    fn handle_borrow_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.session.show_catalog(),
            KeyCode::Tab | KeyCode::Down => self.borrow.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => self.borrow.move_focus(-1),
            KeyCode::Enter => match self.session.begin_borrow_submission() {
                Ok(pending) => self.spawn_submission(Flow::Borrow, pending),
                Err(err) => self.state.set_status(err.to_string()),
            },
            _ => {
                if self.session.borrow_form().is_busy() {
                    return;
                }
                if self.borrow.fields[self.borrow.focus].handle_key(&key) {
                    if let Some(student) = self.session.borrow_fields_mut() {
                        self.borrow.write_to(student);
                    }
                }
            }
        }
    }

    fn handle_success_key(&mut self, key: KeyEvent) {
        if self.handle_nav_key(&key) {
            return;
        }
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            self.session.show_catalog();
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        if self.handle_nav_key(&key) {
            return;
        }
        let total = self.session.records().len();
        match key.code {
            KeyCode::Esc => self.session.show_catalog(),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.state.history_offset + 1 < total {
                    self.state.history_offset += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.history_offset = self.state.history_offset.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn handle_manage_key(&mut self, key: KeyEvent) {
        let games = self.session.catalog().games();
        if let Some(id) = self.pending_delete.take() {
            if key.code == KeyCode::Char('y') {
                match self.session.remove_game(&id) {
                    Ok(game) => {
                        self.state.set_status(format!("Deleted {}", game.name));
                        let remaining = self.session.catalog().len();
                        self.state.manage_cursor =
                            self.state.manage_cursor.min(remaining.saturating_sub(1));
                    }
                    Err(err) => self.state.set_status(err.to_string()),
                }
            } else {
                self.state.set_status("Delete cancelled".to_string());
            }
            return;
        }
        if self.handle_nav_key(&key) {
            return;
        }
        match key.code {
            KeyCode::Esc => self.session.show_catalog(),
            KeyCode::Char('j') | KeyCode::Down => {
                if self.state.manage_cursor + 1 < games.len() {
                    self.state.manage_cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.manage_cursor = self.state.manage_cursor.saturating_sub(1);
            }
            KeyCode::Char('n') => self.game_form = Some(GameForm::new_game()),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(game) = games.get(self.state.manage_cursor) {
                    self.game_form = Some(GameForm::edit(game));
                }
            }
            KeyCode::Char('d') => {
                if let Some(game) = games.get(self.state.manage_cursor) {
                    self.pending_delete = Some(game.id.clone());
                    self.state
                        .set_status(format!("Delete {}? Press y to confirm", game.name));
                }
            }
            _ => {}
        }
    }

    fn handle_game_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.game_form.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.game_form = None;
                self.state.set_status("Edit cancelled".to_string());
            }
            KeyCode::Tab | KeyCode::Down => form.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => form.move_focus(-1),
            KeyCode::Enter => {
                let draft = form.draft();
                let result = match form.editing.clone() {
                    Some(id) => self.session.update_game(&id, draft),
                    None => self.session.add_game(draft),
                };
                match result {
                    Ok(game) => {
                        self.state.set_status(format!("Saved {} ({})", game.name, game.id));
                        self.game_form = None;
                    }
                    Err(err) => self.state.set_status(err.to_string()),
                }
            }
            KeyCode::Char(' ') if form.focus == 4 => form.available = !form.available,
            _ => {
                if let Some(field) = form.fields.get_mut(form.focus) {
                    field.handle_key(&key);
                }
            }
        }
    }

    fn handle_return_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if let Err(err) = self.session.close_return_dialog() {
                    self.state.set_status(err.to_string());
                } else {
                    self.return_field.clear();
                }
            }
            KeyCode::Enter => match self.session.begin_return_submission() {
                Ok(pending) => self.spawn_submission(Flow::Return, pending),
                Err(err) => self.state.set_status(err.to_string()),
            },
            _ => {
                let Some(student_id) = self.session.return_student_id_mut() else {
                    return;
                };
                if self.return_field.handle_key(&key) {
                    *student_id = self.return_field.value().to_string();
                }
            }
        }
    }

    fn visible_games(&self) -> Vec<Game> {
        self.session
            .catalog()
            .matching(&self.state.filter, self.state.available_only)
    }

    // ---- drawing --------------------------------------------------------

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let notice_height = if self.session.notification().is_some() {
            3
        } else {
            0
        };
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(notice_height),
                Constraint::Min(6),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, rows[0]);
        if notice_height > 0 {
            self.render_notification(frame, rows[1]);
        }
        match self.session.screen() {
            Screen::Catalog => self.draw_catalog(frame, rows[2]),
            Screen::Auth => self.draw_auth(frame, rows[2]),
            Screen::BorrowForm => self.draw_borrow_form(frame, rows[2]),
            Screen::Success => self.draw_success(frame, rows[2]),
            Screen::History => self.draw_history(frame, rows[2]),
            Screen::ManageGames => self.draw_manage(frame, rows[2]),
        }
        self.render_status(frame, rows[3]);

        if self.session.is_summary_open() {
            self.render_summary(frame, area);
        }
        if let Some(form) = &self.game_form {
            self.render_game_form(frame, area, form);
        }
        if self.session.return_dialog().is_some() {
            self.render_return_dialog(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let screen = self.session.screen();
        let nav = |label: &str, key: char, active: bool| {
            let style = if active {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            Span::styled(format!("  {label} [{key}]"), style)
        };

        let mut spans = vec![
            Span::styled(
                " W ",
                Style::default()
                    .bg(self.theme.accent)
                    .fg(self.theme.on_accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" wanich ", Style::default().add_modifier(Modifier::BOLD)),
            nav("Catalog", 'c', screen == Screen::Catalog),
            nav("History", 'h', screen == Screen::History),
            nav("Return", 'r', self.session.return_dialog().is_some()),
        ];
        match self.session.user() {
            Some(user) => {
                spans.push(Span::raw("    "));
                spans.push(Span::styled(
                    format!("({}) {}", user.initial(), user.full_name),
                    Style::default().fg(self.theme.primary_fg),
                ));
                spans.push(Span::styled(
                    "  Sign out [o]",
                    Style::default().fg(self.theme.danger),
                ));
            }
            None => spans.push(nav("Sign in", 'l', screen == Screen::Auth)),
        }

        let paragraph =
            Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(paragraph, area);
    }

    fn render_notification(&self, frame: &mut Frame, area: Rect) {
        let Some(notice) = self.session.notification() else {
            return;
        };
        let color = match notice.level {
            NoticeLevel::Info => self.theme.accent,
            NoticeLevel::Error => self.theme.danger,
        };
        let paragraph = Paragraph::new(Line::from(vec![
            Span::styled(notice.message.clone(), Style::default().fg(color)),
            Span::styled("   [x] dismiss", Style::default().fg(self.theme.muted)),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
        frame.render_widget(paragraph, area);
    }

    fn draw_catalog(&mut self, frame: &mut Frame, area: Rect) {
        let selected = self.session.selection().len();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(4),
                Constraint::Length(if selected > 0 { 3 } else { 0 }),
            ])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[0]);

        let games = self.visible_games();
        self.state.list_height = body[0].height.saturating_sub(2) as usize;
        self.state.clamp(games.len());
        self.render_game_list(frame, body[0], &games);
        self.render_game_info(frame, body[1], games.get(self.state.cursor));

        if selected > 0 {
            let cta = Paragraph::new(Line::from(vec![
                Span::styled(
                    format!(" {selected} "),
                    Style::default()
                        .bg(self.theme.accent)
                        .fg(self.theme.on_accent)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    "  Confirm borrow list [Enter]",
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(cta, chunks[1]);
        }
    }

    fn render_game_list(&self, frame: &mut Frame, area: Rect, games: &[Game]) {
        let mut list_state = ListState::default();
        if !games.is_empty() {
            list_state.select(Some(self.state.cursor));
        }
        let items: Vec<ListItem> = games
            .iter()
            .map(|game| {
                let checked = self.session.selection().contains(&game.id);
                let checkbox = if checked {
                    Span::styled("[x] ", Style::default().fg(self.theme.accent))
                } else {
                    Span::raw("[ ] ")
                };
                let badge_color = if game.available {
                    self.theme.success
                } else {
                    self.theme.warning
                };
                ListItem::new(Line::from(vec![
                    checkbox,
                    Span::styled(
                        game.name.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {}", game.category),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::styled(
                        format!("  {}", game.availability_label()),
                        Style::default().fg(badge_color),
                    ),
                ]))
            })
            .collect();

        let mut title = "Board games".to_string();
        if self.state.available_only {
            title.push_str(" (available)");
        }
        if self.state.mode == Mode::Filter || !self.state.filter.is_empty() {
            title.push_str(&format!(" /{}", self.state.filter));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_game_info(&self, frame: &mut Frame, area: Rect, game: Option<&Game>) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let Some(game) = game else {
            let paragraph = Paragraph::new("No games match").block(block);
            frame.render_widget(paragraph, area);
            return;
        };
        let lines = vec![
            Line::from(Span::styled(
                game.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                game.id.clone(),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(""),
            Line::from(format!("Category: {}", game.category)),
            Line::from(format!("Status: {}", game.availability_label())),
            Line::from(format!("Image: {}", game.image)),
            Line::from(""),
            Line::from(game.description.clone()),
        ];
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_summary(&self, frame: &mut Frame, area: Rect) {
        let games = self.session.selected_games();
        let height = (games.len() as u16 + 6).min(area.height);
        let rect = centered_rect(56, height, area);
        frame.render_widget(Clear, rect);

        let mut lines: Vec<Line> = games
            .iter()
            .map(|game| {
                Line::from(vec![
                    Span::styled("• ", Style::default().fg(self.theme.accent)),
                    Span::raw(game.name.clone()),
                    Span::styled(
                        format!("  {}", game.category),
                        Style::default().fg(self.theme.muted),
                    ),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(key_hint_line(&[("Enter", "confirm"), ("Esc", "keep browsing")]));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Borrow {} game(s)", games.len())),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, rect);
    }

    fn draw_auth(&self, frame: &mut Frame, area: Rect) {
        let fields = self.auth.fields();
        let height = (fields.len() as u16 * 2 + 6).min(area.height);
        let rect = centered_rect(60, height, area);

        let mut lines = Vec::new();
        let mut cursor = None;
        for (idx, field) in fields.iter().enumerate() {
            let focused = idx == self.auth.focus;
            let input = self.auth.field(*field);
            lines.push(Line::from(Span::styled(
                field.label(),
                Style::default().fg(self.theme.muted),
            )));
            let marker = if focused { "> " } else { "  " };
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(self.theme.accent)),
                Span::raw(input.display()),
            ]));
            if focused {
                cursor = Some((
                    rect.x + 1 + 2 + input.cursor_offset(),
                    rect.y + 1 + (idx as u16 * 2) + 1,
                ));
            }
        }
        lines.push(Line::from(""));
        lines.push(key_hint_line(&[
            ("Enter", "submit"),
            ("Tab", "next field"),
            ("Ctrl+T", "switch form"),
            ("Esc", "back"),
        ]));

        let title = format!("{} · passwords are not verified", self.auth.title());
        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, rect);
        if let Some((x, y)) = cursor {
            frame.set_cursor(x.min(rect.x + rect.width.saturating_sub(2)), y);
        }
    }

    fn draw_borrow_form(&self, frame: &mut Frame, area: Rect) {
        let games = self.session.selected_games();
        let busy = self.session.borrow_form().is_busy();
        let height = (games.len() as u16 + 14).min(area.height);
        let rect = centered_rect(64, height, area);

        let mut lines = vec![Line::from(Span::styled(
            "Games",
            Style::default().fg(self.theme.muted),
        ))];
        for game in &games {
            lines.push(Line::from(format!("  • {}", game.name)));
        }
        lines.push(Line::from(""));

        let mut cursor = None;
        for (idx, (label, field)) in BORROW_LABELS.iter().zip(self.borrow.fields.iter()).enumerate()
        {
            let focused = idx == self.borrow.focus;
            lines.push(Line::from(Span::styled(
                *label,
                Style::default().fg(self.theme.muted),
            )));
            if focused && !busy {
                cursor = Some((
                    rect.x + 1 + 2 + field.cursor_offset(),
                    rect.y + 1 + lines.len() as u16,
                ));
            }
            let marker = if focused { "> " } else { "  " };
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(self.theme.accent)),
                Span::raw(field.display()),
            ]));
        }
        lines.push(Line::from(""));
        if busy {
            lines.push(Line::from(Span::styled(
                format!("{} Submitting…", SPINNER[self.state.tick % SPINNER.len()]),
                Style::default().fg(self.theme.warning),
            )));
        } else {
            lines.push(key_hint_line(&[
                ("Enter", "submit borrow"),
                ("Tab", "next field"),
                ("Esc", "back"),
            ]));
        }

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Borrower details"),
        );
        frame.render_widget(paragraph, rect);
        if let Some((x, y)) = cursor {
            frame.set_cursor(x.min(rect.x + rect.width.saturating_sub(2)), y);
        }
    }

    fn draw_success(&self, frame: &mut Frame, area: Rect) {
        let rect = centered_rect(64, 12.min(area.height), area);
        let lines = vec![
            Line::from(Span::styled(
                "✓ Borrow recorded!",
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from("Enjoy your games."),
            Line::from(""),
            Line::from(Span::styled(
                "Returning games",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from("  1. Go back to the catalog."),
            Line::from("  2. Press [r] and enter your student id to confirm the return."),
            Line::from(""),
            key_hint_line(&[("Enter", "back to catalog")]),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Done"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, rect);
    }

    fn draw_history(&self, frame: &mut Frame, area: Rect) {
        let visible = area.height.saturating_sub(3) as usize;
        let total = self.session.records().len();
        let mut rows: Vec<Row> = self
            .session
            .records()
            .newest_first()
            .enumerate()
            .skip(self.state.history_offset)
            .take(visible)
            .map(|(idx, record)| {
                let local = record.timestamp.with_timezone(&Local);
                let kind_color = match record.kind {
                    RecordKind::Borrow => self.theme.warning,
                    RecordKind::Return => self.theme.success,
                };
                Row::new(vec![
                    Cell::from((idx + 1).to_string())
                        .style(Style::default().fg(self.theme.muted)),
                    Cell::from(local.format("%d/%m/%Y").to_string()),
                    Cell::from(local.format("%H:%M:%S").to_string())
                        .style(Style::default().fg(self.theme.muted)),
                    Cell::from(record.student_id.clone())
                        .style(Style::default().fg(self.theme.accent)),
                    Cell::from(record.full_name.clone()),
                    Cell::from(record.classroom.clone()),
                    Cell::from(record.games.clone()),
                    Cell::from(record.kind.as_str()).style(
                        Style::default()
                            .fg(kind_color)
                            .add_modifier(Modifier::BOLD),
                    ),
                ])
            })
            .collect();

        if total == 0 {
            rows.push(Row::new(vec![
                Cell::from("1").style(Style::default().fg(self.theme.muted)),
                Cell::from("(No data available in this sheet)")
                    .style(Style::default().fg(self.theme.muted)),
            ]));
        }
        // Blank numbered rows so the table reads like a sheet.
        let start = rows.len().max(1);
        for idx in start..HISTORY_MIN_ROWS.min(visible) {
            rows.push(Row::new(vec![
                Cell::from((idx + 1).to_string()).style(Style::default().fg(self.theme.muted))
            ]));
        }

        let header = Row::new(vec![
            "#", "Date", "Time", "Student ID", "Name", "Class", "Games", "Type",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));
        let widths = [
            Constraint::Length(4),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Percentage(20),
            Constraint::Length(8),
            Constraint::Min(16),
            Constraint::Length(7),
        ];
        let title = format!("Borrow / return history ({total})");
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(table, area);
    }

    fn draw_manage(&self, frame: &mut Frame, area: Rect) {
        let games = self.session.catalog().games();
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let mut list_state = ListState::default();
        if !games.is_empty() {
            list_state.select(Some(self.state.manage_cursor.min(games.len() - 1)));
        }
        let items: Vec<ListItem> = games
            .iter()
            .map(|game| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<12}", game.id),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::raw(game.name.clone()),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Manage games  [n] new  [e] edit  [d] delete"),
            )
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, body[0], &mut list_state);
        self.render_game_info(frame, body[1], games.get(self.state.manage_cursor));
    }

    fn render_game_form(&self, frame: &mut Frame, area: Rect, form: &GameForm) {
        let rect = centered_rect(64, 15.min(area.height), area);
        frame.render_widget(Clear, rect);

        let mut lines = Vec::new();
        let mut cursor = None;
        for (idx, label) in GAME_LABELS.iter().enumerate() {
            let focused = idx == form.focus;
            let marker = Span::styled(
                if focused { "> " } else { "  " },
                Style::default().fg(self.theme.accent),
            );
            let value = match form.fields.get(idx) {
                Some(field) => {
                    if focused {
                        cursor = Some((
                            rect.x + 1 + 2 + 13 + field.cursor_offset(),
                            rect.y + 1 + lines.len() as u16,
                        ));
                    }
                    field.display()
                }
                None => format!(
                    "[{}] (Space to toggle)",
                    if form.available { "x" } else { " " }
                ),
            };
            lines.push(Line::from(vec![
                marker,
                Span::styled(
                    format!("{:<13}", label),
                    Style::default().fg(self.theme.muted),
                ),
                Span::raw(value),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(key_hint_line(&[
            ("Enter", "save"),
            ("Tab", "next field"),
            ("Esc", "cancel"),
        ]));

        let title = match &form.editing {
            Some(id) => format!("Edit {id}"),
            None => "Add game".to_string(),
        };
        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, rect);
        if let Some((x, y)) = cursor {
            frame.set_cursor(x.min(rect.x + rect.width.saturating_sub(2)), y);
        }
    }

    fn render_return_dialog(&self, frame: &mut Frame, area: Rect) {
        let rect = centered_rect(48, 8.min(area.height), area);
        frame.render_widget(Clear, rect);
        let busy = self
            .session
            .return_dialog()
            .map(|dialog| dialog.is_busy())
            .unwrap_or(false);

        let footer = if busy {
            Line::from(Span::styled(
                format!("{} Sending…", SPINNER[self.state.tick % SPINNER.len()]),
                Style::default().fg(self.theme.warning),
            ))
        } else {
            key_hint_line(&[("Enter", "confirm return"), ("Esc", "cancel")])
        };
        let lines = vec![
            Line::from(Span::styled(
                "Student id",
                Style::default().fg(self.theme.muted),
            )),
            Line::from(vec![
                Span::styled("> ", Style::default().fg(self.theme.accent)),
                Span::raw(self.return_field.display()),
            ]),
            Line::from(""),
            footer,
        ];
        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Return board games"),
        );
        frame.render_widget(paragraph, rect);
        if !busy {
            let x = rect.x + 1 + 2 + self.return_field.cursor_offset();
            frame.set_cursor(x.min(rect.x + rect.width.saturating_sub(2)), rect.y + 2);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.state.mode == Mode::Filter
            && self.session.screen() == Screen::Catalog
        {
            format!("Filter: {}", self.state.filter)
        } else {
            self.state.status.clone()
        };
        let hints = match self.session.screen() {
            Screen::Catalog => vec![
                ("Space", "select"),
                ("Enter", "borrow"),
                ("/", "filter"),
                ("a", "available only"),
                ("q", "quit"),
            ],
            Screen::History => vec![("j/k", "scroll"), ("Esc", "catalog"), ("q", "quit")],
            Screen::ManageGames => vec![("j/k", "move"), ("Esc", "catalog")],
            Screen::Success => vec![("Enter", "catalog")],
            Screen::Auth | Screen::BorrowForm => vec![
                ("F1", "catalog"),
                ("F2", "history"),
                ("F4", "return"),
                ("Ctrl+C", "quit"),
            ],
        };
        let paragraph = Paragraph::new(vec![Line::from(primary), key_hint_line(&hints)])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn key_hint_line(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::new();
    for (key, action) in hints {
        spans.push(Span::styled(
            key.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {action}  ")));
    }
    Line::from(spans)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    cursor: usize,
    list_height: usize,
    filter: String,
    available_only: bool,
    mode: Mode,
    history_offset: usize,
    manage_cursor: usize,
    status: String,
    tick: usize,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            cursor: 0,
            list_height: 1,
            filter: String::new(),
            available_only: false,
            mode: Mode::Browse,
            history_offset: 0,
            manage_cursor: 0,
            status: "Ready".to_string(),
            tick: 0,
            should_quit: false,
        }
    }
}

impl UiState {
    fn move_cursor(&mut self, delta: isize, total: usize) {
        if total == 0 {
            self.cursor = 0;
            return;
        }
        let idx = (self.cursor as isize + delta).clamp(0, total as isize - 1);
        self.cursor = idx as usize;
    }

    fn clamp(&mut self, total: usize) {
        if total == 0 {
            self.cursor = 0;
        } else if self.cursor >= total {
            self.cursor = total - 1;
        }
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wanich_core::{
        catalog::Catalog,
        gateway::MockGateway,
        session::SessionOptions,
    };

    fn app() -> WanichApp {
        app_with(SessionOptions::default())
    }

    fn app_with(options: SessionOptions) -> WanichApp {
        let session = LendingSession::new(Catalog::seeded(), options);
        WanichApp::new(session, std::sync::Arc::new(MockGateway::new(Duration::ZERO)))
    }

    fn press(app: &mut WanichApp, code: KeyCode) {
        app.process_app_event(Some(AppEvent::Input(Event::Key(KeyEvent::new(
            code,
            KeyModifiers::NONE,
        )))));
    }

    fn type_text(app: &mut WanichApp, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    #[test]
    fn space_and_enter_route_unauthenticated_user_to_sign_in() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        assert!(app.session.selection().contains("BG-001"));

        press(&mut app, KeyCode::Enter);
        assert!(app.session.is_summary_open());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.screen(), Screen::Auth);
    }

    #[test]
    fn typing_into_borrow_form_updates_session() {
        let mut app = app();
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);

        type_text(&mut app, "a@b.c");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "pw");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.screen(), Screen::BorrowForm);

        // Sign-in defaults prefill every field; replace the classroom.
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        for _ in 0..3 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "M.6/1");
        assert_eq!(app.session.borrow_form().student.classroom, "M.6/1");
    }

    #[test]
    fn full_length_identity_token_signs_in() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let claims = format!(
            r#"{{"email":"somchai@school.ac.th","name":"Somchai","picture":"https://img/{}.png"}}"#,
            "p".repeat(400)
        );
        let token = format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","kid":"key-1","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(claims),
            "s".repeat(342)
        );
        assert!(token.len() > 1000);

        let mut app = app();
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.session.screen(), Screen::Auth);
        for _ in 0..2 {
            app.process_app_event(Some(AppEvent::Input(Event::Key(KeyEvent::new(
                KeyCode::Char('t'),
                KeyModifiers::CONTROL,
            )))));
        }
        assert_eq!(app.auth.tab, AuthTab::Token);

        type_text(&mut app, &token);
        assert_eq!(app.auth.token.value(), token);
        press(&mut app, KeyCode::Enter);

        let user = app.session.user().expect("token login");
        assert_eq!(user.email, "somchai@school.ac.th");
        assert_eq!(app.session.screen(), Screen::Catalog);
    }

    #[test]
    fn deleting_last_game_keeps_cursor_in_range() {
        let mut app = app_with(SessionOptions {
            admin_enabled: true,
            ..SessionOptions::default()
        });
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.session.screen(), Screen::ManageGames);
        for _ in 0..5 {
            press(&mut app, KeyCode::Char('j'));
        }
        assert_eq!(app.state.manage_cursor, 5);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.session.catalog().len(), 5);
        assert_eq!(app.state.manage_cursor, 4);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.session.catalog().len(), 5);
        assert_eq!(app.state.manage_cursor, 4);
    }

    #[test]
    fn filter_mode_captures_letters() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "hq");
        assert_eq!(app.state.filter, "hq");
        assert_eq!(app.session.screen(), Screen::Catalog);
        assert!(!app.state.should_quit);
    }

    #[test]
    fn return_dialog_captures_input() {
        let mut app = app();
        press(&mut app, KeyCode::Char('r'));
        assert!(app.session.return_dialog().is_some());
        type_text(&mut app, "12345");
        assert_eq!(
            app.session.return_dialog().map(|d| d.student_id.as_str()),
            Some("12345")
        );
        press(&mut app, KeyCode::Esc);
        assert!(app.session.return_dialog().is_none());
    }

    #[test]
    fn submission_event_applies_outcome() {
        let mut app = app();
        press(&mut app, KeyCode::Char('r'));
        type_text(&mut app, "12345");
        let pending = app.session.begin_return_submission().unwrap();
        app.process_app_event(Some(AppEvent::Submitted {
            flow: Flow::Return,
            pending,
            result: Ok(()),
        }));
        assert_eq!(app.session.records().len(), 1);
        assert!(app.session.return_dialog().is_none());
        assert_eq!(app.return_field.value(), "");
    }
}
