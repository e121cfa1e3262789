use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::{
    auth::{decode_identity_token, LocalCredentials},
    catalog::{Catalog, GameDraft},
    config::AppConfig,
    error::{require, SessionError},
    gateway::{GatewayError, RecordGateway},
    models::{BorrowRecord, Game, RecordKind, StudentInfo, User},
    records::RecordStore,
    selection::SelectionSet,
};

use super::notice::{NoticeLevel, Notification};

/// Full-screen views of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Browsable game list with selection checkboxes.
    Catalog,
    /// Sign-in / register / identity token.
    Auth,
    /// Borrower details for the pending selection.
    BorrowForm,
    /// Confirmation after a recorded borrow.
    Success,
    /// Tabular transaction log.
    History,
    /// Admin add/edit/delete of games.
    ManageGames,
}

/// Tunables for a session, usually taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Lifetime of transient notifications.
    pub notification_ttl: Duration,
    /// Whether [`Screen::ManageGames`] and catalog edits are allowed.
    pub admin_enabled: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            notification_ttl: Duration::from_secs(5),
            admin_enabled: false,
        }
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            notification_ttl: config.notification_ttl(),
            admin_enabled: config.admin_enabled,
        }
    }
}

/// Borrow form fields plus its in-flight marker.
#[derive(Debug, Clone, Default)]
pub struct BorrowForm {
    /// Borrower details being edited.
    pub student: StudentInfo,
    ticket: Option<u64>,
}

impl BorrowForm {
    /// Whether a submission from this form is awaiting the gateway.
    pub fn is_busy(&self) -> bool {
        self.ticket.is_some()
    }
}

/// Return dialog state; exists only while the dialog is open.
#[derive(Debug, Clone, Default)]
pub struct ReturnDialog {
    /// Student id typed by the user.
    pub student_id: String,
    ticket: Option<u64>,
}

impl ReturnDialog {
    /// Whether a submission from this dialog is awaiting the gateway.
    pub fn is_busy(&self) -> bool {
        self.ticket.is_some()
    }
}

/// A record handed out for delivery, to be resolved with the gateway outcome.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    /// Identifies the form instance that started the submission.
    pub ticket: u64,
    /// Record to forward.
    pub record: BorrowRecord,
}

/// What resolving a submission did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Record appended and the flow advanced.
    Recorded,
    /// Gateway failed; the form stays open and an error is shown.
    Failed(String),
    /// The originating form was left before the outcome arrived.
    Stale,
}

/// Session state and transition rules for the whole client.
///
/// Owns the selection, the record log, the current user, the screen, and
/// the form states. Every mutation goes through one of its methods.
#[derive(Debug)]
pub struct LendingSession {
    catalog: Catalog,
    selection: SelectionSet,
    records: RecordStore,
    user: Option<User>,
    screen: Screen,
    summary_open: bool,
    borrow_form: BorrowForm,
    return_dialog: Option<ReturnDialog>,
    notification: Option<Notification>,
    options: SessionOptions,
    next_ticket: u64,
}

impl LendingSession {
    /// Fresh session on the catalog screen.
    pub fn new(catalog: Catalog, options: SessionOptions) -> Self {
        Self {
            catalog,
            selection: SelectionSet::default(),
            records: RecordStore::default(),
            user: None,
            screen: Screen::Catalog,
            summary_open: false,
            borrow_form: BorrowForm::default(),
            return_dialog: None,
            notification: None,
            options,
            next_ticket: 1,
        }
    }

    /// Session over the seed catalog with options from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Catalog::seeded(), SessionOptions::from(config))
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn borrow_form(&self) -> &BorrowForm {
        &self.borrow_form
    }

    pub fn return_dialog(&self) -> Option<&ReturnDialog> {
        self.return_dialog.as_ref()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn is_summary_open(&self) -> bool {
        self.summary_open
    }

    pub fn admin_enabled(&self) -> bool {
        self.options.admin_enabled
    }

    /// Selected games in catalog order.
    pub fn selected_games(&self) -> Vec<Game> {
        self.catalog.selected(&self.selection)
    }

    // ---- selection ------------------------------------------------------

    /// Flip the selection state of a catalog game. Returns the new membership.
    pub fn toggle_game(&mut self, id: &str) -> Result<bool, SessionError> {
        if self.catalog.get(id).is_none() {
            return Err(crate::catalog::CatalogError::NotFound(id.to_string()).into());
        }
        let selected = self.selection.toggle(id);
        debug!(game_id = %id, selected, count = self.selection.len(), "Selection toggled");
        Ok(selected)
    }

    /// Show the summary of the current selection before confirming.
    pub fn open_borrow_summary(&mut self) -> Result<(), SessionError> {
        if self.selection.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        self.summary_open = true;
        Ok(())
    }

    pub fn close_borrow_summary(&mut self) {
        self.summary_open = false;
    }

    /// Confirm the selection: sign-in first when nobody is logged in.
    pub fn confirm_selection(&mut self) -> Result<Screen, SessionError> {
        if self.selection.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        self.summary_open = false;
        let next = if self.user.is_some() {
            Screen::BorrowForm
        } else {
            Screen::Auth
        };
        info!(count = self.selection.len(), next = ?next, "Selection confirmed");
        self.set_screen(next);
        Ok(next)
    }

    // ---- navigation -----------------------------------------------------

    pub fn show_catalog(&mut self) {
        self.set_screen(Screen::Catalog);
    }

    pub fn show_history(&mut self) {
        self.set_screen(Screen::History);
    }

    pub fn show_auth(&mut self) {
        self.set_screen(Screen::Auth);
    }

    pub fn show_manage_games(&mut self) -> Result<(), SessionError> {
        if !self.options.admin_enabled {
            return Err(SessionError::AdminDisabled);
        }
        self.set_screen(Screen::ManageGames);
        Ok(())
    }

    fn set_screen(&mut self, next: Screen) {
        if self.screen == Screen::BorrowForm && next != Screen::BorrowForm {
            if let Some(ticket) = self.borrow_form.ticket.take() {
                debug!(ticket, "Left borrow form with a submission in flight");
            }
        }
        if next != Screen::Catalog {
            self.summary_open = false;
        }
        self.screen = next;
    }

    // ---- authentication -------------------------------------------------

    /// Log in a user from an unverified identity token.
    pub fn login_with_token(&mut self, token: &str) -> Result<(), SessionError> {
        let claims = decode_identity_token(token).map_err(|err| {
            warn!(error = %err, "Identity token rejected");
            err
        })?;
        self.login(claims.into_user());
        Ok(())
    }

    /// Log in from the local form; the password is not checked.
    pub fn login_local(&mut self, credentials: LocalCredentials) -> Result<(), SessionError> {
        credentials.validate()?;
        self.login(credentials.into_user());
        Ok(())
    }

    fn login(&mut self, user: User) {
        info!(email = %user.email, "User logged in");
        let student = &mut self.borrow_form.student;
        for (field, value) in [
            (&mut student.full_name, &user.full_name),
            (&mut student.student_id, &user.student_id),
            (&mut student.classroom, &user.classroom),
        ] {
            if !value.is_empty() {
                *field = value.clone();
            }
        }
        self.notify(format!("Welcome, {}", user.full_name));
        self.user = Some(user);
        if self.selection.is_empty() {
            self.set_screen(Screen::Catalog);
        } else {
            self.set_screen(Screen::BorrowForm);
        }
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(email = %user.email, "User logged out");
        }
        self.set_screen(Screen::Catalog);
        self.notify("Signed out".to_string());
    }

    // ---- borrow flow ----------------------------------------------------

    /// Mutable borrower details while the form is idle.
    pub fn borrow_fields_mut(&mut self) -> Option<&mut StudentInfo> {
        if self.borrow_form.is_busy() {
            None
        } else {
            Some(&mut self.borrow_form.student)
        }
    }

    /// Validate the form and hand out the BORROW record to deliver.
    pub fn begin_borrow_submission(&mut self) -> Result<PendingSubmission, SessionError> {
        if self.screen != Screen::BorrowForm {
            return Err(SessionError::NotOpen("borrow form"));
        }
        if self.borrow_form.is_busy() {
            return Err(SessionError::SubmissionInProgress);
        }
        let student = &self.borrow_form.student;
        require("full name", &student.full_name)?;
        require("student id", &student.student_id)?;
        require("classroom", &student.classroom)?;
        if self.selection.is_empty() {
            return Err(SessionError::EmptySelection);
        }

        let record = BorrowRecord::borrow(student, self.catalog.names_for(&self.selection));
        let ticket = self.issue_ticket();
        self.borrow_form.ticket = Some(ticket);
        info!(ticket, record_id = %record.id, games = %record.games, "Borrow submission started");
        Ok(PendingSubmission { ticket, record })
    }

    /// Apply the gateway outcome of a borrow submission.
    pub fn finish_borrow_submission(
        &mut self,
        pending: PendingSubmission,
        result: Result<(), GatewayError>,
    ) -> SubmissionOutcome {
        if self.borrow_form.ticket != Some(pending.ticket) {
            return self.resolve_stale(pending, result);
        }
        self.borrow_form.ticket = None;
        match result {
            Ok(()) => {
                info!(record_id = %pending.record.id, "Borrow recorded");
                self.records.append(pending.record);
                self.selection.clear();
                self.set_screen(Screen::Success);
                SubmissionOutcome::Recorded
            }
            Err(err) => self.fail_submission(RecordKind::Borrow, err),
        }
    }

    /// Run a borrow submission against `gateway` to completion.
    pub async fn submit_borrow(
        &mut self,
        gateway: &dyn RecordGateway,
    ) -> Result<SubmissionOutcome, SessionError> {
        let pending = self.begin_borrow_submission()?;
        let result = gateway.submit(&pending.record).await;
        Ok(self.finish_borrow_submission(pending, result))
    }

    // ---- return flow ----------------------------------------------------

    pub fn open_return_dialog(&mut self) {
        if self.return_dialog.is_none() {
            self.return_dialog = Some(ReturnDialog::default());
        }
    }

    /// Close the return dialog; refused while its submission is pending.
    pub fn close_return_dialog(&mut self) -> Result<(), SessionError> {
        match &self.return_dialog {
            Some(dialog) if dialog.is_busy() => Err(SessionError::SubmissionInProgress),
            _ => {
                self.return_dialog = None;
                Ok(())
            }
        }
    }

    /// Mutable student id while the dialog is open and idle.
    pub fn return_student_id_mut(&mut self) -> Option<&mut String> {
        self.return_dialog
            .as_mut()
            .filter(|dialog| !dialog.is_busy())
            .map(|dialog| &mut dialog.student_id)
    }

    /// Validate the dialog and hand out the RETURN record to deliver.
    pub fn begin_return_submission(&mut self) -> Result<PendingSubmission, SessionError> {
        let ticket = self.next_ticket;
        let dialog = self
            .return_dialog
            .as_mut()
            .ok_or(SessionError::NotOpen("return dialog"))?;
        if dialog.is_busy() {
            return Err(SessionError::SubmissionInProgress);
        }
        require("student id", &dialog.student_id)?;

        let record = BorrowRecord::return_all(&dialog.student_id);
        dialog.ticket = Some(ticket);
        self.next_ticket += 1;
        info!(ticket, record_id = %record.id, student_id = %record.student_id, "Return submission started");
        Ok(PendingSubmission { ticket, record })
    }

    /// Apply the gateway outcome of a return submission.
    pub fn finish_return_submission(
        &mut self,
        pending: PendingSubmission,
        result: Result<(), GatewayError>,
    ) -> SubmissionOutcome {
        let current = self.return_dialog.as_ref().and_then(|dialog| dialog.ticket);
        if current != Some(pending.ticket) {
            return self.resolve_stale(pending, result);
        }
        if let Some(dialog) = self.return_dialog.as_mut() {
            dialog.ticket = None;
        }
        match result {
            Ok(()) => {
                info!(record_id = %pending.record.id, "Return recorded");
                self.records.append(pending.record);
                self.return_dialog = None;
                self.notify("Return recorded. Thanks for playing!".to_string());
                SubmissionOutcome::Recorded
            }
            Err(err) => self.fail_submission(RecordKind::Return, err),
        }
    }

    /// Run a return submission against `gateway` to completion.
    pub async fn submit_return(
        &mut self,
        gateway: &dyn RecordGateway,
    ) -> Result<SubmissionOutcome, SessionError> {
        let pending = self.begin_return_submission()?;
        let result = gateway.submit(&pending.record).await;
        Ok(self.finish_return_submission(pending, result))
    }

    fn issue_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }

    fn fail_submission(&mut self, kind: RecordKind, err: GatewayError) -> SubmissionOutcome {
        warn!(kind = %kind, error = %err, "Submission failed");
        let message = format!("Could not record {}: {err}", kind.as_str().to_lowercase());
        self.notify_error(message.clone());
        SubmissionOutcome::Failed(message)
    }

    // The sink already has the record, so history keeps it and the user is told;
    // the flow does not move.
    fn resolve_stale(
        &mut self,
        pending: PendingSubmission,
        result: Result<(), GatewayError>,
    ) -> SubmissionOutcome {
        match result {
            Ok(()) => {
                info!(ticket = pending.ticket, record_id = %pending.record.id, "Late submission recorded without navigation");
                self.notify(format!(
                    "Earlier {} was recorded ({}). Check history before submitting again.",
                    pending.record.kind.as_str().to_lowercase(),
                    pending.record.games
                ));
                self.records.append(pending.record);
            }
            Err(err) => {
                warn!(ticket = pending.ticket, error = %err, "Late submission failed");
            }
        }
        SubmissionOutcome::Stale
    }

    // ---- catalog administration -----------------------------------------

    pub fn add_game(&mut self, draft: GameDraft) -> Result<Game, SessionError> {
        self.ensure_admin()?;
        Ok(self.catalog.add(draft)?)
    }

    pub fn update_game(&mut self, id: &str, draft: GameDraft) -> Result<Game, SessionError> {
        self.ensure_admin()?;
        Ok(self.catalog.update(id, draft)?)
    }

    /// Delete a game and drop it from the selection.
    pub fn remove_game(&mut self, id: &str) -> Result<Game, SessionError> {
        self.ensure_admin()?;
        let game = self.catalog.remove(id)?;
        self.selection.remove(id);
        Ok(game)
    }

    fn ensure_admin(&self) -> Result<(), SessionError> {
        if self.options.admin_enabled {
            Ok(())
        } else {
            Err(SessionError::AdminDisabled)
        }
    }

    // ---- notifications --------------------------------------------------

    pub fn notify(&mut self, message: String) {
        self.notification = Some(Notification::new(
            message,
            NoticeLevel::Info,
            self.options.notification_ttl,
        ));
    }

    pub fn notify_error(&mut self, message: String) {
        self.notification = Some(Notification::new(
            message,
            NoticeLevel::Error,
            self.options.notification_ttl,
        ));
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    /// Drop the notification once its lifetime has passed.
    pub fn expire_notification(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .map(|notice| notice.is_expired(now))
            .unwrap_or(false)
        {
            self.notification = None;
        }
    }
}
