use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::core::{parse_command, Action, Command, Context, NotifyLevel, PageNav, PromptKind};
use crate::domain::{
    import, stats, Figure, FiatPrice, NewRow, Row, RowId, Stats, TrackerError, Validation,
    PAGE_SIZE_CHOICES,
};
use crate::infrastructure::clipboard::{self, CopyRoute};
use crate::infrastructure::runtime::{AccountInfo, BatchOutcome, LookupFailure, Progress};
use crate::infrastructure::{RuntimeCommand, RuntimeEvent};
use crate::modules::export;

/// Second press of the delete key must land within this window
pub const DELETE_CONFIRM_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
    Prompt(PromptKind),
    /// Batch delete awaiting y/n
    Confirm,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: NotifyLevel,
    pub since: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct PendingDelete {
    id: RowId,
    since: Instant,
}

/// Presentation settings resolved from config
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub endpoint: String,
    pub fiat_symbol: String,
    pub toast_duration: Duration,
    pub exports_dir: PathBuf,
}

pub struct App {
    pub ctx: Context,
    pub input_mode: InputMode,
    pub command: CommandBar,
    /// Global index of the highlighted row
    pub cursor: usize,
    pub select_mode: bool,
    pub querying: bool,
    pub progress: Option<Progress>,
    pub stats: Stats,
    pub fiat: FiatPrice,
    pub fiat_symbol: String,
    pub endpoint: String,
    pub connected: bool,
    pub status: Option<StatusMessage>,
    pub help_open: bool,
    pub should_quit: bool,
    toast_duration: Duration,
    exports_dir: PathBuf,
    pending_delete: Option<PendingDelete>,
    /// Batch targets still waiting for their result
    batch_pending: HashSet<RowId>,
    outbox: Vec<RuntimeCommand>,
}

impl App {
    pub fn new(ctx: Context, settings: AppSettings) -> Self {
        let cursor = ctx.view().range.start;
        let mut app = Self {
            ctx,
            input_mode: InputMode::Normal,
            command: CommandBar::default(),
            cursor,
            select_mode: false,
            querying: false,
            progress: None,
            stats: Stats::default(),
            fiat: FiatPrice::Loading,
            fiat_symbol: settings.fiat_symbol,
            endpoint: settings.endpoint,
            connected: false,
            status: None,
            help_open: false,
            should_quit: false,
            toast_duration: settings.toast_duration,
            exports_dir: settings.exports_dir,
            pending_delete: None,
            batch_pending: HashSet::new(),
            outbox: Vec::new(),
        };
        app.refresh_stats();
        app
    }

    // === Toast ===

    pub fn set_status(&mut self, text: impl Into<String>, level: NotifyLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, NotifyLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        let now = Instant::now();
        if let Some(status) = self.status.as_ref() {
            if now.duration_since(status.since) > self.toast_duration {
                self.status = None;
            }
        }
        if let Some(pending) = self.pending_delete {
            if now.duration_since(pending.since) > DELETE_CONFIRM_WINDOW {
                self.pending_delete = None;
            }
        }
        if let Err(err) = self.ctx.flush_if_due(now) {
            log::warn!("failed to save rows: {:#}", err);
            self.set_status(format!("Failed to save: {err}"), NotifyLevel::Warn);
        }
    }

    /// Commands queued for the async worker since the last call
    pub fn take_runtime_commands(&mut self) -> Vec<RuntimeCommand> {
        std::mem::take(&mut self.outbox)
    }

    // === Cursor and pages ===

    pub fn current_row(&self) -> Option<&Row> {
        self.ctx.rows().rows().get(self.cursor)
    }

    pub fn current_id(&self) -> Option<RowId> {
        self.current_row().map(|row| row.id)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.ctx.rows().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let target = self.cursor.saturating_add_signed(delta).min(len - 1);
        self.cursor = target;
        self.follow_cursor();
    }

    pub fn cursor_to_top(&mut self) {
        self.cursor = self.ctx.view().range.start;
    }

    pub fn cursor_to_bottom(&mut self) {
        let view = self.ctx.view();
        if !view.is_empty() {
            self.cursor = view.range.end - 1;
        }
    }

    pub fn navigate(&mut self, nav: PageNav) {
        match self.ctx.navigate(nav) {
            Ok(true) => self.cursor = self.ctx.view().range.start,
            Ok(false) => {}
            Err(err) => self.persist_failed(err),
        }
    }

    fn follow_cursor(&mut self) {
        if let Some(id) = self.current_id() {
            if let Err(err) = self.ctx.show_row(id) {
                self.persist_failed(err);
            }
        }
    }

    /// Keep the cursor on a real row of the current page after removals
    fn settle_cursor(&mut self) {
        if let Err(err) = self.ctx.clamp_page() {
            self.persist_failed(err);
        }
        let view = self.ctx.view();
        if !view.range.contains(&self.cursor) {
            self.cursor = view.range.end.saturating_sub(1).max(view.range.start);
        }
    }

    fn persist_failed(&mut self, err: anyhow::Error) {
        log::warn!("failed to save preferences: {:#}", err);
        self.set_status(format!("Failed to save: {err}"), NotifyLevel::Warn);
    }

    // === Rows ===

    /// Append a row and bring it into view. Without an address the
    /// address prompt opens for it.
    pub fn add_row(&mut self, address: Option<String>, label: Option<String>) -> Action {
        let initial = NewRow {
            address: address.clone(),
            label: label.unwrap_or_default(),
            ..NewRow::default()
        };
        let added = self.ctx.rows_mut().add_row(initial);
        if let Some(index) = self.ctx.rows().position(added.id) {
            self.cursor = index;
            self.follow_cursor();
        }
        self.refresh_stats();

        match (address, added.rejected) {
            (None, _) => Action::OpenPrompt(PromptKind::Address(added.id)),
            (Some(input), Some(reason)) => {
                Action::error(TrackerError::rejected(reason, &input).to_string())
            }
            (Some(_), None) => Action::info("Row added"),
        }
    }

    pub fn apply_address(&mut self, id: RowId, input: &str) {
        let input: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        match self.ctx.rows_mut().edit_address(id, &input) {
            Ok(Validation::Accepted(_)) | Ok(Validation::NotSet) => {}
            Err(reason) => {
                let message = TrackerError::rejected(reason, &input).to_string();
                self.set_status(message, NotifyLevel::Error);
            }
        }
        self.refresh_stats();
    }

    pub fn apply_label(&mut self, id: RowId, input: &str) {
        self.ctx.rows_mut().set_label(id, input);
    }

    /// Delete the highlighted row on the second press within the window
    pub fn press_delete(&mut self) {
        self.press_delete_at(Instant::now());
    }

    pub fn press_delete_at(&mut self, now: Instant) {
        let Some(id) = self.current_id() else {
            self.set_status("No row selected", NotifyLevel::Warn);
            return;
        };
        let confirmed = self.pending_delete.is_some_and(|pending| {
            pending.id == id && now.duration_since(pending.since) <= DELETE_CONFIRM_WINDOW
        });
        if !confirmed {
            self.pending_delete = Some(PendingDelete { id, since: now });
            self.set_status("Press d again to delete this row", NotifyLevel::Info);
            return;
        }

        self.pending_delete = None;
        if self.ctx.rows_mut().remove_row(id).is_some() {
            self.settle_cursor();
            self.refresh_stats();
            self.set_status("Row deleted", NotifyLevel::Info);
        }
    }

    // === Batch delete ===

    /// Enter select mode, or leave it: with rows selected that asks for
    /// confirmation, without it simply exits.
    pub fn toggle_select_mode(&mut self) {
        if !self.select_mode {
            self.select_mode = true;
            self.set_status(
                "Select rows with space, a to select all, v to delete",
                NotifyLevel::Info,
            );
            return;
        }
        if self.ctx.rows().selected_count() > 0 {
            self.input_mode = InputMode::Confirm;
        } else {
            self.select_mode = false;
        }
    }

    pub fn toggle_current_selected(&mut self) {
        if !self.select_mode {
            return;
        }
        if let Some(id) = self.current_id() {
            self.ctx.rows_mut().toggle_selected(id);
        }
    }

    pub fn toggle_select_all(&mut self) {
        if !self.select_mode {
            return;
        }
        let all = self.ctx.rows().selected_count() == self.ctx.rows().len();
        self.ctx.rows_mut().select_all(!all);
    }

    pub fn confirm_delete(&mut self) {
        let ids = self.ctx.rows().selected_ids();
        let removed = self.ctx.rows_mut().remove_rows(&ids);
        self.input_mode = InputMode::Normal;
        self.select_mode = false;
        self.settle_cursor();
        self.refresh_stats();
        self.set_status(format!("Deleted {} rows", removed), NotifyLevel::Info);
    }

    pub fn cancel_delete(&mut self) {
        self.ctx.rows_mut().select_all(false);
        self.input_mode = InputMode::Normal;
        self.select_mode = false;
    }

    // === Queries ===

    pub fn refresh_current(&mut self) -> Action {
        let Some(row) = self.current_row() else {
            return Action::warn("No row selected");
        };
        let Some(address) = row.address.clone() else {
            return Action::warn(LookupFailure::InvalidAddress.message());
        };
        let id = row.id;
        self.ctx.rows_mut().mark_loading(id, true);
        // The refresh owns the loading flag from here on
        self.batch_pending.remove(&id);
        self.outbox.push(RuntimeCommand::QueryRow {
            target: crate::domain::QueryTarget { id, address },
        });
        Action::None
    }

    pub fn query_all(&mut self) -> Action {
        if self.querying {
            return Action::warn("A query is already running");
        }
        let targets = self.ctx.rows().query_targets();
        if targets.is_empty() {
            return Action::warn("No addresses to query");
        }
        for target in &targets {
            self.ctx.rows_mut().mark_loading(target.id, true);
        }
        self.batch_pending = targets.iter().map(|target| target.id).collect();
        self.querying = true;
        self.progress = Some(Progress::estimate(0, targets.len(), Duration::ZERO));
        log::info!("querying {} addresses", targets.len());
        self.outbox.push(RuntimeCommand::QueryRows { targets });
        Action::None
    }

    pub fn stop_query(&mut self) -> Action {
        if !self.querying {
            return Action::warn("No query running");
        }
        self.outbox.push(RuntimeCommand::StopQuery);
        Action::info("Stopping query...")
    }

    /// "completed/total (~Ns)" while a batch runs
    pub fn progress_text(&self) -> Option<String> {
        self.progress.map(|p| {
            format!("Querying {}/{} (~{}s)", p.completed, p.total, p.eta_secs)
        })
    }

    fn apply_lookup(&mut self, id: RowId, outcome: &Result<AccountInfo, LookupFailure>) {
        let (balance, tx_count) = match outcome {
            Ok(info) => (
                Figure::Value(info.balance.clone()),
                Figure::Value(info.tx_count.clone()),
            ),
            Err(_) => (Figure::Failed, Figure::Failed),
        };
        self.ctx.rows_mut().update_balance(id, balance, tx_count);
    }

    /// Drop the batch slot and the loading flags of targets it never reached
    fn release_batch(&mut self) {
        self.querying = false;
        self.progress = None;
        for id in std::mem::take(&mut self.batch_pending) {
            self.ctx.rows_mut().mark_loading(id, false);
        }
    }

    fn finish_query(&mut self, outcome: BatchOutcome) {
        self.release_batch();
        let message = if outcome.cancelled {
            format!(
                "Query stopped, completed {}/{}",
                outcome.completed, outcome.total
            )
        } else {
            format!(
                "Query finished: {}/{} succeeded in {}s",
                outcome.completed - outcome.failed,
                outcome.total,
                outcome.elapsed.as_secs()
            )
        };
        self.set_status(message, NotifyLevel::Info);
        self.refresh_stats();
    }

    // === Stats ===

    /// Recompute from the table and ask for a fresh price
    pub fn refresh_stats(&mut self) {
        self.stats = stats::compute(self.ctx.rows().rows());
        self.fiat = FiatPrice::Loading;
        self.outbox.push(RuntimeCommand::FetchPrice);
    }

    pub fn fiat_display(&self) -> String {
        self.stats.fiat_display(self.fiat, &self.fiat_symbol)
    }

    // === Import / export / clipboard ===

    pub fn import_file(&mut self, input: &str) -> Action {
        let path = import::expand_path(input);
        if path.as_os_str().is_empty() {
            return Action::warn("No file given");
        }
        match import::read_file(&path) {
            Ok(items) => self.import_items(items),
            Err(err) => {
                log::warn!("import failed: {}", err);
                Action::error(err.to_string())
            }
        }
    }

    pub fn import_text(&mut self, text: &str) -> Action {
        let candidates = import::parse_text(text);
        if candidates.is_empty() {
            return Action::warn("Nothing to import");
        }
        let items = candidates.into_iter().map(import::ImportItem::bare).collect();
        self.import_items(items)
    }

    fn import_items(&mut self, items: Vec<import::ImportItem>) -> Action {
        if items.is_empty() {
            return Action::warn("Nothing to import");
        }
        let summary = import::apply(self.ctx.rows_mut(), items);
        if summary.imported > 0 {
            self.refresh_stats();
        }
        let level = if summary.imported > 0 {
            NotifyLevel::Info
        } else {
            NotifyLevel::Warn
        };
        Action::Notify(summary.message(), level)
    }

    pub fn export_csv(&self) -> Action {
        export::export_rows(self.ctx.rows().rows(), &self.exports_dir)
    }

    pub fn copy_addresses(&self) -> Action {
        let addresses = self.ctx.rows().addresses();
        if addresses.is_empty() {
            return Action::warn("No addresses to copy");
        }
        match clipboard::copy_text(&addresses.join("\n")) {
            Ok(CopyRoute::System) => Action::info(format!("Copied {} addresses", addresses.len())),
            Ok(CopyRoute::Terminal) => Action::info(format!(
                "Copied {} addresses via terminal clipboard",
                addresses.len()
            )),
            Err(err) => Action::error(format!("Copy failed: {err}")),
        }
    }

    // === Table settings ===

    pub fn set_title(&mut self, text: &str) -> Action {
        match self.ctx.set_title(text) {
            Ok(title) => Action::info(format!("Title set to {title}")),
            Err(err) => Action::error(format!("Failed to save title: {err}")),
        }
    }

    pub fn cycle_page_size(&mut self) -> Action {
        match self.ctx.cycle_page_size() {
            Ok(size) => {
                self.cursor_to_top();
                Action::info(format!("{size} rows per page"))
            }
            Err(err) => Action::error(format!("Failed to save page size: {err}")),
        }
    }

    pub fn set_page_size(&mut self, size: usize) -> Action {
        if !PAGE_SIZE_CHOICES.contains(&size) {
            return Action::warn(format!("Page size must be one of {:?}", PAGE_SIZE_CHOICES));
        }
        match self.ctx.set_page_size(size) {
            Ok(()) => {
                self.cursor_to_top();
                Action::info(format!("{size} rows per page"))
            }
            Err(err) => Action::error(format!("Failed to save page size: {err}")),
        }
    }

    // === Command bar and prompts ===

    pub fn enter_command(&mut self) {
        self.input_mode = InputMode::Command;
        self.command.input.clear();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    /// Open a prompt pre-filled with the field's current value; the address
    /// field shows the full address (or the refused input) while editing.
    pub fn enter_prompt(&mut self, kind: PromptKind) {
        let prefill = match kind {
            PromptKind::Address(id) => self
                .ctx
                .rows()
                .get(id)
                .and_then(|row| row.rejected_input.clone().or_else(|| row.address.clone()))
                .unwrap_or_default(),
            PromptKind::Label(id) => self
                .ctx
                .rows()
                .get(id)
                .map(|row| row.label.clone())
                .unwrap_or_default(),
            PromptKind::Title => self.ctx.title().to_string(),
            PromptKind::ImportFile | PromptKind::ImportText => String::new(),
        };
        self.input_mode = InputMode::Prompt(kind);
        self.command.input = prefill;
    }

    pub fn exit_prompt(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    /// Typed character; address fields drop whitespace as it arrives
    pub fn push_input(&mut self, c: char) {
        if matches!(self.input_mode, InputMode::Prompt(PromptKind::Address(_))) && c.is_whitespace()
        {
            return;
        }
        self.command.input.push(c);
    }

    /// Bracketed paste into the active input
    pub fn paste(&mut self, text: &str) {
        match self.input_mode {
            InputMode::Prompt(PromptKind::Address(_)) => self
                .command
                .input
                .extend(text.chars().filter(|c| !c.is_whitespace())),
            InputMode::Prompt(PromptKind::ImportText) => self.command.input.push_str(text),
            InputMode::Command | InputMode::Prompt(_) => self
                .command
                .input
                .push_str(&text.replace(['\r', '\n'], " ")),
            InputMode::Normal => {
                let action = self.import_text(text);
                self.apply_action(action);
            }
            InputMode::Confirm => {}
        }
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        self.exit_command();
        if input.is_empty() {
            return;
        }
        let cmd = parse_command(&input);
        self.command.last = Some(input);
        let action = self.execute_command(&cmd);
        self.apply_action(action);
    }

    pub fn apply_prompt(&mut self, kind: PromptKind) {
        let input = std::mem::take(&mut self.command.input);
        self.exit_prompt();
        let action = match kind {
            PromptKind::Address(id) => {
                self.apply_address(id, &input);
                Action::None
            }
            PromptKind::Label(id) => {
                self.apply_label(id, &input);
                Action::None
            }
            PromptKind::Title => self.set_title(&input),
            PromptKind::ImportFile => self.import_file(&input),
            PromptKind::ImportText => self.import_text(&input),
        };
        self.apply_action(action);
    }

    /// Execute a parsed command
    pub fn execute_command(&mut self, cmd: &Command) -> Action {
        match cmd {
            Command::Add { address, label } => self.add_row(address.clone(), label.clone()),
            Command::Import(Some(path)) => self.import_file(path),
            Command::Import(None) => Action::OpenPrompt(PromptKind::ImportFile),
            Command::ImportText(Some(text)) => self.import_text(text),
            Command::ImportText(None) => Action::OpenPrompt(PromptKind::ImportText),
            Command::Delete => {
                if self.ctx.rows().selected_count() > 0 {
                    self.select_mode = true;
                    self.input_mode = InputMode::Confirm;
                    Action::None
                } else {
                    Action::warn("No rows selected (v to select)")
                }
            }
            Command::Copy => self.copy_addresses(),
            Command::Export => self.export_csv(),

            Command::Query => self.query_all(),
            Command::Stop => self.stop_query(),
            Command::Refresh => self.refresh_current(),
            Command::Stats => {
                self.refresh_stats();
                Action::info("Updating stats...")
            }

            Command::Title(text) => self.set_title(text),
            Command::PageSize(None) => self.cycle_page_size(),
            Command::PageSize(Some(size)) => self.set_page_size(*size),
            Command::Page(page) => {
                self.navigate(PageNav::To(*page));
                Action::None
            }

            Command::Help => Action::OpenHelp,
            Command::Quit => Action::Quit,

            Command::Unknown(s) => Action::warn(format!("Unknown command: {}", s)),
        }
    }

    /// Apply an action returned by a command
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Notify(msg, level) => self.set_status(msg, level),
            Action::OpenPrompt(kind) => self.enter_prompt(kind),
            Action::OpenHelp => self.help_open = true,
            Action::CloseOverlay => {
                self.help_open = false;
                if self.input_mode == InputMode::Confirm {
                    self.cancel_delete();
                }
            }
            Action::Quit => self.should_quit = true,
        }
    }

    // === Runtime events ===

    pub fn apply_runtime_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Connected { endpoint } => {
                self.endpoint = endpoint;
                self.connected = true;
            }
            RuntimeEvent::RowQueried { id, outcome } => {
                if self.batch_pending.remove(&id) {
                    self.apply_lookup(id, &outcome);
                }
            }
            RuntimeEvent::RowRefreshed { id, outcome } => {
                self.apply_lookup(id, &outcome);
                if let Err(failure) = &outcome {
                    self.set_status(failure.message(), NotifyLevel::Error);
                }
                self.refresh_stats();
            }
            RuntimeEvent::Progress(progress) => self.progress = Some(progress),
            RuntimeEvent::QueryFinished(outcome) => self.finish_query(outcome),
            RuntimeEvent::QueryRejected { reason } => {
                log::warn!("batch refused: {}", reason);
                self.release_batch();
                self.set_status(reason, NotifyLevel::Warn);
            }
            RuntimeEvent::PriceReady { price } => {
                self.fiat = price.map_or(FiatPrice::Unavailable, FiatPrice::Price);
            }
            RuntimeEvent::Error { message } => {
                log::warn!("worker: {}", message);
                if message.starts_with("Connection failed") {
                    self.connected = false;
                }
                self.set_status(message, NotifyLevel::Error);
            }
        }
    }

    /// Flush pending writes before exit
    pub fn shutdown(&mut self) {
        if let Err(err) = self.ctx.teardown() {
            log::warn!("failed to flush rows on exit: {:#}", err);
        }
    }
}
