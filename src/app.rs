//! Admin dashboard — egui/eframe application.
//!
//! # Architecture
//!
//! [`AdminApp`] is the top-level [`eframe::App`].  It owns the latest
//! [`ListState`] snapshot for each screen plus two channel endpoints:
//!
//! * `command_tx` — sends [`SyncCommand`] to the sync runner.
//! * `event_rx`   — receives [`SyncEvent`] snapshots from the runner.
//!
//! The UI never awaits a request.  Screens render whatever the last snapshot
//! said; the runner pushes a new snapshot at every state transition, so
//! loading spinners and disabled buttons track the in-flight request.
//!
//! # Screens
//!
//! | Tab | Who | Content |
//! |-----|-----|---------|
//! | Users | admin | account table, admin toggle, delete |
//! | Whitelist | admin | permitted GitHub IDs, add/remove |
//! | Global dictionary | admin | replacement rules for everyone |
//! | My dictionary | any user | personal replacement rules (capped) |
//! | Settings | any user | hotkey binding, window options, logout |
//!
//! Until a token is stored the app shows a login view instead: it displays
//! the server's login URL and accepts the pasted callback URL.

use std::sync::Arc;

use eframe::egui;
use tokio::sync::mpsc;

use crate::api::types::{format_opt_timestamp, format_timestamp};
use crate::api::{
    ApiClient, DictionaryEntry, SessionUser, User, WhitelistEntry, PERSONAL_DICTIONARY_LIMIT,
};
use crate::auth;
use crate::config::AppConfig;
use crate::controller::ListState;
use crate::hotkey::parse_binding;
use crate::sync::{SyncCommand, SyncEvent};

// ---------------------------------------------------------------------------
// Screen
// ---------------------------------------------------------------------------

/// Which tab is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Users,
    Whitelist,
    GlobalDictionary,
    PersonalDictionary,
    Settings,
}

impl Screen {
    fn title(self) -> &'static str {
        match self {
            Screen::Users => "Users",
            Screen::Whitelist => "Whitelist",
            Screen::GlobalDictionary => "Global dictionary",
            Screen::PersonalDictionary => "My dictionary",
            Screen::Settings => "Settings",
        }
    }

    /// The load command issued when this tab is opened.
    fn load_command(self) -> Option<SyncCommand> {
        match self {
            Screen::Users => Some(SyncCommand::LoadUsers),
            Screen::Whitelist => Some(SyncCommand::LoadWhitelist),
            Screen::GlobalDictionary => Some(SyncCommand::LoadGlobalDictionary),
            Screen::PersonalDictionary => Some(SyncCommand::LoadPersonalDictionary),
            Screen::Settings => None,
        }
    }
}

// ---------------------------------------------------------------------------
// AdminApp
// ---------------------------------------------------------------------------

/// eframe application — the voice-server admin dashboard.
pub struct AdminApp {
    // ── Session ──────────────────────────────────────────────────────────
    /// Authenticated user behind the stored token, once verified.
    session: Option<SessionUser>,
    /// Login/session failure message shown on the login view.
    session_error: Option<String>,
    /// Pasted callback URL on the login view.
    callback_input: String,

    // ── Screen state (latest snapshots from the runner) ──────────────────
    screen: Screen,
    users: ListState<User>,
    whitelist: ListState<WhitelistEntry>,
    global_dictionary: ListState<DictionaryEntry>,
    personal_dictionary: ListState<DictionaryEntry>,

    // ── Form inputs ──────────────────────────────────────────────────────
    whitelist_github_id: String,
    global_pattern: String,
    global_replacement: String,
    personal_pattern: String,
    personal_replacement: String,
    hotkey_input: String,
    hotkey_error: Option<String>,

    // ── Channels ─────────────────────────────────────────────────────────
    command_tx: mpsc::Sender<SyncCommand>,
    event_rx: mpsc::UnboundedReceiver<SyncEvent>,

    // ── Collaborators / config ───────────────────────────────────────────
    client: Arc<ApiClient>,
    config: AppConfig,
    /// First-frame flag; the initial load fires once the UI is up.
    started: bool,
}

impl AdminApp {
    /// Create the app.
    ///
    /// * `client`     — shared API client (token updates on login/logout).
    /// * `command_tx` — sender end of the sync command channel.
    /// * `event_rx`   — receiver end of the sync event channel.
    /// * `config`     — loaded application configuration.
    pub fn new(
        client: Arc<ApiClient>,
        command_tx: mpsc::Sender<SyncCommand>,
        event_rx: mpsc::UnboundedReceiver<SyncEvent>,
        config: AppConfig,
    ) -> Self {
        let hotkey_input = config.hotkey.push_to_talk_key.clone();
        Self {
            session: None,
            session_error: None,
            callback_input: String::new(),
            screen: Screen::Users,
            users: ListState::default(),
            whitelist: ListState::default(),
            global_dictionary: ListState::default(),
            personal_dictionary: ListState::default(),
            whitelist_github_id: String::new(),
            global_pattern: String::new(),
            global_replacement: String::new(),
            personal_pattern: String::new(),
            personal_replacement: String::new(),
            hotkey_input,
            hotkey_error: None,
            command_tx,
            event_rx,
            client,
            config,
            started: false,
        }
    }

    fn send(&self, command: SyncCommand) {
        if self.command_tx.try_send(command).is_err() {
            log::warn!("sync command dropped: channel full or closed");
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending runner events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                SyncEvent::Session(Ok(session)) => {
                    self.session_error = None;
                    self.session = Some(session);
                }
                SyncEvent::Session(Err(message)) => {
                    self.session_error = Some(message);
                    self.session = None;
                }
                SyncEvent::Users(state) => self.users = state,
                SyncEvent::Whitelist(state) => self.whitelist = state,
                SyncEvent::GlobalDictionary(state) => self.global_dictionary = state,
                SyncEvent::PersonalDictionary(state) => self.personal_dictionary = state,
            }
        }
    }

    /// Fire the initial session fetch + first screen load exactly once.
    fn start_if_needed(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        if self.config.auth.token.is_some() {
            self.send(SyncCommand::LoadSession);
            if let Some(cmd) = self.screen.load_command() {
                self.send(cmd);
            }
        }
    }

    fn switch_screen(&mut self, screen: Screen) {
        if self.screen == screen {
            return;
        }
        self.screen = screen;
        if let Some(cmd) = screen.load_command() {
            self.send(cmd);
        }
    }

    // ── Login view ───────────────────────────────────────────────────────

    fn draw_login(&mut self, ui: &mut egui::Ui) {
        ui.heading("Sign in");
        ui.add_space(8.0);
        ui.label("Open the login URL in a browser, authorize with GitHub, then paste the callback URL below.");
        ui.add_space(4.0);

        let url = auth::login_url(&self.config.server.base_url);
        ui.horizontal(|ui| {
            ui.label("Login URL:");
            ui.add(egui::Label::new(egui::RichText::new(&url).monospace()).selectable(true));
        });

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Callback URL:");
            ui.add(
                egui::TextEdit::singleline(&mut self.callback_input)
                    .hint_text("http://…/auth/callback?access_token=…")
                    .desired_width(360.0),
            );
        });

        if ui.button("Sign in").clicked() {
            match auth::extract_token(&self.callback_input) {
                Ok(token) => {
                    self.client.set_token(Some(token.clone()));
                    self.config.auth.token = Some(token);
                    if let Err(e) = self.config.save() {
                        log::warn!("failed to persist settings: {e}");
                    }
                    self.callback_input.clear();
                    self.session_error = None;
                    self.send(SyncCommand::LoadSession);
                    if let Some(cmd) = self.screen.load_command() {
                        self.send(cmd);
                    }
                }
                Err(e) => {
                    self.session_error = Some(e.to_string());
                }
            }
        }

        if let Some(message) = &self.session_error {
            ui.add_space(6.0);
            ui.colored_label(egui::Color32::from_rgb(255, 136, 68), message);
        }
    }

    // ── Shared list-screen widgets ───────────────────────────────────────

    /// Error banner + loading indicator shown above every table.
    fn draw_status<R>(ui: &mut egui::Ui, state: &ListState<R>) {
        if let Some(message) = &state.error {
            ui.colored_label(egui::Color32::from_rgb(255, 136, 68), message);
        }
        if state.loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading…");
            });
        }
    }

    /// Whether mutation triggers should be interactable right now.
    fn can_mutate<R>(state: &ListState<R>) -> bool {
        !state.pending_mutation && !state.loading
    }

    // ── Users screen ─────────────────────────────────────────────────────

    fn draw_users(&mut self, ui: &mut egui::Ui) {
        Self::draw_status(ui, &self.users);

        if ui
            .add_enabled(!self.users.loading, egui::Button::new("Refresh"))
            .clicked()
        {
            self.send(SyncCommand::LoadUsers);
        }
        ui.add_space(6.0);

        if self.users.items.is_empty() && !self.users.loading {
            ui.label("No users registered.");
            return;
        }

        let can_mutate = Self::can_mutate(&self.users);
        let own_id = self.session.as_ref().map(|s| s.user_id);
        let mut commands = Vec::new();

        egui::Grid::new("users_grid")
            .striped(true)
            .num_columns(6)
            .show(ui, |ui| {
                ui.strong("User");
                ui.strong("GitHub ID");
                ui.strong("Created");
                ui.strong("Last login");
                ui.strong("Admin");
                ui.strong("");
                ui.end_row();

                for user in &self.users.items {
                    ui.label(user.github_username.as_deref().unwrap_or("—"));
                    ui.monospace(&user.github_id);
                    ui.label(format_timestamp(&user.created_at));
                    ui.label(format_opt_timestamp(user.last_login_at.as_ref()));

                    // The server refuses self-demotion; don't offer it.
                    let is_self = own_id == Some(user.id);
                    let mut is_admin = user.is_admin;
                    if ui
                        .add_enabled(can_mutate && !is_self, egui::Checkbox::new(&mut is_admin, ""))
                        .changed()
                    {
                        commands.push(SyncCommand::SetUserAdmin {
                            id: user.id,
                            is_admin,
                        });
                    }

                    // Admins cannot be deleted server-side; don't offer it.
                    if ui
                        .add_enabled(can_mutate && !user.is_admin, egui::Button::new("Delete"))
                        .clicked()
                    {
                        commands.push(SyncCommand::DeleteUser { id: user.id });
                    }
                    ui.end_row();
                }
            });

        for command in commands {
            self.send(command);
        }
    }

    // ── Whitelist screen ─────────────────────────────────────────────────

    fn draw_whitelist(&mut self, ui: &mut egui::Ui) {
        Self::draw_status(ui, &self.whitelist);

        let can_mutate = Self::can_mutate(&self.whitelist);
        let mut commands = Vec::new();

        ui.horizontal(|ui| {
            ui.label("GitHub ID:");
            ui.add(
                egui::TextEdit::singleline(&mut self.whitelist_github_id)
                    .hint_text("numeric GitHub account id")
                    .desired_width(200.0),
            );
            let valid = !self.whitelist_github_id.trim().is_empty();
            if ui
                .add_enabled(can_mutate && valid, egui::Button::new("Add"))
                .clicked()
            {
                commands.push(SyncCommand::AddWhitelistEntry {
                    github_id: std::mem::take(&mut self.whitelist_github_id),
                });
            }
        });
        ui.add_space(6.0);

        if self.whitelist.items.is_empty() && !self.whitelist.loading {
            ui.label("Whitelist is empty — nobody can sign in.");
        } else {
            egui::Grid::new("whitelist_grid")
                .striped(true)
                .num_columns(4)
                .show(ui, |ui| {
                    ui.strong("GitHub ID");
                    ui.strong("Username");
                    ui.strong("Added");
                    ui.strong("");
                    ui.end_row();

                    for entry in &self.whitelist.items {
                        ui.monospace(&entry.github_id);
                        ui.label(entry.github_username.as_deref().unwrap_or("—"));
                        ui.label(format_timestamp(&entry.created_at));
                        if ui
                            .add_enabled(can_mutate, egui::Button::new("Remove"))
                            .clicked()
                        {
                            commands.push(SyncCommand::DeleteWhitelistEntry { id: entry.id });
                        }
                        ui.end_row();
                    }
                });
        }

        for command in commands {
            self.send(command);
        }
    }

    // ── Dictionary screens ───────────────────────────────────────────────

    fn draw_global_dictionary(&mut self, ui: &mut egui::Ui) {
        Self::draw_status(ui, &self.global_dictionary);
        ui.label("Replacement rules applied to every user's transcripts.");
        ui.add_space(4.0);

        let can_mutate = Self::can_mutate(&self.global_dictionary);
        let mut commands = Vec::new();

        Self::draw_dictionary_form(
            ui,
            "global_dict_form",
            &mut self.global_pattern,
            &mut self.global_replacement,
            can_mutate,
            |pattern, replacement| {
                commands.push(SyncCommand::AddGlobalEntry {
                    pattern,
                    replacement,
                });
            },
        );
        ui.add_space(6.0);

        Self::draw_dictionary_table(
            ui,
            "global_dict_grid",
            &self.global_dictionary,
            can_mutate,
            |id| commands.push(SyncCommand::DeleteGlobalEntry { id }),
        );

        for command in commands {
            self.send(command);
        }
    }

    fn draw_personal_dictionary(&mut self, ui: &mut egui::Ui) {
        Self::draw_status(ui, &self.personal_dictionary);
        let count = self.personal_dictionary.items.len();
        ui.label(format!(
            "Your replacement rules ({count}/{PERSONAL_DICTIONARY_LIMIT}). Applied after the global dictionary."
        ));
        ui.add_space(4.0);

        let at_cap = count >= PERSONAL_DICTIONARY_LIMIT;
        let can_mutate = Self::can_mutate(&self.personal_dictionary) && !at_cap;
        let mut commands = Vec::new();

        Self::draw_dictionary_form(
            ui,
            "personal_dict_form",
            &mut self.personal_pattern,
            &mut self.personal_replacement,
            can_mutate,
            |pattern, replacement| {
                commands.push(SyncCommand::AddPersonalEntry {
                    pattern,
                    replacement,
                });
            },
        );
        if at_cap {
            ui.colored_label(
                egui::Color32::from_rgb(255, 136, 68),
                format!("Dictionary is full ({PERSONAL_DICTIONARY_LIMIT} entries). Remove one to add another."),
            );
        }
        ui.add_space(6.0);

        let can_delete = Self::can_mutate(&self.personal_dictionary);
        Self::draw_dictionary_table(
            ui,
            "personal_dict_grid",
            &self.personal_dictionary,
            can_delete,
            |id| commands.push(SyncCommand::DeletePersonalEntry { id }),
        );

        for command in commands {
            self.send(command);
        }
    }

    /// Pattern/replacement add form shared by both dictionary screens.
    fn draw_dictionary_form(
        ui: &mut egui::Ui,
        id: &str,
        pattern: &mut String,
        replacement: &mut String,
        enabled: bool,
        mut on_add: impl FnMut(String, String),
    ) {
        ui.push_id(id, |ui| {
            ui.horizontal(|ui| {
                ui.label("Pattern:");
                ui.add(egui::TextEdit::singleline(pattern).desired_width(140.0));
                ui.label("Replacement:");
                ui.add(egui::TextEdit::singleline(replacement).desired_width(140.0));
                let valid = !pattern.trim().is_empty() && !replacement.trim().is_empty();
                if ui
                    .add_enabled(enabled && valid, egui::Button::new("Add"))
                    .clicked()
                {
                    on_add(std::mem::take(pattern), std::mem::take(replacement));
                }
            });
        });
    }

    /// Entry table shared by both dictionary screens.
    fn draw_dictionary_table(
        ui: &mut egui::Ui,
        id: &str,
        state: &ListState<DictionaryEntry>,
        can_delete: bool,
        mut on_delete: impl FnMut(i64),
    ) {
        if state.items.is_empty() && !state.loading {
            ui.label("No entries yet.");
            return;
        }

        egui::Grid::new(id)
            .striped(true)
            .num_columns(4)
            .show(ui, |ui| {
                ui.strong("Pattern");
                ui.strong("Replacement");
                ui.strong("Added");
                ui.strong("");
                ui.end_row();

                for entry in &state.items {
                    ui.label(&entry.pattern);
                    ui.label(&entry.replacement);
                    ui.label(format_timestamp(&entry.created_at));
                    if ui
                        .add_enabled(can_delete, egui::Button::new("Delete"))
                        .clicked()
                    {
                        on_delete(entry.id);
                    }
                    ui.end_row();
                }
            });
    }

    // ── Settings screen ──────────────────────────────────────────────────

    fn draw_settings(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            ui.label("Server:");
            ui.monospace(&self.config.server.base_url);
        });
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            ui.label("Push-to-talk hotkey:");
            ui.add(
                egui::TextEdit::singleline(&mut self.hotkey_input)
                    .hint_text("e.g. F9 or Ctrl+Shift+Space")
                    .desired_width(160.0),
            );
            if ui.button("Save").clicked() {
                match parse_binding(&self.hotkey_input) {
                    Some(binding) => {
                        self.hotkey_error = None;
                        self.hotkey_input = binding.to_string();
                        self.config.hotkey.push_to_talk_key = self.hotkey_input.clone();
                        if let Err(e) = self.config.save() {
                            self.hotkey_error = Some(format!("could not save settings: {e}"));
                        }
                    }
                    None => {
                        self.hotkey_error =
                            Some("unrecognised binding — try F9 or Ctrl+Shift+Space".into());
                    }
                }
            }
        });
        if let Some(message) = &self.hotkey_error {
            ui.colored_label(egui::Color32::from_rgb(255, 136, 68), message);
        }
        ui.add_space(6.0);

        if ui
            .checkbox(&mut self.config.ui.always_on_top, "Always on top")
            .changed()
        {
            if let Err(e) = self.config.save() {
                log::warn!("failed to persist settings: {e}");
            }
        }

        ui.add_space(12.0);
        ui.separator();
        if ui.button("Log out").clicked() {
            self.client.set_token(None);
            self.config.auth.token = None;
            if let Err(e) = self.config.save() {
                log::warn!("failed to persist settings: {e}");
            }
            self.session = None;
            self.session_error = None;
        }
    }

    /// Mirror the current window position into the config so the save on
    /// exit restores it next launch.
    fn track_window_position(&mut self, ctx: &egui::Context) {
        if let Some(rect) = ctx.input(|i| i.viewport().outer_rect) {
            self.config.ui.window_position = Some((rect.min.x, rect.min.y));
        }
    }

    // ── Tab bar ──────────────────────────────────────────────────────────

    fn draw_tabs(&mut self, ui: &mut egui::Ui) {
        let is_admin = self.session.as_ref().is_some_and(|s| s.is_admin);
        let mut tabs = Vec::new();
        if is_admin {
            tabs.extend([Screen::Users, Screen::Whitelist, Screen::GlobalDictionary]);
        }
        tabs.extend([Screen::PersonalDictionary, Screen::Settings]);

        let mut selected = None;
        ui.horizontal(|ui| {
            for tab in tabs {
                if ui
                    .selectable_label(self.screen == tab, tab.title())
                    .clicked()
                {
                    selected = Some(tab);
                }
            }
        });
        if let Some(tab) = selected {
            self.switch_screen(tab);
        }
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for AdminApp {
    /// Called every frame by eframe.  Polls the event channel, then renders
    /// the active view.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();
        self.start_if_needed();
        self.track_window_position(ctx);

        // Keep polling while anything is in flight so snapshots land
        // promptly even without input events.
        let busy = self.users.loading
            || self.users.pending_mutation
            || self.whitelist.loading
            || self.whitelist.pending_mutation
            || self.global_dictionary.loading
            || self.global_dictionary.pending_mutation
            || self.personal_dictionary.loading
            || self.personal_dictionary.pending_mutation;
        if busy {
            ctx.request_repaint_after(std::time::Duration::from_millis(66));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.config.auth.token.is_none() {
                self.draw_login(ui);
                return;
            }

            self.draw_tabs(ui);
            ui.separator();

            // A non-admin landing on an admin tab gets bounced to their own
            // dictionary (the server would 403 every call anyway).
            let is_admin = self.session.as_ref().is_some_and(|s| s.is_admin);
            let admin_screen = matches!(
                self.screen,
                Screen::Users | Screen::Whitelist | Screen::GlobalDictionary
            );
            if self.session.is_some() && !is_admin && admin_screen {
                self.switch_screen(Screen::PersonalDictionary);
            }

            match self.screen {
                Screen::Users => self.draw_users(ui),
                Screen::Whitelist => self.draw_whitelist(ui),
                Screen::GlobalDictionary => self.draw_global_dictionary(ui),
                Screen::PersonalDictionary => self.draw_personal_dictionary(ui),
                Screen::Settings => self.draw_settings(ui),
            }

            if let Some(message) = &self.session_error {
                ui.add_space(8.0);
                ui.colored_label(egui::Color32::from_rgb(255, 136, 68), message);
            }
        });
    }

    /// Persist the window position on exit (best-effort).
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("admin dashboard closing");
        if let Err(e) = self.config.save() {
            log::warn!("failed to persist settings on exit: {e}");
        }
    }
}
