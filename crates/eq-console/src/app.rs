//! Console state and input handling.
//!
//! `App` owns the transcript, the reveal scheduler, and the UI state.
//! Everything server-driven funnels through [`App::apply_transport`],
//! one event at a time; keyboard input goes through [`App::handle_key`].

use crate::clipboard;
use crate::storage::Storage;
use crate::transport::{TransportCommand, TransportEvent};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use eq_core::{
    extract_sections, ChatTurn, FrameOutcome, Inbound, RevealScheduler, SectionFlags, Transcript,
};
use eq_domains::{build_query_request, builtin_domains, history_role, DomainConfig, DomainProfile};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

/// How long the "copied" feedback stays in the status area.
const COPY_FEEDBACK_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Chat,
    DomainSetup,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupFocus {
    List,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomField {
    Name,
    Description,
    Schema,
}

/// Edit state for the domain-setup overlay. The selection list covers
/// the built-in catalog plus one trailing "custom" entry.
pub struct DomainForm {
    pub selected: usize,
    pub focus: SetupFocus,
    pub field: CustomField,
    pub draft: DomainProfile,
}

impl Default for DomainForm {
    fn default() -> Self {
        Self {
            selected: 0,
            focus: SetupFocus::List,
            field: CustomField::Name,
            draft: DomainProfile::default(),
        }
    }
}

pub struct App {
    pub user_id: String,
    pub transcript: Transcript,
    pub reveal: RevealScheduler,
    pub connected: bool,
    pub awaiting_response: bool,
    pub server_status: String,
    pub input: String,
    pub scroll: u16,
    pub mode: Mode,
    pub profile: Option<DomainProfile>,
    pub form: DomainForm,
    pub catalog: Vec<DomainConfig>,
    /// Global expand/collapse per section panel.
    pub expanded: SectionFlags,
    pub dark: bool,
    pub copied_at: Option<Instant>,
    pub suggestion_idx: usize,
    pub should_quit: bool,
    storage: Storage,
    cmd_tx: mpsc::Sender<TransportCommand>,
}

impl App {
    pub fn new(user_id: String, storage: Storage, cmd_tx: mpsc::Sender<TransportCommand>) -> Self {
        let saved = storage.load_transcript().unwrap_or_else(|err| {
            warn!("transcript load failed: {err:#}");
            Vec::new()
        });
        let profile = storage.load_profile().unwrap_or_else(|err| {
            warn!("profile load failed: {err:#}");
            None
        });
        let mode = if profile.as_ref().map(DomainProfile::is_complete).unwrap_or(false) {
            Mode::Chat
        } else {
            Mode::DomainSetup
        };

        Self {
            user_id,
            transcript: Transcript::restore(saved),
            reveal: RevealScheduler::new(),
            connected: false,
            awaiting_response: false,
            server_status: "Disconnected".into(),
            input: String::new(),
            scroll: 0,
            mode,
            profile,
            form: DomainForm::default(),
            catalog: builtin_domains(),
            expanded: SectionFlags { reasoning: true, explanation: true, sql: true },
            dark: true,
            copied_at: None,
            suggestion_idx: 0,
            should_quit: false,
            storage,
            cmd_tx,
        }
    }

    // ---- server events -------------------------------------------------

    pub fn apply_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.connected = true;
                self.server_status = "Connected".into();
            }
            TransportEvent::Disconnected { reason } => {
                self.connected = false;
                self.awaiting_response = false;
                self.server_status = reason.unwrap_or_else(|| "Disconnected".into());
            }
            TransportEvent::Frame(inbound) => self.apply_inbound(inbound),
        }
    }

    fn apply_inbound(&mut self, inbound: Inbound) {
        match self.transcript.apply(inbound) {
            FrameOutcome::Status(text) => self.server_status = text,
            FrameOutcome::ErrorStatus(text) => self.server_status = format!("Error: {text}"),
            FrameOutcome::StreamUpdated(id) => {
                self.awaiting_response = true;
                self.scroll = 0;
                if let Some(message) = self.transcript.get(id) {
                    let structured = extract_sections(&message.content, true);
                    self.reveal.note_partial(id, structured.partial);
                }
            }
            FrameOutcome::Finalized(id) => {
                self.awaiting_response = false;
                if let Some(message) = self.transcript.get(id) {
                    let structured = extract_sections(&message.content, false);
                    self.reveal.schedule_finalized(id, Instant::now(), &structured);
                }
                self.persist();
            }
            FrameOutcome::MessageAdded(_) => {
                self.scroll = 0;
                self.persist();
            }
            FrameOutcome::Ignored => {}
        }
    }

    // ---- reveal scheduling ---------------------------------------------

    pub fn next_reveal_deadline(&self) -> Option<Instant> {
        self.reveal.next_deadline()
    }

    /// Fires due reveals, re-validating each section's presence against
    /// the message's current content at fire time.
    pub fn fire_due_reveals(&mut self, now: Instant) {
        let App { reveal, transcript, .. } = self;
        reveal.fire_due(now, |id: Uuid, section| {
            transcript
                .get(id)
                .map(|m| extract_sections(&m.content, m.is_streaming).has(section))
                .unwrap_or(false)
        });
    }

    // ---- user actions --------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('o') => {
                    self.toggle_connection();
                    return;
                }
                KeyCode::Char('t') => {
                    self.dark = !self.dark;
                    return;
                }
                _ => {}
            }
        }
        match self.mode {
            Mode::Chat => self.handle_chat_key(key),
            Mode::DomainSetup => self.handle_setup_key(key),
            Mode::Help => self.mode = Mode::Chat,
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('d') => self.open_domain_setup(),
                KeyCode::Char('l') => self.clear_transcript(),
                KeyCode::Char('y') => self.copy_last_sql(),
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::F(1) => self.mode = Mode::Help,
            KeyCode::F(2) => self.expanded.reasoning = !self.expanded.reasoning,
            KeyCode::F(3) => self.expanded.explanation = !self.expanded.explanation,
            KeyCode::F(4) => self.expanded.sql = !self.expanded.sql,
            KeyCode::Enter => self.send_message(),
            KeyCode::Tab => self.cycle_suggestion(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Esc => self.input.clear(),
            KeyCode::Up => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn handle_setup_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            self.apply_custom_draft();
            return;
        }
        match self.form.focus {
            SetupFocus::List => self.handle_setup_list_key(key),
            SetupFocus::Custom => self.handle_setup_custom_key(key),
        }
    }

    fn handle_setup_list_key(&mut self, key: KeyEvent) {
        // Last list entry is the custom-domain editor.
        let entries = self.catalog.len() + 1;
        match key.code {
            KeyCode::Esc => {
                if self.has_complete_profile() {
                    self.mode = Mode::Chat;
                }
            }
            KeyCode::Up => {
                self.form.selected = self.form.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                self.form.selected = (self.form.selected + 1).min(entries - 1);
            }
            KeyCode::Enter => {
                if self.form.selected < self.catalog.len() {
                    let profile = DomainProfile::from_config(&self.catalog[self.form.selected]);
                    self.apply_profile(profile);
                } else {
                    self.form.focus = SetupFocus::Custom;
                    self.form.field = CustomField::Name;
                }
            }
            _ => {}
        }
    }

    fn handle_setup_custom_key(&mut self, key: KeyEvent) {
        let field = self.form.field;
        match key.code {
            KeyCode::Esc => self.form.focus = SetupFocus::List,
            KeyCode::Tab => {
                self.form.field = match field {
                    CustomField::Name => CustomField::Description,
                    CustomField::Description => CustomField::Schema,
                    CustomField::Schema => CustomField::Name,
                };
            }
            KeyCode::Enter => match field {
                // Enter advances through the single-line fields and is a
                // literal newline inside the schema editor.
                CustomField::Name => self.form.field = CustomField::Description,
                CustomField::Description => self.form.field = CustomField::Schema,
                CustomField::Schema => self.draft_field_mut().push('\n'),
            },
            KeyCode::Backspace => {
                self.draft_field_mut().pop();
            }
            KeyCode::Char(c) => self.draft_field_mut().push(c),
            _ => {}
        }
    }

    fn draft_field_mut(&mut self) -> &mut String {
        match self.form.field {
            CustomField::Name => &mut self.form.draft.name,
            CustomField::Description => &mut self.form.draft.description,
            CustomField::Schema => &mut self.form.draft.schema,
        }
    }

    fn apply_custom_draft(&mut self) {
        if self.form.draft.is_complete() {
            self.apply_profile(self.form.draft.clone());
        } else {
            self.server_status =
                "Domain name, description and schema are all required".into();
        }
    }

    fn apply_profile(&mut self, profile: DomainProfile) {
        if let Err(err) = self.storage.save_profile(&profile) {
            warn!("profile save failed: {err:#}");
        }
        self.server_status = format!("Domain setup complete: {}", profile.name);
        self.profile = Some(profile);
        self.suggestion_idx = 0;
        self.mode = Mode::Chat;
    }

    pub fn open_domain_setup(&mut self) {
        self.form = DomainForm::default();
        if let Some(profile) = &self.profile {
            self.form.draft = profile.clone();
        }
        self.mode = Mode::DomainSetup;
    }

    pub fn has_complete_profile(&self) -> bool {
        self.profile.as_ref().map(DomainProfile::is_complete).unwrap_or(false)
    }

    pub fn toggle_connection(&mut self) {
        let command = if self.connected {
            TransportCommand::Disconnect
        } else {
            self.server_status = "Connecting...".into();
            TransportCommand::Connect
        };
        if self.cmd_tx.try_send(command).is_err() {
            self.server_status = "Transport unavailable".into();
        }
    }

    pub fn send_message(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }
        if !self.connected {
            self.server_status = "Not connected; press Ctrl+O to connect".into();
            return;
        }
        let Some(profile) = self.profile.as_ref().filter(|p| p.is_complete()) else {
            self.server_status = "Configure a domain before sending queries".into();
            self.open_domain_setup();
            return;
        };

        let history = self.prompt_history();
        let request = build_query_request(&self.user_id, profile, &history, &text);
        let payload = match request.encode() {
            Ok(payload) => payload,
            Err(err) => {
                warn!("request encode failed: {err}");
                return;
            }
        };

        self.transcript.push_user(&text);
        self.input.clear();
        self.scroll = 0;
        self.awaiting_response = true;
        if self.cmd_tx.try_send(TransportCommand::Send(payload)).is_err() {
            self.awaiting_response = false;
            self.server_status = "Send failed: transport unavailable".into();
        }
        self.persist();
    }

    /// User/assistant turns only; result and metrics messages never
    /// enter the prompt.
    fn prompt_history(&self) -> Vec<ChatTurn> {
        self.transcript
            .messages()
            .iter()
            .filter_map(|m| {
                history_role(m.sender).map(|role| ChatTurn::new(role, m.content.clone()))
            })
            .collect()
    }

    pub fn cycle_suggestion(&mut self) {
        let Some(profile) = &self.profile else { return };
        if profile.sample_queries.is_empty() {
            return;
        }
        self.input = profile.sample_queries[self.suggestion_idx % profile.sample_queries.len()]
            .clone();
        self.suggestion_idx += 1;
    }

    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
        self.reveal.clear();
        self.scroll = 0;
        if let Err(err) = self.storage.clear_transcript() {
            warn!("transcript clear failed: {err:#}");
        }
        self.server_status = "Transcript cleared".into();
    }

    /// Copies the SQL of the most recent finalized answer, if any.
    pub fn copy_last_sql(&mut self) {
        let sql = self
            .transcript
            .messages()
            .iter()
            .rev()
            .filter(|m| !m.is_streaming)
            .find_map(|m| {
                let structured = extract_sections(&m.content, false);
                structured.has_sql().then_some(structured.sql)
            });
        let Some(sql) = sql else {
            self.server_status = "No SQL query to copy".into();
            return;
        };
        match clipboard::copy_via_osc52(&sql) {
            Ok(()) => self.copied_at = Some(Instant::now()),
            Err(err) => warn!("clipboard copy failed: {err}"),
        }
    }

    pub fn copy_feedback_active(&self, now: Instant) -> bool {
        self.copied_at
            .map(|at| now.duration_since(at) < COPY_FEEDBACK_TTL)
            .unwrap_or(false)
    }

    fn persist(&self) {
        if let Err(err) = self.storage.save_transcript(self.transcript.messages()) {
            warn!("transcript save failed: {err:#}");
        }
    }
}
