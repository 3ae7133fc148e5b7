use super::{
    chat::{render_chat, ChatView},
    footer::{render_footer, FooterView},
    header::render_header,
    settings_modal::render_settings_modal,
    sidebar::{render_sidebar, SidebarView},
    welcome::{render_welcome, EXAMPLE_QUERIES},
};
use crate::runner::{cancel_agent, run_agent, RunMessage};
use anyhow::Result;
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    prelude::{Constraint, CrosstermBackend, Direction, Layout, Rect, Terminal},
    widgets::{Block, Borders, Clear},
};
use scout_core::{
    agent::{AgentClient, RunInput, StreamEvent},
    effort::{self, EffortLevel, DEFAULT_MODEL},
    history::SearchSessionSummary,
    message::{messages_from_state, Message},
    session::HistorySession,
    settings::Settings,
    suggestions::generate_mixed_follow_up_questions,
    theme::{Element, Theme},
    timeline::{ProcessedEvent, Timeline},
};
use std::collections::HashMap;
use std::io::Stdout;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Input,
    History,
    HistorySearch,
    ConfirmClear,
    Settings,
    EditingApiUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsSelection {
    #[default]
    ApiUrl,
    Effort,
    Model,
    Theme,
    Save,
}

impl SettingsSelection {
    pub fn next(&self) -> Self {
        match self {
            Self::ApiUrl => Self::Effort,
            Self::Effort => Self::Model,
            Self::Model => Self::Theme,
            Self::Theme => Self::Save,
            Self::Save => Self::ApiUrl, // Loop back to the top
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Self::ApiUrl => Self::Save, // Loop back to the bottom
            Self::Effort => Self::ApiUrl,
            Self::Model => Self::Effort,
            Self::Theme => Self::Model,
            Self::Save => Self::Theme,
        }
    }
}

/// Parameters of the search in flight, kept for saving it afterwards.
#[derive(Debug, Clone, PartialEq)]
struct SearchParams {
    effort: EffortLevel,
    model: String,
}

pub struct App {
    should_quit: bool,
    theme: Theme,
    mode: AppMode,
    settings: Settings,
    settings_selection: SettingsSelection,
    edit_buffer: String,
    client: AgentClient,
    session: HistorySession,

    input: String,
    effort: EffortLevel,
    model: String,
    messages: Vec<Message>,
    timeline: Timeline,
    historical_activities: HashMap<String, Vec<ProcessedEvent>>,
    current_params: Option<SearchParams>,
    historical_messages: Option<Vec<Message>>,
    viewing_history: bool,
    is_loading: bool,
    error: Option<String>,
    chat_scroll: u16,

    thread_id: Option<String>,
    run_id: Option<String>,
    run_task: Option<JoinHandle<()>>,
    run_sender: UnboundedSender<RunMessage>,
    run_receiver: UnboundedReceiver<RunMessage>,

    history_selected: usize,
    history_filter: String,
    search_results: Option<Vec<SearchSessionSummary>>,
}

impl App {
    pub fn new(settings: Settings, session: HistorySession, client: AgentClient) -> Self {
        let theme = Theme::new(settings.theme);
        let (run_sender, run_receiver) = mpsc::unbounded_channel();
        Self {
            should_quit: false,
            theme,
            mode: AppMode::Input,
            effort: settings.effort,
            model: settings.model.clone(),
            settings,
            settings_selection: SettingsSelection::default(),
            edit_buffer: String::new(),
            client,
            session,
            input: String::new(),
            messages: Vec::new(),
            timeline: Timeline::new(),
            historical_activities: HashMap::new(),
            current_params: None,
            historical_messages: None,
            viewing_history: false,
            is_loading: false,
            error: None,
            chat_scroll: 0,
            thread_id: None,
            run_id: None,
            run_task: None,
            run_sender,
            run_receiver,
            history_selected: 0,
            history_filter: String::new(),
            search_results: None,
        }
    }

    pub async fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        while !self.should_quit {
            self.drain_run_messages();
            self.draw(terminal)?;
            self.handle_events()?;
            tokio::task::yield_now().await;
        }
        if let Some(task) = self.run_task.take() {
            task.abort();
        }
        Ok(())
    }

    /// Messages on screen: the stored pair while browsing history, the live
    /// conversation otherwise.
    pub fn current_messages(&self) -> &[Message] {
        if self.viewing_history {
            self.historical_messages.as_deref().unwrap_or(&[])
        } else {
            &self.messages
        }
    }

    pub fn current_is_loading(&self) -> bool {
        !self.viewing_history && self.is_loading
    }

    pub fn suggestions(&self) -> Vec<String> {
        if self.current_is_loading() {
            return Vec::new();
        }
        match self.current_messages().last() {
            Some(last) if last.is_ai() => generate_mixed_follow_up_questions(&last.content),
            _ => Vec::new(),
        }
    }

    fn sidebar_items(&self) -> &[SearchSessionSummary] {
        self.search_results
            .as_deref()
            .unwrap_or_else(|| self.session.history())
    }

    fn draw(&self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        terminal.draw(|frame| {
            let background = Block::new()
                .borders(Borders::NONE)
                .style(self.theme.ratatui_style(Element::Background));
            let area = frame.size();
            frame.render_widget(background, area);

            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                .split(area);

            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(0),
                    Constraint::Length(4),
                ])
                .split(columns[0]);

            render_header(
                frame,
                rows[0],
                &self.theme,
                self.viewing_history,
                self.current_is_loading(),
            );

            let messages = self.current_messages();
            if messages.is_empty() {
                render_welcome(frame, rows[1], &self.theme, &self.input);
            } else {
                let suggestions = self.suggestions();
                render_chat(
                    frame,
                    rows[1],
                    ChatView {
                        theme: &self.theme,
                        messages,
                        is_loading: self.current_is_loading(),
                        live_events: self.timeline.events(),
                        historical_activities: &self.historical_activities,
                        suggestions: &suggestions,
                        scroll: self.chat_scroll,
                    },
                );
            }

            render_footer(
                frame,
                rows[2],
                FooterView {
                    theme: &self.theme,
                    mode: self.mode,
                    input: &self.input,
                    is_loading: self.current_is_loading(),
                    effort: self.effort,
                    model: &self.model,
                    has_history: !self.messages.is_empty(),
                    error: self.error.as_deref(),
                },
            );

            render_sidebar(
                frame,
                columns[1],
                SidebarView {
                    theme: &self.theme,
                    items: self.sidebar_items(),
                    selected: self.history_selected,
                    mode: self.mode,
                    filter: &self.history_filter,
                    statistics: self.session.statistics(),
                    loading: self.session.is_loading(),
                    error: self.session.error(),
                },
            );

            if matches!(self.mode, AppMode::Settings | AppMode::EditingApiUrl) {
                let modal_area = centered_modal(area);
                frame.render_widget(Clear, modal_area); // clears the background
                render_settings_modal(
                    frame,
                    modal_area,
                    &self.settings,
                    &self.theme,
                    self.settings_selection,
                    self.mode,
                    &self.edit_buffer,
                );
            }
        })?;
        Ok(())
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
            self.should_quit = true;
            return;
        }

        match self.mode {
            AppMode::Input => self.handle_input_key(key),
            AppMode::History => self.handle_history_key(key),
            AppMode::HistorySearch => self.handle_history_search_key(key),
            AppMode::ConfirmClear => {
                if key.code == KeyCode::Char('y') {
                    self.session.clear_all_history();
                    self.search_results = None;
                    self.history_selected = 0;
                }
                self.mode = AppMode::History;
            }
            AppMode::Settings => self.handle_settings_key(key),
            AppMode::EditingApiUrl => self.handle_api_url_key(key),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Enter => {
                if !self.is_loading {
                    let query = std::mem::take(&mut self.input);
                    let model = self.model.clone();
                    self.submit(&query, self.effort, &model);
                }
            }
            KeyCode::Esc => {
                if self.is_loading {
                    self.cancel();
                } else {
                    self.error = None;
                    self.session.dismiss_error();
                }
            }
            KeyCode::Tab => self.mode = AppMode::History,
            KeyCode::PageUp => self.chat_scroll = self.chat_scroll.saturating_add(5),
            KeyCode::PageDown => self.chat_scroll = self.chat_scroll.saturating_sub(5),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) if alt && matches!(c, '1'..='4') => {
                if let Some(n) = c.to_digit(10) {
                    self.pick_numbered(n as usize - 1);
                }
            }
            KeyCode::Char('e') if ctrl => self.effort = self.effort.next(),
            KeyCode::Char('l') if ctrl => self.model = effort::next_model(&self.model).to_string(),
            KeyCode::Char('n') if ctrl => self.new_analysis(),
            KeyCode::Char('t') if ctrl => {
                self.theme.toggle();
                self.settings.theme = self.theme.variant();
                self.persist_settings();
            }
            KeyCode::Char('s') if ctrl => {
                self.mode = AppMode::Settings;
                self.settings_selection = SettingsSelection::default();
            }
            KeyCode::Char(c) if !ctrl && !alt => self.input.push(c),
            _ => {}
        }
    }

    /// Alt+N picks a welcome example or a follow-up suggestion.
    fn pick_numbered(&mut self, index: usize) {
        if self.is_loading {
            return;
        }
        if self.current_messages().is_empty() {
            if let Some(example) = EXAMPLE_QUERIES.get(index) {
                self.submit(example, EffortLevel::Medium, DEFAULT_MODEL);
            }
        } else if let Some(suggestion) = self.suggestions().get(index).cloned() {
            self.suggestion_click(&suggestion);
        }
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        let count = self.sidebar_items().len();
        match key.code {
            KeyCode::Tab | KeyCode::Esc => self.mode = AppMode::Input,
            KeyCode::Up => self.history_selected = self.history_selected.saturating_sub(1),
            KeyCode::Down => {
                if self.history_selected + 1 < count {
                    self.history_selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_history_id() {
                    self.select_search(&id);
                    self.mode = AppMode::Input;
                }
            }
            KeyCode::Char('r') => {
                if let Some(item) = self.sidebar_items().get(self.history_selected).cloned() {
                    if !self.is_loading {
                        self.reload_search(&item.query, &item.effort_level, &item.model_used);
                        self.mode = AppMode::Input;
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_history_id() {
                    self.session.delete_search(&id);
                    if let Some(results) = self.search_results.as_mut() {
                        results.retain(|item| item.id != id);
                    }
                    let remaining = self.sidebar_items().len();
                    self.history_selected = self.history_selected.min(remaining.saturating_sub(1));
                }
            }
            KeyCode::Char('/') => self.mode = AppMode::HistorySearch,
            KeyCode::Char('c') => {
                if count > 0 {
                    self.mode = AppMode::ConfirmClear;
                }
            }
            _ => {}
        }
    }

    fn handle_history_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let term = self.history_filter.trim().to_string();
                self.search_results = if term.is_empty() {
                    None
                } else {
                    Some(self.session.search_history(&term))
                };
                self.history_selected = 0;
                self.mode = AppMode::History;
            }
            KeyCode::Esc => {
                self.history_filter.clear();
                self.search_results = None;
                self.history_selected = 0;
                self.mode = AppMode::History;
            }
            KeyCode::Backspace => {
                self.history_filter.pop();
            }
            KeyCode::Char(c) => self.history_filter.push(c),
            _ => {}
        }
    }

    fn handle_settings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = AppMode::Input,
            KeyCode::Up => self.settings_selection = self.settings_selection.previous(),
            KeyCode::Down => self.settings_selection = self.settings_selection.next(),
            KeyCode::Left | KeyCode::Right => {
                let forward = key.code == KeyCode::Right;
                match self.settings_selection {
                    SettingsSelection::Effort => {
                        self.effort = if forward {
                            self.effort.next()
                        } else {
                            self.effort.previous()
                        };
                        self.settings.effort = self.effort;
                    }
                    SettingsSelection::Model => {
                        self.model = effort::next_model(&self.model).to_string();
                        self.settings.model = self.model.clone();
                    }
                    SettingsSelection::Theme => {
                        self.theme.toggle();
                        self.settings.theme = self.theme.variant();
                    }
                    _ => {}
                }
            }
            KeyCode::Enter if self.settings_selection == SettingsSelection::ApiUrl => {
                self.edit_buffer = self.settings.api_url.clone();
                self.mode = AppMode::EditingApiUrl;
            }
            KeyCode::Enter | KeyCode::Char('s') => {
                self.persist_settings();
                self.mode = AppMode::Input;
            }
            _ => {}
        }
    }

    fn handle_api_url_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.edit_buffer.clear();
                self.mode = AppMode::Settings;
            }
            KeyCode::Backspace => {
                self.edit_buffer.pop();
            }
            KeyCode::Enter => {
                let previous = std::mem::replace(
                    &mut self.settings.api_url,
                    self.edit_buffer.trim().to_string(),
                );
                match self.settings.is_valid() {
                    Ok(()) => self.rebuild_client(),
                    Err(err) => {
                        self.error = Some(format!("Invalid setting: {}", err));
                        self.settings.api_url = previous;
                    }
                }
                self.edit_buffer.clear();
                self.mode = AppMode::Settings;
            }
            KeyCode::Char(c) => self.edit_buffer.push(c),
            _ => {}
        }
    }

    fn rebuild_client(&mut self) {
        match AgentClient::new(&self.settings.api_url, &self.settings.assistant_id) {
            Ok(client) => {
                self.client = client;
                // Threads belong to the old server
                self.thread_id = None;
            }
            Err(err) => self.error = Some(format!("Failed to configure client: {}", err)),
        }
    }

    fn persist_settings(&mut self) {
        if let Err(err) = self.settings.save() {
            tracing::warn!(error = %err, "failed to save settings");
            self.error = Some(format!("Failed to save settings: {}", err));
        }
    }

    fn selected_history_id(&self) -> Option<String> {
        self.sidebar_items()
            .get(self.history_selected)
            .map(|item| item.id.clone())
    }

    /// Start a run for `query`. Blank queries and overlapping runs are ignored.
    pub(crate) fn submit(&mut self, query: &str, effort: EffortLevel, model: &str) {
        if query.trim().is_empty() || self.is_loading {
            return;
        }
        self.timeline.clear();
        self.viewing_history = false;
        self.historical_messages = None;
        self.current_params = Some(SearchParams {
            effort,
            model: model.to_string(),
        });
        self.error = None;
        self.chat_scroll = 0;

        let id = Utc::now().timestamp_millis().to_string();
        self.messages.push(Message::human(query, id));
        let input = RunInput::new(self.messages.clone(), effort, model);

        self.is_loading = true;
        self.run_task = Some(tokio::spawn(run_agent(
            self.client.clone(),
            self.thread_id.clone(),
            input,
            self.run_sender.clone(),
        )));
    }

    pub(crate) fn drain_run_messages(&mut self) {
        while let Ok(message) = self.run_receiver.try_recv() {
            self.handle_run_message(message);
        }
    }

    pub(crate) fn handle_run_message(&mut self, message: RunMessage) {
        match message {
            RunMessage::Thread(id) => self.thread_id = Some(id),
            RunMessage::Stream(StreamEvent::Metadata { run_id }) => self.run_id = Some(run_id),
            RunMessage::Stream(StreamEvent::Update(update)) => {
                self.timeline.apply(&update);
            }
            RunMessage::Stream(StreamEvent::Values(state)) => {
                if let Some(messages) = messages_from_state(&state) {
                    self.messages = messages;
                }
            }
            RunMessage::Stream(StreamEvent::Error(message)) => {
                tracing::error!(error = %message, "agent reported an error");
                self.error = Some(message);
            }
            RunMessage::Stream(StreamEvent::End) => {
                self.finish_run();
            }
            RunMessage::Failed(message) => {
                self.error = Some(message);
                self.finish_run();
            }
        }
    }

    fn finish_run(&mut self) {
        self.is_loading = false;
        self.run_id = None;
        self.run_task = None;
        self.record_finished_search();
    }

    /// Once a finalize step ran and the agent answered, keep the timeline
    /// under the answer and save the exchange to history.
    fn record_finished_search(&mut self) {
        if !self.timeline.has_finalized() || self.is_loading || self.messages.is_empty() {
            return;
        }
        let answer_id = self
            .messages
            .last()
            .filter(|m| m.is_ai())
            .and_then(|m| m.id.clone());

        if let Some(id) = answer_id {
            self.historical_activities
                .insert(id, self.timeline.events().to_vec());

            match &self.current_params {
                Some(params) => {
                    let effort = params.effort.to_string();
                    let model = params.model.clone();
                    self.session
                        .save_search(&self.messages, &effort, &model, Vec::new());
                }
                None => tracing::debug!("no search parameters, skipping save"),
            }
        }
        self.timeline.clear_finalized();
    }

    /// Stop the run in progress and start over with an empty conversation.
    pub(crate) fn cancel(&mut self) {
        if let (Some(thread_id), Some(run_id)) = (self.thread_id.clone(), self.run_id.clone()) {
            tokio::spawn(cancel_agent(self.client.clone(), thread_id, run_id));
        }
        if let Some(task) = self.run_task.take() {
            task.abort();
        }
        self.reset_conversation();
    }

    fn new_analysis(&mut self) {
        if self.is_loading {
            self.cancel();
        } else {
            self.reset_conversation();
        }
    }

    fn reset_conversation(&mut self) {
        // Fresh channel so late events from an aborted run are dropped
        let (run_sender, run_receiver) = mpsc::unbounded_channel();
        self.run_sender = run_sender;
        self.run_receiver = run_receiver;

        self.messages.clear();
        self.timeline.clear();
        self.historical_activities.clear();
        self.current_params = None;
        self.historical_messages = None;
        self.viewing_history = false;
        self.is_loading = false;
        self.error = None;
        self.input.clear();
        self.chat_scroll = 0;
        self.thread_id = None;
        self.run_id = None;
        self.session.load_history(self.settings.history_limit);
    }

    /// Show a stored exchange without contacting the agent.
    pub(crate) fn select_search(&mut self, id: &str) {
        let Some(record) = self.session.get_search_detail(id) else {
            return;
        };
        self.timeline.clear();
        self.historical_activities.clear();
        self.historical_messages = Some(vec![
            Message::human(record.query, format!("{}_user", record.id)),
            Message::ai(record.response, record.id.clone()),
        ]);
        self.viewing_history = true;
        self.chat_scroll = 0;
        self.historical_activities.insert(record.id, Vec::new());
    }

    pub(crate) fn reload_search(&mut self, query: &str, effort_level: &str, model_used: &str) {
        self.viewing_history = false;
        self.historical_messages = None;
        self.submit(query, EffortLevel::parse_or_default(effort_level), model_used);
    }

    pub(crate) fn suggestion_click(&mut self, suggestion: &str) {
        self.viewing_history = false;
        self.historical_messages = None;
        self.submit(suggestion, EffortLevel::Medium, DEFAULT_MODEL);
    }
}

fn centered_modal(size: Rect) -> Rect {
    // Modal size: 70% of terminal, but at least 40x10 and at most 80x16
    let modal_width = (((size.width as f32) * 0.7).round() as u16)
        .clamp(40, 80)
        .min(size.width);
    let modal_height = (((size.height as f32) * 0.5).round() as u16)
        .clamp(10, 16)
        .min(size.height);
    Rect::new(
        (size.width.saturating_sub(modal_width)) / 2,
        (size.height.saturating_sub(modal_height)) / 2,
        modal_width,
        modal_height,
    )
}
