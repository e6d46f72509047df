// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Terminal UI.
//!
//! Lists the steps and connections of a flow (ratatui + crossterm) and turns keys into editor
//! intents. Node shapes and coordinates are never drawn.

use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use tokio::sync::Mutex;

use crate::config::DEFAULT_MESSAGE;
use crate::editor::{FlowEditor, Intent, Outcome, SaveState};
use crate::model::{Edge, EdgeId, Graph, HandleId, Node, NodeId, Position};
use crate::ops::{allocate_edge_id, ConnectionCandidate};
use crate::query::flow::{dead_ends, reachable, start_nodes};
use crate::query::unconnected_nodes;
use crate::store::PersistedFlow;

const FOCUS_COLOR: Color = Color::LightGreen;
const WARN_COLOR: Color = Color::LightRed;
const INSPECTOR_COLOR: Color = Color::DarkGray;
const FOOTER_LABEL_COLOR: Color = Color::Gray;
const FOOTER_KEY_COLOR: Color = Color::Cyan;
const TOAST_TTL: Duration = Duration::from_secs(2);

/// Runs the TUI until the user quits. The editor may be shared with an MCP server.
pub fn run(editor: Arc<Mutex<FlowEditor>>) -> Result<(), Box<dyn Error>> {
    let mut terminal = TerminalSession::new()?;
    let mut app = App::new(editor);

    while !app.should_quit {
        terminal.draw(|frame| draw(frame, &mut app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                _ => {}
            }
        }
    }

    Ok(())
}

/// A small connected flow for `--demo`.
pub fn demo_flow() -> PersistedFlow {
    let nodes = vec![
        Node::message(NodeId::numeric(1), DEFAULT_MESSAGE, Position::new(250.0, 5.0)),
        Node::message(
            NodeId::numeric(2),
            "What is your order number?",
            Position::new(250.0, 120.0),
        ),
        Node::message(
            NodeId::numeric(3),
            "Thanks, your order is on its way.",
            Position::new(100.0, 240.0),
        ),
        Node::message(
            NodeId::numeric(4),
            "I could not find that order, connecting you to a human.",
            Position::new(400.0, 240.0),
        ),
    ];

    let mut graph = Graph::new(nodes, Vec::new());
    for (source, handle, target) in [(1, None, 2), (2, Some("found"), 3), (2, Some("missing"), 4)] {
        let candidate = ConnectionCandidate::new(NodeId::numeric(source), NodeId::numeric(target))
            .with_source_handle(handle.and_then(|raw| HandleId::new(raw).ok()));
        let edge = candidate.clone().into_edge(allocate_edge_id(&graph, &candidate));
        let (nodes, mut edges) = graph.into_parts();
        edges.push(edge);
        graph = Graph::new(nodes, edges);
    }

    let (nodes, edges) = graph.into_parts();
    PersistedFlow {
        nodes,
        edges,
        next_node_id: 5,
    }
}

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptKind {
    AddNode,
    EditNode(NodeId),
    ConnectHandle { source: NodeId, target: NodeId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfirmAction {
    DeleteNode(NodeId),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Normal,
    Prompt { kind: PromptKind, input: String },
    PickTarget { source: NodeId, cursor: usize },
    Confirm(ConfirmAction),
}

struct App {
    editor: Arc<Mutex<FlowEditor>>,
    focus: Focus,
    nodes_state: ListState,
    edges_state: ListState,
    mode: Mode,
    toast: Option<Toast>,
    should_quit: bool,
}

impl App {
    fn new(editor: Arc<Mutex<FlowEditor>>) -> Self {
        let mut app = Self {
            editor,
            focus: Focus::Nodes,
            nodes_state: ListState::default(),
            edges_state: ListState::default(),
            mode: Mode::Normal,
            toast: None,
            should_quit: false,
        };
        app.sync_from_editor();
        app
    }

    fn handle_key(&mut self, key: KeyEvent) {
        self.handle_key_code(key.code);
    }

    fn handle_key_code(&mut self, code: KeyCode) {
        match self.mode.clone() {
            Mode::Normal => self.handle_normal_key(code),
            Mode::Prompt { kind, input } => self.handle_prompt_key(code, kind, input),
            Mode::PickTarget { source, cursor } => self.handle_pick_key(code, source, cursor),
            Mode::Confirm(action) => self.handle_confirm_key(code, action),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = self.focus.toggled();
                self.select_cursor();
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Char('a') => {
                self.mode = Mode::Prompt {
                    kind: PromptKind::AddNode,
                    input: String::new(),
                }
            }
            KeyCode::Char('e') => {
                let Some(node) = self.node_under_cursor() else {
                    self.set_toast("Select a step to edit");
                    return;
                };
                self.mode = Mode::Prompt {
                    kind: PromptKind::EditNode(node.id().clone()),
                    input: node.text().to_owned(),
                };
            }
            KeyCode::Char('c') => {
                let Some(node) = self.node_under_cursor() else {
                    self.set_toast("Select a step to connect from");
                    return;
                };
                let source = node.id().clone();
                let graph = self.editor.blocking_lock().snapshot();
                let cursor = graph
                    .nodes()
                    .iter()
                    .position(|node| node.id() != &source)
                    .unwrap_or(0);
                self.mode = Mode::PickTarget { source, cursor };
            }
            KeyCode::Delete | KeyCode::Backspace => {
                self.dispatch(Intent::DeleteKey);
            }
            KeyCode::Char('D') => match self.node_under_cursor() {
                Some(node) => {
                    self.mode = Mode::Confirm(ConfirmAction::DeleteNode(node.id().clone()))
                }
                None => self.set_toast("Select a step to delete"),
            },
            KeyCode::Char('s') => {
                self.dispatch(Intent::RequestSave);
            }
            KeyCode::Char('R') => self.mode = Mode::Confirm(ConfirmAction::Reset),
            KeyCode::Esc => {
                self.dispatch(Intent::ClearSelection);
            }
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, code: KeyCode, kind: PromptKind, mut input: String) {
        match code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                self.submit_prompt(kind, input);
            }
            KeyCode::Backspace => {
                input.pop();
                self.mode = Mode::Prompt { kind, input };
            }
            KeyCode::Char(ch) => {
                input.push(ch);
                self.mode = Mode::Prompt { kind, input };
            }
            _ => {}
        }
    }

    fn submit_prompt(&mut self, kind: PromptKind, input: String) {
        match kind {
            PromptKind::AddNode => {
                if let Outcome::NodeCreated { node_id } =
                    self.dispatch(Intent::CreateNode { message: input })
                {
                    self.dispatch(Intent::SelectNode { node_id });
                }
            }
            PromptKind::EditNode(node_id) => {
                self.dispatch(Intent::UpdateNode {
                    node_id,
                    message: input,
                });
            }
            PromptKind::ConnectHandle { source, target } => {
                let handle = input.trim();
                let source_handle = if handle.is_empty() {
                    None
                } else {
                    match HandleId::new(handle) {
                        Ok(handle) => Some(handle),
                        Err(err) => {
                            self.set_toast(format!("Invalid output name: {err}"));
                            return;
                        }
                    }
                };
                let candidate =
                    ConnectionCandidate::new(source, target).with_source_handle(source_handle);
                if let Outcome::Connected { edge_id } = self.dispatch(Intent::Connect(candidate)) {
                    self.dispatch(Intent::SelectEdge { edge_id });
                }
            }
        }
    }

    fn handle_pick_key(&mut self, code: KeyCode, source: NodeId, cursor: usize) {
        let total = self.editor.blocking_lock().graph().nodes().len();
        match code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Up | KeyCode::Char('k') => {
                self.mode = Mode::PickTarget {
                    source,
                    cursor: cursor.saturating_sub(1),
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.mode = Mode::PickTarget {
                    source,
                    cursor: (cursor + 1).min(total.saturating_sub(1)),
                }
            }
            KeyCode::Enter => {
                let target = self
                    .editor
                    .blocking_lock()
                    .graph()
                    .nodes()
                    .get(cursor)
                    .map(|node| node.id().clone());
                self.mode = match target {
                    Some(target) => Mode::Prompt {
                        kind: PromptKind::ConnectHandle { source, target },
                        input: String::new(),
                    },
                    None => Mode::Normal,
                };
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode, action: ConfirmAction) {
        self.mode = Mode::Normal;
        if !matches!(code, KeyCode::Char('y') | KeyCode::Char('Y')) {
            return;
        }
        match action {
            ConfirmAction::DeleteNode(node_id) => {
                self.dispatch(Intent::DeleteNode { node_id });
            }
            ConfirmAction::Reset => {
                self.dispatch(Intent::ResetAll);
                self.nodes_state.select(Some(0));
                self.edges_state.select(None);
            }
        }
    }

    fn dispatch(&mut self, intent: Intent) -> Outcome {
        let outcome = self.editor.blocking_lock().dispatch(intent);
        self.sync_from_editor();
        outcome
    }

    /// Pulls outcome messages into the toast and moves the cursors onto the shared selection.
    fn sync_from_editor(&mut self) {
        let mut editor = self.editor.blocking_lock();
        let messages = editor
            .take_outcomes()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();

        let graph = editor.graph();
        let selection = editor.selection();
        if let Some(node_id) = selection.selected_node_id() {
            if let Some(index) = graph.nodes().iter().position(|node| node.id() == node_id) {
                self.focus = Focus::Nodes;
                self.nodes_state.select(Some(index));
            }
        } else if let Some(edge_id) = selection.selected_edge_id() {
            if let Some(index) = graph.edges().iter().position(|edge| edge.id() == edge_id) {
                self.focus = Focus::Edges;
                self.edges_state.select(Some(index));
            }
        }
        clamp_cursor(&mut self.nodes_state, graph.nodes().len());
        clamp_cursor(&mut self.edges_state, graph.edges().len());
        drop(editor);

        if let Some(last) = messages.last() {
            self.set_toast(last.clone());
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = {
            let editor = self.editor.blocking_lock();
            match self.focus {
                Focus::Nodes => editor.graph().nodes().len(),
                Focus::Edges => editor.graph().edges().len(),
            }
        };
        if len == 0 {
            return;
        }

        let state = self.focused_state();
        let next = match state.selected() {
            Some(current) => current.saturating_add_signed(delta).min(len - 1),
            None => 0,
        };
        state.select(Some(next));
        self.select_cursor();
    }

    /// Makes the item under the focused cursor the editor selection.
    fn select_cursor(&mut self) {
        let intent = {
            let editor = self.editor.blocking_lock();
            let graph = editor.graph();
            match self.focus {
                Focus::Nodes => self
                    .nodes_state
                    .selected()
                    .and_then(|index| graph.nodes().get(index))
                    .map(|node| Intent::SelectNode {
                        node_id: node.id().clone(),
                    }),
                Focus::Edges => self
                    .edges_state
                    .selected()
                    .and_then(|index| graph.edges().get(index))
                    .map(|edge| Intent::SelectEdge {
                        edge_id: edge.id().clone(),
                    }),
            }
        };
        self.dispatch(intent.unwrap_or(Intent::ClearSelection));
    }

    fn focused_state(&mut self) -> &mut ListState {
        match self.focus {
            Focus::Nodes => &mut self.nodes_state,
            Focus::Edges => &mut self.edges_state,
        }
    }

    fn node_under_cursor(&self) -> Option<Node> {
        if self.focus != Focus::Nodes {
            return None;
        }
        let index = self.nodes_state.selected()?;
        self.editor.blocking_lock().graph().nodes().get(index).cloned()
    }

    fn set_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    fn live_toast(&mut self) -> Option<String> {
        let snapshot = self
            .toast
            .as_ref()
            .map(|toast| (toast.message.clone(), toast.expires_at));
        match snapshot {
            Some((message, expires_at)) if expires_at > Instant::now() => Some(message),
            Some(_) => {
                self.toast = None;
                None
            }
            None => None,
        }
    }
}

fn clamp_cursor(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(index) if index >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        Some(_) => {}
    }
}

fn draw(frame: &mut Frame<'_>, app: &mut App) {
    app.sync_from_editor();
    let (graph, selected_node, selected_edge, save_state) = {
        let editor = app.editor.blocking_lock();
        let selection = editor.selection();
        (
            editor.snapshot(),
            selection.selected_node_id().cloned(),
            selection.selected_edge_id().cloned(),
            editor.save_state().clone(),
        )
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.size());
    let (main_area, status_area) = (layout[0], layout[1]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_area);
    let lists = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(columns[0]);

    let unconnected = unconnected_nodes(&graph);

    let node_count = graph.nodes().len().to_string();
    let edge_count = graph.edges().len().to_string();
    let node_items = graph
        .nodes()
        .iter()
        .map(|node| node_item(node, unconnected.contains(node.id())))
        .collect::<Vec<_>>();
    let (nodes_title, mut nodes_state) = match &app.mode {
        Mode::PickTarget { cursor, .. } => {
            let mut state = ListState::default();
            state.select(Some(*cursor));
            ("Pick target", state)
        }
        _ => ("Steps", app.nodes_state.clone()),
    };
    let nodes_list = List::new(node_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(panel_border_style(app.focus, Focus::Nodes))
                .title(view_title(nodes_title, '1', Some(node_count.as_str()))),
        )
        .highlight_style(cursor_style(app.focus, Focus::Nodes));
    frame.render_stateful_widget(nodes_list, lists[0], &mut nodes_state);

    let edge_items = graph.edges().iter().map(edge_item).collect::<Vec<_>>();
    let edges_list = List::new(edge_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(panel_border_style(app.focus, Focus::Edges))
                .title(view_title("Connections", '2', Some(edge_count.as_str()))),
        )
        .highlight_style(cursor_style(app.focus, Focus::Edges));
    frame.render_stateful_widget(edges_list, lists[1], &mut app.edges_state);

    let inspector = Paragraph::new(inspector_lines(
        &graph,
        selected_node.as_ref(),
        selected_edge.as_ref(),
        &save_state,
        &unconnected,
    ))
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(INSPECTOR_COLOR))
            .title(view_title("Inspector", '3', None)),
    );
    frame.render_widget(inspector, columns[1]);

    let toast = app.live_toast();
    frame.render_widget(Paragraph::new(footer_line(app, toast.as_deref())), status_area);

    if let Some(popup) = popup_lines(app, &graph) {
        let area = centered_rect(60, 25, main_area);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(popup.lines)
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(FOCUS_COLOR))
                        .title(popup.title),
                ),
            area,
        );
    }
}

fn node_item(node: &Node, unconnected: bool) -> ListItem<'static> {
    let first_line = node.text().lines().next().unwrap_or_default().to_owned();
    let mut spans = vec![
        Span::styled(
            format!("{:>4} ", node.id()),
            Style::default().fg(FOOTER_KEY_COLOR),
        ),
        Span::raw(first_line),
    ];
    if unconnected {
        spans.push(Span::styled(" (unconnected)", Style::default().fg(WARN_COLOR)));
    }
    ListItem::new(Line::from(spans))
}

fn edge_item(edge: &Edge) -> ListItem<'static> {
    let handle = edge
        .source_handle_id()
        .map(|handle| format!("[{handle}]"))
        .unwrap_or_default();
    ListItem::new(Line::from(vec![
        Span::styled(
            format!("{}{handle}", edge.source_node_id()),
            Style::default().fg(FOOTER_KEY_COLOR),
        ),
        Span::raw(" -> "),
        Span::styled(
            edge.target_node_id().to_string(),
            Style::default().fg(FOOTER_KEY_COLOR),
        ),
        Span::styled(format!("  {}", edge.id()), Style::default().fg(INSPECTOR_COLOR)),
    ]))
}

fn inspector_lines(
    graph: &Graph,
    selected_node: Option<&NodeId>,
    selected_edge: Option<&EdgeId>,
    save_state: &SaveState,
    unconnected: &[NodeId],
) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled("State: ", Style::default().fg(FOOTER_LABEL_COLOR)),
        Span::styled(
            save_state.label().to_owned(),
            match save_state {
                SaveState::Blocked(_) => Style::default().fg(WARN_COLOR),
                _ => Style::default().fg(FOCUS_COLOR),
            },
        ),
    ])];
    if let SaveState::Blocked(blocked) = save_state {
        lines.push(Line::from(Span::styled(
            blocked.to_string(),
            Style::default().fg(WARN_COLOR),
        )));
    }

    lines.push(Line::from(format!(
        "{} steps, {} connections",
        graph.nodes().len(),
        graph.edges().len()
    )));
    lines.push(Line::from(format!("Starts: {}", join_ids(&start_nodes(graph)))));
    lines.push(Line::from(format!("Ends: {}", join_ids(&dead_ends(graph)))));
    if !unconnected.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Unconnected: {}", join_ids(unconnected)),
            Style::default().fg(WARN_COLOR),
        )));
    }
    lines.push(Line::default());

    if let Some(node) = selected_node.and_then(|node_id| graph.node(node_id)) {
        let position = node.position();
        lines.push(Line::from(format!(
            "Step {} ({})",
            node.id(),
            node.kind().label()
        )));
        lines.push(Line::from(format!("at {:.0},{:.0}", position.x, position.y)));
        lines.push(Line::from(format!(
            "Leads to {} step(s)",
            reachable(graph, node.id()).len()
        )));
        lines.extend(node.text().lines().map(|line| Line::from(line.to_owned())));
    } else if let Some(edge) = selected_edge.and_then(|edge_id| graph.edge(edge_id)) {
        lines.push(Line::from(format!("Connection {}", edge.id())));
        lines.push(Line::from(format!(
            "from {} via {}",
            edge.source_node_id(),
            edge.source_handle_id()
                .map(ToString::to_string)
                .unwrap_or_else(|| "default output".to_owned())
        )));
        lines.push(Line::from(format!("to {}", edge.target_node_id())));
    } else {
        lines.push(Line::from(Span::styled(
            "Nothing selected",
            Style::default().fg(INSPECTOR_COLOR),
        )));
    }
    lines
}

fn join_ids(ids: &[NodeId]) -> String {
    if ids.is_empty() {
        return "-".to_owned();
    }
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

struct Popup {
    title: String,
    lines: Vec<Line<'static>>,
}

fn popup_lines(app: &App, graph: &Graph) -> Option<Popup> {
    match &app.mode {
        Mode::Normal => None,
        Mode::Prompt { kind, input } => {
            let title = match kind {
                PromptKind::AddNode => " New step ".to_owned(),
                PromptKind::EditNode(node_id) => format!(" Edit step {node_id} "),
                PromptKind::ConnectHandle { source, target } => {
                    format!(" Connect {source} -> {target} ")
                }
            };
            let hint = match kind {
                PromptKind::ConnectHandle { .. } => "Output name (empty for the default output)",
                _ => "Message",
            };
            Some(Popup {
                title,
                lines: vec![
                    Line::from(Span::styled(hint, Style::default().fg(FOOTER_LABEL_COLOR))),
                    Line::from(format!("{input}_")),
                ],
            })
        }
        Mode::PickTarget { source, cursor } => {
            let target = graph
                .nodes()
                .get(*cursor)
                .map(|node| node.id().to_string())
                .unwrap_or_default();
            Some(Popup {
                title: format!(" Connect from {source} "),
                lines: vec![Line::from(format!(
                    "Target: {target}  (up/down to choose, enter to confirm)"
                ))],
            })
        }
        Mode::Confirm(action) => {
            let question = match action {
                ConfirmAction::DeleteNode(node_id) => {
                    let touching = graph.incident(node_id).count();
                    format!("Delete step {node_id} and its {touching} connection(s)? (y/n)")
                }
                ConfirmAction::Reset => "Discard the whole flow and start over? (y/n)".to_owned(),
            };
            Some(Popup {
                title: " Confirm ".to_owned(),
                lines: vec![Line::from(Span::styled(
                    question,
                    Style::default().fg(WARN_COLOR),
                ))],
            })
        }
    }
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);
}

include!("chrome.rs");
