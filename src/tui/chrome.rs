// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowdeck-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowdeck and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Nodes,
    Edges,
}

impl Focus {
    fn toggled(self) -> Self {
        match self {
            Self::Nodes => Self::Edges,
            Self::Edges => Self::Nodes,
        }
    }
}

fn panel_border_style(active: Focus, panel: Focus) -> Style {
    if active != panel {
        return Style::default();
    }

    Style::default().fg(FOCUS_COLOR)
}

fn cursor_style(active: Focus, panel: Focus) -> Style {
    if active != panel {
        return Style::default().add_modifier(Modifier::DIM);
    }

    Style::default().add_modifier(Modifier::REVERSED)
}

fn view_title(label: &str, key: char, tail: Option<&str>) -> String {
    let mut title = format!("─[{key}]─ {label}");
    if let Some(tail) = tail {
        let tail = tail.trim();
        if !tail.is_empty() {
            title.push(' ');
            title.push_str(tail);
        }
    }
    title.push(' ');
    title
}

fn footer_line(app: &App, toast: Option<&str>) -> Line<'static> {
    let mut spans = Vec::new();
    match &app.mode {
        Mode::Normal => {
            push_footer_entry(&mut spans, "add", "a");
            push_footer_entry(&mut spans, "edit", "e");
            push_footer_entry(&mut spans, "connect", "c");
            push_footer_entry_maybe_disabled(&mut spans, "unlink", "del", app.focus != Focus::Edges);
            push_footer_entry_maybe_disabled(&mut spans, "delete", "D", app.focus != Focus::Nodes);
            push_footer_entry(&mut spans, "save", "s");
            push_footer_entry(&mut spans, "reset", "R");
            push_footer_entry(&mut spans, "pane", "tab");
            push_footer_entry(&mut spans, "quit", "q");
        }
        Mode::Prompt { .. } => {
            push_footer_entry(&mut spans, "confirm", "enter");
            push_footer_entry(&mut spans, "cancel", "esc");
        }
        Mode::PickTarget { .. } => {
            push_footer_entry(&mut spans, "target", "↑/↓");
            push_footer_entry(&mut spans, "confirm", "enter");
            push_footer_entry(&mut spans, "cancel", "esc");
        }
        Mode::Confirm(_) => {
            push_footer_entry(&mut spans, "yes", "y");
            push_footer_entry(&mut spans, "no", "n");
        }
    }

    if let Some(toast) = toast {
        spans.push(Span::styled(
            format!(" | {toast}"),
            Style::default().fg(Color::White),
        ));
    }
    Line::from(spans)
}

fn centered_rect(width_percent: u16, height_percent: u16, area: Rect) -> Rect {
    let vertical_margin = (100u16.saturating_sub(height_percent)) / 2;
    let horizontal_margin = (100u16.saturating_sub(width_percent)) / 2;

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(vertical_margin),
            Constraint::Percentage(height_percent),
            Constraint::Percentage(vertical_margin),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(horizontal_margin),
            Constraint::Percentage(width_percent),
            Constraint::Percentage(horizontal_margin),
        ])
        .split(vertical[1])[1]
}

fn push_footer_entry(spans: &mut Vec<Span<'static>>, label: &str, value: &str) {
    push_footer_entry_maybe_disabled(spans, label, value, false);
}

fn push_footer_entry_maybe_disabled(
    spans: &mut Vec<Span<'static>>,
    label: &str,
    value: &str,
    disabled: bool,
) {
    if !spans.is_empty() {
        spans.push(Span::styled(
            " | ".to_owned(),
            Style::default().fg(FOOTER_LABEL_COLOR),
        ));
    }
    spans.push(Span::styled(
        format!("{}:", footer_label_ucfirst(label)),
        Style::default().fg(FOOTER_LABEL_COLOR),
    ));
    spans.push(footer_value_span(value, disabled));
}

fn footer_label_ucfirst(label: &str) -> String {
    let lower = label.to_lowercase();
    let mut chars = lower.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut out = first.to_uppercase().collect::<String>();
    out.push_str(chars.as_str());
    out
}

fn footer_value_span(value: &str, disabled: bool) -> Span<'static> {
    let color = if disabled {
        Color::DarkGray
    } else {
        FOOTER_KEY_COLOR
    };
    Span::styled(
        value.to_owned(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}
