use form_engine::{FieldKind, FieldView, SessionPhase, SubmissionState};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::{FormPanel, StatusKind};
use crate::components::popup::{centered_rect_fixed, draw_popup_frame};
use crate::tui::Frame;

pub fn render_form(panel: &mut FormPanel, f: &mut Frame<'_>, area: Rect) {
    if area.width < 5 || area.height < 5 {
        return;
    }
    match panel.view().phase.clone() {
        SessionPhase::Loading => render_loading(f, area),
        SessionPhase::LoadFailed(reason) => render_load_failed(f, area, &reason),
        SessionPhase::Ready => render_ready(panel, f, area),
    }
}

fn render_loading(f: &mut Frame<'_>, area: Rect) {
    let rect = centered_rect_fixed(area, 30, 3);
    let para = Paragraph::new("Loading form...")
        .alignment(Alignment::Center)
        .fg(Color::Gray);
    f.render_widget(para, Rect { y: rect.y + 1, height: 1, ..rect });
}

fn render_load_failed(f: &mut Frame<'_>, area: Rect, reason: &str) {
    let dialog = centered_rect_fixed(area, 60, 7);
    let inner = draw_popup_frame(f, dialog, "Error loading form", Color::Red);
    let lines = vec![
        Line::from(Span::styled(reason.to_string(), Style::default().fg(Color::Red))),
        Line::raw(""),
        Line::from(vec![
            Span::styled("r", Style::default().fg(Color::White)),
            Span::raw(": Retry   "),
            Span::styled("q", Style::default().fg(Color::White)),
            Span::raw(": Quit"),
        ])
        .fg(Color::DarkGray),
    ];
    f.render_widget(Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true }), inner);
}

fn render_ready(panel: &mut FormPanel, f: &mut Frame<'_>, area: Rect) {
    let [body_area, footer_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(4)]).areas(area);

    let body = Block::default()
        .title(" Dynamic Form ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = body.inner(body_area);
    f.render_widget(body, body_area);

    panel.ensure_visible(inner.height);
    let mut lines: Vec<Line> = Vec::new();
    for (idx, field) in panel.view().fields.iter().enumerate().skip(panel.scroll()) {
        let focused = idx == panel.focused_index();
        let editing = focused && panel.is_editing();
        field_lines(field, focused, editing.then(|| panel.input_value()), &mut lines);
    }
    f.render_widget(Paragraph::new(Text::from(lines)), inner);

    render_footer(panel, f, footer_area);
}

fn field_lines<'a>(
    field: &'a FieldView,
    focused: bool,
    input: Option<&'a str>,
    lines: &mut Vec<Line<'a>>,
) {
    let spec = &field.spec;
    let label_style = Style::default().fg(Color::White).add_modifier(if focused {
        Modifier::BOLD
    } else {
        Modifier::empty()
    });
    let marker = if focused { "> " } else { "  " };
    let required = if spec.required { "*" } else { "" };
    let mut spans = vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::styled(format!("{}{required}:", spec.label), label_style),
        Span::raw(" "),
    ];

    let value_style = if spec.disabled {
        Style::default().fg(Color::DarkGray)
    } else if focused {
        Style::default().fg(Color::Black).bg(Color::White)
    } else {
        Style::default().fg(Color::Cyan)
    };

    match (&spec.kind, input) {
        (_, Some(text)) => spans.push(Span::styled(format!("{text}▏"), value_style)),
        (FieldKind::Checkbox, None) => {
            let checked = field.value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false);
            spans.push(Span::styled(if checked { "[x]" } else { "[ ]" }, value_style));
        }
        (FieldKind::Select { .. }, None) => {
            let choice = field.value.as_ref().map(|v| v.to_string()).unwrap_or_default();
            let shown = if choice.is_empty() { "choose".to_string() } else { choice };
            spans.push(Span::styled(format!("< {shown} >"), value_style));
        }
        (FieldKind::Unsupported { .. }, None) => {}
        (_, None) => {
            let text = field.value.as_ref().map(|v| v.to_string()).unwrap_or_default();
            match (&spec.placeholder, text.is_empty()) {
                (Some(placeholder), true) => spans.push(Span::styled(
                    placeholder.as_str(),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )),
                _ => spans.push(Span::styled(text, value_style)),
            }
        }
    }
    if spec.disabled {
        spans.push(Span::styled(" (disabled)", Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::from(spans));

    if !spec.kind.is_supported() {
        lines.push(Line::from(Span::styled(
            format!("    {}", spec.kind),
            Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
        )));
    }
    if let Some(description) = &spec.description {
        lines.push(Line::from(Span::styled(
            format!("    {description}"),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(error) = &field.error {
        lines.push(Line::from(Span::styled(
            format!("    {error}"),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::raw(""));
}

fn submit_style(panel: &FormPanel) -> Style {
    let view = panel.view();
    match &view.submission {
        SubmissionState::Confirmed(_) => Style::default().fg(Color::Black).bg(Color::Green),
        SubmissionState::Failed { .. } => Style::default().fg(Color::White).bg(Color::Red),
        SubmissionState::Optimistic { .. } => Style::default().fg(Color::Black).bg(Color::Yellow),
        SubmissionState::Idle if view.submit_enabled => {
            Style::default().fg(Color::White).bg(Color::Blue)
        }
        SubmissionState::Idle => Style::default().fg(Color::Gray).bg(Color::DarkGray),
    }
}

fn render_footer(panel: &FormPanel, f: &mut Frame<'_>, area: Rect) {
    let view = panel.view();
    let mut submit_line = vec![
        Span::styled(format!(" {} ", view.submit_label), submit_style(panel)),
        Span::raw("  "),
        Span::styled(
            format!("interactions: {}", view.interactions),
            Style::default().fg(Color::Gray),
        ),
    ];
    if view.dirty {
        submit_line.push(Span::styled("  (modified)", Style::default().fg(Color::Yellow)));
    }

    let status = match panel.status() {
        Some(status) => {
            let color = match status.kind {
                StatusKind::Info => Color::Gray,
                StatusKind::Error => Color::Red,
            };
            Line::from(Span::styled(status.message.clone(), Style::default().fg(color)))
        }
        None => Line::raw(""),
    };

    let hints = if panel.is_editing() {
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(Color::White)),
            Span::raw(": Confirm edit   "),
            Span::styled("Esc", Style::default().fg(Color::White)),
            Span::raw(": Cancel"),
        ])
    } else {
        Line::from(vec![
            Span::styled("Up/Down", Style::default().fg(Color::White)),
            Span::raw(": Navigate   "),
            Span::styled("Enter", Style::default().fg(Color::White)),
            Span::raw(": Edit/Submit   "),
            Span::styled("Space", Style::default().fg(Color::White)),
            Span::raw(": Toggle/Select   "),
            Span::styled("^S", Style::default().fg(Color::White)),
            Span::raw(": Submit   "),
            Span::styled("^R", Style::default().fg(Color::White)),
            Span::raw(": Reset   "),
            Span::styled("q", Style::default().fg(Color::White)),
            Span::raw(": Quit"),
        ])
    }
    .fg(Color::DarkGray);

    let text = Text::from(vec![Line::from(submit_line), status, Line::raw(""), hints]);
    f.render_widget(Paragraph::new(text), area);
}
