//! UI module: View components for the TUI.

pub mod case_detail;
pub mod results;
pub mod search_form;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

/// Last known backend health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Checking,
    Online,
    Offline(String),
}

pub fn render_header(f: &mut Frame, area: Rect, status: &BackendStatus, api_url: &str) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(40)])
        .split(area);

    let title = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("MediMatch", MedicalTheme::title()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled("Similar Case Search", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(title, chunks[0]);

    let (dot, label) = match status {
        BackendStatus::Checking => (MedicalTheme::warning(), "checking"),
        BackendStatus::Online => (MedicalTheme::success(), "online"),
        BackendStatus::Offline(_) => (MedicalTheme::danger(), "offline"),
    };
    let backend = Paragraph::new(Line::from(vec![
        Span::styled("● ", dot),
        Span::styled(label, MedicalTheme::text()),
        Span::styled(format!(" {api_url} "), MedicalTheme::text_muted()),
    ]))
    .alignment(ratatui::layout::Alignment::Right)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(backend, chunks[1]);
}

/// Key hints; `(key, description, enabled)`. Wraps onto further lines when narrow.
pub fn render_key_hints(f: &mut Frame, area: Rect, hints: &[(&str, &str, bool)]) {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, desc, enabled) in hints {
        let (key_style, desc_style) = if *enabled {
            (MedicalTheme::key_hint(), MedicalTheme::key_desc())
        } else {
            (MedicalTheme::key_disabled(), MedicalTheme::key_disabled())
        };
        spans.push(Span::styled(format!(" [{key}]"), key_style));
        spans.push(Span::styled(format!(" {desc} "), desc_style));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).wrap(Wrap { trim: true }),
        area,
    );
}

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![Line::from(vec![Span::styled(
        "Similar cases support review only and are not a diagnosis. Confirm findings with a qualified clinician.",
        MedicalTheme::text_muted(),
    )])];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
