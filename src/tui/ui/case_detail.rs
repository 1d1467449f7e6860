//! Case detail view: the full record behind a result card.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::CaseRecord;
use crate::tui::styles::MedicalTheme;

const MISSING: &str = "-";

fn field<'a>(label: &'a str, value: Option<&'a str>) -> Line<'a> {
    let value = value.filter(|v| !v.trim().is_empty());
    Line::from(vec![
        Span::styled(format!("  {label:<14}"), MedicalTheme::text_secondary()),
        match value {
            Some(v) => Span::styled(v, MedicalTheme::text()),
            None => Span::styled(MISSING, MedicalTheme::text_muted()),
        },
    ])
}

/// Render one case in full.
pub fn render_case_detail(f: &mut Frame, area: Rect, record: &CaseRecord) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Similarity
            Constraint::Length(10), // Metadata
            Constraint::Min(4),    // Findings and notes
        ])
        .split(area);

    let band_style = MedicalTheme::score_band(record.score_band());
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", record.diagnosis),
                    MedicalTheme::title(),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border_focused()),
        )
        .gauge_style(band_style)
        .ratio(record.score_ratio())
        .label(format!("{}% similar", record.score_percent()));
    f.render_widget(gauge, chunks[0]);

    let id = record.id.as_deref();
    let metadata = Paragraph::new(vec![
        field("Case ID", Some(record.case_id.as_str())),
        field("Record ID", id),
        field("Modality", Some(record.modality.as_str())),
        field("Body part", Some(record.body_part.as_str())),
        field("Age", record.age.as_deref()),
        field("Gender", record.gender.as_deref()),
        field("Source", record.source.as_deref()),
        field("Image URL", record.image_url.as_deref()),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Case ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(metadata, chunks[1]);

    let text_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);

    render_text_panel(f, text_chunks[0], " Findings ", record.findings.as_deref());
    render_text_panel(
        f,
        text_chunks[1],
        " Clinical notes ",
        record.clinical_notes.as_deref(),
    );
}

fn render_text_panel(f: &mut Frame, area: Rect, title: &str, body: Option<&str>) {
    let line = match body.filter(|b| !b.trim().is_empty()) {
        Some(text) => Line::from(Span::styled(text, MedicalTheme::text())),
        None => Line::from(Span::styled("Not recorded", MedicalTheme::text_muted())),
    };

    let p = Paragraph::new(line).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(Span::styled(title, MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_detail_shows_all_fields() {
        let record = CaseRecord {
            id: Some("17".to_string()),
            case_id: "MM-0017".to_string(),
            diagnosis: "Glioblastoma".to_string(),
            similarity_score: Some(0.812),
            modality: "mri".to_string(),
            body_part: "brain".to_string(),
            age: Some("58".to_string()),
            gender: None,
            findings: Some("Ring-enhancing mass".to_string()),
            clinical_notes: None,
            image_url: None,
            source: Some("TCIA".to_string()),
        };

        let mut terminal = Terminal::new(TestBackend::new(90, 21)).unwrap();
        terminal
            .draw(|f| render_case_detail(f, f.area(), &record))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|c| c.symbol()).collect();
        for expected in [
            "Glioblastoma",
            "81% similar",
            "MM-0017",
            "brain",
            "TCIA",
            "Ring-enhancing mass",
            "Not recorded",
        ] {
            assert!(text.contains(expected), "missing {expected:?}");
        }
    }
}
