//! Result list: one card per case, or an error / loading / empty placeholder.

use std::ops::Range;
use std::time::Duration;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, LineGauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{CaseRecord, ScoreBand, SearchOutcome};
use crate::tui::styles::MedicalTheme;

/// Rows taken by one card (borders included).
pub const CARD_HEIGHT: u16 = 6;

const FINDINGS_EXCERPT_CHARS: usize = 160;

/// Display data for one case card.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseCard {
    pub diagnosis: String,
    pub reference: String,
    pub percent: i64,
    pub ratio: f64,
    pub band: ScoreBand,
    pub modality: String,
    pub body_part: String,
    pub demographics: String,
    pub findings: String,
}

impl CaseCard {
    #[must_use]
    pub fn from_record(record: &CaseRecord) -> Self {
        Self {
            diagnosis: record.diagnosis.clone(),
            reference: record.display_key().to_string(),
            percent: record.score_percent(),
            ratio: record.score_ratio(),
            band: record.score_band(),
            modality: record.modality.clone(),
            body_part: record.body_part.clone(),
            demographics: record.demographics(),
            findings: record.findings_excerpt(FINDINGS_EXCERPT_CHARS),
        }
    }
}

/// What the result area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsView {
    Error(String),
    Loading,
    Empty,
    Cards(Vec<CaseCard>),
}

impl ResultsView {
    /// Pick the view: error wins, then loading, then empty, then cards.
    #[must_use]
    pub fn select(results: &[CaseRecord], loading: bool, error: Option<&str>) -> Self {
        if let Some(message) = error {
            return Self::Error(message.to_string());
        }
        if loading {
            return Self::Loading;
        }
        if results.is_empty() {
            return Self::Empty;
        }
        Self::Cards(results.iter().map(CaseCard::from_record).collect())
    }
}

/// Results of the latest search plus the card selection.
#[derive(Debug, Default)]
pub struct ResultsState {
    pub outcome: Option<SearchOutcome>,
    pub error: Option<String>,
    pub selected: usize,
}

impl ResultsState {
    #[must_use]
    pub fn records(&self) -> &[CaseRecord] {
        match &self.outcome {
            Some(outcome) => &outcome.results,
            None => &[],
        }
    }

    /// Forget the previous outcome before a new search.
    pub fn reset(&mut self) {
        self.outcome = None;
        self.error = None;
        self.selected = 0;
    }

    pub fn complete(&mut self, outcome: SearchOutcome) {
        self.outcome = Some(outcome);
        self.error = None;
        self.selected = 0;
    }

    /// Replace the view with an error; previous results are discarded.
    pub fn fail(&mut self, message: String) {
        self.outcome = None;
        self.error = Some(message);
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        let len = self.records().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    #[must_use]
    pub fn selected_record(&self) -> Option<&CaseRecord> {
        self.records().get(self.selected)
    }
}

/// Indices of the cards to draw so that `selected` stays visible.
#[must_use]
pub fn visible_window(count: usize, selected: usize, capacity: usize) -> Range<usize> {
    if count == 0 || capacity == 0 {
        return 0..0;
    }
    let selected = selected.min(count - 1);
    let start = if selected >= capacity {
        selected + 1 - capacity
    } else {
        0
    };
    start..(start + capacity).min(count)
}

/// Render the result area.
///
/// `loading` carries the elapsed time of the in-flight search, if any.
pub fn render_results(
    f: &mut Frame,
    area: Rect,
    state: &ResultsState,
    loading: Option<Duration>,
    focused: bool,
) {
    let view = ResultsView::select(state.records(), loading.is_some(), state.error.as_deref());

    match view {
        ResultsView::Error(message) => render_error(f, area, &message),
        ResultsView::Loading => render_loading(f, area, loading.unwrap_or_default()),
        ResultsView::Empty => render_empty(f, area),
        ResultsView::Cards(cards) => {
            render_cards(f, area, &cards, state.outcome.as_ref(), state.selected, focused)
        }
    }
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Search failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_loading(f: &mut Frame, area: Rect, elapsed: Duration) {
    const FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
    let frame = FRAMES[(elapsed.as_millis() / 150) as usize % FRAMES.len()];

    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{frame} "), MedicalTheme::info()),
            Span::styled("Searching...", MedicalTheme::text()),
        ]),
        Line::from(Span::styled(
            format!("{:.1}s", elapsed.as_secs_f64()),
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_empty(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No results yet. Try a search above.",
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_cards(
    f: &mut Frame,
    area: Rect,
    cards: &[CaseCard],
    outcome: Option<&SearchOutcome>,
    selected: usize,
    focused: bool,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    render_summary(f, chunks[0], cards.len(), outcome);

    let list_area = chunks[1];
    let capacity = (list_area.height / CARD_HEIGHT) as usize;
    let window = visible_window(cards.len(), selected, capacity);
    let window_len = window.len();

    let constraints: Vec<Constraint> = (0..window_len)
        .map(|_| Constraint::Length(CARD_HEIGHT))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(list_area);

    for (slot, idx) in window.enumerate() {
        render_card(f, slots[slot], &cards[idx], focused && idx == selected);
    }
}

fn render_summary(f: &mut Frame, area: Rect, shown: usize, outcome: Option<&SearchOutcome>) {
    let mut spans = vec![
        Span::styled(format!(" {shown}"), MedicalTheme::text()),
        Span::styled(
            if shown == 1 { " result" } else { " results" },
            MedicalTheme::text_secondary(),
        ),
    ];

    if let Some(outcome) = outcome {
        if let Some(total) = outcome.total.filter(|t| *t > shown) {
            spans.push(Span::styled(format!(" of {total}"), MedicalTheme::text_secondary()));
        }
        spans.push(Span::styled(
            format!(" · {:.0} ms", outcome.query_time_ms),
            MedicalTheme::text_muted(),
        ));
        spans.push(Span::styled(
            format!(" · {}", outcome.searched_at.format("%H:%M:%S")),
            MedicalTheme::text_muted(),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_card(f: &mut Frame, area: Rect, card: &CaseCard, selected: bool) {
    let band_style = MedicalTheme::score_band(card.band);

    let block = Block::default()
        .title(Line::from(vec![
            Span::styled(format!(" {}% ", card.percent), band_style),
            Span::styled(format!("{} ", card.diagnosis), MedicalTheme::title()),
            Span::styled(format!("· {} ", card.reference), MedicalTheme::text_muted()),
        ]))
        .borders(Borders::ALL)
        .border_style(if selected {
            MedicalTheme::border_focused()
        } else {
            MedicalTheme::border()
        });

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Metadata
            Constraint::Length(2), // Findings
            Constraint::Length(1), // Similarity gauge
        ])
        .split(inner);

    let meta = Paragraph::new(Line::from(vec![
        Span::styled(" Modality: ", MedicalTheme::text_secondary()),
        Span::styled(card.modality.clone(), MedicalTheme::text()),
        Span::styled("  Body: ", MedicalTheme::text_secondary()),
        Span::styled(card.body_part.clone(), MedicalTheme::text()),
        Span::styled("  Age/Gender: ", MedicalTheme::text_secondary()),
        Span::styled(card.demographics.clone(), MedicalTheme::text()),
    ]));
    f.render_widget(meta, rows[0]);

    let findings = if card.findings.is_empty() {
        Span::styled(" No findings recorded", MedicalTheme::text_muted())
    } else {
        Span::styled(format!(" {}", card.findings), MedicalTheme::text_secondary())
    };
    f.render_widget(
        Paragraph::new(Line::from(findings)).wrap(Wrap { trim: true }),
        rows[1],
    );

    let gauge = LineGauge::default()
        .filled_style(band_style)
        .unfilled_style(MedicalTheme::text_muted())
        .ratio(card.ratio)
        .label(Span::styled(" similarity ", MedicalTheme::text_muted()));
    f.render_widget(gauge, rows[2]);
}
