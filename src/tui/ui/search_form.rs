//! Search input form: text query or image file, plus filters.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::filters::{cycle_filter, filter_label};
use crate::domain::{BodyPart, ImagePayload, Modality, SearchFilters, SearchInput};
use crate::tui::styles::MedicalTheme;

const SAMPLE_QUERY: &str = "pneumonia, bilateral infiltrates";

/// Which primary input is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Text,
    Image,
}

/// Focusable regions of the search screen, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Primary,
    Modality,
    BodyPart,
    Results,
}

const FOCUS_ORDER: [Focus; 4] = [Focus::Primary, Focus::Modality, Focus::BodyPart, Focus::Results];

/// State of the query image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSlot {
    Empty,
    /// Conversion running on a worker
    Loading { path: String },
    Ready(ImagePayload),
    Failed(String),
}

/// Search form state
pub struct SearchFormState {
    pub mode: SearchMode,
    pub query: String,
    pub image_path: String,
    pub image: ImageSlot,
    pub modality: Option<Modality>,
    pub body_part: Option<BodyPart>,
    pub focus: Focus,
    pub error_message: Option<String>,
}

impl Default for SearchFormState {
    fn default() -> Self {
        Self {
            mode: SearchMode::Text,
            query: String::new(),
            image_path: String::new(),
            image: ImageSlot::Empty,
            modality: None,
            body_part: None,
            focus: Focus::Primary,
            error_message: None,
        }
    }
}

impl SearchFormState {
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            SearchMode::Text => SearchMode::Image,
            SearchMode::Image => SearchMode::Text,
        };
        self.focus = Focus::Primary;
        self.error_message = None;
    }

    pub fn next_focus(&mut self) {
        let idx = FOCUS_ORDER.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = FOCUS_ORDER[(idx + 1) % FOCUS_ORDER.len()];
    }

    pub fn prev_focus(&mut self) {
        let idx = FOCUS_ORDER.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = FOCUS_ORDER[(idx + FOCUS_ORDER.len() - 1) % FOCUS_ORDER.len()];
    }

    /// Type into the primary field; on a filter field any key cycles the filter.
    pub fn input_char(&mut self, c: char) {
        match self.focus {
            Focus::Primary => {
                if c.is_control() {
                    return;
                }
                self.primary_buffer_mut().push(c);
                self.primary_edited();
                self.error_message = None;
            }
            Focus::Modality | Focus::BodyPart => {
                if c == ' ' {
                    self.cycle_filter();
                }
            }
            Focus::Results => {}
        }
    }

    pub fn delete_char(&mut self) {
        if self.focus == Focus::Primary {
            self.primary_buffer_mut().pop();
            self.primary_edited();
        }
    }

    /// Clear the focused field (filters go back to "all").
    pub fn clear_field(&mut self) {
        match self.focus {
            Focus::Primary => {
                self.primary_buffer_mut().zeroize();
                self.primary_edited();
            }
            Focus::Modality => self.modality = None,
            Focus::BodyPart => self.body_part = None,
            Focus::Results => {}
        }
    }

    /// Advance the focused filter to its next value.
    pub fn cycle_filter(&mut self) {
        match self.focus {
            Focus::Modality => self.modality = cycle_filter(self.modality),
            Focus::BodyPart => self.body_part = cycle_filter(self.body_part),
            _ => {}
        }
    }

    /// A changed image path no longer matches the loaded image; it must be loaded again.
    fn primary_edited(&mut self) {
        if self.mode == SearchMode::Image {
            self.image = ImageSlot::Empty;
        }
    }

    fn primary_buffer_mut(&mut self) -> &mut String {
        match self.mode {
            SearchMode::Text => &mut self.query,
            SearchMode::Image => &mut self.image_path,
        }
    }

    #[must_use]
    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            modality: self.modality,
            body_part: self.body_part,
        }
    }

    /// Whether the active mode has its primary input ready.
    #[must_use]
    pub fn has_primary_input(&self) -> bool {
        match self.mode {
            SearchMode::Text => !self.query.trim().is_empty(),
            SearchMode::Image => matches!(self.image, ImageSlot::Ready(_)),
        }
    }

    /// Search is enabled only when idle and the primary input is ready.
    #[must_use]
    pub fn can_submit(&self, loading: bool) -> bool {
        !loading && self.has_primary_input()
    }

    /// Build the search input, or `None` if nothing can be submitted yet.
    #[must_use]
    pub fn to_search_input(&self) -> Option<SearchInput> {
        if !self.has_primary_input() {
            return None;
        }
        match (&self.mode, &self.image) {
            (SearchMode::Text, _) => Some(SearchInput::text(self.query.trim(), self.filters())),
            (SearchMode::Image, ImageSlot::Ready(payload)) => {
                Some(SearchInput::image(payload.clone(), self.filters()))
            }
            (SearchMode::Image, _) => None,
        }
    }

    /// Mark the typed path as loading and return it for the worker.
    ///
    /// Returns `None` outside image mode, with an empty path, or while a
    /// conversion is already running.
    pub fn begin_image_load(&mut self) -> Option<String> {
        if self.mode != SearchMode::Image || matches!(self.image, ImageSlot::Loading { .. }) {
            return None;
        }
        let path = self.image_path.trim().to_string();
        if path.is_empty() {
            self.error_message = Some("Enter an image file path".to_string());
            return None;
        }
        self.image = ImageSlot::Loading { path: path.clone() };
        self.error_message = None;
        Some(path)
    }

    /// Accept a finished conversion if it is still the one being waited for.
    ///
    /// Returns `false` for stale results (image cleared or replaced meanwhile).
    pub fn image_loaded(&mut self, path: &str, payload: ImagePayload) -> bool {
        match &self.image {
            ImageSlot::Loading { path: pending } if pending == path => {
                self.image = ImageSlot::Ready(payload);
                true
            }
            _ => false,
        }
    }

    pub fn image_failed(&mut self, path: &str, message: String) -> bool {
        match &self.image {
            ImageSlot::Loading { path: pending } if pending == path => {
                self.image = ImageSlot::Failed(message);
                true
            }
            _ => false,
        }
    }

    /// Drop the preview and the file state together.
    pub fn clear_image(&mut self) {
        self.image_path.zeroize();
        self.image = ImageSlot::Empty;
        self.error_message = None;
    }

    pub fn load_sample_query(&mut self) {
        self.mode = SearchMode::Text;
        self.query = SAMPLE_QUERY.to_string();
        self.focus = Focus::Primary;
        self.error_message = None;
    }
}

/// Render the search form
pub fn render_search_form(f: &mut Frame, area: Rect, state: &SearchFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Mode tabs + image status
            Constraint::Length(3), // Primary input
            Constraint::Length(3), // Filters
        ])
        .split(area);

    render_mode_line(f, chunks[0], state);
    render_primary_input(f, chunks[1], state);
    render_filters(f, chunks[2], state);
}

fn render_mode_line(f: &mut Frame, area: Rect, state: &SearchFormState) {
    let tab = |label: &'static str, active: bool| {
        if active {
            Span::styled(format!(" {label} "), MedicalTheme::selected())
        } else {
            Span::styled(format!(" {label} "), MedicalTheme::text_secondary())
        }
    };

    let mut spans = vec![
        tab("Text", state.mode == SearchMode::Text),
        Span::raw(" "),
        tab("Image", state.mode == SearchMode::Image),
        Span::styled("  ", MedicalTheme::text()),
    ];

    if state.mode == SearchMode::Image {
        spans.push(match &state.image {
            ImageSlot::Empty => Span::styled("No image loaded", MedicalTheme::text_muted()),
            ImageSlot::Loading { .. } => Span::styled("Converting image...", MedicalTheme::info()),
            ImageSlot::Ready(payload) => Span::styled(
                format!("Preview: {}", payload.summary()),
                MedicalTheme::success(),
            ),
            ImageSlot::Failed(message) => Span::styled(message.clone(), MedicalTheme::danger()),
        });
    }

    if let Some(error) = &state.error_message {
        spans.push(Span::styled(format!("  ! {error}"), MedicalTheme::danger()));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_primary_input(f: &mut Frame, area: Rect, state: &SearchFormState) {
    let focused = state.focus == Focus::Primary;
    let (title, value, hint) = match state.mode {
        SearchMode::Text => (
            " Query ",
            state.query.as_str(),
            "E.g., pneumonia, bilateral infiltrates...",
        ),
        SearchMode::Image => (
            " Image file ",
            state.image_path.as_str(),
            "Path to a png, jpeg or dicom file, then [Enter] to load",
        ),
    };

    let block = Block::default()
        .title(Span::styled(title, field_title_style(focused)))
        .borders(Borders::ALL)
        .border_style(field_border_style(focused));

    let value_span = if value.is_empty() {
        Span::styled(hint, MedicalTheme::text_muted())
    } else {
        Span::styled(value, MedicalTheme::text())
    };

    let content = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        value_span,
        if focused {
            Span::styled("▌", MedicalTheme::cursor())
        } else {
            Span::raw("")
        },
    ]))
    .block(block);

    f.render_widget(content, area);
}

fn render_filters(f: &mut Frame, area: Rect, state: &SearchFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_filter(
        f,
        columns[0],
        " Modality ",
        filter_label(state.modality),
        state.focus == Focus::Modality,
    );
    render_filter(
        f,
        columns[1],
        " Body part ",
        filter_label(state.body_part),
        state.focus == Focus::BodyPart,
    );
}

fn render_filter(f: &mut Frame, area: Rect, title: &'static str, value: &str, focused: bool) {
    let block = Block::default()
        .title(Span::styled(title, field_title_style(focused)))
        .borders(Borders::ALL)
        .border_style(field_border_style(focused));

    let mut spans = vec![Span::raw(" "), Span::styled(value.to_string(), MedicalTheme::text())];
    if focused {
        spans.push(Span::styled("  [←→/Space] change", MedicalTheme::key_desc()));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn field_title_style(focused: bool) -> ratatui::style::Style {
    if focused {
        MedicalTheme::focused()
    } else {
        MedicalTheme::text_secondary()
    }
}

fn field_border_style(focused: bool) -> ratatui::style::Style {
    if focused {
        MedicalTheme::border_focused()
    } else {
        MedicalTheme::border()
    }
}
