//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Background search, image conversion and health checks

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

use crate::adapters::HttpSearchBackend;
use crate::application::SearchService;
use crate::config::AppConfig;
use crate::ports::SearchBackend;

use super::ui::{
    case_detail::render_case_detail,
    render_disclaimer, render_header, render_key_hints,
    results::{render_results, ResultsState},
    search_form::{render_search_form, Focus, ImageSlot, SearchFormState, SearchMode},
    BackendStatus,
};
use super::worker::{
    HealthHandle, HealthWorker, ImageLoadHandle, ImageLoadProgress, ImageLoadWorker,
    SearchProgress, SearchWorker, SearchWorkerHandle,
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Search,
    CaseDetail,
}

/// Main application state
pub struct App<B: SearchBackend + 'static> {
    screen: Screen,

    should_quit: bool,

    config: AppConfig,

    service: Arc<SearchService<B>>,

    form: SearchFormState,

    results: ResultsState,

    backend_status: BackendStatus,

    /// In-flight search; a new one only starts once this is `None`
    pending_search: Option<SearchWorkerHandle>,

    pending_image: Option<ImageLoadHandle>,

    pending_health: Option<HealthHandle>,

    /// When the in-flight search started (for the loading indicator)
    search_started_at: Option<Instant>,
}

impl App<HttpSearchBackend> {
    /// Create a new application talking to the backend named in the environment.
    ///
    /// For more control, use `with_dependencies()`.
    ///
    /// # Errors
    /// Returns error if configuration is invalid or the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let config = AppConfig::from_env()?;
        let backend = HttpSearchBackend::from_config(&config)
            .map_err(|e| anyhow!("Failed to create HTTP client for {}: {}", config.api_url, e))?;

        tracing::info!(api_url = %backend.base_url(), limit = config.result_limit, "Backend configured");

        let service = Arc::new(SearchService::new(Arc::new(backend), &config));
        Ok(Self::with_dependencies(config, service))
    }
}

impl<B: SearchBackend + 'static> App<B> {
    /// Create application with injected dependencies (Composition Root pattern).
    pub fn with_dependencies(config: AppConfig, service: Arc<SearchService<B>>) -> Self {
        Self {
            screen: Screen::Search,
            should_quit: false,
            config,
            service,
            form: SearchFormState::default(),
            results: ResultsState::default(),
            backend_status: BackendStatus::Checking,
            pending_search: None,
            pending_image: None,
            pending_health: None,
            search_started_at: None,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        self.check_health();

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop<T: Backend>(&mut self, terminal: &mut Terminal<T>) -> Result<()> {
        loop {
            self.poll_workers();

            terminal.draw(|f| self.draw(f))?;

            // Handle input (short poll to stay responsive)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Min(0),    // Content
                Constraint::Length(2), // Key hints
                Constraint::Length(2), // Disclaimer
            ])
            .split(f.area());

        render_header(f, chunks[0], &self.backend_status, &self.config.api_url);

        let selected = match self.screen {
            Screen::CaseDetail => self.results.selected_record(),
            Screen::Search => None,
        };

        if let Some(record) = selected {
            render_case_detail(f, chunks[1], record);
            render_key_hints(f, chunks[2], &[("Esc", "Back", true), ("Ctrl+Q", "Quit", true)]);
        } else {
            let content = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(7), Constraint::Min(0)])
                .split(chunks[1]);

            render_search_form(f, content[0], &self.form);
            render_results(
                f,
                content[1],
                &self.results,
                self.search_started_at.map(|t| t.elapsed()),
                self.form.focus == Focus::Results,
            );
            render_key_hints(f, chunks[2], &self.search_hints());
        }

        render_disclaimer(f, chunks[3]);
    }

    fn search_hints(&self) -> Vec<(&'static str, &'static str, bool)> {
        let loading = self.pending_search.is_some();
        let image_mode = self.form.mode == SearchMode::Image;
        let enter = if self.form.focus == Focus::Results {
            ("Enter", "Details", self.results.selected_record().is_some())
        } else if image_mode && !self.form.has_primary_input() {
            (
                "Enter",
                "Load image",
                !matches!(self.form.image, ImageSlot::Loading { .. }),
            )
        } else {
            ("Enter", "Search", self.form.can_submit(loading))
        };

        let mut hints = vec![
            enter,
            ("Tab", "Focus", true),
            ("Ctrl+T", if image_mode { "Text" } else { "Image" }, true),
        ];
        if image_mode {
            hints.push(("Ctrl+X", "Clear", true));
        } else {
            hints.push(("Ctrl+S", "Sample", true));
        }
        hints.push(("Ctrl+R", "Health", self.pending_health.is_none()));
        hints.push(("Ctrl+Q", "Quit", true));
        hints
    }

    /// Drain finished workers.
    fn poll_workers(&mut self) {
        if let Some(progress) = self.pending_search.as_ref().and_then(|w| w.try_recv()) {
            self.pending_search = None;
            self.search_started_at = None;
            match progress {
                SearchProgress::Complete(outcome) => self.results.complete(outcome),
                SearchProgress::Error(message) => self.results.fail(message),
            }
        }

        if let Some(progress) = self.pending_image.as_ref().and_then(|w| w.try_recv()) {
            self.pending_image = None;
            let accepted = match progress {
                ImageLoadProgress::Ready { path, payload } => self.form.image_loaded(&path, payload),
                ImageLoadProgress::Error { path, message } => self.form.image_failed(&path, message),
            };
            if !accepted {
                tracing::debug!("Dropped stale image conversion");
            }
        }

        if let Some(status) = self.pending_health.as_ref().and_then(|w| w.try_recv()) {
            self.pending_health = None;
            self.backend_status = match status {
                Ok(health) if health.is_ok() => BackendStatus::Online,
                Ok(health) => BackendStatus::Offline(health.status),
                Err(message) => {
                    tracing::warn!("Backend health check failed: {}", message);
                    BackendStatus::Offline(message)
                }
            };
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            self.handle_control_key(key);
            return;
        }

        match self.screen {
            Screen::Search => self.handle_search_key(key),
            Screen::CaseDetail => {
                if matches!(key, KeyCode::Esc | KeyCode::Backspace) {
                    self.screen = Screen::Search;
                }
            }
        }
    }

    fn handle_control_key(&mut self, key: KeyCode) {
        let KeyCode::Char(c) = key else {
            return;
        };

        match c.to_ascii_lowercase() {
            'q' => self.should_quit = true,
            'r' => self.check_health(),
            _ if self.screen != Screen::Search => {}
            't' => self.form.toggle_mode(),
            'l' => self.start_image_load(),
            'x' => {
                self.form.clear_image();
                self.pending_image = None;
            }
            's' => self.form.load_sample_query(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.form.error_message = None;
            }
            KeyCode::Tab => self.form.next_focus(),
            KeyCode::BackTab => self.form.prev_focus(),
            KeyCode::Enter => {
                if self.form.focus == Focus::Results {
                    if self.results.selected_record().is_some() {
                        self.screen = Screen::CaseDetail;
                    }
                } else {
                    self.submit_search();
                }
            }
            KeyCode::Up if self.form.focus == Focus::Results => self.results.select_prev(),
            KeyCode::Down if self.form.focus == Focus::Results => self.results.select_next(),
            KeyCode::Left | KeyCode::Right => self.form.cycle_filter(),
            KeyCode::Char(c) => self.form.input_char(c),
            KeyCode::Backspace => self.form.delete_char(),
            KeyCode::Delete => self.form.clear_field(),
            _ => {}
        }
    }

    fn submit_search(&mut self) {
        if self.pending_search.is_some() {
            return;
        }

        // In image mode Enter first converts the typed path; while that runs it does nothing.
        if self.form.mode == SearchMode::Image && !self.form.has_primary_input() {
            self.start_image_load();
            return;
        }

        let Some(input) = self.form.to_search_input() else {
            self.form.error_message = Some("Enter a search query or load an image".to_string());
            return;
        };

        self.form.error_message = None;
        self.results.reset();
        self.search_started_at = Some(Instant::now());
        self.pending_search = Some(SearchWorker::spawn(self.service.clone(), input));
    }

    fn start_image_load(&mut self) {
        if let Some(path) = self.form.begin_image_load() {
            self.pending_image = Some(ImageLoadWorker::spawn(path, self.config.max_image_bytes));
        }
    }

    fn check_health(&mut self) {
        if self.pending_health.is_some() {
            return;
        }
        self.backend_status = BackendStatus::Checking;
        self.pending_health = Some(HealthWorker::spawn(self.service.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::FakeBackend;
    use crate::ports::BackendError;
    use ratatui::backend::TestBackend;

    fn app_with(backend: FakeBackend) -> (App<FakeBackend>, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        let config = AppConfig::default();
        let service = Arc::new(SearchService::new(backend.clone(), &config));
        (App::with_dependencies(config, service), backend)
    }

    fn settle<B: SearchBackend + 'static>(app: &mut App<B>) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            app.poll_workers();
            if app.pending_search.is_none()
                && app.pending_image.is_none()
                && app.pending_health.is_none()
            {
                return;
            }
            assert!(Instant::now() < deadline, "workers did not finish");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn press(app: &mut App<FakeBackend>, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    fn ctrl(app: &mut App<FakeBackend>, c: char) {
        app.handle_key(KeyCode::Char(c), KeyModifiers::CONTROL);
    }

    fn type_str(app: &mut App<FakeBackend>, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn write_png(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("scan.png");
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0u8; 32]);
        std::fs::write(&path, bytes).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_empty_submit_issues_no_call() {
        let (mut app, backend) = app_with(FakeBackend::with_scores(&[0.9]));

        type_str(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(backend.calls(), 0);
        assert!(app.form.error_message.is_some());
        assert!(app.results.records().is_empty());
    }

    #[test]
    fn test_text_search_populates_results() {
        let (mut app, backend) = app_with(FakeBackend::with_scores(&[0.91, 0.77, 0.42]));

        type_str(&mut app, "cavitary lesion");
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(backend.calls(), 1);
        assert_eq!(app.results.records().len(), 3);
        assert!(app.results.error.is_none());

        let request = backend.requests.lock().unwrap()[0].clone();
        assert_eq!(request.query.as_deref(), Some("cavitary lesion"));
        assert!(request.modality.is_none());
        assert!(request.body_part.is_none());
    }

    #[test]
    fn test_error_clears_previous_results() {
        let (mut app, backend) = app_with(FakeBackend::with_scores(&[0.9, 0.8]));

        type_str(&mut app, "mass");
        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        assert_eq!(app.results.records().len(), 2);

        *backend.response.lock().unwrap() = Err(BackendError::Http {
            status: 500,
            reason: "Internal Server Error".to_string(),
            detail: None,
        });
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert!(app.results.records().is_empty());
        assert_eq!(
            app.results.error.as_deref(),
            Some("Request failed with status 500 Internal Server Error")
        );
    }

    #[test]
    fn test_single_flight_search() {
        let (mut app, backend) = app_with(FakeBackend::with_scores(&[0.9]));

        type_str(&mut app, "effusion");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_filters_flow_into_request() {
        let (mut app, backend) = app_with(FakeBackend::with_scores(&[0.9]));

        type_str(&mut app, "nodule");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        let request = backend.requests.lock().unwrap()[0].clone();
        assert_eq!(request.modality, Some(crate::Modality::Ct));
        assert_eq!(request.body_part, Some(crate::BodyPart::Chest));
    }

    #[test]
    fn test_image_submit_waits_for_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir);
        let (mut app, backend) = app_with(FakeBackend::with_scores(&[0.88]));

        ctrl(&mut app, 't');
        type_str(&mut app, &path);

        // First Enter starts the conversion, the next one is a no-op
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.form.image, ImageSlot::Loading { .. }));
        press(&mut app, KeyCode::Enter);
        assert!(app.pending_search.is_none());

        settle(&mut app);
        assert_eq!(backend.calls(), 0);
        assert!(matches!(app.form.image, ImageSlot::Ready(_)));

        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(backend.calls(), 1);
        let request = backend.requests.lock().unwrap()[0].clone();
        assert!(request.query.is_none());
        assert!(request
            .image
            .as_deref()
            .is_some_and(|url| url.starts_with("data:image/png;base64,")));
    }

    #[test]
    fn test_edited_path_is_reloaded_before_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir);
        let (mut app, backend) = app_with(FakeBackend::with_scores(&[0.9]));

        ctrl(&mut app, 't');
        type_str(&mut app, &path);
        press(&mut app, KeyCode::Enter);
        settle(&mut app);
        assert!(matches!(app.form.image, ImageSlot::Ready(_)));

        press(&mut app, KeyCode::Delete);
        type_str(&mut app, "/elsewhere/b.png");
        assert_eq!(app.form.image, ImageSlot::Empty);

        // Enter now loads the new path instead of searching with the old image
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(backend.calls(), 0);
        assert!(matches!(app.form.image, ImageSlot::Failed(_)));
    }

    #[test]
    fn test_clear_image_discards_pending_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(&dir);
        let (mut app, _backend) = app_with(FakeBackend::with_scores(&[]));

        ctrl(&mut app, 't');
        type_str(&mut app, &path);
        ctrl(&mut app, 'l');
        ctrl(&mut app, 'x');
        settle(&mut app);

        assert_eq!(app.form.image, ImageSlot::Empty);
        assert!(app.form.image_path.is_empty());
    }

    #[test]
    fn test_missing_image_shows_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, backend) = app_with(FakeBackend::with_scores(&[0.9]));

        ctrl(&mut app, 't');
        type_str(&mut app, &dir.path().join("nope.png").display().to_string());
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert!(matches!(app.form.image, ImageSlot::Failed(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_result_detail_navigation() {
        let (mut app, _backend) = app_with(FakeBackend::with_scores(&[0.9, 0.8]));

        type_str(&mut app, "infarct");
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.form.focus, Focus::Results);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::CaseDetail);
        assert_eq!(app.results.selected_record().unwrap().case_id, "case-1");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, Screen::Search);
    }

    #[test]
    fn test_health_check_updates_status() {
        let (mut app, _backend) = app_with(FakeBackend::with_scores(&[]));
        assert_eq!(app.backend_status, BackendStatus::Checking);

        ctrl(&mut app, 'r');
        settle(&mut app);
        assert_eq!(app.backend_status, BackendStatus::Online);
    }

    #[test]
    fn test_ctrl_q_quits() {
        let (mut app, _backend) = app_with(FakeBackend::with_scores(&[]));
        ctrl(&mut app, 'q');
        assert!(app.should_quit);
    }

    #[test]
    fn test_draws_search_screen() {
        let (mut app, _backend) = app_with(FakeBackend::with_scores(&[0.93, 0.71]));
        type_str(&mut app, "consolidation");
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        let mut terminal = Terminal::new(TestBackend::new(110, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        for expected in ["MediMatch", "93%", "71%", "Diagnosis 0", "Quit"] {
            assert!(text.contains(expected), "missing {expected:?}");
        }
    }

    #[test]
    fn test_key_hints_fit_narrow_terminal() {
        let (mut app, _backend) = app_with(FakeBackend::with_scores(&[]));
        ctrl(&mut app, 't');

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        for expected in ["Load image", "Clear", "Health", "[Ctrl+Q]", "Quit"] {
            assert!(text.contains(expected), "missing {expected:?}");
        }
    }
}
