use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info};

use lazyocredit::canvas::{self, CanvasScroll, CellGrid};
use lazyocredit::edit::EditKey;
use lazyocredit::error::RegionError;
use lazyocredit::export::{ExportFormat, export_session};
use lazyocredit::extraction::{AutoExtractor, Extractor};
use lazyocredit::logging::init_file_logging;
use lazyocredit::mapper::{Viewport, ViewportBox};
use lazyocredit::overlay::{ElementBody, OverlayFrame, RunKind, TextRun, compose};
use lazyocredit::search::SearchSummary;
use lazyocredit::session::{DocumentSession, Effect};
use lazyocredit::tesseract::{TesseractConfig, TesseractExtractor, ToolStatus};
use lazyocredit::workspace::{Stage, Workspace};

/// LazyOcrEdit
/// Editor textu rozpoznaného OCR: regiony dokumentu vykreslené na pevném plátně,
/// editace na místě a hledání, s Ratatui TUI rozhraním.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dokument k otevření po startu (obrázek pro Tesseract nebo uložená JSON odpověď extrakce)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Výstupní adresář pro exporty
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Šířka plátna v logických pixelech
    #[arg(long, default_value_t = 800)]
    viewport_width: u32,

    /// Výška plátna v logických pixelech
    #[arg(long, default_value_t = 1130)]
    viewport_height: u32,

    /// Kolik logických pixelů připadá na šířku jedné buňky terminálu
    #[arg(long, default_value_t = 8)]
    cell_width: u32,

    /// Kolik logických pixelů připadá na výšku jedné buňky terminálu
    #[arg(long, default_value_t = 16)]
    cell_height: u32,

    /// Jazyk pro Tesseract (např. ces, eng, eng+ces)
    #[arg(long, default_value = "eng")]
    lang: String,

    /// Cesta / název binárky Tesseract
    /// "auto" = nejprve zkusí lokální složku programu, pak PATH.
    #[arg(long, default_value = "auto")]
    tess_bin: String,

    /// Cesta k tessdata adresáři (pokud se nenalézá automaticky)
    #[arg(long)]
    tessdata_dir: Option<PathBuf>,

    /// Vynutit použití lokálního Tesseractu (ignorovat PATH)
    #[arg(long)]
    force_local_tess: bool,

    /// Typ dokumentu pro výsledky z Tesseractu (výchozí "Document")
    #[arg(long)]
    doc_type: Option<String>,

    /// Přístupový token; se zadaným tokenem se přihlašovací obrazovka přeskočí
    #[arg(long, env = "LAZYOCR_TOKEN")]
    token: Option<String>,

    /// Soubor pro tracing log (stdout patří TUI)
    #[arg(long, default_value = "lazyocredit.log")]
    log_file: PathBuf,

    /// Bez TUI: načte --input, vypíše textový export na stdout a skončí
    #[arg(long)]
    dump: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiMode {
    Login,
    Upload,
    Viewer,
    Editing,
    Search,
    ConfirmReturn,
    Notice,
}

struct App {
    args: Args,
    workspace: Workspace,
    extractor: Box<dyn Extractor>,
    tess_status: ToolStatus,
    tess_source: String,
    viewport: Viewport,
    grid: CellGrid,
    scroll: CanvasScroll,
    /// Vnitřek rámečku plátna při posledním vykreslení
    canvas_area: Rect,
    selected: Option<usize>,
    mode: UiMode,
    input_buffer: String,
    notice: String,
    notice_return: UiMode,
    log_lines: Vec<String>,
    log_scroll: usize,
}

impl App {
    fn new(
        args: Args,
        workspace: Workspace,
        extractor: Box<dyn Extractor>,
        tess_status: ToolStatus,
        tess_source: String,
    ) -> Self {
        let viewport = Viewport::new(args.viewport_width, args.viewport_height);
        let grid = CellGrid::new(args.cell_width, args.cell_height);
        let mode = match workspace.stage() {
            Stage::Locked => UiMode::Login,
            Stage::Upload => UiMode::Upload,
            Stage::Viewer => UiMode::Viewer,
        };

        let mut app = Self {
            args,
            workspace,
            extractor,
            tess_status,
            tess_source,
            viewport,
            grid,
            scroll: CanvasScroll::default(),
            canvas_area: Rect::default(),
            selected: None,
            mode,
            input_buffer: String::new(),
            notice: String::new(),
            notice_return: mode,
            log_lines: Vec::new(),
            log_scroll: 0,
        };

        let tess_msg = match &app.tess_status {
            ToolStatus::Ok(msg) | ToolStatus::Error(msg) => format!("Tesseract: {msg} ({})", app.tess_source),
        };
        app.push_log(tess_msg);
        if app.mode == UiMode::Upload {
            app.prefill_input_path();
        }
        app
    }

    /// Přepočítá oblast plátna podle velikosti terminálu.
    fn set_screen(&mut self, size: Rect) {
        self.canvas_area = canvas_inner(screen_chunks(size)[1]);
        let canvas = self.grid.canvas_size(self.viewport);
        self.scroll.scroll_by(0, 0, canvas, self.canvas_area);
    }

    fn frame(&self) -> Option<OverlayFrame> {
        self.workspace
            .session()
            .map(|session| compose(session, self.viewport))
    }

    fn push_log(&mut self, line: String) {
        let timestamp = Local::now().format("[%H:%M:%S] ").to_string();
        self.log_lines.push(format!("{}{}", timestamp, line));
        if self.log_lines.len() > 1000 {
            let extra = self.log_lines.len() - 500;
            self.log_lines.drain(0..extra);
        }
        // Auto-scroll pouze pokud uživatel není moc vysoko
        if self.log_scroll >= self.log_lines.len().saturating_sub(30) {
            self.auto_scroll_log();
        }
    }

    fn auto_scroll_log(&mut self) {
        let visible_lines = 6; // přibližný počet viditelných řádků
        let total_lines = self.log_lines.len();
        if total_lines > visible_lines {
            self.log_scroll = total_lines - visible_lines;
        }
    }

    fn show_notice(&mut self, message: String) {
        if self.mode != UiMode::Notice {
            self.notice_return = self.mode;
        }
        self.notice = message;
        self.mode = UiMode::Notice;
    }

    fn prefill_input_path(&mut self) {
        self.input_buffer = self
            .args
            .input
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
    }

    // ----- přihlášení / nahrání -----

    fn submit_token(&mut self) {
        let token = std::mem::take(&mut self.input_buffer);
        match self.workspace.authenticate(&token) {
            Ok(()) => {
                self.push_log("Přihlášeno.".to_string());
                self.mode = UiMode::Upload;
                self.prefill_input_path();
            }
            Err(e) => self.push_log(e.to_string()),
        }
    }

    fn submit_upload(&mut self) {
        let trimmed = self.input_buffer.trim().to_string();
        if trimmed.is_empty() {
            self.push_log("Zadejte cestu k dokumentu.".to_string());
            return;
        }
        self.open_document(Path::new(&trimmed));
    }

    fn open_document(&mut self, path: &Path) {
        self.push_log(format!("Extrakce `{}`…", path.display()));
        match self.workspace.upload(self.extractor.as_ref(), path) {
            Ok(()) => {
                self.scroll = CanvasScroll::default();
                self.selected = None;
                self.input_buffer.clear();
                self.mode = UiMode::Viewer;

                let regions = self
                    .workspace
                    .session()
                    .map_or(0, |s| s.regions().len());
                let skipped = self.frame().map_or(0, |f| f.skipped.len());
                self.push_log(format!("Načteno {regions} regionů z `{}`.", path.display()));
                if skipped > 0 {
                    self.push_log(format!(
                        "{skipped} regionů má vadné souřadnice a nezobrazí se."
                    ));
                }
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "upload failed");
                self.push_log(format!("Chyba: {e}"));
                self.show_notice(e.to_string());
            }
        }
    }

    fn logout(&mut self) {
        self.workspace.logout();
        self.selected = None;
        self.input_buffer.clear();
        self.mode = UiMode::Login;
        self.push_log("Odhlášeno.".to_string());
    }

    fn request_return(&mut self) {
        self.mode = UiMode::ConfirmReturn;
    }

    fn confirm_return(&mut self) {
        let previous = self.workspace.source_path().map(Path::to_path_buf);
        self.workspace.return_to_upload();
        self.selected = None;
        self.scroll = CanvasScroll::default();
        self.input_buffer = previous
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        self.mode = UiMode::Upload;
        self.push_log("Dokument zavřen, neuložené změny zahozeny.".to_string());
    }

    // ----- session -----

    fn run_session<F>(&mut self, op: F)
    where
        F: FnOnce(&mut DocumentSession) -> Result<Vec<Effect>, RegionError>,
    {
        let Some(session) = self.workspace.session_mut() else {
            return;
        };
        match op(session) {
            Ok(effects) => self.apply_effects(effects),
            Err(e) => {
                error!(error = %e, "edit failed");
                self.push_log(format!("Chyba editace: {e}"));
            }
        }
        self.sync_edit_mode();
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        self.workspace.observe(&effects);
        for effect in effects {
            match effect {
                Effect::FocusEditor { index } => {
                    self.selected = Some(index);
                    self.mode = UiMode::Editing;
                    if let Some(bbox) = self.frame().and_then(|f| f.element(index).map(|e| e.bbox)) {
                        self.reveal_box(bbox);
                    }
                }
                Effect::RevealMatch(m) => {
                    self.selected = Some(m.region_index);
                    if let Some(bbox) = self.frame().and_then(|f| f.reveal_target(&m)) {
                        self.reveal_box(bbox);
                    }
                }
                Effect::ContentCommitted { index } => {
                    self.push_log(format!("Region {} uložen.", index + 1));
                }
            }
        }
    }

    fn reveal_box(&mut self, bbox: ViewportBox) {
        let cells = self.grid.to_cells(&bbox);
        let canvas = self.grid.canvas_size(self.viewport);
        self.scroll.reveal(&cells, canvas, self.canvas_area);
    }

    /// Editační režim UI drží krok se stavem kurzoru editace.
    fn sync_edit_mode(&mut self) {
        let editing = self
            .workspace
            .session()
            .and_then(|s| s.edit_cursor().editing_index())
            .is_some();
        if editing {
            self.mode = UiMode::Editing;
        } else if self.mode == UiMode::Editing {
            self.mode = UiMode::Viewer;
        }
    }

    fn begin_edit(&mut self, index: usize) {
        self.run_session(|s| s.begin_edit(index));
    }

    fn commit_edit(&mut self) {
        self.run_session(|s| s.commit_edit());
    }

    fn edit_key(&mut self, key: EditKey) {
        if key == EditKey::Cancel {
            self.push_log("Editace zrušena.".to_string());
        }
        self.run_session(|s| s.edit_key(key));
    }

    /// Tab / Shift+Tab: výběr mezi vykreslenými regiony v pořadí.
    fn select_step(&mut self, forward: bool) {
        let Some(frame) = self.frame() else {
            return;
        };
        if frame.elements.is_empty() {
            return;
        }
        let len = frame.elements.len();
        let pos = self
            .selected
            .and_then(|sel| frame.elements.iter().position(|e| e.index == sel));
        let next = match (pos, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(p), true) => (p + 1) % len,
            (Some(p), false) => (p + len - 1) % len,
        };
        let element = &frame.elements[next];
        self.selected = Some(element.index);
        self.reveal_box(element.bbox);
    }

    fn edit_selected(&mut self) {
        if let Some(index) = self.selected {
            self.begin_edit(index);
        }
    }

    fn scroll_canvas(&mut self, d_col: i32, d_row: i32) {
        let canvas = self.grid.canvas_size(self.viewport);
        self.scroll.scroll_by(d_col, d_row, canvas, self.canvas_area);
    }

    fn click(&mut self, column: u16, row: u16) {
        if !matches!(self.mode, UiMode::Viewer | UiMode::Editing | UiMode::Search) {
            return;
        }
        if self
            .scroll
            .screen_to_cell(self.canvas_area, column, row)
            .is_none()
        {
            return;
        }
        let Some(frame) = self.frame() else {
            return;
        };
        match canvas::hit_test(&frame, &self.grid, &self.scroll, self.canvas_area, column, row) {
            Some(index) => self.begin_edit(index),
            // klik do prázdného plátna = ztráta fokusu
            None => self.commit_edit(),
        }
    }

    // ----- hledání -----

    fn start_search(&mut self) {
        self.input_buffer = self
            .workspace
            .session()
            .map(|s| s.search().query().to_string())
            .unwrap_or_default();
        self.mode = UiMode::Search;
    }

    fn update_query(&mut self) {
        let query = self.input_buffer.clone();
        if let Some(session) = self.workspace.session_mut() {
            let effects = session.set_query(query);
            self.apply_effects(effects);
        }
    }

    fn next_match(&mut self) {
        if let Some(session) = self.workspace.session_mut() {
            let effects = session.next_match();
            self.apply_effects(effects);
        }
    }

    fn prev_match(&mut self) {
        if let Some(session) = self.workspace.session_mut() {
            let effects = session.prev_match();
            self.apply_effects(effects);
        }
    }

    fn clear_search(&mut self) {
        if let Some(session) = self.workspace.session_mut() {
            session.clear_search();
        }
    }

    // ----- export -----

    fn export(&mut self, format: ExportFormat) {
        let result = match self.workspace.session() {
            Some(session) => export_session(
                session,
                format,
                &self.args.output,
                self.workspace.source_path(),
            ),
            None => return,
        };
        match result {
            Ok(path) => {
                self.push_log(format!("Export {} uložen do `{}`", format.label(), path.display()))
            }
            Err(e) => {
                self.push_log(format!("Export {} selhal: {e}", format.label()));
                self.show_notice(e.to_string());
            }
        }
    }

    // ----- klávesy a myš -----

    /// Vrací `true`, pokud má aplikace skončit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            UiMode::Login => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Enter => self.submit_token(),
                KeyCode::Backspace => {
                    self.input_buffer.pop();
                }
                KeyCode::Char(c) => self.input_buffer.push(c),
                _ => {}
            },
            UiMode::Upload => match key.code {
                KeyCode::Esc => self.logout(),
                KeyCode::Enter => self.submit_upload(),
                KeyCode::Backspace => {
                    self.input_buffer.pop();
                }
                KeyCode::Char(c) => self.input_buffer.push(c),
                _ => {}
            },
            UiMode::Viewer => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Up => self.scroll_canvas(0, -1),
                KeyCode::Down => self.scroll_canvas(0, 1),
                KeyCode::Left => self.scroll_canvas(-4, 0),
                KeyCode::Right => self.scroll_canvas(4, 0),
                KeyCode::PageUp => self.scroll_canvas(0, -(self.canvas_area.height.max(1) as i32)),
                KeyCode::PageDown => self.scroll_canvas(0, self.canvas_area.height.max(1) as i32),
                KeyCode::Tab => self.select_step(true),
                KeyCode::BackTab => self.select_step(false),
                KeyCode::Enter => self.edit_selected(),
                KeyCode::Char('/') => self.start_search(),
                KeyCode::Char('n') => self.next_match(),
                KeyCode::Char('N') => self.prev_match(),
                KeyCode::F(3) if key.modifiers.contains(KeyModifiers::SHIFT) => self.prev_match(),
                KeyCode::F(3) => self.next_match(),
                KeyCode::Esc => self.clear_search(),
                KeyCode::Char('s') => self.export(ExportFormat::Text),
                KeyCode::Char('j') => self.export(ExportFormat::Json),
                KeyCode::Char('p') => self.export(ExportFormat::Pdf),
                KeyCode::Char('b') => self.request_return(),
                KeyCode::Char('L') => self.logout(),
                _ => {}
            },
            UiMode::Editing => {
                if let Some(edit) = edit_key_from(&key) {
                    self.edit_key(edit);
                }
            }
            UiMode::Search => match key.code {
                KeyCode::Esc => self.mode = UiMode::Viewer,
                KeyCode::F(3) if key.modifiers.contains(KeyModifiers::SHIFT) => self.prev_match(),
                KeyCode::Enter | KeyCode::F(3) => self.next_match(),
                KeyCode::Backspace => {
                    self.input_buffer.pop();
                    self.update_query();
                }
                KeyCode::Char(c) => {
                    self.input_buffer.push(c);
                    self.update_query();
                }
                _ => {}
            },
            UiMode::ConfirmReturn => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.confirm_return(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.mode = UiMode::Viewer
                }
                _ => {}
            },
            UiMode::Notice => self.mode = self.notice_return,
        }
        false
    }

    fn handle_mouse(&mut self, me: MouseEvent) {
        match me.kind {
            MouseEventKind::ScrollUp => self.scroll_canvas(0, -3),
            MouseEventKind::ScrollDown => self.scroll_canvas(0, 3),
            MouseEventKind::Down(MouseButton::Left) => self.click(me.column, me.row),
            _ => {}
        }
    }
}

/// Terminálová klávesa → klávesa editační plochy.
fn edit_key_from(key: &KeyEvent) -> Option<EditKey> {
    let line_break = key
        .modifiers
        .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);
    let edit = match key.code {
        KeyCode::Enter => EditKey::Confirm { line_break },
        KeyCode::Esc => EditKey::Cancel,
        KeyCode::Tab | KeyCode::BackTab => EditKey::Blur,
        KeyCode::Backspace => EditKey::Backspace,
        KeyCode::Delete => EditKey::Delete,
        KeyCode::Left => EditKey::Left,
        KeyCode::Right => EditKey::Right,
        KeyCode::Home => EditKey::Home,
        KeyCode::End => EditKey::End,
        KeyCode::Char(c) => EditKey::Char(c),
        _ => return None,
    };
    Some(edit)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_file_logging(&args.log_file).with_context(|| {
        format!("Nelze otevřít log soubor `{}`", args.log_file.display())
    })?;

    let tesseract = TesseractExtractor::resolve(&TesseractConfig {
        tess_bin: args.tess_bin.clone(),
        force_local: args.force_local_tess,
        tessdata_dir: args.tessdata_dir.clone(),
        lang: args.lang.clone(),
        doc_type: args.doc_type.clone(),
    });

    if args.dump {
        return dump(&args, tesseract);
    }

    // output adresář vždy vytvořit
    fs::create_dir_all(&args.output).with_context(|| {
        format!(
            "Nelze vytvořit výstupní adresář `{}`",
            args.output.display()
        )
    })?;

    let tess_status = tesseract.check();
    let tess_source = tesseract.source().to_string();
    info!(path = %tesseract.path().display(), source = %tess_source, "tesseract resolved");

    let workspace = Workspace::with_token(args.token.as_deref());
    let initial = args.input.clone();
    let mut app = App::new(
        args,
        workspace,
        Box::new(AutoExtractor::new(tesseract)),
        tess_status,
        tess_source,
    );

    // Terminál
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.set_screen(terminal.size()?);
    if let Some(path) = initial {
        if app.workspace.is_authenticated() {
            app.open_document(&path);
        }
    }

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        eprintln!("Error: {e:?}");
    }

    Ok(())
}

/// `--dump`: extrakce a textový export bez TUI.
fn dump(args: &Args, tesseract: TesseractExtractor) -> Result<()> {
    let input = args
        .input
        .as_deref()
        .context("--dump vyžaduje --input")?;
    let result = AutoExtractor::new(tesseract)
        .extract(input)
        .with_context(|| format!("Extrakce `{}` selhala", input.display()))?;
    let session = DocumentSession::new(result);
    println!("{}", session.plain_text());
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(200);

    // Proměnná pro sledování změn, které vyžadují kompletní reset
    let mut force_full_redraw = true;

    loop {
        if force_full_redraw {
            terminal.clear()?;
            force_full_redraw = false;
        }

        app.set_screen(terminal.size()?);
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let before = app.mode;
                    if app.handle_key(key) {
                        return Ok(());
                    }
                    // popupy se mění s režimem – kompletní překreslení
                    if app.mode != before {
                        force_full_redraw = true;
                    }
                }
                Event::Mouse(me) => app.handle_mouse(me),
                Event::Resize(_, _) => {
                    // Změna velikosti okna vždy vyžaduje kompletní překreslení
                    force_full_redraw = true;
                }
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

/// Hlavička, plátno, status bar, log.
fn screen_chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints(
            [
                Constraint::Length(4), // hlavička + nástroje
                Constraint::Min(5),    // plátno
                Constraint::Length(1), // status bar
                Constraint::Length(8), // log
            ]
            .as_ref(),
        )
        .split(area)
}

fn canvas_inner(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

/// UI layout
fn ui(f: &mut Frame<'_>, app: &App) {
    // Nejprve hlavní UI
    render_main_ui(f, app);
    // Potom overlay (přihlášení / nahrání / dialogy)
    render_overlay_ui(f, app);
}

fn render_main_ui(f: &mut Frame<'_>, app: &App) {
    let area = f.size();

    // Pozadí
    let background_block = Block::default().style(Style::default().bg(Color::Black));
    f.render_widget(background_block, area);

    let chunks = screen_chunks(area);
    let frame = app.frame();

    // ----- horní panel -----
    let title_line = Line::from(vec![
        Span::styled(
            "LazyOcrEdit",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" • "),
        Span::styled(
            "OCR overlay editor",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ),
    ]);

    let tess_status_text = match &app.tess_status {
        ToolStatus::Ok(msg) => Span::styled(
            format!("✓ {}", msg),
            Style::default().fg(Color::Green),
        ),
        ToolStatus::Error(msg) => Span::styled(
            format!("✗ {}", msg),
            Style::default().fg(Color::Red),
        ),
    };

    let doc_type = app
        .workspace
        .session()
        .map_or("–".to_string(), |s| s.doc_type().to_string());

    let status_line = Line::from(vec![
        Span::raw("  "),
        Span::styled("Tess: ", Style::default().fg(Color::Cyan)),
        tess_status_text,
        Span::raw("  "),
        Span::styled("Jazyk: ", Style::default().fg(Color::Cyan)),
        Span::raw(app.args.lang.as_str()),
        Span::raw("  "),
        Span::styled("Typ dokumentu: ", Style::default().fg(Color::Cyan)),
        Span::styled(doc_type, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled("Výstup: ", Style::default().fg(Color::Cyan)),
        Span::raw(app.args.output.display().to_string()),
    ]);

    let hint_line = Line::from(Span::styled(
        format!("  {}", mode_hint(app.mode)),
        Style::default().fg(Color::DarkGray),
    ));

    let header = Paragraph::new(vec![title_line, status_line, hint_line])
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, chunks[0]);

    // ----- plátno -----
    render_canvas(f, app, frame.as_ref(), chunks[1]);

    // ----- status bar -----
    let mut status = vec![Span::styled(
        format!(" {} ", mode_label(app.mode)),
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(session) = app.workspace.session() {
        let query = if app.mode == UiMode::Search {
            app.input_buffer.as_str()
        } else {
            session.search().query()
        };
        if app.mode == UiMode::Search || session.search().is_active() {
            status.push(Span::raw("  "));
            status.push(Span::styled("Hledat: ", Style::default().fg(Color::Cyan)));
            status.push(Span::raw(query.to_string()));
            if app.mode == UiMode::Search {
                status.push(Span::styled("_", Style::default().fg(Color::Yellow)));
            }
            status.push(Span::raw("  "));
        }
        match session.search().summary() {
            SearchSummary::Inactive => {}
            SearchSummary::NoResults => status.push(Span::styled(
                "Žádné výsledky",
                Style::default().fg(Color::Red),
            )),
            SearchSummary::Results { current, total } => status.push(Span::styled(
                format!("{}/{}", current + 1, total),
                Style::default().fg(Color::Green),
            )),
        }

        status.push(Span::raw("  "));
        status.push(Span::styled("Regiony: ", Style::default().fg(Color::Cyan)));
        status.push(Span::raw(session.regions().len().to_string()));
        if let Some(skipped) = frame.as_ref().map(|fr| fr.skipped.len()).filter(|n| *n > 0) {
            status.push(Span::styled(
                format!(" ({skipped} vynecháno)"),
                Style::default().fg(Color::Red),
            ));
        }
        // stránkování není, jen indikátor
        status.push(Span::raw("  "));
        status.push(Span::styled("Strana 1", Style::default().fg(Color::DarkGray)));
    }

    let status_bar = Paragraph::new(Line::from(status)).block(Block::default().borders(Borders::NONE));
    f.render_widget(status_bar, chunks[2]);

    // ----- log panel -----
    let log_lines: Vec<Line> = app
        .log_lines
        .iter()
        .map(|line| Line::from(Span::raw(line.clone())))
        .collect();

    let log_block = Block::default()
        .title(Span::styled(
            format!(" Log ({}) ", app.log_lines.len()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);

    let visible_log_height = chunks[3].height.saturating_sub(2);
    let total_log_lines = log_lines.len() as u16;
    let max_log_scroll = total_log_lines.saturating_sub(visible_log_height) as usize;
    let log_y = app.log_scroll.min(max_log_scroll) as u16;

    let logs = Paragraph::new(log_lines)
        .block(log_block)
        .scroll((log_y, 0));
    f.render_widget(logs, chunks[3]);
}

fn render_canvas(f: &mut Frame<'_>, app: &App, frame: Option<&OverlayFrame>, area: Rect) {
    let title = match app.workspace.source_path() {
        Some(path) => format!(
            " Dokument: {} ",
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string())
        ),
        None => " Dokument ".to_string(),
    };
    let focused = matches!(app.mode, UiMode::Editing);
    let block = Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(if focused { Color::Yellow } else { Color::Cyan })
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        });
    f.render_widget(block, area);

    let inner = canvas_inner(area);
    let (Some(session), Some(frame)) = (app.workspace.session(), frame) else {
        return;
    };

    if session.regions().is_empty() {
        let message = Paragraph::new("V dokumentu nebyl nalezen žádný obsah")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        let row = Rect {
            y: inner.y + inner.height / 2,
            height: inner.height.min(1),
            ..inner
        };
        f.render_widget(message, row);
        return;
    }

    // editor se kreslí poslední, aby byl nahoře
    let mut editor = None;
    for element in &frame.elements {
        if element.is_editor() {
            editor = Some(element);
            continue;
        }
        let Some(rect) = app.scroll.project(&app.grid.to_cells(&element.bbox), inner) else {
            continue;
        };
        let style = if app.selected == Some(element.index) {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        };
        let text = element_text(&element.body);
        f.render_widget(
            Paragraph::new(text).style(style).wrap(Wrap { trim: false }),
            rect,
        );
    }

    if let Some(element) = editor {
        if let Some(rect) = app.scroll.project(&app.grid.to_cells(&element.bbox), inner) {
            f.render_widget(Clear, rect);
            f.render_widget(
                Paragraph::new(element_text(&element.body))
                    .style(Style::default().fg(Color::Black).bg(Color::Yellow))
                    .wrap(Wrap { trim: false }),
                rect,
            );
        }
    }
}

fn element_text(body: &ElementBody) -> Text<'static> {
    match body {
        ElementBody::Static(content) => Text::from(content.clone()),
        ElementBody::Highlighted(runs) => Text::from(runs_to_lines(runs)),
        ElementBody::Editor { text, cursor } => Text::from(editor_lines(text, *cursor)),
    }
}

fn run_style(kind: RunKind) -> Style {
    match kind {
        RunKind::Plain => Style::default(),
        RunKind::Match => Style::default().fg(Color::Black).bg(Color::Yellow),
        RunKind::Current => Style::default()
            .fg(Color::White)
            .bg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    }
}

/// Úseky textu → řádky; úsek může obsahovat `\n`.
fn runs_to_lines(runs: &[TextRun]) -> Vec<Line<'static>> {
    let mut lines = vec![Line::default()];
    for run in runs {
        let style = run_style(run.kind);
        for (i, part) in run.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::default());
            }
            if part.is_empty() {
                continue;
            }
            if let Some(line) = lines.last_mut() {
                line.spans.push(Span::styled(part.to_string(), style));
            }
        }
    }
    lines
}

/// Text editační plochy s kurzorem (inverzní znak, na konci mezera).
fn editor_lines(text: &str, cursor: usize) -> Vec<Line<'static>> {
    let cursor_style = Style::default().add_modifier(Modifier::REVERSED);
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut buf = String::new();

    for (i, c) in text.chars().enumerate() {
        if i == cursor {
            if !buf.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut buf)));
            }
            let shown = if c == '\n' { ' ' } else { c };
            spans.push(Span::styled(shown.to_string(), cursor_style));
            if c != '\n' {
                continue;
            }
        }
        if c == '\n' {
            if !buf.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut buf)));
            }
            lines.push(Line::from(std::mem::take(&mut spans)));
        } else {
            buf.push(c);
        }
    }
    if !buf.is_empty() {
        spans.push(Span::raw(buf));
    }
    if cursor >= text.chars().count() {
        spans.push(Span::styled(" ", cursor_style));
    }
    lines.push(Line::from(spans));
    lines
}

fn mode_label(mode: UiMode) -> &'static str {
    match mode {
        UiMode::Login => "PŘIHLÁŠENÍ",
        UiMode::Upload => "NAHRÁNÍ",
        UiMode::Viewer => "PROHLÍŽENÍ",
        UiMode::Editing => "EDITACE",
        UiMode::Search => "HLEDÁNÍ",
        UiMode::ConfirmReturn => "ZPĚT?",
        UiMode::Notice => "UPOZORNĚNÍ",
    }
}

fn mode_hint(mode: UiMode) -> &'static str {
    match mode {
        UiMode::Login => "Enter: přihlásit, Esc: konec",
        UiMode::Upload => "Enter: otevřít dokument, Esc: odhlásit",
        UiMode::Viewer => {
            "Tab/Shift+Tab: region  Enter/klik: editovat  /: hledat  n/N: další/předchozí  \
             s: TXT  j: JSON  p: PDF  b: zpět  L: odhlásit  q: konec"
        }
        UiMode::Editing => {
            "Enter: uložit  Shift/Alt+Enter: nový řádek  Esc: zrušit  Tab/klik mimo: uložit"
        }
        UiMode::Search => "Enter/F3: další  Shift+F3: předchozí  Esc: zavřít hledání",
        UiMode::ConfirmReturn => "y: ano, n: ne",
        UiMode::Notice => "libovolná klávesa: zavřít",
    }
}

fn render_overlay_ui(f: &mut Frame<'_>, app: &App) {
    match app.mode {
        UiMode::Login | UiMode::Upload => {
            let area = centered_rect(60, 25, f.size());
            f.render_widget(Clear, area);

            let background_block = Block::default()
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Black));
            f.render_widget(background_block, area);

            let inner_area = canvas_inner(area);

            let (title, prompt, shown) = if app.mode == UiMode::Login {
                (
                    " Přihlášení ",
                    "Zadejte přístupový token:",
                    "*".repeat(app.input_buffer.chars().count()),
                )
            } else {
                (
                    " Nahrát dokument ",
                    "Cesta k obrázku (Tesseract) nebo k uložené JSON odpovědi extrakce:",
                    app.input_buffer.clone(),
                )
            };

            let edit_block = Block::default()
                .title(Span::styled(
                    title,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::NONE);

            let edit_text = vec![
                Line::from(prompt),
                Line::from(""),
                Line::from(vec![
                    Span::raw("> "),
                    Span::styled(shown, Style::default().fg(Color::White)),
                    Span::styled("_", Style::default().fg(Color::Yellow)),
                ]),
                Line::from(""),
                Line::from(mode_hint(app.mode)),
            ];

            let edit_paragraph = Paragraph::new(edit_text)
                .block(edit_block)
                .alignment(Alignment::Left)
                .wrap(Wrap { trim: false });

            f.render_widget(edit_paragraph, inner_area);
        }
        UiMode::ConfirmReturn => {
            let area = centered_rect(50, 20, f.size());
            f.render_widget(Clear, area);

            let block = Block::default()
                .title(Span::styled(
                    " Zpět k nahrání ",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Black));

            let text = vec![
                Line::from("Vrátit se k nahrání dokumentu?"),
                Line::from("Neuložené změny budou ztraceny."),
                Line::from(""),
                Line::from(mode_hint(app.mode)),
            ];
            f.render_widget(
                Paragraph::new(text)
                    .block(block)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: false }),
                area,
            );
        }
        UiMode::Notice => {
            let area = centered_rect(60, 20, f.size());
            f.render_widget(Clear, area);

            let block = Block::default()
                .title(Span::styled(
                    " Upozornění ",
                    Style::default()
                        .fg(Color::Red)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Black));

            let text = vec![
                Line::from(app.notice.clone()),
                Line::from(""),
                Line::from(Span::styled(
                    mode_hint(app.mode),
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            f.render_widget(
                Paragraph::new(text)
                    .block(block)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: false }),
                area,
            );
        }
        UiMode::Viewer | UiMode::Editing | UiMode::Search => {}
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
