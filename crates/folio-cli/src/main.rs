use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use folio_config::{Config, MergePolicyKind};
use folio_engine::document::{DescriptorsLookup, Document, SerializeNode};
use folio_engine::editing::{
    ActionStack, CommandRegistry, EditorContext, InsertTextCommand, MergePolicy, NeverMerge, StandardMergePolicy,
    run,
};
use folio_engine::view::MonospaceViews;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    env,
    fs::File,
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
};

mod render;

struct App {
    path: Option<PathBuf>,
    ctx: EditorContext,
    stack: ActionStack,
    registry: CommandRegistry,
    wrap_width: usize,
    status: String,
    dirty: bool,
}

impl App {
    fn new(path: Option<PathBuf>, config: &Config) -> Result<Self> {
        let document = match &path {
            Some(path) if path.exists() => load_document(path)?,
            _ => Document::new(),
        };
        let policy: Box<dyn MergePolicy> = match config.history.merge_policy {
            MergePolicyKind::Standard => Box::new(StandardMergePolicy),
            MergePolicyKind::Never => Box::new(NeverMerge),
        };
        let wrap_width = config.editor.wrap_width.max(1);
        let status = match &path {
            Some(path) => format!("Editing {}", path.display()),
            None => "New document (no file; Ctrl-s disabled)".to_string(),
        };

        Ok(Self {
            path,
            ctx: EditorContext::new(document).with_views(MonospaceViews::new(wrap_width)),
            stack: ActionStack::with_settings(policy, config.history.max_depth),
            registry: CommandRegistry::standard(),
            wrap_width,
            status,
            dirty: false,
        })
    }

    fn execute(&mut self, id: &str) {
        match self.registry.execute(id, &mut self.ctx, &mut self.stack) {
            Ok(changed) => {
                if changed && !id.starts_with("move-") && !id.starts_with("extend-") {
                    self.dirty = true;
                }
            }
            Err(e) => {
                log::warn!("command {id} failed: {e}");
                self.status = format!("{id}: {e}");
            }
        }
    }

    fn insert(&mut self, ch: char) {
        match run(&InsertTextCommand::new(ch), &mut self.ctx, &mut self.stack) {
            Ok(changed) => self.dirty |= changed,
            Err(e) => {
                log::warn!("insert failed: {e}");
                self.status = format!("insert-text: {e}");
            }
        }
    }

    fn save(&mut self) {
        let Some(path) = self.path.clone() else {
            self.status = "No file to save to; pass a path on the command line".to_string();
            return;
        };
        match save_document(&path, &self.ctx.document) {
            Ok(()) => {
                self.dirty = false;
                self.status = format!("Saved {}", path.display());
            }
            Err(e) => self.status = format!("Save failed: {e:#}"),
        }
    }

    /// Maps a key press to a command. Returns `false` when the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('q') if ctrl => return false,
            KeyCode::Char('s') if ctrl => self.save(),
            KeyCode::Char('z') if ctrl => self.execute("undo"),
            KeyCode::Char('y') if ctrl => self.execute("redo"),
            KeyCode::Char('b') if ctrl => self.execute("toggle-bold"),
            KeyCode::Char('0') if alt => self.execute("set-paragraph"),
            KeyCode::Char(digit @ '1'..='6') if alt => {
                let id = format!("set-heading-{digit}");
                self.execute(&id);
            }
            KeyCode::Char(ch) if !ctrl && !alt => self.insert(ch),
            KeyCode::Enter => self.execute("break-block"),
            KeyCode::Backspace => self.execute("delete-backward"),
            KeyCode::Delete => self.execute("delete-forward"),
            KeyCode::Left if shift => self.execute("extend-left"),
            KeyCode::Right if shift => self.execute("extend-right"),
            KeyCode::Left => self.execute("move-left"),
            KeyCode::Right => self.execute("move-right"),
            KeyCode::Home => self.execute("move-line-start"),
            KeyCode::End => self.execute("move-line-end"),
            _ => {}
        }
        true
    }
}

fn load_document(path: &Path) -> Result<Document> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let node: SerializeNode =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    let document = Document::deserialize(&node, &DescriptorsLookup::standard())
        .with_context(|| format!("loading blocks from {}", path.display()))?;
    Ok(document)
}

fn save_document(path: &Path, document: &Document) -> Result<()> {
    let content = serde_json::to_string_pretty(&document.serialize())?;
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn init_logging() -> Result<()> {
    // The terminal belongs to the UI, so logs go to a file.
    let log_path = env::temp_dir().join("folio.log");
    let file = File::create(&log_path)?;
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    let args: Vec<String> = env::args().collect();
    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let path = match args.len() {
        2 => Some(PathBuf::from(&args[1])),
        1 => config.editor.default_document.clone(),
        _ => {
            eprintln!("Usage: {} [document.json]", args[0]);
            process::exit(1);
        }
    };
    log::info!("Config path: {}", Config::config_path().display());

    let mut app = match App::new(path, &config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !app.handle_key(key)
        {
            return Ok(());
        }
    }
}

fn to_ratatui_style(segment: &render::Segment, heading: bool) -> Style {
    let mut style = Style::default();
    if segment.style.bold || heading {
        style = style.add_modifier(Modifier::BOLD);
    }
    if segment.style.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if segment.style.underline {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if segment.style.code {
        style = style.fg(Color::Cyan);
    }
    if segment.selected {
        style = style.bg(Color::Yellow).fg(Color::Black);
    }
    style
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(f.area());

    let layout = render::layout_document(&app.ctx, app.wrap_width);
    let lines: Vec<Line> = layout
        .lines
        .iter()
        .map(|line| {
            let mut spans = vec![Span::styled(line.prefix.clone(), Style::default().fg(Color::DarkGray))];
            spans.extend(
                line.segments
                    .iter()
                    .map(|segment| Span::styled(segment.text.clone(), to_ratatui_style(segment, line.heading))),
            );
            Line::from(spans)
        })
        .collect();

    // Keep the caret row visible
    let inner_height = chunks[0].height.saturating_sub(2) as usize;
    let scroll = layout
        .cursor
        .map(|(_, row)| row.saturating_sub(inner_height.saturating_sub(1)))
        .unwrap_or(0);

    let title = match &app.path {
        Some(path) => format!("{}{}", path.display(), if app.dirty { " *" } else { "" }),
        None => "untitled".to_string(),
    };
    let content = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((scroll as u16, 0));
    f.render_widget(content, chunks[0]);

    if let Some((column, row)) = layout.cursor {
        let area = chunks[0];
        f.set_cursor_position(Position::new(
            area.x + 1 + column as u16,
            area.y + 1 + (row - scroll) as u16,
        ));
    }

    let status = Paragraph::new(Line::from(vec![
        Span::raw(app.status.clone()),
        Span::raw(format!(
            " | undo {} redo {}",
            app.stack.undo_depth(),
            app.stack.redo_depth()
        )),
    ]));
    f.render_widget(status, chunks[1]);

    let help_text = Line::from(vec![
        Span::raw("Esc: Quit | "),
        Span::raw("Ctrl-s: Save | "),
        Span::raw("Ctrl-z/y: Undo/Redo | "),
        Span::raw("Ctrl-b: Bold | "),
        Span::raw("Alt-1..6/0: Heading/Paragraph"),
    ]);
    f.render_widget(Paragraph::new(vec![help_text]), chunks[2]);
}
