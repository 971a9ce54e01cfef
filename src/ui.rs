use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use unit_converter::{
    Category, CommentStore, ConversionEngine, ConversionRequest, HistoryLog, HISTORY_CAPACITY,
};

const ACCENT: Color = Color::Cyan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    FromUnit,
    ToUnit,
    Value,
    CommentName,
    CommentText,
    Comments,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::FromUnit => Focus::ToUnit,
            Focus::ToUnit => Focus::Value,
            Focus::Value => Focus::CommentName,
            Focus::CommentName => Focus::CommentText,
            Focus::CommentText => Focus::Comments,
            Focus::Comments => Focus::FromUnit,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Focus::FromUnit => Focus::Comments,
            Focus::ToUnit => Focus::FromUnit,
            Focus::Value => Focus::ToUnit,
            Focus::CommentName => Focus::Value,
            Focus::CommentText => Focus::CommentName,
            Focus::Comments => Focus::CommentText,
        }
    }

    pub fn is_text_input(&self) -> bool {
        matches!(self, Focus::Value | Focus::CommentName | Focus::CommentText)
    }
}

/// Per-tab widget state: each category remembers its own selection and input
#[derive(Debug, Clone, Default)]
pub struct TabState {
    pub from: usize,
    pub to: usize,
    pub value: String,
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

pub struct App {
    pub category_index: usize,
    pub tabs: Vec<TabState>,
    pub focus: Focus,
    pub history: HistoryLog,
    pub store: CommentStore,
    pub name_input: String,
    pub comment_input: String,
    pub comments_state: ListState,
    pub status: Option<Status>,
}

impl App {
    pub fn new(store: CommentStore) -> Self {
        let mut comments_state = ListState::default();
        if !store.is_empty() {
            comments_state.select(Some(0));
        }

        Self {
            category_index: 0,
            tabs: vec![TabState::default(); Category::ALL.len()],
            focus: Focus::FromUnit,
            history: HistoryLog::new(),
            store,
            name_input: String::new(),
            comment_input: String::new(),
            comments_state,
            status: None,
        }
    }

    pub fn category(&self) -> Category {
        Category::ALL[self.category_index]
    }

    pub fn tab(&self) -> &TabState {
        &self.tabs[self.category_index]
    }

    fn tab_mut(&mut self) -> &mut TabState {
        &mut self.tabs[self.category_index]
    }

    pub fn next_category(&mut self) {
        self.category_index = (self.category_index + 1) % Category::ALL.len();
    }

    pub fn previous_category(&mut self) {
        let len = Category::ALL.len();
        self.category_index = (self.category_index + len - 1) % len;
    }

    pub fn from_unit(&self) -> &'static str {
        self.category().units()[self.tab().from].name
    }

    pub fn to_unit(&self) -> &'static str {
        self.category().units()[self.tab().to].name
    }

    /// Move the focused unit selector (wraps around)
    pub fn move_unit(&mut self, delta: isize) {
        let len = self.category().units().len() as isize;
        let focus = self.focus;
        let tab = self.tab_mut();
        let slot = match focus {
            Focus::FromUnit => &mut tab.from,
            Focus::ToUnit => &mut tab.to,
            _ => return,
        };
        *slot = ((*slot as isize + delta).rem_euclid(len)) as usize;
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            Focus::Value if c.is_ascii_digit() || (c == '.' && !self.tab().value.contains('.')) => {
                self.tab_mut().value.push(c)
            }
            Focus::CommentName => self.name_input.push(c),
            Focus::CommentText => self.comment_input.push(c),
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            Focus::Value => {
                self.tab_mut().value.pop();
            }
            Focus::CommentName => {
                self.name_input.pop();
            }
            Focus::CommentText => {
                self.comment_input.pop();
            }
            _ => {}
        }
    }

    /// Convert the current tab's input and record it in the history
    pub fn submit_conversion(&mut self) {
        let raw = self.tab().value.trim().to_string();
        let value = match raw.parse::<f64>() {
            Ok(value) => value,
            Err(_) => {
                self.status = Some(Status::Error(format!("Enter a number in {}", self.from_unit())));
                return;
            }
        };

        let request = ConversionRequest::new(self.category(), value, self.from_unit(), self.to_unit());
        match ConversionEngine::run(&request) {
            Ok(record) => {
                self.history.record(&record);
                self.tab_mut().result = Some(record.formatted);
                self.status = None;
            }
            Err(err) => self.status = Some(Status::Error(err.to_string())),
        }
    }

    pub fn submit_comment(&mut self) {
        match self.store.add(&self.name_input, &self.comment_input) {
            Ok(_) => {
                self.name_input.clear();
                self.comment_input.clear();
                self.comments_state.select(Some(self.store.len() - 1));
                self.status = Some(Status::Info("Comment added!".to_string()));
            }
            Err(err) => self.status = Some(Status::Error(err.to_string())),
        }
    }

    pub fn delete_selected_comment(&mut self) {
        let Some(index) = self.comments_state.selected() else {
            return;
        };

        match self.store.remove(index) {
            Ok(_) => {
                let selected = if self.store.is_empty() {
                    None
                } else {
                    Some(index.min(self.store.len() - 1))
                };
                self.comments_state.select(selected);
                self.status = Some(Status::Info(format!("Comment {} deleted", index + 1)));
            }
            Err(err) => self.status = Some(Status::Error(err.to_string())),
        }
    }

    pub fn next_comment(&mut self) {
        let len = self.store.len();
        if len == 0 {
            return;
        }
        let i = match self.comments_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.comments_state.select(Some(i));
    }

    pub fn previous_comment(&mut self) {
        let len = self.store.len();
        if len == 0 {
            return;
        }
        let i = match self.comments_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.comments_state.select(Some(i));
    }

    /// Apply one key press; returns false when the app should exit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('q') if !self.focus.is_text_input() => return false,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Left if !self.focus.is_text_input() || self.focus == Focus::Value => {
                self.previous_category()
            }
            KeyCode::Right if !self.focus.is_text_input() || self.focus == Focus::Value => {
                self.next_category()
            }
            KeyCode::Up => match self.focus {
                Focus::Comments => self.previous_comment(),
                _ => self.move_unit(-1),
            },
            KeyCode::Down => match self.focus {
                Focus::Comments => self.next_comment(),
                _ => self.move_unit(1),
            },
            KeyCode::Enter => match self.focus {
                Focus::FromUnit | Focus::ToUnit | Focus::Value => self.submit_conversion(),
                Focus::CommentName => self.focus = Focus::CommentText,
                Focus::CommentText => self.submit_comment(),
                Focus::Comments => {}
            },
            KeyCode::Delete | KeyCode::Char('d') if self.focus == Focus::Comments => {
                self.delete_selected_comment()
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(c) => self.push_char(c),
            _ => {}
        }
        true
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Converter + sidebar
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    let title = Paragraph::new(Line::from(Span::styled(
        "🔥 Ultimate Unit Converter",
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(ACCENT)));
    f.render_widget(title, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    render_converter(f, body[0], app);
    render_sidebar(f, body[1], app);
    render_status_bar(f, chunks[2], app);
}

fn focus_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_converter(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Category tabs
            Constraint::Min(6),    // Unit selectors
            Constraint::Length(3), // Value input
            Constraint::Length(3), // Result box
        ])
        .split(area);

    let titles: Vec<Line> = Category::ALL.iter().map(|c| Line::from(c.label())).collect();
    let tabs = Tabs::new(titles)
        .select(app.category_index)
        .block(Block::default().borders(Borders::ALL).title(" Category (←/→) "))
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD | Modifier::UNDERLINED));
    f.render_widget(tabs, chunks[0]);

    let selectors = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_unit_list(f, selectors[0], app, Focus::FromUnit, " From Unit ", app.tab().from);
    render_unit_list(f, selectors[1], app, Focus::ToUnit, " To Unit ", app.tab().to);

    let value = Paragraph::new(app.tab().value.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(app, Focus::Value))
            .title(format!(" Enter Value in {} ", app.from_unit())),
    );
    f.render_widget(value, chunks[2]);

    let result_text = app.tab().result.as_deref().unwrap_or("Press Enter to convert");
    let result = Paragraph::new(Span::styled(
        result_text,
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(ACCENT)));
    f.render_widget(result, chunks[3]);
}

fn render_unit_list(f: &mut Frame, area: Rect, app: &App, focus: Focus, title: &str, selected: usize) {
    let items: Vec<ListItem> = app
        .category()
        .units()
        .iter()
        .map(|u| ListItem::new(u.name))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(app, focus))
                .title(title.to_string()),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    let mut state = ListState::default();
    state.select(Some(selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_sidebar(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HISTORY_CAPACITY as u16 + 2),       // History
            Constraint::Length(3),                                 // Name
            Constraint::Length(3),                                 // Comment
            Constraint::Min(3),                                    // Recent comments
        ])
        .split(area);

    let history_lines: Vec<Line> = if app.history.is_empty() {
        vec![Line::from(Span::styled("No history yet.", Style::default().fg(Color::DarkGray)))]
    } else {
        app.history.iter().map(|entry| Line::from(entry.as_str())).collect()
    };
    let history = Paragraph::new(history_lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" 🕒 Conversion History "));
    f.render_widget(history, chunks[0]);

    let name = Paragraph::new(app.name_input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(app, Focus::CommentName))
            .title(" Your Name "),
    );
    f.render_widget(name, chunks[1]);

    let comment = Paragraph::new(app.comment_input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(focus_style(app, Focus::CommentText))
            .title(" Leave a comment (Enter submits) "),
    );
    f.render_widget(comment, chunks[2]);

    let items: Vec<ListItem> = app
        .store
        .comments()
        .iter()
        .enumerate()
        .map(|(i, c)| ListItem::new(format!("{}. {}", i + 1, c)))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(app, Focus::Comments))
                .title(" 💬 Recent Comments (d deletes) "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("→ ");
    f.render_stateful_widget(list, chunks[3], &mut app.comments_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = match &app.status {
        Some(Status::Info(message)) => vec![Span::styled(format!(" {} ", message), Style::default().fg(Color::Green))],
        Some(Status::Error(message)) => vec![Span::styled(format!(" {} ", message), Style::default().fg(Color::Red))],
        None => vec![],
    };

    if !spans.is_empty() {
        spans.push(Span::raw(" | "));
    }
    spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Focus | "));
    spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Select | "));
    spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Convert/Submit | "));
    spans.push(Span::styled("Esc", Style::default().fg(Color::Yellow)));
    spans.push(Span::raw(" Quit"));

    let status = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}
