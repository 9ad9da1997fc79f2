use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{Badge, JobDescription, JobSummary, MergedCandidate, ParseResponse};
use crate::state::{DetailState, FormField, ListingState, NewJobForm, Screen};

const MAX_SKILLS: usize = 10;
const MAX_REPOS: usize = 3;

enum Msg {
    Jobs(ApiResult<Vec<JobSummary>>),
    Parsed(ApiResult<ParseResponse>),
    Job(ApiResult<JobDescription>),
    Searched(ApiResult<JobDescription>),
    Ranked(ApiResult<JobDescription>),
}

/// A worker's result, stamped with the screen generation that asked for it.
struct Envelope {
    generation: u64,
    msg: Msg,
}

#[derive(PartialEq)]
enum Flow {
    Continue,
    Quit,
}

struct App {
    client: ApiClient,
    screen: Screen,
    listing: ListingState,
    detail: Option<DetailState>,
    // Bumped on every navigation; replies for older generations are dropped
    generation: u64,
    tx: Sender<Envelope>,
    rx: Receiver<Envelope>,
}

impl App {
    fn new(client: ApiClient) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client,
            screen: Screen::Listing,
            listing: ListingState::new(),
            detail: None,
            generation: 0,
            tx,
            rx,
        }
    }

    fn spawn<F>(&self, request: F)
    where
        F: FnOnce(&ApiClient) -> Msg + Send + 'static,
    {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let generation = self.generation;
        thread::spawn(move || {
            let msg = request(&client);
            // Receiver is gone once the app quits
            let _ = tx.send(Envelope { generation, msg });
        });
    }

    fn refresh_listing(&mut self) {
        if self.listing.begin_refresh() {
            self.spawn(|c| Msg::Jobs(c.list_jobs()));
        }
    }

    fn open_detail(&mut self, job_id: String) {
        info!(job_id = %job_id, "opening job");
        self.generation += 1;
        self.screen = Screen::Detail(job_id.clone());
        let mut detail = DetailState::new(job_id.clone());
        detail.begin_load();
        self.detail = Some(detail);
        self.spawn(move |c| Msg::Job(c.get_job(&job_id)));
    }

    fn back_to_listing(&mut self) {
        self.generation += 1;
        self.screen = Screen::Listing;
        self.detail = None;
        // Any refresh in flight belonged to the old generation
        self.listing.loading = false;
        self.refresh_listing();
    }

    fn drain(&mut self) {
        while let Ok(Envelope { generation, msg }) = self.rx.try_recv() {
            if generation != self.generation {
                debug!(generation, current = self.generation, "dropping stale response");
                continue;
            }
            match msg {
                Msg::Jobs(result) => self.listing.finish_refresh(result),
                Msg::Parsed(result) => self.listing.finish_submit(result, Instant::now()),
                Msg::Job(result) => {
                    if let Some(detail) = self.detail.as_mut() {
                        detail.finish_load(result);
                    }
                }
                Msg::Searched(result) => {
                    if let Some(detail) = self.detail.as_mut() {
                        detail.finish_fetch_candidates(result);
                    }
                }
                Msg::Ranked(result) => {
                    if let Some(detail) = self.detail.as_mut() {
                        detail.finish_rank_candidates(result);
                    }
                }
            }
        }
    }

    fn tick(&mut self) {
        if self.listing.tick(Instant::now()) {
            self.refresh_listing();
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        match self.screen {
            Screen::Listing if self.listing.dialog.is_some() => {
                self.handle_dialog_key(key);
                Flow::Continue
            }
            Screen::Listing => self.handle_listing_key(key),
            Screen::Detail(_) => self.handle_detail_key(key),
        }
    }

    fn handle_listing_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Down | KeyCode::Char('j') => self.listing.next(),
            KeyCode::Up | KeyCode::Char('k') => self.listing.prev(),
            KeyCode::Char('r') => self.refresh_listing(),
            KeyCode::Char('a') => self.listing.open_dialog(),
            KeyCode::Enter => {
                if let Some(job) = self.listing.selected_job() {
                    let job_id = job.job_id.clone();
                    self.open_detail(job_id);
                }
            }
            _ => {}
        }
        Flow::Continue
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            if let Some(body) = self.listing.begin_submit() {
                info!(title = %body.job_title, "submitting job description");
                self.spawn(move |c| Msg::Parsed(c.parse_job_description(&body)));
            }
            return;
        }

        let Some(form) = self.listing.dialog.as_mut() else { return };
        if form.submitting || form.closes_at.is_some() {
            if key.code == KeyCode::Esc {
                self.listing.close_dialog();
            }
            return;
        }
        match key.code {
            KeyCode::Esc => {
                self.listing.close_dialog();
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_focus(),
            KeyCode::Enter => match form.focus {
                FormField::Title => form.toggle_focus(),
                FormField::Description => form.description.push('\n'),
            },
            KeyCode::Backspace => {
                form.focused_mut().pop();
            }
            KeyCode::Char(c) => form.focused_mut().push(c),
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> Flow {
        let Some(detail) = self.detail.as_mut() else {
            self.back_to_listing();
            return Flow::Continue;
        };
        match key.code {
            KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Esc | KeyCode::Backspace => self.back_to_listing(),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::PageDown => detail.scroll_down(),
            KeyCode::Up | KeyCode::Char('k') | KeyCode::PageUp => detail.scroll_up(),
            KeyCode::Char('f') => {
                if detail.begin_fetch_candidates() {
                    let job_id = detail.job_id.clone();
                    info!(job_id = %job_id, "fetching candidates");
                    self.spawn(move |c| Msg::Searched(c.search_candidates(&job_id)));
                }
            }
            KeyCode::Char('R') => {
                if detail.begin_rank_candidates() {
                    let job_id = detail.job_id.clone();
                    info!(job_id = %job_id, "ranking candidates");
                    self.spawn(move |c| Msg::Ranked(c.rank_candidates(&job_id)));
                }
            }
            _ => {}
        }
        Flow::Continue
    }
}

pub fn run_browse(client: ApiClient) -> Result<()> {
    let mut app = App::new(client);
    app.refresh_listing();

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        list_state.select(if app.listing.jobs.is_empty() {
            None
        } else {
            Some(app.listing.selected)
        });
        terminal.draw(|frame| draw(frame, app, &mut list_state))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key) == Flow::Quit {
                    break;
                }
            }
        }

        app.drain();
        app.tick();
    }
    Ok(())
}

fn draw(frame: &mut Frame, app: &App, list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let help = match (&app.screen, &app.detail) {
        (Screen::Detail(job_id), Some(detail)) => {
            draw_detail(frame, job_id, detail, chunks[0]);
            " f:fetch candidates  R:rank candidates  j/k:scroll  esc:back  q:quit"
        }
        _ => {
            draw_listing(frame, &app.listing, list_state, chunks[0]);
            if let Some(form) = &app.listing.dialog {
                draw_dialog(frame, form);
                " tab:switch field  ctrl+s:parse & save  esc:cancel"
            } else {
                " j/k:navigate  enter:open  a:add JD  r:refresh  q:quit"
            }
        }
    };

    let help = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[1]);
}

fn draw_listing(frame: &mut Frame, listing: &ListingState, list_state: &mut ListState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let mut header = vec![Line::from(Span::styled(
        "Job Description Manager",
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if let Some(err) = &listing.error {
        header.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
    } else {
        header.push(Line::from(Span::styled(
            "Parse and manage job descriptions with candidate tracking.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let title = if listing.loading {
        " Job Listings (refreshing...) ".to_string()
    } else {
        " Job Listings ".to_string()
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if listing.jobs.is_empty() {
        let message = if listing.loading {
            "Loading job descriptions..."
        } else {
            "No job descriptions yet. Press 'a' to add one."
        };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, chunks[1]);
    } else {
        let items: Vec<ListItem> = listing.jobs.iter().map(job_row).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[1], list_state);
    }

    let refreshed = listing
        .last_refreshed
        .map(|t| format!("  |  Last refreshed: {}", t.format("%H:%M:%S")))
        .unwrap_or_default();
    let footer = Paragraph::new(format!(" Total Jobs: {}{}", listing.jobs.len(), refreshed));
    frame.render_widget(footer, chunks[2]);
}

fn job_row(job: &JobSummary) -> ListItem<'static> {
    let mut spans = vec![
        Span::raw(format!("{:<32} ", truncate(job.title(), 30))),
        Span::styled(
            format!("{:<15} ", short_id(&job.job_id)),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(format!("{:>4} candidates  ", job.candidate_count())),
    ];
    for badge in job.badges() {
        spans.push(badge_span(badge));
        spans.push(Span::raw(" "));
    }
    ListItem::new(Line::from(spans))
}

fn badge_span(badge: Badge) -> Span<'static> {
    let style = match (badge.on, badge.label) {
        (true, "Ranked") => Style::default().fg(Color::Blue),
        (true, _) => Style::default().fg(Color::Green),
        (false, _) => Style::default().fg(Color::DarkGray),
    };
    Span::styled(format!("[{}: {}]", badge.label, badge.text()), style)
}

fn draw_dialog(frame: &mut Frame, form: &NewJobForm) {
    let area = centered(frame.area(), 70, 60);
    frame.render_widget(Clear, area);

    let outer = Block::default()
        .borders(Borders::ALL)
        .title(" Parse Job Description ");
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(2)])
        .split(inner);

    let focused = Style::default().fg(Color::Yellow);
    let field_block = |label: &'static str, field: FormField| {
        let block = Block::default().borders(Borders::ALL).title(label);
        if form.focus == field { block.border_style(focused) } else { block }
    };

    let title = Paragraph::new(form.title.as_str()).block(field_block(" Job Title ", FormField::Title));
    frame.render_widget(title, chunks[0]);

    let description = Paragraph::new(form.description.as_str())
        .wrap(Wrap { trim: false })
        .block(field_block(" Job Description ", FormField::Description));
    frame.render_widget(description, chunks[1]);

    let status = if form.submitting {
        Line::from(Span::styled("Parsing...", Style::default().fg(Color::Yellow)))
    } else if let Some(err) = &form.error {
        Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red)))
    } else if let Some(msg) = &form.success {
        Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Green)))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(status).wrap(Wrap { trim: true }), chunks[2]);
}

fn draw_detail(frame: &mut Frame, job_id: &str, detail: &DetailState, area: Rect) {
    let body = Paragraph::new(Text::from(detail_lines(detail)))
        .block(Block::default().borders(Borders::ALL).title(format!(" Job {} ", short_id(job_id))))
        .wrap(Wrap { trim: false })
        .scroll((detail.scroll, 0));
    frame.render_widget(body, area);
}

fn detail_lines(detail: &DetailState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(Color::DarkGray);

    if let Some(err) = &detail.error {
        lines.push(Line::from(Span::styled(format!("Error: {}", err), Style::default().fg(Color::Red))));
        lines.push(Line::from(""));
    }

    let Some(job) = &detail.job else {
        if detail.loading {
            lines.push(Line::from(Span::styled("Loading job...", dim)));
        }
        return lines;
    };

    lines.push(Line::from(Span::styled(job.title().to_string(), bold)));
    lines.push(Line::from(Span::styled(job.company().to_string(), dim)));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Job Description", bold)));
    for line in job.description.as_deref().unwrap_or("").lines() {
        lines.push(Line::from(line.to_string()));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(vec![
        action_span(
            "f",
            if job.candidates_fetched { "Candidates Fetched" } else { "Fetch Candidates" },
            detail.can_fetch_candidates(),
            detail.fetching,
        ),
        Span::raw("   "),
        action_span(
            "R",
            if job.candidates_ranked { "Candidates Ranked" } else { "Rank Candidates" },
            detail.can_rank_candidates(),
            detail.ranking,
        ),
    ]));

    let candidates = detail.merged();
    if !candidates.is_empty() {
        let mut spans = Vec::new();
        for badge in job.badges().into_iter().filter(|b| b.on) {
            spans.push(badge_span(badge));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(detail.heading(), bold)));
    if let Some(summary) = job.summary.as_deref().filter(|s| !s.is_empty()) {
        lines.push(Line::from(Span::styled(summary.to_string(), dim)));
    }
    lines.push(Line::from(""));

    if let Some(activity) = detail.activity() {
        lines.push(Line::from(Span::styled(activity.message(), Style::default().fg(Color::Yellow))));
    } else if candidates.is_empty() {
        lines.push(Line::from(Span::styled(
            "No candidates found yet. Press 'f' to begin searching.",
            dim,
        )));
    } else {
        let show_rank = detail.is_ranked();
        for candidate in &candidates {
            lines.extend(candidate_lines(candidate, show_rank));
            lines.push(Line::from(""));
        }
    }

    lines
}

fn action_span(key: &str, label: &str, enabled: bool, busy: bool) -> Span<'static> {
    let text = if busy {
        format!("[{}] {}...", key, label)
    } else {
        format!("[{}] {}", key, label)
    };
    let style = if enabled {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(text, style)
}

fn candidate_lines(candidate: &MergedCandidate, show_rank: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let mut header = vec![Span::styled(
        candidate.display_name().to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if show_rank {
        if let Some(rank) = candidate.rank {
            header.push(Span::styled(format!("  Rank #{}", rank), Style::default().fg(Color::Blue)));
        }
    }
    lines.push(Line::from(header));
    lines.push(Line::from(Span::styled(
        candidate.bio_or_placeholder().to_string(),
        Style::default().fg(Color::DarkGray),
    )));

    let mut links = Vec::new();
    if let Some(url) = &candidate.github_url {
        links.push(format!("GitHub: {}", url));
    }
    if let Some(email) = &candidate.email {
        links.push(format!("Email: {}", email));
    }
    if !links.is_empty() {
        lines.push(Line::from(links.join("  ")));
    }

    if let Some(score) = candidate.score {
        lines.push(Line::from(format!("Score: {:.2}", score)));
    }
    if let Some(reasoning) = &candidate.reasoning {
        lines.push(Line::from(format!("Reasoning: {}", reasoning)));
    }
    if let Some(summary) = &candidate.summary {
        lines.push(Line::from(format!("Summary: {}", summary)));
    }

    if !candidate.skills.is_empty() {
        let skills: Vec<&str> = candidate.skills.iter().take(MAX_SKILLS).map(String::as_str).collect();
        lines.push(Line::from(format!("Skills: {}", skills.join(", "))));
    }

    if !candidate.top_repos.is_empty() {
        lines.push(Line::from("Top Repositories:"));
        for repo in candidate.top_repos.iter().take(MAX_REPOS) {
            let url = repo.url.as_deref().map(|u| format!(" ({})", u)).unwrap_or_default();
            lines.push(Line::from(format!("  - {}{} * {}", repo.name, url, repo.stars)));
        }
    }

    lines
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

pub fn short_id(id: &str) -> String {
    if id.chars().count() <= 12 {
        id.to_string()
    } else {
        format!("{}...", id.chars().take(12).collect::<String>())
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
