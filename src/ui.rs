use crate::model::{month_matrix, week_days, MonthCell};
use crate::panel::{CalendarPanel, PanelEvent, View};
use crate::storage::CalendarConfig;
use crate::sync::Mode;
use crate::viewport::PageHost;
use anyhow::Result;
use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const FRAME: Duration = Duration::from_millis(50);
const DRAG_RELEASE_AFTER: Duration = Duration::from_millis(400);
/// Rows the calendar collapses by when going from month grid to week strip.
const DRAG_TRAVEL: f32 = 5.0;

pub fn run(config: CalendarConfig, selected: NaiveDate) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = App::new(&config, selected).and_then(|mut app| app.event_loop(&mut terminal));
    teardown_terminal(&mut terminal)?;
    result
}

/// Paged list standing in for the horizontal swiper of one view.
#[derive(Debug)]
struct TermPager {
    position: usize,
    size: usize,
    scroll_enabled: bool,
    moved: bool,
    settling: bool,
}

impl TermPager {
    fn new(size: usize) -> Self {
        TermPager {
            position: size / 2,
            size,
            scroll_enabled: true,
            moved: false,
            settling: false,
        }
    }

    fn swipe(&mut self, delta: isize) -> bool {
        if !self.scroll_enabled {
            return false;
        }
        let next = self.position as isize + delta;
        if next < 0 || next >= self.size as isize {
            return false;
        }
        self.position = next as usize;
        self.moved = true;
        self.settling = true;
        true
    }
}

impl PageHost for TermPager {
    fn scroll_to_index(&mut self, index: usize, animated: bool) {
        self.position = index;
        if animated {
            self.settling = true;
        }
    }

    fn set_scroll_enabled(&mut self, enabled: bool) {
        self.scroll_enabled = enabled;
    }
}

struct Drag {
    translation: f32,
    last_step: Instant,
}

struct App {
    panel: CalendarPanel<TermPager>,
    status: String,
    drag: Option<Drag>,
}

impl App {
    fn new(config: &CalendarConfig, selected: NaiveDate) -> Result<Self> {
        let panel = CalendarPanel::new(
            config,
            selected,
            TermPager::new(config.month_window),
            TermPager::new(config.week_window),
        )?;
        Ok(App {
            panel,
            status: format!("Selected {}", selected.format("%Y-%m-%d")),
            drag: None,
        })
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(FRAME)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key) {
                        break;
                    }
                }
            }
            self.tick(Instant::now());
        }
        Ok(())
    }

    /// One animation frame: finish teleports, then deliver what the pagers did.
    fn tick(&mut self, now: Instant) {
        let events = self.panel.on_frame(now);
        self.apply(events);
        for view in [View::Month, View::Week] {
            let pager = self.panel.host_mut(view);
            let moved = std::mem::take(&mut pager.moved).then_some(pager.position);
            let settled = std::mem::take(&mut pager.settling);
            if let Some(index) = moved {
                let events = self.panel.on_viewable(view, index, now);
                self.apply(events);
            }
            if settled {
                self.panel.on_settled(view, now);
            }
        }
        if let Some(drag) = &self.drag {
            if now.duration_since(drag.last_step) >= DRAG_RELEASE_AFTER {
                self.drag = None;
                let events = self.panel.release_drag(0.0, now);
                self.apply(events);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let now = Instant::now();
        let events = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('h') => {
                self.swipe(-1);
                Vec::new()
            }
            KeyCode::Char('l') => {
                self.swipe(1);
                Vec::new()
            }
            KeyCode::Char('[') => self.panel.go_to_previous(now),
            KeyCode::Char(']') => self.panel.go_to_next(now),
            KeyCode::Char('t') => self.panel.go_to_today(true, now),
            KeyCode::Left => self.shift_cursor(-1, now),
            KeyCode::Right => self.shift_cursor(1, now),
            KeyCode::Up => self.shift_cursor(-7, now),
            KeyCode::Down => self.shift_cursor(7, now),
            KeyCode::Char('v') | KeyCode::Tab => {
                let mode = self.panel.mode().toggled();
                self.panel.switch_mode(mode, now)
            }
            KeyCode::Char('K') => self.drag_step(-1.0, now),
            KeyCode::Char('J') => self.drag_step(1.0, now),
            _ => Vec::new(),
        };
        self.apply(events);
        false
    }

    fn swipe(&mut self, delta: isize) {
        let view = match self.panel.mode() {
            Mode::Month => View::Month,
            Mode::Week => View::Week,
        };
        if !self.panel.host_mut(view).swipe(delta) {
            self.status = "Swipe ignored while the calendar re-centers".to_string();
        }
    }

    fn shift_cursor(&mut self, days: i64, now: Instant) -> Vec<PanelEvent> {
        match self
            .panel
            .cursor()
            .checked_add_signed(ChronoDuration::days(days))
        {
            Some(date) => self.panel.select_date(date, now),
            None => Vec::new(),
        }
    }

    fn drag_step(&mut self, rows: f32, now: Instant) -> Vec<PanelEvent> {
        if self.drag.is_none() {
            self.panel.begin_drag();
        }
        let drag = self.drag.get_or_insert(Drag {
            translation: 0.0,
            last_step: now,
        });
        drag.translation += rows;
        drag.last_step = now;
        let translation = drag.translation;
        self.panel.update_drag(translation, DRAG_TRAVEL);
        Vec::new()
    }

    fn apply(&mut self, events: Vec<PanelEvent>) {
        for event in events {
            self.status = match event {
                PanelEvent::DateSelected(date) => format!("Selected {}", date.format("%A, %Y-%m-%d")),
                PanelEvent::ModeChanged(mode) => format!("Switched to {} view", mode.label()),
            };
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        self.draw_calendar(f, layout[1]);
        self.draw_footer(f, layout[2]);
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let cursor = self.panel.cursor();
        let title = Line::from(vec![
            Span::styled(
                "swipecal ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{} {}", cursor.format("%B"), cursor.year()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("view {}", self.panel.mode().label()),
                Style::default().fg(Color::Magenta),
            ),
            Span::raw("  •  "),
            Span::styled(
                progress_bar(self.panel.drag_progress()),
                Style::default().fg(Color::Gray),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let cursor = self.panel.cursor();
        let today = Local::now().date_naive();
        let mut lines = Vec::new();
        let header_spans: Vec<Span<'static>> = self
            .panel
            .week_start()
            .labels()
            .iter()
            .map(|h| Span::styled(format!("{:^6}", h), Style::default().fg(Color::Gray)))
            .collect();
        lines.push(Line::from(header_spans));

        let (title, rows) = match self.panel.mode() {
            Mode::Month => {
                let month = self.panel.month().current_unit();
                let cells = month_matrix(month, self.panel.week_start()).to_vec();
                (month.format("%B %Y").to_string(), cells)
            }
            Mode::Week => {
                let week = self.panel.week().current_unit();
                let cells = week_days(week)
                    .into_iter()
                    .map(|date| MonthCell {
                        date,
                        in_month: true,
                    })
                    .collect::<Vec<_>>();
                (format!("Week of {}", week.format("%Y-%m-%d")), cells)
            }
        };
        for row in rows.chunks(7) {
            let spans: Vec<Span<'static>> = row
                .iter()
                .map(|cell| day_span(cell, cursor, today))
                .collect();
            lines.push(Line::from(spans));
        }

        let block = Block::default()
            .title(Span::styled(
                title,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let detail = Paragraph::new(self.window_line())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title("window"),
            );
        f.render_widget(detail, bottom[1]);
    }

    fn window_line(&self) -> Line<'static> {
        let month = self.panel.month();
        let week = self.panel.week();
        Line::from(vec![
            Span::styled("month ", Style::default().fg(Color::Gray)),
            Span::raw(format!(
                "#{} base {:+}{}  ",
                month.index(),
                month.mapper().base_offset(),
                if month.is_teleporting() { " ⇢" } else { "" }
            )),
            Span::styled("week ", Style::default().fg(Color::Gray)),
            Span::raw(format!(
                "#{} base {:+}{}  ",
                week.index(),
                week.mapper().base_offset(),
                if week.is_teleporting() { " ⇢" } else { "" }
            )),
        ])
    }
}

fn help_line() -> Line<'static> {
    Line::from(vec![
        Span::styled("h l", Style::default().fg(Color::LightCyan)),
        Span::raw(" swipe  "),
        Span::styled("[ ]", Style::default().fg(Color::LightGreen)),
        Span::raw(" prev/next  "),
        Span::styled("←↑↓→", Style::default().fg(Color::LightCyan)),
        Span::raw(" select  "),
        Span::styled("t", Style::default().fg(Color::LightYellow)),
        Span::raw(" today  "),
        Span::styled("v", Style::default().fg(Color::LightMagenta)),
        Span::raw(" month/week  "),
        Span::styled("K J", Style::default().fg(Color::LightMagenta)),
        Span::raw(" drag  "),
        Span::styled("q", Style::default().fg(Color::LightRed)),
        Span::raw(" quit"),
    ])
}

fn day_span(cell: &MonthCell, cursor: NaiveDate, today: NaiveDate) -> Span<'static> {
    let text = format!("{:^6}", cell.date.day());
    let mut style = Style::default().fg(if cell.in_month {
        Color::White
    } else {
        Color::DarkGray
    });
    if cell.date == today {
        style = style.fg(Color::LightYellow).add_modifier(Modifier::UNDERLINED);
    }
    if cell.date == cursor {
        style = style
            .bg(Color::Cyan)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD);
    }
    Span::styled(text, style)
}

fn progress_bar(progress: f32) -> String {
    let filled = (progress.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("▕{}{}▏", "█".repeat(filled), "·".repeat(10 - filled))
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
