use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info, warn};
use ratatui::{prelude::*, widgets::*};
use simplelog::{Config, LevelFilter, WriteLogger};
use sneak::grid::Size as BoardSize;
use sneak::{Direction, Game, GameConfig, GameEvent, RenderState, SessionState};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

const LOG_FILE: &str = "sneak.log";
const FRAME_BUDGET: Duration = Duration::from_millis(16);
// Title bar plus the board's border.
const CHROME_ROWS: u16 = 3 + 2;
const CHROME_COLS: u16 = 2;

fn main() -> Result<(), io::Error> {
    // Set up logging before anything else
    WriteLogger::init(LevelFilter::Trace, Config::default(), File::create(LOG_FILE)?)
        .expect("Failed to initialize logger");

    let config = GameConfig::load();
    log::set_max_level(config.general.log_level);
    info!("Starting Sneak");

    let (cols, rows) = terminal::size()?;
    let mut app = match App::new(config, arena_size(cols, rows)) {
        Ok(app) => app,
        Err(e) => {
            error!("Could not set up the game: {}", e);
            eprintln!("sneak: {e}");
            return Err(io::Error::new(io::ErrorKind::InvalidInput, e));
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn arena_size(cols: u16, rows: u16) -> BoardSize {
    BoardSize::new(
        cols.saturating_sub(CHROME_COLS),
        rows.saturating_sub(CHROME_ROWS),
    )
}

struct App {
    game: Game,
    config: GameConfig,
    stored_high_score: u32,
    last_result: Option<(u32, u32)>,
    exit: bool,
}

impl App {
    fn new(config: GameConfig, available: BoardSize) -> sneak::Result<Self> {
        let stored_high_score = load_high_score(&config.general.high_score_file);
        let game = Game::new(config.settings(available))?.with_high_score(stored_high_score);
        Ok(App {
            game,
            config,
            stored_high_score,
            last_result: None,
            exit: false,
        })
    }

    fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        let clock = Instant::now();

        while !self.exit {
            let now = clock.elapsed().as_secs_f64() * 1000.0;
            let frame = self.game.frame(now);
            self.handle_events(&frame.events);

            terminal.draw(|f| self.render(f, &frame.render))?;

            if event::poll(FRAME_BUDGET)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_input(key),
                    Event::Resize(cols, rows) => self.handle_resize(cols, rows),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn handle_events(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::GameOver {
                    final_score,
                    high_score,
                    cause,
                } => {
                    info!("Round over ({:?}), final score {}", cause, final_score);
                    self.last_result = Some((*final_score, *high_score));
                    self.update_high_score(*high_score);
                }
                GameEvent::BoardSaturated => warn!("Board is full, no more food"),
                _ => {}
            }
        }
    }

    fn update_high_score(&mut self, score: u32) {
        if score > self.stored_high_score {
            self.stored_high_score = score;
            save_high_score(&self.config.general.high_score_file, score);
        }
    }

    fn handle_input(&mut self, key: event::KeyEvent) {
        use event::KeyCode;

        if key.code == KeyCode::Char('q') {
            self.exit = true;
            return;
        }

        let events = match self.game.state() {
            SessionState::Idle | SessionState::GameOver => match key.code {
                KeyCode::Esc => {
                    self.exit = true;
                    Vec::new()
                }
                KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('r') => {
                    self.last_result = None;
                    self.game.start()
                }
                _ => Vec::new(),
            },
            SessionState::Running | SessionState::Paused => match key.code {
                KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Esc => {
                    self.game.toggle_pause()
                }
                KeyCode::Char('r') => {
                    let mut events = self.game.reset();
                    events.extend(self.game.start());
                    events
                }
                KeyCode::Up | KeyCode::Char('w') => self.steer(Direction::Up),
                KeyCode::Down | KeyCode::Char('s') => self.steer(Direction::Down),
                KeyCode::Left | KeyCode::Char('a') => self.steer(Direction::Left),
                KeyCode::Right | KeyCode::Char('d') => self.steer(Direction::Right),
                _ => Vec::new(),
            },
        };
        self.handle_events(&events);
    }

    fn steer(&mut self, direction: Direction) -> Vec<GameEvent> {
        if self.game.state() == SessionState::Running {
            self.game.set_direction(direction);
        }
        Vec::new()
    }

    /// Refits the board to the terminal while no round is in play.
    fn handle_resize(&mut self, cols: u16, rows: u16) {
        if !matches!(
            self.game.state(),
            SessionState::Idle | SessionState::GameOver
        ) {
            return;
        }
        let settings = self.config.settings(arena_size(cols, rows));
        if settings.size == self.game.settings().size {
            return;
        }
        match self.game.reset_with(settings) {
            Ok(_) => {
                self.last_result = None;
                info!("Board refitted to {}x{}", cols, rows);
            }
            Err(e) => warn!("Keeping previous board after resize: {}", e),
        }
    }

    fn render(&self, frame: &mut Frame, state: &RenderState) {
        let score_text = match state.state {
            SessionState::Running | SessionState::Paused => format!(
                "SNEAK    High Score: {}    Score: {}",
                state.high_score, state.score
            ),
            _ => format!("SNEAK    High Score: {}", state.high_score),
        };

        let layout = Layout::default()
            .direction(layout::Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title + High Score
                Constraint::Min(0),    // Game area
            ])
            .split(frame.area());

        frame.render_widget(
            Paragraph::new(score_text)
                .alignment(Alignment::Left)
                .block(Block::default().borders(Borders::ALL)),
            layout[0],
        );

        let title = match state.state {
            SessionState::Running => "Playing",
            SessionState::Paused => "Paused. Press P to continue",
            _ => "",
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner_area = block.inner(layout[1]);
        frame.render_widget(block, layout[1]);
        frame.render_widget(Board(state), inner_area);

        match state.state {
            SessionState::Idle => {
                frame.render_widget(
                    Paragraph::new("Press SPACE to start").alignment(Alignment::Center),
                    inner_area,
                );
            }
            SessionState::GameOver => {
                let (final_score, high_score) =
                    self.last_result.unwrap_or((state.score, state.high_score));
                frame.render_widget(
                    Paragraph::new(format!(
                        "GAME OVER\nFinal Score: {}\nHigh Score: {}\nPress SPACE to play again",
                        final_score, high_score
                    ))
                    .alignment(Alignment::Center),
                    inner_area,
                );
            }
            _ => {}
        }
    }
}

struct Board<'a>(&'a RenderState);

impl Widget for Board<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.0;
        let mut put = |x: f32, y: f32, symbol: &str, style: Style| {
            let (x, y) = (x.round(), y.round());
            if x < 0.0 || y < 0.0 || x >= area.width as f32 || y >= area.height as f32 {
                return;
            }
            buf[(area.x + x as u16, area.y + y as u16)]
                .set_symbol(symbol)
                .set_style(style);
        };

        for cell in &state.obstacles {
            put(cell.x as f32, cell.y as f32, "█", Style::default().fg(Color::DarkGray));
        }

        if let Some(food) = state.food {
            put(food.x as f32, food.y as f32, "♦", Style::default().fg(Color::LightRed));
        }

        for segment in state.segments.iter().skip(1) {
            put(segment.x, segment.y, " ", Style::default().bg(Color::Green));
        }

        // Add snake head (different symbol/color)
        if let Some(head) = state.head() {
            put(head.x, head.y, "●", Style::default().fg(Color::Yellow));
        }
    }
}

fn load_high_score(path: &Path) -> u32 {
    match fs::read_to_string(path).map(|s| s.trim().parse().unwrap_or(0)) {
        Ok(score) => score,
        Err(e) => {
            error!("Error loading high score: {}", e);
            0
        }
    }
}

fn save_high_score(path: &Path, score: u32) {
    if let Err(e) = fs::write(path, score.to_string()) {
        error!("Error saving high score: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_leaves_room_for_chrome() {
        assert_eq!(arena_size(80, 24), BoardSize::new(78, 19));
        assert_eq!(arena_size(1, 1), BoardSize::new(0, 0));
    }

    #[test]
    fn test_missing_high_score_file_reads_zero() {
        let path = std::env::temp_dir().join("sneak_missing_high_score_test.txt");
        let _ = fs::remove_file(&path);
        assert_eq!(load_high_score(&path), 0);
    }

    #[test]
    fn test_high_score_file_round_trip() {
        let path = std::env::temp_dir().join("sneak_high_score_test.txt");
        save_high_score(&path, 120);
        assert_eq!(load_high_score(&path), 120);
        let _ = fs::remove_file(&path);
    }
}
