use std::collections::HashSet;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Paragraph,
        canvas::{Canvas, Circle, Rectangle},
    },
};

use crate::arcade::{Ball, BreakoutState, BreakoutStatus, VolleyState};
use crate::game::GameState;

/// A game state the renderer knows how to draw
pub trait Scene {
    fn title(&self) -> &'static str;

    /// Header statistics as (label, value) pairs
    fn stats(&self) -> Vec<(&'static str, String)>;

    /// Whether the game has ended and the board should give way to a summary
    fn is_over(&self) -> bool;

    fn score(&self) -> String;

    /// Draw the playing field into `area`
    fn draw_board(&self, frame: &mut Frame, area: Rect);
}

pub struct Renderer {
    /// Human play: show steering and restart controls
    interactive: bool,
}

impl Renderer {
    /// Renderer for keyboard play
    pub fn new() -> Self {
        Self { interactive: true }
    }

    /// Renderer for watching an agent
    pub fn viewer() -> Self {
        Self { interactive: false }
    }

    pub fn render<S: Scene>(&self, frame: &mut Frame, scene: &S, extra: &[(&str, String)]) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let stats = self.render_stats(scene, extra);
        frame.render_widget(stats, chunks[0]);

        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[1])[1];

        if scene.is_over() {
            let game_over = self.render_game_over(scene);
            frame.render_widget(game_over, game_area);
        } else {
            scene.draw_board(frame, game_area);
        }

        let controls = self.render_controls();
        frame.render_widget(controls, chunks[2]);
    }

    fn render_stats<S: Scene>(&self, scene: &S, extra: &[(&str, String)]) -> Paragraph<'static> {
        let mut spans = Vec::new();
        let pairs = scene
            .stats()
            .into_iter()
            .map(|(label, value)| (label.to_string(), value))
            .chain(extra.iter().map(|(label, value)| (label.to_string(), value.clone())));

        for (i, (label, value)) in pairs.enumerate() {
            if i > 0 {
                spans.push(Span::raw("    "));
            }
            spans.push(Span::styled(
                format!("{}: ", label),
                Style::default().fg(Color::Yellow),
            ));
            spans.push(Span::styled(
                value,
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
        }

        Paragraph::new(Line::from(spans)).alignment(Alignment::Center)
    }

    fn render_game_over<S: Scene>(&self, scene: &S) -> Paragraph<'static> {
        let mut text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    scene.score(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
        ];

        if self.interactive {
            text.push(Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "R",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to restart or ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Q",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to quit", Style::default().fg(Color::Gray)),
            ]));
        }

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_controls(&self) -> Paragraph<'static> {
        let line = if self.interactive {
            Line::from(vec![
                Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
                Span::raw(" or "),
                Span::styled("WASD", Style::default().fg(Color::Cyan)),
                Span::raw(" to move | "),
                Span::styled("Q", Style::default().fg(Color::Red)),
                Span::raw(" to quit"),
            ])
        } else {
            Line::from(vec![
                Span::raw("Watching agent | "),
                Span::styled("Q", Style::default().fg(Color::Red)),
                Span::raw(" to stop"),
            ])
        };

        Paragraph::new(line).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn board_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

/// Arena cells per terminal cell so the grid fits inside `area`
///
/// Each terminal cell is drawn two characters wide.
fn grid_scale(columns: i32, rows: i32, area: Rect) -> i32 {
    let inner_width = i32::from(area.width.saturating_sub(2)).max(2);
    let inner_height = i32::from(area.height.saturating_sub(2)).max(1);
    let by_width = (columns * 2 + inner_width - 1) / inner_width;
    let by_height = (rows + inner_height - 1) / inner_height;
    by_width.max(by_height).max(1)
}

impl Scene for GameState {
    fn title(&self) -> &'static str {
        " Snake "
    }

    fn stats(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Score", self.score.to_string()),
            ("Length", self.snake.len().to_string()),
            ("Steps", self.steps.to_string()),
        ]
    }

    fn is_over(&self) -> bool {
        !self.is_alive()
    }

    fn score(&self) -> String {
        self.score.to_string()
    }

    fn draw_board(&self, frame: &mut Frame, area: Rect) {
        let arena = &self.arena;
        let scale = grid_scale(arena.columns(), arena.rows(), area);
        let block_of = |x: i32, y: i32| (x / arena.cell_size / scale, y / arena.cell_size / scale);

        let head = self.snake.head();
        let head = block_of(head.x, head.y);
        let body: HashSet<(i32, i32)> = self
            .snake
            .body_segments()
            .map(|pos| block_of(pos.x, pos.y))
            .collect();
        let food = block_of(self.food.x, self.food.y);

        let block_columns = (arena.columns() + scale - 1) / scale;
        let block_rows = (arena.rows() + scale - 1) / scale;

        let lines: Vec<Line> = (0..block_rows)
            .map(|y| {
                let spans: Vec<Span> = (0..block_columns)
                    .map(|x| {
                        let cell = (x, y);
                        if cell == head {
                            Span::styled(
                                "■ ",
                                Style::default()
                                    .fg(Color::Cyan)
                                    .add_modifier(Modifier::BOLD),
                            )
                        } else if body.contains(&cell) {
                            Span::styled("□ ", Style::default().fg(Color::Green))
                        } else if cell == food {
                            Span::styled(
                                "O ",
                                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                            )
                        } else {
                            Span::styled(". ", Style::default().fg(Color::DarkGray))
                        }
                    })
                    .collect();
                Line::from(spans)
            })
            .collect();

        let grid = Paragraph::new(lines)
            .block(board_block(self.title()))
            .alignment(Alignment::Center);
        frame.render_widget(grid, area);
    }
}

/// Canvas y grows upward; game y grows downward
fn flip_y(height: f32, y: f32, extent: f32) -> f64 {
    f64::from(height - y - extent)
}

fn ball_shape(ball: &Ball, height: f32) -> Circle {
    Circle {
        x: f64::from(ball.pos.x),
        y: flip_y(height, ball.pos.y, 0.0),
        radius: f64::from(ball.radius),
        color: Color::Yellow,
    }
}

fn rect_shape(rect: &crate::arcade::Rect, height: f32, color: Color) -> Rectangle {
    Rectangle {
        x: f64::from(rect.x),
        y: flip_y(height, rect.y, rect.height),
        width: f64::from(rect.width),
        height: f64::from(rect.height),
        color,
    }
}

impl Scene for VolleyState {
    fn title(&self) -> &'static str {
        " Volley "
    }

    fn stats(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Agent", self.scores.0.to_string()),
            ("Opponent", self.scores.1.to_string()),
            ("Steps", self.steps.to_string()),
        ]
    }

    fn is_over(&self) -> bool {
        false
    }

    fn score(&self) -> String {
        format!("{} - {}", self.scores.0, self.scores.1)
    }

    fn draw_board(&self, frame: &mut Frame, area: Rect) {
        let h = self.height;
        let canvas = Canvas::default()
            .block(board_block(self.title()))
            .marker(Marker::Braille)
            .x_bounds([0.0, f64::from(self.width)])
            .y_bounds([0.0, f64::from(h)])
            .paint(|ctx| {
                ctx.draw(&rect_shape(&self.agent.rect, h, Color::Cyan));
                ctx.draw(&rect_shape(&self.opponent.rect, h, Color::Magenta));
                ctx.draw(&ball_shape(&self.ball, h));
            });
        frame.render_widget(canvas, area);
    }
}

impl Scene for BreakoutState {
    fn title(&self) -> &'static str {
        " Breakout "
    }

    fn stats(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Score", self.score.to_string()),
            ("Bricks", self.bricks_remaining().to_string()),
            ("Steps", self.steps.to_string()),
        ]
    }

    fn is_over(&self) -> bool {
        self.status != BreakoutStatus::Active
    }

    fn score(&self) -> String {
        self.score.to_string()
    }

    fn draw_board(&self, frame: &mut Frame, area: Rect) {
        let h = self.height;
        let canvas = Canvas::default()
            .block(board_block(self.title()))
            .marker(Marker::Braille)
            .x_bounds([0.0, f64::from(self.width)])
            .y_bounds([0.0, f64::from(h)])
            .paint(|ctx| {
                for brick in self.bricks.iter().filter(|brick| brick.alive) {
                    ctx.draw(&rect_shape(&brick.rect, h, Color::Red));
                }
                ctx.draw(&rect_shape(&self.paddle.rect, h, Color::Cyan));
                ctx.draw(&ball_shape(&self.ball, h));
            });
        frame.render_widget(canvas, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcade::{BreakoutConfig, BreakoutGame, VolleyConfig, VolleyGame};
    use crate::game::{Arena, Direction as Heading, Position, Snake};
    use ratatui::{Terminal, backend::TestBackend};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_grid_scale_fits_area() {
        let area = Rect::new(0, 0, 42, 22);
        // 20x20 fits as is: 40 characters wide, 20 rows tall
        assert_eq!(grid_scale(20, 20, area), 1);
        // 80 columns are 160 characters, so 4x4 blocks
        assert_eq!(grid_scale(80, 60, area), 4);
    }

    #[test]
    fn test_snake_frame_shows_header_and_pieces() {
        let snake = Snake::new(Position::new(50, 50), Heading::Right, 1);
        let state = GameState::new(snake, Position::new(100, 100), Arena::new(200, 200, 10));
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();

        terminal
            .draw(|frame| Renderer::new().render(frame, &state, &[]))
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Score: "));
        assert!(text.contains("Snake"));
        assert!(text.contains('■'));
        assert!(text.contains('O'));
    }

    #[test]
    fn test_game_over_screen() {
        let snake = Snake::new(Position::new(0, 10), Heading::Left, 1);
        let mut state = GameState::new(snake, Position::new(100, 100), Arena::new(200, 200, 10));
        state.status = crate::game::GameStatus::Dead;
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();

        terminal
            .draw(|frame| Renderer::viewer().render(frame, &state, &[("Episode", "3".into())]))
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("GAME OVER"));
        assert!(text.contains("Episode: "));
        assert!(text.contains("to stop"));
    }

    #[test]
    fn test_arcade_frames_render() {
        let volley = VolleyGame::new(VolleyConfig::default(), 0).unwrap();
        let breakout = BreakoutGame::new(BreakoutConfig::default(), 0).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();

        terminal
            .draw(|frame| Renderer::viewer().render(frame, volley.state(), &[]))
            .unwrap();
        assert!(buffer_text(&terminal).contains("Opponent: "));

        terminal
            .draw(|frame| Renderer::viewer().render(frame, breakout.state(), &[]))
            .unwrap();
        assert!(buffer_text(&terminal).contains("Bricks: 40"));
    }
}
