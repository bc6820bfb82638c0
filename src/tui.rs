use std::time::{Duration, Instant};

use ratatui::layout::{Constraint, Direction, Flex, Layout, Margin, Position};
use ratatui::style::{self, Modifier, Style};
use ratatui::widgets::{BorderType, Clear};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Stylize,
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Paragraph, Widget},
};

use crate::color::Hsl;
use crate::game::{self, Config, Phase};

// Delay between resolving a guess and dealing the next round
pub const ROUND_DELAY: Duration = Duration::from_secs(1);

// Player-visible verdict on the last guess, cleared when a round is dealt
#[derive(Clone, Copy, Debug)]
pub enum Feedback {
    Correct,
    Wrong,
}

// What a left click landed on
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Click {
    Swatch(usize),
    NewGame,
    Dismiss,
}

#[derive(Clone)]
pub struct App {
    pub config: Config,
    pub state: game::State,
    pub feedback: Option<Feedback>,
    pub next_round_at: Option<Instant>,
    pub viewport: Rect,
}

impl App {
    pub fn new(config: Config) -> Self {
        App {
            state: game::State::new(&config),
            config,
            feedback: None,
            next_round_at: None,
            viewport: Rect::default(),
        }
    }

    pub fn guess(&mut self, swatch_idx: usize) {
        if swatch_idx >= self.state.round.swatches.len() {
            return;
        }

        match game::take_guess(&mut self.state, &self.config, swatch_idx) {
            game::Guess::Correct => {
                self.feedback = Some(Feedback::Correct);
                self.schedule_round();
            }
            game::Guess::Incorrect => {
                self.feedback = Some(Feedback::Wrong);
                self.schedule_round();
            }
            game::Guess::Won => {
                self.feedback = Some(Feedback::Correct);
                self.next_round_at = None;
            }
            game::Guess::Lost => {
                self.feedback = Some(Feedback::Wrong);
                self.next_round_at = None;
            }
            game::Guess::Ignored => {}
        }
    }

    // At most one refresh is ever pending; guessing again while one is due
    // moves the deadline instead of queueing a second one.
    fn schedule_round(&mut self) {
        self.next_round_at = Some(Instant::now() + ROUND_DELAY);
    }

    // A stale refresh must never fire into a fresh game, so the pending
    // deadline goes before the state does.
    pub fn reset(&mut self) {
        self.next_round_at = None;
        self.feedback = None;
        game::reset(&mut self.state, &self.config);
    }

    pub fn tick(&mut self) {
        if self.next_round_at.is_some_and(|at| Instant::now() >= at) {
            self.next_round_at = None;
            self.feedback = None;
            game::next_round(&mut self.state, &self.config);
        }
    }

    pub fn until_next_round(&self) -> Option<Duration> {
        self.next_round_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}

// Resolve a click to the control under it, with the same layout maths the
// renderer uses. While an overlay is up only its dismiss button is live.
pub fn hit_test(app: &App, column: u16, row: u16) -> Option<Click> {
    let position = Position::new(column, row);

    if app.state.is_game_over() {
        let button = overlay_button_area(overlay_area(app.viewport));
        if button.contains(position) {
            return Some(Click::Dismiss);
        }
        return None;
    }

    let screen = screen_areas(app.viewport, app.config.swatches);
    for (idx, cell) in screen.swatches.iter().enumerate() {
        if cell.contains(position) {
            return Some(Click::Swatch(idx));
        }
    }
    if screen.new_game.contains(position) {
        return Some(Click::NewGame);
    }

    None
}

struct ScreenAreas {
    header: Rect,
    target: Rect,
    swatches: Vec<Rect>,
    status: Rect,
    new_game: Rect,
    footer: Rect,
}

fn screen_areas(area: Rect, swatch_count: usize) -> ScreenAreas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    let [target] = Layout::horizontal([Constraint::Length(40)])
        .flex(Flex::Center)
        .areas(rows[1]);

    let swatches = Layout::horizontal(vec![Constraint::Length(10); swatch_count])
        .flex(Flex::Center)
        .spacing(2)
        .split(rows[2])
        .to_vec();

    let [new_game] = Layout::horizontal([Constraint::Length(16)])
        .flex(Flex::Center)
        .areas(rows[4]);

    ScreenAreas {
        header: rows[0],
        target,
        swatches,
        status: rows[3],
        new_game,
        footer: rows[5],
    }
}

fn overlay_area(area: Rect) -> Rect {
    let [vertical] = Layout::vertical([Constraint::Length(9)])
        .flex(Flex::Center)
        .areas(area);
    let [overlay] = Layout::horizontal([Constraint::Length(46)])
        .flex(Flex::Center)
        .areas(vertical);
    overlay
}

fn overlay_button_area(overlay: Rect) -> Rect {
    let inner = overlay.inner(Margin::new(2, 1));
    let [bottom] = Layout::vertical([Constraint::Length(3)])
        .flex(Flex::End)
        .areas(inner);
    let [button] = Layout::horizontal([Constraint::Length(16)])
        .flex(Flex::Center)
        .areas(bottom);
    button
}

fn swatch_color(color: Hsl) -> style::Color {
    let rgb = color.to_rgb();
    style::Color::Rgb(rgb.red, rgb.green, rgb.blue)
}

// Black on light accents, white on dark ones
fn accent_text(color: Hsl) -> style::Color {
    if color.lightness > 55 {
        style::Color::Black
    } else {
        style::Color::White
    }
}

impl Widget for App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let screen = screen_areas(area, self.config.swatches);
        let target = self.state.round.target();

        let banner = match self.state.phase {
            Phase::Playing => Span::styled(" GAME RUNNING ", Style::default().fg(style::Color::Blue))
                .bold()
                .add_modifier(Modifier::REVERSED),
            Phase::Won => Span::styled(" YOU WON ", Style::default().fg(style::Color::Green))
                .bold()
                .add_modifier(Modifier::SLOW_BLINK | Modifier::REVERSED),
            Phase::Lost => Span::styled(" GAME OVER ", Style::default().fg(style::Color::Red))
                .bold()
                .add_modifier(Modifier::SLOW_BLINK | Modifier::REVERSED),
        };

        let header_text = Text::from(vec![Line::from(vec![
            " ".into(),
            banner,
            format!(" Score: {}, ", self.state.score).into(),
            format!(
                "Misses: {}/{}, ",
                self.state.incorrect_guesses, self.config.max_incorrect
            )
            .into(),
            format!("Round: {}", self.state.rounds).into(),
        ])]);

        Paragraph::new(header_text)
            .block(Block::bordered().border_set(border::THICK))
            .render(screen.header, buf);

        let target_block = Block::bordered().title(Line::from(" Target ".bold()));
        let target_inner = target_block.inner(screen.target);
        target_block.render(screen.target, buf);
        buf.set_style(target_inner, Style::default().bg(swatch_color(target)));

        for (idx, cell) in screen.swatches.iter().enumerate() {
            let block = Block::bordered().title(format!(" {} ", idx + 1));
            let inner = block.inner(*cell);
            block.render(*cell, buf);
            buf.set_style(
                inner,
                Style::default().bg(swatch_color(self.state.round.swatches[idx])),
            );
        }

        match self.feedback {
            Some(Feedback::Correct) => Paragraph::new("Correct!")
                .style(
                    Style::default()
                        .fg(style::Color::Green)
                        .add_modifier(Modifier::BOLD),
                )
                .centered()
                .render(screen.status, buf),
            Some(Feedback::Wrong) => Paragraph::new("Wrong! Try again.")
                .style(
                    Style::default()
                        .fg(style::Color::Red)
                        .add_modifier(Modifier::BOLD),
                )
                .centered()
                .render(screen.status, buf),
            None => {}
        }

        // The round control wears the target color as its accent
        Paragraph::new(Line::from(" New Game ".bold()))
            .centered()
            .block(Block::bordered())
            .style(
                Style::default()
                    .bg(swatch_color(target))
                    .fg(accent_text(target)),
            )
            .render(screen.new_game, buf);

        let hints = Line::from(vec![
            " Guess ".into(),
            format!("<1-{}/click> ", self.config.swatches).blue().bold(),
            " New Game ".into(),
            "<n> ".blue().bold(),
            " Quit ".into(),
            "<q> ".blue().bold(),
        ])
        .right_aligned();
        Paragraph::new(hints).render(screen.footer, buf);

        let overlay_content = match self.state.phase {
            Phase::Won => Some((
                " CONGRATULATIONS ",
                format!("You matched {} colors. Sharp eyes!", self.config.target_score),
                "   Play Again   ",
                style::Color::Green,
            )),
            Phase::Lost => Some((
                " GAME OVER ",
                format!(
                    "{} misses. Final score: {}.",
                    self.config.max_incorrect, self.state.score
                ),
                "   Try Again    ",
                style::Color::Red,
            )),
            Phase::Playing => None,
        };

        if let Some((title, message, button_label, tone)) = overlay_content {
            let overlay = overlay_area(area);
            Clear.render(overlay, buf);

            let body = Text::from(vec![
                Line::from(""),
                Line::from(""),
                Line::from(message).centered(),
            ]);
            Paragraph::new(body).render(overlay.inner(Margin::new(2, 1)), buf);

            Paragraph::new(Line::from(button_label.bold()))
                .centered()
                .block(Block::bordered())
                .style(Style::default().fg(tone).add_modifier(Modifier::REVERSED))
                .render(overlay_button_area(overlay), buf);

            Block::bordered()
                .border_type(BorderType::Thick)
                .border_style(Style::default().fg(tone))
                .title(Line::from(title.bold()).centered())
                .title_bottom(
                    Line::from(vec![" Dismiss ".into(), "<RET> ".blue().bold()]).right_aligned(),
                )
                .render(overlay, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_known_round() -> App {
        let mut app = App::new(Config::default());
        app.state.round = game::Round {
            swatches: vec![
                Hsl::new(100, 60, 50),
                Hsl::new(110, 65, 45),
                Hsl::new(90, 55, 55),
                Hsl::new(105, 70, 50),
                Hsl::new(95, 60, 42),
                Hsl::new(115, 62, 48),
            ],
            target_idx: 0,
        };
        app
    }

    #[test]
    fn test_guess_schedules_refresh() {
        let mut app = app_with_known_round();
        app.guess(0);
        assert!(app.next_round_at.is_some());
        assert!(matches!(app.feedback, Some(Feedback::Correct)));
        assert_eq!(app.state.score, 1);
    }

    #[test]
    fn test_reset_cancels_pending_refresh() {
        let mut app = app_with_known_round();
        app.guess(1);
        assert!(app.next_round_at.is_some());

        app.reset();
        assert!(app.next_round_at.is_none());
        assert!(app.feedback.is_none());
        assert_eq!(app.state.score, 0);
        assert_eq!(app.state.incorrect_guesses, 0);
        assert_eq!(app.state.phase, Phase::Playing);
    }

    #[test]
    fn test_tick_deals_due_round() {
        let mut app = app_with_known_round();
        app.guess(0);
        assert_eq!(app.state.rounds, 1);

        app.next_round_at = Some(Instant::now());
        app.tick();
        assert_eq!(app.state.rounds, 2);
        assert!(app.next_round_at.is_none());
        assert!(app.feedback.is_none());
    }

    #[test]
    fn test_winning_guess_cancels_refresh() {
        let mut app = app_with_known_round();
        app.state.score = 9;
        app.guess(0);
        assert_eq!(app.state.phase, Phase::Won);
        assert!(app.next_round_at.is_none());
    }

    #[test]
    fn test_clicks_map_to_controls() {
        let mut app = app_with_known_round();
        app.viewport = Rect::new(0, 0, 80, 24);
        let screen = screen_areas(app.viewport, app.config.swatches);

        let cell = screen.swatches[2];
        assert_eq!(
            hit_test(&app, cell.x + 1, cell.y + 1),
            Some(Click::Swatch(2))
        );

        let button = screen.new_game;
        assert_eq!(
            hit_test(&app, button.x + 1, button.y + 1),
            Some(Click::NewGame)
        );

        // With an overlay up, only its dismiss control is live
        app.state.phase = Phase::Lost;
        assert_eq!(hit_test(&app, cell.x + 1, cell.y + 1), None);
        let dismiss = overlay_button_area(overlay_area(app.viewport));
        assert_eq!(
            hit_test(&app, dismiss.x + 1, dismiss.y + 1),
            Some(Click::Dismiss)
        );
    }
}
