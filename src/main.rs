use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use rayon::iter::ParallelIterator;

use crossterm::event::{self, Event, KeyCode, MouseButton, MouseEventKind};
use crossterm::execute;
use game::{PlayFn, Validate};
use rayon::iter::IntoParallelIterator;
use clap::{Parser, Subcommand};
use tui::{App, Click};

mod color;
mod game;
mod tui;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Simulate {
        #[arg(short)]
        log_file: Option<PathBuf>,
        #[arg(short, default_value_t = 100)]
        n_games: usize,
        #[arg(long, default_value_t = 6)]
        swatches: usize,
    },
    Interactive {
        #[arg(long, default_value_t = 6)]
        swatches: usize,
    },
    Compare {
        first: String,
        second: String,
    },
}

// One guess in the play log, the state column is a serialized snapshot and
// not only a vector of fields
#[derive(Debug, Clone, serde::Serialize)]
struct PlayLogRow {
    game_id: usize,
    round_id: usize,
    guess_id: usize,
    policy: String,
    guess_idx: usize,
    outcome: String,
    score: u32,
    incorrect_guesses: u32,
    state: String,
}

type PlayLog = Vec<PlayLogRow>;

fn write_play_log(play_log: &PlayLog, file: &PathBuf) {
    let file = File::create(file).unwrap();
    let mut writer = BufWriter::new(file);
    for item in play_log {
        jsonl::write(&mut writer, item).unwrap();
    }
}

// Resolve two textual colors and report whether the game would treat them as
// the same color.
fn compare(first: &str, second: &str) {
    match (color::to_canonical_hsl(first), color::to_canonical_hsl(second)) {
        (Ok(a), Ok(b)) => {
            println!("{} resolves to {}", first, a);
            println!("{} resolves to {}", second, b);
            println!("{}", if a == b { "Colors match" } else { "Colors differ" });
        }
        (Err(err), _) | (_, Err(err)) => println!("{}", err),
    }
}

fn report(policy: &str, outcomes: &[(bool, u32)]) {
    let total_games = outcomes.len();
    let wins = outcomes.iter().filter(|(won, _)| *won).count();
    let mean_score =
        outcomes.iter().map(|&(_, score)| score as f64).sum::<f64>() / total_games as f64;

    println!(
        "Win count for {}: {}/{}, ratio: {}, mean score: {:.2}",
        policy,
        wins,
        total_games,
        wins as f64 / total_games as f64,
        mean_score
    );
}

fn simulate(config: &game::Config, n_games: usize, log_file: Option<&PathBuf>) {
    let policies: Vec<(String, PlayFn)> = [
        ("random".to_string(), game::play_random as PlayFn),
        ("greedy".to_string(), game::play_greedy as PlayFn),
        ("epsilon-greedy".to_string(), game::play_epsilon_greedy as PlayFn),
    ]
    .to_vec();

    log::info!("Running {} games for {} policies,", n_games, policies.len());

    let play_log: Arc<Mutex<PlayLog>> = Arc::new(Mutex::new(Vec::new()));

    for (policy_name, policy) in policies {
        let outcomes: Vec<(bool, u32)> = (0..n_games)
            .into_par_iter()
            .map(|game_idx| {
                let mut state = game::State::new(config);
                let mut guess_id = 0;

                loop {
                    log::debug!("Round: {}", state.rounds);
                    let guess_idx = policy(&state);
                    let outcome = game::take_guess(&mut state, config, guess_idx);

                    play_log.lock().unwrap().push(PlayLogRow {
                        game_id: game_idx,
                        round_id: state.rounds,
                        guess_id,
                        policy: policy_name.clone(),
                        guess_idx,
                        outcome: serde_json::to_string(&outcome).unwrap(),
                        score: state.score,
                        incorrect_guesses: state.incorrect_guesses,
                        state: serde_json::to_string(&state).unwrap(),
                    });
                    guess_id += 1;

                    match outcome {
                        game::Guess::Won => break (true, state.score),
                        game::Guess::Lost | game::Guess::Ignored => break (false, state.score),
                        game::Guess::Correct | game::Guess::Incorrect => {
                            game::next_round(&mut state, config)
                        }
                    }
                }
            })
            .collect();

        report(&policy_name, &outcomes);
    }

    if let Some(file) = log_file {
        write_play_log(&play_log.lock().unwrap().to_vec(), file);
    }
}

fn run_interactive(config: game::Config) {
    color_eyre::install().unwrap();
    let mut terminal = ratatui::init();
    execute!(std::io::stdout(), event::EnableMouseCapture).unwrap();

    let mut app = App::new(config);

    loop {
        terminal.draw(|frame| {
            app.viewport = frame.area();
            frame.render_widget(app.clone(), frame.area());
        }).unwrap();

        // Wake up in time for a scheduled round, or at a slow idle cadence
        let timeout = app
            .until_next_round()
            .unwrap_or(Duration::from_millis(250));

        if event::poll(timeout).unwrap() {
            match event::read().unwrap() {
                Event::Key(key_event) => {
                    if app.state.is_game_over() {
                        // When the overlay is up, only dismissing and quitting work
                        match key_event.code {
                            KeyCode::Char('q') => break,
                            KeyCode::Char('n') | KeyCode::Enter => app.reset(),
                            _ => {}
                        }
                    } else {
                        match key_event.code {
                            KeyCode::Char('q') => break,
                            KeyCode::Char('n') => app.reset(),
                            KeyCode::Char(ch) => {
                                if let Some(digit) = ch.to_digit(10) {
                                    let idx = digit as usize;
                                    if (1..=app.config.swatches).contains(&idx) {
                                        app.guess(idx - 1);
                                    }
                                }
                            },
                            _ => {}
                        }
                    }
                },
                Event::Mouse(mouse_event) => {
                    if let MouseEventKind::Down(MouseButton::Left) = mouse_event.kind {
                        match tui::hit_test(&app, mouse_event.column, mouse_event.row) {
                            Some(Click::Swatch(idx)) => app.guess(idx),
                            Some(Click::NewGame) | Some(Click::Dismiss) => app.reset(),
                            None => {}
                        }
                    }
                },
                _ => {}
            };
        }

        app.tick();
    }

    execute!(std::io::stdout(), event::DisableMouseCapture).unwrap();
    ratatui::restore();
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match args.commands {
        Commands::Simulate { log_file, n_games, swatches } => {
            let config = game::Config { swatches, ..Default::default() };
            if let Err(err) = config.validate() {
                println!("{}", err);
                return;
            }
            simulate(&config, n_games, log_file.as_ref());
        },
        Commands::Interactive { swatches } => {
            let config = game::Config { swatches, ..Default::default() };
            if let Err(err) = config.validate() {
                println!("{}", err);
                return;
            }
            run_interactive(config);
        },
        Commands::Compare { first, second } => compare(&first, &second),
    }
}
