use anyhow::{anyhow, Result};
use rand::Rng;

use crate::color::Hsl;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

// Tunables for one game. Defaults match the classic setup: six swatches,
// first to ten points wins, three misses lose.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub swatches: usize,
    pub target_score: u32,
    pub max_incorrect: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            swatches: 6,
            target_score: 10,
            max_incorrect: 3,
        }
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<()> {
        // Swatches are picked with the digit keys, so the count is capped at 9
        if self.swatches < 2 || self.swatches > 9 {
            return Err(anyhow!(
                "Swatch count ({}) outside the bound [2, 9]",
                self.swatches
            ));
        }
        if self.target_score < 1 {
            return Err(anyhow!("Target score must be at least 1"));
        }
        if self.max_incorrect < 1 {
            return Err(anyhow!("Allowed misses must be at least 1"));
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub enum Phase {
    Playing,
    Won,
    Lost,
}

// One dealt round: the swatches in display order and the index of the one
// the player has to find. The target is always a member of the swatch list,
// never a separately drawn color, so a matching pick always exists.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Round {
    pub swatches: Vec<Hsl>,
    pub target_idx: usize,
}

impl Round {
    pub fn target(&self) -> Hsl {
        self.swatches[self.target_idx]
    }
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct State {
    pub score: u32,
    pub incorrect_guesses: u32,
    pub phase: Phase,
    pub round: Round,
    pub rounds: usize,
}

impl State {
    pub fn new(config: &Config) -> Self {
        State {
            score: 0,
            incorrect_guesses: 0,
            phase: Phase::Playing,
            round: generate_round(config.swatches),
            rounds: 1,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase != Phase::Playing
    }
}

// Deal one round: a random base color in the mid ranges and `count` variants
// of it, each perturbed a little in hue, saturation and lightness. Hsl::new
// wraps the hue and clamps the rest, the raw perturbations are not re-checked
// here. One variant is picked as the target.
pub fn generate_round(count: usize) -> Round {
    let mut rng = rand::rng();

    let base_hue = rng.random_range(0..360);
    let base_saturation = rng.random_range(50..100);
    let base_lightness = rng.random_range(40..60);

    let mut swatches = Vec::with_capacity(count);
    for _ in 0..count {
        swatches.push(Hsl::new(
            base_hue + rng.random_range(-15..15),
            base_saturation + rng.random_range(-10..10),
            base_lightness + rng.random_range(-5..5),
        ));
    }

    let target_idx = rng.random_range(0..count);
    log::debug!(
        "Dealt round: target {} of {} is {}",
        target_idx + 1,
        count,
        swatches[target_idx]
    );

    Round {
        swatches,
        target_idx,
    }
}

// What a single guess did to the game.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub enum Guess {
    Correct,
    Incorrect,
    Won,
    Lost,
    Ignored,
}

// Apply a guess of the given swatch index to the state. Correct and Incorrect
// leave the game running and expect the caller to deal the next round; Won
// and Lost are terminal. Guesses in a terminal phase are Ignored outright.
// The index has to come from the current round, the caller ensures this.
pub fn take_guess(state: &mut State, config: &Config, swatch_idx: usize) -> Guess {
    if state.phase != Phase::Playing {
        return Guess::Ignored;
    }

    let picked = state.round.swatches[swatch_idx];
    let target = state.round.target();

    if picked.canonical() == target.canonical() {
        state.score += 1;
        log::debug!("Correct guess {}, score {}", picked, state.score);

        if state.score >= config.target_score {
            state.phase = Phase::Won;
            return Guess::Won;
        }
        Guess::Correct
    } else {
        state.incorrect_guesses += 1;
        log::debug!(
            "Incorrect guess {} against {}, miss {}",
            picked,
            target,
            state.incorrect_guesses
        );

        if state.incorrect_guesses >= config.max_incorrect {
            state.phase = Phase::Lost;
            return Guess::Lost;
        }
        Guess::Incorrect
    }
}

pub fn next_round(state: &mut State, config: &Config) {
    state.round = generate_round(config.swatches);
    state.rounds += 1;
}

// Back to a fresh Playing state with a new round dealt right away.
pub fn reset(state: &mut State, config: &Config) {
    *state = State::new(config);
}

pub type PlayFn = fn(&State) -> usize;

// Pick any swatch, blind.
pub fn play_random(state: &State) -> usize {
    let mut rng = rand::rng();
    rng.random_range(0..state.round.swatches.len())
}

// Pick the swatch closest to the target in the canonical triple. The target
// itself is at distance zero, so this player never misses.
pub fn play_greedy(state: &State) -> usize {
    let target = state.round.target().canonical();

    state
        .round
        .swatches
        .iter()
        .enumerate()
        .min_by_key(|(_idx, swatch)| color_distance(swatch.canonical(), target))
        .unwrap()
        .0
}

// Greedy with an exploration kick: a share of guesses is blind, like a player
// rushing the pick.
pub fn play_epsilon_greedy(state: &State) -> usize {
    let mut rng = rand::rng();
    let epsilon = 0.35;

    if rng.random_range(0.0..1.0) < epsilon {
        play_random(state)
    } else {
        play_greedy(state)
    }
}

// Squared distance over the canonical components, hue measured the short way
// around the circle.
fn color_distance(a: Hsl, b: Hsl) -> i64 {
    let hue_delta = (a.hue as i64 - b.hue as i64).abs();
    let hue_delta = hue_delta.min(360 - hue_delta);
    let saturation_delta = a.saturation as i64 - b.saturation as i64;
    let lightness_delta = a.lightness as i64 - b.lightness as i64;

    hue_delta * hue_delta + saturation_delta * saturation_delta + lightness_delta * lightness_delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_round() -> Round {
        Round {
            swatches: vec![
                Hsl::new(200, 60, 50),
                Hsl::new(210, 65, 45),
                Hsl::new(190, 55, 55),
                Hsl::new(205, 70, 50),
                Hsl::new(195, 60, 42),
                Hsl::new(215, 62, 48),
            ],
            target_idx: 3,
        }
    }

    fn fixed_state(config: &Config) -> State {
        let mut state = State::new(config);
        state.round = fixed_round();
        state
    }

    #[test]
    fn test_generate_round_shape() {
        for _ in 0..50 {
            let round = generate_round(6);
            assert_eq!(round.swatches.len(), 6);
            assert!(round.target_idx < 6);

            for swatch in &round.swatches {
                assert!(swatch.hue < 360);
                assert!((40..=100).contains(&swatch.saturation));
                assert!((35..=64).contains(&swatch.lightness));
            }
        }
    }

    #[test]
    fn test_target_always_matches_a_swatch() {
        for _ in 0..50 {
            let round = generate_round(6);
            let target = round.target().canonical();
            let matches = round
                .swatches
                .iter()
                .filter(|swatch| swatch.canonical() == target)
                .count();
            assert!(matches >= 1);
        }
    }

    #[test]
    fn test_correct_guess_scores() {
        let config = Config::default();
        let mut state = fixed_state(&config);

        assert_eq!(take_guess(&mut state, &config, 3), Guess::Correct);
        assert_eq!(state.score, 1);
        assert_eq!(state.incorrect_guesses, 0);
        assert_eq!(state.phase, Phase::Playing);
    }

    #[test]
    fn test_incorrect_guess_counts_miss() {
        let config = Config::default();
        let mut state = fixed_state(&config);

        assert_eq!(take_guess(&mut state, &config, 0), Guess::Incorrect);
        assert_eq!(state.score, 0);
        assert_eq!(state.incorrect_guesses, 1);
        assert_eq!(state.phase, Phase::Playing);
    }

    #[test]
    fn test_tenth_point_wins_and_freezes() {
        let config = Config::default();
        let mut state = fixed_state(&config);
        state.score = 9;

        assert_eq!(take_guess(&mut state, &config, 3), Guess::Won);
        assert_eq!(state.score, 10);
        assert_eq!(state.phase, Phase::Won);

        // Terminal phases ignore every further guess
        assert_eq!(take_guess(&mut state, &config, 3), Guess::Ignored);
        assert_eq!(take_guess(&mut state, &config, 0), Guess::Ignored);
        assert_eq!(state.score, 10);
        assert_eq!(state.incorrect_guesses, 0);
    }

    #[test]
    fn test_third_miss_loses() {
        let config = Config::default();
        let mut state = fixed_state(&config);
        state.incorrect_guesses = 2;

        assert_eq!(take_guess(&mut state, &config, 0), Guess::Lost);
        assert_eq!(state.phase, Phase::Lost);
        assert_eq!(state.incorrect_guesses, 3);

        assert_eq!(take_guess(&mut state, &config, 3), Guess::Ignored);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_reset_restarts_from_lost() {
        let config = Config::default();
        let mut state = fixed_state(&config);
        state.score = 4;
        state.incorrect_guesses = 3;
        state.phase = Phase::Lost;
        state.rounds = 12;

        reset(&mut state, &config);
        assert_eq!(state.score, 0);
        assert_eq!(state.incorrect_guesses, 0);
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.rounds, 1);
        assert_eq!(state.round.swatches.len(), config.swatches);
    }

    #[test]
    fn test_next_round_replaces_swatches_only() {
        let config = Config::default();
        let mut state = fixed_state(&config);
        state.score = 3;
        state.incorrect_guesses = 1;

        next_round(&mut state, &config);
        assert_eq!(state.score, 3);
        assert_eq!(state.incorrect_guesses, 1);
        assert_eq!(state.rounds, 2);
    }

    #[test]
    fn test_greedy_player_never_misses() {
        let config = Config::default();
        for _ in 0..20 {
            let mut state = State::new(&config);
            let pick = play_greedy(&state);
            let outcome = take_guess(&mut state, &config, pick);
            assert!(outcome == Guess::Correct || outcome == Guess::Won);
        }
    }

    #[test]
    fn test_config_bounds() {
        assert!(Config::default().validate().is_ok());
        assert!(Config {
            swatches: 1,
            ..Config::default()
        }
        .validate()
        .is_err());
        assert!(Config {
            swatches: 10,
            ..Config::default()
        }
        .validate()
        .is_err());
    }
}
