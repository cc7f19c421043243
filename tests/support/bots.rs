//! A simple bot that drives a game with legal actions.

use hearts_sync::{Action, Game, Phase, SEATS, Seat};

/// Applies an action, panicking with context if it is rejected.
pub fn apply(game: &mut Game, action: Action) {
    if let Err(err) = game.apply(&action) {
        panic!("{action} rejected in {:?}: {err}", game.phase());
    }
}

/// Returns the seat expected to play next in the current trick.
pub fn next_to_play(game: &Game) -> Seat {
    let table = game.table();
    let leader = table.first_played().unwrap_or(0);
    (0..SEATS)
        .map(|k| (leader + k) % SEATS)
        .find(|&seat| table.trick()[seat].is_none())
        .expect("trick has a free seat")
}

/// Chooses the next action a simple bot would take, or `None` once the game
/// is over.
pub fn next_action(game: &Game, seed: u64) -> Option<Action> {
    match game.phase() {
        Phase::Deal => Some(Action::Deal { seed }),
        Phase::Pass => {
            let seat = (0..SEATS).find(|&s| !game.table().players()[s].done_passing())?;
            let cards = game.table().players()[seat].sorted_hand()[..game.options().pass_count]
                .to_vec();
            Some(Action::Pass { seat, cards })
        }
        Phase::Take => {
            let seat = (0..SEATS).find(|&s| !game.table().players()[s].done_taking())?;
            Some(Action::Take { seat })
        }
        Phase::Play if game.table().trick_len() == SEATS => Some(Action::ResolveTrick),
        Phase::Play => {
            let seat = next_to_play(game);
            let card = *game.legal_plays(seat).first()?;
            Some(Action::Play { seat, card })
        }
        Phase::Score => Some(Action::ScoreRound),
        Phase::GameOver => None,
    }
}

/// Plays one full round from the deal phase, returning every action applied.
pub fn play_round(game: &mut Game, seed: u64) -> Vec<Action> {
    assert_eq!(game.phase(), Phase::Deal);
    let round = game.round();
    let mut actions = Vec::new();
    while game.round() == round && !game.is_game_over() {
        let action = next_action(game, seed).expect("game in progress");
        apply(game, action.clone());
        actions.push(action);
    }
    actions
}
