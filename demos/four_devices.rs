//! Four simulated devices play a full game of Hearts over one shared store.
//!
//! Run with `RUST_LOG=hearts_sync=info cargo run --example four_devices`.

use std::error::Error;
use std::time::Duration;

use hearts_sync::{
    Action, DeviceId, Game, GameOptions, Phase, Replica, SEATS, SyncConfig, SyncStore,
};
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

fn choose(game: &Game) -> Option<Action> {
    let players = game.table().players();
    match game.phase() {
        Phase::Deal => Some(Action::Deal { seed: rand::random() }),
        Phase::Pass => {
            let seat = (0..SEATS).find(|&s| !players[s].done_passing())?;
            let mut hand = players[seat].sorted_hand();
            // Dump the highest cards.
            hand.sort_by_key(|c| std::cmp::Reverse(c.rank()));
            Some(Action::Pass { seat, cards: hand[..game.options().pass_count].to_vec() })
        }
        Phase::Take => {
            let seat = (0..SEATS).find(|&s| !players[s].done_taking())?;
            Some(Action::Take { seat })
        }
        Phase::Play if game.table().trick_len() == SEATS => Some(Action::ResolveTrick),
        Phase::Play => {
            let leader = game.table().first_played().unwrap_or(0);
            let seat = (0..SEATS)
                .map(|k| (leader + k) % SEATS)
                .find(|&s| game.table().trick()[s].is_none())?;
            let card = *game.legal_plays(seat).first()?;
            Some(Action::Play { seat, card })
        }
        Phase::Score => Some(Action::ScoreRound),
        Phase::GameOver => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = SyncStore::new();
    let dir = tempfile::tempdir()?;
    let replicas: Vec<Replica> = (0..SEATS)
        .map(|seat| {
            let config = SyncConfig::default()
                .with_resume_file(dir.path().join(format!("device-{seat}.json")));
            Replica::new(
                store.connect(DeviceId::new(format!("device-{seat}"))),
                config,
                GameOptions::default(),
            )
        })
        .collect();

    let (address, start) = replicas[0].host_game(1)?;
    println!("hosting game {} at {address}", start.game_id);
    for replica in &replicas[1..] {
        replica.join_game(&address)?;
    }
    // Joiners replay from the tail, so seats are claimed once everyone is in.
    for (seat, replica) in replicas.iter().enumerate() {
        let marker = replica.sit(seat)?;
        timeout(Duration::from_secs(5), replica.wait_for(marker)).await?;
    }

    while let Some(action) = choose(&replicas[0].game()) {
        let actor = &replicas[action.seat().unwrap_or(0)];
        let marker = actor.submit(&action)?;
        for replica in &replicas {
            timeout(Duration::from_secs(5), replica.wait_for(marker)).await?;
        }
        if action == Action::ScoreRound {
            let game = replicas[0].game();
            println!("after round {}: {:?}", game.round(), game.scores());
        }
    }

    let game = replicas[0].game();
    println!("game over after {} rounds, winners {:?}", game.round(), game.winners());
    for replica in &replicas[1..] {
        assert_eq!(replica.game(), game, "replicas diverged");
    }
    Ok(())
}
