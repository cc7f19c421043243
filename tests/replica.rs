//! Device replicas converging over a shared store.

#[path = "support/bots.rs"]
mod bots;
#[path = "support/logging.rs"]
mod logging;

use std::time::Duration;

use bots::{next_action, play_round};
use hearts_sync::{
    Action, ActionError, DeviceId, Game, GameOptions, GroupError, MemberInfo, Phase, Replica,
    ReplicaError, ResumeMarker, ResumeState, SEATS, SeatError, SyncConfig, SyncStore, TrickError,
};
use logging::init_logging;
use tempfile::TempDir;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn replica(store: &SyncStore, dir: &TempDir, name: &str) -> Replica {
    let config = SyncConfig::default()
        .with_resume_file(dir.path().join(format!("{name}.json")))
        .with_retry_delay(Duration::from_millis(10));
    Replica::new(store.connect(DeviceId::new(name)), config, GameOptions::default())
}

/// Hosts a game on the first device and seats everyone.
async fn table(store: &SyncStore, dir: &TempDir) -> Vec<Replica> {
    let replicas: Vec<Replica> = (0..SEATS)
        .map(|seat| replica(store, dir, &format!("device-{seat}")))
        .collect();
    let (address, start) = replicas[0].host_game_with_id(7, 100).unwrap();
    assert_eq!(start.game_id, 7);
    for guest in &replicas[1..] {
        guest.join_game(&address).unwrap();
    }
    let mut last = None;
    for (seat, r) in replicas.iter().enumerate() {
        last = Some(r.sit(seat).unwrap());
    }
    settle(&replicas, last.unwrap()).await;
    for (seat, r) in replicas.iter().enumerate() {
        assert_eq!(r.seat(), Some(seat));
    }
    replicas
}

async fn settle(replicas: &[Replica], marker: ResumeMarker) {
    for r in replicas {
        assert!(timeout(WAIT, r.wait_for(marker)).await.unwrap());
    }
}

/// Lets each seat's own device submit its actions until `done` holds.
async fn drive(replicas: &[Replica], seed: u64, done: impl Fn(&Game) -> bool) {
    loop {
        let game = replicas[0].game();
        if done(&game) {
            return;
        }
        let action = next_action(&game, seed).expect("game in progress");
        let actor = &replicas[action.seat().unwrap_or(0)];
        let marker = actor.submit(&action).unwrap();
        settle(replicas, marker).await;
    }
}

fn assert_converged(replicas: &[Replica]) {
    let first = replicas[0].game();
    for r in &replicas[1..] {
        assert_eq!(r.game(), first, "{} diverged", r.device());
    }
}

#[tokio::test]
async fn four_devices_play_a_round_in_lockstep() {
    init_logging();
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let replicas = table(&store, &dir).await;

    drive(&replicas, 42, |game| game.round() == 1).await;

    assert_converged(&replicas);
    let game = replicas[0].game();
    let mut local = Game::new(GameOptions::default());
    play_round(&mut local, 42);
    assert_eq!(game, local);
    assert_eq!(game.phase(), Phase::Deal);
    let total: u32 = game.scores().iter().sum();
    assert!(total == 26 || total == 78);
    assert_eq!(replicas[3].last_applied(), replicas[0].last_applied());
}

#[tokio::test]
async fn local_validation_rejects_before_appending() {
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let replicas = table(&store, &dir).await;
    let before = store.len();

    let err = replicas[1].take().unwrap_err();
    assert!(matches!(err, ReplicaError::Validation(ActionError::WrongPhase(Phase::Deal))));
    assert_eq!(store.len(), before);

    let marker = replicas[0].deal(9).unwrap();
    settle(&replicas, marker).await;
    let hand = replicas[2].game().table().players()[2].hand().to_vec();
    let err = replicas[2].pass(hand[..2].to_vec()).unwrap_err();
    assert!(matches!(err, ReplicaError::Validation(ActionError::Pass(_))));
    assert_eq!(store.len(), before + 1);
}

#[tokio::test]
async fn helpers_submit_for_the_local_seat() {
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let replicas = table(&store, &dir).await;

    let marker = replicas[0].deal_random().unwrap();
    settle(&replicas, marker).await;
    for (seat, r) in replicas.iter().enumerate() {
        let chosen = r.game().table().players()[seat].sorted_hand()[..3].to_vec();
        let marker = r.pass(chosen).unwrap();
        settle(&replicas, marker).await;
    }
    for r in &replicas {
        let marker = r.take().unwrap();
        settle(&replicas, marker).await;
    }

    let game = replicas[0].game();
    assert_eq!(game.phase(), Phase::Play);
    let leader = game.table().first_played().unwrap();
    let lead = game.legal_plays(leader)[0];
    let marker = replicas[leader].play(lead).unwrap();
    settle(&replicas, marker).await;
    assert_eq!(replicas[1].game().table().trick()[leader], Some(lead));

    assert!(matches!(
        replicas[0].resolve_trick(),
        Err(ReplicaError::Validation(ActionError::Trick(TrickError::IncompleteTrick)))
    ));
    assert!(matches!(
        replicas[0].score_round(),
        Err(ReplicaError::Validation(ActionError::WrongPhase(Phase::Play)))
    ));
    assert_converged(&replicas);
}

#[tokio::test]
async fn conflicting_actions_resolve_in_log_order() {
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let replicas = table(&store, &dir).await;

    // Both deals pass local validation; only the first in the log counts.
    let first = replicas[0].deal(1).unwrap();
    let second = replicas[1].deal(2).unwrap();
    assert!(first < second);
    settle(&replicas, second).await;

    assert_converged(&replicas);
    let mut expected = Game::new(GameOptions::default());
    expected.apply(&Action::Deal { seed: 1 }).unwrap();
    assert_eq!(
        replicas[2].game().table().players(),
        expected.table().players()
    );
}

#[tokio::test]
async fn replicas_recover_from_interrupted_watches() {
    init_logging();
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let replicas = table(&store, &dir).await;

    drive(&replicas, 5, |game| game.phase() == Phase::Take).await;
    store.interrupt_watches();
    drive(&replicas, 5, |game| game.tricks_played() == 2).await;
    store.interrupt_watches();
    store.interrupt_watches();
    drive(&replicas, 5, |game| game.round() == 1).await;

    assert_converged(&replicas);
}

#[tokio::test]
async fn unseated_and_detached_replicas_cannot_act() {
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let lone = replica(&store, &dir, "lone");

    assert!(matches!(lone.deal(1), Err(ReplicaError::Detached)));
    assert!(matches!(lone.take(), Err(ReplicaError::Unseated)));
    assert!(matches!(lone.sit(SEATS), Err(ReplicaError::Seat(SeatError::NoSuchSeat))));
    assert!(matches!(lone.sit(0), Err(ReplicaError::Detached)));
    assert_eq!(lone.seat(), None);
    assert!(matches!(lone.members(), Err(ReplicaError::Detached)));
    assert_eq!(lone.log_address(), None);
    assert!(matches!(lone.reattach(), Err(ReplicaError::ResumeFile(_))));
}

#[tokio::test]
async fn hosting_writes_the_resume_file_and_registers_members() {
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let host = replica(&store, &dir, "host");
    let guest = replica(&store, &dir, "guest");

    let (address, start) = host.host_game(55).unwrap();
    assert!(start.game_id < 1_000_000);
    assert_eq!(start.owner_id, 55);
    assert_eq!(address.game_id(), Some(start.game_id));
    assert!(host.is_owner());

    guest.join_game(&address).unwrap();
    assert!(!guest.is_owner());

    let saved = ResumeState::load(&host.config().resume_file).unwrap();
    assert_eq!(saved, ResumeState { log_address: address.to_string(), is_owner: true });
    let saved = ResumeState::load(&guest.config().resume_file).unwrap();
    assert!(!saved.is_owner);

    let members = host.members().unwrap();
    assert!(members.contains(&(DeviceId::new("host"), MemberInfo::CREATOR)));
    assert!(members.contains(&(DeviceId::new("guest"), MemberInfo::JOINER)));
}

#[tokio::test]
async fn hosting_an_existing_game_joins_it() {
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let first = replica(&store, &dir, "first");
    let second = replica(&store, &dir, "second");

    let (address, _) = first.host_game_with_id(3, 1).unwrap();
    let (again, _) = second.host_game_with_id(3, 2).unwrap();
    assert_eq!(address, again);
    assert!(first.is_owner());
    assert!(!second.is_owner());
}

#[tokio::test]
async fn only_the_owner_disbands() {
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let replicas = table(&store, &dir).await;

    assert!(matches!(
        replicas[1].disband(),
        Err(ReplicaError::Group(GroupError::NotOwner(_)))
    ));
    replicas[0].disband().unwrap();
    assert_eq!(replicas[0].log_address(), None);
    assert!(matches!(
        replicas[1].members(),
        Err(ReplicaError::Group(GroupError::NotFound(_)))
    ));
    assert!(replicas[1].deal(1).is_err());
}

#[tokio::test]
async fn reattach_replays_the_whole_log() {
    init_logging();
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let replicas = table(&store, &dir).await;
    drive(&replicas, 8, |game| game.tricks_played() == 3).await;
    let last = replicas[2].last_applied().unwrap();

    // A relaunch of device 2: same device, same resume file, fresh state.
    let relaunched = replica(&store, &dir, "device-2");
    let address = relaunched.reattach().unwrap();
    assert_eq!(Some(address), replicas[2].log_address());
    assert!(!relaunched.is_owner());
    assert!(timeout(WAIT, relaunched.wait_for(last)).await.unwrap());
    assert_eq!(relaunched.game(), replicas[2].game());
    assert_eq!(relaunched.seat(), Some(2));

    // It keeps following new entries.
    let mut all: Vec<&Replica> = replicas.iter().collect();
    all[2] = &relaunched;
    let game = relaunched.game();
    let action = next_action(&game, 8).unwrap();
    let marker = all[action.seat().unwrap_or(0)].submit(&action).unwrap();
    for r in &all {
        assert!(timeout(WAIT, r.wait_for(marker)).await.unwrap());
    }
    assert_eq!(relaunched.game(), replicas[0].game());
}

#[tokio::test]
async fn late_joiner_starts_at_the_tail() {
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let host = replica(&store, &dir, "host");
    let (address, _) = host.host_game_with_id(11, 1).unwrap();
    let marker = host.deal(4).unwrap();
    assert!(timeout(WAIT, host.wait_for(marker)).await.unwrap());

    let late = replica(&store, &dir, "late");
    late.join_game(&address).unwrap();
    assert_eq!(host.game().phase(), Phase::Pass);
    assert_eq!(late.game().phase(), Phase::Deal);
    assert_eq!(late.last_applied(), None);
}

#[tokio::test]
async fn seat_actions_need_the_claiming_device() {
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let replicas = table(&store, &dir).await;
    assert_eq!(replicas[3].seat_holder(1), Some(DeviceId::new("device-1")));

    let marker = replicas[0].deal(6).unwrap();
    settle(&replicas, marker).await;
    let before = store.len();

    let hand = replicas[1].game().table().players()[0].sorted_hand();
    let foreign = Action::Pass { seat: 0, cards: hand[..3].to_vec() };
    assert!(matches!(
        replicas[1].submit(&foreign),
        Err(ReplicaError::Seat(SeatError::NotYourSeat))
    ));
    assert!(matches!(replicas[1].sit(0), Err(ReplicaError::Seat(SeatError::Taken))));
    assert!(matches!(replicas[1].sit(2), Err(ReplicaError::Seat(SeatError::Taken))));
    assert_eq!(store.len(), before);

    let marker = replicas[0].submit(&foreign).unwrap();
    settle(&replicas, marker).await;
    assert!(replicas[2].game().table().players()[0].done_passing());
    assert_converged(&replicas);
}

#[tokio::test]
async fn foreign_seat_entries_are_skipped_on_every_replica() {
    init_logging();
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let replicas = table(&store, &dir).await;
    let marker = replicas[0].deal(6).unwrap();
    settle(&replicas, marker).await;

    // Device 1 bypasses its replica and appends a pass for seat 0.
    let address = replicas[0].log_address().unwrap();
    let raw = store.connect(DeviceId::new("device-1")).open_log(&address).unwrap();
    let hand = replicas[0].game().table().players()[0].sorted_hand();
    let marker = raw
        .append(&Action::Pass { seat: 0, cards: hand[..3].to_vec() })
        .unwrap();
    settle(&replicas, marker).await;

    for r in &replicas {
        assert!(!r.game().table().players()[0].done_passing());
        assert_eq!(r.last_applied(), Some(marker));
    }
    assert_converged(&replicas);

    let marker = replicas[0].pass(hand[3..6].to_vec()).unwrap();
    settle(&replicas, marker).await;
    assert!(replicas[1].game().table().players()[0].done_passing());
}

#[tokio::test]
async fn concurrent_claims_go_to_the_first_in_log_order() {
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let a = replica(&store, &dir, "a");
    let b = replica(&store, &dir, "b");
    let (address, _) = a.host_game_with_id(12, 1).unwrap();
    b.join_game(&address).unwrap();

    // Neither claim has been replayed, so both pass local checks.
    let first = a.sit(0).unwrap();
    let second = b.sit(0).unwrap();
    assert!(first < second);
    let both = [a, b];
    settle(&both, second).await;

    for r in &both {
        assert_eq!(r.seat_holder(0), Some(DeviceId::new("a")));
    }
    assert_eq!(both[0].seat(), Some(0));
    assert_eq!(both[1].seat(), None);
    assert!(matches!(both[1].take(), Err(ReplicaError::Unseated)));
    assert!(matches!(
        both[0].sit(1),
        Err(ReplicaError::Seat(SeatError::AlreadySeated))
    ));

    let marker = both[1].sit(1).unwrap();
    settle(&both, marker).await;
    assert_eq!(both[0].seat_holder(1), Some(DeviceId::new("b")));
}

#[test]
fn attaching_outside_a_runtime_changes_nothing() {
    let store = SyncStore::new();
    let dir = tempfile::tempdir().unwrap();
    let host = replica(&store, &dir, "host");

    assert!(matches!(host.host_game_with_id(9, 1), Err(ReplicaError::NoRuntime)));
    assert_eq!(host.log_address(), None);
    assert!(!host.config().resume_file.exists());
    assert!(matches!(host.reattach(), Err(ReplicaError::NoRuntime)));

    let guest = replica(&store, &dir, "guest");
    let address = SyncConfig::default().game_group(9);
    assert!(matches!(guest.join_game(&address), Err(ReplicaError::NoRuntime)));
    assert!(matches!(
        store.connect(DeviceId::new("guest")).members(&address),
        Err(GroupError::NotFound(_))
    ));
}
