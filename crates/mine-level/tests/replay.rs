use mine_core::{decode_move_lossy, encode_move, Direction, Intent, Outcome, ReplayConfig};
use mine_level::{check, grid_from_rows, load, replay, save, verify, DemoVerdict};
use mine_world::{Demo, Game, Level};
use proptest::prelude::*;

fn exit_walk() -> Level {
    let grid = grid_from_rows(&[
        "       X", //
        "        ", //
        "        ", //
        "        ", //
        "        ", //
        "        ", //
        "        ", //
        "P       ",
    ])
    .unwrap();
    Level::from_grid(grid)
}

fn mine() -> Level {
    let grid = grid_from_rows(&[
        "@@@@@@@@@@", //
        "@r.e.$.r.@", //
        "@.~..Y..s@", //
        "@ . A  . @", //
        "@.r..r.e.@", //
        "@P  ..  :@", //
        "@@@@@@@@@@",
    ])
    .unwrap();
    let mut level = Level::from_grid(grid);
    level.props.push_probability = 50;
    level.props.swamp_rate = 3;
    level.props.loot_target = 5;
    level
}

fn play(level: &Level, seed: u32, moves: &[u8]) -> Game {
    let mut game = Game::new(level, seed).unwrap();
    for code in moves {
        game.set_intent(0, decode_move_lossy(*code)).unwrap();
        game.apply_turn();
    }
    game
}

#[test]
fn exit_walk_demo_replays_from_file() {
    let mut level = exit_walk();
    let mut moves = vec![encode_move(Intent::step(Direction::Right)); 7];
    moves.extend(vec![encode_move(Intent::step(Direction::Up)); 7]);

    let game = play(&level, 11, &moves);
    assert_eq!(game.outcome(), Outcome::Success);
    let demo = game.record_demo("fourteen steps");
    assert!(demo.expect_success);
    assert_eq!(demo.moves, moves);
    level.add_demo(demo);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("walk.lvl");
    save(&path, &level).unwrap();
    let loaded = load(&path).unwrap();

    let report = replay(&loaded, &loaded.demos()[0]).unwrap();
    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(report.stats, *game.stats());
    assert_eq!(report.stats.steps, 14);
    assert_eq!(verify(&loaded, &loaded.demos()[0]), DemoVerdict::Consistent);
}

#[test]
fn corrupt_demo_does_not_hide_the_others() {
    let mut level = exit_walk();
    let mut moves = vec![encode_move(Intent::step(Direction::Right)); 7];
    moves.extend(vec![encode_move(Intent::step(Direction::Up)); 7]);
    let mut good = Demo::new(4, moves, "good");
    good.expect_success = true;
    let mut corrupt = Demo::new(4, b"E?".to_vec(), "corrupt");
    corrupt.expect_success = true;
    level.add_demo(corrupt);
    level.add_demo(good);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.lvl");
    save(&path, &level).unwrap();
    let loaded = load(&path).unwrap();
    assert!(loaded.validate_layout().is_ok());

    let config = ReplayConfig::default();
    let results: Vec<_> = loaded
        .demos()
        .iter()
        .map(|demo| check(&loaded, demo, &config))
        .collect();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "corrupt");
    assert!(results[0].report.is_none());
    assert!(!results[0].verdict.is_consistent());

    assert_eq!(results[1].title, "good");
    assert!(results[1].verdict.is_consistent());
    let report = results[1].report.as_ref().unwrap();
    assert_eq!(report.outcome, Outcome::Success);
}

#[test]
fn tampered_demo_is_inconsistent() {
    let level = exit_walk();
    let moves = vec![encode_move(Intent::step(Direction::Right)); 14];
    let mut demo = play(&level, 11, &moves).record_demo("wrong way");
    assert!(!demo.expect_success);

    demo.expect_success = true;
    assert!(matches!(
        verify(&level, &demo),
        DemoVerdict::Inconsistent { .. }
    ));
}

#[test]
fn report_serializes_to_json() {
    let level = exit_walk();
    let demo = play(&level, 2, b"EEE").record_demo("short");
    let report = replay(&level, &demo).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["title"], "short");
    assert_eq!(json["ticks_played"], 3);
    assert_eq!(json["stats"]["steps"], 3);
}

fn move_strings() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(b'A'..=b'O', 0..120)
}

proptest! {
    #[test]
    fn prop_recorded_demo_replays_identically(seed in any::<u32>(), moves in move_strings()) {
        let level = mine();
        let game = play(&level, seed, &moves);
        let demo = game.record_demo("fuzz");

        let report = replay(&level, &demo).unwrap();
        prop_assert_eq!(report.outcome, game.outcome());
        prop_assert_eq!(&report.stats, game.stats());
        prop_assert!(verify(&level, &demo).is_consistent());
    }
}
