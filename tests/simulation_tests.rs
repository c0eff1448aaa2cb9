// Integration scenarios for the frame-driven simulation

use std::cell::RefCell;
use std::rc::Rc;

use cell_survivor::monsters::{Position, Viewport};
use cell_survivor::skills::SkillId;
use cell_survivor::{EventHandler, GameConfig, GameEvent, Simulation, TickInput};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const FRAME_MS: u64 = 16;

// ===== Helpers =====

fn player() -> Position {
    Position::new(2400.0, 2400.0)
}

fn input(delta_ms: u64) -> TickInput {
    TickInput {
        delta_ms,
        player: player(),
        viewport: Viewport::centered_on(player(), 1600.0, 900.0),
    }
}

fn quiet_sim(seed: u64) -> Simulation {
    let config = GameConfig {
        seed,
        ..GameConfig::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    sim.set_spawning(false);
    sim
}

/// 开局选择一个会造成伤害的主动技能
fn start_with_damage_skill(sim: &mut Simulation) -> SkillId {
    sim.start();
    let options = sim.pending_choice().unwrap().to_vec();
    let pick = options
        .into_iter()
        .find(|id| *id != SkillId::Aegis)
        .unwrap();
    assert!(sim.choose_skill(pick));
    pick
}

fn run_until<F: Fn(&Simulation) -> bool>(sim: &mut Simulation, limit_ms: u64, done: F) {
    while sim.now() < limit_ms && !done(sim) {
        sim.tick(input(FRAME_MS));
    }
}

struct Recorder {
    seen: Rc<RefCell<Vec<&'static str>>>,
}

impl EventHandler for Recorder {
    fn handle(&mut self, event: &GameEvent) {
        self.seen.borrow_mut().push(event.event_type());
    }

    fn name(&self) -> &str {
        "recorder"
    }
}

// ===== Choices and pausing =====

#[test]
fn start_offers_three_actives_and_pauses() {
    let mut sim = quiet_sim(1);
    sim.start();

    let options = sim.pending_choice().unwrap();
    assert_eq!(options.len(), 3);
    assert!(options.iter().all(|id| sim.skills().definition(*id).unwrap().is_active()));
    assert!(sim.is_paused());

    let events = sim.drain_events();
    assert!(matches!(
        events.last(),
        Some(GameEvent::SkillChoicesOffered { level: 0, first_pick: true, .. })
    ));

    let report = sim.tick(input(FRAME_MS));
    assert!(!report.advanced);
    assert_eq!(sim.now(), 0);
}

#[test]
fn choosing_an_unoffered_skill_is_rejected() {
    let mut sim = quiet_sim(2);
    sim.start();
    assert!(!sim.choose_skill(SkillId::Vitality));
    assert!(sim.is_paused());

    let pick = sim.pending_choice().unwrap()[0];
    assert!(sim.choose_skill(pick));
    assert!(!sim.is_paused());
    assert_eq!(sim.skills().skill_level(pick), Some(0));
    assert!(
        sim.drain_events()
            .contains(&GameEvent::LevelUp { skill: pick, new_level: 0 })
    );

    // 没有待选时再次选择无效
    assert!(!sim.choose_skill(pick));
}

#[test]
fn external_pause_freezes_the_clock() {
    let mut sim = quiet_sim(3);
    sim.tick(input(100));
    sim.set_paused(true);
    sim.set_paused(true);
    assert!(!sim.tick(input(100)).advanced);
    assert_eq!(sim.now(), 100);

    sim.set_paused(false);
    sim.tick(input(100));
    assert_eq!(sim.now(), 200);

    let events = sim.drain_events();
    assert_eq!(events, vec![GameEvent::GamePaused, GameEvent::GameResumed]);
}

// ===== Combat and progression =====

#[test]
fn killing_a_monster_grants_exp_and_next_choice() {
    let mut sim = quiet_sim(4);
    start_with_damage_skill(&mut sim);
    let unit = sim.config().units().unit();
    let id = sim
        .spawn_monster("slime", player().offset(0.0, 2.0 * unit))
        .unwrap();

    run_until(&mut sim, 10_000, |s| s.total_kills() > 0);
    assert_eq!(sim.total_kills(), 1);
    assert!(sim.monsters().get(id).is_none());
    assert_eq!(sim.progression().current_exp, 20);

    let events = sim.drain_events();
    assert!(events.iter().any(|e| matches!(e, GameEvent::SkillActivated(_))));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, GameEvent::MonsterKilled(kill) if kill.id == id && kill.exp == 20))
    );

    assert_eq!(sim.debug_add_exp(80), Some(1));
    assert_eq!(sim.progression().current_level, 1);
    assert_eq!(sim.progression().current_exp, 0);
    assert_eq!(sim.progression().max_exp, 120);
    assert_eq!(sim.progression().current_hp, sim.progression().max_hp);
    // 第二次选择起包含被动技能
    let options = sim.pending_choice().unwrap();
    assert!(options.iter().any(|id| !sim.skills().definition(*id).unwrap().is_active()));
}

#[test]
fn contact_damage_is_rate_limited_per_monster() {
    let mut sim = quiet_sim(5);
    sim.spawn_monster("golem", player()).unwrap();

    sim.tick(input(FRAME_MS));
    assert_eq!(sim.progression().current_hp, 190);
    assert!(!sim.can_move());
    let hud = sim.hud();
    assert_eq!(hud.hp_ratio, 0.95);
    assert_eq!(hud.damaged_hp, 200);
    assert_eq!(hud.monster_count, 1);

    run_until(&mut sim, 3000, |_| false);
    assert_eq!(sim.progression().current_hp, 190);
    assert!(sim.can_move());
    assert_eq!(sim.hud().damaged_hp, 190);

    run_until(&mut sim, 3100, |_| false);
    assert_eq!(sim.progression().current_hp, 180);

    let damaged = sim
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::PlayerDamaged { .. }))
        .count();
    assert_eq!(damaged, 2);
}

#[test]
fn game_over_is_terminal_and_announced_once() {
    let mut sim = quiet_sim(6);
    for _ in 0..25 {
        sim.spawn_monster("golem", player()).unwrap();
    }

    let report = sim.tick(input(FRAME_MS));
    assert!(report.game_over);
    assert!(sim.is_game_over());
    assert!(sim.progression().is_dead());

    let frozen = sim.now();
    assert!(!sim.tick(input(FRAME_MS)).advanced);
    assert_eq!(sim.now(), frozen);
    assert!(sim.spawn_monster("slime", player()).is_err());
    assert_eq!(sim.debug_add_exp(1000), None);
    assert!(sim.hud().game_over);

    let overs = sim
        .drain_events()
        .into_iter()
        .filter(|e| e.is_game_over())
        .count();
    assert_eq!(overs, 1);
}

#[test]
fn regular_spawns_appear_outside_the_viewport() {
    let config = GameConfig {
        seed: 9,
        ..GameConfig::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    run_until(&mut sim, 1984, |_| false);
    assert_eq!(sim.monsters().len(), 0);

    let report = sim.tick(input(FRAME_MS));
    assert_eq!(report.spawned.len(), 1);

    let viewport = input(0).viewport;
    let spawned = sim
        .drain_events()
        .into_iter()
        .find_map(|e| match e {
            GameEvent::MonsterSpawned { position, boss, .. } => Some((position, boss)),
            _ => None,
        })
        .unwrap();
    let (position, boss) = spawned;
    assert!(!boss);
    assert!(
        position.y < viewport.y || position.x < viewport.x || position.x > viewport.right()
    );
}

#[test]
fn handlers_observe_published_events() {
    let mut sim = quiet_sim(8);
    let seen = Rc::new(RefCell::new(Vec::new()));
    sim.events_mut().subscribe_all(Box::new(Recorder { seen: seen.clone() }));

    sim.start();
    sim.set_paused(true);

    assert_eq!(
        *seen.borrow(),
        vec!["SkillChoicesOffered", "GamePaused"]
    );
}

// ===== Determinism =====

fn autopilot_run(seed: u64, millis: u64) -> Vec<GameEvent> {
    let config = GameConfig {
        seed,
        ..GameConfig::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    sim.start();
    let mut events = Vec::new();
    while sim.now() < millis && !sim.is_game_over() {
        if let Some(&first) = sim.pending_choice().and_then(|o| o.first()) {
            sim.choose_skill(first);
        }
        sim.tick(input(FRAME_MS));
        events.extend(sim.drain_events());
    }
    events
}

#[test]
fn same_seed_replays_the_same_run() {
    let a = autopilot_run(42, 20_000);
    let b = autopilot_run(42, 20_000);
    assert!(a.iter().any(|e| matches!(e, GameEvent::MonsterSpawned { .. })));
    assert_eq!(a, b);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn progression_stays_within_bounds(seed in any::<u64>()) {
        let config = GameConfig { seed, ..GameConfig::default() };
        let mut sim = Simulation::new(config).unwrap();
        sim.start();
        let mut last = 0;
        while sim.now() < 8_000 && !sim.is_game_over() {
            if let Some(&first) = sim.pending_choice().and_then(|o| o.first()) {
                sim.choose_skill(first);
            }
            sim.tick(input(FRAME_MS));
            let p = sim.progression();
            prop_assert!(p.current_hp <= p.max_hp);
            prop_assert!(p.current_shield <= p.max_shield);
            prop_assert!(p.current_exp < p.max_exp);
            prop_assert!(sim.now() >= last);
            last = sim.now();
        }
    }
}
