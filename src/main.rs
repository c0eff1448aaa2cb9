//! 无界面模拟入口
//! 用法: cell_survivor [--config PATH] [--seconds N] [--seed S] [--events]

use std::env;
use std::f64::consts::TAU;

use anyhow::{Context, Result};
use cell_survivor::monsters::{Position, Viewport};
use cell_survivor::{GameConfig, Simulation, TickInput};
use log::info;
use thiserror::Error;

/// 每帧时长（约 60 FPS）
const FRAME_MS: u64 = 16;
/// 自动驾驶绕地图中心的半径（单位）
const ORBIT_RADIUS_UNITS: f64 = 3.0;

#[derive(Debug, Error)]
enum ArgsError {
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("invalid value {value:?} for {flag}")]
    InvalidNumber { flag: String, value: String },
    #[error("unknown argument {0}")]
    UnknownFlag(String),
}

#[derive(Debug)]
struct Args {
    config: Option<String>,
    seconds: u64,
    seed: Option<u64>,
    events: bool,
}

fn parse_number(flag: &str, value: Option<String>) -> Result<u64, ArgsError> {
    let value = value.ok_or_else(|| ArgsError::MissingValue(flag.to_string()))?;
    value.parse().map_err(|_| ArgsError::InvalidNumber {
        flag: flag.to_string(),
        value,
    })
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Args, ArgsError> {
    let mut parsed = Args {
        config: None,
        seconds: 60,
        seed: None,
        events: false,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                parsed.config = Some(
                    args.next()
                        .ok_or_else(|| ArgsError::MissingValue(arg.clone()))?,
                )
            }
            "--seconds" => parsed.seconds = parse_number(&arg, args.next())?,
            "--seed" => parsed.seed = Some(parse_number(&arg, args.next())?),
            "--events" => parsed.events = true,
            _ => return Err(ArgsError::UnknownFlag(arg)),
        }
    }
    Ok(parsed)
}

/// 玩家沿圆周绕地图中心移动，硬直期间停下
struct Autopilot {
    center: Position,
    radius: f64,
    angle: f64,
}

impl Autopilot {
    fn position(&self) -> Position {
        self.center.offset(self.angle, self.radius)
    }

    fn step(&mut self, sim: &Simulation, delta_ms: u64) -> Position {
        if sim.can_move() && self.radius > 0.0 {
            let unit = sim.config().units().unit();
            let distance = sim.player_speed() * unit * delta_ms as f64 / 1000.0;
            self.angle = (self.angle + distance / self.radius) % TAU;
        }
        self.position()
    }
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();

    let args = parse_args(env::args().skip(1)).context("Failed to parse arguments")?;
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut sim = Simulation::new(config).context("Invalid configuration")?;
    let center = Position::new(sim.config().map.width / 2.0, sim.config().map.height / 2.0);
    let mut pilot = Autopilot {
        center,
        radius: sim.config().units().to_px(ORBIT_RADIUS_UNITS),
        angle: 0.0,
    };
    let (width, height) = (sim.config().viewport_width, sim.config().viewport_height);

    sim.start();
    let duration_ms = args.seconds.saturating_mul(1000);
    while sim.now() < duration_ms && !sim.is_game_over() {
        if let Some(&first) = sim.pending_choice().and_then(|options| options.first()) {
            sim.choose_skill(first);
        }
        let player = pilot.step(&sim, FRAME_MS);
        sim.tick(TickInput {
            delta_ms: FRAME_MS,
            player,
            viewport: Viewport::centered_on(player, width, height),
        });

        for event in sim.drain_events() {
            if args.events {
                println!("{}", event.to_json_line()?);
            }
        }
    }

    let hud = sim.hud();
    info!("simulation finished");
    println!("=== Summary ===");
    println!("Elapsed:  {:.1}s", hud.elapsed_ms as f64 / 1000.0);
    println!("Level:    {}", hud.level);
    println!("Kills:    {}", sim.total_kills());
    println!("HP:       {}/{}", hud.hp, hud.max_hp);
    println!("Monsters: {}", hud.monster_count);
    for slot in hud.active_slots.iter().chain(&hud.passive_slots).flatten() {
        println!("Skill:    {} Lv.{}", slot.name, slot.level);
    }
    if hud.game_over {
        println!("Game Over!");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, ArgsError> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["--seconds", "5", "--seed", "9", "--events"]).unwrap();
        assert_eq!(parsed.seconds, 5);
        assert_eq!(parsed.seed, Some(9));
        assert!(parsed.events);
        assert!(parsed.config.is_none());

        assert!(matches!(args(&["--seed"]), Err(ArgsError::MissingValue(_))));
        assert!(matches!(
            args(&["--seconds", "soon"]),
            Err(ArgsError::InvalidNumber { .. })
        ));
        assert!(matches!(args(&["--fast"]), Err(ArgsError::UnknownFlag(_))));
    }
}
