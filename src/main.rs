//! Hammer Fight headless driver
//!
//! Runs a session in autopilot for a fixed number of ticks and logs the
//! outcome. Usage: `hammer-fight [tuning.json] [ticks] [seed]`

use std::error::Error;

use hammer_fight::Tuning;
use hammer_fight::sim::{GameEvent, RenderSnapshot, Session, TickInput, tick};

const DEFAULT_TICKS: u64 = 60 * 60;
const DEFAULT_SEED: u64 = 0x4841_4d4d;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) if path != "-" => {
            log::info!("loading tuning from {path}");
            Tuning::from_json(&std::fs::read_to_string(&path)?)?
        }
        _ => Tuning::default(),
    };
    let ticks = args.next().map(|s| s.parse()).transpose()?.unwrap_or(DEFAULT_TICKS);
    let seed = args.next().map(|s| s.parse()).transpose()?.unwrap_or(DEFAULT_SEED);

    log::info!("Hammer Fight (headless) starting: {ticks} ticks, seed {seed}");
    let mut session = Session::new(tuning, seed)?;
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    let mut hits = 0u64;
    for _ in 0..ticks {
        tick(&mut session, &input);
        for event in session.drain_events() {
            match event {
                GameEvent::HammerHit => hits += 1,
                GameEvent::EnemyKilled { id, bonus } => {
                    log::debug!("tick {}: enemy {} down ({bonus:?})", session.time_ticks, id.0);
                }
                GameEvent::GameOver { score } => {
                    log::info!("tick {}: hammer destroyed, score {score}", session.time_ticks);
                }
                _ => {}
            }
        }
        if session.is_over() {
            break;
        }
    }

    let snapshot = RenderSnapshot::capture(&session);
    log::info!(
        "finished after {} ticks: score {}, armor {:.0}/{:.0}, {} hits taken, {} enemies on field",
        snapshot.tick,
        snapshot.score,
        snapshot.armor,
        snapshot.max_armor,
        hits,
        snapshot.enemies.len()
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    session.teardown();
    Ok(())
}
