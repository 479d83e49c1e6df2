use std::path::PathBuf;

use engine::{
    load_tmx_file, sheet_frames, Animation, KeySet, MaterialGroup, NullGraphics, TileTemplate,
    TileTemplateId, Vec2, World,
};
use game::{load_tuning, Session, Tuning};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const MAP_ENV_VAR: &str = "PLATFORM_MAP";
const TUNING_ENV_VAR: &str = "PLATFORM_TUNING";
const FRAMES_ENV_VAR: &str = "PLATFORM_FRAMES";
const DEFAULT_FRAMES: u64 = 240;

fn main() {
    init_tracing();

    let tuning = match resolve_tuning() {
        Ok(tuning) => tuning,
        Err(err) => {
            error!(error = %err, "startup_failed");
            std::process::exit(1);
        }
    };

    let mut session = match build_session(tuning) {
        Ok(session) => session,
        Err(err) => {
            error!(error = %err, "startup_failed");
            std::process::exit(1);
        }
    };

    let frames = frame_budget_from_env();
    info!(frames, actors = session.controller().actor_count(), "sim_started");
    for _ in 0..frames {
        session.step(KeySet::empty(), Vec::new());
    }
    for id in session.controller().actor_ids().collect::<Vec<_>>() {
        if let Ok(actor) = session.controller().actor(id) {
            let rect = actor.rect();
            info!(id = id.0, x = rect.x, y = rect.y, "actor_at");
        }
    }
    info!(frame = session.frame(), "sim_finished");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn resolve_tuning() -> Result<Tuning, String> {
    match std::env::var(TUNING_ENV_VAR) {
        Ok(path) => load_tuning(&PathBuf::from(path)),
        Err(_) => Ok(Tuning::default()),
    }
}

fn build_session(tuning: Tuning) -> Result<Session, String> {
    match std::env::var(MAP_ENV_VAR) {
        Ok(path) => {
            let map = load_tmx_file(&PathBuf::from(&path))
                .map_err(|err| format!("load map {path}: {err}"))?;
            Session::from_map(&map, tuning, Box::new(NullGraphics))
                .map_err(|err| format!("build session from {path}: {err}"))
        }
        Err(_) => {
            let mut session = Session::new(demo_world(), tuning, Box::new(NullGraphics));
            session
                .spawn(game::actors::PLAYER_TYPE, Vec2::new(32.0, 130.0))
                .map_err(|err| format!("spawn demo player: {err}"))?;
            session
                .spawn(game::actors::SPEARHEAD_TYPE, Vec2::new(128.0, 144.0))
                .map_err(|err| format!("spawn demo spearhead: {err}"))?;
            Ok(session)
        }
    }
}

/// Built-in fallback level: a flat floor with a couple of platforms, enough
/// to watch gravity, walking and ledge turns without a map file.
fn demo_world() -> World {
    let deco = TileTemplate::new(
        MaterialGroup::Deco,
        Animation::uniform(sheet_frames(0, 1), (16, 16), 10),
    );
    let solid = TileTemplate::new(
        MaterialGroup::Solid,
        Animation::uniform(sheet_frames(0, 2), (16, 16), 10),
    );
    let mut world = World::new((20, 12), (16, 16), vec![deco, solid]);
    world.add_layer("background");
    let main = world.add_layer("main");

    let solid_id = TileTemplateId(1);
    for col in 0..20 {
        world
            .create_tile(main, Vec2::new((col * 16) as f32, 160.0), solid_id)
            .expect("demo floor placement is in bounds");
    }
    for col in 6..10 {
        world
            .create_tile(main, Vec2::new((col * 16) as f32, 112.0), solid_id)
            .expect("demo platform placement is in bounds");
    }
    world
}

fn frame_budget_from_env() -> u64 {
    std::env::var(FRAMES_ENV_VAR)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(DEFAULT_FRAMES)
}
