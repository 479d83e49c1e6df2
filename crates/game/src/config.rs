use std::fs;
use std::path::Path;

use serde::Deserialize;

pub type ConfigResult<T> = Result<T, String>;

/// Simulation tuning knobs. Defaults match the classic feel; a JSON file can
/// override any subset.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    /// Player horizontal speed, units per frame.
    pub walk_speed: f32,
    /// Upward push while a jump state holds, units per frame.
    pub jump_speed: f32,
    /// Enemy walker speed, units per frame.
    pub patrol_speed: f32,
    /// Per-frame gravity acceleration.
    pub gravity: f32,
    /// Cap on gravity-driven fall speed. One-sided: gravity stops adding at
    /// the cap but never pulls an externally larger velocity back down.
    pub max_fall_speed: f32,
    /// Frames a jump state can hold before falling wins.
    pub jump_duration_frames: u32,
    /// Idle frames in upright-stay before the sleep cycle starts.
    pub sleep_delay_frames: u32,
    /// Frames an attack state holds.
    pub attack_duration_frames: u32,
    /// Push-back speed while knocked back, units per frame.
    pub knockback_speed: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            walk_speed: 1.0,
            jump_speed: 3.0,
            patrol_speed: 0.5,
            gravity: 1.0,
            max_fall_speed: 2.0,
            jump_duration_frames: 20,
            sleep_delay_frames: 1800,
            attack_duration_frames: 24,
            knockback_speed: 1.0,
        }
    }
}

pub fn load_tuning(path: &Path) -> ConfigResult<Tuning> {
    let text = fs::read_to_string(path)
        .map_err(|error| format!("read tuning file {}: {error}", path.display()))?;
    parse_tuning(&text)
}

pub fn parse_tuning(text: &str) -> ConfigResult<Tuning> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    match serde_path_to_error::deserialize::<_, Tuning>(&mut deserializer) {
        Ok(tuning) => Ok(tuning),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse tuning json: {source}"))
            } else {
                Err(format!("parse tuning json at {path}: {source}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_constants() {
        let tuning = Tuning::default();
        assert_eq!(tuning.walk_speed, 1.0);
        assert_eq!(tuning.jump_speed, 3.0);
        assert_eq!(tuning.gravity, 1.0);
        assert_eq!(tuning.max_fall_speed, 2.0);
        assert_eq!(tuning.jump_duration_frames, 20);
        assert_eq!(tuning.sleep_delay_frames, 1800);
    }

    #[test]
    fn partial_overrides_keep_remaining_defaults() {
        let tuning = parse_tuning(r#"{ "walk_speed": 1.5, "sleep_delay_frames": 60 }"#)
            .expect("parse");
        assert_eq!(tuning.walk_speed, 1.5);
        assert_eq!(tuning.sleep_delay_frames, 60);
        assert_eq!(tuning.jump_speed, 3.0);
    }

    #[test]
    fn parse_error_reports_the_failing_path() {
        let error = parse_tuning(r#"{ "walk_speed": "fast" }"#).expect_err("must fail");
        assert!(error.contains("walk_speed"), "error was: {error}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = parse_tuning(r#"{ "wak_speed": 1.5 }"#).expect_err("must fail");
        assert!(error.contains("wak_speed"), "error was: {error}");
    }

    #[test]
    fn load_tuning_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tuning.json");
        fs::write(&path, r#"{ "gravity": 0.5 }"#).expect("write");
        let tuning = load_tuning(&path).expect("load");
        assert_eq!(tuning.gravity, 0.5);

        assert!(load_tuning(&dir.path().join("absent.json")).is_err());
    }
}
