//! Freeroam CLI - drive the movement core headlessly against a world file

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use freeroam::config::{MovementConfig, WorldConfig};
use freeroam::game::{self, constants::movement::DEFAULT_TIMESTEP, BodyPose, InputAction, Stance};

#[derive(Parser)]
#[command(name = "freeroam")]
#[command(about = "Freeroam movement core CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a player in a world for a number of frames
    Simulate {
        /// Path to world.toml
        world: PathBuf,
        /// Movement config TOML (defaults when omitted)
        #[arg(short, long, env = "FREEROAM_CONFIG")]
        config: Option<PathBuf>,
        /// Number of frames to simulate
        #[arg(short, long, default_value = "240")]
        frames: u32,
        /// Frame time in seconds
        #[arg(long, default_value_t = DEFAULT_TIMESTEP)]
        dt: f32,
        /// Actions held for the whole run (forward, back, left, right, run)
        #[arg(long, value_delimiter = ',')]
        hold: Vec<InputAction>,
        /// Frames on which jump is pressed
        #[arg(long, value_delimiter = ',')]
        jump_at: Vec<u32>,
        /// Frames on which crouch is toggled
        #[arg(long, value_delimiter = ',')]
        crouch_at: Vec<u32>,
        /// Print every Nth frame
        #[arg(long, default_value = "10")]
        every: u32,
        /// Emit one JSON object per printed frame
        #[arg(long)]
        json: bool,
    },
    /// Run every collision probe once at a position
    Probe {
        /// Path to world.toml
        world: PathBuf,
        /// Movement config TOML (defaults when omitted)
        #[arg(short, long, env = "FREEROAM_CONFIG")]
        config: Option<PathBuf>,
        /// Body center as x,y,z
        #[arg(long, value_delimiter = ',', num_args = 3, allow_hyphen_values = true)]
        at: Vec<f32>,
        /// Probe as a crouched body
        #[arg(long)]
        crouched: bool,
    },
    /// Print the default movement config as TOML
    Defaults,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            world,
            config,
            frames,
            dt,
            hold,
            jump_at,
            crouch_at,
            every,
            json,
        } => simulate(
            &world,
            config.as_deref(),
            SimulateOptions {
                frames,
                dt,
                hold,
                jump_at,
                crouch_at,
                every: every.max(1),
                json,
            },
        ),
        Commands::Probe {
            world,
            config,
            at,
            crouched,
        } => probe(&world, config.as_deref(), &at, crouched),
        Commands::Defaults => print_defaults(),
    }
}

fn load_world(path: &Path) -> WorldConfig {
    match WorldConfig::from_file(path) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_movement(path: Option<&Path>) -> MovementConfig {
    let Some(path) = path else {
        return MovementConfig::default();
    };
    match MovementConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

// =============================================================================
// Simulate Command
// =============================================================================

struct SimulateOptions {
    frames: u32,
    dt: f32,
    hold: Vec<InputAction>,
    jump_at: Vec<u32>,
    crouch_at: Vec<u32>,
    every: u32,
    json: bool,
}

fn simulate(world_path: &Path, config_path: Option<&Path>, opts: SimulateOptions) {
    let world = load_world(world_path);
    let base = load_movement(config_path);

    let mut controller = match game::build_session(&world, base) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    for action in &opts.hold {
        controller.set_input(*action, true);
    }

    if !opts.json {
        println!(
            "Simulating '{}' for {} frames at dt={:.4}",
            world.name, opts.frames, opts.dt
        );
    }

    for frame in 0..opts.frames {
        if opts.jump_at.contains(&frame) {
            controller.set_input(InputAction::Jump, true);
            controller.set_input(InputAction::Jump, false);
        }
        if opts.crouch_at.contains(&frame) {
            controller.set_input(InputAction::Crouch, true);
            controller.set_input(InputAction::Crouch, false);
        }

        controller.update(opts.dt);

        let last = frame + 1 == opts.frames;
        if frame % opts.every != 0 && !last {
            continue;
        }
        let state = controller.state();
        if opts.json {
            let line = serde_json::json!({
                "frame": frame,
                "position": [state.position.x, state.position.y, state.position.z],
                "velocity": [state.velocity.x, state.velocity.y, state.velocity.z],
                "crouching": state.stance == Stance::Crouching,
                "jumping": state.jumping,
                "can_jump": state.can_jump,
                "eye_offset": controller.eye_offset(),
            });
            println!("{}", line);
        } else {
            println!(
                "  Frame {:>4}: pos=({:.2}, {:.2}, {:.2}) vel=({:.2}, {:.2}, {:.2}) {:?}{}",
                frame,
                state.position.x,
                state.position.y,
                state.position.z,
                state.velocity.x,
                state.velocity.y,
                state.velocity.z,
                state.stance,
                if state.jumping { " jumping" } else { "" }
            );
        }
    }
}

// =============================================================================
// Probe Command
// =============================================================================

fn probe(world_path: &Path, config_path: Option<&Path>, at: &[f32], crouched: bool) {
    let world = load_world(world_path);
    let base = load_movement(config_path);
    let controller = match game::build_session(&world, base) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let position = match at {
        [x, y, z] => nalgebra::Vector3::new(*x, *y, *z),
        _ => controller.position(),
    };
    let pose = BodyPose {
        position,
        stance: if crouched {
            Stance::Crouching
        } else {
            Stance::Standing
        },
        vertical_velocity: 0.0,
    };
    let queries = controller.queries();

    println!("Probes at ({:.2}, {:.2}, {:.2}) {:?}", position.x, position.y, position.z, pose.stance);
    println!("  ground height:  {:.2}", queries.ground_height(&pose));
    match queries.landing_height(&pose) {
        Some(h) => println!("  landing height: {:.2}", h),
        None => println!("  landing height: none"),
    }
    println!("  overhead block: {}", queries.overhead_blocked(&pose));
    println!("  can stand:      {}", queries.can_stand(&pose));
    for (name, dir) in [
        ("+x", nalgebra::Vector3::x()),
        ("-x", -nalgebra::Vector3::x()),
        ("+z", nalgebra::Vector3::z()),
        ("-z", -nalgebra::Vector3::z()),
    ] {
        let blocked = if crouched {
            queries.is_crouch_blocked(&pose, dir)
        } else {
            queries.is_blocked(&pose, dir)
        };
        println!("  blocked {}:     {}", name, blocked);
    }
}

// =============================================================================
// Defaults Command
// =============================================================================

fn print_defaults() {
    match toml::to_string_pretty(&MovementConfig::default()) {
        Ok(text) => print!("{}", text),
        Err(e) => {
            eprintln!("Error: Failed to serialize defaults: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_report_accepts_movement_config() {
        let cli = Cli::try_parse_from([
            "freeroam", "probe", "world.toml", "--config", "movement.toml", "--at", "1,-2,3",
        ])
        .expect("args should parse");

        match cli.command {
            Commands::Probe { config, at, .. } => {
                assert_eq!(config, Some(PathBuf::from("movement.toml")));
                assert_eq!(at, vec![1.0, -2.0, 3.0]);
            }
            _ => panic!("wrong subcommand parsed"),
        }
    }

    #[test]
    fn test_load_movement_reads_file() {
        let path = std::env::temp_dir().join(format!("freeroam-movement-{}.toml", std::process::id()));
        std::fs::write(&path, "player_radius = 2.5\n").expect("write temp config");

        let config = load_movement(Some(&path));
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.player_radius, 2.5);
        assert_eq!(config.walk_speed, MovementConfig::default().walk_speed);
        assert_eq!(load_movement(None), MovementConfig::default());
    }
}
