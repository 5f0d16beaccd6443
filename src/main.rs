//! Entry point for the **i3-glyphs** daemon.
//!
//! Default mode runs the label synchronization engine against the i3/sway
//! IPC socket until the process is killed.  `--list-windows` instead prints
//! the metadata of every open window once and exits — useful when writing
//! classification rules.

use i3_glyphs::config::Config;
use i3_glyphs::engine::SyncEngine;
use i3_glyphs::i3::I3Link;
use i3_glyphs::traits::WmLink;
use log::{error, info};
use std::path::PathBuf;

/// Resolve the config directory (`$XDG_CONFIG_HOME/i3-glyphs`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("i3-glyphs")
}

/// Try to load the config from `path` (or the default location),
/// falling back to compiled-in defaults.
fn load_config(path: Option<PathBuf>) -> Config {
    let path = path.unwrap_or_else(|| config_dir().join("config.json"));
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Argument parsing

struct Args {
    config_file: Option<PathBuf>,
    list_windows: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        config_file: None,
        list_windows: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-l" | "--list-windows" => args.list_windows = true,
            "-c" | "--config-file" => {
                args.config_file = it.next().map(PathBuf::from);
            }
            other => {
                eprintln!("unknown argument: {}", other);
                eprintln!("usage: i3-glyphs [-c <config.json>] [-l]");
                std::process::exit(2);
            }
        }
    }
    args
}

//  Main

fn main() {
    env_logger::init();

    let args = parse_args();
    if args.list_windows {
        run_list_windows();
    } else {
        run_daemon(args.config_file);
    }
}

/// Normal daemon mode.
fn run_daemon(config_file: Option<PathBuf>) {
    let config = load_config(config_file);
    let link = I3Link::new();
    let mut engine = SyncEngine::new(link, &config);
    if let Err(e) = engine.run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// One-shot diagnostic mode: print every open window and exit.
fn run_list_windows() {
    let mut link = I3Link::new();
    match link.list_windows() {
        Ok(windows) => {
            for w in windows {
                println!("name: {:80}", w.title);
                println!("class: {}", w.class);
                println!("instance: {}", w.instance);
                println!("---");
            }
        }
        Err(e) => {
            error!("failed to list windows: {}", e);
            std::process::exit(1);
        }
    }
}
