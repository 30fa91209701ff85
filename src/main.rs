// SPDX-License-Identifier: MIT
//
// asciidoom — drive a pixel-producing engine in the terminal.
//
// The real customer of asciidoom-term is a game engine that hands over an
// ARGB frame every tick. This binary ships a small stand-in: an animated
// color field with a square you steer with the arrow keys or WASD. It is
// enough to exercise every path a game takes: held keys, key releases,
// titles, both render modes and both input models.
//
// Usage:
//
//   asciidoom [--color] [--threaded] [--size WxH] [--fps N]
//
// Logging goes to a file because the terminal is the frame surface:
//
//   ASCIIDOOM_LOG=/tmp/asciidoom.log RUST_LOG=debug asciidoom

use std::env;
use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;

use asciidoom_term::{
    Action, Engine, Frontend, FrontendConfig, InputMode, KeyCode, KeyEvent, RenderMode, TickLoop,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: asciidoom [--color] [--threaded] [--size WxH] [--fps N]";

/// Side of the player square, in pixels.
const PLAYER_SIZE: usize = 8;

/// Pixels moved per tick while a direction is held.
const PLAYER_SPEED: usize = 2;

// ─── Demo Engine ────────────────────────────────────────────────────────────

/// Directions currently held, tracked from press / release edges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Held {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

struct Demo {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
    x: usize,
    y: usize,
    held: Held,
    title: String,
}

impl Demo {
    fn new(width: usize, height: usize) -> Self {
        let mut demo = Self {
            width,
            height,
            pixels: vec![0; width * height],
            x: width.saturating_sub(PLAYER_SIZE) / 2,
            y: height.saturating_sub(PLAYER_SIZE) / 2,
            held: Held::default(),
            title: String::new(),
        };
        demo.retitle();
        demo
    }

    /// Apply one key edge. Returns `true` if the engine should quit.
    fn apply(&mut self, event: KeyEvent) -> bool {
        let down = event.is_press();
        match event.key {
            k if k == KeyCode::ESCAPE || Some(k) == KeyCode::from_char('q') => return down,
            k if k == KeyCode::LEFT || Some(k) == KeyCode::from_char('a') => self.held.left = down,
            k if k == KeyCode::RIGHT || Some(k) == KeyCode::from_char('d') => {
                self.held.right = down;
            }
            k if k == KeyCode::UP || Some(k) == KeyCode::from_char('w') => self.held.up = down,
            k if k == KeyCode::DOWN || Some(k) == KeyCode::from_char('s') => self.held.down = down,
            _ => {}
        }
        false
    }

    /// Move the player by whatever is held, clamped to the frame.
    fn step(&mut self) {
        let max_x = self.width.saturating_sub(PLAYER_SIZE);
        let max_y = self.height.saturating_sub(PLAYER_SIZE);
        if self.held.left {
            self.x = self.x.saturating_sub(PLAYER_SPEED);
        }
        if self.held.right {
            self.x = (self.x + PLAYER_SPEED).min(max_x);
        }
        if self.held.up {
            self.y = self.y.saturating_sub(PLAYER_SPEED);
        }
        if self.held.down {
            self.y = (self.y + PLAYER_SPEED).min(max_y);
        }
    }

    fn retitle(&mut self) {
        self.title = format!("asciidoom ({}, {})", self.x, self.y);
    }

    /// Paint the color field at time `t_ms`, then the player on top.
    #[allow(clippy::cast_possible_truncation)] // Channels wrap.
    fn render(&mut self, t_ms: u32) {
        let t = t_ms as usize;
        for (row_index, row) in self.pixels.chunks_exact_mut(self.width).enumerate() {
            for (col, pixel) in row.iter_mut().enumerate() {
                let r = (col * 255 / self.width + t / 8) as u8;
                let g = (row_index * 255 / self.height + t / 16) as u8;
                let b = ((col + row_index) / 2 + t / 32) as u8;
                *pixel = argb(r / 2, g / 2, b / 2);
            }
        }

        let (x1, y1) = (
            (self.x + PLAYER_SIZE).min(self.width),
            (self.y + PLAYER_SIZE).min(self.height),
        );
        for row in self.pixels.chunks_exact_mut(self.width).take(y1).skip(self.y) {
            row[self.x..x1].fill(argb(255, 255, 255));
        }
    }
}

const fn argb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

impl Engine for Demo {
    fn tick(&mut self, frontend: &mut Frontend) -> Action {
        while let Some(event) = frontend.next_event() {
            if self.apply(event) {
                return Action::Quit;
            }
        }

        let before = (self.x, self.y);
        self.step();
        if before != (self.x, self.y) {
            self.retitle();
        }
        self.render(frontend.ticks_elapsed_ms());
        Action::Continue
    }

    fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    fn title(&self) -> Option<&str> {
        Some(self.title.as_str())
    }
}

// ─── Arguments ──────────────────────────────────────────────────────────────

/// Map command-line flags onto a validated frontend configuration.
fn parse_args(args: &[String]) -> Result<FrontendConfig, String> {
    let mut config = FrontendConfig::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--color" => config.mode = RenderMode::Color,
            "--threaded" => config.input = InputMode::Threaded,
            "--size" => {
                let value = iter.next().ok_or("--size needs WxH")?;
                let (w, h) = value
                    .split_once('x')
                    .ok_or_else(|| format!("bad size {value:?}, expected WxH"))?;
                config.width = w.parse().map_err(|_| format!("bad width {w:?}"))?;
                config.height = h.parse().map_err(|_| format!("bad height {h:?}"))?;
            }
            "--fps" => {
                let value = iter.next().ok_or("--fps needs a number")?;
                let fps: u64 = value.parse().map_err(|_| format!("bad fps {value:?}"))?;
                if fps == 0 {
                    return Err("fps must be at least 1".into());
                }
                config.tick_interval_ms = 1000 / fps;
            }
            other => return Err(format!("unknown argument {other:?}\n{USAGE}")),
        }
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Log to the file named by `ASCIIDOOM_LOG`, if any.
///
/// Filtered by `RUST_LOG`, `info` when unset.
fn init_logging() -> std::io::Result<()> {
    let Some(path) = env::var_os("ASCIIDOOM_LOG") else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let config = match parse_args(&args) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("asciidoom: {msg}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging() {
        eprintln!("asciidoom: cannot open log file: {e}");
        return ExitCode::FAILURE;
    }

    let mut demo = Demo::new(config.width, config.height);
    let mut tick_loop = match TickLoop::new(&config) {
        Ok(tick_loop) => tick_loop,
        Err(e) => {
            eprintln!("asciidoom: failed to initialize terminal: {e}");
            return ExitCode::FAILURE;
        }
    };

    match tick_loop.run(&mut demo) {
        Ok(ticks) => {
            info!(ticks, "session ended");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(%e, "session failed");
            eprintln!("asciidoom: {e}");
            ExitCode::FAILURE
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    fn press(key: KeyCode) -> KeyEvent {
        KeyEvent::press(key)
    }

    // ── Arguments ─────────────────────────────────────────────────────────

    #[test]
    fn no_args_gives_defaults() {
        let config = parse_args(&[]).unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 400);
        assert_eq!(config.mode, RenderMode::Gradient);
        assert_eq!(config.input, InputMode::NonBlocking);
    }

    #[test]
    fn all_flags() {
        let config =
            parse_args(&args(&["--color", "--threaded", "--size", "80x50", "--fps", "35"])).unwrap();
        assert_eq!(config.mode, RenderMode::Color);
        assert_eq!(config.input, InputMode::Threaded);
        assert_eq!((config.width, config.height), (80, 50));
        assert_eq!(config.tick_interval_ms, 28);
    }

    #[test]
    fn bad_size_rejected() {
        assert!(parse_args(&args(&["--size", "80"])).is_err());
        assert!(parse_args(&args(&["--size", "ax5"])).is_err());
        assert!(parse_args(&args(&["--size"])).is_err());
    }

    #[test]
    fn overflowing_size_rejected_before_allocation() {
        let err = parse_args(&args(&["--size", "4294967296x4294967296"])).unwrap_err();
        // 32-bit targets already fail to parse the width.
        assert!(
            err.contains("invalid frame dimensions") || err.contains("bad width"),
            "{err}"
        );
        assert!(parse_args(&args(&["--size", "0x10"])).is_err());
    }

    #[test]
    fn zero_fps_rejected() {
        assert!(parse_args(&args(&["--fps", "0"])).is_err());
    }

    #[test]
    fn unknown_flag_rejected() {
        let err = parse_args(&args(&["--turbo"])).unwrap_err();
        assert!(err.contains("--turbo"));
    }

    // ── Demo engine ───────────────────────────────────────────────────────

    #[test]
    fn starts_centered() {
        let demo = Demo::new(40, 20);
        assert_eq!((demo.x, demo.y), (16, 6));
        assert_eq!(demo.pixels().len(), 800);
        assert_eq!(demo.title(), Some("asciidoom (16, 6)"));
    }

    #[test]
    fn held_key_moves_until_released() {
        let mut demo = Demo::new(40, 20);
        assert!(!demo.apply(press(KeyCode::RIGHT)));
        demo.step();
        demo.step();
        assert_eq!(demo.x, 20);

        demo.apply(KeyEvent::release(KeyCode::RIGHT));
        demo.step();
        assert_eq!(demo.x, 20);
    }

    #[test]
    fn wasd_matches_arrows() {
        let mut demo = Demo::new(40, 20);
        demo.apply(press(KeyCode::from_char('w').unwrap()));
        assert!(demo.held.up);
        demo.apply(press(KeyCode::from_char('a').unwrap()));
        assert!(demo.held.left);
    }

    #[test]
    fn movement_is_clamped() {
        let mut demo = Demo::new(10, 10);
        demo.apply(press(KeyCode::DOWN));
        demo.apply(press(KeyCode::RIGHT));
        for _ in 0..20 {
            demo.step();
        }
        assert_eq!((demo.x, demo.y), (2, 2));
    }

    #[test]
    fn quit_keys() {
        let mut demo = Demo::new(10, 10);
        assert!(demo.apply(press(KeyCode::ESCAPE)));
        assert!(demo.apply(press(KeyCode::from_char('q').unwrap())));
        assert!(!demo.apply(KeyEvent::release(KeyCode::ESCAPE)));
    }

    #[test]
    fn player_is_white() {
        let mut demo = Demo::new(16, 16);
        demo.render(0);
        let center = demo.y * 16 + demo.x;
        assert_eq!(demo.pixels[center], 0xFFFF_FFFF);
        assert_ne!(demo.pixels[0], 0xFFFF_FFFF);
    }
}
