//! Printer dashboard simulator for desktop.
//!
//! Runs the engine against an in-process fake hub inside an SDL window. Mouse clicks
//! stand in for the touch controller.
//!
//! ```bash
//! cargo run --bin simulator --features simulator -- [camera1.jpg] [camera2.jpg]
//! ```
//!
//! Keys: `O` takes the hub offline and back, `Q` quits.

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

use std::collections::HashMap;
use std::time::Duration as StdDuration;
use std::{env, fs, thread};

use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::sdl2::{Keycode, MouseButton};
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use printer_dashboard::camera::JpegDecoder;
use printer_dashboard::colors::BLACK;
use printer_dashboard::config::entities::{
    BED_TEMP,
    BUTTON_CANCEL,
    BUTTON_PAUSE,
    BUTTON_RESUME,
    CAMERA_1,
    CAMERA_2,
    FINISH_TIME,
    HUB_BASE_URL,
    PRINTING,
    PROGRESS,
    TOOL_TEMP,
};
use printer_dashboard::config::{IMAGE_SIZE_CAP, SCREEN_HEIGHT, SCREEN_WIDTH};
use printer_dashboard::http::{Channel, HttpClient, HttpError, Method, Progress, Request};
use printer_dashboard::log_buffer::drain_logs;
use printer_dashboard::{Dashboard, DashboardConfig};

/// Loop period (about 30 ticks per second).
const FRAME_TIME: StdDuration = StdDuration::from_millis(33);

/// Body bytes handed out per poll, so downloads span several ticks.
const CHUNK: usize = 2048;

/// Length of the simulated print in seconds.
const PRINT_SECONDS: u64 = 600;

// =============================================================================
// Fake Hub
// =============================================================================

struct Exchange {
    status: u16,
    body: Vec<u8>,
    head_sent: bool,
    offset: usize,
}

/// In-process stand-in for the Home Assistant hub.
struct FakeHub {
    started: std::time::Instant,
    offline: bool,
    paused: bool,
    cancelled: bool,
    snapshots: [Option<Vec<u8>>; 2],
    active: HashMap<Channel, Exchange>,
}

impl FakeHub {
    fn new(snapshots: [Option<Vec<u8>>; 2]) -> Self {
        Self {
            started: std::time::Instant::now(),
            offline: false,
            paused: false,
            cancelled: false,
            snapshots,
            active: HashMap::new(),
        }
    }

    fn elapsed_secs(&self) -> u64 { self.started.elapsed().as_secs() % PRINT_SECONDS }

    fn state_of(
        &self,
        entity: &str,
    ) -> Option<String> {
        let elapsed = self.elapsed_secs();
        let printing = !self.paused && !self.cancelled;
        let state = match entity {
            PROGRESS if self.cancelled => "0".to_string(),
            PROGRESS => (elapsed * 100 / PRINT_SECONDS).to_string(),
            FINISH_TIME => {
                let finish = 12 * 60 + (PRINT_SECONDS / 60) as u32;
                format!("2026-10-17T{:02}:{:02}:00+00:00", finish / 60, finish % 60)
            }
            BED_TEMP => format!("{:.1}", 60.0 + (elapsed as f32 * 0.3).sin()),
            TOOL_TEMP if printing => format!("{:.1}", 210.0 + (elapsed as f32 * 0.2).sin() * 2.0),
            TOOL_TEMP => "25.0".to_string(),
            PRINTING => (if printing { "on" } else { "off" }).to_string(),
            _ => return None,
        };
        Some(format!(r#"{{"entity_id":"{entity}","state":"{state}","attributes":{{}}}}"#))
    }

    fn respond(
        &mut self,
        request: &Request<'_>,
    ) -> (u16, Vec<u8>) {
        let Some(path) = request.url.strip_prefix(HUB_BASE_URL) else {
            return (404, Vec::new());
        };
        match (request.method, path) {
            (Method::Get, path) if path.starts_with("/api/states/") => {
                match self.state_of(&path["/api/states/".len()..]) {
                    Some(body) => (200, body.into_bytes()),
                    None => (404, Vec::new()),
                }
            }
            (Method::Get, path) if path.starts_with("/api/camera_proxy/") => {
                let slot = match &path["/api/camera_proxy/".len()..] {
                    CAMERA_1 => 0,
                    CAMERA_2 => 1,
                    _ => return (404, Vec::new()),
                };
                match &self.snapshots[slot] {
                    Some(jpeg) => (200, jpeg.clone()),
                    None => (404, Vec::new()),
                }
            }
            (Method::Post, "/api/services/button/press") => {
                let body = request.body.map(String::from_utf8_lossy).unwrap_or_default();
                if body.contains(BUTTON_PAUSE) {
                    self.paused = true;
                } else if body.contains(BUTTON_RESUME) {
                    self.paused = false;
                } else if body.contains(BUTTON_CANCEL) {
                    self.cancelled = true;
                } else {
                    return (400, Vec::new());
                }
                println!("hub: {body}");
                (200, b"[]".to_vec())
            }
            _ => (404, Vec::new()),
        }
    }
}

impl HttpClient for FakeHub {
    fn start(
        &mut self,
        channel: Channel,
        request: &Request<'_>,
    ) -> Result<(), HttpError> {
        if self.offline {
            return Err(HttpError::Transport);
        }
        let (status, body) = self.respond(request);
        self.active.insert(channel, Exchange {
            status,
            body,
            head_sent: false,
            offset: 0,
        });
        Ok(())
    }

    fn poll(
        &mut self,
        channel: Channel,
        buf: &mut [u8],
    ) -> Result<Progress, HttpError> {
        let exchange = self.active.get_mut(&channel).ok_or(HttpError::Transport)?;
        if !exchange.head_sent {
            exchange.head_sent = true;
            return Ok(Progress::Head {
                status: exchange.status,
                content_length: Some(exchange.body.len()),
            });
        }
        let rest = &exchange.body[exchange.offset..];
        if rest.is_empty() {
            self.active.remove(&channel);
            return Ok(Progress::Done);
        }
        let n = rest.len().min(CHUNK).min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        exchange.offset += n;
        Ok(Progress::Body(n))
    }

    fn abort(
        &mut self,
        channel: Channel,
    ) {
        self.active.remove(&channel);
    }
}

// =============================================================================
// Main Loop
// =============================================================================

fn load_snapshot(path: Option<String>) -> Option<Vec<u8>> {
    let path = path?;
    match fs::read(&path) {
        Ok(data) => Some(data),
        Err(err) => {
            eprintln!("cannot read {path}: {err}");
            None
        }
    }
}

fn print_logs() {
    let lost = drain_logs(|entry| {
        println!("[{:>8}] {} {}", entry.timestamp_ms, entry.level.prefix(), entry.message);
    });
    if let Some(lost @ 1..) = lost {
        println!("({lost} log entries lost)");
    }
}

fn main() {
    let mut args = env::args().skip(1);
    let snapshots = [load_snapshot(args.next()), load_snapshot(args.next())];
    let mut hub = FakeHub::new(snapshots);

    let config = DashboardConfig::new(HUB_BASE_URL, "simulator-token");
    let scratch: &'static mut [u8] = Box::leak(vec![0u8; IMAGE_SIZE_CAP].into_boxed_slice());
    let mut dashboard = match Dashboard::new(config, scratch, JpegDecoder) {
        Ok(dashboard) => dashboard,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return;
        }
    };

    let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(Size::new(SCREEN_WIDTH, SCREEN_HEIGHT));
    let output_settings = OutputSettingsBuilder::new().scale(2).build();
    let mut window = Window::new("Printer Dashboard Sim", &output_settings);
    display.clear(BLACK).ok();
    window.update(&display);

    let mut contact: Option<Point> = None;

    loop {
        let frame_start = std::time::Instant::now();

        for ev in window.events() {
            match ev {
                SimulatorEvent::Quit => return,
                SimulatorEvent::KeyDown { keycode, repeat, .. } => {
                    if repeat {
                        continue;
                    }
                    match keycode {
                        Keycode::Q => return,
                        Keycode::O => {
                            hub.offline = !hub.offline;
                            println!("hub {}", if hub.offline { "offline" } else { "online" });
                        }
                        _ => {}
                    }
                }
                SimulatorEvent::MouseButtonDown {
                    mouse_btn: MouseButton::Left,
                    point,
                } => contact = Some(point),
                SimulatorEvent::MouseButtonUp {
                    mouse_btn: MouseButton::Left, ..
                } => contact = None,
                _ => {}
            }
        }

        let mut touch = || contact;
        dashboard.tick(Instant::now(), &mut hub, &mut touch, &mut display);
        print_logs();

        window.update(&display);

        if let Some(rest) = FRAME_TIME.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }
}
