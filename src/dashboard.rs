//! Display compositor: the single cooperative loop driving every component.
//!
//! [`Dashboard::tick`] runs one loop iteration in a fixed order:
//!
//! 1. poll scheduler step (sensor states into the cache)
//! 2. image pipeline step for both camera slots
//! 3. command completions, then at most one touch event into the dispatcher
//! 4. notice expiry and repaint of the dirty zones
//!
//! Every step is bounded: network work is one adapter poll per channel, decoding is
//! one synchronous call, and painting only touches zones whose content changed. The
//! compositor itself never talks to the network; it only hands the adapter to the
//! components that do.

use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use heapless::Vec;

use crate::camera::{FrameDecoder, ImagePipeline, SlotId, SlotUpdate};
use crate::colors::BLACK;
use crate::command::{Action, CommandDispatcher, Completion};
use crate::config::layout::NOTICE_AREA;
use crate::config::{CAMERA_SLOTS, DashboardConfig};
use crate::error::{ConfigError, Rejected};
use crate::http::HttpClient;
use crate::log_buffer;
use crate::poll::{CycleOutcome, PollScheduler};
use crate::render::{Mark, RenderState};
use crate::state::{Notice, NoticeKind, StateCache, TouchEvent, TouchTracker, Zone, hit_test};
use crate::widgets::primitives::fill_area;
use crate::widgets::{StatusView, draw_button_bar, draw_camera, draw_notice, draw_status_bar};

/// Touch controller as seen by the compositor.
pub trait TouchSource {
    /// Current contact point, `None` while no finger is down.
    fn poll_touch(&mut self) -> Option<Point>;
}

impl<F> TouchSource for F
where
    F: FnMut() -> Option<Point>,
{
    fn poll_touch(&mut self) -> Option<Point> { self() }
}

/// Zones repainted during one tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Painted {
    pub status: bool,
    pub buttons: bool,
    pub cameras: [bool; CAMERA_SLOTS],
    pub notice: bool,
}

impl Painted {
    /// Whether anything was drawn.
    pub fn any(&self) -> bool { self.status || self.buttons || self.notice || self.cameras.iter().any(|c| *c) }
}

/// What happened during one [`Dashboard::tick`].
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    /// Poll cycle that ended this tick.
    pub cycle: Option<CycleOutcome>,
    /// Camera fetch that ended this tick.
    pub camera: Option<SlotUpdate>,
    /// Commands that completed this tick.
    pub completions: Vec<Completion, 3>,
    /// Touch event consumed this tick.
    pub touch: Option<TouchEvent>,
    /// Button press submitted this tick and whether it was accepted.
    pub command: Option<(Action, Result<(), Rejected>)>,
    pub painted: Painted,
}

/// The dashboard engine: owns the cache, the components and the render state.
pub struct Dashboard<'a, D> {
    config: DashboardConfig<'a>,
    cache: StateCache<'a>,
    scheduler: PollScheduler<'a>,
    pipeline: ImagePipeline<'a, D>,
    dispatcher: CommandDispatcher<'a>,
    touch: TouchTracker,
    notice: Option<Notice>,
    /// Slot shown when the viewports overlap.
    active: SlotId,
    render: RenderState,
}

impl<'a, D: FrameDecoder> Dashboard<'a, D> {
    /// Build the engine after validating `config` against the scratch buffer.
    pub fn new(
        config: DashboardConfig<'a>,
        scratch: &'a mut [u8],
        decoder: D,
    ) -> Result<Self, ConfigError> {
        config.validate(scratch.len())?;
        log_info!("Dashboard up, {} sensors", config.sensors.all().len());
        Ok(Self {
            cache: StateCache::new(),
            scheduler: PollScheduler::new(&config),
            pipeline: ImagePipeline::new(&config, scratch, decoder),
            dispatcher: CommandDispatcher::new(&config),
            touch: TouchTracker::new(),
            notice: None,
            active: SlotId::First,
            render: RenderState::new(),
            config,
        })
    }

    #[inline]
    pub const fn config(&self) -> &DashboardConfig<'a> { &self.config }

    #[inline]
    pub const fn cache(&self) -> &StateCache<'a> { &self.cache }

    #[inline]
    pub const fn scheduler(&self) -> &PollScheduler<'a> { &self.scheduler }

    #[inline]
    pub const fn pipeline(&self) -> &ImagePipeline<'a, D> { &self.pipeline }

    #[inline]
    pub const fn dispatcher(&self) -> &CommandDispatcher<'a> { &self.dispatcher }

    /// Notice currently shown.
    #[inline]
    pub const fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }

    /// Slot shown when the viewports overlap.
    #[inline]
    pub const fn active_slot(&self) -> SlotId { self.active }

    /// Repaint every zone on the next tick (e.g. after the panel was reset).
    pub const fn invalidate(&mut self) { self.render.invalidate(); }

    /// Run one loop iteration.
    pub fn tick<H, T, G>(
        &mut self,
        now: Instant,
        http: &mut H,
        touch: &mut T,
        display: &mut G,
    ) -> TickReport
    where
        H: HttpClient,
        T: TouchSource,
        G: DrawTarget<Color = Rgb565>,
    {
        log_buffer::set_clock(now);
        let mut report = TickReport::default();

        // 1. Sensor states
        report.cycle = self.scheduler.tick(now, http, &mut self.cache);

        // 2. Cameras
        report.camera = self.pipeline.service(now, http);
        for slot in SlotId::ALL {
            self.pipeline.request(slot, now, http);
        }

        // 3. Commands, then one touch event
        report.completions = self.dispatcher.service(now, http);
        for done in &report.completions {
            let kind = match done.result {
                Ok(()) => NoticeKind::CommandSent(done.action),
                Err(err) => NoticeKind::CommandFailed(done.action, err),
            };
            self.notice = Some(Notice::new(kind, now));
        }
        if let Some(point) = self.touch.just_pressed(touch.poll_touch(), now) {
            let viewports = self.config.cameras.map(|camera| camera.viewport);
            if let Some(zone) = hit_test(point, &viewports) {
                let event = TouchEvent { zone, at: now };
                report.command = self.handle_touch(event, http);
                report.touch = Some(event);
            }
        }

        // 4. Notice expiry and paint
        if self.notice.is_some_and(|notice| notice.is_expired(now, self.config.notice_duration)) {
            self.notice = None;
        }
        report.painted = self.paint(display);
        report
    }

    fn handle_touch<H: HttpClient>(
        &mut self,
        event: TouchEvent,
        http: &mut H,
    ) -> Option<(Action, Result<(), Rejected>)> {
        match event.zone {
            Zone::Button(action) => {
                let result = self.dispatcher.submit(action, event.at, http);
                if result.is_err() {
                    self.notice = Some(Notice::new(NoticeKind::CommandBusy(action), event.at));
                }
                Some((action, result))
            }
            Zone::Camera => {
                if self.config.cameras_overlap() {
                    self.active = self.active.other();
                    log_debug!("Showing camera {}", self.active.index() + 1);
                }
                None
            }
        }
    }

    /// Whether `slot`'s viewport is drawn.
    fn is_visible(
        &self,
        slot: SlotId,
    ) -> bool {
        !self.config.cameras_overlap() || slot == self.active
    }

    fn paint<G>(
        &mut self,
        display: &mut G,
    ) -> Painted
    where
        G: DrawTarget<Color = Rgb565>,
    {
        let mut painted = Painted::default();
        self.render.update_active(self.active);
        self.render.update_notice(self.notice.as_ref());

        let offline = self.scheduler.is_offline();
        if self.render.check_dirty(Mark::Status { revision: self.cache.revision(), offline }) {
            let sensors = &self.config.sensors;
            let view = StatusView {
                progress: self.cache.get(sensors.progress),
                finish: self.cache.get(sensors.finish_time),
                bed: self.cache.get(sensors.bed_temp),
                tool: self.cache.get(sensors.tool_temp),
                printing: self.cache.get(sensors.printing),
                offline,
                utc_offset_minutes: self.config.utc_offset_minutes,
            };
            draw_status_bar(display, &view);
            painted.status = true;
        }

        let busy = Action::ALL.map(|action| self.dispatcher.is_busy(action));
        if self.render.check_dirty(Mark::Buttons(busy)) {
            draw_button_bar(display, busy);
            painted.buttons = true;
        }

        if self.render.notice_just_closed() {
            fill_area(display, &NOTICE_AREA, BLACK);
        }
        for slot in SlotId::ALL {
            if !self.is_visible(slot) {
                continue;
            }
            let camera = self.pipeline.slot(slot);
            let mark = Mark::Camera {
                slot,
                frames: camera.frames_decoded(),
                failed: camera.last_error().is_some(),
            };
            if self.render.check_dirty(mark) {
                draw_camera(display, camera);
                painted.cameras[slot.index()] = true;
            }
        }

        if self.render.need_notice(painted.cameras.iter().any(|c| *c))
            && let Some(notice) = &self.notice
        {
            draw_notice(display, &notice.kind());
            painted.notice = true;
        }

        self.render.end_frame();
        painted
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
