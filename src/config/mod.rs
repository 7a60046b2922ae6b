//! Application configuration.
//!
//! - `layout`: Display dimensions, zone boundaries and memory budgets
//! - `entities`: Default hub address and entity identifiers
//!
//! [`DashboardConfig`] bundles every externally supplied parameter. It is built once
//! at startup, checked with [`DashboardConfig::validate`] and never changes afterwards.

pub mod entities;
pub mod layout;

use embassy_time::Duration;
use embedded_graphics::prelude::Point;
use embedded_graphics::primitives::Rectangle;
// Re-export layout constants at config level for convenience
pub use layout::{
    BOTTOM_BAR_HEIGHT,
    BUTTON_BAR,
    CAMERA_AREA,
    IMAGE_SIZE_CAP,
    MAX_SENSORS,
    SCREEN,
    SCREEN_HEIGHT,
    SCREEN_WIDTH,
    STATE_BODY_CAPACITY,
    STATUS_BAR,
    TOP_BAR_HEIGHT,
};

use crate::command::Action;
use crate::entity::{Entity, EntityRef, command_body};
use crate::error::ConfigError;

/// Number of camera slots.
pub const CAMERA_SLOTS: usize = 2;

/// Default sensor refresh cadence.
pub const SENSOR_INTERVAL: Duration = Duration::from_millis(5000);

/// Default per-request deadline enforced by the engine.
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default time a notice stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_millis(3000);

/// Sensor entities shown in the status bar.
#[derive(Clone, Copy, Debug)]
pub struct SensorEntities<'a> {
    /// Job completion in percent.
    pub progress: EntityRef<'a>,
    /// Estimated finish time (ISO timestamp or free text).
    pub finish_time: EntityRef<'a>,
    /// Bed temperature.
    pub bed_temp: EntityRef<'a>,
    /// Hotend temperature.
    pub tool_temp: EntityRef<'a>,
    /// Binary sensor, `on` while a job is printing.
    pub printing: EntityRef<'a>,
}

impl<'a> SensorEntities<'a> {
    /// All sensors in poll order.
    pub const fn all(&self) -> [EntityRef<'a>; 5] {
        [self.progress, self.finish_time, self.bed_temp, self.tool_temp, self.printing]
    }
}

/// Button entities bound to the pause / resume / cancel buttons.
#[derive(Clone, Copy, Debug)]
pub struct ButtonEntities<'a> {
    pub pause: EntityRef<'a>,
    pub resume: EntityRef<'a>,
    pub cancel: EntityRef<'a>,
}

impl<'a> ButtonEntities<'a> {
    /// Entity pressed by `action`.
    pub const fn get(
        &self,
        action: Action,
    ) -> EntityRef<'a> {
        match action {
            Action::Pause => self.pause,
            Action::Resume => self.resume,
            Action::Cancel => self.cancel,
        }
    }
}

/// One camera slot: which entity it shows and where.
#[derive(Clone, Copy, Debug)]
pub struct CameraSlotConfig<'a> {
    /// Camera entity fetched into this slot.
    pub entity: EntityRef<'a>,
    /// Screen zone the frame is clipped to.
    pub viewport: Rectangle,
    /// Where the top-left corner of the frame is drawn (may lie outside the viewport).
    pub draw_origin: Point,
}

/// Every externally supplied parameter of the dashboard.
#[derive(Clone, Copy, Debug)]
pub struct DashboardConfig<'a> {
    /// Hub base URL, no trailing slash.
    pub base_url: &'a str,
    /// Opaque access token handed to the HTTP adapter unchanged.
    pub credential: &'a str,
    pub sensors: SensorEntities<'a>,
    pub cameras: [CameraSlotConfig<'a>; CAMERA_SLOTS],
    pub buttons: ButtonEntities<'a>,
    /// Largest accepted camera payload in bytes.
    pub image_size_cap: usize,
    /// Delay between the end of one poll cycle and the start of the next.
    pub sensor_interval: Duration,
    /// Delay between a camera fetch completing and the next one for the same slot.
    pub camera_interval: Duration,
    /// Deadline for a single HTTP exchange.
    pub request_timeout: Duration,
    /// How long a notice stays visible.
    pub notice_duration: Duration,
    /// Offset applied to UTC finish timestamps before display.
    pub utc_offset_minutes: i16,
}

impl<'a> DashboardConfig<'a> {
    /// Reference configuration for the given hub, with the default entities and layout.
    pub fn new(
        base_url: &'a str,
        credential: &'a str,
    ) -> Self {
        Self {
            base_url,
            credential,
            sensors: SensorEntities {
                progress: EntityRef::new(entities::PROGRESS),
                finish_time: EntityRef::new(entities::FINISH_TIME),
                bed_temp: EntityRef::new(entities::BED_TEMP),
                tool_temp: EntityRef::new(entities::TOOL_TEMP),
                printing: EntityRef::new(entities::PRINTING),
            },
            cameras: [
                CameraSlotConfig {
                    entity: EntityRef::new(entities::CAMERA_1),
                    viewport: CAMERA_AREA,
                    draw_origin: layout::CAMERA1_DRAW_ORIGIN,
                },
                CameraSlotConfig {
                    entity: EntityRef::new(entities::CAMERA_2),
                    viewport: CAMERA_AREA,
                    draw_origin: layout::CAMERA2_DRAW_ORIGIN,
                },
            ],
            buttons: ButtonEntities {
                pause: EntityRef::new(entities::BUTTON_PAUSE),
                resume: EntityRef::new(entities::BUTTON_RESUME),
                cancel: EntityRef::new(entities::BUTTON_CANCEL),
            },
            image_size_cap: IMAGE_SIZE_CAP,
            sensor_interval: SENSOR_INTERVAL,
            camera_interval: Duration::from_millis(0),
            request_timeout: REQUEST_TIMEOUT,
            notice_duration: NOTICE_DURATION,
            utc_offset_minutes: 0,
        }
    }

    /// Whether the two camera viewports share pixels (only one slot can be shown).
    pub fn cameras_overlap(&self) -> bool {
        let [first, second] = &self.cameras;
        let shared = first.viewport.intersection(&second.viewport);
        shared.size.width > 0 && shared.size.height > 0
    }

    /// Check the configuration against a scratch buffer of `scratch_len` bytes.
    pub fn validate(
        &self,
        scratch_len: usize,
    ) -> Result<(), ConfigError> {
        if self.image_size_cap == 0 {
            return Err(ConfigError::ImageCapZero);
        }
        if self.image_size_cap > scratch_len {
            return Err(ConfigError::ImageCapExceedsBuffer);
        }
        if self.sensor_interval.as_ticks() == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.request_timeout.as_ticks() == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.base_url.is_empty() || self.base_url.ends_with('/') {
            return Err(ConfigError::BaseUrl);
        }

        for sensor in self.sensors.all() {
            check_entity(self.base_url, Entity::Sensor(sensor))?;
        }
        for (index, camera) in self.cameras.iter().enumerate() {
            check_entity(self.base_url, Entity::Camera(camera.entity))?;
            let vp = camera.viewport;
            if vp.size.width == 0 || vp.size.height == 0 || SCREEN.intersection(&vp) != vp {
                return Err(ConfigError::ViewportOutOfBounds(index as u8));
            }
        }
        for action in Action::ALL {
            let button = self.buttons.get(action);
            check_entity(self.base_url, Entity::Command(button))?;
            command_body(button)?;
        }
        Ok(())
    }
}

fn check_entity(
    base_url: &str,
    entity: Entity<'_>,
) -> Result<(), ConfigError> {
    if entity.entity_ref().as_str().is_empty() {
        return Err(ConfigError::EmptyEntity);
    }
    entity.url(base_url).map(|_| ())
}

// =============================================================================
// Unit Tests
// =============================================================================
