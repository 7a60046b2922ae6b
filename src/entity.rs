//! Entity references and the hub REST endpoints they map to.
//!
//! An [`EntityRef`] is an opaque, immutable entity id such as
//! `sensor.octoprint_job_percentage`; two references are equal when their strings are.
//! [`Entity`] tags a reference with what the engine does with it, which fixes the
//! endpoint and method:
//!
//! | Kind | Request |
//! |------|---------|
//! | `Sensor` | `GET {base}/api/states/{entity}` |
//! | `Camera` | `GET {base}/api/camera_proxy/{entity}` |
//! | `Command` | `POST {base}/api/services/button/press` with `{"entity_id":"{entity}"}` |

use core::fmt::{self, Write};

use heapless::String;

use crate::error::ConfigError;
use crate::http::Method;

/// Capacity of a request URL.
pub const URL_CAPACITY: usize = 160;

/// Capacity of a command request body.
pub const COMMAND_BODY_CAPACITY: usize = 128;

/// Fixed-capacity request URL.
pub type Url = String<URL_CAPACITY>;

/// Fixed-capacity command body.
pub type CommandBody = String<COMMAND_BODY_CAPACITY>;

/// Opaque entity identifier. Equality is string equality.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EntityRef<'a>(&'a str);

impl<'a> EntityRef<'a> {
    #[inline]
    pub const fn new(id: &'a str) -> Self { Self(id) }

    #[inline]
    pub const fn as_str(&self) -> &'a str { self.0 }
}

impl fmt::Display for EntityRef<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// An entity tagged with the role it plays.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Entity<'a> {
    /// Sensor or binary sensor whose state is polled.
    Sensor(EntityRef<'a>),
    /// Camera whose snapshot is fetched.
    Camera(EntityRef<'a>),
    /// Button pressed by a command.
    Command(EntityRef<'a>),
}

impl<'a> Entity<'a> {
    /// The underlying reference.
    pub const fn entity_ref(&self) -> EntityRef<'a> {
        match self {
            Self::Sensor(e) | Self::Camera(e) | Self::Command(e) => *e,
        }
    }

    /// HTTP method used for this entity.
    pub const fn method(&self) -> Method {
        match self {
            Self::Sensor(_) | Self::Camera(_) => Method::Get,
            Self::Command(_) => Method::Post,
        }
    }

    /// Build the request URL against `base_url` (no trailing slash).
    pub fn url(
        &self,
        base_url: &str,
    ) -> Result<Url, ConfigError> {
        let mut url = Url::new();
        let written = match self {
            Self::Sensor(e) => write!(url, "{base_url}/api/states/{e}"),
            Self::Camera(e) => write!(url, "{base_url}/api/camera_proxy/{e}"),
            Self::Command(_) => write!(url, "{base_url}/api/services/button/press"),
        };
        written.map_err(|_| ConfigError::UrlTooLong)?;
        Ok(url)
    }
}

/// JSON body of a button press: `{"entity_id":"<entity>"}`.
pub fn command_body(entity: EntityRef<'_>) -> Result<CommandBody, ConfigError> {
    let mut body = CommandBody::new();
    write!(body, "{{\"entity_id\":\"{entity}\"}}").map_err(|_| ConfigError::UrlTooLong)?;
    Ok(body)
}

// =============================================================================
// Unit Tests
// =============================================================================
