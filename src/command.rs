//! Command dispatcher: turns button taps into button-press calls on the hub.
//!
//! Each tap becomes exactly one `POST /api/services/button/press`. While a request
//! for a button entity is outstanding, further taps on it are rejected with
//! [`Rejected::InFlight`]; the marker clears when the request completes, whether it
//! succeeded or not. Each button runs on its own [`Channel::Command`], so pause and
//! cancel can be in flight together.

use embassy_time::{Duration, Instant};
use heapless::Vec;

use crate::config::{ButtonEntities, DashboardConfig};
use crate::entity::{Entity, EntityRef, command_body};
use crate::error::{FetchError, Rejected};
use crate::http::{Channel, HttpClient, Overflow, Request, Step, Transfer};

/// Response bodies are not needed; they are read into this small sink.
const DISCARD_LEN: usize = 64;

/// Print job action bound to a button.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Pause,
    Resume,
    Cancel,
}

impl Action {
    /// Button order, left to right.
    pub const ALL: [Self; 3] = [Self::Pause, Self::Resume, Self::Cancel];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Pause => 0,
            Self::Resume => 1,
            Self::Cancel => 2,
        }
    }

    /// Button caption.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pause => "PAUSE",
            Self::Resume => "RESUME",
            Self::Cancel => "CANCEL",
        }
    }

    #[inline]
    pub const fn channel(self) -> Channel { Channel::Command(self.index() as u8) }
}

/// An accepted button press.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CommandRequest<'a> {
    pub entity: EntityRef<'a>,
    pub issued_at: Instant,
}

/// A finished command reported by [`CommandDispatcher::service`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Completion {
    pub action: Action,
    pub result: Result<(), FetchError>,
}

enum Exchange {
    Sending(Transfer),
    /// The request could not be sent; reported on the next service call.
    Refused(FetchError),
}

struct InFlight<'a> {
    request: CommandRequest<'a>,
    exchange: Exchange,
}

/// Issues button presses with per-entity de-duplication.
pub struct CommandDispatcher<'a> {
    buttons: ButtonEntities<'a>,
    in_flight: [Option<InFlight<'a>>; 3],
    base_url: &'a str,
    credential: &'a str,
    timeout: Duration,
    discard: [u8; DISCARD_LEN],
}

impl<'a> CommandDispatcher<'a> {
    pub fn new(config: &DashboardConfig<'a>) -> Self {
        Self {
            buttons: config.buttons,
            in_flight: [None, None, None],
            base_url: config.base_url,
            credential: config.credential,
            timeout: config.request_timeout,
            discard: [0; DISCARD_LEN],
        }
    }

    /// Outstanding request of `action`'s button, if any.
    pub fn pending(
        &self,
        action: Action,
    ) -> Option<&CommandRequest<'a>> {
        self.in_flight[action.index()].as_ref().map(|flight| &flight.request)
    }

    /// Whether a tap on `action` would be rejected right now.
    pub fn is_busy(
        &self,
        action: Action,
    ) -> bool {
        let entity = self.buttons.get(action);
        self.in_flight.iter().flatten().any(|flight| flight.request.entity == entity)
    }

    /// Issue the press for `action`, unless its entity already has one outstanding.
    ///
    /// A request that cannot even be sent is still accepted; its failure is reported
    /// by the next [`service`](Self::service) call like any other completion.
    pub fn submit<H: HttpClient>(
        &mut self,
        action: Action,
        now: Instant,
        http: &mut H,
    ) -> Result<(), Rejected> {
        if self.is_busy(action) {
            log_warn!("{} rejected: in flight", action.label());
            return Err(Rejected::InFlight);
        }

        let entity = self.buttons.get(action);
        let exchange = match self.begin(action, entity, now, http) {
            Ok(transfer) => Exchange::Sending(transfer),
            Err(err) => Exchange::Refused(err),
        };
        self.in_flight[action.index()] = Some(InFlight {
            request: CommandRequest { entity, issued_at: now },
            exchange,
        });
        log_info!("{} sent", action.label());
        Ok(())
    }

    /// Advance every outstanding request by one step and collect those that ended.
    pub fn service<H: HttpClient>(
        &mut self,
        now: Instant,
        http: &mut H,
    ) -> Vec<Completion, 3> {
        let mut completions = Vec::new();
        for action in Action::ALL {
            let slot = &mut self.in_flight[action.index()];
            let Some(flight) = slot.as_mut() else {
                continue;
            };
            let result = match &mut flight.exchange {
                Exchange::Refused(err) => Err(*err),
                Exchange::Sending(transfer) => match transfer.advance(http, &mut self.discard, now) {
                    Step::Pending => continue,
                    Step::Complete { .. } => Ok(()),
                    Step::Failed(err) => Err(err),
                },
            };
            *slot = None;

            match result {
                Ok(()) => log_info!("{} done", action.label()),
                Err(err) => log_error!("{} failed: {}", action.label(), err),
            }
            // One slot per action, cannot overflow
            let _ = completions.push(Completion { action, result });
        }
        completions
    }

    fn begin<H: HttpClient>(
        &self,
        action: Action,
        entity: EntityRef<'a>,
        now: Instant,
        http: &mut H,
    ) -> Result<Transfer, FetchError> {
        let command = Entity::Command(entity);
        let url = command.url(self.base_url).map_err(|_| FetchError::CONNECTION)?;
        let body = command_body(entity).map_err(|_| FetchError::CONNECTION)?;
        let request = Request {
            method: command.method(),
            url: url.as_str(),
            credential: self.credential,
            body: Some(body.as_bytes()),
        };
        Transfer::start(http, action.channel(), &request, now, self.timeout, Overflow::Discard)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::entities::HUB_BASE_URL;
    use crate::http::Method;
    use crate::testing::{FakeHttp, Reply};

    fn at(ms: u64) -> Instant { Instant::from_millis(ms) }

    fn dispatcher() -> CommandDispatcher<'static> { CommandDispatcher::new(&DashboardConfig::new(HUB_BASE_URL, "token")) }

    /// Service until `action` completes.
    fn complete(
        dispatcher: &mut CommandDispatcher<'static>,
        http: &mut FakeHttp,
        action: Action,
        start: u64,
    ) -> Completion {
        for ms in start..start + 10_000 {
            if let Some(done) = dispatcher.service(at(ms), http).into_iter().find(|c| c.action == action) {
                return done;
            }
        }
        panic!("command did not complete");
    }

    #[test]
    fn test_cancel_tap_scenario() {
        let mut dispatcher = dispatcher();
        let mut http = FakeHttp::new();
        http.script(Action::Cancel.channel(), Reply::ok(b"[]").held());

        // First tap goes out
        assert_eq!(dispatcher.submit(Action::Cancel, at(0), &mut http), Ok(()));
        let sent = &http.requests(Action::Cancel.channel())[0];
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.url, "http://homeassistant.local:8123/api/services/button/press");
        assert_eq!(sent.body.as_deref(), Some(&br#"{"entity_id":"button.octoprint_stop_job"}"#[..]));

        // Second tap while outstanding
        dispatcher.service(at(1), &mut http);
        assert_eq!(dispatcher.submit(Action::Cancel, at(2), &mut http), Err(Rejected::InFlight));
        assert_eq!(http.requests(Action::Cancel.channel()).len(), 1);

        // Completion clears the marker
        http.release(Action::Cancel.channel());
        assert_eq!(complete(&mut dispatcher, &mut http, Action::Cancel, 3).result, Ok(()));
        assert!(!dispatcher.is_busy(Action::Cancel));

        // Third tap accepted
        assert_eq!(dispatcher.submit(Action::Cancel, at(100), &mut http), Ok(()));
        assert_eq!(http.requests(Action::Cancel.channel()).len(), 2);
    }

    #[test]
    fn test_failure_clears_marker() {
        let mut dispatcher = dispatcher();
        let mut http = FakeHttp::new();
        http.script(Action::Pause.channel(), Reply::status(401));

        dispatcher.submit(Action::Pause, at(0), &mut http).unwrap();
        let done = complete(&mut dispatcher, &mut http, Action::Pause, 1);

        assert_eq!(done.result, Err(FetchError::HttpStatus(401)));
        assert!(dispatcher.pending(Action::Pause).is_none());
        assert_eq!(dispatcher.submit(Action::Pause, at(10), &mut http), Ok(()));
    }

    #[test]
    fn test_refused_start_reported_on_service() {
        let mut dispatcher = dispatcher();
        let mut http = FakeHttp::new();
        http.refuse_start(Action::Resume.channel());

        assert_eq!(dispatcher.submit(Action::Resume, at(0), &mut http), Ok(()));
        assert!(dispatcher.is_busy(Action::Resume));
        let completions = dispatcher.service(at(1), &mut http);
        assert_eq!(
            completions.as_slice(),
            &[Completion {
                action: Action::Resume,
                result: Err(FetchError::CONNECTION)
            }]
        );
        assert!(!dispatcher.is_busy(Action::Resume));
    }

    #[test]
    fn test_timeout_clears_marker() {
        let mut dispatcher = dispatcher();
        let mut http = FakeHttp::new();

        dispatcher.submit(Action::Pause, at(0), &mut http).unwrap();
        let done = complete(&mut dispatcher, &mut http, Action::Pause, 1);
        assert_eq!(done.result, Err(FetchError::TIMEOUT));
        assert_eq!(http.aborts(Action::Pause.channel()), 1);
    }

    #[test]
    fn test_different_buttons_in_flight_together() {
        let mut dispatcher = dispatcher();
        let mut http = FakeHttp::new();

        assert_eq!(dispatcher.submit(Action::Pause, at(0), &mut http), Ok(()));
        assert_eq!(dispatcher.submit(Action::Cancel, at(0), &mut http), Ok(()));
        assert!(dispatcher.is_busy(Action::Pause));
        assert!(!dispatcher.is_busy(Action::Resume));
    }

    #[test]
    fn test_shared_entity_deduplicated() {
        let mut config = DashboardConfig::new(HUB_BASE_URL, "token");
        config.buttons.resume = config.buttons.pause;
        let mut dispatcher = CommandDispatcher::new(&config);
        let mut http = FakeHttp::new();

        assert_eq!(dispatcher.submit(Action::Pause, at(0), &mut http), Ok(()));
        assert_eq!(dispatcher.submit(Action::Resume, at(0), &mut http), Err(Rejected::InFlight));
    }

    #[test]
    fn test_large_response_body_discarded() {
        let mut dispatcher = dispatcher();
        let mut http = FakeHttp::new();
        http.script(Action::Pause.channel(), Reply::ok(&[b'x'; 500]).chunked(64));

        dispatcher.submit(Action::Pause, at(0), &mut http).unwrap();
        assert_eq!(complete(&mut dispatcher, &mut http, Action::Pause, 1).result, Ok(()));
    }

    #[derive(Clone, Copy, Debug)]
    enum Op {
        Tap(usize),
        Finish(usize),
        Service,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0usize..3).prop_map(Op::Tap), (0usize..3).prop_map(Op::Finish), Just(Op::Service)]
    }

    proptest! {
        /// A tap is accepted iff no request for that button is outstanding.
        #[test]
        fn prop_no_double_fire(ops in proptest::collection::vec(op(), 1..80)) {
            let mut dispatcher = dispatcher();
            let mut http = FakeHttp::new();
            let mut outstanding = [false; 3];
            let mut sent = [0usize; 3];

            for (step, op) in ops.into_iter().enumerate() {
                let now = at(step as u64 * 10);
                match op {
                    Op::Tap(i) => {
                        let action = Action::ALL[i];
                        http.script(action.channel(), Reply::ok(b"[]").held());
                        let accepted = dispatcher.submit(action, now, &mut http).is_ok();
                        prop_assert_eq!(accepted, !outstanding[i]);
                        if accepted {
                            outstanding[i] = true;
                            sent[i] += 1;
                        }
                    }
                    Op::Finish(i) => http.release(Action::ALL[i].channel()),
                    Op::Service => {
                        for done in dispatcher.service(now, &mut http) {
                            prop_assert!(outstanding[done.action.index()]);
                            outstanding[done.action.index()] = false;
                        }
                    }
                }
                for action in Action::ALL {
                    prop_assert_eq!(dispatcher.is_busy(action), outstanding[action.index()]);
                    prop_assert_eq!(http.requests(action.channel()).len(), sent[action.index()]);
                }
            }
        }
    }
}
