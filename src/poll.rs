//! Polling scheduler: refreshes the state cache at a fixed cadence.
//!
//! # Cycle
//!
//! ```text
//! Idle --(interval elapsed)--> RequestSent --(all sensors read)--> Applied --> Idle
//!                                   |
//!                                   +--(any failure)--> Failed --> Idle
//! ```
//!
//! A cycle reads every configured sensor one after another on [`Channel::State`].
//! Values are staged and written to the cache only once all of them arrived, so the
//! cache never mixes two cycles. A timeout, a non-2xx status or an unparsable body
//! aborts the cycle: cached values stay untouched and every configured entity is
//! flagged stale. Either way the scheduler returns to idle immediately and the next
//! cycle is due one interval after this one ended. There is no mid-cycle retry.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use serde::Deserialize;

use crate::config::{DashboardConfig, MAX_SENSORS, STATE_BODY_CAPACITY};
use crate::entity::{Entity, EntityRef};
use crate::error::FetchError;
use crate::http::{Channel, HttpClient, Overflow, Request, Step, Transfer};
use crate::state::{StateCache, Value};

/// Body of `GET /api/states/<entity>`; only `state` is used.
#[derive(Deserialize)]
struct StateBody<'b> {
    #[serde(borrow)]
    state: &'b str,
}

/// Decode a state response body into a value.
pub fn decode_state(body: &[u8]) -> Result<Value, FetchError> {
    let (parsed, _) = serde_json_core::from_slice::<StateBody<'_>>(body).map_err(|_| FetchError::Malformed)?;
    Ok(Value::parse(parsed.state))
}

/// How a poll cycle ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    Applied,
    Failed(FetchError),
}

enum Phase {
    Idle {
        /// `None` until the first cycle, which is due immediately.
        next_due: Option<Instant>,
    },
    RequestSent {
        /// Index of the sensor being fetched.
        index: usize,
        transfer: Transfer,
        staged: Vec<Value, MAX_SENSORS>,
    },
}

/// Drives poll cycles and writes their results into a [`StateCache`].
pub struct PollScheduler<'a> {
    base_url: &'a str,
    credential: &'a str,
    sensors: Vec<EntityRef<'a>, MAX_SENSORS>,
    interval: Duration,
    timeout: Duration,
    phase: Phase,
    last_outcome: Option<CycleOutcome>,
    body: [u8; STATE_BODY_CAPACITY],
}

impl<'a> PollScheduler<'a> {
    /// Scheduler polling the sensors of `config`.
    pub fn new(config: &DashboardConfig<'a>) -> Self { Self::with_sensors(config, &config.sensors.all()) }

    /// Scheduler polling an explicit sensor list (deduplicated, at most [`MAX_SENSORS`]).
    pub fn with_sensors(
        config: &DashboardConfig<'a>,
        sensors: &[EntityRef<'a>],
    ) -> Self {
        let mut unique: Vec<EntityRef<'a>, MAX_SENSORS> = Vec::new();
        for sensor in sensors {
            if !unique.contains(sensor) && unique.push(*sensor).is_err() {
                log_warn!("Too many sensors, ignoring {}", sensor);
            }
        }
        Self {
            base_url: config.base_url,
            credential: config.credential,
            sensors: unique,
            interval: config.sensor_interval,
            timeout: config.request_timeout,
            phase: Phase::Idle { next_due: None },
            last_outcome: None,
            body: [0; STATE_BODY_CAPACITY],
        }
    }

    /// Whether no cycle is in progress.
    #[inline]
    pub const fn is_idle(&self) -> bool { matches!(self.phase, Phase::Idle { .. }) }

    /// When the next cycle starts, if idle.
    pub const fn next_due(&self) -> Option<Instant> {
        match self.phase {
            Phase::Idle { next_due } => next_due,
            Phase::RequestSent { .. } => None,
        }
    }

    /// Result of the most recent completed cycle.
    #[inline]
    pub const fn last_outcome(&self) -> Option<CycleOutcome> { self.last_outcome }

    /// Whether the most recent cycle failed (hub offline or misbehaving).
    #[inline]
    pub const fn is_offline(&self) -> bool { matches!(self.last_outcome, Some(CycleOutcome::Failed(_))) }

    /// Advance the scheduler by one step.
    ///
    /// Returns the outcome when a cycle ends during this call.
    pub fn tick<H: HttpClient>(
        &mut self,
        now: Instant,
        http: &mut H,
        cache: &mut StateCache<'a>,
    ) -> Option<CycleOutcome> {
        match &mut self.phase {
            Phase::Idle { next_due } => {
                if self.sensors.is_empty() || next_due.is_some_and(|due| now < due) {
                    return None;
                }
                match self.begin(0, now, http) {
                    Ok(transfer) => {
                        self.phase = Phase::RequestSent {
                            index: 0,
                            transfer,
                            staged: Vec::new(),
                        };
                        None
                    }
                    Err(err) => Some(self.fail(err, now, cache)),
                }
            }
            Phase::RequestSent { index, transfer, staged } => {
                let filled = match transfer.advance(http, &mut self.body, now) {
                    Step::Pending => return None,
                    Step::Failed(err) => return Some(self.fail(err, now, cache)),
                    Step::Complete { filled } => filled,
                };
                let value = match decode_state(&self.body[..filled]) {
                    Ok(value) => value,
                    Err(err) => return Some(self.fail(err, now, cache)),
                };
                // Capacity matches the sensor list, push cannot fail
                let _ = staged.push(value);

                let next = *index + 1;
                let staged = core::mem::take(staged);
                if next < self.sensors.len() {
                    match self.begin(next, now, http) {
                        Ok(transfer) => {
                            self.phase = Phase::RequestSent {
                                index: next,
                                transfer,
                                staged,
                            };
                            None
                        }
                        Err(err) => Some(self.fail(err, now, cache)),
                    }
                } else {
                    Some(self.apply(staged, now, cache))
                }
            }
        }
    }

    fn begin<H: HttpClient>(
        &self,
        index: usize,
        now: Instant,
        http: &mut H,
    ) -> Result<Transfer, FetchError> {
        let entity = Entity::Sensor(self.sensors[index]);
        let url = entity.url(self.base_url).map_err(|_| FetchError::CONNECTION)?;
        let request = Request {
            method: entity.method(),
            url: url.as_str(),
            credential: self.credential,
            body: None,
        };
        Transfer::start(http, Channel::State, &request, now, self.timeout, Overflow::Reject)
    }

    fn apply(
        &mut self,
        staged: Vec<Value, MAX_SENSORS>,
        now: Instant,
        cache: &mut StateCache<'a>,
    ) -> CycleOutcome {
        for (sensor, value) in self.sensors.iter().zip(staged) {
            cache.put(*sensor, value, now);
        }
        cache.set_fetched(now);

        if self.is_offline() {
            log_info!("Hub reachable again");
        }
        self.finish(CycleOutcome::Applied, now)
    }

    fn fail(
        &mut self,
        err: FetchError,
        now: Instant,
        cache: &mut StateCache<'a>,
    ) -> CycleOutcome {
        for sensor in &self.sensors {
            cache.mark_stale(*sensor);
        }
        log_warn!("Poll failed: {}", err);
        self.finish(CycleOutcome::Failed(err), now)
    }

    fn finish(
        &mut self,
        outcome: CycleOutcome,
        now: Instant,
    ) -> CycleOutcome {
        self.phase = Phase::Idle {
            next_due: Some(now + self.interval),
        };
        self.last_outcome = Some(outcome);
        outcome
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
    use crate::state::Freshness;
    use crate::testing::{FakeHttp, Reply, state_json};

    const PROGRESS: EntityRef<'static> = EntityRef::new("sensor.progress");
    const FINISH: EntityRef<'static> = EntityRef::new("sensor.finish");

    fn at(ms: u64) -> Instant { Instant::from_millis(ms) }

    fn scheduler() -> PollScheduler<'static> {
        let config = DashboardConfig::new(HUB_BASE_URL, "token");
        PollScheduler::with_sensors(&config, &[PROGRESS, FINISH])
    }

    /// Tick until the cycle in progress ends, starting at `start` ms.
    fn run_cycle(
        poll: &mut PollScheduler<'static>,
        http: &mut FakeHttp,
        cache: &mut StateCache<'static>,
        start: u64,
    ) -> CycleOutcome {
        for ms in start..start + 100 {
            if let Some(outcome) = poll.tick(at(ms), http, cache) {
                return outcome;
            }
        }
        panic!("cycle did not finish");
    }

    #[test]
    fn test_decode_state_body() {
        let body = br#"{"entity_id":"sensor.p","state":"42.0","attributes":{"unit_of_measurement":"%","friendly_name":"Job Percentage"},"last_changed":"2026-10-17T12:00:00+00:00"}"#;
        assert_eq!(decode_state(body), Ok(Value::Number(42.0)));
    }

    #[test]
    fn test_decode_state_rejects_garbage() {
        assert_eq!(decode_state(b"<html>502</html>"), Err(FetchError::Malformed));
        assert_eq!(decode_state(br#"{"entity_id":"x"}"#), Err(FetchError::Malformed));
        assert_eq!(decode_state(b""), Err(FetchError::Malformed));
    }

    #[test]
    fn test_first_cycle_due_immediately() {
        let poll = scheduler();
        assert!(poll.is_idle());
        assert_eq!(poll.next_due(), None);
    }

    #[test]
    fn test_progress_then_timeout_scenario() {
        let mut poll = scheduler();
        let mut http = FakeHttp::new();
        let mut cache = StateCache::new();

        http.script(Channel::State, Reply::ok(state_json("42").as_bytes()));
        http.script(Channel::State, Reply::ok(state_json("14:30").as_bytes()));
        assert_eq!(run_cycle(&mut poll, &mut http, &mut cache, 0), CycleOutcome::Applied);

        assert_eq!(cache.get(PROGRESS).number(), Some(42.0));
        assert_eq!(cache.get(FINISH).text(), Some("14:30"));
        assert_eq!(cache.get(PROGRESS).freshness(), Freshness::Fresh);
        assert_eq!(cache.get(FINISH).freshness(), Freshness::Fresh);
        assert_eq!(http.requests(Channel::State)[0].url, "http://homeassistant.local:8123/api/states/sensor.progress");
        assert_eq!(http.requests(Channel::State)[0].credential, "token");

        // Next cycle: the hub never answers
        http.script(Channel::State, Reply::hang());
        let due = poll.next_due().unwrap().as_millis();
        let mut outcome = None;
        for ms in due..due + 6000 {
            if let Some(done) = poll.tick(at(ms), &mut http, &mut cache) {
                outcome = Some(done);
                break;
            }
        }
        assert_eq!(outcome, Some(CycleOutcome::Failed(FetchError::TIMEOUT)));
        assert_eq!(cache.get(PROGRESS).number(), Some(42.0));
        assert_eq!(cache.get(PROGRESS).freshness(), Freshness::Stale);
        assert_eq!(cache.get(FINISH).text(), Some("14:30"));
        assert!(poll.is_offline());
        assert_eq!(http.aborts(Channel::State), 1);
    }

    #[test]
    fn test_partial_failure_applies_nothing() {
        let mut poll = scheduler();
        let mut http = FakeHttp::new();
        let mut cache = StateCache::new();

        http.script(Channel::State, Reply::ok(state_json("10").as_bytes()));
        http.script(Channel::State, Reply::ok(state_json("12:00").as_bytes()));
        run_cycle(&mut poll, &mut http, &mut cache, 0);

        // First sensor succeeds, second returns 500
        http.script(Channel::State, Reply::ok(state_json("55").as_bytes()));
        http.script(Channel::State, Reply::status(500));
        let due = poll.next_due().unwrap().as_millis();
        let outcome = run_cycle(&mut poll, &mut http, &mut cache, due);

        assert_eq!(outcome, CycleOutcome::Failed(FetchError::HttpStatus(500)));
        assert_eq!(cache.get(PROGRESS).number(), Some(10.0));
        assert_eq!(cache.get(PROGRESS).freshness(), Freshness::Stale);
    }

    #[test]
    fn test_malformed_body_fails_cycle() {
        let mut poll = scheduler();
        let mut http = FakeHttp::new();
        let mut cache = StateCache::new();

        http.script(Channel::State, Reply::ok(b"not json"));
        let outcome = run_cycle(&mut poll, &mut http, &mut cache, 0);

        assert_eq!(outcome, CycleOutcome::Failed(FetchError::Malformed));
        assert_eq!(cache.get(PROGRESS).freshness(), Freshness::Stale);
        assert_eq!(cache.get(PROGRESS).value, None);
    }

    #[test]
    fn test_oversized_state_body_fails_cycle() {
        let mut poll = scheduler();
        let mut http = FakeHttp::new();
        let mut cache = StateCache::new();

        http.script(Channel::State, Reply::ok(&[b' '; STATE_BODY_CAPACITY + 1]));
        assert_eq!(
            run_cycle(&mut poll, &mut http, &mut cache, 0),
            CycleOutcome::Failed(FetchError::Oversized)
        );
    }

    #[test]
    fn test_interval_counts_from_cycle_end() {
        let mut poll = scheduler();
        let mut http = FakeHttp::new();
        let mut cache = StateCache::new();

        http.script(Channel::State, Reply::ok(state_json("1").as_bytes()).delayed(20));
        http.script(Channel::State, Reply::ok(state_json("x").as_bytes()));
        let mut end = 0;
        for ms in 0..100 {
            if poll.tick(at(ms), &mut http, &mut cache).is_some() {
                end = ms;
                break;
            }
        }
        assert!(end > 20);
        assert_eq!(poll.next_due(), Some(at(end + 5000)));

        // Nothing is sent before the interval elapses
        let sent = http.requests(Channel::State).len();
        assert_eq!(poll.tick(at(end + 4999), &mut http, &mut cache), None);
        assert_eq!(http.requests(Channel::State).len(), sent);
        http.script(Channel::State, Reply::hang());
        poll.tick(at(end + 5000), &mut http, &mut cache);
        assert_eq!(http.requests(Channel::State).len(), sent + 1);
    }

    #[test]
    fn test_duplicate_sensors_polled_once() {
        let config = DashboardConfig::new(HUB_BASE_URL, "token");
        let poll = PollScheduler::with_sensors(&config, &[PROGRESS, PROGRESS, FINISH]);
        assert_eq!(poll.sensors.len(), 2);
    }

    #[test]
    fn test_one_adapter_poll_per_tick() {
        let mut poll = scheduler();
        let mut http = FakeHttp::new();
        let mut cache = StateCache::new();
        http.script(Channel::State, Reply::hang());

        poll.tick(at(0), &mut http, &mut cache);
        for ms in 1..10 {
            let before = http.polls(Channel::State);
            poll.tick(at(ms), &mut http, &mut cache);
            assert_eq!(http.polls(Channel::State), before + 1);
        }
    }

    proptest! {
        /// Cache equals the latest successful cycle; stale iff the latest cycle failed.
        #[test]
        fn prop_cache_tracks_latest_success(outcomes in proptest::collection::vec(proptest::option::of(0u8..=100), 1..12)) {
            let mut poll = scheduler();
            let mut http = FakeHttp::new();
            let mut cache = StateCache::new();
            let mut last_good: Option<u8> = None;
            let mut start = 0;

            for outcome in outcomes {
                match outcome {
                    Some(progress) => {
                        http.script(Channel::State, Reply::ok(state_json(&progress.to_string()).as_bytes()));
                        http.script(Channel::State, Reply::ok(state_json("12:00").as_bytes()));
                    }
                    None => http.script(Channel::State, Reply::status(503)),
                }
                let result = run_cycle(&mut poll, &mut http, &mut cache, start);
                start = poll.next_due().unwrap().as_millis();

                prop_assert_eq!(result == CycleOutcome::Applied, outcome.is_some());
                if outcome.is_some() {
                    last_good = outcome;
                }
                let reading = cache.get(PROGRESS);
                prop_assert_eq!(reading.number(), last_good.map(f32::from));
                prop_assert_eq!(reading.stale, outcome.is_none());
            }
        }
    }
}
