//! # Schedule Coordinator
//!
//! Runs the sign's three loops on one cooperative executor:
//!
//! - **fetch**: wait for the fetch gate, request departures, publish the
//!   batch, sleep [`FETCH_INTERVAL`]
//! - **render**: draw the current snapshot, open the fetch gate for one
//!   moment, sleep for the rest of the one-second frame
//! - **night**: re-evaluate the night window at every minute boundary
//!
//! ## Handoff
//!
//! The loops share a [`SnapshotSlot`], a [`FetchGate`] and the night flag.
//! A snapshot is published by replacing the whole `Arc<[DepartureRecord]>`,
//! so the renderer only ever sees complete batches. Drawing a frame never
//! awaits, so it cannot interleave with a publish; the gate additionally
//! keeps the fetcher from starting a cycle except right after a frame,
//! which also rate-limits fetching to the display's pace.
//!
//! ## Start-up
//!
//! Until the first batch arrives the gate is held open and the panel shows
//! the waiting screen. The very first successful response only sets the
//! clock; the fetcher then immediately asks again for a board starting at
//! "now + walk delay".
//!
//! ## Failures
//!
//! Fetch errors and render faults are logged and retried on the next cycle.
//! After `probe_after_failures` consecutive failed fetches the connectivity
//! probe runs; if that fails, [`Coordinator::run`] returns the
//! [`ConnectivityLoss`] and the process is expected to exit.

use crate::clock::Clock;
use crate::connectivity::{ConnectivityLoss, Reachability};
use crate::countdown::{compute_rows, BlinkPhase, CountdownSettings};
use crate::departures::{DepartureSource, FetchError, FetchMode};
use crate::dimming::{is_night, minute_of_day, NightWindow, Pen};
use crate::frame::Panel;
use crate::renderer::{RenderFault, SignRenderer};
use crate::{DepartureRecord, Snapshot};
use chrono::Timelike;
use log::{debug, error, info, warn};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};

/// Target period of the render loop.
pub const FRAME_PERIOD: Duration = Duration::from_millis(1000);

/// Pause between fetch cycles.
pub const FETCH_INTERVAL: Duration = Duration::from_secs(10);

/// Frame periods above this are logged.
const OVERRUN_THRESHOLD: Duration = Duration::from_millis(1050);

/// Sleep after a frame whose draw took `elapsed`.
pub fn frame_delay(elapsed: Duration) -> Duration {
    FRAME_PERIOD
        .saturating_sub(elapsed)
        .max(Duration::from_millis(1))
}

/// Latest published snapshot, `None` until the first batch.
#[derive(Debug)]
pub struct SnapshotSlot {
    latest: watch::Sender<Option<Snapshot>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self {
            latest: watch::channel(None).0,
        }
    }

    /// Replace the current snapshot with `records`.
    pub fn publish(&self, records: Vec<DepartureRecord>) {
        self.latest.send_replace(Some(records.into()));
    }

    pub fn latest(&self) -> Option<Snapshot> {
        self.latest.borrow().clone()
    }

    /// Resolve once a snapshot has been published.
    pub async fn wait_for_data(&self) {
        let mut rx = self.latest.subscribe();
        // the sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(Option::is_some).await;
    }
}

impl Default for SnapshotSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
struct GateState {
    held_open: bool,
    pulses: u64,
}

/// Edge-triggered "safe to fetch" signal raised by the render loop.
///
/// A [`pulse`](Self::pulse) releases every fetcher currently waiting and
/// leaves nothing behind for fetchers that arrive later. Before the render
/// loop starts the gate is held open.
#[derive(Debug)]
pub struct FetchGate {
    state: watch::Sender<GateState>,
}

impl FetchGate {
    /// A gate that is held open.
    pub fn new() -> Self {
        let state = GateState {
            held_open: true,
            pulses: 0,
        };
        Self {
            state: watch::channel(state).0,
        }
    }

    /// Switch from held open to edge-triggered.
    pub fn close(&self) {
        self.state.send_modify(|state| state.held_open = false);
    }

    /// Release the fetchers waiting right now.
    pub fn pulse(&self) {
        self.state
            .send_modify(|state| state.pulses = state.pulses.wrapping_add(1));
    }

    pub fn is_held_open(&self) -> bool {
        self.state.borrow().held_open
    }

    /// Wait for the next pulse, or return at once while held open.
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();
        let start = rx.borrow_and_update().pulses;
        let _ = rx
            .wait_for(|state| state.held_open || state.pulses != start)
            .await;
    }
}

impl Default for FetchGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs the loops need besides their collaborators.
#[derive(Clone, Debug)]
pub struct ScheduleSettings {
    pub countdown: CountdownSettings,
    pub night: NightWindow,
    pub utc_offset_hours: i32,
    /// Consecutive failed fetches before the connectivity probe runs; 0
    /// never probes.
    pub probe_after_failures: u32,
}

/// What one fetch cycle achieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FetchStep {
    /// Only the clock was set; fetch again right away.
    ClockSynced,
    /// A new snapshot with this many records was published.
    Published(usize),
    /// The response had no departures; the old snapshot stays.
    Kept,
}

/// Shared state between the loops.
#[derive(Debug, Default)]
struct Shared {
    snapshot: SnapshotSlot,
    gate: FetchGate,
    night: NightFlag,
}

#[derive(Debug)]
struct NightFlag(watch::Sender<bool>);

impl Default for NightFlag {
    fn default() -> Self {
        Self(watch::channel(false).0)
    }
}

/// Owns the sign's collaborators and drives them.
pub struct Coordinator<S, C, P: Panel, R> {
    source: S,
    clock: C,
    renderer: SignRenderer<P>,
    probe: R,
    settings: ScheduleSettings,
    shared: Shared,
}

impl<S, C, P, R> Coordinator<S, C, P, R>
where
    S: DepartureSource,
    C: Clock,
    P: Panel,
    R: Reachability,
{
    pub fn new(
        source: S,
        clock: C,
        renderer: SignRenderer<P>,
        probe: R,
        settings: ScheduleSettings,
    ) -> Self {
        Self {
            source,
            clock,
            renderer,
            probe,
            settings,
            shared: Shared::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn renderer(&self) -> &SignRenderer<P> {
        &self.renderer
    }

    /// Departures currently on screen.
    pub fn latest_snapshot(&self) -> Option<Snapshot> {
        self.shared.snapshot.latest()
    }

    pub fn is_night(&self) -> bool {
        *self.shared.night.0.borrow()
    }

    /// Run until connectivity is lost.
    pub async fn run(&mut self) -> Result<Infallible, ConnectivityLoss> {
        let Self {
            source,
            clock,
            renderer,
            probe,
            settings,
            shared,
        } = self;
        let (clock, settings, shared) = (&*clock, &*settings, &*shared);

        tokio::select! {
            biased;
            never = night_loop(clock, shared, settings) => match never {},
            loss = fetch_loop(source, clock, &*probe, shared, settings) => loss,
            never = render_loop(renderer, clock, shared, settings) => match never {},
        }
    }

    /// Fetch one board and show it once.
    ///
    /// Returns the number of departures published.
    pub async fn run_once(&mut self) -> Result<usize, FetchError> {
        let Self {
            source,
            clock,
            renderer,
            settings,
            shared,
            ..
        } = self;

        let mut step = fetch_cycle(source, &*clock, shared, settings).await?;
        if step == FetchStep::ClockSynced {
            step = fetch_cycle(source, &*clock, shared, settings).await?;
        }
        update_night(&*clock, shared, settings);
        if let Err(fault) = draw_frame(renderer, &*clock, shared, settings, BlinkPhase::Shown) {
            error!("Display task failed: {fault}");
        }
        Ok(match step {
            FetchStep::Published(count) => count,
            _ => 0,
        })
    }
}

/// One request, from fetch to publish.
async fn fetch_cycle<S: DepartureSource, C: Clock>(
    source: &mut S,
    clock: &C,
    shared: &Shared,
    settings: &ScheduleSettings,
) -> Result<FetchStep, FetchError> {
    let mode = if clock.is_synced() {
        FetchMode::Departures
    } else {
        FetchMode::ClockOnly
    };
    let when = (mode == FetchMode::Departures)
        .then(|| clock.epoch_seconds() + settings.countdown.walk_delay_secs);

    let batch = source.fetch(when, mode).await?;

    match clock.sync(batch.server_time) {
        None => info!("Clock set from server: {}", batch.server_time),
        Some(drift) if !(-1..=1).contains(&drift) => warn!("Clock drifted by {drift} s"),
        Some(_) => {}
    }
    if mode == FetchMode::ClockOnly {
        return Ok(FetchStep::ClockSynced);
    }

    if batch.layout_mismatch() {
        warn!(
            "Response had {} departures and {} unterminated bytes but none matched \
             the expected layout (when, direction, line.name, line.product; \
             tab-indented, pretty=true)",
            batch.records_seen, batch.discarded_bytes
        );
    } else if batch.skipped > 0 {
        debug!("skipped {} malformed departures", batch.skipped);
    }

    if batch.records.is_empty() {
        debug!("empty response, keeping previous departures");
        return Ok(FetchStep::Kept);
    }

    let count = batch.records.len();
    shared.snapshot.publish(batch.records);
    info!("Updated data: {count} departures");
    Ok(FetchStep::Published(count))
}

async fn fetch_loop<S, C, R>(
    source: &mut S,
    clock: &C,
    probe: &R,
    shared: &Shared,
    settings: &ScheduleSettings,
) -> Result<Infallible, ConnectivityLoss>
where
    S: DepartureSource,
    C: Clock,
    R: Reachability,
{
    let mut failures = 0u32;
    loop {
        shared.gate.wait().await;

        match fetch_cycle(source, clock, shared, settings).await {
            Ok(FetchStep::ClockSynced) => continue,
            Ok(_) => failures = 0,
            Err(e) => {
                warn!("Fetch failed: {e}");
                failures += 1;
                if settings.probe_after_failures > 0 && failures >= settings.probe_after_failures
                {
                    probe.probe().await?;
                    failures = 0;
                }
            }
        }

        sleep(FETCH_INTERVAL).await;
    }
}

fn draw_frame<C: Clock, P: Panel>(
    renderer: &mut SignRenderer<P>,
    clock: &C,
    shared: &Shared,
    settings: &ScheduleSettings,
    phase: BlinkPhase,
) -> Result<(), RenderFault> {
    let pen = current_pen(shared, settings);
    let Some(snapshot) = shared.snapshot.latest() else {
        return renderer.show_waiting(pen);
    };
    let rows = compute_rows(&snapshot, clock.epoch_seconds(), &settings.countdown, phase);
    renderer.show_departures(&rows, pen).map_err(|fault| {
        debug!("Last data: {snapshot:?}");
        fault
    })
}

async fn render_loop<C: Clock, P: Panel>(
    renderer: &mut SignRenderer<P>,
    clock: &C,
    shared: &Shared,
    settings: &ScheduleSettings,
) -> Infallible {
    if let Err(fault) = renderer.show_waiting(current_pen(shared, settings)) {
        error!("Display task failed: {fault}");
    }
    shared.snapshot.wait_for_data().await;
    shared.gate.close();

    let mut phase = BlinkPhase::Hidden;
    let mut previous_start: Option<Instant> = None;
    loop {
        let start = Instant::now();
        if let Some(previous) = previous_start {
            let period = start - previous;
            if period > OVERRUN_THRESHOLD {
                warn!("Frame overrun: {} ms since last frame", period.as_millis());
            }
        }
        previous_start = Some(start);

        if let Err(fault) = draw_frame(renderer, clock, shared, settings, phase) {
            error!("Display task failed: {fault}");
        }
        phase = phase.toggled();

        shared.gate.pulse();
        tokio::task::yield_now().await;

        sleep(frame_delay(start.elapsed())).await;
    }
}

fn current_pen(shared: &Shared, settings: &ScheduleSettings) -> Pen {
    Pen::new(*shared.night.0.borrow(), settings.night.dim_level)
}

/// Evaluate the night window now.
fn update_night<C: Clock>(clock: &C, shared: &Shared, settings: &ScheduleSettings) {
    let minute = minute_of_day(clock.now(), settings.utc_offset_hours);
    let night = is_night(minute, &settings.night);
    let changed = shared.night.0.send_if_modified(|current| {
        let changed = *current != night;
        *current = night;
        changed
    });
    if changed {
        if night {
            info!("Night mode on, dimming to {}/10", settings.night.dim_level);
        } else {
            info!("Night mode off");
        }
    }
}

async fn night_loop<C: Clock>(clock: &C, shared: &Shared, settings: &ScheduleSettings) -> Infallible {
    loop {
        update_night(clock, shared, settings);
        let second = u64::from(clock.now().second() % 60);
        sleep(Duration::from_secs(60 - second)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::countdown::{ColorScheme, BRAND};
    use crate::departures::FetchedBatch;
    use crate::frame::FrameBuffer;
    use crate::renderer::{RowGeometry, WAITING_COLOR};
    use crate::Product;
    use chrono::{DateTime, TimeZone, Utc};
    use embedded_graphics::pixelcolor::Rgb888;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::io;

    fn server_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap()
    }

    fn departure(line: &str, in_secs: i64) -> DepartureRecord {
        DepartureRecord {
            line: line.to_string(),
            product: Product::Subway,
            direction: "Hönow".to_string(),
            scheduled_at: server_time().timestamp() + in_secs,
        }
    }

    #[derive(Debug)]
    struct Call {
        at: Instant,
        when: Option<i64>,
        mode: FetchMode,
    }

    /// Replays scripted responses; repeats the last one when the script runs out.
    struct ScriptedSource {
        script: VecDeque<Option<Vec<DepartureRecord>>>,
        calls: Vec<Call>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Option<Vec<DepartureRecord>>>) -> Self {
            Self {
                script: script.into(),
                calls: Vec::new(),
            }
        }

        fn departure_calls(&self) -> Vec<&Call> {
            self.calls
                .iter()
                .filter(|call| call.mode == FetchMode::Departures)
                .collect()
        }
    }

    impl DepartureSource for ScriptedSource {
        async fn fetch(
            &mut self,
            when: Option<i64>,
            mode: FetchMode,
        ) -> Result<FetchedBatch, FetchError> {
            self.calls.push(Call {
                at: Instant::now(),
                when,
                mode,
            });
            let next = if self.script.len() > 1 {
                self.script.pop_front()
            } else {
                self.script.front().cloned()
            };
            let Some(records) = next.flatten() else {
                return Err(FetchError::Status(reqwest::StatusCode::BAD_GATEWAY));
            };
            if mode == FetchMode::ClockOnly {
                return Ok(FetchedBatch::clock_only(server_time()));
            }
            Ok(FetchedBatch {
                server_time: server_time(),
                records_seen: records.len(),
                skipped: 0,
                discarded_bytes: 0,
                records,
            })
        }
    }

    #[derive(Default)]
    struct RecordingPanel {
        frames: Vec<(Instant, FrameBuffer)>,
        fail_frames: Vec<usize>,
    }

    impl Panel for RecordingPanel {
        fn present(&mut self, frame: &FrameBuffer) -> io::Result<()> {
            let index = self.frames.len();
            self.frames.push((Instant::now(), frame.clone()));
            if self.fail_frames.contains(&index) {
                return Err(io::Error::new(io::ErrorKind::Other, "refresh failed"));
            }
            Ok(())
        }
    }

    struct FakeProbe {
        reachable: bool,
        probes: Cell<usize>,
    }

    impl FakeProbe {
        fn new(reachable: bool) -> Self {
            Self {
                reachable,
                probes: Cell::new(0),
            }
        }
    }

    impl Reachability for FakeProbe {
        async fn probe(&self) -> Result<(), ConnectivityLoss> {
            self.probes.set(self.probes.get() + 1);
            if self.reachable {
                Ok(())
            } else {
                Err(ConnectivityLoss {
                    host: "1.1.1.1:80".to_string(),
                    source: io::Error::new(io::ErrorKind::TimedOut, "timed out"),
                })
            }
        }
    }

    fn settings(walk_delay_secs: i64) -> ScheduleSettings {
        ScheduleSettings {
            countdown: CountdownSettings {
                walk_delay_secs,
                excluded_lines: vec![],
                scheme: ColorScheme::ByProduct { line_colors: true },
                max_rows: 4,
            },
            // 13:00 local is outside this window
            night: NightWindow {
                start_minutes: 22 * 60,
                end_minutes: 6 * 60,
                dim_level: 3,
            },
            utc_offset_hours: 1,
            probe_after_failures: 3,
        }
    }

    type TestCoordinator = Coordinator<ScriptedSource, ManualClock, RecordingPanel, FakeProbe>;

    fn coordinator(
        script: Vec<Option<Vec<DepartureRecord>>>,
        panel: RecordingPanel,
        probe: FakeProbe,
        settings: ScheduleSettings,
    ) -> TestCoordinator {
        let renderer = SignRenderer::new(RowGeometry::new(128, 32, 23), panel);
        let clock = ManualClock::new(server_time() - chrono::Duration::hours(3));
        Coordinator::new(ScriptedSource::new(script), clock, renderer, probe, settings)
    }

    async fn run_for(coordinator: &mut TestCoordinator, duration: Duration) {
        let result = tokio::time::timeout(duration, coordinator.run()).await;
        assert!(result.is_err(), "run ended early: {result:?}");
    }

    fn frames(coordinator: &TestCoordinator) -> &[(Instant, FrameBuffer)] {
        &coordinator.renderer().panel().frames
    }

    fn shows_color(frame: &FrameBuffer, color: Rgb888) -> bool {
        frame.lit_pixels().any(|(_, c)| c == color)
    }

    #[test]
    fn frame_delay_fills_the_period() {
        assert_eq!(frame_delay(Duration::ZERO), Duration::from_millis(1000));
        assert_eq!(frame_delay(Duration::from_millis(120)), Duration::from_millis(880));
        assert_eq!(frame_delay(Duration::from_millis(1000)), Duration::from_millis(1));
        assert_eq!(frame_delay(Duration::from_secs(3)), Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn gate_releases_only_current_waiters() {
        let gate = FetchGate::new();
        gate.wait().await;
        gate.close();
        assert!(!gate.is_held_open());

        // a pulse with nobody waiting is not remembered
        gate.pulse();
        let waited = tokio::time::timeout(Duration::from_secs(5), gate.wait()).await;
        assert!(waited.is_err());

        let waiter = gate.wait();
        tokio::pin!(waiter);
        assert!(poll_once(&mut waiter).await.is_none());
        gate.pulse();
        assert!(poll_once(&mut waiter).await.is_some());
    }

    /// Poll a future once without blocking.
    async fn poll_once<F: std::future::Future + Unpin>(future: &mut F) -> Option<F::Output> {
        tokio::select! {
            biased;
            output = future => Some(output),
            _ = std::future::ready(()) => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_slot_replaces_whole_batches() {
        let slot = SnapshotSlot::new();
        assert!(slot.latest().is_none());

        slot.publish(vec![departure("U5", 300), departure("U8", 400)]);
        let first = slot.latest().unwrap();
        slot.wait_for_data().await;

        slot.publish(vec![departure("S41", 500)]);
        assert_eq!(first.len(), 2);
        assert_eq!(slot.latest().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn first_response_only_sets_the_clock() {
        let records = vec![departure("U5", 300)];
        let mut coordinator = coordinator(
            vec![Some(records)],
            RecordingPanel::default(),
            FakeProbe::new(true),
            settings(120),
        );
        run_for(&mut coordinator, Duration::from_millis(500)).await;

        let calls = &coordinator.source().calls;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].mode, FetchMode::ClockOnly);
        assert_eq!(calls[0].when, None);
        assert_eq!(calls[1].mode, FetchMode::Departures);
        assert_eq!(calls[1].when, Some(server_time().timestamp() + 120));
        assert_eq!(calls[1].at, calls[0].at);
        assert!(coordinator.clock().is_synced());
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_screen_until_first_data() {
        let mut coordinator = coordinator(
            vec![None],
            RecordingPanel::default(),
            FakeProbe::new(true),
            settings(0),
        );
        run_for(&mut coordinator, Duration::from_secs(35)).await;

        let frames = frames(&coordinator);
        assert_eq!(frames.len(), 1);
        assert!(shows_color(&frames[0].1, WAITING_COLOR));
        assert!(coordinator.latest_snapshot().is_none());
        // held-open gate: one attempt every fetch interval
        assert_eq!(coordinator.source().calls.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn frames_are_paced_at_one_second() {
        let mut coordinator = coordinator(
            vec![Some(vec![departure("U5", 600)])],
            RecordingPanel::default(),
            FakeProbe::new(true),
            settings(0),
        );
        run_for(&mut coordinator, Duration::from_millis(25_500)).await;

        // waiting screen, then one frame per second from t=0 to t=25
        let frames = frames(&coordinator);
        assert_eq!(frames.len(), 27);
        for pair in frames[1..].windows(2) {
            assert_eq!(pair[1].0 - pair[0].0, Duration::from_secs(1));
        }
        assert!(frames[1..].iter().all(|(_, frame)| shows_color(frame, BRAND)));
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_follow_frames_every_interval() {
        let mut coordinator = coordinator(
            vec![Some(vec![departure("U5", 600)])],
            RecordingPanel::default(),
            FakeProbe::new(true),
            settings(0),
        );
        run_for(&mut coordinator, Duration::from_millis(35_500)).await;

        let calls = coordinator.source().departure_calls();
        assert_eq!(calls.len(), 4);
        for pair in calls.windows(2) {
            assert_eq!(pair[1].at - pair[0].at, FETCH_INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn render_fault_does_not_stop_the_loop() {
        let panel = RecordingPanel {
            fail_frames: vec![2, 3],
            ..RecordingPanel::default()
        };
        let mut coordinator = coordinator(
            vec![Some(vec![departure("U5", 600)])],
            panel,
            FakeProbe::new(true),
            settings(0),
        );
        run_for(&mut coordinator, Duration::from_millis(5_500)).await;

        let frames = frames(&coordinator);
        assert_eq!(frames.len(), 7);
        for pair in frames[1..].windows(2) {
            assert_eq!(pair[1].0 - pair[0].0, Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_batches_keep_the_previous_snapshot() {
        let first = vec![departure("U5", 600), departure("U8", 900)];
        let mut coordinator = coordinator(
            vec![Some(vec![]), Some(first.clone()), Some(vec![]), None, Some(vec![])],
            RecordingPanel::default(),
            FakeProbe::new(true),
            settings(0),
        );
        run_for(&mut coordinator, Duration::from_millis(40_500)).await;

        assert_eq!(coordinator.source().departure_calls().len(), 5);
        assert_eq!(&*coordinator.latest_snapshot().unwrap(), first.as_slice());
    }

    #[tokio::test(start_paused = true)]
    async fn departing_rows_blink() {
        let mut coordinator = coordinator(
            vec![Some(vec![departure("U5", 10)])],
            RecordingPanel::default(),
            FakeProbe::new(true),
            settings(0),
        );
        run_for(&mut coordinator, Duration::from_millis(3_500)).await;

        let destination_shown: Vec<bool> = frames(&coordinator)[1..]
            .iter()
            .map(|(_, frame)| shows_color(frame, BRAND))
            .collect();
        assert_eq!(destination_shown, [false, true, false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_fetch_failures_trigger_probe() {
        let mut coordinator = coordinator(
            vec![None],
            RecordingPanel::default(),
            FakeProbe::new(true),
            settings(0),
        );
        run_for(&mut coordinator, Duration::from_millis(65_500)).await;

        // seven failures at t=0..60 s, probing after the third and sixth
        assert_eq!(coordinator.source().calls.len(), 7);
        assert_eq!(coordinator.probe.probes.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_network_ends_the_run() {
        let mut coordinator = coordinator(
            vec![None],
            RecordingPanel::default(),
            FakeProbe::new(false),
            settings(0),
        );
        let started = Instant::now();
        let result = tokio::time::timeout(Duration::from_secs(120), coordinator.run()).await;

        let loss = result.expect("run should end").unwrap_err();
        assert_eq!(loss.host, "1.1.1.1:80");
        assert_eq!(started.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn night_window_dims_the_panel() {
        let mut settings = settings(0);
        // 13:00 local falls into a 12:00-14:00 window
        settings.night.start_minutes = 12 * 60;
        settings.night.end_minutes = 14 * 60;
        let mut coordinator = coordinator(
            vec![Some(vec![departure("U5", 600)])],
            RecordingPanel::default(),
            FakeProbe::new(true),
            settings,
        );
        run_for(&mut coordinator, Duration::from_millis(61_500)).await;

        assert!(coordinator.is_night());
        let pen = Pen::new(true, 3);
        let last = &frames(&coordinator).last().unwrap().1;
        assert!(shows_color(last, pen.apply(BRAND)));
        assert!(!shows_color(last, BRAND));
    }

    #[tokio::test(start_paused = true)]
    async fn run_once_shows_one_frame() {
        let mut coordinator = coordinator(
            vec![Some(vec![departure("U5", 600), departure("U8", 700)])],
            RecordingPanel::default(),
            FakeProbe::new(true),
            settings(0),
        );
        assert_eq!(coordinator.run_once().await.unwrap(), 2);
        assert_eq!(frames(&coordinator).len(), 1);
        assert!(shows_color(&frames(&coordinator)[0].1, BRAND));
    }
}
