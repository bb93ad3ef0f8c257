// Drives the display: one sweep over all pages, then an interval wait that
// a config reload, a display coming online or Ctrl-C can cut short.
extern crate chrono;

use crate::config::{Config, GlobalSettings, PageConfig};
use crate::layout;
use crate::mqtt;
use crate::station;
use crate::structs::StationResult;

const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(100);

struct SharedState {
    config: std::sync::Arc<Config>,
    refresh_requested: bool,
    shutdown: bool,
}

/// The part of the scheduler other threads get to touch. Cloning shares the
/// same state.
#[derive(Clone)]
pub struct SchedulerHandle {
    state: std::sync::Arc<std::sync::Mutex<SharedState>>,
}

impl SchedulerHandle {
    pub fn new(config: Config) -> SchedulerHandle {
        return SchedulerHandle{
            state: std::sync::Arc::new(std::sync::Mutex::new(SharedState{
                config: std::sync::Arc::new(config),
                refresh_requested: false,
                shutdown: false,
            })),
        };
    }

    fn lock(&self) -> std::sync::MutexGuard<SharedState> {
        // Every critical section is a single assignment, so a poisoned
        // lock still holds consistent state.
        return self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    }

    /// Ends the current wait early. Has no effect while a sweep is running.
    pub fn request_refresh(&self) {
        self.lock().refresh_requested = true;
    }

    /// Swaps in a new configuration, picked up by the next sweep as a whole.
    pub fn apply_config(&self, config: Config) {
        let mut state = self.lock();
        state.config = std::sync::Arc::new(config);
        state.refresh_requested = true;
    }

    pub fn request_shutdown(&self) {
        self.lock().shutdown = true;
    }

    pub fn is_shutdown(&self) -> bool {
        return self.lock().shutdown;
    }

    pub fn config(&self) -> std::sync::Arc<Config> {
        return self.lock().config.clone();
    }

    fn take_refresh(&self) -> bool {
        let mut state = self.lock();
        let requested = state.refresh_requested;
        state.refresh_requested = false;
        return requested;
    }
}

#[derive(Debug, PartialEq)]
pub enum WaitOutcome {
    Elapsed,
    Preempted,
    Shutdown,
}

pub struct UpdateScheduler<S: station::StationSource, P: mqtt::Publisher> {
    handle: SchedulerHandle,
    source: S,
    publisher: P,
}

impl<S: station::StationSource, P: mqtt::Publisher> UpdateScheduler<S, P> {
    pub fn new(handle: SchedulerHandle, source: S, publisher: P) -> UpdateScheduler<S, P> {
        return UpdateScheduler{
            handle: handle,
            source: source,
            publisher: publisher,
        };
    }

    pub fn publisher(&self) -> &P {
        return &self.publisher;
    }

    pub fn run(&mut self, one_shot: bool) {
        self.init_display();

        while !self.handle.is_shutdown() {
            self.sweep();
            // Requests that came in while sweeping are already served.
            self.handle.take_refresh();

            if one_shot {
                break;
            }

            let interval = self.handle.config().global_settings.update_interval();
            match self.wait(interval) {
                WaitOutcome::Elapsed => {},
                WaitOutcome::Preempted => info!("Refresh requested, updating now"),
                WaitOutcome::Shutdown => break,
            }
        }
        info!("Scheduler stopped");
    }

    /// Positions every column of every page.
    pub fn init_display(&mut self) {
        let config = self.handle.config();
        info!("Initializing layout for {} page(s)", config.pages.len());
        let updates = layout::init_layout(&config);
        self.send(&config.global_settings, &updates);
    }

    /// Refreshes every page once, in configuration order, against a single
    /// configuration snapshot.
    pub fn sweep(&mut self) {
        let config = self.handle.config();
        let settings = &config.global_settings;

        for (i, page) in config.pages.iter().enumerate() {
            if self.handle.is_shutdown() {
                return;
            }
            if i > 0 {
                std::thread::sleep(settings.page_pause());
            }
            self.refresh_page(settings, page);
        }
    }

    pub fn refresh_page(&mut self, settings: &GlobalSettings, page: &PageConfig) {
        let query = page.query();
        let station = match self.source.fetch(&query, settings) {
            Ok(station) => station,
            Err(err) => {
                error!("Page {} ({}): {}", page.id, query.station, err);
                StationResult::empty(&query)
            },
        };

        info!("Page {}: {}", page.id, station.title);
        for departure in station.departures.iter().take(page.line_count) {
            info!("{:<10} | {:<5} | {}", departure.time_label, departure.line, departure.direction);
        }

        let now = chrono::Utc::now().with_timezone(&settings.tz());
        let updates = layout::map_page(page, settings, &station, now);
        self.send(settings, &updates);
    }

    fn send(&mut self, settings: &GlobalSettings, updates: &[layout::RegionUpdate]) {
        let delay = settings.publish_delay();
        for update in updates {
            let topic = mqtt::command_topic(&settings.mqtt_topic_prefix, &update.address);
            if let Err(err) = self.publisher.publish(&topic, &update.value.payload()) {
                warn!("Publishing {} failed: {}", topic, err);
            }
            if delay > std::time::Duration::from_secs(0) {
                std::thread::sleep(delay);
            }
        }
    }

    /// Waits up to `interval`, checking for refresh and shutdown requests
    /// every 100ms.
    pub fn wait(&self, interval: std::time::Duration) -> WaitOutcome {
        let deadline = std::time::Instant::now() + interval;
        loop {
            if self.handle.is_shutdown() {
                return WaitOutcome::Shutdown;
            }
            if self.handle.take_refresh() {
                return WaitOutcome::Preempted;
            }
            let now = std::time::Instant::now();
            if now >= deadline {
                return WaitOutcome::Elapsed;
            }
            std::thread::sleep(std::cmp::min(POLL_INTERVAL, deadline - now));
        }
    }
}
