//! The periodic sweep driver.
//!
//! One sweep = list active hosts, keep the due ones, then for each due host
//! probe it, advance its health state, persist it and, on an edge, record
//! history and notify. Sweeps never overlap: a tick that arrives while the
//! previous sweep is still running is skipped.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::due_check::{is_due, DEFAULT_DUE_SKEW_SECS};
use super::health::{apply_verdict, HealthEvent};
use super::history::HistoryRecorder;
use crate::db::models::{Host, HostStatus, ProbeMethod};
use crate::db::store::HostStore;
use crate::notifications::service::{AlertNotifier, NotifyOutcome};
use crate::probes::{Prober, Verdict};

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub sweep_interval: Duration,
    /// Upper bound on hosts processed concurrently within one sweep.
    pub max_concurrent_probes: usize,
    pub due_skew: chrono::Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            max_concurrent_probes: 16,
            due_skew: chrono::Duration::seconds(DEFAULT_DUE_SKEW_SECS),
        }
    }
}

/// Counters for one sweep, logged when it completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub active: usize,
    pub due: usize,
    pub alerts_fired: usize,
    pub recoveries: usize,
    pub store_failures: usize,
    pub notify_failures: usize,
    /// Host tasks that panicked or were cancelled.
    pub failed_tasks: usize,
}

/// What processing a single host produced.
#[derive(Debug, Clone, PartialEq)]
struct HostOutcome {
    event: Option<HealthEvent>,
    saved: bool,
    history_written: bool,
    notify: Option<NotifyOutcome>,
}

/// Owns the per-host pipeline. Shared by all host tasks of a sweep.
struct HostWorker {
    store: Arc<dyn HostStore>,
    prober: Arc<dyn Prober>,
    history: HistoryRecorder,
    notifier: Arc<AlertNotifier>,
}

impl HostWorker {
    async fn resolve_method(&self, host: &Host) -> Result<ProbeMethod, String> {
        let name = self
            .store
            .get_check_method(host.method_id)
            .await
            .map_err(|e| format!("Failed to fetch check method {}: {e}", host.method_id))?;
        name.parse::<ProbeMethod>().map_err(|e| e.to_string())
    }

    async fn process(&self, mut host: Host, now: DateTime<Utc>) -> HostOutcome {
        let verdict = match self.resolve_method(&host).await {
            Ok(method) => self.prober.probe(&host, method).await,
            Err(reason) => {
                warn!(host_id = host.id, error = %reason, "Cannot determine check method; treating host as unreachable.");
                Verdict::unreachable(reason)
            }
        };

        let event = apply_verdict(&mut host, verdict.reachable, now);
        if verdict.reachable {
            debug!(host_id = host.id, detail = %verdict.detail, "Host is up.");
        } else {
            info!(
                host_id = host.id,
                retry_count = host.retry_count,
                threshold = host.effective_retry_threshold(),
                detail = %verdict.detail,
                "Host check failed."
            );
        }

        let saved = match self.store.save_host(&host).await {
            Ok(()) => true,
            Err(e) => {
                error!(host_id = host.id, error = %e, "Failed to persist host state.");
                false
            }
        };

        let mut outcome = HostOutcome {
            event: event.clone(),
            saved,
            history_written: false,
            notify: None,
        };

        match event {
            Some(HealthEvent::Down) => {
                warn!(host_id = host.id, host_name = %host.name, "Host is DOWN; alert fired.");
                outcome.history_written = self
                    .history
                    .record(&host, HostStatus::Down, true, None, now)
                    .await;
                outcome.notify = Some(self.notifier.notify(&host, true).await);
            }
            Some(HealthEvent::Up { downtime_minutes }) => {
                info!(host_id = host.id, host_name = %host.name, downtime_minutes, "Host recovered.");
                outcome.history_written = self
                    .history
                    .record(&host, HostStatus::Up, false, downtime_minutes, now)
                    .await;
                outcome.notify = Some(self.notifier.notify(&host, false).await);
            }
            None => {}
        }

        outcome
    }
}

pub struct Scheduler {
    worker: Arc<HostWorker>,
    settings: SchedulerSettings,
    sweep_lock: Arc<Mutex<()>>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn HostStore>,
        prober: Arc<dyn Prober>,
        notifier: Arc<AlertNotifier>,
        settings: SchedulerSettings,
    ) -> Self {
        let worker = HostWorker {
            history: HistoryRecorder::new(store.clone()),
            store,
            prober,
            notifier,
        };
        Self {
            worker: Arc::new(worker),
            settings,
            sweep_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Runs sweeps on a fixed period until `shutdown` fires or its sender is
    /// dropped. An in-flight sweep is allowed to finish before returning.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<()>) {
        info!(
            interval_seconds = self.settings.sweep_interval.as_secs(),
            max_concurrent_probes = self.settings.max_concurrent_probes,
            "Host monitor scheduler started."
        );
        let mut ticker = interval(self.settings.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<JoinHandle<SweepSummary>> = None;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    info!("Shutdown signal received, stopping scheduler.");
                    break;
                }

                _ = ticker.tick() => {
                    if let Some(handle) = self.trigger() {
                        in_flight = Some(handle);
                    }
                }
            }
        }

        if let Some(handle) = in_flight {
            if !handle.is_finished() {
                info!("Waiting for the in-flight sweep to finish.");
            }
            if let Err(e) = handle.await {
                error!(error = %e, "Sweep task ended abnormally.");
            }
        }
        info!("Host monitor scheduler stopped.");
    }

    /// Starts a sweep in the background unless one is already running.
    pub fn trigger(self: &Arc<Self>) -> Option<JoinHandle<SweepSummary>> {
        match self.sweep_lock.clone().try_lock_owned() {
            Ok(guard) => {
                let scheduler = Arc::clone(self);
                Some(tokio::spawn(async move {
                    let _guard = guard;
                    scheduler.run_sweep(Utc::now()).await
                }))
            }
            Err(_) => {
                warn!("Previous sweep is still running; skipping this tick.");
                None
            }
        }
    }

    /// Runs one sweep as of `now`. Returns `None` when another sweep holds
    /// the sweep lock.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Option<SweepSummary> {
        let Ok(_guard) = self.sweep_lock.try_lock() else {
            warn!("Previous sweep is still running; skipping requested sweep.");
            return None;
        };
        Some(self.run_sweep(now).await)
    }

    async fn run_sweep(&self, now: DateTime<Utc>) -> SweepSummary {
        let span = info_span!("sweep", at = %now);
        self.sweep_hosts(now).instrument(span).await
    }

    async fn sweep_hosts(&self, now: DateTime<Utc>) -> SweepSummary {
        let mut summary = SweepSummary::default();

        let hosts = match self.worker.store.list_active_hosts().await {
            Ok(hosts) => hosts,
            Err(e) => {
                error!(error = %e, "Failed to retrieve active hosts.");
                summary.store_failures += 1;
                return summary;
            }
        };
        summary.active = hosts.len();

        let due: Vec<Host> = hosts
            .into_iter()
            .filter(|host| {
                let due = is_due(host, now, self.settings.due_skew);
                if !due {
                    debug!(host_id = host.id, host_name = %host.name, "Host is within its interval; skipping.");
                }
                due
            })
            .collect();
        summary.due = due.len();
        debug!(active = summary.active, due = summary.due, "Hosts selected for this sweep.");

        let permits = Arc::new(Semaphore::new(self.settings.max_concurrent_probes.max(1)));
        let mut tasks = JoinSet::new();
        for host in due {
            let permit = match permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(error = %e, "Probe worker pool closed unexpectedly.");
                    break;
                }
            };
            let worker = Arc::clone(&self.worker);
            let span = info_span!("host", host_id = host.id, host_name = %host.name);
            tasks.spawn(
                async move {
                    let _permit = permit;
                    worker.process(host, now).await
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => tally(&mut summary, &outcome),
                Err(e) => {
                    error!(error = %e, "Host task failed.");
                    summary.failed_tasks += 1;
                }
            }
        }

        info!(
            active = summary.active,
            due = summary.due,
            alerts_fired = summary.alerts_fired,
            recoveries = summary.recoveries,
            store_failures = summary.store_failures,
            notify_failures = summary.notify_failures,
            failed_tasks = summary.failed_tasks,
            "Sweep finished."
        );
        summary
    }
}

fn tally(summary: &mut SweepSummary, outcome: &HostOutcome) {
    match &outcome.event {
        Some(HealthEvent::Down) => summary.alerts_fired += 1,
        Some(HealthEvent::Up { .. }) => summary.recoveries += 1,
        None => {}
    }
    if !outcome.saved {
        summary.store_failures += 1;
    }
    if outcome.event.is_some() && !outcome.history_written {
        summary.store_failures += 1;
    }
    if outcome.notify == Some(NotifyOutcome::Failed) {
        summary.notify_failures += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::{test_host, MemoryStore};
    use crate::notifications::models::{AlertChannel, ChannelConfig};
    use crate::notifications::senders::{NotificationSender, SenderError};
    use crate::probes::{ProbeDispatcher, ProbeSettings};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    const PING: i32 = 3;

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 14, 0, 0).unwrap() + chrono::Duration::minutes(minute)
    }

    /// Replays scripted verdicts per host id; unscripted probes succeed.
    #[derive(Default)]
    struct ScriptedProber {
        scripts: StdMutex<HashMap<i32, VecDeque<bool>>>,
        probes: AtomicUsize,
        panic_on: Option<i32>,
    }

    impl ScriptedProber {
        fn script(&self, host_id: i32, verdicts: &[bool]) {
            self.scripts
                .lock()
                .unwrap()
                .insert(host_id, verdicts.iter().copied().collect());
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, host: &Host, _method: ProbeMethod) -> Verdict {
            if self.panic_on == Some(host.id) {
                panic!("probe blew up for host {}", host.id);
            }
            self.probes.fetch_add(1, Ordering::SeqCst);
            let next = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(&host.id)
                .and_then(VecDeque::pop_front)
                .unwrap_or(true);
            if next {
                Verdict::reachable("scripted")
            } else {
                Verdict::unreachable("scripted")
            }
        }
    }

    #[derive(Default)]
    struct RecordingSender {
        sent: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        async fn send(&self, _config: &ChannelConfig, message: &str) -> Result<(), SenderError> {
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn telegram_channel(api_base: &str) -> AlertChannel {
        AlertChannel {
            name: "telegram".to_string(),
            config: ChannelConfig::Telegram {
                api_base: api_base.to_string(),
                bot_token: "bot1".to_string(),
                chat_id: "42".to_string(),
            },
        }
    }

    fn settings(max_concurrent_probes: usize) -> SchedulerSettings {
        SchedulerSettings {
            sweep_interval: Duration::from_millis(50),
            max_concurrent_probes,
            due_skew: chrono::Duration::seconds(DEFAULT_DUE_SKEW_SECS),
        }
    }

    fn scheduler_with(
        store: Arc<MemoryStore>,
        prober: Arc<dyn Prober>,
        sender: Arc<RecordingSender>,
        max_concurrent_probes: usize,
    ) -> Arc<Scheduler> {
        let notifier = Arc::new(AlertNotifier::with_sender(store.clone(), sender));
        Arc::new(Scheduler::new(store, prober, notifier, settings(max_concurrent_probes)))
    }

    #[tokio::test]
    async fn http_get_host_alerts_once_and_recovers() {
        use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};

        // Target whose status code the test controls.
        let status = Arc::new(AtomicU16::new(503));
        let target = Router::new()
            .route(
                "/health",
                get(|State(status): State<Arc<AtomicU16>>| async move {
                    StatusCode::from_u16(status.load(Ordering::SeqCst)).unwrap()
                }),
            )
            .with_state(status.clone());
        let target_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let target_addr = target_listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(target_listener, target).await.unwrap() });

        // Bot API capturing delivered messages.
        let delivered: Arc<StdMutex<Vec<serde_json::Value>>> = Arc::default();
        let bot = Router::new()
            .route(
                "/{token}/sendMessage",
                post(
                    |State(delivered): State<Arc<StdMutex<Vec<serde_json::Value>>>>,
                     Json(body): Json<serde_json::Value>| async move {
                        delivered.lock().unwrap().push(body);
                        StatusCode::OK
                    },
                ),
            )
            .with_state(delivered.clone());
        let bot_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let bot_addr = bot_listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(bot_listener, bot).await.unwrap() });

        let store = Arc::new(MemoryStore::new());
        let mut host = test_host(1, 2, &format!("http://{target_addr}/health"));
        host.name = "A".to_string();
        host.retry_threshold = 3;
        store.add_host(host);
        store.add_channel(telegram_channel(&format!("http://{bot_addr}/")));

        let probe_settings = ProbeSettings {
            http_timeout: Duration::from_secs(5),
            ..ProbeSettings::default()
        };
        let prober = Arc::new(ProbeDispatcher::new(&probe_settings).unwrap());
        let notifier = Arc::new(AlertNotifier::new(store.clone(), Duration::from_secs(5)).unwrap());
        let scheduler = Scheduler::new(store.clone(), prober, notifier, settings(4));

        for minute in 0..3 {
            let summary = scheduler.sweep_at(t(minute)).await.unwrap();
            assert_eq!(summary.due, 1);
        }
        let after_third = store.host(1);
        assert!(after_third.alert_fired);
        assert_eq!(after_third.retry_count, 3);
        assert_eq!(after_third.last_alert_at, Some(t(2)));
        let history = store.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, HostStatus::Down);
        assert!(history[0].alert_fired);
        {
            let delivered = delivered.lock().unwrap();
            assert_eq!(delivered.len(), 1);
            assert_eq!(
                delivered[0],
                serde_json::json!({
                    "chat_id": "42",
                    "text": format!("A (http://{target_addr}/health) is DOWN"),
                })
            );
        }

        status.store(200, Ordering::SeqCst);
        let summary = scheduler.sweep_at(t(3)).await.unwrap();
        assert_eq!(summary.recoveries, 1);

        let recovered = store.host(1);
        assert!(!recovered.alert_fired);
        assert_eq!(recovered.retry_count, 0);
        assert_eq!(recovered.last_recovered_at, Some(t(3)));

        let history = store.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].status, HostStatus::Up);
        assert!(!history[1].alert_fired);
        let downtime = history[1].down_minutes.unwrap();
        assert!((downtime - 1.0).abs() < 1e-9, "{downtime}");

        let delivered = delivered.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        assert_eq!(
            delivered[1]["text"],
            format!("A (http://{target_addr}/health) is UP")
        );
    }

    #[tokio::test]
    async fn continued_failure_does_not_realert() {
        let store = Arc::new(MemoryStore::new());
        store.add_host(test_host(1, PING, "10.0.0.1"));
        store.add_channel(telegram_channel("http://unused/"));
        let prober = Arc::new(ScriptedProber::default());
        prober.script(1, &[false; 6]);
        let sender = Arc::new(RecordingSender::default());
        let scheduler = scheduler_with(store.clone(), prober, sender.clone(), 4);

        let mut fired = 0;
        for minute in 0..6 {
            fired += scheduler.sweep_at(t(2 * minute)).await.unwrap().alerts_fired;
        }
        assert_eq!(fired, 1);
        assert_eq!(store.history().len(), 1);
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
        assert_eq!(store.host(1).retry_count, 6);
    }

    #[tokio::test]
    async fn silent_recovery_below_threshold() {
        let store = Arc::new(MemoryStore::new());
        store.add_host(test_host(1, PING, "10.0.0.1"));
        store.add_channel(telegram_channel("http://unused/"));
        let prober = Arc::new(ScriptedProber::default());
        prober.script(1, &[false, true]);
        let sender = Arc::new(RecordingSender::default());
        let scheduler = scheduler_with(store.clone(), prober, sender.clone(), 4);

        scheduler.sweep_at(t(0)).await.unwrap();
        let degraded = store.host(1);
        assert!(degraded.is_pending);
        assert_eq!(degraded.retry_count, 1);

        scheduler.sweep_at(t(2)).await.unwrap();
        let host = store.host(1);
        assert!(!host.is_pending);
        assert!(!host.alert_fired);
        assert!(store.history().is_empty());
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn hosts_within_interval_are_not_probed() {
        let store = Arc::new(MemoryStore::new());
        let mut fresh = test_host(1, PING, "10.0.0.1");
        fresh.interval = chrono::Duration::minutes(10);
        fresh.last_checked_at = Some(t(0));
        store.add_host(fresh);
        store.add_host(test_host(2, PING, "10.0.0.2"));
        let mut inactive = test_host(3, PING, "10.0.0.3");
        inactive.is_active = false;
        store.add_host(inactive);

        let prober = Arc::new(ScriptedProber::default());
        let scheduler = scheduler_with(store.clone(), prober.clone(), Arc::default(), 4);

        let summary = scheduler.sweep_at(t(3)).await.unwrap();
        assert_eq!(summary.active, 2);
        assert_eq!(summary.due, 1);
        assert_eq!(prober.probes.load(Ordering::SeqCst), 1);
        assert_eq!(store.host(1).last_checked_at, Some(t(0)));
        assert_eq!(store.host(2).last_checked_at, Some(t(3)));
    }

    #[tokio::test]
    async fn unknown_method_counts_as_unreachable() {
        let store = Arc::new(MemoryStore::new());
        store.add_method(9, "carrier_pigeon");
        let mut host = test_host(1, 9, "10.0.0.1");
        host.retry_threshold = 1;
        store.add_host(host);
        let mut orphan = test_host(2, 404, "10.0.0.2");
        orphan.retry_threshold = 1;
        store.add_host(orphan);

        let prober = Arc::new(ScriptedProber::default());
        let scheduler = scheduler_with(store.clone(), prober.clone(), Arc::default(), 4);

        let summary = scheduler.sweep_at(t(0)).await.unwrap();
        assert_eq!(summary.alerts_fired, 2);
        assert_eq!(prober.probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn channel_miss_does_not_stop_the_sweep() {
        let store = Arc::new(MemoryStore::new());
        for id in 1..=3 {
            let mut host = test_host(id, PING, "10.0.0.1");
            host.retry_threshold = 1;
            host.alert_channel = if id == 2 { "telegram".to_string() } else { "nowhere".to_string() };
            store.add_host(host);
        }
        store.add_channel(telegram_channel("http://unused/"));
        let prober = Arc::new(ScriptedProber::default());
        for id in 1..=3 {
            prober.script(id, &[false]);
        }
        let sender = Arc::new(RecordingSender::default());
        let scheduler = scheduler_with(store.clone(), prober, sender.clone(), 1);

        let summary = scheduler.sweep_at(t(0)).await.unwrap();
        assert_eq!(summary.alerts_fired, 3);
        assert_eq!(summary.notify_failures, 0);
        assert_eq!(store.history().len(), 3);
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn persistence_failures_are_isolated() {
        let store = Arc::new(MemoryStore::new());
        let mut host = test_host(1, PING, "10.0.0.1");
        host.retry_threshold = 1;
        store.add_host(host);
        store.add_host(test_host(2, PING, "10.0.0.2"));
        store.add_channel(telegram_channel("http://unused/"));
        store.fail_saves(true);
        store.fail_history(true);

        let prober = Arc::new(ScriptedProber::default());
        prober.script(1, &[false]);
        let sender = Arc::new(RecordingSender::default());
        let scheduler = scheduler_with(store.clone(), prober.clone(), sender.clone(), 4);

        let summary = scheduler.sweep_at(t(0)).await.unwrap();
        assert_eq!(summary.due, 2);
        assert_eq!(summary.alerts_fired, 1);
        // Two failed saves plus one failed history append.
        assert_eq!(summary.store_failures, 3);
        assert_eq!(prober.probes.load(Ordering::SeqCst), 2);
        // Notification still goes out.
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_failure_ends_sweep_quietly() {
        let store = Arc::new(MemoryStore::new());
        store.fail_listing(true);
        let scheduler = scheduler_with(store, Arc::new(ScriptedProber::default()), Arc::default(), 4);
        let summary = scheduler.sweep_at(t(0)).await.unwrap();
        assert_eq!(summary.store_failures, 1);
        assert_eq!(summary.due, 0);
    }

    #[tokio::test]
    async fn panicking_probe_only_fails_its_host() {
        let store = Arc::new(MemoryStore::new());
        for id in 1..=3 {
            store.add_host(test_host(id, PING, "10.0.0.1"));
        }
        let prober = Arc::new(ScriptedProber {
            panic_on: Some(2),
            ..Default::default()
        });
        let scheduler = scheduler_with(store.clone(), prober.clone(), Arc::default(), 2);

        let summary = scheduler.sweep_at(t(0)).await.unwrap();
        assert_eq!(summary.failed_tasks, 1);
        assert_eq!(prober.probes.load(Ordering::SeqCst), 2);
        assert_eq!(store.host(1).last_checked_at, Some(t(0)));
        assert_eq!(store.host(2).last_checked_at, None);
        assert_eq!(store.host(3).last_checked_at, Some(t(0)));
    }

    struct SlowProber {
        in_flight: AtomicUsize,
        max_seen: AtomicUsize,
        done: AtomicUsize,
    }

    #[async_trait]
    impl Prober for SlowProber {
        async fn probe(&self, _host: &Host, _method: ProbeMethod) -> Verdict {
            let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now_in_flight, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.done.fetch_add(1, Ordering::SeqCst);
            Verdict::reachable("slow")
        }
    }

    #[tokio::test]
    async fn probes_are_bounded_by_the_worker_pool() {
        let store = Arc::new(MemoryStore::new());
        for id in 1..=10 {
            store.add_host(test_host(id, PING, "10.0.0.1"));
        }
        let prober = Arc::new(SlowProber {
            in_flight: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
        });
        let scheduler = scheduler_with(store, prober.clone(), Arc::default(), 3);

        let summary = scheduler.sweep_at(t(0)).await.unwrap();
        assert_eq!(summary.due, 10);
        assert_eq!(prober.done.load(Ordering::SeqCst), 10);
        let max_seen = prober.max_seen.load(Ordering::SeqCst);
        assert!(max_seen <= 3 && max_seen >= 2, "max in flight {max_seen}");
    }

    struct GateProber {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Prober for GateProber {
        async fn probe(&self, _host: &Host, _method: ProbeMethod) -> Verdict {
            self.entered.notify_one();
            self.release.notified().await;
            Verdict::reachable("released")
        }
    }

    #[tokio::test]
    async fn overlapping_sweeps_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        store.add_host(test_host(1, PING, "10.0.0.1"));
        let gate = Arc::new(GateProber {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let scheduler = scheduler_with(store, gate.clone(), Arc::default(), 4);

        let first = scheduler.trigger().expect("first sweep starts");
        gate.entered.notified().await;

        assert!(scheduler.trigger().is_none());
        assert!(scheduler.sweep_at(Utc::now()).await.is_none());

        gate.release.notify_one();
        let summary = first.await.unwrap();
        assert_eq!(summary.due, 1);

        // The lock is free again once the sweep completed.
        let next = scheduler.trigger().expect("next sweep starts");
        let summary = next.await.unwrap();
        assert_eq!(summary.due, 0);
    }

    #[tokio::test]
    async fn run_loop_sweeps_until_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let mut host = test_host(1, PING, "10.0.0.1");
        host.interval = chrono::Duration::zero();
        host.last_checked_at = None;
        store.add_host(host);
        let prober = Arc::new(ScriptedProber::default());
        let scheduler = scheduler_with(store.clone(), prober.clone(), Arc::default(), 4);

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let runner = tokio::spawn(scheduler.clone().run(shutdown_rx));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while prober.probes.load(Ordering::SeqCst) < 2 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(prober.probes.load(Ordering::SeqCst) >= 2);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .expect("scheduler stops")
            .unwrap();
        assert!(store.save_count() >= 2);
    }
}
