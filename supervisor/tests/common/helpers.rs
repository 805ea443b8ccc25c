//! Test helpers and builder patterns for supervisor tests
//!
//! [`FakeWorld`] is a tiny process table behind the mocks: processes are
//! alive until signalled, one of them may own the port, and the PID record
//! is a shared cell. Tests assert on the world after the operation.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use super::fixtures::TestFixtures;
use supervisor::traits::{MockHealthProbe, MockOpener, MockPidStore, MockPortProbe, MockProcessControl};
use supervisor::{StopSignal, Supervisor, SupervisorConfig};

pub type MockSupervisor = Supervisor<MockPidStore, MockProcessControl, MockPortProbe, MockHealthProbe, MockOpener>;

#[derive(Default)]
struct WorldState {
    alive: HashSet<u32>,
    deaf_to_sigterm: HashSet<u32>,
    listener: Option<u32>,
    record: Option<u32>,
    signals: Vec<(u32, StopSignal)>,
}

#[derive(Clone, Default)]
pub struct FakeWorld {
    state: Arc<Mutex<WorldState>>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// A live process that does not listen
    pub fn with_process(self, pid: u32) -> Self {
        self.spawn(pid);
        self
    }

    /// A live process that owns the port
    pub fn with_listener(self, pid: u32) -> Self {
        self.spawn_listener(pid);
        self
    }

    /// Only SIGKILL removes this process
    pub fn ignoring_sigterm(self, pid: u32) -> Self {
        self.state.lock().unwrap().deaf_to_sigterm.insert(pid);
        self
    }

    pub fn with_record(self, pid: u32) -> Self {
        self.state.lock().unwrap().record = Some(pid);
        self
    }

    pub fn spawn(&self, pid: u32) {
        self.state.lock().unwrap().alive.insert(pid);
    }

    pub fn spawn_listener(&self, pid: u32) {
        let mut state = self.state.lock().unwrap();
        state.alive.insert(pid);
        state.listener = Some(pid);
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        self.state.lock().unwrap().alive.contains(&pid)
    }

    pub fn is_listening(&self) -> bool {
        self.live_listener().is_some()
    }

    pub fn recorded(&self) -> Option<u32> {
        self.state.lock().unwrap().record
    }

    pub fn signals(&self) -> Vec<(u32, StopSignal)> {
        self.state.lock().unwrap().signals.clone()
    }

    fn live_listener(&self) -> Option<u32> {
        let state = self.state.lock().unwrap();
        state.listener.filter(|pid| state.alive.contains(pid))
    }

    fn deliver(&self, pid: u32, signal: StopSignal) {
        let mut state = self.state.lock().unwrap();
        state.signals.push((pid, signal));
        let dies = match signal {
            StopSignal::Terminate => !state.deaf_to_sigterm.contains(&pid),
            StopSignal::Kill => true,
        };
        if dies {
            state.alive.remove(&pid);
        }
    }

    /// Liveness, signals and listener discovery backed by the table.
    /// Program resolution and spawning are left to the test.
    pub fn process_control(&self) -> MockProcessControl {
        let mut mock = MockProcessControl::new();

        let world = self.clone();
        mock.expect_is_alive().returning(move |pid| world.is_alive(pid));

        let world = self.clone();
        mock.expect_signal().returning(move |pid, signal| {
            world.deliver(pid, signal);
            Ok(())
        });

        let world = self.clone();
        mock.expect_listeners_on_port()
            .returning(move |_| Ok(world.live_listener().into_iter().collect()));

        mock
    }

    pub fn port_probe(&self) -> MockPortProbe {
        let mut mock = MockPortProbe::new();
        let world = self.clone();
        mock.expect_is_listening().returning(move |_| world.is_listening());
        mock
    }

    pub fn pid_store(&self) -> MockPidStore {
        let mut mock = MockPidStore::new();

        let world = self.clone();
        mock.expect_load().returning(move || Ok(world.recorded()));

        let world = self.clone();
        mock.expect_save().returning(move |pid| {
            world.state.lock().unwrap().record = Some(pid);
            Ok(())
        });

        let world = self.clone();
        mock.expect_clear().returning(move || {
            world.state.lock().unwrap().record = None;
            Ok(())
        });

        mock
    }

    /// Expect exactly one spawn returning `pid`; with `stays_alive` false
    /// the process is already gone when first checked
    pub fn expect_spawn(&self, mock: &mut MockProcessControl, pid: u32, stays_alive: bool) {
        let world = self.clone();
        mock.expect_spawn_detached().times(1).returning(move |_| {
            if stays_alive {
                world.spawn(pid);
            }
            Ok(pid)
        });
    }
}

/// Builder for a supervisor over mocks, rooted in a fresh temp directory
pub struct SupervisorBuilder {
    dir: TempDir,
    config: SupervisorConfig,
    pid_store: MockPidStore,
    process: MockProcessControl,
    port_probe: MockPortProbe,
    health_probe: MockHealthProbe,
    opener: MockOpener,
}

impl SupervisorBuilder {
    /// Mocks start without expectations: any unexpected call panics
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = TestFixtures::config(dir.path());
        Self {
            dir,
            config,
            pid_store: MockPidStore::new(),
            process: MockProcessControl::new(),
            port_probe: MockPortProbe::new(),
            health_probe: MockHealthProbe::new(),
            opener: MockOpener::new(),
        }
    }

    /// Back the PID record, process table and port with `world`
    pub fn with_world(mut self, world: &FakeWorld) -> Self {
        self.pid_store = world.pid_store();
        self.process = world.process_control();
        self.port_probe = world.port_probe();
        self
    }

    pub fn with_config<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(SupervisorConfig) -> SupervisorConfig,
    {
        self.config = setup(self.config);
        self
    }

    pub fn with_process<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockProcessControl),
    {
        setup(&mut self.process);
        self
    }

    pub fn with_opener<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockOpener),
    {
        setup(&mut self.opener);
        self
    }

    pub fn pid_store(mut self, mock: MockPidStore) -> Self {
        self.pid_store = mock;
        self
    }

    pub fn process(mut self, mock: MockProcessControl) -> Self {
        self.process = mock;
        self
    }

    pub fn port_probe(mut self, mock: MockPortProbe) -> Self {
        self.port_probe = mock;
        self
    }

    pub fn health_probe(mut self, mock: MockHealthProbe) -> Self {
        self.health_probe = mock;
        self
    }

    pub fn build(self) -> TestHarness {
        TestHarness {
            supervisor: Supervisor::new(
                self.config,
                self.pid_store,
                self.process,
                self.port_probe,
                self.health_probe,
                self.opener,
            ),
            dir: self.dir,
        }
    }
}

/// A supervisor plus the temp directory its paths point into
pub struct TestHarness {
    pub supervisor: MockSupervisor,
    pub dir: TempDir,
}

impl TestHarness {
    pub fn config(&self) -> &SupervisorConfig {
        self.supervisor.config()
    }
}

pub struct TestHelpers;

impl TestHelpers {
    /// Resolve any program name to a path under /usr/bin
    pub fn expect_resolve(mock: &mut MockProcessControl) {
        mock.expect_resolve_program()
            .returning(|program| Ok(PathBuf::from("/usr/bin").join(program)));
    }

    /// Health probe that fails until call number `n`, then succeeds
    pub fn healthy_on(n: u32) -> MockHealthProbe {
        let calls = Arc::new(AtomicU32::new(0));
        let mut mock = MockHealthProbe::new();
        mock.expect_is_healthy()
            .returning(move |_| calls.fetch_add(1, Ordering::SeqCst) + 1 >= n);
        mock
    }

    pub fn never_healthy() -> MockHealthProbe {
        let mut mock = MockHealthProbe::new();
        mock.expect_is_healthy().returning(|_| false);
        mock
    }

    /// Port probe with a fixed answer
    pub fn port(listening: bool) -> MockPortProbe {
        let mut mock = MockPortProbe::new();
        mock.expect_is_listening().returning(move |_| listening);
        mock
    }

    /// PID record with a fixed content that must be cleared exactly once
    pub fn record_cleared_once(recorded: Option<u32>) -> MockPidStore {
        let mut mock = MockPidStore::new();
        mock.expect_load().returning(move || Ok(recorded));
        mock.expect_clear().times(1).returning(|| Ok(()));
        mock
    }
}
