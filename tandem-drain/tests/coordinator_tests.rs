use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rstest::rstest;
use serial_test::serial;
use tandem_drain::worker::Worker;
use tandem_drain::{
    Coordinator, Direction, DrainConfig, DrainError, TerminalState, ThreadLauncher,
    WorkerLauncher, WorkerReport,
};

fn config(num_elements: usize) -> DrainConfig {
    DrainConfig::builder().num_elements(num_elements).build()
}

fn constant(value: i32) -> impl FnMut() -> i32 {
    move || value
}

// Launches through ThreadLauncher except for the listed directions, and counts launches.
//
#[derive(Default)]
struct SelectiveLauncher {
    failing: Vec<Direction>,
    launched: AtomicUsize,
}

impl SelectiveLauncher {
    fn failing(failing: &[Direction]) -> Self {
        SelectiveLauncher {
            failing: failing.to_vec(),
            launched: AtomicUsize::new(0),
        }
    }
}

impl WorkerLauncher for SelectiveLauncher {
    fn launch(&self, worker: Worker) -> Result<JoinHandle<WorkerReport>, DrainError> {
        let direction = worker.direction();
        if self.failing.contains(&direction) {
            return Err(DrainError::WorkerLaunch {
                direction,
                source: io::Error::other("thread limit reached"),
            });
        }

        self.launched.fetch_add(1, Ordering::SeqCst);
        ThreadLauncher::new().launch(worker)
    }
}

// Delays each worker by a random amount before it starts draining.
//
struct JitterLauncher {
    max_delay_micros: u64,
}

impl WorkerLauncher for JitterLauncher {
    fn launch(&self, worker: Worker) -> Result<JoinHandle<WorkerReport>, DrainError> {
        let delay = Duration::from_micros(fastrand::u64(..=self.max_delay_micros));
        Ok(thread::spawn(move || {
            thread::sleep(delay);
            worker.run()
        }))
    }
}

fn assert_conserved(num_elements: usize, coordinator: Coordinator) -> tandem_drain::ShutdownReport {
    let report = coordinator.shutdown();

    assert_eq!(
        num_elements as u64,
        report.consumed() + report.leftover_freed as u64,
        "{report}"
    );

    report
}

/// Initializes with N random values and shuts down at once: every node is
/// either counted by a worker or freed by the shutdown drain, whatever N is.
///
#[rstest]
#[serial(coordinator)]
#[case::empty(0)]
#[case::single(1)]
#[case::pair(2)]
#[case::default_size(1_000)]
#[case::large(200_000)]
fn test_initialize_then_shutdown_conserves_nodes(#[case] num_elements: usize) {
    let coordinator = Coordinator::initialize(&config(num_elements)).unwrap();

    let report = assert_conserved(num_elements, coordinator);

    assert!(report.head.is_some());
    assert!(report.tail.is_some());
}

/// The default configuration populates 1000 nodes, all consumed once both
/// workers are joined.
///
#[test]
#[serial(coordinator)]
fn test_default_config_populates_one_thousand_nodes() {
    let mut coordinator = Coordinator::initialize(&DrainConfig::default()).unwrap();

    for direction in Direction::ALL {
        coordinator.join(direction);
    }

    let report = coordinator.shutdown();
    assert_eq!(1_000, report.consumed());
    assert_eq!(0, report.leftover_freed);
}

/// Lets both workers run the list dry:
/// 1. Both end Drained and share all N nodes
/// 2. Head counts one significant zero and tail three ones per node of value 11
/// 3. Shutdown returns the reports already seen by join and frees nothing
///
#[test]
#[serial(coordinator)]
fn test_natural_drain_reports_drained_and_bit_rules() {
    let num_elements = 10_000;
    let mut coordinator =
        Coordinator::initialize_with(&config(num_elements), constant(0b1011), &ThreadLauncher::new())
            .unwrap();

    let head = coordinator.join(Direction::Head).unwrap();
    let tail = coordinator.join(Direction::Tail).unwrap();

    assert_eq!(TerminalState::Drained, head.terminal_state);
    assert_eq!(TerminalState::Drained, tail.terminal_state);
    assert_eq!(num_elements as u64, head.count_nodes + tail.count_nodes);

    // 11 has one significant zero and three ones.
    //
    assert_eq!(head.count_nodes, head.count_bits);
    assert_eq!(tail.count_nodes * 3, tail.count_bits);

    let report = coordinator.shutdown();
    assert_eq!(0, report.leftover_freed);
    assert_eq!(Some(head), report.head);
    assert_eq!(Some(tail), report.tail);
}

/// Shutting down a paused coordinator stops both workers before their first
/// take, so the drain frees all N nodes.
///
#[test]
#[serial(coordinator)]
fn test_cancel_before_start_force_drains_everything() {
    let num_elements = 5_000;
    let coordinator =
        Coordinator::initialize_paused(&config(num_elements), constant(-1), &ThreadLauncher::new())
            .unwrap();

    let report = coordinator.shutdown();

    assert_eq!(num_elements, report.leftover_freed);
    for direction in Direction::ALL {
        let worker = report.worker(direction).unwrap();
        assert_eq!((0, 0), worker.counts());
        assert_eq!(TerminalState::StoppedByRequest, worker.terminal_state);
    }
}

/// Paused workers consume nothing until resumed. Resume opens the gate once.
///
#[test]
#[serial(coordinator)]
fn test_paused_workers_run_after_resume() {
    let num_elements = 1_000;
    let mut coordinator =
        Coordinator::initialize_paused(&config(num_elements), constant(1), &ThreadLauncher::new())
            .unwrap();

    thread::sleep(Duration::from_millis(20));
    assert_eq!(num_elements, coordinator.remaining());

    assert!(coordinator.resume());
    assert!(!coordinator.resume());

    coordinator.join(Direction::Head);
    coordinator.join(Direction::Tail);
    assert_eq!(0, coordinator.remaining());

    let report = coordinator.shutdown();
    assert_eq!(num_elements as u64, report.consumed());
}

/// When one worker fails to launch, its slot stays empty and the other worker
/// drains the whole list alone.
///
#[rstest]
#[serial(coordinator)]
#[case::head_fails(Direction::Head)]
#[case::tail_fails(Direction::Tail)]
fn test_launch_failure_leaves_survivor_to_drain(#[case] failing: Direction) {
    let num_elements = 20_000;
    let launcher = SelectiveLauncher::failing(&[failing]);
    let mut coordinator =
        Coordinator::initialize_with(&config(num_elements), constant(7), &launcher).unwrap();

    assert_eq!(1, launcher.launched.load(Ordering::SeqCst));
    assert!(coordinator.worker(failing).is_none());
    assert!(!coordinator.cancel(failing));

    let survivor = Direction::ALL.into_iter().find(|d| *d != failing).unwrap();
    let survivor_report = coordinator.join(survivor).unwrap();

    assert_eq!(TerminalState::Drained, survivor_report.terminal_state);
    assert_eq!(num_elements as u64, survivor_report.count_nodes);

    let report = coordinator.shutdown();
    assert_eq!(None, report.worker(failing));
    assert_eq!(0, report.leftover_freed);
}

/// With no worker launched, shutdown reports both slots empty and frees every node.
///
#[test]
#[serial(coordinator)]
fn test_no_workers_launched_everything_is_force_drained() {
    let num_elements = 300;
    let launcher = SelectiveLauncher::failing(&Direction::ALL);
    let coordinator =
        Coordinator::initialize_with(&config(num_elements), constant(3), &launcher).unwrap();

    assert_eq!(num_elements, coordinator.remaining());

    let report = coordinator.shutdown();
    assert_eq!(None, report.head);
    assert_eq!(None, report.tail);
    assert_eq!(num_elements, report.leftover_freed);
}

/// Population past the node limit fails with the append count and launches no worker.
///
#[test]
fn test_out_of_memory_fails_before_any_launch() {
    let config = DrainConfig::builder()
        .num_elements(100)
        .node_limit(40)
        .build();
    let launcher = SelectiveLauncher::default();

    let result = Coordinator::initialize_with(&config, constant(1), &launcher);

    match result {
        Err(DrainError::OutOfMemory {
            appended,
            requested,
            ..
        }) => {
            assert_eq!(40, appended);
            assert_eq!(100, requested);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("population past the node limit must fail"),
    }

    assert_eq!(0, launcher.launched.load(Ordering::SeqCst));
}

/// A node limit equal to N is enough to populate the list.
///
#[test]
#[serial(coordinator)]
fn test_node_limit_at_size_is_enough() {
    let config = DrainConfig::builder()
        .num_elements(64)
        .node_limit(64)
        .build();

    let coordinator = Coordinator::initialize(&config).unwrap();
    assert_conserved(64, coordinator);
}

/// Worker threads launched with a small configured stack still drain the
/// whole list.
///
#[test]
#[serial(coordinator)]
fn test_configured_stack_size_drains_everything() {
    let num_elements = 50_000;
    let config = DrainConfig::builder()
        .num_elements(num_elements)
        .stack_size(256 * 1024)
        .build();
    assert_eq!(Some(256 * 1024), config.stack_size);

    let mut coordinator = Coordinator::initialize(&config).unwrap();
    let head = coordinator.join(Direction::Head).unwrap();
    let tail = coordinator.join(Direction::Tail).unwrap();

    assert_eq!(num_elements as u64, head.count_nodes + tail.count_nodes);
    assert_eq!(0, assert_conserved(num_elements, coordinator).leftover_freed);
}

/// Cancel and join may be repeated: a second cancel reports false and every
/// join after the first returns the cached report.
///
#[test]
#[serial(coordinator)]
fn test_cancel_and_join_are_idempotent() {
    let mut coordinator = Coordinator::initialize(&config(2_000)).unwrap();

    // Let the head worker finish on its own first.
    //
    let first = coordinator.join(Direction::Head).unwrap();
    let head = coordinator.worker(Direction::Head).unwrap();
    assert!(head.is_finished());
    assert!(!head.is_cancelled());
    assert_eq!(Some(first), head.report());

    // Cancelling a finished worker changes nothing.
    //
    coordinator.cancel(Direction::Head);
    assert!(!coordinator.cancel(Direction::Head));
    assert!(coordinator.worker(Direction::Head).unwrap().is_cancelled());
    assert_eq!(Some(first), coordinator.join(Direction::Head));
    assert_eq!(Some(first), coordinator.worker(Direction::Head).unwrap().report());

    coordinator.cancel_all();
    coordinator.cancel_all();
    assert!(coordinator.worker(Direction::Tail).unwrap().is_cancelled());

    let report = coordinator.shutdown();
    assert_eq!(Some(first), report.head);
    assert_eq!(2_000, report.consumed() + report.leftover_freed as u64);
}

/// Shuts down while both workers are still draining a list far too large to
/// finish in time:
/// 1. Every node is either counted by exactly one worker or freed by the drain
/// 2. Counters accumulated before the stop match the bit rules node for node
/// 3. At least one worker stops by request and leftovers are freed
///
#[test]
#[serial(coordinator)]
fn test_cancellation_mid_drain_keeps_counters() {
    let num_elements = 3_000_000;
    let coordinator =
        Coordinator::initialize_with(&config(num_elements), constant(0b1011), &ThreadLauncher::new())
            .unwrap();

    thread::sleep(Duration::from_millis(2));

    let report = assert_conserved(num_elements, coordinator);
    let head = report.head.unwrap();
    let tail = report.tail.unwrap();

    // 11 has one significant zero and three ones.
    //
    assert_eq!(head.count_nodes, head.count_bits, "{report}");
    assert_eq!(tail.count_nodes * 3, tail.count_bits, "{report}");

    assert!(report.leftover_freed > 0, "{report}");
    assert!(
        [head, tail]
            .iter()
            .any(|worker| worker.terminal_state == TerminalState::StoppedByRequest),
        "{report}"
    );
}

/// Races both workers for a single node under random start delays: exactly one
/// wins it and the other ends Drained with zero counters.
///
#[test]
#[serial(coordinator)]
fn test_single_node_race_under_jitter() {
    for round in 0..300 {
        let launcher = JitterLauncher {
            max_delay_micros: 200,
        };
        let mut coordinator =
            Coordinator::initialize_with(&config(1), constant(round), &launcher).unwrap();

        let head = coordinator.join(Direction::Head).unwrap();
        let tail = coordinator.join(Direction::Tail).unwrap();

        let (winner, loser) = if head.count_nodes == 1 {
            (head, tail)
        } else {
            (tail, head)
        };

        assert_eq!(1, winner.count_nodes, "round {round}");
        assert_eq!((0, 0), loser.counts(), "round {round}");
        assert_eq!(TerminalState::Drained, loser.terminal_state);
        assert_eq!(TerminalState::Drained, winner.terminal_state);

        let report = coordinator.shutdown();
        assert_eq!(0, report.leftover_freed);
    }
}

/// Dropping a paused coordinator without shutdown still releases both workers.
///
#[test]
#[serial(coordinator)]
fn test_drop_without_shutdown_releases_paused_workers() {
    let released = Arc::new(AtomicUsize::new(0));

    struct CountingLauncher(Arc<AtomicUsize>);

    impl WorkerLauncher for CountingLauncher {
        fn launch(&self, worker: Worker) -> Result<JoinHandle<WorkerReport>, DrainError> {
            let released = Arc::clone(&self.0);
            Ok(thread::spawn(move || {
                let report = worker.run();
                released.fetch_add(1, Ordering::SeqCst);
                report
            }))
        }
    }

    let coordinator = Coordinator::initialize_paused(
        &config(100),
        constant(0),
        &CountingLauncher(Arc::clone(&released)),
    )
    .unwrap();

    drop(coordinator);

    // Both workers leave the gate, see the cancellation and exit.
    //
    for _ in 0..1_000 {
        if released.load(Ordering::SeqCst) == 2 {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }

    panic!("paused workers were not released on drop");
}

/// Renders one line per worker slot and the leftover count.
///
#[test]
fn test_shutdown_report_display() {
    let report = tandem_drain::ShutdownReport {
        head: Some(WorkerReport {
            direction: Direction::Head,
            count_bits: 12,
            count_nodes: 4,
            terminal_state: TerminalState::Drained,
        }),
        tail: None,
        leftover_freed: 3,
    };

    assert_eq!(
        "head worker: 12 bits=0 in 4 nodes (drained)\n\
         tail worker: not running\n\
         leftover nodes freed: 3",
        report.to_string()
    );
}
