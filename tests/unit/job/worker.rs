use super::*;
use crate::foundation::core::Fps;
use crate::job::model::FailureKind;
use crate::job::test_support::*;

const WAIT: Duration = Duration::from_secs(30);

fn job_in(dir: &Path) -> EncodingJob {
    EncodingJob::new(dir, Fps::integer(10).unwrap())
}

fn images(name: &str, n: usize) -> PathBuf {
    let dir = scratch_dir(name);
    for i in 0..n {
        write_png(&dir.join(format!("img{i}.png")), 2, 2, [9, 9, 9, 255]);
    }
    dir
}

fn coordinator(settings: Settings, sinks: FakeSinks) -> Coordinator {
    Coordinator::new(
        settings,
        toolchain(sinks, FakeAudio { secs: None }, FakeMuxer::default()),
    )
    .unwrap()
}

#[test]
fn finished_is_the_last_event() {
    let dir = images("worker_events", 4);
    let coord = coordinator(Settings::default(), FakeSinks::default());
    let handle = coord.start(job_in(&dir)).unwrap();

    let mut events = Vec::new();
    while let Some(ev) = handle.recv_timeout(WAIT) {
        let done = matches!(ev, JobEvent::Finished { .. });
        events.push(ev);
        if done {
            break;
        }
    }
    assert!(handle.recv_timeout(Duration::from_millis(50)).is_none());
    assert!(events.iter().all(|e| e.job() == handle.id()));

    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Progress { percent, .. } => Some(*percent),
            JobEvent::Finished { .. } => None,
        })
        .collect();
    assert_eq!(progress, vec![25, 50, 75, 100]);
    assert!(matches!(
        events.last(),
        Some(JobEvent::Finished {
            outcome: JobOutcome::Success { frames: 4, .. },
            ..
        })
    ));
}

#[test]
fn wait_forwards_progress_and_returns_outcome() {
    let dir = scratch_dir("worker_empty");
    let coord = coordinator(Settings::default(), FakeSinks::default());
    let handle = coord.start(job_in(&dir)).unwrap();

    let mut progress = Vec::new();
    let outcome = handle.wait(WAIT, |p| progress.push(p)).unwrap();
    assert_eq!(outcome, JobOutcome::NoImages);
    assert!(progress.is_empty());
    assert!(coord.active_jobs().is_empty());
}

#[test]
fn busy_folder_is_refused_until_the_job_ends() {
    let dir = images("worker_busy", 2);
    let (release, gate) = std::sync::mpsc::channel();
    let sinks = FakeSinks {
        gate: std::sync::Mutex::new(Some(gate)),
        ..FakeSinks::default()
    };
    let settings = Settings {
        exclusive: false,
        ..Settings::default()
    };
    let coord = coordinator(settings, sinks);

    let first = coord.start(job_in(&dir)).unwrap();
    assert_eq!(coord.active_jobs(), vec![first.id()]);

    let err = coord.start(job_in(&dir)).unwrap_err();
    assert!(matches!(err, StillreelError::Busy(_)), "{err}");

    let other = scratch_dir("worker_busy_other");
    let second = coord.start(job_in(&other)).unwrap();
    assert_eq!(second.wait(WAIT, |_| {}).unwrap(), JobOutcome::NoImages);

    release.send(()).unwrap();
    assert!(first.wait(WAIT, |_| {}).unwrap().is_success());
    assert!(coord.active_jobs().is_empty());

    let again = coord.start(job_in(&dir)).unwrap();
    assert!(again.wait(WAIT, |_| {}).unwrap().is_success());
}

#[test]
fn exclusive_coordinator_runs_one_job_at_a_time() {
    let dir = images("worker_exclusive", 1);
    let (release, gate) = std::sync::mpsc::channel();
    let sinks = FakeSinks {
        gate: std::sync::Mutex::new(Some(gate)),
        ..FakeSinks::default()
    };
    let coord = coordinator(Settings::default(), sinks);

    let first = coord.start(job_in(&dir)).unwrap();
    let other = scratch_dir("worker_exclusive_other");
    let err = coord.start(job_in(&other)).unwrap_err();
    assert!(matches!(err, StillreelError::Busy(_)));

    release.send(()).unwrap();
    assert!(first.wait(WAIT, |_| {}).unwrap().is_success());
}

#[test]
fn wait_times_out_while_the_worker_is_blocked() {
    let dir = images("worker_timeout", 1);
    let (release, gate) = std::sync::mpsc::channel();
    let sinks = FakeSinks {
        gate: std::sync::Mutex::new(Some(gate)),
        ..FakeSinks::default()
    };
    let coord = coordinator(Settings::default(), sinks);
    let handle = coord.start(job_in(&dir)).unwrap();

    let err = handle.wait(Duration::from_millis(50), |_| {}).unwrap_err();
    assert!(matches!(err, StillreelError::Timeout(_)));

    release.send(()).unwrap();
    assert!(handle.wait(WAIT, |_| {}).unwrap().is_success());
}

struct PanickingSinks;

impl crate::encode::sink::SinkFactory for PanickingSinks {
    fn create(&self) -> Box<dyn crate::encode::sink::FrameSink> {
        panic!("sink factory exploded");
    }
}

#[test]
fn worker_panic_becomes_internal_failure() {
    let dir = images("worker_panic", 1);
    let tc = Toolchain {
        sinks: Arc::new(PanickingSinks),
        audio: Arc::new(FakeAudio { secs: None }),
        muxer: Arc::new(FakeMuxer::default()),
    };
    let coord = Coordinator::new(Settings::default(), tc).unwrap();
    let handle = coord.start(job_in(&dir)).unwrap();

    let outcome = handle.wait(WAIT, |_| {}).unwrap();
    let JobOutcome::Failed { kind, message } = outcome else {
        panic!("expected internal failure");
    };
    assert_eq!(kind, FailureKind::Internal);
    assert!(message.contains("sink factory exploded"));
    assert!(coord.active_jobs().is_empty());
    assert_eq!(dir_entries(&dir), vec!["img0.png"]);
}

#[test]
fn invalid_jobs_are_refused_at_start() {
    let coord = coordinator(Settings::default(), FakeSinks::default());
    let err = coord
        .start(job_in(Path::new(".")).with_output_name(""))
        .unwrap_err();
    assert!(matches!(err, StillreelError::Validation(_)));
    assert!(coord.active_jobs().is_empty());
}

#[test]
fn settings_are_kept_for_callers() {
    let settings = Settings {
        completion_timeout_secs: 5,
        exclusive: false,
        ..Settings::default()
    };
    let coord = coordinator(settings.clone(), FakeSinks::default());
    assert_eq!(coord.settings(), &settings);
    assert_eq!(coord.settings().completion_timeout(), Duration::from_secs(5));
}

#[test]
fn invalid_settings_are_refused() {
    let settings = Settings {
        audio_channels: 0,
        ..Settings::default()
    };
    let tc = toolchain(
        FakeSinks::default(),
        FakeAudio { secs: None },
        FakeMuxer::default(),
    );
    assert!(Coordinator::new(settings, tc).is_err());
}

#[test]
fn panic_message_reads_common_payloads() {
    assert_eq!(panic_message(&"static"), "static");
    assert_eq!(panic_message(&String::from("owned")), "owned");
    assert_eq!(panic_message(&42u8), "unknown panic payload");
}
