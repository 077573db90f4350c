mod common;

use std::time::Duration;

use common::{FakeSource, GB, MB, Read};
use inspektor::error::InspectError;
use inspektor::inspect::{Inspector, Target};
use inspektor::system::builder::{CPU_SAMPLE_WINDOW, build_combined, build_process, build_system};
use inspektor::system::snapshot::{Attribute, ProcessStatus};
use inspektor::system::source::Protocol;

#[test]
fn readable_process_fills_every_field() {
    let mut source = FakeSource::new().with_process(42);

    let process = build_process(&mut source, 42).unwrap();
    assert_eq!(process.pid, 42);
    assert_eq!(process.name, "proc-42");
    assert_eq!(process.executable, "/usr/bin/proc-42");
    assert_eq!(process.command_line, "proc-42 --serve");
    assert_eq!(process.working_dir, "/srv");
    assert_eq!(process.status, ProcessStatus::Sleeping);
    assert_eq!(process.memory_rss, 256 * MB);
    assert_eq!(process.memory_vms, 512 * MB);
    assert_eq!(process.started_at.timestamp(), 1_600_000_000);
    assert_eq!(process.open_files, 24);
    assert_eq!(process.connections, 3);
    assert_eq!(process.children, 2);
    assert!(process.unavailable.is_empty());
}

#[test]
fn refused_reads_degrade_to_zero_values() {
    let mut source = FakeSource::new()
        .with_process(42)
        .deny(Read::Executable)
        .deny(Read::WorkingDir)
        .deny(Read::OpenFiles)
        .deny(Read::StartTime);

    let process = build_process(&mut source, 42).unwrap();
    assert_eq!(process.executable, "");
    assert_eq!(process.working_dir, "");
    assert_eq!(process.open_files, 0);
    assert_eq!(process.started_at.timestamp(), 0);

    assert_eq!(process.name, "proc-42");
    assert_eq!(process.connections, 3);
    assert_eq!(process.memory_rss, 256 * MB);

    assert_eq!(
        process.unavailable,
        vec![
            Attribute::Executable,
            Attribute::WorkingDir,
            Attribute::StartTime,
            Attribute::OpenFiles,
        ]
    );
    assert!(!process.is_available(Attribute::OpenFiles));
    assert!(process.is_available(Attribute::Connections));
}

#[test]
fn refused_memory_read_zeroes_both_sizes() {
    let mut source = FakeSource::new().with_process(7).deny(Read::Memory);

    let process = build_process(&mut source, 7).unwrap();
    assert_eq!(process.memory_rss, 0);
    assert_eq!(process.memory_vms, 0);
    assert!(!process.is_available(Attribute::Memory));
}

#[test]
fn missing_process_is_fatal() {
    let mut source = FakeSource::new();

    let err = build_process(&mut source, 31337).unwrap_err();
    assert!(matches!(err, InspectError::ProcessNotFound(31337)));
    assert_eq!(err.to_string(), "process 31337 not found");
}

#[test]
fn system_snapshot_derives_memory_percent() {
    let mut source = FakeSource::new();

    let system = build_system(&mut source, CPU_SAMPLE_WINDOW).unwrap();
    assert_eq!(system.cpu_cores, 8);
    assert_eq!(system.cpu_model, "Fake CPU @ 3.00GHz");
    assert_eq!(system.memory_total, 16 * GB);
    assert!((system.memory_percent - 25.0).abs() < 1e-9);
    assert_eq!(source.cpu_windows, vec![CPU_SAMPLE_WINDOW]);
}

#[test]
fn host_reads_are_fatal() {
    for (read, what) in [
        (Read::CpuInfo, "CPU info"),
        (Read::SystemCpu, "CPU usage"),
        (Read::HostMemory, "memory stats"),
    ] {
        let mut source = FakeSource::new().deny(read);
        let err = build_system(&mut source, CPU_SAMPLE_WINDOW).unwrap_err();
        assert_eq!(err.what, what);
    }
}

#[test]
fn zero_host_memory_is_a_collection_error() {
    let mut source = FakeSource::new();
    source.host_total = 0;

    let err = build_system(&mut source, CPU_SAMPLE_WINDOW).unwrap_err();
    assert_eq!(err.what, "memory stats");
}

#[test]
fn combined_snapshot_surfaces_host_failure() {
    let mut source = FakeSource::new().with_process(42).deny(Read::HostMemory);

    let err = build_combined(&mut source, 42, Duration::ZERO).unwrap_err();
    assert!(matches!(err, InspectError::Collection(_)));
}

#[test]
fn inspector_resolves_port_then_collects() {
    let source = FakeSource::new()
        .with_process(808)
        .with_listener(Protocol::Tcp, 8080, 808);
    let mut inspector = Inspector::with_source(source).cpu_window(Duration::ZERO);

    let (pid, snapshot) = inspector.run(Target::Port(8080)).unwrap();
    assert_eq!(pid, 808);
    assert_eq!(snapshot.process.pid, 808);
    assert_eq!(snapshot.system.cpu_cores, 8);
}

#[test]
fn inspector_port_miss_stops_before_collection() {
    let mut inspector = Inspector::with_source(FakeSource::new().with_process(1));

    assert!(matches!(
        inspector.run(Target::Port(9)),
        Err(InspectError::NoListener(9))
    ));
}
