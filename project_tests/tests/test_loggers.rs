use std::fs;
use std::sync::Arc;
use std::time::Duration;

use hub_common::loggers::{MemoryStream, SinkError, SinkLocation};
use hub_common::{hub_log, CategoryPolicy, LogCategory, LoggerRegistry, Placement};
use project_tests::{local_config, read_lines, GatedStream};
use tempfile::tempdir;
use tokio::time::timeout;

#[tokio::test]
async fn test_single_producer_lines_arrive_in_order() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let mut config = local_config(temp_dir.path());
    config.queue_capacity = 4;
    let registry = LoggerRegistry::new(config).expect("Failed to build registry");

    let access = registry.get(LogCategory::Access);
    for i in 0..500 {
        access.write("seq", &format!("line {i}")).await;
    }
    let path = access.path().to_path_buf();
    registry.close_all().await;

    let expected: Vec<String> = (0..500).map(|i| format!("seq: line {i}")).collect();
    assert_eq!(read_lines(&path), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_access_opens_one_sink() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let registry = Arc::new(LoggerRegistry::new(local_config(temp_dir.path())).unwrap());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get(LogCategory::Access) })
        })
        .collect();

    let mut loggers = Vec::new();
    for handle in handles {
        loggers.push(handle.await.unwrap());
    }

    assert!(loggers.iter().all(|logger| Arc::ptr_eq(logger, &loggers[0])));
    assert_eq!(registry.opened_sinks(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_all_loses_nothing() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let mut config = local_config(temp_dir.path());
    config.queue_capacity = 8;
    let registry = Arc::new(LoggerRegistry::new(config).unwrap());

    let producers: Vec<_> = (0..4)
        .map(|producer| {
            let logger = registry.get(LogCategory::Access);
            tokio::spawn(async move {
                for i in 0..250 {
                    logger.write(&format!("p{producer}"), &i.to_string()).await;
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    let reports = registry.close_all().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].written, 1000);
    assert_eq!(reports[0].failed, 0);

    let lines = read_lines(&reports[0].path);
    assert_eq!(lines.len(), 1000);
    // per-producer order survives interleaving
    for producer in 0..4 {
        let tag = format!("p{producer}: ");
        let own: Vec<u32> = lines
            .iter()
            .filter_map(|line| line.strip_prefix(&tag))
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(own, (0..250).collect::<Vec<u32>>());
    }
}

#[tokio::test]
async fn test_unusable_system_dir_falls_back_to_local() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let blocker = temp_dir.path().join("not-a-dir");
    fs::write(&blocker, b"").unwrap();

    let mut config = local_config(temp_dir.path());
    config.placement = Placement::System;
    config.system_log_dir = blocker.join("DMRHub");
    let registry = LoggerRegistry::new(config).unwrap();

    let access = registry.get(LogCategory::Access);
    assert_eq!(access.location(), SinkLocation::Local);
    assert_eq!(access.path(), temp_dir.path().join("DMRHub.access.log"));

    access.write("hub", "still logging").await;
    registry.close_all().await;
    assert_eq!(read_lines(&temp_dir.path().join("DMRHub.access.log")), vec!["hub: still logging"]);
}

#[tokio::test]
async fn test_missing_system_dir_is_created() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let system_dir = temp_dir.path().join("var-log-DMRHub");

    let mut config = local_config(&temp_dir.path().join("unused"));
    config.placement = Placement::System;
    config.system_log_dir = system_dir.clone();
    let registry = LoggerRegistry::new(config).unwrap();

    let access = registry.get(LogCategory::Access);
    assert_eq!(access.location(), SinkLocation::System);
    assert!(system_dir.is_dir());
    assert_eq!(access.path(), system_dir.join("DMRHub.access.log"));
}

#[tokio::test]
async fn test_no_writable_location_is_fatal() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let blocker = temp_dir.path().join("not-a-dir");
    fs::write(&blocker, b"").unwrap();

    let mut config = local_config(&blocker.join("local"));
    config.placement = Placement::System;
    config.system_log_dir = blocker.join("system");
    let registry = LoggerRegistry::new(config).unwrap();

    let err = registry.try_get(LogCategory::Access).unwrap_err();
    assert!(matches!(err, SinkError::Fallback { .. }));
    assert!(err.is_fatal());
    assert_eq!(registry.opened_sinks(), 0);
}

#[tokio::test]
async fn test_error_lines_are_mirrored_access_lines_are_not() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let stream = MemoryStream::new();
    let registry = LoggerRegistry::builder(local_config(temp_dir.path()))
        .stream(stream.make_writer())
        .build()
        .unwrap();

    let error = registry.get(LogCategory::Error);
    let access = registry.get(LogCategory::Access);
    error.write("peers", "repeater 311000 timed out").await;
    access.write("peers", "repeater 311001 logged in").await;
    let (error_path, access_path) = (error.path().to_path_buf(), access.path().to_path_buf());
    registry.close_all().await;

    assert_eq!(read_lines(&error_path), vec!["peers: repeater 311000 timed out"]);
    assert_eq!(read_lines(&access_path), vec!["peers: repeater 311001 logged in"]);
    assert_eq!(stream.lines(), vec!["peers: repeater 311000 timed out"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_error_producers_each_line_once() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let stream = MemoryStream::new();
    let registry = Arc::new(
        LoggerRegistry::builder(local_config(temp_dir.path()))
            .stream(stream.make_writer())
            .build()
            .unwrap(),
    );

    let a = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.get(LogCategory::Error).write("A", "boom").await })
    };
    let b = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.get(LogCategory::Error).write("B", "fail").await })
    };
    a.await.unwrap();
    b.await.unwrap();

    let reports = registry.close_all().await;
    let mut file_lines = read_lines(&reports[0].path);
    file_lines.sort();
    let mut stream_lines = stream.lines();
    stream_lines.sort();

    assert_eq!(file_lines, vec!["A: boom", "B: fail"]);
    assert_eq!(stream_lines, vec!["A: boom", "B: fail"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_queue_suspends_producer_until_relay_catches_up() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let stream = GatedStream::new();
    let mut config = local_config(temp_dir.path());
    config.queue_capacity = 2;
    let registry = LoggerRegistry::builder(config)
        .stream(stream.make_writer())
        .build()
        .unwrap();
    let error = registry.get(LogCategory::Error);

    // The relay takes line 0 and stalls on the stream.
    error.write("slow", "0").await;
    stream.wait_entered(1).await;

    // Two more fill the queue.
    timeout(Duration::from_secs(5), error.write("slow", "1")).await.expect("queue had room");
    timeout(Duration::from_secs(5), error.write("slow", "2")).await.expect("queue had room");

    // The next one has to wait.
    let blocked = timeout(Duration::from_millis(200), error.write("slow", "3")).await;
    assert!(blocked.is_err(), "producer was not suspended on a full queue");

    stream.open();
    timeout(Duration::from_secs(5), error.write("slow", "3")).await.expect("relay never caught up");

    let path = error.path().to_path_buf();
    registry.close_all().await;
    assert_eq!(read_lines(&path), vec!["slow: 0", "slow: 1", "slow: 2", "slow: 3"]);
    assert_eq!(stream.contents(), "slow: 0\nslow: 1\nslow: 2\nslow: 3\n");
}

#[tokio::test]
async fn test_hub_log_tags_lines_with_the_calling_function() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let registry = LoggerRegistry::new(local_config(temp_dir.path())).unwrap();

    let access = registry.get(LogCategory::Access);
    hub_log!(access, "peer {} sent {}", 311_000, "RPTPING").await;
    let path = access.path().to_path_buf();
    registry.close_all().await;

    assert_eq!(
        read_lines(&path),
        vec!["test_hub_log_tags_lines_with_the_calling_function: peer 311000 sent RPTPING"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hub_log_with_runtime_arguments_inside_spawned_tasks() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let registry = Arc::new(LoggerRegistry::new(local_config(temp_dir.path())).unwrap());

    let producers: Vec<_> = (0..3u32)
        .map(|worker| {
            let logger = registry.get(LogCategory::Error);
            tokio::spawn(async move {
                let peer = 311_000 + worker;
                hub_log!(logger, "peer {} timed out", peer).await;
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    let reports = registry.close_all().await;
    let mut lines = read_lines(&reports[0].path);
    lines.sort();
    let expected: Vec<String> = (0..3)
        .map(|worker| {
            format!("test_hub_log_with_runtime_arguments_inside_spawned_tasks: peer {} timed out", 311_000 + worker)
        })
        .collect();
    assert_eq!(lines, expected);
}

#[tokio::test]
async fn test_timestamp_prefix_and_append_across_restarts() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let mut config = local_config(temp_dir.path());
    config.timestamp_format = "%Y/%m/%d %H:%M:%S".to_string();

    for run in 0..2 {
        let registry = LoggerRegistry::new(config.clone()).unwrap();
        registry.get(LogCategory::Access).write("hub", &format!("run {run}")).await;
        registry.close_all().await;
    }

    let lines = read_lines(&temp_dir.path().join("DMRHub.access.log"));
    assert_eq!(lines.len(), 2);
    for (run, line) in lines.iter().enumerate() {
        // "YYYY/MM/DD HH:MM:SS hub: run N"
        assert_eq!(line.len(), 19 + " hub: run 0".len());
        assert!(line.ends_with(&format!(" hub: run {run}")));
        assert_eq!(&line[4..5], "/");
    }
}

#[tokio::test]
async fn test_config_file_drives_registry() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let json = serde_json::json!({
        "appName": "hubtest",
        "placement": "local",
        "localLogDir": temp_dir.path(),
        "timestampFormat": "",
        "categories": { "access": { "mirrorToStream": true } }
    });
    let config_path = temp_dir.path().join("logging.json");
    fs::write(&config_path, json.to_string()).unwrap();

    let config = hub_common::LoggingConfig::load(&config_path).unwrap();
    assert_eq!(config.policy(LogCategory::Access), Some(CategoryPolicy { mirror_to_stream: true }));

    let stream = MemoryStream::new();
    let registry = LoggerRegistry::builder(config).stream(stream.make_writer()).build().unwrap();
    let access = registry.get(LogCategory::Access);
    assert_eq!(access.path(), temp_dir.path().join("hubtest.access.log"));

    access.write("cfg", "mirrored").await;
    registry.close_all().await;
    assert_eq!(stream.lines(), vec!["cfg: mirrored"]);
}
