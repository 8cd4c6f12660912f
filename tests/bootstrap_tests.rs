use std::io::Read;
use std::path::Path;

const CONFIG: &str = r#"{
    "logging": {
        "version": 1,
        "formatters": {
            "plain": { "format": "text", "target": true }
        },
        "handlers": {
            "console": { "class": "logging.StreamHandler", "level": "WARNING", "stream": "ext://sys.stderr" },
            "file_handler": {
                "class": "logging.FileHandler",
                "level": "DEBUG",
                "formatter": "plain",
                "mode": "w",
                "filename": "/nonexistent/overwritten.log"
            }
        },
        "root": { "level": "INFO", "handlers": ["console", "file_handler"] },
        "loggers": {
            "bootstrap::db": { "level": "DEBUG" }
        }
    }
}"#;

fn read(path: &Path) -> String {
    let mut s = String::new();
    std::fs::File::open(path)
        .expect("open log file")
        .read_to_string(&mut s)
        .expect("read log file");
    s
}

// The global subscriber can only be installed once per process, so the whole
// flow lives in a single test.
#[test]
fn test_init_installs_patched_configuration() {
    // Levels under test come from the config, not the developer's shell.
    unsafe {
        std::env::remove_var("RUST_LOG");
    }

    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("logging.json");
    std::fs::write(&config_path, CONFIG).unwrap();
    let home = dir.path().join("home");

    let handle = tmtlog::builder()
        .with_config_path(&config_path)
        .with_log_home(home.to_str().unwrap())
        .init()
        .expect("init logging");

    let log_file = home.join("tmt/logs/app.log");
    assert_eq!(handle.files().to_vec(), vec![log_file.clone()]);

    tracing::info!(target: "bootstrap::web", "bootstrap-test: info");
    tracing::debug!(target: "bootstrap::web", "bootstrap-test: filtered debug");
    tracing::debug!(target: "bootstrap::db", "bootstrap-test: db debug");

    // Let the worker write what it has before the second attempt.
    std::thread::sleep(std::time::Duration::from_millis(200));
    assert!(read(&log_file).contains("bootstrap-test: info"));

    // A second install is refused without reopening (and truncating) the
    // live log file, and the first subscriber keeps running.
    let again = tmtlog::builder()
        .with_config_path(&config_path)
        .with_log_home(home.to_str().unwrap())
        .init();
    assert!(matches!(again, Err(tmtlog::Error::Init(_))));
    tracing::info!(target: "bootstrap::web", "bootstrap-test: after refusal");

    drop(handle);

    let content = read(&log_file);
    assert!(content.contains("bootstrap-test: after refusal"));
    assert!(content.contains("logging configured"));
    assert!(content.contains("bootstrap-test: info"));
    assert!(content.contains("bootstrap::web"));
    assert!(content.contains("bootstrap-test: db debug"));
    assert!(!content.contains("filtered debug"));
    assert!(!content.contains('\x1b'), "ANSI escape found in log file");
}
