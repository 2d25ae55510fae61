//! Integration tests for launching and supervising servers
//!
//! A fake spawner and process table share one set of "live" pids so tests
//! can kill servers and watch the supervisor bring them back.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use conquest_launcher::config::Config;
use conquest_launcher::launcher::{LaunchCoordinator, ProcessSpawner};
use conquest_launcher::monitor::{MonitorError, ProcessMonitor, ProcessTable, replace_down};
use conquest_launcher::registry::{InstanceRegistry, ProcessId};
use conquest_launcher::store::{self, DedicatedItem, MultiServerConfig, OverrideDocument};
use conquest_launcher::supervisor::{CycleReport, Supervisor};
use serial_test::serial;
use tempfile::TempDir;

#[derive(Default)]
struct FakeOs {
    live: HashSet<u32>,
    next_pid: u32,
    spawned_configs: Vec<String>,
    table_broken: bool,
}

struct FakeSpawner {
    os: Rc<RefCell<FakeOs>>,
    target: PathBuf,
}

impl ProcessSpawner for FakeSpawner {
    fn spawn(&mut self, _program: &Path) -> io::Result<ProcessId> {
        let config = fs::read_to_string(&self.target)?;
        let mut os = self.os.borrow_mut();
        os.next_pid += 1;
        let pid = os.next_pid;
        os.live.insert(pid);
        os.spawned_configs.push(config);
        Ok(ProcessId(pid))
    }
}

struct FakeTable {
    os: Rc<RefCell<FakeOs>>,
}

impl ProcessTable for FakeTable {
    fn running_pids(&mut self, name: &str) -> Result<HashSet<ProcessId>, MonitorError> {
        let os = self.os.borrow();
        if os.table_broken {
            return Err(MonitorError::Enumerate {
                name: name.to_string(),
                message: "broken".to_string(),
            });
        }
        Ok(os.live.iter().copied().map(ProcessId).collect())
    }
}

const DESCRIPTOR: &str = r#"<?xml version="1.0"?>
<Config TargetFileName="Dedicated" ServerFilePath="ConquestServer.exe" LogLevel="debug">
  <Dedicated FileName="helm" GameName="Helms Deep" Port="15001" />
  <Dedicated FileName="moria" GameName="Moria" Port="15002" RandomStartLevel="true" />
  <Dedicated FileName="rivendell" GameName="Rivendell" Port="15003" RandomLevelOrder="true" />
</Config>"#;

const OVERRIDE: &str = r#"<Config>
  <Plasma><Port>12000</Port><GameName>Default</GameName></Plasma>
  <Levels><Level>Helm</Level><Level>Moria</Level><Level>Rivendell</Level><Level>Minas</Level></Levels>
</Config>"#;

struct Fixture {
    temp_dir: TempDir,
    config: Config,
    descriptor: MultiServerConfig,
    os: Rc<RefCell<FakeOs>>,
}

impl Fixture {
    fn new(override_files: &[&str]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = Config {
            server_dir: temp_dir.path().to_path_buf(),
            launch_timeout_ms: 0,
            down_check_interval_ms: 0,
            ..Default::default()
        };

        fs::write(config.descriptor_path(), DESCRIPTOR).unwrap();
        for name in override_files {
            fs::write(temp_dir.path().join(name), OVERRIDE).unwrap();
        }

        let descriptor = store::load_top_level(&config.descriptor_path()).unwrap();
        Self {
            temp_dir,
            config,
            descriptor,
            os: Rc::new(RefCell::new(FakeOs {
                next_pid: 1000,
                ..Default::default()
            })),
        }
    }

    fn launcher(&self) -> LaunchCoordinator<FakeSpawner> {
        let spawner = FakeSpawner {
            os: Rc::clone(&self.os),
            target: self.temp_dir.path().join("Dedicated.xml"),
        };
        LaunchCoordinator::new(&self.config, &self.descriptor, spawner)
    }

    fn monitor(&self) -> ProcessMonitor<FakeTable> {
        ProcessMonitor::new(
            self.config.server_process_name.clone(),
            FakeTable { os: Rc::clone(&self.os) },
        )
    }

    fn supervisor(&self) -> Supervisor<FakeSpawner, FakeTable> {
        Supervisor::start(self.launcher(), self.monitor(), Duration::ZERO)
    }

    fn kill(&self, pid: ProcessId) {
        self.os.borrow_mut().live.remove(&pid.0);
    }
}

fn file_names(registry: &InstanceRegistry) -> Vec<String> {
    registry.iter().map(|i| i.file_name().to_string()).collect()
}

// =============================================================================
// Launch Tests
// =============================================================================

#[test]
fn test_launch_all_returns_instances_in_descriptor_order() {
    let fixture = Fixture::new(&["helm.xml", "moria.xml", "rivendell.xml"]);
    let instances = fixture.launcher().launch_all();

    assert_eq!(instances.len(), 3);
    for (instance, item) in instances.iter().zip(&fixture.descriptor.dedicated) {
        assert_eq!(*instance.descriptor, **item);
        assert!(Arc::ptr_eq(&instance.descriptor, item));
    }
}

#[test]
fn test_each_spawn_sees_its_own_overrides() {
    let fixture = Fixture::new(&["helm.xml", "moria.xml", "rivendell.xml"]);
    fixture.launcher().launch_all();

    let os = fixture.os.borrow();
    assert_eq!(os.spawned_configs.len(), 3);
    for (config, (port, name)) in os
        .spawned_configs
        .iter()
        .zip([("15001", "Helms Deep"), ("15002", "Moria"), ("15003", "Rivendell")])
    {
        let doc = OverrideDocument::parse(config).unwrap();
        assert_eq!(doc.value("Plasma", "Port").as_deref(), Some(port));
        assert_eq!(doc.value("Plasma", "GameName").as_deref(), Some(name));
        assert_eq!(doc.level_count(), 4);
    }
}

#[test]
fn test_missing_override_file_is_skipped_without_error() {
    let fixture = Fixture::new(&["moria.xml", "rivendell.xml"]);
    let instances = fixture.launcher().launch_all();

    let names: Vec<&str> = instances.iter().map(|i| i.file_name()).collect();
    assert_eq!(names, vec!["moria.xml", "rivendell.xml"]);
}

#[test]
fn test_launch_selected_only_launches_given_items() {
    let fixture = Fixture::new(&["helm.xml", "moria.xml", "rivendell.xml"]);
    let selected = vec![Arc::clone(&fixture.descriptor.dedicated[2])];

    let instances = fixture.launcher().launch_selected(&selected);

    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].file_name(), "rivendell.xml");
}

#[test]
fn test_launch_selected_with_unknown_file_launches_nothing() {
    let fixture = Fixture::new(&[]);
    let instances = fixture
        .launcher()
        .launch_selected(&[Arc::new(DedicatedItem::new("nowhere"))]);
    assert!(instances.is_empty());
}

// =============================================================================
// Supervision Tests
// =============================================================================

#[test]
fn test_cycle_with_all_servers_up_does_nothing() {
    let fixture = Fixture::new(&["helm.xml", "moria.xml", "rivendell.xml"]);
    let mut supervisor = fixture.supervisor();
    let before = supervisor.registry().clone();

    assert_eq!(supervisor.run_cycle(), CycleReport::default());
    assert_eq!(supervisor.registry(), &before);
}

#[test]
fn test_down_server_is_relaunched_in_its_slot() {
    let fixture = Fixture::new(&["helm.xml", "moria.xml", "rivendell.xml"]);
    let mut supervisor = fixture.supervisor();
    let before = supervisor.registry().clone();

    fixture.kill(before.instances()[1].pid);
    let report = supervisor.run_cycle();

    assert_eq!(report, CycleReport { down: 1, relaunched: 1 });
    let after = supervisor.registry();
    assert_eq!(file_names(after), file_names(&before));
    assert_eq!(after.instances()[0], before.instances()[0]);
    assert_ne!(after.instances()[1].pid, before.instances()[1].pid);
    assert_eq!(after.instances()[2], before.instances()[2]);

    // relaunched pid is live, so the next cycle is quiet
    assert_eq!(supervisor.run_cycle(), CycleReport::default());
}

#[test]
fn test_multiple_down_servers_are_relaunched() {
    let fixture = Fixture::new(&["helm.xml", "moria.xml", "rivendell.xml"]);
    let mut supervisor = fixture.supervisor();
    let before = supervisor.registry().clone();

    fixture.kill(before.instances()[0].pid);
    fixture.kill(before.instances()[2].pid);

    assert_eq!(supervisor.run_cycle(), CycleReport { down: 2, relaunched: 2 });
    assert_eq!(supervisor.registry().instances()[1], before.instances()[1]);
}

#[test]
fn test_failed_relaunch_keeps_old_entry() {
    let fixture = Fixture::new(&["helm.xml", "moria.xml", "rivendell.xml"]);
    let mut supervisor = fixture.supervisor();
    let before = supervisor.registry().clone();

    fs::remove_file(fixture.temp_dir.path().join("moria.xml")).unwrap();
    fixture.kill(before.instances()[1].pid);

    assert_eq!(supervisor.run_cycle(), CycleReport { down: 1, relaunched: 0 });
    assert_eq!(supervisor.registry(), &before);

    // restored file gets picked up on a later cycle
    fs::write(fixture.temp_dir.path().join("moria.xml"), OVERRIDE).unwrap();
    assert_eq!(supervisor.run_cycle(), CycleReport { down: 1, relaunched: 1 });
}

#[test]
fn test_broken_process_table_is_recoverable() {
    let fixture = Fixture::new(&["helm.xml"]);
    let mut supervisor = fixture.supervisor();

    fixture.os.borrow_mut().table_broken = true;
    fixture.kill(supervisor.registry().instances()[0].pid);
    assert_eq!(supervisor.run_cycle(), CycleReport::default());

    fixture.os.borrow_mut().table_broken = false;
    assert_eq!(supervisor.run_cycle(), CycleReport { down: 1, relaunched: 1 });
}

#[test]
fn test_detect_and_replace_down() {
    let fixture = Fixture::new(&["helm.xml", "moria.xml", "rivendell.xml"]);
    let registry = InstanceRegistry::new(fixture.launcher().launch_all());
    let mut monitor = fixture.monitor();

    fixture.kill(registry.instances()[1].pid);
    let down = monitor.detect_down(registry.instances()).unwrap();
    assert_eq!(down, vec![registry.instances()[1].clone()]);

    let descriptors: Vec<_> = down.iter().map(|i| Arc::clone(&i.descriptor)).collect();
    let relaunched = fixture.launcher().launch_selected(&descriptors);
    let rebuilt = replace_down(&registry, &relaunched);

    assert_eq!(rebuilt.instances()[1], relaunched[0]);
    assert_eq!(registry.instances()[1], down[0]);
}

// =============================================================================
// Working Directory Tests
// =============================================================================

#[test]
#[serial]
fn test_working_directory_follows_server_binary() {
    let original = std::env::current_dir().unwrap();
    let fixture = Fixture::new(&[]);
    let server_dir = fixture.temp_dir.path().join("bin");
    fs::create_dir_all(&server_dir).unwrap();

    let descriptor = MultiServerConfig {
        server_file_path: server_dir.join("ConquestServer.exe"),
        ..fixture.descriptor.clone()
    };
    let spawner = FakeSpawner {
        os: Rc::clone(&fixture.os),
        target: PathBuf::new(),
    };
    let launcher = LaunchCoordinator::new(&fixture.config, &descriptor, spawner);

    let changed = launcher.set_working_directory();
    let now = std::env::current_dir().unwrap();
    let unchanged_second_time = launcher.set_working_directory();
    std::env::set_current_dir(&original).unwrap();

    assert!(changed.unwrap());
    assert_eq!(now.canonicalize().unwrap(), server_dir.canonicalize().unwrap());
    assert!(!unchanged_second_time.unwrap());
}

#[test]
#[serial]
fn test_missing_server_directory_is_an_error() {
    let fixture = Fixture::new(&[]);
    let descriptor = MultiServerConfig {
        server_file_path: fixture.temp_dir.path().join("nope").join("ConquestServer.exe"),
        ..fixture.descriptor.clone()
    };
    let launcher = LaunchCoordinator::new(&fixture.config, &descriptor, FakeSpawner {
        os: Rc::clone(&fixture.os),
        target: PathBuf::new(),
    });

    assert!(launcher.set_working_directory().is_err());
}

#[test]
#[serial]
fn test_relative_server_dir_survives_directory_change() {
    let original = std::env::current_dir().unwrap();
    let fixture = Fixture::new(&[]);
    let root = fixture.temp_dir.path();
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(root.join("bin")).unwrap();
    fs::write(root.join("docs").join("helm.xml"), OVERRIDE).unwrap();

    let config = Config {
        server_dir: PathBuf::from("docs"),
        ..fixture.config.clone()
    };
    let descriptor = MultiServerConfig {
        server_file_path: PathBuf::from("bin").join("ConquestServer.exe"),
        dedicated: fixture.descriptor.dedicated[..1].to_vec(),
        ..fixture.descriptor.clone()
    };
    let spawner = FakeSpawner {
        os: Rc::clone(&fixture.os),
        target: root.join("docs").join("Dedicated.xml"),
    };

    std::env::set_current_dir(root).unwrap();
    let mut launcher = LaunchCoordinator::new(&config, &descriptor, spawner);
    let changed = launcher.set_working_directory();
    let instances = launcher.launch_all();
    std::env::set_current_dir(&original).unwrap();

    assert!(changed.unwrap());
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].file_name(), "helm.xml");
    assert!(fixture.os.borrow().spawned_configs[0].contains("Helms Deep"));
}
