#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tempfile::TempDir;
use tribler_dmg_bundler::bundler::{
    BundleSettings, CommandOutput, CommandRunner, Result, Settings, SettingsBuilder, ToolCommand,
};

pub const IDENTITY: &str = "Developer ID Application: Tribler (TEST123456)";

/// A failure injected for matching invocations.
#[derive(Debug, Clone)]
struct FailureRule {
    program: String,
    arg: Option<String>,
    code: i32,
    stderr: String,
}

impl FailureRule {
    fn matches(&self, command: &ToolCommand) -> bool {
        command.program_name() == self.program
            && self
                .arg
                .as_ref()
                .is_none_or(|arg| command.arguments().iter().any(|a| a == arg))
    }
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<ToolCommand>,
    failures: Vec<FailureRule>,
    notary_status: Option<String>,
}

/// Records every invocation and imitates the side effects the pipeline
/// relies on (PyInstaller output, image files, notarytool JSON).
#[derive(Debug, Clone)]
pub struct FakeRunner {
    app_name: String,
    state: Arc<Mutex<State>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            app_name: "Tribler.app".into(),
            state: Arc::default(),
        }
    }

    /// Make every invocation of `program` fail.
    pub fn fail(self, program: &str, stderr: &str) -> Self {
        self.push_failure(program, None, stderr)
    }

    /// Make invocations of `program` that carry `arg` fail.
    pub fn fail_with_arg(self, program: &str, arg: &str, stderr: &str) -> Self {
        self.push_failure(program, Some(arg), stderr)
    }

    fn push_failure(self, program: &str, arg: Option<&str>, stderr: &str) -> Self {
        self.state.lock().unwrap().failures.push(FailureRule {
            program: program.into(),
            arg: arg.map(String::from),
            code: 1,
            stderr: stderr.into(),
        });
        self
    }

    /// Status notarytool reports. Defaults to `Accepted`.
    pub fn notary_status(self, status: &str) -> Self {
        self.state.lock().unwrap().notary_status = Some(status.into());
        self
    }

    pub fn calls(&self) -> Vec<ToolCommand> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Rendered command lines, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    pub fn invoked(&self, program: &str) -> bool {
        self.calls().iter().any(|c| c.program_name() == program)
    }

    /// Index of the first call of `program` whose arguments include `arg`.
    pub fn position(&self, program: &str, arg: &str) -> Option<usize> {
        self.calls().iter().position(|c| {
            c.program_name() == program && c.arguments().iter().any(|a| a == arg)
        })
    }

    fn simulate(&self, command: &ToolCommand) -> std::io::Result<CommandOutput> {
        let args = command.arguments();
        let value_after = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .map(PathBuf::from)
        };

        match (command.program_name(), args.first().map(String::as_str)) {
            ("python", Some("-m")) if args.get(1).map(String::as_str) == Some("PyInstaller") => {
                if let Some(dist) = value_after("--distpath") {
                    let macos = dist.join(&self.app_name).join("Contents").join("MacOS");
                    std::fs::create_dir_all(&macos)?;
                    std::fs::write(macos.join("tribler"), b"#!/bin/sh\n")?;
                }
                Ok(CommandOutput::ok(""))
            }
            ("hdiutil", Some("create")) => {
                if let Some(image) = args.last() {
                    std::fs::write(image, b"UDRW")?;
                }
                Ok(CommandOutput::ok(""))
            }
            ("hdiutil", Some("convert")) => {
                if let Some(image) = value_after("-o") {
                    std::fs::write(image, b"UDZO")?;
                }
                Ok(CommandOutput::ok(""))
            }
            ("xcrun", Some("notarytool")) => {
                let status = self
                    .state
                    .lock()
                    .unwrap()
                    .notary_status
                    .clone()
                    .unwrap_or_else(|| "Accepted".into());
                Ok(CommandOutput::ok(format!(
                    "Conducting pre-submission checks for Tribler.dmg and initiating connection to the Apple notary service...\n\
                     {{\"id\":\"6a1b2c3d-0000-4000-8000-000000000001\",\"status\":\"{status}\",\"message\":\"Processing complete\"}}\n"
                )))
            }
            _ => Ok(CommandOutput::ok("")),
        }
    }
}

impl CommandRunner for FakeRunner {
    async fn run(&self, command: &ToolCommand) -> Result<CommandOutput> {
        let failure = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(command.clone());
            state.failures.iter().find(|r| r.matches(command)).cloned()
        };

        if let Some(rule) = failure {
            return Ok(CommandOutput::failed(rule.code, rule.stderr));
        }

        Ok(self.simulate(command)?)
    }
}

/// A minimal Tribler source tree.
pub fn source_tree() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();

    let resources = root.join("build/mac/resources");
    std::fs::create_dir_all(&resources).unwrap();
    std::fs::write(resources.join("background.png"), b"\x89PNG").unwrap();
    std::fs::write(resources.join("tribler.icns"), b"icns").unwrap();
    std::fs::write(root.join("tribler.spec"), b"# PyInstaller spec\n").unwrap();
    std::fs::write(
        root.join("requirements-build.txt"),
        "PyInstaller==6.3.0\nsetuptools==69.0.3 ; sys_platform == 'darwin'\n",
    )
    .unwrap();

    tmp
}

pub fn write_version_marker(root: &Path, version: &str) {
    std::fs::write(root.join(".TriblerVersion"), version).unwrap();
}

fn bundle_settings() -> BundleSettings {
    let mut bundle = BundleSettings::default();
    bundle.dmg.settle_delay_ms = 0;
    bundle
}

pub fn unsigned_settings(root: &Path) -> Settings {
    SettingsBuilder::new()
        .root(root)
        .bundle_settings(bundle_settings())
        .build()
        .unwrap()
}

pub fn signed_settings(root: &Path) -> Settings {
    SettingsBuilder::new()
        .root(root)
        .bundle_settings(bundle_settings())
        .code_sign_enabled(Some("1".into()))
        .apple_dev_id(Some(IDENTITY.into()))
        .build()
        .unwrap()
}

/// Every `.dmg` file below `dir`.
pub fn dmg_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "dmg"))
        .collect()
}
