mod common;

use common::{FakeRunner, dmg_files, signed_settings, source_tree, unsigned_settings, write_version_marker};
use tribler_dmg_bundler::bundler::{
    Error, Pipeline, Step,
    builder::{Outcome, Tier},
};

const SIGNING_TOOLS: [&str; 3] = ["codesign", "spctl", "xcrun"];

#[tokio::test]
async fn test_unsigned_run_produces_single_compressed_image() {
    let tree = source_tree();
    let runner = FakeRunner::new();
    let mut pipeline = Pipeline::new(unsigned_settings(tree.path()), runner.clone());

    let image = pipeline.run().await.unwrap();

    let dist = tree.path().join("dist");
    assert_eq!(image, dist.join("Tribler.dmg"));
    assert_eq!(dmg_files(&dist), vec![image.clone()]);
    assert_eq!(std::fs::read(&image).unwrap(), b"UDZO");

    for tool in SIGNING_TOOLS {
        assert!(!runner.invoked(tool), "{tool} must not run without signing");
    }

    let report = pipeline.report();
    assert_eq!(report.artifact.as_deref(), Some(image.as_path()));
    assert_eq!(report.sha256.as_ref().map(String::len), Some(64));
    assert!(report.finished_at.is_some());
    for step in Step::ALL.into_iter().filter(|s| s.requires_signing()) {
        assert_eq!(
            report.outcome_of(step),
            Some(&Outcome::Skipped("code signing disabled".into()))
        );
    }
}

#[tokio::test]
async fn test_long_running_tools_stream_and_short_ones_capture() {
    let tree = source_tree();
    let runner = FakeRunner::new();
    Pipeline::new(signed_settings(tree.path()), runner.clone())
        .run()
        .await
        .unwrap();

    for call in runner.calls() {
        let streamed = match call.program_name() {
            name if name.starts_with("python") => true,
            "hdiutil" => ["create", "attach", "convert"].contains(&call.arguments()[0].as_str()),
            _ => false,
        };
        assert_eq!(!call.is_captured(), streamed, "{call}");
    }
}

#[tokio::test]
async fn test_staging_directory_layout() {
    let tree = source_tree();
    let mut pipeline = Pipeline::new(unsigned_settings(tree.path()), FakeRunner::new());
    pipeline.run().await.unwrap();

    let staging = tree.path().join("dist/installdir");
    assert!(staging.join("Tribler.app/Contents/MacOS/tribler").is_file());
    assert!(staging.join(".background/background.png").is_file());
    assert!(staging.join(".VolumeIcon.icns").is_file());
    assert_eq!(
        std::fs::read_link(staging.join("Applications")).unwrap(),
        std::path::Path::new("/Applications")
    );
    assert!(!tree.path().join("dist/Tribler.app").exists());
}

#[tokio::test]
async fn test_image_commands_follow_state_sequence() {
    let tree = source_tree();
    let runner = FakeRunner::new();
    let mut pipeline = Pipeline::new(unsigned_settings(tree.path()), runner.clone());
    pipeline.run().await.unwrap();

    let root = tree.path().display().to_string();
    let lines = runner.command_lines();
    let find = |prefix: &str| {
        lines
            .iter()
            .position(|l| l.starts_with(prefix))
            .unwrap_or_else(|| panic!("no command starting with {prefix}: {lines:#?}"))
    };

    let venv = find("python3 -m venv");
    let pyinstaller = find(&format!("{root}/venv/bin/python -m PyInstaller"));
    let create = find("hdiutil create -fs HFS+ -srcfolder");
    let attach = find("hdiutil attach");
    let bless = find("bless --folder");
    let setfile = find("SetFile -a C");
    let detach = find("hdiutil detach");
    let convert = find("hdiutil convert");

    assert!(venv < pyinstaller);
    assert!(pyinstaller < create);
    assert!(create < attach && attach < bless && bless < setfile);
    assert!(setfile < detach && detach < convert);

    assert!(lines[pyinstaller].contains("--noconfirm --log-level=DEBUG"));
    assert!(lines[create].contains("-format UDRW -volname Tribler -ov"));
    assert!(lines[create].ends_with("dist/temp/Tribler-rw.dmg"));
    assert!(lines[attach].contains("-readwrite -noverify -noautoopen -mountpoint"));
    assert!(lines[convert].contains("-format UDZO -imagekey zlib-level=9 -ov -o"));

    let osascripts = runner
        .calls()
        .iter()
        .filter(|c| c.program_name() == "osascript")
        .count();
    assert_eq!(osascripts, 2);
    assert!(!tree.path().join("dist/temp/Tribler-rw.dmg").exists());
}

#[tokio::test]
async fn test_version_marker_names_image() {
    let tree = source_tree();
    write_version_marker(tree.path(), "8.0.7\n");

    let mut pipeline = Pipeline::new(unsigned_settings(tree.path()), FakeRunner::new());
    let image = pipeline.run().await.unwrap();

    let dist = tree.path().join("dist");
    assert_eq!(image, dist.join("Tribler-8.0.7.dmg"));
    assert_eq!(dmg_files(&dist), vec![image]);
    assert_eq!(
        pipeline.report().outcome_of(Step::RenameImage),
        Some(&Outcome::Succeeded)
    );
}

#[tokio::test]
async fn test_empty_version_marker_keeps_default_name() {
    let tree = source_tree();
    write_version_marker(tree.path(), "  \n");

    let mut pipeline = Pipeline::new(unsigned_settings(tree.path()), FakeRunner::new());
    let image = pipeline.run().await.unwrap();

    assert_eq!(image, tree.path().join("dist/Tribler.dmg"));
    assert!(matches!(
        pipeline.report().outcome_of(Step::RenameImage),
        Some(Outcome::Skipped(_))
    ));
}

#[tokio::test]
async fn test_signed_run_signs_before_submission_and_staples_after() {
    let tree = source_tree();
    write_version_marker(tree.path(), "8.0.7");
    let runner = FakeRunner::new();
    let mut pipeline = Pipeline::new(signed_settings(tree.path()), runner.clone());

    let image = pipeline.run().await.unwrap();
    assert_eq!(image, tree.path().join("dist/Tribler-8.0.7.dmg"));

    let image_arg = image.display().to_string();
    let sign_bundle = runner.position("codesign", "--deep").unwrap();
    let create = runner.position("hdiutil", "create").unwrap();
    let sign_image = runner
        .calls()
        .iter()
        .position(|c| {
            c.program_name() == "codesign"
                && c.arguments().iter().any(|a| a == "--sign")
                && c.arguments().last() == Some(&image_arg)
        })
        .unwrap();
    let verify = runner.position("codesign", "--verify").unwrap();
    let gatekeeper = runner.position("spctl", "--assess").unwrap();
    let notarize = runner.position("xcrun", "notarytool").unwrap();
    let staple = runner.position("xcrun", "stapler").unwrap();

    assert!(sign_bundle < create, "the bundle is signed before it goes into the image");
    assert!(sign_image < verify && verify < gatekeeper);
    assert!(gatekeeper < notarize && notarize < staple);

    let lines = runner.command_lines();
    assert!(lines[sign_bundle].contains("--options runtime"));
    assert!(lines[sign_bundle].ends_with("dist/installdir/Tribler.app"));
    assert!(lines[notarize].contains("--keychain-profile tribler-codesign-profile --wait --output-format json"));
    assert!(lines.iter().any(|l| l.starts_with("codesign --verify --verbose=4")));

    let report = pipeline.report();
    let notarization = report.notarization.as_ref().unwrap();
    assert_eq!(notarization.status, "Accepted");
    assert!(report.steps.iter().all(|r| r.outcome == Outcome::Succeeded));
}

#[tokio::test]
async fn test_bundle_build_failure_halts_run() {
    let tree = source_tree();
    let runner = FakeRunner::new().fail_with_arg("python", "PyInstaller", "ModuleNotFoundError: No module named 'tribler'");
    let mut pipeline = Pipeline::new(unsigned_settings(tree.path()), runner.clone());

    let err = pipeline.run().await.unwrap_err();
    assert!(err.to_string().contains("freezing application"));

    assert!(!runner.invoked("hdiutil"));
    assert!(dmg_files(tree.path()).is_empty());

    let report = pipeline.report();
    assert!(matches!(
        report.outcome_of(Step::BuildBundle),
        Some(Outcome::Failed(message)) if message.contains("ModuleNotFoundError")
    ));
    for step in [Step::StageInstaller, Step::CreateImage, Step::Checksum] {
        assert!(matches!(report.outcome_of(step), Some(Outcome::Skipped(reason)) if reason.starts_with("not reached")));
    }
    assert!(report.artifact.is_none());
}

#[tokio::test]
async fn test_missing_app_bundle_is_fatal() {
    let tree = source_tree();
    let mut settings_bundle = tribler_dmg_bundler::bundler::BundleSettings::default();
    settings_bundle.package.product_name = "Other".into();
    settings_bundle.dmg.settle_delay_ms = 0;
    let settings = tribler_dmg_bundler::bundler::SettingsBuilder::new()
        .root(tree.path())
        .bundle_settings(settings_bundle)
        .build()
        .unwrap();

    // The fake freezer produces Tribler.app, not Other.app
    let runner = FakeRunner::new();
    let err = Pipeline::new(settings, runner.clone()).run().await.unwrap_err();
    assert!(err.to_string().contains("was not produced"));
    assert!(!runner.invoked("hdiutil"));
}

#[tokio::test]
async fn test_layout_and_detach_failures_do_not_halt_run() {
    let tree = source_tree();
    let runner = FakeRunner::new()
        .fail("osascript", "execution error: Finder got an error: Can’t get disk \"Tribler\". (-1728)")
        .fail("SetFile", "SetFile: command not found")
        .fail_with_arg("hdiutil", "detach", "hdiutil: couldn't unmount \"disk4\" - Resource busy");
    let mut pipeline = Pipeline::new(unsigned_settings(tree.path()), runner.clone());

    let image = pipeline.run().await.unwrap();
    assert!(image.is_file());

    // Plain detach, then forced
    let detaches: Vec<_> = runner
        .command_lines()
        .into_iter()
        .filter(|l| l.starts_with("hdiutil detach"))
        .collect();
    assert_eq!(detaches.len(), 2);
    assert!(detaches[1].ends_with("-force"));

    let report = pipeline.report();
    let failed: Vec<_> = report.advisory_failures().map(|r| r.step).collect();
    assert_eq!(failed, vec![Step::ApplyLayout, Step::DetachImage]);
    assert!(matches!(
        report.outcome_of(Step::ApplyLayout),
        Some(Outcome::Failed(message)) if message.contains("3 of 4 layout actions failed")
    ));
    assert_eq!(report.outcome_of(Step::ConvertImage), Some(&Outcome::Succeeded));
}

#[tokio::test]
async fn test_image_creation_failure_is_fatal() {
    let tree = source_tree();
    let runner = FakeRunner::new().fail("hdiutil", "hdiutil: create failed - Operation not permitted");
    let err = Pipeline::new(unsigned_settings(tree.path()), runner)
        .run()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("creating writable disk image"));
}

#[tokio::test]
async fn test_mount_failure_is_fatal_and_skips_layout() {
    let tree = source_tree();
    let runner = FakeRunner::new().fail_with_arg("hdiutil", "attach", "hdiutil: attach failed - no mountable file systems");
    let mut pipeline = Pipeline::new(unsigned_settings(tree.path()), runner.clone());

    let err = pipeline.run().await.unwrap_err();
    assert!(err.to_string().contains("mounting writable disk image"));

    assert!(runner.position("hdiutil", "attach").is_some());
    assert!(!runner.invoked("bless"));
    assert!(!runner.invoked("osascript"));
    assert!(runner.position("hdiutil", "detach").is_none());
    assert!(runner.position("hdiutil", "convert").is_none());

    let report = pipeline.report();
    assert!(report.outcome_of(Step::MountImage).is_some_and(Outcome::is_failed));
    for step in [Step::ApplyLayout, Step::DetachImage, Step::ConvertImage] {
        assert!(matches!(report.outcome_of(step), Some(Outcome::Skipped(reason)) if reason.starts_with("not reached")));
    }
    assert!(report.artifact.is_none());
}

#[tokio::test]
async fn test_two_sequential_runs_both_produce_image() {
    let tree = source_tree();
    write_version_marker(tree.path(), "8.0.7");

    for _ in 0..2 {
        let mut pipeline = Pipeline::new(unsigned_settings(tree.path()), FakeRunner::new());
        let image = pipeline.run().await.unwrap();
        assert!(image.is_file());
        assert_eq!(dmg_files(&tree.path().join("dist")), vec![image]);
    }
}

#[tokio::test]
async fn test_gatekeeper_rejection_is_advisory() {
    let tree = source_tree();
    let runner = FakeRunner::new().fail("spctl", "Tribler.dmg: rejected\nsource=Unnotarized Developer ID");
    let mut pipeline = Pipeline::new(signed_settings(tree.path()), runner.clone());

    pipeline.run().await.unwrap();

    assert!(runner.position("xcrun", "stapler").is_some());
    let report = pipeline.report();
    let record = report
        .steps
        .iter()
        .find(|r| r.step == Step::AssessGatekeeper)
        .unwrap();
    assert_eq!(record.tier, Tier::Advisory);
    assert!(record.outcome.is_failed());
}

#[tokio::test]
async fn test_notarization_rejection_is_fatal_and_skips_staple() {
    let tree = source_tree();
    let runner = FakeRunner::new().notary_status("Invalid");
    let mut pipeline = Pipeline::new(signed_settings(tree.path()), runner.clone());

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::NotarizationRejected { ref status, .. } if status == "Invalid"));
    assert!(runner.position("xcrun", "stapler").is_none());

    let report = pipeline.report();
    assert_eq!(report.notarization.as_ref().map(|n| n.status.as_str()), Some("Invalid"));
    assert!(matches!(report.outcome_of(Step::Staple), Some(Outcome::Skipped(_))));
    assert!(report.sha256.is_none());
}

#[tokio::test]
async fn test_notarytool_failure_is_fatal_and_skips_staple() {
    let tree = source_tree();
    let runner = FakeRunner::new().fail_with_arg("xcrun", "notarytool", "Error: HTTP status code: 401. Unable to authenticate.");
    let mut pipeline = Pipeline::new(signed_settings(tree.path()), runner.clone());

    let err = pipeline.run().await.unwrap_err();
    assert!(err.to_string().contains("submitting disk image for notarization"));
    assert!(runner.position("xcrun", "notarytool").is_some());
    assert!(runner.position("xcrun", "stapler").is_none());

    let report = pipeline.report();
    assert!(report.outcome_of(Step::Notarize).is_some_and(Outcome::is_failed));
    assert!(report.notarization.is_none());
    assert!(matches!(report.outcome_of(Step::Staple), Some(Outcome::Skipped(_))));
    assert!(report.sha256.is_none());
}

#[tokio::test]
async fn test_report_serializes_after_failed_run() {
    let tree = source_tree();
    let runner = FakeRunner::new().fail_with_arg("hdiutil", "convert", "hdiutil: convert failed - No space left on device");
    let mut pipeline = Pipeline::new(unsigned_settings(tree.path()), runner);

    assert!(pipeline.run().await.is_err());

    let json: serde_json::Value =
        serde_json::from_str(&pipeline.report().to_json().unwrap()).unwrap();
    assert_eq!(json["product_name"], "Tribler");
    assert_eq!(json["steps"].as_array().unwrap().len(), Step::ALL.len());
    assert!(json["finished_at"].is_string());
}
