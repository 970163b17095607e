mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::*;
use craftpath::core::loaders::import_profile;
use craftpath::core::platform::{Arch, OsFamily};
use craftpath::{LauncherError, LauncherSettings, Launcher, MemorySink, Platform};

const FABRIC_ID: &str = "fabric-loader-0.15.11-1.20.4";

fn launcher_for(server: &FixtureServer, base: &std::path::Path, sink: Arc<MemorySink>) -> Launcher {
    let settings = LauncherSettings {
        java_path: Some(PathBuf::from("/opt/jdk/bin/java")),
        username: "Steve".into(),
        version_list_url: server.url("/mc/game/version_manifest_v2.json"),
        resources_url: server.url("/resources"),
        fabric_maven_url: server.url("/maven"),
        ..LauncherSettings::default()
    };
    Launcher::with_client(
        base,
        settings,
        Platform::new(OsFamily::Linux, Arch::X86_64),
        reqwest::Client::new(),
        sink,
    )
    .unwrap()
}

#[tokio::test]
async fn vanilla_prepare_downloads_once_and_builds_command() {
    let server = FixtureServer::start().await;
    publish_vanilla(&server);
    let temp = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySink::new());
    let launcher = launcher_for(&server, temp.path(), sink.clone());
    let layout = launcher.layout();

    let prepared = launcher.prepare("1.20.4").await.unwrap();

    // manifest persisted verbatim
    let stored = std::fs::read_to_string(layout.version_json("1.20.4")).unwrap();
    assert!(stored.contains("\"mainClass\":\"net.minecraft.client.main.Main\""));

    let libs = layout.libraries_dir();
    assert_eq!(
        prepared.classpath,
        vec![
            libs.join(BRIGADIER_PATH),
            libs.join(LWJGL_PATH),
            libs.join(LWJGL_LINUX_PATH),
            layout.version_jar("1.20.4"),
        ]
    );
    assert!(prepared.natives_dir.join("liblwjgl.so").is_file());
    assert!(!prepared.natives_dir.join("META-INF").exists());

    let tokens = prepared.command.tokens();
    let main_at = tokens
        .iter()
        .position(|t| t == "net.minecraft.client.main.Main")
        .unwrap();
    assert_eq!(tokens[main_at - 2], "-cp");
    assert_eq!(
        &tokens[main_at + 1..main_at + 5],
        ["--username", "Steve", "--version", "1.20.4"]
    );
    // vanilla manifest arguments are not repeated after the fixed game args
    assert_eq!(tokens.iter().filter(|t| *t == "--username").count(), 1);
    let uuid_at = tokens.iter().position(|t| t == "--uuid").unwrap();
    assert_eq!(tokens[uuid_at + 1].len(), 32);

    let after_first = server.total_hits();
    launcher.prepare("1.20.4").await.unwrap();
    assert_eq!(server.total_hits(), after_first);
}

#[tokio::test]
async fn loader_version_layers_over_installed_base() {
    let server = FixtureServer::start().await;
    publish_vanilla(&server);
    let profile = publish_fabric(&server);
    let temp = tempfile::tempdir().unwrap();
    let sink = Arc::new(MemorySink::new());
    let launcher = launcher_for(&server, temp.path(), sink.clone());
    let layout = launcher.layout();

    launcher.install_version("1.20.4").await.unwrap();

    let profile_path = temp.path().join("fabric-profile.json");
    std::fs::write(&profile_path, profile).unwrap();
    import_profile(layout, &profile_path).await.unwrap();

    let prepared = launcher.prepare(FABRIC_ID).await.unwrap();
    assert_eq!(prepared.base_version.as_deref(), Some("1.20.4"));
    assert_eq!(prepared.main_class, "net.fabricmc.loader.impl.launch.knot.KnotClient");
    assert_eq!(prepared.asset_index, "12");
    assert_eq!(prepared.natives_dir, layout.natives_dir("1.20.4"));

    let libs = layout.libraries_dir();
    assert_eq!(
        prepared.classpath,
        vec![
            libs.join(BRIGADIER_PATH),
            libs.join(LWJGL_PATH),
            libs.join(LWJGL_LINUX_PATH),
            libs.join("net/fabricmc/intermediary/1.20.4/intermediary-1.20.4.jar"),
            libs.join("net/fabricmc/fabric-loader/0.15.11/fabric-loader-0.15.11.jar"),
            layout.version_jar("1.20.4"),
        ]
    );
    assert_eq!(
        server.hits("/maven/net/fabricmc/fabric-loader/0.15.11/fabric-loader-0.15.11.jar"),
        1
    );

    let tokens = prepared.command.tokens();
    let emu_at = tokens
        .iter()
        .position(|t| t == "-DFabricMcEmu= net.minecraft.client.main.Main ")
        .unwrap();
    let natives_at = tokens
        .iter()
        .position(|t| t.starts_with("-Djava.library.path="))
        .unwrap();
    assert!(emu_at < natives_at);
    assert_eq!(tokens[natives_at + 1], "-cp");
}

#[tokio::test]
async fn loader_without_base_fails_without_fetching() {
    let server = FixtureServer::start().await;
    publish_vanilla(&server);
    let profile = publish_fabric(&server);
    let temp = tempfile::tempdir().unwrap();
    let launcher = launcher_for(&server, temp.path(), Arc::new(MemorySink::new()));

    let profile_path = temp.path().join("fabric-profile.json");
    std::fs::write(&profile_path, profile).unwrap();
    import_profile(launcher.layout(), &profile_path).await.unwrap();

    let err = launcher.prepare(FABRIC_ID).await.unwrap_err();
    assert!(matches!(err, LauncherError::MissingManifest { ref version, .. } if version == "1.20.4"));
    assert_eq!(server.total_hits(), 0);
}

#[tokio::test]
async fn unknown_version_is_reported() {
    let server = FixtureServer::start().await;
    publish_vanilla(&server);
    let temp = tempfile::tempdir().unwrap();
    let launcher = launcher_for(&server, temp.path(), Arc::new(MemorySink::new()));

    let err = launcher.install_version("9.9.9").await.unwrap_err();
    assert!(matches!(err, LauncherError::VersionNotFound(_)));
}
