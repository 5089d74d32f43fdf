mod common;

use std::time::Duration;

use nodedev::{
    DevError, DevResult, ErrorKind, InstallRequest, InstallStatus, Installer, TargetPlatform,
    VersionProbe, INSTALL_FORMAT_VERSION,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{
    mount_bytes, mount_status, mount_tarball, node_tarball, raw_tarball, unix_config,
    write_legacy_dir,
};

fn request(version: &str) -> InstallRequest {
    InstallRequest {
        version: Some(version.to_string()),
        ..Default::default()
    }
}

fn ensure_request(version: &str) -> InstallRequest {
    InstallRequest {
        version: Some(version.to_string()),
        ensure: true,
        proxy: None,
    }
}

struct FixedProbe(&'static str);

impl VersionProbe for FixedProbe {
    fn runtime_version(&self) -> DevResult<String> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn installs_headers_and_writes_record() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_tarball(
        &server,
        "6.1.0",
        node_tarball(
            "6.1.0",
            &[
                ("src/node.h", b"#define NODE_H\n"),
                ("common.gypi", b"{}\n"),
                ("lib/fs.js", b"module.exports = {};\n"),
            ],
        ),
    )
    .await;

    let installer = Installer::new(unix_config(tmp.path(), &server)).without_env_proxy();
    let outcome = installer.install(&request("v6.1.0")).await.unwrap();

    assert_eq!(outcome.version, "6.1.0");
    assert_eq!(outcome.status, InstallStatus::Installed);

    let root = tmp.path().join("6.1.0");
    assert!(root.join("src/node.h").is_file());
    assert!(root.join("common.gypi").is_file());
    assert!(!root.join("lib/fs.js").exists());
    assert_eq!(
        std::fs::read_to_string(root.join("installVersion")).unwrap(),
        format!("{INSTALL_FORMAT_VERSION}\n")
    );
}

#[tokio::test]
async fn non_legacy_install_keeps_gyp_tree_but_not_its_tests() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_tarball(
        &server,
        "0.10.2",
        node_tarball(
            "0.10.2",
            &[
                ("src/node.h", b"h"),
                ("tools/gyp_addon", b"addon"),
                ("tools/gyp/gyp_main.py", b"main"),
                ("tools/gyp/.gitignore", b"*.pyc"),
                ("tools/gyp/test/lib/TestGyp.py", b"test"),
                ("tools/install.py", b"install"),
            ],
        ),
    )
    .await;

    let installer = Installer::new(unix_config(tmp.path(), &server)).without_env_proxy();
    installer.install(&request("0.10.2")).await.unwrap();

    let root = tmp.path().join("0.10.2");
    assert!(root.join("src/node.h").is_file());
    assert!(root.join("tools/gyp_addon").is_file());
    assert!(root.join("tools/gyp/gyp_main.py").is_file());
    assert!(!root.join("tools/gyp/test/lib/TestGyp.py").exists());
    assert!(!root.join("tools/gyp/.gitignore").exists());
    assert!(!root.join("tools/install.py").exists());
}

#[tokio::test]
async fn legacy_install_takes_headers_only_and_copies_bundled_files() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    let legacy = tempfile::tempdir().unwrap();
    write_legacy_dir(legacy.path());
    mount_tarball(
        &server,
        "0.6.21",
        node_tarball(
            "0.6.21",
            &[
                ("src/node.h", b"h"),
                ("common.gypi", b"from tarball"),
                ("tools/gyp/gyp_main.py", b"main"),
            ],
        ),
    )
    .await;

    let config = unix_config(tmp.path(), &server).with_legacy_dir(legacy.path());
    let installer = Installer::new(config).without_env_proxy();
    installer.install(&request("0.6.21")).await.unwrap();

    let root = tmp.path().join("0.6.21");
    assert!(root.join("src/node.h").is_file());
    assert!(!root.join("tools/gyp/gyp_main.py").exists());
    assert_eq!(
        std::fs::read_to_string(root.join("common.gypi")).unwrap(),
        "{ 'variables': {} }\n"
    );
    assert!(root.join("tools/gyp_addon").is_file());
    assert!(root.join("installVersion").is_file());
}

#[tokio::test]
async fn archive_without_matches_fails_and_rolls_back() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_tarball(
        &server,
        "6.1.0",
        node_tarball("6.1.0", &[("lib/fs.js", b"js"), ("README.md", b"readme")]),
    )
    .await;

    let installer = Installer::new(unix_config(tmp.path(), &server)).without_env_proxy();
    let err = installer.install(&request("6.1.0")).await.unwrap_err();

    assert!(matches!(err, DevError::ExtractionFailed));
    assert!(!tmp.path().join("6.1.0").exists());
}

#[tokio::test]
async fn missing_tarball_reports_status_and_rolls_back() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_status(&server, "/v6.1.0/node-v6.1.0.tar.gz", 404).await;

    let installer = Installer::new(unix_config(tmp.path(), &server)).without_env_proxy();
    let err = installer.install(&request("6.1.0")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Download);
    assert!(err.to_string().starts_with("404 status code downloading"));
    assert!(!tmp.path().join("6.1.0").exists());
}

#[tokio::test]
async fn windows_install_fetches_both_import_libraries() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_tarball(&server, "6.1.0", node_tarball("6.1.0", &[("src/node.h", b"h")])).await;
    mount_bytes(&server, "/v6.1.0/node.lib", b"ia32 lib").await;
    mount_bytes(&server, "/v6.1.0/x64/node.lib", b"x64 lib").await;

    let config = unix_config(tmp.path(), &server).with_platform(TargetPlatform::Windows);
    let installer = Installer::new(config).without_env_proxy();
    installer.install(&request("6.1.0")).await.unwrap();

    let root = tmp.path().join("6.1.0");
    assert_eq!(std::fs::read(root.join("ia32/node.lib")).unwrap(), b"ia32 lib");
    assert_eq!(std::fs::read(root.join("x64/node.lib")).unwrap(), b"x64 lib");
    assert!(root.join("installVersion").is_file());
}

#[tokio::test]
async fn one_missing_import_library_rolls_back_everything() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_tarball(&server, "6.1.0", node_tarball("6.1.0", &[("src/node.h", b"h")])).await;
    mount_bytes(&server, "/v6.1.0/node.lib", b"ia32 lib").await;
    mount_status(&server, "/v6.1.0/x64/node.lib", 404).await;

    let config = unix_config(tmp.path(), &server).with_platform(TargetPlatform::Windows);
    let installer = Installer::new(config).without_env_proxy();
    let err = installer.install(&request("6.1.0")).await.unwrap_err();

    assert!(matches!(err, DevError::DownloadFailed { .. }));
    assert!(!tmp.path().join("6.1.0").exists());
}

#[tokio::test]
async fn ensure_skips_download_when_record_is_current() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/v6.1.0/node-v6.1.0.tar.gz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(node_tarball("6.1.0", &[("src/node.h", b"h")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let installer = Installer::new(unix_config(tmp.path(), &server)).without_env_proxy();
    let first = installer.install(&ensure_request("6.1.0")).await.unwrap();
    let second = installer.install(&ensure_request("6.1.0")).await.unwrap();

    assert_eq!(first.status, InstallStatus::Installed);
    assert_eq!(second.status, InstallStatus::AlreadyInstalled);
    assert_eq!(second.version, "6.1.0");
}

#[tokio::test]
async fn ensure_reinstalls_when_format_version_is_raised() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/v6.1.0/node-v6.1.0.tar.gz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(node_tarball("6.1.0", &[("src/node.h", b"h")])),
        )
        .expect(2)
        .mount(&server)
        .await;

    let old = Installer::new(unix_config(tmp.path(), &server).with_install_format_version(9))
        .without_env_proxy();
    old.install(&ensure_request("6.1.0")).await.unwrap();

    let new = Installer::new(unix_config(tmp.path(), &server).with_install_format_version(10))
        .without_env_proxy();
    let outcome = new.install(&ensure_request("6.1.0")).await.unwrap();

    assert_eq!(outcome.status, InstallStatus::Installed);
    assert_eq!(
        std::fs::read_to_string(tmp.path().join("6.1.0/installVersion")).unwrap(),
        "10\n"
    );
}

#[tokio::test]
async fn ensure_with_directory_but_no_record_reinstalls() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("6.1.0/src")).unwrap();
    mount_tarball(&server, "6.1.0", node_tarball("6.1.0", &[("src/node.h", b"h")])).await;

    let installer = Installer::new(unix_config(tmp.path(), &server)).without_env_proxy();
    let outcome = installer.install(&ensure_request("6.1.0")).await.unwrap();

    assert_eq!(outcome.status, InstallStatus::Installed);
    assert!(tmp.path().join("6.1.0/src/node.h").is_file());
}

#[tokio::test]
async fn pre_release_installs_the_previous_patch() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_tarball(&server, "0.8.13", node_tarball("0.8.13", &[("src/node.h", b"h")])).await;

    let installer = Installer::new(unix_config(tmp.path(), &server)).without_env_proxy();
    let outcome = installer.install(&request("0.8.14-pre")).await.unwrap();

    assert_eq!(outcome.version, "0.8.13");
    assert!(tmp.path().join("0.8.13/src/node.h").is_file());
}

#[tokio::test]
async fn running_runtime_version_is_used_when_none_is_given() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_tarball(&server, "6.1.0", node_tarball("6.1.0", &[("src/node.h", b"h")])).await;

    let installer = Installer::new(unix_config(tmp.path(), &server))
        .with_probe(FixedProbe("v6.1.0"))
        .without_env_proxy();
    let outcome = installer.install(&InstallRequest::default()).await.unwrap();

    assert_eq!(outcome.version, "6.1.0");
}

#[tokio::test]
async fn configured_target_beats_the_runtime_probe() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_tarball(&server, "0.10.2", node_tarball("0.10.2", &[("src/node.h", b"h")])).await;

    let config = unix_config(tmp.path(), &server).with_target(Some("0.10.2".into()));
    let installer = Installer::new(config)
        .with_probe(FixedProbe("v6.1.0"))
        .without_env_proxy();
    let outcome = installer.install(&InstallRequest::default()).await.unwrap();

    assert_eq!(outcome.version, "0.10.2");
    assert!(!tmp.path().join("6.1.0").exists());
}

#[tokio::test]
async fn mirror_that_never_answers_is_a_stall_and_rolls_back() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/v6.1.0/node-v6.1.0.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let config = unix_config(tmp.path(), &server).with_idle_timeout(Duration::from_millis(300));
    let installer = Installer::new(config).without_env_proxy();
    let err = tokio::time::timeout(Duration::from_secs(5), installer.install(&request("6.1.0")))
        .await
        .expect("install must give up on its own")
        .unwrap_err();

    assert!(matches!(err, DevError::DownloadStalled { .. }));
    assert_eq!(err.kind(), ErrorKind::Download);
    assert!(!tmp.path().join("6.1.0").exists());
}

#[tokio::test]
async fn stalled_import_library_rolls_back_windows_install() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_tarball(&server, "6.1.0", node_tarball("6.1.0", &[("src/node.h", b"h")])).await;
    mount_bytes(&server, "/v6.1.0/node.lib", b"ia32 lib").await;
    Mock::given(method("GET"))
        .and(path("/v6.1.0/x64/node.lib"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let config = unix_config(tmp.path(), &server)
        .with_platform(TargetPlatform::Windows)
        .with_idle_timeout(Duration::from_millis(300));
    let installer = Installer::new(config).without_env_proxy();
    let err = tokio::time::timeout(Duration::from_secs(5), installer.install(&request("6.1.0")))
        .await
        .expect("install must give up on its own")
        .unwrap_err();

    assert!(matches!(err, DevError::DownloadStalled { .. }));
    assert!(!tmp.path().join("6.1.0").exists());
}

#[tokio::test]
async fn entry_escaping_the_install_dir_rolls_back() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    let dev_dir = tmp.path().join("dev");
    mount_tarball(
        &server,
        "6.1.0",
        raw_tarball(&[
            ("node-v6.1.0/src/node.h", b"h"),
            ("node-v6.1.0/../escape.h", b"escaped"),
        ]),
    )
    .await;

    let installer = Installer::new(unix_config(&dev_dir, &server)).without_env_proxy();
    let err = installer.install(&request("6.1.0")).await.unwrap_err();

    assert!(matches!(err, DevError::UnsafeEntryPath(_)));
    assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
    assert!(!dev_dir.join("6.1.0").exists());
    assert!(!dev_dir.join("escape.h").exists());
    assert!(!tmp.path().join("escape.h").exists());
}

#[tokio::test]
async fn corrupt_tarball_rolls_back() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_bytes(&server, "/v6.1.0/node-v6.1.0.tar.gz", b"<html>mirror error page</html>").await;

    let installer = Installer::new(unix_config(tmp.path(), &server)).without_env_proxy();
    let err = installer.install(&request("6.1.0")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
    assert!(!tmp.path().join("6.1.0").exists());
}

#[tokio::test]
async fn legacy_install_uses_bundled_files_by_default() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();
    mount_tarball(&server, "0.6.21", node_tarball("0.6.21", &[("src/node.h", b"h")])).await;

    let installer = Installer::new(unix_config(tmp.path(), &server)).without_env_proxy();
    installer.install(&request("0.6.21")).await.unwrap();

    let root = tmp.path().join("0.6.21");
    assert!(std::fs::read_to_string(root.join("common.gypi"))
        .unwrap()
        .contains("target_defaults"));
    assert!(root.join("tools/gyp_addon").is_file());
}
