#![allow(dead_code)]

use std::io;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use nodedev::{InstallConfig, TargetPlatform};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Gzipped tarball laid out like a node source release: everything under
/// a single `node-v<version>/` top-level directory.
pub fn node_tarball(version: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let top = format!("node-v{version}");
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

    let mut root = tar::Header::new_gnu();
    root.set_entry_type(tar::EntryType::Directory);
    root.set_mode(0o755);
    root.set_size(0);
    builder
        .append_data(&mut root, format!("{top}/"), io::empty())
        .unwrap();

    for (name, body) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, format!("{top}/{name}"), *body)
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

pub async fn mount_tarball(server: &MockServer, version: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/v{version}/node-v{version}.tar.gz")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub async fn mount_bytes(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

pub fn unix_config(dev_dir: &Path, server: &MockServer) -> InstallConfig {
    InstallConfig::new(dev_dir)
        .with_dist_url(server.uri())
        .with_platform(TargetPlatform::Unix)
}

/// Minimal stand-in for the bundled legacy gyp files.
pub fn write_legacy_dir(dir: &Path) {
    std::fs::create_dir_all(dir.join("tools")).unwrap();
    std::fs::write(dir.join("common.gypi"), "{ 'variables': {} }\n").unwrap();
    std::fs::write(dir.join("tools/gyp_addon"), "#!/usr/bin/env python\n").unwrap();
}

/// Gzipped tarball whose entry names are written verbatim into the header,
/// bypassing the path checks `tar::Builder` applies.
pub fn raw_tarball(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, body) in entries {
        let mut header = tar::Header::new_old();
        let raw = name.as_bytes();
        header.as_old_mut().name[..raw.len()].copy_from_slice(raw);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, *body).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}
