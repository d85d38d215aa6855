//! Fixture tests for nginx-conf
//!
//! These tests read the configuration tree under `tests/fixtures` from disk,
//! following includes, and check the resulting model.

use nginx_conf::{BlockKind, Modifier, ParseError, ParseOptions, PropertyAccess, Reader};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(path)
}

#[test]
fn test_read_fixture_tree() {
    let config = nginx_conf::read(fixture("webkaos.conf")).expect("Failed to read fixture");

    assert_eq!(config.root, fixture(""));
    assert_eq!(config.to_string(), format!("<{}>", fixture("webkaos.conf").display()));

    assert_eq!(config.core.get("worker_processes"), "auto");
    assert_eq!(config.core.get_int("worker_rlimit_nofile"), Ok(65536));
    assert_eq!(config.core.get("error_log"), "/var/log/webkaos/error.log warn");

    let events = config.events.as_ref().expect("events block");
    assert_eq!(events.get_int("worker_connections"), Ok(8192));
    assert_eq!(events.get_bool("multi_accept"), Ok(true));
    assert!(config.stream.is_none());
}

#[test]
fn test_servers_list() {
    let config = nginx_conf::read(fixture("webkaos.conf")).unwrap();

    assert_eq!(config.servers_num(), 3);
    insta::assert_debug_snapshot!(config.servers_list(), @r###"
    [
        "_:http",
        "service.domain.com:http",
        "service.domain.com:https",
    ]
    "###);
}

#[test]
fn test_http_properties() {
    let config = nginx_conf::read(fixture("webkaos.conf")).unwrap();
    let http = config.http.as_ref().unwrap();

    assert_eq!(http.properties.get("client_body_timeout"), "15s");
    assert_eq!(
        http.properties.get_time("client_body_timeout"),
        Ok(Duration::from_secs(15))
    );
    assert_eq!(http.properties.get_time("keepalive_timeout"), Ok(Duration::from_secs(65)));
    assert_eq!(http.properties.get_size("client_max_body_size"), Ok(8 * 1024 * 1024));
    assert_eq!(
        http.properties.get_buf("large_client_header_buffers"),
        Ok((4, 16 * 1024))
    );
    assert_eq!(http.properties.get_bool("gzip"), Ok(true));
    assert!(http.properties.get("log_format").starts_with("main '$remote_addr"));
    assert!(!http.properties.contains("include"));

    assert_eq!(http.types.get("text/html"), "html htm");
    assert_eq!(http.types.len(), 3);

    let backend = http.upstream("backend").expect("backend upstream");
    assert_eq!(backend.name, "backend");
    assert_eq!(backend.properties.values("server").len(), 2);
    assert_eq!(backend.properties.get_int("keepalive"), Ok(32));
}

#[test]
fn test_find_server() {
    let config = nginx_conf::read(fixture("webkaos.conf")).unwrap();

    let server = config
        .find_server("service.domain.com", "https")
        .expect("https server");
    assert_eq!(
        server.properties.get("ssl_certificate"),
        "/etc/webkaos/ssl/my-chain.crt"
    );
    assert_eq!(server.properties.conditions(), ["$http_user_agent ~* \"(curl|wget)\""]);
    assert_eq!(server.properties.values_for("return", Some(0)), ["403"]);

    let plain = config.find_server("service.domain.com", "http").unwrap();
    assert_eq!(plain.id.0, 1);
    assert!(config.find_server("service.domain.com", "ssl").is_some());
    assert!(config.find_server("other.domain.com", "http").is_none());
}

#[test]
fn test_locations() {
    let config = nginx_conf::read(fixture("webkaos.conf")).unwrap();
    let http = config.http.as_ref().unwrap();
    let server = config.find_server("service.domain.com", "443").unwrap();

    let modifiers: Vec<&Modifier> = server.locations.iter().map(|l| &l.modifier).collect();
    assert_eq!(
        modifiers,
        [&Modifier::None, &Modifier::RegexCaseless, &Modifier::Exact]
    );

    let root = &server.locations[0];
    assert_eq!(root.uri, "/");
    assert_eq!(root.properties.get("proxy_pass"), "http://backend");
    assert_eq!(root.properties.get_time("proxy_read_timeout"), Ok(Duration::from_secs(90)));
    assert_eq!(http.location_parent(root).map(|s| s.id), Some(server.id));

    let assets = &server.locations[1];
    assert_eq!(assets.uri, "\\.(png|jpg|css)$");
    assert_eq!(assets.properties.conditions(), ["$request_method = POST"]);
    assert_eq!(assets.properties.values_for("expires", None), ["30d"]);

    let health = &server.locations[2];
    assert_eq!(health.uri, "/healthz");
    assert_eq!(health.properties.get_bool("access_log"), Ok(false));
}

#[test]
fn test_read_part() {
    let http = nginx_conf::read_part(fixture("conf.d/service.conf")).unwrap();

    assert_eq!(http.servers_num(), 3);
    assert!(http.upstreams.is_empty());
    assert!(http.find_server("_", "80").is_some());
}

#[test]
fn test_read_with_root() {
    let err = nginx_conf::read_with_root(fixture("webkaos.conf"), fixture("conf.d")).unwrap_err();
    match err {
        ParseError::Io { path, .. } => assert_eq!(path, fixture("conf.d/mime.types")),
        other => panic!("expected io error, got {other:?}"),
    }

    let config = nginx_conf::read_with_root(fixture("webkaos.conf"), "").unwrap();
    assert_eq!(config.servers_num(), 3);
}

#[test]
fn test_includes_disabled() {
    let config = Reader::new()
        .options(ParseOptions {
            follow_includes: false,
            ..Default::default()
        })
        .read(fixture("webkaos.conf"))
        .unwrap();

    assert_eq!(config.servers_num(), 0);
    assert!(config.http.unwrap().types.is_empty());
}

#[test]
fn test_broken_configs() {
    let err = nginx_conf::read(fixture("broken/unterminated.conf")).unwrap_err();
    assert!(matches!(err, ParseError::UnterminatedBlock(BlockKind::Server)));
    assert_eq!(err.to_string(), "Can't find block end of server block");

    let err = nginx_conf::read(fixture("broken/unsupported.conf")).unwrap_err();
    assert_eq!(err.to_string(), "Unsupported block server inside server block");

    let err = nginx_conf::read(fixture("broken/missing_include.conf")).unwrap_err();
    assert!(matches!(err, ParseError::Io { ref path, .. } if path == &fixture("broken/missing.conf")));

    let err = nginx_conf::read(fixture("does-not-exist.conf")).unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
}

#[test]
fn test_include_cycle_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.conf"), "worker_processes 1;\ninclude b.conf;\n").unwrap();
    fs::write(dir.path().join("b.conf"), "include a.conf;\n").unwrap();

    let err = nginx_conf::read(dir.path().join("a.conf")).unwrap_err();
    match err {
        ParseError::IncludeCycle(path) => assert_eq!(path, dir.path().join("a.conf")),
        other => panic!("expected include cycle, got {other:?}"),
    }
}

#[test]
fn test_include_depth_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..4 {
        fs::write(
            dir.path().join(format!("{i}.conf")),
            format!("include {}.conf;\n", i + 1),
        )
        .unwrap();
    }
    fs::write(dir.path().join("4.conf"), "worker_processes 4;\n").unwrap();

    let reader = |depth| {
        Reader::new().options(ParseOptions {
            follow_includes: true,
            max_include_depth: depth,
        })
    };

    let config = reader(4).read(dir.path().join("0.conf")).unwrap();
    assert_eq!(config.core.get("worker_processes"), "4");

    let err = reader(3).read(dir.path().join("0.conf")).unwrap_err();
    assert!(matches!(err, ParseError::MaxIncludeDepth(3)));
}

#[test]
fn test_dump_json() {
    let config = nginx_conf::read(fixture("webkaos.conf")).unwrap();
    let json = serde_json::to_value(&config).unwrap();

    assert_eq!(json["events"]["worker_connections"][0], "8192");
    assert_eq!(json["http"]["servers"][2]["locations"][2]["modifier"], "exact");
    assert_eq!(json["http"]["servers"][2]["locations"][2]["server"], 2);
}
