/* 📖 # End-to-end scenarios

These tests wire the pieces the way the binary does: a FileMessageStore behind a
StoreHandle, an ApiService registered with a PAL HTTP server, and requests going in
through the PAL. MockPal covers the request mapping; RealPal covers real files and a
real socket.
*/

use std::io::{Read, Write};
use std::net::TcpStream;

use expect_test::expect;
use tempfile::TempDir;

use motd_base::pal::http::{HttpMethod, HttpRequest, HttpResponse, HttpServerConfig};
use motd_base::{FilePath, MockPal, Pal, PalHandle, RealPal};

use crate::{ApiService, FileMessageStore, SEED_MESSAGE, StaticFileService, StoreHandle};

struct MockServer {
    mock: MockPal,
    port: u16,
}

impl MockServer {
    fn start(mock: MockPal) -> Self {
        let store = StoreHandle::new(FileMessageStore::new(PalHandle::new(mock.clone())));
        store.initialize(None).unwrap();
        let service = ApiService::new(store);
        let handle = mock
            .start_http_server(Box::new(service), HttpServerConfig::default())
            .unwrap();
        Self {
            port: handle.port(),
            mock,
        }
    }

    fn send(&self, request: HttpRequest) -> HttpResponse {
        self.mock.simulate_request(self.port, request).unwrap()
    }

    fn get(&self, path: &str) -> HttpResponse {
        self.send(HttpRequest::new(HttpMethod::Get, path))
    }

    fn post(&self, body: &str) -> HttpResponse {
        self.send(HttpRequest::new(HttpMethod::Post, "/v1/message/").with_body(body))
    }
}

fn body(response: &HttpResponse) -> String {
    response.body().as_string().unwrap()
}

#[test]
fn test_post_then_fetch() {
    let server = MockServer::start(MockPal::new());

    assert_eq!(server.post(r#""motd1""#).status().as_u16(), 201);
    assert_eq!(server.post(r#""motd2""#).status().as_u16(), 201);

    expect![[r#""motd1""#]].assert_eq(&body(&server.get("/v1/message/1")));
    assert_eq!(server.get("/v1/message/5").status().as_u16(), 404);
    expect![[r#"["quidquid Latine dictum sit altum videtur","motd1","motd2"]"#]]
        .assert_eq(&body(&server.get("/v1/message/")));

    let random: String = serde_json::from_str(&body(&server.get("/v1/message/random"))).unwrap();
    assert!([SEED_MESSAGE, "motd1", "motd2"].contains(&random.as_str()));

    expect![[r#"{"messages":["quidquid Latine dictum sit altum videtur","motd1","motd2"]}"#]]
        .assert_eq(
            &String::from_utf8(
                server
                    .mock
                    .file_content(&FilePath::from("motd_storage.json"))
                    .unwrap(),
            )
            .unwrap(),
        );
}

#[test]
fn test_unquoted_post_leaves_file_untouched() {
    let server = MockServer::start(MockPal::new());
    let before = server.mock.file_content(&FilePath::from("motd_storage.json"));

    assert_eq!(server.post("a new motd").status().as_u16(), 400);
    assert_eq!(
        server.mock.file_content(&FilePath::from("motd_storage.json")),
        before
    );
}

#[test]
fn test_storage_removed_after_start() {
    let server = MockServer::start(MockPal::new());
    server.mock.remove_file(&FilePath::from("motd_storage.json"));

    let response = server.get("/v1/message/");
    assert_eq!(response.status().as_u16(), 500);
    expect!["File not found: motd_storage.json"].assert_eq(&body(&response));

    assert_eq!(server.post(r#""lost""#).status().as_u16(), 500);
}

#[test]
fn test_storage_corrupted_after_start() {
    let server = MockServer::start(MockPal::new());
    server
        .mock
        .add_file(FilePath::from("motd_storage.json"), br"asdf#!=\".to_vec());

    assert_eq!(server.get("/v1/message/random").status().as_u16(), 500);
    assert_eq!(server.get("/v1/message/0").status().as_u16(), 500);
}

#[test]
fn test_initialize_rejects_corrupt_storage() {
    let mock = MockPal::new();
    mock.add_file(FilePath::from("motd_storage.json"), b"not json".to_vec());

    let store = StoreHandle::new(FileMessageStore::new(PalHandle::new(mock)));
    assert!(store.initialize(None).is_err());
}

#[test]
fn test_empty_file_random_is_no_content() {
    let mock = MockPal::new();
    let store = StoreHandle::new(FileMessageStore::new(PalHandle::new(mock.clone())));
    mock.add_file(FilePath::from("motd_storage.json"), Vec::new());
    let service = ApiService::new(store);
    let handle = mock
        .start_http_server(Box::new(service), HttpServerConfig::default())
        .unwrap();

    let response = mock
        .simulate_request(
            handle.port(),
            HttpRequest::new(HttpMethod::Get, "/v1/message/random"),
        )
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);
    assert!(response.body().is_empty());
}

fn send(port: u16, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    let request = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{}",
        method,
        path,
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

#[test]
fn test_real_server_with_files_on_disk() {
    let data_dir = TempDir::new().unwrap();
    let static_dir = TempDir::new().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<h1>motd</h1>").unwrap();

    let pal = PalHandle::new(RealPal::new(data_dir.path().to_path_buf()));
    let store = StoreHandle::new(FileMessageStore::new(pal.clone()));
    store.initialize(None).unwrap();
    let service = ApiService::new(store).with_static_files(StaticFileService::new(
        PalHandle::new(RealPal::new(static_dir.path().to_path_buf())),
    ));
    let handle = pal
        .start_http_server(Box::new(service), HttpServerConfig::new("127.0.0.1"))
        .unwrap();
    let port = handle.port();

    let response = send(port, "POST", "/v1/message/", r#""from the wire""#);
    assert!(response.starts_with("HTTP/1.1 201"), "{}", response);

    let response = send(port, "GET", "/v1/message/1", "");
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.ends_with(r#""from the wire""#), "{}", response);

    let response = send(port, "DELETE", "/v1/message/1", "");
    assert!(response.starts_with("HTTP/1.1 405"), "{}", response);

    let response = send(port, "GET", "/", "");
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.ends_with("<h1>motd</h1>"), "{}", response);

    let stored = std::fs::read_to_string(data_dir.path().join("motd_storage.json")).unwrap();
    expect![[r#"{"messages":["quidquid Latine dictum sit altum videtur","from the wire"]}"#]]
        .assert_eq(&stored);
}
