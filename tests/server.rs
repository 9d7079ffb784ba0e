use std::fs;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime};

use sfserve::config::{Config, SchedulingMode};
use sfserve::handler::RequestHandler;
use sfserve::server::{self, ShutdownReport, ShutdownSignal};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(3);

struct TestServer {
    addr: SocketAddr,
    signal: ShutdownSignal,
    task: JoinHandle<ShutdownReport>,
    root: tempfile::TempDir,
}

impl TestServer {
    async fn start(configure: impl FnOnce(&mut Config)) -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("index.html"), "<h1>index</h1>").unwrap();
        fs::write(root.path().join("hello.txt"), "hello file").unwrap();

        let mut config = Config::with_document_root(root.path().to_str().unwrap());
        config.logging.access_log = false;
        configure(&mut config);
        config.validate().unwrap();

        let handler = RequestHandler::from_config(&config).unwrap();
        let listener = server::bind(&config).unwrap();
        let addr = listener.local_addr().unwrap();

        let signal = ShutdownSignal::new();
        let shutdown = signal.subscribe();
        let task =
            tokio::spawn(async move { server::serve(&config, listener, handler, shutdown).await });

        Self {
            addr,
            signal,
            task,
            root,
        }
    }

    async fn stop(self) -> ShutdownReport {
        self.signal.trigger();
        tokio::time::timeout(WAIT, self.task).await.unwrap().unwrap()
    }
}

#[derive(Debug)]
struct Reply {
    status_line: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Read exactly one response, using Content-Length to find its end
async fn read_reply(stream: &mut TcpStream) -> Reply {
    let mut raw = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers");
        raw.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8(raw[..head_end].to_vec()).unwrap();
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let length: usize = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .map(|(_, v)| v.parse().unwrap())
        .unwrap();

    let mut body = raw[head_end + 4..].to_vec();
    while body.len() < length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-body");
        body.extend_from_slice(&chunk[..n]);
    }

    Reply {
        status_line,
        headers,
        body,
    }
}

async fn exchange(addr: SocketAddr, request: &[u8]) -> (TcpStream, Reply) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let reply = tokio::time::timeout(WAIT, read_reply(&mut stream))
        .await
        .unwrap();
    (stream, reply)
}

async fn assert_closed(stream: &mut TcpStream) {
    let mut buf = [0u8; 16];
    let n = tokio::time::timeout(WAIT, stream.read(&mut buf))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_get_root_serves_index() {
    let server = TestServer::start(|_| {}).await;

    let (mut stream, reply) = exchange(server.addr, b"GET / HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status_line, "HTTP/1.1 200 OK");
    assert_eq!(reply.header("Content-Type"), Some("text/html"));
    assert_eq!(reply.header("Content-Length"), Some("14"));
    assert_eq!(reply.header("Connection"), Some("close"));
    assert_eq!(reply.body, b"<h1>index</h1>");
    assert_closed(&mut stream).await;

    server.stop().await;
}

#[tokio::test]
async fn test_traversal_is_rejected_and_closed() {
    let server = TestServer::start(|_| {}).await;

    let (mut stream, reply) = exchange(
        server.addr,
        b"GET /../../etc/passwd HTTP/1.1\r\nConnection: keep-alive\r\n\r\n",
    )
    .await;
    assert_eq!(reply.status_line, "HTTP/1.1 400 Bad Request");
    assert_eq!(reply.header("Connection"), Some("close"));
    assert_closed(&mut stream).await;

    server.stop().await;
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let server = TestServer::start(|_| {}).await;

    let (_stream, reply) = exchange(server.addr, b"GET /missing.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status_line, "HTTP/1.1 404 Not Found");
    assert_eq!(reply.header("Content-Type"), Some("text/html"));
    assert!(String::from_utf8_lossy(&reply.body).contains("404 Not Found"));

    server.stop().await;
}

#[tokio::test]
async fn test_unsupported_method_is_501() {
    let server = TestServer::start(|_| {}).await;

    let (_stream, reply) = exchange(server.addr, b"DELETE /hello.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status_line, "HTTP/1.1 501 Not Implemented");

    server.stop().await;
}

#[tokio::test]
async fn test_contact_route_echoes_body() {
    let server = TestServer::start(|_| {}).await;

    let (_stream, reply) = exchange(
        server.addr,
        b"POST /contact HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello",
    )
    .await;
    assert_eq!(reply.status_line, "HTTP/1.1 200 OK");
    assert_eq!(reply.header("Content-Type"), Some("text/plain"));
    assert_eq!(reply.body, b"Received: hello");

    let (_stream, reply) = exchange(server.addr, b"GET /api HTTP/1.1\r\n\r\n").await;
    let json: serde_json::Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(json["message"], "API route active");

    server.stop().await;
}

#[tokio::test]
async fn test_keep_alive_serves_several_requests() {
    let server = TestServer::start(|_| {}).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    for (path, body) in [("/hello.txt", &b"hello file"[..]), ("/", &b"<h1>index</h1>"[..])] {
        let request = format!("GET {path} HTTP/1.1\r\nConnection: keep-alive\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let reply = tokio::time::timeout(WAIT, read_reply(&mut stream))
            .await
            .unwrap();
        assert_eq!(reply.status_line, "HTTP/1.1 200 OK");
        assert_eq!(reply.header("Connection"), Some("keep-alive"));
        assert_eq!(reply.body, body);
    }

    // a request without the header ends the session
    stream
        .write_all(b"GET /hello.txt HTTP/1.1\r\n\r\n")
        .await
        .unwrap();
    let reply = tokio::time::timeout(WAIT, read_reply(&mut stream))
        .await
        .unwrap();
    assert_eq!(reply.header("Connection"), Some("close"));
    assert_closed(&mut stream).await;

    server.stop().await;
}

#[tokio::test]
async fn test_extra_client_waits_for_a_free_slot() {
    let server = TestServer::start(|cfg| cfg.server.max_clients = 1).await;

    // occupy the only slot with a live keep-alive session
    let (holder, reply) = exchange(
        server.addr,
        b"GET / HTTP/1.1\r\nConnection: keep-alive\r\n\r\n",
    )
    .await;
    assert_eq!(reply.header("Connection"), Some("keep-alive"));

    let mut waiting = TcpStream::connect(server.addr).await.unwrap();
    waiting
        .write_all(b"GET /hello.txt HTTP/1.1\r\n\r\n")
        .await
        .unwrap();
    let early = tokio::time::timeout(Duration::from_millis(300), read_reply(&mut waiting)).await;
    assert!(early.is_err(), "served while every slot was busy");

    drop(holder);
    let reply = tokio::time::timeout(WAIT, read_reply(&mut waiting))
        .await
        .unwrap();
    assert_eq!(reply.status_line, "HTTP/1.1 200 OK");
    assert_eq!(reply.body, b"hello file");

    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_closes_open_connections() {
    let server = TestServer::start(|_| {}).await;

    let mut sessions = Vec::new();
    for _ in 0..2 {
        let (stream, reply) = exchange(
            server.addr,
            b"GET /hello.txt HTTP/1.1\r\nConnection: keep-alive\r\n\r\n",
        )
        .await;
        assert_eq!(reply.status_line, "HTTP/1.1 200 OK");
        sessions.push(stream);
    }

    let report = server.stop().await;
    assert_eq!(report.closed_connections, 2);
    assert_eq!(report.released_cache_entries, 1);

    for stream in &mut sessions {
        assert_closed(stream).await;
    }
}

#[tokio::test]
async fn test_modified_file_is_reloaded() {
    let server = TestServer::start(|_| {}).await;
    let path = server.root.path().join("page.html");
    fs::write(&path, "first").unwrap();

    let (_s, reply) = exchange(server.addr, b"GET /page.html HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.body, b"first");

    fs::write(&path, "second version").unwrap();
    let file = fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
    drop(file);

    let (_s, reply) = exchange(server.addr, b"GET /page.html HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.body, b"second version");
    assert_eq!(reply.header("Content-Length"), Some("14"));

    server.stop().await;
}

#[tokio::test]
async fn test_worker_mode_closes_after_one_exchange() {
    let server = TestServer::start(|cfg| cfg.server.mode = SchedulingMode::WorkerPerConnection).await;

    let (mut stream, reply) = exchange(
        server.addr,
        b"GET /hello.txt HTTP/1.1\r\nConnection: keep-alive\r\n\r\n",
    )
    .await;
    assert_eq!(reply.status_line, "HTTP/1.1 200 OK");
    assert_eq!(reply.header("Connection"), Some("close"));
    assert_eq!(reply.body, b"hello file");
    assert_closed(&mut stream).await;

    let (_s, reply) = exchange(server.addr, b"GET /../secret HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status_line, "HTTP/1.1 400 Bad Request");

    let report = server.stop().await;
    assert_eq!(report.released_cache_entries, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_worker_mode_large_file_does_not_stall_others() {
    let server = TestServer::start(|cfg| cfg.server.mode = SchedulingMode::WorkerPerConnection).await;
    let big = vec![b'x'; 4 * 1024 * 1024];
    fs::write(server.root.path().join("big.bin"), &big).unwrap();

    // left unread while the second client is served
    let mut slow = TcpStream::connect(server.addr).await.unwrap();
    slow.write_all(b"GET /big.bin HTTP/1.1\r\n\r\n").await.unwrap();

    let (_s, reply) = exchange(server.addr, b"GET /hello.txt HTTP/1.1\r\n\r\n").await;
    assert_eq!(reply.status_line, "HTTP/1.1 200 OK");
    assert_eq!(reply.body, b"hello file");

    let reply = tokio::time::timeout(WAIT, read_reply(&mut slow))
        .await
        .unwrap();
    assert_eq!(reply.header("Content-Type"), Some("application/octet-stream"));
    assert_eq!(reply.body.len(), big.len());

    server.stop().await;
}
