//! End-to-end tests over real TCP connections

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use tcp_chat::{serve, ChatServer, SessionOptions};

const WAIT: Duration = Duration::from_secs(5);
const PROMPT: &str = "[ENTER YOUR NAME]: ";
const GREETING: &str = "Welcome to TCP-Chat!\n[ENTER YOUR NAME]: \n[ENTER YOUR NAME]: ";

async fn start(max_clients: usize) -> (SocketAddr, ChatServer) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = ChatServer::new(max_clients, 0);
    let options = SessionOptions {
        banner: PathBuf::from("/nonexistent/tcp_chat/linuxlogo.txt"),
        write_timeout: Duration::from_secs(5),
    };
    tokio::spawn(serve(listener, server.clone(), options));
    (addr, server)
}

async fn wait_registered(server: &ChatServer, name: &str) {
    timeout(WAIT, async {
        while !server
            .snapshot()
            .await
            .iter()
            .any(|(_, n)| n.as_str() == name)
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("name never registered");
}

struct TestClient {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        Self {
            stream,
            buf: Vec::new(),
        }
    }

    /// Connect and consume the banner and first name prompt
    async fn greeted(addr: SocketAddr) -> Self {
        let mut client = Self::connect(addr).await;
        assert_eq!(client.expect(GREETING).await, GREETING);
        client
    }

    /// Connect, answer the name prompt and wait until the name is registered
    async fn login(addr: SocketAddr, server: &ChatServer, name: &str) -> Self {
        let mut client = Self::greeted(addr).await;
        client.send(name).await;
        wait_registered(server, name).await;
        client
    }

    async fn send(&mut self, line: &str) {
        self.stream
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn fill(&mut self) -> usize {
        let mut chunk = [0u8; 1024];
        let n = timeout(WAIT, self.stream.read(&mut chunk))
            .await
            .expect("timed out waiting for server")
            .unwrap();
        self.buf.extend_from_slice(&chunk[..n]);
        n
    }

    /// Consume everything up to and including `needle`
    async fn expect(&mut self, needle: &str) -> String {
        loop {
            let text = String::from_utf8_lossy(&self.buf).into_owned();
            if let Some(pos) = text.find(needle) {
                let end = pos + needle.len();
                self.buf.drain(..end);
                return text[..end].to_string();
            }
            assert!(self.fill().await > 0, "connection closed before {:?}", needle);
        }
    }

    /// Next full line without its trailing newline
    async fn next_line(&mut self) -> String {
        let line = self.expect("\n").await;
        line.trim_end_matches('\n').to_string()
    }

    async fn line_containing(&mut self, needle: &str) -> String {
        loop {
            let line = self.next_line().await;
            if line.contains(needle) {
                return line;
            }
        }
    }

    /// Read until the server closes the connection
    async fn read_to_close(&mut self) -> String {
        while self.fill().await > 0 {}
        String::from_utf8_lossy(&std::mem::take(&mut self.buf)).into_owned()
    }
}

#[tokio::test]
async fn test_banner_then_prompt() {
    let (addr, _server) = start(10).await;
    let mut client = TestClient::connect(addr).await;

    let greeting = client.expect(GREETING).await;
    assert_eq!(
        greeting,
        "Welcome to TCP-Chat!\n[ENTER YOUR NAME]: \n[ENTER YOUR NAME]: "
    );
}

#[tokio::test]
async fn test_third_client_rejected_when_full() {
    let (addr, server) = start(2).await;
    let _alice = TestClient::login(addr, &server, "alice").await;
    let _bob = TestClient::login(addr, &server, "bob").await;

    let mut carol = TestClient::connect(addr).await;
    let received = carol.read_to_close().await;

    assert_eq!(received, "Server full. Try again later.\n");
    assert_eq!(server.client_count().await, 2);
}

#[tokio::test]
async fn test_duplicate_name_reprompts() {
    let (addr, server) = start(10).await;
    let _alice = TestClient::login(addr, &server, "alice").await;

    let mut bob = TestClient::greeted(addr).await;
    bob.send("alice").await;
    bob.expect("Name already taken. Choose another name:\n[ENTER YOUR NAME]: ")
        .await;
    bob.send("alice2").await;
    wait_registered(&server, "alice2").await;

    let mut names: Vec<String> = server
        .snapshot()
        .await
        .into_iter()
        .map(|(_, name)| name.to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["alice", "alice2"]);
}

#[tokio::test]
async fn test_blank_name_reprompts() {
    let (addr, server) = start(10).await;
    let mut client = TestClient::greeted(addr).await;

    client.send("   ").await;
    assert_eq!(client.expect(PROMPT).await, "\n[ENTER YOUR NAME]: ");
    client.send("  dave  ").await;
    wait_registered(&server, "dave").await;
}

#[tokio::test]
async fn test_slot_lost_while_choosing_name() {
    let (addr, server) = start(1).await;
    // Both admitted while nobody is registered yet
    let mut alice = TestClient::greeted(addr).await;
    let mut bob = TestClient::greeted(addr).await;

    alice.send("alice").await;
    wait_registered(&server, "alice").await;
    bob.send("bob").await;

    assert_eq!(bob.read_to_close().await, "Server full. Try again later.\n");
    assert_eq!(server.client_count().await, 1);
    assert_eq!(server.history().await, vec!["alice has joined our chat..."]);
}

#[tokio::test]
async fn test_message_styled_for_self_and_peers() {
    let (addr, server) = start(10).await;
    let mut alice = TestClient::login(addr, &server, "alice").await;
    let mut bob = TestClient::login(addr, &server, "bob").await;
    alice.line_containing("bob has joined our chat...").await;

    alice.send("hello").await;

    let own = alice.line_containing("[alice]:hello").await;
    let peer = bob.line_containing("[alice]:hello").await;

    assert!(own.starts_with("\x1b[32m["), "own line: {:?}", own);
    assert!(peer.starts_with("\x1b[34m["), "peer line: {:?}", peer);
    assert!(own.ends_with("]:hello\x1b[0m"));
    // Same timestamp, name and text; only the decoration differs
    assert_eq!(own["\x1b[32m".len()..], peer["\x1b[34m".len()..]);
    // [YYYY-MM-DD HH:MM:SS][alice]:hello
    let body = &own["\x1b[32m".len()..];
    assert_eq!(&body[20..29], "][alice]:");
}

#[tokio::test]
async fn test_backlog_replayed_in_order() {
    let (addr, server) = start(10).await;
    let mut alice = TestClient::login(addr, &server, "alice").await;
    alice.send("first").await;
    alice.line_containing("[alice]:first").await;
    alice.send("").await;
    alice.send("second").await;
    alice.line_containing("[alice]:second").await;

    let mut bob = TestClient::greeted(addr).await;
    bob.send("bob").await;

    assert_eq!(
        bob.next_line().await,
        "\x1b[31malice has joined our chat...\x1b[0m"
    );
    let first = bob.next_line().await;
    assert!(first.starts_with("\x1b[31m[") && first.ends_with("[alice]:first\x1b[0m"));
    let second = bob.next_line().await;
    assert!(second.starts_with("\x1b[31m[") && second.ends_with("[alice]:second\x1b[0m"));

    // Alice hears about bob; bob never gets his own join line
    alice.line_containing("bob has joined our chat...").await;
    alice.send("third").await;
    let live = bob.next_line().await;
    assert!(live.starts_with("\x1b[34m[") && live.ends_with("[alice]:third\x1b[0m"));

    // Blank lines never reach the log
    let history = server.history().await;
    assert_eq!(history.len(), 5);
    assert!(history.iter().all(|entry| !entry.ends_with(":")));
}

#[tokio::test]
async fn test_leave_announced_and_slot_freed() {
    let (addr, server) = start(2).await;
    let alice = TestClient::login(addr, &server, "alice").await;
    let mut bob = TestClient::login(addr, &server, "bob").await;

    drop(alice);

    let notice = bob.line_containing("has left our chat...").await;
    assert_eq!(notice, "\x1b[33malice has left our chat...\x1b[0m");

    let _dave = TestClient::login(addr, &server, "dave").await;
    assert_eq!(server.client_count().await, 2);

    let history = server.history().await;
    assert_eq!(
        history.iter().filter(|e| e.as_str() == "alice has left our chat...").count(),
        1
    );
}
