use dev_overlay::transport::sse::{ClientEvent, EventClient};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;

const SSE_HEADERS: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";

/// Book-keeping for connections the test server has seen.
struct StreamLog {
    live: AtomicUsize,
    max_live: AtomicUsize,
    accepts: Mutex<Vec<Instant>>,
}

impl StreamLog {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            live: AtomicUsize::new(0),
            max_live: AtomicUsize::new(0),
            accepts: Mutex::new(Vec::new()),
        })
    }
}

/// Accept loop: the first connection emits one event and then drops; every
/// later connection stays open, emitting its event only after the client's
/// confirm window has passed.
async fn run_server(listener: TcpListener, log: Arc<StreamLog>) {
    let mut index = 0;
    loop {
        let (socket, _) = listener.accept().await.unwrap();
        index += 1;
        log.accepts.lock().unwrap().push(Instant::now());
        let live = log.live.fetch_add(1, Ordering::SeqCst) + 1;
        log.max_live.fetch_max(live, Ordering::SeqCst);
        tokio::spawn(serve_connection(socket, index, Arc::clone(&log)));
    }
}

async fn serve_connection(mut socket: TcpStream, index: usize, log: Arc<StreamLog>) {
    let mut request = [0u8; 1024];
    let _ = socket.read(&mut request).await;
    socket.write_all(SSE_HEADERS).await.unwrap();

    if index == 1 {
        socket
            .write_all(b"data: {\"action\":\"building\"}\n\n")
            .await
            .unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        // dropping the socket ends the first stream
    } else {
        tokio::time::sleep(Duration::from_millis(150)).await;
        socket
            .write_all(b"data: {\"action\":\"sync\"}\n\n")
            .await
            .unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    log.live.fetch_sub(1, Ordering::SeqCst);
}

async fn next_event(events: &mut broadcast::Receiver<ClientEvent>) -> ClientEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a client event")
        .expect("event channel closed")
}

#[tokio::test]
async fn a_dropped_stream_reconnects_once_and_confirms_after_the_quiet_period() {
    dev_overlay::logging::init_tracing("dev_overlay=debug");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = StreamLog::new();
    tokio::spawn(run_server(listener, Arc::clone(&log)));

    let client = EventClient::connect(
        format!("http://{}/__webpack_hmr", addr),
        Duration::from_millis(200),
        Duration::from_millis(50),
    );
    let mut events = client.subscribe();

    // the first connection delivers its message and fails without ever
    // announcing a reconnect
    match next_event(&mut events).await {
        ClientEvent::Message(value) => assert_eq!(value["action"], "building"),
        other => panic!("expected the first stream message, got {:?}", other),
    }
    assert!(matches!(next_event(&mut events).await, ClientEvent::Error));

    // the replacement connection announces itself once the quiet period
    // passes with no further error
    assert!(matches!(next_event(&mut events).await, ClientEvent::Reconnect));

    {
        let accepts = log.accepts.lock().unwrap();
        assert_eq!(accepts.len(), 2, "exactly one reconnection attempt");
        assert!(
            accepts[1].duration_since(accepts[0]) >= Duration::from_millis(200),
            "the new connection waited out the fixed delay"
        );
    }
    assert_eq!(
        log.max_live.load(Ordering::SeqCst),
        1,
        "never two live connections, even while a reconnect was pending"
    );

    // the confirmed connection keeps streaming afterwards
    match next_event(&mut events).await {
        ClientEvent::Message(value) => assert_eq!(value["action"], "sync"),
        other => panic!("expected the resumed stream message, got {:?}", other),
    }
    client.close();
}
