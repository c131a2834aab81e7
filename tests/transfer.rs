use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use flit::config::Config;
use flit::connection::{Connection, Role};

async fn fresh_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("flit-e2e-{name}"));
    let _ = tokio::fs::remove_dir_all(&dir).await;
    tokio::fs::create_dir_all(&dir).await.unwrap();
    dir
}

async fn receiver_in(dir: &Path) -> Connection {
    let mut config = Config::receiver();
    config.local_addr = "127.0.0.1:0".parse().unwrap();
    config.timeout = Duration::from_secs(5);
    config.output_dir = dir.to_path_buf();
    Connection::new(Role::Server, config).await.unwrap()
}

async fn sender_towards(receiver_addr: SocketAddr) -> Connection {
    let mut config = Config::sender();
    config.local_addr = "127.0.0.1:0".parse().unwrap();
    config.remote_addr = receiver_addr;
    Connection::new(Role::Client, config).await.unwrap()
}

#[tokio::test]
async fn single_bidirectional_stream_lands_on_disk() {
    let dir = fresh_dir("single").await;
    let mut receiver = receiver_in(&dir).await;
    let receiver_addr = receiver.local_addr();
    let receive_loop = tokio::spawn(async move { receiver.receive_packets().await });

    let mut sender = sender_towards(receiver_addr).await;
    let id = sender.open_stream(false).unwrap();
    assert_eq!(id.to_inner(), 0);
    sender
        .add_data_to_stream(id, b"Test data for stream")
        .unwrap();
    sender.send_packets().await.unwrap();

    receive_loop.await.unwrap().unwrap();

    let written = tokio::fs::read(dir.join("0.gif")).await.unwrap();
    assert_eq!(written, b"Test data for stream");
}

#[tokio::test(flavor = "multi_thread")]
async fn five_unidirectional_streams_land_on_disk() {
    let dir = fresh_dir("five").await;
    let mut receiver = receiver_in(&dir).await;
    let receiver_addr = receiver.local_addr();
    let receive_loop = tokio::spawn(async move { receiver.receive_packets().await });

    let mut config = Config::sender();
    config.local_addr = "127.0.0.1:0".parse().unwrap();
    config.remote_addr = receiver_addr;
    // a fixed packet size keeps the datagram burst well inside the
    // loopback socket buffer while the receiver drains in parallel
    config.min_packet_size = 1500;
    config.max_packet_size = 1500;
    let mut sender = Connection::new(Role::Client, config).await.unwrap();
    let payload: Vec<u8> = (0..50 * 1024u32).map(|byte| (byte % 251) as u8).collect();
    let mut ids = Vec::new();
    for _ in 0..5 {
        let id = sender.open_stream(true).unwrap();
        sender.add_data_to_stream(id, &payload).unwrap();
        ids.push(id);
    }
    sender.send_packets().await.unwrap();

    receive_loop.await.unwrap().unwrap();

    // client-initiated unidirectional ids are counter * 4 + 2
    for (counter, id) in ids.iter().enumerate() {
        assert_eq!(id.to_inner(), counter as u64 * 4 + 2);
        let written = tokio::fs::read(dir.join(format!("{id}.gif"))).await.unwrap();
        assert_eq!(written, payload, "stream {id} corrupted");
    }
}

#[tokio::test]
async fn negotiated_size_reaches_the_receiver() {
    let dir = fresh_dir("negotiate").await;
    let mut receiver = receiver_in(&dir).await;
    let receiver_addr = receiver.local_addr();

    let mut sender = sender_towards(receiver_addr).await;
    let id = sender.open_stream(true).unwrap();
    sender.add_data_to_stream(id, b"size check").unwrap();

    let send_loop = tokio::spawn(async move {
        sender.send_packets().await.unwrap();
        sender
    });
    receiver.receive_packets().await.unwrap();
    let sender = send_loop.await.unwrap();

    let negotiated = receiver.packet_size().unwrap();
    assert_eq!(sender.packet_size().unwrap(), negotiated);
    assert!((1000..=2000).contains(&negotiated));
}

#[tokio::test]
async fn receiver_times_out_without_traffic() {
    let dir = fresh_dir("timeout").await;
    let mut config = Config::receiver();
    config.local_addr = "127.0.0.1:0".parse().unwrap();
    config.timeout = Duration::from_millis(200);
    config.output_dir = dir;
    let mut receiver = Connection::new(Role::Server, config).await.unwrap();

    let before = Instant::now();
    receiver.receive_packets().await.unwrap();
    assert!(before.elapsed() >= Duration::from_millis(200));
    assert!(before.elapsed() < Duration::from_secs(5));
}
