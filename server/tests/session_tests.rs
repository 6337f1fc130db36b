use game_core::card::Card;
use game_core::config::SessionConfig;
use game_core::table::{meta, Table, FRAME_BYTES, MARK_PLAYED, MARK_PRESENT, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use uecda_server::journal::Journal;
use uecda_server::net::{Endpoint, NetError};
use uecda_server::session::{self, Session};

async fn read_table(stream: &mut TcpStream) -> Option<Table> {
    let mut buf = [0u8; FRAME_BYTES];
    match stream.read_exact(&mut buf).await {
        Ok(_) => Some(Table::from_bytes(&buf)),
        Err(_) => None,
    }
}

/// Minimal scripted client: leads its weakest card when it holds the fresh
/// field, passes on everything else, and relearns its hand from every
/// pre-game snapshot (turn number 0).
async fn run_client(addr: SocketAddr, name: String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let greeting = read_table(&mut stream).await.unwrap();
    assert_eq!(greeting.get(0, meta::VERSION), PROTOCOL_VERSION);
    stream
        .write_all(&Table::profile(PROTOCOL_VERSION, &name).to_bytes())
        .await
        .unwrap();

    let mut hand: Vec<Card> = Vec::new();
    while let Some(table) = read_table(&mut stream).await {
        let your_turn = table.get(0, meta::YOUR_TURN) == 1;
        let turn_number = table.get(0, meta::VERSION);

        if turn_number == 0 && !your_turn {
            hand = table.cards_with_mark(MARK_PRESENT);
        }

        if your_turn {
            let mut response = Table::new();
            if table.get(0, meta::START_OF_TRICK) == 1 && !hand.is_empty() {
                let lead = *hand.iter().min_by_key(|c| c.strength(false)).unwrap();
                hand.retain(|c| *c != lead);
                response.mark_cards(&[lead], MARK_PLAYED);
            }
            stream.write_all(&response.to_bytes()).await.unwrap();
        }

        if table.get(0, meta::SESSION_END) == 1 {
            break;
        }
    }
}

#[tokio::test]
async fn handshake_assigns_seat_and_reads_name() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let client = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let greeting = read_table(&mut stream).await.unwrap();
        assert_eq!(greeting.get(0, meta::VERSION), PROTOCOL_VERSION);
        assert_eq!(greeting.get(0, meta::ACTIVE_SEAT), 3);
        stream
            .write_all(&Table::profile(PROTOCOL_VERSION, "alice").to_bytes())
            .await
            .unwrap();
    });

    let (stream, _) = listener.accept().await.unwrap();
    let endpoint = Endpoint::handshake(stream, 3).await.unwrap();
    assert_eq!(endpoint.seat, 3);
    assert_eq!(endpoint.name, "alice");
    client.await.unwrap();
}

#[tokio::test]
async fn handshake_rejects_protocol_mismatch() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let client = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let _ = read_table(&mut stream).await.unwrap();
        stream
            .write_all(&Table::profile(20060, "legacy").to_bytes())
            .await
            .unwrap();
        let _ = stream.read_exact(&mut [0u8; 1]).await;
    });

    let (stream, _) = listener.accept().await.unwrap();
    let result = Endpoint::handshake(stream, 0).await;
    assert!(matches!(
        result,
        Err(NetError::ProtocolMismatch {
            seat: 0,
            version: 20060
        })
    ));
    client.await.unwrap();
}

#[tokio::test]
async fn full_session_over_loopback() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let names = ["alpha", "bravo", "carol", "delta", "echo"];
    let mut clients = Vec::new();
    for name in names {
        clients.push(tokio::spawn(run_client(addr, name.to_string())));
    }

    let endpoints = session::accept_players(&listener).await.unwrap();
    // Connection order decides seats, so only the set of names is stable.
    let mut connected: Vec<&str> = endpoints.iter().map(|e| e.name.as_str()).collect();
    connected.sort();
    assert_eq!(connected, names);

    let journal_file =
        std::env::temp_dir().join(format!("uecda-session-test-{}.jsonl", std::process::id()));
    let journal = Journal::create(&journal_file).unwrap();
    let config = SessionConfig {
        total_games: 2,
        seed: Some(20070),
        turn_timeout: Duration::from_secs(5),
        ..SessionConfig::default()
    };

    let mut session = Session::new(endpoints, config, journal);
    let points = session.run().await.unwrap();
    assert_eq!(points.iter().sum::<u32>(), 30);

    for client in clients {
        client.await.unwrap();
    }

    let log = std::fs::read_to_string(&journal_file).unwrap();
    let events: Vec<serde_json::Value> = log
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(events.first().unwrap()["type"], "session_start");
    assert_eq!(events.last().unwrap()["type"], "session_end");

    let types: Vec<&str> = events
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert_eq!(types.iter().filter(|t| **t == "game_start").count(), 2);
    assert_eq!(types.iter().filter(|t| **t == "game_end").count(), 2);
    assert_eq!(types.iter().filter(|t| **t == "exchange").count(), 1);
    assert!(types.contains(&"turn"));

    for event in events.iter().filter(|e| e["type"] == "game_end") {
        let mut order: Vec<u64> = event["finish_order"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_u64().unwrap())
            .collect();
        order.sort();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    let session_end = events.last().unwrap();
    assert_eq!(session_end["total_games"], 2);
    assert_eq!(session_end["ranking"].as_array().unwrap().len(), 5);

    std::fs::remove_file(&journal_file).ok();
}
