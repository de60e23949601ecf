mod common;

use async_std::net::TcpListener;
use hislip_client::{Client, DEFAULT_VENDOR_ID};

use common::*;

#[async_std::test]
async fn write_short_payload_is_one_data_end_frame() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (mut client, (mut sync, mut asynch)) = futures::join!(
        async { Client::connect(addr, DEFAULT_VENDOR_ID, "hislip0").await.unwrap() },
        accept_handshake(&listener, 0, 1),
    );

    futures::join!(
        async { client.set_max_message_size(32).await.unwrap() },
        serve_max_size(&mut asynch, 32, 32),
    );

    futures::join!(
        async { client.write(b"*IDN?\n").await.unwrap() },
        async {
            let frame = read_frame(&mut sync).await;
            assert_eq!(frame.message_type, DATA_END);
            assert_eq!(frame.message_parameter, INITIAL_MESSAGE_ID);
            assert_eq!(frame.payload, b"*IDN?\n");
        },
    );

    // message_id advances by 2 after every outbound frame.
    futures::join!(
        async { client.write(b"*IDN?\n").await.unwrap() },
        async {
            let frame = read_frame(&mut sync).await;
            assert_eq!(frame.message_parameter, INITIAL_MESSAGE_ID.wrapping_add(2));
        },
    );
}

#[async_std::test]
async fn write_fragments_long_payload_into_data_and_data_end() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (mut client, (mut sync, mut asynch)) = futures::join!(
        async { Client::connect(addr, DEFAULT_VENDOR_ID, "hislip0").await.unwrap() },
        accept_handshake(&listener, 0, 1),
    );

    // Fragmentation limit M = max_message_size - 16 = 4.
    futures::join!(
        async { client.set_max_message_size(20).await.unwrap() },
        serve_max_size(&mut asynch, 20, 20),
    );

    let a = INITIAL_MESSAGE_ID;
    futures::join!(
        async { client.write(b"ABCDEFGHIJ").await.unwrap() },
        async {
            let f1 = read_frame(&mut sync).await;
            assert_eq!(f1.message_type, DATA);
            assert_eq!(f1.message_parameter, a);
            assert_eq!(f1.payload, b"ABCD");

            let f2 = read_frame(&mut sync).await;
            assert_eq!(f2.message_type, DATA);
            assert_eq!(f2.message_parameter, a.wrapping_add(2));
            assert_eq!(f2.payload, b"EFGH");

            let f3 = read_frame(&mut sync).await;
            assert_eq!(f3.message_type, DATA_END);
            assert_eq!(f3.message_parameter, a.wrapping_add(4));
            assert_eq!(f3.payload, b"IJ\n");
        },
    );
}

#[async_std::test]
async fn ask_assembles_matching_response_and_sets_rmt() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (mut client, (mut sync, _asynch)) = futures::join!(
        async { Client::connect(addr, DEFAULT_VENDOR_ID, "hislip0").await.unwrap() },
        accept_handshake(&listener, 0, 1),
    );

    let (result, _) = futures::join!(
        async { client.ask(b"*IDN?\n", 1000).await.unwrap() },
        async {
            let request = read_frame(&mut sync).await;
            assert_eq!(request.message_type, DATA_END);
            let id = request.message_parameter;

            write_frame(&mut sync, DATA, 0, id, b"ACME,").await;
            write_frame(&mut sync, DATA_END, 0, id, b"X1\n").await;
        },
    );

    assert_eq!(result, b"ACME,X1\n");
    assert!(client.rmt_delivered());
}

#[async_std::test]
async fn ask_accepts_unknown_id_sentinel_when_synchronized() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // overlap_mode = 0 (synchronized)
    let (mut client, (mut sync, _asynch)) = futures::join!(
        async { Client::connect(addr, DEFAULT_VENDOR_ID, "hislip0").await.unwrap() },
        accept_handshake(&listener, 0, 1),
    );

    let (result, _) = futures::join!(
        async { client.ask(b"*IDN?\n", 1000).await.unwrap() },
        async {
            let _request = read_frame(&mut sync).await;
            write_frame(&mut sync, DATA_END, 0, UNKNOWN_MESSAGE_ID, b"OK\n").await;
        },
    );

    assert_eq!(result, b"OK\n");
}

#[async_std::test]
async fn ask_discards_unknown_id_sentinel_when_overlapped() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // overlap_mode = 1 (overlapped)
    let (mut client, (mut sync, _asynch)) = futures::join!(
        async { Client::connect(addr, DEFAULT_VENDOR_ID, "hislip0").await.unwrap() },
        accept_handshake(&listener, 1, 1),
    );

    let (result, _) = futures::join!(
        async { client.ask(b"*IDN?\n", 1000).await.unwrap() },
        async {
            let _request = read_frame(&mut sync).await;
            write_frame(&mut sync, DATA_END, 0, UNKNOWN_MESSAGE_ID, b"OK\n").await;
        },
    );

    assert_eq!(result, Vec::<u8>::new());
}
