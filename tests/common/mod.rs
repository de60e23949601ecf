//! Wire-level helpers for scripting a mock HiSLIP peer in integration
//! tests. Deliberately independent of the crate's internal codec: these
//! tests drive the public `Client` API against raw bytes on the wire, the
//! way an external test of a protocol client has to.

use async_std::io::{ReadExt, WriteExt};
use async_std::net::{TcpListener, TcpStream};

pub const INITIALIZE: u8 = 0;
pub const INITIALIZE_RESPONSE: u8 = 1;
pub const FATAL_ERROR: u8 = 2;
pub const ASYNC_LOCK: u8 = 4;
pub const ASYNC_LOCK_RESPONSE: u8 = 5;
pub const DATA: u8 = 6;
pub const DATA_END: u8 = 7;
pub const DEVICE_CLEAR_COMPLETE: u8 = 8;
pub const DEVICE_CLEAR_ACK: u8 = 9;
pub const ASYNC_REMOTE_LOCAL_CONTROL: u8 = 10;
pub const ASYNC_REMOTE_LOCAL_RESPONSE: u8 = 11;
pub const ASYNC_MAX_MSG_SIZE: u8 = 15;
pub const ASYNC_MAX_MSG_SIZE_RESPONSE: u8 = 16;
pub const ASYNC_INITIALIZE: u8 = 17;
pub const ASYNC_INITIALIZE_RESPONSE: u8 = 18;
pub const ASYNC_DEVICE_CLEAR: u8 = 19;
pub const ASYNC_DEVICE_CLEAR_ACK: u8 = 23;
pub const ASYNC_STATUS_QUERY: u8 = 21;
pub const ASYNC_STATUS_RESPONSE: u8 = 22;
pub const ASYNC_LOCK_INFO: u8 = 24;
pub const ASYNC_LOCK_INFO_RESPONSE: u8 = 25;

/// `0xFFFFFF00`, the id a fresh session starts from. Spelled out rather
/// than imported since tests only ever see the crate's public surface.
pub const INITIAL_MESSAGE_ID: u32 = 0xFFFFFF00;
pub const UNKNOWN_MESSAGE_ID: u32 = 0xFFFFFFFF;

pub struct Frame {
    pub message_type: u8,
    pub control_code: u8,
    pub message_parameter: u32,
    pub payload: Vec<u8>,
}

pub async fn read_frame(stream: &mut TcpStream) -> Frame {
    let mut header = [0u8; 16];
    stream.read_exact(&mut header).await.unwrap();
    assert_eq!(&header[0..2], b"HS", "bad prologue");

    let message_type = header[2];
    let control_code = header[3];
    let message_parameter = u32::from_be_bytes(header[4..8].try_into().unwrap());
    let payload_length = u64::from_be_bytes(header[8..16].try_into().unwrap()) as usize;

    let mut payload = vec![0u8; payload_length];
    if payload_length > 0 {
        stream.read_exact(&mut payload).await.unwrap();
    }

    Frame { message_type, control_code, message_parameter, payload }
}

pub async fn write_frame(
    stream: &mut TcpStream,
    message_type: u8,
    control_code: u8,
    message_parameter: u32,
    payload: &[u8],
) {
    let mut buf = Vec::with_capacity(16 + payload.len());
    buf.extend_from_slice(b"HS");
    buf.push(message_type);
    buf.push(control_code);
    buf.extend_from_slice(&message_parameter.to_be_bytes());
    buf.extend_from_slice(&(payload.len() as u64).to_be_bytes());
    buf.extend_from_slice(payload);
    stream.write_all(&buf).await.unwrap();
    stream.flush().await.unwrap();
}

/// Accept both connections of one session and run the handshake, replying
/// with the given `overlap` bit and `session_id`. Returns the two streams
/// so the caller can script whatever comes next.
pub async fn accept_handshake(
    listener: &TcpListener,
    overlap: u8,
    session_id: u16,
) -> (TcpStream, TcpStream) {
    let (mut sync, _) = listener.accept().await.unwrap();
    let init = read_frame(&mut sync).await;
    assert_eq!(init.message_type, INITIALIZE);
    assert_eq!(init.payload, b"hislip0");

    let parameter = (0x0101u32 << 16) | session_id as u32;
    write_frame(&mut sync, INITIALIZE_RESPONSE, overlap, parameter, &[]).await;

    let (mut asynch, _) = listener.accept().await.unwrap();
    let async_init = read_frame(&mut asynch).await;
    assert_eq!(async_init.message_type, ASYNC_INITIALIZE);
    assert_eq!(async_init.message_parameter, session_id as u32);

    write_frame(&mut asynch, ASYNC_INITIALIZE_RESPONSE, 0, 0x5a4c, &[]).await;

    (sync, asynch)
}

/// Server side of one `set_max_message_size` exchange: read the request,
/// assert the requested size, reply with `reply`.
pub async fn serve_max_size(asynch: &mut TcpStream, requested: u64, reply: u64) {
    let request = read_frame(asynch).await;
    assert_eq!(request.message_type, ASYNC_MAX_MSG_SIZE);
    assert_eq!(u64::from_be_bytes(request.payload.clone().try_into().unwrap()), requested);
    write_frame(asynch, ASYNC_MAX_MSG_SIZE_RESPONSE, 0, 0, &reply.to_be_bytes()).await;
}
