//! Transport: a single TLS connection to the receiver device. Once open,
//! the `Framed` sink/stream pair is split between exactly one writer task
//! and one reader task owned by the client facade's I/O loop — no internal
//! locking is required.
//!
//! Certificate chain validation stays disabled: the receiver presents a
//! self-signed certificate keyed to the device, and this is how the
//! protocol is actually spoken by third-party senders.

use std::net::SocketAddr;

use futures::stream::{SplitSink, SplitStream};
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_native_tls::{TlsConnector, TlsStream};
use tokio_util::codec::Framed;

use crate::codec::FrameCodec;
use crate::error::Error;
use crate::proto::CastMessage;

pub type FrameSink = SplitSink<Framed<TlsStream<TcpStream>, FrameCodec>, CastMessage>;
pub type FrameStream = SplitStream<Framed<TlsStream<TcpStream>, FrameCodec>>;

/// Resolve, connect and TLS-handshake to `addr`, returning the framed
/// sink/stream halves ready for the I/O task to drive.
pub async fn open(addr: SocketAddr, max_frame_len: usize) -> Result<(FrameSink, FrameStream), Error> {
    let tcp = TcpStream::connect(addr)
        .await
        .map_err(|err| Error::Connection(format!("TCP connect to {addr} failed: {err}")))?;

    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|err| Error::Connection(format!("failed to build TLS connector: {err}")))?;
    let connector = TlsConnector::from(connector);

    info!("establishing TLS connection to {}", addr);
    let tls = connector
        .connect(&addr.ip().to_string(), tcp)
        .await
        .map_err(|err| Error::Connection(format!("TLS handshake with {addr} failed: {err}")))?;

    let framed = Framed::new(tls, FrameCodec::new(max_frame_len));
    Ok(framed.split())
}
