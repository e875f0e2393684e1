//! Handshake and the mirror loop shared by both ends of a bridge.

use crate::broker::BrokerHandle;
use crate::error::{BrokerError, BrokerResult};
use crate::subscription::{InstanceId, PageEvent, Subscription};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use pagewire_core::Page;
use pagewire_protocol::{BridgeMessage, Direction, BRIDGE_PATH};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) type ClientStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Builds the WebSocket address for a peer. Bare `host:port` means `ws://`.
pub(crate) fn peer_address(host: &str) -> String {
    let base = host.trim_end_matches('/');
    if base.contains("://") {
        format!("{base}{BRIDGE_PATH}")
    } else {
        format!("ws://{base}{BRIDGE_PATH}")
    }
}

/// Connects to `host` and completes the hello/welcome handshake.
pub(crate) async fn connect(
    host: &str,
    url: &str,
    direction: Direction,
    timeout: Duration,
) -> BrokerResult<ClientStream> {
    tokio::time::timeout(timeout, handshake(host, url, direction))
        .await
        .map_err(|_| BrokerError::connect_failed(host, "timed out"))?
}

async fn handshake(host: &str, url: &str, direction: Direction) -> BrokerResult<ClientStream> {
    let (mut ws, _response) = connect_async(peer_address(host))
        .await
        .map_err(|e| BrokerError::connect_failed(host, e))?;

    send(&mut ws, &BridgeMessage::hello(url, direction)).await?;
    let reply = next_message(&mut ws)
        .await?
        .ok_or_else(|| BrokerError::connect_failed(host, "closed during handshake"))?;

    match reply {
        BridgeMessage::Error { message } => Err(BrokerError::connect_failed(host, message)),
        welcome => {
            welcome
                .accept_welcome()
                .map_err(|e| BrokerError::connect_failed(host, e))?;
            Ok(ws)
        }
    }
}

/// Answers a peer's hello. Returns the url and the direction from this
/// side's point of view.
pub(crate) async fn accept<S>(ws: &mut WebSocketStream<S>) -> BrokerResult<(String, Direction)>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let hello = next_message(ws)
        .await?
        .ok_or_else(|| BrokerError::ConnectionLost("closed during handshake".into()))?;

    match hello.accept_hello() {
        Ok((url, direction)) => {
            send(ws, &BridgeMessage::welcome()).await?;
            Ok((url, direction.reversed()))
        }
        Err(e) => {
            let _ = send(ws, &BridgeMessage::error(e.to_string())).await;
            let _ = ws.close(None).await;
            Err(e.into())
        }
    }
}

/// Mirrors `url` over an established connection until it drops or
/// `cancel` fires.
///
/// Returns `Ok` only on cancellation. With a sending direction the local
/// page is sent first as a batch of `set` ops, followed by every local
/// patch. With a receiving direction incoming patches are applied locally
/// and tagged with this session's subscriber id, so they are not sent back.
/// Patches that started on this broker are dropped, so a cycle of bridges
/// does not pass them around forever.
pub(crate) async fn mirror<S>(
    ws: WebSocketStream<S>,
    url: &str,
    direction: Direction,
    broker: &BrokerHandle,
    cancel: &CancellationToken,
) -> BrokerResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut outbound, mut inbound) = ws.split();
    let mut local = if direction.sends() {
        Some(broker.subscribe(url).await?)
    } else {
        None
    };
    let origin = local.as_ref().map(Subscription::id);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = outbound.send(Message::Close(None)).await;
                return Ok(());
            }
            event = next_local(&mut local) => {
                forward(&mut outbound, event?, broker.instance_id()).await?;
            }
            frame = inbound.next() => {
                let Some(message) = decode_frame(frame)? else {
                    continue;
                };
                match message {
                    BridgeMessage::Patch { .. } if direction.receives() => {
                        let source = message.origin();
                        if source == Some(broker.instance_id()) {
                            debug!(url, "dropping patch that started here");
                            continue;
                        }
                        let patch = message.into_patch()?;
                        if let Err(e) = broker.apply_from(url, patch, origin, source).await {
                            if matches!(e, BrokerError::Closed) {
                                return Err(e);
                            }
                            warn!(url, error = %e, "rejected patch from peer");
                        }
                    }
                    BridgeMessage::Patch { .. } => {
                        debug!(url, "ignoring patch on push-only bridge");
                    }
                    BridgeMessage::Error { message } => {
                        return Err(BrokerError::ConnectionLost(message));
                    }
                    other => {
                        return Err(BrokerError::ConnectionLost(format!(
                            "unexpected {} message",
                            other.kind()
                        )));
                    }
                }
            }
        }
    }
}

async fn next_local(local: &mut Option<Subscription>) -> BrokerResult<PageEvent> {
    match local {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

/// Sends a local event to the peer. Snapshots go out as this broker's own.
async fn forward<W>(outbound: &mut W, event: PageEvent, instance: InstanceId) -> BrokerResult<()>
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    match event {
        PageEvent::Snapshot(None) => Ok(()),
        PageEvent::Snapshot(Some(bytes)) => match Page::unmarshal(&bytes)?.to_patch() {
            Some(patch) => send(outbound, &BridgeMessage::patch(&patch, Some(instance))).await,
            None => Ok(()),
        },
        PageEvent::Patch { patch, source, .. } => {
            send(outbound, &BridgeMessage::patch(&patch, Some(source))).await
        }
    }
}

async fn send<W>(outbound: &mut W, message: &BridgeMessage) -> BrokerResult<()>
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    let text = message.encode()?;
    outbound
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| BrokerError::ConnectionLost(e.to_string()))
}

/// Reads the next protocol message, skipping control frames.
async fn next_message<R>(inbound: &mut R) -> BrokerResult<Option<BridgeMessage>>
where
    R: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        let frame = inbound.next().await;
        if frame.is_none() {
            return Ok(None);
        }
        if let Some(message) = decode_frame(frame)? {
            return Ok(Some(message));
        }
    }
}

/// Decodes one frame. `Ok(None)` means a frame with no protocol content.
fn decode_frame(frame: Option<Result<Message, WsError>>) -> BrokerResult<Option<BridgeMessage>> {
    match frame {
        None => Err(BrokerError::ConnectionLost("peer went away".into())),
        Some(Err(e)) => Err(BrokerError::ConnectionLost(e.to_string())),
        Some(Ok(Message::Text(text))) => Ok(Some(BridgeMessage::decode(text.as_str())?)),
        Some(Ok(Message::Close(_))) => Err(BrokerError::ConnectionLost("closed by peer".into())),
        Some(Ok(_)) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_address_forms() {
        assert_eq!(peer_address("127.0.0.1:9000"), "ws://127.0.0.1:9000/bridge");
        assert_eq!(peer_address("ws://peer:1/"), "ws://peer:1/bridge");
        assert_eq!(peer_address("wss://peer"), "wss://peer/bridge");
    }

    #[test]
    fn control_frames_are_skipped() {
        assert!(decode_frame(Some(Ok(Message::Ping(Default::default()))))
            .unwrap()
            .is_none());
        assert!(matches!(
            decode_frame(None),
            Err(BrokerError::ConnectionLost(_))
        ));
        assert!(matches!(
            decode_frame(Some(Ok(Message::Text("{}".to_string().into())))),
            Err(BrokerError::Protocol(_))
        ));
    }
}
