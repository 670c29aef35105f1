use color_eyre::Result;
use log::{debug, info, warn};
use tokio::{
    io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
};

use crate::table::prelude::*;
use crate::table::protocol::{decode, encode, ServerMessage};

/// Connects to the authority and pumps frames both ways until either side
/// goes away. Frames are single JSON documents, one per line.
pub async fn run(
    addr: String,
    hello: Hello,
    inbound: UnboundedSender<ServerMessage>,
    mut outbound: UnboundedReceiver<ClientMessage>,
) -> Result<()> {
    let stream = TcpStream::connect(&addr).await?;
    info!("Connected to {addr} as {} in room {}", hello.player_id, hello.room_id);

    let (read_stream, mut write_stream) = stream.into_split();
    let mut lines = BufReader::new(read_stream).lines();
    send_frame(&mut write_stream, &ClientMessage::Hello(hello)).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !forward(&line, &inbound) {
                        info!("Client went away, closing connection");
                        return Ok(());
                    }
                }
                None => {
                    info!("Authority closed the connection");
                    return Ok(());
                }
            },
            message = outbound.recv() => match message {
                Some(message) => send_frame(&mut write_stream, &message).await?,
                None => {
                    info!("Client went away, closing connection");
                    return Ok(());
                }
            },
        }
    }
}

async fn send_frame<W: AsyncWrite + Unpin>(writer: &mut W, message: &ClientMessage) -> Result<()> {
    let mut frame = encode(message)?;
    debug!("-> {frame}");
    frame.push('\n');
    writer.write_all(frame.as_bytes()).await?;
    Ok(())
}

/// Hands one inbound line to the client. Undecodable frames are dropped.
/// Returns false once nobody is listening.
fn forward(line: &str, inbound: &UnboundedSender<ServerMessage>) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }
    match decode(line) {
        Ok(message) => inbound.send(message).is_ok(),
        Err(e) => {
            warn!("Dropping frame from authority: {e}");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (inbound_tx, mut inbound_rx) = unbounded_channel();
        let (outbound_tx, outbound_rx) = unbounded_channel();
        let hello = Hello { room_id: "TEST".to_string(), player_id: PlayerId::B, name: None, deck: None };
        let transport = tokio::spawn(run(addr, hello, inbound_tx, outbound_rx));

        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut server_lines = BufReader::new(read_half).lines();

        let greeting = server_lines.next_line().await.unwrap().unwrap();
        assert_eq!(greeting, r#"{"kind":"hello","room_id":"TEST","player_id":"B"}"#);

        // Garbage is skipped, the ack behind it still arrives
        write_half.write_all(b"not json\n\n{\"kind\":\"ack\",\"ok\":true}\n").await.unwrap();
        assert_eq!(inbound_rx.recv().await, Some(ServerMessage::Ack { ok: true, msg: None }));

        outbound_tx.send(ClientMessage::Action(ActionRequest::PassTurn {})).unwrap();
        let request = server_lines.next_line().await.unwrap().unwrap();
        assert_eq!(request, r#"{"kind":"action","type":"pass_turn","payload":{}}"#);

        drop(outbound_tx);
        transport.await.unwrap().unwrap();
    }

    #[test]
    fn test_forward_reports_closed_client() {
        let (inbound_tx, inbound_rx) = unbounded_channel();
        assert!(forward("  ", &inbound_tx));
        assert!(forward("{oops", &inbound_tx));
        drop(inbound_rx);
        assert!(!forward(r#"{"kind":"ack","ok":true}"#, &inbound_tx));
    }
}
