use crate::input::{Action, ChatInput};
use crate::render::{render, render_echo};
use log::{debug, error, info, warn};
use shared::{ChatError, Message, WireFormat, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    wire: WireFormat,
    input: ChatInput,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        bind_addr: &str,
        wire: WireFormat,
        input: ChatInput,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind(bind_addr).await?;
        let server_addr = server_addr.parse()?;
        info!("Client socket bound to {}", socket.local_addr()?);

        Ok(Client {
            socket,
            server_addr,
            wire,
            input,
        })
    }

    async fn send_message(&self, message: &Message) -> Result<(), ChatError> {
        let data = self.wire.encode(message)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    /// Applies the actions produced by one input line
    ///
    /// Returns false once the user asked to quit.
    async fn apply(&self, actions: Vec<Action>) -> bool {
        let mut sent = true;
        for action in actions {
            match action {
                Action::Send(message) => {
                    // Lossy transport: report and keep going
                    sent = match self.send_message(&message).await {
                        Ok(()) => true,
                        Err(ChatError::MalformedMessage(e)) => {
                            println!("Not sent: {}", e);
                            false
                        }
                        Err(e) => {
                            error!("Failed to send {} message: {}", message.kind, e);
                            false
                        }
                    };
                }
                Action::LocalEcho(message) if sent => println!("{}", render_echo(&message)),
                Action::LocalEcho(_) => {}
                Action::Notice(text) => println!("{}", text),
                Action::Quit => return false,
            }
        }
        true
    }

    fn handle_datagram(&self, bytes: &[u8], addr: SocketAddr) {
        match self.wire.decode(bytes) {
            Ok(message) => {
                debug!("Received {} from {}", message.kind, addr);
                for line in render(&message, self.input.id()) {
                    println!("{}", line);
                }
            }
            Err(e) => warn!("Ignoring datagram from {}: {}", addr, e),
        }
    }

    /// Joins, then relays stdin lines and incoming datagrams until `/q` or EOF
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Joining {} as {}", self.server_addr, self.input.id());
        self.send_message(&self.input.join_message()).await?;
        println!("Mode {} (type /g, /r, /w:<id>, /j:<room>, /l, /q)", self.input.mode_label());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        // One spare byte so a truncated datagram decodes as oversized
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE + 1];

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            let actions = self.input.submit(&line);
                            if !self.apply(actions).await {
                                break;
                            }
                        }
                        Ok(None) => {
                            self.send_message(&self.input.leave_message()).await?;
                            break;
                        }
                        Err(e) => {
                            error!("Failed to read input: {}", e);
                            self.send_message(&self.input.leave_message()).await?;
                            break;
                        }
                    }
                },

                received = self.socket.recv_from(&mut buffer) => {
                    match received {
                        Ok((len, addr)) => self.handle_datagram(&buffer[..len], addr),
                        Err(e) => error!("Error receiving datagram: {}", e),
                    }
                },
            }
        }

        info!("Left the chat");
        Ok(())
    }
}
