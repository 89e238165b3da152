use std::env::args;
use std::process::exit;

use tokio_jabber::{
    client_login, home_server_addrs, ClientConfig, Jid, Message, MessageType, Presence, Show,
    Stanza, Stream, StreamConfig,
};

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = args().collect();
    if args.len() != 3 {
        println!("Usage: {} <jid> <password>", args[0]);
        exit(1);
    }
    let jid: Jid = args[1].parse().expect("invalid JID");
    let password = &args[2];

    let addrs = home_server_addrs(&jid).await.expect("DNS lookup failed");
    let stream = Stream::connect(
        &addrs[0],
        StreamConfig {
            log_stanzas: true,
        },
    )
    .await
    .expect("connection failed");

    let session = client_login(stream, jid, password, ClientConfig::default())
        .await
        .expect("login failed");
    println!("online at {}", session.jid());

    session
        .send(Presence::available(Some(Show::Chat), "Echoing messages."))
        .await
        .unwrap();

    while let Some(received) = session.recv().await {
        let message = match received {
            Ok(Stanza::Message(message)) => message,
            Ok(_) => continue,
            Err(e) => {
                eprintln!("stream failed: {}", e);
                break;
            }
        };
        let (from, body) = match (&message.from, message.body()) {
            (Some(from), Some(body)) => (from.clone(), body.to_owned()),
            _ => continue,
        };
        if body == "die" {
            println!("secret die command triggered by {}", from);
            break;
        }
        if message.type_ != MessageType::Error {
            session.send(Message::chat(from, &body)).await.unwrap();
        }
    }

    session.close().await;
}
