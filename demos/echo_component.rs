use std::env::args;
use std::process::exit;

use tokio_jabber::{
    component_login, Iq, IqType, Jid, Message, MessageType, Stanza, Stream, StreamConfig,
};
use tokio_jabber::payload::{DiscoIdentity, DiscoInfo};

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = args().collect();
    if args.len() < 3 || args.len() > 4 {
        println!("Usage: {} <jid> <secret> [server:port]", args[0]);
        exit(1);
    }
    let jid: Jid = args[1].parse().expect("invalid JID");
    let secret = &args[2];
    let addr = args.get(3).map(String::as_str).unwrap_or("127.0.0.1:5347");

    let stream = Stream::connect(
        addr,
        StreamConfig {
            log_stanzas: true,
        },
    )
    .await
    .expect("connection failed");
    let session = component_login(stream, jid, secret)
        .await
        .expect("handshake failed");
    println!("online as {}", session.jid());

    while let Some(received) = session.recv().await {
        match received {
            Ok(Stanza::Message(message)) => {
                let (from, to) = match (&message.from, &message.to) {
                    (Some(from), Some(to)) => (from.clone(), to.clone()),
                    _ => continue,
                };
                if message.type_ == MessageType::Error {
                    continue;
                }
                if let Some(body) = message.body() {
                    let mut reply = Message::chat(from, body);
                    // components address their stanzas explicitly
                    reply.from = Some(to);
                    session.send(reply).await.unwrap();
                }
            }
            Ok(Stanza::Iq(iq)) if iq.type_ == IqType::Get => {
                let mut reply = iq.response(IqType::Result);
                match iq.payload_name() {
                    Some((ref ns, _)) if ns == tokio_jabber::ns::DISCO_INFO => {
                        reply
                            .payload_encode(DiscoInfo {
                                node: None,
                                identities: vec![DiscoIdentity {
                                    category: "component".to_owned(),
                                    type_: "generic".to_owned(),
                                    name: Some("Echo component".to_owned()),
                                }],
                                features: vec![],
                            })
                            .unwrap();
                    }
                    _ => {
                        reply.type_ = IqType::Error;
                        reply.error = Some(tokio_jabber::StanzaError::new(
                            tokio_jabber::ErrorType::Cancel,
                            tokio_jabber::ErrorCondition::FeatureNotImplemented,
                            "",
                        ));
                    }
                }
                session.send(reply).await.unwrap();
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("stream failed: {}", e);
                break;
            }
        }
    }

    session.close().await;
}
