use std::io;
use std::time::Duration;

use pingrs_session::{
    Event, ReplyStatus, Session, SessionConfig, Timestamp, Transport, checksum,
    decode_echo_message, encode_echo_request,
};

#[derive(Default)]
struct Wire {
    sent: Vec<Vec<u8>>,
}

impl Transport for Wire {
    fn send(&mut self, packet: &[u8]) -> io::Result<usize> {
        self.sent.push(packet.to_vec());
        Ok(packet.len())
    }
}

/// O que um host remoto devolveria: type 0, checksum refeito, IPv4 com opções.
fn echo_back(request: &[u8], ttl: u8) -> Vec<u8> {
    let mut icmp = request.to_vec();
    icmp[0] = 0;
    icmp[2..4].copy_from_slice(&[0, 0]);
    let c = checksum::checksum(&icmp);
    checksum::write_checksum(&mut icmp, 2, c);

    let mut dgram = vec![0u8; 28];
    dgram[0] = 0x47;
    dgram[8] = ttl;
    dgram[9] = 1;
    dgram[12..16].copy_from_slice(&[203, 0, 113, 9]);
    dgram.extend_from_slice(&icmp);
    dgram
}

#[test]
fn round_trip_with_minimal_ip_header() {
    let t = Timestamp::from_millis(1_000_000);
    let pkt = encode_echo_request(1111, 0, b"Hi from custom ping!", t);
    assert!(checksum::verify(&pkt));

    let mut dgram = vec![0x45];
    dgram.resize(20, 0);
    dgram[8] = 64;
    dgram.extend_from_slice(&pkt);

    let msg = decode_echo_message(&dgram, true).unwrap();
    assert_eq!(msg.ttl, 64);
    assert_eq!(msg.identifier, 1111);
    assert_eq!(msg.sequence, 0);
    assert_eq!(msg.payload, b"Hi from custom ping!");
    assert_eq!(msg.payload_time.as_millis(), 1_000_000);
}

#[test]
fn mixed_run_over_borrowed_transport() {
    let mut wire = Wire::default();
    let config = SessionConfig::default()
        .with_identifier(0xBEEF)
        .with_payload("abc")
        .with_interval(Duration::from_millis(500));
    let mut session = Session::new(config, &mut wire);

    // seq 0 respondida no prazo, seq 1 perdida e respondida depois do prazo
    session.start(Timestamp::from_millis(10_000));
    let first = session.transport().sent[0].clone();
    session.on_datagram(&echo_back(&first, 50), Timestamp::from_millis(10_042));
    session.on_tick(Timestamp::from_millis(10_500));

    match session.poll_event() {
        Some(Event::Reply {
            sequence,
            rtt,
            ttl,
            source,
            size,
            status,
        }) => {
            assert_eq!(sequence, 0);
            assert_eq!(rtt, Duration::from_millis(42));
            assert_eq!(ttl, 50);
            assert_eq!(source.octets(), [203, 0, 113, 9]);
            assert_eq!(size, 8 + 8 + 3);
            assert_eq!(status, ReplyStatus::OnTime);
        }
        other => panic!("esperava Reply, veio {:?}", other),
    }
    assert!(session.poll_event().is_none());

    // Nenhuma resposta para seq 1: o tick seguinte o julga
    session.on_tick(Timestamp::from_millis(11_000));
    assert!(matches!(session.poll_event(), Some(Event::Timeout { sequence: 1 })));

    let second = session.transport().sent[1].clone();
    session.on_datagram(&echo_back(&second, 50), Timestamp::from_millis(11_100));
    match session.poll_event() {
        Some(Event::Reply { sequence, rtt, status, .. }) => {
            assert_eq!(sequence, 1);
            assert_eq!(rtt, Duration::from_millis(600));
            assert_eq!(status, ReplyStatus::Late);
        }
        other => panic!("esperava Reply atrasado, veio {:?}", other),
    }

    drop(session);
    assert_eq!(wire.sent.len(), 3);
}
