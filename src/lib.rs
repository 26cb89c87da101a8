//! Cliente ICMP Echo ("ping") para IPv4.
//!
//! O núcleo não faz I/O: [`icmp`] monta e lê os pacotes, [`session`] casa
//! respostas com requests e decide timeouts. O binário `pingrs` liga isso a
//! um socket RAW e a um relógio de 1 segundo.

pub mod checksum;
pub mod config;
pub mod icmp;
pub mod ip;
pub mod session;

pub use config::SessionConfig;
pub use icmp::{DecodeError, EchoMessage, Timestamp, decode_echo_message, encode_echo_request};
pub use session::{Event, Probe, ProbeState, ReplyStatus, Session, Transport};
