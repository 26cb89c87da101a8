//! Codificação do Echo Request e decodificação do datagrama IP/ICMP recebido.
//!
//! Layout da mensagem ICMP gerada (RFC 792):
//!
//! ```text
//!  0       1       2       3       4       5       6       7
//! +-------+-------+---------------+---------------+---------------+
//! | type  | code  |   checksum    |  identifier   |   sequence    |
//! +-------+-------+---------------+---------------+---------------+
//! |      segundos (u32 BE)        |   microssegundos (u32 BE)     |
//! +-------------------------------+-------------------------------+
//! |  payload ...
//! +-------------
//! ```

use std::borrow::Cow;
use std::net::Ipv4Addr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::{checksum, ip};

pub const ECHO_REQUEST: u8 = 8;
pub const ECHO_REPLY: u8 = 0;

/// Cabeçalho ICMP: type, code, checksum, identifier, sequence.
pub const HEADER_LEN: usize = 8;
/// Timestamp embutido logo depois do cabeçalho.
pub const TIMESTAMP_LEN: usize = 8;

const CHECKSUM_OFFSET: usize = 2;

/// Instante em ponto fixo desde a época UNIX.
///
/// Guardado como inteiro (resolução de microssegundos) para que o valor
/// lido de volta do pacote seja exatamente o que foi escrito.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub fn now() -> Self {
        // Relógio antes de 1970 não é um caso que vale tratar aqui
        Self(SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default())
    }

    pub const fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    pub const fn from_duration(d: Duration) -> Self {
        Self(d)
    }

    pub fn as_millis(&self) -> u128 {
        self.0.as_millis()
    }

    /// Tempo decorrido desde `earlier`; zero se o relógio andou para trás.
    pub fn saturating_since(&self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }

    /// Segundos inteiros (truncados para 32 bits) e o resto em microssegundos.
    fn to_wire(self) -> [u8; TIMESTAMP_LEN] {
        let secs = self.0.as_secs() as u32;
        let micros = self.0.subsec_micros();
        let mut out = [0u8; TIMESTAMP_LEN];
        out[..4].copy_from_slice(&secs.to_be_bytes());
        out[4..].copy_from_slice(&micros.to_be_bytes());
        out
    }

    /// Inverso de `to_wire`: segundos * 1000 + micros / 1000 em milissegundos.
    fn from_wire(secs: u32, micros: u32) -> Self {
        let d = Duration::from_secs(secs as u64) + Duration::from_micros(micros as u64);
        Self(d)
    }
}

/// Motivos para descartar um datagrama recebido.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("datagrama vazio")]
    Empty,
    #[error("IHL inválido: cabeçalho IP de {0} bytes")]
    BadHeaderLength(usize),
    #[error("datagrama truncado: {len} bytes, esperado pelo menos {needed}")]
    Truncated { len: usize, needed: usize },
    #[error("checksum ICMP inválido (campo {0:#06x})")]
    ChecksumMismatch(u16),
}

/// Mensagem Echo decodificada, junto com o que interessa do cabeçalho IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoMessage {
    pub kind: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
    /// TTL do cabeçalho IP, não do corpo ICMP.
    pub ttl: u8,
    pub source: Ipv4Addr,
    pub payload_time: Timestamp,
    pub payload: Vec<u8>,
    /// Tamanho da mensagem ICMP (datagrama sem o cabeçalho IP).
    pub size: usize,
}

impl EchoMessage {
    pub fn is_echo_reply(&self) -> bool {
        self.kind == ECHO_REPLY && self.code == 0
    }

    /// Payload como texto; sequências UTF-8 inválidas são substituídas.
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Monta um pacote ICMPv4 Echo Request (type=8, code=0) com o instante `now`
/// embutido antes do payload.
pub fn encode_echo_request(
    identifier: u16,
    sequence: u16,
    payload: &[u8],
    now: Timestamp,
) -> Vec<u8> {
    let mut pkt = Vec::with_capacity(HEADER_LEN + TIMESTAMP_LEN + payload.len());

    // Type=8, Code=0, checksum zerado até o final
    pkt.extend_from_slice(&[ECHO_REQUEST, 0, 0, 0]);
    pkt.extend_from_slice(&identifier.to_be_bytes());
    pkt.extend_from_slice(&sequence.to_be_bytes());

    pkt.extend_from_slice(&now.to_wire());
    pkt.extend_from_slice(payload);

    let csum = checksum::checksum(&pkt);
    checksum::write_checksum(&mut pkt, CHECKSUM_OFFSET, csum);

    pkt
}

/// Decodifica um datagrama IPv4 completo (cabeçalho IP + ICMP).
///
/// Com `verify_checksum` ligado, mensagens cujo checksum não fecha são
/// rejeitadas.
pub fn decode_echo_message(
    datagram: &[u8],
    verify_checksum: bool,
) -> Result<EchoMessage, DecodeError> {
    if datagram.is_empty() {
        return Err(DecodeError::Empty);
    }

    let offset = ip::header_len(datagram);
    if offset < ip::MIN_HEADER_LEN {
        return Err(DecodeError::BadHeaderLength(offset));
    }

    let needed = offset + HEADER_LEN + TIMESTAMP_LEN;
    if datagram.len() < needed {
        return Err(DecodeError::Truncated {
            len: datagram.len(),
            needed,
        });
    }

    let icmp = &datagram[offset..];
    let be16 = |at: usize| u16::from_be_bytes([icmp[at], icmp[at + 1]]);
    let be32 = |at: usize| {
        u32::from_be_bytes([icmp[at], icmp[at + 1], icmp[at + 2], icmp[at + 3]])
    };

    let csum = be16(CHECKSUM_OFFSET);
    if verify_checksum && !checksum::verify(icmp) {
        return Err(DecodeError::ChecksumMismatch(csum));
    }

    Ok(EchoMessage {
        kind: icmp[0],
        code: icmp[1],
        checksum: csum,
        identifier: be16(4),
        sequence: be16(6),
        ttl: ip::ttl(datagram),
        source: ip::source(datagram),
        payload_time: Timestamp::from_wire(be32(HEADER_LEN), be32(HEADER_LEN + 4)),
        payload: icmp[HEADER_LEN + TIMESTAMP_LEN..].to_vec(),
        size: icmp.len(),
    })
}
