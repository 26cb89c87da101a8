//! Leitura do cabeçalho IPv4 que o socket RAW entrega junto com o ICMP.

use std::net::Ipv4Addr;

/// Menor cabeçalho IPv4 válido (IHL = 5).
pub const MIN_HEADER_LEN: usize = 20;

/// Tamanho do cabeçalho IP em bytes: IHL (4 bits baixos do byte 0) * 4.
///
/// Varia de 20 a 60 por causa das opções IP, então o ICMP não começa
/// necessariamente no byte 20.
pub fn header_len(buf: &[u8]) -> usize {
    (buf[0] & 0x0F) as usize * 4
}

/// TTL no offset fixo 8, antes de qualquer opção.
pub fn ttl(buf: &[u8]) -> u8 {
    buf[8]
}

/// Endereço de origem (bytes 12..16).
pub fn source(buf: &[u8]) -> Ipv4Addr {
    Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15])
}
