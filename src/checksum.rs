//! Checksum da Internet (RFC 1071), usado pelo ICMP.

/// Soma em complemento de um, já dobrada para 16 bits.
fn folded_sum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = data.chunks_exact(2);
    for w in &mut words {
        sum = sum.wrapping_add(u16::from_be_bytes([w[0], w[1]]) as u32);
    }
    // Byte final ímpar vira uma palavra com o byte baixo zerado
    if let Some(&last) = words.remainder().first() {
        sum = sum.wrapping_add((last as u32) << 8);
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// Calcula o checksum ICMP (RFC 792) sobre `data`.
///
/// O campo de checksum dentro de `data` deve estar zerado.
pub fn checksum(data: &[u8]) -> u16 {
    !folded_sum(data)
}

/// Escreve `value` em big-endian na posição `offset`.
///
/// Só deve ser chamado depois que todos os outros campos já estiverem no buffer.
pub fn write_checksum(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

/// Confere um buffer que já carrega o seu checksum: a soma tem que dar 0xFFFF.
pub fn verify(data: &[u8]) -> bool {
    folded_sum(data) == 0xFFFF
}
