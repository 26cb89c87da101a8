use std::time::Duration;

/// Payload padrão enviado em cada Echo Request.
pub const DEFAULT_PAYLOAD: &[u8] = b"Hi from custom ping!";

/// Parâmetros de uma sessão de ping.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Identificador ICMP; separa nossos pacotes do resto do tráfego ICMP do host.
    pub identifier: u16,
    /// Intervalo entre probes, que também é o prazo de cada uma.
    pub interval: Duration,
    pub payload: Vec<u8>,
    /// Rejeita respostas cujo checksum ICMP não fecha.
    pub verify_checksum: bool,
    /// Quantas sequências recentes ficam guardadas para casar respostas atrasadas.
    pub max_in_flight: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            // Usa o PID do processo (comum em pings)
            identifier: std::process::id() as u16,
            interval: Duration::from_millis(1000),
            payload: DEFAULT_PAYLOAD.to_vec(),
            verify_checksum: true,
            max_in_flight: 64,
        }
    }
}

impl SessionConfig {
    pub fn with_identifier(mut self, identifier: u16) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    pub fn with_max_in_flight(mut self, max: u16) -> Self {
        // Pelo menos a probe corrente precisa caber
        self.max_in_flight = max.max(1);
        self
    }

    /// Bytes de dados por pacote (timestamp + payload), como o ping mostra.
    pub fn data_len(&self) -> usize {
        crate::icmp::TIMESTAMP_LEN + self.payload.len()
    }
}
