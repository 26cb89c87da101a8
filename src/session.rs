//! Máquina de estados da sessão de ping.
//!
//! A sessão não faz I/O por conta própria: envia pelo [`Transport`] que recebe,
//! é alimentada com datagramas e ticks pelo laço de eventos, e deixa os
//! resultados numa fila de [`Event`] para o chamador consumir.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

use log::{debug, trace};

use crate::config::SessionConfig;
use crate::icmp::{self, Timestamp};

/// Quem efetivamente coloca o pacote na rede.
pub trait Transport {
    fn send(&mut self, packet: &[u8]) -> io::Result<usize>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, packet: &[u8]) -> io::Result<usize> {
        (**self).send(packet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Sent,
    Replied,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub sent_at: Timestamp,
    pub state: ProbeState,
}

/// Como uma resposta se encaixa no que foi enviado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// Chegou antes do prazo da probe.
    OnTime,
    /// Chegou depois que a probe já tinha sido dada como perdida.
    Late,
    /// Segunda resposta para a mesma sequência.
    Duplicate,
    /// Sequência que não está mais (ou nunca esteve) na tabela.
    Untracked,
}

#[derive(Debug)]
pub enum Event {
    Reply {
        sequence: u16,
        rtt: Duration,
        ttl: u8,
        source: Ipv4Addr,
        /// Bytes da mensagem ICMP recebida.
        size: usize,
        status: ReplyStatus,
    },
    Timeout {
        sequence: u16,
    },
    TransportError {
        sequence: u16,
        error: io::Error,
    },
}

pub struct Session<T> {
    config: SessionConfig,
    transport: T,
    next_sequence: u16,
    /// Última sequência enviada; é a única julgada no próximo tick.
    current: Option<u16>,
    in_flight: HashMap<u16, Probe>,
    events: VecDeque<Event>,
}

impl<T: Transport> Session<T> {
    pub fn new(config: SessionConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            next_sequence: 0,
            current: None,
            in_flight: HashMap::new(),
            events: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn identifier(&self) -> u16 {
        self.config.identifier
    }

    /// Sequência da probe que aguarda julgamento, se alguma já foi enviada.
    pub fn current_sequence(&self) -> Option<u16> {
        self.current
    }

    pub fn probe(&self, sequence: u16) -> Option<&Probe> {
        self.in_flight.get(&sequence)
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    /// Envia a primeira probe (sequência 0). Não faz nada se a sessão já começou.
    pub fn start(&mut self, now: Timestamp) -> Option<u16> {
        if self.current.is_some() {
            return None;
        }
        Some(self.send_next(now))
    }

    /// Monta e envia o Echo Request da próxima sequência e devolve o número usado.
    ///
    /// Falha de envio vira [`Event::TransportError`], mas a probe continua
    /// registrada e será julgada no próximo tick como qualquer outra.
    pub fn send_next(&mut self, now: Timestamp) -> u16 {
        let seq = self.next_sequence;
        self.next_sequence = seq.wrapping_add(1);
        self.current = Some(seq);

        let pkt = icmp::encode_echo_request(self.config.identifier, seq, &self.config.payload, now);
        self.in_flight.insert(
            seq,
            Probe {
                sent_at: now,
                state: ProbeState::Sent,
            },
        );
        self.prune(seq);

        match self.transport.send(&pkt) {
            Ok(n) => trace!("icmp_seq={} enviado ({} bytes)", seq, n),
            Err(error) => {
                debug!("Falha ao enviar icmp_seq={}: {}", seq, error);
                self.events.push_back(Event::TransportError { sequence: seq, error });
            }
        }

        seq
    }

    /// Processa um datagrama IP recebido do socket.
    ///
    /// Tráfego ICMP que não é um Echo Reply nosso é descartado sem evento.
    pub fn on_datagram(&mut self, datagram: &[u8], now: Timestamp) {
        let msg = match icmp::decode_echo_message(datagram, self.config.verify_checksum) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("Datagrama descartado: {}", e);
                return;
            }
        };

        if msg.identifier != self.config.identifier || !msg.is_echo_reply() {
            return;
        }

        let rtt = now.saturating_since(msg.payload_time);
        let status = match self.in_flight.get_mut(&msg.sequence) {
            Some(probe) => {
                let status = match probe.state {
                    ProbeState::Sent => ReplyStatus::OnTime,
                    ProbeState::TimedOut => ReplyStatus::Late,
                    ProbeState::Replied => ReplyStatus::Duplicate,
                };
                probe.state = ProbeState::Replied;
                status
            }
            None => ReplyStatus::Untracked,
        };

        self.events.push_back(Event::Reply {
            sequence: msg.sequence,
            rtt,
            ttl: msg.ttl,
            source: msg.source,
            size: msg.size,
            status,
        });
    }

    /// Chamado uma vez por intervalo: julga a probe corrente e envia a próxima.
    pub fn on_tick(&mut self, now: Timestamp) -> u16 {
        self.judge_current();
        self.send_next(now)
    }

    /// Julga a probe corrente sem enviar outra (fim de uma contagem `-c`).
    pub fn finish(&mut self) {
        self.judge_current();
    }

    fn judge_current(&mut self) {
        let Some(seq) = self.current else {
            return;
        };
        if let Some(probe) = self.in_flight.get_mut(&seq) {
            if probe.state == ProbeState::Sent {
                probe.state = ProbeState::TimedOut;
                self.events.push_back(Event::Timeout { sequence: seq });
            }
        }
    }

    /// Descarta entradas muito atrás de `newest`, levando em conta o wrap.
    fn prune(&mut self, newest: u16) {
        let max = self.config.max_in_flight.max(1);
        self.in_flight.retain(|&seq, _| newest.wrapping_sub(seq) < max);
    }
}
