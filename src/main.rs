// Tratamento de erros ergonômico
use anyhow::{Context, Result};

// Logs controlados por RUST_LOG
use log::{error, info};

// Erros de I/O (timeout, would-block, etc.)
use std::io;

// Sinalização do Ctrl+C
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// Cadência dos ticks
use std::time::{Duration, Instant};

use pingrs_session::{Event, ReplyStatus, Session, SessionConfig, Timestamp, icmp};

// Módulos locais
mod args;
mod socket;

use socket::RawSocket;

/// Programa principal: um Echo Request por intervalo, respostas casadas pela sessão.
/// Requer privilégios de root/Administrador (Raw Sockets).
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    // Parsing de argumentos via módulo args
    let args = args::parse()?;
    let dst = socket::resolve(&args.host)?;

    // Configura handler para Ctrl+C
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Erro ao configurar handler de Ctrl+C")?;

    let mut config = SessionConfig::default().with_verify_checksum(args.verify_checksum);
    if let Some(interval) = args.interval {
        config = config.with_interval(interval);
    }
    if let Some(payload) = args.payload {
        config = config.with_payload(payload);
    }
    let interval = config.interval;

    let sock = RawSocket::open(dst)?;

    println!("PING {} ({}): {} bytes de dados", args.host, dst, config.data_len());
    info!("identificador ICMP {}", config.identifier);

    let mut session = Session::new(config, sock);
    session.start(Timestamp::now());
    let mut sent = 1u64;
    print_events(&mut session);

    // Buffer de recepção: cabe o reply inteiro mesmo com payload grande
    let mut buf = vec![0u8; recv_buffer_len(session.config().data_len())];
    let mut next_tick = Instant::now() + interval;

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= next_tick {
            // Verifica limite de contagem se houver
            if args.count.is_some_and(|limit| sent >= limit) {
                session.finish();
                print_events(&mut session);
                break;
            }
            session.on_tick(Timestamp::now());
            sent += 1;
            next_tick = next_deadline(next_tick, Instant::now(), interval);
            print_events(&mut session);
            continue;
        }

        match session.transport_mut().recv(&mut buf, next_tick - now) {
            Ok(n) => session.on_datagram(&buf[..n], Timestamp::now()),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) => {}
            Err(e) => {
                // Erro fatal no socket: encerra a sessão
                error!("Erro na leitura: {}", e);
                return Err(e).context("Socket RAW falhou");
            }
        }
        print_events(&mut session);
    }

    Ok(())
}

/// Próximo tick. Depois de uma parada (Ctrl+Z, suspensão) os ticks perdidos
/// são pulados em vez de disparados em sequência.
fn next_deadline(prev: Instant, now: Instant, interval: Duration) -> Instant {
    (prev + interval).max(now + interval)
}

/// Maior cabeçalho IP (60) + cabeçalho ICMP (8) + dados, nunca menos que a MTU típica.
fn recv_buffer_len(data_len: usize) -> usize {
    (60 + icmp::HEADER_LEN + data_len).max(1500)
}

fn print_events(session: &mut Session<RawSocket>) {
    while let Some(event) = session.poll_event() {
        match event {
            Event::Reply {
                sequence,
                rtt,
                ttl,
                source,
                size,
                status,
            } => {
                let suffix = match status {
                    ReplyStatus::OnTime | ReplyStatus::Untracked => "",
                    ReplyStatus::Late => " (atrasado)",
                    ReplyStatus::Duplicate => " (DUP!)",
                };
                println!(
                    "{} bytes de {}: icmp_seq={} ttl={} tempo={:.3} ms{}",
                    size,
                    source,
                    sequence,
                    ttl,
                    rtt.as_secs_f64() * 1000.0,
                    suffix
                );
            }
            Event::Timeout { sequence } => {
                println!("Esgotado o tempo limite do pedido icmp_seq={}", sequence);
            }
            Event::TransportError { sequence, error } => {
                println!("Falha ao enviar icmp_seq={}: {}", sequence, error);
            }
        }
    }
}
