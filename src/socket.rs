// Criação e configuração de sockets de baixo nível
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use anyhow::{Context, Result};
use std::io::{self, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use pingrs_session::Transport;

/// Socket ICMP RAW apontado para um único destino.
pub struct RawSocket {
    sock: Socket,
    dst: SockAddr,
}

impl RawSocket {
    /// Requer root/CAP_NET_RAW no Linux ou Administrador no Windows.
    pub fn open(dst: Ipv4Addr) -> Result<Self> {
        let sock = Socket::new(Domain::IPV4, raw_type(), Some(Protocol::ICMPV4))
            .context(
                "Falha ao criar socket RAW. Verifique se está rodando com privilégios de administrador.",
            )?;

        // Porta 0 é ignorada para ICMP
        let dst = SocketAddr::new(IpAddr::V4(dst), 0).into();
        Ok(Self { sock, dst })
    }

    /// Lê um datagrama IP inteiro, esperando no máximo `timeout`.
    pub fn recv(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        // Timeout zero significaria "sem timeout" para o SO
        let timeout = timeout.max(Duration::from_millis(1));
        self.sock.set_read_timeout(Some(timeout))?;
        self.sock.read(buf)
    }
}

impl Transport for RawSocket {
    fn send(&mut self, packet: &[u8]) -> io::Result<usize> {
        self.sock.send_to(packet, &self.dst)
    }
}

#[cfg(unix)]
fn raw_type() -> Type {
    Type::from(libc::SOCK_RAW)
}

// libc::SOCK_RAW não existe no Windows; lá o valor também é 3
#[cfg(not(unix))]
fn raw_type() -> Type {
    Type::from(3)
}

/// Resolve `host` para o primeiro endereço IPv4.
pub fn resolve(host: &str) -> Result<Ipv4Addr> {
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return Ok(addr);
    }

    let addrs = (host, 0)
        .to_socket_addrs()
        .with_context(|| format!("Não foi possível resolver {}", host))?;

    addrs
        .filter_map(|sa| match sa.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .next()
        .with_context(|| format!("{} não tem endereço IPv4", host))
}
