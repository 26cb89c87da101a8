use anyhow::{Context, Result};
use std::time::Duration;

const USAGE: &str = "Uso: pingrs <host> [-c <count>] [-i <ms>] [-p <payload>] [--no-verify]";

pub struct PingArgs {
    pub host: String,
    pub count: Option<u64>,
    pub interval: Option<Duration>,
    pub payload: Option<String>,
    pub verify_checksum: bool,
}

pub fn parse() -> Result<PingArgs> {
    parse_from(std::env::args().skip(1))
}

fn parse_from(args: impl IntoIterator<Item = String>) -> Result<PingArgs> {
    let args: Vec<String> = args.into_iter().collect();
    let mut host = None;
    let mut count = None;
    let mut interval = None;
    let mut payload = None;
    let mut verify_checksum = true;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            flag @ ("-c" | "-i" | "-p") => {
                let val = args
                    .get(i + 1)
                    .with_context(|| format!("Faltou o valor para {}", flag))?;
                match flag {
                    "-c" => {
                        let c: u64 = val.parse().context("Valor inválido para -c")?;
                        anyhow::ensure!(c > 0, "A contagem precisa ser maior que zero");
                        count = Some(c);
                    }
                    "-i" => {
                        let ms: u64 = val.parse().context("Valor inválido para -i")?;
                        anyhow::ensure!(ms > 0, "O intervalo precisa ser maior que zero");
                        interval = Some(Duration::from_millis(ms));
                    }
                    _ => payload = Some(val.clone()),
                }
                i += 1;
            }
            "--no-verify" => verify_checksum = false,
            val => {
                if host.is_none() {
                    host = Some(val.to_string());
                }
            }
        }
        i += 1;
    }

    let host = host.context(USAGE)?;

    Ok(PingArgs {
        host,
        count,
        interval,
        payload,
        verify_checksum,
    })
}
