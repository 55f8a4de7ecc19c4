// MKAI Console
// Copyright (c) 2026 Xing_The_Creator | SYNOID

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::io::{BufRead, Write};
use tracing::warn;

/// Result of waiting on the user at a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompted {
    Line(String),
    /// Ctrl-C while waiting.
    Interrupted,
    /// Input stream closed (EOF).
    Closed,
}

#[async_trait]
pub trait Console: Send + Sync {
    async fn read_line(&self, prompt: &str) -> Result<Prompted>;

    fn say(&self, line: &str);
}

/// Resolve when `signal` fires. A signal that could not be installed never fires.
pub async fn interrupt_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        warn!("[CONSOLE] Interrupt handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Terminal prompts on stdin/stdout.
#[derive(Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn read_line(&self, prompt: &str) -> Result<Prompted> {
        print!("{}", prompt);
        std::io::stdout().flush()?;

        let reader = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            let read = std::io::stdin().lock().read_line(&mut line)?;
            Ok::<_, std::io::Error>((read, line))
        });

        tokio::select! {
            result = reader => {
                let (read, line) = result??;
                if read == 0 {
                    return Ok(Prompted::Closed);
                }
                Ok(Prompted::Line(line.trim_end_matches(['\r', '\n']).to_string()))
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                Ok(Prompted::Interrupted)
            }
        }
    }

    fn say(&self, line: &str) {
        println!("{}", line);
    }
}
