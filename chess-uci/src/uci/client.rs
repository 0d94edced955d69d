//! UCI 引擎进程客户端
//!
//! 通过标准输入输出与引擎进程通信，所有读取都受超时限制。

use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use super::UciConfig;

/// UCI 引擎进程
pub struct UciClient {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    timeout: Duration,
}

impl UciClient {
    /// 启动引擎进程
    pub async fn spawn(config: &UciConfig) -> Result<Self> {
        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start engine {:?}", config.program))?;

        let stdin = child.stdin.take().context("Engine stdin unavailable")?;
        let stdout = child.stdout.take().context("Engine stdout unavailable")?;

        debug!("Started engine {:?}", config.program);
        Ok(Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// 发送一行命令
    pub async fn send(&mut self, command: &str) -> Result<()> {
        debug!(">> {}", command);
        self.stdin
            .write_all(format!("{}\n", command).as_bytes())
            .await
            .with_context(|| format!("Failed to send {:?} to engine", command))?;
        self.stdin.flush().await.context("Failed to flush engine stdin")?;
        Ok(())
    }

    /// 读取输出直到某一行满足条件（含该行）
    pub async fn read_until<F>(&mut self, done: F) -> Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        tokio::time::timeout(self.timeout, read_lines(&mut self.lines, done))
            .await
            .map_err(|_| anyhow!("Timed out after {:?} waiting for engine", self.timeout))?
    }

    /// uci / setoption / isready 握手
    pub async fn handshake(&mut self, options: &[(String, String)]) -> Result<()> {
        self.send("uci").await?;
        let lines = self.read_until(|line| line == "uciok").await?;
        if let Some(name) = lines.iter().find_map(|line| line.strip_prefix("id name ")) {
            info!("Connected to engine: {}", name);
        }

        for (name, value) in options {
            self.send(&format!("setoption name {} value {}", name, value))
                .await?;
        }

        self.send("isready").await?;
        self.read_until(|line| line == "readyok").await?;
        Ok(())
    }

    /// 通知引擎退出并等待进程结束
    pub async fn quit(mut self) {
        if let Err(e) = self.send("quit").await {
            warn!("Failed to send quit: {}", e);
        }
        match tokio::time::timeout(self.timeout, self.child.wait()).await {
            Ok(Ok(status)) => debug!("Engine exited with {}", status),
            Ok(Err(e)) => warn!("Failed to wait for engine: {}", e),
            Err(_) => {
                warn!("Engine did not exit, killing it");
                let _ = self.child.kill().await;
            }
        }
    }
}

async fn read_lines<F>(lines: &mut Lines<BufReader<ChildStdout>>, mut done: F) -> Result<Vec<String>>
where
    F: FnMut(&str) -> bool,
{
    let mut seen = Vec::new();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read engine output")?
    {
        debug!("<< {}", line);
        let finished = done(line.trim());
        seen.push(line);
        if finished {
            return Ok(seen);
        }
    }
    Err(anyhow!("Engine closed its output"))
}
