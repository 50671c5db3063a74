//! Parent side of the out-of-process renderer.
//!
//! The webview lives in a child process (the same executable started with
//! `--render-host`) because the terminal UI owns this process's main thread.
//! The two sides exchange [`HostCommand`]s and [`HostEvent`]s over
//! `ipc-channel`; a reader thread turns host events into [`ChannelEvent`]s.

use std::env;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use ipc_channel::ipc::{IpcOneShotServer, IpcReceiver, IpcSender};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use super::channel::{ChannelError, ChannelEvent, RenderChannel};
use super::harness::MathJaxVersion;

/// Parent to host.
///
/// Kept externally tagged: bincode, which ipc-channel uses underneath, cannot
/// read internally tagged enums.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum HostCommand {
    Submit(String),
    Shutdown,
}

/// Host to parent.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum HostEvent {
    Ready,
    Rendered { formula: String, markup: Vec<u8> },
    Failed { formula: String, message: String },
}

impl From<HostEvent> for ChannelEvent {
    fn from(event: HostEvent) -> Self {
        match event {
            HostEvent::Ready => ChannelEvent::Ready,
            HostEvent::Rendered { formula, markup } => ChannelEvent::Rendered { formula, markup },
            HostEvent::Failed { formula, message } => ChannelEvent::Failed { formula, message },
        }
    }
}

pub type Bootstrap = (IpcSender<HostCommand>, IpcReceiver<HostEvent>);

/// Renders through a MathJax page hosted in a child process.
pub struct WebViewChannel {
    child: Child,
    to_host: IpcSender<HostCommand>,
    reader: Option<JoinHandle<()>>,
}

impl WebViewChannel {
    /// Starts the host and connects to it. Events, starting with `Ready` once
    /// the page has loaded, are sent to `events`.
    pub fn launch(
        version: MathJaxVersion,
        url: &str,
        events: Sender<ChannelEvent>,
    ) -> Result<Self, ChannelError> {
        let (server, server_name) = IpcOneShotServer::<Bootstrap>::new()
            .map_err(|err| ChannelError::Launch(format!("IPC bootstrap: {}", err)))?;

        let mut child = spawn_host(&server_name, version, url)?;
        pipe_host_logs(&mut child);

        let (_bootstrap_rx, (to_host, from_host)) = server
            .accept()
            .map_err(|err| ChannelError::Launch(format!("accepting host bootstrap: {}", err)))?;
        info!("Render host connected (pid {})", child.id());

        let reader = thread::spawn(move || {
            while let Ok(event) = from_host.recv() {
                trace!("Render host event: {:?}", event);
                if events.send(event.into()).is_err() {
                    return;
                }
            }
            debug!("Render host hung up");
            let _ = events.send(ChannelEvent::Closed);
        });

        Ok(Self {
            child,
            to_host,
            reader: Some(reader),
        })
    }
}

impl RenderChannel for WebViewChannel {
    fn submit(&mut self, formula: &str) -> Result<(), ChannelError> {
        self.to_host
            .send(HostCommand::Submit(formula.to_string()))
            .map_err(|err| ChannelError::Ipc(err.to_string()))
    }
}

impl Drop for WebViewChannel {
    fn drop(&mut self) {
        debug!("Shutting down render host");
        if let Err(err) = self.to_host.send(HostCommand::Shutdown) {
            warn!("Render host shutdown request failed: {}", err);
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

fn spawn_host(server_name: &str, version: MathJaxVersion, url: &str) -> Result<Child, ChannelError> {
    let exe = env::current_exe()
        .map_err(|err| ChannelError::Launch(format!("locating executable: {}", err)))?;

    Command::new(exe)
        .args([
            "--render-host",
            server_name,
            "--mathjax-version",
            version.as_str(),
            "--mathjax-url",
            url,
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| ChannelError::Launch(err.to_string()))
}

fn pipe_host_logs(child: &mut Child) {
    if let Some(stderr) = child.stderr.take() {
        thread::spawn(move || {
            let reader = BufReader::new(stderr);
            for line in reader.lines().map_while(Result::ok) {
                debug!("[render-host] {}", line);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_events_map_to_channel_events() {
        let event: ChannelEvent = HostEvent::Rendered {
            formula: "a".into(),
            markup: b"<svg/>".to_vec(),
        }
        .into();
        assert_eq!(
            event,
            ChannelEvent::Rendered {
                formula: "a".into(),
                markup: b"<svg/>".to_vec()
            }
        );
        assert_eq!(ChannelEvent::from(HostEvent::Ready), ChannelEvent::Ready);
    }
}
