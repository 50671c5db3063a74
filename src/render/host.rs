//! The render host: a child process running a hidden webview with the
//! MathJax page loaded.

use ipc_channel::ipc::{self, IpcSender, TryRecvError};
use log::{debug, error, info, trace, warn};
use serde::Deserialize;
use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoop};
use tao::window::WindowBuilder;
use wry::WebViewBuilder;

use super::channel::ChannelError;
use super::harness::{self, MathJaxVersion};
use super::web_view::{HostCommand, HostEvent};

/// JSON messages posted by the page through `window.ipc.postMessage`.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageMessage {
    Ready,
    Rendered { formula: String, markup: String },
    Failed { formula: String, message: String },
    Log { message: String },
}

impl PageMessage {
    /// The event to forward to the parent, if any.
    pub fn into_host_event(self) -> Option<HostEvent> {
        match self {
            PageMessage::Ready => Some(HostEvent::Ready),
            PageMessage::Rendered { formula, markup } => Some(HostEvent::Rendered {
                formula,
                markup: markup.into_bytes(),
            }),
            PageMessage::Failed { formula, message } => Some(HostEvent::Failed { formula, message }),
            PageMessage::Log { message } => {
                warn!("Page: {}", message);
                None
            }
        }
    }
}

pub fn parse_page_message(body: &str) -> Result<PageMessage, String> {
    serde_json::from_str(body).map_err(|err| format!("invalid page message '{}': {}", body, err))
}

/// Runs the host until the parent asks it to stop. Does not return on success.
pub fn run(server_name: &str, version: MathJaxVersion, url: &str) -> Result<(), ChannelError> {
    info!("Starting render host (MathJax {})", version);
    let (to_parent, from_parent) = setup_ipc_connection(server_name)
        .map_err(|err| ChannelError::Launch(format!("connecting to parent: {}", err)))?;

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("mathmemo render host")
        .with_visible(false)
        .build(&event_loop)
        .map_err(|err| ChannelError::Launch(format!("creating window: {}", err)))?;

    let builder = WebViewBuilder::new()
        .with_html(harness::page(version, url))
        .with_ipc_handler(move |message| {
            let body = message.body();
            trace!("ipc_handler message: {}", body);
            match parse_page_message(body) {
                Ok(page_message) => {
                    if let Some(event) = page_message.into_host_event() {
                        if let Err(err) = to_parent.send(event) {
                            error!("Failed to forward page message: {}", err);
                        }
                    }
                }
                Err(err) => error!("{}", err),
            }
        });

    #[cfg(target_os = "linux")]
    let web_view = {
        use tao::platform::unix::WindowExtUnix;
        use wry::WebViewBuilderExtUnix;
        let vbox = window
            .default_vbox()
            .ok_or_else(|| ChannelError::Launch("window has no container".into()))?;
        builder
            .build_gtk(vbox)
            .map_err(|err| ChannelError::Launch(format!("creating webview: {}", err)))?
    };
    #[cfg(not(target_os = "linux"))]
    let web_view = builder
        .build(&window)
        .map_err(|err| ChannelError::Launch(format!("creating webview: {}", err)))?;

    debug!("Starting render host event loop");
    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        let _ = &window;

        match from_parent.try_recv() {
            Ok(HostCommand::Submit(formula)) => {
                trace!("Submitting {:?}", formula);
                if let Err(err) = web_view.evaluate_script(&harness::submit_script(&formula)) {
                    error!("Failed to hand formula to page: {:?}", err);
                }
            }
            Ok(HostCommand::Shutdown) => {
                info!("Render host shutting down");
                *control_flow = ControlFlow::Exit;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::IpcError(err)) => {
                warn!("Parent connection lost: {:?}", err);
                *control_flow = ControlFlow::Exit;
            }
        }

        if let Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } = event
        {
            *control_flow = ControlFlow::Exit;
        }
    })
}

fn setup_ipc_connection(
    server_name: &str,
) -> Result<(IpcSender<HostEvent>, ipc::IpcReceiver<HostCommand>), ipc_channel::Error> {
    let (to_host, from_parent) = ipc::channel::<HostCommand>()?;
    let (to_parent, from_host) = ipc::channel::<HostEvent>()?;
    let bootstrap = IpcSender::connect(server_name.to_string())?;
    bootstrap.send((to_host, from_host))?;
    Ok((to_parent, from_parent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_messages() {
        assert_eq!(
            parse_page_message(r#"{"kind":"ready"}"#),
            Ok(PageMessage::Ready)
        );
        let rendered =
            parse_page_message(r#"{"kind":"rendered","formula":"x","markup":"<svg/>"}"#).unwrap();
        assert_eq!(
            rendered.into_host_event(),
            Some(HostEvent::Rendered {
                formula: "x".into(),
                markup: b"<svg/>".to_vec()
            })
        );
    }

    #[test]
    fn log_messages_are_not_forwarded() {
        let log = parse_page_message(r#"{"kind":"log","message":"oops"}"#).unwrap();
        assert_eq!(log.into_host_event(), None);
    }

    #[test]
    fn rejects_unknown_messages() {
        assert!(parse_page_message(r#"{"kind":"bogus"}"#).is_err());
        assert!(parse_page_message("not json").is_err());
    }
}
