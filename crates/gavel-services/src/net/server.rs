//! Accept loop for the RPC listener shared by nodes and the directory.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gavel_core::wire::{Request, Response};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use super::frame::{read_frame, write_frame};

/// A connection with no request for this long is dropped.
pub const CONNECTION_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Answers one decoded request.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    async fn handle(&self, request: Request) -> Response;
}

/// Accept connections until `shutdown` fires. Each connection gets its own
/// task and may carry any number of request/response exchanges; open
/// connections are closed on shutdown or after `CONNECTION_IDLE_TIMEOUT`.
pub async fn serve_rpc<H: RequestHandler>(
    listener: TcpListener,
    handler: Arc<H>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_default();
    tracing::info!(addr = %local, "rpc listener started");

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, remote)) => {
                    tracing::trace!(%remote, "rpc connection accepted");
                    let handler = handler.clone();
                    let stop = shutdown.resubscribe();
                    tokio::spawn(async move {
                        connection(stream, handler, stop).await;
                    });
                }
                Err(e) => tracing::warn!(error = %e, "rpc accept failed"),
            },
        }
    }
    tracing::info!(addr = %local, "rpc listener stopped");
}

async fn connection<H: RequestHandler>(
    mut stream: TcpStream,
    handler: Arc<H>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        let read = tokio::select! {
            _ = shutdown.recv() => return,
            read = tokio::time::timeout(
                CONNECTION_IDLE_TIMEOUT,
                read_frame::<_, Request>(&mut stream),
            ) => read,
        };
        let request = match read {
            Err(_) => {
                tracing::trace!("idle rpc connection dropped");
                return;
            }
            Ok(Ok(Some(request))) => request,
            Ok(Ok(None)) => return,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "bad rpc frame");
                let _ = write_frame(&mut stream, &Response::error(e.to_string())).await;
                return;
            }
        };
        let method = request.method();
        let response = handler.handle(request).await;
        if let Err(e) = write_frame(&mut stream, &response).await {
            tracing::debug!(method, error = %e, "rpc response write failed");
            return;
        }
    }
}
