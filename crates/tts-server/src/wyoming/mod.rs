//! Wyoming streaming protocol front-end.
//!
//! Serves `describe` and `synthesize` over newline-delimited JSON event
//! headers with optional data and binary payload sections.

pub mod event;
pub mod info;
pub mod messages;
pub mod session;

use std::sync::Arc;

use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use runtime::SynthesisService;

pub use event::{Event, read_event, write_event};
pub use info::Info;
pub use session::{Session, SessionState, is_disconnect};

/// Accept connections until `shutdown` flips, one task per connection.
pub async fn serve(
    listener: TcpListener,
    service: Arc<SynthesisService>,
    info: Arc<Info>,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Wyoming server listening");
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept Wyoming connection");
                        continue;
                    }
                };

                debug!(peer = %peer, "Wyoming client connected");
                let service = Arc::clone(&service);
                let info = Arc::clone(&info);

                tokio::spawn(async move {
                    let (reader, writer) = stream.into_split();
                    let session = Session::new(BufReader::new(reader), writer, service, info);
                    match session.run().await {
                        Ok(()) => debug!(peer = %peer, "Wyoming session closed"),
                        Err(e) if is_disconnect(&e) => {
                            debug!(peer = %peer, error = %e, "Wyoming client disconnected")
                        }
                        Err(e) => warn!(peer = %peer, error = %e, "Wyoming session ended with error"),
                    }
                });
            }
            _ = shutdown.changed() => {
                info!("Wyoming server stopping");
                break;
            }
        }
    }
}
