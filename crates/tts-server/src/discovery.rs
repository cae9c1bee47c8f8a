//! Zeroconf advertisement of the Wyoming listener.
//!
//! Registration is best effort: failures are logged and the server keeps
//! running without discovery.

use tracing::{info, warn};

/// Service type advertised for Wyoming-compatible servers.
pub const SERVICE_TYPE: &str = "_wyoming._tcp.local.";

#[cfg(feature = "mdns")]
mod imp {
    use std::collections::HashMap;

    use mdns_sd::{ServiceDaemon, ServiceInfo};
    use tracing::debug;

    use super::SERVICE_TYPE;

    /// A live mDNS registration, withdrawn when dropped.
    pub struct Advertisement {
        daemon: ServiceDaemon,
        fullname: String,
    }

    impl Advertisement {
        pub(super) fn register(name: &str, port: u16) -> Result<Self, mdns_sd::Error> {
            let daemon = ServiceDaemon::new()?;
            let host = format!("{name}.local.");
            let properties: HashMap<String, String> = HashMap::new();

            let service = ServiceInfo::new(SERVICE_TYPE, name, &host, "", port, properties)?
                .enable_addr_auto();
            let fullname = service.get_fullname().to_string();

            daemon.register(service)?;
            Ok(Self { daemon, fullname })
        }

        pub fn fullname(&self) -> &str {
            &self.fullname
        }
    }

    impl Drop for Advertisement {
        fn drop(&mut self) {
            if let Err(e) = self.daemon.unregister(&self.fullname) {
                debug!(error = %e, "mDNS unregister failed");
            }
            if let Err(e) = self.daemon.shutdown() {
                debug!(error = %e, "mDNS daemon shutdown failed");
            }
        }
    }
}

#[cfg(not(feature = "mdns"))]
mod imp {
    /// Placeholder when the `mdns` feature is disabled; never constructed.
    pub struct Advertisement {
        fullname: String,
    }

    impl Advertisement {
        pub(super) fn register(_name: &str, _port: u16) -> Result<Self, String> {
            Err("built without the mdns feature".to_string())
        }

        pub fn fullname(&self) -> &str {
            &self.fullname
        }
    }
}

pub use imp::Advertisement;

/// Advertise `name` on `port`. Returns `None` when registration fails.
pub fn advertise(name: &str, port: u16) -> Option<Advertisement> {
    match Advertisement::register(name, port) {
        Ok(ad) => {
            info!(service = ad.fullname(), port, "Registered zeroconf service");
            Some(ad)
        }
        Err(e) => {
            warn!(error = %e, "Zeroconf registration failed, continuing without discovery");
            None
        }
    }
}
