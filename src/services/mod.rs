pub mod forwarder;
pub use forwarder::{ForwardError, Forwarder, WebhookSink};

pub mod metadata;
pub use metadata::{EpisodeMetadataSource, TvdbMetadataSource};

pub mod reconcile;
pub use reconcile::{Reconciler, Reconciliation, within_release_window};

pub mod relay;
pub use relay::{Prepared, RelayService};
