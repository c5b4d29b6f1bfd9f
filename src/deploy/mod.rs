//! The deploy pipeline.
//!
//! Stages, in the order a file moves through them:
//!
//! 1. [`reader`] loads the file and applies the gzip policy.
//! 2. [`fingerprint`] hashes the wire bytes.
//! 3. [`key`] and [`alias`] derive the object keys.
//! 4. [`sync`] gates each key against the remote bucket.
//! 5. [`upload`] assembles and executes the write.
//! 6. [`prune`] clears out remote objects with no local counterpart.
//!
//! [`run`] wires the stages together and produces the run report.

pub mod alias;
pub mod content_type;
pub mod fingerprint;
pub mod key;
pub mod prune;
pub mod reader;
pub mod run;
pub mod sync;
pub mod upload;

pub use alias::expand_aliases;
pub use content_type::resolve_content_type;
pub use fingerprint::Fingerprint;
pub use key::build_key;
pub use prune::prune_removed;
pub use reader::{read_local_file, LocalFile};
pub use run::{run_deploy, DeployReport, KeyOutcome, KeyStatus};
pub use sync::{check_remote, decide, ConflictReason, SyncOutcome};
pub use upload::{build_upload_params, execute_upload};
