//! Maven-layout artifact repository on the local filesystem.
//!
//! Published files land under `<root>/<group as path>/<name>/<version>/`
//! next to a generated POM and checksum sidecars; fetching reads them back
//! and verifies the sidecars.

pub mod checksum;
pub mod layout;
pub mod pom;
pub mod publish;

pub use publish::{FilePublisher, FileRepository};
