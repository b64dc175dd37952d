/*! Integration tests for xmlstore.
 *
 * Organized as a single integration test binary:
 * - ingest: end-to-end ingestion of new documents
 * - overwrite: replacing existing documents and failure isolation
 * - security: permission checks before any mutation
 * - entities: external entity resolution through the catalog
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("xmlstore=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod entities;
mod helpers;
mod ingest;
mod overwrite;
mod security;
