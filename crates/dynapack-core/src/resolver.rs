//! Sequential resolution of an ordered list of package ids.

use std::sync::Arc;

use dynapack_meta::Descriptor;

use crate::error::{FailureKind, LoadFailure};
use crate::loader::PackageLoader;

/// Load `ids` one after another, each through the full pipeline.
///
/// Step `i + 1` starts only after step `i` has reached `Loaded`. The first
/// failure stops resolution and is returned as-is, so its `package` names the
/// id that actually failed. When `parent` is set, the ids are `parent`'s
/// dependencies and every wait is checked for dependency cycles.
pub(crate) async fn resolve_sequential(
    loader: &PackageLoader,
    parent: Option<&str>,
    ids: &[String],
) -> Result<Vec<Arc<Descriptor>>, LoadFailure> {
    if ids.is_empty() {
        return Err(LoadFailure::new(
            parent.unwrap_or_default(),
            FailureKind::EmptyRequest,
        ));
    }

    let mut descriptors = Vec::with_capacity(ids.len());
    for (step, id) in ids.iter().enumerate() {
        if step > 0 {
            tokio::task::yield_now().await;
        }
        let outcome = match parent {
            Some(parent) => loader.request_dependency(parent, id).await,
            None => loader.request_one(id).await,
        };
        match outcome {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(failure) => {
                tracing::debug!(
                    step,
                    package = %id,
                    failed = %failure.package,
                    "Sequential resolution stopped"
                );
                return Err(failure);
            }
        }
    }
    Ok(descriptors)
}
