use std::sync::Arc;

use tracing::trace;

use super::BuildPass;
use crate::error::OrchestrationError;
use crate::resource::{ResourceKind, ResourceRef, ResourceVisitor};

impl ResourceVisitor for BuildPass {
    type Error = OrchestrationError;

    /// Decide what to do with one node of the tree.
    ///
    /// Runs on the traversal thread. A leaf's old diagnostics are always
    /// cleared before its check task is submitted.
    fn visit(&mut self, resource: &ResourceRef) -> Result<bool, OrchestrationError> {
        if self.is_cancelled() || !self.selector.is_project_eligible() {
            return Ok(false);
        }

        let path = resource.path();
        if !resource.exists() {
            trace!("Skipping missing resource {}", path.display());
            // Stale diagnostics of a removed file go away with it. A removed
            // folder is descended so its removed files get cleared too.
            return Ok(match resource.kind() {
                ResourceKind::Leaf => {
                    self.context.sink.clear(path);
                    false
                }
                ResourceKind::Container => true,
            });
        }

        match resource.kind() {
            ResourceKind::Container => Ok(self.selector.allow_visit_folder(path)),
            ResourceKind::Leaf => {
                self.context.sink.clear(path);
                if self.selector.allow_visit_file(path) {
                    self.submit(Arc::clone(resource))?;
                }
                Ok(true)
            }
        }
    }
}
