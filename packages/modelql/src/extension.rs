//! Request scoped null handling.
//!
//! The dynamic engine cannot emit `null` for an object or interface list
//! item, and a failing resolver otherwise replaces the whole response.
//! Resolvers mark the list slots that must read as `null` in [`NullSlots`];
//! [`PartialResults`] honours those marks and reports errors raised under a
//! nullable field next to the data of its siblings.

use crate::shape::Output;
use async_graphql::{
    dynamic::{FieldValue, ResolverContext},
    extensions::{
        Extension, ExtensionContext, ExtensionFactory, NextExecute, NextPrepareRequest,
        NextResolve, ResolveInfo,
    },
    PathSegment, QueryPathNode, QueryPathSegment, Request, Response, ServerError, ServerResult,
    Value,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::HashSet, mem, sync::Arc};
use tracing::debug;

/// List slots that resolve to `null`, and the errors swallowed by nullable
/// fields, for a single request.
#[derive(Debug, Default)]
pub struct NullSlots {
    slots: Mutex<HashSet<String>>,
    errors: Mutex<Vec<ServerError>>,
}

impl NullSlots {
    /// Mark item `index` of the list resolved at `path` as `null`.
    pub fn mark(&self, path: &QueryPathNode<'_>, index: usize) {
        self.slots.lock().insert(format!("{path}.{index}"));
    }

    fn take(&self, path: &str) -> bool {
        self.slots.lock().remove(path)
    }

    fn swallow(&self, error: ServerError) {
        self.errors.lock().push(error);
    }

    fn drain_errors(&self) -> Vec<ServerError> {
        mem::take(&mut *self.errors.lock())
    }
}

fn error_path(node: &QueryPathNode<'_>) -> Vec<PathSegment> {
    let mut path = std::iter::once(node)
        .chain(node.parents())
        .map(|node| match &node.segment {
            QueryPathSegment::Index(index) => PathSegment::Index(*index),
            QueryPathSegment::Name(name) => PathSegment::Field(name.to_string()),
        })
        .collect::<Vec<_>>();
    path.reverse();
    path
}

/// Build a list value whose `None` items resolve to `null`.
pub fn nullable_list<'a>(
    ctx: &ResolverContext<'_>,
    items: impl IntoIterator<Item = Option<FieldValue<'a>>>,
) -> async_graphql::Result<FieldValue<'a>> {
    let slots = ctx.data_opt::<Arc<NullSlots>>();
    let path = ctx.path_node.as_ref();
    let values = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match (item, slots, path) {
            (Some(value), _, _) => Ok(value),
            (None, Some(slots), Some(path)) => {
                slots.mark(path, index);
                Ok(FieldValue::NULL)
            }
            (None, _, _) => Err(async_graphql::Error::new(
                "Null list items require the PartialResults extension",
            )),
        })
        .collect::<async_graphql::Result<Vec<_>>>()?;
    Ok(FieldValue::list(values))
}

/// Convert a method output for the field `ctx` resolves.
pub fn field_output<'a>(
    ctx: &ResolverContext<'_>,
    output: Output,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    match output {
        Output::Null => Ok(None),
        Output::List(items) => {
            let items = items.into_iter().map(|item| match item {
                Output::Null => None,
                item => Some(item.into_field_value()),
            });
            nullable_list(ctx, items).map(Some)
        }
        output => Ok(Some(output.into_field_value())),
    }
}

/// Installs a fresh [`NullSlots`] into every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct PartialResults;

impl ExtensionFactory for PartialResults {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(PartialResultsExtension::default())
    }
}

#[derive(Default)]
struct PartialResultsExtension {
    slots: Arc<NullSlots>,
}

#[async_trait]
impl Extension for PartialResultsExtension {
    async fn prepare_request(
        &self,
        ctx: &ExtensionContext<'_>,
        request: Request,
        next: NextPrepareRequest<'_>,
    ) -> ServerResult<Request> {
        next.run(ctx, request.data(self.slots.clone())).await
    }

    async fn execute(
        &self,
        ctx: &ExtensionContext<'_>,
        operation_name: Option<&str>,
        next: NextExecute<'_>,
    ) -> Response {
        let mut response = next.run(ctx, operation_name).await;
        response.errors.extend(self.slots.drain_errors());
        response
    }

    async fn resolve(
        &self,
        ctx: &ExtensionContext<'_>,
        info: ResolveInfo<'_>,
        next: NextResolve<'_>,
    ) -> ServerResult<Option<Value>> {
        // List items carry a `[Element]` parent type.
        if info.parent_type.starts_with('[') && self.slots.take(&info.path_node.to_string()) {
            return Ok(None);
        }
        let nullable = !info.return_type.ends_with('!');
        let node = *info.path_node;
        match next.run(ctx, info).await {
            Err(mut error) => {
                // Dynamic resolvers report errors without a path.
                if error.path.is_empty() {
                    error.path = error_path(&node);
                }
                if !nullable {
                    return Err(error);
                }
                debug!("Field {node} resolved to null: {}", error.message);
                self.slots.swallow(error);
                Ok(None)
            }
            result => result,
        }
    }
}
