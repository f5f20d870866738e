use crate::connection::{Connection, Edge};
use crate::extension::nullable_list;
use crate::mutation::MutationPayload;
use crate::node::GlobalIdentity;
use crate::shape::Output;
use crate::spec::{ConnectionResolver, EdgeResolver, MutationPayloadResolver, QueryResolver};
use async_graphql::dynamic::{FieldFuture, FieldValue, ResolverContext};
use std::sync::Arc;
use tracing::debug;

/// Resolves the fixed Relay fields: wrappers, page info, node lookups and
/// the mutation correlation token.
pub struct ModelResolver;

fn node_value<'a>(identity: &GlobalIdentity, id: &str) -> Option<FieldValue<'a>> {
    let node = identity.resolve_node(id);
    if node.is_none() {
        debug!("No node found for id {id}");
    }
    node.map(|(instance, type_name)| FieldValue::owned_any(instance).with_type(type_name))
}

fn nullable_item<'a>(output: &Output) -> Option<FieldValue<'a>> {
    match output {
        Output::Null => None,
        output => Some(output.clone().into_field_value()),
    }
}

impl QueryResolver for ModelResolver {
    fn resolve_node_by_id(ctx: ResolverContext) -> FieldFuture {
        FieldFuture::new(async move {
            let identity = ctx.data::<Arc<GlobalIdentity>>()?;
            let id = ctx.args.try_get("id")?;
            let id = id.string()?;
            Ok(node_value(identity, id))
        })
    }
    fn resolve_nodes_by_id(ctx: ResolverContext) -> FieldFuture {
        FieldFuture::new(async move {
            let identity = ctx.data::<Arc<GlobalIdentity>>()?;
            let ids = ctx.args.try_get("ids")?;
            let nodes = ids
                .list()?
                .iter()
                .map(|id| id.string().map(|id| node_value(identity, id)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(nullable_list(&ctx, nodes)?))
        })
    }
}

impl ConnectionResolver for ModelResolver {
    fn resolve_total_count(ctx: ResolverContext) -> FieldFuture {
        FieldFuture::new(async move {
            let connection = ctx.parent_value.try_downcast_ref::<Connection>()?;
            Ok(Some(FieldValue::value(connection.total_count as i64)))
        })
    }
    fn resolve_nodes(ctx: ResolverContext) -> FieldFuture {
        FieldFuture::new(async move {
            let connection = ctx.parent_value.try_downcast_ref::<Connection>()?;
            let nodes = connection.nodes().map(nullable_item);
            Ok(Some(nullable_list(&ctx, nodes)?))
        })
    }
    fn resolve_edges(ctx: ResolverContext) -> FieldFuture {
        FieldFuture::new(async move {
            let connection = ctx.parent_value.try_downcast_ref::<Connection>()?;
            let edges = connection
                .edges
                .iter()
                .map(|edge| FieldValue::borrowed_any(edge));
            Ok(Some(FieldValue::list(edges)))
        })
    }
    fn resolve_page_info(ctx: ResolverContext) -> FieldFuture {
        FieldFuture::new(async move {
            let connection = ctx.parent_value.try_downcast_ref::<Connection>()?;
            Ok(Some(FieldValue::borrowed_any(&connection.page_info)))
        })
    }
}

impl EdgeResolver for ModelResolver {
    fn resolve_node(ctx: ResolverContext) -> FieldFuture {
        FieldFuture::new(async move {
            let edge = ctx.parent_value.try_downcast_ref::<Edge>()?;
            Ok(nullable_item(&edge.node))
        })
    }
    fn resolve_cursor(ctx: ResolverContext) -> FieldFuture {
        FieldFuture::new(async move {
            let edge = ctx.parent_value.try_downcast_ref::<Edge>()?;
            Ok(Some(FieldValue::value(edge.cursor.clone())))
        })
    }
}

impl MutationPayloadResolver for ModelResolver {
    fn resolve_client_mutation_id(ctx: ResolverContext) -> FieldFuture {
        FieldFuture::new(async move {
            let payload = ctx.parent_value.try_downcast_ref::<MutationPayload>()?;
            Ok(payload.client_mutation_id.clone().map(FieldValue::value))
        })
    }
}
