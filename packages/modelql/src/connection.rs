//! Connection and edge wrappers for lists of objects.
//! See: https://relay.dev/graphql/connections.htm#sec-Connection-Types

use crate::paging::{cursor_for_offset, Cursor, PageInfo};
use crate::resolver::ModelResolver;
use crate::shape::{Output, Shape, Shaped, Wrapper};
use crate::spec::{ConnectionObject, ConnectionTypeRef, EdgeObject, EdgeTypeRef};
use async_graphql::dynamic::{Object, TypeRef};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// A cursor and the node it points at.
#[derive(Clone, Debug)]
pub struct Edge {
    pub cursor: Cursor,
    pub node: Output,
}

impl Edge {
    pub fn new(cursor: impl Into<Cursor>, node: impl Shaped) -> Self {
        Self {
            cursor: cursor.into(),
            node: node.into_output(),
        }
    }

    /// Edge for the element at `offset` of a list.
    pub fn at(offset: usize, node: Output) -> Self {
        Self {
            cursor: cursor_for_offset(offset),
            node,
        }
    }
}

/// A page of edges.
#[derive(Clone, Debug)]
pub struct Connection {
    pub total_count: usize,
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
}

impl Connection {
    /// Wrap a whole list without paging.
    pub fn unpaged(items: Vec<Output>) -> Self {
        let edges = items
            .into_iter()
            .enumerate()
            .map(|(offset, node)| Edge::at(offset, node))
            .collect::<Vec<_>>();
        let page_info = PageInfo {
            has_next_page: false,
            has_previous_page: false,
            start_cursor: edges.first().map(|edge| edge.cursor.clone()),
            end_cursor: edges.last().map(|edge| edge.cursor.clone()),
        };
        Self {
            total_count: edges.len(),
            edges,
            page_info,
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Output> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

impl Shaped for Edge {
    fn shape() -> Shape {
        Shape::Placeholder(Wrapper::Edge)
    }
    fn into_output(self) -> Output {
        Output::Edge(Box::new(self))
    }
}

impl Shaped for Connection {
    fn shape() -> Shape {
        Shape::Placeholder(Wrapper::Connection)
    }
    fn into_output(self) -> Output {
        Output::Connection(Box::new(self))
    }
}

/// Connection and edge type names for one element type.
#[derive(Debug, PartialEq, Eq)]
pub struct ConnectionTypes {
    pub element: String,
    pub connection: String,
    pub edge: String,
}

impl ConnectionTypes {
    fn new(element: &str) -> Self {
        Self {
            element: element.to_string(),
            connection: TypeRef::connection(element),
            edge: TypeRef::edge(element),
        }
    }

    pub fn connection_object(&self) -> Object {
        Object::new_connection::<ModelResolver>(&self.element)
    }

    pub fn edge_object(&self) -> Object {
        Object::new_edge::<ModelResolver>(&self.element)
    }
}

/// Creates connection wrappers on first reference, at most once per element type.
#[derive(Debug, Default)]
pub struct ConnectionBuilder {
    wrappers: IndexMap<String, Arc<ConnectionTypes>>,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_for(&mut self, element: &str) -> Arc<ConnectionTypes> {
        if let Some(types) = self.wrappers.get(element) {
            return types.clone();
        }
        debug!("Creating connection wrappers for {element}");
        let types = Arc::new(ConnectionTypes::new(element));
        self.wrappers.insert(element.to_string(), types.clone());
        types
    }

    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ConnectionTypes>> {
        self.wrappers.values()
    }

    /// Schema objects for every wrapper created so far.
    pub fn objects(&self) -> Vec<Object> {
        self.wrappers
            .values()
            .flat_map(|types| [types.connection_object(), types.edge_object()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql_value::ConstValue;

    #[test]
    fn test_connection_for_is_memoized() {
        let mut builder = ConnectionBuilder::new();
        assert!(builder.is_empty());

        let first = builder.connection_for("Todo");
        let second = builder.connection_for("Todo");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builder.len(), 1);
        assert_eq!(first.connection, "TodoConnection");
        assert_eq!(first.edge, "TodoEdge");

        let other = builder.connection_for("User");
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(builder.len(), 2);
        assert_eq!(builder.objects().len(), 4);
    }

    #[test]
    fn test_unpaged() {
        let items = (0..3)
            .map(|i: i32| Output::Value(ConstValue::Number(i.into())))
            .collect();
        let connection = Connection::unpaged(items);
        assert_eq!(connection.total_count, 3);
        assert_eq!(connection.edges[2].cursor, cursor_for_offset(2));
        assert_eq!(connection.page_info.start_cursor, Some(cursor_for_offset(0)));
        assert!(!connection.page_info.has_next_page);
        assert_eq!(connection.nodes().count(), 3);
    }
}
