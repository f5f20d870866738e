//! Pagination arguments and the shared `PageInfo` object.
//! See: https://relay.dev/graphql/connections.htm#sec-Pagination-algorithm

use super::self_prelude::*;
use crate::paging::PageInfo;
use async_graphql::Value;

#[extension_trait]
pub impl PagingTypeRef for TypeRef {
    const CURSOR: &'static str = "String";
    const PAGE_INFO: &'static str = "PageInfo";
}

/// Name, scalar type and description of each window argument, in the order
/// [`crate::paging::PAGING_ARGUMENTS`] lists them.
const WINDOW_ARGUMENTS: [(&str, &str, &str); 4] = [
    ("first", TypeRef::INT, "Keep at most this many edges from the front of the window."),
    ("after", TypeRef::CURSOR, "Open the window just past this cursor."),
    ("last", TypeRef::INT, "Keep at most this many edges from the back of the window."),
    ("before", TypeRef::CURSOR, "Close the window just before this cursor."),
];

#[extension_trait]
pub impl PagingField for Field {
    /// Declare the window arguments of a paginated list field.
    fn pagination_arguments(self) -> Self {
        WINDOW_ARGUMENTS
            .iter()
            .fold(self, |field, (name, ty, description)| {
                field.argument(InputValue::new(*name, TypeRef::named(*ty)).description(*description))
            })
    }
}

fn page_info_field<T, F>(name: &str, ty: TypeRef, read: F) -> Field
where
    T: Into<Value>,
    F: Fn(&PageInfo) -> Option<T> + Send + Sync + 'static,
{
    Field::new(name, ty, move |ctx: ResolverContext| {
        let value = ctx
            .parent_value
            .try_downcast_ref::<PageInfo>()
            .map(|page_info| read(page_info).map(FieldValue::value));
        FieldFuture::new(async move { Ok(value?) })
    })
}

/// See: https://relay.dev/graphql/connections.htm#sec-PageInfo
#[extension_trait]
pub impl PageInfoObject for Object {
    /// The one `PageInfo` type every connection wrapper points at. Its fields
    /// read straight from a [`PageInfo`] parent value.
    fn new_page_info() -> Self {
        Self::new(TypeRef::PAGE_INFO)
            .field(page_info_field(
                "hasNextPage",
                TypeRef::named_nn(TypeRef::BOOLEAN),
                |page_info| Some(page_info.has_next_page),
            ))
            .field(page_info_field(
                "hasPreviousPage",
                TypeRef::named_nn(TypeRef::BOOLEAN),
                |page_info| Some(page_info.has_previous_page),
            ))
            .field(page_info_field(
                "startCursor",
                TypeRef::named(TypeRef::CURSOR),
                |page_info| page_info.start_cursor.clone(),
            ))
            .field(page_info_field(
                "endCursor",
                TypeRef::named(TypeRef::CURSOR),
                |page_info| page_info.end_cursor.clone(),
            ))
    }
}
