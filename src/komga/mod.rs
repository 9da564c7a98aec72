//! Remote adapter over the Komga REST API.

mod client;
mod condition;
mod library;
mod tools;

#[cfg(test)]
mod tests;

pub use client::{KomgaClient, QueryParams};
pub use condition::{is_leaf, search_body, ConditionBuilder};
pub use library::{
    merge_book_ids, AuthorQuery, BookSearch, LatestKind, LatestQuery, ListQuery, NewReadingList,
    ReadingList, ReadingListAddition, ReadingListSummary, SeriesSearch,
};
pub use tools::{komga_tool_definitions, KomgaTools};
