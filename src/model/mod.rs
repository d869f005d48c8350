mod node;
mod page;

pub use node::{Node, NodeKind};
pub use page::{AuthorHints, Page, PageSummary, Parent, UserRef};
