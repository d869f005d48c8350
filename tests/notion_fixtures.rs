// tests/notion_fixtures.rs
//! Parsing of recorded Notion API responses.

use notion2slack::api::parser::{parse_children, parse_page};
use notion2slack::{NodeKind, NotionId, Parent};
use pretty_assertions::assert_eq;

fn id(raw: &str) -> NotionId {
    NotionId::parse(raw).unwrap()
}

#[test]
fn published_page_keeps_the_fields_reports_need() {
    let page = parse_page(include_str!("fixtures/api_responses/page_published.json")).unwrap();

    assert_eq!(page.id.as_str(), "5c6a28216bb14a7eb6e1c50111515c3d");
    assert_eq!(page.title, "Onboarding guide");
    assert!(page.has_public_url());
    assert_eq!(page.status.as_deref(), Some("Published"));
    assert_eq!(page.author_hints.text.as_deref(), Some("Marta Ivanova"));
    assert_eq!(
        page.parent,
        Parent::Page {
            page_id: id("59833787-2cf9-4fdf-8782-e53db20768a5")
        }
    );
    let creator = page.created_by.unwrap();
    assert_eq!(creator.name, None);
    assert_eq!(creator.id.as_str(), "6794760a-1f15-45cd-9c65-0dfe42f5135a");
}

#[test]
fn children_listing_classifies_every_container() {
    let listing =
        parse_children(include_str!("fixtures/api_responses/children_mixed.json")).unwrap();

    assert!(listing.has_more);
    assert_eq!(
        listing.next_cursor.as_deref(),
        Some("a8e2c6f4-0d1b-4b39-8e7a-5f2d9c3b1e61")
    );

    let kinds: Vec<_> = listing.results.iter().map(|n| n.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Leaf {
                block_type: "paragraph".into(),
                text: "Привет, команда".into()
            },
            NodeKind::ColumnList,
            NodeKind::ChildPage {
                title: "Onboarding guide".into()
            },
            NodeKind::ChildDatabase {
                title: "Team directory".into()
            },
            NodeKind::SyncedBlock {
                synced_from: Some(id("e1b4d7a0-3c2f-4a8b-9d6e-0f5a2b7c4e19"))
            },
        ]
    );
    assert!(listing.results[1].has_children);
    assert!(!listing.results[3].has_children);
}
