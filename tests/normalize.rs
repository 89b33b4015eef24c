//! Range normalizer: canonical trees, permutation independence and the
//! differential check against the naive oracle.

use annotext::{Annotation, Element, Node, Schema, Tree, normalize};
use annotext_naive_oracle as oracle;
use proptest::collection::vec;
use proptest::prelude::*;

fn kinds(nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Element(element) => format!("{}({})", element.kind, element.text()),
            Node::Text(text) => format!("{:?}", text.text),
        })
        .collect()
}

#[test]
fn test_list_document_tree() {
    let content = [
        "I have a list:",
        "First item plus bold text",
        "Second item plus italic text",
        "Item 2a",
        "Item 2b",
        "After all the lists",
    ]
    .concat();
    let annotations = vec![
        Annotation::new("paragraph", 0, 14),
        Annotation::new("bold", 30, 34),
        Annotation::new("italic", 56, 62),
        Annotation::new("ordered-list", 14, 81),
        Annotation::new("list-item", 14, 39),
        Annotation::new("list-item", 39, 81),
        Annotation::new("unordered-list", 67, 81),
        Annotation::new("list-item", 67, 74),
        Annotation::new("list-item", 74, 81),
        Annotation::new("paragraph", 81, 100),
    ];
    let tree = normalize(&content, &annotations, &Schema::commonmark()).unwrap();
    assert_eq!(
        kinds(tree.children()),
        vec![
            "paragraph(I have a list:)",
            "ordered-list(First item plus bold textSecond item plus italic textItem 2aItem 2b)",
            "paragraph(After all the lists)",
        ]
    );

    let Node::Element(list) = &tree.children()[1] else {
        panic!("Expected list element");
    };
    let second: Vec<&Element> = list.elements().collect();
    assert_eq!(second.len(), 2);
    assert_eq!(
        kinds(&second[1].children),
        vec![
            "\"Second item plus \"",
            "italic(italic)",
            "\" text\"",
            "unordered-list(Item 2aItem 2b)",
        ]
    );
    assert_eq!((second[1].start, second[1].end), (39, 81));
}

#[test]
fn test_split_nodes_keep_their_attributes() {
    let annotations = vec![
        Annotation::new("link", 0, 6).with_attribute("url", "https://a.example"),
        Annotation::new("bold", 3, 9),
    ];
    let tree = normalize("abcdefghi", &annotations, &Schema::commonmark()).unwrap();
    let json = tree.to_json().unwrap();
    let children = json["root"]["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["type"], "link");
    assert_eq!(children[0]["children"][1]["type"], "bold");
    assert_eq!(children[1]["type"], "bold");
    assert_eq!(children[1]["start"], 6);
}

#[test]
fn test_rank_override_changes_nesting() {
    let annotations = vec![Annotation::new("bold", 0, 3), Annotation::new("code", 0, 3)];
    let default = normalize("abc", &annotations, &Schema::commonmark()).unwrap();
    assert_eq!(kinds(default.children()), vec!["bold(abc)"]);

    let mut schema = Schema::commonmark();
    schema.set_rank("bold", 99);
    let overridden = normalize("abc", &annotations, &schema).unwrap();
    assert_eq!(kinds(overridden.children()), vec!["code(abc)"]);
    assert_ne!(default, overridden);
}

#[test]
fn test_duplicate_annotations_nest() {
    let annotations = vec![Annotation::new("comment", 0, 2), Annotation::new("comment", 0, 2)];
    let tree = normalize("ab", &annotations, &Schema::commonmark()).unwrap();
    let Node::Element(outer) = &tree.children()[0] else {
        panic!("Expected element");
    };
    assert_eq!(kinds(&outer.children), vec!["comment(ab)"]);
}

#[test]
fn test_empty_list_item_is_a_sibling() {
    let annotations = vec![
        Annotation::new("unordered-list", 0, 1),
        Annotation::new("list-item", 0, 0),
        Annotation::new("list-item", 0, 1),
    ];
    let tree = normalize("a", &annotations, &Schema::commonmark()).unwrap();
    let Node::Element(list) = &tree.children()[0] else {
        panic!("Expected list element");
    };
    assert_eq!(kinds(&list.children), vec!["list-item()", "list-item(a)"]);
}

#[test]
fn test_trailing_empty_list_item_stays_in_its_list() {
    let annotations = vec![
        Annotation::new("unordered-list", 0, 1),
        Annotation::new("list-item", 0, 1),
        Annotation::new("list-item", 1, 1),
    ];
    let tree = normalize("a", &annotations, &Schema::commonmark()).unwrap();
    assert_eq!(tree.children().len(), 1);
    let Node::Element(list) = &tree.children()[0] else {
        panic!("Expected list element");
    };
    assert_eq!(kinds(&list.children), vec!["list-item(a)", "list-item()"]);
}

fn kind_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("paragraph"),
        Just("blockquote"),
        Just("list-item"),
        Just("bold"),
        Just("italic"),
        Just("link"),
        Just("code"),
        Just("comment"),
        Just("parse-token"),
    ]
}

fn case_strategy() -> impl Strategy<Value = (String, Vec<Annotation>)> {
    "[a-c \n]{0,16}".prop_flat_map(|content| {
        let len = content.chars().count();
        let annotation = (kind_strategy(), 0..=len, 0..=len, 0u8..3).prop_map(
            |(kind, a, b, attribute)| {
                let annotation = Annotation::new(kind, a.min(b), a.max(b));
                if attribute == 0 {
                    annotation
                } else {
                    annotation.with_attribute("n", attribute)
                }
            },
        );
        (Just(content), vec(annotation, 0..10))
    })
}

fn shuffled_case_strategy() -> impl Strategy<Value = (String, Vec<Annotation>, Vec<Annotation>)> {
    case_strategy().prop_flat_map(|(content, annotations)| {
        (
            Just(content),
            Just(annotations.clone()),
            Just(annotations).prop_shuffle(),
        )
    })
}

/// Children lie inside their parent and siblings do not overlap.
fn check_nesting(element: &Element) -> Result<(), TestCaseError> {
    let mut cursor = element.start;
    for child in &element.children {
        let (start, end) = match child {
            Node::Element(child) => {
                check_nesting(child)?;
                (child.start, child.end)
            }
            Node::Text(text) => (text.start, text.end),
        };
        prop_assert!(start <= end);
        prop_assert!(
            cursor <= start,
            "sibling at {} overlaps previous ending at {}",
            start,
            cursor
        );
        cursor = end;
    }
    prop_assert!(cursor <= element.end);
    Ok(())
}

fn visible_text(content: &str, annotations: &[Annotation]) -> String {
    content
        .chars()
        .enumerate()
        .filter(|(offset, _)| {
            !annotations
                .iter()
                .any(|a| a.is_parse_token() && a.start <= *offset && *offset < a.end)
        })
        .map(|(_, ch)| ch)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(proptest_config::cases()))]

    #[test]
    fn prop_tree_is_independent_of_annotation_order(
        (content, annotations, shuffled) in shuffled_case_strategy()
    ) {
        let schema = Schema::commonmark();
        let a = normalize(&content, &annotations, &schema).unwrap();
        let b = normalize(&content, &shuffled, &schema).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_tree_is_strictly_nested((content, annotations) in case_strategy()) {
        let tree: Tree = normalize(&content, &annotations, &Schema::commonmark()).unwrap();
        check_nesting(&tree.root)?;
        prop_assert_eq!(tree.text(), visible_text(&content, &annotations));
    }

    #[test]
    fn differential_test_text_paths((content, annotations) in case_strategy()) {
        let schema = Schema::commonmark();
        let tree = normalize(&content, &annotations, &schema).unwrap();
        let expected = oracle::text_paths(&content, &annotations, &schema);
        prop_assert_eq!(tree.text_paths(), expected, "normalizer should match the naive oracle");
    }
}
