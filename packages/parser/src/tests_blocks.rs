#[cfg(test)]
mod block_tests {
    use crate::ast::*;
    use crate::error::ParseError;
    use crate::parse;

    fn component(block: &Block) -> &ComponentNode<Block> {
        match block {
            Block::Component(node) => node,
            other => panic!("expected a component, got {:?}", other),
        }
    }

    #[test]
    fn test_heading_and_paragraph() {
        let doc = parse("# Hello *world*\n\nText").unwrap();
        assert_eq!(doc.children.len(), 2);

        match &doc.children[0] {
            Block::Heading { depth, children, .. } => {
                assert_eq!(*depth, 1);
                assert!(matches!(children[1], Inline::Emphasis { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(doc.children[1].span(), Span::new(17, 21));
    }

    #[test]
    fn test_heading_closing_sequence() {
        let doc = parse("## Title ##").unwrap();
        match &doc.children[0] {
            Block::Heading { depth, children, .. } => {
                assert_eq!(*depth, 2);
                assert_eq!(Inline::plain_text(children), "Title");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_setext_heading() {
        let doc = parse("Title\n=====").unwrap();
        assert!(matches!(doc.children[0], Block::Heading { depth: 1, .. }));
    }

    #[test]
    fn test_tight_list() {
        let doc = parse("- a\n- b\n- c").unwrap();
        match &doc.children[0] {
            Block::List {
                ordered,
                spread,
                items,
                ..
            } => {
                assert!(!ordered);
                assert!(!spread);
                assert_eq!(items.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_loose_list() {
        let doc = parse("- a\n\n- b").unwrap();
        assert!(matches!(&doc.children[0], Block::List { spread: true, items, .. } if items.len() == 2));
    }

    #[test]
    fn test_ordered_list_start() {
        let doc = parse("3. three\n4. four").unwrap();
        match &doc.children[0] {
            Block::List {
                ordered,
                start,
                items,
                ..
            } => {
                assert!(ordered);
                assert_eq!(*start, Some(3));
                assert_eq!(items.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nested_list() {
        let doc = parse("- a\n  - b\n- c").unwrap();
        match &doc.children[0] {
            Block::List { items, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].children.len(), 2);
                assert!(matches!(items[0].children[1], Block::List { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fenced_code() {
        let doc = parse("```rust title=\"main.rs\"\nfn main() {}\n```").unwrap();
        assert_eq!(
            doc.children[0],
            Block::Code {
                lang: Some("rust".to_string()),
                meta: Some("title=\"main.rs\"".to_string()),
                value: "fn main() {}".to_string(),
                span: Span::new(0, 40),
            }
        );
    }

    #[test]
    fn test_code_is_not_parsed_as_markup() {
        let doc = parse("~~~\n<Callout>\n{oops\n~~~").unwrap();
        assert!(matches!(&doc.children[0], Block::Code { value, .. } if value == "<Callout>\n{oops"));
    }

    #[test]
    fn test_unterminated_fence() {
        let err = parse("```js\nlet a = 1;").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedFence { ref fence, .. } if fence == "```"));
    }

    #[test]
    fn test_blockquote() {
        let doc = parse("> quote\n> more").unwrap();
        match &doc.children[0] {
            Block::BlockQuote { children, .. } => {
                assert_eq!(children.len(), 1);
                assert!(matches!(children[0], Block::Paragraph { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_table() {
        let doc = parse("| a | b |\n| :-- | --: |\n| 1 | 2 |\n| 3 |").unwrap();
        match &doc.children[0] {
            Block::Table {
                align, head, rows, ..
            } => {
                assert_eq!(align, &vec![Alignment::Left, Alignment::Right]);
                assert_eq!(head.len(), 2);
                assert_eq!(rows.len(), 2);
                // Short rows are padded to the header width
                assert_eq!(rows[1].len(), 2);
                assert!(rows[1][1].is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_thematic_break() {
        let doc = parse("a\n\n***\n\nb").unwrap();
        assert!(matches!(doc.children[1], Block::ThematicBreak { .. }));
    }

    #[test]
    fn test_block_component() {
        let source = "<Callout type=\"info\">\nSome **bold** text.\n</Callout>";
        let doc = parse(source).unwrap();
        let node = component(&doc.children[0]);

        assert_eq!(node.name, "Callout");
        assert_eq!(node.attributes.len(), 1);
        assert_eq!(node.children.len(), 1);
        assert!(!node.self_closing);
        assert_eq!(node.span, Span::new(0, source.len()));
    }

    #[test]
    fn test_closing_tag_at_end_of_paragraph_line() {
        let doc = parse("<Callout>\ntext</Callout>\n\nafter").unwrap();
        assert_eq!(doc.children.len(), 2);
        let node = component(&doc.children[0]);
        assert_eq!(node.children.len(), 1);
    }

    #[test]
    fn test_self_closing_block_component() {
        let doc = parse("<Icon name=\"star\" />").unwrap();
        let node = component(&doc.children[0]);
        assert!(node.self_closing);
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_nested_components() {
        let source = r#"<Tabs>
  <Tab label="One">
    First
  </Tab>
  <Tab label="Two">
    Second
  </Tab>
</Tabs>"#;
        let doc = parse(source).unwrap();
        let tabs = component(&doc.children[0]);
        assert_eq!(tabs.children.len(), 2);

        let first = component(&tabs.children[0]);
        assert_eq!(first.name, "Tab");
        assert!(matches!(first.children[0], Block::Paragraph { .. }));
    }

    #[test]
    fn test_multiline_opening_tag() {
        let doc = parse("<Card\n  title=\"A\"\n  href=\"/a\"\n>\nBody\n</Card>").unwrap();
        let node = component(&doc.children[0]);
        assert_eq!(node.attributes.len(), 2);
        assert_eq!(node.children.len(), 1);
    }

    #[test]
    fn test_inline_component_in_paragraph() {
        let doc = parse("Status: <Badge>New</Badge>").unwrap();
        match &doc.children[0] {
            Block::Paragraph { children, .. } => {
                assert!(matches!(&children[1], Inline::Component(node) if node.name == "Badge"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_export_and_block_expression() {
        let doc = parse("export const year = 2024\n\n{year}").unwrap();
        assert_eq!(
            doc.children[0],
            Block::Export {
                source: "export const year = 2024".to_string(),
                span: Span::new(0, 24),
            }
        );
        assert_eq!(
            doc.children[1],
            Block::Expression {
                source: "year".to_string(),
                span: Span::new(26, 32),
            }
        );
    }

    #[test]
    fn test_unterminated_block_component() {
        let err = parse("<Callout>\ntext").unwrap_err();
        assert_eq!(
            err,
            ParseError::unterminated_component(Span::new(0, 9), "Callout", "document")
        );
    }

    #[test]
    fn test_unterminated_component_in_paragraph() {
        let err = parse("<Callout>unterminated").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected a closing tag for `<Callout>` before the end of the paragraph"
        );
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = parse("<Tabs>\n</Tab>").unwrap_err();
        assert!(matches!(
            err,
            ParseError::MismatchedClosingTag { ref expected, ref found, .. }
                if expected == "Tabs" && found == "Tab"
        ));
    }

    #[test]
    fn test_stray_closing_tag() {
        let err = parse("text\n\n</Callout>").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedClosingTag { .. }));
    }

    #[test]
    fn test_unterminated_attribute_expression() {
        let err = parse("<Card cols={2>\n</Card>").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedExpression { .. }));
    }

    #[test]
    fn test_component_inside_list_item() {
        let doc = parse("- item with <Badge>tag</Badge>\n- plain").unwrap();
        match &doc.children[0] {
            Block::List { items, .. } => match &items[0].children[0] {
                Block::Paragraph { children, .. } => {
                    assert!(children.iter().any(|c| matches!(c, Inline::Component(_))));
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nesting_limit() {
        use crate::parser::MAX_NESTING_DEPTH;

        let quotes = format!("{}x", "> ".repeat(1000));
        let err = parse(&quotes).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep { limit: MAX_NESTING_DEPTH, .. }));
        assert!(parse(&format!("{}x", "> ".repeat(20))).is_ok());

        let cards = format!("{}x\n{}", "<Card>\n".repeat(1000), "</Card>\n".repeat(1000));
        assert!(matches!(parse(&cards).unwrap_err(), ParseError::NestingTooDeep { .. }));

        let badges = format!("{}x{}", "<Badge>".repeat(1000), "</Badge>".repeat(1000));
        assert!(matches!(parse(&badges).unwrap_err(), ParseError::NestingTooDeep { .. }));
    }

    #[test]
    fn test_deep_but_reasonable_nesting() {
        let cards = format!("{}x\n{}", "<Card>\n".repeat(40), "</Card>\n".repeat(40));
        let doc = parse(&cards).unwrap();
        let mut node = &doc.children[0];
        for _ in 1..40 {
            node = &component(node).children[0];
        }
        assert!(matches!(component(node).children[0], Block::Paragraph { .. }));
    }
}
