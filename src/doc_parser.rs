use crate::db::models::{BlockKind, DocumentBlock};

/// Convert one agent reply into an ordered sequence of document blocks.
///
/// One block per non-blank line, in source order; lines are never merged or
/// split. A line whose leading characters are a '#' run is a heading, as is
/// any line containing the literal tag "모드]" (the mode marker agents put
/// in section titles; matched as-is, nothing more general). Heading content
/// has the '#' run stripped and is trimmed. List lines start with '-' or a
/// single digit followed by '.'; list and paragraph content is the line
/// unmodified. The code kind is never produced here.
pub fn parse_blocks(text: &str) -> Vec<DocumentBlock> {
    let mut blocks = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let block = if line.starts_with('#') || line.contains("모드]") {
            DocumentBlock {
                kind: BlockKind::Heading,
                content: line.trim_start_matches('#').trim().to_string(),
            }
        } else if is_list_line(line) {
            DocumentBlock {
                kind: BlockKind::List,
                content: line.to_string(),
            }
        } else {
            DocumentBlock {
                kind: BlockKind::Paragraph,
                content: line.to_string(),
            }
        };
        blocks.push(block);
    }
    blocks
}

fn is_list_line(line: &str) -> bool {
    if line.starts_with('-') {
        return true;
    }
    let mut chars = line.chars();
    matches!((chars.next(), chars.next()), (Some(d), Some('.')) if d.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: BlockKind, content: &str) -> DocumentBlock {
        DocumentBlock {
            kind,
            content: content.into(),
        }
    }

    #[test]
    fn test_empty_input_yields_no_blocks() {
        assert!(parse_blocks("").is_empty());
        assert!(parse_blocks("   \n\n").is_empty());
        assert!(parse_blocks("\t\n  \t  \n").is_empty());
    }

    #[test]
    fn test_mixed_lines_classified_in_order() {
        let blocks = parse_blocks("# Title\nSome text\n- item one\n1. item two");
        assert_eq!(
            blocks,
            vec![
                block(BlockKind::Heading, "Title"),
                block(BlockKind::Paragraph, "Some text"),
                block(BlockKind::List, "- item one"),
                block(BlockKind::List, "1. item two"),
            ]
        );
    }

    #[test]
    fn test_mode_tag_makes_a_heading_without_hash() {
        let blocks = parse_blocks("Plan 모드] kickoff");
        assert_eq!(blocks, vec![block(BlockKind::Heading, "Plan 모드] kickoff")]);
    }

    #[test]
    fn test_heading_run_is_stripped_and_trimmed() {
        let blocks = parse_blocks("### Deep title \n#Tight");
        assert_eq!(
            blocks,
            vec![
                block(BlockKind::Heading, "Deep title"),
                block(BlockKind::Heading, "Tight"),
            ]
        );
    }

    #[test]
    fn test_bare_hash_keeps_empty_heading() {
        let blocks = parse_blocks("#");
        assert_eq!(blocks, vec![block(BlockKind::Heading, "")]);
    }

    #[test]
    fn test_heading_wins_over_list() {
        let blocks = parse_blocks("- 회의 모드] agenda");
        assert_eq!(blocks, vec![block(BlockKind::Heading, "- 회의 모드] agenda")]);
    }

    #[test]
    fn test_single_digit_period_is_a_list() {
        let blocks = parse_blocks("1. first\n10. not a list\n2nd item follows");
        assert_eq!(
            blocks,
            vec![
                block(BlockKind::List, "1. first"),
                block(BlockKind::Paragraph, "10. not a list"),
                block(BlockKind::Paragraph, "2nd item follows"),
            ]
        );
    }

    #[test]
    fn test_crlf_lines_are_handled() {
        let blocks = parse_blocks("# A\r\nplain\r\n");
        assert_eq!(
            blocks,
            vec![
                block(BlockKind::Heading, "A"),
                block(BlockKind::Paragraph, "plain"),
            ]
        );
    }

    #[test]
    fn test_reparsing_block_contents_reproduces_the_sequence() {
        let text = "계획 모드] Kickoff\n- first step\n1. draft the scope\nShip notes by Friday.";
        let blocks = parse_blocks(text);
        let joined = blocks
            .iter()
            .map(|b| b.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(parse_blocks(&joined), blocks);
    }
}
