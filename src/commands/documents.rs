use super::WorkspaceError;
use crate::db::models::{DocType, Document, DocumentContent, TurnSender};
use crate::db::Database;
use crate::doc_parser::parse_blocks;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SaveDocumentInput {
    pub turn_id: i64,
    pub title: String,
    pub doc_type: DocType,
}

/// Capture one agent reply as a structured document. Parsing cannot fail;
/// only the persistence step can, and that failure is returned to the
/// caller. The stored document does not reference the source turn.
pub fn save_turn_as_document(
    db: &Database,
    input: SaveDocumentInput,
) -> Result<Document, WorkspaceError> {
    if input.title.trim().is_empty() {
        return Err(WorkspaceError::InvalidInput(
            "document title is empty".into(),
        ));
    }

    let turn = db
        .get_turn(input.turn_id)?
        .ok_or_else(|| WorkspaceError::NotFound(format!("turn {}", input.turn_id)))?;
    if turn.sender != TurnSender::Agent {
        return Err(WorkspaceError::InvalidInput(
            "only agent replies can be saved as documents".into(),
        ));
    }

    let blocks = parse_blocks(&turn.content);
    let content = DocumentContent::new(blocks);
    let doc = db.insert_document(&turn.project_id, &input.title, input.doc_type, &content)?;
    tracing::info!(
        document_id = doc.id,
        blocks = doc.content.blocks.len(),
        "document saved"
    );
    Ok(doc)
}

pub fn list_documents(db: &Database, project_id: &str) -> Result<Vec<Document>, WorkspaceError> {
    Ok(db.list_documents(project_id)?)
}

pub fn get_document(db: &Database, id: i64) -> Result<Document, WorkspaceError> {
    db.get_document(id)?
        .ok_or_else(|| WorkspaceError::NotFound(format!("document {}", id)))
}

pub fn delete_document(db: &Database, id: i64) -> Result<(), WorkspaceError> {
    db.delete_document(id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{AgentRole, BlockKind, ProjectRuleset};

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path()).unwrap();
        (db, dir)
    }

    #[test]
    fn test_save_agent_reply_as_document() {
        let (db, _dir) = test_db();
        let project = db.create_project("P", &ProjectRuleset::default()).unwrap();
        db.append_turn(&project.id, TurnSender::User, None, "plan the sprint")
            .unwrap();
        let reply = db
            .append_turn(
                &project.id,
                TurnSender::Agent,
                Some(AgentRole::Pm),
                "# Sprint Plan\n\nFocus on onboarding.\n- polish signup\n1. fix copy",
            )
            .unwrap();

        let doc = save_turn_as_document(
            &db,
            SaveDocumentInput {
                turn_id: reply.id,
                title: "Sprint plan".into(),
                doc_type: DocType::Meeting,
            },
        )
        .unwrap();

        assert_eq!(doc.title, "Sprint plan");
        assert_eq!(doc.content.version, "1.0");
        let kinds: Vec<BlockKind> = doc.content.blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Heading,
                BlockKind::Paragraph,
                BlockKind::List,
                BlockKind::List,
            ]
        );
        assert_eq!(doc.content.blocks[0].content, "Sprint Plan");

        // The stored row round-trips with block order intact
        let fetched = get_document(&db, doc.id).unwrap();
        assert_eq!(fetched.content, doc.content);
    }

    #[test]
    fn test_save_rejects_user_turn() {
        let (db, _dir) = test_db();
        let project = db.create_project("P", &ProjectRuleset::default()).unwrap();
        let turn = db
            .append_turn(&project.id, TurnSender::User, None, "note to self")
            .unwrap();

        let err = save_turn_as_document(
            &db,
            SaveDocumentInput {
                turn_id: turn.id,
                title: "Notes".into(),
                doc_type: DocType::Memo,
            },
        )
        .unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidInput(_)));
    }

    #[test]
    fn test_save_rejects_missing_turn() {
        let (db, _dir) = test_db();
        let err = save_turn_as_document(
            &db,
            SaveDocumentInput {
                turn_id: 404,
                title: "Notes".into(),
                doc_type: DocType::Memo,
            },
        )
        .unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound(_)));
    }

    #[test]
    fn test_save_requires_title() {
        let (db, _dir) = test_db();
        let err = save_turn_as_document(
            &db,
            SaveDocumentInput {
                turn_id: 1,
                title: "  ".into(),
                doc_type: DocType::Spec,
            },
        )
        .unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidInput(_)));
    }

    #[test]
    fn test_get_document_missing() {
        let (db, _dir) = test_db();
        let err = get_document(&db, 7).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound(_)));
    }
}
