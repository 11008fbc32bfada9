pub mod models;

use models::{
    AgentRole, ChatTurn, DocType, Document, DocumentContent, Project, ProjectRuleset, TurnSender,
};
use rusqlite::{params, Connection, Result};
use std::sync::Mutex;

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn new(data_dir: &std::path::Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir).ok();
        let db_path = data_dir.join("agent-desk.db");
        let conn = Connection::open(db_path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                tech_stack TEXT NOT NULL DEFAULT '[]',
                convention TEXT NOT NULL DEFAULT '',
                tone TEXT NOT NULL DEFAULT '',
                custom_instructions TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS turns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id TEXT NOT NULL,
                sender TEXT NOT NULL CHECK (sender IN ('user', 'agent')),
                agent_role TEXT,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id TEXT NOT NULL,
                title TEXT NOT NULL,
                doc_type TEXT NOT NULL CHECK (doc_type IN ('MEETING', 'SPEC', 'MEMO', 'TECH')),
                doc_date TEXT NOT NULL DEFAULT (date('now')),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // ── Projects ──

    pub fn create_project(&self, name: &str, ruleset: &ProjectRuleset) -> Result<Project> {
        let conn = self.conn.lock().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO projects (id, name, tech_stack, convention, tone, custom_instructions)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                name,
                tech_stack_to_json(&ruleset.tech_stack)?,
                ruleset.convention,
                ruleset.tone,
                ruleset.custom_instructions
            ],
        )?;
        conn.query_row(
            "SELECT id, name, tech_stack, convention, tone, custom_instructions, created_at, updated_at
             FROM projects WHERE id = ?1",
            params![id],
            row_to_project,
        )
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT id, name, tech_stack, convention, tone, custom_instructions, created_at, updated_at
             FROM projects WHERE id = ?1",
            params![id],
            row_to_project,
        );
        match result {
            Ok(project) => Ok(Some(project)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, tech_stack, convention, tone, custom_instructions, created_at, updated_at
             FROM projects ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map([], row_to_project)?;
        rows.collect()
    }

    pub fn update_ruleset(&self, id: &str, ruleset: &ProjectRuleset) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE projects
             SET tech_stack = ?1, convention = ?2, tone = ?3, custom_instructions = ?4,
                 updated_at = datetime('now')
             WHERE id = ?5",
            params![
                tech_stack_to_json(&ruleset.tech_stack)?,
                ruleset.convention,
                ruleset.tone,
                ruleset.custom_instructions,
                id
            ],
        )?;
        Ok(())
    }

    pub fn delete_project(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Turns ──

    pub fn append_turn(
        &self,
        project_id: &str,
        sender: TurnSender,
        agent_role: Option<AgentRole>,
        content: &str,
    ) -> Result<ChatTurn> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO turns (project_id, sender, agent_role, content) VALUES (?1, ?2, ?3, ?4)",
            params![
                project_id,
                sender.as_str(),
                agent_role.map(|r| r.as_str()),
                content
            ],
        )?;
        let id = conn.last_insert_rowid();
        // Touch project updated_at
        conn.execute(
            "UPDATE projects SET updated_at = datetime('now') WHERE id = ?1",
            params![project_id],
        )?;
        conn.query_row(
            "SELECT id, project_id, sender, agent_role, content, created_at FROM turns WHERE id = ?1",
            params![id],
            row_to_turn,
        )
    }

    pub fn list_turns(&self, project_id: &str) -> Result<Vec<ChatTurn>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, sender, agent_role, content, created_at
             FROM turns WHERE project_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![project_id], row_to_turn)?;
        rows.collect()
    }

    pub fn get_turn(&self, id: i64) -> Result<Option<ChatTurn>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT id, project_id, sender, agent_role, content, created_at FROM turns WHERE id = ?1",
            params![id],
            row_to_turn,
        );
        match result {
            Ok(turn) => Ok(Some(turn)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ── Documents ──

    pub fn insert_document(
        &self,
        project_id: &str,
        title: &str,
        doc_type: DocType,
        content: &DocumentContent,
    ) -> Result<Document> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO documents (project_id, title, doc_type, content) VALUES (?1, ?2, ?3, ?4)",
            params![
                project_id,
                title,
                doc_type.as_str(),
                document_content_to_json(content)?
            ],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT id, project_id, title, doc_type, doc_date, content, created_at
             FROM documents WHERE id = ?1",
            params![id],
            row_to_document,
        )
    }

    pub fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT id, project_id, title, doc_type, doc_date, content, created_at
             FROM documents WHERE id = ?1",
            params![id],
            row_to_document,
        );
        match result {
            Ok(doc) => Ok(Some(doc)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn list_documents(&self, project_id: &str) -> Result<Vec<Document>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, title, doc_type, doc_date, content, created_at
             FROM documents WHERE project_id = ?1 ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![project_id], row_to_document)?;
        rows.collect()
    }

    pub fn delete_document(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Settings ──

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn tech_stack_to_json(tech_stack: &[String]) -> Result<String> {
    serde_json::to_string(tech_stack).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn document_content_to_json(content: &DocumentContent) -> Result<String> {
    serde_json::to_string(content).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

fn row_to_project(row: &rusqlite::Row) -> Result<Project> {
    let tech_stack_json: String = row.get(2)?;
    let tech_stack = serde_json::from_str(&tech_stack_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        ruleset: ProjectRuleset {
            tech_stack,
            convention: row.get(3)?,
            tone: row.get(4)?,
            custom_instructions: row.get(5)?,
        },
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn row_to_turn(row: &rusqlite::Row) -> Result<ChatTurn> {
    let sender_raw: String = row.get(2)?;
    let sender = TurnSender::from_str(&sender_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown sender '{}'", sender_raw).into(),
        )
    })?;
    let agent_role: Option<String> = row.get(3)?;
    Ok(ChatTurn {
        id: row.get(0)?,
        project_id: row.get(1)?,
        sender,
        agent_role: agent_role.as_deref().and_then(AgentRole::from_str),
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn row_to_document(row: &rusqlite::Row) -> Result<Document> {
    let doc_type_raw: String = row.get(3)?;
    let doc_type = DocType::from_str(&doc_type_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown doc type '{}'", doc_type_raw).into(),
        )
    })?;
    let content_json: String = row.get(5)?;
    let content = serde_json::from_str(&content_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Document {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        doc_type,
        doc_date: row.get(4)?,
        content,
        created_at: row.get(6)?,
    })
}
