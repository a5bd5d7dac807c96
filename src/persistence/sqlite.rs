use super::{PersistenceError, PersistenceResult, ProjectStore};
use crate::project::{AllocationInputs, FactInputs, ProjectId, ProjectSnapshot};
use crate::recalculation::AuditRecord;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::path::Path;
use timeline_core::{DependencyEdge, NodeId, PeriodCalendar, RelationKind, ScheduleNode};
use timeline_cost::{AllocationRow, Money, Steepness};

/// SQLite-backed store. Each commit replaces the project's rows and appends
/// its audit record inside one transaction.
pub struct SqliteProjectStore {
    connection: Mutex<Connection>,
}

impl SqliteProjectStore {
    pub fn new<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS projects (
                project_id INTEGER PRIMARY KEY,
                sequence INTEGER NOT NULL,
                settings_json TEXT NOT NULL,
                curves_json TEXT NOT NULL,
                critical_path_json TEXT NOT NULL,
                project_finish INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS schedule_nodes (
                project_id INTEGER NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
                node_id INTEGER NOT NULL,
                node_json TEXT NOT NULL,
                PRIMARY KEY (project_id, node_id)
            );
            CREATE TABLE IF NOT EXISTS dependency_edges (
                project_id INTEGER NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
                predecessor INTEGER NOT NULL,
                successor INTEGER NOT NULL,
                kind TEXT NOT NULL,
                lag INTEGER NOT NULL,
                PRIMARY KEY (project_id, predecessor, successor)
            );
            CREATE TABLE IF NOT EXISTS allocation_inputs (
                project_id INTEGER NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
                fact_id INTEGER NOT NULL,
                total_minor INTEGER NOT NULL,
                curve_id TEXT NOT NULL,
                steepness INTEGER NOT NULL,
                PRIMARY KEY (project_id, fact_id)
            );
            CREATE TABLE IF NOT EXISTS allocation_rows (
                project_id INTEGER NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
                fact_id INTEGER NOT NULL,
                period_index INTEGER NOT NULL,
                period INTEGER NOT NULL,
                period_start TEXT,
                amount_minor INTEGER NOT NULL,
                PRIMARY KEY (project_id, fact_id, period_index)
            );
            CREATE TABLE IF NOT EXISTS audit_log (
                project_id INTEGER NOT NULL,
                sequence INTEGER NOT NULL,
                recorded_at TEXT NOT NULL,
                record_json TEXT NOT NULL,
                PRIMARY KEY (project_id, sequence)
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    /// Committed audit records for `project_id`, oldest first.
    pub fn audit_records(&self, project_id: ProjectId) -> PersistenceResult<Vec<AuditRecord>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(
            "SELECT record_json FROM audit_log WHERE project_id = ?1 ORDER BY sequence ASC",
        )?;
        let rows = stmt.query_map(params![to_sql_id(project_id.0)?], |row| {
            row.get::<_, String>(0)
        })?;
        let mut records = Vec::new();
        for json in rows {
            records.push(serde_json::from_str(&json?)?);
        }
        Ok(records)
    }

    fn save_project(&self, tx: &Transaction, snapshot: &ProjectSnapshot) -> PersistenceResult<()> {
        let project_id = to_sql_id(snapshot.project_id.0)?;
        // Child rows go with the parent through ON DELETE CASCADE.
        tx.execute("DELETE FROM projects WHERE project_id = ?1", params![project_id])?;
        tx.execute(
            "INSERT INTO projects
                 (project_id, sequence, settings_json, curves_json,
                  critical_path_json, project_finish)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                project_id,
                to_sql_id(snapshot.sequence)?,
                serde_json::to_string(&snapshot.settings)?,
                serde_json::to_string(&snapshot.curves)?,
                serde_json::to_string(&snapshot.critical_path)?,
                snapshot.project_finish,
            ],
        )?;

        let mut stmt = tx.prepare(
            "INSERT INTO schedule_nodes (project_id, node_id, node_json) VALUES (?1, ?2, ?3)",
        )?;
        for node in &snapshot.nodes {
            stmt.execute(params![
                project_id,
                to_sql_id(node.id.0)?,
                serde_json::to_string(node)?
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO dependency_edges (project_id, predecessor, successor, kind, lag)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for edge in &snapshot.edges {
            stmt.execute(params![
                project_id,
                to_sql_id(edge.predecessor.0)?,
                to_sql_id(edge.successor.0)?,
                edge.kind.as_str(),
                edge.lag,
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO allocation_inputs (project_id, fact_id, total_minor, curve_id, steepness)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for fact in &snapshot.facts {
            stmt.execute(params![
                project_id,
                to_sql_id(fact.fact_id.0)?,
                fact.inputs.total.minor(),
                fact.inputs.curve_id,
                fact.inputs.steepness.value(),
            ])?;
        }

        let calendar = snapshot.settings.calendar();
        let mut stmt = tx.prepare(
            "INSERT INTO allocation_rows
                 (project_id, fact_id, period_index, period, period_start, amount_minor)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in &snapshot.allocations {
            stmt.execute(params![
                project_id,
                to_sql_id(row.fact_id.0)?,
                row.period_index,
                row.period,
                period_label(&calendar, row.period),
                row.amount.minor(),
            ])?;
        }
        Ok(())
    }

    fn append_audit(&self, tx: &Transaction, audit: &AuditRecord) -> PersistenceResult<()> {
        tx.execute(
            "INSERT INTO audit_log (project_id, sequence, recorded_at, record_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                to_sql_id(audit.project_id.0)?,
                to_sql_id(audit.sequence)?,
                audit.recorded_at.to_rfc3339(),
                serde_json::to_string(audit)?,
            ],
        )?;
        Ok(())
    }
}

impl ProjectStore for SqliteProjectStore {
    fn commit(&self, snapshot: &ProjectSnapshot, audit: &AuditRecord) -> PersistenceResult<()> {
        super::validate_snapshot(snapshot)?;
        let mut conn = self.connection.lock();
        let tx = conn.transaction()?;
        self.save_project(&tx, snapshot)?;
        self.append_audit(&tx, audit)?;
        tx.commit()?;
        Ok(())
    }

    fn load(&self, project_id: ProjectId) -> PersistenceResult<Option<ProjectSnapshot>> {
        let conn = self.connection.lock();
        let id = to_sql_id(project_id.0)?;

        let mut stmt = conn.prepare(
            "SELECT sequence, settings_json, curves_json, critical_path_json, project_finish
             FROM projects WHERE project_id = ?1",
        )?;
        let header = stmt
            .query_row(params![id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .optional()?;
        let Some((sequence, settings_json, curves_json, critical_path_json, project_finish)) =
            header
        else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT node_json FROM schedule_nodes WHERE project_id = ?1 ORDER BY node_id ASC",
        )?;
        let mut nodes: Vec<ScheduleNode> = Vec::new();
        for json in stmt.query_map(params![id], |row| row.get::<_, String>(0))? {
            nodes.push(serde_json::from_str(&json?)?);
        }

        let mut stmt = conn.prepare(
            "SELECT predecessor, successor, kind, lag FROM dependency_edges
             WHERE project_id = ?1 ORDER BY predecessor ASC, successor ASC",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;
        let mut edges = Vec::new();
        for row in rows {
            let (predecessor, successor, kind, lag) = row?;
            let kind = RelationKind::parse(&kind).ok_or_else(|| {
                PersistenceError::InvalidData(format!("unknown relation kind '{kind}'"))
            })?;
            edges.push(DependencyEdge::new(
                from_sql_id(predecessor)?,
                from_sql_id(successor)?,
                kind,
                lag,
            ));
        }

        let mut stmt = conn.prepare(
            "SELECT fact_id, total_minor, curve_id, steepness FROM allocation_inputs
             WHERE project_id = ?1 ORDER BY fact_id ASC",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u8>(3)?,
            ))
        })?;
        let mut facts = Vec::new();
        for row in rows {
            let (fact_id, total_minor, curve_id, steepness) = row?;
            let steepness = Steepness::new(steepness)
                .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
            facts.push(FactInputs {
                fact_id: from_sql_id(fact_id)?,
                inputs: AllocationInputs::new(Money::from_minor(total_minor), curve_id, steepness),
            });
        }

        let mut stmt = conn.prepare(
            "SELECT fact_id, period_index, period, amount_minor FROM allocation_rows
             WHERE project_id = ?1 ORDER BY fact_id ASC, period_index ASC",
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;
        let mut allocations = Vec::new();
        for row in rows {
            let (fact_id, period_index, period, amount_minor) = row?;
            allocations.push(AllocationRow {
                fact_id: from_sql_id(fact_id)?,
                period_index,
                period,
                amount: Money::from_minor(amount_minor),
            });
        }

        let snapshot = ProjectSnapshot {
            project_id,
            sequence: u64::try_from(sequence).map_err(|_| {
                PersistenceError::InvalidData(format!("negative sequence {sequence}"))
            })?,
            settings: serde_json::from_str(&settings_json)?,
            nodes,
            edges,
            facts,
            curves: serde_json::from_str(&curves_json)?,
            allocations,
            critical_path: serde_json::from_str(&critical_path_json)?,
            project_finish,
        };
        super::validate_snapshot(&snapshot)?;
        Ok(Some(snapshot))
    }
}

fn to_sql_id(id: u64) -> PersistenceResult<i64> {
    i64::try_from(id).map_err(|_| {
        PersistenceError::InvalidData(format!("id {id} exceeds SQLite INTEGER range"))
    })
}

fn from_sql_id(id: i64) -> PersistenceResult<NodeId> {
    u64::try_from(id)
        .map(NodeId)
        .map_err(|_| PersistenceError::InvalidData(format!("negative node id {id}")))
}

fn period_label(calendar: &PeriodCalendar, period: i64) -> Option<String> {
    calendar
        .start_date(period)
        .map(|date| date.format("%Y-%m-%d").to_string())
}
