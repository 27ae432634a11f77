use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_provider(conn: &Connection, provider: &Provider) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO providers (id, name, credentials) VALUES (?1, ?2, ?3)",
        params![provider.id, provider.name, provider.credentials],
    )?;
    Ok(())
}

pub fn get_all_providers(conn: &Connection) -> Result<Vec<Provider>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, credentials FROM providers ORDER BY name")?;

    let rows = stmt.query_map([], |row| {
        Ok(Provider {
            id: row.get(0)?,
            name: row.get(1)?,
            credentials: row.get(2)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn delete_provider(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM providers WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "provider".into(),
            id: id.into(),
        });
    }
    Ok(())
}

pub fn insert_clinic_type(conn: &Connection, clinic: &ClinicType) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinic_types (id, name, color) VALUES (?1, ?2, ?3)",
        params![clinic.id, clinic.name, clinic.color],
    )?;
    Ok(())
}

pub fn get_all_clinic_types(conn: &Connection) -> Result<Vec<ClinicType>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, color FROM clinic_types ORDER BY name")?;

    let rows = stmt.query_map([], |row| {
        Ok(ClinicType {
            id: row.get(0)?,
            name: row.get(1)?,
            color: row.get(2)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn delete_clinic_type(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM clinic_types WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "clinic_type".into(),
            id: id.into(),
        });
    }
    Ok(())
}

pub fn insert_monthly_note(conn: &Connection, note: &MonthlyNote) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO monthly_notes (id, month, content) VALUES (?1, ?2, ?3)",
        params![note.id, note.month, note.content],
    )?;
    Ok(())
}

pub fn get_monthly_notes(conn: &Connection, month: &str) -> Result<Vec<MonthlyNote>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, month, content FROM monthly_notes WHERE month = ?1 ORDER BY updated_at, id",
    )?;

    let rows = stmt.query_map(params![month], |row| {
        Ok(MonthlyNote {
            id: row.get(0)?,
            month: row.get(1)?,
            content: row.get(2)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn get_all_monthly_notes(conn: &Connection) -> Result<Vec<MonthlyNote>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, month, content FROM monthly_notes ORDER BY month, updated_at, id")?;

    let rows = stmt.query_map([], |row| {
        Ok(MonthlyNote {
            id: row.get(0)?,
            month: row.get(1)?,
            content: row.get(2)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn update_monthly_note(conn: &Connection, id: &str, content: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE monthly_notes SET content = ?2, updated_at = datetime('now') WHERE id = ?1",
        params![id, content],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "monthly_note".into(),
            id: id.into(),
        });
    }
    Ok(())
}
