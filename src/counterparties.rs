use rusqlite::{params, Connection};

use crate::db::lookup_id;
use crate::error::{ContiError, Result};
use crate::models::Counterparty;

const SELECT: &str = "SELECT c.id, k.code, c.name, c.vat_number, c.tax_code, c.pec, c.sdi_code, c.iban, c.notes \
     FROM counterparties c JOIN counterparty_kinds k ON c.kind_id = k.id";

fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Counterparty> {
    Ok(Counterparty {
        id: row.get(0)?,
        kind: row.get(1)?,
        name: row.get(2)?,
        vat_number: row.get(3)?,
        tax_code: row.get(4)?,
        pec: row.get(5)?,
        sdi_code: row.get(6)?,
        iban: row.get(7)?,
        notes: row.get(8)?,
    })
}

fn kind_id(conn: &Connection, kind: &str) -> Result<i64> {
    lookup_id(conn, "counterparty_kinds", kind)?
        .ok_or_else(|| ContiError::UnknownCounterpartyKind(kind.to_string()))
}

pub fn add(conn: &Connection, cp: &Counterparty) -> Result<i64> {
    let kind_id = kind_id(conn, &cp.kind)?;
    conn.execute(
        "INSERT INTO counterparties (kind_id, name, vat_number, tax_code, pec, sdi_code, iban, notes) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![kind_id, cp.name, cp.vat_number, cp.tax_code, cp.pec, cp.sdi_code, cp.iban, cp.notes],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> Result<Counterparty> {
    let sql = format!("{SELECT} WHERE c.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map([id], from_row)?;
    rows.next()
        .transpose()?
        .ok_or(ContiError::UnknownCounterparty(id))
}

/// Replaces every field of an existing counterparty; `cp.id` is ignored.
pub fn update(conn: &Connection, id: i64, cp: &Counterparty) -> Result<()> {
    get(conn, id)?;
    let kind_id = kind_id(conn, &cp.kind)?;
    conn.execute(
        "UPDATE counterparties SET kind_id = ?1, name = ?2, vat_number = ?3, tax_code = ?4, \
         pec = ?5, sdi_code = ?6, iban = ?7, notes = ?8 WHERE id = ?9",
        params![kind_id, cp.name, cp.vat_number, cp.tax_code, cp.pec, cp.sdi_code, cp.iban, cp.notes, id],
    )?;
    Ok(())
}

/// Counterparties ordered by name, optionally filtered by a case-insensitive name substring.
pub fn search(conn: &Connection, q: Option<&str>) -> Result<Vec<Counterparty>> {
    let q = q.map(str::trim).filter(|s| !s.is_empty());
    let sql = match q {
        Some(_) => format!("{SELECT} WHERE lower(c.name) LIKE ?1 ORDER BY c.name"),
        None => format!("{SELECT} ORDER BY c.name"),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = match q {
        Some(q) => stmt.query_map([format!("%{}%", q.to_lowercase())], from_row)?,
        None => stmt.query_map([], from_row)?,
    };
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Refuses to delete a counterparty that invoices still reference.
pub fn delete(conn: &Connection, id: i64) -> Result<()> {
    get(conn, id)?;
    let in_use: bool = conn
        .prepare("SELECT 1 FROM invoices WHERE counterparty_id = ?1")?
        .exists([id])?;
    if in_use {
        return Err(ContiError::CounterpartyInUse(id));
    }
    conn.execute("DELETE FROM counterparties WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn supplier(name: &str) -> Counterparty {
        Counterparty {
            kind: "supplier".into(),
            name: name.into(),
            vat_number: Some("IT01234567890".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_get() {
        let (_dir, conn) = test_db();
        let id = add(&conn, &supplier("Studio Rossi")).unwrap();
        let cp = get(&conn, id).unwrap();
        assert_eq!(cp.id, Some(id));
        assert_eq!(cp.kind, "SUPPLIER");
        assert_eq!(cp.vat_number.as_deref(), Some("IT01234567890"));
    }

    #[test]
    fn test_add_unknown_kind() {
        let (_dir, conn) = test_db();
        let mut cp = supplier("X");
        cp.kind = "PARTNER".into();
        assert!(matches!(add(&conn, &cp), Err(ContiError::UnknownCounterpartyKind(_))));
    }

    #[test]
    fn test_update() {
        let (_dir, conn) = test_db();
        let id = add(&conn, &supplier("Studio Rossi")).unwrap();
        let edited = Counterparty {
            kind: "customer".into(),
            name: "Studio Rossi & Associati".into(),
            pec: Some("rossi@pec.it".into()),
            ..Default::default()
        };
        update(&conn, id, &edited).unwrap();

        let cp = get(&conn, id).unwrap();
        assert_eq!(cp.kind, "CUSTOMER");
        assert_eq!(cp.name, "Studio Rossi & Associati");
        assert_eq!(cp.pec.as_deref(), Some("rossi@pec.it"));
        assert_eq!(cp.vat_number, None);

        assert!(matches!(update(&conn, 99, &edited), Err(ContiError::UnknownCounterparty(99))));
        let mut bad = edited.clone();
        bad.kind = "PARTNER".into();
        assert!(matches!(update(&conn, id, &bad), Err(ContiError::UnknownCounterpartyKind(_))));
    }

    #[test]
    fn test_search_by_name() {
        let (_dir, conn) = test_db();
        add(&conn, &supplier("Studio Rossi")).unwrap();
        add(&conn, &supplier("Bianchi Srl")).unwrap();
        add(&conn, &supplier("Rossini Spa")).unwrap();

        let all = search(&conn, None).unwrap();
        let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Bianchi Srl", "Rossini Spa", "Studio Rossi"]);

        let found = search(&conn, Some("ROSS")).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(search(&conn, Some("  ")).unwrap().len(), 3);
    }

    #[test]
    fn test_delete() {
        let (_dir, conn) = test_db();
        let id = add(&conn, &supplier("Studio Rossi")).unwrap();
        delete(&conn, id).unwrap();
        assert!(matches!(get(&conn, id), Err(ContiError::UnknownCounterparty(_))));
        assert!(matches!(delete(&conn, id), Err(ContiError::UnknownCounterparty(_))));
    }
}
