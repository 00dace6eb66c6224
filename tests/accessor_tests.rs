use anyhow::Result;
use sqlite_accessor::logging::{init, Profile};
use sqlite_accessor::orm::Schema;
use sqlite_accessor::{values, DbAccessor, Error, SqliteConfig, Value};
use tempfile::NamedTempFile;

const FIXTURE: &str = r#"
    CREATE TABLE Flesh (
        Id INTEGER PRIMARY KEY,
        Date TEXT,
        Count REAL
    );
    INSERT INTO Flesh VALUES
        (1, '2018-07-29', 0.1),
        (2, '2018-07-30', 0.5),
        (3, '2018-07-31', 0.3),
        (4, '2018-08-01', 0.8),
        (5, '2018-08-02', 0.2),
        (6, '2018-08-03', 0.6);
"#;

const ON_29TH: &str = "Date='2018-07-29'";

// Helper function to create an in-memory accessor holding the six-row fixture
fn create_test_db() -> Result<DbAccessor> {
    init(Profile::Test);
    let accessor = DbAccessor::open_in_memory()?;
    accessor.connection().execute_batch(FIXTURE)?;
    Ok(accessor)
}

// Helper function to create a temporary file-based database
fn create_temp_db() -> Result<(DbAccessor, NamedTempFile)> {
    init(Profile::Test);
    let temp_file = NamedTempFile::new()?;
    let accessor = DbAccessor::open(temp_file.path())?;
    accessor.connection().execute_batch(FIXTURE)?;
    Ok((accessor, temp_file))
}

#[test]
fn test_select_all() -> Result<()> {
    let accessor = create_test_db()?;

    let records = accessor.select("Flesh", &[], None)?;
    assert_eq!(records.len(), 6);
    assert_eq!(records.fetch_one().map(<[Value]>::len), Some(3));
    assert_eq!(records.columns, vec!["Id", "Date", "Count"]);
    Ok(())
}

#[test]
fn test_select_partial_columns() -> Result<()> {
    let accessor = create_test_db()?;

    let first = |columns: &[&str]| -> Result<usize> {
        let records = accessor.select("Flesh", columns, None)?;
        Ok(records.fetch_one().map_or(0, <[Value]>::len))
    };
    assert_eq!(first(&["Date"])?, 1);
    assert_eq!(first(&["Id", "Count"])?, 2);
    assert_eq!(first(&["*"])?, 3);
    assert_eq!(first(&[])?, 3);
    Ok(())
}

#[test]
fn test_select_with_conditions() -> Result<()> {
    let accessor = create_test_db()?;

    assert_eq!(accessor.select("Flesh", &[], Some("Id>4"))?.len(), 2);
    assert!(accessor.select("Flesh", &["*"], Some("Id=9"))?.is_empty());
    Ok(())
}

#[test]
fn test_update() -> Result<()> {
    let accessor = create_test_db()?;
    assert_eq!(accessor.select("Flesh", &[], Some(ON_29TH))?.len(), 1);

    let result = accessor.update("Flesh", &["Date"], &values!["2018-07-29"], Some("Id>4"))?;
    assert_eq!(result.changes, 2);

    assert_eq!(accessor.select("Flesh", &[], Some(ON_29TH))?.len(), 3);
    Ok(())
}

#[test]
fn test_update_length_mismatch_touches_nothing() -> Result<()> {
    let accessor = create_test_db()?;

    let err = accessor
        .update("Flesh", &["Date", "Count"], &values!["2018-07-29"], None)
        .unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { columns: 2, values: 1 }));
    assert!(!accessor.in_transaction());
    assert_eq!(accessor.select("Flesh", &[], Some(ON_29TH))?.len(), 1);
    Ok(())
}

#[test]
fn test_insert() -> Result<()> {
    let accessor = create_test_db()?;
    assert_eq!(accessor.select("Flesh", &[], Some(ON_29TH))?.len(), 1);

    accessor.insert("Flesh", &values![15, "2018-07-29", 0.1])?;
    accessor.insert("Flesh", &values![16, "2018-07-30", 0.6])?;

    let records = accessor.select("Flesh", &[], Some(ON_29TH))?.fetch_all();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[1],
        vec![
            Value::Integer(15),
            Value::Text("2018-07-29".to_string()),
            Value::Real(0.1)
        ]
    );
    Ok(())
}

#[test]
fn test_insert_is_uncommitted_until_commit() -> Result<()> {
    let accessor = create_test_db()?;

    accessor.insert("Flesh", &values![15, "2018-07-29", 0.1])?;
    assert!(accessor.in_transaction());
    accessor.rollback()?;
    assert!(!accessor.in_transaction());
    assert_eq!(accessor.select("Flesh", &[], None)?.len(), 6);

    accessor.insert("Flesh", &values![15, "2018-07-29", 0.1])?;
    accessor.commit()?;
    accessor.rollback()?;
    assert_eq!(accessor.select("Flesh", &[], None)?.len(), 7);
    Ok(())
}

#[test]
fn test_insert_duplicated_id() -> Result<()> {
    let accessor = create_test_db()?;

    let err = accessor
        .insert("Flesh", &values![4, "2018-07-29", 0.1])
        .unwrap_err();
    assert!(err.is_unique_violation(), "unexpected error: {err}");
    Ok(())
}

#[test]
fn test_insert_none_and_integer_text() -> Result<()> {
    let accessor = create_test_db()?;

    accessor.insert("Flesh", &values![7, None::<String>, "None"])?;
    accessor.insert("Flesh", &values!["8", "2018-09-01", "3"])?;

    let row = accessor.select("Flesh", &["Date"], Some("Id=7"))?.fetch_all();
    assert_eq!(row, vec![vec![Value::Text(String::new())]]);

    let row = accessor.select("Flesh", &["Count"], Some("Id=8"))?.fetch_all();
    assert_eq!(row, vec![vec![Value::Real(3.0)]]);
    Ok(())
}

#[test]
fn test_delete() -> Result<()> {
    let accessor = create_test_db()?;
    assert_eq!(accessor.select("Flesh", &[], Some(ON_29TH))?.len(), 1);

    let result = accessor.delete("Flesh", Some("Id=1"))?;
    assert_eq!(result.changes, 1);
    assert!(accessor.select("Flesh", &[], Some(ON_29TH))?.is_empty());
    assert_eq!(accessor.select("Flesh", &[], None)?.len(), 5);

    accessor.delete("Flesh", None)?;
    assert!(accessor.select("Flesh", &[], None)?.is_empty());
    Ok(())
}

#[test]
fn test_execute_passthrough() -> Result<()> {
    let accessor = create_test_db()?;

    let records = accessor.execute("select count(*), max(Id) from Flesh")?;
    assert_eq!(records.fetch_one(), Some(&[Value::Integer(6), Value::Integer(6)][..]));

    assert!(accessor.execute("select * from Missing").is_err());
    Ok(())
}

#[test]
fn test_execute_without_statement_is_empty() -> Result<()> {
    let accessor = create_test_db()?;

    for text in ["", "   ", "-- note", "/* nothing */;"] {
        let records = accessor.execute(text)?;
        assert_eq!(records, sqlite_accessor::ResultSet::default(), "for {text:?}");
    }
    assert!(!accessor.in_transaction());
    Ok(())
}

#[test]
fn test_failed_insert_leaves_no_transaction() -> Result<()> {
    let accessor = create_test_db()?;

    assert!(accessor.insert("Missing", &values![1]).is_err());
    assert!(!accessor.in_transaction());
    Ok(())
}

#[test]
fn test_column_names() -> Result<()> {
    let accessor = create_test_db()?;
    assert_eq!(accessor.column_names("Flesh")?, vec!["Id", "Date", "Count"]);
    assert!(accessor.column_names("Missing")?.is_empty());
    Ok(())
}

#[test]
fn test_commit_persists_to_file() -> Result<()> {
    let (accessor, temp_file) = create_temp_db()?;

    accessor.insert("Flesh", &values![15, "2018-07-29", 0.1])?;
    accessor.commit()?;
    accessor.insert("Flesh", &values![16, "2018-07-30", 0.6])?;
    drop(accessor);

    let reopened = DbAccessor::open(temp_file.path())?;
    assert_eq!(reopened.select("Flesh", &[], Some("Id>=15"))?.len(), 1);
    Ok(())
}

#[test]
fn test_empty_path_is_transient() -> Result<()> {
    let accessor = DbAccessor::open("")?;
    accessor.execute("create table t (a)")?;
    accessor.insert("t", &values![1])?;
    assert_eq!(accessor.select("t", &[], None)?.len(), 1);
    Ok(())
}

#[test]
fn test_from_config_applies_pragmas() -> Result<()> {
    let temp_file = NamedTempFile::new()?;
    let config = SqliteConfig::new(temp_file.path().to_string_lossy(), Schema::new())
        .with_foreign_keys(true);

    let accessor = DbAccessor::from_config(&config)?;
    let records = accessor.execute("PRAGMA foreign_keys")?;
    assert_eq!(records.fetch_one(), Some(&[Value::Integer(1)][..]));
    Ok(())
}
