pub const UPSERT_SCENARIO: &str = r#"
    INSERT INTO cached_scenarios (
        id, name, difficulty, document, has_exercises, saved_at, last_modified
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        difficulty = excluded.difficulty,
        document = excluded.document,
        has_exercises = excluded.has_exercises,
        saved_at = excluded.saved_at,
        last_modified = excluded.last_modified
"#;

pub const SELECT_SCENARIO_BY_ID: &str = r#"
    SELECT id, name, difficulty, document, has_exercises, saved_at, last_modified
    FROM cached_scenarios
    WHERE id = ?1
"#;

pub const SELECT_SCENARIOS: &str = r#"
    SELECT id, name, difficulty, document, has_exercises, saved_at, last_modified
    FROM cached_scenarios
    ORDER BY last_modified ASC, id ASC
"#;

pub const SELECT_SCENARIO_SUMMARIES: &str = r#"
    SELECT id, name, difficulty, LENGTH(CAST(document AS BLOB)) AS size_bytes,
           has_exercises, saved_at, last_modified
    FROM cached_scenarios
    ORDER BY last_modified ASC, id ASC
"#;

pub const DELETE_SCENARIO: &str = r#"DELETE FROM cached_scenarios WHERE id = ?1"#;

pub const DELETE_EXERCISES_FOR_SCENARIO: &str =
    r#"DELETE FROM cached_exercises WHERE scenario_id = ?1"#;

pub const UPSERT_EXERCISE: &str = r#"
    INSERT INTO cached_exercises (scenario_id, exercise_type, payload, cached_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(scenario_id, exercise_type) DO UPDATE SET
        payload = excluded.payload,
        cached_at = excluded.cached_at
"#;

pub const SELECT_EXERCISE: &str = r#"
    SELECT scenario_id, exercise_type, payload, cached_at
    FROM cached_exercises
    WHERE scenario_id = ?1 AND exercise_type = ?2
"#;

pub const SELECT_EXERCISES: &str = r#"
    SELECT scenario_id, exercise_type, payload, cached_at
    FROM cached_exercises
    ORDER BY scenario_id ASC, exercise_type ASC
"#;

pub const COUNT_EXERCISES_FOR_SCENARIO: &str =
    r#"SELECT COUNT(*) FROM cached_exercises WHERE scenario_id = ?1"#;

pub const SESSION_SLOT: &str = "current";

pub const UPSERT_SESSION: &str = r#"
    INSERT INTO session_snapshot (slot, document, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(slot) DO UPDATE SET
        document = excluded.document,
        updated_at = excluded.updated_at
"#;

pub const SELECT_SESSION: &str = r#"SELECT document FROM session_snapshot WHERE slot = ?1"#;

pub const DELETE_SESSION: &str = r#"DELETE FROM session_snapshot WHERE slot = ?1"#;

pub const CLEAR_SCENARIOS: &str = r#"DELETE FROM cached_scenarios"#;
pub const CLEAR_EXERCISES: &str = r#"DELETE FROM cached_exercises"#;
pub const CLEAR_SESSION: &str = r#"DELETE FROM session_snapshot"#;

pub const INSERT_OPERATION: &str = r#"
    INSERT INTO sync_operations (
        id, operation_type, payload, enqueued_at, retry_count, last_attempt_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub const SELECT_OPERATIONS: &str = r#"
    SELECT id, operation_type, payload, enqueued_at, retry_count, last_attempt_at
    FROM sync_operations
    ORDER BY enqueued_at ASC, rowid ASC
"#;

pub const UPDATE_OPERATION_ATTEMPT: &str = r#"
    UPDATE sync_operations
    SET retry_count = ?1, last_attempt_at = ?2
    WHERE id = ?3
"#;

pub const DELETE_OPERATION: &str = r#"DELETE FROM sync_operations WHERE id = ?1"#;

pub const COUNT_OPERATIONS: &str = r#"SELECT COUNT(*) FROM sync_operations"#;
