//! SQL DDL for tables this service owns.
//!
//! `keyword_ideas`, `html_artifacts`, `general_contexts` and
//! `discovery_documents` belong to the surrounding application and are
//! used as-is.

/// Versioned strategy documents, one row per `(client_id, version_number)`.
/// Section columns are named after the section keys.
pub const POSTGRES_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS strategies (
    id SERIAL PRIMARY KEY,
    client_id INTEGER NOT NULL,
    version_number INTEGER NOT NULL,
    executive_summary TEXT,
    section_1 TEXT,
    section_2 TEXT,
    section_3 TEXT,
    section_4 TEXT,
    section_5 TEXT,
    section_6 TEXT,
    section_7 TEXT,
    section_8 TEXT,
    section_9 TEXT,
    section_10 TEXT,
    section_11 TEXT,
    section_12 TEXT,
    section_13 TEXT,
    section_14 TEXT,
    appendix_a TEXT,
    appendix_b TEXT,
    created_at TIMESTAMP DEFAULT NOW(),
    updated_at TIMESTAMP DEFAULT NOW(),
    UNIQUE(client_id, version_number)
);
"#;
